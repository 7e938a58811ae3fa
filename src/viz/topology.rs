use serde::Serialize;

/// One column of the network diagram.
///
/// This is cosmetic: node counts are derived from tensor metadata so the
/// picture scales with the model, not read from the model's real layers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayerSpec {
    pub name: String,
    pub nodes: usize,
}

impl LayerSpec {
    pub fn new(name: impl Into<String>, nodes: usize) -> Self {
        LayerSpec { name: name.into(), nodes }
    }
}

/// Flat input length assumed when the model declares no input dims.
pub const DEFAULT_FEATURES: usize = 784;

const INPUT_NODES: (usize, usize) = (20, 28);
const OUTPUT_NODES: (usize, usize) = (2, 100);

/// Product of the declared dims after the batch axis; unknown dims count as 1.
pub fn input_features(dims: Option<&[i64]>) -> usize {
    let known = |d: &i64| if *d > 0 { *d as usize } else { 1 };
    match dims {
        None | Some([]) => DEFAULT_FEATURES,
        Some([single]) => known(single),
        Some([_, rest @ ..]) => rest.iter().map(known).product(),
    }
}

/// Last positive declared dim of an output tensor.
pub fn declared_classes(dims: Option<&[i64]>) -> Option<usize> {
    dims?.iter().rev().find(|d| **d > 0).map(|d| *d as usize)
}

fn scaled(base: usize, factor: f32, lo: usize, hi: usize) -> usize {
    ((base as f32 * factor).round() as usize).clamp(lo, hi)
}

/// Plans the diagram columns for a model.
///
/// Letter-sized heads (more than 10 classes) get two hidden columns, digit
/// heads one. Adjacent columns never share a node count.
pub fn plan_layers(
    input_dims: Option<&[i64]>,
    output_dims: Option<&[i64]>,
    class_count: usize,
) -> Vec<LayerSpec> {
    let features = input_features(input_dims);
    let input = ((features as f32).sqrt().round() as usize).clamp(INPUT_NODES.0, INPUT_NODES.1);
    let declared = declared_classes(output_dims);

    if class_count > 10 {
        let mut h1 = scaled(input, 0.65, 14, 20);
        if h1 == input {
            h1 -= 1;
        }
        let mut h2 = scaled(h1, 0.7, 10, 16);
        if h2 == h1 {
            h2 -= 1;
        }
        let output = declared.unwrap_or(class_count).min(26).clamp(OUTPUT_NODES.0, OUTPUT_NODES.1);
        if h2 == output {
            h2 -= 1;
        }
        vec![
            LayerSpec::new("Input", input),
            LayerSpec::new("Hidden 1", h1),
            LayerSpec::new("Hidden 2", h2),
            LayerSpec::new("Output", output),
        ]
    } else {
        let mut hidden = scaled(input, 0.58, 12, 18);
        if hidden >= input {
            hidden = input - 1;
        }
        let output = declared.map(|c| c.clamp(2, 10)).unwrap_or(class_count).clamp(OUTPUT_NODES.0, OUTPUT_NODES.1);
        if hidden == output {
            hidden -= 1;
        }
        vec![
            LayerSpec::new("Input", input),
            LayerSpec::new("Hidden", hidden),
            LayerSpec::new("Output", output),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(layers: &[LayerSpec]) -> Vec<usize> {
        layers.iter().map(|l| l.nodes).collect()
    }

    #[test]
    fn digit_defaults() {
        let layers = plan_layers(Some(&[1, 1, 28, 28]), Some(&[1, 10]), 10);
        assert_eq!(counts(&layers), vec![28, 16, 10]);
        assert_eq!(layers[1].name, "Hidden");
    }

    #[test]
    fn letter_defaults() {
        let layers = plan_layers(Some(&[-1, 784]), Some(&[-1, 26]), 26);
        // 28 → round(18.2)=18 → round(12.6)=13 → 26
        assert_eq!(counts(&layers), vec![28, 18, 13, 26]);
    }

    #[test]
    fn undeclared_input_assumes_784() {
        assert_eq!(input_features(None), 784);
        assert_eq!(input_features(Some(&[])), 784);
        assert_eq!(input_features(Some(&[784])), 784);
        assert_eq!(input_features(Some(&[-1, 1, 28, 28])), 784);
        assert_eq!(plan_layers(None, None, 10)[0].nodes, 28);
    }

    #[test]
    fn input_column_is_clamped() {
        assert_eq!(plan_layers(Some(&[1, 16]), None, 10)[0].nodes, 20);
        assert_eq!(plan_layers(Some(&[1, 3, 224, 224]), None, 10)[0].nodes, 28);
    }

    #[test]
    fn digit_output_comes_from_last_positive_dim() {
        assert_eq!(plan_layers(None, Some(&[1, 4, -1]), 10)[2].nodes, 4);
        assert_eq!(plan_layers(None, Some(&[1, 1000]), 10)[2].nodes, 10);
        assert_eq!(plan_layers(None, Some(&[1, 1]), 10)[2].nodes, 2);
        assert_eq!(plan_layers(None, None, 10)[2].nodes, 10);
    }

    #[test]
    fn letter_output_is_capped_at_26() {
        assert_eq!(plan_layers(None, Some(&[1, 47]), 47)[3].nodes, 26);
        assert_eq!(plan_layers(None, Some(&[1, 13]), 26)[3].nodes, 13);
    }

    #[test]
    fn hidden_nudged_off_matching_output() {
        // h2 would be 13, same as the declared 13-way head.
        let layers = plan_layers(None, Some(&[1, 13]), 26);
        assert_eq!(counts(&layers), vec![28, 18, 12, 13]);
    }

    #[test]
    fn adjacent_columns_always_differ() {
        let inputs: Vec<Option<Vec<i64>>> = vec![
            None,
            Some(vec![1, 784]),
            Some(vec![1, 400]),
            Some(vec![1, 441]),
            Some(vec![1, 529]),
            Some(vec![1, 1, 22, 22]),
            Some(vec![1, 9999]),
            Some(vec![-1, -1]),
        ];
        for input in &inputs {
            for out in 1..=60i64 {
                for classes in [10usize, 26, 47] {
                    let layers = plan_layers(input.as_deref(), Some(&[1, out]), classes);
                    for pair in layers.windows(2) {
                        assert_ne!(pair[0].nodes, pair[1].nodes, "{:?} / {} / {}", input, out, classes);
                    }
                    let last = layers.last().unwrap().nodes;
                    assert!((2..=100).contains(&last));
                    assert!((20..=28).contains(&layers[0].nodes));
                }
            }
        }
    }
}
