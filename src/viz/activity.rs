//! Synthetic per-layer activity for the network diagram.
//!
//! Only the engine's final output is observable, so the hidden columns are
//! illustrative: they track local ink density and prediction confidence and
//! carry no diagnostic meaning about the real model's internals. The input
//! column summarises the grid and the output column shows the actual class
//! probabilities.

use serde::Serialize;

use crate::viz::topology::LayerSpec;

/// Activity values in [0, 1], one `Vec` per `LayerSpec`, same order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerActivity {
    pub layers: Vec<Vec<f32>>,
}

const HIDDEN_GAIN: f32 = 1.8;
const CONFIDENCE_WEIGHT: f32 = 0.2;
const INDEX_BIAS: f32 = 0.05;

/// Grid normalized by its maximum, sampled at `nodes` evenly spaced indices.
pub fn input_summary(grid: &[f32], nodes: usize) -> Vec<f32> {
    if grid.is_empty() {
        return vec![0.0; nodes];
    }
    let max = grid.iter().cloned().fold(0.0f32, f32::max).max(1e-6);
    (0..nodes)
        .map(|i| {
            let idx = ((i as f32 + 0.5) * grid.len() as f32 / nodes as f32).floor() as usize;
            (grid[idx.min(grid.len() - 1)] / max).clamp(0.0, 1.0)
        })
        .collect()
}

/// Contiguous near-equal runs of `buffer`, one per node, each turned into
/// `mean * 1.8 + 0.2 * confidence + (i % 3) * 0.05`, clamped to [0, 1].
pub fn hidden_bins(buffer: &[f32], nodes: usize, confidence: f32) -> Vec<f32> {
    let len = buffer.len();
    (0..nodes)
        .map(|i| {
            let start = i * len / nodes;
            let end = ((i + 1) * len / nodes).max(start);
            let run = &buffer[start..end];
            let mean = if run.is_empty() { 0.0 } else { run.iter().sum::<f32>() / run.len() as f32 };
            let bias = (i % 3) as f32 * INDEX_BIAS;
            (mean * HIDDEN_GAIN + CONFIDENCE_WEIGHT * confidence + bias).clamp(0.0, 1.0)
        })
        .collect()
}

/// Builds activity for every column of `layers`.
///
/// `grid` feeds the input summary, `fed` (the buffer actually sent to the
/// engine, possibly transposed) feeds the hidden bins.
pub fn synthesize(layers: &[LayerSpec], grid: &[f32], fed: &[f32], probabilities: &[f32]) -> LayerActivity {
    let confidence = probabilities.iter().cloned().fold(0.0f32, f32::max);
    let last = layers.len().saturating_sub(1);
    let layers = layers
        .iter()
        .enumerate()
        .map(|(i, spec)| match i {
            0 => input_summary(grid, spec.nodes),
            i if i == last => output_column(probabilities, spec.nodes),
            _ => hidden_bins(fed, spec.nodes, confidence),
        })
        .collect();
    LayerActivity { layers }
}

/// The idle diagram: every column at rest.
pub fn idle(layers: &[LayerSpec]) -> LayerActivity {
    LayerActivity { layers: layers.iter().map(|l| vec![0.0; l.nodes]).collect() }
}

fn output_column(probabilities: &[f32], nodes: usize) -> Vec<f32> {
    let mut out: Vec<f32> = probabilities.iter().take(nodes).cloned().collect();
    out.resize(nodes, 0.0);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viz::topology::plan_layers;

    #[test]
    fn input_summary_scales_by_max() {
        let grid = vec![0.0, 0.25, 0.5, 0.0];
        assert_eq!(input_summary(&grid, 4), vec![0.0, 0.5, 1.0, 0.0]);
        assert_eq!(input_summary(&[0.0; 10], 3), vec![0.0; 3]);
        assert_eq!(input_summary(&[], 2), vec![0.0; 2]);
    }

    #[test]
    fn input_summary_nearest_index_on_downsample() {
        let grid: Vec<f32> = (0..784).map(|i| i as f32).collect();
        let s = input_summary(&grid, 28);
        assert_eq!(s.len(), 28);
        // floor((0 + 0.5) * 28) = 14
        assert!((s[0] - 14.0 / 783.0).abs() < 1e-6);
        assert!(s.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn hidden_bins_formula() {
        let buffer = vec![0.1, 0.1, 0.3, 0.3, 0.0, 0.0];
        let bins = hidden_bins(&buffer, 3, 0.5);
        let expect = [0.1 * 1.8 + 0.1, 0.3 * 1.8 + 0.1 + 0.05, 0.0 + 0.1 + 0.10];
        for (b, e) in bins.iter().zip(expect) {
            assert!((b - e).abs() < 1e-6, "{} vs {}", b, e);
        }
    }

    #[test]
    fn hidden_bins_clamp_and_cover_uneven_split() {
        let bins = hidden_bins(&[1.0; 784], 13, 1.0);
        assert_eq!(bins.len(), 13);
        assert!(bins.iter().all(|&b| b == 1.0));
        // more nodes than cells still yields finite values
        let bins = hidden_bins(&[0.5; 4], 6, 0.0);
        assert_eq!(bins.len(), 6);
        assert!(bins.iter().all(|b| (0.0..=1.0).contains(b)));
    }

    #[test]
    fn synthesize_fills_every_column() {
        let layers = plan_layers(None, None, 26);
        let grid = vec![0.5; 784];
        let mut probs = vec![0.0; 26];
        probs[4] = 1.0;
        let act = synthesize(&layers, &grid, &grid, &probs);
        assert_eq!(act.layers.len(), 4);
        for (a, l) in act.layers.iter().zip(&layers) {
            assert_eq!(a.len(), l.nodes);
            assert!(a.iter().all(|v| (0.0..=1.0).contains(v)));
        }
        assert_eq!(act.layers[3], probs);
    }

    #[test]
    fn idle_is_all_zero() {
        let layers = plan_layers(None, None, 10);
        let act = idle(&layers);
        assert!(act.layers.iter().flatten().all(|v| *v == 0.0));
        assert_eq!(act.layers[2].len(), 10);
    }
}
