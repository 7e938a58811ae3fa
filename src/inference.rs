//! Shape-negotiating dispatch to an `InferenceEngine`.

use crate::engine::{InferenceEngine, NamedTensors, Tensor};
use crate::error::{Result, SketchError};

/// A candidate shape the engine refused, and why.
#[derive(Debug, Clone, PartialEq)]
pub struct Rejection {
    pub shape: Vec<usize>,
    pub message: String,
}

/// The first candidate the engine accepted.
#[derive(Debug, Clone)]
pub struct Accepted {
    pub shape: Vec<usize>,
    pub output_name: String,
    pub output: Tensor,
    /// Candidates rejected before this one, in order.
    pub failures: Vec<Rejection>,
}

/// Tries each candidate shape as a view over `buffer`, one engine run per
/// candidate, and returns the first success.
///
/// The output is the one named `output_name` if the engine produced it,
/// otherwise the first output. When every candidate fails the error carries
/// all attempted shapes and the last engine message.
pub fn run_candidates(
    engine: &dyn InferenceEngine,
    input_name: &str,
    output_name: Option<&str>,
    buffer: &Tensor,
    candidates: &[Vec<usize>],
) -> Result<Accepted> {
    let mut failures: Vec<Rejection> = Vec::new();

    let accepted = candidates.iter().find_map(|shape| {
        match attempt(engine, input_name, output_name, buffer, shape) {
            Ok((name, output)) => Some((shape.clone(), name, output)),
            Err(message) => {
                log::debug!("engine rejected shape {:?}: {}", shape, message);
                failures.push(Rejection { shape: shape.clone(), message });
                None
            }
        }
    });

    match accepted {
        Some((shape, output_name, output)) => Ok(Accepted { shape, output_name, output, failures }),
        None => {
            let last = failures.last().map(|f| f.message.clone()).unwrap_or_else(|| {
                format!("no candidate shape holds {} elements", buffer.len())
            });
            Err(SketchError::InferenceExhausted {
                attempted: failures.into_iter().map(|f| f.shape).collect(),
                last,
            })
        }
    }
}

fn attempt(
    engine: &dyn InferenceEngine,
    input_name: &str,
    output_name: Option<&str>,
    buffer: &Tensor,
    shape: &[usize],
) -> std::result::Result<(String, Tensor), String> {
    let view = buffer
        .reshaped(shape.to_vec())
        .ok_or_else(|| format!("shape {:?} does not hold {} elements", shape, buffer.len()))?;
    let feeds: NamedTensors = vec![(input_name.to_string(), view)];
    let outputs = engine.run(&feeds).map_err(|e| e.to_string())?;
    select_output(outputs, output_name).ok_or_else(|| "engine returned no outputs".to_string())
}

fn select_output(outputs: NamedTensors, wanted: Option<&str>) -> Option<(String, Tensor)> {
    let idx = wanted
        .and_then(|w| outputs.iter().position(|(name, _)| name == w))
        .unwrap_or(0);
    outputs.into_iter().nth(idx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{EngineMetadata, TensorInfo};
    use crate::error::EngineError;
    use crate::shape::fallback_shapes;
    use std::sync::Mutex;

    /// Accepts a single shape, records every call.
    struct OnlyShape {
        accept: Vec<usize>,
        calls: Mutex<Vec<Vec<usize>>>,
        meta: EngineMetadata,
        outputs: Vec<&'static str>,
    }

    impl OnlyShape {
        fn new(accept: Vec<usize>, outputs: Vec<&'static str>) -> Self {
            OnlyShape {
                accept,
                calls: Mutex::new(Vec::new()),
                meta: EngineMetadata {
                    inputs: vec![TensorInfo::new("x", vec![])],
                    outputs: outputs.iter().map(|n| TensorInfo::new(*n, vec![])).collect(),
                },
                outputs,
            }
        }
    }

    impl InferenceEngine for OnlyShape {
        fn metadata(&self) -> &EngineMetadata {
            &self.meta
        }

        fn run(&self, feeds: &NamedTensors) -> std::result::Result<NamedTensors, EngineError> {
            let shape = feeds[0].1.shape().to_vec();
            self.calls.lock().unwrap().push(shape.clone());
            if shape != self.accept {
                return Err(EngineError::new(format!("bad dims {:?}", shape)));
            }
            Ok(self
                .outputs
                .iter()
                .enumerate()
                .map(|(i, n)| (n.to_string(), Tensor::flat(vec![i as f32; 10])))
                .collect())
        }
    }

    fn buffer() -> Tensor {
        Tensor::flat(vec![0.25; 784])
    }

    #[test]
    fn stops_at_first_accepted_candidate() {
        let engine = OnlyShape::new(vec![1, 28, 28, 1], vec!["out"]);
        let cands = fallback_shapes().to_vec();
        let acc = run_candidates(&engine, "x", None, &buffer(), &cands).unwrap();
        assert_eq!(acc.shape, vec![1, 28, 28, 1]);
        assert_eq!(acc.failures.len(), 2);
        assert_eq!(acc.failures[0].message, "bad dims [1, 1, 28, 28]");
        // the flat fallback was never tried
        assert_eq!(engine.calls.lock().unwrap().len(), 3);
    }

    #[test]
    fn flat_layout_is_reached_last() {
        let engine = OnlyShape::new(vec![1, 784], vec!["out"]);
        let buf = buffer();
        let acc = run_candidates(&engine, "x", None, &buf, &fallback_shapes()).unwrap();
        assert_eq!(acc.failures.len(), 3);
    }

    #[test]
    fn exhaustion_reports_all_attempts_and_last_message() {
        let engine = OnlyShape::new(vec![784], vec!["out"]);
        let cands = fallback_shapes().to_vec();
        match run_candidates(&engine, "x", None, &buffer(), &cands) {
            Err(SketchError::InferenceExhausted { attempted, last }) => {
                assert_eq!(attempted, cands);
                assert_eq!(last, "bad dims [1, 784]");
            }
            other => panic!("unexpected: {:?}", other.map(|a| a.shape)),
        }
    }

    #[test]
    fn empty_candidate_list_is_exhausted_without_calls() {
        let engine = OnlyShape::new(vec![1, 784], vec!["out"]);
        let err = run_candidates(&engine, "x", None, &buffer(), &[]).unwrap_err();
        assert!(err.to_string().contains("no candidate shape holds 784 elements"));
        assert!(engine.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn named_output_is_preferred_over_first() {
        let engine = OnlyShape::new(vec![1, 784], vec!["aux", "probs"]);
        let acc = run_candidates(&engine, "x", Some("probs"), &buffer(), &[vec![1, 784]]).unwrap();
        assert_eq!(acc.output_name, "probs");
        assert_eq!(acc.output.data()[0], 1.0);

        let acc = run_candidates(&engine, "x", Some("missing"), &buffer(), &[vec![1, 784]]).unwrap();
        assert_eq!(acc.output_name, "aux");
    }
}
