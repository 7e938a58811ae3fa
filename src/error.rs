use thiserror::Error;

/// Failures surfaced by the load and prediction routines.
///
/// A blank canvas is not an error; see `pipeline::Prediction::Idle`.
#[derive(Debug, Error)]
pub enum SketchError {
    /// Engine unavailable, model file unreadable or malformed, or missing input.
    #[error("model load failed: {0}")]
    ModelLoad(String),

    /// No candidate shape was accepted by the engine.
    #[error("inference failed for every candidate shape {shapes}: {last}", shapes = format_shapes(.attempted))]
    InferenceExhausted {
        attempted: Vec<Vec<usize>>,
        last: String,
    },

    /// Model output does not carry enough values for the mode's classes.
    #[error("output shape mismatch: expected {expected} classes, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    /// Canvas bytes could not be decoded into an image.
    #[error("invalid canvas: {0}")]
    InvalidCanvas(String),

    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Message returned by an `InferenceEngine` when a run is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct EngineError(pub String);

impl EngineError {
    pub fn new(msg: impl Into<String>) -> Self {
        EngineError(msg.into())
    }
}

/// Formats shapes as `[1, 28, 28], [1, 784]`.
pub fn format_shapes(shapes: &[Vec<usize>]) -> String {
    shapes
        .iter()
        .map(|s| format!("{:?}", s))
        .collect::<Vec<_>>()
        .join(", ")
}

pub type Result<T> = std::result::Result<T, SketchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_mismatch_names_both_counts() {
        let err = SketchError::ShapeMismatch { expected: 10, actual: 8 };
        let msg = err.to_string();
        assert!(msg.contains("expected 10"));
        assert!(msg.contains("got 8"));
    }

    #[test]
    fn exhausted_lists_every_attempt_and_last_message() {
        let err = SketchError::InferenceExhausted {
            attempted: vec![vec![1, 1, 28, 28], vec![1, 784]],
            last: "bad rank".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("[1, 1, 28, 28], [1, 784]"));
        assert!(msg.ends_with("bad rank"));
    }
}
