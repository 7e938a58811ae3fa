//! Engine boundary.
//!
//! The pipeline treats the inference engine as an opaque capability: it can
//! describe its declared inputs/outputs and run one set of feeds. `DenseEngine`
//! is the built-in implementation; tests substitute scripted doubles.

pub mod dense;
pub mod tensor;

pub use dense::DenseEngine;
pub use tensor::{ElementType, EngineMetadata, NamedTensors, Tensor, TensorInfo};

use crate::error::EngineError;

pub trait InferenceEngine: Send + Sync {
    fn metadata(&self) -> &EngineMetadata;

    /// Runs a single inference call. Engines reject feeds whose shape they
    /// cannot interpret with an `EngineError` describing why.
    fn run(&self, feeds: &NamedTensors) -> Result<NamedTensors, EngineError>;
}
