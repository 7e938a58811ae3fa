pub mod math;
pub mod activation;
pub mod layers;
pub mod network;
pub mod engine;
pub mod error;
pub mod grid;
pub mod shape;
pub mod inference;
pub mod probability;
pub mod viz;
pub mod mode;
pub mod pipeline;
pub mod config;

// Convenience re-exports
pub use math::matrix::Matrix;
pub use activation::activation::ActivationFunction;
pub use layers::dense::Layer;
pub use network::{ModelMetadata, Network};
pub use engine::{DenseEngine, EngineMetadata, InferenceEngine, Tensor, TensorInfo};
pub use error::{EngineError, SketchError};
pub use grid::{NormalizedGrid, Stroke, StrokeCanvas};
pub use mode::{ModeConfig, ModeContext, ModeKey};
pub use pipeline::{load, predict, tick, LoadOutcome, Prediction, Report, TickOutcome};
pub use config::SketchConfig;
