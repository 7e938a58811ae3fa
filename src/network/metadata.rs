use serde::{Deserialize, Serialize};

use crate::engine::TensorInfo;

/// Annotations stored next to the weights of a dense model file.
///
/// `inputs`/`outputs` play the role of exported tensor metadata: names plus
/// possibly partial dims. Everything else is optional so older files load.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ModelMetadata {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub inputs: Vec<TensorInfo>,
    #[serde(default)]
    pub outputs: Vec<TensorInfo>,
    /// Human-readable class labels for the output layer (e.g. ["A",...,"Z"]).
    #[serde(default)]
    pub output_labels: Option<Vec<String>>,
}
