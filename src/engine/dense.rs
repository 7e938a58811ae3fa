use std::path::Path;

use crate::engine::{EngineMetadata, InferenceEngine, NamedTensors, Tensor, TensorInfo};
use crate::error::{EngineError, Result, SketchError};
use crate::network::{ModelMetadata, Network};

/// `InferenceEngine` over a dense JSON model.
///
/// Feeds are checked against the declared input metadata the way exported
/// graph runtimes do, so a model declaring `[1, 1, 28, 28]` rejects a
/// `[1, 784]` view of the same buffer.
#[derive(Debug, Clone)]
pub struct DenseEngine {
    network: Network,
    metadata: EngineMetadata,
}

impl DenseEngine {
    pub fn load(path: &Path) -> Result<DenseEngine> {
        let network = Network::load_json(path)?;
        let engine = DenseEngine::from_network(network)?;
        log::debug!(
            "loaded dense model '{}': {} layers, inputs {:?}",
            path.display(),
            engine.network.layers.len(),
            engine.metadata.input_names()
        );
        Ok(engine)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<DenseEngine> {
        DenseEngine::from_network(Network::from_slice(bytes)?)
    }

    /// Validates the network and derives engine metadata from it.
    ///
    /// A model must name at least one input. Outputs default to a single
    /// `output` tensor with undeclared dims.
    pub fn from_network(network: Network) -> Result<DenseEngine> {
        network.validate().map_err(SketchError::ModelLoad)?;
        let ModelMetadata { inputs, outputs, .. } = network.metadata.clone();
        if inputs.is_empty() {
            return Err(SketchError::ModelLoad("model declares no inputs".into()));
        }
        let outputs = if outputs.is_empty() {
            vec![TensorInfo::new("output", vec![])]
        } else {
            outputs
        };
        Ok(DenseEngine { network, metadata: EngineMetadata { inputs, outputs } })
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        self.network.save_json(path)
    }
}

impl InferenceEngine for DenseEngine {
    fn metadata(&self) -> &EngineMetadata {
        &self.metadata
    }

    fn run(&self, feeds: &NamedTensors) -> std::result::Result<NamedTensors, EngineError> {
        let input = &self.metadata.inputs[0];
        let tensor = feeds
            .iter()
            .find(|(name, _)| *name == input.name)
            .map(|(_, t)| t)
            .ok_or_else(|| EngineError::new(format!("missing feed for input '{}'", input.name)))?;

        if !input.accepts(tensor.shape()) {
            return Err(EngineError::new(format!(
                "input '{}' expects dims {:?}, got {:?}",
                input.name,
                input.dims,
                tensor.shape()
            )));
        }
        let expected = self.network.input_len();
        if tensor.len() != expected {
            return Err(EngineError::new(format!(
                "input '{}' expects {} elements, got {}",
                input.name,
                expected,
                tensor.len()
            )));
        }

        let out = self.network.forward(tensor.data());
        let len = out.len();
        let output = Tensor::new(out.into(), vec![1, len])
            .ok_or_else(|| EngineError::new("output buffer does not match its shape"))?;
        Ok(vec![(self.metadata.outputs[0].name.clone(), output)])
    }
}
