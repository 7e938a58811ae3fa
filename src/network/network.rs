use std::path::Path;

use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::{activation::activation::ActivationFunction, layers::dense::Layer};
use crate::error::{Result, SketchError};
use crate::network::metadata::ModelMetadata;

/// A dense feed-forward model as stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Network {
    pub layers: Vec<Layer>,
    #[serde(default)]
    pub metadata: ModelMetadata,
}

impl Network {
    /// Builds an untrained network from (size, input_size, activation) tuples.
    pub fn new<R: Rng>(layer_specs: Vec<(usize, usize, ActivationFunction)>, rng: &mut R) -> Network {
        let layers = layer_specs.into_iter()
            .map(|(size, input_size, activation)| Layer::new(size, input_size, activation, rng))
            .collect();
        Network { layers, metadata: ModelMetadata::default() }
    }

    pub fn with_metadata(mut self, metadata: ModelMetadata) -> Network {
        self.metadata = metadata;
        self
    }

    /// Fan-in of the first layer, i.e. the flat input length.
    pub fn input_len(&self) -> usize {
        self.layers.first().map(|l| l.input_size()).unwrap_or(0)
    }

    pub fn output_len(&self) -> usize {
        self.layers.last().map(|l| l.size).unwrap_or(0)
    }

    pub fn forward(&self, input: &[f32]) -> Vec<f32> {
        let mut current = input.to_vec();
        for layer in &self.layers {
            current = layer.feed(&current);
        }
        current
    }

    /// Rejects empty networks and layers whose fan-in does not match the
    /// previous layer's width.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.layers.is_empty() {
            return Err("model has no layers".into());
        }
        for (i, layer) in self.layers.iter().enumerate() {
            layer.check().map_err(|e| format!("layer {}: {}", i, e))?;
            if i > 0 && layer.input_size() != self.layers[i - 1].size {
                return Err(format!(
                    "layer {} expects {} inputs but layer {} has {} units",
                    i, layer.input_size(), i - 1, self.layers[i - 1].size
                ));
            }
        }
        Ok(())
    }

    /// Serializes the network to a pretty-printed JSON file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)
            .map_err(|e| SketchError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))
    }

    /// Reads a network previously written by `save_json`.
    pub fn load_json(path: &Path) -> Result<Network> {
        let bytes = std::fs::read(path).map_err(|e| {
            SketchError::ModelLoad(format!("cannot read '{}': {}", path.display(), e))
        })?;
        Network::from_slice(&bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Network> {
        serde_json::from_slice(bytes)
            .map_err(|e| SketchError::ModelLoad(format!("invalid model JSON: {}", e)))
    }
}
