use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Element type of a tensor crossing the engine boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElementType {
    Float32,
}

/// A shaped view over a shared flat `f32` buffer.
///
/// Reshaping never copies: every candidate shape tried against an engine
/// points at the same allocation.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    pub element_type: ElementType,
    data: Arc<[f32]>,
    shape: Vec<usize>,
}

impl Tensor {
    /// Builds a tensor, or `None` when the shape's product is not the
    /// buffer length.
    pub fn new(data: Arc<[f32]>, shape: Vec<usize>) -> Option<Tensor> {
        if shape.iter().product::<usize>() != data.len() {
            return None;
        }
        Some(Tensor { element_type: ElementType::Float32, data, shape })
    }

    /// Rank-1 tensor over `values`.
    pub fn flat(values: Vec<f32>) -> Tensor {
        let len = values.len();
        Tensor { element_type: ElementType::Float32, data: values.into(), shape: vec![len] }
    }

    pub fn reshaped(&self, shape: Vec<usize>) -> Option<Tensor> {
        Tensor::new(Arc::clone(&self.data), shape)
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn shares_buffer_with(&self, other: &Tensor) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }
}

/// Declared name and dimensions of one engine input or output.
///
/// Dimensions follow the usual exported-model convention: a non-positive
/// entry (typically `-1`) is an unknown or dynamic axis. An empty `dims`
/// means nothing was declared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TensorInfo {
    pub name: String,
    #[serde(default)]
    pub dims: Vec<i64>,
}

impl TensorInfo {
    pub fn new(name: impl Into<String>, dims: Vec<i64>) -> Self {
        TensorInfo { name: name.into(), dims }
    }

    /// Declared dims, or `None` when the model left them out.
    pub fn declared(&self) -> Option<&[i64]> {
        if self.dims.is_empty() { None } else { Some(&self.dims) }
    }

    /// True when `shape` has the declared rank and agrees with every known
    /// (positive) declared dim. Undeclared metadata accepts any shape.
    pub fn accepts(&self, shape: &[usize]) -> bool {
        match self.declared() {
            None => true,
            Some(dims) => {
                dims.len() == shape.len()
                    && dims.iter().zip(shape).all(|(&d, &s)| d <= 0 || d as usize == s)
            }
        }
    }
}

/// What an engine exposes about its loaded model.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineMetadata {
    pub inputs: Vec<TensorInfo>,
    pub outputs: Vec<TensorInfo>,
}

impl EngineMetadata {
    pub fn input_names(&self) -> Vec<&str> {
        self.inputs.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn output_names(&self) -> Vec<&str> {
        self.outputs.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn input(&self, name: &str) -> Option<&TensorInfo> {
        self.inputs.iter().find(|t| t.name == name)
    }

    pub fn output(&self, name: &str) -> Option<&TensorInfo> {
        self.outputs.iter().find(|t| t.name == name)
    }
}

/// Named tensors fed to or returned from a run, in engine order.
pub type NamedTensors = Vec<(String, Tensor)>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reshape_shares_the_buffer() {
        let t = Tensor::flat(vec![0.0; 784]);
        let view = t.reshaped(vec![1, 1, 28, 28]).unwrap();
        assert!(view.shares_buffer_with(&t));
        assert_eq!(view.shape(), &[1, 1, 28, 28]);
        assert!(t.reshaped(vec![1, 28, 27]).is_none());
    }

    #[test]
    fn accepts_respects_rank_and_known_dims() {
        let info = TensorInfo::new("input", vec![-1, 1, 28, 28]);
        assert!(info.accepts(&[1, 1, 28, 28]));
        assert!(info.accepts(&[4, 1, 28, 28]));
        assert!(!info.accepts(&[1, 28, 28, 1]));
        assert!(!info.accepts(&[1, 784]));
        assert!(TensorInfo::new("x", vec![]).accepts(&[1, 784]));
    }
}
