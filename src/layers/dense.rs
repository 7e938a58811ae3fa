use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::{math::matrix::Matrix, activation::activation::ActivationFunction};

/// One fully-connected layer of a dense model file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Layer {
    pub size: usize,
    /// `input_size × size`
    pub weights: Matrix,
    /// `1 × size`
    pub biases: Matrix,
    pub activator: ActivationFunction,
}

impl Layer {
    /// Random layer; He init before ReLU-family activations, Xavier otherwise.
    /// Biases start at zero.
    pub fn new<R: Rng>(size: usize, input_size: usize, activation: ActivationFunction, rng: &mut R) -> Layer {
        let weights = if activation.prefers_he_init() {
            Matrix::he(input_size, size, rng)
        } else {
            Matrix::xavier(input_size, size, rng)
        };
        Layer {
            size,
            weights,
            biases: Matrix::zeros(1, size),
            activator: activation,
        }
    }

    pub fn input_size(&self) -> usize {
        self.weights.rows
    }

    pub fn feed(&self, input: &[f32]) -> Vec<f32> {
        let mut z = self.weights.vec_mul(input);
        for (v, b) in z.iter_mut().zip(self.biases.data[0].iter()) {
            *v += b;
        }
        self.activator.apply(&mut z);
        z
    }

    /// Validates matrix shapes against `size`.
    pub fn check(&self) -> Result<(), String> {
        self.weights.check_dims().map_err(|e| format!("weights: {}", e))?;
        self.biases.check_dims().map_err(|e| format!("biases: {}", e))?;
        if self.weights.cols != self.size {
            return Err(format!("weights have {} columns for {} units", self.weights.cols, self.size));
        }
        if self.biases.rows != 1 || self.biases.cols != self.size {
            return Err(format!(
                "biases are {}x{}, expected 1x{}",
                self.biases.rows, self.biases.cols, self.size
            ));
        }
        Ok(())
    }
}
