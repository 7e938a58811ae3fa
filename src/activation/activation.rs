use serde::{Serialize, Deserialize};
use std::f32::consts::PI;

use crate::probability::finite_logit;

/// Per-layer activation of a dense model file.
///
/// Only the forward direction is needed here; models arrive already trained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ActivationFunction {
    Sigmoid,
    ReLU,
    Identity,
    /// Vector-valued; see `ActivationFunction::apply`.
    Softmax,
    Tanh,
    LeakyReLU { alpha: f32 },
    Elu { alpha: f32 },
    Gelu,
    Swish,
}

impl ActivationFunction {
    /// Applies the activation in place to a whole layer output.
    pub fn apply(&self, z: &mut [f32]) {
        match self {
            ActivationFunction::Softmax => softmax_in_place(z),
            other => z.iter_mut().for_each(|x| *x = other.scalar(*x)),
        }
    }

    fn scalar(&self, x: f32) -> f32 {
        match self {
            ActivationFunction::Sigmoid => 1.0 / (1.0 + (-x).exp()),
            ActivationFunction::ReLU => x.max(0.0),
            ActivationFunction::Identity | ActivationFunction::Softmax => x,
            ActivationFunction::Tanh => x.tanh(),
            ActivationFunction::LeakyReLU { alpha } => if x > 0.0 { x } else { alpha * x },
            ActivationFunction::Elu { alpha } => if x > 0.0 { x } else { alpha * (x.exp() - 1.0) },
            ActivationFunction::Gelu => {
                let c = (2.0_f32 / PI).sqrt();
                0.5 * x * (1.0 + (c * (x + 0.044715 * x.powi(3))).tanh())
            }
            ActivationFunction::Swish => x / (1.0 + (-x).exp()),
        }
    }

    /// ReLU-family layers get He init, everything else Xavier.
    pub fn prefers_he_init(&self) -> bool {
        matches!(self, ActivationFunction::ReLU | ActivationFunction::LeakyReLU { .. })
    }
}

fn softmax_in_place(z: &mut [f32]) {
    for x in z.iter_mut() {
        *x = finite_logit(*x);
    }
    let max = z.iter().cloned().fold(f32::MIN, f32::max);
    let mut sum = 0.0;
    for x in z.iter_mut() {
        *x = (*x - max).exp();
        sum += *x;
    }
    if sum > 0.0 {
        z.iter_mut().for_each(|x| *x /= sum);
    }
}
