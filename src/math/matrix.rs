use rand::prelude::*;
use serde::{Serialize, Deserialize};
use std::f32::consts::PI;

/// Row-major weight matrix as stored in model JSON.
///
/// A dense layer with fan-in `n` and `m` units keeps an `n × m` weight matrix
/// and a `1 × m` bias matrix, so a forward step is `input · W + b`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<Vec<f32>>,
}

impl Matrix {
    pub fn zeros(rows: usize, cols: usize) -> Matrix {
        Matrix { rows, cols, data: vec![vec![0.0; cols]; rows] }
    }

    /// Samples a single value from N(0, 1) using the Box-Muller transform.
    fn sample_standard_normal<R: Rng>(rng: &mut R) -> f32 {
        // (0, 1] keeps ln() finite.
        let u1: f32 = 1.0 - rng.gen::<f32>();
        let u2: f32 = 1.0 - rng.gen::<f32>();
        (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
    }

    fn normal<R: Rng>(rows: usize, cols: usize, std_dev: f32, rng: &mut R) -> Matrix {
        let data = (0..rows)
            .map(|_| (0..cols).map(|_| Matrix::sample_standard_normal(rng) * std_dev).collect())
            .collect();
        Matrix { rows, cols, data }
    }

    /// He initialization: N(0, sqrt(2 / rows)), `rows` being the fan-in.
    pub fn he<R: Rng>(rows: usize, cols: usize, rng: &mut R) -> Matrix {
        Matrix::normal(rows, cols, (2.0 / rows.max(1) as f32).sqrt(), rng)
    }

    /// Xavier (Glorot) initialization: N(0, sqrt(1 / rows)).
    pub fn xavier<R: Rng>(rows: usize, cols: usize, rng: &mut R) -> Matrix {
        Matrix::normal(rows, cols, (1.0 / rows.max(1) as f32).sqrt(), rng)
    }

    /// Checks that `rows`/`cols` agree with the nested data, which is not
    /// guaranteed for hand-edited or foreign model files.
    pub fn check_dims(&self) -> Result<(), String> {
        if self.data.len() != self.rows {
            return Err(format!("declared {} rows, found {}", self.rows, self.data.len()));
        }
        if let Some((i, row)) = self.data.iter().enumerate().find(|(_, r)| r.len() != self.cols) {
            return Err(format!("row {} has {} columns, expected {}", i, row.len(), self.cols));
        }
        Ok(())
    }

    /// Row vector times matrix: `input (1 × rows) · self (rows × cols)`.
    pub fn vec_mul(&self, input: &[f32]) -> Vec<f32> {
        debug_assert_eq!(input.len(), self.rows);
        let mut out = vec![0.0f32; self.cols];
        for (x, row) in input.iter().zip(self.data.iter()) {
            if *x == 0.0 {
                continue;
            }
            for (acc, w) in out.iter_mut().zip(row.iter()) {
                *acc += x * w;
            }
        }
        out
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Matrix { rows: 0, cols: 0, data: vec![] }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;

    #[test]
    fn vec_mul_matches_hand_computation() {
        let m = Matrix { rows: 2, cols: 3, data: vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]] };
        assert_eq!(m.vec_mul(&[1.0, 2.0]), vec![9.0, 12.0, 15.0]);
    }

    #[test]
    fn check_dims_rejects_ragged_rows() {
        let m = Matrix { rows: 2, cols: 2, data: vec![vec![1.0, 2.0], vec![3.0]] };
        assert!(m.check_dims().unwrap_err().contains("row 1"));
        assert!(Matrix::zeros(3, 4).check_dims().is_ok());
    }

    #[test]
    fn he_init_has_expected_shape_and_spread() {
        let mut rng = StdRng::seed_from_u64(7);
        let m = Matrix::he(784, 16, &mut rng);
        assert_eq!((m.rows, m.cols), (784, 16));
        let n = (m.rows * m.cols) as f32;
        let var = m.data.iter().flatten().map(|x| x * x).sum::<f32>() / n;
        // Target variance 2 / 784.
        assert!((var - 2.0 / 784.0).abs() < 0.001);
    }
}
