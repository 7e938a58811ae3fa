//! Canvas → model-input grid.
//!
//! Freehand strokes arrive at whatever resolution the canvas has. Classifiers
//! trained on MNIST-style corpora expect a 28×28 grid where the glyph's
//! bounding box has been scaled to 20 cells and centred, so the raw canvas is
//! downsampled, cropped, rescaled and re-centred here before inference.

pub mod decode;
pub mod normalize;
pub mod stroke;

pub use decode::decode_canvas;
pub use normalize::{bounding_box, downsample, normalize, normalize_grid, BoundingBox};
pub use stroke::{Stroke, StrokeCanvas};

/// Side of the model-input grid.
pub const GRID_SIZE: usize = 28;
/// Longer side of the glyph after bounding-box rescaling.
pub const TARGET_CONTENT: usize = 20;
/// Cells above this intensity count as ink when cropping.
pub const INK_THRESHOLD: f32 = 0.08;
/// Below this total intensity the canvas is treated as blank.
pub const IDLE_INK_SUM: f32 = 2.0;

/// Row-major grid of intensities in [0, 1]; ink is high, background 0.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedGrid {
    rows: usize,
    cols: usize,
    cells: Vec<f32>,
}

impl NormalizedGrid {
    pub fn new(rows: usize, cols: usize, cells: Vec<f32>) -> Option<NormalizedGrid> {
        if rows * cols != cells.len() {
            return None;
        }
        Some(NormalizedGrid { rows, cols, cells })
    }

    pub fn blank() -> NormalizedGrid {
        NormalizedGrid { rows: GRID_SIZE, cols: GRID_SIZE, cells: vec![0.0; GRID_SIZE * GRID_SIZE] }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn cells(&self) -> &[f32] {
        &self.cells
    }

    pub fn into_cells(self) -> Vec<f32> {
        self.cells
    }

    pub fn at(&self, row: usize, col: usize) -> f32 {
        self.cells[row * self.cols + col]
    }

    pub fn ink_sum(&self) -> f32 {
        self.cells.iter().sum()
    }

    /// Too faint to be a glyph; predictions are suppressed.
    pub fn is_blank(&self) -> bool {
        self.ink_sum() < IDLE_INK_SUM
    }

    /// Swaps the row and column axes: `out[c*R + r] = in[r*C + c]`.
    pub fn transposed(&self) -> NormalizedGrid {
        let (r_n, c_n) = (self.rows, self.cols);
        let mut out = vec![0.0; self.cells.len()];
        for r in 0..r_n {
            for c in 0..c_n {
                out[c * r_n + r] = self.cells[r * c_n + c];
            }
        }
        NormalizedGrid { rows: c_n, cols: r_n, cells: out }
    }

    /// Text rendering for terminals, darkest glyph for the strongest ink.
    pub fn to_ascii(&self) -> String {
        const RAMP: &[u8] = b" .:-=+*#%@";
        let mut s = String::with_capacity((self.cols + 1) * self.rows);
        for row in self.cells.chunks(self.cols) {
            for &v in row {
                let idx = (v.clamp(0.0, 1.0) * (RAMP.len() - 1) as f32).round() as usize;
                s.push(RAMP[idx] as char);
            }
            s.push('\n');
        }
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transpose_permutes_every_cell() {
        let cells: Vec<f32> = (0..GRID_SIZE * GRID_SIZE).map(|i| i as f32).collect();
        let g = NormalizedGrid::new(GRID_SIZE, GRID_SIZE, cells).unwrap();
        let t = g.transposed();
        for r in 0..GRID_SIZE {
            for c in 0..GRID_SIZE {
                assert_eq!(t.cells()[c * GRID_SIZE + r], g.cells()[r * GRID_SIZE + c]);
            }
        }
        assert_eq!(t.transposed(), g);
    }

    #[test]
    fn transpose_swaps_dims_of_rectangular_grid() {
        let g = NormalizedGrid::new(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let t = g.transposed();
        assert_eq!((t.rows(), t.cols()), (3, 2));
        assert_eq!(t.cells(), &[1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
    }

    #[test]
    fn blank_threshold() {
        assert!(NormalizedGrid::blank().is_blank());
        let mut cells = vec![0.0; 784];
        cells[..3].copy_from_slice(&[1.0, 1.0, 0.5]);
        let g = NormalizedGrid::new(28, 28, cells).unwrap();
        assert!((g.ink_sum() - 2.5).abs() < 1e-6);
        assert!(!g.is_blank());
    }

    #[test]
    fn ascii_has_one_line_per_row() {
        let s = NormalizedGrid::blank().to_ascii();
        assert_eq!(s.lines().count(), GRID_SIZE);
        assert!(s.lines().all(|l| l.len() == GRID_SIZE && l.trim().is_empty()));
    }
}
