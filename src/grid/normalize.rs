use image::{imageops::FilterType, RgbaImage};

use crate::grid::{NormalizedGrid, GRID_SIZE, INK_THRESHOLD, TARGET_CONTENT};

/// Inclusive cell bounds of the ink in a grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub top: usize,
    pub left: usize,
    pub bottom: usize,
    pub right: usize,
}

impl BoundingBox {
    pub fn width(&self) -> usize {
        self.right - self.left + 1
    }

    pub fn height(&self) -> usize {
        self.bottom - self.top + 1
    }
}

/// Smoothly resamples the canvas to `GRID_SIZE`², reading only the red
/// channel and inverting it so ink is high and paper is 0.
pub fn downsample(canvas: &RgbaImage) -> NormalizedGrid {
    let n = GRID_SIZE as u32;
    let small = image::imageops::resize(canvas, n, n, FilterType::Triangle);
    let cells = small.pixels().map(|p| 1.0 - p.0[0] as f32 / 255.0).collect();
    NormalizedGrid { rows: GRID_SIZE, cols: GRID_SIZE, cells }
}

/// Tight box around cells whose intensity exceeds `threshold`.
pub fn bounding_box(grid: &NormalizedGrid, threshold: f32) -> Option<BoundingBox> {
    let mut bbox: Option<BoundingBox> = None;
    for row in 0..grid.rows {
        for col in 0..grid.cols {
            if grid.at(row, col) <= threshold {
                continue;
            }
            let b = bbox.get_or_insert(BoundingBox { top: row, left: col, bottom: row, right: col });
            b.top = b.top.min(row);
            b.left = b.left.min(col);
            b.bottom = b.bottom.max(row);
            b.right = b.right.max(col);
        }
    }
    bbox
}

/// Crops to the ink, scales the longer side to `TARGET_CONTENT` and centres
/// the result on a fresh grid.
///
/// A grid with no cell above `INK_THRESHOLD` is returned unchanged; its ink
/// sum stays near zero and the pipeline goes idle on it.
pub fn normalize_grid(grid: &NormalizedGrid) -> NormalizedGrid {
    let Some(bbox) = bounding_box(grid, INK_THRESHOLD) else {
        return grid.clone();
    };

    let (box_w, box_h) = (bbox.width(), bbox.height());
    let scale = TARGET_CONTENT as f32 / box_w.max(box_h) as f32;
    let drawn_w = ((box_w as f32 * scale).round() as usize).clamp(1, GRID_SIZE);
    let drawn_h = ((box_h as f32 * scale).round() as usize).clamp(1, GRID_SIZE);
    let off_x = (GRID_SIZE - drawn_w) / 2;
    let off_y = (GRID_SIZE - drawn_h) / 2;

    let mut cells = vec![0.0f32; GRID_SIZE * GRID_SIZE];
    for dy in 0..drawn_h {
        let sy = bbox.top + nearest(dy, drawn_h, box_h);
        for dx in 0..drawn_w {
            let sx = bbox.left + nearest(dx, drawn_w, box_w);
            let src = grid.at(sy, sx);
            let dst = &mut cells[(off_y + dy) * GRID_SIZE + off_x + dx];
            // ink as alpha, source-over
            *dst = src + *dst * (1.0 - src);
        }
    }
    NormalizedGrid { rows: GRID_SIZE, cols: GRID_SIZE, cells }
}

/// Nearest source index for destination `d` when stretching `src_len`
/// cells over `dst_len`.
fn nearest(d: usize, dst_len: usize, src_len: usize) -> usize {
    let s = ((d as f32 + 0.5) * src_len as f32 / dst_len as f32).floor() as usize;
    s.min(src_len - 1)
}

/// Full preprocessing of one canvas: downsample, then bounding-box normalize.
pub fn normalize(canvas: &RgbaImage) -> NormalizedGrid {
    normalize_grid(&downsample(canvas))
}
