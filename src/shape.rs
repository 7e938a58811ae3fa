//! Candidate input shapes for an engine whose expected layout is unknown.

use crate::grid::GRID_SIZE;

/// Common single-channel image layouts, tried after any declared shape:
/// NCHW, CHW, NHWC, then flat.
pub fn fallback_shapes() -> [Vec<usize>; 4] {
    let n = GRID_SIZE;
    [vec![1, 1, n, n], vec![1, n, n], vec![1, n, n, 1], vec![1, n * n]]
}

/// Replaces unknown (non-positive) dims with 1.
pub fn coerce_declared(dims: &[i64]) -> Vec<usize> {
    dims.iter().map(|&d| if d > 0 { d as usize } else { 1 }).collect()
}

/// Ordered, deduplicated shapes whose element count is `len`.
///
/// The declared shape, when present, comes first. Shapes with the wrong
/// product are skipped.
pub fn candidate_shapes(len: usize, declared: Option<&[i64]>) -> Vec<Vec<usize>> {
    let declared = declared.filter(|d| !d.is_empty()).map(coerce_declared);
    let mut out: Vec<Vec<usize>> = Vec::new();
    for shape in declared.into_iter().chain(fallback_shapes()) {
        if shape.iter().product::<usize>() != len || out.contains(&shape) {
            continue;
        }
        out.push(shape);
    }
    out
}
