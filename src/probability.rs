//! Raw model output → class probabilities.

use crate::error::{Result, SketchError};

/// Turns the tail of a raw output vector into `class_count` probabilities.
///
/// Only the last `class_count` values are used, since some exports prepend
/// auxiliary outputs. Values that already form a distribution pass through;
/// anything else (logits, log-probabilities) goes through a stable softmax.
pub fn normalize_probabilities(raw: &[f32], class_count: usize) -> Result<Vec<f32>> {
    if raw.len() < class_count || class_count == 0 {
        return Err(SketchError::ShapeMismatch { expected: class_count, actual: raw.len() });
    }
    let tail = &raw[raw.len() - class_count..];
    if is_distribution(tail) {
        Ok(tail.to_vec())
    } else {
        Ok(softmax(tail))
    }
}

/// Non-negative, max ≤ 1.0001 and summing into (0.99, 1.01).
pub fn is_distribution(values: &[f32]) -> bool {
    let mut sum = 0.0f32;
    for &v in values {
        if !(0.0..=1.0001).contains(&v) {
            return false;
        }
        sum += v;
    }
    sum > 0.99 && sum < 1.01
}

/// Bound that non-finite outputs are pinned to before softmax.
const LOGIT_BOUND: f32 = 1e30;

/// NaN and `-inf` sink to the lowest logit, `+inf` rises to the highest.
pub fn finite_logit(v: f32) -> f32 {
    if v.is_nan() {
        -LOGIT_BOUND
    } else {
        v.clamp(-LOGIT_BOUND, LOGIT_BOUND)
    }
}

/// Max-shifted softmax over finite-pinned values; the denominator never
/// drops below 1.
pub fn softmax(values: &[f32]) -> Vec<f32> {
    let values: Vec<f32> = values.iter().map(|&v| finite_logit(v)).collect();
    let max = values.iter().cloned().fold(-LOGIT_BOUND, f32::max);
    let exps: Vec<f32> = values.iter().map(|v| (v - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    let denom = if sum > 0.0 { sum } else { 1.0 };
    exps.into_iter().map(|e| e / denom).collect()
}

/// Index of the largest value; ties resolve to the first. `None` on empty input.
pub fn argmax(values: &[f32]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f32)>, (i, &v)| match best {
            Some((_, b)) if b >= v => best,
            _ => Some((i, v)),
        })
        .map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_distribution(p: &[f32]) {
        let sum: f32 = p.iter().sum();
        assert!((sum - 1.0).abs() <= 1e-4, "sum {}", sum);
        assert!(p.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn logits_go_through_softmax() {
        let raw = [2.0, 1.0, 0.1, -0.5, 0.0, 0.3, -1.0, 0.7, 1.5, -2.0];
        let p = normalize_probabilities(&raw, 10).unwrap();
        assert_eq!(p.len(), 10);
        assert_distribution(&p);
        assert_eq!(argmax(&p), argmax(&raw));
        assert_eq!(argmax(&p), Some(0));
    }

    #[test]
    fn existing_distribution_passes_through() {
        let mut raw = vec![0.05f32; 10];
        raw[3] = 0.55;
        let p = normalize_probabilities(&raw, 10).unwrap();
        assert_eq!(p, raw);
    }

    #[test]
    fn leading_auxiliary_values_are_sliced_off() {
        let mut raw = vec![99.0, -4.0];
        raw.extend([0.1f32; 10]);
        let p = normalize_probabilities(&raw, 10).unwrap();
        assert_eq!(p, vec![0.1f32; 10]);
    }

    #[test]
    fn short_output_is_a_shape_mismatch() {
        let err = normalize_probabilities(&[0.1; 8], 10).unwrap_err();
        match err {
            SketchError::ShapeMismatch { expected, actual } => assert_eq!((expected, actual), (10, 8)),
            other => panic!("unexpected {:?}", other),
        }
        assert!(normalize_probabilities(&[0.1; 8], 10)
            .unwrap_err()
            .to_string()
            .contains("expected 10 classes, got 8"));
    }

    #[test]
    fn huge_and_negative_inputs_stay_finite() {
        for raw in [
            vec![1e30f32, -1e30, 0.0, 5.0],
            vec![-1000.0; 4],
            vec![0.0; 4],
            vec![0.3, 0.3, 0.3, 0.3],
            vec![-0.1, 0.5, 0.3, 0.3],
        ] {
            let p = normalize_probabilities(&raw, 4).unwrap();
            assert_distribution(&p);
        }
    }

    #[test]
    fn non_finite_outputs_still_form_a_distribution() {
        let inf = f32::INFINITY;
        let p = normalize_probabilities(&[inf, 0.0, 1.0, 2.0], 4).unwrap();
        assert_distribution(&p);
        assert_eq!(argmax(&p), Some(0));

        let p = normalize_probabilities(&[-inf; 4], 4).unwrap();
        assert_distribution(&p);
        assert!(p.iter().all(|v| (v - 0.25).abs() < 1e-6));

        let p = normalize_probabilities(&[f32::NAN, 0.0, 1.0, 2.0], 4).unwrap();
        assert_distribution(&p);
        assert!(p[0] < 1e-6);
        assert_eq!(argmax(&p), Some(3));

        let p = normalize_probabilities(&[inf, inf, f32::NAN, -inf], 4).unwrap();
        assert_distribution(&p);
        assert_eq!(argmax(&p), Some(0));
    }

    #[test]
    fn argmax_edge_cases() {
        assert_eq!(argmax(&[]), None);
        assert_eq!(argmax(&[0.2, 0.7, 0.7]), Some(1));
    }
}
