//! Angle and scoring helpers

use std::f64::consts::PI;

/// Wrap an angle into `(-pi, pi]`, preserving it modulo `2*pi`.
pub fn normalize_angle(angle: f64) -> f64 {
    if angle > -PI && angle <= PI {
        return angle;
    }
    let wrapped = (angle + PI).rem_euclid(2.0 * PI) - PI;
    if wrapped <= -PI {
        wrapped + 2.0 * PI
    } else {
        wrapped
    }
}

/// Min-max normalize `values` into `[0, 1]`.
///
/// The smallest value maps to 0 and the largest to 1. When every value is
/// equal the span is zero and all entries become 1.0.
pub fn normalize_min_max(values: &[f64]) -> Vec<f64> {
    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let span = max - min;
    if !(span > 0.0) || !span.is_finite() {
        return vec![1.0; values.len()];
    }
    values.iter().map(|v| (v - min) / span).collect()
}
