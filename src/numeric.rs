// =============================================================================
// Numeric Guards — Stage-boundary sanitisation
// =============================================================================
//
// Every stage funnels its outputs through these helpers before returning or
// storing them.  A non-finite value is a defect somewhere upstream; it is
// coerced to 0.0 and reported via `warn!` so that it never reaches a rolling
// history buffer.

use tracing::warn;

/// Replace a non-finite value with 0.0, logging which stage produced it.
#[inline]
pub fn sanitize(value: f64, stage: &'static str, field: &'static str) -> f64 {
    if value.is_finite() {
        value
    } else {
        warn!(stage, field, value = %value, "non-finite value coerced to 0");
        0.0
    }
}

/// Sanitise and clamp into the unit interval [0, 1].
#[inline]
pub fn clamp_unit(value: f64, stage: &'static str, field: &'static str) -> f64 {
    sanitize(value, stage, field).clamp(0.0, 1.0)
}

/// Arithmetic mean.  Returns 0.0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation.  Returns 0.0 for an empty slice.
pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|x| (x - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}
