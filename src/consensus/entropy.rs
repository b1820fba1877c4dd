// =============================================================================
// Component Entropy — Information-theoretic balance of the field components
// =============================================================================
//
// Treats the magnitudes of the field's additive components as a discrete
// distribution and measures its Shannon entropy, normalised by ln(n) (the
// maximum for n parts):
//
//   w_i = |x_i| / Σ|x|
//   H   = -Σ w_i · ln(w_i)          (0 · ln 0 := 0)
//   Cnonlin = 1 - H / ln(n)
//
// Cnonlin is 0 when the components are perfectly even and 1 when a single
// component carries the whole field.

use tracing::trace;

/// Normalised Shannon entropy of the magnitudes in `parts`, in [0, 1].
///
/// Returns `None` when fewer than two parts are given or the magnitudes sum
/// to zero.
pub fn normalized_entropy(parts: &[f64]) -> Option<f64> {
    if parts.len() < 2 {
        return None;
    }

    let total: f64 = parts.iter().map(|p| p.abs()).sum();
    if total <= 0.0 || !total.is_finite() {
        return None;
    }

    let h: f64 = parts
        .iter()
        .map(|p| p.abs() / total)
        .filter(|w| *w > 0.0)
        .map(|w| -w * w.ln())
        .sum();

    let max_h = (parts.len() as f64).ln();
    Some((h / max_h).clamp(0.0, 1.0))
}

/// Cnonlin for the substrate / observer / echo split.
///
/// Returns 0.0 when all three components are zero.
pub fn nonlinear_coherence(substrate: f64, observer: f64, echo: f64) -> f64 {
    match normalized_entropy(&[substrate, observer, echo]) {
        Some(h) => {
            trace!(entropy = format!("{:.4}", h), "component entropy calculated");
            1.0 - h
        }
        None => 0.0,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn even_split_has_max_entropy() {
        let h = normalized_entropy(&[0.2, 0.2, 0.2]).unwrap();
        assert!((h - 1.0).abs() < 1e-12);
        assert!(nonlinear_coherence(0.2, 0.2, 0.2).abs() < 1e-12);
    }

    #[test]
    fn single_component_has_zero_entropy() {
        let h = normalized_entropy(&[0.4, 0.0, 0.0]).unwrap();
        assert!(h.abs() < 1e-12);
        assert!((nonlinear_coherence(0.4, 0.0, 0.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn signs_are_ignored() {
        let a = nonlinear_coherence(0.3, -0.1, 0.05);
        let b = nonlinear_coherence(0.3, 0.1, -0.05);
        assert!((a - b).abs() < 1e-12);
    }

    #[test]
    fn zero_sum_yields_zero() {
        assert_eq!(nonlinear_coherence(0.0, 0.0, 0.0), 0.0);
        assert!(normalized_entropy(&[0.0, 0.0]).is_none());
    }

    #[test]
    fn fewer_than_two_parts_is_none() {
        assert!(normalized_entropy(&[1.0]).is_none());
        assert!(normalized_entropy(&[]).is_none());
    }

    #[test]
    fn uneven_split_is_between_bounds() {
        let c = nonlinear_coherence(0.3, 0.1, 0.05);
        assert!(c > 0.0 && c < 1.0, "got {}", c);
    }
}
