// =============================================================================
// Lighthouse Consensus Validator — Adaptive event detection on fused metrics
// =============================================================================
//
// Fuses five heterogeneous sub-metrics by geometric mean and flags
// statistically significant spikes of the fused value L:
//
//   Clin    = coherence
//   Cnonlin = 1 - H(|substrate|, |observer|, |echo|) / ln 3
//   Cphi    = 1 - σ(last `stability_window` lambdas)    (0.5 until full)
//   Q       = coherence / (1 + Geff)                    (0 when Geff == 0)
//   L       = (Clin · Cnonlin · Cphi · Geff · |Q|)^(1/5), product floored at 0
//
// L is appended to a bounded history, then
//
//   threshold  = mean(history) + k·σ(history)   once `min_samples` exist,
//                threshold_floor otherwise
//   is_lhe     = L > threshold AND ftcp_gate
//   confidence = clamp((L - threshold) / threshold, 0, 1)   (0 if threshold <= 0)
//
// The Q zero-guard and the floor-before-root are separate policies and are
// kept that way: unifying them would move threshold crossings.

use tracing::{debug, info};

use crate::consensus::entropy::nonlinear_coherence;
use crate::history::BoundedHistory;
use crate::numeric::{clamp_unit, sanitize, std_dev};
use crate::runtime_config::ConsensusParams;
use crate::types::{ConsensusMetrics, ConsensusState, FieldState};

const STAGE: &str = "consensus";

/// Neutral Cphi while the stability window is filling.
const NEUTRAL_STABILITY: f64 = 0.5;

/// Number of fused metrics (root of the geometric mean).
const METRIC_COUNT: f64 = 5.0;

// =============================================================================
// LighthouseValidator
// =============================================================================

/// Stateful Lighthouse validator for a single instrument.
pub struct LighthouseValidator {
    params: ConsensusParams,
    /// Lambdas seen by this validator, for Cphi.
    lambdas: BoundedHistory<f64>,
    /// Past fused L values, for the adaptive threshold.
    history: BoundedHistory<f64>,
}

impl LighthouseValidator {
    pub fn new(params: ConsensusParams) -> Self {
        let lambdas = BoundedHistory::new(params.stability_window);
        let history = BoundedHistory::new(params.history_window);
        Self {
            params,
            lambdas,
            history,
        }
    }

    /// Fuse the latest field state with the curvature detector's Geff and
    /// FTCP gate.
    pub fn validate(&mut self, field: &FieldState, g_eff: f64, ftcp_gate: bool) -> ConsensusState {
        let lambda = sanitize(field.lambda, STAGE, "lambda");
        let coherence = sanitize(field.coherence, STAGE, "coherence");
        let g_eff = sanitize(g_eff, STAGE, "g_eff");

        // ── 1. Clin ──────────────────────────────────────────────────────
        let c_lin = coherence;

        // ── 2. Cnonlin ───────────────────────────────────────────────────
        let c_nonlin = sanitize(
            nonlinear_coherence(field.substrate, field.observer, field.echo),
            STAGE,
            "c_nonlin",
        );

        // ── 3. Cphi ──────────────────────────────────────────────────────
        self.lambdas.push(lambda);
        let c_phi = if self.lambdas.len() < self.params.stability_window {
            NEUTRAL_STABILITY
        } else {
            let recent = self.lambdas.tail(self.params.stability_window);
            clamp_unit(1.0 - std_dev(&recent), STAGE, "c_phi")
        };

        // ── 4. Q ─────────────────────────────────────────────────────────
        let q = if g_eff == 0.0 {
            0.0
        } else {
            sanitize(coherence / (1.0 + g_eff), STAGE, "q")
        };

        // ── 5. L ─────────────────────────────────────────────────────────
        let product = (c_lin * c_nonlin * c_phi * g_eff * q.abs()).max(0.0);
        let lighthouse = sanitize(product.powf(1.0 / METRIC_COUNT), STAGE, "lighthouse");

        // ── 6-7. History and adaptive threshold ──────────────────────────
        self.history.push(lighthouse);
        let threshold = self.current_threshold();

        // ── 8-9. Event gate and confidence ───────────────────────────────
        let is_lhe = lighthouse > threshold && ftcp_gate;
        let confidence = if threshold > 0.0 {
            clamp_unit((lighthouse - threshold) / threshold, STAGE, "confidence")
        } else {
            0.0
        };

        let metrics = ConsensusMetrics {
            c_lin,
            c_nonlin,
            c_phi,
            g_eff,
            q,
        };

        debug!(
            lighthouse = format!("{:.5}", lighthouse),
            threshold = format!("{:.5}", threshold),
            samples = self.history.len(),
            c_lin = format!("{:.4}", c_lin),
            c_nonlin = format!("{:.4}", c_nonlin),
            c_phi = format!("{:.4}", c_phi),
            g_eff = format!("{:.5}", g_eff),
            q = format!("{:.4}", q),
            ftcp_gate,
            "lighthouse validation complete"
        );

        if is_lhe {
            info!(
                lighthouse = format!("{:.5}", lighthouse),
                threshold = format!("{:.5}", threshold),
                confidence = format!("{:.3}", confidence),
                "Lighthouse Event"
            );
        }

        ConsensusState {
            lighthouse,
            metrics,
            is_lhe,
            threshold,
            confidence,
        }
    }

    /// Number of L samples currently retained.
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Most recent fused L, if any.
    pub fn last_lighthouse(&self) -> Option<f64> {
        self.history.last().copied()
    }

    /// Clear both histories.
    pub fn reset(&mut self) {
        self.lambdas.clear();
        self.history.clear();
    }

    fn current_threshold(&self) -> f64 {
        if self.history.len() < self.params.min_samples {
            return self.params.threshold_floor;
        }
        let threshold = self.history.mean() + self.params.sigma_multiplier * self.history.std_dev();
        sanitize(threshold, STAGE, "threshold")
    }
}

impl Default for LighthouseValidator {
    fn default() -> Self {
        Self::new(ConsensusParams::default())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::numeric;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn field(lambda: f64, coherence: f64) -> FieldState {
        FieldState {
            lambda,
            coherence,
            substrate: 0.2,
            observer: 0.1,
            echo: 0.05,
        }
    }

    #[test]
    fn threshold_is_floor_until_ten_samples() {
        let mut v = LighthouseValidator::default();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..9 {
            let f = field(rng.gen_range(0.0..1.0), rng.gen_range(0.0..1.0));
            let s = v.validate(&f, rng.gen_range(0.0..2.0), rng.gen_bool(0.5));
            assert_eq!(s.threshold, 0.5);
        }
        // Tenth sample switches to the adaptive threshold.
        let s = v.validate(&field(0.5, 0.5), 0.3, false);
        assert_eq!(v.history_len(), 10);
        assert_ne!(s.threshold, 0.5);
    }

    #[test]
    fn adaptive_threshold_is_mean_plus_two_sigma() {
        let mut v = LighthouseValidator::default();
        let mut ls = Vec::new();
        let mut last = None;
        for i in 0..15 {
            let s = v.validate(&field(0.4 + 0.01 * i as f64, 0.7), 0.05 + 0.01 * i as f64, false);
            ls.push(s.lighthouse);
            last = Some(s);
        }
        let s = last.unwrap();
        let expected = numeric::mean(&ls) + 2.0 * numeric::std_dev(&ls);
        assert!((s.threshold - expected).abs() < 1e-12);
    }

    #[test]
    fn closed_gate_never_fires() {
        let mut v = LighthouseValidator::default();
        let mut rng = StdRng::seed_from_u64(99);
        for _ in 0..1_500 {
            let f = FieldState {
                lambda: rng.gen_range(0.0..1.0),
                coherence: rng.gen_range(0.0..1.0),
                substrate: rng.gen_range(0.0..0.5),
                observer: rng.gen_range(0.0..0.3),
                echo: rng.gen_range(0.0..0.2),
            };
            let s = v.validate(&f, rng.gen_range(0.0..5.0), false);
            assert!(!s.is_lhe);
        }
    }

    #[test]
    fn zero_geff_zeroes_q_and_l() {
        let mut v = LighthouseValidator::default();
        let s = v.validate(&field(0.5, 0.9), 0.0, true);
        assert_eq!(s.metrics.q, 0.0);
        assert_eq!(s.lighthouse, 0.0);
        assert!(!s.is_lhe);
        assert_eq!(s.confidence, 0.0);
    }

    #[test]
    fn q_follows_formula_when_geff_positive() {
        let mut v = LighthouseValidator::default();
        let s = v.validate(&field(0.5, 0.8), 0.6, false);
        assert!((s.metrics.q - 0.8 / 1.6).abs() < 1e-12);
    }

    #[test]
    fn cphi_neutral_until_window_full() {
        let mut v = LighthouseValidator::default();
        for _ in 0..4 {
            let s = v.validate(&field(0.5, 0.5), 0.1, false);
            assert_eq!(s.metrics.c_phi, 0.5);
        }
        let s = v.validate(&field(0.5, 0.5), 0.1, false);
        assert!((s.metrics.c_phi - 1.0).abs() < 1e-12);
    }

    #[test]
    fn zero_components_zero_cnonlin() {
        let mut v = LighthouseValidator::default();
        let f = FieldState {
            lambda: 0.0,
            coherence: 0.0,
            substrate: 0.0,
            observer: 0.0,
            echo: 0.0,
        };
        let s = v.validate(&f, 0.2, true);
        assert_eq!(s.metrics.c_nonlin, 0.0);
        assert_eq!(s.lighthouse, 0.0);
    }

    #[test]
    fn spike_after_calm_fires_with_gate() {
        let calm = field(0.5, 0.5);
        let mut open = LighthouseValidator::default();
        let mut closed = LighthouseValidator::default();
        for _ in 0..20 {
            open.validate(&calm, 0.01, true);
            closed.validate(&calm, 0.01, false);
        }
        let a = open.validate(&calm, 1.0, true);
        let b = closed.validate(&calm, 1.0, false);

        assert!(a.lighthouse > a.threshold);
        assert!(a.is_lhe);
        assert!(a.confidence > 0.0 && a.confidence <= 1.0);

        assert!((a.lighthouse - b.lighthouse).abs() < 1e-12);
        assert!(!b.is_lhe);
    }

    #[test]
    fn outputs_are_bounded_and_finite() {
        let mut v = LighthouseValidator::default();
        let mut rng = StdRng::seed_from_u64(1234);
        for _ in 0..1_000 {
            let f = field(rng.gen_range(0.0..1.0), rng.gen_range(0.0..1.0));
            let s = v.validate(&f, rng.gen_range(0.0..10.0), rng.gen_bool(0.3));
            assert!(s.lighthouse.is_finite() && s.lighthouse >= 0.0);
            assert!(s.threshold.is_finite());
            assert!((0.0..=1.0).contains(&s.confidence));
        }
        assert_eq!(v.history_len(), 100);
    }

    #[test]
    fn non_finite_geff_is_coerced() {
        let mut v = LighthouseValidator::default();
        let s = v.validate(&field(0.5, 0.9), f64::NAN, true);
        assert_eq!(s.metrics.g_eff, 0.0);
        assert_eq!(s.lighthouse, 0.0);
        assert!(!s.is_lhe);
    }

    #[test]
    fn reset_restores_floor() {
        let mut v = LighthouseValidator::default();
        for _ in 0..30 {
            v.validate(&field(0.5, 0.5), 0.2, false);
        }
        v.reset();
        assert_eq!(v.history_len(), 0);
        assert!(v.last_lighthouse().is_none());
        let s = v.validate(&field(0.5, 0.5), 0.2, false);
        assert_eq!(s.threshold, 0.5);
        assert_eq!(s.metrics.c_phi, 0.5);
    }
}
