// =============================================================================
// FTCP Curvature Detector — Golden-ratio aligned curvature points
// =============================================================================
//
// Tracks the lambda series in its own rolling window and, for each new point,
// measures the local shape over the last three samples:
//
//   curvature = λ[t] - 2·λ[t-1] + λ[t-2]           (discrete 2nd difference)
//   d1 = |λ[t-1] - λ[t-2]|,  d2 = |λ[t] - λ[t-1]|
//   ratio = max(d1, d2) / min(d1, d2)              (covers φ and 1/φ)
//   golden_ratio_score = clamp(1 - |ratio - φ| / φ, 0, 1)
//
// A point is an FTCP (Fibonacci-Tightened Curvature Point) when
// |curvature| > sharpness_threshold AND score > alignment_threshold.
//
// Geff ("effective gravity") is the mean |curvature| over the retained
// curvature window; 0 while nothing has been measured yet.

use tracing::{debug, trace};

use crate::history::BoundedHistory;
use crate::numeric::{clamp_unit, sanitize};
use crate::runtime_config::CurvatureParams;
use crate::types::CurvaturePoint;

const STAGE: &str = "curvature";

/// Deltas smaller than this are treated as flat.
const MIN_DELTA: f64 = 1e-12;

// =============================================================================
// CurvatureDetector
// =============================================================================

/// Stateful FTCP detector for a single instrument.
pub struct CurvatureDetector {
    params: CurvatureParams,
    samples: BoundedHistory<(i64, f64)>,
    curvatures: BoundedHistory<f64>,
    points: BoundedHistory<CurvaturePoint>,
}

impl CurvatureDetector {
    pub fn new(params: CurvatureParams) -> Self {
        let window = params.window;
        Self {
            params,
            samples: BoundedHistory::new(window),
            curvatures: BoundedHistory::new(window),
            points: BoundedHistory::new(window),
        }
    }

    /// Record a new lambda sample and describe the local shape around it.
    ///
    /// With fewer than three samples the point is flat: curvature 0, score 0,
    /// never an FTCP, and it does not contribute to Geff.
    pub fn add_point(&mut self, timestamp: i64, lambda: f64) -> CurvaturePoint {
        let lambda = sanitize(lambda, STAGE, "lambda");
        self.samples.push((timestamp, lambda));

        if self.samples.len() < 3 {
            trace!(
                available = self.samples.len(),
                "curvature: insufficient samples"
            );
            let point = CurvaturePoint {
                timestamp,
                curvature: 0.0,
                golden_ratio_score: 0.0,
                is_ftcp: false,
            };
            self.points.push(point);
            return point;
        }

        let recent = self.samples.tail(3);
        let (a, b, c) = (recent[0].1, recent[1].1, recent[2].1);

        let curvature = sanitize(c - 2.0 * b + a, STAGE, "curvature");
        let golden_ratio_score = clamp_unit(
            golden_ratio_score(b - a, c - b, self.params.golden_ratio),
            STAGE,
            "golden_ratio_score",
        );

        let is_ftcp = curvature.abs() > self.params.sharpness_threshold
            && golden_ratio_score > self.params.alignment_threshold;

        self.curvatures.push(curvature);

        let point = CurvaturePoint {
            timestamp,
            curvature,
            golden_ratio_score,
            is_ftcp,
        };
        self.points.push(point);

        debug!(
            timestamp,
            curvature = format!("{:.5}", curvature),
            golden_ratio_score = format!("{:.4}", golden_ratio_score),
            is_ftcp,
            "curvature point added"
        );

        point
    }

    /// Effective gravity: mean |curvature| of the retained window.
    pub fn compute_geff(&self) -> f64 {
        if self.curvatures.is_empty() {
            return 0.0;
        }
        let total: f64 = self.curvatures.iter().map(|c| c.abs()).sum();
        sanitize(total / self.curvatures.len() as f64, STAGE, "geff")
    }

    /// The most recently produced point.
    pub fn last_point(&self) -> Option<&CurvaturePoint> {
        self.points.last()
    }

    /// Number of FTCPs among the retained points.
    pub fn ftcp_count(&self) -> usize {
        self.points.iter().filter(|p| p.is_ftcp).count()
    }

    pub fn reset(&mut self) {
        self.samples.clear();
        self.curvatures.clear();
        self.points.clear();
    }
}

impl Default for CurvatureDetector {
    fn default() -> Self {
        Self::new(CurvatureParams::default())
    }
}

/// Proximity of the ratio between two consecutive deltas to `phi`.
///
/// Order-independent: both φ and 1/φ proportions score 1.0.  Returns 0.0 when
/// either delta is flat.
pub fn golden_ratio_score(d1: f64, d2: f64, phi: f64) -> f64 {
    let (a, b) = (d1.abs(), d2.abs());
    let lo = a.min(b);
    let hi = a.max(b);
    if lo < MIN_DELTA || phi <= 0.0 {
        return 0.0;
    }
    let ratio = hi / lo;
    (1.0 - (ratio - phi).abs() / phi).clamp(0.0, 1.0)
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime_config::GOLDEN_RATIO;

    #[test]
    fn geff_is_zero_when_empty() {
        let d = CurvatureDetector::default();
        assert_eq!(d.compute_geff(), 0.0);
        assert!(d.last_point().is_none());
    }

    #[test]
    fn first_two_points_are_flat() {
        let mut d = CurvatureDetector::default();
        let p1 = d.add_point(1, 0.2);
        let p2 = d.add_point(2, 0.9);
        for p in [p1, p2] {
            assert_eq!(p.curvature, 0.0);
            assert_eq!(p.golden_ratio_score, 0.0);
            assert!(!p.is_ftcp);
        }
        assert_eq!(d.compute_geff(), 0.0);
    }

    #[test]
    fn curvature_is_second_difference() {
        let mut d = CurvatureDetector::default();
        d.add_point(1, 0.1);
        d.add_point(2, 0.3);
        let p = d.add_point(3, 0.2);
        // 0.2 - 0.6 + 0.1 = -0.3
        assert!((p.curvature + 0.3).abs() < 1e-12);
        assert!((d.compute_geff() - 0.3).abs() < 1e-12);
    }

    #[test]
    fn golden_proportion_scores_one_in_both_orders() {
        assert!((golden_ratio_score(0.1, 0.1 * GOLDEN_RATIO, GOLDEN_RATIO) - 1.0).abs() < 1e-9);
        assert!((golden_ratio_score(0.1 * GOLDEN_RATIO, -0.1, GOLDEN_RATIO) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn flat_or_distant_ratios_score_low() {
        assert_eq!(golden_ratio_score(0.0, 0.3, GOLDEN_RATIO), 0.0);
        let s = golden_ratio_score(0.1, 0.3, GOLDEN_RATIO);
        assert!(s < 0.9, "ratio 3 should not align, got {}", s);
        assert_eq!(golden_ratio_score(0.01, 1.0, GOLDEN_RATIO), 0.0);
    }

    #[test]
    fn sharp_golden_point_is_ftcp() {
        let mut d = CurvatureDetector::default();
        d.add_point(1, 0.0);
        d.add_point(2, 0.1);
        let p = d.add_point(3, 0.1 + 0.1 * GOLDEN_RATIO);
        assert!(p.golden_ratio_score > 0.99);
        assert!(p.curvature.abs() > 0.05);
        assert!(p.is_ftcp);
        assert_eq!(d.ftcp_count(), 1);
    }

    #[test]
    fn aligned_but_gentle_point_is_not_ftcp() {
        let mut d = CurvatureDetector::default();
        d.add_point(1, 0.0);
        d.add_point(2, 0.01);
        let p = d.add_point(3, 0.01 + 0.01 * GOLDEN_RATIO);
        assert!(p.golden_ratio_score > 0.99);
        assert!(!p.is_ftcp);
    }

    #[test]
    fn sharp_but_misaligned_point_is_not_ftcp() {
        let mut d = CurvatureDetector::default();
        d.add_point(1, 0.0);
        d.add_point(2, 0.1);
        let p = d.add_point(3, 0.5);
        assert!(p.curvature.abs() > 0.05);
        assert!(!p.is_ftcp);
    }

    #[test]
    fn window_bounds_geff_memory() {
        let mut d = CurvatureDetector::new(CurvatureParams {
            window: 3,
            ..CurvatureParams::default()
        });
        // Zig-zag, then flat: old curvature must age out.
        for (i, v) in [0.0, 0.5, 0.0, 0.5, 0.5, 0.5, 0.5, 0.5].iter().enumerate() {
            d.add_point(i as i64, *v);
        }
        assert_eq!(d.compute_geff(), 0.0);
    }

    #[test]
    fn non_finite_lambda_is_coerced() {
        let mut d = CurvatureDetector::default();
        d.add_point(1, 0.2);
        d.add_point(2, f64::NAN);
        let p = d.add_point(3, 0.2);
        assert!(p.curvature.is_finite());
        assert!(d.compute_geff().is_finite());
    }

    #[test]
    fn reset_clears_everything() {
        let mut d = CurvatureDetector::default();
        for i in 0..5 {
            d.add_point(i, 0.1 * i as f64);
        }
        d.reset();
        assert_eq!(d.compute_geff(), 0.0);
        assert!(d.last_point().is_none());
        assert_eq!(d.ftcp_count(), 0);
    }
}
