// =============================================================================
// Substrate Sub-Indicators
// =============================================================================
//
// Nine simple, side-effect-free maps from a snapshot into [0, 1].  The field
// engine averages them with the configured weights to form the substrate
// term.  Each indicator is non-decreasing in momentum when volatility,
// volume and spread are held fixed.
//
//   idx  name                 formula
//   0    momentum_bias        (tanh(m) + 1) / 2
//   1    volume_pressure      clamp(v, 0, 1)
//   2    volatility_calm      1 / (1 + |σ|)
//   3    spread_tightness     1 / (1 + |s|)
//   4    confluence           momentum_bias · volume_pressure
//   5    momentum_dominance   (1 + m / (|m| + |σ|)) / 2
//   6    liquidity_depth      v / (v + |s|)
//   7    trend_persistence    sigmoid(m / (|σ| + 0.01))
//   8    regime_stability     1 - min(|σ|, 1)
// =============================================================================

use crate::types::MarketSnapshot;

/// Number of sub-indicators.
pub const INDICATOR_COUNT: usize = 9;

/// Human-readable names in evaluation order.
pub const INDICATOR_NAMES: [&str; INDICATOR_COUNT] = [
    "momentum_bias",
    "volume_pressure",
    "volatility_calm",
    "spread_tightness",
    "confluence",
    "momentum_dominance",
    "liquidity_depth",
    "trend_persistence",
    "regime_stability",
];

/// Evaluate every sub-indicator for a (sanitised) snapshot.
pub fn evaluate(snapshot: &MarketSnapshot) -> [f64; INDICATOR_COUNT] {
    let m = snapshot.momentum;
    let vol = snapshot.volatility.abs();
    let spread = snapshot.spread.abs();

    let momentum_bias = 0.5 * (m.tanh() + 1.0);
    let volume_pressure = snapshot.volume.clamp(0.0, 1.0);
    let volatility_calm = 1.0 / (1.0 + vol);
    let spread_tightness = 1.0 / (1.0 + spread);
    let confluence = momentum_bias * volume_pressure;

    let momentum_dominance = {
        let denom = m.abs() + vol;
        if denom > 0.0 {
            0.5 * (1.0 + m / denom)
        } else {
            0.5
        }
    };

    let liquidity_depth = {
        let denom = volume_pressure + spread;
        if denom > 0.0 {
            volume_pressure / denom
        } else {
            0.0
        }
    };

    let trend_persistence = sigmoid(m / (vol + 0.01));
    let regime_stability = 1.0 - vol.min(1.0);

    [
        momentum_bias,
        volume_pressure,
        volatility_calm,
        spread_tightness,
        confluence,
        momentum_dominance,
        liquidity_depth,
        trend_persistence,
        regime_stability,
    ]
}

/// Weighted average normalised by total weight.
///
/// Returns 0.0 when the total weight is zero (or not a positive number).
pub fn weighted_average(values: &[f64], weights: &[f64]) -> f64 {
    let total: f64 = weights.iter().sum();
    if total <= 0.0 || !total.is_finite() {
        return 0.0;
    }
    let sum: f64 = values.iter().zip(weights).map(|(v, w)| v * w).sum();
    sum / total
}

#[inline]
fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(momentum: f64, volume: f64, volatility: f64, spread: f64) -> MarketSnapshot {
        MarketSnapshot {
            price: 100.0,
            volume,
            volatility,
            momentum,
            spread,
            timestamp: 0,
        }
    }

    #[test]
    fn every_indicator_is_in_unit_range() {
        let cases = [
            snap(0.0, 0.0, 0.0, 0.0),
            snap(5.0, 1.0, 0.2, 0.01),
            snap(-5.0, 0.3, 3.0, 2.0),
            snap(1e6, 10.0, 1e6, 1e6),
            snap(-1e6, -3.0, -1e6, -1e6),
        ];
        for s in cases {
            for (i, v) in evaluate(&s).iter().enumerate() {
                assert!(
                    v.is_finite() && (0.0..=1.0).contains(v),
                    "{} out of range: {}",
                    INDICATOR_NAMES[i],
                    v
                );
            }
        }
    }

    #[test]
    fn indicators_do_not_decrease_with_momentum() {
        let lo = evaluate(&snap(0.1, 0.9, 0.2, 0.01));
        let hi = evaluate(&snap(0.5, 0.9, 0.2, 0.01));
        for i in 0..INDICATOR_COUNT {
            assert!(hi[i] >= lo[i], "{} decreased", INDICATOR_NAMES[i]);
        }
    }

    #[test]
    fn weighted_average_normalises_by_total() {
        let v = [1.0, 0.0];
        assert!((weighted_average(&v, &[2.0, 2.0]) - 0.5).abs() < 1e-12);
        assert!((weighted_average(&v, &[3.0, 1.0]) - 0.75).abs() < 1e-12);
    }

    #[test]
    fn weighted_average_zero_weight_is_zero() {
        assert_eq!(weighted_average(&[1.0, 1.0], &[0.0, 0.0]), 0.0);
        assert_eq!(weighted_average(&[], &[]), 0.0);
    }
}
