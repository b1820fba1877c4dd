// =============================================================================
// Signal Generator — Final gating of field, consensus and phase
// =============================================================================
//
// Resolves the decision table for one tick, clamps the strength, tags the
// reason with the tier name and appends the signal to a bounded history.
// Statistics are always derived from that history on demand.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::history::BoundedHistory;
use crate::numeric::clamp_unit;
use crate::runtime_config::SignalParams;
use crate::signals::decision::Gates;
use crate::types::{ConsensusState, FieldState, PhaseState, SignalTier, SignalType, TradingSignal};

const STAGE: &str = "signal";

/// Aggregate view over the retained signal history.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SignalStatistics {
    pub total: usize,
    pub long: usize,
    pub short: usize,
    pub hold: usize,
    pub optimal: usize,
    pub average_strength: f64,
}

/// Stateful signal generator for a single instrument.
pub struct SignalGenerator {
    params: SignalParams,
    history: BoundedHistory<TradingSignal>,
}

impl SignalGenerator {
    pub fn new(params: SignalParams) -> Self {
        let history = BoundedHistory::new(params.history_window);
        Self { params, history }
    }

    /// Produce the signal for one tick.
    pub fn generate_signal(
        &mut self,
        timestamp: i64,
        field: &FieldState,
        consensus: &ConsensusState,
        phase: &PhaseState,
    ) -> TradingSignal {
        let gates = Gates::evaluate(field, consensus, phase, &self.params);
        let tier = SignalTier::resolve(&gates);
        let strength = clamp_unit(tier.raw_strength(field, consensus, phase), STAGE, "strength");

        let signal = TradingSignal {
            timestamp,
            signal_type: tier.signal_type(),
            tier,
            strength,
            lighthouse: consensus.lighthouse,
            coherence: field.coherence,
            phase_level: phase.level,
            reason: self.reason(tier, field, consensus, phase),
        };

        match signal.signal_type {
            SignalType::Hold => debug!(
                timestamp,
                strength = format!("{:.3}", strength),
                gates = ?gates,
                "signal: HOLD"
            ),
            _ => info!(
                timestamp,
                signal_type = %signal.signal_type,
                tier = %tier,
                strength = format!("{:.3}", strength),
                reason = %signal.reason,
                "signal generated"
            ),
        }

        self.history.push(signal.clone());
        signal
    }

    /// Most recent signal, if any.
    pub fn last_signal(&self) -> Option<&TradingSignal> {
        self.history.last()
    }

    /// Retained signals, oldest first.
    pub fn history(&self) -> Vec<TradingSignal> {
        self.history.to_vec()
    }

    pub fn get_statistics(&self) -> SignalStatistics {
        let total = self.history.len();
        let count = |t: SignalType| self.history.iter().filter(|s| s.signal_type == t).count();
        let average_strength = if total == 0 {
            0.0
        } else {
            self.history.iter().map(|s| s.strength).sum::<f64>() / total as f64
        };

        SignalStatistics {
            total,
            long: count(SignalType::Long),
            short: count(SignalType::Short),
            hold: count(SignalType::Hold),
            optimal: self
                .history
                .iter()
                .filter(|s| s.tier == SignalTier::Optimal)
                .count(),
            average_strength,
        }
    }

    pub fn reset(&mut self) {
        self.history.clear();
    }

    fn reason(
        &self,
        tier: SignalTier,
        field: &FieldState,
        consensus: &ConsensusState,
        phase: &PhaseState,
    ) -> String {
        match tier {
            SignalTier::Optimal => format!(
                "OPTIMAL: Lighthouse Event (confidence {:.3}) with coherence {:.3} in {} phase (level {})",
                consensus.confidence, field.coherence, phase.phase, phase.level
            ),
            SignalTier::Strong => format!(
                "STRONG: Lighthouse Event (confidence {:.3}) with coherence {:.3}",
                consensus.confidence, field.coherence
            ),
            SignalTier::Moderate => format!(
                "MODERATE: coherence {:.3} in {} phase (level {})",
                field.coherence, phase.phase, phase.level
            ),
            SignalTier::Weak => format!(
                "WEAK: coherence {:.3}, L {:.4} below {:.0}% of threshold {:.4}",
                field.coherence,
                consensus.lighthouse,
                self.params.weak_lighthouse_fraction * 100.0,
                consensus.threshold
            ),
            SignalTier::Hold => format!(
                "HOLD: no entry conditions met (coherence {:.3}, L {:.4}, threshold {:.4})",
                field.coherence, consensus.lighthouse, consensus.threshold
            ),
        }
    }
}

impl Default for SignalGenerator {
    fn default() -> Self {
        Self::new(SignalParams::default())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ConsensusMetrics, Phase};

    fn field(coherence: f64) -> FieldState {
        FieldState {
            lambda: 0.5,
            coherence,
            substrate: 0.2,
            observer: 0.15,
            echo: 0.1,
        }
    }

    fn consensus(lighthouse: f64, threshold: f64, is_lhe: bool, confidence: f64) -> ConsensusState {
        ConsensusState {
            lighthouse,
            metrics: ConsensusMetrics::default(),
            is_lhe,
            threshold,
            confidence,
        }
    }

    #[test]
    fn optimal_beats_moderate_when_both_hold() {
        let mut g = SignalGenerator::default();
        let s = g.generate_signal(
            1,
            &field(0.96),
            &consensus(0.8, 0.5, true, 0.6),
            &PhaseState::new(Phase::Converging, 4),
        );
        assert_eq!(s.tier, SignalTier::Optimal);
        assert_eq!(s.signal_type, SignalType::Long);
        assert!(s.reason.starts_with("OPTIMAL"));
        assert!((s.strength - 0.6 * 0.96 * 0.8).abs() < 1e-12);
    }

    #[test]
    fn manifest_lighthouse_scenario_is_optimal_long() {
        let mut g = SignalGenerator::default();
        let s = g.generate_signal(
            7,
            &field(0.95),
            &consensus(0.9, 0.5, true, 0.8),
            &PhaseState::new(Phase::Manifest, 5),
        );
        assert_eq!(s.signal_type, SignalType::Long);
        assert!(s.reason.contains("OPTIMAL"));
        assert!(s.strength > 0.0);
        assert_eq!(s.phase_level, 5);
        assert_eq!(s.timestamp, 7);
    }

    #[test]
    fn strong_without_phase() {
        let mut g = SignalGenerator::default();
        let s = g.generate_signal(
            1,
            &field(0.95),
            &consensus(0.9, 0.5, true, 0.5),
            &PhaseState::new(Phase::Emerging, 5),
        );
        assert_eq!(s.tier, SignalTier::Strong);
        assert!((s.strength - 0.5 * 0.95 * 0.8).abs() < 1e-12);
    }

    #[test]
    fn moderate_without_event() {
        let mut g = SignalGenerator::default();
        let s = g.generate_signal(
            1,
            &field(0.945),
            &consensus(0.3, 0.5, false, 0.0),
            &PhaseState::new(Phase::Manifest, 3),
        );
        assert_eq!(s.tier, SignalTier::Moderate);
        assert!((s.strength - 0.945 * 0.6 * 0.6).abs() < 1e-12);
    }

    #[test]
    fn weak_field_goes_short() {
        let mut g = SignalGenerator::default();
        let s = g.generate_signal(
            1,
            &field(0.1),
            &consensus(0.1, 0.5, false, 0.0),
            &PhaseState::default(),
        );
        assert_eq!(s.tier, SignalTier::Weak);
        assert_eq!(s.signal_type, SignalType::Short);
        assert!((s.strength - 0.9 * 0.4).abs() < 1e-12);
        assert!(s.reason.starts_with("WEAK"));
    }

    #[test]
    fn low_coherence_with_healthy_lighthouse_holds() {
        let mut g = SignalGenerator::default();
        let s = g.generate_signal(
            1,
            &field(0.1),
            &consensus(0.3, 0.5, false, 0.0),
            &PhaseState::default(),
        );
        assert_eq!(s.tier, SignalTier::Hold);
        assert_eq!(s.signal_type, SignalType::Hold);
        assert_eq!(s.strength, 0.5);
    }

    #[test]
    fn event_without_high_coherence_holds() {
        let mut g = SignalGenerator::default();
        let s = g.generate_signal(
            1,
            &field(0.9),
            &consensus(0.9, 0.5, true, 1.0),
            &PhaseState::new(Phase::Manifest, 5),
        );
        assert_eq!(s.tier, SignalTier::Hold);
    }

    #[test]
    fn strength_is_clamped() {
        let mut g = SignalGenerator::default();
        let s = g.generate_signal(
            1,
            &field(1.0),
            &consensus(0.9, 0.5, true, f64::NAN),
            &PhaseState::new(Phase::Manifest, 5),
        );
        assert_eq!(s.strength, 0.0);
        assert!(s.strength.is_finite());
    }

    #[test]
    fn statistics_are_derived_from_history() {
        let mut g = SignalGenerator::default();
        assert_eq!(g.get_statistics(), SignalStatistics::default());

        let manifest = PhaseState::new(Phase::Manifest, 5);
        g.generate_signal(1, &field(0.95), &consensus(0.9, 0.5, true, 1.0), &manifest);
        g.generate_signal(2, &field(0.1), &consensus(0.1, 0.5, false, 0.0), &manifest);
        g.generate_signal(3, &field(0.6), &consensus(0.4, 0.5, false, 0.0), &manifest);

        let stats = g.get_statistics();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.long, 1);
        assert_eq!(stats.short, 1);
        assert_eq!(stats.hold, 1);
        assert_eq!(stats.optimal, 1);
        let expected = (0.95 + 0.9 * 0.4 + 0.5) / 3.0;
        assert!((stats.average_strength - expected).abs() < 1e-12);
        assert_eq!(g.last_signal().map(|s| s.timestamp), Some(3));
    }

    #[test]
    fn history_is_bounded_to_fifty() {
        let mut g = SignalGenerator::default();
        for ts in 0..80 {
            g.generate_signal(ts, &field(0.6), &consensus(0.4, 0.5, false, 0.0), &PhaseState::default());
        }
        let h = g.history();
        assert_eq!(h.len(), 50);
        assert_eq!(h[0].timestamp, 30);
        assert_eq!(g.get_statistics().total, 50);
    }

    #[test]
    fn reset_clears_history() {
        let mut g = SignalGenerator::default();
        g.generate_signal(1, &field(0.6), &consensus(0.4, 0.5, false, 0.0), &PhaseState::default());
        g.reset();
        assert!(g.last_signal().is_none());
        assert_eq!(g.get_statistics().total, 0);
    }
}
