// =============================================================================
// Decision Table — Ordered (predicate, outcome) rows
// =============================================================================
//
// Evaluated top-to-bottom; first match wins, no fallthrough:
//
//   tier      predicate                              type   strength
//   OPTIMAL   LHE ∧ high coherence ∧ phase ready     LONG   conf · coh · level/5
//   STRONG    LHE ∧ high coherence                   LONG   conf · coh · 0.8
//   MODERATE  high coherence ∧ phase ready           LONG   coh · level/5 · 0.6
//   WEAK      coh < weak ∧ L < threshold · fraction  SHORT  (1 - coh) · 0.4
//   HOLD      always                                 HOLD   0.5
//
// Strength is clamped to [0, 1] by the generator for every row.

use serde::{Deserialize, Serialize};

use crate::runtime_config::SignalParams;
use crate::types::{ConsensusState, FieldState, PhaseState, SignalTier, SignalType};

/// STRONG tier damping.
const STRONG_FACTOR: f64 = 0.8;
/// MODERATE tier damping.
const MODERATE_FACTOR: f64 = 0.6;
/// WEAK tier damping.
const WEAK_FACTOR: f64 = 0.4;
/// Strength reported with a HOLD.
const HOLD_STRENGTH: f64 = 0.5;

/// Boolean gates derived from one tick's inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gates {
    pub high_coherence: bool,
    pub lighthouse_event: bool,
    pub phase_ready: bool,
    /// Low coherence and L well below its threshold.
    pub weak_field: bool,
}

impl Gates {
    pub fn evaluate(
        field: &FieldState,
        consensus: &ConsensusState,
        phase: &PhaseState,
        params: &SignalParams,
    ) -> Self {
        Self {
            high_coherence: field.coherence >= params.high_coherence,
            lighthouse_event: consensus.is_lhe,
            phase_ready: phase.is_ready(),
            weak_field: field.coherence < params.weak_coherence
                && consensus.lighthouse < consensus.threshold * params.weak_lighthouse_fraction,
        }
    }
}

impl SignalTier {
    /// Priority order of the decision table.
    pub const PRIORITY: [SignalTier; 5] = [
        SignalTier::Optimal,
        SignalTier::Strong,
        SignalTier::Moderate,
        SignalTier::Weak,
        SignalTier::Hold,
    ];

    /// Row predicate.
    pub fn matches(self, g: &Gates) -> bool {
        match self {
            Self::Optimal => g.lighthouse_event && g.high_coherence && g.phase_ready,
            Self::Strong => g.lighthouse_event && g.high_coherence,
            Self::Moderate => g.high_coherence && g.phase_ready,
            Self::Weak => g.weak_field,
            Self::Hold => true,
        }
    }

    /// First row whose predicate holds.
    pub fn resolve(g: &Gates) -> SignalTier {
        Self::PRIORITY
            .into_iter()
            .find(|tier| tier.matches(g))
            .unwrap_or(SignalTier::Hold)
    }

    pub fn signal_type(self) -> SignalType {
        match self {
            Self::Optimal | Self::Strong | Self::Moderate => SignalType::Long,
            Self::Weak => SignalType::Short,
            Self::Hold => SignalType::Hold,
        }
    }

    /// Unclamped row strength.
    pub fn raw_strength(
        self,
        field: &FieldState,
        consensus: &ConsensusState,
        phase: &PhaseState,
    ) -> f64 {
        match self {
            Self::Optimal => consensus.confidence * field.coherence * phase.level_factor(),
            Self::Strong => consensus.confidence * field.coherence * STRONG_FACTOR,
            Self::Moderate => field.coherence * phase.level_factor() * MODERATE_FACTOR,
            Self::Weak => (1.0 - field.coherence) * WEAK_FACTOR,
            Self::Hold => HOLD_STRENGTH,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gates(lhe: bool, high: bool, ready: bool, weak: bool) -> Gates {
        Gates {
            high_coherence: high,
            lighthouse_event: lhe,
            phase_ready: ready,
            weak_field: weak,
        }
    }

    #[test]
    fn resolve_follows_priority() {
        assert_eq!(SignalTier::resolve(&gates(true, true, true, false)), SignalTier::Optimal);
        assert_eq!(SignalTier::resolve(&gates(true, true, false, false)), SignalTier::Strong);
        assert_eq!(SignalTier::resolve(&gates(false, true, true, false)), SignalTier::Moderate);
        assert_eq!(SignalTier::resolve(&gates(false, false, false, true)), SignalTier::Weak);
        assert_eq!(SignalTier::resolve(&gates(true, false, true, false)), SignalTier::Hold);
        assert_eq!(SignalTier::resolve(&gates(false, false, false, false)), SignalTier::Hold);
    }

    #[test]
    fn first_match_wins_over_later_rows() {
        // Every row's predicate holds; only the first may be chosen.
        let g = gates(true, true, true, true);
        for tier in SignalTier::PRIORITY {
            assert!(tier.matches(&g));
        }
        assert_eq!(SignalTier::resolve(&g), SignalTier::Optimal);
    }

    #[test]
    fn tier_types() {
        assert_eq!(SignalTier::Optimal.signal_type(), SignalType::Long);
        assert_eq!(SignalTier::Strong.signal_type(), SignalType::Long);
        assert_eq!(SignalTier::Moderate.signal_type(), SignalType::Long);
        assert_eq!(SignalTier::Weak.signal_type(), SignalType::Short);
        assert_eq!(SignalTier::Hold.signal_type(), SignalType::Hold);
    }
}
