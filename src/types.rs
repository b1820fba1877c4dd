// =============================================================================
// Shared types used across the Lambda/Lighthouse pipeline
// =============================================================================
//
// Every value here is tick-scoped: produced once per update, handed to the
// next stage by value, then discarded.  Only the stages' own bounded
// histories survive across ticks.

use serde::{Deserialize, Serialize};

// =============================================================================
// Input
// =============================================================================

/// One market observation supplied by the host per tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub price: f64,
    /// Normalised volume, nominally [0, 1].
    pub volume: f64,
    pub volatility: f64,
    pub momentum: f64,
    pub spread: f64,
    /// Epoch milliseconds, monotonically non-decreasing per pipeline.
    pub timestamp: i64,
}

// =============================================================================
// Stage outputs
// =============================================================================

/// Output of the field engine for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldState {
    /// Recursive field value, clamped to [0, 1].
    pub lambda: f64,
    /// How settled the field is around the 0.5 midpoint, [0, 1].
    pub coherence: f64,
    /// Input-driven component.
    pub substrate: f64,
    /// Prior-self component.
    pub observer: f64,
    /// Short-history component.
    pub echo: f64,
}

/// Local shape of the lambda series at one point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvaturePoint {
    pub timestamp: i64,
    /// Discrete second difference of the last three lambda samples.
    pub curvature: f64,
    /// Proximity of the local delta ratio to φ, [0, 1].
    pub golden_ratio_score: f64,
    /// Sharp and golden-ratio aligned.
    pub is_ftcp: bool,
}

/// The five sub-metrics fused into the Lighthouse value.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ConsensusMetrics {
    /// Linear coherence (pass-through of field coherence).
    pub c_lin: f64,
    /// Entropy-based concentration of substrate/observer/echo.
    pub c_nonlin: f64,
    /// Stability of recent lambda values.
    pub c_phi: f64,
    /// Effective gravity from the curvature detector.
    pub g_eff: f64,
    /// Quality factor, coherence / (1 + Geff).
    pub q: f64,
}

/// Output of the Lighthouse consensus validator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConsensusState {
    /// Fused Lighthouse value L (geometric mean of the metrics).
    pub lighthouse: f64,
    pub metrics: ConsensusMetrics,
    /// Lighthouse Event: L above the adaptive threshold while the
    /// curvature gate is open.
    pub is_lhe: bool,
    pub threshold: f64,
    /// Normalised excess of L over the threshold, [0, 1].
    pub confidence: f64,
}

// =============================================================================
// Phase classification
// =============================================================================

/// Discrete phase reported by the frequency-mapping stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Phase {
    /// Neutral: nothing is forming.
    #[default]
    Dormant,
    Emerging,
    Converging,
    Manifest,
    Dissolving,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dormant => write!(f, "DORMANT"),
            Self::Emerging => write!(f, "EMERGING"),
            Self::Converging => write!(f, "CONVERGING"),
            Self::Manifest => write!(f, "MANIFEST"),
            Self::Dissolving => write!(f, "DISSOLVING"),
        }
    }
}

/// Phase plus its tier level in [1, 5].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseState {
    pub phase: Phase,
    pub level: u8,
}

impl PhaseState {
    pub const MIN_LEVEL: u8 = 1;
    pub const MAX_LEVEL: u8 = 5;

    /// Build a phase state, clamping `level` into [1, 5].
    pub fn new(phase: Phase, level: u8) -> Self {
        Self {
            phase,
            level: level.clamp(Self::MIN_LEVEL, Self::MAX_LEVEL),
        }
    }

    /// CONVERGING or MANIFEST.
    pub fn is_ready(&self) -> bool {
        matches!(self.phase, Phase::Converging | Phase::Manifest)
    }

    /// `level / 5`, the phase weighting used by the signal tiers.
    pub fn level_factor(&self) -> f64 {
        f64::from(self.level) / f64::from(Self::MAX_LEVEL)
    }
}

impl Default for PhaseState {
    fn default() -> Self {
        Self::new(Phase::Dormant, Self::MIN_LEVEL)
    }
}

// =============================================================================
// Signal output
// =============================================================================

/// Direction of a trading signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignalType {
    Long,
    Short,
    Hold,
}

impl std::fmt::Display for SignalType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Long => write!(f, "LONG"),
            Self::Short => write!(f, "SHORT"),
            Self::Hold => write!(f, "HOLD"),
        }
    }
}

/// Which row of the decision table produced a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignalTier {
    Optimal,
    Strong,
    Moderate,
    Weak,
    Hold,
}

impl std::fmt::Display for SignalTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Optimal => write!(f, "OPTIMAL"),
            Self::Strong => write!(f, "STRONG"),
            Self::Moderate => write!(f, "MODERATE"),
            Self::Weak => write!(f, "WEAK"),
            Self::Hold => write!(f, "HOLD"),
        }
    }
}

/// Final actionable output of one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradingSignal {
    pub timestamp: i64,
    #[serde(rename = "type")]
    pub signal_type: SignalType,
    pub tier: SignalTier,
    /// [0, 1].
    pub strength: f64,
    pub lighthouse: f64,
    pub coherence: f64,
    pub phase_level: u8,
    /// Human-readable explanation, prefixed with the tier tag.
    pub reason: String,
}
