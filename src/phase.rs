// =============================================================================
// Phase Classifier — Frequency mapping of the lambda series
// =============================================================================
//
// The signal generator treats the phase as an opaque input; any classifier
// implementing `PhaseClassifier` can be plugged into a pipeline.  The default
// `FrequencyPhaseMapper` keeps its own lambda window and measures how often
// the series changes direction (oscillation frequency in [0, 1]).
//
// Classification hierarchy (evaluated top-to-bottom; first match wins):
//
//   1. DORMANT     — fewer than 3 samples
//   2. MANIFEST    — coherence >= manifest_coherence AND
//                    frequency <= max_manifest_frequency
//   3. CONVERGING  — latest |λ - 0.5| below the window's mean |λ - 0.5|
//   4. DISSOLVING  — coherence < dissolving_coherence
//   5. EMERGING    — λ rising
//   6. DORMANT     — otherwise
//
// Level = clamp(1 + round(coherence · 4), 1, 5).

use tracing::trace;

use crate::history::BoundedHistory;
use crate::numeric::{mean, sanitize};
use crate::runtime_config::PhaseParams;
use crate::types::{ConsensusState, FieldState, Phase, PhaseState};

const STAGE: &str = "phase";

/// Pluggable tier/phase classifier.
pub trait PhaseClassifier: Send {
    fn classify(&mut self, field: &FieldState, consensus: &ConsensusState) -> PhaseState;

    /// Drop any accumulated state.
    fn reset(&mut self);
}

/// Default classifier based on the oscillation frequency of lambda.
pub struct FrequencyPhaseMapper {
    params: PhaseParams,
    lambdas: BoundedHistory<f64>,
}

impl FrequencyPhaseMapper {
    pub fn new(params: PhaseParams) -> Self {
        let lambdas = BoundedHistory::new(params.window);
        Self { params, lambdas }
    }

    /// Fraction of direction changes among consecutive deltas, in [0, 1].
    ///
    /// Flat steps carry no direction and are skipped.
    pub fn oscillation_frequency(series: &[f64]) -> f64 {
        let signs: Vec<f64> = series
            .windows(2)
            .map(|w| w[1] - w[0])
            .filter(|d| d.abs() > f64::EPSILON)
            .map(f64::signum)
            .collect();

        if signs.len() < 2 {
            return 0.0;
        }

        let flips = signs.windows(2).filter(|s| s[0] != s[1]).count();
        flips as f64 / (signs.len() - 1) as f64
    }

    fn level_for(coherence: f64) -> u8 {
        let raw = 1.0 + (coherence.clamp(0.0, 1.0) * 4.0).round();
        raw as u8
    }
}

impl PhaseClassifier for FrequencyPhaseMapper {
    fn classify(&mut self, field: &FieldState, _consensus: &ConsensusState) -> PhaseState {
        let lambda = sanitize(field.lambda, STAGE, "lambda");
        let coherence = sanitize(field.coherence, STAGE, "coherence");
        self.lambdas.push(lambda);

        let level = Self::level_for(coherence);

        if self.lambdas.len() < 3 {
            trace!(available = self.lambdas.len(), "phase: insufficient samples");
            return PhaseState::new(Phase::Dormant, level);
        }

        let series = self.lambdas.to_vec();
        let frequency = Self::oscillation_frequency(&series);
        let deviations: Vec<f64> = series.iter().map(|l| (l - 0.5).abs()).collect();
        let mean_deviation = mean(&deviations);
        let latest_deviation = (lambda - 0.5).abs();
        let rising = series
            .len()
            .checked_sub(2)
            .map(|i| lambda > series[i])
            .unwrap_or(false);

        let phase = if coherence >= self.params.manifest_coherence
            && frequency <= self.params.max_manifest_frequency
        {
            Phase::Manifest
        } else if latest_deviation < mean_deviation {
            Phase::Converging
        } else if coherence < self.params.dissolving_coherence {
            Phase::Dissolving
        } else if rising {
            Phase::Emerging
        } else {
            Phase::Dormant
        };

        trace!(
            phase = %phase,
            level,
            frequency = format!("{:.3}", frequency),
            mean_deviation = format!("{:.4}", mean_deviation),
            "phase classified"
        );

        PhaseState::new(phase, level)
    }

    fn reset(&mut self) {
        self.lambdas.clear();
    }
}

impl Default for FrequencyPhaseMapper {
    fn default() -> Self {
        Self::new(PhaseParams::default())
    }
}
