// =============================================================================
// Pipeline — One instrument's four-stage signal fusion chain
// =============================================================================
//
// One tick = one synchronous pass, leaves first:
//
//   1. FieldEngine::step            snapshot  -> FieldState
//   2. CurvatureDetector::add_point λ         -> CurvaturePoint, Geff
//   3. LighthouseValidator::validate          -> ConsensusState
//   4. PhaseClassifier::classify              -> PhaseState (or supplied)
//   5. SignalGenerator::generate_signal       -> TradingSignal
//
// Each stage owns its bounded history; stages only see each other's latest
// published value.  A pipeline is mutable and single-threaded: hosts tracking
// several instruments build one pipeline per instrument.

use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use crate::consensus::LighthouseValidator;
use crate::curvature::CurvatureDetector;
use crate::field::FieldEngine;
use crate::phase::{FrequencyPhaseMapper, PhaseClassifier};
use crate::runtime_config::PipelineConfig;
use crate::signals::{SignalGenerator, SignalStatistics};
use crate::types::{
    ConsensusState, CurvaturePoint, FieldState, MarketSnapshot, PhaseState, TradingSignal,
};

/// Everything produced by one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickOutcome {
    pub field: FieldState,
    pub curvature: CurvaturePoint,
    pub consensus: ConsensusState,
    pub phase: PhaseState,
    pub signal: TradingSignal,
}

/// Complete signal pipeline for a single instrument.
pub struct Pipeline {
    field: FieldEngine,
    curvature: CurvatureDetector,
    consensus: LighthouseValidator,
    signals: SignalGenerator,
    classifier: Box<dyn PhaseClassifier>,
    last_timestamp: Option<i64>,
    ticks: u64,
}

impl Pipeline {
    /// Build a pipeline with the default frequency-mapping phase classifier.
    pub fn new(config: &PipelineConfig) -> Self {
        let classifier = Box::new(FrequencyPhaseMapper::new(config.phase.clone()));
        Self::with_classifier(config, classifier)
    }

    /// Build a pipeline around a custom phase classifier.
    pub fn with_classifier(config: &PipelineConfig, classifier: Box<dyn PhaseClassifier>) -> Self {
        Self {
            field: FieldEngine::new(config.field.clone()),
            curvature: CurvatureDetector::new(config.curvature.clone()),
            consensus: LighthouseValidator::new(config.consensus.clone()),
            signals: SignalGenerator::new(config.signal.clone()),
            classifier,
            last_timestamp: None,
            ticks: 0,
        }
    }

    /// Run one tick, classifying the phase internally.
    pub fn tick(&mut self, snapshot: &MarketSnapshot) -> TickOutcome {
        self.run(snapshot, None)
    }

    /// Run one tick with a phase supplied by an external classifier.
    pub fn tick_with_phase(&mut self, snapshot: &MarketSnapshot, phase: PhaseState) -> TickOutcome {
        self.run(snapshot, Some(phase))
    }

    fn run(&mut self, snapshot: &MarketSnapshot, phase: Option<PhaseState>) -> TickOutcome {
        let timestamp = snapshot.timestamp;
        if let Some(prev) = self.last_timestamp {
            if timestamp < prev {
                warn!(timestamp, previous = prev, "snapshot timestamp went backwards");
            }
        }
        self.last_timestamp = Some(timestamp);
        self.ticks += 1;

        let field = self.field.step(snapshot);
        let curvature = self.curvature.add_point(timestamp, field.lambda);
        let g_eff = self.curvature.compute_geff();
        let consensus = self.consensus.validate(&field, g_eff, curvature.is_ftcp);
        let phase = match phase {
            Some(p) => p,
            None => self.classifier.classify(&field, &consensus),
        };
        let signal = self
            .signals
            .generate_signal(timestamp, &field, &consensus, &phase);

        trace!(
            tick = self.ticks,
            timestamp,
            phase = %phase.phase,
            signal_type = %signal.signal_type,
            "pipeline tick complete"
        );

        TickOutcome {
            field,
            curvature,
            consensus,
            phase,
            signal,
        }
    }

    pub fn statistics(&self) -> SignalStatistics {
        self.signals.get_statistics()
    }

    pub fn last_signal(&self) -> Option<&TradingSignal> {
        self.signals.last_signal()
    }

    pub fn signal_history(&self) -> Vec<TradingSignal> {
        self.signals.history()
    }

    /// Current effective gravity from the curvature stage.
    pub fn g_eff(&self) -> f64 {
        self.curvature.compute_geff()
    }

    /// Ticks processed since construction or the last reset.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Clear every stage's history.
    pub fn reset(&mut self) {
        self.field.reset();
        self.curvature.reset();
        self.consensus.reset();
        self.signals.reset();
        self.classifier.reset();
        self.last_timestamp = None;
        self.ticks = 0;
    }
}
