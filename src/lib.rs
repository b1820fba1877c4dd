// =============================================================================
// Lambda Lighthouse — Multi-stage signal fusion core
// =============================================================================
//
// Ingests market snapshots and produces LONG / SHORT / HOLD decisions through
// four stages, leaves first:
//
//   field      — recursive Lambda field with self-referential feedback
//   curvature  — FTCP detector (sharp, golden-ratio aligned points)
//   consensus  — Lighthouse validator (geometric-mean fusion, mean + 2σ gate)
//   signals    — ordered decision table with bounded history
//
// `pipeline` chains the stages for one instrument; `orchestrator` keeps one
// pipeline per instrument and forwards each outcome to a `sink`.
// =============================================================================

pub mod consensus;
pub mod curvature;
pub mod feed;
pub mod field;
pub mod history;
pub mod numeric;
pub mod orchestrator;
pub mod phase;
pub mod pipeline;
pub mod runtime_config;
pub mod signals;
pub mod sink;
pub mod types;

pub use consensus::LighthouseValidator;
pub use curvature::CurvatureDetector;
pub use feed::SyntheticFeed;
pub use field::FieldEngine;
pub use orchestrator::{Orchestrator, PipelineRegistry};
pub use phase::{FrequencyPhaseMapper, PhaseClassifier};
pub use pipeline::{Pipeline, TickOutcome};
pub use runtime_config::PipelineConfig;
pub use signals::{SignalGenerator, SignalStatistics};
pub use sink::{ChannelSink, NullSink, PipelineRecord, SignalSink};
pub use types::{
    ConsensusMetrics, ConsensusState, CurvaturePoint, FieldState, MarketSnapshot, Phase,
    PhaseState, SignalTier, SignalType, TradingSignal,
};
