// =============================================================================
// Signals Module
// =============================================================================
//
// Final stage of the pipeline:
// - Ordered decision table (OPTIMAL → STRONG → MODERATE → WEAK → HOLD)
// - Signal generator with bounded history and derived statistics

pub mod decision;
pub mod generator;

pub use decision::Gates;
pub use generator::{SignalGenerator, SignalStatistics};
