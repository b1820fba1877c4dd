// =============================================================================
// Field Module
// =============================================================================
//
// The recursive Lambda field: nine weighted sub-indicators form the substrate,
// and the engine's own bounded lambda window supplies the observer and echo
// feedback terms.

pub mod engine;
pub mod indicators;

pub use engine::FieldEngine;
