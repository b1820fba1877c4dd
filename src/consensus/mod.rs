// =============================================================================
// Consensus Module
// =============================================================================
//
// Lighthouse consensus: geometric-mean fusion of five sub-metrics with an
// adaptive mean + k·σ event threshold.
// - Component entropy (Cnonlin)
// - Lighthouse validator (fusion, threshold, event gate)

pub mod entropy;
pub mod lighthouse;

pub use entropy::nonlinear_coherence;
pub use lighthouse::LighthouseValidator;
