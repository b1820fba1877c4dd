// =============================================================================
// Pipeline Configuration — Every tunable constant of the four stages
// =============================================================================
//
// Windows, thresholds, gains and the golden ratio all live here so a host can
// vary them per instrument without code changes.  All fields carry
// `#[serde(default)]` so that a partial JSON file (or `{}`) still loads.
//
// Persistence uses the atomic tmp + rename pattern.
// =============================================================================

use std::path::Path;

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

/// φ = (1 + √5) / 2.
pub const GOLDEN_RATIO: f64 = 1.618_033_988_749_895;

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_symbols() -> Vec<String> {
    vec!["BTCUSDT".to_string(), "ETHUSDT".to_string()]
}

fn default_tick_interval_ms() -> u64 {
    1_000
}

fn default_substrate_scale() -> f64 {
    0.4
}

fn default_observer_gain() -> f64 {
    0.3
}

fn default_echo_gain() -> f64 {
    0.2
}

fn default_lambda_window() -> usize {
    5
}

fn default_curvature_window() -> usize {
    20
}

fn default_sharpness_threshold() -> f64 {
    0.05
}

fn default_alignment_threshold() -> f64 {
    0.9
}

fn default_golden_ratio() -> f64 {
    GOLDEN_RATIO
}

fn default_consensus_window() -> usize {
    100
}

fn default_stability_window() -> usize {
    5
}

fn default_min_samples() -> usize {
    10
}

fn default_threshold_floor() -> f64 {
    0.5
}

fn default_sigma_multiplier() -> f64 {
    2.0
}

fn default_high_coherence() -> f64 {
    0.945
}

fn default_weak_coherence() -> f64 {
    0.3
}

fn default_weak_lighthouse_fraction() -> f64 {
    0.5
}

fn default_signal_window() -> usize {
    50
}

fn default_phase_window() -> usize {
    20
}

fn default_manifest_coherence() -> f64 {
    0.9
}

fn default_max_manifest_frequency() -> f64 {
    0.5
}

fn default_dissolving_coherence() -> f64 {
    0.5
}

// =============================================================================
// IndicatorWeights
// =============================================================================

/// Weights of the nine substrate sub-indicators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorWeights {
    pub momentum_bias: f64,
    pub volume_pressure: f64,
    pub volatility_calm: f64,
    pub spread_tightness: f64,
    pub confluence: f64,
    pub momentum_dominance: f64,
    pub liquidity_depth: f64,
    pub trend_persistence: f64,
    pub regime_stability: f64,
}

impl IndicatorWeights {
    /// Weights in the fixed sub-indicator order used by the field engine.
    pub fn as_array(&self) -> [f64; 9] {
        [
            self.momentum_bias,
            self.volume_pressure,
            self.volatility_calm,
            self.spread_tightness,
            self.confluence,
            self.momentum_dominance,
            self.liquidity_depth,
            self.trend_persistence,
            self.regime_stability,
        ]
    }

    pub fn total(&self) -> f64 {
        self.as_array().iter().sum()
    }

    /// All weights set to zero.
    pub fn zero() -> Self {
        Self {
            momentum_bias: 0.0,
            volume_pressure: 0.0,
            volatility_calm: 0.0,
            spread_tightness: 0.0,
            confluence: 0.0,
            momentum_dominance: 0.0,
            liquidity_depth: 0.0,
            trend_persistence: 0.0,
            regime_stability: 0.0,
        }
    }
}

impl Default for IndicatorWeights {
    fn default() -> Self {
        Self {
            momentum_bias: 0.15,
            volume_pressure: 0.15,
            volatility_calm: 0.10,
            spread_tightness: 0.10,
            confluence: 0.10,
            momentum_dominance: 0.10,
            liquidity_depth: 0.10,
            trend_persistence: 0.10,
            regime_stability: 0.10,
        }
    }
}

// =============================================================================
// Per-stage parameter groups
// =============================================================================

/// Field engine parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldParams {
    #[serde(default)]
    pub weights: IndicatorWeights,

    /// Scales the weighted indicator average into [0, 0.5].
    #[serde(default = "default_substrate_scale")]
    pub substrate_scale: f64,

    /// Multiplier on the previous lambda.
    #[serde(default = "default_observer_gain")]
    pub observer_gain: f64,

    /// Multiplier on the mean of the lambda window.
    #[serde(default = "default_echo_gain")]
    pub echo_gain: f64,

    /// Number of past lambda values retained.
    #[serde(default = "default_lambda_window")]
    pub lambda_window: usize,

    /// Upper bound of the uniform microstructure noise added to the
    /// coherence variance proxy.  0 disables it.
    #[serde(default)]
    pub coherence_noise: f64,

    /// Seed for the noise source; `None` seeds from OS entropy.
    #[serde(default)]
    pub noise_seed: Option<u64>,
}

impl Default for FieldParams {
    fn default() -> Self {
        Self {
            weights: IndicatorWeights::default(),
            substrate_scale: default_substrate_scale(),
            observer_gain: default_observer_gain(),
            echo_gain: default_echo_gain(),
            lambda_window: default_lambda_window(),
            coherence_noise: 0.0,
            noise_seed: None,
        }
    }
}

/// Curvature (FTCP) detector parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurvatureParams {
    #[serde(default = "default_curvature_window")]
    pub window: usize,

    /// Minimum |curvature| for a point to count as sharp.
    #[serde(default = "default_sharpness_threshold")]
    pub sharpness_threshold: f64,

    /// Minimum golden-ratio score for a point to count as aligned.
    #[serde(default = "default_alignment_threshold")]
    pub alignment_threshold: f64,

    #[serde(default = "default_golden_ratio")]
    pub golden_ratio: f64,
}

impl Default for CurvatureParams {
    fn default() -> Self {
        Self {
            window: default_curvature_window(),
            sharpness_threshold: default_sharpness_threshold(),
            alignment_threshold: default_alignment_threshold(),
            golden_ratio: default_golden_ratio(),
        }
    }
}

/// Lighthouse consensus parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsensusParams {
    /// Number of past L values used for the adaptive threshold.
    #[serde(default = "default_consensus_window")]
    pub history_window: usize,

    /// Number of lambdas used for the Cphi stability metric.
    #[serde(default = "default_stability_window")]
    pub stability_window: usize,

    /// Samples required before the threshold adapts.
    #[serde(default = "default_min_samples")]
    pub min_samples: usize,

    /// Threshold used until `min_samples` L values exist.
    #[serde(default = "default_threshold_floor")]
    pub threshold_floor: f64,

    /// k in mean + k·σ.
    #[serde(default = "default_sigma_multiplier")]
    pub sigma_multiplier: f64,
}

impl Default for ConsensusParams {
    fn default() -> Self {
        Self {
            history_window: default_consensus_window(),
            stability_window: default_stability_window(),
            min_samples: default_min_samples(),
            threshold_floor: default_threshold_floor(),
            sigma_multiplier: default_sigma_multiplier(),
        }
    }
}

/// Signal generator parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalParams {
    /// Coherence at or above which the field counts as highly coherent.
    #[serde(default = "default_high_coherence")]
    pub high_coherence: f64,

    /// Coherence below which a SHORT may be considered.
    #[serde(default = "default_weak_coherence")]
    pub weak_coherence: f64,

    /// SHORT requires L below this fraction of the threshold.
    #[serde(default = "default_weak_lighthouse_fraction")]
    pub weak_lighthouse_fraction: f64,

    #[serde(default = "default_signal_window")]
    pub history_window: usize,
}

impl Default for SignalParams {
    fn default() -> Self {
        Self {
            high_coherence: default_high_coherence(),
            weak_coherence: default_weak_coherence(),
            weak_lighthouse_fraction: default_weak_lighthouse_fraction(),
            history_window: default_signal_window(),
        }
    }
}

/// Frequency-mapping phase classifier parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseParams {
    #[serde(default = "default_phase_window")]
    pub window: usize,

    #[serde(default = "default_manifest_coherence")]
    pub manifest_coherence: f64,

    /// Highest oscillation frequency still considered MANIFEST.
    #[serde(default = "default_max_manifest_frequency")]
    pub max_manifest_frequency: f64,

    #[serde(default = "default_dissolving_coherence")]
    pub dissolving_coherence: f64,
}

impl Default for PhaseParams {
    fn default() -> Self {
        Self {
            window: default_phase_window(),
            manifest_coherence: default_manifest_coherence(),
            max_manifest_frequency: default_max_manifest_frequency(),
            dissolving_coherence: default_dissolving_coherence(),
        }
    }
}

// =============================================================================
// PipelineConfig
// =============================================================================

/// Top-level configuration: one copy per pipeline instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    // --- Host ---------------------------------------------------------------

    /// Instruments the host drives, one pipeline each.
    #[serde(default = "default_symbols")]
    pub symbols: Vec<String>,

    /// Tick period used by the host scheduler.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    // --- Stages -------------------------------------------------------------

    #[serde(default)]
    pub field: FieldParams,

    #[serde(default)]
    pub curvature: CurvatureParams,

    #[serde(default)]
    pub consensus: ConsensusParams,

    #[serde(default)]
    pub signal: SignalParams,

    #[serde(default)]
    pub phase: PhaseParams,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            symbols: default_symbols(),
            tick_interval_ms: default_tick_interval_ms(),
            field: FieldParams::default(),
            curvature: CurvatureParams::default(),
            consensus: ConsensusParams::default(),
            signal: SignalParams::default(),
            phase: PhaseParams::default(),
        }
    }
}

impl PipelineConfig {
    /// Load configuration from a JSON file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read pipeline config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse pipeline config from {}", path.display()))?;

        info!(
            path = %path.display(),
            symbols = ?config.symbols,
            "pipeline config loaded"
        );

        Ok(config)
    }

    /// Persist the configuration to `path` using an atomic write
    /// (write to `.tmp`, then rename).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content = serde_json::to_string_pretty(self)
            .context("failed to serialise pipeline config to JSON")?;

        let tmp_path = path.with_extension("json.tmp");

        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp config to {}", tmp_path.display()))?;

        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to rename tmp config to {}", path.display()))?;

        info!(path = %path.display(), "pipeline config saved (atomic)");
        Ok(())
    }

    /// Reject values that would make a stage meaningless.
    pub fn validate(&self) -> Result<()> {
        ensure!(self.tick_interval_ms > 0, "tick_interval_ms must be positive");

        let f = &self.field;
        ensure!(f.lambda_window > 0, "field.lambda_window must be positive");
        ensure!(
            (0.0..=0.5).contains(&f.substrate_scale),
            "field.substrate_scale must lie in [0, 0.5], got {}",
            f.substrate_scale
        );
        ensure!(
            f.observer_gain.is_finite() && f.observer_gain >= 0.0,
            "field.observer_gain must be a non-negative number"
        );
        ensure!(
            f.echo_gain.is_finite() && f.echo_gain >= 0.0,
            "field.echo_gain must be a non-negative number"
        );
        ensure!(
            (0.0..=1.0).contains(&f.coherence_noise),
            "field.coherence_noise must lie in [0, 1], got {}",
            f.coherence_noise
        );
        ensure!(
            f.weights.as_array().iter().all(|w| w.is_finite() && *w >= 0.0),
            "field.weights must be non-negative numbers"
        );

        let c = &self.curvature;
        ensure!(c.window >= 3, "curvature.window must hold at least 3 points");
        ensure!(
            c.golden_ratio.is_finite() && c.golden_ratio > 1.0,
            "curvature.golden_ratio must be greater than 1, got {}",
            c.golden_ratio
        );
        ensure!(
            (0.0..=1.0).contains(&c.alignment_threshold),
            "curvature.alignment_threshold must lie in [0, 1]"
        );
        ensure!(
            c.sharpness_threshold.is_finite() && c.sharpness_threshold >= 0.0,
            "curvature.sharpness_threshold must be a non-negative number"
        );

        let k = &self.consensus;
        ensure!(k.history_window > 0, "consensus.history_window must be positive");
        ensure!(k.stability_window > 0, "consensus.stability_window must be positive");
        ensure!(
            k.min_samples <= k.history_window,
            "consensus.min_samples ({}) exceeds history_window ({})",
            k.min_samples,
            k.history_window
        );
        ensure!(
            k.threshold_floor.is_finite() && k.threshold_floor >= 0.0,
            "consensus.threshold_floor must be a non-negative number"
        );
        ensure!(
            k.sigma_multiplier.is_finite() && k.sigma_multiplier >= 0.0,
            "consensus.sigma_multiplier must be a non-negative number"
        );

        let s = &self.signal;
        ensure!(s.history_window > 0, "signal.history_window must be positive");
        ensure!(
            (0.0..=1.0).contains(&s.high_coherence),
            "signal.high_coherence must lie in [0, 1]"
        );
        ensure!(
            (0.0..=1.0).contains(&s.weak_coherence),
            "signal.weak_coherence must lie in [0, 1]"
        );
        ensure!(
            s.weak_lighthouse_fraction.is_finite() && s.weak_lighthouse_fraction >= 0.0,
            "signal.weak_lighthouse_fraction must be a non-negative number"
        );

        let p = &self.phase;
        ensure!(p.window >= 3, "phase.window must hold at least 3 samples");
        ensure!(
            (0.0..=1.0).contains(&p.manifest_coherence),
            "phase.manifest_coherence must lie in [0, 1]"
        );
        ensure!(
            (0.0..=1.0).contains(&p.max_manifest_frequency),
            "phase.max_manifest_frequency must lie in [0, 1]"
        );
        ensure!(
            (0.0..=1.0).contains(&p.dissolving_coherence),
            "phase.dissolving_coherence must lie in [0, 1]"
        );

        Ok(())
    }
}
