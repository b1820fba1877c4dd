// =============================================================================
// Field Engine — Recursive Lambda field with self-referential feedback
// =============================================================================
//
//   substrate = weighted_avg(sub_indicators) · substrate_scale
//   observer  = λ[t-1] · observer_gain              (0 with no history)
//   echo      = mean(λ window) · echo_gain          (0 with < 2 samples)
//   λ         = clamp(substrate + observer + echo, 0, 1)
//
// λ is appended to the window before coherence is derived, so it feeds the
// observer/echo terms of the *next* tick only.
//
//   coherence = clamp(1 - ((λ - 0.5) / 0.5)² - noise, 0, 1)
//
// `noise` is uniform in [0, coherence_noise) from a seedable generator.  With
// the default amplitude of 0 the engine is fully deterministic.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, trace};

use crate::field::indicators;
use crate::history::BoundedHistory;
use crate::numeric::{clamp_unit, sanitize};
use crate::runtime_config::FieldParams;
use crate::types::{FieldState, MarketSnapshot};

const STAGE: &str = "field";

/// Neutral midpoint of the field.
const MIDPOINT: f64 = 0.5;

/// Stateful field engine for a single instrument.
pub struct FieldEngine {
    params: FieldParams,
    lambdas: BoundedHistory<f64>,
    noise: StdRng,
}

impl FieldEngine {
    pub fn new(params: FieldParams) -> Self {
        let noise = seed_rng(params.noise_seed);
        let lambdas = BoundedHistory::new(params.lambda_window);
        Self {
            params,
            lambdas,
            noise,
        }
    }

    /// Advance the field by one snapshot.
    pub fn step(&mut self, snapshot: &MarketSnapshot) -> FieldState {
        let snapshot = sanitize_snapshot(snapshot);

        let values = indicators::evaluate(&snapshot);
        let weights = self.params.weights.as_array();
        let substrate = sanitize(
            indicators::weighted_average(&values, &weights) * self.params.substrate_scale,
            STAGE,
            "substrate",
        );

        let observer = self
            .lambdas
            .last()
            .map(|last| last * self.params.observer_gain)
            .unwrap_or(0.0);

        let echo = if self.lambdas.len() >= 2 {
            self.lambdas.mean() * self.params.echo_gain
        } else {
            0.0
        };

        let lambda = clamp_unit(substrate + observer + echo, STAGE, "lambda");
        self.lambdas.push(lambda);

        let deviation = (lambda - MIDPOINT) / MIDPOINT;
        let variance_proxy = deviation * deviation + self.draw_noise();
        let coherence = clamp_unit(1.0 - variance_proxy, STAGE, "coherence");

        trace!(
            timestamp = snapshot.timestamp,
            indicators = ?values,
            "field sub-indicators evaluated"
        );
        debug!(
            lambda = format!("{:.4}", lambda),
            coherence = format!("{:.4}", coherence),
            substrate = format!("{:.4}", substrate),
            observer = format!("{:.4}", observer),
            echo = format!("{:.4}", echo),
            "field step complete"
        );

        FieldState {
            lambda,
            coherence,
            substrate,
            observer: sanitize(observer, STAGE, "observer"),
            echo: sanitize(echo, STAGE, "echo"),
        }
    }

    /// Most recent lambda, if any.
    pub fn last_lambda(&self) -> Option<f64> {
        self.lambdas.last().copied()
    }

    /// Retained lambda window, oldest first.
    pub fn lambda_history(&self) -> Vec<f64> {
        self.lambdas.to_vec()
    }

    /// Clear the lambda window and reseed the noise source.
    pub fn reset(&mut self) {
        self.lambdas.clear();
        self.noise = seed_rng(self.params.noise_seed);
    }

    fn draw_noise(&mut self) -> f64 {
        if self.params.coherence_noise > 0.0 {
            self.noise.gen::<f64>() * self.params.coherence_noise
        } else {
            0.0
        }
    }
}

impl Default for FieldEngine {
    fn default() -> Self {
        Self::new(FieldParams::default())
    }
}

fn seed_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Replace any non-finite snapshot field with 0 so one bad tick cannot halt
/// the stream.
fn sanitize_snapshot(s: &MarketSnapshot) -> MarketSnapshot {
    MarketSnapshot {
        price: sanitize(s.price, STAGE, "price"),
        volume: sanitize(s.volume, STAGE, "volume"),
        volatility: sanitize(s.volatility, STAGE, "volatility"),
        momentum: sanitize(s.momentum, STAGE, "momentum"),
        spread: sanitize(s.spread, STAGE, "spread"),
        timestamp: s.timestamp,
    }
}
