// =============================================================================
// Synthetic Feed — Seeded random-walk market snapshots
// =============================================================================
//
// Stand-in for a real market-data collaborator.  Produces an endless stream
// of finite snapshots with normalised volume, mean-reverting volatility and
// smoothed momentum.  The same seed always yields the same stream.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::types::MarketSnapshot;

/// Reproducible random-walk snapshot generator.
pub struct SyntheticFeed {
    rng: StdRng,
    price: f64,
    volatility: f64,
    momentum: f64,
    timestamp: i64,
    step_ms: i64,
}

impl SyntheticFeed {
    pub fn new(seed: u64, start_price: f64, start_timestamp: i64, step_ms: i64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            price: start_price.max(0.01),
            volatility: 0.2,
            momentum: 0.0,
            timestamp: start_timestamp,
            step_ms: step_ms.max(1),
        }
    }

    pub fn next_snapshot(&mut self) -> MarketSnapshot {
        let shock: f64 = self.rng.gen_range(-1.0..1.0);

        self.volatility = (0.9 * self.volatility + 0.1 * shock.abs()).clamp(0.001, 2.0);
        let ret = shock * self.volatility * 0.01;
        self.price = (self.price * (1.0 + ret)).max(0.01);
        self.momentum = 0.8 * self.momentum + 0.2 * ret * 100.0;

        let volume = (0.5 + 0.4 * shock.abs() + self.rng.gen_range(-0.1..0.1)).clamp(0.0, 1.0);
        let spread = self.volatility * 0.01 + self.rng.gen_range(0.0..0.001);

        let snapshot = MarketSnapshot {
            price: self.price,
            volume,
            volatility: self.volatility,
            momentum: self.momentum,
            spread,
            timestamp: self.timestamp,
        };

        self.timestamp += self.step_ms;
        snapshot
    }
}

impl Iterator for SyntheticFeed {
    type Item = MarketSnapshot;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.next_snapshot())
    }
}
