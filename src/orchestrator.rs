// =============================================================================
// Orchestrator — Per-instrument pipelines plus the output sink
// =============================================================================
//
// Thread safety:
//   - parking_lot::RwLock over the symbol → pipeline map.
//   - parking_lot::Mutex per pipeline: a pipeline is never ticked
//     concurrently, and no two instruments share a pipeline.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{bail, Result};
use parking_lot::{Mutex, RwLock};
use tracing::info;

use crate::pipeline::{Pipeline, TickOutcome};
use crate::runtime_config::PipelineConfig;
use crate::signals::SignalStatistics;
use crate::sink::{PipelineRecord, SignalSink};
use crate::types::MarketSnapshot;

/// Shared handle to one instrument's pipeline.
pub type PipelineHandle = Arc<Mutex<Pipeline>>;

// =============================================================================
// PipelineRegistry
// =============================================================================

/// Owns one independent pipeline per symbol.
pub struct PipelineRegistry {
    config: PipelineConfig,
    pipelines: RwLock<HashMap<String, PipelineHandle>>,
}

impl PipelineRegistry {
    /// Every pipeline created by this registry uses `config`.
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            pipelines: RwLock::new(HashMap::new()),
        }
    }

    /// Create a pipeline for `symbol`; fails if one already exists.
    pub fn register(&self, symbol: &str) -> Result<PipelineHandle> {
        let mut pipelines = self.pipelines.write();
        if pipelines.contains_key(symbol) {
            bail!("pipeline for {} is already registered", symbol);
        }
        let handle = Arc::new(Mutex::new(Pipeline::new(&self.config)));
        pipelines.insert(symbol.to_string(), handle.clone());
        info!(symbol, "pipeline registered");
        Ok(handle)
    }

    pub fn get(&self, symbol: &str) -> Option<PipelineHandle> {
        self.pipelines.read().get(symbol).cloned()
    }

    /// Fetch the pipeline for `symbol`, creating it on first use.
    pub fn get_or_create(&self, symbol: &str) -> PipelineHandle {
        if let Some(handle) = self.get(symbol) {
            return handle;
        }
        let mut pipelines = self.pipelines.write();
        pipelines
            .entry(symbol.to_string())
            .or_insert_with(|| {
                info!(symbol, "pipeline created on first tick");
                Arc::new(Mutex::new(Pipeline::new(&self.config)))
            })
            .clone()
    }

    pub fn remove(&self, symbol: &str) -> bool {
        self.pipelines.write().remove(symbol).is_some()
    }

    /// Registered symbols, sorted.
    pub fn symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = self.pipelines.read().keys().cloned().collect();
        symbols.sort();
        symbols
    }

    /// Signal statistics for every registered symbol.
    pub fn statistics(&self) -> HashMap<String, SignalStatistics> {
        self.pipelines
            .read()
            .iter()
            .map(|(symbol, handle)| (symbol.clone(), handle.lock().statistics()))
            .collect()
    }
}

// =============================================================================
// Orchestrator
// =============================================================================

/// Routes snapshots to the right pipeline and emits each outcome.
pub struct Orchestrator {
    registry: PipelineRegistry,
    sink: Arc<dyn SignalSink>,
}

impl Orchestrator {
    pub fn new(config: PipelineConfig, sink: Arc<dyn SignalSink>) -> Self {
        Self {
            registry: PipelineRegistry::new(config),
            sink,
        }
    }

    pub fn registry(&self) -> &PipelineRegistry {
        &self.registry
    }

    /// Run one tick for `symbol` and hand the outcome to the sink.
    pub fn process(&self, symbol: &str, snapshot: &MarketSnapshot) -> TickOutcome {
        let handle = self.registry.get_or_create(symbol);
        let outcome = handle.lock().tick(snapshot);
        self.sink.emit(PipelineRecord::new(symbol, outcome.clone()));
        outcome
    }
}
