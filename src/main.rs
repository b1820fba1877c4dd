// =============================================================================
// Lambda Lighthouse — Host Entry Point
// =============================================================================
//
// Drives one pipeline per configured symbol from a synthetic feed on a fixed
// interval and logs every emitted record.  Broker connectivity, persistence
// and scheduling policy belong to the real host; this binary only shows the
// wiring.
// =============================================================================

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use lambda_lighthouse::{ChannelSink, Orchestrator, PipelineConfig, SignalType, SyntheticFeed};

/// Records buffered between the pipelines and the consumer task.
const SINK_CAPACITY: usize = 1_024;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Lambda Lighthouse — starting up");

    let config_path = std::env::var("LIGHTHOUSE_CONFIG")
        .unwrap_or_else(|_| "pipeline_config.json".to_string());
    let mut config = PipelineConfig::load(&config_path).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        PipelineConfig::default()
    });

    if let Ok(syms) = std::env::var("LIGHTHOUSE_SYMBOLS") {
        config.symbols = syms
            .split(',')
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .collect();
    }
    config.validate().context("invalid pipeline configuration")?;

    let feed_seed: u64 = std::env::var("LIGHTHOUSE_FEED_SEED")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(42);

    info!(
        symbols = ?config.symbols,
        tick_interval_ms = config.tick_interval_ms,
        feed_seed,
        "Configured instruments"
    );

    // ── 2. Sink consumer ─────────────────────────────────────────────────
    let (sink, mut records) = ChannelSink::new(SINK_CAPACITY);
    let sink = Arc::new(sink);

    let consumer = tokio::spawn(async move {
        while let Some(record) = records.recv().await {
            let signal = &record.outcome.signal;
            if signal.signal_type != SignalType::Hold {
                info!(
                    symbol = %record.symbol,
                    signal_type = %signal.signal_type,
                    strength = format!("{:.3}", signal.strength),
                    reason = %signal.reason,
                    "signal emitted"
                );
            }
            match serde_json::to_string(&record) {
                Ok(json) => debug!(record = %json, "record"),
                Err(e) => warn!(error = %e, "failed to serialise record"),
            }
        }
    });

    // ── 3. Pipelines & feeds ─────────────────────────────────────────────
    let orchestrator = Orchestrator::new(config.clone(), sink.clone());
    let start_ms = chrono::Utc::now().timestamp_millis();
    let step_ms = config.tick_interval_ms as i64;

    let mut feeds: HashMap<String, SyntheticFeed> = HashMap::new();
    for (i, symbol) in config.symbols.iter().enumerate() {
        orchestrator.registry().register(symbol)?;
        feeds.insert(
            symbol.clone(),
            SyntheticFeed::new(feed_seed.wrapping_add(i as u64), 100.0, start_ms, step_ms),
        );
    }

    // ── 4. Tick loop ─────────────────────────────────────────────────────
    let mut interval = tokio::time::interval(Duration::from_millis(config.tick_interval_ms));
    loop {
        tokio::select! {
            _ = interval.tick() => {
                for symbol in &config.symbols {
                    if let Some(feed) = feeds.get_mut(symbol) {
                        let snapshot = feed.next_snapshot();
                        orchestrator.process(symbol, &snapshot);
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
        }
    }

    // ── 5. Shutdown summary ──────────────────────────────────────────────
    for (symbol, stats) in orchestrator.registry().statistics() {
        info!(
            symbol = %symbol,
            total = stats.total,
            long = stats.long,
            short = stats.short,
            hold = stats.hold,
            optimal = stats.optimal,
            average_strength = format!("{:.3}", stats.average_strength),
            "Signal statistics"
        );
    }
    info!(dropped = sink.dropped(), "Sink summary");

    drop(orchestrator);
    drop(sink);
    consumer.await.context("sink consumer task panicked")?;

    info!("Lambda Lighthouse — stopped");
    Ok(())
}
