// =============================================================================
// Output Sink — Fire-and-forget emission of tick records
// =============================================================================
//
// The pipeline never performs I/O.  The orchestrator wraps each tick outcome
// in a `PipelineRecord` and hands it to a `SignalSink`; a slow or absent
// consumer must never stall or fail the tick, so `emit` has no return value
// and the channel sink drops (and counts) records it cannot enqueue.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::debug;

use crate::pipeline::TickOutcome;

/// Auditable record of one tick for one instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineRecord {
    /// Unique identifier for this record (UUID v4).
    pub id: String,

    /// Instrument the tick belongs to.
    pub symbol: String,

    /// ISO 8601 timestamp of when the record was emitted.
    pub emitted_at: String,

    #[serde(flatten)]
    pub outcome: TickOutcome,
}

impl PipelineRecord {
    pub fn new(symbol: impl Into<String>, outcome: TickOutcome) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            symbol: symbol.into(),
            emitted_at: chrono::Utc::now().to_rfc3339(),
            outcome,
        }
    }
}

/// Destination for tick records.
pub trait SignalSink: Send + Sync {
    fn emit(&self, record: PipelineRecord);
}

/// Discards every record.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl SignalSink for NullSink {
    fn emit(&self, _record: PipelineRecord) {}
}

/// Bounded channel sink; never blocks the producer.
pub struct ChannelSink {
    tx: mpsc::Sender<PipelineRecord>,
    dropped: AtomicU64,
}

impl ChannelSink {
    /// Create a sink and its receiving half.
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<PipelineRecord>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (
            Self {
                tx,
                dropped: AtomicU64::new(0),
            },
            rx,
        )
    }

    /// Records dropped because the channel was full or closed.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl SignalSink for ChannelSink {
    fn emit(&self, record: PipelineRecord) {
        match self.tx.try_send(record) {
            Ok(()) => {}
            Err(TrySendError::Full(r)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                debug!(symbol = %r.symbol, "sink full, record dropped");
            }
            Err(TrySendError::Closed(r)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                debug!(symbol = %r.symbol, "sink closed, record dropped");
            }
        }
    }
}
