//! Input guard and ingestion metrics

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use contracts::TouchEvent;
pub use contracts::InputGuard;

/// Whether `event` passes the boundary guard
pub fn guard_accepts(guard: InputGuard, event: &TouchEvent) -> bool {
    match (guard, event) {
        (InputGuard::RejectNonFinite, TouchEvent::Set(record)) => record.is_finite(),
        _ => true,
    }
}

/// Ingestion metrics
#[derive(Debug, Default)]
pub struct IngestionMetrics {
    /// Total events forwarded
    pub events_received: AtomicU64,

    /// Total frames opened (BeginFrame events)
    pub frames_received: AtomicU64,

    /// Events dropped by the input guard
    pub events_rejected: AtomicU64,

    /// Current queue length
    pub queue_len: AtomicUsize,
}

impl IngestionMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Record forwarded event
    pub fn record_received(&self, event: &TouchEvent) {
        self.events_received.fetch_add(1, Ordering::Relaxed);
        if matches!(event, TouchEvent::BeginFrame { .. }) {
            self.frames_received.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record event dropped by the guard
    pub fn record_rejected(&self) {
        self.events_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Update queue length
    pub fn update_queue_len(&self, len: usize) {
        self.queue_len.store(len, Ordering::Relaxed);
    }

    /// Get snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            events_received: self.events_received.load(Ordering::Relaxed),
            frames_received: self.frames_received.load(Ordering::Relaxed),
            events_rejected: self.events_rejected.load(Ordering::Relaxed),
            queue_len: self.queue_len.load(Ordering::Relaxed),
        }
    }
}

/// Metrics snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub events_received: u64,
    pub frames_received: u64,
    pub events_rejected: u64,
    pub queue_len: usize,
}
