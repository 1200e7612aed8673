//! Ingestion Pipeline main entry

use std::sync::Arc;

use async_channel::{bounded, Receiver, Sender};
use contracts::TouchEvent;
use tracing::{debug, info, instrument};

use crate::config::{IngestionMetrics, InputGuard};
use crate::source::{EventSender, EventSource};

/// Ingestion Pipeline
///
/// Owns the registered event sources and the bounded channel they feed.
/// Sources are expected to deliver whole frames in order, so the channel
/// applies backpressure rather than dropping events.
pub struct IngestionPipeline {
    /// Registered sources
    sources: Vec<Box<dyn EventSource>>,

    /// Shared metrics
    metrics: Arc<IngestionMetrics>,

    /// Event sender (shared by all sources)
    tx: Sender<TouchEvent>,

    /// Event receiver
    rx: Option<Receiver<TouchEvent>>,

    /// Boundary guard for non-finite coordinates
    guard: InputGuard,
}

impl IngestionPipeline {
    /// Create new Ingestion Pipeline
    ///
    /// # Arguments
    /// * `channel_capacity` - Channel capacity
    pub fn new(channel_capacity: usize) -> Self {
        Self::with_guard(channel_capacity, InputGuard::default())
    }

    /// Create with an explicit input guard
    pub fn with_guard(channel_capacity: usize, guard: InputGuard) -> Self {
        let (tx, rx) = bounded(channel_capacity.max(1));

        Self {
            sources: Vec::new(),
            metrics: Arc::new(IngestionMetrics::new()),
            tx,
            rx: Some(rx),
            guard,
        }
    }

    /// Register an event source
    #[instrument(
        name = "ingestion_register_source",
        skip(self, source),
        fields(source = %source.name())
    )]
    pub fn register_source(&mut self, source: Box<dyn EventSource>) {
        debug!(source = %source.name(), "registered event source");
        self.sources.push(source);
    }

    /// Start all registered sources
    #[instrument(name = "ingestion_start_all", skip(self))]
    pub fn start_all(&self) {
        info!(count = self.sources.len(), guard = ?self.guard, "starting event sources");
        for source in &self.sources {
            if !source.is_running() {
                debug!(source = %source.name(), "starting source");
                source.start(EventSender::new(
                    source.name(),
                    self.tx.clone(),
                    self.metrics.clone(),
                    self.guard,
                ));
            }
        }
    }

    /// Stop all sources
    #[instrument(name = "ingestion_stop_all", skip(self))]
    pub fn stop_all(&self) {
        for source in &self.sources {
            if source.is_running() {
                debug!(source = %source.name(), "stopping source");
                source.stop();
            }
        }
    }

    /// Get event stream receiver
    ///
    /// Note: Can only be called once, subsequent calls return None
    pub fn take_receiver(&mut self) -> Option<Receiver<TouchEvent>> {
        self.rx.take()
    }

    /// Get metrics reference
    pub fn metrics(&self) -> Arc<IngestionMetrics> {
        self.metrics.clone()
    }

    /// Get registered source count
    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// True while any source is still producing
    pub fn any_running(&self) -> bool {
        self.sources.iter().any(|source| source.is_running())
    }
}

impl Drop for IngestionPipeline {
    fn drop(&mut self) {
        self.stop_all();
    }
}
