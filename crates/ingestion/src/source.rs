//! Event source trait and the sender handed to sources

use std::sync::Arc;

use async_channel::Sender;
use contracts::{InputConfig, InputSource, TouchEvent};
use tracing::{trace, warn};

use crate::config::{guard_accepts, IngestionMetrics, InputGuard};
use crate::error::{IngestionError, Result};
use crate::mock::MockGestureSource;
use crate::replay::ReplaySource;

/// Touch event source
///
/// Implementations spawn their own task on `start` and push events through
/// the [`EventSender`] in frame order.
pub trait EventSource: Send + Sync {
    /// Source name (used for logging)
    fn name(&self) -> &str;

    /// Start producing events
    fn start(&self, sender: EventSender);

    /// Stop producing events
    fn stop(&self);

    /// Check if the source is running
    fn is_running(&self) -> bool;
}

/// Sending half handed to sources
///
/// Applies the input guard and records metrics. Sends wait for channel room
/// instead of dropping, since a frame with missing events is malformed.
#[derive(Clone)]
pub struct EventSender {
    source_name: Arc<str>,
    tx: Sender<TouchEvent>,
    metrics: Arc<IngestionMetrics>,
    guard: InputGuard,
}

impl EventSender {
    pub(crate) fn new(
        source_name: &str,
        tx: Sender<TouchEvent>,
        metrics: Arc<IngestionMetrics>,
        guard: InputGuard,
    ) -> Self {
        Self {
            source_name: source_name.into(),
            tx,
            metrics,
            guard,
        }
    }

    /// Forward one event
    ///
    /// # Errors
    /// [`IngestionError::ChannelClosed`] once the receiver is gone.
    pub async fn send(&self, event: TouchEvent) -> Result<()> {
        if !guard_accepts(self.guard, &event) {
            warn!(source = %self.source_name, ?event, "non-finite contact rejected");
            self.metrics.record_rejected();
            metrics::counter!("tuio_gesture_events_rejected_total").increment(1);
            return Ok(());
        }

        self.metrics.record_received(&event);
        trace!(source = %self.source_name, event = event.label(), "event forwarded");
        self.tx
            .send(event)
            .await
            .map_err(|_| IngestionError::ChannelClosed {
                source_name: self.source_name.to_string(),
            })?;
        self.metrics.update_queue_len(self.tx.len());
        Ok(())
    }
}

/// Build the source described by the input section
///
/// # Errors
/// Recording missing or unreadable for a replay source.
pub fn source_from_config(input: &InputConfig) -> Result<Box<dyn EventSource>> {
    match input.source {
        InputSource::Replay => {
            let path = input.path.as_ref().ok_or(IngestionError::MissingReplayPath)?;
            let source = ReplaySource::open(path, input.speed, input.loop_playback)?;
            Ok(Box::new(source))
        }
        InputSource::Mock => Ok(Box::new(MockGestureSource::new(
            input.mock.clone().unwrap_or_default(),
        ))),
    }
}
