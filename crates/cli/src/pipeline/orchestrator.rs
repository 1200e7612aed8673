//! Pipeline orchestrator - coordinates all components.
//!
//! ingestion -> frame processor -> dispatcher, on a single task. The
//! processor is synchronous; each event is handled to completion before the
//! next one is read.

use std::future::Future;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use contracts::{GestureBlueprint, SignalBatch};
use ingestion::IngestionPipeline;
use observability::{record_frame_latency_ms, record_gesture_metrics};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use tracker::FrameProcessor;

use super::{PipelineStats, StopReason};

/// How often to check whether the sources have finished
const IDLE_POLL: Duration = Duration::from_millis(50);

/// How long the dispatcher gets to drain its sinks
const DISPATCHER_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// The run configuration
    pub blueprint: GestureBlueprint,

    /// Maximum number of frames to process (None = unlimited)
    pub max_frames: Option<u64>,

    /// Pipeline timeout (None = no timeout)
    pub timeout: Option<Duration>,

    /// Channel buffer size between processor and dispatcher
    pub buffer_size: usize,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,
}

/// Main pipeline orchestrator
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a new pipeline with the given configuration
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run until the input is exhausted, a limit is hit or `shutdown` resolves
    ///
    /// Sinks are always drained before returning. A frame still open when
    /// the loop stops is discarded along with the tracker state.
    pub async fn run_until<F>(self, shutdown: F) -> Result<PipelineStats>
    where
        F: Future<Output = ()>,
    {
        let start_time = Instant::now();
        let blueprint = &self.config.blueprint;

        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        // Ingestion
        info!(source = ?blueprint.input.source, "Setting up ingestion pipeline...");
        let source =
            ingestion::source_from_config(&blueprint.input).context("Failed to open input")?;
        let mut ingestion =
            IngestionPipeline::with_guard(blueprint.input.channel_capacity, blueprint.input.guard);
        ingestion.register_source(source);
        let events = ingestion
            .take_receiver()
            .context("Failed to get ingestion receiver")?;

        // Dispatcher
        info!("Setting up dispatcher...");
        let (batch_tx, batch_rx) = mpsc::channel::<SignalBatch>(self.config.buffer_size.max(1));

        if blueprint.sinks.is_empty() {
            warn!("No sinks configured - signal batches will be discarded");
        }

        let dispatcher = dispatcher::create_dispatcher(blueprint.sinks.clone(), batch_rx)
            .await
            .context("Failed to create dispatcher")?;
        let active_sinks = dispatcher.sink_count();
        let dispatcher_handle = dispatcher.spawn();
        info!(active_sinks, "Dispatcher started");

        let mut processor = FrameProcessor::new(&blueprint.tracker);
        let mut stats = PipelineStats {
            active_sinks,
            ..Default::default()
        };

        ingestion.start_all();
        info!(max_frames = ?self.config.max_frames, "Pipeline running");

        let deadline = async {
            match self.config.timeout {
                Some(timeout) => tokio::time::sleep(timeout).await,
                None => std::future::pending().await,
            }
        };
        tokio::pin!(deadline);
        tokio::pin!(shutdown);

        let mut idle = tokio::time::interval(IDLE_POLL);
        let mut frame_started: Option<Instant> = None;

        stats.stop_reason = loop {
            tokio::select! {
                biased;

                _ = &mut shutdown => {
                    warn!("Received shutdown signal, stopping pipeline...");
                    break StopReason::Interrupted;
                }
                _ = &mut deadline => {
                    warn!(timeout = ?self.config.timeout, "Pipeline timed out");
                    break StopReason::Timeout;
                }
                event = events.recv() => {
                    let Ok(event) = event else {
                        break StopReason::InputExhausted;
                    };
                    stats.events_processed += 1;
                    let started = *frame_started.get_or_insert_with(Instant::now);

                    let Some(batch) = processor.handle(event) else {
                        continue;
                    };
                    frame_started = None;
                    record_frame_latency_ms(started.elapsed().as_secs_f64() * 1000.0);
                    record_gesture_metrics(&batch);
                    stats.gesture_metrics.update(&batch);
                    stats.frames_processed += 1;

                    debug!(
                        frame_id = batch.frame_id,
                        timetag = batch.timetag,
                        updates = batch.len(),
                        touches = batch.stats.touch_count,
                        objects = batch.stats.object_count,
                        "Signal batch produced"
                    );

                    if batch_tx.send(batch).await.is_err() {
                        warn!("Dispatcher channel closed");
                        break StopReason::DispatcherClosed;
                    }

                    if self
                        .config
                        .max_frames
                        .is_some_and(|max| stats.frames_processed >= max)
                    {
                        info!(frames = stats.frames_processed, "Reached max frames limit");
                        break StopReason::MaxFrames;
                    }
                }
                _ = idle.tick() => {
                    if !ingestion.any_running() && events.is_empty() {
                        break StopReason::InputExhausted;
                    }
                }
            }
        };

        // Shutdown
        info!(reason = %stats.stop_reason, "Shutting down pipeline...");
        ingestion.stop_all();

        if processor.is_frame_open() {
            warn!(
                frame = processor.frame_count() + 1,
                "Discarding partially received frame"
            );
        }

        stats.events_rejected = ingestion.metrics().snapshot().events_rejected;

        // Closing the batch channel lets the dispatcher drain and exit
        drop(batch_tx);
        match tokio::time::timeout(DISPATCHER_DRAIN_TIMEOUT, dispatcher_handle).await {
            Ok(Ok(sink_metrics)) => stats.sink_metrics = sink_metrics,
            Ok(Err(e)) => warn!(error = %e, "Dispatcher task failed"),
            Err(_) => warn!("Dispatcher did not drain in time"),
        }

        stats.duration = start_time.elapsed();

        info!(
            duration_secs = stats.duration.as_secs_f64(),
            fps = format!("{:.2}", stats.fps()),
            "Pipeline shutdown complete"
        );

        Ok(stats)
    }
}
