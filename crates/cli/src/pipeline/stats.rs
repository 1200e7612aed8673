//! Pipeline statistics and metrics.

use std::fmt;
use std::time::Duration;

use dispatcher::MetricsSnapshot;
use observability::GestureMetricsAggregator;

/// Why the processing loop ended
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StopReason {
    /// Every source finished and the queue drained
    #[default]
    InputExhausted,
    /// `--max-frames` reached
    MaxFrames,
    /// `--timeout` elapsed
    Timeout,
    /// Ctrl+C or SIGTERM
    Interrupted,
    /// Dispatcher stopped accepting batches
    DispatcherClosed,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            StopReason::InputExhausted => "input exhausted",
            StopReason::MaxFrames => "max frames reached",
            StopReason::Timeout => "timeout",
            StopReason::Interrupted => "interrupted",
            StopReason::DispatcherClosed => "dispatcher closed",
        };
        f.write_str(text)
    }
}

/// Statistics from a pipeline run
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    /// Signal batches emitted by the processor
    pub frames_processed: u64,

    /// Touch events consumed
    pub events_processed: u64,

    /// Events dropped by the input guard
    pub events_rejected: u64,

    /// Total duration of the pipeline run
    pub duration: Duration,

    /// Number of sinks that received data
    pub active_sinks: usize,

    /// Why the run ended
    pub stop_reason: StopReason,

    /// Per-batch gesture statistics
    pub gesture_metrics: GestureMetricsAggregator,

    /// Final counters of each sink
    pub sink_metrics: Vec<(String, MetricsSnapshot)>,
}

impl PipelineStats {
    /// Frames per second throughput
    pub fn fps(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.frames_processed as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Batches lost across all sinks because their queues were full
    pub fn batches_dropped(&self) -> u64 {
        self.sink_metrics.iter().map(|(_, m)| m.dropped_count).sum()
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                    Pipeline Statistics                       ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Stopped by: {}", self.stop_reason);
        println!("   ├─ Frames: {}", self.frames_processed);
        println!("   ├─ Events: {}", self.events_processed);
        println!("   ├─ Events rejected: {}", self.events_rejected);
        println!("   ├─ FPS: {:.2}", self.fps());
        println!("   └─ Active sinks: {}", self.active_sinks);

        let summary = self.gesture_metrics.summary();

        println!("\nGestures");
        println!(
            "   ├─ Frames with touches: {} ({:.2}%)",
            summary.frames_with_touches, summary.active_rate
        );
        println!("   ├─ Peak touches: {}", summary.peak_touches);
        println!("   ├─ Released contacts: {}", summary.total_released);
        println!("   ├─ Dropped contact updates: {}", summary.total_dropped_updates);
        println!("   ├─ Translation magnitude: {}", summary.translation);
        println!("   ├─ Growth: {}", summary.growth);
        println!("   ├─ Rotation (rad): {}", summary.rotation);
        println!(
            "   └─ Net: growth {:+.4}, rotation {:+.2} deg",
            summary.cumulative_growth, summary.cumulative_rotation_deg
        );

        if !self.sink_metrics.is_empty() {
            println!("\nSinks");
            for (i, (name, metrics)) in self.sink_metrics.iter().enumerate() {
                let prefix = if i == self.sink_metrics.len() - 1 {
                    "└─"
                } else {
                    "├─"
                };
                println!(
                    "   {} {}: {} written, {} dropped, {} failed",
                    prefix, name, metrics.write_count, metrics.dropped_count, metrics.failure_count
                );
            }
        }

        println!();
    }
}
