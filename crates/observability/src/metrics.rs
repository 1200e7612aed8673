//! Gesture metrics collection
//!
//! Records Prometheus metrics from each `SignalBatch` and keeps in-memory
//! running statistics for the end-of-run summary.

use contracts::{Signal, SignalBatch};
use metrics::{counter, gauge, histogram};

/// Record metrics for one emitted batch
///
/// Call once per `SignalBatch` produced by the frame processor.
///
/// # Example
///
/// ```ignore
/// use observability::metrics::record_gesture_metrics;
///
/// if let Some(batch) = processor.handle(event) {
///     record_gesture_metrics(&batch);
///     // ...
/// }
/// ```
pub fn record_gesture_metrics(batch: &SignalBatch) {
    counter!("tuio_gesture_frames_total").increment(1);
    gauge!("tuio_gesture_last_frame_id").set(batch.frame_id as f64);

    gauge!("tuio_gesture_touch_count").set(batch.stats.touch_count as f64);
    gauge!("tuio_gesture_object_count").set(batch.stats.object_count as f64);
    histogram!("tuio_gesture_batch_updates").record(batch.len() as f64);

    if batch.stats.implicit {
        counter!("tuio_gesture_implicit_frames_total").increment(1);
    }

    if let Some(translation) = batch
        .value_of(Signal::TouchTranslation)
        .and_then(|v| v.as_point())
    {
        histogram!("tuio_gesture_translation_magnitude").record(translation.length() as f64);
    }

    if let Some(growth) = batch.value_of(Signal::TouchGrowth).and_then(|v| v.as_f32()) {
        histogram!("tuio_gesture_growth").record(growth as f64);
    }

    if let Some(rotation) = batch
        .value_of(Signal::TouchRotation)
        .and_then(|v| v.as_f32())
    {
        histogram!("tuio_gesture_rotation").record(rotation as f64);
    }
}

/// Record processing latency of one frame (first event to batch)
pub fn record_frame_latency_ms(latency_ms: f64) {
    histogram!("tuio_gesture_frame_latency_ms").record(latency_ms);
}

/// Gesture metrics aggregator
///
/// Aggregates in memory for statistics and the summary output.
#[derive(Debug, Clone, Default)]
pub struct GestureMetricsAggregator {
    /// Total batches
    pub total_frames: u64,

    /// Batches without an explicit frame start
    pub implicit_frames: u64,

    /// Frames with at least one live touch
    pub frames_with_touches: u64,

    /// Contact updates dropped by full slot tables
    pub total_dropped_updates: u64,

    /// Contacts released by liveness reconciliation
    pub total_released: u64,

    /// Highest simultaneous touch count seen
    pub peak_touches: usize,

    /// Signal updates per batch
    pub update_stats: RunningStats,

    /// Translation magnitude per frame
    pub translation_stats: RunningStats,

    /// Growth per frame
    pub growth_stats: RunningStats,

    /// Rotation per frame (radians)
    pub rotation_stats: RunningStats,

    /// Net growth over the run
    pub cumulative_growth: f64,

    /// Net rotation over the run (radians)
    pub cumulative_rotation: f64,
}

impl GestureMetricsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one batch into the aggregate
    pub fn update(&mut self, batch: &SignalBatch) {
        self.total_frames += 1;
        self.total_dropped_updates += batch.stats.dropped_updates as u64;
        self.total_released += batch.stats.released as u64;
        self.peak_touches = self.peak_touches.max(batch.stats.touch_count);
        self.update_stats.push(batch.len() as f64);

        if batch.stats.implicit {
            self.implicit_frames += 1;
        }
        if batch.stats.touch_count > 0 {
            self.frames_with_touches += 1;
        }

        if let Some(translation) = batch
            .value_of(Signal::TouchTranslation)
            .and_then(|v| v.as_point())
        {
            self.translation_stats.push(translation.length() as f64);
        }

        // NaN would poison the sums for the rest of the run
        if let Some(growth) = batch
            .value_of(Signal::TouchGrowth)
            .and_then(|v| v.as_f32())
            .filter(|g| g.is_finite())
        {
            self.growth_stats.push(growth as f64);
            self.cumulative_growth += growth as f64;
        }

        if let Some(rotation) = batch
            .value_of(Signal::TouchRotation)
            .and_then(|v| v.as_f32())
            .filter(|r| r.is_finite())
        {
            self.rotation_stats.push(rotation as f64);
            self.cumulative_rotation += rotation as f64;
        }
    }

    /// Generate summary report
    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            total_frames: self.total_frames,
            implicit_frames: self.implicit_frames,
            frames_with_touches: self.frames_with_touches,
            total_dropped_updates: self.total_dropped_updates,
            total_released: self.total_released,
            peak_touches: self.peak_touches,
            active_rate: if self.total_frames > 0 {
                self.frames_with_touches as f64 / self.total_frames as f64 * 100.0
            } else {
                0.0
            },
            updates_per_frame: StatsSummary::from(&self.update_stats),
            translation: StatsSummary::from(&self.translation_stats),
            growth: StatsSummary::from(&self.growth_stats),
            rotation: StatsSummary::from(&self.rotation_stats),
            cumulative_growth: self.cumulative_growth,
            cumulative_rotation_deg: self.cumulative_rotation.to_degrees(),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Metrics summary
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub total_frames: u64,
    pub implicit_frames: u64,
    pub frames_with_touches: u64,
    pub total_dropped_updates: u64,
    pub total_released: u64,
    pub peak_touches: usize,
    pub active_rate: f64,
    pub updates_per_frame: StatsSummary,
    pub translation: StatsSummary,
    pub growth: StatsSummary,
    pub rotation: StatsSummary,
    pub cumulative_growth: f64,
    pub cumulative_rotation_deg: f64,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Gesture Metrics Summary ===")?;
        writeln!(f, "Total frames: {}", self.total_frames)?;
        writeln!(f, "Implicit frames: {}", self.implicit_frames)?;
        writeln!(
            f,
            "Frames with touches: {} ({:.2}%)",
            self.frames_with_touches, self.active_rate
        )?;
        writeln!(f, "Peak touches: {}", self.peak_touches)?;
        writeln!(f, "Released contacts: {}", self.total_released)?;
        writeln!(f, "Dropped contact updates: {}", self.total_dropped_updates)?;
        writeln!(f, "Updates per frame: {}", self.updates_per_frame)?;
        writeln!(f, "Translation magnitude: {}", self.translation)?;
        writeln!(f, "Growth: {}", self.growth)?;
        writeln!(f, "Rotation (rad): {}", self.rotation)?;
        writeln!(
            f,
            "Net growth: {:+.4}, net rotation: {:+.2} deg",
            self.cumulative_growth, self.cumulative_rotation_deg
        )?;
        Ok(())
    }
}

/// Statistics summary
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.4}, max={:.4}, mean={:.4}, std={:.4} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online statistics (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
