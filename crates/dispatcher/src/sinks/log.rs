//! LogSink - logs batch summaries via tracing

use std::collections::HashMap;

use contracts::{ContractError, DataSink, Signal, SignalBatch, SignalValue};
use tracing::{info, instrument};

/// Sink that logs one line per batch (or per `every` batches)
pub struct LogSink {
    name: String,
    every: u64,
    seen: u64,
}

impl LogSink {
    /// Create a new LogSink with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            every: 1,
            seen: 0,
        }
    }

    /// Create from params map; `every` thins the output
    pub fn from_params(name: impl Into<String>, params: &HashMap<String, String>) -> Self {
        let every = params
            .get("every")
            .and_then(|s| s.parse().ok())
            .filter(|n: &u64| *n > 0)
            .unwrap_or(1);
        Self {
            every,
            ..Self::new(name)
        }
    }

    fn log_batch_summary(&self, batch: &SignalBatch) {
        let releases = batch.updates.iter().filter(|u| u.is_release()).count();
        let translation = batch.value_of(Signal::TouchTranslation);
        let growth = batch.value_of(Signal::TouchGrowth);
        let rotation = batch.value_of(Signal::TouchRotation);

        info!(
            sink = %self.name,
            frame_id = batch.frame_id,
            timetag = batch.timetag,
            updates = batch.len(),
            releases,
            touches = batch.stats.touch_count,
            objects = batch.stats.object_count,
            dropped = batch.stats.dropped_updates,
            translation = %display_or_dash(translation),
            growth = %display_or_dash(growth),
            rotation = %display_or_dash(rotation),
            "SignalBatch received"
        );
    }
}

fn display_or_dash(value: Option<SignalValue>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

impl DataSink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_sink_write",
        skip(self, batch),
        fields(sink = %self.name, frame_id = batch.frame_id)
    )]
    async fn write(&mut self, batch: &SignalBatch) -> Result<(), ContractError> {
        if self.seen % self.every == 0 {
            self.log_batch_summary(batch);
        }
        self.seen += 1;
        Ok(())
    }

    #[instrument(name = "log_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        Ok(())
    }

    #[instrument(name = "log_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        info!(sink = %self.name, batches = self.seen, "LogSink closed");
        Ok(())
    }
}
