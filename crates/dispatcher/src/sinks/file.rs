//! FileSink - appends batches to a JSON-lines log

use contracts::{ContractError, DataSink, SignalBatch};
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use tracing::{debug, error, instrument};

/// Configuration for FileSink
#[derive(Debug, Clone)]
pub struct FileSinkConfig {
    /// Base output directory
    pub base_path: PathBuf,
    /// File name inside `base_path`
    pub file_name: String,
}

impl FileSinkConfig {
    /// Create config from params map
    ///
    /// Without `file_name`, a timestamped `signals-YYYYmmdd-HHMMSS.jsonl` is used.
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        let base_path = params
            .get("base_path")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./output"));

        let file_name = params.get("file_name").cloned().unwrap_or_else(|| {
            format!(
                "signals-{}.jsonl",
                chrono::Local::now().format("%Y%m%d-%H%M%S")
            )
        });

        Self {
            base_path,
            file_name,
        }
    }

    pub fn path(&self) -> PathBuf {
        self.base_path.join(&self.file_name)
    }
}

/// Sink that appends one JSON line per batch
pub struct FileSink {
    name: String,
    path: PathBuf,
    writer: Option<BufWriter<File>>,
}

impl FileSink {
    /// Create a new FileSink
    pub fn new(name: impl Into<String>, config: FileSinkConfig) -> std::io::Result<Self> {
        fs::create_dir_all(&config.base_path)?;
        let path = config.path();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        Ok(Self {
            name: name.into(),
            path,
            writer: Some(BufWriter::new(file)),
        })
    }

    /// Create from params map (for factory)
    pub fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> std::io::Result<Self> {
        let config = FileSinkConfig::from_params(params);
        Self::new(name, config)
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    fn append_batch(&mut self, batch: &SignalBatch) -> std::io::Result<()> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| std::io::Error::other("file sink closed"))?;
        serde_json::to_writer(&mut *writer, batch)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        writer.write_all(b"\n")
    }

    fn persist_batch(&mut self, batch: &SignalBatch) -> Result<(), ContractError> {
        self.append_batch(batch).map_err(|e| {
            error!(sink = %self.name, frame_id = batch.frame_id, error = %e, "Write failed");
            ContractError::sink_write(&self.name, e.to_string())
        })
    }
}

impl DataSink for FileSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "file_sink_write",
        skip(self, batch),
        fields(sink = %self.name, frame_id = batch.frame_id)
    )]
    async fn write(&mut self, batch: &SignalBatch) -> Result<(), ContractError> {
        self.persist_batch(batch)
    }

    #[instrument(name = "file_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        if let Some(writer) = self.writer.as_mut() {
            writer.flush()?;
        }
        Ok(())
    }

    #[instrument(name = "file_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }
        debug!(sink = %self.name, path = %self.path.display(), "FileSink closed");
        Ok(())
    }
}
