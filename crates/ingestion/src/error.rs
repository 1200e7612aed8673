//! Ingestion error types

use std::path::PathBuf;

use thiserror::Error;

/// Ingestion error
#[derive(Debug, Error)]
pub enum IngestionError {
    /// Recording could not be opened or read
    #[error("failed to read recording {}: {source}", path.display())]
    ReplayOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A recorded line is not a valid event
    #[error("invalid event at {}:{line}: {message}", path.display())]
    ReplayParse {
        path: PathBuf,
        /// 1-based line number
        line: usize,
        message: String,
    },

    /// Replay source without a recording path
    #[error("replay source requires input.path")]
    MissingReplayPath,

    /// Channel closed
    #[error("channel closed for source {source_name}")]
    ChannelClosed { source_name: String },
}

/// Ingestion Result type alias
pub type Result<T> = std::result::Result<T, IngestionError>;
