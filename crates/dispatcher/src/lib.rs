//! # Dispatcher
//!
//! Signal batch fan-out.
//!
//! - Consumes one `SignalBatch` per frame
//! - Fans each batch out to every configured sink
//! - Isolates slow sinks so they never stall frame processing
//!
//! A batch is delivered whole or dropped whole; sinks never observe a
//! partial frame.

pub mod dispatcher;
pub mod error;
pub mod handle;
pub mod metrics;
pub mod sinks;

pub use contracts::{DataSink, SignalBatch};
pub use dispatcher::{
    create_dispatcher, create_sink_handle, Dispatcher, DispatcherBuilder, DispatcherConfig,
};
pub use error::DispatcherError;
pub use handle::SinkHandle;
pub use metrics::{MetricsSnapshot, SinkMetrics};
pub use sinks::{FileSink, FileSinkConfig, LogSink, NetworkFormat, NetworkSink, NetworkSinkConfig};
