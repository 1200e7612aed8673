//! DataSink trait - Dispatcher output interface
//!
//! Defines the abstract interface for Sinks.

use crate::{ContractError, SignalBatch};

/// Data output trait
///
/// All sink implementations must implement this trait. A batch is one
/// frame's worth of updates and must be applied as a unit.
#[trait_variant::make(DataSink: Send)]
pub trait LocalDataSink {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Write one frame's signal batch
    ///
    /// # Errors
    /// Returns write error (should include context)
    async fn write(&mut self, batch: &SignalBatch) -> Result<(), ContractError>;

    /// Flush buffer (if any)
    async fn flush(&mut self) -> Result<(), ContractError>;

    /// Close sink
    async fn close(&mut self) -> Result<(), ContractError>;
}
