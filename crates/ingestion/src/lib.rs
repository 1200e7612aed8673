//! # Ingestion Pipeline
//!
//! Touch event ingestion module.
//!
//! Responsibilities:
//! - Event sources: JSON-lines replay and synthetic gestures
//! - Optional boundary guard against non-finite coordinates
//! - Send to downstream via a bounded async-channel
//!
//! ## Usage Example
//!
//! ```ignore
//! use ingestion::{IngestionPipeline, MockGestureSource};
//!
//! let mut pipeline = IngestionPipeline::new(1024);
//! pipeline.register_source(Box::new(MockGestureSource::pinch(2, 60.0)));
//!
//! let rx = pipeline.take_receiver().unwrap();
//! pipeline.start_all();
//! while let Ok(event) = rx.recv().await {
//!     if let Some(batch) = processor.handle(event) {
//!         // Dispatch batch
//!     }
//! }
//! ```

mod config;
mod error;
mod mock;
mod pipeline;
mod replay;
mod source;

// Re-exports
pub use config::{guard_accepts, IngestionMetrics, InputGuard, MetricsSnapshot};
pub use contracts::TouchEvent;
pub use error::{IngestionError, Result};
pub use mock::{frame_events, MockGestureSource};
pub use pipeline::IngestionPipeline;
pub use replay::{frame_delay, load_events, ReplaySource};
pub use source::{source_from_config, EventSender, EventSource};
