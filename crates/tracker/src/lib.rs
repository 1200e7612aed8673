//! # Tracker
//!
//! Touch-session tracking and per-frame gesture aggregation.
//!
//! Responsibilities:
//! - Fixed-capacity slot table keyed by session id, with liveness reconciliation
//! - Aggregate gesture pass (centroid, translation, growth, rotation)
//! - Frame boundary coordination, one `SignalBatch` per frame
//!
//! ## Example
//!
//! ```
//! use contracts::{Signal, SignalValue, TouchEvent, TrackerConfig};
//! use tracker::FrameProcessor;
//!
//! let mut processor = FrameProcessor::new(&TrackerConfig::default());
//!
//! processor.handle(TouchEvent::begin(0.0));
//! processor.handle(TouchEvent::alive_touches(vec![3]));
//! processor.handle(TouchEvent::set_touch(3, 0.5, 0.5));
//! let batch = processor.handle(TouchEvent::EndFrame).unwrap();
//!
//! assert_eq!(batch.value_of(Signal::TouchCount), Some(SignalValue::Int(1)));
//! assert_eq!(batch.value_of(Signal::TouchGrowth), Some(SignalValue::Float(0.0)));
//! ```

mod aggregate;
mod error;
mod processor;
mod slots;

pub use aggregate::{
    angular_delta, compute_frame, wrap_angle, AggregateFrame, BoundingBox, DEGENERATE_RADIUS,
};
pub use error::TrackerError;
pub use processor::FrameProcessor;
pub use slots::{Contact, LiveSlots, SlotTable, Upsert};

// Re-export contracts types
pub use contracts::{SignalBatch, TouchEvent, TrackerConfig};
