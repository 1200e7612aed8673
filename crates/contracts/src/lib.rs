//! # Contracts
//!
//! Frozen interface contracts shared by every crate in the workspace.
//! Business crates depend only on this crate, reverse dependencies are prohibited.
//!
//! ## Time Model
//! - Every frame carries one logical timetag (seconds, f64)
//! - `frame_id` is monotonically increasing per processor, used for ordering/diagnostics
//!
//! ## Boundaries
//! - Inbound: [`TouchEvent`] (already-decoded contact reports and frame markers)
//! - Outbound: [`SignalBatch`] (one atomic group of named signal updates per frame)

mod batch;
mod blueprint;
mod contact;
mod error;
mod point;
mod signal;
mod sink;
mod tracker_config;

pub use batch::*;
pub use blueprint::*;
pub use contact::*;
pub use error::*;
pub use point::Point2;
pub use signal::*;
pub use sink::*;
pub use tracker_config::*;
