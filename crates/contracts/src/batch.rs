//! SignalBatch - processor output
//!
//! One frame's signal updates, delivered to sinks as a single atomic group.

use serde::{Deserialize, Serialize};

use crate::{Point2, SessionId, Signal, SignalUpdate, SignalValue};

/// Per-frame counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameStats {
    /// Live touch contacts after the frame
    pub touch_count: usize,

    /// Live object contacts after the frame
    pub object_count: usize,

    /// Contacts released by liveness reconciliation
    pub released: u32,

    /// Contact updates dropped because the table was full
    pub dropped_updates: u32,

    /// True when no `BeginFrame` opened this frame
    pub implicit: bool,
}

/// Signal updates of one frame, in emission order
///
/// Sinks must apply `updates` as a unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalBatch {
    /// Frame sequence number (monotonically increasing)
    pub frame_id: u64,

    /// Logical frame time (seconds)
    pub timetag: f64,

    pub updates: Vec<SignalUpdate>,

    pub stats: FrameStats,
}

impl SignalBatch {
    pub fn len(&self) -> usize {
        self.updates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }

    /// Last published value of a single-instance signal
    pub fn value_of(&self, signal: Signal) -> Option<SignalValue> {
        self.value_of_instance(signal, None)
    }

    /// Last published value of `signal` for `instance`
    pub fn value_of_instance(
        &self,
        signal: Signal,
        instance: Option<SessionId>,
    ) -> Option<SignalValue> {
        self.updates.iter().rev().find_map(|update| match update {
            SignalUpdate::Publish {
                signal: s,
                instance: i,
                value,
            } if *s == signal && *i == instance => Some(*value),
            _ => None,
        })
    }

    /// Instances released on `signal`, in emission order
    pub fn releases_of(&self, signal: Signal) -> Vec<SessionId> {
        self.updates
            .iter()
            .filter_map(|update| match update {
                SignalUpdate::Release {
                    signal: s,
                    instance,
                } if *s == signal => Some(*instance),
                _ => None,
            })
            .collect()
    }
}

/// Open frame queue
///
/// Every update issued between opening and [`FrameQueue::send`] shares one
/// timetag and is handed to sinks together.
#[derive(Debug, Clone)]
pub struct FrameQueue {
    frame_id: u64,
    timetag: f64,
    implicit: bool,
    updates: Vec<SignalUpdate>,
}

impl FrameQueue {
    /// Start a queue stamped with one logical timetag
    pub fn start(frame_id: u64, timetag: f64) -> Self {
        Self {
            frame_id,
            timetag,
            implicit: false,
            updates: Vec::new(),
        }
    }

    /// Start a queue for events that arrived outside any frame
    pub fn start_implicit(frame_id: u64, timetag: f64) -> Self {
        Self {
            implicit: true,
            ..Self::start(frame_id, timetag)
        }
    }

    pub fn frame_id(&self) -> u64 {
        self.frame_id
    }

    pub fn timetag(&self) -> f64 {
        self.timetag
    }

    pub fn is_implicit(&self) -> bool {
        self.implicit
    }

    pub fn len(&self) -> usize {
        self.updates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }

    pub fn publish_scalar(&mut self, signal: Signal, instance: Option<SessionId>, value: f32) {
        self.push(signal, instance, SignalValue::Float(value));
    }

    pub fn publish_int(&mut self, signal: Signal, instance: Option<SessionId>, value: i32) {
        self.push(signal, instance, SignalValue::Int(value));
    }

    pub fn publish_vector(&mut self, signal: Signal, instance: Option<SessionId>, value: Point2) {
        self.push(signal, instance, SignalValue::Vec2(value.to_array()));
    }

    pub fn release_instance(&mut self, signal: Signal, instance: SessionId) {
        self.updates.push(SignalUpdate::Release { signal, instance });
    }

    /// Close the queue
    pub fn send(self, stats: FrameStats) -> SignalBatch {
        SignalBatch {
            frame_id: self.frame_id,
            timetag: self.timetag,
            updates: self.updates,
            stats: FrameStats {
                implicit: self.implicit,
                ..stats
            },
        }
    }

    fn push(&mut self, signal: Signal, instance: Option<SessionId>, value: SignalValue) {
        self.updates.push(SignalUpdate::Publish {
            signal,
            instance,
            value,
        });
    }
}
