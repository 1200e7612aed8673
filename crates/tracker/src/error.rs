use contracts::SessionId;
use thiserror::Error;

/// Tracker errors
///
/// All variants are recoverable; the frame processor logs them and carries on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrackerError {
    /// A new session id arrived while every slot was occupied
    #[error("slot table full: session {session_id} dropped (capacity {capacity})")]
    CapacityExceeded {
        session_id: SessionId,
        capacity: usize,
    },
}
