//! Tracker configuration contracts that can be shared across crates.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Default number of slots per contact table
pub const DEFAULT_SLOT_CAPACITY: usize = 10;

/// Hard ceiling on slots per contact table
pub const MAX_SLOT_CAPACITY: usize = 64;

/// Frame processor configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct TrackerConfig {
    /// Touch slot table capacity
    #[serde(default = "default_capacity")]
    #[validate(range(min = 1, max = 64))]
    pub touch_capacity: usize,

    /// Object slot table capacity
    #[serde(default = "default_capacity")]
    #[validate(range(min = 1, max = 64))]
    pub object_capacity: usize,

    /// Track the object contact variant
    #[serde(default = "default_track_objects")]
    pub track_objects: bool,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            touch_capacity: DEFAULT_SLOT_CAPACITY,
            object_capacity: DEFAULT_SLOT_CAPACITY,
            track_objects: true,
        }
    }
}

fn default_capacity() -> usize {
    DEFAULT_SLOT_CAPACITY
}

fn default_track_objects() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_bounds() {
        assert!(TrackerConfig::default().validate().is_ok());

        let config = TrackerConfig {
            touch_capacity: MAX_SLOT_CAPACITY,
            object_capacity: 1,
            track_objects: false,
        };
        assert!(config.validate().is_ok());

        let config = TrackerConfig {
            touch_capacity: MAX_SLOT_CAPACITY + 1,
            ..TrackerConfig::default()
        };
        assert!(config.validate().is_err());

        let config = TrackerConfig {
            object_capacity: 0,
            ..TrackerConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
