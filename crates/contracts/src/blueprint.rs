//! GestureBlueprint - Config Loader output
//!
//! Describes a complete run: tracker sizing, event input and output routing.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use validator::Validate;

use crate::TrackerConfig;

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete run configuration blueprint
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct GestureBlueprint {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Slot table sizing
    #[serde(default)]
    #[validate(nested)]
    pub tracker: TrackerConfig,

    /// Event input
    #[validate(nested)]
    pub input: InputConfig,

    /// Output routing configuration
    #[serde(default)]
    #[validate(nested)]
    pub sinks: Vec<SinkConfig>,
}

/// Where touch events come from
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct InputConfig {
    pub source: InputSource,

    /// JSON-lines event recording (replay source)
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Replay speed multiplier, must be > 0
    #[serde(default = "default_speed")]
    #[validate(range(exclusive_min = 0.0))]
    pub speed: f64,

    /// Restart the recording when it ends
    #[serde(default)]
    pub loop_playback: bool,

    /// Treatment of non-finite coordinates at the boundary
    #[serde(default)]
    pub guard: InputGuard,

    /// Synthetic gesture parameters (mock source)
    #[serde(default)]
    #[validate(nested)]
    pub mock: Option<MockGestureConfig>,

    /// Ingestion channel capacity
    #[serde(default = "default_channel_capacity")]
    #[validate(range(min = 1))]
    pub channel_capacity: usize,
}

fn default_speed() -> f64 {
    1.0
}

fn default_channel_capacity() -> usize {
    1024
}

/// Input source type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputSource {
    /// Recorded JSON-lines stream
    Replay,
    /// Synthetic gesture generator
    Mock,
}

/// Boundary policy for non-finite contact coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputGuard {
    /// Pass everything through; NaN propagates into the aggregates
    #[default]
    Permissive,
    /// Drop records carrying NaN or infinite values
    RejectNonFinite,
}

/// Synthetic gesture parameters
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MockGestureConfig {
    #[serde(default)]
    pub gesture: GestureKind,

    /// Number of simultaneous touches
    #[serde(default = "default_mock_contacts")]
    #[validate(range(min = 1))]
    pub contacts: usize,

    /// Frame rate (Hz), must be > 0
    #[serde(default = "default_frame_rate")]
    #[validate(range(exclusive_min = 0.0))]
    pub frame_rate_hz: f64,

    /// Frames per gesture cycle
    #[serde(default = "default_frames")]
    #[validate(range(min = 2))]
    pub frames: u32,
}

impl Default for MockGestureConfig {
    fn default() -> Self {
        Self {
            gesture: GestureKind::default(),
            contacts: default_mock_contacts(),
            frame_rate_hz: default_frame_rate(),
            frames: default_frames(),
        }
    }
}

fn default_mock_contacts() -> usize {
    2
}

fn default_frame_rate() -> f64 {
    60.0
}

fn default_frames() -> u32 {
    120
}

/// Synthetic gesture shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GestureKind {
    /// Contacts spread apart from the centre
    #[default]
    Pinch,
    /// Contacts orbit the centre
    Rotate,
    /// Contacts move together in a straight line
    Drag,
    /// Contacts appear for a few frames then lift
    Tap,
}

/// Sink output configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SinkConfig {
    /// Sink name
    #[validate(length(min = 1))]
    pub name: String,

    /// Sink type
    pub sink_type: SinkType,

    /// Queue capacity
    #[serde(default = "default_queue_capacity")]
    #[validate(range(min = 1))]
    pub queue_capacity: usize,

    /// Type-specific parameters
    #[serde(default)]
    pub params: HashMap<String, String>,
}

fn default_queue_capacity() -> usize {
    100
}

/// Sink type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkType {
    /// Log output
    Log,
    /// File output
    File,
    /// Network output (UDP)
    Network,
}

impl GestureBlueprint {
    /// Mock parameters, falling back to defaults when the section is absent
    pub fn mock_config(&self) -> MockGestureConfig {
        self.input.mock.clone().unwrap_or_default()
    }
}
