//! JSON-lines replay of recorded touch event streams.
//!
//! One `TouchEvent` per line; blank lines and `#` comments are skipped.
//! Frames are paced by their `begin_frame` timetags divided by `speed`.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use contracts::TouchEvent;
use tracing::{debug, info, warn};

use crate::error::{IngestionError, Result};
use crate::source::{EventSender, EventSource};

/// Parse a recording
///
/// # Errors
/// Unreadable file, or the first line that is not a valid event.
pub fn load_events(path: &Path) -> Result<Vec<TouchEvent>> {
    let text = std::fs::read_to_string(path).map_err(|source| IngestionError::ReplayOpen {
        path: path.to_path_buf(),
        source,
    })?;
    parse_events(path, &text)
}

fn parse_events(path: &Path, text: &str) -> Result<Vec<TouchEvent>> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        })
        .map(|(index, line)| {
            serde_json::from_str(line.trim()).map_err(|e| IngestionError::ReplayParse {
                path: path.to_path_buf(),
                line: index + 1,
                message: e.to_string(),
            })
        })
        .collect()
}

/// Wait before the frame stamped `next`, given the previous frame's timetag
pub fn frame_delay(previous: Option<f64>, next: f64, speed: f64) -> Duration {
    let Some(previous) = previous else {
        return Duration::ZERO;
    };
    let delta = (next - previous) / speed;
    if delta.is_finite() && delta > 0.0 {
        Duration::from_secs_f64(delta)
    } else {
        Duration::ZERO
    }
}

/// Recorded stream source
pub struct ReplaySource {
    name: String,
    path: PathBuf,
    events: Arc<Vec<TouchEvent>>,
    speed: f64,
    loop_playback: bool,
    running: Arc<AtomicBool>,
}

impl ReplaySource {
    /// Load a recording
    ///
    /// # Errors
    /// See [`load_events`].
    pub fn open(path: &Path, speed: f64, loop_playback: bool) -> Result<Self> {
        let events = load_events(path)?;
        info!(path = %path.display(), events = events.len(), "recording loaded");
        Ok(Self::from_events(path, events, speed, loop_playback))
    }

    /// Replay an in-memory event list
    pub fn from_events(
        path: &Path,
        events: Vec<TouchEvent>,
        speed: f64,
        loop_playback: bool,
    ) -> Self {
        Self {
            name: format!("replay:{}", path.display()),
            path: path.to_path_buf(),
            events: Arc::new(events),
            speed,
            loop_playback,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of recorded events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl EventSource for ReplaySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn start(&self, sender: EventSender) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }

        let events = self.events.clone();
        let running = self.running.clone();
        let speed = self.speed;
        let loop_playback = self.loop_playback;
        let name = self.name.clone();

        tokio::spawn(async move {
            debug!(source = %name, speed, loop_playback, "replay started");
            let mut pass = 0u64;

            'replay: loop {
                pass += 1;
                let mut previous = None;
                for event in events.iter() {
                    if !running.load(Ordering::Relaxed) {
                        break 'replay;
                    }
                    if let TouchEvent::BeginFrame {
                        timetag: Some(timetag),
                    } = event
                    {
                        let delay = frame_delay(previous, *timetag, speed);
                        if !delay.is_zero() {
                            tokio::time::sleep(delay).await;
                        }
                        previous = Some(*timetag);
                    }
                    if let Err(err) = sender.send(event.clone()).await {
                        warn!(source = %name, error = %err, "replay aborted");
                        break 'replay;
                    }
                }

                if !loop_playback || events.is_empty() {
                    break;
                }
                debug!(source = %name, pass, "recording finished, looping");
            }

            running.store(false, Ordering::SeqCst);
            debug!(source = %name, passes = pass, "replay stopped");
        });
    }

    fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }
}
