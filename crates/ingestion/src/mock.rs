//! Synthetic gesture source
//!
//! Produces well-formed frames (begin, alive, set per contact, end) for a
//! handful of canonical gestures around the surface centre. Used for demos
//! and tests without a recording.

use std::f32::consts::{FRAC_PI_2, TAU};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use contracts::{GestureKind, MockGestureConfig, Point2, SessionId, TouchEvent};
use tracing::{debug, trace};

use crate::source::{EventSender, EventSource};

const CENTRE: Point2 = Point2::new(0.5, 0.5);

/// Mock gesture source
pub struct MockGestureSource {
    name: String,
    config: MockGestureConfig,
    running: Arc<AtomicBool>,
}

impl MockGestureSource {
    pub fn new(config: MockGestureConfig) -> Self {
        Self {
            name: format!("mock:{:?}", config.gesture).to_lowercase(),
            config,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn pinch(contacts: usize, frame_rate_hz: f64) -> Self {
        Self::new(MockGestureConfig {
            gesture: GestureKind::Pinch,
            contacts,
            frame_rate_hz,
            ..Default::default()
        })
    }

    pub fn rotate(contacts: usize, frame_rate_hz: f64) -> Self {
        Self::new(MockGestureConfig {
            gesture: GestureKind::Rotate,
            contacts,
            frame_rate_hz,
            ..Default::default()
        })
    }

    pub fn config(&self) -> &MockGestureConfig {
        &self.config
    }
}

/// Events of frame number `index` (0-based, across cycles)
///
/// Each gesture cycle lasts `config.frames` frames and uses fresh session
/// ids, so the first frame of a cycle releases the previous cycle's contacts.
pub fn frame_events(config: &MockGestureConfig, index: u64) -> Vec<TouchEvent> {
    let frames = u64::from(config.frames.max(2));
    let cycle = index / frames;
    let step = index % frames;
    let t = step as f32 / (frames - 1) as f32;
    let timetag = index as f64 / config.frame_rate_hz;

    let contacts = config.contacts.max(1);
    let lifted = config.gesture == GestureKind::Tap && step >= frames / 2;
    let ids: Vec<SessionId> = if lifted {
        Vec::new()
    } else {
        let base = (cycle as SessionId).wrapping_mul(contacts as SessionId);
        (0..contacts as SessionId).map(|i| base + i + 1).collect()
    };

    let mut events = Vec::with_capacity(ids.len() + 3);
    events.push(TouchEvent::begin(timetag));
    events.push(TouchEvent::alive_touches(ids.clone()));
    for (i, id) in ids.iter().enumerate() {
        let position = contact_position(config.gesture, i, contacts, t);
        events.push(TouchEvent::set_touch(*id, position.x, position.y));
    }
    events.push(TouchEvent::EndFrame);
    events
}

/// Position of contact `i` of `n` at gesture progress `t` in [0, 1]
fn contact_position(gesture: GestureKind, i: usize, n: usize, t: f32) -> Point2 {
    let phase = TAU * i as f32 / n as f32;
    let on_circle = |centre: Point2, radius: f32, angle: f32| {
        centre + Point2::new(radius * angle.cos(), radius * angle.sin())
    };

    match gesture {
        GestureKind::Pinch => on_circle(CENTRE, 0.05 + 0.2 * t, phase),
        GestureKind::Rotate => on_circle(CENTRE, 0.2, phase + FRAC_PI_2 * t),
        GestureKind::Drag => {
            let centre = Point2::new(0.3 + 0.4 * t, 0.5);
            on_circle(centre, 0.1, phase)
        }
        GestureKind::Tap => on_circle(CENTRE, 0.1, phase),
    }
}

impl EventSource for MockGestureSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn start(&self, sender: EventSender) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }

        let config = self.config.clone();
        let running = self.running.clone();
        let name = self.name.clone();

        tokio::spawn(async move {
            let interval = Duration::from_secs_f64(1.0 / config.frame_rate_hz);
            let mut index: u64 = 0;

            debug!(
                source = %name,
                gesture = ?config.gesture,
                contacts = config.contacts,
                frame_rate_hz = config.frame_rate_hz,
                "mock gesture source started"
            );

            'frames: while running.load(Ordering::Relaxed) {
                for event in frame_events(&config, index) {
                    if sender.send(event).await.is_err() {
                        debug!(source = %name, "mock gesture channel closed");
                        break 'frames;
                    }
                }
                trace!(source = %name, frame = index, "mock frame sent");
                index += 1;

                tokio::time::sleep(interval).await;
            }

            running.store(false, Ordering::SeqCst);
            debug!(source = %name, frames = index, "mock gesture source stopped");
        });
    }

    fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(gesture: GestureKind) -> MockGestureConfig {
        MockGestureConfig {
            gesture,
            contacts: 2,
            frame_rate_hz: 100.0,
            frames: 10,
        }
    }

    fn positions(events: &[TouchEvent]) -> Vec<Point2> {
        events
            .iter()
            .filter_map(|event| match event {
                TouchEvent::Set(record) => Some(record.position()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_frames_are_well_formed() {
        let events = frame_events(&config(GestureKind::Drag), 3);
        assert!(matches!(events.first(), Some(TouchEvent::BeginFrame { .. })));
        assert!(matches!(events[1], TouchEvent::Alive { .. }));
        assert_eq!(events.last(), Some(&TouchEvent::EndFrame));
        assert_eq!(positions(&events).len(), 2);
    }

    #[test]
    fn test_pinch_spreads_contacts() {
        let config = config(GestureKind::Pinch);
        let spread = |index| {
            let p = positions(&frame_events(&config, index));
            (p[0] - p[1]).length()
        };
        assert!(spread(9) > spread(0));
        assert!((spread(0) - 0.1).abs() < 1e-5);
    }

    #[test]
    fn test_rotate_keeps_radius_and_ids() {
        let config = config(GestureKind::Rotate);
        let first = frame_events(&config, 0);
        let last = frame_events(&config, 9);
        assert_eq!(first[1], last[1]);
        for p in positions(&last) {
            assert!(((p - CENTRE).length() - 0.2).abs() < 1e-5);
        }
    }

    #[test]
    fn test_next_cycle_uses_fresh_ids() {
        let config = config(GestureKind::Drag);
        assert_eq!(frame_events(&config, 0)[1], TouchEvent::alive_touches(vec![1, 2]));
        assert_eq!(frame_events(&config, 10)[1], TouchEvent::alive_touches(vec![3, 4]));
    }

    #[test]
    fn test_tap_lifts_for_second_half() {
        let config = config(GestureKind::Tap);
        assert_eq!(positions(&frame_events(&config, 4)).len(), 2);
        let lifted = frame_events(&config, 5);
        assert_eq!(lifted[1], TouchEvent::alive_touches(Vec::new()));
        assert!(positions(&lifted).is_empty());
    }

    #[test]
    fn test_timetags_follow_frame_rate() {
        let events = frame_events(&config(GestureKind::Pinch), 25);
        assert_eq!(events[0], TouchEvent::begin(0.25));
    }
}
