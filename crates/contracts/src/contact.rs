//! TouchEvent - inbound boundary
//!
//! Already-decoded contact reports and frame markers, in arrival order.

use serde::{Deserialize, Serialize};

use crate::Point2;

/// Externally assigned, stable identifier of one contact for its whole lifetime.
pub type SessionId = u32;

/// Value shown in diagnostics for a slot that holds no contact.
pub const EMPTY_SLOT_SENTINEL: i64 = -1;

/// Contact family
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactKind {
    /// Finger / cursor
    #[default]
    Touch,
    /// Tagged object with a classification and an orientation
    Object,
}

impl ContactKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContactKind::Touch => "touch",
            ContactKind::Object => "object",
        }
    }
}

/// Extended attributes of the object contact variant
///
/// Each attribute is reported independently; `None` means "not reported".
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectPose {
    /// Integer classification (fiducial id)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_id: Option<i32>,
    /// Orientation, radians
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub angle: Option<f32>,
}

impl ObjectPose {
    /// Pose with both attributes reported
    pub fn new(type_id: i32, angle: f32) -> Self {
        Self {
            type_id: Some(type_id),
            angle: Some(angle),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.type_id.is_none() && self.angle.is_none()
    }

    /// Take every attribute `update` reports, keep the others
    pub fn merge(&mut self, update: ObjectPose) {
        if let Some(type_id) = update.type_id {
            self.type_id = Some(type_id);
        }
        if let Some(angle) = update.angle {
            self.angle = Some(angle);
        }
    }
}

/// One contact's latest reading
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContactRecord {
    #[serde(default)]
    pub kind: ContactKind,
    pub session_id: SessionId,
    pub x: f32,
    pub y: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_id: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub angle: Option<f32>,
}

impl ContactRecord {
    /// Touch reading
    pub fn touch(session_id: SessionId, x: f32, y: f32) -> Self {
        Self {
            kind: ContactKind::Touch,
            session_id,
            x,
            y,
            type_id: None,
            angle: None,
        }
    }

    /// Object reading
    pub fn object(session_id: SessionId, type_id: i32, x: f32, y: f32, angle: f32) -> Self {
        Self {
            kind: ContactKind::Object,
            session_id,
            x,
            y,
            type_id: Some(type_id),
            angle: Some(angle),
        }
    }

    pub fn position(&self) -> Point2 {
        Point2::new(self.x, self.y)
    }

    /// Object attributes carried by this reading, `None` when neither was reported
    pub fn pose(&self) -> Option<ObjectPose> {
        let pose = ObjectPose {
            type_id: self.type_id,
            angle: self.angle,
        };
        (!pose.is_empty()).then_some(pose)
    }

    /// True when every reported float is finite
    pub fn is_finite(&self) -> bool {
        self.position().is_finite() && self.angle.map_or(true, f32::is_finite)
    }
}

/// Inbound event
///
/// A well-formed frame is `BeginFrame`, one `Alive` per kind, zero or more
/// `Set`, then `EndFrame`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TouchEvent {
    /// Frame boundary start (bundle open)
    BeginFrame {
        /// Source timetag in seconds; the processor clock is used when absent
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timetag: Option<f64>,
    },

    /// Complete set of currently alive session ids for one contact kind
    Alive {
        #[serde(default)]
        kind: ContactKind,
        ids: Vec<SessionId>,
    },

    /// One contact's latest reading
    Set(ContactRecord),

    /// Frame boundary end (bundle close)
    EndFrame,
}

impl TouchEvent {
    pub fn begin(timetag: f64) -> Self {
        Self::BeginFrame {
            timetag: Some(timetag),
        }
    }

    pub fn alive_touches(ids: impl Into<Vec<SessionId>>) -> Self {
        Self::Alive {
            kind: ContactKind::Touch,
            ids: ids.into(),
        }
    }

    pub fn alive_objects(ids: impl Into<Vec<SessionId>>) -> Self {
        Self::Alive {
            kind: ContactKind::Object,
            ids: ids.into(),
        }
    }

    pub fn set_touch(session_id: SessionId, x: f32, y: f32) -> Self {
        Self::Set(ContactRecord::touch(session_id, x, y))
    }

    /// Short label for logs
    pub fn label(&self) -> &'static str {
        match self {
            TouchEvent::BeginFrame { .. } => "begin_frame",
            TouchEvent::Alive { .. } => "alive",
            TouchEvent::Set(_) => "set",
            TouchEvent::EndFrame => "end_frame",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_wire_shape() {
        let line = r#"{"event":"set","session_id":3,"x":0.5,"y":0.25}"#;
        let event: TouchEvent = serde_json::from_str(line).unwrap();
        assert_eq!(event, TouchEvent::set_touch(3, 0.5, 0.25));

        let line = r#"{"event":"alive","kind":"object","ids":[1,2]}"#;
        let event: TouchEvent = serde_json::from_str(line).unwrap();
        assert_eq!(event, TouchEvent::alive_objects(vec![1, 2]));

        let event: TouchEvent = serde_json::from_str(r#"{"event":"end_frame"}"#).unwrap();
        assert_eq!(event, TouchEvent::EndFrame);

        let event: TouchEvent = serde_json::from_str(r#"{"event":"begin_frame"}"#).unwrap();
        assert_eq!(event, TouchEvent::BeginFrame { timetag: None });
    }

    #[test]
    fn test_negative_session_id_rejected() {
        let line = r#"{"event":"set","session_id":-1,"x":0.5,"y":0.5}"#;
        assert!(serde_json::from_str::<TouchEvent>(line).is_err());
    }

    #[test]
    fn test_pose_attributes_are_independent() {
        let record = ContactRecord::object(4, 12, 0.1, 0.2, 1.5);
        assert_eq!(record.pose(), Some(ObjectPose::new(12, 1.5)));

        let mut angle_only = record;
        angle_only.type_id = None;
        assert_eq!(
            angle_only.pose(),
            Some(ObjectPose {
                type_id: None,
                angle: Some(1.5)
            })
        );

        assert_eq!(ContactRecord::touch(4, 0.1, 0.2).pose(), None);
    }

    #[test]
    fn test_pose_merge_keeps_unreported_attributes() {
        let mut pose = ObjectPose::new(4, 1.0);
        pose.merge(ObjectPose {
            type_id: None,
            angle: Some(2.0),
        });
        assert_eq!(pose, ObjectPose::new(4, 2.0));

        pose.merge(ObjectPose {
            type_id: Some(9),
            angle: None,
        });
        assert_eq!(pose, ObjectPose::new(9, 2.0));

        pose.merge(ObjectPose::default());
        assert_eq!(pose, ObjectPose::new(9, 2.0));
    }

    #[test]
    fn test_record_finiteness() {
        assert!(ContactRecord::touch(1, 0.5, 0.5).is_finite());
        assert!(!ContactRecord::touch(1, f32::NAN, 0.5).is_finite());
        assert!(!ContactRecord::object(1, 0, 0.5, 0.5, f32::INFINITY).is_finite());
    }
}
