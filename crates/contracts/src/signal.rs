//! Signal catalogue - outbound boundary
//!
//! Every value leaving the processor is addressed by a [`Signal`] name and,
//! for per-contact signals, an instance id equal to the contact's session id.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{ContactKind, Point2, SessionId};

/// Named output signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Signal {
    #[serde(rename = "touch.count")]
    TouchCount,
    #[serde(rename = "touch.position")]
    TouchPosition,
    #[serde(rename = "touch.aggregate.centroid")]
    TouchCentroid,
    #[serde(rename = "touch.aggregate.translation")]
    TouchTranslation,
    #[serde(rename = "touch.aggregate.growth")]
    TouchGrowth,
    #[serde(rename = "touch.aggregate.rotation")]
    TouchRotation,
    #[serde(rename = "object.count")]
    ObjectCount,
    #[serde(rename = "object.position")]
    ObjectPosition,
    #[serde(rename = "object.type")]
    ObjectType,
    #[serde(rename = "object.orientation")]
    ObjectOrientation,
}

impl Signal {
    /// Every signal, in declaration order
    pub const ALL: [Signal; 10] = [
        Signal::TouchCount,
        Signal::TouchPosition,
        Signal::TouchCentroid,
        Signal::TouchTranslation,
        Signal::TouchGrowth,
        Signal::TouchRotation,
        Signal::ObjectCount,
        Signal::ObjectPosition,
        Signal::ObjectType,
        Signal::ObjectOrientation,
    ];

    /// Canonical dotted name
    pub fn name(&self) -> &'static str {
        match self {
            Signal::TouchCount => "touch.count",
            Signal::TouchPosition => "touch.position",
            Signal::TouchCentroid => "touch.aggregate.centroid",
            Signal::TouchTranslation => "touch.aggregate.translation",
            Signal::TouchGrowth => "touch.aggregate.growth",
            Signal::TouchRotation => "touch.aggregate.rotation",
            Signal::ObjectCount => "object.count",
            Signal::ObjectPosition => "object.position",
            Signal::ObjectType => "object.type",
            Signal::ObjectOrientation => "object.orientation",
        }
    }

    /// Contact family the signal reports on
    pub fn kind(&self) -> ContactKind {
        match self {
            Signal::TouchCount
            | Signal::TouchPosition
            | Signal::TouchCentroid
            | Signal::TouchTranslation
            | Signal::TouchGrowth
            | Signal::TouchRotation => ContactKind::Touch,
            Signal::ObjectCount
            | Signal::ObjectPosition
            | Signal::ObjectType
            | Signal::ObjectOrientation => ContactKind::Object,
        }
    }

    /// Signals carrying one instance per live contact of `kind`
    pub fn per_instance(kind: ContactKind) -> &'static [Signal] {
        match kind {
            ContactKind::Touch => &[Signal::TouchPosition],
            ContactKind::Object => &[
                Signal::ObjectPosition,
                Signal::ObjectType,
                Signal::ObjectOrientation,
            ],
        }
    }

    /// Count signal for `kind`
    pub fn count_for(kind: ContactKind) -> Signal {
        match kind {
            ContactKind::Touch => Signal::TouchCount,
            ContactKind::Object => Signal::ObjectCount,
        }
    }

    /// Declaration of this signal; `capacity` bounds the count range and
    /// the number of instances.
    pub fn spec(&self, capacity: usize) -> SignalSpec {
        let unit_range = Some((0.0, 1.0));
        let signed_unit_range = Some((-1.0, 1.0));
        let angle_range = Some((-std::f32::consts::PI, std::f32::consts::PI));
        let count_range = Some((0.0, capacity as f32));

        let (length, value_type, unit, range) = match self {
            Signal::TouchCount | Signal::ObjectCount => (1, ValueType::Int, None, count_range),
            Signal::TouchPosition | Signal::TouchCentroid => {
                (2, ValueType::Float, Some("normalized"), unit_range)
            }
            Signal::ObjectPosition => (2, ValueType::Float, None, unit_range),
            Signal::TouchTranslation => (2, ValueType::Float, Some("normalized"), signed_unit_range),
            Signal::TouchGrowth => (1, ValueType::Float, Some("normalized"), signed_unit_range),
            Signal::TouchRotation | Signal::ObjectOrientation => {
                (1, ValueType::Float, Some("radians"), angle_range)
            }
            Signal::ObjectType => (1, ValueType::Int, None, None),
        };

        let instances = if Signal::per_instance(self.kind()).contains(self) {
            capacity
        } else {
            1
        };

        SignalSpec {
            signal: *self,
            length,
            value_type,
            unit,
            range,
            instances,
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Scalar element type of a signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    Int,
    Float,
}

/// Declared shape of one output signal
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SignalSpec {
    pub signal: Signal,
    /// Vector length (1 for scalars)
    pub length: usize,
    pub value_type: ValueType,
    pub unit: Option<&'static str>,
    /// Inclusive `(min, max)` applied to every element
    pub range: Option<(f32, f32)>,
    /// Number of instances the sink should expect
    pub instances: usize,
}

/// Catalogue of every signal for the given capacities
pub fn signal_catalogue(touch_capacity: usize, object_capacity: usize) -> Vec<SignalSpec> {
    Signal::ALL
        .iter()
        .map(|signal| match signal.kind() {
            ContactKind::Touch => signal.spec(touch_capacity),
            ContactKind::Object => signal.spec(object_capacity),
        })
        .collect()
}

/// Signal payload
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SignalValue {
    Int(i32),
    Float(f32),
    Vec2([f32; 2]),
}

impl SignalValue {
    /// Scalar reading; integers widen, vectors have none
    pub fn as_f32(&self) -> Option<f32> {
        match *self {
            SignalValue::Int(v) => Some(v as f32),
            SignalValue::Float(v) => Some(v),
            SignalValue::Vec2(_) => None,
        }
    }

    pub fn as_point(&self) -> Option<Point2> {
        match *self {
            SignalValue::Vec2(v) => Some(Point2::from(v)),
            _ => None,
        }
    }
}

impl fmt::Display for SignalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalValue::Int(v) => write!(f, "{v}"),
            SignalValue::Float(v) => write!(f, "{v:.4}"),
            SignalValue::Vec2([x, y]) => write!(f, "[{x:.4}, {y:.4}]"),
        }
    }
}

/// One queued change to a signal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum SignalUpdate {
    /// New value; `instance` is `None` for single-instance signals
    Publish {
        signal: Signal,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        instance: Option<SessionId>,
        value: SignalValue,
    },
    /// The instance no longer exists
    Release { signal: Signal, instance: SessionId },
}

impl SignalUpdate {
    pub fn signal(&self) -> Signal {
        match self {
            SignalUpdate::Publish { signal, .. } | SignalUpdate::Release { signal, .. } => *signal,
        }
    }

    pub fn is_release(&self) -> bool {
        matches!(self, SignalUpdate::Release { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_match_serde() {
        for signal in Signal::ALL {
            let json = serde_json::to_string(&signal).unwrap();
            assert_eq!(json, format!("\"{}\"", signal.name()));
        }
    }

    #[test]
    fn test_spec_shapes() {
        let count = Signal::TouchCount.spec(10);
        assert_eq!(count.value_type, ValueType::Int);
        assert_eq!(count.range, Some((0.0, 10.0)));
        assert_eq!(count.instances, 1);

        let position = Signal::TouchPosition.spec(10);
        assert_eq!(position.length, 2);
        assert_eq!(position.instances, 10);
        assert_eq!(position.unit, Some("normalized"));

        let rotation = Signal::TouchRotation.spec(10);
        assert_eq!(rotation.unit, Some("radians"));

        assert_eq!(Signal::ObjectType.spec(4).range, None);
    }

    #[test]
    fn test_catalogue_uses_per_kind_capacity() {
        let catalogue = signal_catalogue(10, 4);
        assert_eq!(catalogue.len(), Signal::ALL.len());
        let object_count = catalogue
            .iter()
            .find(|spec| spec.signal == Signal::ObjectCount)
            .unwrap();
        assert_eq!(object_count.range, Some((0.0, 4.0)));
    }

    #[test]
    fn test_update_wire_shape() {
        let update = SignalUpdate::Release {
            signal: Signal::TouchPosition,
            instance: 7,
        };
        let json = serde_json::to_string(&update).unwrap();
        assert_eq!(
            json,
            r#"{"op":"release","signal":"touch.position","instance":7}"#
        );
    }
}
