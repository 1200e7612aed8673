//! Per-frame aggregate gesture quantities.
//!
//! Computed from a live-slot snapshot: centroid, mean translation,
//! bounding-box growth and mean signed rotation about the centroid.
//! Plain floating point throughout; NaN inputs propagate.

use std::f32::consts::{PI, TAU};

use contracts::Point2;

use crate::Contact;

/// Centroid-relative vectors shorter than this carry no usable angle and
/// read as angle 0.
pub const DEGENERATE_RADIUS: f32 = 1e-6;

/// Aggregate result for one frame. Derived, never stored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AggregateFrame {
    /// Live contacts
    pub count: usize,
    /// Mean current position
    pub centroid: Point2,
    /// Mean of current − previous
    pub translation: Point2,
    /// Bounding-box diagonal, current minus previous
    pub growth: f32,
    /// Mean signed angular change about the centroid, radians
    pub rotation: f32,
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Point2,
    pub max: Point2,
}

impl BoundingBox {
    /// Smallest box holding every point; `None` for an empty input
    pub fn enclosing<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = Point2>,
    {
        let mut points = points.into_iter();
        let first = points.next()?;
        Some(points.fold(
            Self {
                min: first,
                max: first,
            },
            |bbox, p| Self {
                min: Point2::new(bbox.min.x.min(p.x), bbox.min.y.min(p.y)),
                max: Point2::new(bbox.max.x.max(p.x), bbox.max.y.max(p.y)),
            },
        ))
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    /// sqrt(width² + height²)
    pub fn diagonal(&self) -> f32 {
        self.width().hypot(self.height())
    }
}

/// Wrap an angle difference into (−π, π] with a single ±2π correction.
///
/// Inputs are differences of two `atan2` results, so they lie in [−2π, 2π]
/// and one correction is enough.
#[inline]
pub fn wrap_angle(angle: f32) -> f32 {
    if angle > PI {
        angle - TAU
    } else if angle <= -PI {
        angle + TAU
    } else {
        angle
    }
}

/// Signed angle swept by one contact about `centroid`.
///
/// A centroid-relative vector shorter than [`DEGENERATE_RADIUS`] has angle 0,
/// so a contact landing on (or leaving) the centroid still contributes the
/// angle of its other endpoint.
pub fn angular_delta(previous: Point2, current: Point2, centroid: Point2) -> f32 {
    wrap_angle(relative_angle(current - centroid) - relative_angle(previous - centroid))
}

#[inline]
fn relative_angle(v: Point2) -> f32 {
    if v.length() < DEGENERATE_RADIUS {
        0.0
    } else {
        v.angle()
    }
}

/// Run the aggregate pass over a live-slot snapshot.
///
/// Returns `None` when there are no contacts; nothing but the count is
/// published in that case.
pub fn compute_frame<'a, I>(contacts: I) -> Option<AggregateFrame>
where
    I: IntoIterator<Item = &'a Contact>,
    I::IntoIter: Clone,
{
    let contacts = contacts.into_iter();

    let mut count = 0usize;
    let mut position_sum = Point2::ZERO;
    let mut delta_sum = Point2::ZERO;
    for contact in contacts.clone() {
        count += 1;
        position_sum += contact.current;
        delta_sum += contact.delta();
    }
    if count == 0 {
        return None;
    }

    let n = count as f32;
    let centroid = position_sum / n;
    let translation = delta_sum / n;

    let current_box = BoundingBox::enclosing(contacts.clone().map(|c| c.current));
    let previous_box = BoundingBox::enclosing(contacts.clone().map(|c| c.previous));
    let growth = match (current_box, previous_box) {
        (Some(current), Some(previous)) => current.diagonal() - previous.diagonal(),
        _ => 0.0,
    };

    // A lone contact is its own centroid; its rotation is 0 by convention
    let rotation = if count == 1 {
        0.0
    } else {
        contacts
            .map(|c| angular_delta(c.previous, c.current, centroid))
            .sum::<f32>()
            / n
    };

    Some(AggregateFrame {
        count,
        centroid,
        translation,
        growth,
        rotation,
    })
}
