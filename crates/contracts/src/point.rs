//! Point2 - 2D position in the source's normalized coordinate space

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Div, Sub};

/// Plain two-field point.
///
/// Coordinates are whatever the upstream decoder produced, typically in `[0, 1]`.
/// No range or finiteness checks are performed here.
///
/// # Examples
/// ```
/// use contracts::Point2;
///
/// let a = Point2::new(0.3, 0.2);
/// let b = Point2::new(0.1, 0.2);
/// assert_eq!((a - b).to_array(), [0.3 - 0.1, 0.0]);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f32,
    pub y: f32,
}

impl Point2 {
    /// Origin
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    #[inline]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Array form, as expected by vector-valued signals.
    #[inline]
    pub fn to_array(self) -> [f32; 2] {
        [self.x, self.y]
    }

    /// Euclidean length
    #[inline]
    pub fn length(self) -> f32 {
        self.x.hypot(self.y)
    }

    /// Angle of the vector from the origin, radians in `[-π, π]`
    #[inline]
    pub fn angle(self) -> f32 {
        self.y.atan2(self.x)
    }

    /// True when both coordinates are finite
    #[inline]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<[f32; 2]> for Point2 {
    #[inline]
    fn from([x, y]: [f32; 2]) -> Self {
        Self { x, y }
    }
}

impl From<(f32, f32)> for Point2 {
    #[inline]
    fn from((x, y): (f32, f32)) -> Self {
        Self { x, y }
    }
}

impl Add for Point2 {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Point2 {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Point2 {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Div<f32> for Point2 {
    type Output = Self;

    #[inline]
    fn div(self, divisor: f32) -> Self {
        Self::new(self.x / divisor, self.y / divisor)
    }
}

impl fmt::Display for Point2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:.4}, {:.4}]", self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arithmetic() {
        let mut p = Point2::new(0.1, 0.2);
        p += Point2::new(0.1, 0.2);
        assert_eq!(p, Point2::new(0.2, 0.4));
        assert_eq!(p / 2.0, Point2::new(0.1, 0.2));
    }

    #[test]
    fn test_angle_of_zero_vector_is_zero() {
        assert_eq!(Point2::ZERO.angle(), 0.0);
    }

    #[test]
    fn test_serde_shape() {
        let json = serde_json::to_string(&Point2::new(0.5, 0.25)).unwrap();
        assert_eq!(json, r#"{"x":0.5,"y":0.25}"#);
    }

    #[test]
    fn test_non_finite_detection() {
        assert!(Point2::new(0.5, 0.5).is_finite());
        assert!(!Point2::new(f32::NAN, 0.5).is_finite());
        assert!(!Point2::new(0.5, f32::INFINITY).is_finite());
    }
}
