use serde::{Deserialize, Serialize};

use crate::point::Point;

/// An affine placement transform: reflection about X, then rotation, then
/// (implicitly, at the call site) translation to an instance's origin.
///
/// Reflection is applied before rotation; rotation is counter-clockwise in
/// degrees; magnification is a positive scalar. The neutral transform
/// (`reflect_x = false, mag = 1.0, rotation_deg = 0.0`) must never be
/// emitted to a STRANS/MAG/ANGLE record triple.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub reflect_x: bool,
    pub mag: f64,
    pub rotation_deg: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            reflect_x: false,
            mag: 1.0,
            rotation_deg: 0.0,
        }
    }
}

impl Transform {
    pub fn new(reflect_x: bool, mag: f64, rotation_deg: f64) -> Self {
        Self {
            reflect_x,
            mag,
            rotation_deg,
        }
    }

    /// Whether this transform is the GDSII neutral transform (never emitted).
    pub fn is_neutral(&self) -> bool {
        !self.reflect_x && self.mag == 1.0 && self.rotation_deg == 0.0
    }

    /// Applies reflection, magnification, and rotation (in that order) to a point.
    /// Does not apply the instance's translation offset.
    pub fn apply(&self, point: &Point) -> Point {
        let mut x = point.x;
        let mut y = point.y;

        if self.reflect_x {
            y = -y;
        }

        x *= self.mag;
        y *= self.mag;

        let rad = self.rotation_deg.to_radians();
        let cos_r = rad.cos();
        let sin_r = rad.sin();
        Point::new(x * cos_r - y * sin_r, x * sin_r + y * cos_r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neutral_transform_is_default() {
        assert!(Transform::default().is_neutral());
    }

    #[test]
    fn test_reflect_then_rotate() {
        // Reflect about X, then rotate 90 deg CCW.
        let t = Transform::new(true, 1.0, 90.0);
        let p = Point::new(1.0, 0.0);
        let result = t.apply(&p);
        // Reflect: (1, 0) -> (1, 0) (y=0 unaffected); rotate 90: (1,0) -> (0,1)
        assert!((result.x - 0.0).abs() < 1e-9);
        assert!((result.y - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_magnification() {
        let t = Transform::new(false, 2.0, 0.0);
        let p = Point::new(3.0, 4.0);
        let result = t.apply(&p);
        assert!((result.x - 6.0).abs() < 1e-9);
        assert!((result.y - 8.0).abs() < 1e-9);
    }
}
