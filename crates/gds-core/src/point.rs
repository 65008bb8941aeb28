use serde::{Deserialize, Serialize};

/// A 2D point in physical layout coordinates, in micrometers.
///
/// Unitless inputs at any public boundary of this crate are treated as
/// micrometers, matching the GDSII scale-arithmetic convention.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn origin() -> Self {
        Self::new(0.0, 0.0)
    }

    pub fn translate(&self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}
