//! Axis-aligned rectangle on the XZ ground plane

use crate::core::types::Vec2;

/// Ground-plane footprint of a chunk (x maps to world X, y to world Z)
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    /// Create from min and max corners
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Create from center and full side lengths
    pub fn from_center_size(center: Vec2, size: Vec2) -> Self {
        let half = size * 0.5;
        Self { min: center - half, max: center + half }
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Squared distance from a point to the closest point of the rectangle.
    /// Zero when the point is inside.
    pub fn sqr_distance(&self, point: Vec2) -> f32 {
        let closest = point.clamp(self.min, self.max);
        (point - closest).length_squared()
    }

    /// Distance from a point to the closest point of the rectangle
    pub fn distance(&self, point: Vec2) -> f32 {
        self.sqr_distance(point).sqrt()
    }
}
