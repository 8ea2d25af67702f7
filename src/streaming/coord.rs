//! Integer chunk coordinates on the XZ plane

use serde::{Deserialize, Serialize};

use crate::core::types::Vec2;
use crate::math::rect::Rect;

/// Chunk grid coordinate. Chunk `(x, z)` is centered on
/// `(x * size, z * size)` in world space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridCoord {
    pub x: i32,
    pub z: i32,
}

impl GridCoord {
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Chunk containing a world-space XZ position
    pub fn from_world(position: Vec2, chunk_world_size: f32) -> Self {
        Self {
            x: (position.x / chunk_world_size).round() as i32,
            z: (position.y / chunk_world_size).round() as i32,
        }
    }

    /// World-space XZ center
    pub fn world_center(self, chunk_world_size: f32) -> Vec2 {
        Vec2::new(self.x as f32, self.z as f32) * chunk_world_size
    }

    /// World-space XZ footprint
    pub fn bounds(self, chunk_world_size: f32) -> Rect {
        Rect::from_center_size(self.world_center(chunk_world_size), Vec2::splat(chunk_world_size))
    }

    /// Noise sample center for a grid of `vertices_per_line` samples.
    /// Neighbours overlap by one sample so shared edges match.
    pub fn sample_center(self, vertices_per_line: usize) -> Vec2 {
        Vec2::new(self.x as f32, self.z as f32) * vertices_per_line.saturating_sub(1) as f32
    }

    /// Coordinates within `radius` chunks on each axis, row by row
    pub fn window(self, radius: i32) -> impl Iterator<Item = GridCoord> {
        let radius = radius.max(0);
        (-radius..=radius).flat_map(move |dz| {
            (-radius..=radius).map(move |dx| GridCoord::new(self.x + dx, self.z + dz))
        })
    }

    /// Chebyshev distance in chunks
    pub fn chebyshev(self, other: GridCoord) -> i32 {
        (self.x - other.x).abs().max((self.z - other.z).abs())
    }
}

impl std::fmt::Display for GridCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.z)
    }
}
