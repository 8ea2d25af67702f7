//! Radial edge falloff for island-like or bounded terrain

use serde::{Deserialize, Serialize};

/// Shape of the falloff curve `t^a / (t^a + (b - b·t)^a)`
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FalloffSettings {
    /// Steepness of the transition
    pub a: f32,
    /// Position of the transition (larger pushes it towards the edge)
    pub b: f32,
}

impl Default for FalloffSettings {
    fn default() -> Self {
        Self { a: 3.0, b: 2.2 }
    }
}

impl FalloffSettings {
    /// Falloff for a 0-1 distance from the center (0 = center, 1 = edge)
    pub fn evaluate(&self, t: f32) -> f32 {
        let ta = t.powf(self.a);
        let denom = ta + (self.b - self.b * t).powf(self.a);
        if denom == 0.0 {
            return 0.0;
        }
        ta / denom
    }
}

/// Falloff map for a `width × height` grid (row-major, one row per z).
/// Depends only on the grid position, never on the chunk.
pub fn falloff_map(width: usize, height: usize, settings: &FalloffSettings) -> Vec<f32> {
    let axis = |i: usize, n: usize| {
        if n <= 1 {
            0.0
        } else {
            (i as f32 / (n - 1) as f32 * 2.0 - 1.0).abs()
        }
    };

    let mut map = Vec::with_capacity(width * height);
    for z in 0..height {
        for x in 0..width {
            let t = axis(x, width).max(axis(z, height));
            map.push(settings.evaluate(t));
        }
    }
    map
}
