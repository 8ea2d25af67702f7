//! Noise-based height map generation

use serde::{Deserialize, Serialize};

use super::curve::HeightCurve;
use super::falloff::{falloff_map, FalloffSettings};
use super::noise_field::{NoiseField, NoiseSettings};
use crate::core::types::Vec2;

/// Parameters controlling height map generation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeightMapSettings {
    pub noise: NoiseSettings,
    /// Vertical scale applied after the curve
    pub height_multiplier: f32,
    /// Reshapes normalized noise before the multiplier
    pub height_curve: HeightCurve,
    /// Subtract the radial falloff map from the noise
    pub use_falloff: bool,
    pub falloff: FalloffSettings,
}

impl Default for HeightMapSettings {
    fn default() -> Self {
        Self {
            noise: NoiseSettings::default(),
            height_multiplier: 30.0,
            height_curve: HeightCurve::linear(),
            use_falloff: false,
            falloff: FalloffSettings::default(),
        }
    }
}

impl HeightMapSettings {
    /// Lowest height the curve can produce (material min-height uniform)
    pub fn min_height(&self) -> f32 {
        self.height_multiplier * self.height_curve.evaluate(0.0)
    }

    /// Highest height the curve can produce (material max-height uniform)
    pub fn max_height(&self) -> f32 {
        self.height_multiplier * self.height_curve.evaluate(1.0)
    }

    /// Correct out-of-range values in place
    pub fn validate(&mut self) -> Vec<String> {
        let mut fixes = self.noise.validate();
        if self.height_curve.normalize_keys() {
            fixes.push("height curve keys sorted".to_string());
        }
        fixes
    }
}

/// Grid of elevation samples plus the observed range.
///
/// Stored row-major: sample `(x, z)` lives at `z * width + x`.
#[derive(Clone, Debug, PartialEq)]
pub struct HeightMap {
    width: usize,
    height: usize,
    values: Vec<f32>,
    min_value: f32,
    max_value: f32,
}

impl HeightMap {
    /// Wrap samples and record their min/max.
    ///
    /// # Panics
    /// Panics if `values.len() != width * height`.
    pub fn new(width: usize, height: usize, values: Vec<f32>) -> Self {
        assert_eq!(values.len(), width * height, "height map size mismatch");
        let (min_value, max_value) = if values.is_empty() {
            (0.0, 0.0)
        } else {
            values
                .iter()
                .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)))
        };
        Self { width, height, values, min_value, max_value }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn min_value(&self) -> f32 {
        self.min_value
    }

    pub fn max_value(&self) -> f32 {
        self.max_value
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Sample at grid position (x, z)
    pub fn get(&self, x: usize, z: usize) -> f32 {
        self.values[z * self.width + x]
    }
}

/// Produces height maps from a fixed set of settings
pub struct HeightMapGenerator {
    settings: HeightMapSettings,
    noise: NoiseField,
}

impl HeightMapGenerator {
    /// Create a generator. Noise settings are validated by the noise field.
    pub fn new(settings: HeightMapSettings) -> Self {
        let noise = NoiseField::new(&settings.noise);
        Self { settings, noise }
    }

    pub fn settings(&self) -> &HeightMapSettings {
        &self.settings
    }

    /// Generate a `width × height` map centered on `sample_center`
    /// (in grid units).
    pub fn generate(&self, width: usize, height: usize, sample_center: Vec2) -> HeightMap {
        let mut values = self.noise.generate(width, height, sample_center);

        if self.settings.use_falloff {
            let falloff = falloff_map(width, height, &self.settings.falloff);
            for (v, f) in values.iter_mut().zip(falloff) {
                *v = (*v - f).clamp(0.0, 1.0);
            }
        }

        let multiplier = self.settings.height_multiplier;
        for v in values.iter_mut() {
            *v = self.settings.height_curve.evaluate(*v) * multiplier;
        }

        HeightMap::new(width, height, values)
    }
}

/// One-shot height map generation
pub fn generate_height_map(
    width: usize,
    height: usize,
    settings: &HeightMapSettings,
    sample_center: Vec2,
) -> HeightMap {
    HeightMapGenerator::new(settings.clone()).generate(width, height, sample_center)
}
