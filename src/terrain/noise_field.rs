//! Deterministic fractal gradient noise
//!
//! Sums `octaves` layers of Perlin noise. Each octave samples the field at an
//! independent pseudo-random offset drawn from the seed, so a seed always
//! reproduces the same field while octaves stay decorrelated.

use noise::{NoiseFn, Perlin};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::core::types::Vec2;
use crate::math::inverse_lerp;

/// Smallest noise scale accepted; non-positive scales are replaced by this.
pub const MIN_NOISE_SCALE: f32 = 0.01;

/// Range of the per-octave offsets drawn from the seed.
const OCTAVE_OFFSET_RANGE: i32 = 100_000;

/// How raw fractal sums are mapped into 0-1
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum NormalizeMode {
    /// Rescale each map's observed min/max to 0-1. Neighbouring chunks will
    /// not line up, but every chunk spans the full range.
    Local,
    /// Divide by the largest possible amplitude sum so independently
    /// generated chunks agree on absolute height.
    #[default]
    Global,
}

/// Noise parameters
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseSettings {
    pub normalize_mode: NormalizeMode,
    /// Horizontal scale (larger = smoother)
    pub scale: f32,
    pub octaves: u32,
    /// Amplitude multiplier per octave (0-1)
    pub persistence: f32,
    /// Frequency multiplier per octave (>= 1)
    pub lacunarity: f32,
    pub seed: u64,
    /// Offset added to every sample position
    pub offset: Vec2,
}

impl Default for NoiseSettings {
    fn default() -> Self {
        Self {
            normalize_mode: NormalizeMode::Global,
            scale: 50.0,
            octaves: 6,
            persistence: 0.6,
            lacunarity: 2.0,
            seed: 0,
            offset: Vec2::ZERO,
        }
    }
}

impl NoiseSettings {
    /// Correct out-of-range values in place. Returns a description of every
    /// correction made.
    pub fn validate(&mut self) -> Vec<String> {
        let mut fixes = Vec::new();
        if !(self.scale > 0.0) {
            fixes.push(format!("noise scale {} replaced by {}", self.scale, MIN_NOISE_SCALE));
            self.scale = MIN_NOISE_SCALE;
        }
        if self.octaves < 1 {
            fixes.push("noise octaves raised to 1".to_string());
            self.octaves = 1;
        }
        if self.lacunarity < 1.0 {
            fixes.push(format!("noise lacunarity {} raised to 1", self.lacunarity));
            self.lacunarity = 1.0;
        }
        if !(0.0..=1.0).contains(&self.persistence) {
            let clamped = self.persistence.clamp(0.0, 1.0);
            fixes.push(format!("noise persistence {} clamped to {}", self.persistence, clamped));
            self.persistence = clamped;
        }
        fixes
    }

    /// Copy with every value corrected
    pub fn validated(&self) -> Self {
        let mut settings = self.clone();
        settings.validate();
        settings
    }

    /// Sum of all octave amplitudes: `Σ persistence^i`
    pub fn max_possible_height(&self) -> f32 {
        let mut amplitude = 1.0f32;
        let mut total = 0.0f32;
        for _ in 0..self.octaves {
            total += amplitude;
            amplitude *= self.persistence;
        }
        total
    }
}

/// Single-octave gradient noise remapped to 0-1
pub fn gradient01(perlin: &Perlin, x: f64, y: f64) -> f64 {
    (perlin.get([x, y]) * 0.5 + 0.5).clamp(0.0, 1.0)
}

/// Fractal noise generator with precomputed octave offsets
pub struct NoiseField {
    settings: NoiseSettings,
    perlin: Perlin,
    octave_offsets: Vec<[f64; 2]>,
    max_possible_height: f32,
}

impl NoiseField {
    /// Build the field. Settings are validated first.
    pub fn new(settings: &NoiseSettings) -> Self {
        let settings = settings.validated();
        let mut rng = ChaCha8Rng::seed_from_u64(settings.seed);

        let octave_offsets = (0..settings.octaves)
            .map(|_| {
                let ox = rng.random_range(-OCTAVE_OFFSET_RANGE..OCTAVE_OFFSET_RANGE) as f64;
                let oy = rng.random_range(-OCTAVE_OFFSET_RANGE..OCTAVE_OFFSET_RANGE) as f64;
                [ox + settings.offset.x as f64, oy + settings.offset.y as f64]
            })
            .collect();

        Self {
            perlin: Perlin::new(settings.seed as u32),
            max_possible_height: settings.max_possible_height(),
            octave_offsets,
            settings,
        }
    }

    pub fn settings(&self) -> &NoiseSettings {
        &self.settings
    }

    /// Largest absolute value a raw sample can reach
    pub fn max_possible_height(&self) -> f32 {
        self.max_possible_height
    }

    /// Raw fractal sum at a sample position, in `[-max, max]`
    pub fn sample(&self, x: f64, y: f64) -> f32 {
        let scale = self.settings.scale as f64;
        let persistence = self.settings.persistence as f64;
        let lacunarity = self.settings.lacunarity as f64;

        let mut amplitude = 1.0f64;
        let mut frequency = 1.0f64;
        let mut height = 0.0f64;

        for offset in &self.octave_offsets {
            let sx = (x + offset[0]) / scale * frequency;
            let sy = (y + offset[1]) / scale * frequency;
            let value = gradient01(&self.perlin, sx, sy) * 2.0 - 1.0;
            height += value * amplitude;

            amplitude *= persistence;
            frequency *= lacunarity;
        }

        height as f32
    }

    /// Generate a normalized `width × height` map (row-major, one row per z)
    /// centered on `sample_center`.
    pub fn generate(&self, width: usize, height: usize, sample_center: Vec2) -> Vec<f32> {
        let mut values = vec![0.0f32; width * height];
        if values.is_empty() {
            return values;
        }

        let half_width = (width - 1) as f64 / 2.0;
        let half_height = (height - 1) as f64 / 2.0;
        let cx = sample_center.x as f64;
        let cz = sample_center.y as f64;

        values
            .par_chunks_mut(width)
            .enumerate()
            .for_each(|(z, row)| {
                for (x, value) in row.iter_mut().enumerate() {
                    *value = self.sample(x as f64 - half_width + cx, z as f64 - half_height + cz);
                }
            });

        match self.settings.normalize_mode {
            NormalizeMode::Local => {
                let (min, max) = values
                    .iter()
                    .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
                for v in values.iter_mut() {
                    *v = inverse_lerp(min, max, *v);
                }
            }
            NormalizeMode::Global => {
                let max = self.max_possible_height.max(f32::EPSILON);
                for v in values.iter_mut() {
                    *v = ((*v / max + 1.0) * 0.5).clamp(0.0, 1.0);
                }
            }
        }

        values
    }
}
