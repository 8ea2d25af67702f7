//! Procedural height field generation

pub mod noise_field;
pub mod curve;
pub mod falloff;
pub mod generator;

pub use noise_field::{NoiseField, NoiseSettings, NormalizeMode};
pub use curve::HeightCurve;
pub use falloff::{falloff_map, FalloffSettings};
pub use generator::{generate_height_map, HeightMap, HeightMapGenerator, HeightMapSettings};
