//! Terrastream - streaming procedural heightfield terrain
//!
//! Generates noise height maps per chunk on worker threads, builds LOD
//! meshes from them, scatters objects over the surface and streams all of it
//! around a moving viewer.

pub mod config;
pub mod core;
pub mod math;
pub mod mesh;
pub mod placement;
pub mod preview;
pub mod render;
pub mod streaming;
pub mod terrain;

pub use config::TerrainConfig;
pub use streaming::{ChunkEvent, StreamingManager};
