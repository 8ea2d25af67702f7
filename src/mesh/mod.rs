//! Terrain chunk meshes at multiple levels of detail

pub mod builder;
pub mod data;
pub mod settings;

pub use builder::{build_mesh, sample_indices, MeshBuilder};
pub use data::{MeshData, SteepnessMap};
pub use settings::{lod_stride, MeshSettings, ShadingMode, LOD_STRIDES, NUM_SUPPORTED_LODS};
