//! Mesh resolution and shading settings

use serde::{Deserialize, Serialize};

/// Number of supported LOD levels
pub const NUM_SUPPORTED_LODS: usize = 5;

/// Sample stride per LOD level. Every supported chunk size is divisible by
/// each stride, so coarser meshes keep the same world extents.
pub const LOD_STRIDES: [usize; NUM_SUPPORTED_LODS] = [1, 2, 4, 6, 8];

/// Chunk sizes in grid cells
pub const SUPPORTED_CHUNK_SIZES: [usize; 9] = [48, 72, 96, 120, 144, 168, 192, 216, 240];

/// Flat shading triples the vertex count, so only the smaller sizes are allowed
pub const NUM_SUPPORTED_FLAT_SHADED_CHUNK_SIZES: usize = 3;

/// Default distance between neighbouring samples in world units
pub const DEFAULT_MESH_SCALE: f32 = 2.5;

/// Stride for a LOD level, clamped to the coarsest supported level
pub fn lod_stride(lod: usize) -> usize {
    LOD_STRIDES[lod.min(NUM_SUPPORTED_LODS - 1)]
}

/// Normal generation mode
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShadingMode {
    /// Shared vertices with averaged normals
    #[default]
    Smooth,
    /// Unshared vertices per triangle for hard edges
    Flat,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshSettings {
    /// World distance between neighbouring samples
    pub mesh_scale: f32,
    pub shading: ShadingMode,
    /// Index into `SUPPORTED_CHUNK_SIZES` for smooth shading
    pub chunk_size_index: usize,
    /// Index into `SUPPORTED_CHUNK_SIZES` for flat shading
    pub flat_shaded_chunk_size_index: usize,
}

impl Default for MeshSettings {
    fn default() -> Self {
        Self {
            mesh_scale: DEFAULT_MESH_SCALE,
            shading: ShadingMode::Smooth,
            chunk_size_index: SUPPORTED_CHUNK_SIZES.len() - 1,
            flat_shaded_chunk_size_index: NUM_SUPPORTED_FLAT_SHADED_CHUNK_SIZES - 1,
        }
    }
}

impl MeshSettings {
    /// Chunk size in grid cells for the active shading mode
    pub fn chunk_size(&self) -> usize {
        let index = match self.shading {
            ShadingMode::Smooth => self.chunk_size_index.min(SUPPORTED_CHUNK_SIZES.len() - 1),
            ShadingMode::Flat => self
                .flat_shaded_chunk_size_index
                .min(NUM_SUPPORTED_FLAT_SHADED_CHUNK_SIZES - 1),
        };
        SUPPORTED_CHUNK_SIZES[index]
    }

    /// Height map samples per side
    pub fn vertices_per_line(&self) -> usize {
        self.chunk_size() + 1
    }

    /// Side length of a chunk in world units
    pub fn mesh_world_size(&self) -> f32 {
        self.chunk_size() as f32 * self.mesh_scale
    }

    /// Correct out-of-range values in place
    pub fn validate(&mut self) -> Vec<String> {
        let mut fixes = Vec::new();
        if !(self.mesh_scale > 0.0) {
            fixes.push(format!("mesh scale {} replaced by {}", self.mesh_scale, DEFAULT_MESH_SCALE));
            self.mesh_scale = DEFAULT_MESH_SCALE;
        }
        if self.chunk_size_index >= SUPPORTED_CHUNK_SIZES.len() {
            fixes.push(format!("chunk size index {} clamped", self.chunk_size_index));
            self.chunk_size_index = SUPPORTED_CHUNK_SIZES.len() - 1;
        }
        if self.flat_shaded_chunk_size_index >= NUM_SUPPORTED_FLAT_SHADED_CHUNK_SIZES {
            fixes.push(format!(
                "flat shaded chunk size index {} clamped",
                self.flat_shaded_chunk_size_index
            ));
            self.flat_shaded_chunk_size_index = NUM_SUPPORTED_FLAT_SHADED_CHUNK_SIZES - 1;
        }
        fixes
    }
}
