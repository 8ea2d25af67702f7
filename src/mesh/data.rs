//! Immutable mesh output consumed by the renderer and the placement engine

use crate::core::types::{Vec2, Vec3};
use crate::math::aabb::Aabb;

use super::settings::ShadingMode;

/// Per-cell slope in degrees, computed once per mesh over the interior
/// cells of the height map. Border cells read their nearest interior cell.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SteepnessMap {
    width: usize,
    height: usize,
    /// `(width - 2) * (height - 2)` interior values
    values: Vec<f32>,
}

impl SteepnessMap {
    /// Slope from central differences. `spacing` is the world distance
    /// between neighbouring samples.
    pub fn compute(width: usize, height: usize, heights: &[f32], spacing: f32) -> Self {
        if width < 3 || height < 3 {
            return Self { width, height, values: Vec::new() };
        }

        let inner_w = width - 2;
        let inner_h = height - 2;
        let inv = 1.0 / (2.0 * spacing.max(f32::EPSILON));
        let mut values = Vec::with_capacity(inner_w * inner_h);

        for z in 1..height - 1 {
            for x in 1..width - 1 {
                let gx = (heights[z * width + x + 1] - heights[z * width + x - 1]) * inv;
                let gz = (heights[(z + 1) * width + x] - heights[(z - 1) * width + x]) * inv;
                values.push((gx * gx + gz * gz).sqrt().atan().to_degrees());
            }
        }

        Self { width, height, values }
    }

    /// Steepness in degrees at grid cell (x, z)
    pub fn at(&self, x: usize, z: usize) -> f32 {
        if self.values.is_empty() {
            return 0.0;
        }
        let ix = x.clamp(1, self.width - 2) - 1;
        let iz = z.clamp(1, self.height - 2) - 1;
        self.values[iz * (self.width - 2) + ix]
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }
}

/// Triangle mesh for one chunk at one LOD.
///
/// Positions are local to the chunk center. `surface_normals` and
/// `sample_x`/`sample_z` describe the sampled grid regardless of shading
/// mode, so placement can walk the lattice even when vertices are unshared.
#[derive(Clone, Debug, Default)]
pub struct MeshData {
    pub vertices: Vec<Vec3>,
    pub triangles: Vec<[u32; 3]>,
    pub uvs: Vec<Vec2>,
    pub normals: Vec<Vec3>,
    pub(crate) lod: usize,
    pub(crate) stride: usize,
    pub(crate) shading: ShadingMode,
    pub(crate) mesh_scale: f32,
    /// Grid indices sampled along x
    pub(crate) sample_x: Vec<usize>,
    /// Grid indices sampled along z
    pub(crate) sample_z: Vec<usize>,
    /// Averaged normal per sampled lattice point, row-major over the samples
    pub(crate) surface_normals: Vec<Vec3>,
    pub(crate) steepness: SteepnessMap,
    pub(crate) bounds: Aabb,
}

impl MeshData {
    pub fn lod(&self) -> usize {
        self.lod
    }

    /// Grid cells between neighbouring vertices
    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn shading(&self) -> ShadingMode {
        self.shading
    }

    /// World distance between neighbouring full-resolution samples
    pub fn mesh_scale(&self) -> f32 {
        self.mesh_scale
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Lattice points per row
    pub fn vertices_per_line(&self) -> usize {
        self.sample_x.len()
    }

    pub fn sample_x(&self) -> &[usize] {
        &self.sample_x
    }

    pub fn sample_z(&self) -> &[usize] {
        &self.sample_z
    }

    /// Normal at lattice point (i, j), counted in samples not grid cells
    pub fn surface_normal(&self, i: usize, j: usize) -> Vec3 {
        self.surface_normals
            .get(j * self.sample_x.len() + i)
            .copied()
            .unwrap_or(Vec3::Y)
    }

    /// Slope in degrees at grid cell (x, z)
    pub fn steepness_at(&self, x: usize, z: usize) -> f32 {
        self.steepness.at(x, z)
    }

    pub fn steepness(&self) -> &SteepnessMap {
        &self.steepness
    }

    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    /// Approximate heap size in bytes
    pub fn memory_size(&self) -> usize {
        self.vertices.len() * std::mem::size_of::<Vec3>() * 2
            + self.uvs.len() * std::mem::size_of::<Vec2>()
            + self.triangles.len() * std::mem::size_of::<[u32; 3]>()
            + self.surface_normals.len() * std::mem::size_of::<Vec3>()
            + self.steepness.values.len() * std::mem::size_of::<f32>()
    }
}
