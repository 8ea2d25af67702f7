//! Height map to triangle mesh conversion

use super::data::{MeshData, SteepnessMap};
use super::settings::{lod_stride, MeshSettings, ShadingMode};
use crate::core::types::{Vec2, Vec3};
use crate::math::aabb::Aabb;
use crate::terrain::generator::HeightMap;

/// Grid indices visited at `stride`, always ending on the last index so
/// every LOD spans the full chunk.
pub fn sample_indices(count: usize, stride: usize) -> Vec<usize> {
    if count == 0 {
        return Vec::new();
    }
    let mut indices: Vec<usize> = (0..count).step_by(stride.max(1)).collect();
    if indices.last() != Some(&(count - 1)) {
        indices.push(count - 1);
    }
    indices
}

/// Builds LOD meshes from height maps
#[derive(Clone, Debug, Default)]
pub struct MeshBuilder {
    settings: MeshSettings,
}

impl MeshBuilder {
    pub fn new(settings: MeshSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &MeshSettings {
        &self.settings
    }

    /// Build the mesh for one LOD level
    pub fn build(&self, height_map: &HeightMap, lod: usize) -> MeshData {
        let stride = lod_stride(lod);
        let scale = self.settings.mesh_scale;
        let sample_x = sample_indices(height_map.width(), stride);
        let sample_z = sample_indices(height_map.height(), stride);
        let line_x = sample_x.len();
        let line_z = sample_z.len();

        let half_x = height_map.width().saturating_sub(1) as f32 / 2.0;
        let half_z = height_map.height().saturating_sub(1) as f32 / 2.0;
        let uv_x = line_x.saturating_sub(1).max(1) as f32;
        let uv_z = line_z.saturating_sub(1).max(1) as f32;

        let mut vertices = Vec::with_capacity(line_x * line_z);
        let mut uvs = Vec::with_capacity(line_x * line_z);
        for (j, &gz) in sample_z.iter().enumerate() {
            for (i, &gx) in sample_x.iter().enumerate() {
                vertices.push(Vec3::new(
                    (gx as f32 - half_x) * scale,
                    height_map.get(gx, gz),
                    (gz as f32 - half_z) * scale,
                ));
                uvs.push(Vec2::new(i as f32 / uv_x, j as f32 / uv_z));
            }
        }

        let mut triangles = Vec::with_capacity(line_x.saturating_sub(1) * line_z.saturating_sub(1) * 2);
        for j in 0..line_z.saturating_sub(1) {
            for i in 0..line_x.saturating_sub(1) {
                let v = (j * line_x + i) as u32;
                let w = line_x as u32;
                triangles.push([v, v + w, v + w + 1]);
                triangles.push([v, v + w + 1, v + 1]);
            }
        }

        let surface_normals = smooth_normals(&vertices, &triangles);
        let steepness = SteepnessMap::compute(
            height_map.width(),
            height_map.height(),
            height_map.values(),
            scale,
        );

        let (vertices, triangles, uvs, normals) = match self.settings.shading {
            ShadingMode::Smooth => {
                let normals = surface_normals.clone();
                (vertices, triangles, uvs, normals)
            }
            ShadingMode::Flat => flatten(&vertices, &triangles, &uvs),
        };

        let bounds = Aabb::from_points(&vertices).unwrap_or_default();

        MeshData {
            vertices,
            triangles,
            uvs,
            normals,
            lod,
            stride,
            shading: self.settings.shading,
            mesh_scale: scale,
            sample_x,
            sample_z,
            surface_normals,
            steepness,
            bounds,
        }
    }
}

/// One-shot mesh build
pub fn build_mesh(height_map: &HeightMap, settings: &MeshSettings, lod: usize) -> MeshData {
    MeshBuilder::new(settings.clone()).build(height_map, lod)
}

fn face_normal(vertices: &[Vec3], tri: [u32; 3]) -> Vec3 {
    let a = vertices[tri[0] as usize];
    let b = vertices[tri[1] as usize];
    let c = vertices[tri[2] as usize];
    (b - a).cross(c - a).normalize_or_zero()
}

/// Accumulate face normals per shared vertex
fn smooth_normals(vertices: &[Vec3], triangles: &[[u32; 3]]) -> Vec<Vec3> {
    let mut normals = vec![Vec3::ZERO; vertices.len()];
    for &tri in triangles {
        let n = face_normal(vertices, tri);
        for idx in tri {
            normals[idx as usize] += n;
        }
    }
    for n in normals.iter_mut() {
        let unit = n.normalize_or_zero();
        *n = if unit == Vec3::ZERO { Vec3::Y } else { unit };
    }
    normals
}

/// Duplicate vertices per triangle so each face carries its own normal
fn flatten(
    vertices: &[Vec3],
    triangles: &[[u32; 3]],
    uvs: &[Vec2],
) -> (Vec<Vec3>, Vec<[u32; 3]>, Vec<Vec2>, Vec<Vec3>) {
    let mut flat_vertices = Vec::with_capacity(triangles.len() * 3);
    let mut flat_uvs = Vec::with_capacity(triangles.len() * 3);
    let mut flat_normals = Vec::with_capacity(triangles.len() * 3);
    let mut flat_triangles = Vec::with_capacity(triangles.len());

    for &tri in triangles {
        let n = face_normal(vertices, tri);
        let n = if n == Vec3::ZERO { Vec3::Y } else { n };
        let base = flat_vertices.len() as u32;
        for idx in tri {
            flat_vertices.push(vertices[idx as usize]);
            flat_uvs.push(uvs[idx as usize]);
            flat_normals.push(n);
        }
        flat_triangles.push([base, base + 1, base + 2]);
    }

    (flat_vertices, flat_triangles, flat_uvs, flat_normals)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_map(size: usize, h: f32) -> HeightMap {
        HeightMap::new(size, size, vec![h; size * size])
    }

    fn ramp_map(size: usize, rise: f32) -> HeightMap {
        let values = (0..size * size).map(|i| (i % size) as f32 * rise).collect();
        HeightMap::new(size, size, values)
    }

    fn small_settings(shading: ShadingMode) -> MeshSettings {
        MeshSettings {
            mesh_scale: 1.0,
            shading,
            chunk_size_index: 0,
            flat_shaded_chunk_size_index: 0,
        }
    }

    #[test]
    fn test_sample_indices() {
        assert_eq!(sample_indices(9, 2), vec![0, 2, 4, 6, 8]);
        assert_eq!(sample_indices(9, 3), vec![0, 3, 6, 8]);
        assert_eq!(sample_indices(1, 4), vec![0]);
        assert!(sample_indices(0, 1).is_empty());
    }

    #[test]
    fn test_smooth_vertex_counts() {
        let settings = small_settings(ShadingMode::Smooth);
        let vpl = settings.vertices_per_line();
        let map = flat_map(vpl, 0.0);

        for lod in 0..5 {
            let mesh = build_mesh(&map, &settings, lod);
            let line = (vpl - 1) / lod_stride(lod) + 1;
            assert_eq!(mesh.vertices_per_line(), line);
            assert_eq!(mesh.vertex_count(), line * line);
            assert_eq!(mesh.triangle_count(), (line - 1) * (line - 1) * 2);
        }
    }

    #[test]
    fn test_241_grid_lod0() {
        let map = flat_map(241, 1.0);
        let mesh = build_mesh(&map, &MeshSettings::default(), 0);
        assert_eq!(mesh.vertex_count(), 58081);
        assert_eq!(mesh.triangle_count(), 115200);
    }

    #[test]
    fn test_flat_shading_duplicates_vertices() {
        let settings = small_settings(ShadingMode::Flat);
        let vpl = settings.vertices_per_line();
        let mesh = build_mesh(&ramp_map(vpl, 0.5), &settings, 0);
        assert_eq!(mesh.vertex_count(), 6 * (vpl - 1) * (vpl - 1));
        assert_eq!(mesh.normals.len(), mesh.vertex_count());
        // Lattice is preserved for placement
        assert_eq!(mesh.vertices_per_line(), vpl);
    }

    #[test]
    fn test_flat_mesh_normals_point_up() {
        let mesh = build_mesh(&flat_map(9, 2.0), &small_settings(ShadingMode::Smooth), 0);
        for n in &mesh.normals {
            assert!((*n - Vec3::Y).length() < 1e-5);
        }
        assert!(mesh.steepness().values().iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_positions_centered_and_scaled() {
        let settings = MeshSettings { mesh_scale: 2.0, ..small_settings(ShadingMode::Smooth) };
        let mesh = build_mesh(&flat_map(5, 0.0), &settings, 0);
        assert_eq!(mesh.vertices[0], Vec3::new(-4.0, 0.0, -4.0));
        assert_eq!(mesh.vertices[24], Vec3::new(4.0, 0.0, 4.0));
        assert_eq!(mesh.uvs[0], Vec2::ZERO);
        assert_eq!(mesh.uvs[24], Vec2::ONE);
        assert_eq!(mesh.bounds().size(), Vec3::new(8.0, 0.0, 8.0));
    }

    #[test]
    fn test_steepness_grows_with_slope() {
        let settings = small_settings(ShadingMode::Smooth);
        let gentle = build_mesh(&ramp_map(9, 0.2), &settings, 0);
        let steep = build_mesh(&ramp_map(9, 2.0), &settings, 0);
        assert!(steep.steepness_at(4, 4) > gentle.steepness_at(4, 4));
        assert!(gentle.steepness_at(4, 4) > 0.0);
    }

    #[test]
    fn test_ramp_normals_tilt_away_from_slope() {
        let mesh = build_mesh(&ramp_map(9, 1.0), &small_settings(ShadingMode::Smooth), 0);
        let n = mesh.surface_normal(4, 4);
        assert!(n.y > 0.0);
        assert!(n.x < 0.0);
    }
}
