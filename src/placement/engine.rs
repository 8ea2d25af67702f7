//! Fitness-scored scattering of objects over a chunk mesh
//!
//! Every sampled lattice point of the mesh is a candidate cell. A cell is
//! rejected outright when its normalized height or steepness leaves the
//! rule's bands, or when its surface tilts too far from up. Surviving cells
//! get a fitness from height and a decorrelated noise field and are kept
//! when `fitness > 1 - density`.

use std::f32::consts::TAU;

use noise::Perlin;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::request::{InstanceMode, InstanceTarget, InstantiateQueue, InstantiateRequest};
use super::rule::{PlacementRule, PlacementSettings, PlacementTarget};
use crate::core::types::{Quat, Vec3};
use crate::core::Transform;
use crate::math::inverse_lerp;
use crate::mesh::MeshData;
use crate::streaming::coord::GridCoord;
use crate::terrain::generator::HeightMap;
use crate::terrain::noise_field::gradient01;

/// Offsets the placement noise seed away from the terrain seed
const PLACEMENT_NOISE_SALT: u32 = 0x9e37_79b9;

/// Mix a chunk coordinate and rule index into a per-chunk seed
fn chunk_seed(seed: u64, coord: GridCoord, rule_index: usize) -> u64 {
    let mut h = seed ^ 0x51_7c_c1_b7_27_22_0a_95;
    h = (h ^ (coord.x as u32 as u64)).wrapping_mul(0x1000_0000_01b3);
    h = (h ^ (coord.z as u32 as u64)).wrapping_mul(0x1000_0000_01b3);
    h = (h ^ rule_index as u64).wrapping_mul(0x1000_0000_01b3);
    h ^ (h >> 29)
}

/// Clamped fitness of one cell, or `None` when the rule rejects it
/// outright (fitness 0, never placed).
pub fn cell_fitness(
    rule: &PlacementRule,
    normalized_height: f32,
    steepness: f32,
    normal_angle: f32,
    max_normal_angle: f32,
    noise: f32,
) -> Option<f32> {
    if !rule.accepts(normalized_height, steepness) || normal_angle > max_normal_angle {
        return None;
    }
    Some((normalized_height * rule.height_weight + noise * rule.noise_weight).clamp(0.0, 1.0))
}

/// Whether a fitness passes the rule's density bar
pub fn passes_density(fitness: f32, density: f32) -> bool {
    density >= 1.0 || fitness > 1.0 - density
}

/// Scatters objects according to a set of rules
pub struct PlacementEngine {
    settings: PlacementSettings,
    noise: Perlin,
}

impl PlacementEngine {
    pub fn new(settings: PlacementSettings) -> Self {
        let noise = Perlin::new((settings.seed as u32).wrapping_add(PLACEMENT_NOISE_SALT));
        Self { settings, noise }
    }

    pub fn settings(&self) -> &PlacementSettings {
        &self.settings
    }

    /// Run every rule over one chunk and push accepted placements to
    /// `queue`. `origin` is the chunk center in world space. Returns the
    /// number of requests pushed.
    pub fn place(
        &self,
        mesh: &MeshData,
        height_map: &HeightMap,
        chunk: GridCoord,
        origin: Vec3,
        queue: &InstantiateQueue,
    ) -> usize {
        let fits = mesh.sample_x().last().is_none_or(|&x| x < height_map.width())
            && mesh.sample_z().last().is_none_or(|&z| z < height_map.height());
        if !fits {
            log::warn!("Mesh for chunk {} does not match its height map, skipping placement", chunk);
            return 0;
        }

        let mut placed = 0;
        for (index, rule) in self.settings.rules.iter().enumerate() {
            let requests = self.place_rule(index, rule, mesh, height_map, chunk, origin);
            placed += requests.len();
            queue.extend(requests);
        }

        log::debug!("Placed {} objects on chunk {} (lod {})", placed, chunk, mesh.lod());
        placed
    }

    fn place_rule(
        &self,
        index: usize,
        rule: &PlacementRule,
        mesh: &MeshData,
        height_map: &HeightMap,
        chunk: GridCoord,
        origin: Vec3,
    ) -> Vec<InstantiateRequest> {
        if let PlacementTarget::Prefabs(prefabs) = &rule.target {
            if prefabs.is_empty() {
                log::warn!("Placement rule '{}' has no prefabs, skipping", rule.name);
                return Vec::new();
            }
        }
        if rule.density <= 0.0 {
            return Vec::new();
        }

        let mut rng = ChaCha8Rng::seed_from_u64(chunk_seed(self.settings.seed, chunk, index));
        let mode = rule.instance_mode();
        let scale = mesh.mesh_scale();
        let jitter = 0.5 * mesh.stride() as f32 * scale;
        let half_x = height_map.width().saturating_sub(1) as f32 / 2.0;
        let half_z = height_map.height().saturating_sub(1) as f32 / 2.0;
        // Placement noise is sampled in world cells so it continues across chunks
        let cell_origin_x = (origin.x / scale) as f64;
        let cell_origin_z = (origin.z / scale) as f64;
        let noise_scale = rule.noise_scale as f64;

        let mut requests = Vec::new();
        for (j, &gz) in mesh.sample_z().iter().enumerate() {
            for (i, &gx) in mesh.sample_x().iter().enumerate() {
                let height = height_map.get(gx, gz);
                let normalized = inverse_lerp(height_map.min_value(), height_map.max_value(), height);
                let normal = mesh.surface_normal(i, j);
                let angle = normal.angle_between(Vec3::Y).to_degrees();

                let cell_x = cell_origin_x + (gx as f64 - half_x as f64);
                let cell_z = cell_origin_z + (gz as f64 - half_z as f64);
                let noise = gradient01(&self.noise, cell_x * noise_scale, cell_z * noise_scale) as f32;

                let fitness = cell_fitness(
                    rule,
                    normalized,
                    mesh.steepness_at(gx, gz),
                    angle,
                    self.settings.max_normal_angle,
                    noise,
                );
                match fitness {
                    Some(f) if passes_density(f, rule.density) => {}
                    _ => continue,
                }

                let offset_x = rng.random_range(-jitter..=jitter);
                let offset_z = rng.random_range(-jitter..=jitter);
                let position = origin
                    + Vec3::new(
                        (gx as f32 - half_x) * scale + offset_x,
                        height,
                        (gz as f32 - half_z) * scale + offset_z,
                    );

                let mut rotation = Quat::from_rotation_arc(Vec3::Y, normal);
                if mode == InstanceMode::GpuBatched {
                    rotation *= Quat::from_rotation_y(rng.random_range(0.0..TAU));
                }

                let target = match &rule.target {
                    PlacementTarget::Prefabs(prefabs) => {
                        InstanceTarget::Prefab(prefabs[rng.random_range(0..prefabs.len())])
                    }
                    PlacementTarget::Instanced { mesh, material } => {
                        InstanceTarget::Instanced { mesh: *mesh, material: *material }
                    }
                };

                let size = rule.scale.sample(&mut rng);
                requests.push(InstantiateRequest {
                    target,
                    transform: Transform::new(position, rotation, Vec3::splat(size)),
                    chunk,
                    mode,
                });
            }
        }
        requests
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{build_mesh, MeshSettings, ShadingMode};
    use crate::placement::rule::ScaleMode;

    fn settings() -> MeshSettings {
        MeshSettings {
            mesh_scale: 1.0,
            shading: ShadingMode::Smooth,
            chunk_size_index: 0,
            flat_shaded_chunk_size_index: 0,
        }
    }

    /// Gentle ramp along x: normalized height equals x / (size - 1)
    fn ramp(size: usize) -> HeightMap {
        let values = (0..size * size).map(|i| (i % size) as f32 * 0.1).collect();
        HeightMap::new(size, size, values)
    }

    fn engine(rule: PlacementRule) -> PlacementEngine {
        PlacementEngine::new(PlacementSettings { rules: vec![rule], seed: 3, ..Default::default() })
    }

    fn run(engine: &PlacementEngine, map: &HeightMap, lod: usize) -> Vec<InstantiateRequest> {
        let mesh = build_mesh(map, &settings(), lod);
        let queue = InstantiateQueue::new();
        let count = engine.place(&mesh, map, GridCoord::new(0, 0), Vec3::ZERO, &queue);
        let requests = queue.drain();
        assert_eq!(count, requests.len());
        requests
    }

    #[test]
    fn test_fitness_rejections() {
        let rule = PlacementRule {
            min_height: 0.2,
            max_height: 0.8,
            max_steepness: 30.0,
            height_weight: 1.0,
            noise_weight: 0.0,
            ..Default::default()
        };
        assert_eq!(cell_fitness(&rule, 0.1, 0.0, 0.0, 30.0, 0.5), None);
        assert_eq!(cell_fitness(&rule, 0.5, 40.0, 0.0, 30.0, 0.5), None);
        assert_eq!(cell_fitness(&rule, 0.5, 10.0, 31.0, 30.0, 0.5), None);
        assert_eq!(cell_fitness(&rule, 0.5, 10.0, 5.0, 30.0, 0.5), Some(0.5));

        let heavy = PlacementRule { height_weight: 3.0, ..rule };
        assert_eq!(cell_fitness(&heavy, 0.5, 10.0, 5.0, 30.0, 0.5), Some(1.0));
    }

    #[test]
    fn test_density_bar() {
        assert!(!passes_density(1.0, 0.0));
        assert!(passes_density(0.0, 1.0));
        assert!(passes_density(0.6, 0.5));
        assert!(!passes_density(0.5, 0.5));
    }

    #[test]
    fn test_zero_density_places_nothing() {
        let e = engine(PlacementRule {
            density: 0.0,
            target: PlacementTarget::Prefabs(vec![1]),
            ..Default::default()
        });
        assert!(run(&e, &ramp(49), 0).is_empty());
    }

    #[test]
    fn test_full_density_fills_every_accepted_cell() {
        let e = engine(PlacementRule {
            density: 1.0,
            target: PlacementTarget::Prefabs(vec![1, 2]),
            ..Default::default()
        });
        let map = ramp(49);
        // Every lattice point of a gentle ramp is inside the default bands
        assert_eq!(run(&e, &map, 0).len(), 49 * 49);
        assert_eq!(run(&e, &map, 2).len(), 13 * 13);
    }

    #[test]
    fn test_bands_are_respected() {
        let e = engine(PlacementRule {
            density: 1.0,
            min_height: 0.25,
            max_height: 0.5,
            target: PlacementTarget::Prefabs(vec![7]),
            ..Default::default()
        });
        let map = ramp(49);
        let requests = run(&e, &map, 0);
        assert!(!requests.is_empty());
        for request in &requests {
            // Local x spans [-24, 24]; jitter stays within half a cell
            let normalized = (request.transform.translation.x + 24.0) / 48.0;
            assert!(normalized > 0.25 - 0.02 && normalized < 0.5 + 0.02);
            assert_eq!(request.target, InstanceTarget::Prefab(7));
            assert_eq!(request.mode, InstanceMode::Individual);
        }

        let steep_only = engine(PlacementRule {
            density: 1.0,
            min_steepness: 60.0,
            target: PlacementTarget::Prefabs(vec![7]),
            ..Default::default()
        });
        assert!(run(&steep_only, &map, 0).is_empty());
    }

    #[test]
    fn test_missing_prefabs_skips_rule() {
        let e = engine(PlacementRule { density: 1.0, ..Default::default() });
        assert!(run(&e, &ramp(49), 0).is_empty());
    }

    #[test]
    fn test_steep_normals_rejected() {
        let e = engine(PlacementRule {
            density: 1.0,
            target: PlacementTarget::Prefabs(vec![1]),
            ..Default::default()
        });
        let values = (0..49 * 49).map(|i| (i % 49) as f32 * 5.0).collect();
        let cliff = HeightMap::new(49, 49, values);
        assert!(run(&e, &cliff, 0).is_empty());
    }

    #[test]
    fn test_placement_is_deterministic() {
        let e = engine(PlacementRule {
            density: 0.6,
            scale: ScaleMode::Random { min: 1, max: 3 },
            target: PlacementTarget::Instanced { mesh: 4, material: 2 },
            ..Default::default()
        });
        let map = ramp(49);
        let first = run(&e, &map, 1);
        let second = run(&e, &map, 1);
        assert_eq!(first, second);
        for request in &first {
            assert_eq!(request.mode, InstanceMode::GpuBatched);
            assert_eq!(request.target, InstanceTarget::Instanced { mesh: 4, material: 2 });
            let s = request.transform.scale.x;
            assert!(s == 1.0 || s == 2.0 || s == 3.0);
        }
    }

    #[test]
    fn test_rotation_follows_normal() {
        let e = engine(PlacementRule {
            density: 1.0,
            target: PlacementTarget::Prefabs(vec![1]),
            ..Default::default()
        });
        let flat = HeightMap::new(49, 49, vec![2.0; 49 * 49]);
        let requests = run(&e, &flat, 4);
        assert!(!requests.is_empty());
        for request in &requests {
            let up = request.transform.rotation * Vec3::Y;
            assert!((up - Vec3::Y).length() < 1e-4);
            assert_eq!(request.transform.translation.y, 2.0);
        }
    }
}
