//! Per-chunk lifecycle state
//!
//! ```text
//! Pending -> HeightReady -> MeshReady(lod) <-> MeshReady(lod') -> Placed(lod)
//!    \-> Failed (height map retries exhausted)
//! ```
//!
//! Decisions are computed by pure `evaluate*` methods; the streaming manager
//! applies them and submits the background work.

use std::sync::Arc;

use crate::core::types::Vec2;
use crate::math::rect::Rect;
use crate::mesh::MeshData;
use crate::placement::InstantiateRequest;
use crate::render::ObjectHandle;
use crate::terrain::generator::HeightMap;

use super::coord::GridCoord;
use super::lod::{is_visible, select_lod, LodInfo};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChunkPhase {
    /// Waiting for its height map
    Pending,
    HeightReady,
    /// Displaying the mesh of detail level `lod`
    MeshReady { lod: usize },
    /// Objects placed on the mesh of detail level `lod`
    Placed { lod: usize },
    /// Height generation kept failing
    Failed,
}

/// Cached mesh of one detail level
#[derive(Clone, Debug, Default)]
pub struct LodMesh {
    pub mesh: Option<Arc<MeshData>>,
    pub requested: bool,
}

/// What a chunk needs after the viewer moved
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ChunkUpdate {
    /// Detail level to build
    pub request_mesh: Option<usize>,
    /// Cached detail level to switch to
    pub display: Option<usize>,
    pub visible: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ColliderUpdate {
    pub request_mesh: Option<usize>,
    pub attach: Option<usize>,
}

#[derive(Debug)]
pub struct ChunkState {
    coord: GridCoord,
    /// Unique per creation; results for an older epoch are stale
    epoch: u64,
    bounds: Rect,
    phase: ChunkPhase,
    height_map: Option<Arc<HeightMap>>,
    pub(crate) height_attempts: u32,
    /// Indexed by detail level, filled lazily and never cleared
    lod_meshes: Vec<LodMesh>,
    displayed_lod: Option<usize>,
    visible: bool,
    has_collider: bool,
    pub(crate) terrain: ObjectHandle,
    /// Pooled objects currently spawned for this chunk
    pub(crate) objects: Vec<ObjectHandle>,
    /// Individual placements, kept so hidden chunks can respawn them
    pub(crate) placements: Vec<InstantiateRequest>,
    placement_generation: u64,
}

impl ChunkState {
    pub fn new(
        coord: GridCoord,
        epoch: u64,
        chunk_world_size: f32,
        detail_levels: usize,
        terrain: ObjectHandle,
    ) -> Self {
        Self {
            coord,
            epoch,
            bounds: coord.bounds(chunk_world_size),
            phase: ChunkPhase::Pending,
            height_map: None,
            height_attempts: 0,
            lod_meshes: vec![LodMesh::default(); detail_levels],
            displayed_lod: None,
            visible: false,
            has_collider: false,
            terrain,
            objects: Vec::new(),
            placements: Vec::new(),
            placement_generation: 0,
        }
    }

    pub fn coord(&self) -> GridCoord {
        self.coord
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn phase(&self) -> ChunkPhase {
        self.phase
    }

    pub fn height_map(&self) -> Option<&Arc<HeightMap>> {
        self.height_map.as_ref()
    }

    pub fn displayed_lod(&self) -> Option<usize> {
        self.displayed_lod
    }

    pub fn displayed_mesh(&self) -> Option<&Arc<MeshData>> {
        self.displayed_lod.and_then(|i| self.mesh(i))
    }

    pub fn mesh(&self, index: usize) -> Option<&Arc<MeshData>> {
        self.lod_meshes.get(index).and_then(|m| m.mesh.as_ref())
    }

    pub fn is_requested(&self, index: usize) -> bool {
        self.lod_meshes.get(index).is_some_and(|m| m.requested)
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn has_collider(&self) -> bool {
        self.has_collider
    }

    pub fn terrain(&self) -> ObjectHandle {
        self.terrain
    }

    pub fn objects(&self) -> &[ObjectHandle] {
        &self.objects
    }

    pub fn placement_generation(&self) -> u64 {
        self.placement_generation
    }

    /// Distance from the viewer to the chunk footprint
    pub fn distance(&self, viewer: Vec2) -> f32 {
        self.bounds.distance(viewer)
    }

    /// Decide LOD and visibility for a viewer position. A chunk stays
    /// hidden until its height map has arrived.
    pub fn evaluate(&self, viewer: Vec2, levels: &[LodInfo]) -> ChunkUpdate {
        if self.height_map.is_none() {
            return ChunkUpdate::default();
        }

        let distance = self.distance(viewer);
        let visible = is_visible(distance, levels);
        let mut update = ChunkUpdate { visible, ..Default::default() };
        if !visible {
            return update;
        }

        let index = select_lod(distance, levels);
        if self.displayed_lod == Some(index) {
            return update;
        }
        match self.lod_meshes.get(index) {
            Some(LodMesh { mesh: Some(_), .. }) => update.display = Some(index),
            Some(LodMesh { mesh: None, requested: false }) => update.request_mesh = Some(index),
            _ => {}
        }
        update
    }

    /// Decide collider work. Once attached the collider never changes.
    pub fn evaluate_collider(
        &self,
        viewer: Vec2,
        levels: &[LodInfo],
        collider_index: usize,
        sqr_collider_distance: f32,
    ) -> ColliderUpdate {
        let mut update = ColliderUpdate::default();
        if self.has_collider || self.height_map.is_none() || levels.is_empty() {
            return update;
        }

        let index = collider_index.min(levels.len() - 1);
        let sqr_distance = self.bounds.sqr_distance(viewer);

        if sqr_distance < levels[index].sqr_visible_distance() && !self.is_requested(index) && self.mesh(index).is_none() {
            update.request_mesh = Some(index);
        }
        if sqr_distance < sqr_collider_distance && self.mesh(index).is_some() {
            update.attach = Some(index);
        }
        update
    }

    pub fn set_height_map(&mut self, height_map: Arc<HeightMap>) {
        self.height_map = Some(height_map);
        self.phase = ChunkPhase::HeightReady;
    }

    pub fn mark_failed(&mut self) {
        self.phase = ChunkPhase::Failed;
    }

    pub fn mark_requested(&mut self, index: usize) {
        if let Some(slot) = self.lod_meshes.get_mut(index) {
            slot.requested = true;
        }
    }

    /// Allow a failed build to be requested again
    pub fn clear_requested(&mut self, index: usize) {
        if let Some(slot) = self.lod_meshes.get_mut(index) {
            slot.requested = false;
        }
    }

    /// Cache a finished mesh. An already cached level is kept as is.
    pub fn insert_mesh(&mut self, index: usize, mesh: Arc<MeshData>) -> bool {
        match self.lod_meshes.get_mut(index) {
            Some(slot) if slot.mesh.is_none() => {
                slot.mesh = Some(mesh);
                true
            }
            _ => false,
        }
    }

    /// Switch to a cached level. Returns the mesh to show.
    pub fn display(&mut self, index: usize) -> Option<Arc<MeshData>> {
        let mesh = self.mesh(index).cloned()?;
        self.displayed_lod = Some(index);
        self.phase = ChunkPhase::MeshReady { lod: index };
        Some(mesh)
    }

    pub fn mark_placed(&mut self, index: usize) {
        if self.displayed_lod == Some(index) {
            self.phase = ChunkPhase::Placed { lod: index };
        }
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Fix the collider to a cached level. Returns the collider mesh.
    pub fn attach_collider(&mut self, index: usize) -> Option<Arc<MeshData>> {
        if self.has_collider {
            return None;
        }
        let mesh = self.mesh(index).cloned()?;
        self.has_collider = true;
        Some(mesh)
    }

    /// Start a new placement round; older rounds become stale
    pub fn next_placement_generation(&mut self) -> u64 {
        self.placement_generation += 1;
        self.placement_generation
    }
}
