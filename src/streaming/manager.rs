//! Viewer-driven chunk streaming
//!
//! The manager owns every chunk around the viewer. Each tick it re-evaluates
//! the chunks that are currently visible, rescans the whole view window
//! once the viewer has travelled far enough, and applies background results
//! that arrived since the last tick. Results are tagged with the chunk epoch
//! and dropped when their chunk has been evicted or recreated.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::config::TerrainConfig;
use crate::core::types::{Result, Vec2, Vec3};
use crate::core::Transform;
use crate::mesh::{MeshBuilder, MeshData};
use crate::placement::{
    build_batches, GpuBatchTable, InstanceMode, InstanceTarget, InstantiateQueue, ObjectPool,
    PlacementEngine,
};
use crate::render::{PrimitiveKind, Renderer};
use crate::terrain::generator::{HeightMap, HeightMapGenerator};

use super::chunk::{ChunkPhase, ChunkState};
use super::coord::GridCoord;
use super::dispatcher::WorkerDispatcher;
use super::lod::max_view_distance;
use super::settings::StreamingSettings;

/// Notification produced while streaming
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChunkEvent {
    VisibilityChanged { coord: GridCoord, visible: bool },
    /// The chunk's collider was attached using mesh LOD `lod`
    ColliderReady { coord: GridCoord, lod: usize },
}

/// Snapshot of streaming counters
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StreamingStats {
    pub chunks: usize,
    pub visible: usize,
    pub pending_jobs: usize,
    pub pooled_objects_created: usize,
    pub objects_in_use: usize,
    pub batched_instances: usize,
    pub evicted: usize,
    pub stale_results: usize,
}

/// Collaborators shared by every chunk
pub struct StreamingContext<R> {
    pub renderer: R,
    pub pool: ObjectPool,
    pub batches: GpuBatchTable,
}

impl<R: Renderer> StreamingContext<R> {
    pub fn new(renderer: R) -> Self {
        Self {
            renderer,
            pool: ObjectPool::new(),
            batches: GpuBatchTable::new(),
        }
    }

    /// Acquire pooled objects for every stored placement of a chunk
    fn spawn_objects(&mut self, chunk: &mut ChunkState) {
        for request in &chunk.placements {
            let InstanceTarget::Prefab(prefab) = request.target else {
                continue;
            };
            let handle = self.pool.acquire(prefab, &mut self.renderer);
            self.renderer.set_transform(handle, &request.transform);
            chunk.objects.push(handle);
        }
    }

    /// Return a chunk's objects to the pool
    fn release_objects(&mut self, chunk: &mut ChunkState) {
        for handle in chunk.objects.drain(..) {
            self.pool.release(handle, &mut self.renderer);
        }
    }
}

pub struct StreamingManager<R: Renderer + 'static> {
    settings: StreamingSettings,
    chunk_world_size: f32,
    vertices_per_line: usize,
    /// Window radius in chunks
    view_radius: i32,

    generator: Arc<HeightMapGenerator>,
    builder: Arc<MeshBuilder>,
    placement: Arc<PlacementEngine>,

    context: StreamingContext<R>,
    dispatcher: WorkerDispatcher<StreamingManager<R>>,

    chunks: HashMap<GridCoord, ChunkState>,
    visible: HashSet<GridCoord>,
    next_epoch: u64,

    viewer: Vec2,
    last_update_pos: Option<Vec2>,
    events: Vec<ChunkEvent>,
    evicted: usize,
    stale_results: usize,
}

impl<R: Renderer + 'static> StreamingManager<R> {
    /// Build a manager from a configuration. Invalid values are corrected
    /// first; only a failure to start the worker pool is an error.
    pub fn new(config: TerrainConfig, renderer: R) -> Result<Self> {
        let config = config.validated();
        let dispatcher = WorkerDispatcher::new(config.streaming.worker_threads)?;

        let chunk_world_size = config.mesh.mesh_world_size();
        let view_distance = max_view_distance(&config.streaming.detail_levels);
        let view_radius = (view_distance / chunk_world_size).round() as i32;

        log::info!(
            "Streaming {} unit chunks, view distance {} ({} chunk radius), {} workers",
            chunk_world_size,
            view_distance,
            view_radius,
            dispatcher.threads()
        );

        Ok(Self {
            chunk_world_size,
            vertices_per_line: config.mesh.vertices_per_line(),
            view_radius,
            generator: Arc::new(HeightMapGenerator::new(config.height_map)),
            builder: Arc::new(MeshBuilder::new(config.mesh)),
            placement: Arc::new(PlacementEngine::new(config.placement)),
            settings: config.streaming,
            context: StreamingContext::new(renderer),
            dispatcher,
            chunks: HashMap::new(),
            visible: HashSet::new(),
            next_epoch: 0,
            viewer: Vec2::ZERO,
            last_update_pos: None,
            events: Vec::new(),
            evicted: 0,
            stale_results: 0,
        })
    }

    /// Advance one frame with the viewer at world XZ `viewer`
    pub fn tick(&mut self, viewer: Vec2) {
        self.events.clear();

        let moved = viewer != self.viewer;
        self.viewer = viewer;

        if moved {
            let visible: Vec<GridCoord> = self.visible.iter().copied().collect();
            for coord in visible {
                self.update_chunk(coord);
                self.update_collider(coord);
            }
        }

        let rescan = self
            .last_update_pos
            .is_none_or(|last| last.distance_squared(viewer) > self.settings.sqr_move_threshold());
        if rescan {
            self.last_update_pos = Some(viewer);
            self.update_visible_chunks();
        }

        self.process_completions();
    }

    /// Apply every background result that has arrived
    pub fn process_completions(&mut self) {
        for completion in self.dispatcher.poll() {
            completion(self);
        }
    }

    fn update_visible_chunks(&mut self) {
        let current = GridCoord::from_world(self.viewer, self.chunk_world_size);
        let mut updated = HashSet::new();

        let previously_visible: Vec<GridCoord> = self.visible.iter().copied().collect();
        for coord in previously_visible {
            updated.insert(coord);
            self.update_chunk(coord);
        }

        let mut created = 0;
        for coord in current.window(self.view_radius) {
            if updated.contains(&coord) {
                continue;
            }
            if self.chunks.contains_key(&coord) {
                self.update_chunk(coord);
            } else {
                self.create_chunk(coord);
                created += 1;
            }
        }

        let radius = self.view_radius;
        let outside: Vec<GridCoord> = self
            .chunks
            .keys()
            .copied()
            .filter(|c| !self.visible.contains(c) && c.chebyshev(current) > radius)
            .collect();
        for coord in &outside {
            self.evict_chunk(*coord);
        }

        log::debug!(
            "Rescan around {}: {} created, {} evicted, {} visible, {} live",
            current,
            created,
            outside.len(),
            self.visible.len(),
            self.chunks.len()
        );
    }

    pub(crate) fn create_chunk(&mut self, coord: GridCoord) {
        let epoch = self.next_epoch;
        self.next_epoch += 1;

        let terrain = self.context.renderer.create_primitive(PrimitiveKind::Terrain(coord));
        let center = coord.world_center(self.chunk_world_size);
        self.context
            .renderer
            .set_transform(terrain, &Transform::from_translation(Vec3::new(center.x, 0.0, center.y)));
        self.context.renderer.set_active(terrain, false);

        let chunk = ChunkState::new(
            coord,
            epoch,
            self.chunk_world_size,
            self.settings.detail_levels.len(),
            terrain,
        );
        self.chunks.insert(coord, chunk);
        log::debug!("Created chunk {} (epoch {})", coord, epoch);

        self.request_height_map(coord);
    }

    fn evict_chunk(&mut self, coord: GridCoord) {
        let Some(mut chunk) = self.chunks.remove(&coord) else {
            return;
        };
        self.context.release_objects(&mut chunk);
        self.context.batches.remove(coord);
        self.context.renderer.destroy(chunk.terrain());
        self.visible.remove(&coord);
        self.evicted += 1;
        log::debug!("Evicted chunk {}", coord);
    }

    /// Live chunk matching `epoch`, counting stale deliveries
    fn chunk_for(&mut self, coord: GridCoord, epoch: u64) -> Option<&mut ChunkState> {
        let live = self.chunks.get(&coord).is_some_and(|c| c.epoch() == epoch);
        if !live {
            self.stale_results += 1;
            log::debug!("Dropping stale result for chunk {} (epoch {})", coord, epoch);
            return None;
        }
        self.chunks.get_mut(&coord)
    }

    fn request_height_map(&mut self, coord: GridCoord) {
        let Some(chunk) = self.chunks.get_mut(&coord) else {
            return;
        };
        chunk.height_attempts += 1;

        let epoch = chunk.epoch();
        let size = self.vertices_per_line;
        let center = coord.sample_center(size);
        let generator = self.generator.clone();

        self.dispatcher.submit(
            move || generator.generate(size, size, center),
            move |manager: &mut Self, result| manager.on_height_map(coord, epoch, result),
        );
    }

    pub(crate) fn on_height_map(&mut self, coord: GridCoord, epoch: u64, result: Result<HeightMap>) {
        let retries = self.settings.height_map_retries;
        let Some(chunk) = self.chunk_for(coord, epoch) else {
            return;
        };

        match result {
            Ok(height_map) => {
                chunk.set_height_map(Arc::new(height_map));
                self.update_chunk(coord);
                self.update_collider(coord);
            }
            Err(e) if chunk.height_attempts <= retries => {
                log::warn!(
                    "Height map for chunk {} failed (attempt {}): {}, retrying",
                    coord,
                    chunk.height_attempts,
                    e
                );
                self.request_height_map(coord);
            }
            Err(e) => {
                log::error!("Height map for chunk {} failed permanently: {}", coord, e);
                chunk.mark_failed();
            }
        }
    }

    fn request_mesh(&mut self, coord: GridCoord, index: usize) {
        let Some(chunk) = self.chunks.get_mut(&coord) else {
            return;
        };
        let (Some(height_map), Some(level)) =
            (chunk.height_map().cloned(), self.settings.detail_levels.get(index).copied())
        else {
            return;
        };
        chunk.mark_requested(index);

        let epoch = chunk.epoch();
        let builder = self.builder.clone();
        self.dispatcher.submit(
            move || builder.build(&height_map, level.lod),
            move |manager: &mut Self, result| manager.on_mesh(coord, epoch, index, result),
        );
    }

    fn on_mesh(&mut self, coord: GridCoord, epoch: u64, index: usize, result: Result<MeshData>) {
        let Some(chunk) = self.chunk_for(coord, epoch) else {
            return;
        };

        let mesh = match result {
            Ok(mesh) => mesh,
            Err(e) => {
                log::warn!("Mesh for chunk {} level {} failed: {}", coord, index, e);
                chunk.clear_requested(index);
                return;
            }
        };
        chunk.insert_mesh(index, Arc::new(mesh));
        let displayed_before = chunk.displayed_lod();

        self.update_chunk(coord);
        self.update_collider(coord);

        // A build that did not change the displayed mesh still refreshes placement
        let displayed_after = self.chunks.get(&coord).and_then(|c| c.displayed_lod());
        if displayed_after.is_some() && displayed_after == displayed_before {
            self.request_placement(coord);
        }
    }

    fn update_chunk(&mut self, coord: GridCoord) {
        let Some(chunk) = self.chunks.get(&coord) else {
            return;
        };
        let update = chunk.evaluate(self.viewer, &self.settings.detail_levels);

        if let Some(index) = update.request_mesh {
            self.request_mesh(coord, index);
        }
        if let Some(index) = update.display {
            self.display_lod(coord, index);
        }
        self.set_chunk_visible(coord, update.visible);
    }

    fn display_lod(&mut self, coord: GridCoord, index: usize) {
        let Some(chunk) = self.chunks.get_mut(&coord) else {
            return;
        };
        let Some(mesh) = chunk.display(index) else {
            return;
        };
        self.context.renderer.set_mesh(chunk.terrain(), mesh);
        self.request_placement(coord);
    }

    fn update_collider(&mut self, coord: GridCoord) {
        let Some(chunk) = self.chunks.get(&coord) else {
            return;
        };
        let update = chunk.evaluate_collider(
            self.viewer,
            &self.settings.detail_levels,
            self.settings.collider_lod_index,
            self.settings.sqr_collider_distance(),
        );

        if let Some(index) = update.request_mesh {
            self.request_mesh(coord, index);
        }
        if let Some(index) = update.attach {
            let Some(chunk) = self.chunks.get_mut(&coord) else {
                return;
            };
            if let Some(mesh) = chunk.attach_collider(index) {
                let lod = mesh.lod();
                self.context.renderer.set_collider(chunk.terrain(), mesh);
                self.events.push(ChunkEvent::ColliderReady { coord, lod });
            }
        }
    }

    fn set_chunk_visible(&mut self, coord: GridCoord, visible: bool) {
        let Some(chunk) = self.chunks.get_mut(&coord) else {
            return;
        };
        if chunk.is_visible() == visible {
            return;
        }

        chunk.set_visible(visible);
        self.context.renderer.set_active(chunk.terrain(), visible);
        if visible {
            self.visible.insert(coord);
            self.context.spawn_objects(chunk);
        } else {
            self.visible.remove(&coord);
            self.context.release_objects(chunk);
        }
        self.context.batches.set_visible(coord, visible);
        self.events.push(ChunkEvent::VisibilityChanged { coord, visible });
    }

    /// Scatter objects on the displayed mesh in the background
    fn request_placement(&mut self, coord: GridCoord) {
        let chunk_world_size = self.chunk_world_size;
        let Some(chunk) = self.chunks.get_mut(&coord) else {
            return;
        };
        let (Some(index), Some(mesh), Some(height_map)) = (
            chunk.displayed_lod(),
            chunk.displayed_mesh().cloned(),
            chunk.height_map().cloned(),
        ) else {
            return;
        };

        let generation = chunk.next_placement_generation();
        if self.placement.settings().rules.is_empty() {
            chunk.mark_placed(index);
            return;
        }

        let epoch = chunk.epoch();
        let center = coord.world_center(chunk_world_size);
        let origin = Vec3::new(center.x, 0.0, center.y);
        let engine = self.placement.clone();
        let queue = InstantiateQueue::new();
        let worker_queue = queue.clone();

        self.dispatcher.run(
            move || {
                engine.place(&mesh, &height_map, coord, origin, &worker_queue);
            },
            move |manager: &mut Self, result| {
                manager.on_placed(coord, epoch, generation, index, queue, result)
            },
        );
    }

    fn on_placed(
        &mut self,
        coord: GridCoord,
        epoch: u64,
        generation: u64,
        index: usize,
        queue: InstantiateQueue,
        result: Result<()>,
    ) {
        let Some(chunk) = self.chunk_for(coord, epoch) else {
            return;
        };
        if chunk.placement_generation() != generation {
            log::debug!("Dropping superseded placement for chunk {}", coord);
            self.stale_results += 1;
            return;
        }
        if let Err(e) = result {
            log::warn!("Placement for chunk {} failed: {}", coord, e);
            return;
        }
        let Some(chunk) = self.chunks.get_mut(&coord) else {
            return;
        };

        let (individual, batched): (Vec<_>, Vec<_>) =
            queue.drain().into_iter().partition(|r| r.mode == InstanceMode::Individual);

        self.context.release_objects(chunk);
        chunk.placements = individual;
        let visible = chunk.is_visible();
        if visible {
            self.context.spawn_objects(chunk);
        }
        chunk.mark_placed(index);
        self.context.batches.replace(coord, build_batches(&batched), visible);
    }

    pub fn events(&self) -> &[ChunkEvent] {
        &self.events
    }

    pub fn chunk(&self, coord: GridCoord) -> Option<&ChunkState> {
        self.chunks.get(&coord)
    }

    pub fn chunks(&self) -> impl Iterator<Item = &ChunkState> {
        self.chunks.values()
    }

    pub fn visible_chunks(&self) -> &HashSet<GridCoord> {
        &self.visible
    }

    pub fn chunk_world_size(&self) -> f32 {
        self.chunk_world_size
    }

    pub fn view_radius(&self) -> i32 {
        self.view_radius
    }

    pub fn viewer(&self) -> Vec2 {
        self.viewer
    }

    /// Background jobs not yet applied
    pub fn pending_jobs(&self) -> usize {
        self.dispatcher.pending()
    }

    pub fn context(&self) -> &StreamingContext<R> {
        &self.context
    }

    pub fn renderer(&self) -> &R {
        &self.context.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.context.renderer
    }

    pub fn stats(&self) -> StreamingStats {
        StreamingStats {
            chunks: self.chunks.len(),
            visible: self.visible.len(),
            pending_jobs: self.dispatcher.pending(),
            pooled_objects_created: self.context.pool.created(),
            objects_in_use: self.context.pool.in_use(),
            batched_instances: self.context.batches.active_instances(),
            evicted: self.evicted,
            stale_results: self.stale_results,
        }
    }

    /// Chunks whose height map could not be generated
    pub fn failed_chunks(&self) -> impl Iterator<Item = GridCoord> + '_ {
        self.chunks
            .values()
            .filter(|c| c.phase() == ChunkPhase::Failed)
            .map(|c| c.coord())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Error;
    use crate::mesh::{MeshSettings, ShadingMode};
    use crate::placement::{InstantiateRequest, PlacementRule, PlacementSettings, PlacementTarget};
    use crate::render::{HeadlessRenderer, ObjectHandle};
    use crate::streaming::lod::LodInfo;
    use crate::terrain::generator::HeightMapSettings;
    use std::time::{Duration, Instant};

    /// 48-unit chunks, view distance 96 (window radius 2)
    fn config(rules: Vec<PlacementRule>) -> TerrainConfig {
        TerrainConfig {
            mesh: MeshSettings {
                mesh_scale: 1.0,
                shading: ShadingMode::Smooth,
                chunk_size_index: 0,
                flat_shaded_chunk_size_index: 0,
            },
            height_map: HeightMapSettings { height_multiplier: 5.0, ..Default::default() },
            placement: PlacementSettings { rules, seed: 9, ..Default::default() },
            streaming: StreamingSettings {
                detail_levels: vec![
                    LodInfo::new(0, 30.0),
                    LodInfo::new(1, 60.0),
                    LodInfo::new(2, 96.0),
                ],
                worker_threads: 2,
                ..Default::default()
            },
        }
    }

    fn trees() -> Vec<PlacementRule> {
        vec![PlacementRule {
            name: "trees".into(),
            density: 1.0,
            max_steepness: 90.0,
            target: PlacementTarget::Prefabs(vec![1]),
            ..Default::default()
        }]
    }

    fn manager(rules: Vec<PlacementRule>) -> StreamingManager<HeadlessRenderer> {
        StreamingManager::new(config(rules), HeadlessRenderer::new()).unwrap()
    }

    /// Tick until every background job has been applied; returns all events
    fn settle(manager: &mut StreamingManager<HeadlessRenderer>, viewer: Vec2) -> Vec<ChunkEvent> {
        let deadline = Instant::now() + Duration::from_secs(30);
        let mut events = Vec::new();
        loop {
            manager.tick(viewer);
            events.extend_from_slice(manager.events());
            if manager.pending_jobs() == 0 {
                break;
            }
            assert!(Instant::now() < deadline, "streaming did not settle");
            std::thread::sleep(Duration::from_millis(2));
        }
        events
    }

    #[test]
    fn test_first_tick_fills_window() {
        let mut m = manager(Vec::new());
        m.tick(Vec2::ZERO);
        assert_eq!(m.view_radius(), 2);
        assert_eq!(m.chunks().count(), 25);
        assert!(m.chunk(GridCoord::new(2, -2)).is_some());
        assert!(m.chunk(GridCoord::new(3, 0)).is_none());
        assert_eq!(m.renderer().len(), 25);

        // Nothing is shown before its height map arrives
        for chunk in m.chunks().filter(|c| c.height_map().is_none()) {
            assert!(!chunk.is_visible());
            assert!(!m.renderer().object(chunk.terrain()).unwrap().active);
        }
    }

    #[test]
    fn test_lod_follows_distance() {
        let mut m = manager(Vec::new());
        let events = settle(&mut m, Vec2::ZERO);

        // Viewer inside (0, 0): distance 0
        let center = m.chunk(GridCoord::new(0, 0)).unwrap();
        assert_eq!(center.displayed_lod(), Some(0));
        assert_eq!(center.phase(), ChunkPhase::Placed { lod: 0 });
        // (1, 0) starts 24 units away, (2, 0) 72 units away
        assert_eq!(m.chunk(GridCoord::new(1, 0)).unwrap().displayed_lod(), Some(0));
        assert_eq!(m.chunk(GridCoord::new(2, 0)).unwrap().displayed_lod(), Some(2));
        // (2, 2) corner is ~101.8 away: out of view
        let corner = m.chunk(GridCoord::new(2, 2)).unwrap();
        assert!(!corner.is_visible());
        assert_eq!(corner.displayed_lod(), None);

        assert!(events.contains(&ChunkEvent::VisibilityChanged {
            coord: GridCoord::new(0, 0),
            visible: true
        }));
        assert!(m.visible_chunks().contains(&GridCoord::new(0, 0)));
        assert!(!m.visible_chunks().contains(&GridCoord::new(2, 2)));

        // The edge of (0, 0) is now 36 away: level 1
        settle(&mut m, Vec2::new(-60.0, 0.0));
        let center = m.chunk(GridCoord::new(0, 0)).unwrap();
        assert_eq!(center.displayed_lod(), Some(1));
        // The level 0 mesh stays cached
        assert!(center.mesh(0).is_some());
        assert_eq!(center.mesh(1).unwrap().lod(), 1);
    }

    #[test]
    fn test_collider_attached_once() {
        let mut m = manager(Vec::new());
        let events = settle(&mut m, Vec2::ZERO);

        let ready: Vec<_> = events
            .iter()
            .filter(|e| matches!(e, ChunkEvent::ColliderReady { .. }))
            .collect();
        assert!(ready.contains(&&ChunkEvent::ColliderReady { coord: GridCoord::new(0, 0), lod: 0 }));

        let chunk = m.chunk(GridCoord::new(0, 0)).unwrap();
        assert!(chunk.has_collider());
        let terrain = m.renderer().object(chunk.terrain()).unwrap();
        assert!(terrain.collider.is_some());
        // (2, 0) is 72 units away, beyond the collider distance
        assert!(!m.chunk(GridCoord::new(2, 0)).unwrap().has_collider());

        let attached = m.renderer().stats().colliders_attached;
        let events = settle(&mut m, Vec2::new(1.0, 1.0));
        assert!(!events.iter().any(|e| matches!(e, ChunkEvent::ColliderReady { .. })));
        assert_eq!(m.renderer().stats().colliders_attached, attached);
    }

    #[test]
    fn test_objects_pooled_across_visibility() {
        let mut m = manager(trees());
        settle(&mut m, Vec2::ZERO);

        let coord = GridCoord::new(0, 0);
        let placed = m.chunk(coord).unwrap().objects().len();
        assert!(placed > 0);
        let created = m.context().pool.created();
        assert_eq!(created, m.renderer().prefab_count());

        let old_handles: Vec<ObjectHandle> = m.chunk(coord).unwrap().objects().to_vec();
        let reused_before = m.context().pool.reused();

        // (0, 0) is ~107 away: out of view but still inside the window
        settle(&mut m, Vec2::new(-100.0, -100.0));
        let chunk = m.chunk(coord).unwrap();
        assert!(!chunk.is_visible());
        assert!(chunk.objects().is_empty());

        let pool = &m.context().pool;
        assert_eq!(pool.available(1) + pool.in_use(), pool.created());
        // Newly visible chunks pick up what (0, 0) released
        assert!(pool.reused() > reused_before);
        let owned: HashSet<ObjectHandle> =
            m.chunks().flat_map(|c| c.objects().iter().copied()).collect();
        for handle in &old_handles {
            let active = m.renderer().object(*handle).unwrap().active;
            assert_eq!(active, owned.contains(handle));
        }

        settle(&mut m, Vec2::ZERO);
        let chunk = m.chunk(coord).unwrap();
        assert!(chunk.is_visible());
        assert_eq!(chunk.objects().len(), placed);
        for handle in chunk.objects() {
            assert!(m.renderer().object(*handle).unwrap().active);
        }
        assert!(m.context().pool.reused() >= placed);
        assert_eq!(m.renderer().prefab_count(), m.context().pool.created());
    }

    #[test]
    fn test_batched_rule_fills_batch_table() {
        let rules = vec![PlacementRule {
            name: "grass".into(),
            density: 1.0,
            target: PlacementTarget::Instanced { mesh: 3, material: 1 },
            ..Default::default()
        }];
        let mut m = manager(rules);
        settle(&mut m, Vec2::ZERO);

        let batches = &m.context().batches;
        assert!(batches.is_active(GridCoord::new(0, 0)));
        assert!(!batches.contains(GridCoord::new(2, 2)));
        assert!(m.stats().batched_instances > 0);
        assert_eq!(m.renderer().prefab_count(), 0);
    }

    #[test]
    fn test_far_move_evicts_old_chunks() {
        let mut m = manager(trees());
        settle(&mut m, Vec2::ZERO);
        let old_terrain = m.chunk(GridCoord::new(0, 0)).unwrap().terrain();

        let far = Vec2::new(48.0 * 10.0, 0.0);
        let events = settle(&mut m, far);

        assert!(m.chunk(GridCoord::new(0, 0)).is_none());
        assert!(m.renderer().object(old_terrain).is_none());
        assert!(m.chunk(GridCoord::new(10, 0)).is_some());
        assert_eq!(m.chunks().count(), 25);
        assert!(m.stats().evicted >= 25);
        assert!(events.contains(&ChunkEvent::VisibilityChanged {
            coord: GridCoord::new(0, 0),
            visible: false
        }));
        // Pooled trees from the old area are reused by the new one
        assert!(m.context().pool.reused() > 0);
    }

    #[test]
    fn test_stale_results_dropped() {
        let mut m = manager(Vec::new());
        let coord = GridCoord::new(4, 4);
        m.create_chunk(coord);
        let epoch = m.chunk(coord).unwrap().epoch();

        let bogus = HeightMap::new(3, 3, vec![1.0; 9]);
        m.on_height_map(coord, epoch + 1, Ok(bogus.clone()));
        assert_eq!(m.chunk(coord).unwrap().phase(), ChunkPhase::Pending);

        m.on_height_map(GridCoord::new(50, 50), 0, Ok(bogus));
        assert!(m.chunk(GridCoord::new(50, 50)).is_none());
        assert_eq!(m.stats().stale_results, 2);
    }

    #[test]
    fn test_stale_meshes_dropped() {
        let mut m = manager(Vec::new());
        let coord = GridCoord::new(4, 4);
        m.create_chunk(coord);
        let epoch = m.chunk(coord).unwrap().epoch();
        m.on_height_map(coord, epoch, Ok(HeightMap::new(49, 49, vec![0.0; 49 * 49])));

        // Recreated chunk
        m.on_mesh(coord, epoch + 1, 0, Ok(MeshData::default()));
        assert!(m.chunk(coord).unwrap().mesh(0).is_none());
        // Evicted chunk
        m.on_mesh(GridCoord::new(50, 50), 0, 0, Ok(MeshData::default()));
        assert!(m.chunk(GridCoord::new(50, 50)).is_none());
        assert_eq!(m.stats().stale_results, 2);

        m.on_mesh(coord, epoch, 0, Ok(MeshData::default()));
        assert!(m.chunk(coord).unwrap().mesh(0).is_some());
        assert_eq!(m.stats().stale_results, 2);
    }

    #[test]
    fn test_superseded_placements_dropped() {
        let mut m = manager(trees());
        settle(&mut m, Vec2::ZERO);

        let coord = GridCoord::new(0, 0);
        let chunk = m.chunk(coord).unwrap();
        let epoch = chunk.epoch();
        let generation = chunk.placement_generation();
        let index = chunk.displayed_lod().unwrap();
        let objects = chunk.objects().to_vec();
        assert!(!objects.is_empty());
        let in_use = m.context().pool.in_use();
        let stale = m.stats().stale_results;

        let extra = || {
            let queue = InstantiateQueue::new();
            queue.push(InstantiateRequest {
                target: InstanceTarget::Prefab(1),
                transform: Transform::IDENTITY,
                chunk: coord,
                mode: InstanceMode::Individual,
            });
            queue
        };

        // Older generation
        m.on_placed(coord, epoch, generation - 1, index, extra(), Ok(()));
        // Recreated chunk
        m.on_placed(coord, epoch + 1, generation, index, extra(), Ok(()));

        assert_eq!(m.chunk(coord).unwrap().objects(), objects.as_slice());
        assert_eq!(m.context().pool.in_use(), in_use);
        assert_eq!(m.stats().stale_results, stale + 2);
        assert_eq!(m.chunk(coord).unwrap().phase(), ChunkPhase::Placed { lod: index });

        // The current generation replaces the chunk's objects
        m.on_placed(coord, epoch, generation, index, extra(), Ok(()));
        assert_eq!(m.chunk(coord).unwrap().objects().len(), 1);
        assert_eq!(m.context().pool.in_use(), in_use - objects.len() + 1);
        assert_eq!(m.stats().stale_results, stale + 2);
    }

    #[test]
    fn test_height_map_retries_then_fails() {
        let mut cfg = config(Vec::new());
        cfg.streaming.height_map_retries = 1;
        let mut m = StreamingManager::new(cfg, HeadlessRenderer::new()).unwrap();

        let coord = GridCoord::new(7, 7);
        m.create_chunk(coord);
        let epoch = m.chunk(coord).unwrap().epoch();

        m.on_height_map(coord, epoch, Err(Error::Worker("boom".into())));
        assert_eq!(m.chunk(coord).unwrap().phase(), ChunkPhase::Pending);
        assert_eq!(m.chunk(coord).unwrap().height_attempts, 2);

        m.on_height_map(coord, epoch, Err(Error::Worker("boom".into())));
        assert_eq!(m.chunk(coord).unwrap().phase(), ChunkPhase::Failed);
        assert_eq!(m.failed_chunks().collect::<Vec<_>>(), vec![coord]);
    }

    #[test]
    fn test_small_moves_skip_rescan() {
        let mut m = manager(Vec::new());
        m.tick(Vec2::ZERO);
        let count = m.chunks().count();

        // Below the 25 unit threshold: no new window
        m.tick(Vec2::new(20.0, 0.0));
        assert_eq!(m.chunks().count(), count);
        assert!(m.chunk(GridCoord::new(3, 0)).is_none());

        // Past it the window recenters on (1, 0)
        m.tick(Vec2::new(30.0, 0.0));
        assert!(m.chunk(GridCoord::new(3, 0)).is_some());
    }
}
