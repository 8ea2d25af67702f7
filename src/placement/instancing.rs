//! Chunk-keyed GPU instance batches

use std::collections::HashMap;

use bytemuck::{Pod, Zeroable};

use super::request::{InstanceTarget, InstantiateRequest};
use crate::core::Transform;
use crate::render::{InstancedMeshId, MaterialId};
use crate::streaming::coord::GridCoord;

/// Largest number of instances drawn by one instanced call
pub const MAX_INSTANCES_PER_BATCH: usize = 1000;

/// Per-instance data uploaded to the GPU (column-major model matrix)
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct InstanceRaw {
    pub model: [[f32; 4]; 4],
}

impl InstanceRaw {
    pub fn from_transform(transform: &Transform) -> Self {
        Self { model: transform.to_matrix().to_cols_array_2d() }
    }
}

/// Instanced mesh and material pair sharing one draw
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BatchKey {
    pub mesh: InstancedMeshId,
    pub material: MaterialId,
}

/// Batches of one chunk, grouped by draw key
pub type ChunkBatches = HashMap<BatchKey, Vec<Vec<InstanceRaw>>>;

/// Group batched requests into draw lists of at most
/// `MAX_INSTANCES_PER_BATCH`. Individual requests are ignored.
pub fn build_batches<'a>(requests: impl IntoIterator<Item = &'a InstantiateRequest>) -> ChunkBatches {
    let mut batches = ChunkBatches::new();
    for request in requests {
        let InstanceTarget::Instanced { mesh, material } = request.target else {
            continue;
        };
        let lists = batches.entry(BatchKey { mesh, material }).or_default();
        if lists.last().is_none_or(|b| b.len() >= MAX_INSTANCES_PER_BATCH) {
            lists.push(Vec::with_capacity(MAX_INSTANCES_PER_BATCH));
        }
        if let Some(batch) = lists.last_mut() {
            batch.push(InstanceRaw::from_transform(&request.transform));
        }
    }
    batches
}

/// Instance batches for every chunk, split into drawn and hidden sets
#[derive(Debug, Default)]
pub struct GpuBatchTable {
    active: HashMap<GridCoord, ChunkBatches>,
    hidden: HashMap<GridCoord, ChunkBatches>,
}

impl GpuBatchTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace a chunk's batches. Empty results remove the chunk.
    pub fn replace(&mut self, coord: GridCoord, batches: ChunkBatches, visible: bool) {
        self.remove(coord);
        if batches.is_empty() {
            return;
        }
        if visible {
            self.active.insert(coord, batches);
        } else {
            self.hidden.insert(coord, batches);
        }
    }

    /// Move a chunk's batches between the drawn and hidden sets
    pub fn set_visible(&mut self, coord: GridCoord, visible: bool) {
        let (from, to) = if visible {
            (&mut self.hidden, &mut self.active)
        } else {
            (&mut self.active, &mut self.hidden)
        };
        if let Some(batches) = from.remove(&coord) {
            to.insert(coord, batches);
        }
    }

    pub fn remove(&mut self, coord: GridCoord) {
        self.active.remove(&coord);
        self.hidden.remove(&coord);
    }

    pub fn is_active(&self, coord: GridCoord) -> bool {
        self.active.contains_key(&coord)
    }

    pub fn contains(&self, coord: GridCoord) -> bool {
        self.active.contains_key(&coord) || self.hidden.contains_key(&coord)
    }

    /// Every drawable batch
    pub fn iter_active(&self) -> impl Iterator<Item = (GridCoord, BatchKey, &[InstanceRaw])> {
        self.active.iter().flat_map(|(&coord, groups)| {
            groups.iter().flat_map(move |(&key, lists)| {
                lists.iter().map(move |batch| (coord, key, batch.as_slice()))
            })
        })
    }

    /// Drawable instances across all chunks
    pub fn active_instances(&self) -> usize {
        self.iter_active().map(|(_, _, batch)| batch.len()).sum()
    }
}
