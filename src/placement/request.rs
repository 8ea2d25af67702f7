//! Instancing requests handed from placement workers to the control thread

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::core::Transform;
use crate::render::{InstancedMeshId, MaterialId, PrefabId};
use crate::streaming::coord::GridCoord;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InstanceMode {
    /// One renderer object per placement
    Individual,
    /// Grouped into instanced draws
    GpuBatched,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InstanceTarget {
    Prefab(PrefabId),
    Instanced { mesh: InstancedMeshId, material: MaterialId },
}

/// One accepted placement
#[derive(Clone, Debug, PartialEq)]
pub struct InstantiateRequest {
    pub target: InstanceTarget,
    /// World-space transform
    pub transform: Transform,
    pub chunk: GridCoord,
    pub mode: InstanceMode,
}

/// Thread-safe FIFO of placement requests.
///
/// Cloning shares the underlying queue.
#[derive(Clone, Debug, Default)]
pub struct InstantiateQueue {
    inner: Arc<Mutex<VecDeque<InstantiateRequest>>>,
}

impl InstantiateQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<InstantiateRequest>> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn push(&self, request: InstantiateRequest) {
        self.lock().push_back(request);
    }

    pub fn extend(&self, requests: impl IntoIterator<Item = InstantiateRequest>) {
        self.lock().extend(requests);
    }

    /// Remove every queued request in FIFO order
    pub fn drain(&self) -> Vec<InstantiateRequest> {
        self.lock().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
