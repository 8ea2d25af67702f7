//! Reuse of scattered objects across chunk regenerations

use std::collections::HashMap;

use crate::render::{ObjectHandle, PrefabId, PrimitiveKind, Renderer};

/// Per-prefab free lists of deactivated renderer objects.
///
/// Released objects are deactivated and kept; the pool never shrinks.
#[derive(Debug, Default)]
pub struct ObjectPool {
    free: HashMap<PrefabId, Vec<ObjectHandle>>,
    live: HashMap<ObjectHandle, PrefabId>,
    created: usize,
    reused: usize,
}

impl ObjectPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take an instance of `prefab`, reactivating a pooled one when possible
    pub fn acquire<R: Renderer + ?Sized>(&mut self, prefab: PrefabId, renderer: &mut R) -> ObjectHandle {
        let handle = match self.free.get_mut(&prefab).and_then(Vec::pop) {
            Some(handle) => {
                renderer.set_active(handle, true);
                self.reused += 1;
                handle
            }
            None => {
                self.created += 1;
                renderer.create_primitive(PrimitiveKind::Prefab(prefab))
            }
        };
        self.live.insert(handle, prefab);
        handle
    }

    /// Deactivate an instance and return it to its prefab's free list.
    /// Returns false for handles the pool did not hand out.
    pub fn release<R: Renderer + ?Sized>(&mut self, handle: ObjectHandle, renderer: &mut R) -> bool {
        let Some(prefab) = self.live.remove(&handle) else {
            log::warn!("Released unknown pooled object {:?}", handle);
            return false;
        };
        renderer.set_active(handle, false);
        self.free.entry(prefab).or_default().push(handle);
        true
    }

    /// Pooled instances ready for reuse
    pub fn available(&self, prefab: PrefabId) -> usize {
        self.free.get(&prefab).map_or(0, Vec::len)
    }

    /// Instances currently handed out
    pub fn in_use(&self) -> usize {
        self.live.len()
    }

    /// Instances ever created through the renderer
    pub fn created(&self) -> usize {
        self.created
    }

    /// Acquisitions served from the free lists
    pub fn reused(&self) -> usize {
        self.reused
    }
}
