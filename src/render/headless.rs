//! In-memory renderer for tests and offline runs

use std::collections::HashMap;
use std::sync::Arc;

use super::{ObjectHandle, PrimitiveKind, Renderer};
use crate::core::Transform;
use crate::mesh::MeshData;

/// State of one object held by [`HeadlessRenderer`]
#[derive(Clone, Debug)]
pub struct HeadlessObject {
    pub kind: PrimitiveKind,
    pub active: bool,
    pub transform: Transform,
    pub mesh: Option<Arc<MeshData>>,
    pub collider: Option<Arc<MeshData>>,
}

/// Running counters
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub created: usize,
    pub destroyed: usize,
    pub mesh_swaps: usize,
    pub colliders_attached: usize,
}

/// Renderer that only records what it was asked to do
#[derive(Debug, Default)]
pub struct HeadlessRenderer {
    objects: HashMap<ObjectHandle, HeadlessObject>,
    next_id: u64,
    stats: RenderStats,
}

impl HeadlessRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn object(&self, handle: ObjectHandle) -> Option<&HeadlessObject> {
        self.objects.get(&handle)
    }

    pub fn objects(&self) -> impl Iterator<Item = (&ObjectHandle, &HeadlessObject)> {
        self.objects.iter()
    }

    /// Number of live objects
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Number of live objects currently active
    pub fn active_count(&self) -> usize {
        self.objects.values().filter(|o| o.active).count()
    }

    /// Number of live prefab instances, active or not
    pub fn prefab_count(&self) -> usize {
        self.objects
            .values()
            .filter(|o| matches!(o.kind, PrimitiveKind::Prefab(_)))
            .count()
    }

    pub fn stats(&self) -> RenderStats {
        self.stats
    }
}

impl Renderer for HeadlessRenderer {
    fn create_primitive(&mut self, kind: PrimitiveKind) -> ObjectHandle {
        let handle = ObjectHandle(self.next_id);
        self.next_id += 1;
        self.stats.created += 1;
        self.objects.insert(
            handle,
            HeadlessObject {
                kind,
                active: true,
                transform: Transform::IDENTITY,
                mesh: None,
                collider: None,
            },
        );
        handle
    }

    fn set_mesh(&mut self, handle: ObjectHandle, mesh: Arc<MeshData>) {
        if let Some(object) = self.objects.get_mut(&handle) {
            object.mesh = Some(mesh);
            self.stats.mesh_swaps += 1;
        }
    }

    fn set_collider(&mut self, handle: ObjectHandle, mesh: Arc<MeshData>) {
        if let Some(object) = self.objects.get_mut(&handle) {
            object.collider = Some(mesh);
            self.stats.colliders_attached += 1;
        }
    }

    fn set_transform(&mut self, handle: ObjectHandle, transform: &Transform) {
        if let Some(object) = self.objects.get_mut(&handle) {
            object.transform = *transform;
        }
    }

    fn set_active(&mut self, handle: ObjectHandle, active: bool) {
        if let Some(object) = self.objects.get_mut(&handle) {
            object.active = active;
        }
    }

    fn destroy(&mut self, handle: ObjectHandle) {
        if self.objects.remove(&handle).is_some() {
            self.stats.destroyed += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Vec3;

    #[test]
    fn test_create_and_destroy() {
        let mut renderer = HeadlessRenderer::new();
        let a = renderer.create_primitive(PrimitiveKind::Prefab(1));
        let b = renderer.create_primitive(PrimitiveKind::Prefab(2));
        assert_ne!(a, b);
        assert_eq!(renderer.len(), 2);
        assert_eq!(renderer.prefab_count(), 2);

        renderer.destroy(a);
        renderer.destroy(a);
        assert_eq!(renderer.len(), 1);
        assert_eq!(renderer.stats().destroyed, 1);
        assert_eq!(renderer.stats().created, 2);
    }

    #[test]
    fn test_state_changes() {
        let mut renderer = HeadlessRenderer::new();
        let handle = renderer.create_primitive(PrimitiveKind::Prefab(0));
        assert_eq!(renderer.active_count(), 1);

        renderer.set_active(handle, false);
        renderer.set_transform(handle, &Transform::from_translation(Vec3::new(1.0, 2.0, 3.0)));
        renderer.set_mesh(handle, Arc::new(MeshData::default()));

        let object = renderer.object(handle).unwrap();
        assert!(!object.active);
        assert_eq!(object.transform.translation, Vec3::new(1.0, 2.0, 3.0));
        assert!(object.mesh.is_some());
        assert!(object.collider.is_none());
        assert_eq!(renderer.active_count(), 0);
        assert_eq!(renderer.stats().mesh_swaps, 1);
    }
}
