//! Renderer capability consumed by the streaming core
//!
//! The streaming core never touches scene objects directly. It asks a
//! [`Renderer`] for opaque handles and drives them through this interface,
//! always from the control thread.

pub mod headless;

pub use headless::{HeadlessObject, HeadlessRenderer, RenderStats};

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::Transform;
use crate::mesh::MeshData;
use crate::streaming::coord::GridCoord;

/// Identifier of a prefab registered with the renderer
pub type PrefabId = u32;

/// Identifier of a mesh drawn through GPU instancing
pub type InstancedMeshId = u32;

/// Identifier of a material used by instanced draws
pub type MaterialId = u32;

/// Opaque handle to a renderer-owned object
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectHandle(pub u64);

/// What a new primitive represents
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    /// Terrain surface of one chunk
    Terrain(GridCoord),
    /// Scattered object instantiated from a prefab
    Prefab(PrefabId),
}

/// Object management surface provided by the host engine
pub trait Renderer {
    /// Create a new, active object
    fn create_primitive(&mut self, kind: PrimitiveKind) -> ObjectHandle;

    /// Swap the visible mesh
    fn set_mesh(&mut self, handle: ObjectHandle, mesh: Arc<MeshData>);

    /// Attach a collision mesh
    fn set_collider(&mut self, handle: ObjectHandle, mesh: Arc<MeshData>);

    fn set_transform(&mut self, handle: ObjectHandle, transform: &Transform);

    fn set_active(&mut self, handle: ObjectHandle, active: bool);

    /// Destroy the object. Unknown handles are ignored.
    fn destroy(&mut self, handle: ObjectHandle);
}
