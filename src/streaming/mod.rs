//! Viewer-driven chunk streaming and LOD management

pub mod chunk;
pub mod coord;
pub mod dispatcher;
pub mod lod;
pub mod manager;
pub mod settings;

pub use chunk::{ChunkPhase, ChunkState, ChunkUpdate, ColliderUpdate, LodMesh};
pub use coord::GridCoord;
pub use dispatcher::{Completion, WorkerDispatcher};
pub use lod::{default_detail_levels, is_visible, max_view_distance, select_lod, LodInfo};
pub use manager::{ChunkEvent, StreamingContext, StreamingManager, StreamingStats};
pub use settings::StreamingSettings;
