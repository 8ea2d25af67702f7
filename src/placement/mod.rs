//! Object scattering, pooling and GPU instancing

pub mod engine;
pub mod instancing;
pub mod pool;
pub mod request;
pub mod rule;

pub use engine::{cell_fitness, passes_density, PlacementEngine};
pub use instancing::{build_batches, BatchKey, ChunkBatches, GpuBatchTable, InstanceRaw, MAX_INSTANCES_PER_BATCH};
pub use pool::ObjectPool;
pub use request::{InstanceMode, InstanceTarget, InstantiateQueue, InstantiateRequest};
pub use rule::{PlacementRule, PlacementSettings, PlacementTarget, ScaleMode};
