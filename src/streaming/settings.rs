//! Streaming behaviour settings

use serde::{Deserialize, Serialize};

use super::lod::{default_detail_levels, validate_detail_levels, LodInfo};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamingSettings {
    /// Detail bands ordered by distance
    pub detail_levels: Vec<LodInfo>,
    /// Detail level whose mesh becomes the collider
    pub collider_lod_index: usize,
    /// Viewer distance from the chunk bounds at which the collider attaches
    pub collider_distance: f32,
    /// Viewer travel that triggers a full window rescan
    pub viewer_move_threshold: f32,
    /// Worker threads, 0 for one per core
    pub worker_threads: usize,
    /// Extra attempts after a failed height map job
    pub height_map_retries: u32,
}

impl Default for StreamingSettings {
    fn default() -> Self {
        Self {
            detail_levels: default_detail_levels(),
            collider_lod_index: 0,
            collider_distance: 5.0,
            viewer_move_threshold: 25.0,
            worker_threads: 0,
            height_map_retries: 2,
        }
    }
}

impl StreamingSettings {
    pub fn sqr_move_threshold(&self) -> f32 {
        self.viewer_move_threshold * self.viewer_move_threshold
    }

    pub fn sqr_collider_distance(&self) -> f32 {
        self.collider_distance * self.collider_distance
    }

    /// Correct out-of-range values in place
    pub fn validate(&mut self) -> Vec<String> {
        let mut fixes = validate_detail_levels(&mut self.detail_levels);
        if self.collider_lod_index >= self.detail_levels.len() {
            fixes.push(format!("collider lod index {} clamped", self.collider_lod_index));
            self.collider_lod_index = self.detail_levels.len() - 1;
        }
        if !(self.collider_distance >= 0.0) {
            fixes.push(format!("collider distance {} raised to 0", self.collider_distance));
            self.collider_distance = 0.0;
        }
        if !(self.viewer_move_threshold >= 0.0) {
            fixes.push(format!("viewer move threshold {} raised to 0", self.viewer_move_threshold));
            self.viewer_move_threshold = 0.0;
        }
        fixes
    }
}
