//! Distance-based level of detail selection
//!
//! A chunk picks its detail level from an ordered list of [`LodInfo`]
//! thresholds. The chunk stays visible while the viewer is within the last
//! threshold, so that threshold is also the view distance.

use serde::{Deserialize, Serialize};

use crate::mesh::NUM_SUPPORTED_LODS;

/// One detail level
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LodInfo {
    /// Mesh LOD (stride index) used inside this band
    pub lod: usize,
    /// Distance from the chunk bounds up to which this band applies
    pub visible_distance: f32,
}

impl LodInfo {
    pub const fn new(lod: usize, visible_distance: f32) -> Self {
        Self { lod, visible_distance }
    }

    pub fn sqr_visible_distance(&self) -> f32 {
        self.visible_distance * self.visible_distance
    }
}

/// Three bands sized for the default 600-unit chunks
pub fn default_detail_levels() -> Vec<LodInfo> {
    vec![LodInfo::new(0, 300.0), LodInfo::new(1, 600.0), LodInfo::new(3, 1200.0)]
}

/// Largest distance at which chunks are visible
///
/// # Examples
/// ```
/// use terrastream::streaming::lod::{max_view_distance, LodInfo};
///
/// let levels = [LodInfo::new(0, 50.0), LodInfo::new(2, 150.0)];
/// assert_eq!(max_view_distance(&levels), 150.0);
/// assert_eq!(max_view_distance(&[]), 0.0);
/// ```
pub fn max_view_distance(levels: &[LodInfo]) -> f32 {
    levels.last().map_or(0.0, |l| l.visible_distance)
}

/// Index of the detail level for a viewer `distance` from the chunk bounds
///
/// The last level is never exceeded, so callers check visibility first.
///
/// # Examples
/// ```
/// use terrastream::streaming::lod::{select_lod, LodInfo};
///
/// let levels = [LodInfo::new(0, 50.0), LodInfo::new(1, 100.0), LodInfo::new(2, 150.0)];
/// assert_eq!(select_lod(0.0, &levels), 0);
/// assert_eq!(select_lod(50.0, &levels), 0);
/// assert_eq!(select_lod(75.0, &levels), 1);
/// assert_eq!(select_lod(120.0, &levels), 2);
/// ```
pub fn select_lod(distance: f32, levels: &[LodInfo]) -> usize {
    let mut index = 0;
    for i in 0..levels.len().saturating_sub(1) {
        if distance > levels[i].visible_distance {
            index = i + 1;
        } else {
            break;
        }
    }
    index
}

/// Whether a chunk at `distance` is within view
///
/// # Examples
/// ```
/// use terrastream::streaming::lod::{is_visible, LodInfo};
///
/// let levels = [LodInfo::new(0, 50.0), LodInfo::new(1, 100.0)];
/// assert!(is_visible(100.0, &levels));
/// assert!(!is_visible(100.5, &levels));
/// assert!(!is_visible(0.0, &[]));
/// ```
pub fn is_visible(distance: f32, levels: &[LodInfo]) -> bool {
    !levels.is_empty() && distance <= max_view_distance(levels)
}

/// Sort levels by distance, clamp mesh LODs to the supported range and
/// restore the defaults when the list is empty
pub fn validate_detail_levels(levels: &mut Vec<LodInfo>) -> Vec<String> {
    let mut fixes = Vec::new();
    if levels.is_empty() {
        fixes.push("no detail levels configured, using defaults".to_string());
        *levels = default_detail_levels();
        return fixes;
    }
    if levels.windows(2).any(|w| w[0].visible_distance > w[1].visible_distance) {
        fixes.push("detail levels sorted by distance".to_string());
        levels.sort_by(|a, b| a.visible_distance.total_cmp(&b.visible_distance));
    }
    for level in levels.iter_mut() {
        if level.lod >= NUM_SUPPORTED_LODS {
            fixes.push(format!("detail level lod {} clamped to {}", level.lod, NUM_SUPPORTED_LODS - 1));
            level.lod = NUM_SUPPORTED_LODS - 1;
        }
        if !(level.visible_distance >= 0.0) {
            fixes.push(format!("detail level distance {} raised to 0", level.visible_distance));
            level.visible_distance = 0.0;
        }
    }
    fixes
}
