//! Terrain configuration
//!
//! Every section is optional in the JSON file; missing values take their
//! defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::types::Result;
use crate::mesh::MeshSettings;
use crate::placement::PlacementSettings;
use crate::streaming::settings::StreamingSettings;
use crate::terrain::generator::HeightMapSettings;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    pub mesh: MeshSettings,
    pub height_map: HeightMapSettings,
    pub placement: PlacementSettings,
    pub streaming: StreamingSettings,
}

impl TerrainConfig {
    /// Correct out-of-range values in place, logging each correction
    pub fn validate(&mut self) -> Vec<String> {
        let mut fixes = self.mesh.validate();
        fixes.extend(self.height_map.validate());
        fixes.extend(self.placement.validate());
        fixes.extend(self.streaming.validate());
        for fix in &fixes {
            log::warn!("Config corrected: {}", fix);
        }
        fixes
    }

    /// Copy with every value corrected
    pub fn validated(&self) -> Self {
        let mut config = self.clone();
        config.validate();
        config
    }

    pub fn load_json(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&json)?;
        log::info!("Loaded terrain config from {}", path.display());
        Ok(config)
    }

    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)?;
        Ok(())
    }
}
