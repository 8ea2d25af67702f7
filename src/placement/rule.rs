//! Placement rules and settings

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::request::InstanceMode;
use crate::render::{InstancedMeshId, MaterialId, PrefabId};

/// Largest angle in degrees between a surface normal and up that still
/// accepts a placement
pub const DEFAULT_MAX_NORMAL_ANGLE: f32 = 30.0;

/// How instance scale is chosen
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum ScaleMode {
    Fixed(f32),
    /// Uniform integer in `[min, max]`
    Random { min: i32, max: i32 },
}

impl Default for ScaleMode {
    fn default() -> Self {
        ScaleMode::Fixed(1.0)
    }
}

impl ScaleMode {
    pub fn sample<R: Rng>(&self, rng: &mut R) -> f32 {
        match *self {
            ScaleMode::Fixed(scale) => scale,
            ScaleMode::Random { min, max } => {
                let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
                rng.random_range(lo..=hi) as f32
            }
        }
    }
}

/// What a rule spawns
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum PlacementTarget {
    /// Individual objects, one prefab picked uniformly per placement
    Prefabs(Vec<PrefabId>),
    /// Transforms collected into GPU instance batches
    Instanced { mesh: InstancedMeshId, material: MaterialId },
}

impl Default for PlacementTarget {
    fn default() -> Self {
        PlacementTarget::Prefabs(Vec::new())
    }
}

/// Where and how densely one kind of object is scattered
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementRule {
    pub name: String,
    /// 0 places nothing, 1 places on every accepted cell
    pub density: f32,
    /// Normalized height band (0-1)
    pub min_height: f32,
    pub max_height: f32,
    /// Steepness band in degrees
    pub min_steepness: f32,
    pub max_steepness: f32,
    pub height_weight: f32,
    pub noise_weight: f32,
    pub noise_scale: f32,
    pub scale: ScaleMode,
    pub target: PlacementTarget,
}

impl Default for PlacementRule {
    fn default() -> Self {
        Self {
            name: String::new(),
            density: 0.5,
            min_height: 0.0,
            max_height: 1.0,
            min_steepness: 0.0,
            max_steepness: 90.0,
            height_weight: 0.5,
            noise_weight: 0.5,
            noise_scale: 0.1,
            scale: ScaleMode::default(),
            target: PlacementTarget::default(),
        }
    }
}

impl PlacementRule {
    pub fn instance_mode(&self) -> InstanceMode {
        match self.target {
            PlacementTarget::Prefabs(_) => InstanceMode::Individual,
            PlacementTarget::Instanced { .. } => InstanceMode::GpuBatched,
        }
    }

    /// Whether a normalized height and steepness fall inside both bands
    pub fn accepts(&self, normalized_height: f32, steepness: f32) -> bool {
        (self.min_height..=self.max_height).contains(&normalized_height)
            && (self.min_steepness..=self.max_steepness).contains(&steepness)
    }

    /// Correct out-of-range values in place
    pub fn validate(&mut self) -> Vec<String> {
        let mut fixes = Vec::new();
        if !(0.0..=1.0).contains(&self.density) {
            let clamped = self.density.clamp(0.0, 1.0);
            fixes.push(format!("rule '{}': density {} clamped to {}", self.name, self.density, clamped));
            self.density = clamped;
        }
        if self.min_height > self.max_height {
            fixes.push(format!("rule '{}': height band swapped", self.name));
            std::mem::swap(&mut self.min_height, &mut self.max_height);
        }
        if self.min_steepness > self.max_steepness {
            fixes.push(format!("rule '{}': steepness band swapped", self.name));
            std::mem::swap(&mut self.min_steepness, &mut self.max_steepness);
        }
        fixes
    }
}

/// All placement rules plus the seed shared by their random streams
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementSettings {
    pub rules: Vec<PlacementRule>,
    pub seed: u64,
    pub max_normal_angle: f32,
}

impl Default for PlacementSettings {
    fn default() -> Self {
        Self {
            rules: Vec::new(),
            seed: 0,
            max_normal_angle: DEFAULT_MAX_NORMAL_ANGLE,
        }
    }
}

impl PlacementSettings {
    pub fn validate(&mut self) -> Vec<String> {
        self.rules.iter_mut().flat_map(|rule| rule.validate()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_scale_modes() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(ScaleMode::Fixed(2.5).sample(&mut rng), 2.5);
        for _ in 0..50 {
            let s = ScaleMode::Random { min: 2, max: 4 }.sample(&mut rng);
            assert!(s == 2.0 || s == 3.0 || s == 4.0);
            let r = ScaleMode::Random { min: 4, max: 2 }.sample(&mut rng);
            assert!((2.0..=4.0).contains(&r));
        }
    }

    #[test]
    fn test_instance_mode() {
        let rule = PlacementRule::default();
        assert_eq!(rule.instance_mode(), InstanceMode::Individual);
        let batched = PlacementRule {
            target: PlacementTarget::Instanced { mesh: 0, material: 0 },
            ..Default::default()
        };
        assert_eq!(batched.instance_mode(), InstanceMode::GpuBatched);
    }

    #[test]
    fn test_bands() {
        let rule = PlacementRule {
            min_height: 0.2,
            max_height: 0.6,
            min_steepness: 5.0,
            max_steepness: 20.0,
            ..Default::default()
        };
        assert!(rule.accepts(0.4, 10.0));
        assert!(!rule.accepts(0.1, 10.0));
        assert!(!rule.accepts(0.4, 25.0));
        assert!(!rule.accepts(0.4, 0.0));
    }

    #[test]
    fn test_validate() {
        let mut settings = PlacementSettings {
            rules: vec![PlacementRule {
                name: "rocks".into(),
                density: 1.5,
                min_height: 0.8,
                max_height: 0.2,
                ..Default::default()
            }],
            ..Default::default()
        };
        assert_eq!(settings.validate().len(), 2);
        assert_eq!(settings.rules[0].density, 1.0);
        assert_eq!(settings.rules[0].min_height, 0.2);
        assert_eq!(settings.rules[0].max_height, 0.8);
    }
}
