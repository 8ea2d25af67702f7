//! Piecewise-linear curve used to reshape normalized noise

use serde::{Deserialize, Serialize};

/// Keyframed curve over `(time, value)` pairs, linear between keys and
/// clamped to the first/last key outside their range.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HeightCurve {
    keys: Vec<(f32, f32)>,
}

impl Default for HeightCurve {
    fn default() -> Self {
        Self::linear()
    }
}

impl HeightCurve {
    /// Create from keys in any order
    pub fn new(mut keys: Vec<(f32, f32)>) -> Self {
        keys.sort_by(|a, b| a.0.total_cmp(&b.0));
        Self { keys }
    }

    /// Identity on 0-1
    pub fn linear() -> Self {
        Self { keys: vec![(0.0, 0.0), (1.0, 1.0)] }
    }

    pub fn keys(&self) -> &[(f32, f32)] {
        &self.keys
    }

    /// Sort keys loaded from config. Returns true if they were out of order.
    pub fn normalize_keys(&mut self) -> bool {
        let sorted = self.keys.windows(2).all(|w| w[0].0 <= w[1].0);
        if !sorted {
            self.keys.sort_by(|a, b| a.0.total_cmp(&b.0));
        }
        !sorted
    }

    /// Evaluate at `t`. An empty curve is the identity.
    pub fn evaluate(&self, t: f32) -> f32 {
        let (Some(first), Some(last)) = (self.keys.first(), self.keys.last()) else {
            return t;
        };
        if t <= first.0 {
            return first.1;
        }
        if t >= last.0 {
            return last.1;
        }

        let next = self.keys.partition_point(|k| k.0 <= t);
        let (t0, v0) = self.keys[next - 1];
        let (t1, v1) = self.keys[next];
        if t1 == t0 {
            return v1;
        }
        v0 + (v1 - v0) * ((t - t0) / (t1 - t0))
    }
}
