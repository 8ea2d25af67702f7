//! Mathematical utilities and data structures

pub mod aabb;
pub mod rect;

pub use aabb::Aabb;
pub use rect::Rect;

/// Position of `value` between `a` and `b` as a 0-1 fraction, clamped.
/// Returns 0 when the range is empty.
pub fn inverse_lerp(a: f32, b: f32, value: f32) -> f32 {
    if a == b {
        return 0.0;
    }
    ((value - a) / (b - a)).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inverse_lerp() {
        assert_eq!(inverse_lerp(0.0, 10.0, 5.0), 0.5);
        assert_eq!(inverse_lerp(2.0, 4.0, 4.0), 1.0);
        assert_eq!(inverse_lerp(2.0, 4.0, 0.0), 0.0);
        assert_eq!(inverse_lerp(3.0, 3.0, 3.0), 0.0);
    }
}
