/// Fast mathematical operations using SIMD-accelerated `glam` types.
///
/// This module re-exports the [`glam`] crate. Sprite and glyph placement is
/// done in [`Vec2`] and the projection lives in a [`Mat4`].
///
/// ```
/// use glint_core::math::{Vec2, Mat4};
///
/// let position = Vec2::new(10.0, 20.0);
/// let projection = Mat4::orthographic_rh(0.0, 800.0, 600.0, 0.0, 0.0, 1.0);
/// let clip = projection.project_point3(position.extend(0.0));
/// assert!(clip.x < 0.0 && clip.y > 0.0);
/// ```
///
/// [`glam`]: https://docs.rs/glam
pub mod fast {
    pub use glam::*;
}

pub use fast::*;

/// Rotate `v` by `angle` radians, counter-clockwise as seen on a screen
/// whose y axis points down.
#[inline]
pub fn rotate_screen_ccw(v: Vec2, angle: f32) -> Vec2 {
    let (sin, cos) = angle.sin_cos();
    Vec2::new(v.x * cos + v.y * sin, -v.x * sin + v.y * cos)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotate_zero_is_identity() {
        let v = Vec2::new(3.0, -4.0);
        assert_eq!(rotate_screen_ccw(v, 0.0), v);
    }

    #[test]
    fn test_rotate_quarter_turn_points_up() {
        // +x rotated a quarter turn counter-clockwise ends up pointing to the
        // top of the screen, which is -y.
        let r = rotate_screen_ccw(Vec2::X, std::f32::consts::FRAC_PI_2);
        assert!((r - Vec2::new(0.0, -1.0)).length() < 1e-6);
    }
}
