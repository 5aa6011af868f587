//! Vertex layouts and quad geometry.

use bytemuck::{Pod, Zeroable};
use glint_core::math::{Vec2, rotate_screen_ccw};
use glint_device::{VertexFormat, VertexLayout};
use static_assertions::const_assert_eq;

/// Vertex of the flat-colored pipeline.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ColorVertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
}

/// Vertex of the textured pipeline.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct TexturedVertex {
    pub position: [f32; 2],
    pub tex_coords: [f32; 2],
    pub color: [f32; 4],
}

const_assert_eq!(std::mem::size_of::<ColorVertex>(), 24);
const_assert_eq!(std::mem::size_of::<TexturedVertex>(), 32);

/// Largest vertex stride; the shared vertex buffer is sized for it.
pub const MAX_VERTEX_STRIDE: u64 = std::mem::size_of::<TexturedVertex>() as u64;

impl ColorVertex {
    pub fn layout() -> VertexLayout {
        VertexLayout::packed(&[VertexFormat::Float32x2, VertexFormat::Float32x4])
    }
}

impl TexturedVertex {
    pub fn layout() -> VertexLayout {
        VertexLayout::packed(&[
            VertexFormat::Float32x2,
            VertexFormat::Float32x2,
            VertexFormat::Float32x4,
        ])
    }
}

/// Index pattern of one quad with corners in TL, TR, BL, BR order.
pub const QUAD_INDICES: [u16; 6] = [0, 1, 2, 2, 1, 3];

pub const VERTICES_PER_QUAD: usize = 4;
pub const INDICES_PER_QUAD: usize = 6;

/// Static index data for `capacity` quads.
pub fn quad_indices(capacity: usize) -> Vec<u16> {
    (0..capacity)
        .flat_map(|quad| {
            let base = (quad * VERTICES_PER_QUAD) as u16;
            QUAD_INDICES.map(|i| base + i)
        })
        .collect()
}

/// Pixel-space corners of a quad, TL, TR, BL, BR.
///
/// Each corner is rotated around `center` (local to the quad) and then moved
/// to `position`.
pub fn quad_corners(position: Vec2, size: Vec2, center: Vec2, rotation: f32) -> [Vec2; 4] {
    let local = [
        Vec2::ZERO,
        Vec2::new(size.x, 0.0),
        Vec2::new(0.0, size.y),
        size,
    ];
    if rotation == 0.0 {
        return local.map(|corner| corner + position);
    }
    local.map(|corner| rotate_screen_ccw(corner - center, rotation) + center + position)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_strides_match_structs() {
        assert_eq!(
            ColorVertex::layout().stride,
            std::mem::size_of::<ColorVertex>() as u64
        );
        assert_eq!(TexturedVertex::layout().stride, MAX_VERTEX_STRIDE);
    }

    #[test]
    fn test_quad_indices() {
        let indices = quad_indices(2);
        assert_eq!(indices, vec![0, 1, 2, 2, 1, 3, 4, 5, 6, 6, 5, 7]);
    }

    #[test]
    fn test_unrotated_corners() {
        let p = Vec2::new(10.0, 20.0);
        let s = Vec2::new(30.0, 40.0);
        let corners = quad_corners(p, s, Vec2::new(15.0, 20.0), 0.0);
        assert_eq!(
            corners,
            [p, p + Vec2::new(30.0, 0.0), p + Vec2::new(0.0, 40.0), p + s]
        );
    }

    #[test]
    fn test_quarter_turn_around_center() {
        let size = Vec2::new(2.0, 2.0);
        let corners = quad_corners(Vec2::ZERO, size, Vec2::ONE, std::f32::consts::FRAC_PI_2);
        // Counter-clockwise on screen: the top-left corner ends up bottom-left.
        assert!((corners[0] - Vec2::new(0.0, 2.0)).length() < 1e-5);
        assert!((corners[1] - Vec2::new(0.0, 0.0)).length() < 1e-5);
        assert!((corners[3] - Vec2::new(2.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_negative_size_is_degenerate_not_panicking() {
        let corners = quad_corners(Vec2::ZERO, Vec2::new(-5.0, 0.0), Vec2::ZERO, 0.0);
        assert_eq!(corners[1], Vec2::new(-5.0, 0.0));
        assert_eq!(corners[2], Vec2::ZERO);
    }
}
