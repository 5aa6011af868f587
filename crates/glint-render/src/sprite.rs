//! Draw request values.

use glint_core::geometry::Rect;
use glint_core::math::Vec2;
use glint_device::TextureId;

use crate::color::Color;
use crate::coords::CoordinateSystem;

/// A texture the renderer may sample, with its size in texels.
///
/// The size is needed to turn texel source rects into UVs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpriteTexture {
    pub id: TextureId,
    pub width: u32,
    pub height: u32,
}

impl SpriteTexture {
    pub const fn new(id: TextureId, width: u32, height: u32) -> Self {
        Self { id, width, height }
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32)
    }
}

/// Part of a texture to sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SourceRect {
    /// In texels, origin at the top left.
    Texels(Rect<f32>),
    /// Normalized, `0..1` across the texture.
    Uv(Rect<f32>),
}

impl SourceRect {
    pub const FULL: SourceRect = SourceRect::Uv(Rect::new(0.0, 0.0, 1.0, 1.0));

    /// Normalized rect for a texture of `texture_size` texels.
    pub fn to_uv(self, texture_size: Vec2) -> Rect<f32> {
        match self {
            SourceRect::Uv(rect) => rect,
            SourceRect::Texels(rect) => {
                if texture_size.x <= 0.0 || texture_size.y <= 0.0 {
                    return Rect::new(0.0, 0.0, 0.0, 0.0);
                }
                Rect::from_min_extent(rect.min() / texture_size, rect.extent() / texture_size)
            }
        }
    }
}

impl Default for SourceRect {
    fn default() -> Self {
        Self::FULL
    }
}

/// One quad to draw, built and consumed within a frame.
///
/// ```
/// use glint_render::{Color, CoordinateSystem, DrawRequest};
/// use glint_core::math::Vec2;
///
/// let request = DrawRequest::solid(Vec2::new(0.1, 0.1), Vec2::new(0.2, 0.2))
///     .color(Color::RED)
///     .coordinates(CoordinateSystem::Relative);
/// assert!(request.texture.is_none());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawRequest {
    /// `None` draws a flat-colored quad.
    pub texture: Option<SpriteTexture>,
    pub position: Vec2,
    pub size: Vec2,
    /// Rotation pivot, relative to `position`.
    pub center: Vec2,
    /// Radians, counter-clockwise on screen.
    pub rotation: f32,
    pub source: SourceRect,
    pub color: Color,
    pub coordinates: CoordinateSystem,
}

impl DrawRequest {
    pub fn textured(texture: SpriteTexture, position: Vec2, size: Vec2) -> Self {
        Self {
            texture: Some(texture),
            ..Self::solid(position, size)
        }
    }

    pub fn solid(position: Vec2, size: Vec2) -> Self {
        Self {
            texture: None,
            position,
            size,
            center: Vec2::ZERO,
            rotation: 0.0,
            source: SourceRect::FULL,
            color: Color::WHITE,
            coordinates: CoordinateSystem::Absolute,
        }
    }

    pub fn center(mut self, center: Vec2) -> Self {
        self.center = center;
        self
    }

    pub fn rotation(mut self, radians: f32) -> Self {
        self.rotation = radians;
        self
    }

    pub fn source(mut self, source: SourceRect) -> Self {
        self.source = source;
        self
    }

    pub fn color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn coordinates(mut self, coordinates: CoordinateSystem) -> Self {
        self.coordinates = coordinates;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_texel_source_to_uv() {
        let source = SourceRect::Texels(Rect::new(16.0, 32.0, 16.0, 32.0));
        let uv = source.to_uv(Vec2::new(64.0, 128.0));
        assert_eq!(uv, Rect::new(0.25, 0.25, 0.25, 0.25));
    }

    #[test]
    fn test_uv_source_passes_through() {
        let rect = Rect::new(0.1, 0.2, 0.3, 0.4);
        assert_eq!(SourceRect::Uv(rect).to_uv(Vec2::new(10.0, 10.0)), rect);
    }
}
