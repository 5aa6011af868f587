//! Bounded quad accumulation.
//!
//! A batch collects quads that share one pipeline and one texture. It is
//! turned into exactly one indexed draw when flushed.

use glint_core::geometry::Rect;
use glint_core::math::Vec2;
use glint_device::TextureId;

use crate::color::Color;
use crate::vertex::{ColorVertex, TexturedVertex, VERTICES_PER_QUAD};

/// What the quads of a batch have in common.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BatchKey {
    Solid,
    Textured(TextureId),
}

impl BatchKey {
    pub fn texture(self) -> Option<TextureId> {
        match self {
            BatchKey::Solid => None,
            BatchKey::Textured(id) => Some(id),
        }
    }
}

/// Why a batch was turned into a draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushReason {
    Full,
    KeyChange,
    EndOfFrame,
    Explicit,
}

/// One quad in pixel space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quad {
    /// TL, TR, BL, BR.
    pub corners: [Vec2; 4],
    /// Normalized source rect. Ignored by solid batches.
    pub uv: Rect<f32>,
    pub color: Color,
}

impl Quad {
    fn uv_corners(&self) -> [[f32; 2]; 4] {
        let Rect {
            x,
            y,
            width,
            height,
        } = self.uv;
        [
            [x, y],
            [x + width, y],
            [x, y + height],
            [x + width, y + height],
        ]
    }
}

#[derive(Debug)]
pub struct Batch {
    capacity: usize,
    key: Option<BatchKey>,
    solid: Vec<ColorVertex>,
    textured: Vec<TexturedVertex>,
}

impl Batch {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            key: None,
            solid: Vec::with_capacity(capacity * VERTICES_PER_QUAD),
            textured: Vec::with_capacity(capacity * VERTICES_PER_QUAD),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Key of the quads currently held, `None` when empty.
    pub fn key(&self) -> Option<BatchKey> {
        self.key
    }

    /// Number of quads held.
    pub fn len(&self) -> usize {
        (self.solid.len() + self.textured.len()) / VERTICES_PER_QUAD
    }

    pub fn is_empty(&self) -> bool {
        self.key.is_none()
    }

    pub fn is_full(&self) -> bool {
        self.len() >= self.capacity
    }

    /// Whether pushing a quad with `key` requires flushing first.
    pub fn flush_reason(&self, key: BatchKey) -> Option<FlushReason> {
        match self.key {
            None => None,
            Some(current) if current != key => Some(FlushReason::KeyChange),
            Some(_) if self.is_full() => Some(FlushReason::Full),
            Some(_) => None,
        }
    }

    /// Append a quad. The caller must have flushed if
    /// [`flush_reason`](Self::flush_reason) asked for it.
    pub fn push(&mut self, key: BatchKey, quad: &Quad) {
        debug_assert!(self.flush_reason(key).is_none());
        self.key = Some(key);
        let color = quad.color.to_array();
        match key {
            BatchKey::Solid => {
                self.solid.extend(quad.corners.map(|corner| ColorVertex {
                    position: corner.to_array(),
                    color,
                }));
            }
            BatchKey::Textured(_) => {
                let uvs = quad.uv_corners();
                for (corner, tex_coords) in quad.corners.iter().zip(uvs) {
                    self.textured.push(TexturedVertex {
                        position: corner.to_array(),
                        tex_coords,
                        color,
                    });
                }
            }
        }
    }

    /// Raw vertex data in the layout of the current key.
    pub fn vertex_bytes(&self) -> &[u8] {
        match self.key {
            Some(BatchKey::Solid) => bytemuck::cast_slice(&self.solid),
            Some(BatchKey::Textured(_)) => bytemuck::cast_slice(&self.textured),
            None => &[],
        }
    }

    pub fn clear(&mut self) {
        self.key = None;
        self.solid.clear();
        self.textured.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad(x: f32) -> Quad {
        Quad {
            corners: [
                Vec2::new(x, 0.0),
                Vec2::new(x + 1.0, 0.0),
                Vec2::new(x, 1.0),
                Vec2::new(x + 1.0, 1.0),
            ],
            uv: Rect::new(0.0, 0.0, 1.0, 1.0),
            color: Color::WHITE,
        }
    }

    #[test]
    fn test_fills_then_asks_for_flush() {
        let mut batch = Batch::new(2);
        assert_eq!(batch.flush_reason(BatchKey::Solid), None);
        batch.push(BatchKey::Solid, &quad(0.0));
        batch.push(BatchKey::Solid, &quad(1.0));
        assert!(batch.is_full());
        assert_eq!(batch.flush_reason(BatchKey::Solid), Some(FlushReason::Full));
        assert_eq!(batch.vertex_bytes().len(), 2 * 4 * 24);
    }

    #[test]
    fn test_key_change_wins_over_full() {
        let mut batch = Batch::new(1);
        batch.push(BatchKey::Solid, &quad(0.0));
        let textured = BatchKey::Textured(TextureId::from_raw(3));
        assert_eq!(batch.flush_reason(textured), Some(FlushReason::KeyChange));
        batch.clear();
        assert!(batch.is_empty());
        batch.push(textured, &quad(0.0));
        assert_eq!(batch.vertex_bytes().len(), 4 * 32);
    }

    #[test]
    fn test_textured_uv_corners() {
        let mut batch = Batch::new(4);
        let mut q = quad(0.0);
        q.uv = Rect::new(0.25, 0.5, 0.25, 0.5);
        batch.push(BatchKey::Textured(TextureId::from_raw(1)), &q);
        let vertices: &[TexturedVertex] = bytemuck::cast_slice(batch.vertex_bytes());
        assert_eq!(vertices[0].tex_coords, [0.25, 0.5]);
        assert_eq!(vertices[3].tex_coords, [0.5, 1.0]);
    }
}
