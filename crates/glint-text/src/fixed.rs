//! A deterministic fixed-cell rasterizer.
//!
//! Every visible character gets the same cell and a coverage pattern derived
//! from its code point. Useful for headless tools and for exercising the
//! atlas without system fonts.

use crate::error::TextResult;
use crate::font::{FontMetrics, GlyphBitmap, GlyphMetrics, GlyphRasterizer};

#[derive(Debug, Clone, PartialEq)]
pub struct FixedRasterizer {
    size: f32,
    advance: f32,
    cell_width: u32,
    cell_height: u32,
    metrics: FontMetrics,
}

impl FixedRasterizer {
    /// Cells proportioned for a font of `size` pixels.
    pub fn new(size: f32) -> Self {
        let size = size.max(1.0);
        let ascent = (size * 0.8).round();
        let descent = (size * 0.2).round();
        let advance = (size * 0.5).round().max(2.0);
        Self {
            size,
            advance,
            cell_width: (advance as u32).saturating_sub(1).max(1),
            cell_height: (ascent as u32).max(1),
            metrics: FontMetrics {
                line_height: ascent + descent,
                ascent,
                descent,
            },
        }
    }

    /// Override the ink cell, keeping the advance.
    pub fn with_cell(mut self, width: u32, height: u32) -> Self {
        self.cell_width = width;
        self.cell_height = height;
        self
    }

    /// Override the pen advance.
    pub fn with_advance(mut self, advance: f32) -> Self {
        self.advance = advance;
        self
    }

    /// Coverage of pixel `index` of `ch`. Never zero, so the ink is visible.
    pub fn coverage(ch: char, index: usize) -> u8 {
        ((ch as u32).wrapping_mul(31).wrapping_add(index as u32 * 7) % 255) as u8 + 1
    }
}

impl GlyphRasterizer for FixedRasterizer {
    fn font_size(&self) -> f32 {
        self.size
    }

    fn font_metrics(&self) -> FontMetrics {
        self.metrics
    }

    fn glyph_metrics(&mut self, ch: char) -> GlyphMetrics {
        if ch.is_whitespace() {
            return GlyphMetrics {
                advance: self.advance,
                ..GlyphMetrics::default()
            };
        }
        GlyphMetrics {
            advance: self.advance,
            bearing_x: 0.0,
            bearing_y: self.cell_height as f32,
            width: self.cell_width as f32,
            height: self.cell_height as f32,
        }
    }

    fn rasterize(&mut self, ch: char) -> TextResult<GlyphBitmap> {
        if ch.is_whitespace() {
            return Ok(GlyphBitmap::default());
        }
        let pixels = (self.cell_width * self.cell_height) as usize;
        Ok(GlyphBitmap {
            width: self.cell_width,
            height: self.cell_height,
            data: (0..pixels).map(|i| Self::coverage(ch, i)).collect(),
        })
    }
}
