//! String layout from per-character metrics.
//!
//! No shaping, kerning or wrapping: every character advances the pen by its
//! own advance, and line separators start a new line.

use bitflags::bitflags;
use glint_core::geometry::Rect;
use glint_core::math::Vec2;

use crate::font::{FontMetrics, GlyphMetrics};

bitflags! {
    /// Placement of a text block inside a rectangle.
    ///
    /// Combine one horizontal and one vertical flag. Missing flags default
    /// to `LEFT` and `TOP`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TextAlignment: u8 {
        const LEFT = 1 << 0;
        const HCENTER = 1 << 1;
        const RIGHT = 1 << 2;
        const TOP = 1 << 3;
        const VCENTER = 1 << 4;
        const BOTTOM = 1 << 5;
    }
}

impl Default for TextAlignment {
    fn default() -> Self {
        TextAlignment::LEFT | TextAlignment::TOP
    }
}

impl TextAlignment {
    /// Top-left corner of a `size` box aligned inside `rect`.
    pub fn place(self, size: Vec2, rect: Rect<f32>) -> Vec2 {
        let x = if self.contains(TextAlignment::HCENTER) {
            rect.x + (rect.width - size.x) * 0.5
        } else if self.contains(TextAlignment::RIGHT) {
            rect.right() - size.x
        } else {
            rect.x
        };
        let y = if self.contains(TextAlignment::VCENTER) {
            rect.y + (rect.height - size.y) * 0.5
        } else if self.contains(TextAlignment::BOTTOM) {
            rect.bottom() - size.y
        } else {
            rect.y
        };
        Vec2::new(x, y)
    }
}

/// Whether `ch` ends a line. `\r\n` is handled by the caller.
pub fn is_line_separator(ch: char) -> bool {
    matches!(ch, '\n' | '\r' | '\u{2028}')
}

/// One character of a laid out string.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphPlacement {
    pub ch: char,
    /// Pen position at the top of the glyph's line.
    pub origin: Vec2,
    /// Ink rect. Empty for whitespace.
    pub quad: Rect<f32>,
}

impl GlyphPlacement {
    pub fn has_ink(&self) -> bool {
        self.quad.width > 0.0 && self.quad.height > 0.0
    }
}

/// Metrics of a laid out string.
///
/// The layout box (`top_left`, `size`) spans the lines without trailing
/// whitespace. Overhangs are how far the ink spills outside of it; negative
/// values mean the ink stays inside.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextLayout {
    pub top_left: Vec2,
    pub size: Vec2,
    /// Layout box including trailing whitespace.
    pub layout_size: Vec2,
    pub overhang_left: f32,
    pub overhang_right: f32,
    pub overhang_top: f32,
    pub overhang_bottom: f32,
    pub width_including_trailing_whitespace: f32,
    pub line_count: usize,
    pub glyphs: Vec<GlyphPlacement>,
}

impl TextLayout {
    /// The same layout moved so its box starts at `top_left`.
    pub fn at(&self, top_left: Vec2) -> TextLayout {
        let delta = top_left - self.top_left;
        TextLayout {
            top_left,
            glyphs: self
                .glyphs
                .iter()
                .map(|glyph| GlyphPlacement {
                    origin: glyph.origin + delta,
                    quad: Rect::from_min_extent(glyph.quad.min() + delta, glyph.quad.extent()),
                    ..*glyph
                })
                .collect(),
            ..self.clone()
        }
    }

    /// The same layout scaled by `factor` around its top-left corner.
    pub fn scaled(&self, factor: f32) -> TextLayout {
        let origin = self.top_left;
        let scale = |p: Vec2| origin + (p - origin) * factor;
        TextLayout {
            top_left: origin,
            size: self.size * factor,
            layout_size: self.layout_size * factor,
            overhang_left: self.overhang_left * factor,
            overhang_right: self.overhang_right * factor,
            overhang_top: self.overhang_top * factor,
            overhang_bottom: self.overhang_bottom * factor,
            width_including_trailing_whitespace: self.width_including_trailing_whitespace
                * factor,
            line_count: self.line_count,
            glyphs: self
                .glyphs
                .iter()
                .map(|glyph| GlyphPlacement {
                    ch: glyph.ch,
                    origin: scale(glyph.origin),
                    quad: Rect::from_min_extent(
                        scale(glyph.quad.min()),
                        glyph.quad.extent() * factor,
                    ),
                })
                .collect(),
        }
    }

    /// Box covering every glyph's ink, or the layout box if there is none.
    pub fn ink_bounds(&self) -> Rect<f32> {
        Rect::new(
            self.top_left.x - self.overhang_left,
            self.top_left.y - self.overhang_top,
            self.size.x + self.overhang_left + self.overhang_right,
            self.size.y + self.overhang_top + self.overhang_bottom,
        )
    }
}

/// Lay out `text` with its box at the origin.
pub fn layout_text(
    text: &str,
    font: FontMetrics,
    mut metrics: impl FnMut(char) -> GlyphMetrics,
) -> TextLayout {
    if text.is_empty() {
        return TextLayout::default();
    }

    let mut glyphs = Vec::with_capacity(text.len());
    let mut width = 0.0f32;
    let mut width_with_whitespace = 0.0f32;
    let mut ink_min = Vec2::splat(f32::INFINITY);
    let mut ink_max = Vec2::splat(f32::NEG_INFINITY);

    let mut line = 0usize;
    let mut pen_x = 0.0f32;
    let mut ink_end = 0.0f32;
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        if is_line_separator(ch) {
            if ch == '\r' && chars.peek() == Some(&'\n') {
                chars.next();
            }
            width = width.max(ink_end);
            width_with_whitespace = width_with_whitespace.max(pen_x);
            line += 1;
            pen_x = 0.0;
            ink_end = 0.0;
            continue;
        }

        let glyph = metrics(ch);
        let line_top = line as f32 * font.line_height;
        let quad = Rect::new(
            pen_x + glyph.bearing_x,
            line_top + font.ascent - glyph.bearing_y,
            glyph.width,
            glyph.height,
        );
        let placement = GlyphPlacement {
            ch,
            origin: Vec2::new(pen_x, line_top),
            quad,
        };
        if placement.has_ink() {
            ink_min = ink_min.min(quad.min());
            ink_max = ink_max.max(quad.min() + quad.extent());
        }
        glyphs.push(placement);

        pen_x += glyph.advance;
        if !ch.is_whitespace() {
            ink_end = pen_x;
        }
    }
    width = width.max(ink_end);
    width_with_whitespace = width_with_whitespace.max(pen_x);

    let line_count = line + 1;
    let height = line_count as f32 * font.line_height;
    let (overhang_left, overhang_top, overhang_right, overhang_bottom) = if ink_min.x.is_finite() {
        (
            -ink_min.x,
            -ink_min.y,
            ink_max.x - width,
            ink_max.y - height,
        )
    } else {
        (0.0, 0.0, 0.0, 0.0)
    };

    TextLayout {
        top_left: Vec2::ZERO,
        size: Vec2::new(width, height),
        layout_size: Vec2::new(width_with_whitespace, height),
        overhang_left,
        overhang_right,
        overhang_top,
        overhang_bottom,
        width_including_trailing_whitespace: width_with_whitespace,
        line_count,
        glyphs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FONT: FontMetrics = FontMetrics {
        line_height: 20.0,
        ascent: 16.0,
        descent: 4.0,
    };

    fn mono(ch: char) -> GlyphMetrics {
        if ch.is_whitespace() {
            return GlyphMetrics {
                advance: 10.0,
                ..GlyphMetrics::default()
            };
        }
        GlyphMetrics {
            advance: 10.0,
            bearing_x: 1.0,
            bearing_y: 12.0,
            width: 8.0,
            height: 12.0,
        }
    }

    #[test]
    fn test_single_line() {
        let layout = layout_text("AB", FONT, mono);
        assert_eq!(layout.line_count, 1);
        assert_eq!(layout.size, Vec2::new(20.0, 20.0));
        assert_eq!(layout.glyphs[1].origin, Vec2::new(10.0, 0.0));
        assert_eq!(layout.glyphs[1].quad, Rect::new(11.0, 4.0, 8.0, 12.0));
        assert_eq!(layout.overhang_left, -1.0);
        assert_eq!(layout.overhang_top, -4.0);
        assert_eq!(layout.overhang_right, -1.0);
        assert_eq!(layout.overhang_bottom, -4.0);
    }

    #[test]
    fn test_trailing_whitespace() {
        let layout = layout_text("A  ", FONT, mono);
        assert_eq!(layout.size.x, 10.0);
        assert_eq!(layout.width_including_trailing_whitespace, 30.0);
        assert_eq!(layout.layout_size, Vec2::new(30.0, 20.0));
    }

    #[test]
    fn test_line_separators() {
        let layout = layout_text("AB\nC\r\nDEF\rG\u{2028}H", FONT, mono);
        assert_eq!(layout.line_count, 5);
        assert_eq!(layout.size, Vec2::new(30.0, 100.0));
        let h = layout.glyphs.iter().find(|g| g.ch == 'H').unwrap();
        assert_eq!(h.origin, Vec2::new(0.0, 80.0));
        // Separators produce no placements.
        assert_eq!(layout.glyphs.len(), 8);
    }

    #[test]
    fn test_trailing_newline_adds_a_line() {
        let layout = layout_text("A\n", FONT, mono);
        assert_eq!(layout.line_count, 2);
        assert_eq!(layout.size.y, 40.0);
    }

    #[test]
    fn test_empty_text() {
        let layout = layout_text("", FONT, mono);
        assert_eq!(layout.line_count, 0);
        assert_eq!(layout.size, Vec2::ZERO);
    }

    #[test]
    fn test_at_and_scaled() {
        let layout = layout_text("AB", FONT, mono);
        let moved = layout.at(Vec2::new(5.0, 7.0));
        assert_eq!(moved.glyphs[0].quad.min(), Vec2::new(6.0, 11.0));
        assert_eq!(moved.size, layout.size);

        let big = layout.scaled(2.0);
        assert_eq!(big.size, Vec2::new(40.0, 40.0));
        assert_eq!(big.glyphs[1].quad, Rect::new(22.0, 8.0, 16.0, 24.0));
        assert_eq!(big.overhang_left, -2.0);
    }

    #[test]
    fn test_alignment_place() {
        let rect = Rect::new(10.0, 10.0, 100.0, 50.0);
        let size = Vec2::new(20.0, 10.0);
        assert_eq!(TextAlignment::default().place(size, rect), Vec2::new(10.0, 10.0));
        assert_eq!(
            (TextAlignment::RIGHT | TextAlignment::BOTTOM).place(size, rect),
            Vec2::new(90.0, 50.0)
        );
        assert_eq!(
            (TextAlignment::HCENTER | TextAlignment::VCENTER).place(size, rect),
            Vec2::new(50.0, 30.0)
        );
        // Wider than the rect: overflows to the left, never wraps.
        assert_eq!(
            TextAlignment::RIGHT.place(Vec2::new(150.0, 10.0), rect),
            Vec2::new(-40.0, 10.0)
        );
    }
}
