//! Composing strings into textured quads.

use std::sync::Arc;

use glint_core::geometry::Rect;
use glint_core::math::Vec2;
use glint_core::profiling::profile_function;
use glint_device::RenderDevice;
use glint_render::{
    Color, CoordinateSystem, DrawRequest, SourceRect, SpriteRenderer, UsageError, map_position,
    map_size,
};

use crate::cache::GlyphCache;
use crate::config::TextRendererConfig;
use crate::error::TextResult;
use crate::font::{CosmicRasterizer, FontAttributes, FontMetrics, GlyphRasterizer};
use crate::layout::{TextAlignment, TextLayout};

/// Where a string is placed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TextAnchor {
    /// Top-left corner of the layout box.
    Point(Vec2),
    /// Layout box aligned inside a rect. Text that does not fit overflows.
    Rect(Rect<f32>, TextAlignment),
}

/// Per-call text settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    /// Rendered size in the style's coordinate system, measured along y.
    /// `None` draws at the rasterized size.
    pub font_size: Option<f32>,
    pub color: Color,
    pub coordinates: CoordinateSystem,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_size: None,
            color: Color::WHITE,
            coordinates: CoordinateSystem::Absolute,
        }
    }
}

impl TextStyle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn size(mut self, font_size: f32) -> Self {
        self.font_size = Some(font_size);
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

/// Draws strings through a [`SpriteRenderer`] using a lazily filled glyph
/// atlas.
///
/// Glyphs are rasterized once at the renderer's base size. Other sizes are
/// drawn by scaling the atlas quads.
pub struct TextRenderer {
    cache: GlyphCache,
    config: TextRendererConfig,
    base_size: f32,
}

impl TextRenderer {
    /// Create a renderer around `rasterizer` and prewarm the atlas.
    pub fn new(
        device: Arc<dyn RenderDevice>,
        rasterizer: impl GlyphRasterizer + 'static,
        config: TextRendererConfig,
    ) -> TextResult<Self> {
        let base_size = rasterizer.font_size();
        let cache = GlyphCache::new(device, rasterizer, &config);
        if let Some(chars) = config.prewarm.as_deref() {
            cache.prewarm(chars)?;
        }
        tracing::info!(
            "{} renderer created at {}px, atlas {:?}",
            config.label,
            base_size,
            cache.atlas_size()
        );
        Ok(Self {
            cache,
            config,
            base_size,
        })
    }

    /// Create a renderer for a system font.
    pub fn with_font(
        device: Arc<dyn RenderDevice>,
        attributes: FontAttributes,
        size: f32,
        config: TextRendererConfig,
    ) -> TextResult<Self> {
        let rasterizer = CosmicRasterizer::with_system_fonts(attributes, size)?;
        Self::new(device, rasterizer, config)
    }

    pub fn config(&self) -> &TextRendererConfig {
        &self.config
    }

    /// Size the glyphs are rasterized at.
    pub fn base_size(&self) -> f32 {
        self.base_size
    }

    pub fn font_metrics(&self) -> FontMetrics {
        self.cache.font_metrics()
    }

    /// Handle to the glyph cache, for prewarming from another thread.
    pub fn cache(&self) -> GlyphCache {
        self.cache.clone()
    }

    /// Lay out `text` at the base size with its box at the origin.
    pub fn measure(&self, text: &str) -> TextLayout {
        self.cache.layout(text)
    }

    /// Lay out `text` for a rendered size of `font_size` pixels.
    pub fn measure_scaled(&self, text: &str, font_size: f32) -> TextLayout {
        self.measure(text).scaled(font_size / self.base_size)
    }

    /// Rasterize any missing characters of `text`.
    pub fn ensure_glyphs(&self, text: &str) -> TextResult<()> {
        self.cache.ensure_glyphs(text)
    }

    /// Draw `text` and return its layout in pixels.
    ///
    /// Must be called while `sprites` is recording a frame. Whitespace and
    /// line separators produce no quads.
    pub fn draw_string(
        &mut self,
        sprites: &mut SpriteRenderer,
        text: &str,
        anchor: TextAnchor,
        style: &TextStyle,
    ) -> TextResult<TextLayout> {
        profile_function!();
        if !sprites.is_recording() {
            return Err(UsageError::NotRecording.into());
        }

        let viewport = sprites.viewport();
        let cs = style.coordinates;
        let font_size = match style.font_size {
            Some(size) => map_size(Vec2::new(0.0, size), cs, viewport).y,
            None => self.base_size,
        };
        let layout = self.measure_scaled(text, font_size);
        let top_left = match anchor {
            TextAnchor::Point(position) => map_position(position, cs, viewport),
            TextAnchor::Rect(rect, alignment) => {
                let rect = Rect::from_min_extent(
                    map_position(rect.min(), cs, viewport),
                    map_size(rect.extent(), cs, viewport),
                );
                alignment.place(layout.size, rect)
            }
        };
        let layout = layout.at(top_left);

        self.cache.ensure_glyphs(text)?;
        let atlas = self.cache.sync_texture()?;
        if let Some(old) = atlas.replaced {
            sprites.retire_texture(old)?;
        }

        let entries = self.cache.glyphs(layout.glyphs.iter().map(|glyph| glyph.ch));
        for (glyph, entry) in layout.glyphs.iter().zip(entries) {
            let Some(entry) = entry.filter(|entry| entry.has_ink()) else {
                continue;
            };
            if !glyph.has_ink() {
                continue;
            }
            let request = DrawRequest::textured(atlas.texture, glyph.quad.min(), glyph.quad.extent())
                .source(SourceRect::Texels(entry.rect.into()))
                .color(style.color);
            sprites.draw(&request)?;
        }
        Ok(layout)
    }

    /// Draw `text` unscaled with its box's top-left at `position` pixels.
    pub fn draw_string_at(
        &mut self,
        sprites: &mut SpriteRenderer,
        text: &str,
        position: Vec2,
        color: Color,
    ) -> TextResult<TextLayout> {
        self.draw_string(
            sprites,
            text,
            TextAnchor::Point(position),
            &TextStyle::new().color(color),
        )
    }

    /// Draw `text` unscaled, aligned inside `rect` pixels.
    pub fn draw_string_in(
        &mut self,
        sprites: &mut SpriteRenderer,
        text: &str,
        rect: Rect<f32>,
        alignment: TextAlignment,
        color: Color,
    ) -> TextResult<TextLayout> {
        self.draw_string(
            sprites,
            text,
            TextAnchor::Rect(rect, alignment),
            &TextStyle::new().color(color),
        )
    }

    /// Hand the atlas texture to `sprites` for release.
    ///
    /// The atlas keeps its glyphs. A later draw uploads it to a new texture.
    pub fn release_texture(&mut self, sprites: &mut SpriteRenderer) -> TextResult<()> {
        if let Some(texture) = self.cache.take_texture() {
            sprites.retire_texture(texture)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_builder() {
        let style = TextStyle::new()
            .size(0.1)
            .color(Color::RED)
            .coordinates(CoordinateSystem::Relative);
        assert_eq!(style.font_size, Some(0.1));
        assert_eq!(style.color, Color::RED);
        assert_eq!(style.coordinates, CoordinateSystem::Relative);
        assert_eq!(TextStyle::default().font_size, None);
    }
}
