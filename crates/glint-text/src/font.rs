//! Fonts and glyph rasterization.

use std::sync::Arc;

use cosmic_text::{
    Attrs, Buffer, CacheKey, FontSystem, Metrics, Shaping, SwashCache, SwashContent, fontdb,
};

use crate::error::{TextError, TextResult};

/// A font database that manages available fonts.
pub struct FontDatabase {
    inner: fontdb::Database,
}

impl FontDatabase {
    /// Create a new font database with system fonts loaded.
    pub fn new() -> Self {
        let mut db = fontdb::Database::new();
        db.load_system_fonts();
        Self { inner: db }
    }

    /// Create an empty font database.
    pub fn empty() -> Self {
        Self {
            inner: fontdb::Database::new(),
        }
    }

    /// Load a font from bytes.
    pub fn load_font_data(&mut self, data: Vec<u8>) {
        self.inner
            .load_font_source(fontdb::Source::Binary(Arc::new(data)));
    }

    /// Load a font from a .ttf or .otf file.
    pub fn load_font_file(&mut self, path: impl AsRef<std::path::Path>) -> TextResult<()> {
        let path = path.as_ref();
        self.inner
            .load_font_file(path)
            .map_err(|e| TextError::FontLoad(format!("{}: {}", path.display(), e)))
    }

    pub fn has_family(&self, family: &str) -> bool {
        self.inner
            .faces()
            .any(|face| face.families.iter().any(|(f, _)| f == family))
    }

    /// All family names, sorted and deduplicated.
    pub fn list_families(&self) -> Vec<String> {
        let mut families: Vec<String> = self
            .inner
            .faces()
            .flat_map(|face| face.families.iter().map(|(family, _)| family.clone()))
            .collect();
        families.sort();
        families.dedup();
        families
    }

    /// Number of font faces loaded.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for FontDatabase {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FontWeight {
    Thin,
    ExtraLight,
    Light,
    #[default]
    Normal,
    Medium,
    SemiBold,
    Bold,
    ExtraBold,
    Black,
}

impl FontWeight {
    fn to_cosmic(self) -> cosmic_text::Weight {
        match self {
            FontWeight::Thin => cosmic_text::Weight::THIN,
            FontWeight::ExtraLight => cosmic_text::Weight::EXTRA_LIGHT,
            FontWeight::Light => cosmic_text::Weight::LIGHT,
            FontWeight::Normal => cosmic_text::Weight::NORMAL,
            FontWeight::Medium => cosmic_text::Weight::MEDIUM,
            FontWeight::SemiBold => cosmic_text::Weight::SEMIBOLD,
            FontWeight::Bold => cosmic_text::Weight::BOLD,
            FontWeight::ExtraBold => cosmic_text::Weight::EXTRA_BOLD,
            FontWeight::Black => cosmic_text::Weight::BLACK,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
    Oblique,
}

impl FontStyle {
    fn to_cosmic(self) -> cosmic_text::Style {
        match self {
            FontStyle::Normal => cosmic_text::Style::Normal,
            FontStyle::Italic => cosmic_text::Style::Italic,
            FontStyle::Oblique => cosmic_text::Style::Oblique,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FontStretch {
    UltraCondensed,
    ExtraCondensed,
    Condensed,
    SemiCondensed,
    #[default]
    Normal,
    SemiExpanded,
    Expanded,
    ExtraExpanded,
    UltraExpanded,
}

impl FontStretch {
    fn to_cosmic(self) -> cosmic_text::Stretch {
        match self {
            FontStretch::UltraCondensed => cosmic_text::Stretch::UltraCondensed,
            FontStretch::ExtraCondensed => cosmic_text::Stretch::ExtraCondensed,
            FontStretch::Condensed => cosmic_text::Stretch::Condensed,
            FontStretch::SemiCondensed => cosmic_text::Stretch::SemiCondensed,
            FontStretch::Normal => cosmic_text::Stretch::Normal,
            FontStretch::SemiExpanded => cosmic_text::Stretch::SemiExpanded,
            FontStretch::Expanded => cosmic_text::Stretch::Expanded,
            FontStretch::ExtraExpanded => cosmic_text::Stretch::ExtraExpanded,
            FontStretch::UltraExpanded => cosmic_text::Stretch::UltraExpanded,
        }
    }
}

/// Which face to rasterize from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontAttributes {
    pub family: String,
    pub weight: FontWeight,
    pub style: FontStyle,
    pub stretch: FontStretch,
}

impl FontAttributes {
    /// Font attributes for a family name. Generic families ("sans-serif",
    /// "serif", "monospace") are accepted too.
    pub fn new(family: impl Into<String>) -> Self {
        Self {
            family: family.into(),
            weight: FontWeight::Normal,
            style: FontStyle::Normal,
            stretch: FontStretch::Normal,
        }
    }

    pub fn sans_serif() -> Self {
        Self::new("sans-serif")
    }

    pub fn serif() -> Self {
        Self::new("serif")
    }

    pub fn monospace() -> Self {
        Self::new("monospace")
    }

    pub fn weight(mut self, weight: FontWeight) -> Self {
        self.weight = weight;
        self
    }

    pub fn style(mut self, style: FontStyle) -> Self {
        self.style = style;
        self
    }

    pub fn stretch(mut self, stretch: FontStretch) -> Self {
        self.stretch = stretch;
        self
    }

    fn to_cosmic(&self) -> Attrs<'_> {
        let family = match self.family.as_str() {
            "sans-serif" => cosmic_text::Family::SansSerif,
            "serif" => cosmic_text::Family::Serif,
            "monospace" => cosmic_text::Family::Monospace,
            name => cosmic_text::Family::Name(name),
        };
        Attrs::new()
            .family(family)
            .weight(self.weight.to_cosmic())
            .style(self.style.to_cosmic())
            .stretch(self.stretch.to_cosmic())
    }

    fn is_generic(&self) -> bool {
        matches!(self.family.as_str(), "sans-serif" | "serif" | "monospace")
    }
}

impl Default for FontAttributes {
    fn default() -> Self {
        Self::sans_serif()
    }
}

/// Vertical metrics of a font at its rasterization size, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FontMetrics {
    pub line_height: f32,
    /// From the top of a line down to the baseline.
    pub ascent: f32,
    /// From the baseline down to the bottom of a line.
    pub descent: f32,
}

/// Horizontal and ink metrics of one glyph, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GlyphMetrics {
    /// Pen advance to the next glyph.
    pub advance: f32,
    /// Pen position to the left edge of the ink.
    pub bearing_x: f32,
    /// Baseline up to the top edge of the ink.
    pub bearing_y: f32,
    /// Ink width; equals the bitmap width.
    pub width: f32,
    /// Ink height; equals the bitmap height.
    pub height: f32,
}

/// Alpha coverage of one glyph, one byte per pixel, rows top to bottom.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GlyphBitmap {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl GlyphBitmap {
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Source of glyph metrics and coverage for one font at one size.
///
/// The glyph cache calls [`glyph_metrics`](Self::glyph_metrics) for layout
/// and [`rasterize`](Self::rasterize) once per character that reaches the
/// atlas. The bitmap size must match the metrics' `width` and `height`.
pub trait GlyphRasterizer: Send {
    /// Size in pixels the glyphs are rasterized at.
    fn font_size(&self) -> f32;

    fn font_metrics(&self) -> FontMetrics;

    fn glyph_metrics(&mut self, ch: char) -> GlyphMetrics;

    fn rasterize(&mut self, ch: char) -> TextResult<GlyphBitmap>;
}

/// Shaped single glyph: advance and the swash cache key of its image.
#[derive(Debug, Clone, Copy)]
struct ShapedGlyph {
    advance: f32,
    offset_x: f32,
    offset_y: f32,
    cache_key: Option<CacheKey>,
}

/// [`GlyphRasterizer`] backed by `cosmic-text` and its swash cache.
pub struct CosmicRasterizer {
    font_system: FontSystem,
    swash_cache: SwashCache,
    attributes: FontAttributes,
    size: f32,
    metrics: FontMetrics,
}

impl CosmicRasterizer {
    /// Rasterizer for `attributes` at `size` pixels.
    ///
    /// A family missing from `db` falls back to the default sans-serif
    /// face. An empty database is an error.
    pub fn new(db: FontDatabase, attributes: FontAttributes, size: f32) -> TextResult<Self> {
        if db.is_empty() {
            return Err(TextError::FontLoad("font database is empty".into()));
        }
        if !(size.is_finite() && size > 0.0) {
            return Err(TextError::FontLoad(format!("invalid font size {}", size)));
        }
        let attributes = if attributes.is_generic() || db.has_family(&attributes.family) {
            attributes
        } else {
            tracing::warn!(
                "font family '{}' not found, falling back to sans-serif",
                attributes.family
            );
            FontAttributes {
                family: "sans-serif".to_string(),
                ..attributes
            }
        };

        let font_system = FontSystem::new_with_locale_and_db(
            sys_locale::get_locale().unwrap_or_else(|| String::from("en-US")),
            db.inner,
        );
        let mut rasterizer = Self {
            font_system,
            swash_cache: SwashCache::new(),
            attributes,
            size,
            metrics: FontMetrics::default(),
        };
        rasterizer.metrics = rasterizer.measure_line()?;
        tracing::info!(
            "loaded font '{}' at {}px (line height {})",
            rasterizer.attributes.family,
            size,
            rasterizer.metrics.line_height
        );
        Ok(rasterizer)
    }

    /// Rasterizer using the system fonts.
    pub fn with_system_fonts(attributes: FontAttributes, size: f32) -> TextResult<Self> {
        Self::new(FontDatabase::new(), attributes, size)
    }

    pub fn attributes(&self) -> &FontAttributes {
        &self.attributes
    }

    fn buffer(&mut self, text: &str) -> Buffer {
        let line_height = (self.size * 1.2).ceil();
        let mut buffer = Buffer::new(&mut self.font_system, Metrics::new(self.size, line_height));
        buffer.set_size(&mut self.font_system, None, None);
        buffer.set_text(
            &mut self.font_system,
            text,
            self.attributes.to_cosmic(),
            Shaping::Advanced,
        );
        buffer.shape_until_scroll(&mut self.font_system, false);
        buffer
    }

    fn measure_line(&mut self) -> TextResult<FontMetrics> {
        let buffer = self.buffer("Mg");
        let run = buffer
            .layout_runs()
            .next()
            .ok_or_else(|| TextError::FontLoad("font produced no layout".into()))?;
        let ascent = run.line_y - run.line_top;
        Ok(FontMetrics {
            line_height: run.line_height,
            ascent,
            descent: run.line_height - ascent,
        })
    }

    fn shape(&mut self, ch: char) -> ShapedGlyph {
        let buffer = self.buffer(ch.encode_utf8(&mut [0; 4]));
        let glyph = buffer
            .layout_runs()
            .flat_map(|run| run.glyphs.iter())
            .next()
            .map(|glyph| {
                let physical = glyph.physical((0.0, 0.0), 1.0);
                ShapedGlyph {
                    advance: glyph.w,
                    offset_x: physical.x as f32,
                    offset_y: physical.y as f32,
                    cache_key: Some(physical.cache_key),
                }
            });
        glyph.unwrap_or(ShapedGlyph {
            advance: 0.0,
            offset_x: 0.0,
            offset_y: 0.0,
            cache_key: None,
        })
    }
}

impl GlyphRasterizer for CosmicRasterizer {
    fn font_size(&self) -> f32 {
        self.size
    }

    fn font_metrics(&self) -> FontMetrics {
        self.metrics
    }

    fn glyph_metrics(&mut self, ch: char) -> GlyphMetrics {
        let shaped = self.shape(ch);
        let mut metrics = GlyphMetrics {
            advance: shaped.advance,
            ..GlyphMetrics::default()
        };
        if ch.is_whitespace() {
            return metrics;
        }
        if let Some(key) = shaped.cache_key
            && let Some(image) = self.swash_cache.get_image(&mut self.font_system, key)
        {
            metrics.bearing_x = shaped.offset_x + image.placement.left as f32;
            metrics.bearing_y = image.placement.top as f32 - shaped.offset_y;
            metrics.width = image.placement.width as f32;
            metrics.height = image.placement.height as f32;
        }
        metrics
    }

    fn rasterize(&mut self, ch: char) -> TextResult<GlyphBitmap> {
        if ch.is_whitespace() {
            return Ok(GlyphBitmap::default());
        }
        let Some(key) = self.shape(ch).cache_key else {
            return Ok(GlyphBitmap::default());
        };
        let Some(image) = self.swash_cache.get_image(&mut self.font_system, key) else {
            return Err(TextError::Rasterization(format!(
                "no image for {:?}",
                ch
            )));
        };

        let width = image.placement.width;
        let height = image.placement.height;
        let pixels = (width * height) as usize;
        let data: Vec<u8> = match image.content {
            SwashContent::Mask => image.data.clone(),
            SwashContent::Color => image.data.chunks_exact(4).map(|px| px[3]).collect(),
            SwashContent::SubpixelMask => image
                .data
                .chunks_exact(4)
                .map(|px| px[0].max(px[1]).max(px[2]))
                .collect(),
        };
        if data.len() != pixels {
            return Err(TextError::Rasterization(format!(
                "{:?}: expected {} coverage bytes, got {}",
                ch,
                pixels,
                data.len()
            )));
        }
        Ok(GlyphBitmap {
            width,
            height,
            data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_database_is_a_font_error() {
        let err = CosmicRasterizer::new(FontDatabase::empty(), FontAttributes::default(), 16.0)
            .err()
            .unwrap();
        assert!(matches!(err, TextError::FontLoad(_)));
    }

    #[test]
    fn test_system_font_metrics_are_consistent() {
        let db = FontDatabase::new();
        if db.is_empty() {
            // No fonts installed on this machine.
            return;
        }
        let mut rasterizer = CosmicRasterizer::new(db, FontAttributes::default(), 24.0).unwrap();
        let font = rasterizer.font_metrics();
        assert!(font.line_height > 0.0);
        assert!((font.ascent + font.descent - font.line_height).abs() < 1e-3);

        let metrics = rasterizer.glyph_metrics('A');
        let bitmap = rasterizer.rasterize('A').unwrap();
        assert!(metrics.advance > 0.0);
        assert_eq!(bitmap.width as f32, metrics.width);
        assert_eq!(bitmap.height as f32, metrics.height);
        assert!(rasterizer.rasterize(' ').unwrap().is_empty());
    }
}
