//! Shared glyph cache: rasterizer, metrics memo, atlas and its texture.

use std::sync::Arc;

use glint_core::alloc::HashMap;
use glint_core::geometry::Rect;
use glint_core::profiling::{profile_function, profile_scope};
use glint_device::{RenderDevice, TextureDesc, TextureFormat, TextureId};
use glint_render::SpriteTexture;
use parking_lot::Mutex;

use crate::atlas::{GlyphAtlas, GlyphEntry};
use crate::config::TextRendererConfig;
use crate::error::TextResult;
use crate::font::{FontMetrics, GlyphMetrics, GlyphRasterizer};
use crate::layout::{TextLayout, is_line_separator, layout_text};

/// Result of [`GlyphCache::sync_texture`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtlasTexture {
    /// Texture holding the current atlas image.
    pub texture: SpriteTexture,
    /// Previous texture, replaced because the atlas grew. The caller must
    /// release it once no pending draw references it.
    pub replaced: Option<TextureId>,
}

struct GlyphCacheState {
    device: Arc<dyn RenderDevice>,
    rasterizer: Box<dyn GlyphRasterizer>,
    font: FontMetrics,
    metrics: HashMap<char, GlyphMetrics>,
    atlas: GlyphAtlas,
    texture: Option<SpriteTexture>,
    label: String,
    rasterized: usize,
}

impl GlyphCacheState {
    fn metrics(&mut self, ch: char) -> GlyphMetrics {
        if let Some(metrics) = self.metrics.get(&ch) {
            return *metrics;
        }
        let metrics = self.rasterizer.glyph_metrics(ch);
        self.metrics.insert(ch, metrics);
        metrics
    }

    fn ensure(&mut self, ch: char) -> TextResult<GlyphEntry> {
        if let Some(entry) = self.atlas.get(ch) {
            return Ok(*entry);
        }
        let metrics = self.metrics(ch);
        let bitmap = self.rasterizer.rasterize(ch)?;
        self.rasterized += 1;
        if !bitmap.is_empty()
            && (bitmap.width as f32 != metrics.width || bitmap.height as f32 != metrics.height)
        {
            tracing::warn!(
                "bitmap of {:?} is {}x{} but metrics say {}x{}",
                ch,
                bitmap.width,
                bitmap.height,
                metrics.width,
                metrics.height
            );
        }
        self.atlas.insert(ch, metrics, &bitmap)
    }

    fn sync_texture(&mut self) -> TextResult<AtlasTexture> {
        let (width, height) = self.atlas.size();
        let current = self
            .texture
            .filter(|texture| texture.width == width && texture.height == height);

        match current {
            Some(texture) => {
                let (_, regions) = self.atlas.take_pending();
                for (i, region) in regions.iter().enumerate() {
                    let data = self.atlas.region_pixels(*region);
                    if let Err(err) = self.device.update_texture(texture.id, *region, &data) {
                        self.atlas.requeue(regions[i..].iter().copied());
                        return Err(err.into());
                    }
                }
                Ok(AtlasTexture {
                    texture,
                    replaced: None,
                })
            }
            None => {
                let id = self.device.create_texture(&TextureDesc {
                    label: Some(self.label.as_str()),
                    width,
                    height,
                    format: TextureFormat::Rgba8Unorm,
                })?;
                if let Err(err) = self.device.update_texture(
                    id,
                    Rect::new(0, 0, width, height),
                    self.atlas.pixels(),
                ) {
                    self.device.destroy(id.into());
                    return Err(err.into());
                }
                self.atlas.take_pending();
                let texture = SpriteTexture::new(id, width, height);
                let replaced = self.texture.replace(texture).map(|old| old.id);
                tracing::debug!("glyph atlas texture {} created at {}x{}", id, width, height);
                Ok(AtlasTexture { texture, replaced })
            }
        }
    }
}

impl Drop for GlyphCacheState {
    fn drop(&mut self) {
        if let Some(texture) = self.texture.take() {
            self.device.destroy(texture.id.into());
        }
    }
}

/// Glyph cache shared between a text renderer and any thread that wants to
/// prewarm it.
///
/// Cloning is cheap and every clone refers to the same atlas. The lock is
/// taken for one operation at a time and never held across a frame.
///
/// ```rust
/// # #[cfg(feature = "mock")]
/// # {
/// use std::sync::Arc;
/// use glint_device::MockDevice;
/// use glint_text::{FixedRasterizer, GlyphCache, TextRendererConfig};
///
/// let device = Arc::new(MockDevice::new());
/// let config = TextRendererConfig::default().with_prewarm(None);
/// let cache = GlyphCache::new(device, FixedRasterizer::new(16.0), &config);
///
/// let worker = cache.clone();
/// std::thread::spawn(move || worker.prewarm("0123456789").unwrap())
///     .join()
///     .unwrap();
/// assert!(cache.contains('7'));
/// # }
/// ```
#[derive(Clone)]
pub struct GlyphCache {
    inner: Arc<Mutex<GlyphCacheState>>,
}

impl GlyphCache {
    pub fn new(
        device: Arc<dyn RenderDevice>,
        rasterizer: impl GlyphRasterizer + 'static,
        config: &TextRendererConfig,
    ) -> Self {
        let max_size = config
            .max_atlas_size
            .min(device.limits().max_texture_dimension);
        let (width, height) = config.initial_atlas_size;
        let font = rasterizer.font_metrics();
        Self {
            inner: Arc::new(Mutex::new(GlyphCacheState {
                device,
                rasterizer: Box::new(rasterizer),
                font,
                metrics: HashMap::default(),
                atlas: GlyphAtlas::new(width, height, max_size, config.padding),
                texture: None,
                label: format!("{} atlas", config.label),
                rasterized: 0,
            })),
        }
    }

    pub fn font_size(&self) -> f32 {
        self.inner.lock().rasterizer.font_size()
    }

    pub fn font_metrics(&self) -> FontMetrics {
        self.inner.lock().font
    }

    /// Metrics of `ch`, memoized.
    pub fn glyph_metrics(&self, ch: char) -> GlyphMetrics {
        self.inner.lock().metrics(ch)
    }

    /// Lay out `text` at the rasterization size with its box at the origin.
    pub fn layout(&self, text: &str) -> TextLayout {
        let mut state = self.inner.lock();
        let font = state.font;
        layout_text(text, font, |ch| state.metrics(ch))
    }

    /// Rasterize and pack every character of `text` missing from the atlas.
    ///
    /// Stops at the first error. Glyphs packed before it stay in the atlas.
    pub fn ensure_glyphs(&self, text: &str) -> TextResult<()> {
        profile_function!();
        let mut state = self.inner.lock();
        for ch in text.chars().filter(|ch| !is_line_separator(*ch)) {
            state.ensure(ch)?;
        }
        Ok(())
    }

    /// Same as [`ensure_glyphs`](Self::ensure_glyphs), with a log line.
    pub fn prewarm(&self, text: &str) -> TextResult<()> {
        let before = self.len();
        self.ensure_glyphs(text)?;
        tracing::debug!("prewarmed {} glyphs", self.len() - before);
        Ok(())
    }

    pub fn glyph(&self, ch: char) -> Option<GlyphEntry> {
        self.inner.lock().atlas.get(ch).copied()
    }

    /// Atlas sub-rects for `chars`, in order, under a single lock.
    pub fn glyphs(&self, chars: impl IntoIterator<Item = char>) -> Vec<Option<GlyphEntry>> {
        let state = self.inner.lock();
        chars
            .into_iter()
            .map(|ch| state.atlas.get(ch).copied())
            .collect()
    }

    pub fn contains(&self, ch: char) -> bool {
        self.inner.lock().atlas.contains(ch)
    }

    /// Number of characters in the atlas.
    pub fn len(&self) -> usize {
        self.inner.lock().atlas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn atlas_size(&self) -> (u32, u32) {
        self.inner.lock().atlas.size()
    }

    /// How many times the rasterizer produced a bitmap.
    pub fn rasterize_count(&self) -> usize {
        self.inner.lock().rasterized
    }

    /// Current atlas texture, if one was created.
    pub fn texture(&self) -> Option<SpriteTexture> {
        self.inner.lock().texture
    }

    /// Copy of the atlas pixels (RGBA).
    pub fn atlas_pixels(&self) -> Vec<u8> {
        self.inner.lock().atlas.pixels().to_vec()
    }

    /// Give up ownership of the atlas texture. The next
    /// [`sync_texture`](Self::sync_texture) creates a fresh one.
    pub fn take_texture(&self) -> Option<TextureId> {
        self.inner.lock().texture.take().map(|texture| texture.id)
    }

    /// Bring the GPU texture up to date with the atlas.
    ///
    /// Uploads the regions written since the last call. After growth a new
    /// texture is created and filled, and the old one is returned in
    /// [`AtlasTexture::replaced`].
    pub fn sync_texture(&self) -> TextResult<AtlasTexture> {
        profile_scope!("sync_atlas_texture");
        self.inner.lock().sync_texture()
    }
}
