//! CPU side of the glyph atlas.
//!
//! Glyphs are shelf-packed into an RGBA image kept in memory. The GPU copy is
//! refreshed from it, so growing the atlas never loses pixels.

use glint_core::alloc::HashMap;
use glint_core::geometry::Rect;

use crate::error::{TextError, TextResult};
use crate::font::{GlyphBitmap, GlyphMetrics};

const BYTES_PER_PIXEL: usize = 4;

/// Row-based packer. Fills a row left to right and opens a new row below
/// the tallest glyph of the current one when the row runs out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShelfPacker {
    width: u32,
    height: u32,
    padding: u32,
    cursor_x: u32,
    cursor_y: u32,
    row_height: u32,
}

impl ShelfPacker {
    pub fn new(width: u32, height: u32, padding: u32) -> Self {
        Self {
            width,
            height,
            padding,
            cursor_x: padding,
            cursor_y: padding,
            row_height: 0,
        }
    }

    /// Top-left corner for a `width` x `height` glyph, or `None` if it does
    /// not fit. A failed attempt leaves the packer unchanged.
    pub fn pack(&mut self, width: u32, height: u32) -> Option<(u32, u32)> {
        let (mut x, mut y, mut row_height) = (self.cursor_x, self.cursor_y, self.row_height);
        if x + width + self.padding > self.width {
            x = self.padding;
            y += row_height + self.padding;
            row_height = 0;
        }
        if x + width + self.padding > self.width || y + height + self.padding > self.height {
            return None;
        }

        self.cursor_x = x + width + self.padding;
        self.cursor_y = y;
        self.row_height = row_height.max(height);
        Some((x, y))
    }

    /// Enlarge the packing area. Placed glyphs stay where they are.
    pub fn grow(&mut self, width: u32, height: u32) {
        self.width = self.width.max(width);
        self.height = self.height.max(height);
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// A character placed in the atlas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphEntry {
    pub ch: char,
    /// Sub-rect in atlas pixels. Empty for glyphs without ink.
    pub rect: Rect<u32>,
    pub metrics: GlyphMetrics,
}

impl GlyphEntry {
    pub fn has_ink(&self) -> bool {
        self.rect.width > 0 && self.rect.height > 0
    }

    pub fn advance(&self) -> f32 {
        self.metrics.advance
    }

    pub fn bearing_x(&self) -> f32 {
        self.metrics.bearing_x
    }

    pub fn bearing_y(&self) -> f32 {
        self.metrics.bearing_y
    }
}

/// Growable RGBA glyph image plus the `char` to sub-rect map.
///
/// Pixels are white with the glyph coverage in alpha, so the sprite tint
/// colors the text.
#[derive(Debug)]
pub struct GlyphAtlas {
    width: u32,
    height: u32,
    max_size: u32,
    padding: u32,
    pixels: Vec<u8>,
    packer: ShelfPacker,
    entries: HashMap<char, GlyphEntry>,
    /// Regions written since the last upload.
    dirty: Vec<Rect<u32>>,
    /// The image was reallocated since the last upload.
    resized: bool,
}

impl GlyphAtlas {
    /// `max_size` bounds both dimensions.
    pub fn new(width: u32, height: u32, max_size: u32, padding: u32) -> Self {
        let width = width.clamp(1, max_size.max(1));
        let height = height.clamp(1, max_size.max(1));
        Self {
            width,
            height,
            max_size: max_size.max(1),
            padding,
            pixels: vec![0; width as usize * height as usize * BYTES_PER_PIXEL],
            packer: ShelfPacker::new(width, height, padding),
            entries: HashMap::default(),
            dirty: Vec::new(),
            resized: true,
        }
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn max_size(&self) -> u32 {
        self.max_size
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, ch: char) -> Option<&GlyphEntry> {
        self.entries.get(&ch)
    }

    pub fn contains(&self, ch: char) -> bool {
        self.entries.contains_key(&ch)
    }

    /// RGBA pixels, rows top to bottom.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Tightly packed RGBA pixels of `region`.
    pub fn region_pixels(&self, region: Rect<u32>) -> Vec<u8> {
        let row_bytes = region.width as usize * BYTES_PER_PIXEL;
        let stride = self.width as usize * BYTES_PER_PIXEL;
        let mut out = Vec::with_capacity(row_bytes * region.height as usize);
        for row in region.y..region.bottom() {
            let start = row as usize * stride + region.x as usize * BYTES_PER_PIXEL;
            out.extend_from_slice(&self.pixels[start..start + row_bytes]);
        }
        out
    }

    /// Whether the image was reallocated since the last
    /// [`take_pending`](Self::take_pending).
    pub fn is_resized(&self) -> bool {
        self.resized
    }

    /// Regions that changed since the last upload, and whether the whole
    /// image must be uploaded instead. Clears both.
    pub fn take_pending(&mut self) -> (bool, Vec<Rect<u32>>) {
        let resized = std::mem::take(&mut self.resized);
        let dirty = std::mem::take(&mut self.dirty);
        (resized, dirty)
    }

    /// Mark `regions` for upload again, after a failed upload.
    ///
    /// Ignored when the whole image is already pending.
    pub fn requeue(&mut self, regions: impl IntoIterator<Item = Rect<u32>>) {
        if !self.resized {
            self.dirty.extend(regions);
        }
    }

    /// Place `bitmap` for `ch`, growing the atlas if needed.
    ///
    /// Inserting a character that is already present returns the existing
    /// entry.
    pub fn insert(
        &mut self,
        ch: char,
        metrics: GlyphMetrics,
        bitmap: &GlyphBitmap,
    ) -> TextResult<GlyphEntry> {
        if let Some(entry) = self.entries.get(&ch) {
            return Ok(*entry);
        }
        if bitmap.is_empty() {
            let entry = GlyphEntry {
                ch,
                rect: Rect::new(0, 0, 0, 0),
                metrics,
            };
            self.entries.insert(ch, entry);
            return Ok(entry);
        }

        let span = |len: u32| len.saturating_add(self.padding.saturating_mul(2));
        if span(bitmap.width) > self.max_size || span(bitmap.height) > self.max_size {
            return Err(TextError::AtlasFull {
                requested_width: bitmap.width,
                requested_height: bitmap.height,
                atlas_width: self.width,
                atlas_height: self.height,
            });
        }

        let (x, y) = loop {
            match self.packer.pack(bitmap.width, bitmap.height) {
                Some(position) => break position,
                None => self.grow(bitmap.width, bitmap.height)?,
            }
        };

        let rect = Rect::new(x, y, bitmap.width, bitmap.height);
        self.blit(rect, &bitmap.data);
        let entry = GlyphEntry { ch, rect, metrics };
        self.entries.insert(ch, entry);
        if !self.resized {
            self.dirty.push(rect);
        }
        Ok(entry)
    }

    fn blit(&mut self, rect: Rect<u32>, coverage: &[u8]) {
        let stride = self.width as usize;
        for row in 0..rect.height as usize {
            for col in 0..rect.width as usize {
                let alpha = coverage
                    .get(row * rect.width as usize + col)
                    .copied()
                    .unwrap_or(0);
                let pixel = (rect.y as usize + row) * stride + rect.x as usize + col;
                let offset = pixel * BYTES_PER_PIXEL;
                self.pixels[offset..offset + BYTES_PER_PIXEL].copy_from_slice(&[255, 255, 255, alpha]);
            }
        }
    }

    /// Double the smaller dimension (width on ties). Falls back to the other
    /// dimension once one reaches `max_size`.
    fn grow(&mut self, requested_width: u32, requested_height: u32) -> TextResult<()> {
        let can_grow_width = self.width < self.max_size;
        let can_grow_height = self.height < self.max_size;
        let grow_width = match (can_grow_width, can_grow_height) {
            (false, false) => {
                return Err(TextError::AtlasFull {
                    requested_width,
                    requested_height,
                    atlas_width: self.width,
                    atlas_height: self.height,
                });
            }
            (true, false) => true,
            (false, true) => false,
            (true, true) => self.width <= self.height,
        };

        let (new_width, new_height) = if grow_width {
            ((self.width * 2).min(self.max_size), self.height)
        } else {
            (self.width, (self.height * 2).min(self.max_size))
        };
        tracing::debug!(
            "growing glyph atlas {}x{} -> {}x{}",
            self.width,
            self.height,
            new_width,
            new_height
        );

        let old_stride = self.width as usize * BYTES_PER_PIXEL;
        let new_stride = new_width as usize * BYTES_PER_PIXEL;
        let mut pixels = vec![0; new_stride * new_height as usize];
        for (row, src) in self.pixels.chunks_exact(old_stride).enumerate() {
            pixels[row * new_stride..row * new_stride + old_stride].copy_from_slice(src);
        }

        self.pixels = pixels;
        self.width = new_width;
        self.height = new_height;
        self.packer.grow(new_width, new_height);
        self.dirty.clear();
        self.resized = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bitmap(width: u32, height: u32, value: u8) -> GlyphBitmap {
        GlyphBitmap {
            width,
            height,
            data: vec![value; (width * height) as usize],
        }
    }

    #[test]
    fn test_shelf_rows() {
        let mut packer = ShelfPacker::new(32, 32, 1);
        assert_eq!(packer.pack(10, 8), Some((1, 1)));
        assert_eq!(packer.pack(10, 12), Some((12, 1)));
        // 23 + 10 + 1 > 32: new row below the tallest glyph.
        assert_eq!(packer.pack(10, 4), Some((1, 14)));
        assert_eq!(packer.pack(30, 4), Some((1, 19)));
        assert_eq!(packer.pack(5, 20), None);
        // Failed attempts do not disturb the cursor.
        assert_eq!(packer.pack(2, 2), Some((1, 24)));
    }

    #[test]
    fn test_insert_is_memoized() {
        let mut atlas = GlyphAtlas::new(64, 64, 256, 1);
        let first = atlas
            .insert('A', GlyphMetrics::default(), &bitmap(4, 4, 9))
            .unwrap();
        let second = atlas
            .insert('A', GlyphMetrics::default(), &bitmap(8, 8, 1))
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(atlas.len(), 1);
    }

    #[test]
    fn test_growth_order_and_pixel_preservation() {
        let mut atlas = GlyphAtlas::new(16, 16, 64, 0);
        let a = atlas.insert('a', GlyphMetrics::default(), &bitmap(16, 16, 7)).unwrap();
        let before = atlas.region_pixels(a.rect);

        atlas.insert('b', GlyphMetrics::default(), &bitmap(16, 16, 8)).unwrap();
        assert_eq!(atlas.size(), (32, 16), "ties grow the width");
        atlas.insert('c', GlyphMetrics::default(), &bitmap(16, 16, 9)).unwrap();
        assert_eq!(atlas.size(), (32, 32), "then the smaller height");

        assert_eq!(atlas.get('a').unwrap().rect, a.rect);
        assert_eq!(atlas.region_pixels(a.rect), before);
        assert_eq!(&before[..4], &[255, 255, 255, 7]);
    }

    #[test]
    fn test_atlas_full() {
        let mut atlas = GlyphAtlas::new(16, 16, 32, 0);
        for ch in ['a', 'b', 'c', 'd'] {
            atlas.insert(ch, GlyphMetrics::default(), &bitmap(16, 16, 1)).unwrap();
        }
        let err = atlas
            .insert('e', GlyphMetrics::default(), &bitmap(16, 16, 1))
            .unwrap_err();
        assert_eq!(
            err,
            TextError::AtlasFull {
                requested_width: 16,
                requested_height: 16,
                atlas_width: 32,
                atlas_height: 32,
            }
        );
        assert!(err.is_recoverable());
        assert!(!atlas.contains('e'));
    }

    #[test]
    fn test_oversized_glyph_does_not_grow() {
        let mut atlas = GlyphAtlas::new(16, 16, 64, 1);
        let err = atlas
            .insert('w', GlyphMetrics::default(), &bitmap(63, 4, 1))
            .unwrap_err();
        assert!(matches!(
            err,
            TextError::AtlasFull {
                requested_width: 63,
                atlas_width: 16,
                atlas_height: 16,
                ..
            }
        ));
        assert_eq!(atlas.size(), (16, 16));

        // Exactly the largest glyph that still fits with its padding.
        atlas.insert('m', GlyphMetrics::default(), &bitmap(62, 4, 1)).unwrap();
        assert_eq!(atlas.size(), (64, 32));
    }

    #[test]
    fn test_requeued_regions_are_pending_again() {
        let mut atlas = GlyphAtlas::new(32, 32, 32, 1);
        atlas.take_pending();
        let a = atlas.insert('a', GlyphMetrics::default(), &bitmap(3, 2, 5)).unwrap();
        let b = atlas.insert('b', GlyphMetrics::default(), &bitmap(3, 2, 6)).unwrap();
        let (_, regions) = atlas.take_pending();
        assert_eq!(regions, vec![a.rect, b.rect]);

        atlas.requeue(regions[1..].iter().copied());
        assert_eq!(atlas.take_pending(), (false, vec![b.rect]));
    }

    #[test]
    fn test_pending_regions() {
        let mut atlas = GlyphAtlas::new(32, 32, 32, 1);
        assert_eq!(atlas.take_pending(), (true, vec![]));
        let entry = atlas.insert('x', GlyphMetrics::default(), &bitmap(3, 2, 5)).unwrap();
        assert_eq!(atlas.take_pending(), (false, vec![entry.rect]));
        assert_eq!(atlas.region_pixels(entry.rect).len(), 3 * 2 * 4);
    }

    #[test]
    fn test_whitespace_takes_no_space() {
        let mut atlas = GlyphAtlas::new(8, 8, 8, 1);
        let space = atlas
            .insert(' ', GlyphMetrics::default(), &GlyphBitmap::default())
            .unwrap();
        assert!(!space.has_ink());
        assert_eq!(atlas.take_pending(), (true, vec![]));
    }
}
