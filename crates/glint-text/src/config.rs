/// Characters rasterized when a renderer is created: printable ASCII.
pub const PRINTABLE_ASCII: &str = " !\"#$%&'()*+,-./0123456789:;<=>?@ABCDEFGHIJKLMNOPQRSTUVWXYZ[\\]^_`abcdefghijklmnopqrstuvwxyz{|}~";

/// Configuration for a [`TextRenderer`](crate::TextRenderer).
///
/// # Example
///
/// ```
/// use glint_text::TextRendererConfig;
///
/// let config = TextRendererConfig::large().with_padding(2).with_prewarm(None);
/// assert_eq!(config.initial_atlas_size, (512, 512));
/// assert!(config.prewarm.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRendererConfig {
    /// Atlas size in pixels before any growth.
    pub initial_atlas_size: (u32, u32),
    /// Largest atlas dimension. The device limit applies as well.
    pub max_atlas_size: u32,
    /// Empty pixels around each glyph.
    pub padding: u32,
    /// Characters rasterized up front.
    pub prewarm: Option<String>,
    /// Prefix for device resource labels.
    pub label: String,
}

impl Default for TextRendererConfig {
    fn default() -> Self {
        Self {
            initial_atlas_size: (256, 256),
            max_atlas_size: 4096,
            padding: 1,
            prewarm: Some(PRINTABLE_ASCII.to_string()),
            label: "text".to_string(),
        }
    }
}

impl TextRendererConfig {
    /// For a few short labels at small sizes.
    pub fn small() -> Self {
        Self {
            initial_atlas_size: (128, 128),
            max_atlas_size: 1024,
            ..Self::default()
        }
    }

    pub fn medium() -> Self {
        Self::default()
    }

    /// For large fonts or scripts with many distinct glyphs.
    pub fn large() -> Self {
        Self {
            initial_atlas_size: (512, 512),
            max_atlas_size: 8192,
            ..Self::default()
        }
    }

    pub fn with_initial_atlas_size(mut self, width: u32, height: u32) -> Self {
        self.initial_atlas_size = (width, height);
        self
    }

    pub fn with_max_atlas_size(mut self, size: u32) -> Self {
        self.max_atlas_size = size;
        self
    }

    pub fn with_padding(mut self, padding: u32) -> Self {
        self.padding = padding;
        self
    }

    pub fn with_prewarm(mut self, chars: Option<&str>) -> Self {
        self.prewarm = chars.map(str::to_string);
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_printable_ascii_table() {
        let expected: String = (0x20u8..=0x7e).map(char::from).collect();
        assert_eq!(PRINTABLE_ASCII, expected);
    }

    #[test]
    fn test_presets_grow_with_size() {
        let small = TextRendererConfig::small();
        let medium = TextRendererConfig::medium();
        let large = TextRendererConfig::large();
        assert!(small.max_atlas_size < medium.max_atlas_size);
        assert!(medium.max_atlas_size < large.max_atlas_size);
        assert_eq!(medium, TextRendererConfig::default());
    }
}
