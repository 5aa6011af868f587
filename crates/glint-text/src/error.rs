use glint_device::DeviceError;
use glint_render::{RenderError, UsageError};

/// Errors that can occur in the text rendering system.
#[derive(Debug, Clone, PartialEq)]
pub enum TextError {
    /// The glyph atlas cannot grow any further. Drawing less text, or text
    /// that reuses glyphs already in the atlas, still works.
    AtlasFull {
        requested_width: u32,
        requested_height: u32,
        atlas_width: u32,
        atlas_height: u32,
    },

    /// The sprite renderer or device failed.
    Render(RenderError),

    /// No usable font could be loaded.
    FontLoad(String),

    /// A glyph could not be rasterized.
    Rasterization(String),
}

impl TextError {
    /// Whether the caller can reasonably continue after this error.
    pub fn is_recoverable(&self) -> bool {
        match self {
            TextError::AtlasFull { .. } => true,
            TextError::Render(err) => err.is_recoverable(),
            TextError::FontLoad(_) | TextError::Rasterization(_) => false,
        }
    }
}

impl std::fmt::Display for TextError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TextError::AtlasFull {
                requested_width,
                requested_height,
                atlas_width,
                atlas_height,
            } => write!(
                f,
                "Glyph atlas is full: requested {}x{} but atlas is {}x{} and cannot grow",
                requested_width, requested_height, atlas_width, atlas_height
            ),
            TextError::Render(err) => write!(f, "Render error: {}", err),
            TextError::FontLoad(msg) => write!(f, "Failed to load font: {}", msg),
            TextError::Rasterization(msg) => write!(f, "Glyph rasterization failed: {}", msg),
        }
    }
}

impl std::error::Error for TextError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TextError::Render(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RenderError> for TextError {
    fn from(err: RenderError) -> Self {
        TextError::Render(err)
    }
}

impl From<UsageError> for TextError {
    fn from(err: UsageError) -> Self {
        TextError::Render(err.into())
    }
}

impl From<DeviceError> for TextError {
    fn from(err: DeviceError) -> Self {
        TextError::Render(err.into())
    }
}

/// Result type for text operations.
pub type TextResult<T> = Result<T, TextError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverability() {
        let full = TextError::AtlasFull {
            requested_width: 10,
            requested_height: 12,
            atlas_width: 64,
            atlas_height: 64,
        };
        assert!(full.is_recoverable());
        assert!(!TextError::FontLoad("none".into()).is_recoverable());
        assert!(!TextError::from(UsageError::NotRecording).is_recoverable());
        assert!(
            TextError::Render(RenderError::ResourceExhausted("quads".into())).is_recoverable()
        );
    }
}
