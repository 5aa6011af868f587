use glint_device::{BlendMode, FilterMode};

use crate::error::UsageError;
use crate::shaders::ShaderLibrary;

/// Largest batch that still addresses every vertex with `u16` indices.
pub const MAX_BATCH_CAPACITY: usize = 16383;

/// Default number of quads per batch.
pub const DEFAULT_BATCH_CAPACITY: usize = 128;

/// Configuration for a [`SpriteRenderer`](crate::SpriteRenderer).
///
/// # Example
///
/// ```
/// use glint_render::{BlendMode, SpriteRendererConfig};
///
/// let config = SpriteRendererConfig::default()
///     .with_batch_capacity(512)
///     .with_blend(BlendMode::Additive)
///     .with_label("particles");
/// assert_eq!(config.batch_capacity, 512);
/// ```
#[derive(Debug, Clone)]
pub struct SpriteRendererConfig {
    /// Quads per batch before a forced flush.
    pub batch_capacity: usize,
    pub blend: BlendMode,
    /// Sampler filtering for textured quads.
    pub filter: FilterMode,
    /// Prefix for device resource labels.
    pub label: String,
    pub shaders: ShaderLibrary,
}

impl Default for SpriteRendererConfig {
    fn default() -> Self {
        Self {
            batch_capacity: DEFAULT_BATCH_CAPACITY,
            blend: BlendMode::Alpha,
            filter: FilterMode::Linear,
            label: "sprite".to_string(),
            shaders: ShaderLibrary::builtin(),
        }
    }
}

impl SpriteRendererConfig {
    pub fn with_batch_capacity(mut self, capacity: usize) -> Self {
        self.batch_capacity = capacity;
        self
    }

    pub fn with_blend(mut self, blend: BlendMode) -> Self {
        self.blend = blend;
        self
    }

    pub fn with_filter(mut self, filter: FilterMode) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_shaders(mut self, shaders: ShaderLibrary) -> Self {
        self.shaders = shaders;
        self
    }

    pub(crate) fn validate(&self) -> Result<(), UsageError> {
        if self.batch_capacity == 0 || self.batch_capacity > MAX_BATCH_CAPACITY {
            return Err(UsageError::InvalidCapacity(self.batch_capacity));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_bounds() {
        assert!(SpriteRendererConfig::default().validate().is_ok());
        assert!(
            SpriteRendererConfig::default()
                .with_batch_capacity(MAX_BATCH_CAPACITY)
                .validate()
                .is_ok()
        );
        assert_eq!(
            SpriteRendererConfig::default()
                .with_batch_capacity(0)
                .validate(),
            Err(UsageError::InvalidCapacity(0))
        );
        assert_eq!(
            SpriteRendererConfig::default()
                .with_batch_capacity(MAX_BATCH_CAPACITY + 1)
                .validate(),
            Err(UsageError::InvalidCapacity(MAX_BATCH_CAPACITY + 1))
        );
    }
}
