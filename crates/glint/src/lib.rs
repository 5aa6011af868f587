//! glint - 2D sprites and text on any graphics backend
//!
//! glint batches textured and flat-colored quads into indexed draw calls and
//! renders strings from a lazily filled glyph atlas. Everything is written
//! against the [`device::RenderDevice`] adapter trait, so the same renderers
//! run on wgpu or on the recording mock used in tests.
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use glint::prelude::*;
//!
//! glint::core::logging::init();
//! let device = Arc::new(WgpuDevice::new_headless_sync(WgpuDeviceDescriptor::new())?);
//!
//! let mut sprites = SpriteRenderer::new(device.clone(), SpriteRendererConfig::default());
//! sprites.initialize()?;
//! let mut text = TextRenderer::with_font(
//!     device,
//!     FontAttributes::sans_serif(),
//!     24.0,
//!     TextRendererConfig::default(),
//! )?;
//!
//! sprites.begin_frame()?;
//! sprites.clear(Color::BLACK)?;
//! sprites.draw_quad(Vec2::new(10.0, 10.0), Vec2::splat(64.0), Color::RED, CoordinateSystem::Absolute)?;
//! text.draw_string_at(&mut sprites, "Hello", Vec2::new(100.0, 10.0), Color::WHITE)?;
//! sprites.end_frame()?;
//! ```
//!
//! # Crates
//!
//! - [`core`] - logging, profiling, geometry and math
//! - [`device`] - the adapter trait, command lists, wgpu and mock devices
//! - [`render`] - coordinate mapping and the sprite batch engine
//! - [`text`] - glyph atlas, layout and the text renderer

pub use glint_core as core;
pub use glint_core::math;
pub use glint_device as device;
pub use glint_render as render;
pub use glint_text as text;

/// Prelude module for convenient imports
pub mod prelude {
    // Core math and geometry
    pub use glint_core::geometry::Rect;
    pub use glint_core::math::{Mat4, Vec2};

    // Device
    pub use glint_device::{GraphicsBackend, RenderDevice, TextureId, Viewport};
    #[cfg(feature = "mock")]
    pub use glint_device::MockDevice;
    #[cfg(feature = "wgpu")]
    pub use glint_device::{WgpuDevice, WgpuDeviceDescriptor};

    // Sprites
    pub use glint_render::{
        BlendMode, Color, CoordinateSystem, DrawRequest, FilterMode, RenderError, SourceRect,
        SpriteRenderer, SpriteRendererConfig, SpriteTexture, UsageError,
    };

    // Text
    pub use glint_text::{
        FontAttributes, TextAlignment, TextAnchor, TextError, TextLayout, TextRenderer,
        TextRendererConfig, TextStyle,
    };
}
