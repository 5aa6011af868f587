//! Glyph atlas text rendering for glint.
//!
//! This crate draws strings through a [`glint_render::SpriteRenderer`]:
//! - Font loading and rasterization with cosmic-text ([`CosmicRasterizer`])
//! - A growable, shelf-packed glyph atlas ([`GlyphAtlas`])
//! - A shared glyph cache that other threads can prewarm ([`GlyphCache`])
//! - Multi-line layout and box alignment ([`TextLayout`], [`TextAlignment`])
//!
//! ## Quick Start
//!
//! ```rust
//! # #[cfg(feature = "mock")]
//! # {
//! use std::sync::Arc;
//! use glint_core::math::Vec2;
//! use glint_device::MockDevice;
//! use glint_render::{Color, SpriteRenderer, SpriteRendererConfig};
//! use glint_text::{FixedRasterizer, TextRenderer, TextRendererConfig};
//!
//! let device = Arc::new(MockDevice::new());
//! let mut sprites = SpriteRenderer::new(device.clone(), SpriteRendererConfig::default());
//! sprites.initialize().unwrap();
//!
//! let mut text = TextRenderer::new(
//!     device,
//!     FixedRasterizer::new(16.0),
//!     TextRendererConfig::small(),
//! )
//! .unwrap();
//!
//! sprites.begin_frame().unwrap();
//! let layout = text
//!     .draw_string_at(&mut sprites, "Hello", Vec2::new(10.0, 10.0), Color::WHITE)
//!     .unwrap();
//! sprites.end_frame().unwrap();
//! assert_eq!(layout.line_count, 1);
//! # }
//! ```
//!
//! Characters are rasterized once, at the size the rasterizer was created
//! with. Drawing at another size scales the quads.

pub mod atlas;
pub mod cache;
pub mod config;
pub mod error;
pub mod fixed;
pub mod font;
pub mod layout;
pub mod renderer;

pub use atlas::{GlyphAtlas, GlyphEntry, ShelfPacker};
pub use cache::{AtlasTexture, GlyphCache};
pub use config::{PRINTABLE_ASCII, TextRendererConfig};
pub use error::{TextError, TextResult};
pub use fixed::FixedRasterizer;
pub use font::{
    CosmicRasterizer, FontAttributes, FontDatabase, FontMetrics, FontStretch, FontStyle,
    FontWeight, GlyphBitmap, GlyphMetrics, GlyphRasterizer,
};
pub use layout::{GlyphPlacement, TextAlignment, TextLayout, layout_text};
pub use renderer::{TextAnchor, TextRenderer, TextStyle};
