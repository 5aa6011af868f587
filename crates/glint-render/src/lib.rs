//! Backend-agnostic sprite batching.
//!
//! [`SpriteRenderer`] turns draw requests into batched, indexed draws on any
//! [`RenderDevice`](glint_device::RenderDevice). Positions and sizes may be
//! given in pixels, relative to the viewport, or in signed normalized units
//! (see [`CoordinateSystem`]).
//!
//! # Frame lifecycle
//!
//! ```text
//! new -> initialize -> (begin_frame -> draw* -> end_frame)* -> dispose
//! ```
//!
//! Batches are flushed when they reach
//! [`SpriteRendererConfig::batch_capacity`], when the bound texture changes
//! and at the end of the frame. Each flush is one draw call.

pub mod batch;
pub mod color;
pub mod config;
pub mod coords;
pub mod error;
pub mod renderer;
pub mod shaders;
pub mod sprite;
pub mod vertex;

pub use batch::{BatchKey, FlushReason};
pub use color::Color;
pub use config::{DEFAULT_BATCH_CAPACITY, MAX_BATCH_CAPACITY, SpriteRendererConfig};
pub use coords::{CoordinateSystem, map_position, map_size, unmap_position, unmap_size};
pub use error::{RenderError, RenderResult, UsageError};
pub use renderer::{FrameStats, SpriteRenderer};
pub use shaders::{ShaderKind, ShaderLibrary};
pub use sprite::{DrawRequest, SourceRect, SpriteTexture};
pub use vertex::{ColorVertex, TexturedVertex};

pub use glint_device::{BlendMode, FilterMode, GraphicsBackend, TextureId, Viewport};
