//! Device adapter contract for glint.
//!
//! The sprite and text renderers never talk to a graphics API directly.
//! They are written against [`RenderDevice`], and the concrete adapter is
//! injected as an `Arc<dyn RenderDevice>`.
//!
//! # Overview
//!
//! - [`RenderDevice`] - buffers, textures, shaders, pipelines, resource sets,
//!   viewport query and command submission
//! - [`CommandList`] - CPU-recorded commands replayed in order on submit
//! - `WgpuDevice` - headless wgpu adapter (requires `wgpu` feature, on by default)
//! - `MockDevice` - recording adapter for tests (requires `mock` feature)
//!
//! # Example
//!
//! ```rust
//! # #[cfg(feature = "mock")]
//! # {
//! use glint_device::{MockDevice, RenderDevice, Viewport};
//!
//! let mock = MockDevice::with_viewport(640, 480);
//! assert_eq!(mock.query_viewport(), Viewport::new(640, 480));
//!
//! let mut list = mock.begin_command_list();
//! list.clear([0.0, 0.0, 0.0, 1.0]).unwrap();
//! list.end();
//! mock.submit(list).unwrap();
//! assert_eq!(mock.submit_count(), 1);
//! # }
//! ```

pub mod commands;
pub mod device;
pub mod error;
pub mod handles;
#[cfg(feature = "mock")]
pub mod mock;
pub mod types;
#[cfg(feature = "wgpu")]
pub mod wgpu_device;

pub use commands::*;
pub use device::*;
pub use error::*;
pub use handles::*;
#[cfg(feature = "mock")]
pub use mock::*;
pub use types::*;
#[cfg(feature = "wgpu")]
pub use wgpu_device::{WgpuDevice, WgpuDeviceDescriptor};
