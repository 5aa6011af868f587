//! Typed handles for device resources.
//!
//! The adapter owns the actual GPU objects. Callers hold small `Copy` ids
//! that are meaningless across devices, so a handle from one device must
//! never be passed to another.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

macro_rules! define_handle {
    ($(#[$meta:meta])* $name:ident, $variant:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u64);

        impl $name {
            /// Wrap a raw id. Only adapters should need this.
            pub const fn from_raw(raw: u64) -> Self {
                Self(raw)
            }

            pub const fn raw(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "#{}"), self.0)
            }
        }

        impl From<$name> for ResourceId {
            fn from(id: $name) -> Self {
                ResourceId::$variant(id)
            }
        }
    };
}

define_handle!(
    /// A vertex, index or uniform buffer.
    BufferId,
    Buffer,
    "buffer"
);
define_handle!(
    /// A 2D texture.
    TextureId,
    Texture,
    "texture"
);
define_handle!(
    /// A compiled shader stage.
    ShaderId,
    Shader,
    "shader"
);
define_handle!(
    /// A graphics pipeline.
    PipelineId,
    Pipeline,
    "pipeline"
);
define_handle!(
    /// The shape of a resource set.
    ResourceLayoutId,
    ResourceLayout,
    "layout"
);
define_handle!(
    /// A set of bound resources (uniforms, textures, samplers).
    ResourceSetId,
    ResourceSet,
    "set"
);

/// Any device resource, used for destruction and error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceId {
    Buffer(BufferId),
    Texture(TextureId),
    Shader(ShaderId),
    Pipeline(PipelineId),
    ResourceLayout(ResourceLayoutId),
    ResourceSet(ResourceSetId),
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceId::Buffer(id) => fmt::Display::fmt(id, f),
            ResourceId::Texture(id) => fmt::Display::fmt(id, f),
            ResourceId::Shader(id) => fmt::Display::fmt(id, f),
            ResourceId::Pipeline(id) => fmt::Display::fmt(id, f),
            ResourceId::ResourceLayout(id) => fmt::Display::fmt(id, f),
            ResourceId::ResourceSet(id) => fmt::Display::fmt(id, f),
        }
    }
}

/// Hands out unique raw ids for one device.
#[derive(Debug)]
pub struct HandleAllocator {
    next: AtomicU64,
}

impl HandleAllocator {
    pub const fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    pub fn next(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for HandleAllocator {
    fn default() -> Self {
        Self::new()
    }
}
