//! Shader lookup per backend.
//!
//! The renderer needs two programs, a flat-colored one and a textured one.
//! Each backend consumes a different blob format, so the blobs are keyed by
//! program, backend and stage.

use std::fmt;
use std::io;
use std::path::Path;

use glint_core::alloc::HashMap;
use glint_device::{GraphicsBackend, ShaderDesc, ShaderFormat, ShaderStage};

use crate::error::{RenderError, RenderResult};

const COLOR_WGSL: &str = include_str!("../shaders/color.wgsl");
const TEXTURED_WGSL: &str = include_str!("../shaders/textured.wgsl");

/// The two programs used by the sprite renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderKind {
    Color,
    Textured,
}

impl ShaderKind {
    pub const ALL: [ShaderKind; 2] = [ShaderKind::Color, ShaderKind::Textured];

    /// File stem used for precompiled blobs.
    pub const fn file_stem(self) -> &'static str {
        match self {
            ShaderKind::Color => "Color",
            ShaderKind::Textured => "Tex",
        }
    }
}

impl fmt::Display for ShaderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_stem())
    }
}

/// Entry point names used by precompiled native blobs.
const fn native_entry_point(stage: ShaderStage) -> &'static str {
    match stage {
        ShaderStage::Vertex => "VS",
        ShaderStage::Fragment => "FS",
    }
}

const fn wgsl_entry_point(stage: ShaderStage) -> &'static str {
    match stage {
        ShaderStage::Vertex => "vs_main",
        ShaderStage::Fragment => "fs_main",
    }
}

/// Maps `(kind, backend, stage)` to a shader blob.
#[derive(Debug, Clone, Default)]
pub struct ShaderLibrary {
    entries: HashMap<(ShaderKind, GraphicsBackend, ShaderStage), ShaderDesc>,
}

impl ShaderLibrary {
    /// An empty library.
    pub fn new() -> Self {
        Self::default()
    }

    /// WGSL sources for the `WebGpu` backend.
    pub fn builtin() -> Self {
        let mut library = Self::new();
        for (kind, source) in [
            (ShaderKind::Color, COLOR_WGSL),
            (ShaderKind::Textured, TEXTURED_WGSL),
        ] {
            for stage in [ShaderStage::Vertex, ShaderStage::Fragment] {
                let desc = ShaderDesc::new(
                    stage,
                    ShaderFormat::Wgsl,
                    source.as_bytes(),
                    wgsl_entry_point(stage),
                )
                .with_label(format!("{}-{}", kind, stage));
                library.insert(kind, GraphicsBackend::WebGpu, desc);
            }
        }
        library
    }

    /// Register a blob, replacing any previous one for the same key.
    pub fn insert(&mut self, kind: ShaderKind, backend: GraphicsBackend, desc: ShaderDesc) {
        self.entries.insert((kind, backend, desc.stage), desc);
    }

    pub fn with(mut self, kind: ShaderKind, backend: GraphicsBackend, desc: ShaderDesc) -> Self {
        self.insert(kind, backend, desc);
        self
    }

    pub fn contains(&self, kind: ShaderKind, backend: GraphicsBackend, stage: ShaderStage) -> bool {
        self.entries.contains_key(&(kind, backend, stage))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(
        &self,
        kind: ShaderKind,
        backend: GraphicsBackend,
        stage: ShaderStage,
    ) -> RenderResult<&ShaderDesc> {
        self.entries.get(&(kind, backend, stage)).ok_or_else(|| {
            RenderError::UnsupportedFormat(format!(
                "no {} {} shader for the {} backend",
                kind, stage, backend
            ))
        })
    }

    /// Load precompiled blobs named `{Kind}-{Stage}.{ext}` from `dir`.
    ///
    /// The extension follows the backend (`Color-Vertex.spv` for Vulkan).
    /// Missing files are skipped and surface later as
    /// [`RenderError::UnsupportedFormat`] when the renderer initializes.
    pub fn load_dir(mut self, dir: impl AsRef<Path>, backend: GraphicsBackend) -> io::Result<Self> {
        let dir = dir.as_ref();
        let format = backend.shader_format();
        for kind in ShaderKind::ALL {
            for stage in [ShaderStage::Vertex, ShaderStage::Fragment] {
                let name = format!("{}-{}.{}", kind, stage, format.extension());
                let path = dir.join(&name);
                let bytes = match std::fs::read(&path) {
                    Ok(bytes) => bytes,
                    Err(e) if e.kind() == io::ErrorKind::NotFound => {
                        tracing::debug!("shader blob {} not found", path.display());
                        continue;
                    }
                    Err(e) => return Err(e),
                };
                let entry_point = match format {
                    ShaderFormat::Wgsl => wgsl_entry_point(stage),
                    _ => native_entry_point(stage),
                };
                let desc = ShaderDesc::new(stage, format, bytes, entry_point).with_label(name);
                self.insert(kind, backend, desc);
            }
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_covers_webgpu_only() {
        let library = ShaderLibrary::builtin();
        assert_eq!(library.len(), 4);
        let vs = library
            .get(ShaderKind::Textured, GraphicsBackend::WebGpu, ShaderStage::Vertex)
            .unwrap();
        assert_eq!(vs.entry_point, "vs_main");
        assert_eq!(vs.format, ShaderFormat::Wgsl);

        let err = library
            .get(ShaderKind::Color, GraphicsBackend::Vulkan, ShaderStage::Vertex)
            .unwrap_err();
        assert!(matches!(err, RenderError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_load_dir_uses_backend_extension() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Color-Vertex.spv"), [3u8, 2, 35, 7]).unwrap();
        std::fs::write(dir.path().join("Tex-Fragment.spv"), [1u8]).unwrap();
        std::fs::write(dir.path().join("Color-Fragment.glsl"), [9u8]).unwrap();

        let library = ShaderLibrary::new()
            .load_dir(dir.path(), GraphicsBackend::Vulkan)
            .unwrap();
        assert_eq!(library.len(), 2);
        let vs = library
            .get(ShaderKind::Color, GraphicsBackend::Vulkan, ShaderStage::Vertex)
            .unwrap();
        assert_eq!(vs.entry_point, "VS");
        assert_eq!(vs.bytes, vec![3, 2, 35, 7]);
        assert!(!library.contains(ShaderKind::Color, GraphicsBackend::Vulkan, ShaderStage::Fragment));
    }
}
