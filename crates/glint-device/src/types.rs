//! Descriptor and value types shared by every adapter.

use std::fmt;

use bitflags::bitflags;
use glint_core::geometry::Rect;
use glint_core::math::Vec2;

use crate::handles::{BufferId, ResourceLayoutId, ShaderId, TextureId};

/// Native graphics API behind an adapter.
///
/// Shader blobs are selected per backend, so this is what keys the shader
/// lookup. `WebGpu` covers any adapter that consumes WGSL, including the
/// wgpu adapter regardless of the native API it drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GraphicsBackend {
    Direct3D11,
    Vulkan,
    OpenGl,
    Metal,
    WebGpu,
}

impl GraphicsBackend {
    pub const ALL: [GraphicsBackend; 5] = [
        GraphicsBackend::Direct3D11,
        GraphicsBackend::Vulkan,
        GraphicsBackend::OpenGl,
        GraphicsBackend::Metal,
        GraphicsBackend::WebGpu,
    ];

    /// Shader format the backend consumes.
    pub const fn shader_format(self) -> ShaderFormat {
        match self {
            GraphicsBackend::Direct3D11 => ShaderFormat::HlslBytecode,
            GraphicsBackend::Vulkan => ShaderFormat::SpirV,
            GraphicsBackend::OpenGl => ShaderFormat::Glsl,
            GraphicsBackend::Metal => ShaderFormat::MetalLib,
            GraphicsBackend::WebGpu => ShaderFormat::Wgsl,
        }
    }
}

impl fmt::Display for GraphicsBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GraphicsBackend::Direct3D11 => "Direct3D11",
            GraphicsBackend::Vulkan => "Vulkan",
            GraphicsBackend::OpenGl => "OpenGL",
            GraphicsBackend::Metal => "Metal",
            GraphicsBackend::WebGpu => "WebGPU",
        };
        f.write_str(name)
    }
}

/// Encoding of a shader blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderFormat {
    Wgsl,
    SpirV,
    Glsl,
    HlslBytecode,
    MetalLib,
}

impl ShaderFormat {
    /// File extension used for precompiled blobs of this format.
    pub const fn extension(self) -> &'static str {
        match self {
            ShaderFormat::Wgsl => "wgsl",
            ShaderFormat::SpirV => "spv",
            ShaderFormat::Glsl => "glsl",
            ShaderFormat::HlslBytecode => "hlsl.bytes",
            ShaderFormat::MetalLib => "metallib",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("Vertex"),
            ShaderStage::Fragment => f.write_str("Fragment"),
        }
    }
}

/// A single shader stage blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderDesc {
    pub label: Option<String>,
    pub stage: ShaderStage,
    pub format: ShaderFormat,
    pub bytes: Vec<u8>,
    pub entry_point: String,
}

impl ShaderDesc {
    pub fn new(
        stage: ShaderStage,
        format: ShaderFormat,
        bytes: impl Into<Vec<u8>>,
        entry_point: impl Into<String>,
    ) -> Self {
        Self {
            label: None,
            stage,
            format,
            bytes: bytes.into(),
            entry_point: entry_point.into(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

bitflags! {
    /// How a buffer will be bound.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BufferUsage: u32 {
        const VERTEX = 1 << 0;
        const INDEX = 1 << 1;
        const UNIFORM = 1 << 2;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferDesc<'a> {
    pub label: Option<&'a str>,
    pub size: u64,
    pub usage: BufferUsage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    Rgba8Unorm,
    Rgba8UnormSrgb,
    Bgra8Unorm,
    Bgra8UnormSrgb,
    R8Unorm,
}

impl TextureFormat {
    pub const fn bytes_per_pixel(self) -> u32 {
        match self {
            TextureFormat::R8Unorm => 1,
            _ => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureDesc<'a> {
    pub label: Option<&'a str>,
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
}

/// Texel region of a texture, origin at the top left.
pub type TextureRegion = Rect<u32>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexFormat {
    Float32x2,
    Float32x4,
}

impl VertexFormat {
    pub const fn size(self) -> u64 {
        match self {
            VertexFormat::Float32x2 => 8,
            VertexFormat::Float32x4 => 16,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    pub location: u32,
    pub format: VertexFormat,
    pub offset: u64,
}

/// Per-vertex input layout of a pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexLayout {
    pub stride: u64,
    pub attributes: Vec<VertexAttribute>,
}

impl VertexLayout {
    /// Build a tightly packed layout; locations follow the order of `formats`.
    pub fn packed(formats: &[VertexFormat]) -> Self {
        let mut offset = 0;
        let attributes = formats
            .iter()
            .enumerate()
            .map(|(location, format)| {
                let attribute = VertexAttribute {
                    location: location as u32,
                    format: *format,
                    offset,
                };
                offset += format.size();
                attribute
            })
            .collect();
        Self {
            stride: offset,
            attributes,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendMode {
    /// Standard source-over alpha blending.
    #[default]
    Alpha,
    /// Source color added onto the target, scaled by source alpha.
    Additive,
    /// Source replaces the target.
    Override,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PrimitiveTopology {
    #[default]
    TriangleList,
    TriangleStrip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IndexFormat {
    #[default]
    Uint16,
    Uint32,
}

impl IndexFormat {
    pub const fn size(self) -> u64 {
        match self {
            IndexFormat::Uint16 => 2,
            IndexFormat::Uint32 => 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineDesc<'a> {
    pub label: Option<&'a str>,
    pub vertex_shader: ShaderId,
    pub fragment_shader: ShaderId,
    pub vertex_layout: &'a VertexLayout,
    pub resource_layouts: &'a [ResourceLayoutId],
    pub blend: BlendMode,
    pub topology: PrimitiveTopology,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    UniformBuffer,
    Texture,
    Sampler,
}

/// One binding of a resource layout. The binding index is its position in
/// the layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceLayoutEntry<'a> {
    pub name: &'a str,
    pub kind: ResourceKind,
    pub visibility: ShaderStage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceLayoutDesc<'a> {
    pub label: Option<&'a str>,
    pub entries: &'a [ResourceLayoutEntry<'a>],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FilterMode {
    Nearest,
    #[default]
    Linear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceBinding {
    Buffer(BufferId),
    Texture(TextureId),
    Sampler(FilterMode),
}

impl ResourceBinding {
    pub const fn kind(&self) -> ResourceKind {
        match self {
            ResourceBinding::Buffer(_) => ResourceKind::UniformBuffer,
            ResourceBinding::Texture(_) => ResourceKind::Texture,
            ResourceBinding::Sampler(_) => ResourceKind::Sampler,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceSetDesc<'a> {
    pub label: Option<&'a str>,
    pub layout: ResourceLayoutId,
    pub bindings: &'a [ResourceBinding],
}

/// Hard limits reported by an adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceLimits {
    pub max_texture_dimension: u32,
    pub max_buffer_size: u64,
}

impl Default for DeviceLimits {
    fn default() -> Self {
        Self {
            max_texture_dimension: 8192,
            max_buffer_size: 256 << 20,
        }
    }
}

/// Size of the active framebuffer in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32)
    }

    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packed_layout_offsets() {
        let layout = VertexLayout::packed(&[
            VertexFormat::Float32x2,
            VertexFormat::Float32x2,
            VertexFormat::Float32x4,
        ]);
        assert_eq!(layout.stride, 32);
        let offsets: Vec<u64> = layout.attributes.iter().map(|a| a.offset).collect();
        assert_eq!(offsets, vec![0, 8, 16]);
        assert_eq!(layout.attributes[2].location, 2);
    }

    #[test]
    fn test_backend_shader_extension() {
        assert_eq!(GraphicsBackend::Vulkan.shader_format().extension(), "spv");
        assert_eq!(
            GraphicsBackend::Direct3D11.shader_format().extension(),
            "hlsl.bytes"
        );
        assert_eq!(GraphicsBackend::WebGpu.shader_format(), ShaderFormat::Wgsl);
    }
}
