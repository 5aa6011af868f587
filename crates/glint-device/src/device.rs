//! The adapter contract the renderers are written against.

use crate::commands::CommandList;
use crate::error::DeviceResult;
use crate::handles::*;
use crate::types::*;

/// Trait abstracting the graphics device.
///
/// Methods take `&self` and return owned handles, so one device can be
/// shared behind an `Arc` by the sprite renderer and the glyph atlas.
/// Implementations use interior mutability for their resource tables.
///
/// The trait is object safe; renderers hold an `Arc<dyn RenderDevice>` and
/// never branch on the concrete backend.
///
/// # Example
///
/// ```rust
/// use glint_device::{BufferDesc, BufferUsage, DeviceResult, RenderDevice};
///
/// fn upload(device: &dyn RenderDevice, bytes: &[u8]) -> DeviceResult<()> {
///     let buffer = device.create_buffer(&BufferDesc {
///         label: Some("upload"),
///         size: bytes.len() as u64,
///         usage: BufferUsage::VERTEX,
///     })?;
///     device.update_buffer(buffer, 0, bytes)
/// }
/// ```
pub trait RenderDevice: Send + Sync {
    /// Backend used to pick shader blobs.
    fn backend(&self) -> GraphicsBackend;

    fn limits(&self) -> DeviceLimits;

    // Buffers

    fn create_buffer(&self, desc: &BufferDesc) -> DeviceResult<BufferId>;

    /// Write `data` at `offset` immediately, outside any command list.
    fn update_buffer(&self, buffer: BufferId, offset: u64, data: &[u8]) -> DeviceResult<()>;

    // Textures

    fn create_texture(&self, desc: &TextureDesc) -> DeviceResult<TextureId>;

    /// Replace the texels of `region` with tightly packed rows of `data`.
    fn update_texture(
        &self,
        texture: TextureId,
        region: TextureRegion,
        data: &[u8],
    ) -> DeviceResult<()>;

    // Shaders and pipelines

    fn create_shader(&self, desc: &ShaderDesc) -> DeviceResult<ShaderId>;

    fn create_pipeline(&self, desc: &PipelineDesc) -> DeviceResult<PipelineId>;

    fn create_resource_layout(&self, desc: &ResourceLayoutDesc) -> DeviceResult<ResourceLayoutId>;

    fn create_resource_set(&self, desc: &ResourceSetDesc) -> DeviceResult<ResourceSetId>;

    // Frames

    /// Size of the current render target.
    fn query_viewport(&self) -> Viewport;

    /// Open a new command list.
    fn begin_command_list(&self) -> CommandList {
        CommandList::new()
    }

    /// Execute a closed command list in recording order.
    fn submit(&self, list: CommandList) -> DeviceResult<()>;

    /// Release a resource. Unknown handles are ignored.
    fn destroy(&self, resource: ResourceId);
}
