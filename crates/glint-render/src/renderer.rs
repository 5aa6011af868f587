//! The sprite batch engine.

use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use glint_core::alloc::HashMap;
use glint_core::math::{Mat4, Vec2};
use glint_core::profiling::profile_function;
use glint_device::{
    BufferDesc, BufferId, BufferUsage, CommandList, IndexFormat, PipelineDesc, PipelineId,
    PrimitiveTopology, RenderDevice, ResourceBinding, ResourceId, ResourceKind, ResourceLayoutDesc,
    ResourceLayoutEntry, ResourceLayoutId, ResourceSetDesc, ResourceSetId, ShaderId, ShaderStage,
    TextureId,
    Viewport,
};
use static_assertions::const_assert_eq;

use crate::batch::{Batch, BatchKey, FlushReason, Quad};
use crate::color::Color;
use crate::config::SpriteRendererConfig;
use crate::coords::{CoordinateSystem, map_position, map_size};
use crate::error::{RenderResult, UsageError};
use crate::shaders::ShaderKind;
use crate::sprite::{DrawRequest, SourceRect, SpriteTexture};
use crate::vertex::{
    ColorVertex, INDICES_PER_QUAD, MAX_VERTEX_STRIDE, TexturedVertex, VERTICES_PER_QUAD,
    quad_corners, quad_indices,
};

/// Projection uniform: column-major orthographic matrix.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct ProjectionUniform {
    matrix: [[f32; 4]; 4],
}

const_assert_eq!(std::mem::size_of::<ProjectionUniform>(), 64);

impl ProjectionUniform {
    /// Pixel space with the origin at the top left and y pointing down.
    fn for_viewport(viewport: Viewport) -> Self {
        let width = viewport.width.max(1) as f32;
        let height = viewport.height.max(1) as f32;
        Self {
            matrix: Mat4::orthographic_rh(0.0, width, height, 0.0, 0.0, 1.0).to_cols_array_2d(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RendererState {
    Uninitialized,
    Ready,
    Recording,
    Disposed,
}

/// Device objects created by [`SpriteRenderer::initialize`].
#[derive(Debug, Clone, Copy)]
struct GpuResources {
    vertex_buffer: BufferId,
    index_buffer: BufferId,
    uniform_buffer: BufferId,
    texture_layout: ResourceLayoutId,
    projection_set: ResourceSetId,
    color_pipeline: PipelineId,
    textured_pipeline: PipelineId,
}

/// Counters for one frame, returned by [`SpriteRenderer::end_frame`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameStats {
    pub draw_calls: u32,
    pub quads: u32,
    pub flushes_on_full: u32,
    pub flushes_on_texture_change: u32,
    /// Whether the projection uniform was rewritten this frame.
    pub projection_updated: bool,
}

/// Batches textured and solid quads into indexed draws on a [`RenderDevice`].
///
/// Quads sharing a pipeline and texture accumulate in a bounded batch. A
/// batch becomes one draw when it fills up, when the texture changes, or at
/// the end of the frame.
///
/// # Example
///
/// ```rust
/// # #[cfg(feature = "mock")]
/// # {
/// use std::sync::Arc;
/// use glint_core::math::Vec2;
/// use glint_device::MockDevice;
/// use glint_render::{Color, CoordinateSystem, SpriteRenderer, SpriteRendererConfig};
///
/// let device = Arc::new(MockDevice::new());
/// let mut renderer = SpriteRenderer::new(device.clone(), SpriteRendererConfig::default());
/// renderer.initialize().unwrap();
///
/// renderer.begin_frame().unwrap();
/// renderer
///     .draw_quad(Vec2::ZERO, Vec2::new(32.0, 32.0), Color::RED, CoordinateSystem::Absolute)
///     .unwrap();
/// let stats = renderer.end_frame().unwrap();
/// assert_eq!(stats.draw_calls, 1);
/// # }
/// ```
pub struct SpriteRenderer {
    device: Arc<dyn RenderDevice>,
    config: SpriteRendererConfig,
    state: RendererState,
    resources: Option<GpuResources>,
    batch: Batch,
    commands: Option<CommandList>,
    viewport: Viewport,
    /// Viewport the uniform buffer currently holds a projection for.
    projected_viewport: Option<Viewport>,
    texture_sets: HashMap<TextureId, ResourceSetId>,
    /// Destroyed after the next submit.
    retired: Vec<ResourceId>,
    /// Every device object owned by the renderer, in creation order.
    owned: Vec<ResourceId>,
    stats: FrameStats,
}

impl SpriteRenderer {
    /// Create a renderer. No device objects are created until
    /// [`initialize`](Self::initialize).
    pub fn new(device: Arc<dyn RenderDevice>, config: SpriteRendererConfig) -> Self {
        Self {
            device,
            config,
            state: RendererState::Uninitialized,
            resources: None,
            batch: Batch::new(0),
            commands: None,
            viewport: Viewport::default(),
            projected_viewport: None,
            texture_sets: HashMap::default(),
            retired: Vec::new(),
            owned: Vec::new(),
            stats: FrameStats::default(),
        }
    }

    pub fn device(&self) -> &Arc<dyn RenderDevice> {
        &self.device
    }

    pub fn config(&self) -> &SpriteRendererConfig {
        &self.config
    }

    /// Viewport of the current (or last) frame.
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn is_initialized(&self) -> bool {
        matches!(
            self.state,
            RendererState::Ready | RendererState::Recording
        )
    }

    pub fn is_recording(&self) -> bool {
        self.state == RendererState::Recording
    }

    /// Quads waiting in the current batch.
    pub fn pending_quads(&self) -> usize {
        self.batch.len()
    }

    /// Create pipelines, buffers and resource sets on the device.
    ///
    /// On failure every object created so far is released and the renderer
    /// stays uninitialized.
    pub fn initialize(&mut self) -> RenderResult<()> {
        match self.state {
            RendererState::Uninitialized => {}
            RendererState::Disposed => return Err(UsageError::Disposed.into()),
            RendererState::Ready | RendererState::Recording => {
                return Err(UsageError::AlreadyInitialized.into());
            }
        }
        self.config.validate()?;

        match self.create_resources() {
            Ok(resources) => {
                tracing::info!(
                    "{} renderer initialized on {} (batch capacity {})",
                    self.config.label,
                    self.device.backend(),
                    self.config.batch_capacity
                );
                self.resources = Some(resources);
                self.batch = Batch::new(self.config.batch_capacity);
                self.state = RendererState::Ready;
                Ok(())
            }
            Err(err) => {
                tracing::warn!("{} renderer initialization failed: {}", self.config.label, err);
                for resource in self.owned.drain(..).rev() {
                    self.device.destroy(resource);
                }
                Err(err)
            }
        }
    }

    fn create_shader(&mut self, kind: ShaderKind, stage: ShaderStage) -> RenderResult<ShaderId> {
        let desc = self.config.shaders.get(kind, self.device.backend(), stage)?;
        let id = self.device.create_shader(desc)?;
        self.owned.push(id.into());
        Ok(id)
    }

    fn create_resources(&mut self) -> RenderResult<GpuResources> {
        let device = Arc::clone(&self.device);
        let capacity = self.config.batch_capacity;
        let label = self.config.label.clone();

        let color_vs = self.create_shader(ShaderKind::Color, ShaderStage::Vertex)?;
        let color_fs = self.create_shader(ShaderKind::Color, ShaderStage::Fragment)?;
        let textured_vs = self.create_shader(ShaderKind::Textured, ShaderStage::Vertex)?;
        let textured_fs = self.create_shader(ShaderKind::Textured, ShaderStage::Fragment)?;

        let vertex_label = format!("{} vertices", label);
        let vertex_buffer = device.create_buffer(&BufferDesc {
            label: Some(&vertex_label),
            size: (capacity * VERTICES_PER_QUAD) as u64 * MAX_VERTEX_STRIDE,
            usage: BufferUsage::VERTEX,
        })?;
        self.owned.push(vertex_buffer.into());

        let indices = quad_indices(capacity);
        let index_label = format!("{} indices", label);
        let index_buffer = device.create_buffer(&BufferDesc {
            label: Some(&index_label),
            size: std::mem::size_of_val(indices.as_slice()) as u64,
            usage: BufferUsage::INDEX,
        })?;
        self.owned.push(index_buffer.into());
        device.update_buffer(index_buffer, 0, bytemuck::cast_slice(&indices))?;

        let uniform_label = format!("{} projection", label);
        let uniform_buffer = device.create_buffer(&BufferDesc {
            label: Some(&uniform_label),
            size: std::mem::size_of::<ProjectionUniform>() as u64,
            usage: BufferUsage::UNIFORM,
        })?;
        self.owned.push(uniform_buffer.into());

        let projection_layout = device.create_resource_layout(&ResourceLayoutDesc {
            label: Some(&uniform_label),
            entries: &[ResourceLayoutEntry {
                name: "projection",
                kind: ResourceKind::UniformBuffer,
                visibility: ShaderStage::Vertex,
            }],
        })?;
        self.owned.push(projection_layout.into());

        let texture_label = format!("{} texture", label);
        let texture_layout = device.create_resource_layout(&ResourceLayoutDesc {
            label: Some(&texture_label),
            entries: &[
                ResourceLayoutEntry {
                    name: "texture",
                    kind: ResourceKind::Texture,
                    visibility: ShaderStage::Fragment,
                },
                ResourceLayoutEntry {
                    name: "sampler",
                    kind: ResourceKind::Sampler,
                    visibility: ShaderStage::Fragment,
                },
            ],
        })?;
        self.owned.push(texture_layout.into());

        let projection_set = device.create_resource_set(&ResourceSetDesc {
            label: Some(&uniform_label),
            layout: projection_layout,
            bindings: &[ResourceBinding::Buffer(uniform_buffer)],
        })?;
        self.owned.push(projection_set.into());

        let color_layout = ColorVertex::layout();
        let color_label = format!("{} color pipeline", label);
        let color_pipeline = device.create_pipeline(&PipelineDesc {
            label: Some(&color_label),
            vertex_shader: color_vs,
            fragment_shader: color_fs,
            vertex_layout: &color_layout,
            resource_layouts: &[projection_layout],
            blend: self.config.blend,
            topology: PrimitiveTopology::TriangleList,
        })?;
        self.owned.push(color_pipeline.into());

        let textured_layout = TexturedVertex::layout();
        let textured_label = format!("{} textured pipeline", label);
        let textured_pipeline = device.create_pipeline(&PipelineDesc {
            label: Some(&textured_label),
            vertex_shader: textured_vs,
            fragment_shader: textured_fs,
            vertex_layout: &textured_layout,
            resource_layouts: &[projection_layout, texture_layout],
            blend: self.config.blend,
            topology: PrimitiveTopology::TriangleList,
        })?;
        self.owned.push(textured_pipeline.into());

        Ok(GpuResources {
            vertex_buffer,
            index_buffer,
            uniform_buffer,
            texture_layout,
            projection_set,
            color_pipeline,
            textured_pipeline,
        })
    }

    /// Start a frame sized to the device's current viewport.
    pub fn begin_frame(&mut self) -> RenderResult<()> {
        let viewport = self.device.query_viewport();
        self.begin_frame_with(viewport)
    }

    /// Start a frame with an explicit viewport.
    pub fn begin_frame_with(&mut self, viewport: Viewport) -> RenderResult<()> {
        match self.state {
            RendererState::Ready => {}
            RendererState::Uninitialized => return Err(UsageError::NotInitialized.into()),
            RendererState::Recording => return Err(UsageError::FrameInProgress.into()),
            RendererState::Disposed => return Err(UsageError::Disposed.into()),
        }
        let resources = self.resources.ok_or(UsageError::NotInitialized)?;

        let mut list = self.device.begin_command_list();
        let projection_updated = self.projected_viewport != Some(viewport);
        if projection_updated {
            let uniform = ProjectionUniform::for_viewport(viewport);
            list.update_buffer(resources.uniform_buffer, 0, bytemuck::bytes_of(&uniform))?;
            self.projected_viewport = Some(viewport);
            tracing::debug!("projection updated for {}x{}", viewport.width, viewport.height);
        }

        self.batch.clear();
        self.viewport = viewport;
        self.commands = Some(list);
        self.stats = FrameStats {
            projection_updated,
            ..FrameStats::default()
        };
        self.state = RendererState::Recording;
        Ok(())
    }

    fn ensure_recording(&self) -> RenderResult<()> {
        match self.state {
            RendererState::Recording => Ok(()),
            RendererState::Ready => Err(UsageError::NotRecording.into()),
            RendererState::Uninitialized => Err(UsageError::NotInitialized.into()),
            RendererState::Disposed => Err(UsageError::Disposed.into()),
        }
    }

    /// Clear the render target before the draws that follow.
    pub fn clear(&mut self, color: Color) -> RenderResult<()> {
        self.ensure_recording()?;
        self.flush_with(FlushReason::Explicit)?;
        let list = self.commands.as_mut().ok_or(UsageError::NotRecording)?;
        list.clear(color.to_array())?;
        Ok(())
    }

    /// Append one quad to the active batch, flushing first if the batch is
    /// full or bound to a different texture.
    pub fn draw(&mut self, request: &DrawRequest) -> RenderResult<()> {
        self.ensure_recording()?;
        if request.rotation != 0.0 && request.coordinates == CoordinateSystem::Snorm {
            return Err(UsageError::RotationUnsupported.into());
        }

        let cs = request.coordinates;
        let position = map_position(request.position, cs, self.viewport);
        let size = map_size(request.size, cs, self.viewport);
        let center = map_size(request.center, cs, self.viewport);

        let (key, uv) = match request.texture {
            Some(texture) => (
                BatchKey::Textured(texture.id),
                request.source.to_uv(texture.size()),
            ),
            None => (BatchKey::Solid, SourceRect::FULL.to_uv(Vec2::ONE)),
        };

        if let Some(reason) = self.batch.flush_reason(key) {
            self.flush_with(reason)?;
        }

        self.batch.push(
            key,
            &Quad {
                corners: quad_corners(position, size, center, request.rotation),
                uv,
                color: request.color,
            },
        );
        self.stats.quads += 1;
        Ok(())
    }

    pub fn draw_sprite(
        &mut self,
        texture: SpriteTexture,
        position: Vec2,
        size: Vec2,
        coordinates: CoordinateSystem,
    ) -> RenderResult<()> {
        self.draw(&DrawRequest::textured(texture, position, size).coordinates(coordinates))
    }

    pub fn draw_sprite_tinted(
        &mut self,
        texture: SpriteTexture,
        position: Vec2,
        size: Vec2,
        color: Color,
        coordinates: CoordinateSystem,
    ) -> RenderResult<()> {
        self.draw(
            &DrawRequest::textured(texture, position, size)
                .color(color)
                .coordinates(coordinates),
        )
    }

    /// Draw a sprite rotated by `angle` radians around `center`, which is
    /// relative to `position`.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_sprite_rotated(
        &mut self,
        texture: SpriteTexture,
        position: Vec2,
        size: Vec2,
        center: Vec2,
        angle: f32,
        color: Color,
        coordinates: CoordinateSystem,
    ) -> RenderResult<()> {
        self.draw(
            &DrawRequest::textured(texture, position, size)
                .center(center)
                .rotation(angle)
                .color(color)
                .coordinates(coordinates),
        )
    }

    pub fn draw_sprite_region(
        &mut self,
        texture: SpriteTexture,
        position: Vec2,
        size: Vec2,
        source: SourceRect,
        color: Color,
        coordinates: CoordinateSystem,
    ) -> RenderResult<()> {
        self.draw(
            &DrawRequest::textured(texture, position, size)
                .source(source)
                .color(color)
                .coordinates(coordinates),
        )
    }

    /// Draw a flat-colored quad.
    pub fn draw_quad(
        &mut self,
        position: Vec2,
        size: Vec2,
        color: Color,
        coordinates: CoordinateSystem,
    ) -> RenderResult<()> {
        self.draw(
            &DrawRequest::solid(position, size)
                .color(color)
                .coordinates(coordinates),
        )
    }

    /// Record the pending batch as a draw. Does nothing if it is empty.
    pub fn flush(&mut self) -> RenderResult<()> {
        self.ensure_recording()?;
        self.flush_with(FlushReason::Explicit)
    }

    fn flush_with(&mut self, reason: FlushReason) -> RenderResult<()> {
        profile_function!();
        let Some(key) = self.batch.key() else {
            return Ok(());
        };
        let quads = self.batch.len();
        let result = self.record_batch(key, quads);
        self.batch.clear();
        result?;

        tracing::trace!("flushed {} quads ({:?})", quads, reason);
        self.stats.draw_calls += 1;
        match reason {
            FlushReason::Full => self.stats.flushes_on_full += 1,
            FlushReason::KeyChange => self.stats.flushes_on_texture_change += 1,
            FlushReason::EndOfFrame | FlushReason::Explicit => {}
        }
        Ok(())
    }

    fn record_batch(&mut self, key: BatchKey, quads: usize) -> RenderResult<()> {
        let resources = self.resources.ok_or(UsageError::NotInitialized)?;
        let texture_set = match key {
            BatchKey::Solid => None,
            BatchKey::Textured(texture) => Some(self.texture_set(texture, &resources)?),
        };

        let list = self.commands.as_mut().ok_or(UsageError::NotRecording)?;
        list.update_buffer(resources.vertex_buffer, 0, self.batch.vertex_bytes())?;
        match texture_set {
            None => list.set_pipeline(resources.color_pipeline)?,
            Some(set) => {
                list.set_pipeline(resources.textured_pipeline)?;
                list.set_resource_set(1, set)?;
            }
        }
        list.set_resource_set(0, resources.projection_set)?;
        list.set_vertex_buffer(resources.vertex_buffer)?;
        list.set_index_buffer(resources.index_buffer, IndexFormat::Uint16)?;
        list.draw_indexed((quads * INDICES_PER_QUAD) as u32, 0, 0)?;
        Ok(())
    }

    /// Resource set binding `texture`, created on first use.
    fn texture_set(
        &mut self,
        texture: TextureId,
        resources: &GpuResources,
    ) -> RenderResult<ResourceSetId> {
        if let Some(set) = self.texture_sets.get(&texture) {
            return Ok(*set);
        }
        let label = format!("{} {}", self.config.label, texture);
        let set = self.device.create_resource_set(&ResourceSetDesc {
            label: Some(&label),
            layout: resources.texture_layout,
            bindings: &[
                ResourceBinding::Texture(texture),
                ResourceBinding::Sampler(self.config.filter),
            ],
        })?;
        self.texture_sets.insert(texture, set);
        Ok(set)
    }

    /// Flush, close and submit the frame.
    ///
    /// The renderer is ready for the next frame even if submission fails.
    pub fn end_frame(&mut self) -> RenderResult<FrameStats> {
        self.ensure_recording()?;
        let flushed = self.flush_with(FlushReason::EndOfFrame);
        let list = self.commands.take();
        self.batch.clear();
        self.state = RendererState::Ready;

        let result = match (flushed, list) {
            (Err(err), _) => Err(err),
            (Ok(()), None) => Err(UsageError::NotRecording.into()),
            (Ok(()), Some(mut list)) => {
                list.end();
                self.device.submit(list).map_err(Into::into)
            }
        };
        self.destroy_retired();

        match result {
            Ok(()) => {
                tracing::debug!(
                    "frame submitted: {} draws, {} quads",
                    self.stats.draw_calls,
                    self.stats.quads
                );
                Ok(self.stats)
            }
            Err(err) => {
                tracing::warn!("frame dropped: {}", err);
                // The projection update never reached the device.
                self.projected_viewport = None;
                Err(err)
            }
        }
    }

    /// Stop using `texture` and release it.
    ///
    /// Inside a frame the texture may still be referenced by recorded draws,
    /// so it is released after the next submit.
    pub fn retire_texture(&mut self, texture: TextureId) -> RenderResult<()> {
        let flushed = if self.state == RendererState::Recording
            && self.batch.key() == Some(BatchKey::Textured(texture))
        {
            self.flush_with(FlushReason::Explicit)
        } else {
            Ok(())
        };
        // Queue the texture even when the flush failed.
        let set = self.texture_sets.remove(&texture);
        let doomed = set
            .map(ResourceId::from)
            .into_iter()
            .chain(std::iter::once(ResourceId::from(texture)));
        if self.state == RendererState::Recording {
            self.retired.extend(doomed);
        } else {
            for resource in doomed {
                self.device.destroy(resource);
            }
        }
        flushed
    }

    fn destroy_retired(&mut self) {
        for resource in self.retired.drain(..) {
            self.device.destroy(resource);
        }
    }

    /// Release every device object. Later calls do nothing.
    pub fn dispose(&mut self) {
        if self.state == RendererState::Disposed {
            return;
        }
        self.commands = None;
        self.batch.clear();
        self.destroy_retired();
        for (_, set) in self.texture_sets.drain() {
            self.device.destroy(set.into());
        }
        for resource in self.owned.drain(..).rev() {
            self.device.destroy(resource);
        }
        self.resources = None;
        self.projected_viewport = None;
        self.state = RendererState::Disposed;
        tracing::debug!("{} renderer disposed", self.config.label);
    }
}

impl Drop for SpriteRenderer {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_projection_maps_corners_to_clip_space() {
        let uniform = ProjectionUniform::for_viewport(Viewport::new(800, 600));
        let matrix = Mat4::from_cols_array_2d(&uniform.matrix);
        let top_left = matrix.project_point3(glint_core::math::Vec3::ZERO);
        let bottom_right = matrix.project_point3(glint_core::math::Vec3::new(800.0, 600.0, 0.0));
        assert!((top_left.x + 1.0).abs() < 1e-5 && (top_left.y - 1.0).abs() < 1e-5);
        assert!((bottom_right.x - 1.0).abs() < 1e-5 && (bottom_right.y + 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_empty_viewport_projection_is_finite() {
        let uniform = ProjectionUniform::for_viewport(Viewport::new(0, 0));
        assert!(uniform.matrix.iter().flatten().all(|v| v.is_finite()));
    }
}
