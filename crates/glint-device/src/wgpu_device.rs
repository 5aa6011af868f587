//! Headless [`RenderDevice`] on top of wgpu.
//!
//! The device renders into an offscreen color target it owns. Callers that
//! present to a window can render into their own view with
//! [`WgpuDevice::set_target_view`].

use std::borrow::Cow;

use glint_core::alloc::HashMap;
use parking_lot::Mutex;
use wgpu::util::DeviceExt;

use crate::commands::{Command, CommandList};
use crate::device::RenderDevice;
use crate::error::{DeviceError, DeviceResult};
use crate::handles::*;
use crate::types::*;

/// Descriptor for configuring [`WgpuDevice`] creation.
#[derive(Debug, Clone)]
pub struct WgpuDeviceDescriptor {
    /// GPU backends to use
    pub backends: wgpu::Backends,
    /// Power preference for adapter selection
    pub power_preference: wgpu::PowerPreference,
    /// Whether to force fallback adapter
    pub force_fallback_adapter: bool,
    /// Format of the color target every pipeline writes to
    pub target_format: TextureFormat,
    /// Initial size of the offscreen target
    pub width: u32,
    pub height: u32,
    /// Optional label for debugging
    pub label: Option<&'static str>,
}

impl Default for WgpuDeviceDescriptor {
    fn default() -> Self {
        Self {
            backends: wgpu::Backends::all(),
            power_preference: wgpu::PowerPreference::HighPerformance,
            force_fallback_adapter: false,
            target_format: TextureFormat::Rgba8UnormSrgb,
            width: 800,
            height: 600,
            label: None,
        }
    }
}

impl WgpuDeviceDescriptor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn backends(mut self, backends: wgpu::Backends) -> Self {
        self.backends = backends;
        self
    }

    pub fn power_preference(mut self, preference: wgpu::PowerPreference) -> Self {
        self.power_preference = preference;
        self
    }

    pub fn force_fallback_adapter(mut self, force: bool) -> Self {
        self.force_fallback_adapter = force;
        self
    }

    pub fn target_format(mut self, format: TextureFormat) -> Self {
        self.target_format = format;
        self
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn label(mut self, label: &'static str) -> Self {
        self.label = Some(label);
        self
    }
}

pub(crate) fn texture_format_to_wgpu(format: TextureFormat) -> wgpu::TextureFormat {
    match format {
        TextureFormat::Rgba8Unorm => wgpu::TextureFormat::Rgba8Unorm,
        TextureFormat::Rgba8UnormSrgb => wgpu::TextureFormat::Rgba8UnormSrgb,
        TextureFormat::Bgra8Unorm => wgpu::TextureFormat::Bgra8Unorm,
        TextureFormat::Bgra8UnormSrgb => wgpu::TextureFormat::Bgra8UnormSrgb,
        TextureFormat::R8Unorm => wgpu::TextureFormat::R8Unorm,
    }
}

fn vertex_format_to_wgpu(format: VertexFormat) -> wgpu::VertexFormat {
    match format {
        VertexFormat::Float32x2 => wgpu::VertexFormat::Float32x2,
        VertexFormat::Float32x4 => wgpu::VertexFormat::Float32x4,
    }
}

fn blend_to_wgpu(blend: BlendMode) -> wgpu::BlendState {
    match blend {
        BlendMode::Alpha => wgpu::BlendState::ALPHA_BLENDING,
        BlendMode::Additive => wgpu::BlendState {
            color: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::SrcAlpha,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
            alpha: wgpu::BlendComponent::OVER,
        },
        BlendMode::Override => wgpu::BlendState::REPLACE,
    }
}

fn stage_to_wgpu(stage: ShaderStage) -> wgpu::ShaderStages {
    match stage {
        ShaderStage::Vertex => wgpu::ShaderStages::VERTEX,
        ShaderStage::Fragment => wgpu::ShaderStages::FRAGMENT,
    }
}

struct GpuTarget {
    texture: Option<wgpu::Texture>,
    view: wgpu::TextureView,
    width: u32,
    height: u32,
}

struct GpuShader {
    module: wgpu::ShaderModule,
    stage: ShaderStage,
    entry_point: String,
}

struct GpuTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    format: TextureFormat,
}

#[derive(Default)]
struct Resources {
    buffers: HashMap<BufferId, wgpu::Buffer>,
    textures: HashMap<TextureId, GpuTexture>,
    shaders: HashMap<ShaderId, GpuShader>,
    pipelines: HashMap<PipelineId, wgpu::RenderPipeline>,
    layouts: HashMap<ResourceLayoutId, wgpu::BindGroupLayout>,
    sets: HashMap<ResourceSetId, wgpu::BindGroup>,
}

impl Resources {
    fn shader(&self, id: ShaderId, stage: ShaderStage) -> DeviceResult<&GpuShader> {
        let shader = self
            .shaders
            .get(&id)
            .ok_or(DeviceError::InvalidHandle(id.into()))?;
        if shader.stage != stage {
            return Err(DeviceError::Backend(format!(
                "{} is a {} shader, expected {}",
                id, shader.stage, stage
            )));
        }
        Ok(shader)
    }
}

/// Bound state that must be re-applied whenever a render pass reopens.
#[derive(Default, Clone)]
struct BoundState {
    pipeline: Option<PipelineId>,
    sets: Vec<(u32, ResourceSetId)>,
    vertex_buffer: Option<BufferId>,
    index_buffer: Option<(BufferId, IndexFormat)>,
}

/// A [`RenderDevice`] backed by a wgpu device and queue.
///
/// Command lists are replayed into a single encoder per submit. Buffer
/// updates recorded between draws close the current render pass, copy from
/// a staging buffer, and reopen the pass with `LoadOp::Load`, so each draw
/// sees exactly the data recorded before it.
pub struct WgpuDevice {
    device: wgpu::Device,
    queue: wgpu::Queue,
    target_format: TextureFormat,
    target: Mutex<GpuTarget>,
    resources: Mutex<Resources>,
    handles: HandleAllocator,
}

impl WgpuDevice {
    /// Create a headless device with its own offscreen target.
    pub async fn new_headless(descriptor: WgpuDeviceDescriptor) -> DeviceResult<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: descriptor.backends,
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: descriptor.power_preference,
                compatible_surface: None,
                force_fallback_adapter: descriptor.force_fallback_adapter,
            })
            .await
            .map_err(|e| DeviceError::NoAdapter(e.to_string()))?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: descriptor.label,
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                ..Default::default()
            })
            .await
            .map_err(|e| DeviceError::Backend(e.to_string()))?;

        let info = adapter.get_info();
        tracing::info!(
            "Created wgpu device on {} ({:?})",
            info.name,
            info.backend
        );

        Ok(Self::from_wgpu(
            device,
            queue,
            descriptor.target_format,
            descriptor.width,
            descriptor.height,
        ))
    }

    /// Blocking version of [`new_headless`](Self::new_headless).
    pub fn new_headless_sync(descriptor: WgpuDeviceDescriptor) -> DeviceResult<Self> {
        pollster::block_on(Self::new_headless(descriptor))
    }

    /// Wrap an existing wgpu device. An offscreen target of the given size
    /// is created.
    pub fn from_wgpu(
        device: wgpu::Device,
        queue: wgpu::Queue,
        target_format: TextureFormat,
        width: u32,
        height: u32,
    ) -> Self {
        let target = Self::create_target(&device, target_format, width, height);
        Self {
            device,
            queue,
            target_format,
            target: Mutex::new(target),
            resources: Mutex::new(Resources::default()),
            handles: HandleAllocator::new(),
        }
    }

    fn create_target(
        device: &wgpu::Device,
        format: TextureFormat,
        width: u32,
        height: u32,
    ) -> GpuTarget {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("glint offscreen target"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: texture_format_to_wgpu(format),
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::COPY_SRC
                | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        GpuTarget {
            texture: Some(texture),
            view,
            width,
            height,
        }
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Recreate the offscreen target at a new size.
    pub fn resize(&self, width: u32, height: u32) {
        *self.target.lock() = Self::create_target(&self.device, self.target_format, width, height);
    }

    /// Render into an externally owned view, e.g. a surface texture. Its
    /// format must match the descriptor's `target_format`.
    pub fn set_target_view(&self, view: wgpu::TextureView, width: u32, height: u32) {
        *self.target.lock() = GpuTarget {
            texture: None,
            view,
            width,
            height,
        };
    }

    /// The offscreen target texture, if the device owns one.
    pub fn target_texture(&self) -> Option<wgpu::Texture> {
        self.target.lock().texture.clone()
    }

    fn begin_pass(
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        clear: Option<[f32; 4]>,
    ) -> wgpu::RenderPass<'static> {
        let load = match clear {
            Some([r, g, b, a]) => wgpu::LoadOp::Clear(wgpu::Color {
                r: r as f64,
                g: g as f64,
                b: b as f64,
                a: a as f64,
            }),
            None => wgpu::LoadOp::Load,
        };
        encoder
            .begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("glint pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            })
            .forget_lifetime()
    }

    fn apply_state(
        pass: &mut wgpu::RenderPass<'static>,
        resources: &Resources,
        state: &BoundState,
    ) -> DeviceResult<()> {
        let (Some(pipeline), Some(vertex_buffer), Some((index_buffer, format))) =
            (state.pipeline, state.vertex_buffer, state.index_buffer)
        else {
            return Err(DeviceError::CommandList(
                "draw issued without pipeline, vertex buffer and index buffer".into(),
            ));
        };

        let pipeline = resources
            .pipelines
            .get(&pipeline)
            .ok_or(DeviceError::InvalidHandle(pipeline.into()))?;
        pass.set_pipeline(pipeline);

        for (slot, set) in &state.sets {
            let group = resources
                .sets
                .get(set)
                .ok_or(DeviceError::InvalidHandle((*set).into()))?;
            pass.set_bind_group(*slot, group, &[]);
        }

        let vertices = resources
            .buffers
            .get(&vertex_buffer)
            .ok_or(DeviceError::InvalidHandle(vertex_buffer.into()))?;
        pass.set_vertex_buffer(0, vertices.slice(..));

        let indices = resources
            .buffers
            .get(&index_buffer)
            .ok_or(DeviceError::InvalidHandle(index_buffer.into()))?;
        let format = match format {
            IndexFormat::Uint16 => wgpu::IndexFormat::Uint16,
            IndexFormat::Uint32 => wgpu::IndexFormat::Uint32,
        };
        pass.set_index_buffer(indices.slice(..), format);
        Ok(())
    }

    fn encode(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        commands: &[Command],
    ) -> DeviceResult<()> {
        let resources = self.resources.lock();
        let target = self.target.lock();

        let mut pass: Option<wgpu::RenderPass<'static>> = None;
        let mut pending_clear: Option<[f32; 4]> = None;
        let mut state = BoundState::default();

        for command in commands {
            match command {
                Command::Clear(color) => {
                    pass = None;
                    pending_clear = Some(*color);
                }
                Command::SetPipeline(id) => state.pipeline = Some(*id),
                Command::SetResourceSet { slot, set } => {
                    state.sets.retain(|(s, _)| s != slot);
                    state.sets.push((*slot, *set));
                }
                Command::SetVertexBuffer(id) => state.vertex_buffer = Some(*id),
                Command::SetIndexBuffer { buffer, format } => {
                    state.index_buffer = Some((*buffer, *format))
                }
                Command::UpdateBuffer {
                    buffer,
                    offset,
                    data,
                } => {
                    // Copies are not allowed while a pass holds the encoder.
                    pass = None;
                    let destination = resources
                        .buffers
                        .get(buffer)
                        .ok_or(DeviceError::InvalidHandle((*buffer).into()))?;
                    if offset + data.len() as u64 > destination.size() {
                        return Err(DeviceError::OutOfBounds {
                            offset: *offset,
                            len: data.len() as u64,
                            capacity: destination.size(),
                        });
                    }
                    let staging = self
                        .device
                        .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                            label: Some("glint staging"),
                            contents: data,
                            usage: wgpu::BufferUsages::COPY_SRC,
                        });
                    encoder.copy_buffer_to_buffer(
                        &staging,
                        0,
                        destination,
                        *offset,
                        data.len() as u64,
                    );
                }
                Command::DrawIndexed {
                    index_count,
                    first_index,
                    base_vertex,
                } => {
                    let active = pass.get_or_insert_with(|| {
                        Self::begin_pass(encoder, &target.view, pending_clear.take())
                    });
                    Self::apply_state(active, &resources, &state)?;
                    active.draw_indexed(
                        *first_index..first_index + index_count,
                        *base_vertex,
                        0..1,
                    );
                }
            }
        }

        drop(pass);
        if let Some(clear) = pending_clear {
            drop(Self::begin_pass(encoder, &target.view, Some(clear)));
        }
        Ok(())
    }
}

impl RenderDevice for WgpuDevice {
    fn backend(&self) -> GraphicsBackend {
        GraphicsBackend::WebGpu
    }

    fn limits(&self) -> DeviceLimits {
        let limits = self.device.limits();
        DeviceLimits {
            max_texture_dimension: limits.max_texture_dimension_2d,
            max_buffer_size: limits.max_buffer_size,
        }
    }

    fn create_buffer(&self, desc: &BufferDesc) -> DeviceResult<BufferId> {
        let mut usage = wgpu::BufferUsages::COPY_DST;
        if desc.usage.contains(BufferUsage::VERTEX) {
            usage |= wgpu::BufferUsages::VERTEX;
        }
        if desc.usage.contains(BufferUsage::INDEX) {
            usage |= wgpu::BufferUsages::INDEX;
        }
        if desc.usage.contains(BufferUsage::UNIFORM) {
            usage |= wgpu::BufferUsages::UNIFORM;
        }

        // Writes must be 4-byte aligned, so round the allocation up.
        let size = desc.size.next_multiple_of(wgpu::COPY_BUFFER_ALIGNMENT);
        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: desc.label,
            size,
            usage,
            mapped_at_creation: false,
        });

        let id = BufferId::from_raw(self.handles.next());
        self.resources.lock().buffers.insert(id, buffer);
        Ok(id)
    }

    fn update_buffer(&self, buffer: BufferId, offset: u64, data: &[u8]) -> DeviceResult<()> {
        let resources = self.resources.lock();
        let target = resources
            .buffers
            .get(&buffer)
            .ok_or(DeviceError::InvalidHandle(buffer.into()))?;
        if offset + data.len() as u64 > target.size() {
            return Err(DeviceError::OutOfBounds {
                offset,
                len: data.len() as u64,
                capacity: target.size(),
            });
        }
        self.queue.write_buffer(target, offset, data);
        Ok(())
    }

    fn create_texture(&self, desc: &TextureDesc) -> DeviceResult<TextureId> {
        let max = self.device.limits().max_texture_dimension_2d;
        if desc.width == 0 || desc.height == 0 || desc.width > max || desc.height > max {
            return Err(DeviceError::TextureTooLarge {
                width: desc.width,
                height: desc.height,
                max,
            });
        }

        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: desc.label,
            size: wgpu::Extent3d {
                width: desc.width,
                height: desc.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: texture_format_to_wgpu(desc.format),
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let id = TextureId::from_raw(self.handles.next());
        self.resources.lock().textures.insert(
            id,
            GpuTexture {
                texture,
                view,
                format: desc.format,
            },
        );
        Ok(id)
    }

    fn update_texture(
        &self,
        texture: TextureId,
        region: TextureRegion,
        data: &[u8],
    ) -> DeviceResult<()> {
        let resources = self.resources.lock();
        let target = resources
            .textures
            .get(&texture)
            .ok_or(DeviceError::InvalidHandle(texture.into()))?;

        let bounds = TextureRegion::new(0, 0, target.texture.width(), target.texture.height());
        if !bounds.contains_rect(&region) {
            return Err(DeviceError::OutOfBounds {
                offset: region.y as u64 * bounds.width as u64 + region.x as u64,
                len: region.width as u64 * region.height as u64,
                capacity: bounds.width as u64 * bounds.height as u64,
            });
        }

        let bytes_per_row = region.width * target.format.bytes_per_pixel();
        if data.len() as u64 != bytes_per_row as u64 * region.height as u64 {
            return Err(DeviceError::Backend(format!(
                "texture data is {} bytes, region {}x{} needs {}",
                data.len(),
                region.width,
                region.height,
                bytes_per_row * region.height
            )));
        }

        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &target.texture,
                mip_level: 0,
                origin: wgpu::Origin3d {
                    x: region.x,
                    y: region.y,
                    z: 0,
                },
                aspect: wgpu::TextureAspect::All,
            },
            data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(bytes_per_row),
                rows_per_image: Some(region.height),
            },
            wgpu::Extent3d {
                width: region.width,
                height: region.height,
                depth_or_array_layers: 1,
            },
        );
        Ok(())
    }

    fn create_shader(&self, desc: &ShaderDesc) -> DeviceResult<ShaderId> {
        if desc.format != ShaderFormat::Wgsl {
            return Err(DeviceError::UnsupportedFormat(format!(
                "{:?} shaders are not accepted by the wgpu device",
                desc.format
            )));
        }
        let source = std::str::from_utf8(&desc.bytes)
            .map_err(|e| DeviceError::UnsupportedFormat(format!("WGSL source is not UTF-8: {}", e)))?;

        let module = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: desc.label.as_deref(),
            source: wgpu::ShaderSource::Wgsl(Cow::Owned(source.to_string())),
        });

        let id = ShaderId::from_raw(self.handles.next());
        self.resources.lock().shaders.insert(
            id,
            GpuShader {
                module,
                stage: desc.stage,
                entry_point: desc.entry_point.clone(),
            },
        );
        Ok(id)
    }

    fn create_pipeline(&self, desc: &PipelineDesc) -> DeviceResult<PipelineId> {
        let mut resources = self.resources.lock();

        let vertex = resources.shader(desc.vertex_shader, ShaderStage::Vertex)?;
        let fragment = resources.shader(desc.fragment_shader, ShaderStage::Fragment)?;

        let layouts = desc
            .resource_layouts
            .iter()
            .map(|id| {
                resources
                    .layouts
                    .get(id)
                    .ok_or(DeviceError::InvalidHandle((*id).into()))
            })
            .collect::<DeviceResult<Vec<_>>>()?;

        let pipeline_layout = self
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: desc.label,
                bind_group_layouts: &layouts,
                push_constant_ranges: &[],
            });

        let attributes: Vec<wgpu::VertexAttribute> = desc
            .vertex_layout
            .attributes
            .iter()
            .map(|a| wgpu::VertexAttribute {
                format: vertex_format_to_wgpu(a.format),
                offset: a.offset,
                shader_location: a.location,
            })
            .collect();

        let topology = match desc.topology {
            PrimitiveTopology::TriangleList => wgpu::PrimitiveTopology::TriangleList,
            PrimitiveTopology::TriangleStrip => wgpu::PrimitiveTopology::TriangleStrip,
        };
        let strip_index_format = match desc.topology {
            PrimitiveTopology::TriangleStrip => Some(wgpu::IndexFormat::Uint16),
            PrimitiveTopology::TriangleList => None,
        };

        let pipeline = self
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: desc.label,
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &vertex.module,
                    entry_point: Some(&vertex.entry_point),
                    buffers: &[wgpu::VertexBufferLayout {
                        array_stride: desc.vertex_layout.stride,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &attributes,
                    }],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &fragment.module,
                    entry_point: Some(&fragment.entry_point),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: texture_format_to_wgpu(self.target_format),
                        blend: Some(blend_to_wgpu(desc.blend)),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology,
                    strip_index_format,
                    cull_mode: None,
                    ..Default::default()
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            });

        let id = PipelineId::from_raw(self.handles.next());
        resources.pipelines.insert(id, pipeline);
        Ok(id)
    }

    fn create_resource_layout(&self, desc: &ResourceLayoutDesc) -> DeviceResult<ResourceLayoutId> {
        let entries: Vec<wgpu::BindGroupLayoutEntry> = desc
            .entries
            .iter()
            .enumerate()
            .map(|(binding, entry)| wgpu::BindGroupLayoutEntry {
                binding: binding as u32,
                visibility: stage_to_wgpu(entry.visibility),
                ty: match entry.kind {
                    ResourceKind::UniformBuffer => wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    ResourceKind::Texture => wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    ResourceKind::Sampler => {
                        wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering)
                    }
                },
                count: None,
            })
            .collect();

        let layout = self
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: desc.label,
                entries: &entries,
            });

        let id = ResourceLayoutId::from_raw(self.handles.next());
        self.resources.lock().layouts.insert(id, layout);
        Ok(id)
    }

    fn create_resource_set(&self, desc: &ResourceSetDesc) -> DeviceResult<ResourceSetId> {
        let mut resources = self.resources.lock();
        let layout = resources
            .layouts
            .get(&desc.layout)
            .ok_or(DeviceError::InvalidHandle(desc.layout.into()))?;

        let samplers: Vec<Option<wgpu::Sampler>> = desc
            .bindings
            .iter()
            .map(|binding| match binding {
                ResourceBinding::Sampler(filter) => {
                    let filter = match filter {
                        FilterMode::Nearest => wgpu::FilterMode::Nearest,
                        FilterMode::Linear => wgpu::FilterMode::Linear,
                    };
                    Some(self.device.create_sampler(&wgpu::SamplerDescriptor {
                        label: Some("glint sampler"),
                        address_mode_u: wgpu::AddressMode::ClampToEdge,
                        address_mode_v: wgpu::AddressMode::ClampToEdge,
                        mag_filter: filter,
                        min_filter: filter,
                        ..Default::default()
                    }))
                }
                _ => None,
            })
            .collect();

        let mut entries = Vec::with_capacity(desc.bindings.len());
        for (binding, (resource, sampler)) in desc.bindings.iter().zip(&samplers).enumerate() {
            let resource = match (resource, sampler) {
                (ResourceBinding::Buffer(id), _) => resources
                    .buffers
                    .get(id)
                    .ok_or(DeviceError::InvalidHandle((*id).into()))?
                    .as_entire_binding(),
                (ResourceBinding::Texture(id), _) => wgpu::BindingResource::TextureView(
                    &resources
                        .textures
                        .get(id)
                        .ok_or(DeviceError::InvalidHandle((*id).into()))?
                        .view,
                ),
                (ResourceBinding::Sampler(_), Some(sampler)) => {
                    wgpu::BindingResource::Sampler(sampler)
                }
                (ResourceBinding::Sampler(_), None) => {
                    return Err(DeviceError::Backend("sampler was not created".into()));
                }
            };
            entries.push(wgpu::BindGroupEntry {
                binding: binding as u32,
                resource,
            });
        }

        let group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: desc.label,
            layout,
            entries: &entries,
        });

        let id = ResourceSetId::from_raw(self.handles.next());
        resources.sets.insert(id, group);
        Ok(id)
    }

    fn query_viewport(&self) -> Viewport {
        let target = self.target.lock();
        Viewport::new(target.width, target.height)
    }

    fn submit(&self, list: CommandList) -> DeviceResult<()> {
        if !list.is_closed() {
            return Err(DeviceError::CommandList(
                "command list must be ended before submission".into(),
            ));
        }

        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("glint command list"),
            });
        let encoded = self.encode(&mut encoder, list.commands());
        if encoded.is_ok() {
            self.queue.submit(std::iter::once(encoder.finish()));
        }

        let validation = pollster::block_on(self.device.pop_error_scope());
        encoded?;
        match validation {
            Some(error) => Err(DeviceError::SubmitFailed(error.to_string())),
            None => Ok(()),
        }
    }

    fn destroy(&self, resource: ResourceId) {
        let mut resources = self.resources.lock();
        let removed = match resource {
            ResourceId::Buffer(id) => resources.buffers.remove(&id).map(|b| b.destroy()).is_some(),
            ResourceId::Texture(id) => resources
                .textures
                .remove(&id)
                .map(|t| t.texture.destroy())
                .is_some(),
            ResourceId::Shader(id) => resources.shaders.remove(&id).is_some(),
            ResourceId::Pipeline(id) => resources.pipelines.remove(&id).is_some(),
            ResourceId::ResourceLayout(id) => resources.layouts.remove(&id).is_some(),
            ResourceId::ResourceSet(id) => resources.sets.remove(&id).is_some(),
        };
        if !removed {
            tracing::warn!("destroy of unknown resource {}", resource);
        }
    }
}
