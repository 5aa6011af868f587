//! Mock implementation of [`RenderDevice`] for testing.
//!
//! The mock keeps real byte contents for buffers and textures and replays
//! submitted command lists on the CPU. Every draw is captured together with
//! a snapshot of the vertex bytes it would have read, so tests can assert on
//! exact geometry without a GPU.

use bytemuck::Pod;
use glint_core::alloc::HashMap;
use parking_lot::Mutex;

use crate::commands::{Command, CommandList};
use crate::device::RenderDevice;
use crate::error::{DeviceError, DeviceResult};
use crate::handles::*;
use crate::types::*;

/// Records a device operation for verification in tests.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCall {
    CreateBuffer {
        id: BufferId,
        size: u64,
        usage: BufferUsage,
    },
    UpdateBuffer {
        buffer: BufferId,
        offset: u64,
        size: usize,
    },
    CreateTexture {
        id: TextureId,
        width: u32,
        height: u32,
        format: TextureFormat,
    },
    UpdateTexture {
        texture: TextureId,
        region: TextureRegion,
    },
    CreateShader {
        id: ShaderId,
        stage: ShaderStage,
        format: ShaderFormat,
    },
    CreatePipeline {
        id: PipelineId,
        label: Option<String>,
        blend: BlendMode,
    },
    CreateResourceLayout {
        id: ResourceLayoutId,
    },
    CreateResourceSet {
        id: ResourceSetId,
        bindings: Vec<ResourceBinding>,
    },
    Submit {
        commands: usize,
        draws: usize,
    },
    Destroy(ResourceId),
}

/// A draw call as the mock executed it.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmittedDraw {
    pub pipeline: PipelineId,
    pub resource_sets: Vec<(u32, ResourceSetId)>,
    /// First texture bound through any of the resource sets.
    pub texture: Option<TextureId>,
    pub index_count: u32,
    pub first_index: u32,
    pub base_vertex: i32,
    /// Indices read from the bound index buffer.
    pub indices: Vec<u32>,
    /// Vertex stride of the pipeline.
    pub stride: u64,
    /// Vertex buffer bytes covering every referenced vertex, starting at
    /// `base_vertex`.
    pub vertex_bytes: Vec<u8>,
}

impl SubmittedDraw {
    /// Decode the captured vertices.
    pub fn vertices<T: Pod>(&self) -> Vec<T> {
        bytemuck::pod_collect_to_vec(&self.vertex_bytes)
    }

    /// Number of quads, assuming six indices per quad.
    pub fn quad_count(&self) -> u32 {
        self.index_count / 6
    }
}

/// One executed command list.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Submission {
    pub clear: Option<[f32; 4]>,
    pub draws: Vec<SubmittedDraw>,
}

#[derive(Debug, Clone)]
struct MockBuffer {
    usage: BufferUsage,
    data: Vec<u8>,
}

#[derive(Debug, Clone)]
struct MockTexture {
    width: u32,
    height: u32,
    format: TextureFormat,
    data: Vec<u8>,
}

#[derive(Debug, Clone)]
struct MockPipeline {
    stride: u64,
}

struct MockState {
    backend: GraphicsBackend,
    limits: DeviceLimits,
    viewport: Viewport,
    buffers: HashMap<BufferId, MockBuffer>,
    textures: HashMap<TextureId, MockTexture>,
    shaders: HashMap<ShaderId, ShaderStage>,
    pipelines: HashMap<PipelineId, MockPipeline>,
    layouts: HashMap<ResourceLayoutId, Vec<ResourceKind>>,
    sets: HashMap<ResourceSetId, Vec<ResourceBinding>>,
    submissions: Vec<Submission>,
    fail_next_submit: Option<String>,
    fail_next_texture_update: Option<String>,
    fail_next_resource_set: Option<String>,
}

/// Mock implementation of [`RenderDevice`].
///
/// Methods take `&self` but need to mutate the resource tables, so all
/// state sits behind `parking_lot::Mutex`, which keeps the type
/// `Send + Sync` as the trait requires.
///
/// # Example
///
/// ```rust
/// use glint_device::{BufferDesc, BufferUsage, MockDevice, RenderDevice};
///
/// let mock = MockDevice::new();
/// let buffer = mock
///     .create_buffer(&BufferDesc {
///         label: None,
///         size: 64,
///         usage: BufferUsage::UNIFORM,
///     })
///     .unwrap();
/// mock.update_buffer(buffer, 0, &[1u8; 64]).unwrap();
///
/// assert_eq!(mock.count_buffer_creates(), 1);
/// assert_eq!(mock.buffer_data(buffer).unwrap(), vec![1u8; 64]);
/// ```
pub struct MockDevice {
    calls: Mutex<Vec<DeviceCall>>,
    state: Mutex<MockState>,
    handles: HandleAllocator,
}

impl MockDevice {
    /// Create a mock device with an 800x600 target and the WGSL backend.
    pub fn new() -> Self {
        Self::with_viewport(800, 600)
    }

    pub fn with_viewport(width: u32, height: u32) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            state: Mutex::new(MockState {
                backend: GraphicsBackend::WebGpu,
                limits: DeviceLimits::default(),
                viewport: Viewport::new(width, height),
                buffers: HashMap::new(),
                textures: HashMap::new(),
                shaders: HashMap::new(),
                pipelines: HashMap::new(),
                layouts: HashMap::new(),
                sets: HashMap::new(),
                submissions: Vec::new(),
                fail_next_submit: None,
                fail_next_texture_update: None,
                fail_next_resource_set: None,
            }),
            handles: HandleAllocator::new(),
        }
    }

    // Configuration

    /// Change the size reported by [`RenderDevice::query_viewport`].
    pub fn set_viewport(&self, width: u32, height: u32) {
        self.state.lock().viewport = Viewport::new(width, height);
    }

    /// Pretend to be a different backend. Only shaders in that backend's
    /// native format are accepted afterwards.
    pub fn set_backend(&self, backend: GraphicsBackend) {
        self.state.lock().backend = backend;
    }

    pub fn set_max_texture_dimension(&self, max: u32) {
        self.state.lock().limits.max_texture_dimension = max;
    }

    /// Make the next [`RenderDevice::submit`] fail with `SubmitFailed`.
    pub fn fail_next_submit(&self, reason: impl Into<String>) {
        self.state.lock().fail_next_submit = Some(reason.into());
    }

    /// Make the next [`RenderDevice::update_texture`] fail with `Backend`.
    /// The texture is left untouched.
    pub fn fail_next_texture_update(&self, reason: impl Into<String>) {
        self.state.lock().fail_next_texture_update = Some(reason.into());
    }

    /// Make the next [`RenderDevice::create_resource_set`] fail with `Backend`.
    pub fn fail_next_resource_set(&self, reason: impl Into<String>) {
        self.state.lock().fail_next_resource_set = Some(reason.into());
    }

    // Recorded calls

    /// Get a copy of all recorded calls.
    pub fn calls(&self) -> Vec<DeviceCall> {
        self.calls.lock().clone()
    }

    /// Clear recorded calls and submissions (useful between test steps).
    pub fn clear_calls(&self) {
        self.calls.lock().clear();
        self.state.lock().submissions.clear();
    }

    /// Get total number of recorded calls.
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    fn count(&self, pred: impl Fn(&DeviceCall) -> bool) -> usize {
        self.calls.lock().iter().filter(|call| pred(call)).count()
    }

    pub fn count_buffer_creates(&self) -> usize {
        self.count(|call| matches!(call, DeviceCall::CreateBuffer { .. }))
    }

    /// Count immediate buffer writes (not the ones recorded in command lists).
    pub fn count_buffer_updates(&self) -> usize {
        self.count(|call| matches!(call, DeviceCall::UpdateBuffer { .. }))
    }

    pub fn count_texture_creates(&self) -> usize {
        self.count(|call| matches!(call, DeviceCall::CreateTexture { .. }))
    }

    pub fn count_texture_updates(&self) -> usize {
        self.count(|call| matches!(call, DeviceCall::UpdateTexture { .. }))
    }

    pub fn count_pipeline_creates(&self) -> usize {
        self.count(|call| matches!(call, DeviceCall::CreatePipeline { .. }))
    }

    pub fn count_resource_set_creates(&self) -> usize {
        self.count(|call| matches!(call, DeviceCall::CreateResourceSet { .. }))
    }

    pub fn count_destroys(&self) -> usize {
        self.count(|call| matches!(call, DeviceCall::Destroy(_)))
    }

    // Executed work

    pub fn submissions(&self) -> Vec<Submission> {
        self.state.lock().submissions.clone()
    }

    pub fn submit_count(&self) -> usize {
        self.state.lock().submissions.len()
    }

    /// All executed draws across submissions, in order.
    pub fn draws(&self) -> Vec<SubmittedDraw> {
        self.state
            .lock()
            .submissions
            .iter()
            .flat_map(|s| s.draws.iter().cloned())
            .collect()
    }

    pub fn draw_count(&self) -> usize {
        self.state
            .lock()
            .submissions
            .iter()
            .map(|s| s.draws.len())
            .sum()
    }

    // Resource inspection

    pub fn buffer_data(&self, buffer: BufferId) -> Option<Vec<u8>> {
        self.state.lock().buffers.get(&buffer).map(|b| b.data.clone())
    }

    pub fn texture_data(&self, texture: TextureId) -> Option<Vec<u8>> {
        self.state
            .lock()
            .textures
            .get(&texture)
            .map(|t| t.data.clone())
    }

    pub fn texture_size(&self, texture: TextureId) -> Option<(u32, u32)> {
        self.state
            .lock()
            .textures
            .get(&texture)
            .map(|t| (t.width, t.height))
    }

    /// Whether the resource exists and has not been destroyed.
    pub fn is_alive(&self, resource: impl Into<ResourceId>) -> bool {
        let state = self.state.lock();
        match resource.into() {
            ResourceId::Buffer(id) => state.buffers.contains_key(&id),
            ResourceId::Texture(id) => state.textures.contains_key(&id),
            ResourceId::Shader(id) => state.shaders.contains_key(&id),
            ResourceId::Pipeline(id) => state.pipelines.contains_key(&id),
            ResourceId::ResourceLayout(id) => state.layouts.contains_key(&id),
            ResourceId::ResourceSet(id) => state.sets.contains_key(&id),
        }
    }

    /// Number of resources that are still alive.
    pub fn live_resource_count(&self) -> usize {
        let state = self.state.lock();
        state.buffers.len()
            + state.textures.len()
            + state.shaders.len()
            + state.pipelines.len()
            + state.layouts.len()
            + state.sets.len()
    }

    fn record(&self, call: DeviceCall) {
        self.calls.lock().push(call);
    }
}

impl Default for MockDevice {
    fn default() -> Self {
        Self::new()
    }
}

fn check_range(offset: u64, len: u64, capacity: u64) -> DeviceResult<()> {
    match offset.checked_add(len) {
        Some(end) if end <= capacity => Ok(()),
        _ => Err(DeviceError::OutOfBounds {
            offset,
            len,
            capacity,
        }),
    }
}

impl MockState {
    fn texture_of_set(&self, set: ResourceSetId) -> Option<TextureId> {
        self.sets.get(&set)?.iter().find_map(|binding| match binding {
            ResourceBinding::Texture(id) => Some(*id),
            _ => None,
        })
    }

    /// Replay a command list and capture its draws.
    fn execute(&mut self, commands: &[Command]) -> DeviceResult<Submission> {
        let mut submission = Submission::default();
        let mut pipeline = None;
        let mut sets: Vec<(u32, ResourceSetId)> = Vec::new();
        let mut vertex_buffer = None;
        let mut index_buffer = None;

        for command in commands {
            match command {
                Command::Clear(color) => {
                    if submission.clear.is_none() {
                        submission.clear = Some(*color);
                    }
                }
                Command::SetPipeline(id) => {
                    if !self.pipelines.contains_key(id) {
                        return Err(DeviceError::InvalidHandle((*id).into()));
                    }
                    pipeline = Some(*id);
                }
                Command::SetResourceSet { slot, set } => {
                    if !self.sets.contains_key(set) {
                        return Err(DeviceError::InvalidHandle((*set).into()));
                    }
                    sets.retain(|(s, _)| s != slot);
                    sets.push((*slot, *set));
                    sets.sort_by_key(|(s, _)| *s);
                }
                Command::SetVertexBuffer(id) => {
                    if !self.buffers.contains_key(id) {
                        return Err(DeviceError::InvalidHandle((*id).into()));
                    }
                    vertex_buffer = Some(*id);
                }
                Command::SetIndexBuffer { buffer, format } => {
                    if !self.buffers.contains_key(buffer) {
                        return Err(DeviceError::InvalidHandle((*buffer).into()));
                    }
                    index_buffer = Some((*buffer, *format));
                }
                Command::UpdateBuffer {
                    buffer,
                    offset,
                    data,
                } => {
                    let target = self
                        .buffers
                        .get_mut(buffer)
                        .ok_or(DeviceError::InvalidHandle((*buffer).into()))?;
                    check_range(*offset, data.len() as u64, target.data.len() as u64)?;
                    let start = *offset as usize;
                    target.data[start..start + data.len()].copy_from_slice(data);
                }
                Command::DrawIndexed {
                    index_count,
                    first_index,
                    base_vertex,
                } => {
                    let (Some(pipeline), Some(vertex_buffer), Some((index_buffer, format))) =
                        (pipeline, vertex_buffer, index_buffer)
                    else {
                        return Err(DeviceError::CommandList(
                            "draw issued without pipeline, vertex buffer and index buffer".into(),
                        ));
                    };
                    let stride = self
                        .pipelines
                        .get(&pipeline)
                        .map(|p| p.stride)
                        .ok_or(DeviceError::InvalidHandle(pipeline.into()))?;

                    let index_bytes = &self
                        .buffers
                        .get(&index_buffer)
                        .ok_or(DeviceError::InvalidHandle(index_buffer.into()))?
                        .data;
                    let index_size = format.size();
                    let start = *first_index as u64 * index_size;
                    let len = *index_count as u64 * index_size;
                    check_range(start, len, index_bytes.len() as u64)?;
                    let raw = &index_bytes[start as usize..(start + len) as usize];
                    let indices: Vec<u32> = match format {
                        IndexFormat::Uint16 => bytemuck::pod_collect_to_vec::<u8, u16>(raw)
                            .into_iter()
                            .map(u32::from)
                            .collect(),
                        IndexFormat::Uint32 => bytemuck::pod_collect_to_vec::<u8, u32>(raw),
                    };

                    let vertex_bytes = &self
                        .buffers
                        .get(&vertex_buffer)
                        .ok_or(DeviceError::InvalidHandle(vertex_buffer.into()))?
                        .data;
                    let vertex_count = indices.iter().max().map_or(0, |max| *max as u64 + 1);
                    let first = (*base_vertex).max(0) as u64 * stride;
                    let len = vertex_count * stride;
                    check_range(first, len, vertex_bytes.len() as u64)?;
                    let snapshot = vertex_bytes[first as usize..(first + len) as usize].to_vec();

                    submission.draws.push(SubmittedDraw {
                        pipeline,
                        resource_sets: sets.clone(),
                        texture: sets.iter().find_map(|(_, set)| self.texture_of_set(*set)),
                        index_count: *index_count,
                        first_index: *first_index,
                        base_vertex: *base_vertex,
                        indices,
                        stride,
                        vertex_bytes: snapshot,
                    });
                }
            }
        }

        Ok(submission)
    }
}

impl RenderDevice for MockDevice {
    fn backend(&self) -> GraphicsBackend {
        self.state.lock().backend
    }

    fn limits(&self) -> DeviceLimits {
        self.state.lock().limits
    }

    fn create_buffer(&self, desc: &BufferDesc) -> DeviceResult<BufferId> {
        let mut state = self.state.lock();
        if desc.size == 0 || desc.size > state.limits.max_buffer_size {
            return Err(DeviceError::Backend(format!(
                "invalid buffer size {} (max {})",
                desc.size, state.limits.max_buffer_size
            )));
        }

        let id = BufferId::from_raw(self.handles.next());
        state.buffers.insert(
            id,
            MockBuffer {
                usage: desc.usage,
                data: vec![0; desc.size as usize],
            },
        );
        self.record(DeviceCall::CreateBuffer {
            id,
            size: desc.size,
            usage: desc.usage,
        });
        Ok(id)
    }

    fn update_buffer(&self, buffer: BufferId, offset: u64, data: &[u8]) -> DeviceResult<()> {
        let mut state = self.state.lock();
        let target = state
            .buffers
            .get_mut(&buffer)
            .ok_or(DeviceError::InvalidHandle(buffer.into()))?;
        check_range(offset, data.len() as u64, target.data.len() as u64)?;
        let start = offset as usize;
        target.data[start..start + data.len()].copy_from_slice(data);

        self.record(DeviceCall::UpdateBuffer {
            buffer,
            offset,
            size: data.len(),
        });
        Ok(())
    }

    fn create_texture(&self, desc: &TextureDesc) -> DeviceResult<TextureId> {
        let mut state = self.state.lock();
        let max = state.limits.max_texture_dimension;
        if desc.width == 0 || desc.height == 0 || desc.width > max || desc.height > max {
            return Err(DeviceError::TextureTooLarge {
                width: desc.width,
                height: desc.height,
                max,
            });
        }

        let id = TextureId::from_raw(self.handles.next());
        let len = desc.width as usize * desc.height as usize * desc.format.bytes_per_pixel() as usize;
        state.textures.insert(
            id,
            MockTexture {
                width: desc.width,
                height: desc.height,
                format: desc.format,
                data: vec![0; len],
            },
        );
        self.record(DeviceCall::CreateTexture {
            id,
            width: desc.width,
            height: desc.height,
            format: desc.format,
        });
        Ok(id)
    }

    fn update_texture(
        &self,
        texture: TextureId,
        region: TextureRegion,
        data: &[u8],
    ) -> DeviceResult<()> {
        let mut state = self.state.lock();
        if let Some(reason) = state.fail_next_texture_update.take() {
            return Err(DeviceError::Backend(reason));
        }
        let target = state
            .textures
            .get_mut(&texture)
            .ok_or(DeviceError::InvalidHandle(texture.into()))?;

        let bounds = TextureRegion::new(0, 0, target.width, target.height);
        if !bounds.contains_rect(&region) {
            return Err(DeviceError::OutOfBounds {
                offset: region.y as u64 * target.width as u64 + region.x as u64,
                len: region.width as u64 * region.height as u64,
                capacity: target.width as u64 * target.height as u64,
            });
        }

        let bpp = target.format.bytes_per_pixel() as usize;
        let row_len = region.width as usize * bpp;
        if data.len() != row_len * region.height as usize {
            return Err(DeviceError::Backend(format!(
                "texture data is {} bytes, region {}x{} needs {}",
                data.len(),
                region.width,
                region.height,
                row_len * region.height as usize
            )));
        }

        let pitch = target.width as usize * bpp;
        for (row, src) in data.chunks_exact(row_len.max(1)).enumerate() {
            let dst = (region.y as usize + row) * pitch + region.x as usize * bpp;
            target.data[dst..dst + row_len].copy_from_slice(src);
        }

        self.record(DeviceCall::UpdateTexture { texture, region });
        Ok(())
    }

    fn create_shader(&self, desc: &ShaderDesc) -> DeviceResult<ShaderId> {
        let mut state = self.state.lock();
        if desc.format != state.backend.shader_format() {
            return Err(DeviceError::UnsupportedFormat(format!(
                "{:?} shader on the {} backend",
                desc.format, state.backend
            )));
        }

        let id = ShaderId::from_raw(self.handles.next());
        state.shaders.insert(id, desc.stage);
        self.record(DeviceCall::CreateShader {
            id,
            stage: desc.stage,
            format: desc.format,
        });
        Ok(id)
    }

    fn create_pipeline(&self, desc: &PipelineDesc) -> DeviceResult<PipelineId> {
        let mut state = self.state.lock();
        for (shader, stage) in [
            (desc.vertex_shader, ShaderStage::Vertex),
            (desc.fragment_shader, ShaderStage::Fragment),
        ] {
            match state.shaders.get(&shader) {
                Some(actual) if *actual == stage => {}
                Some(actual) => {
                    return Err(DeviceError::Backend(format!(
                        "{} is a {} shader, expected {}",
                        shader, actual, stage
                    )));
                }
                None => return Err(DeviceError::InvalidHandle(shader.into())),
            }
        }
        if let Some(layout) = desc
            .resource_layouts
            .iter()
            .find(|layout| !state.layouts.contains_key(*layout))
        {
            return Err(DeviceError::InvalidHandle((*layout).into()));
        }

        let id = PipelineId::from_raw(self.handles.next());
        state.pipelines.insert(
            id,
            MockPipeline {
                stride: desc.vertex_layout.stride,
            },
        );
        self.record(DeviceCall::CreatePipeline {
            id,
            label: desc.label.map(|s| s.to_string()),
            blend: desc.blend,
        });
        Ok(id)
    }

    fn create_resource_layout(&self, desc: &ResourceLayoutDesc) -> DeviceResult<ResourceLayoutId> {
        let mut state = self.state.lock();
        let id = ResourceLayoutId::from_raw(self.handles.next());
        state
            .layouts
            .insert(id, desc.entries.iter().map(|e| e.kind).collect());
        self.record(DeviceCall::CreateResourceLayout { id });
        Ok(id)
    }

    fn create_resource_set(&self, desc: &ResourceSetDesc) -> DeviceResult<ResourceSetId> {
        let mut state = self.state.lock();
        if let Some(reason) = state.fail_next_resource_set.take() {
            return Err(DeviceError::Backend(reason));
        }
        let kinds = state
            .layouts
            .get(&desc.layout)
            .ok_or(DeviceError::InvalidHandle(desc.layout.into()))?;

        let bound: Vec<ResourceKind> = desc.bindings.iter().map(|b| b.kind()).collect();
        if *kinds != bound {
            return Err(DeviceError::Backend(format!(
                "bindings {:?} do not match layout {:?}",
                bound, kinds
            )));
        }
        for binding in desc.bindings {
            match binding {
                ResourceBinding::Buffer(id) => match state.buffers.get(id) {
                    Some(buffer) if buffer.usage.contains(BufferUsage::UNIFORM) => {}
                    Some(_) => {
                        return Err(DeviceError::Backend(format!(
                            "{} is not a uniform buffer",
                            id
                        )));
                    }
                    None => return Err(DeviceError::InvalidHandle((*id).into())),
                },
                ResourceBinding::Texture(id) if !state.textures.contains_key(id) => {
                    return Err(DeviceError::InvalidHandle((*id).into()));
                }
                _ => {}
            }
        }

        let id = ResourceSetId::from_raw(self.handles.next());
        state.sets.insert(id, desc.bindings.to_vec());
        self.record(DeviceCall::CreateResourceSet {
            id,
            bindings: desc.bindings.to_vec(),
        });
        Ok(id)
    }

    fn query_viewport(&self) -> Viewport {
        self.state.lock().viewport
    }

    fn submit(&self, list: CommandList) -> DeviceResult<()> {
        if !list.is_closed() {
            return Err(DeviceError::CommandList(
                "command list must be ended before submission".into(),
            ));
        }

        let mut state = self.state.lock();
        if let Some(reason) = state.fail_next_submit.take() {
            return Err(DeviceError::SubmitFailed(reason));
        }

        let submission = state.execute(list.commands())?;
        self.record(DeviceCall::Submit {
            commands: list.len(),
            draws: submission.draws.len(),
        });
        state.submissions.push(submission);
        Ok(())
    }

    fn destroy(&self, resource: ResourceId) {
        let mut state = self.state.lock();
        let removed = match resource {
            ResourceId::Buffer(id) => state.buffers.remove(&id).is_some(),
            ResourceId::Texture(id) => state.textures.remove(&id).is_some(),
            ResourceId::Shader(id) => state.shaders.remove(&id).is_some(),
            ResourceId::Pipeline(id) => state.pipelines.remove(&id).is_some(),
            ResourceId::ResourceLayout(id) => state.layouts.remove(&id).is_some(),
            ResourceId::ResourceSet(id) => state.sets.remove(&id).is_some(),
        };
        if removed {
            self.record(DeviceCall::Destroy(resource));
        } else {
            tracing::warn!("destroy of unknown resource {}", resource);
        }
    }
}
