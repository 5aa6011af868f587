//! CPU-side command recording.
//!
//! A [`CommandList`] is plain data. Adapters replay it in order on
//! [`RenderDevice::submit`](crate::RenderDevice::submit), so a buffer update
//! recorded between two draws is only visible to the second one.

use crate::error::{DeviceError, DeviceResult};
use crate::handles::{BufferId, PipelineId, ResourceSetId};
use crate::types::IndexFormat;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Clear the render target before any following draw.
    Clear([f32; 4]),
    SetPipeline(PipelineId),
    SetResourceSet {
        slot: u32,
        set: ResourceSetId,
    },
    SetVertexBuffer(BufferId),
    SetIndexBuffer {
        buffer: BufferId,
        format: IndexFormat,
    },
    UpdateBuffer {
        buffer: BufferId,
        offset: u64,
        data: Vec<u8>,
    },
    DrawIndexed {
        index_count: u32,
        first_index: u32,
        base_vertex: i32,
    },
}

/// An ordered list of commands, open for recording until [`end`](Self::end).
#[derive(Debug, Clone, Default)]
pub struct CommandList {
    commands: Vec<Command>,
    closed: bool,
}

impl CommandList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, command: Command) -> DeviceResult<()> {
        if self.closed {
            return Err(DeviceError::CommandList(format!(
                "cannot record {} into a closed command list",
                command_name(&command)
            )));
        }
        self.commands.push(command);
        Ok(())
    }

    pub fn clear(&mut self, color: [f32; 4]) -> DeviceResult<()> {
        self.record(Command::Clear(color))
    }

    pub fn set_pipeline(&mut self, pipeline: PipelineId) -> DeviceResult<()> {
        self.record(Command::SetPipeline(pipeline))
    }

    pub fn set_resource_set(&mut self, slot: u32, set: ResourceSetId) -> DeviceResult<()> {
        self.record(Command::SetResourceSet { slot, set })
    }

    pub fn set_vertex_buffer(&mut self, buffer: BufferId) -> DeviceResult<()> {
        self.record(Command::SetVertexBuffer(buffer))
    }

    pub fn set_index_buffer(&mut self, buffer: BufferId, format: IndexFormat) -> DeviceResult<()> {
        self.record(Command::SetIndexBuffer { buffer, format })
    }

    pub fn update_buffer(&mut self, buffer: BufferId, offset: u64, data: &[u8]) -> DeviceResult<()> {
        self.record(Command::UpdateBuffer {
            buffer,
            offset,
            data: data.to_vec(),
        })
    }

    pub fn draw_indexed(
        &mut self,
        index_count: u32,
        first_index: u32,
        base_vertex: i32,
    ) -> DeviceResult<()> {
        self.record(Command::DrawIndexed {
            index_count,
            first_index,
            base_vertex,
        })
    }

    /// Close the list. Further recording fails.
    pub fn end(&mut self) {
        self.closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Number of draw commands recorded so far.
    pub fn draw_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, Command::DrawIndexed { .. }))
            .count()
    }

    pub fn into_commands(self) -> Vec<Command> {
        self.commands
    }
}

fn command_name(command: &Command) -> &'static str {
    match command {
        Command::Clear(_) => "Clear",
        Command::SetPipeline(_) => "SetPipeline",
        Command::SetResourceSet { .. } => "SetResourceSet",
        Command::SetVertexBuffer(_) => "SetVertexBuffer",
        Command::SetIndexBuffer { .. } => "SetIndexBuffer",
        Command::UpdateBuffer { .. } => "UpdateBuffer",
        Command::DrawIndexed { .. } => "DrawIndexed",
    }
}
