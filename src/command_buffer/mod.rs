//! Command lists, queues and the command list pool.
//!
//! Most functions on [`CommandList`] are a thin wrapper that appends one [`Command`]. A command list is either
//! closed or recording. [`CommandList::begin`] opens it and drops whatever it held before, [`CommandList::end`]
//! closes it so it can be submitted to a [`CommandQueue`](queue::CommandQueue). Recording into a closed list, or
//! submitting a list that is still recording, is a programming error and panics.
//!
//! # Example
//! ```ignore
//! let mut cmd = CommandList::new("clear voxel grid");
//! cmd.begin(Some(&pipeline));
//! cmd.set_compute_root_signature(&root_signature);
//! tracker.flush(&mut cmd);
//! cmd.dispatch(16, 16, 16);
//! cmd.end();
//! env.queue.execute_command_lists(&[&cmd])?;
//! ```

use crate::command_buffer::command::{BindPoint, Command, PrimitiveTopology};
use crate::command_buffer::viewport::{Rect, Viewport};
use crate::descriptor::heap::{DescriptorHandle, DescriptorHeap};
use crate::graph::barrier::ResourceBarrier;
use crate::pipeline::command_signature::CommandSignature;
use crate::pipeline::pipeline_state::PipelineState;
use crate::pipeline::root_signature::RootSignature;
use crate::resource::buffer::Buffer;
use crate::resource::GraphicsResource;
use crate::resource::query_heap::QueryHeap;

pub mod command;
pub mod pool;
pub mod queue;
pub mod viewport;

/// Recording state of a command list.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CommandListState {
    Closed,
    Recording,
}

/// A list of recorded commands.
#[derive(Debug)]
pub struct CommandList {
    name: String,
    state: CommandListState,
    commands: Vec<Command>,
}

impl CommandList {
    /// Create a new, closed command list.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: CommandListState::Closed,
            commands: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> CommandListState {
        self.state
    }

    pub fn is_recording(&self) -> bool {
        self.state == CommandListState::Recording
    }

    /// Recorded commands, in order.
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Start recording, discarding previous contents. Optionally sets an initial pipeline state.
    /// # Panics
    /// Panics if the list is already recording.
    pub fn begin(&mut self, pipeline: Option<&PipelineState>) {
        assert_eq!(self.state, CommandListState::Closed, "Command list `{}` is already recording.", self.name);
        self.commands.clear();
        self.state = CommandListState::Recording;
        if let Some(pipeline) = pipeline {
            self.set_pipeline_state(pipeline);
        }
    }

    /// Stop recording.
    /// # Panics
    /// Panics if the list is not recording.
    pub fn end(&mut self) {
        assert_eq!(self.state, CommandListState::Recording, "Command list `{}` is not recording.", self.name);
        self.state = CommandListState::Closed;
    }

    fn push(&mut self, command: Command) {
        assert_eq!(
            self.state,
            CommandListState::Recording,
            "Recording {:?} into closed command list `{}`.",
            command,
            self.name
        );
        self.commands.push(command);
    }

    /// Record a batch of transitions as a single call.
    /// # Panics
    /// Panics on an empty batch.
    pub fn resource_barrier(&mut self, barriers: &[ResourceBarrier]) {
        assert!(!barriers.is_empty(), "Empty barrier batch recorded into `{}`.", self.name);
        debug!("`{}`: {} barrier(s)", self.name, barriers.len());
        self.push(Command::ResourceBarrier(barriers.to_vec()));
    }

    pub fn set_descriptor_heaps(&mut self, heaps: &[&DescriptorHeap]) {
        assert!(
            heaps.iter().all(|heap| heap.is_shader_visible()),
            "Only shader visible heaps can be bound to `{}`.",
            self.name
        );
        self.push(Command::SetDescriptorHeaps(heaps.iter().map(|heap| heap.id()).collect()));
    }

    pub fn set_pipeline_state(&mut self, pipeline: &PipelineState) {
        self.push(Command::SetPipelineState(pipeline.id()));
    }

    pub fn set_compute_root_signature(&mut self, root_signature: &RootSignature) {
        self.push(Command::SetRootSignature {
            bind_point: BindPoint::Compute,
            root_signature: root_signature.id(),
        });
    }

    pub fn set_graphics_root_signature(&mut self, root_signature: &RootSignature) {
        self.push(Command::SetRootSignature {
            bind_point: BindPoint::Graphics,
            root_signature: root_signature.id(),
        });
    }

    pub fn set_root_32bit_constants(&mut self, bind_point: BindPoint, index: u32, values: &[u32], dest_offset: u32) {
        self.push(Command::SetRootConstants {
            bind_point,
            index,
            dest_offset,
            values: values.to_vec(),
        });
    }

    pub fn set_root_constant_buffer_view(&mut self, bind_point: BindPoint, index: u32, buffer: &Buffer) {
        self.push(Command::SetRootConstantBufferView {
            bind_point,
            index,
            buffer: buffer.id(),
        });
    }

    pub fn set_root_shader_resource_view(&mut self, bind_point: BindPoint, index: u32, buffer: &Buffer) {
        self.push(Command::SetRootShaderResourceView {
            bind_point,
            index,
            buffer: buffer.id(),
        });
    }

    pub fn set_root_descriptor_table(&mut self, bind_point: BindPoint, index: u32, table: DescriptorHandle) {
        self.push(Command::SetRootDescriptorTable { bind_point, index, table });
    }

    /// Bind render targets and an optional depth stencil view.
    pub fn set_render_targets(&mut self, render_targets: &[DescriptorHandle], depth_stencil: Option<DescriptorHandle>) {
        self.push(Command::SetRenderTargets {
            render_targets: render_targets.to_vec(),
            depth_stencil,
        });
    }

    pub fn clear_render_target_view(&mut self, view: DescriptorHandle, color: [f32; 4]) {
        self.push(Command::ClearRenderTargetView { view, color });
    }

    pub fn clear_depth_stencil_view(&mut self, view: DescriptorHandle, depth: f32) {
        self.push(Command::ClearDepthStencilView { view, depth });
    }

    /// Clear a UAV to integer values. The view must be reachable both through a shader visible table slot and
    /// through its staging descriptor.
    pub fn clear_unordered_access_view_uint(
        &mut self,
        table_slot: DescriptorHandle,
        view: DescriptorHandle,
        resource: &dyn GraphicsResource,
        values: [u32; 4],
    ) {
        self.push(Command::ClearUnorderedAccessViewUint {
            table_slot,
            view,
            resource: resource.id(),
            values,
        });
    }

    pub fn set_viewport(&mut self, viewport: &Viewport) {
        self.push(Command::SetViewport(*viewport));
    }

    pub fn set_scissor(&mut self, rect: &Rect) {
        self.push(Command::SetScissor(*rect));
    }

    /// Set the viewport and a scissor rectangle covering exactly the same area.
    pub fn set_viewport_and_scissor(&mut self, viewport: &Viewport) {
        self.set_viewport(viewport);
        self.set_scissor(&Rect::from_viewport(viewport));
    }

    pub fn set_primitive_topology(&mut self, topology: PrimitiveTopology) {
        self.push(Command::SetPrimitiveTopology(topology));
    }

    pub fn set_vertex_buffers(&mut self, buffers: &[&Buffer]) {
        self.push(Command::SetVertexBuffers(buffers.iter().map(|buffer| buffer.id()).collect()));
    }

    pub fn set_index_buffer(&mut self, buffer: Option<&Buffer>) {
        self.push(Command::SetIndexBuffer(buffer.map(|buffer| buffer.id())));
    }

    pub fn draw_instanced(&mut self, vertex_count: u32, instance_count: u32, start_vertex: u32, start_instance: u32) {
        self.push(Command::DrawInstanced {
            vertex_count,
            instance_count,
            start_vertex,
            start_instance,
        });
    }

    pub fn draw_indexed_instanced(
        &mut self,
        index_count: u32,
        instance_count: u32,
        start_index: u32,
        base_vertex: i32,
        start_instance: u32,
    ) {
        self.push(Command::DrawIndexedInstanced {
            index_count,
            instance_count,
            start_index,
            base_vertex,
            start_instance,
        });
    }

    /// Draw one triangle covering the whole viewport. The vertex shader generates the vertices, so no vertex or
    /// index buffers are bound.
    pub fn draw_fullscreen_triangle(&mut self) {
        self.set_primitive_topology(PrimitiveTopology::TriangleList);
        self.set_vertex_buffers(&[]);
        self.set_index_buffer(None);
        self.draw_instanced(3, 1, 0, 0);
    }

    pub fn dispatch(&mut self, x: u32, y: u32, z: u32) {
        if x == 0 || y == 0 || z == 0 {
            warn!("`{}`: empty dispatch ({}, {}, {})", self.name, x, y, z);
        }
        self.push(Command::Dispatch { x, y, z });
    }

    /// Execute up to `max_commands` records of `arguments`. If a count buffer is given, the actual number of records
    /// is read from it on the device.
    pub fn execute_indirect(
        &mut self,
        signature: &CommandSignature,
        max_commands: u32,
        arguments: &Buffer,
        argument_offset: u64,
        count: Option<&Buffer>,
        count_offset: u64,
    ) {
        assert!(
            argument_offset + max_commands as u64 * signature.stride() as u64 <= arguments.size(),
            "Argument buffer `{}` is too small for {} commands.",
            arguments.name(),
            max_commands
        );
        self.push(Command::ExecuteIndirect {
            signature: signature.id(),
            max_commands,
            arguments: arguments.id(),
            argument_offset,
            count: count.map(|buffer| buffer.id()),
            count_offset,
        });
    }

    pub fn copy_resource(&mut self, dst: &dyn GraphicsResource, src: &dyn GraphicsResource) {
        self.push(Command::CopyResource {
            dst: dst.id(),
            src: src.id(),
        });
    }

    pub fn copy_buffer_region(&mut self, dst: &Buffer, dst_offset: u64, src: &Buffer, src_offset: u64, size: u64) {
        assert!(dst_offset + size <= dst.size(), "Copy out of range of `{}`.", dst.name());
        assert!(src_offset + size <= src.size(), "Copy out of range of `{}`.", src.name());
        self.push(Command::CopyBufferRegion {
            dst: dst.id(),
            dst_offset,
            src: src.id(),
            src_offset,
            size,
        });
    }

    /// Write a timestamp into query `index`.
    pub fn end_query(&mut self, heap: &QueryHeap, index: u32) {
        assert!(index < heap.count(), "Query {} out of range of heap with {} queries.", index, heap.count());
        self.push(Command::EndQuery { heap: heap.id(), index });
    }

    /// Copy `count` query results starting at `start` into `dst` at `dst_offset`.
    pub fn resolve_query_data(&mut self, heap: &QueryHeap, start: u32, count: u32, dst: &Buffer, dst_offset: u64) {
        assert!(start + count <= heap.count(), "Query range out of range of heap.");
        assert!(dst_offset + 8 * count as u64 <= dst.size(), "Query results do not fit in `{}`.", dst.name());
        self.push(Command::ResolveQueryData {
            heap: heap.id(),
            start,
            count,
            dst: dst.id(),
            dst_offset,
        });
    }

    /// Open a named region, visible in graphics debuggers.
    pub fn begin_event(&mut self, name: &str) {
        #[cfg(feature = "debug-markers")]
        self.push(Command::BeginEvent(name.to_owned()));
        #[cfg(not(feature = "debug-markers"))]
        let _ = name;
    }

    pub fn end_event(&mut self) {
        #[cfg(feature = "debug-markers")]
        self.push(Command::EndEvent);
    }
}
