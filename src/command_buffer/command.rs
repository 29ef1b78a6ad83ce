//! The commands a [`CommandList`](crate::command_buffer::CommandList) can hold.

use crate::command_buffer::viewport::{Rect, Viewport};
use crate::core::backend::ObjectId;
use crate::descriptor::heap::DescriptorHandle;
use crate::graph::barrier::ResourceBarrier;
use crate::resource::ResourceId;

/// Pipeline a root argument is bound for.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum BindPoint {
    Compute,
    Graphics,
}

/// How the input assembler assembles primitives.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PrimitiveTopology {
    PointList,
    LineList,
    TriangleList,
    TriangleStrip,
}

/// A single recorded command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    ResourceBarrier(Vec<ResourceBarrier>),
    SetDescriptorHeaps(Vec<ObjectId>),
    SetRootSignature { bind_point: BindPoint, root_signature: ObjectId },
    SetPipelineState(ObjectId),
    SetRootConstants { bind_point: BindPoint, index: u32, dest_offset: u32, values: Vec<u32> },
    SetRootConstantBufferView { bind_point: BindPoint, index: u32, buffer: ResourceId },
    SetRootShaderResourceView { bind_point: BindPoint, index: u32, buffer: ResourceId },
    SetRootDescriptorTable { bind_point: BindPoint, index: u32, table: DescriptorHandle },
    SetRenderTargets { render_targets: Vec<DescriptorHandle>, depth_stencil: Option<DescriptorHandle> },
    ClearRenderTargetView { view: DescriptorHandle, color: [f32; 4] },
    ClearDepthStencilView { view: DescriptorHandle, depth: f32 },
    ClearUnorderedAccessViewUint { table_slot: DescriptorHandle, view: DescriptorHandle, resource: ResourceId, values: [u32; 4] },
    SetViewport(Viewport),
    SetScissor(Rect),
    SetPrimitiveTopology(PrimitiveTopology),
    SetVertexBuffers(Vec<ResourceId>),
    SetIndexBuffer(Option<ResourceId>),
    DrawInstanced { vertex_count: u32, instance_count: u32, start_vertex: u32, start_instance: u32 },
    DrawIndexedInstanced { index_count: u32, instance_count: u32, start_index: u32, base_vertex: i32, start_instance: u32 },
    Dispatch { x: u32, y: u32, z: u32 },
    ExecuteIndirect {
        signature: ObjectId,
        max_commands: u32,
        arguments: ResourceId,
        argument_offset: u64,
        count: Option<ResourceId>,
        count_offset: u64,
    },
    CopyResource { dst: ResourceId, src: ResourceId },
    CopyBufferRegion { dst: ResourceId, dst_offset: u64, src: ResourceId, src_offset: u64, size: u64 },
    EndQuery { heap: ObjectId, index: u32 },
    ResolveQueryData { heap: ObjectId, start: u32, count: u32, dst: ResourceId, dst_offset: u64 },
    BeginEvent(String),
    EndEvent,
}
