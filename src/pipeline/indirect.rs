//! Binary layouts of indirect argument buffers.
//!
//! These structures are written by compute shaders (or uploaded from the CPU) and read back by `ExecuteIndirect`.
//! Field order and size are fixed, so every layout is checked at compile time.

use std::mem::size_of;

use bytemuck::{Pod, Zeroable};
use static_assertions::const_assert_eq;

/// Arguments of an indexed, instanced draw.
#[repr(C)]
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Pod, Zeroable)]
pub struct DrawIndexedArguments {
    pub index_count_per_instance: u32,
    pub instance_count: u32,
    pub start_index_location: u32,
    pub base_vertex_location: i32,
    pub start_instance_location: u32,
}

/// Arguments of a non-indexed, instanced draw.
#[repr(C)]
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Pod, Zeroable)]
pub struct DrawArguments {
    pub vertex_count_per_instance: u32,
    pub instance_count: u32,
    pub start_vertex_location: u32,
    pub start_instance_location: u32,
}

/// Thread group counts of a dispatch.
#[repr(C)]
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Pod, Zeroable)]
pub struct DispatchArguments {
    pub thread_group_count_x: u32,
    pub thread_group_count_y: u32,
    pub thread_group_count_z: u32,
}

/// Draw of one mesh: a root constant with the offset of its first instance, followed by the draw.
#[repr(C)]
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Pod, Zeroable)]
pub struct DrawMeshCommand {
    pub instance_offset: u32,
    pub draw: DrawIndexedArguments,
}

/// Summed area table construction for one shadow map tile: the tile origin as two root constants,
/// followed by the dispatch.
#[repr(C)]
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Pod, Zeroable)]
pub struct CreateSatCommand {
    pub tile_top_left: [u32; 2],
    pub dispatch: DispatchArguments,
}

/// Range of consecutive commands in an argument buffer.
#[repr(C)]
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Pod, Zeroable)]
pub struct CommandRange {
    pub start: u32,
    pub count: u32,
}

const_assert_eq!(size_of::<DrawIndexedArguments>(), 20);
const_assert_eq!(size_of::<DrawArguments>(), 16);
const_assert_eq!(size_of::<DispatchArguments>(), 12);
const_assert_eq!(size_of::<DrawMeshCommand>(), 24);
const_assert_eq!(size_of::<CreateSatCommand>(), 20);
const_assert_eq!(size_of::<CommandRange>(), 8);
