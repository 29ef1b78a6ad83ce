//! Geometry shared by the passes that draw meshes.

use std::rc::Rc;

use anyhow::Result;

use crate::command_buffer::CommandList;
use crate::command_buffer::command::PrimitiveTopology;
use crate::core::render_env::RenderEnv;
use crate::math::frustum::Aabb;
use crate::pipeline::indirect::DrawIndexedArguments;
use crate::pipeline::pipeline_state::InputElement;
use crate::resource::buffer::{Buffer, BufferDesc};
use crate::resource::format::Format;
use crate::resource::state::ResourceState;

/// A range of the index buffer drawn once per instance.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub index_count: u32,
    pub start_index: u32,
    pub base_vertex: i32,
    /// World space bounds of every instance of the mesh.
    pub instance_bounds: Vec<Aabb>,
}

impl Mesh {
    pub fn new(index_count: u32, start_index: u32, base_vertex: i32) -> Self {
        Self {
            index_count,
            start_index,
            base_vertex,
            instance_bounds: Vec::new(),
        }
    }

    /// Add an instance with the given world space bounds.
    pub fn instance(mut self, bounds: Aabb) -> Self {
        self.instance_bounds.push(bounds);
        self
    }

    pub fn num_instances(&self) -> u32 {
        self.instance_bounds.len() as u32
    }

    /// Draw arguments for `instance_count` instances starting at instance 0.
    pub fn draw_arguments(&self, instance_count: u32) -> DrawIndexedArguments {
        DrawIndexedArguments {
            index_count_per_instance: self.index_count,
            instance_count,
            start_index_location: self.start_index,
            base_vertex_location: self.base_vertex,
            start_instance_location: 0,
        }
    }
}

/// Meshes sharing one vertex and one index buffer.
#[derive(Debug)]
pub struct MeshBatch {
    name: String,
    vertex_buffer: Rc<Buffer>,
    index_buffer: Rc<Buffer>,
    input_layout: Vec<InputElement>,
    meshes: Vec<Mesh>,
}

impl MeshBatch {
    /// Create the vertex and index buffers of a batch. Vertices are `vertex_stride` bytes, indices are 32 bit.
    pub fn new(
        env: &mut RenderEnv,
        name: &str,
        num_vertices: u64,
        vertex_stride: u64,
        num_indices: u64,
        input_layout: Vec<InputElement>,
        meshes: Vec<Mesh>,
    ) -> Result<Self> {
        for (index, mesh) in meshes.iter().enumerate() {
            assert!(
                mesh.start_index as u64 + mesh.index_count as u64 <= num_indices,
                "Mesh {} of batch `{}` reads past the end of the index buffer.",
                index,
                name
            );
        }
        let vertex_buffer = Buffer::new(
            &env.device,
            &mut env.heaps,
            BufferDesc::structured(format!("{name} vertices"), num_vertices, vertex_stride)
                .unordered_access(false)
                .initial_state(ResourceState::VertexAndConstantBuffer),
        )?;
        let index_buffer = Buffer::new(
            &env.device,
            &mut env.heaps,
            BufferDesc::formatted(format!("{name} indices"), num_indices, Format::R32Uint)
                .unordered_access(false)
                .initial_state(ResourceState::IndexBuffer),
        )?;
        Ok(Self {
            name: name.to_owned(),
            vertex_buffer: Rc::new(vertex_buffer),
            index_buffer: Rc::new(index_buffer),
            input_layout,
            meshes,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn vertex_buffer(&self) -> &Rc<Buffer> {
        &self.vertex_buffer
    }

    pub fn index_buffer(&self) -> &Rc<Buffer> {
        &self.index_buffer
    }

    pub fn input_layout(&self) -> &[InputElement] {
        &self.input_layout
    }

    pub fn meshes(&self) -> &[Mesh] {
        &self.meshes
    }

    pub fn num_meshes(&self) -> u32 {
        self.meshes.len() as u32
    }

    /// Total number of instances over all meshes.
    pub fn num_instances(&self) -> u32 {
        self.meshes.iter().map(Mesh::num_instances).sum()
    }

    /// Bind the vertex and index buffers as a triangle list.
    pub fn bind(&self, cmd: &mut CommandList) {
        cmd.set_primitive_topology(PrimitiveTopology::TriangleList);
        cmd.set_vertex_buffers(&[&*self.vertex_buffer]);
        cmd.set_index_buffer(Some(&*self.index_buffer));
    }
}
