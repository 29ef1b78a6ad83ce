//! The device abstraction everything in deimos records against.
//!
//! A [`Backend`] creates resources and pipeline objects, executes closed command lists and answers fence queries.
//! Object handles are plain ids. The [`HeadlessBackend`](crate::core::headless::HeadlessBackend) implements it
//! without a GPU.

use anyhow::Result;

use crate::command_buffer::CommandList;
use crate::descriptor::heap::{DescriptorHandle, DescriptorHeapDesc};
use crate::descriptor::sampler::SamplerDesc;
use crate::pipeline::command_signature::CommandSignatureDesc;
use crate::pipeline::pipeline_state::PipelineDesc;
use crate::pipeline::root_signature::RootSignatureDesc;
use crate::resource::{ResourceId, ViewType};
use crate::resource::buffer::BufferDesc;
use crate::resource::texture::TextureDesc;

/// Handle to a backend object that is not a resource: heaps, pipelines, queues, fences, ...
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u64);

/// Device operations needed by the renderer.
pub trait Backend: Send + Sync {
    /// Name of the backend, for logging.
    fn name(&self) -> &str;

    fn create_buffer(&self, desc: &BufferDesc) -> Result<ResourceId>;
    fn create_texture(&self, desc: &TextureDesc) -> Result<ResourceId>;

    fn create_descriptor_heap(&self, desc: &DescriptorHeapDesc) -> Result<ObjectId>;
    /// Write a view of `resource` into `dst`.
    fn create_view(&self, resource: ResourceId, ty: ViewType, dst: DescriptorHandle) -> Result<()>;
    fn create_sampler(&self, desc: &SamplerDesc, dst: DescriptorHandle) -> Result<()>;
    /// Copy a descriptor from a shader invisible heap into any heap.
    fn copy_descriptor(&self, dst: DescriptorHandle, src: DescriptorHandle) -> Result<()>;

    fn create_root_signature(&self, name: &str, desc: &RootSignatureDesc) -> Result<ObjectId>;
    /// Compile shaders and build a pipeline state object.
    fn create_pipeline_state(&self, name: &str, root_signature: ObjectId, desc: &PipelineDesc) -> Result<ObjectId>;
    fn create_command_signature(&self, name: &str, desc: &CommandSignatureDesc) -> Result<ObjectId>;
    fn create_query_heap(&self, count: u32) -> Result<ObjectId>;

    fn create_command_queue(&self, name: &str) -> Result<ObjectId>;
    fn execute_command_lists(&self, queue: ObjectId, lists: &[&CommandList]) -> Result<()>;
    /// Ticks per second of timestamps written on `queue`.
    fn timestamp_frequency(&self, queue: ObjectId) -> Result<u64>;

    fn create_fence(&self, initial_value: u64) -> Result<ObjectId>;
    /// Set `fence` to `value` once all work submitted to `queue` so far completed.
    fn signal(&self, queue: ObjectId, fence: ObjectId, value: u64) -> Result<()>;
    fn completed_value(&self, fence: ObjectId) -> Result<u64>;
    /// Block until `fence` reached `value`.
    fn wait_for_value(&self, fence: ObjectId, value: u64) -> Result<()>;

    /// Write CPU data into CPU visible buffer memory.
    fn write_buffer(&self, buffer: ResourceId, offset: u64, data: &[u8]) -> Result<()>;
    /// Read CPU visible buffer memory.
    fn read_buffer(&self, buffer: ResourceId, offset: u64, size: u64) -> Result<Vec<u8>>;
}
