//! Headless backend for testing and tooling.
//!
//! This backend does not talk to a GPU. It hands out ids, validates object usage the way a debug layer would,
//! keeps every submitted command list for inspection and emulates the few commands whose results are observable
//! on the CPU: buffer copies, UAV clears, timestamp queries and fence signals. Submitted work completes
//! immediately, so a fence reaches its signaled value as soon as [`Backend::signal`] returns.
//! [`HeadlessBackend::remove_device`] makes it fail like a lost device.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use anyhow::Result;

use crate::command_buffer::command::Command;
use crate::command_buffer::CommandList;
use crate::core::backend::{Backend, ObjectId};
use crate::core::error::Error;
use crate::descriptor::heap::{DescriptorHandle, DescriptorHeapDesc, DescriptorHeapType};
use crate::descriptor::sampler::SamplerDesc;
use crate::graph::barrier::BarrierBatch;
use crate::pipeline::command_signature::CommandSignatureDesc;
use crate::pipeline::pipeline_state::PipelineDesc;
use crate::pipeline::root_signature::RootSignatureDesc;
use crate::pipeline::shader::Shader;
use crate::resource::{ResourceId, ViewType};
use crate::resource::buffer::BufferDesc;
use crate::resource::texture::TextureDesc;

/// Ticks per second of emulated timestamps.
pub const TIMESTAMP_FREQUENCY: u64 = 1_000_000;
/// Ticks the emulated clock advances with every timestamp query.
pub const TIMESTAMP_TICK: u64 = 500;

/// What a descriptor slot holds.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DescriptorContents {
    View { resource: ResourceId, ty: ViewType },
    Sampler(SamplerDesc),
}

/// A compiled pipeline, as seen by the backend.
#[derive(Debug, Clone)]
pub struct PipelineRecord {
    pub id: ObjectId,
    pub name: String,
    pub root_signature: ObjectId,
    pub desc: PipelineDesc,
}

/// One executed command list.
#[derive(Debug, Clone)]
pub struct Submission {
    pub queue: ObjectId,
    pub list: String,
    pub commands: Vec<Command>,
}

#[derive(Debug, Default)]
struct HeadlessState {
    next_id: u64,
    buffers: HashMap<ResourceId, Vec<u8>>,
    textures: HashMap<ResourceId, TextureDesc>,
    heaps: HashMap<ObjectId, DescriptorHeapDesc>,
    descriptors: HashMap<DescriptorHandle, DescriptorContents>,
    root_signatures: HashMap<ObjectId, String>,
    command_signatures: HashMap<ObjectId, String>,
    pipelines: Vec<PipelineRecord>,
    query_heaps: HashMap<ObjectId, Vec<u64>>,
    queues: HashMap<ObjectId, String>,
    fences: HashMap<ObjectId, u64>,
    submissions: Vec<Submission>,
    clock: u64,
    removed: bool,
}

impl HeadlessState {
    fn check_device(&self) -> Result<()> {
        if self.removed {
            return Err(Error::DeviceRemoved.into());
        }
        Ok(())
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn buffer_mut(&mut self, id: ResourceId) -> Result<&mut Vec<u8>> {
        Ok(self
            .buffers
            .get_mut(&id)
            .ok_or_else(|| Error::UnknownObject(format!("buffer {:?}", id)))?)
    }

    fn heap(&self, id: ObjectId) -> Result<&DescriptorHeapDesc> {
        Ok(self
            .heaps
            .get(&id)
            .ok_or_else(|| Error::UnknownObject(format!("descriptor heap {:?}", id)))?)
    }

    fn check_slot(&self, handle: DescriptorHandle, expected: DescriptorHeapType) -> Result<()> {
        let heap = self.heap(handle.heap)?;
        if heap.ty != expected {
            return Err(Error::Uncategorized("descriptor written into a heap of the wrong type").into());
        }
        if handle.index >= heap.capacity {
            return Err(Error::Uncategorized("descriptor handle out of range of its heap").into());
        }
        Ok(())
    }

    fn emulate(&mut self, list: &CommandList) -> Result<()> {
        for command in list.commands() {
            match command {
                Command::ResourceBarrier(barriers) => {
                    BarrierBatch::with_vk_dependency(barriers, |dependency| {
                        trace!(
                            "HeadlessBackend: `{}` barrier batch ({} image, {} memory)",
                            list.name(),
                            dependency.image_memory_barrier_count,
                            dependency.memory_barrier_count
                        );
                    });
                }
                Command::EndQuery { heap, index } => {
                    self.clock += TIMESTAMP_TICK;
                    let clock = self.clock;
                    let queries = self
                        .query_heaps
                        .get_mut(heap)
                        .ok_or_else(|| Error::UnknownObject(format!("query heap {:?}", heap)))?;
                    queries[*index as usize] = clock;
                }
                Command::ResolveQueryData { heap, start, count, dst, dst_offset } => {
                    let queries = self
                        .query_heaps
                        .get(heap)
                        .ok_or_else(|| Error::UnknownObject(format!("query heap {:?}", heap)))?;
                    let bytes: Vec<u8> = queries[*start as usize..(*start + *count) as usize]
                        .iter()
                        .flat_map(|value| value.to_le_bytes())
                        .collect();
                    write_bytes(self.buffer_mut(*dst)?, *dst_offset, &bytes)?;
                }
                Command::ClearUnorderedAccessViewUint { resource, values, .. } => {
                    if let Some(data) = self.buffers.get_mut(resource) {
                        for chunk in data.chunks_exact_mut(4) {
                            chunk.copy_from_slice(&values[0].to_le_bytes());
                        }
                    }
                }
                Command::CopyBufferRegion { dst, dst_offset, src, src_offset, size } => {
                    let source = self
                        .buffers
                        .get(src)
                        .ok_or_else(|| Error::UnknownObject(format!("buffer {:?}", src)))?;
                    let bytes = source[*src_offset as usize..(*src_offset + *size) as usize].to_vec();
                    write_bytes(self.buffer_mut(*dst)?, *dst_offset, &bytes)?;
                }
                Command::CopyResource { dst, src } => {
                    if let Some(source) = self.buffers.get(src).cloned() {
                        let target = self.buffer_mut(*dst)?;
                        let size = source.len().min(target.len());
                        target[..size].copy_from_slice(&source[..size]);
                    }
                }
                other => trace!("HeadlessBackend: `{}` {:?}", list.name(), other),
            }
        }
        Ok(())
    }
}

fn write_bytes(target: &mut [u8], offset: u64, bytes: &[u8]) -> Result<()> {
    let start = offset as usize;
    let end = start + bytes.len();
    if end > target.len() {
        return Err(Error::Uncategorized("buffer write out of range").into());
    }
    target[start..end].copy_from_slice(bytes);
    Ok(())
}

fn compile(shader: &Shader) -> Result<()> {
    if shader.path.is_empty() || shader.entry_point.is_empty() {
        return Err(Error::ShaderCompilation(format!(
            "shader `{}` has no source path or entry point",
            shader.path
        ))
        .into());
    }
    Ok(())
}

/// Backend without a device. See the module documentation.
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    state: Mutex<HeadlessState>,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> Result<MutexGuard<'_, HeadlessState>> {
        Ok(self.state.lock().map_err(Error::from)?)
    }

    /// All command lists executed so far, oldest first.
    pub fn submissions(&self) -> Result<Vec<Submission>> {
        Ok(self.state()?.submissions.clone())
    }

    /// The most recently executed command list with the given name.
    pub fn last_submission(&self, list: &str) -> Result<Option<Submission>> {
        Ok(self.state()?.submissions.iter().rev().find(|submission| submission.list == list).cloned())
    }

    /// Contents of a descriptor slot, if anything was written to it.
    pub fn descriptor(&self, handle: DescriptorHandle) -> Result<Option<DescriptorContents>> {
        Ok(self.state()?.descriptors.get(&handle).copied())
    }

    /// All pipelines compiled so far, in creation order.
    pub fn pipelines(&self) -> Result<Vec<PipelineRecord>> {
        Ok(self.state()?.pipelines.clone())
    }

    /// Current contents of a buffer.
    pub fn buffer_data(&self, buffer: ResourceId) -> Result<Vec<u8>> {
        Ok(self.state()?.buffer_mut(buffer)?.clone())
    }

    /// Simulate losing the device. Every later submission and fence signal fails with [`Error::DeviceRemoved`].
    pub fn remove_device(&self) -> Result<()> {
        self.state()?.removed = true;
        Ok(())
    }
}

impl Backend for HeadlessBackend {
    fn name(&self) -> &str {
        "Headless"
    }

    fn create_buffer(&self, desc: &BufferDesc) -> Result<ResourceId> {
        trace!("HeadlessBackend: creating buffer `{}` ({} bytes)", desc.name, desc.size());
        let mut state = self.state()?;
        let id = ResourceId(state.next_id());
        state.buffers.insert(id, vec![0; desc.size() as usize]);
        Ok(id)
    }

    fn create_texture(&self, desc: &TextureDesc) -> Result<ResourceId> {
        trace!("HeadlessBackend: creating texture `{}` ({}x{})", desc.name, desc.width, desc.height);
        let mut state = self.state()?;
        let id = ResourceId(state.next_id());
        state.textures.insert(id, desc.clone());
        Ok(id)
    }

    fn create_descriptor_heap(&self, desc: &DescriptorHeapDesc) -> Result<ObjectId> {
        let mut state = self.state()?;
        let id = ObjectId(state.next_id());
        state.heaps.insert(id, *desc);
        Ok(id)
    }

    fn create_view(&self, resource: ResourceId, ty: ViewType, dst: DescriptorHandle) -> Result<()> {
        let mut state = self.state()?;
        if !state.buffers.contains_key(&resource) && !state.textures.contains_key(&resource) {
            return Err(Error::UnknownObject(format!("resource {:?}", resource)).into());
        }
        let heap_type = match ty {
            ViewType::Rtv => DescriptorHeapType::Rtv,
            ViewType::Dsv => DescriptorHeapType::Dsv,
            ViewType::Srv | ViewType::Uav | ViewType::Cbv => DescriptorHeapType::CbvSrvUav,
        };
        state.check_slot(dst, heap_type)?;
        state.descriptors.insert(dst, DescriptorContents::View { resource, ty });
        Ok(())
    }

    fn create_sampler(&self, desc: &SamplerDesc, dst: DescriptorHandle) -> Result<()> {
        let mut state = self.state()?;
        state.check_slot(dst, DescriptorHeapType::Sampler)?;
        state.descriptors.insert(dst, DescriptorContents::Sampler(*desc));
        Ok(())
    }

    fn copy_descriptor(&self, dst: DescriptorHandle, src: DescriptorHandle) -> Result<()> {
        let mut state = self.state()?;
        let src_heap = *state.heap(src.heap)?;
        if src_heap.shader_visible {
            return Err(Error::Uncategorized("descriptor copies must read from a shader invisible heap").into());
        }
        state.check_slot(dst, src_heap.ty)?;
        let contents = *state
            .descriptors
            .get(&src)
            .ok_or(Error::Uncategorized("descriptor copy from an empty slot"))?;
        state.descriptors.insert(dst, contents);
        Ok(())
    }

    fn create_root_signature(&self, name: &str, desc: &RootSignatureDesc) -> Result<ObjectId> {
        trace!("HeadlessBackend: creating root signature `{}` ({} parameters)", name, desc.parameters.len());
        let mut state = self.state()?;
        let id = ObjectId(state.next_id());
        state.root_signatures.insert(id, name.to_owned());
        Ok(id)
    }

    fn create_pipeline_state(&self, name: &str, root_signature: ObjectId, desc: &PipelineDesc) -> Result<ObjectId> {
        let mut state = self.state()?;
        if !state.root_signatures.contains_key(&root_signature) {
            return Err(Error::UnknownObject(format!("root signature {:?}", root_signature)).into());
        }
        match desc {
            PipelineDesc::Compute(shader) => compile(shader)?,
            PipelineDesc::Graphics(graphics) => {
                compile(&graphics.vertex_shader)?;
                if let Some(pixel) = &graphics.pixel_shader {
                    compile(pixel)?;
                }
            }
        }
        let id = ObjectId(state.next_id());
        state.pipelines.push(PipelineRecord {
            id,
            name: name.to_owned(),
            root_signature,
            desc: desc.clone(),
        });
        Ok(id)
    }

    fn create_command_signature(&self, name: &str, desc: &CommandSignatureDesc) -> Result<ObjectId> {
        let mut state = self.state()?;
        if let Some(root_signature) = desc.root_signature {
            if !state.root_signatures.contains_key(&root_signature) {
                return Err(Error::UnknownObject(format!("root signature {:?}", root_signature)).into());
            }
        }
        let id = ObjectId(state.next_id());
        state.command_signatures.insert(id, name.to_owned());
        Ok(id)
    }

    fn create_query_heap(&self, count: u32) -> Result<ObjectId> {
        let mut state = self.state()?;
        let id = ObjectId(state.next_id());
        state.query_heaps.insert(id, vec![0; count as usize]);
        Ok(id)
    }

    fn create_command_queue(&self, name: &str) -> Result<ObjectId> {
        let mut state = self.state()?;
        let id = ObjectId(state.next_id());
        state.queues.insert(id, name.to_owned());
        Ok(id)
    }

    fn execute_command_lists(&self, queue: ObjectId, lists: &[&CommandList]) -> Result<()> {
        let mut state = self.state()?;
        state.check_device()?;
        if !state.queues.contains_key(&queue) {
            return Err(Error::UnknownObject(format!("queue {:?}", queue)).into());
        }
        for list in lists {
            state.emulate(list)?;
            state.submissions.push(Submission {
                queue,
                list: list.name().to_owned(),
                commands: list.commands().to_vec(),
            });
        }
        Ok(())
    }

    fn timestamp_frequency(&self, queue: ObjectId) -> Result<u64> {
        let state = self.state()?;
        if !state.queues.contains_key(&queue) {
            return Err(Error::UnknownObject(format!("queue {:?}", queue)).into());
        }
        Ok(TIMESTAMP_FREQUENCY)
    }

    fn create_fence(&self, initial_value: u64) -> Result<ObjectId> {
        let mut state = self.state()?;
        let id = ObjectId(state.next_id());
        state.fences.insert(id, initial_value);
        Ok(id)
    }

    fn signal(&self, queue: ObjectId, fence: ObjectId, value: u64) -> Result<()> {
        let mut state = self.state()?;
        state.check_device()?;
        if !state.queues.contains_key(&queue) {
            return Err(Error::UnknownObject(format!("queue {:?}", queue)).into());
        }
        let current = state
            .fences
            .get_mut(&fence)
            .ok_or_else(|| Error::UnknownObject(format!("fence {:?}", fence)))?;
        if value < *current {
            return Err(Error::Uncategorized("fence values must not decrease").into());
        }
        *current = value;
        Ok(())
    }

    fn completed_value(&self, fence: ObjectId) -> Result<u64> {
        let state = self.state()?;
        Ok(*state
            .fences
            .get(&fence)
            .ok_or_else(|| Error::UnknownObject(format!("fence {:?}", fence)))?)
    }

    fn wait_for_value(&self, fence: ObjectId, value: u64) -> Result<()> {
        // Work completes on submission, so a value that is not reached yet was never signaled.
        if self.completed_value(fence)? < value {
            return Err(Error::Uncategorized("waiting for a fence value that was never signaled").into());
        }
        Ok(())
    }

    fn write_buffer(&self, buffer: ResourceId, offset: u64, data: &[u8]) -> Result<()> {
        let mut state = self.state()?;
        write_bytes(state.buffer_mut(buffer)?, offset, data)
    }

    fn read_buffer(&self, buffer: ResourceId, offset: u64, size: u64) -> Result<Vec<u8>> {
        let mut state = self.state()?;
        let data = state.buffer_mut(buffer)?;
        let end = (offset + size) as usize;
        if end > data.len() {
            return Err(Error::Uncategorized("buffer read out of range").into());
        }
        Ok(data[offset as usize..end].to_vec())
    }
}
