#![allow(dead_code)]

use std::rc::Rc;
use std::sync::Arc;

use anyhow::Result;

use deimos::command_buffer::command::Command;
use deimos::core::headless::Submission;
use deimos::graph::barrier::ResourceBarrier;
use deimos::prelude::*;

#[derive(Debug)]
pub struct Context {
    pub env: RenderEnv,
    pub backend: Arc<HeadlessBackend>,
}

/// Creates a headless deimos context ready for automated tests
pub fn make_context() -> Result<Context> {
    make_context_with_settings(|settings| settings)
}

/// Create a headless deimos context, letting the caller change the default test settings
pub fn make_context_with_settings<F: FnOnce(RenderSettingsBuilder) -> RenderSettingsBuilder>(
    callback: F,
) -> Result<Context> {
    let _ = pretty_env_logger::try_init();
    let builder = RenderSettingsBuilder::new()
        .name("deimos test framework")
        .tile_size(16)
        .num_tiles(4, 4)
        .voxel_grid(8, 80.0)
        .srv_heap_sizes(256, 512)
        .rtv_heap_size(64)
        .dsv_heap_size(16)
        .sampler_heap_size(16);
    let settings = callback(builder).build();
    let (env, backend) = RenderEnv::headless(settings)?;
    Ok(Context { env, backend })
}

pub fn buffer(env: &mut RenderEnv, desc: BufferDesc) -> Result<Rc<Buffer>> {
    Ok(Rc::new(Buffer::new(&env.device, &mut env.heaps, desc)?))
}

pub fn texture(env: &mut RenderEnv, desc: TextureDesc) -> Result<Rc<Texture>> {
    Ok(Rc::new(Texture::new(&env.device, &mut env.heaps, desc)?))
}

/// The command list submitted most recently.
pub fn last_submission(context: &Context) -> Result<Submission> {
    let submissions = context.backend.submissions()?;
    Ok(submissions.last().cloned().expect("Something should have been submitted."))
}

/// All barrier batches of a submission, in recording order.
pub fn barrier_batches(submission: &Submission) -> Vec<Vec<ResourceBarrier>> {
    submission
        .commands
        .iter()
        .filter_map(|command| match command {
            Command::ResourceBarrier(barriers) => Some(barriers.clone()),
            _ => None,
        })
        .collect()
}

/// Number of commands in a submission for which `f` returns true.
pub fn count_commands(submission: &Submission, f: impl Fn(&Command) -> bool) -> usize {
    submission.commands.iter().filter(|command| f(command)).count()
}

/// Transitions of a single resource, as `(before, after)` pairs.
pub fn transitions_of(batch: &[ResourceBarrier], resource: &dyn GraphicsResource) -> Vec<(ResourceState, ResourceState)> {
    batch
        .iter()
        .filter(|barrier| barrier.resource == resource.id())
        .map(|barrier| (barrier.before, barrier.after))
        .collect()
}

pub fn read_u32s(context: &Context, buffer: &Buffer) -> Result<Vec<u32>> {
    let bytes = context.backend.buffer_data(buffer.id())?;
    Ok(bytes
        .chunks_exact(4)
        .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}
