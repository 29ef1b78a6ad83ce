//! The objects every pass is handed: device, queue, fence, descriptor heaps and profiler.

use std::sync::Arc;

use anyhow::Result;

use crate::command_buffer::CommandList;
use crate::command_buffer::pool::CommandListPool;
use crate::command_buffer::queue::CommandQueue;
use crate::core::backend::Backend;
use crate::core::device::Device;
use crate::core::headless::HeadlessBackend;
use crate::core::settings::RenderSettings;
use crate::descriptor::heap::DescriptorHeaps;
use crate::profiler::GpuProfiler;
use crate::sync::fence::Fence;

/// Application-owned rendering environment.
///
/// Fields are public so a pass can borrow a heap mutably while also using the device.
#[derive(Debug)]
pub struct RenderEnv {
    pub device: Device,
    pub settings: RenderSettings,
    pub queue: CommandQueue,
    pub fence: Fence,
    /// Fence value signaled after the most recent submission.
    pub last_submission_fence_value: u64,
    pub heaps: DescriptorHeaps,
    pub command_lists: CommandListPool,
    pub profiler: Option<GpuProfiler>,
}

impl RenderEnv {
    /// Create the environment on top of a backend.
    pub fn new(backend: Arc<dyn Backend>, settings: RenderSettings) -> Result<Self> {
        let device = Device::new(backend);
        let queue = CommandQueue::new(&device, "direct queue")?;
        let fence = Fence::new(&device, 0)?;
        let mut heaps = DescriptorHeaps::new(&device, &settings)?;
        let profiler = if settings.enable_profiling {
            Some(GpuProfiler::new(&device, &mut heaps, settings.max_profiles, settings.render_latency)?)
        } else {
            None
        };
        info!("Initialized render environment `{}` on `{}`", settings.name, device.name());
        Ok(Self {
            device,
            settings,
            queue,
            fence,
            last_submission_fence_value: 0,
            heaps,
            command_lists: CommandListPool::new(),
            profiler,
        })
    }

    /// Create the environment on a fresh [`HeadlessBackend`]. The backend is returned as well for inspection.
    pub fn headless(settings: RenderSettings) -> Result<(Self, Arc<HeadlessBackend>)> {
        let backend = Arc::new(HeadlessBackend::new());
        let env = Self::new(backend.clone(), settings)?;
        Ok((env, backend))
    }

    /// Submit closed command lists to the queue.
    pub fn submit(&self, lists: &[&CommandList]) -> Result<()> {
        self.queue.execute_command_lists(lists)
    }

    /// Signal the next fence value and block until the device reached it.
    pub fn wait_for_gpu(&mut self) -> Result<()> {
        self.last_submission_fence_value += 1;
        let value = self.last_submission_fence_value;
        self.queue.signal(&self.fence, value)?;
        self.fence.wait_for_signal_on_cpu(value)
    }

    /// Submit and wait for completion. This is how every pass is executed, since only one frame is ever in flight.
    pub fn submit_and_wait(&mut self, lists: &[&CommandList]) -> Result<()> {
        self.submit(lists)?;
        self.wait_for_gpu()
    }

    /// Record one pass into a pooled command list, then submit it and wait for it to complete. The list is already
    /// recording when `record` is called, and is wrapped in a debug event named after the pass.
    pub fn execute_pass(
        &mut self,
        name: &str,
        record: impl FnOnce(&mut RenderEnv, &mut CommandList) -> Result<()>,
    ) -> Result<()> {
        let mut cmd = self.command_lists.acquire(&self.fence)?;
        cmd.begin(None);
        cmd.begin_event(name);
        record(self, &mut cmd)?;
        cmd.end_event();
        cmd.end();
        self.submit_and_wait(&[&cmd])?;
        self.command_lists.release(cmd, self.last_submission_fence_value);
        Ok(())
    }

    /// Open a profiling region if profiling is enabled.
    pub fn start_profile(&mut self, cmd: &mut CommandList, name: &str) -> Option<u32> {
        self.profiler.as_mut().map(|profiler| profiler.start_profile(cmd, name))
    }

    /// Close a profiling region opened with [`RenderEnv::start_profile`].
    pub fn end_profile(&mut self, cmd: &mut CommandList, index: Option<u32>) {
        if let (Some(profiler), Some(index)) = (self.profiler.as_mut(), index) {
            profiler.end_profile(cmd, index);
        }
    }

    /// Collect timestamps of the frame that just completed. Must only be called once its fence value was reached.
    pub fn end_profiling_frame(&mut self) -> Result<()> {
        if let Some(profiler) = self.profiler.as_mut() {
            profiler.end_frame(&self.queue)?;
        }
        Ok(())
    }
}
