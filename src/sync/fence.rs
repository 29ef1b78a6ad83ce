//! Monotonic fences for CPU-GPU synchronization.
//!
//! A fence holds a 64-bit value that only ever grows. A queue sets it with [`CommandQueue::signal`](crate::command_buffer::queue::CommandQueue::signal)
//! once all earlier work completed. Work is complete when `completed_value() >= target`.

use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use anyhow::Result;

use crate::core::backend::ObjectId;
use crate::core::device::Device;

/// A monotonically increasing fence.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct Fence {
    #[derivative(Debug = "ignore")]
    device: Device,
    id: ObjectId,
}

impl Fence {
    /// Create a new fence with the given initial value.
    pub fn new(device: &Device, initial_value: u64) -> Result<Self> {
        let id = device.create_fence(initial_value)?;
        Ok(Self {
            device: device.clone(),
            id,
        })
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// The last value the device signaled.
    pub fn completed_value(&self) -> Result<u64> {
        self.device.completed_value(self.id)
    }

    /// Block the calling thread until the fence reached `value`. For the nonblocking version, await
    /// [`Fence::wait_for`] instead.
    pub fn wait_for_signal_on_cpu(&self, value: u64) -> Result<()> {
        if self.completed_value()? >= value {
            return Ok(());
        }
        self.device.wait_for_value(self.id, value)
    }

    /// Future that resolves once the fence reached `value`.
    pub fn wait_for(&self, value: u64) -> FenceWait<'_> {
        FenceWait { fence: self, value }
    }
}

/// Future returned by [`Fence::wait_for`].
#[derive(Debug)]
pub struct FenceWait<'f> {
    fence: &'f Fence,
    value: u64,
}

// Note that the future implementation works by periodically polling the fence.
impl std::future::Future for FenceWait<'_> {
    type Output = Result<()>;

    fn poll(self: Pin<&mut Self>, ctx: &mut Context<'_>) -> Poll<Self::Output> {
        match self.fence.completed_value() {
            Ok(completed) if completed >= self.value => Poll::Ready(Ok(())),
            Ok(_) => {
                let waker = ctx.waker().clone();
                std::thread::spawn(move || {
                    // Poll again after 5 milliseconds.
                    std::thread::sleep(Duration::from_millis(5));
                    waker.wake();
                });
                Poll::Pending
            }
            Err(error) => Poll::Ready(Err(error)),
        }
    }
}
