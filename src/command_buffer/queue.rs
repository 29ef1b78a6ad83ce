use anyhow::Result;

use crate::command_buffer::CommandList;
use crate::core::backend::ObjectId;
use crate::core::device::Device;
use crate::sync::fence::Fence;

/// A queue command lists are submitted to.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct CommandQueue {
    #[derivative(Debug = "ignore")]
    device: Device,
    id: ObjectId,
    name: String,
}

impl CommandQueue {
    pub fn new(device: &Device, name: &str) -> Result<Self> {
        let id = device.create_command_queue(name)?;
        Ok(Self {
            device: device.clone(),
            id,
            name: name.to_owned(),
        })
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// Submit closed command lists for execution, in order.
    /// # Panics
    /// Panics if any of the lists is still recording.
    pub fn execute_command_lists(&self, lists: &[&CommandList]) -> Result<()> {
        for list in lists {
            assert!(!list.is_recording(), "Command list `{}` submitted while still recording.", list.name());
        }
        info!("Submitting {} command list(s) to `{}`", lists.len(), self.name);
        self.device.execute_command_lists(self.id, lists)
    }

    /// Set `fence` to `value` once all previously submitted work completed.
    pub fn signal(&self, fence: &Fence, value: u64) -> Result<()> {
        self.device.signal(self.id, fence.id(), value)
    }

    /// Ticks per second of timestamps written on this queue.
    pub fn timestamp_frequency(&self) -> Result<u64> {
        self.device.timestamp_frequency(self.id)
    }
}
