//! Recycling of command lists.
//!
//! A command list can only be reset once the device finished executing it. The pool remembers the fence value
//! each list was submitted with and only hands a list out again once that value completed.

use std::collections::VecDeque;

use anyhow::Result;

use crate::command_buffer::CommandList;
use crate::sync::fence::Fence;

#[derive(Debug)]
struct InFlightList {
    list: CommandList,
    fence_value: u64,
}

/// Pool of command lists owned by the application.
#[derive(Debug, Default)]
pub struct CommandListPool {
    in_flight: VecDeque<InFlightList>,
    created: usize,
}

impl CommandListPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a closed command list, reusing one whose last submission completed on `fence` if possible.
    pub fn acquire(&mut self, fence: &Fence) -> Result<CommandList> {
        let completed = fence.completed_value()?;
        if let Some(position) = self.in_flight.iter().position(|entry| entry.fence_value <= completed) {
            if let Some(entry) = self.in_flight.remove(position) {
                return Ok(entry.list);
            }
        }
        self.created += 1;
        Ok(CommandList::new(format!("command list {}", self.created)))
    }

    /// Give back a submitted list together with the fence value signaled after its submission.
    /// # Panics
    /// Panics if the list is still recording.
    pub fn release(&mut self, list: CommandList, fence_value: u64) {
        assert!(!list.is_recording(), "Command list `{}` returned to the pool while recording.", list.name());
        self.in_flight.push_back(InFlightList { list, fence_value });
    }

    /// Number of lists created by this pool so far.
    pub fn num_created(&self) -> usize {
        self.created
    }
}
