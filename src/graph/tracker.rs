//! State tracking utility shared by every pass.
//!
//! [`StateTracker::require`] compares the tracked state of a resource with the state the caller needs, queues a
//! transition when they differ and updates the tracked state right away. [`StateTracker::flush`] records all
//! queued transitions as one batch.

use crate::command_buffer::CommandList;
use crate::graph::barrier::{BarrierBatch, ResourceBarrier};
use crate::resource::GraphicsResource;
use crate::resource::state::ResourceState;

/// Collects the transitions needed before the next batch of work.
#[derive(Debug, Default)]
pub struct StateTracker {
    pending: BarrierBatch,
}

impl StateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make sure `resource` is in `required` state before the next flush. Returns the queued barrier, or `None`
    /// if the resource already is in that state.
    pub fn require(&mut self, resource: &dyn GraphicsResource, required: ResourceState) -> Option<ResourceBarrier> {
        let current = resource.state();
        if current == required {
            return None;
        }
        let barrier = ResourceBarrier::transition(resource, current, required);
        resource.set_state(required);
        self.pending.push(barrier.clone());
        Some(barrier)
    }

    /// Require a whole list of `(resource, state)` pairs.
    pub fn require_all<'r>(&mut self, resources: impl IntoIterator<Item = (&'r dyn GraphicsResource, ResourceState)>) {
        for (resource, state) in resources {
            self.require(resource, state);
        }
    }

    /// Number of transitions waiting for the next flush.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Record all pending transitions as one batch. Returns the number of barriers recorded.
    pub fn flush(&mut self, cmd: &mut CommandList) -> usize {
        let batch = self.pending.take();
        batch.record(cmd);
        batch.len()
    }

    /// Hand out the pending transitions instead of recording them.
    pub fn finish(self) -> BarrierBatch {
        self.pending
    }
}

/// Update tracked states after a recorded pass, so they match the states the pass leaves its resources in.
pub fn commit_states<'r>(resources: impl IntoIterator<Item = (&'r dyn GraphicsResource, ResourceState)>) {
    for (resource, state) in resources {
        resource.set_state(state);
    }
}
