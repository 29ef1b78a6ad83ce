//! Resource transition barriers and batches of them.
//!
//! A barrier is only ever created for an actual state change. Batches are recorded with a single
//! `resource_barrier` call, never one call per barrier.
//!
//! Batches built with [`BarrierBatch::push_if_required`] are usually computed once at pass creation and replayed
//! every frame. They keep a handle to the tracked state of each resource, and recording checks that every resource
//! still is in the `before` state of its barrier.

use ash::vk;
use ash::vk::Handle;

use crate::command_buffer::CommandList;
use crate::resource::{GraphicsResource, ResourceId, ResourceKind, TrackedState};
use crate::resource::state::ResourceState;

/// Transition of one resource from `before` to `after`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceBarrier {
    pub resource: ResourceId,
    pub name: String,
    pub kind: ResourceKind,
    pub before: ResourceState,
    pub after: ResourceState,
}

impl ResourceBarrier {
    /// Transition `resource` from `before` to `after`.
    /// # Panics
    /// Panics if `before == after`. Barrier lists never contain no-op transitions.
    pub fn transition(resource: &dyn GraphicsResource, before: ResourceState, after: ResourceState) -> Self {
        assert_ne!(before, after, "No-op transition of `{}` in state {:?}.", resource.name(), before);
        Self {
            resource: resource.id(),
            name: resource.name().to_owned(),
            kind: resource.kind(),
            before,
            after,
        }
    }

    fn image_barrier(&self) -> vk::ImageMemoryBarrier2 {
        let aspect_mask = if self.kind == ResourceKind::DepthTexture {
            vk::ImageAspectFlags::DEPTH
        } else {
            vk::ImageAspectFlags::COLOR
        };
        vk::ImageMemoryBarrier2 {
            s_type: vk::StructureType::IMAGE_MEMORY_BARRIER_2,
            p_next: std::ptr::null(),
            src_stage_mask: self.before.stages(),
            src_access_mask: self.before.access(),
            dst_stage_mask: self.after.stages(),
            dst_access_mask: self.after.access(),
            old_layout: self.before.image_layout(),
            new_layout: self.after.image_layout(),
            src_queue_family_index: vk::QUEUE_FAMILY_IGNORED,
            dst_queue_family_index: vk::QUEUE_FAMILY_IGNORED,
            image: vk::Image::from_raw(self.resource.0),
            subresource_range: vk::ImageSubresourceRange {
                aspect_mask,
                base_mip_level: 0,
                level_count: vk::REMAINING_MIP_LEVELS,
                base_array_layer: 0,
                layer_count: vk::REMAINING_ARRAY_LAYERS,
            },
        }
    }

    fn memory_barrier(&self) -> vk::MemoryBarrier2 {
        // Buffer barriers are expressed as global memory barriers, which is what drivers do anyway.
        vk::MemoryBarrier2 {
            s_type: vk::StructureType::MEMORY_BARRIER_2,
            p_next: std::ptr::null(),
            src_stage_mask: self.before.stages(),
            src_access_mask: self.before.access(),
            dst_stage_mask: self.after.stages(),
            dst_access_mask: self.after.access(),
        }
    }
}

/// An ordered list of barriers that is recorded as one batch.
#[derive(Debug, Default, Clone)]
pub struct BarrierBatch {
    barriers: Vec<ResourceBarrier>,
    /// Parallel to `barriers`. `None` for barriers pushed without a resource to check against.
    tracked: Vec<Option<TrackedState>>,
}

impl BarrierBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a barrier. Its `before` state is not checked when the batch is recorded.
    /// # Panics
    /// Panics if the barrier is a no-op, or if the batch already transitions the same resource.
    pub fn push(&mut self, barrier: ResourceBarrier) {
        self.push_tracked(barrier, None);
    }

    /// Append a transition of `resource` from `current` to `required` if the two differ. Returns whether
    /// a barrier was added. When the batch is recorded, `resource` must be in `current` state.
    pub fn push_if_required(&mut self, resource: &dyn GraphicsResource, current: ResourceState, required: ResourceState) -> bool {
        if current == required {
            return false;
        }
        self.push_tracked(ResourceBarrier::transition(resource, current, required), Some(resource.tracked_state()));
        true
    }

    fn push_tracked(&mut self, barrier: ResourceBarrier, tracked: Option<TrackedState>) {
        assert_ne!(barrier.before, barrier.after, "No-op transition of `{}`.", barrier.name);
        assert!(
            self.barriers.iter().all(|existing| existing.resource != barrier.resource),
            "Resource `{}` is transitioned twice in one batch.",
            barrier.name
        );
        self.barriers.push(barrier);
        self.tracked.push(tracked);
    }

    pub fn len(&self) -> usize {
        self.barriers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.barriers.is_empty()
    }

    pub fn barriers(&self) -> &[ResourceBarrier] {
        &self.barriers
    }

    /// Take all barriers out of the batch, leaving it empty.
    pub fn take(&mut self) -> BarrierBatch {
        std::mem::take(self)
    }

    /// Record the whole batch as one call and move every checked resource to the `after` state of its barrier.
    /// Empty batches record nothing.
    /// # Panics
    /// Panics if a resource added with [`push_if_required`](Self::push_if_required) is no longer in the `before`
    /// state of its barrier.
    pub fn record(&self, cmd: &mut CommandList) {
        if self.barriers.is_empty() {
            return;
        }
        for (barrier, tracked) in self.barriers.iter().zip(&self.tracked) {
            if let Some(tracked) = tracked {
                assert_eq!(
                    tracked.get(),
                    barrier.before,
                    "Stale barrier for `{}`: expected it in {:?} before the transition to {:?}.",
                    barrier.name,
                    barrier.before,
                    barrier.after
                );
            }
        }
        cmd.resource_barrier(&self.barriers);
        for (barrier, tracked) in self.barriers.iter().zip(&self.tracked) {
            if let Some(tracked) = tracked {
                tracked.set(barrier.after);
            }
        }
    }

    /// Translate the batch into a single Vulkan dependency. Texture transitions become image barriers, buffer
    /// transitions become global memory barriers. The dependency only lives for the duration of `f`.
    pub fn with_vk_dependency<R>(barriers: &[ResourceBarrier], f: impl FnOnce(&vk::DependencyInfo) -> R) -> R {
        let images: Vec<vk::ImageMemoryBarrier2> = barriers
            .iter()
            .filter(|barrier| barrier.kind != ResourceKind::Buffer)
            .map(ResourceBarrier::image_barrier)
            .collect();
        let memory: Vec<vk::MemoryBarrier2> = barriers
            .iter()
            .filter(|barrier| barrier.kind == ResourceKind::Buffer)
            .map(ResourceBarrier::memory_barrier)
            .collect();

        let dependency = vk::DependencyInfo {
            s_type: vk::StructureType::DEPENDENCY_INFO,
            p_next: std::ptr::null(),
            dependency_flags: vk::DependencyFlags::BY_REGION,
            memory_barrier_count: memory.len() as u32,
            p_memory_barriers: memory.as_ptr(),
            buffer_memory_barrier_count: 0,
            p_buffer_memory_barriers: std::ptr::null(),
            image_memory_barrier_count: images.len() as u32,
            p_image_memory_barriers: images.as_ptr(),
        };
        f(&dependency)
    }
}
