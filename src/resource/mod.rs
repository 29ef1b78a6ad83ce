//! GPU resources and the state bookkeeping attached to them.
//!
//! Every [`Buffer`](buffer::Buffer) and [`Texture`](texture::Texture) carries the state it was last transitioned to,
//! and knows the state it must be in to be written by its producer ([`GraphicsResource::write_state`]) or read
//! by a consumer ([`GraphicsResource::read_state`]). Transitions are never inserted automatically. Use a
//! [`StateTracker`](crate::graph::tracker::StateTracker) or a [`BarrierBatch`](crate::graph::barrier::BarrierBatch).
//!
//! Resources private to a pass are owned by that pass. Resources shared between passes (the depth buffer, the voxel grid,
//! per-tile light lists, ...) are handed around as `Rc`.

pub mod buffer;
pub mod format;
pub mod query_heap;
pub mod state;
pub mod texture;

use std::cell::Cell;
use std::rc::Rc;

use crate::resource::state::ResourceState;

/// Backend handle to a buffer or texture.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(pub u64);

/// Kind of memory object behind a resource, needed to translate barriers.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Buffer,
    ColorTexture,
    DepthTexture,
}

/// Kind of view created for a resource.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ViewType {
    Srv,
    Uav,
    Cbv,
    Rtv,
    Dsv,
}

/// Shared handle to the tracked state of one resource. Barriers computed ahead of recording keep a handle so the
/// state can be checked when they are finally recorded.
#[derive(Debug, Clone)]
pub struct TrackedState(Rc<Cell<ResourceState>>);

impl TrackedState {
    pub fn new(state: ResourceState) -> Self {
        Self(Rc::new(Cell::new(state)))
    }

    pub fn get(&self) -> ResourceState {
        self.0.get()
    }

    pub fn set(&self, state: ResourceState) {
        self.0.set(state);
    }
}

/// Common interface of all resources whose state is tracked.
pub trait GraphicsResource {
    /// Backend handle of the resource.
    fn id(&self) -> ResourceId;
    /// Debug name.
    fn name(&self) -> &str;
    fn kind(&self) -> ResourceKind;
    /// State the resource was last transitioned to.
    fn state(&self) -> ResourceState;
    /// Overwrite the tracked state. This does not record anything.
    fn set_state(&self, state: ResourceState);
    /// Handle sharing the tracked state of this resource.
    fn tracked_state(&self) -> TrackedState;
    /// State in which a consumer reads this resource.
    fn read_state(&self) -> ResourceState;
    /// State in which the producer writes this resource.
    fn write_state(&self) -> ResourceState;
}
