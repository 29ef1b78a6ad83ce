//! Resource state transitions and the ordering of passes within a frame.
//!
//! Passes never transition resources implicitly. Before touching a resource, a pass compares the state the
//! resource is in with the state it needs and records a transition only when the two differ. All transitions needed
//! before one batch of work are recorded with a single call. [`StateTracker`](tracker::StateTracker) does this
//! bookkeeping at record time, [`BarrierBatch`](barrier::BarrierBatch) holds transitions precomputed at
//! initialization time.
//!
//! After recording, a pass reports the state it left each output in. The next pass takes those states as its
//! input states, so no redundant transitions are recorded. [`FrameSchedule`](schedule::FrameSchedule) checks this
//! handoff for a whole frame and executes the passes in dependency order.
//!
//! # Example
//! ```ignore
//! let mut tracker = StateTracker::new();
//! tracker.require(&*voxel_grid, ResourceState::UnorderedAccess);
//! tracker.require(&*depth, ResourceState::PixelShaderResource);
//! // Records at most one barrier call, or nothing at all if both resources already were in the right state.
//! tracker.flush(&mut cmd);
//! ```

pub mod barrier;
pub mod schedule;
pub mod tracker;
pub mod virtual_resource;
