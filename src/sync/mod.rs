//! Synchronization between the CPU and the device.
//!
//! Only one frame is ever in flight. After submitting a pass, the application signals the fence with the next
//! value and blocks until the device reached it (see [`RenderEnv::wait_for_gpu`](crate::core::render_env::RenderEnv::wait_for_gpu)).
//! Every pass therefore observes the completed results of all passes recorded before it, and no cross-list dependency
//! tracking is needed beyond this wait.

pub mod fence;
