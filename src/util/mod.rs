//! Dispatch size helpers and translation into Vulkan types.

pub mod dispatch;
pub mod to_vk;
