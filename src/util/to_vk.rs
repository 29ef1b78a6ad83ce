//! Translation of backend-neutral descriptions into Vulkan structures.

/// Value with a direct Vulkan counterpart, such as a [`Format`](crate::resource::format::Format) or a
/// [`Viewport`](crate::command_buffer::viewport::Viewport).
pub trait IntoVulkanType {
    type Output;

    fn into_vulkan(self) -> Self::Output;
}
