//! Resource usage states and their translation to Vulkan synchronization scopes.

use ash::vk;

/// The usage intent a resource must be in before it is accessed through a given kind of view.
///
/// The state stored on a resource is bookkeeping only. Nothing on the device enforces it, so whoever records
/// a command list touching the resource is responsible for requesting a transition whenever the current state
/// differs from the required one.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ResourceState {
    #[default]
    Common,
    VertexAndConstantBuffer,
    IndexBuffer,
    RenderTarget,
    UnorderedAccess,
    DepthWrite,
    DepthRead,
    NonPixelShaderResource,
    PixelShaderResource,
    IndirectArgument,
    CopyDest,
    CopySource,
    GenericRead,
    Present,
}

impl ResourceState {
    /// Whether a resource in this state may be written to by the device.
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            ResourceState::Common
                | ResourceState::RenderTarget
                | ResourceState::UnorderedAccess
                | ResourceState::DepthWrite
                | ResourceState::CopyDest
        )
    }

    /// Image layout an image in this state is kept in.
    pub fn image_layout(&self) -> vk::ImageLayout {
        match self {
            ResourceState::Common => vk::ImageLayout::GENERAL,
            ResourceState::RenderTarget => vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
            ResourceState::UnorderedAccess => vk::ImageLayout::GENERAL,
            ResourceState::DepthWrite => vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
            ResourceState::DepthRead => vk::ImageLayout::DEPTH_STENCIL_READ_ONLY_OPTIMAL,
            ResourceState::NonPixelShaderResource | ResourceState::PixelShaderResource => {
                vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL
            }
            ResourceState::CopyDest => vk::ImageLayout::TRANSFER_DST_OPTIMAL,
            ResourceState::CopySource => vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
            ResourceState::Present => vk::ImageLayout::PRESENT_SRC_KHR,
            ResourceState::VertexAndConstantBuffer
            | ResourceState::IndexBuffer
            | ResourceState::IndirectArgument
            | ResourceState::GenericRead => vk::ImageLayout::GENERAL,
        }
    }

    /// Memory access performed on a resource in this state.
    pub fn access(&self) -> vk::AccessFlags2 {
        match self {
            ResourceState::Common => vk::AccessFlags2::MEMORY_READ | vk::AccessFlags2::MEMORY_WRITE,
            ResourceState::VertexAndConstantBuffer => {
                vk::AccessFlags2::VERTEX_ATTRIBUTE_READ | vk::AccessFlags2::UNIFORM_READ
            }
            ResourceState::IndexBuffer => vk::AccessFlags2::INDEX_READ,
            ResourceState::RenderTarget => {
                vk::AccessFlags2::COLOR_ATTACHMENT_READ | vk::AccessFlags2::COLOR_ATTACHMENT_WRITE
            }
            ResourceState::UnorderedAccess => {
                vk::AccessFlags2::SHADER_STORAGE_READ | vk::AccessFlags2::SHADER_STORAGE_WRITE
            }
            ResourceState::DepthWrite => {
                vk::AccessFlags2::DEPTH_STENCIL_ATTACHMENT_READ
                    | vk::AccessFlags2::DEPTH_STENCIL_ATTACHMENT_WRITE
            }
            ResourceState::DepthRead => vk::AccessFlags2::DEPTH_STENCIL_ATTACHMENT_READ,
            ResourceState::NonPixelShaderResource | ResourceState::PixelShaderResource => {
                vk::AccessFlags2::SHADER_READ
            }
            ResourceState::IndirectArgument => vk::AccessFlags2::INDIRECT_COMMAND_READ,
            ResourceState::CopyDest => vk::AccessFlags2::TRANSFER_WRITE,
            ResourceState::CopySource => vk::AccessFlags2::TRANSFER_READ,
            ResourceState::GenericRead => vk::AccessFlags2::MEMORY_READ,
            ResourceState::Present => vk::AccessFlags2::NONE,
        }
    }

    /// Pipeline stages that access a resource in this state.
    pub fn stages(&self) -> vk::PipelineStageFlags2 {
        match self {
            ResourceState::Common | ResourceState::GenericRead => vk::PipelineStageFlags2::ALL_COMMANDS,
            ResourceState::VertexAndConstantBuffer => {
                vk::PipelineStageFlags2::VERTEX_INPUT
                    | vk::PipelineStageFlags2::VERTEX_SHADER
                    | vk::PipelineStageFlags2::FRAGMENT_SHADER
                    | vk::PipelineStageFlags2::COMPUTE_SHADER
            }
            ResourceState::IndexBuffer => vk::PipelineStageFlags2::VERTEX_INPUT,
            ResourceState::RenderTarget => vk::PipelineStageFlags2::COLOR_ATTACHMENT_OUTPUT,
            ResourceState::UnorderedAccess => {
                vk::PipelineStageFlags2::COMPUTE_SHADER | vk::PipelineStageFlags2::FRAGMENT_SHADER
            }
            ResourceState::DepthWrite | ResourceState::DepthRead => {
                vk::PipelineStageFlags2::EARLY_FRAGMENT_TESTS | vk::PipelineStageFlags2::LATE_FRAGMENT_TESTS
            }
            ResourceState::NonPixelShaderResource => {
                vk::PipelineStageFlags2::VERTEX_SHADER | vk::PipelineStageFlags2::COMPUTE_SHADER
            }
            ResourceState::PixelShaderResource => vk::PipelineStageFlags2::FRAGMENT_SHADER,
            ResourceState::IndirectArgument => vk::PipelineStageFlags2::DRAW_INDIRECT,
            ResourceState::CopyDest | ResourceState::CopySource => vk::PipelineStageFlags2::ALL_TRANSFER,
            ResourceState::Present => vk::PipelineStageFlags2::BOTTOM_OF_PIPE,
        }
    }
}
