use ash::vk;

use crate::util::to_vk::IntoVulkanType;

/// Texel and element formats used by the renderer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Format {
    Unknown,
    R32Uint,
    R32Float,
    R32Typeless,
    R16Float,
    R16Unorm,
    R16Typeless,
    D16Unorm,
    D32Float,
    R16G16Float,
    R32G32Float,
    R32G32B32Float,
    R8G8B8A8Unorm,
    R10G10B10A2Unorm,
    R16G16B16A16Float,
    R32G32B32A32Float,
}

impl Format {
    /// Size of a single element in bytes.
    pub fn byte_size(&self) -> u64 {
        match self {
            Format::Unknown => 0,
            Format::R16Float | Format::R16Unorm | Format::R16Typeless | Format::D16Unorm => 2,
            Format::R32Uint
            | Format::R32Float
            | Format::R32Typeless
            | Format::D32Float
            | Format::R16G16Float
            | Format::R8G8B8A8Unorm
            | Format::R10G10B10A2Unorm => 4,
            Format::R32G32Float | Format::R16G16B16A16Float => 8,
            Format::R32G32B32Float => 12,
            Format::R32G32B32A32Float => 16,
        }
    }

    /// Whether this format can only be used through a typed view.
    pub fn is_typeless(&self) -> bool {
        matches!(self, Format::R16Typeless | Format::R32Typeless)
    }

    /// Format of a depth stencil view created for a texture of this format.
    pub fn depth_view_format(&self) -> Format {
        match self {
            Format::R16Typeless | Format::D16Unorm => Format::D16Unorm,
            Format::R32Typeless | Format::D32Float => Format::D32Float,
            _ => panic!("Format {self:?} cannot be viewed as depth."),
        }
    }

    /// Format of a shader resource view created for a texture of this format.
    pub fn shader_view_format(&self) -> Format {
        match self {
            Format::R16Typeless | Format::D16Unorm => Format::R16Unorm,
            Format::R32Typeless | Format::D32Float => Format::R32Float,
            other => *other,
        }
    }
}

impl IntoVulkanType for Format {
    type Output = vk::Format;

    fn into_vulkan(self) -> Self::Output {
        match self {
            Format::Unknown | Format::R16Typeless | Format::R32Typeless => vk::Format::UNDEFINED,
            Format::R32Uint => vk::Format::R32_UINT,
            Format::R32Float => vk::Format::R32_SFLOAT,
            Format::R16Float => vk::Format::R16_SFLOAT,
            Format::R16Unorm => vk::Format::R16_UNORM,
            Format::D16Unorm => vk::Format::D16_UNORM,
            Format::D32Float => vk::Format::D32_SFLOAT,
            Format::R16G16Float => vk::Format::R16G16_SFLOAT,
            Format::R32G32Float => vk::Format::R32G32_SFLOAT,
            Format::R32G32B32Float => vk::Format::R32G32B32_SFLOAT,
            Format::R8G8B8A8Unorm => vk::Format::R8G8B8A8_UNORM,
            Format::R10G10B10A2Unorm => vk::Format::A2B10G10R10_UNORM_PACK32,
            Format::R16G16B16A16Float => vk::Format::R16G16B16A16_SFLOAT,
            Format::R32G32B32A32Float => vk::Format::R32G32B32A32_SFLOAT,
        }
    }
}
