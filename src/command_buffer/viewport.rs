use ash::vk;

use crate::util::to_vk::IntoVulkanType;

/// Viewport transform of the rasterizer.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Viewport {
    pub top_left_x: f32,
    pub top_left_y: f32,
    pub width: f32,
    pub height: f32,
    pub min_depth: f32,
    pub max_depth: f32,
}

impl Viewport {
    /// Viewport covering a `width` x `height` target with the full depth range.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            top_left_x: 0.0,
            top_left_y: 0.0,
            width: width as f32,
            height: height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        }
    }
}

/// Scissor rectangle.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    /// Scissor rectangle covering exactly the area of a viewport.
    pub fn from_viewport(viewport: &Viewport) -> Self {
        let left = viewport.top_left_x as i32;
        let top = viewport.top_left_y as i32;
        Self {
            left,
            top,
            right: left + viewport.width as i32,
            bottom: top + viewport.height as i32,
        }
    }
}

impl IntoVulkanType for Viewport {
    type Output = vk::Viewport;

    fn into_vulkan(self) -> Self::Output {
        vk::Viewport {
            x: self.top_left_x,
            y: self.top_left_y,
            width: self.width,
            height: self.height,
            min_depth: self.min_depth,
            max_depth: self.max_depth,
        }
    }
}

impl IntoVulkanType for Rect {
    type Output = vk::Rect2D;

    fn into_vulkan(self) -> Self::Output {
        vk::Rect2D {
            offset: vk::Offset2D {
                x: self.left,
                y: self.top,
            },
            extent: vk::Extent2D {
                width: (self.right - self.left) as u32,
                height: (self.bottom - self.top) as u32,
            },
        }
    }
}
