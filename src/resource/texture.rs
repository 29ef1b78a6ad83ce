//! Color and depth textures.

use anyhow::Result;

use crate::core::device::Device;
use crate::descriptor::heap::{DescriptorHandle, DescriptorHeaps};
use crate::resource::{GraphicsResource, ResourceId, ResourceKind, TrackedState, ViewType};
use crate::resource::format::Format;
use crate::resource::state::ResourceState;

/// Value a render target or depth texture is cleared to.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum ClearValue {
    Color([f32; 4]),
    Depth(f32),
}

/// Creation parameters of a [`Texture`].
#[derive(Debug, Clone, PartialEq)]
pub struct TextureDesc {
    pub name: String,
    pub width: u32,
    pub height: u32,
    /// Array layers. Cube maps use 6.
    pub array_size: u16,
    pub format: Format,
    pub depth: bool,
    pub render_target: bool,
    pub unordered_access: bool,
    pub initial_state: ResourceState,
    pub clear_value: Option<ClearValue>,
}

impl TextureDesc {
    /// A color texture that is rendered to and sampled.
    pub fn render_target(name: impl Into<String>, width: u32, height: u32, format: Format) -> Self {
        Self {
            name: name.into(),
            width,
            height,
            array_size: 1,
            format,
            depth: false,
            render_target: true,
            unordered_access: false,
            initial_state: ResourceState::RenderTarget,
            clear_value: Some(ClearValue::Color([0.0; 4])),
        }
    }

    /// A depth texture. Typeless formats get typed depth and shader resource views.
    pub fn depth(name: impl Into<String>, width: u32, height: u32, format: Format) -> Self {
        Self {
            name: name.into(),
            width,
            height,
            array_size: 1,
            format,
            depth: true,
            render_target: false,
            unordered_access: false,
            initial_state: ResourceState::DepthWrite,
            clear_value: Some(ClearValue::Depth(1.0)),
        }
    }

    /// A color texture written by compute shaders.
    pub fn storage(name: impl Into<String>, width: u32, height: u32, format: Format) -> Self {
        Self {
            name: name.into(),
            width,
            height,
            array_size: 1,
            format,
            depth: false,
            render_target: false,
            unordered_access: true,
            initial_state: ResourceState::UnorderedAccess,
            clear_value: None,
        }
    }

    /// A color texture that is only ever sampled.
    pub fn sampled(name: impl Into<String>, width: u32, height: u32, format: Format) -> Self {
        Self {
            name: name.into(),
            width,
            height,
            array_size: 1,
            format,
            depth: false,
            render_target: false,
            unordered_access: false,
            initial_state: ResourceState::PixelShaderResource,
            clear_value: None,
        }
    }

    pub fn array_size(mut self, array_size: u16) -> Self {
        self.array_size = array_size;
        self
    }

    pub fn initial_state(mut self, state: ResourceState) -> Self {
        self.initial_state = state;
        self
    }

    pub fn unordered_access(mut self, enable: bool) -> Self {
        self.unordered_access = enable;
        self
    }

    pub fn clear_value(mut self, value: ClearValue) -> Self {
        self.clear_value = Some(value);
        self
    }
}

/// A texture together with its tracked state and staging views.
#[derive(Debug)]
pub struct Texture {
    id: ResourceId,
    desc: TextureDesc,
    state: TrackedState,
    srv: DescriptorHandle,
    uav: Option<DescriptorHandle>,
    rtv: Option<DescriptorHandle>,
    dsv: Option<DescriptorHandle>,
}

impl Texture {
    /// Create a texture and its views. Views land in the shader invisible, RTV and DSV heaps.
    pub fn new(device: &Device, heaps: &mut DescriptorHeaps, desc: TextureDesc) -> Result<Self> {
        assert!(desc.width > 0 && desc.height > 0, "Texture `{}` has zero size.", desc.name);
        assert!(!(desc.depth && desc.render_target), "Texture `{}` cannot be both depth and color target.", desc.name);
        let id = device.create_texture(&desc)?;
        #[cfg(feature = "log-objects")]
        trace!("Created texture `{}` ({}x{} {:?})", desc.name, desc.width, desc.height, desc.format);

        let srv = heaps.shader_invisible.allocate(&desc.name);
        device.create_view(id, ViewType::Srv, srv)?;
        let uav = if desc.unordered_access {
            let handle = heaps.shader_invisible.allocate(&desc.name);
            device.create_view(id, ViewType::Uav, handle)?;
            Some(handle)
        } else {
            None
        };
        let rtv = if desc.render_target {
            let handle = heaps.rtv.allocate(&desc.name);
            device.create_view(id, ViewType::Rtv, handle)?;
            Some(handle)
        } else {
            None
        };
        let dsv = if desc.depth {
            let handle = heaps.dsv.allocate(&desc.name);
            device.create_view(id, ViewType::Dsv, handle)?;
            Some(handle)
        } else {
            None
        };

        Ok(Self {
            id,
            state: TrackedState::new(desc.initial_state),
            desc,
            srv,
            uav,
            rtv,
            dsv,
        })
    }

    pub fn desc(&self) -> &TextureDesc {
        &self.desc
    }

    pub fn width(&self) -> u32 {
        self.desc.width
    }

    pub fn height(&self) -> u32 {
        self.desc.height
    }

    pub fn format(&self) -> Format {
        self.desc.format
    }

    pub fn is_depth(&self) -> bool {
        self.desc.depth
    }

    pub fn srv(&self) -> DescriptorHandle {
        self.srv
    }

    pub fn uav(&self) -> DescriptorHandle {
        self.uav.unwrap_or_else(|| panic!("Texture `{}` has no unordered access view.", self.desc.name))
    }

    pub fn rtv(&self) -> DescriptorHandle {
        self.rtv.unwrap_or_else(|| panic!("Texture `{}` has no render target view.", self.desc.name))
    }

    pub fn dsv(&self) -> DescriptorHandle {
        self.dsv.unwrap_or_else(|| panic!("Texture `{}` has no depth stencil view.", self.desc.name))
    }

    /// Format used when this texture is bound as a render target or depth target.
    pub fn target_format(&self) -> Format {
        if self.desc.depth {
            self.desc.format.depth_view_format()
        } else {
            self.desc.format
        }
    }
}

impl GraphicsResource for Texture {
    fn id(&self) -> ResourceId {
        self.id
    }

    fn name(&self) -> &str {
        &self.desc.name
    }

    fn kind(&self) -> ResourceKind {
        if self.desc.depth {
            ResourceKind::DepthTexture
        } else {
            ResourceKind::ColorTexture
        }
    }

    fn state(&self) -> ResourceState {
        self.state.get()
    }

    fn set_state(&self, state: ResourceState) {
        self.state.set(state);
    }

    fn tracked_state(&self) -> TrackedState {
        self.state.clone()
    }

    fn read_state(&self) -> ResourceState {
        ResourceState::PixelShaderResource
    }

    fn write_state(&self) -> ResourceState {
        if self.desc.depth {
            ResourceState::DepthWrite
        } else if self.desc.render_target {
            ResourceState::RenderTarget
        } else {
            ResourceState::UnorderedAccess
        }
    }
}
