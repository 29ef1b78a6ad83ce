//! Buffers and their creation parameters.

use anyhow::Result;

use crate::core::device::Device;
use crate::descriptor::heap::{DescriptorHandle, DescriptorHeaps};
use crate::resource::{GraphicsResource, ResourceId, ResourceKind, TrackedState, ViewType};
use crate::resource::format::Format;
use crate::resource::state::ResourceState;

/// Usage of a buffer. Decides its heap, its views and its read and write states.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum BufferKind {
    /// Constant buffer, bound through a CBV.
    Constant,
    /// Array of `element_size` structures, read through an SRV and written through a UAV.
    Structured,
    /// Array of typed elements.
    Formatted(Format),
    /// Buffer read by `ExecuteIndirect`, usually written by a compute shader.
    IndirectArgument,
    /// CPU writable staging memory.
    Upload,
    /// CPU readable memory the device copies into.
    Readback,
}

/// Creation parameters of a [`Buffer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferDesc {
    pub name: String,
    pub kind: BufferKind,
    pub num_elements: u64,
    pub element_size: u64,
    /// Whether an unordered access view is created.
    pub unordered_access: bool,
    pub initial_state: ResourceState,
}

impl BufferDesc {
    pub fn constant(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            kind: BufferKind::Constant,
            num_elements: 1,
            element_size: size,
            unordered_access: false,
            initial_state: ResourceState::VertexAndConstantBuffer,
        }
    }

    pub fn structured(name: impl Into<String>, num_elements: u64, element_size: u64) -> Self {
        Self {
            name: name.into(),
            kind: BufferKind::Structured,
            num_elements,
            element_size,
            unordered_access: true,
            initial_state: ResourceState::Common,
        }
    }

    pub fn formatted(name: impl Into<String>, num_elements: u64, format: Format) -> Self {
        Self {
            name: name.into(),
            kind: BufferKind::Formatted(format),
            num_elements,
            element_size: format.byte_size(),
            unordered_access: true,
            initial_state: ResourceState::Common,
        }
    }

    pub fn indirect_argument(name: impl Into<String>, num_elements: u64, element_size: u64) -> Self {
        Self {
            name: name.into(),
            kind: BufferKind::IndirectArgument,
            num_elements,
            element_size,
            unordered_access: true,
            initial_state: ResourceState::IndirectArgument,
        }
    }

    pub fn upload(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            kind: BufferKind::Upload,
            num_elements: 1,
            element_size: size,
            unordered_access: false,
            initial_state: ResourceState::GenericRead,
        }
    }

    pub fn readback(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            kind: BufferKind::Readback,
            num_elements: 1,
            element_size: size,
            unordered_access: false,
            initial_state: ResourceState::CopyDest,
        }
    }

    /// Override the state the buffer is created in.
    pub fn initial_state(mut self, state: ResourceState) -> Self {
        self.initial_state = state;
        self
    }

    /// Whether to create an unordered access view.
    pub fn unordered_access(mut self, enable: bool) -> Self {
        self.unordered_access = enable;
        self
    }

    /// Total size in bytes.
    pub fn size(&self) -> u64 {
        self.num_elements * self.element_size
    }
}

/// A buffer together with its tracked state and staging views.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct Buffer {
    #[derivative(Debug = "ignore")]
    device: Device,
    id: ResourceId,
    desc: BufferDesc,
    state: TrackedState,
    srv: Option<DescriptorHandle>,
    uav: Option<DescriptorHandle>,
    cbv: Option<DescriptorHandle>,
}

impl Buffer {
    /// Create a buffer and the views its kind calls for in the shader invisible heap.
    pub fn new(device: &Device, heaps: &mut DescriptorHeaps, desc: BufferDesc) -> Result<Self> {
        assert!(desc.size() > 0, "Buffer `{}` has zero size.", desc.name);
        let id = device.create_buffer(&desc)?;
        #[cfg(feature = "log-objects")]
        trace!("Created buffer `{}` ({} bytes)", desc.name, desc.size());

        let mut view = |ty: ViewType| -> Result<DescriptorHandle> {
            let handle = heaps.shader_invisible.allocate(&desc.name);
            device.create_view(id, ty, handle)?;
            Ok(handle)
        };
        let (srv, uav, cbv) = match desc.kind {
            BufferKind::Constant => (None, None, Some(view(ViewType::Cbv)?)),
            BufferKind::Structured | BufferKind::Formatted(_) => {
                let srv = Some(view(ViewType::Srv)?);
                let uav = if desc.unordered_access { Some(view(ViewType::Uav)?) } else { None };
                (srv, uav, None)
            }
            BufferKind::IndirectArgument => {
                let uav = if desc.unordered_access { Some(view(ViewType::Uav)?) } else { None };
                (None, uav, None)
            }
            BufferKind::Upload | BufferKind::Readback => (None, None, None),
        };

        Ok(Self {
            device: device.clone(),
            id,
            state: TrackedState::new(desc.initial_state),
            desc,
            srv,
            uav,
            cbv,
        })
    }

    pub fn desc(&self) -> &BufferDesc {
        &self.desc
    }

    pub fn size(&self) -> u64 {
        self.desc.size()
    }

    pub fn num_elements(&self) -> u64 {
        self.desc.num_elements
    }

    /// Shader resource view in the shader invisible heap.
    pub fn srv(&self) -> DescriptorHandle {
        self.srv.unwrap_or_else(|| panic!("Buffer `{}` has no shader resource view.", self.desc.name))
    }

    /// Unordered access view in the shader invisible heap.
    pub fn uav(&self) -> DescriptorHandle {
        self.uav.unwrap_or_else(|| panic!("Buffer `{}` has no unordered access view.", self.desc.name))
    }

    /// Constant buffer view in the shader invisible heap.
    pub fn cbv(&self) -> DescriptorHandle {
        self.cbv.unwrap_or_else(|| panic!("Buffer `{}` has no constant buffer view.", self.desc.name))
    }

    /// Write CPU data into the buffer. Only valid for memory the CPU can write to.
    pub fn write(&self, offset: u64, data: &[u8]) -> Result<()> {
        assert!(
            matches!(self.desc.kind, BufferKind::Upload | BufferKind::Constant),
            "Buffer `{}` is not CPU writable.",
            self.desc.name
        );
        assert!(offset + data.len() as u64 <= self.size(), "Write out of range of buffer `{}`.", self.desc.name);
        self.device.write_buffer(self.id, offset, data)
    }

    /// Read back data from the buffer. Only valid for readback buffers, and only after the device finished writing.
    pub fn read(&self, offset: u64, size: u64) -> Result<Vec<u8>> {
        assert_eq!(self.desc.kind, BufferKind::Readback, "Buffer `{}` is not a readback buffer.", self.desc.name);
        assert!(offset + size <= self.size(), "Read out of range of buffer `{}`.", self.desc.name);
        self.device.read_buffer(self.id, offset, size)
    }
}

impl GraphicsResource for Buffer {
    fn id(&self) -> ResourceId {
        self.id
    }

    fn name(&self) -> &str {
        &self.desc.name
    }

    fn kind(&self) -> ResourceKind {
        ResourceKind::Buffer
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
        match self.desc.kind {
            BufferKind::Constant => ResourceState::VertexAndConstantBuffer,
            BufferKind::Structured | BufferKind::Formatted(_) => ResourceState::NonPixelShaderResource,
            BufferKind::IndirectArgument => ResourceState::IndirectArgument,
            BufferKind::Upload => ResourceState::GenericRead,
            BufferKind::Readback => ResourceState::CopyDest,
        }
    }

    fn write_state(&self) -> ResourceState {
        match self.desc.kind {
            BufferKind::Constant => ResourceState::CopyDest,
            BufferKind::Structured | BufferKind::Formatted(_) | BufferKind::IndirectArgument => {
                ResourceState::UnorderedAccess
            }
            BufferKind::Upload => ResourceState::GenericRead,
            BufferKind::Readback => ResourceState::CopyDest,
        }
    }
}
