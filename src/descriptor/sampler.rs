use anyhow::Result;

use crate::core::device::Device;
use crate::descriptor::heap::{DescriptorHandle, DescriptorHeap, DescriptorHeapType};

/// Texture filtering mode.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Filter {
    Point,
    Linear,
    Anisotropic,
}

/// Behaviour for texture coordinates outside of [0, 1].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum AddressMode {
    Wrap,
    Clamp,
    Border,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct SamplerDesc {
    pub filter: Filter,
    pub address_mode: AddressMode,
}

/// A sampler descriptor written directly into a shader visible sampler heap.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Sampler {
    desc: SamplerDesc,
    handle: DescriptorHandle,
}

impl Sampler {
    pub fn new(device: &Device, heap: &mut DescriptorHeap, owner: &str, desc: SamplerDesc) -> Result<Self> {
        assert_eq!(heap.heap_type(), DescriptorHeapType::Sampler, "Samplers must be allocated from a sampler heap.");
        let handle = heap.allocate(owner);
        device.create_sampler(&desc, handle)?;
        Ok(Self { desc, handle })
    }

    pub fn desc(&self) -> &SamplerDesc {
        &self.desc
    }

    /// Start of the single-entry sampler table.
    pub fn handle(&self) -> DescriptorHandle {
        self.handle
    }
}
