//! Root signatures: the layout of root constants, root views and descriptor tables a pipeline is bound with.
//!
//! Root parameter indices are assigned in the order parameters are added to the [`RootSignatureBuilder`].

use anyhow::Result;

use crate::core::backend::ObjectId;
use crate::core::device::Device;
use crate::descriptor::sampler::{AddressMode, Filter};

/// Shader stages that can see a root parameter.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ShaderVisibility {
    All,
    Vertex,
    Pixel,
}

/// Type of the descriptors in a table range.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum RangeType {
    Srv,
    Uav,
    Cbv,
    Sampler,
}

/// `count` consecutive descriptors bound to registers starting at `base_register`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct DescriptorRange {
    pub ty: RangeType,
    pub count: u32,
    pub base_register: u32,
}

impl DescriptorRange {
    pub fn srv(count: u32, base_register: u32) -> Self {
        Self { ty: RangeType::Srv, count, base_register }
    }

    pub fn uav(count: u32, base_register: u32) -> Self {
        Self { ty: RangeType::Uav, count, base_register }
    }

    pub fn cbv(count: u32, base_register: u32) -> Self {
        Self { ty: RangeType::Cbv, count, base_register }
    }

    pub fn sampler(count: u32, base_register: u32) -> Self {
        Self { ty: RangeType::Sampler, count, base_register }
    }
}

/// A single root parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RootParameter {
    /// 32-bit values set directly on the command list.
    Constants { register: u32, num_values: u32, visibility: ShaderVisibility },
    /// Constant buffer bound by address.
    Cbv { register: u32, visibility: ShaderVisibility },
    /// Buffer shader resource bound by address.
    Srv { register: u32, visibility: ShaderVisibility },
    /// Range of a shader visible descriptor heap.
    Table { ranges: Vec<DescriptorRange>, visibility: ShaderVisibility },
}

/// Sampler baked into the root signature.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct StaticSampler {
    pub register: u32,
    pub filter: Filter,
    pub address_mode: AddressMode,
    pub visibility: ShaderVisibility,
}

impl StaticSampler {
    /// Point sampler with clamped addressing.
    pub fn point(register: u32, visibility: ShaderVisibility) -> Self {
        Self {
            register,
            filter: Filter::Point,
            address_mode: AddressMode::Clamp,
            visibility,
        }
    }

    /// Trilinear sampler with wrapped addressing.
    pub fn linear(register: u32, visibility: ShaderVisibility) -> Self {
        Self {
            register,
            filter: Filter::Linear,
            address_mode: AddressMode::Wrap,
            visibility,
        }
    }
}

/// Full description of a root signature.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash)]
pub struct RootSignatureDesc {
    pub parameters: Vec<RootParameter>,
    pub static_samplers: Vec<StaticSampler>,
    /// Allow the input assembler to read vertex input layouts.
    pub allow_input_assembler: bool,
}

/// Builder for [`RootSignature`]s.
#[derive(Debug, Default)]
pub struct RootSignatureBuilder {
    inner: RootSignatureDesc,
}

impl RootSignatureBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add root constants. Returns the builder, the parameter index is the number of parameters added before.
    pub fn constants(mut self, register: u32, num_values: u32, visibility: ShaderVisibility) -> Self {
        self.inner.parameters.push(RootParameter::Constants {
            register,
            num_values,
            visibility,
        });
        self
    }

    pub fn cbv(mut self, register: u32, visibility: ShaderVisibility) -> Self {
        self.inner.parameters.push(RootParameter::Cbv { register, visibility });
        self
    }

    pub fn srv(mut self, register: u32, visibility: ShaderVisibility) -> Self {
        self.inner.parameters.push(RootParameter::Srv { register, visibility });
        self
    }

    /// Add a descriptor table spanning the given ranges, in slot order.
    pub fn table(mut self, ranges: impl Into<Vec<DescriptorRange>>, visibility: ShaderVisibility) -> Self {
        let ranges = ranges.into();
        assert!(!ranges.is_empty(), "Descriptor table root parameter needs at least one range.");
        self.inner.parameters.push(RootParameter::Table { ranges, visibility });
        self
    }

    pub fn static_sampler(mut self, sampler: StaticSampler) -> Self {
        self.inner.static_samplers.push(sampler);
        self
    }

    pub fn allow_input_assembler(mut self) -> Self {
        self.inner.allow_input_assembler = true;
        self
    }

    /// Number of parameters added so far. Handy when parameter indices depend on runtime options.
    pub fn num_parameters(&self) -> u32 {
        self.inner.parameters.len() as u32
    }

    pub fn build(self, device: &Device, name: &str) -> Result<RootSignature> {
        RootSignature::new(device, name, self.inner)
    }
}

/// A compiled root signature.
#[derive(Debug)]
pub struct RootSignature {
    id: ObjectId,
    name: String,
    desc: RootSignatureDesc,
}

impl RootSignature {
    pub fn new(device: &Device, name: &str, desc: RootSignatureDesc) -> Result<Self> {
        let id = device.create_root_signature(name, &desc)?;
        #[cfg(feature = "log-objects")]
        trace!("Created root signature `{}` with {} parameters", name, desc.parameters.len());
        Ok(Self {
            id,
            name: name.to_owned(),
            desc,
        })
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn desc(&self) -> &RootSignatureDesc {
        &self.desc
    }

    pub fn parameter(&self, index: u32) -> &RootParameter {
        self.desc
            .parameters
            .get(index as usize)
            .unwrap_or_else(|| panic!("Root signature `{}` has no parameter {}.", self.name, index))
    }

    /// Ranges of the descriptor table at root parameter `index`.
    pub fn table_ranges(&self, index: u32) -> &[DescriptorRange] {
        match self.parameter(index) {
            RootParameter::Table { ranges, .. } => ranges,
            other => panic!("Root parameter {} of `{}` is not a descriptor table but {:?}.", index, self.name, other),
        }
    }
}
