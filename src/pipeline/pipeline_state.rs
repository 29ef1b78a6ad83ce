//! Compute and graphics pipeline state objects.

use anyhow::Result;

use crate::core::backend::ObjectId;
use crate::core::device::Device;
use crate::pipeline::root_signature::RootSignature;
use crate::pipeline::shader::{Shader, ShaderStage};
use crate::resource::format::Format;

/// Depth comparison function.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ComparisonFunc {
    Never,
    Less,
    LessEqual,
    Equal,
    Greater,
    Always,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct DepthStencilState {
    pub depth_test: bool,
    pub depth_write: bool,
    pub func: ComparisonFunc,
}

impl DepthStencilState {
    pub fn disabled() -> Self {
        Self {
            depth_test: false,
            depth_write: false,
            func: ComparisonFunc::Always,
        }
    }

    pub fn enabled(func: ComparisonFunc, write: bool) -> Self {
        Self {
            depth_test: true,
            depth_write: write,
            func,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum CullMode {
    None,
    Front,
    Back,
}

/// Primitive class the pipeline rasterizes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PrimitiveTopologyType {
    Point,
    Line,
    Triangle,
}

/// One element of the vertex input layout.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InputElement {
    pub semantic: String,
    pub format: Format,
    pub byte_offset: u32,
}

impl InputElement {
    pub fn new(semantic: impl Into<String>, format: Format, byte_offset: u32) -> Self {
        Self {
            semantic: semantic.into(),
            format,
            byte_offset,
        }
    }
}

/// Description of a graphics pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GraphicsPipelineDesc {
    pub vertex_shader: Shader,
    pub pixel_shader: Option<Shader>,
    pub input_layout: Vec<InputElement>,
    pub topology: PrimitiveTopologyType,
    pub render_target_formats: Vec<Format>,
    pub depth_stencil_format: Option<Format>,
    pub depth_stencil: DepthStencilState,
    pub cull_mode: CullMode,
}

impl GraphicsPipelineDesc {
    /// Triangle pipeline without render targets, depth or input layout.
    pub fn new(vertex_shader: Shader) -> Self {
        assert_eq!(vertex_shader.stage, ShaderStage::Vertex, "Expected a vertex shader.");
        Self {
            vertex_shader,
            pixel_shader: None,
            input_layout: Vec::new(),
            topology: PrimitiveTopologyType::Triangle,
            render_target_formats: Vec::new(),
            depth_stencil_format: None,
            depth_stencil: DepthStencilState::disabled(),
            cull_mode: CullMode::Back,
        }
    }

    pub fn pixel_shader(mut self, shader: Shader) -> Self {
        assert_eq!(shader.stage, ShaderStage::Pixel, "Expected a pixel shader.");
        self.pixel_shader = Some(shader);
        self
    }

    pub fn render_target(mut self, format: Format) -> Self {
        assert!(self.render_target_formats.len() < 8, "At most 8 render targets can be bound.");
        self.render_target_formats.push(format);
        self
    }

    pub fn depth_stencil(mut self, format: Format, state: DepthStencilState) -> Self {
        self.depth_stencil_format = Some(format);
        self.depth_stencil = state;
        self
    }

    pub fn input_element(mut self, element: InputElement) -> Self {
        self.input_layout.push(element);
        self
    }

    pub fn cull_mode(mut self, mode: CullMode) -> Self {
        self.cull_mode = mode;
        self
    }
}

/// Description of a pipeline of either kind, as handed to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PipelineDesc {
    Compute(Shader),
    Graphics(GraphicsPipelineDesc),
}

/// A compiled pipeline state object.
#[derive(Debug)]
pub struct PipelineState {
    id: ObjectId,
    name: String,
    root_signature: ObjectId,
    desc: PipelineDesc,
}

impl PipelineState {
    /// Compile a compute pipeline.
    pub fn compute(device: &Device, name: &str, root_signature: &RootSignature, shader: Shader) -> Result<Self> {
        assert_eq!(shader.stage, ShaderStage::Compute, "Pipeline `{name}` expects a compute shader.");
        Self::new(device, name, root_signature, PipelineDesc::Compute(shader))
    }

    /// Compile a graphics pipeline.
    pub fn graphics(
        device: &Device,
        name: &str,
        root_signature: &RootSignature,
        desc: GraphicsPipelineDesc,
    ) -> Result<Self> {
        Self::new(device, name, root_signature, PipelineDesc::Graphics(desc))
    }

    fn new(device: &Device, name: &str, root_signature: &RootSignature, desc: PipelineDesc) -> Result<Self> {
        let id = device.create_pipeline_state(name, root_signature.id(), &desc)?;
        info!("Created pipeline `{}`", name);
        Ok(Self {
            id,
            name: name.to_owned(),
            root_signature: root_signature.id(),
            desc,
        })
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root_signature(&self) -> ObjectId {
        self.root_signature
    }

    pub fn desc(&self) -> &PipelineDesc {
        &self.desc
    }

    pub fn is_compute(&self) -> bool {
        matches!(self.desc, PipelineDesc::Compute(_))
    }

    /// The shader whose macros specialize this pipeline: the compute shader, or else the pixel shader if present.
    pub fn specialized_shader(&self) -> &Shader {
        match &self.desc {
            PipelineDesc::Compute(shader) => shader,
            PipelineDesc::Graphics(desc) => desc.pixel_shader.as_ref().unwrap_or(&desc.vertex_shader),
        }
    }
}
