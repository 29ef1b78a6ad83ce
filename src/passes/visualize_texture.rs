//! Shows the contents of a texture on a render target, for debugging intermediate results.
//!
//! Root parameters (pixel shader): `0` application data CBV, `1` table `[t0 texture]`. Sampled with a static point
//! sampler at `s0`.

use std::rc::Rc;

use anyhow::Result;

use crate::command_buffer::CommandList;
use crate::command_buffer::command::BindPoint;
use crate::command_buffer::viewport::Viewport;
use crate::core::render_env::RenderEnv;
use crate::descriptor::table::{DescriptorTable, DescriptorTableBuilder};
use crate::graph::barrier::BarrierBatch;
use crate::graph::tracker::commit_states;
use crate::pipeline::pipeline_state::{GraphicsPipelineDesc, PipelineState};
use crate::pipeline::root_signature::{
    DescriptorRange, RootSignature, RootSignatureBuilder, ShaderVisibility, StaticSampler,
};
use crate::pipeline::shader::Shader;
use crate::resource::buffer::Buffer;
use crate::resource::GraphicsResource;
use crate::resource::state::ResourceState;
use crate::resource::texture::Texture;

const CBV_PARAM: u32 = 0;
const TABLE_PARAM: u32 = 1;

/// How the pixel shader interprets the texture.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum TextureType {
    /// Normals packed into [0, 1].
    Normal = 1,
    TexCoord = 2,
    Rgb = 3,
    /// Single channel, shown as grayscale.
    R = 4,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ResourceStates {
    pub texture_state: ResourceState,
    pub render_target_state: ResourceState,
}

#[derive(Debug)]
pub struct InitParams {
    pub name: String,
    pub texture: Rc<Texture>,
    pub render_target: Rc<Texture>,
    pub texture_type: TextureType,
    pub input_states: ResourceStates,
}

#[derive(Debug)]
pub struct VisualizeTexturePass {
    name: String,
    root_signature: RootSignature,
    pipeline: PipelineState,
    table: DescriptorTable,
    barriers: BarrierBatch,
    output_states: ResourceStates,
    texture: Rc<Texture>,
    render_target: Rc<Texture>,
}

impl VisualizeTexturePass {
    pub fn init(env: &mut RenderEnv, params: InitParams) -> Result<Self> {
        let output_states = ResourceStates {
            texture_state: ResourceState::PixelShaderResource,
            render_target_state: ResourceState::RenderTarget,
        };
        let mut barriers = BarrierBatch::new();
        barriers.push_if_required(&*params.texture, params.input_states.texture_state, output_states.texture_state);
        barriers.push_if_required(
            &*params.render_target,
            params.input_states.render_target_state,
            output_states.render_target_state,
        );

        let root_signature = RootSignatureBuilder::new()
            .cbv(0, ShaderVisibility::Pixel)
            .table([DescriptorRange::srv(1, 0)], ShaderVisibility::Pixel)
            .static_sampler(StaticSampler::point(0, ShaderVisibility::Pixel))
            .allow_input_assembler()
            .build(&env.device, &params.name)?;
        let table = DescriptorTableBuilder::new(
            &mut env.heaps.shader_visible,
            &params.name,
            root_signature.table_ranges(TABLE_PARAM),
        )
        .srv(params.texture.srv())
        .build(&env.device)?;

        let pixel_shader =
            Shader::pixel("VisualizeTexturePS.hlsl", "Main").define("TEXTURE_TYPE", params.texture_type as u32);
        let desc = GraphicsPipelineDesc::new(Shader::fullscreen_triangle())
            .pixel_shader(pixel_shader)
            .render_target(params.render_target.target_format());
        let pipeline = PipelineState::graphics(&env.device, &params.name, &root_signature, desc)?;

        info!("Initialized `{}` showing `{}` as {:?}", params.name, params.texture.name(), params.texture_type);
        Ok(Self {
            name: params.name,
            root_signature,
            pipeline,
            table,
            barriers,
            output_states,
            texture: params.texture,
            render_target: params.render_target,
        })
    }

    pub fn record(&self, env: &mut RenderEnv, cmd: &mut CommandList, app_data: &Buffer, viewport: &Viewport) -> Result<()> {
        let profile = env.start_profile(cmd, &self.name);
        cmd.set_pipeline_state(&self.pipeline);
        cmd.set_graphics_root_signature(&self.root_signature);
        self.barriers.record(cmd);

        cmd.set_descriptor_heaps(&[&env.heaps.shader_visible]);
        cmd.set_root_constant_buffer_view(BindPoint::Graphics, CBV_PARAM, app_data);
        cmd.set_root_descriptor_table(BindPoint::Graphics, TABLE_PARAM, self.table.start());
        cmd.set_render_targets(&[self.render_target.rtv()], None);
        cmd.set_viewport_and_scissor(viewport);
        cmd.draw_fullscreen_triangle();
        env.end_profile(cmd, profile);

        let outputs: [(&dyn GraphicsResource, ResourceState); 2] = [
            (&*self.texture, self.output_states.texture_state),
            (&*self.render_target, self.output_states.render_target_state),
        ];
        commit_states(outputs);
        Ok(())
    }

    pub fn barriers(&self) -> &BarrierBatch {
        &self.barriers
    }

    pub fn output_resource_states(&self) -> ResourceStates {
        self.output_states
    }
}
