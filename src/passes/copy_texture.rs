//! Copies one texture into another by sampling it in a fullscreen pass, which also converts between formats.
//!
//! Root parameters (pixel shader): `0` table `[t0 source]`, plus a static linear sampler at `s0`.

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
use crate::resource::GraphicsResource;
use crate::resource::state::ResourceState;
use crate::resource::texture::Texture;

const TABLE_PARAM: u32 = 0;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ResourceStates {
    pub src_texture_state: ResourceState,
    pub dest_texture_state: ResourceState,
}

#[derive(Debug)]
pub struct InitParams {
    pub name: String,
    pub src_texture: Rc<Texture>,
    pub dest_texture: Rc<Texture>,
    pub input_states: ResourceStates,
    /// States to leave both textures in. If `None`, they stay in the states the copy needs.
    pub end_states: Option<ResourceStates>,
}

#[derive(Debug)]
pub struct CopyTexturePass {
    name: String,
    root_signature: RootSignature,
    pipeline: PipelineState,
    table: DescriptorTable,
    barriers: BarrierBatch,
    end_barriers: BarrierBatch,
    output_states: ResourceStates,
    src_texture: Rc<Texture>,
    dest_texture: Rc<Texture>,
}

impl CopyTexturePass {
    pub fn init(env: &mut RenderEnv, params: InitParams) -> Result<Self> {
        let copy_states = ResourceStates {
            src_texture_state: ResourceState::PixelShaderResource,
            dest_texture_state: ResourceState::RenderTarget,
        };
        let mut barriers = BarrierBatch::new();
        barriers.push_if_required(
            &*params.src_texture,
            params.input_states.src_texture_state,
            copy_states.src_texture_state,
        );
        barriers.push_if_required(
            &*params.dest_texture,
            params.input_states.dest_texture_state,
            copy_states.dest_texture_state,
        );

        let output_states = params.end_states.unwrap_or(copy_states);
        let mut end_barriers = BarrierBatch::new();
        end_barriers.push_if_required(&*params.src_texture, copy_states.src_texture_state, output_states.src_texture_state);
        end_barriers.push_if_required(
            &*params.dest_texture,
            copy_states.dest_texture_state,
            output_states.dest_texture_state,
        );

        let root_signature = RootSignatureBuilder::new()
            .table([DescriptorRange::srv(1, 0)], ShaderVisibility::Pixel)
            .static_sampler(StaticSampler::linear(0, ShaderVisibility::Pixel))
            .build(&env.device, &params.name)?;
        let table = DescriptorTableBuilder::new(
            &mut env.heaps.shader_visible,
            &params.name,
            root_signature.table_ranges(TABLE_PARAM),
        )
        .srv(params.src_texture.srv())
        .build(&env.device)?;

        let desc = GraphicsPipelineDesc::new(Shader::fullscreen_triangle())
            .pixel_shader(Shader::pixel("CopyTexturePS.hlsl", "Main"))
            .render_target(params.dest_texture.target_format());
        let pipeline = PipelineState::graphics(&env.device, &params.name, &root_signature, desc)?;

        info!(
            "Initialized `{}` copying `{}` into `{}`",
            params.name,
            params.src_texture.name(),
            params.dest_texture.name()
        );
        Ok(Self {
            name: params.name,
            root_signature,
            pipeline,
            table,
            barriers,
            end_barriers,
            output_states,
            src_texture: params.src_texture,
            dest_texture: params.dest_texture,
        })
    }

    pub fn record(&self, env: &mut RenderEnv, cmd: &mut CommandList) -> Result<()> {
        let profile = env.start_profile(cmd, &self.name);
        cmd.set_pipeline_state(&self.pipeline);
        cmd.set_graphics_root_signature(&self.root_signature);
        self.barriers.record(cmd);

        cmd.set_descriptor_heaps(&[&env.heaps.shader_visible]);
        cmd.set_root_descriptor_table(BindPoint::Graphics, TABLE_PARAM, self.table.start());
        cmd.set_render_targets(&[self.dest_texture.rtv()], None);
        cmd.set_viewport_and_scissor(&Viewport::new(self.dest_texture.width(), self.dest_texture.height()));
        cmd.draw_fullscreen_triangle();
        self.end_barriers.record(cmd);
        env.end_profile(cmd, profile);

        let outputs: [(&dyn GraphicsResource, ResourceState); 2] = [
            (&*self.src_texture, self.output_states.src_texture_state),
            (&*self.dest_texture, self.output_states.dest_texture_state),
        ];
        commit_states(outputs);
        Ok(())
    }

    /// Transitions recorded before the copy.
    pub fn barriers(&self) -> &BarrierBatch {
        &self.barriers
    }

    /// Transitions into the end states, recorded after the copy.
    pub fn end_barriers(&self) -> &BarrierBatch {
        &self.end_barriers
    }

    pub fn output_resource_states(&self) -> ResourceStates {
        self.output_states
    }
}
