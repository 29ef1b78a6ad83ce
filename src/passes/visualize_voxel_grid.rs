//! Draws the voxel grid over the scene as seen from the camera, using a fullscreen triangle.
//!
//! Descriptor table (pixel shader): `[b0 grid config, b1 camera transform, t0 depth, t1 grid]`.

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
use crate::pipeline::root_signature::{DescriptorRange, RootSignature, RootSignatureBuilder, ShaderVisibility};
use crate::pipeline::shader::Shader;
use crate::resource::buffer::Buffer;
use crate::resource::GraphicsResource;
use crate::resource::state::ResourceState;
use crate::resource::texture::Texture;

const NAME: &str = "VisualizeVoxelGridPass";
const TABLE_PARAM: u32 = 0;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ResourceStates {
    pub render_target_state: ResourceState,
    pub depth_state: ResourceState,
    pub grid_state: ResourceState,
}

#[derive(Debug)]
pub struct InitParams {
    pub grid_config: Rc<Buffer>,
    pub camera_transform: Rc<Buffer>,
    pub depth: Rc<Texture>,
    pub grid: Rc<Buffer>,
    pub render_target: Rc<Texture>,
    pub input_states: ResourceStates,
}

#[derive(Debug)]
pub struct VisualizeVoxelGridPass {
    root_signature: RootSignature,
    pipeline: PipelineState,
    table: DescriptorTable,
    barriers: BarrierBatch,
    output_states: ResourceStates,
    depth: Rc<Texture>,
    grid: Rc<Buffer>,
    render_target: Rc<Texture>,
}

impl VisualizeVoxelGridPass {
    pub fn init(env: &mut RenderEnv, params: InitParams) -> Result<Self> {
        let output_states = ResourceStates {
            render_target_state: params.render_target.write_state(),
            depth_state: params.depth.read_state(),
            grid_state: ResourceState::PixelShaderResource,
        };
        let mut barriers = BarrierBatch::new();
        barriers.push_if_required(
            &*params.render_target,
            params.input_states.render_target_state,
            output_states.render_target_state,
        );
        barriers.push_if_required(&*params.depth, params.input_states.depth_state, output_states.depth_state);
        barriers.push_if_required(&*params.grid, params.input_states.grid_state, output_states.grid_state);

        let root_signature = RootSignatureBuilder::new()
            .table([DescriptorRange::cbv(2, 0), DescriptorRange::srv(2, 0)], ShaderVisibility::Pixel)
            .allow_input_assembler()
            .build(&env.device, NAME)?;
        let table = DescriptorTableBuilder::new(
            &mut env.heaps.shader_visible,
            NAME,
            root_signature.table_ranges(TABLE_PARAM),
        )
        .cbv(params.grid_config.cbv())
        .cbv(params.camera_transform.cbv())
        .srv(params.depth.srv())
        .srv(params.grid.srv())
        .build(&env.device)?;

        let desc = GraphicsPipelineDesc::new(Shader::fullscreen_triangle())
            .pixel_shader(Shader::pixel("VisualizeVoxelGridPS.hlsl", "Main"))
            .render_target(params.render_target.target_format());
        let pipeline = PipelineState::graphics(&env.device, NAME, &root_signature, desc)?;

        info!("Initialized {} drawing into `{}`", NAME, params.render_target.name());
        Ok(Self {
            root_signature,
            pipeline,
            table,
            barriers,
            output_states,
            depth: params.depth,
            grid: params.grid,
            render_target: params.render_target,
        })
    }

    pub fn record(&self, env: &mut RenderEnv, cmd: &mut CommandList) -> Result<()> {
        let profile = env.start_profile(cmd, NAME);
        cmd.set_pipeline_state(&self.pipeline);
        cmd.set_graphics_root_signature(&self.root_signature);
        self.barriers.record(cmd);

        cmd.set_descriptor_heaps(&[&env.heaps.shader_visible]);
        cmd.set_root_descriptor_table(BindPoint::Graphics, TABLE_PARAM, self.table.start());
        cmd.set_render_targets(&[self.render_target.rtv()], None);
        cmd.set_viewport_and_scissor(&Viewport::new(self.render_target.width(), self.render_target.height()));
        cmd.draw_fullscreen_triangle();
        env.end_profile(cmd, profile);

        let outputs: [(&dyn GraphicsResource, ResourceState); 3] = [
            (&*self.render_target, self.output_states.render_target_state),
            (&*self.depth, self.output_states.depth_state),
            (&*self.grid, self.output_states.grid_state),
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
