//! Voxelizes a mesh batch into the voxel grid.
//!
//! Meshes are drawn without render targets; the pixel shader writes the cells it covers through a UAV. The draws
//! are issued with `ExecuteIndirect` from commands generated on the device, so the number of draws is read from
//! a count buffer.
//!
//! Root parameters: `0` instance offset constant, `1` table `[b0 object transform, b1 camera transform,
//! b2 grid config, u0 grid]`.

use std::mem::size_of;
use std::rc::Rc;

use anyhow::Result;

use crate::command_buffer::CommandList;
use crate::command_buffer::command::BindPoint;
use crate::command_buffer::viewport::Viewport;
use crate::core::render_env::RenderEnv;
use crate::descriptor::table::{DescriptorTable, DescriptorTableBuilder};
use crate::graph::barrier::BarrierBatch;
use crate::graph::tracker::commit_states;
use crate::passes::mesh_batch::MeshBatch;
use crate::pipeline::command_signature::{CommandSignature, IndirectArgumentDesc};
use crate::pipeline::indirect::DrawMeshCommand;
use crate::pipeline::pipeline_state::{CullMode, GraphicsPipelineDesc, PipelineState};
use crate::pipeline::root_signature::{DescriptorRange, RootSignature, RootSignatureBuilder, ShaderVisibility};
use crate::pipeline::shader::Shader;
use crate::resource::buffer::Buffer;
use crate::resource::GraphicsResource;
use crate::resource::state::ResourceState;

const NAME: &str = "CreateVoxelGridPass";
const INSTANCE_OFFSET_PARAM: u32 = 0;
const TABLE_PARAM: u32 = 1;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ResourceStates {
    pub grid_state: ResourceState,
    pub draw_commands_state: ResourceState,
    pub num_draws_state: ResourceState,
}

#[derive(Debug)]
pub struct InitParams {
    pub object_transform: Rc<Buffer>,
    pub camera_transform: Rc<Buffer>,
    pub grid_config: Rc<Buffer>,
    pub grid: Rc<Buffer>,
    pub mesh_batch: Rc<MeshBatch>,
    /// One [`DrawMeshCommand`] per mesh of the batch.
    pub draw_commands: Rc<Buffer>,
    /// Number of valid commands in `draw_commands`.
    pub num_draws: Rc<Buffer>,
    pub input_states: ResourceStates,
}

#[derive(Debug)]
pub struct CreateVoxelGridPass {
    root_signature: RootSignature,
    pipeline: PipelineState,
    command_signature: CommandSignature,
    table: DescriptorTable,
    barriers: BarrierBatch,
    output_states: ResourceStates,
    grid: Rc<Buffer>,
    mesh_batch: Rc<MeshBatch>,
    draw_commands: Rc<Buffer>,
    num_draws: Rc<Buffer>,
}

impl CreateVoxelGridPass {
    pub fn init(env: &mut RenderEnv, params: InitParams) -> Result<Self> {
        let output_states = ResourceStates {
            grid_state: ResourceState::UnorderedAccess,
            draw_commands_state: ResourceState::IndirectArgument,
            num_draws_state: ResourceState::IndirectArgument,
        };
        let mut barriers = BarrierBatch::new();
        barriers.push_if_required(&*params.grid, params.input_states.grid_state, output_states.grid_state);
        barriers.push_if_required(
            &*params.draw_commands,
            params.input_states.draw_commands_state,
            output_states.draw_commands_state,
        );
        barriers.push_if_required(
            &*params.num_draws,
            params.input_states.num_draws_state,
            output_states.num_draws_state,
        );

        let root_signature = RootSignatureBuilder::new()
            .constants(3, 1, ShaderVisibility::Vertex)
            .table([DescriptorRange::cbv(3, 0), DescriptorRange::uav(1, 0)], ShaderVisibility::All)
            .allow_input_assembler()
            .build(&env.device, NAME)?;

        let table = DescriptorTableBuilder::new(
            &mut env.heaps.shader_visible,
            NAME,
            root_signature.table_ranges(TABLE_PARAM),
        )
        .cbv(params.object_transform.cbv())
        .cbv(params.camera_transform.cbv())
        .cbv(params.grid_config.cbv())
        .uav(params.grid.uav())
        .build(&env.device)?;

        let mut desc = GraphicsPipelineDesc::new(Shader::vertex("CreateVoxelGridVS.hlsl", "Main"))
            .pixel_shader(Shader::pixel("CreateVoxelGridPS.hlsl", "Main"))
            .cull_mode(CullMode::None);
        for element in params.mesh_batch.input_layout() {
            desc = desc.input_element(element.clone());
        }
        let pipeline = PipelineState::graphics(&env.device, NAME, &root_signature, desc)?;

        let command_signature = CommandSignature::new(
            &env.device,
            NAME,
            Some(&root_signature),
            vec![
                IndirectArgumentDesc::Constant {
                    root_index: INSTANCE_OFFSET_PARAM,
                    dest_offset_in_values: 0,
                    num_values: 1,
                },
                IndirectArgumentDesc::DrawIndexed,
            ],
            size_of::<DrawMeshCommand>() as u32,
        )?;

        info!("Initialized {} for mesh batch `{}`", NAME, params.mesh_batch.name());
        Ok(Self {
            root_signature,
            pipeline,
            command_signature,
            table,
            barriers,
            output_states,
            grid: params.grid,
            mesh_batch: params.mesh_batch,
            draw_commands: params.draw_commands,
            num_draws: params.num_draws,
        })
    }

    pub fn record(&self, env: &mut RenderEnv, cmd: &mut CommandList, viewport: &Viewport) -> Result<()> {
        let profile = env.start_profile(cmd, NAME);
        cmd.set_pipeline_state(&self.pipeline);
        cmd.set_graphics_root_signature(&self.root_signature);
        self.barriers.record(cmd);

        cmd.set_descriptor_heaps(&[&env.heaps.shader_visible]);
        cmd.set_root_descriptor_table(BindPoint::Graphics, TABLE_PARAM, self.table.start());
        cmd.set_viewport_and_scissor(viewport);
        cmd.set_render_targets(&[], None);
        self.mesh_batch.bind(cmd);
        cmd.execute_indirect(
            &self.command_signature,
            self.mesh_batch.num_meshes(),
            &self.draw_commands,
            0,
            Some(&*self.num_draws),
            0,
        );
        env.end_profile(cmd, profile);

        let outputs: [(&dyn GraphicsResource, ResourceState); 3] = [
            (&*self.grid, self.output_states.grid_state),
            (&*self.draw_commands, self.output_states.draw_commands_state),
            (&*self.num_draws, self.output_states.num_draws_state),
        ];
        commit_states(outputs);
        Ok(())
    }

    /// Transitions recorded at the start of every [`CreateVoxelGridPass::record`].
    pub fn barriers(&self) -> &BarrierBatch {
        &self.barriers
    }

    pub fn output_resource_states(&self) -> ResourceStates {
        self.output_states
    }
}
