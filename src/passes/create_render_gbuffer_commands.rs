//! Generates the indirect draw commands of [`RenderGBufferPass`](crate::passes::render_gbuffer::RenderGBufferPass).
//!
//! One thread per mesh appends a [`DrawMeshCommand`](crate::pipeline::indirect::DrawMeshCommand) for every mesh
//! with at least one visible instance, and counts the appended commands in the draw count buffer.
//!
//! Root parameters: `0` table `[t0 mesh descriptions, t1 visible instance count per mesh, u0 draw commands,
//! u1 draw count]`.

use std::rc::Rc;

use anyhow::Result;

use crate::command_buffer::CommandList;
use crate::command_buffer::command::BindPoint;
use crate::core::render_env::RenderEnv;
use crate::descriptor::table::{DescriptorTable, DescriptorTableBuilder};
use crate::graph::barrier::BarrierBatch;
use crate::graph::tracker::commit_states;
use crate::pipeline::pipeline_state::PipelineState;
use crate::pipeline::root_signature::{DescriptorRange, RootSignature, RootSignatureBuilder, ShaderVisibility};
use crate::pipeline::shader::Shader;
use crate::resource::buffer::Buffer;
use crate::resource::GraphicsResource;
use crate::resource::state::ResourceState;
use crate::util::dispatch::num_thread_groups;

const NAME: &str = "CreateRenderGBufferCommandsPass";
const TABLE_PARAM: u32 = 0;
const NUM_THREADS_PER_GROUP: u32 = 64;
/// Slot of the draw count UAV in the table.
const NUM_DRAWS_SLOT: u32 = 3;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ResourceStates {
    pub mesh_descs_state: ResourceState,
    pub visible_instance_counts_state: ResourceState,
    pub draw_commands_state: ResourceState,
    pub num_draws_state: ResourceState,
}

#[derive(Debug)]
pub struct InitParams {
    pub num_meshes: u32,
    pub mesh_descs: Rc<Buffer>,
    pub visible_instance_counts: Rc<Buffer>,
    pub draw_commands: Rc<Buffer>,
    /// Single `R32Uint` element.
    pub num_draws: Rc<Buffer>,
    pub input_states: ResourceStates,
}

#[derive(Debug)]
pub struct CreateRenderGBufferCommandsPass {
    root_signature: RootSignature,
    pipeline: PipelineState,
    table: DescriptorTable,
    barriers: BarrierBatch,
    output_states: ResourceStates,
    num_thread_groups: u32,
    mesh_descs: Rc<Buffer>,
    visible_instance_counts: Rc<Buffer>,
    draw_commands: Rc<Buffer>,
    num_draws: Rc<Buffer>,
}

impl CreateRenderGBufferCommandsPass {
    pub fn init(env: &mut RenderEnv, params: InitParams) -> Result<Self> {
        assert!(params.num_meshes > 0, "{NAME}: no meshes to create commands for.");
        let output_states = ResourceStates {
            mesh_descs_state: ResourceState::NonPixelShaderResource,
            visible_instance_counts_state: ResourceState::NonPixelShaderResource,
            draw_commands_state: ResourceState::UnorderedAccess,
            num_draws_state: ResourceState::UnorderedAccess,
        };
        let input = params.input_states;
        let mut barriers = BarrierBatch::new();
        barriers.push_if_required(&*params.mesh_descs, input.mesh_descs_state, output_states.mesh_descs_state);
        barriers.push_if_required(
            &*params.visible_instance_counts,
            input.visible_instance_counts_state,
            output_states.visible_instance_counts_state,
        );
        barriers.push_if_required(&*params.draw_commands, input.draw_commands_state, output_states.draw_commands_state);
        barriers.push_if_required(&*params.num_draws, input.num_draws_state, output_states.num_draws_state);

        let root_signature = RootSignatureBuilder::new()
            .table([DescriptorRange::srv(2, 0), DescriptorRange::uav(2, 0)], ShaderVisibility::All)
            .build(&env.device, NAME)?;
        let table = DescriptorTableBuilder::new(
            &mut env.heaps.shader_visible,
            NAME,
            root_signature.table_ranges(TABLE_PARAM),
        )
        .srv(params.mesh_descs.srv())
        .srv(params.visible_instance_counts.srv())
        .uav(params.draw_commands.uav())
        .uav(params.num_draws.uav())
        .build(&env.device)?;

        let shader = Shader::compute("CreateRenderGBufferCommandsCS.hlsl", "Main")
            .define("NUM_THREADS_PER_GROUP", NUM_THREADS_PER_GROUP)
            .define("NUM_MESHES", params.num_meshes);
        let pipeline = PipelineState::compute(&env.device, NAME, &root_signature, shader)?;

        let num_thread_groups = num_thread_groups(params.num_meshes, NUM_THREADS_PER_GROUP);
        info!("Initialized {} for {} meshes", NAME, params.num_meshes);
        Ok(Self {
            root_signature,
            pipeline,
            table,
            barriers,
            output_states,
            num_thread_groups,
            mesh_descs: params.mesh_descs,
            visible_instance_counts: params.visible_instance_counts,
            draw_commands: params.draw_commands,
            num_draws: params.num_draws,
        })
    }

    /// Resets the draw count, then creates this frame's commands.
    pub fn record(&self, env: &mut RenderEnv, cmd: &mut CommandList) -> Result<()> {
        let profile = env.start_profile(cmd, NAME);
        cmd.set_pipeline_state(&self.pipeline);
        cmd.set_compute_root_signature(&self.root_signature);
        self.barriers.record(cmd);

        cmd.set_descriptor_heaps(&[&env.heaps.shader_visible]);
        cmd.set_root_descriptor_table(BindPoint::Compute, TABLE_PARAM, self.table.start());
        cmd.clear_unordered_access_view_uint(
            self.table.slot(NUM_DRAWS_SLOT),
            self.num_draws.uav(),
            &*self.num_draws,
            [0; 4],
        );
        cmd.dispatch(self.num_thread_groups, 1, 1);
        env.end_profile(cmd, profile);

        let outputs: [(&dyn GraphicsResource, ResourceState); 4] = [
            (&*self.mesh_descs, self.output_states.mesh_descs_state),
            (&*self.visible_instance_counts, self.output_states.visible_instance_counts_state),
            (&*self.draw_commands, self.output_states.draw_commands_state),
            (&*self.num_draws, self.output_states.num_draws_state),
        ];
        commit_states(outputs);
        Ok(())
    }

    pub fn num_thread_groups(&self) -> u32 {
        self.num_thread_groups
    }

    pub fn barriers(&self) -> &BarrierBatch {
        &self.barriers
    }

    pub fn output_resource_states(&self) -> ResourceStates {
        self.output_states
    }
}
