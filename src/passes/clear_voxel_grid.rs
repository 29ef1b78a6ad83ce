//! Resets every cell of the voxel grid before it is rebuilt.
//!
//! Descriptor table: `b0` grid config, `u0` grid.

use std::rc::Rc;

use anyhow::Result;

use crate::command_buffer::CommandList;
use crate::command_buffer::command::BindPoint;
use crate::core::render_env::RenderEnv;
use crate::descriptor::table::{DescriptorTable, DescriptorTableBuilder};
use crate::graph::tracker::StateTracker;
use crate::pipeline::pipeline_state::PipelineState;
use crate::pipeline::root_signature::{DescriptorRange, RootSignature, RootSignatureBuilder, ShaderVisibility};
use crate::pipeline::shader::Shader;
use crate::resource::buffer::Buffer;
use crate::resource::GraphicsResource;
use crate::resource::state::ResourceState;
use crate::util::dispatch::num_thread_groups_3d;

const NAME: &str = "ClearVoxelGridPass";
const NUM_THREADS: [u32; 3] = [4, 4, 4];
const TABLE_PARAM: u32 = 0;

#[derive(Debug)]
pub struct InitParams {
    pub grid_config: Rc<Buffer>,
    pub grid: Rc<Buffer>,
    pub num_grid_cells: [u32; 3],
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ResourceStates {
    pub grid_state: ResourceState,
}

#[derive(Debug)]
pub struct ClearVoxelGridPass {
    root_signature: RootSignature,
    pipeline: PipelineState,
    table: DescriptorTable,
    grid: Rc<Buffer>,
    num_thread_groups: [u32; 3],
}

impl ClearVoxelGridPass {
    pub fn init(env: &mut RenderEnv, params: InitParams) -> Result<Self> {
        let root_signature = RootSignatureBuilder::new()
            .table([DescriptorRange::cbv(1, 0), DescriptorRange::uav(1, 0)], ShaderVisibility::All)
            .build(&env.device, NAME)?;
        let shader = Shader::compute("ClearVoxelGridCS.hlsl", "Main")
            .define("NUM_THREADS_X", NUM_THREADS[0])
            .define("NUM_THREADS_Y", NUM_THREADS[1])
            .define("NUM_THREADS_Z", NUM_THREADS[2]);
        let pipeline = PipelineState::compute(&env.device, NAME, &root_signature, shader)?;

        let table = DescriptorTableBuilder::new(
            &mut env.heaps.shader_visible,
            NAME,
            root_signature.table_ranges(TABLE_PARAM),
        )
        .cbv(params.grid_config.cbv())
        .uav(params.grid.uav())
        .build(&env.device)?;

        let num_thread_groups = num_thread_groups_3d(params.num_grid_cells, NUM_THREADS);
        info!("Initialized {} with {:?} thread groups", NAME, num_thread_groups);
        Ok(Self {
            root_signature,
            pipeline,
            table,
            grid: params.grid,
            num_thread_groups,
        })
    }

    /// Transitions the grid to its write state if needed, then clears it.
    pub fn record(&self, env: &mut RenderEnv, cmd: &mut CommandList) -> Result<()> {
        let profile = env.start_profile(cmd, NAME);
        cmd.set_pipeline_state(&self.pipeline);
        cmd.set_compute_root_signature(&self.root_signature);

        let mut tracker = StateTracker::new();
        tracker.require(&*self.grid, self.grid.write_state());
        tracker.flush(cmd);

        cmd.set_descriptor_heaps(&[&env.heaps.shader_visible]);
        cmd.set_root_descriptor_table(BindPoint::Compute, TABLE_PARAM, self.table.start());
        let [x, y, z] = self.num_thread_groups;
        cmd.dispatch(x, y, z);
        env.end_profile(cmd, profile);
        Ok(())
    }

    pub fn num_thread_groups(&self) -> [u32; 3] {
        self.num_thread_groups
    }

    pub fn output_resource_states(&self) -> ResourceStates {
        ResourceStates {
            grid_state: self.grid.write_state(),
        }
    }
}
