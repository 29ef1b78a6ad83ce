//! Projects a cube map onto the first nine spherical harmonics basis functions.
//!
//! The projection runs in two steps. For each coefficient, an integrate pipeline sums the weighted texels of every
//! row of every face into the sum-per-row buffer. The merge pipeline then adds up the rows of all faces and writes
//! one RGB coefficient per basis function.
//!
//! Root parameters: `0` table. The integrate table is `[t0 cube map, u0 sum per row]`, the merge table
//! `[t0 sum per row, u0 coefficients]`.
//!
//! Unlike most passes, the states the inputs arrive in are only known when recording, so the transitions are
//! computed then.

use std::rc::Rc;

use anyhow::Result;

use crate::command_buffer::CommandList;
use crate::command_buffer::command::BindPoint;
use crate::core::render_env::RenderEnv;
use crate::descriptor::table::{DescriptorTable, DescriptorTableBuilder};
use crate::graph::barrier::BarrierBatch;
use crate::graph::tracker::commit_states;
use crate::passes::shadow::NUM_CUBE_MAP_FACES;
use crate::pipeline::pipeline_state::PipelineState;
use crate::pipeline::root_signature::{DescriptorRange, RootSignature, RootSignatureBuilder, ShaderVisibility};
use crate::pipeline::shader::Shader;
use crate::resource::buffer::{Buffer, BufferDesc};
use crate::resource::GraphicsResource;
use crate::resource::state::ResourceState;
use crate::resource::texture::Texture;

const NAME: &str = "CubeMapToSHCoefficientsPass";
const TABLE_PARAM: u32 = 0;
const MAX_THREADS_PER_GROUP: u32 = 1024;
/// Number of spherical harmonics coefficients for bands 0 to 2.
pub const NUM_SH_COEFFICIENTS: u32 = 9;
/// Size of one RGB coefficient, or of one row sum.
const COEFFICIENT_SIZE: u64 = 3 * 4;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ResourceStates {
    pub cube_map_state: ResourceState,
    pub sh_coefficients_state: ResourceState,
}

#[derive(Debug)]
pub struct InitParams {
    /// Square faces, at most 1024 texels wide.
    pub cube_map: Rc<Texture>,
    /// Structured buffer of nine RGB coefficients.
    pub sh_coefficients: Rc<Buffer>,
}

#[derive(Debug)]
pub struct CubeMapToShCoefficientsPass {
    root_signature: RootSignature,
    integrate_pipelines: Vec<PipelineState>,
    merge_pipeline: PipelineState,
    integrate_table: DescriptorTable,
    merge_table: DescriptorTable,
    sum_per_row: Buffer,
    cube_map: Rc<Texture>,
    sh_coefficients: Rc<Buffer>,
    face_size: u32,
}

impl CubeMapToShCoefficientsPass {
    pub fn init(env: &mut RenderEnv, params: InitParams) -> Result<Self> {
        let face_size = params.cube_map.width();
        assert_eq!(
            params.cube_map.desc().array_size as u32,
            NUM_CUBE_MAP_FACES,
            "Texture `{}` is not a cube map.",
            params.cube_map.name()
        );
        assert_eq!(face_size, params.cube_map.height(), "Cube map `{}` faces are not square.", params.cube_map.name());
        assert!(face_size <= MAX_THREADS_PER_GROUP, "Cube map `{}` faces are too large.", params.cube_map.name());
        assert!(
            params.sh_coefficients.num_elements() >= NUM_SH_COEFFICIENTS as u64,
            "Buffer `{}` cannot hold {} coefficients.",
            params.sh_coefficients.name(),
            NUM_SH_COEFFICIENTS
        );

        let num_rows = (NUM_SH_COEFFICIENTS * NUM_CUBE_MAP_FACES * face_size) as u64;
        let sum_per_row = Buffer::new(
            &env.device,
            &mut env.heaps,
            BufferDesc::structured(format!("{NAME} sum per row"), num_rows, COEFFICIENT_SIZE)
                .initial_state(ResourceState::UnorderedAccess),
        )?;

        let root_signature = RootSignatureBuilder::new()
            .table([DescriptorRange::srv(1, 0), DescriptorRange::uav(1, 0)], ShaderVisibility::All)
            .build(&env.device, NAME)?;
        let ranges = root_signature.table_ranges(TABLE_PARAM);
        let integrate_table = DescriptorTableBuilder::new(&mut env.heaps.shader_visible, NAME, ranges)
            .srv(params.cube_map.srv())
            .uav(sum_per_row.uav())
            .build(&env.device)?;
        let merge_table = DescriptorTableBuilder::new(&mut env.heaps.shader_visible, NAME, ranges)
            .srv(sum_per_row.srv())
            .uav(params.sh_coefficients.uav())
            .build(&env.device)?;

        let integrate_pipelines = (0..NUM_SH_COEFFICIENTS)
            .map(|index| {
                let shader = Shader::compute("IntegrateCubeMapCS.hlsl", "Main")
                    .define("COEFFICIENT_INDEX", index)
                    .define("FACE_SIZE", face_size)
                    .define("THREAD_GROUP_SIZE", face_size);
                PipelineState::compute(&env.device, &format!("{NAME} integrate {index}"), &root_signature, shader)
            })
            .collect::<Result<Vec<_>>>()?;
        let merge_shader = Shader::compute("MergeSHCoefficientsCS.hlsl", "Main")
            .define("FACE_SIZE", face_size)
            .define("THREAD_GROUP_SIZE", face_size)
            .define("NUM_COEFFICIENTS", NUM_SH_COEFFICIENTS);
        let merge_pipeline = PipelineState::compute(&env.device, &format!("{NAME} merge"), &root_signature, merge_shader)?;

        info!("Initialized {} for {}x{} faces", NAME, face_size, face_size);
        Ok(Self {
            root_signature,
            integrate_pipelines,
            merge_pipeline,
            integrate_table,
            merge_table,
            sum_per_row,
            cube_map: params.cube_map,
            sh_coefficients: params.sh_coefficients,
            face_size,
        })
    }

    /// Record the projection. `input_states` are the states the cube map and the coefficient buffer are in right
    /// now.
    pub fn record(&self, env: &mut RenderEnv, cmd: &mut CommandList, input_states: ResourceStates) -> Result<()> {
        let output_states = self.output_resource_states();
        let profile = env.start_profile(cmd, NAME);
        cmd.set_compute_root_signature(&self.root_signature);
        cmd.set_descriptor_heaps(&[&env.heaps.shader_visible]);

        let mut integrate_barriers = BarrierBatch::new();
        integrate_barriers.push_if_required(&*self.cube_map, input_states.cube_map_state, output_states.cube_map_state);
        integrate_barriers.push_if_required(&self.sum_per_row, self.sum_per_row.state(), ResourceState::UnorderedAccess);
        integrate_barriers.record(cmd);

        cmd.set_root_descriptor_table(BindPoint::Compute, TABLE_PARAM, self.integrate_table.start());
        for pipeline in &self.integrate_pipelines {
            cmd.set_pipeline_state(pipeline);
            cmd.dispatch(self.face_size, NUM_CUBE_MAP_FACES, 1);
        }

        let mut merge_barriers = BarrierBatch::new();
        merge_barriers.push_if_required(
            &self.sum_per_row,
            ResourceState::UnorderedAccess,
            ResourceState::NonPixelShaderResource,
        );
        merge_barriers.push_if_required(
            &*self.sh_coefficients,
            input_states.sh_coefficients_state,
            output_states.sh_coefficients_state,
        );
        merge_barriers.record(cmd);

        cmd.set_pipeline_state(&self.merge_pipeline);
        cmd.set_root_descriptor_table(BindPoint::Compute, TABLE_PARAM, self.merge_table.start());
        cmd.dispatch(NUM_SH_COEFFICIENTS, 1, 1);
        env.end_profile(cmd, profile);

        let outputs: [(&dyn GraphicsResource, ResourceState); 3] = [
            (&*self.cube_map, output_states.cube_map_state),
            (&*self.sh_coefficients, output_states.sh_coefficients_state),
            (&self.sum_per_row, ResourceState::NonPixelShaderResource),
        ];
        commit_states(outputs);
        Ok(())
    }

    /// One pipeline per coefficient, in coefficient order.
    pub fn integrate_pipelines(&self) -> &[PipelineState] {
        &self.integrate_pipelines
    }

    pub fn merge_pipeline(&self) -> &PipelineState {
        &self.merge_pipeline
    }

    pub fn sum_per_row(&self) -> &Buffer {
        &self.sum_per_row
    }

    pub fn output_resource_states(&self) -> ResourceStates {
        ResourceStates {
            cube_map_state: ResourceState::NonPixelShaderResource,
            sh_coefficients_state: ResourceState::UnorderedAccess,
        }
    }
}
