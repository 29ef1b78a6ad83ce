//! Culls point and spot lights against screen space tiles.
//!
//! One thread group handles one tile. For every light type it writes a list of light indices per tile and the
//! range of that list, using a counter buffer for allocation that is cleared to zero before every dispatch.
//!
//! Root parameters: `0` application data CBV, `1` descriptor table:
//!
//! | slots | registers | contents |
//! |---|---|---|
//! | 0 | `t0` | depth texture |
//! | 1..3 | `t1..t3` | point lights: light count, light indices, light bounds |
//! | 4..6 | `u0..u2` | point lights: indices offset counter, index per tile, range per tile |
//! | 7..9 | `t4..t6` | spot lights: light count, light indices, light bounds |
//! | 10..12 | `u3..u5` | spot lights: indices offset counter, index per tile, range per tile |
//!
//! Light types with a maximum count of zero are left out, and the slots of the spot lights move up to 1..6.

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
use crate::resource::buffer::{Buffer, BufferDesc};
use crate::resource::format::Format;
use crate::resource::GraphicsResource;
use crate::resource::state::ResourceState;
use crate::resource::texture::Texture;

const NAME: &str = "TiledLightCullingPass";
const CBV_PARAM: u32 = 0;
const TABLE_PARAM: u32 = 1;
// Start and length of a light index list
const RANGE_SIZE: u64 = 8;

/// Light data produced by earlier passes for one light type.
#[derive(Debug)]
pub struct LightInput {
    pub max_num_lights: u32,
    pub num_lights: Rc<Buffer>,
    pub light_indices: Rc<Buffer>,
    pub light_bounds: Rc<Buffer>,
}

/// States of the resources of one light type.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct LightResourceStates {
    pub num_lights_state: ResourceState,
    pub light_indices_state: ResourceState,
    pub light_bounds_state: ResourceState,
    pub index_per_tile_state: ResourceState,
    pub range_per_tile_state: ResourceState,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ResourceStates {
    pub depth_state: ResourceState,
    pub point_lights: Option<LightResourceStates>,
    pub spot_lights: Option<LightResourceStates>,
}

#[derive(Debug)]
pub struct InitParams {
    pub depth: Rc<Texture>,
    pub tile_size: u32,
    pub num_tiles_x: u32,
    pub num_tiles_y: u32,
    pub point_lights: Option<LightInput>,
    pub spot_lights: Option<LightInput>,
    /// States the inputs arrive in, and the states the per tile buffers are created in.
    pub input_states: ResourceStates,
}

/// Per tile light lists of one light type, written by the pass.
#[derive(Debug)]
pub struct LightCullingOutput {
    indices_offset: Buffer,
    index_per_tile: Rc<Buffer>,
    range_per_tile: Rc<Buffer>,
    // Table slot of the indices offset UAV, needed to clear it
    indices_offset_slot: u32,
    input: LightInput,
}

impl LightCullingOutput {
    fn new(
        env: &mut RenderEnv,
        prefix: &str,
        input: LightInput,
        num_tiles: u64,
        states: &LightResourceStates,
    ) -> Result<Self> {
        let indices_offset = Buffer::new(
            &env.device,
            &mut env.heaps,
            BufferDesc::formatted(format!("{prefix} light indices offset"), 1, Format::R32Uint)
                .initial_state(ResourceState::UnorderedAccess),
        )?;
        let index_per_tile = Buffer::new(
            &env.device,
            &mut env.heaps,
            BufferDesc::formatted(
                format!("{prefix} light index per tile"),
                num_tiles * input.max_num_lights as u64,
                Format::R32Uint,
            )
            .initial_state(states.index_per_tile_state),
        )?;
        let range_per_tile = Buffer::new(
            &env.device,
            &mut env.heaps,
            BufferDesc::structured(format!("{prefix} light range per tile"), num_tiles, RANGE_SIZE)
                .initial_state(states.range_per_tile_state),
        )?;
        Ok(Self {
            indices_offset,
            index_per_tile: Rc::new(index_per_tile),
            range_per_tile: Rc::new(range_per_tile),
            indices_offset_slot: 0,
            input,
        })
    }

    /// Indices of the lights overlapping each tile, `max_num_lights` entries per tile.
    pub fn index_per_tile(&self) -> &Rc<Buffer> {
        &self.index_per_tile
    }

    /// Start and length of each tile's list in [`LightCullingOutput::index_per_tile`].
    pub fn range_per_tile(&self) -> &Rc<Buffer> {
        &self.range_per_tile
    }

    pub fn indices_offset(&self) -> &Buffer {
        &self.indices_offset
    }

    fn push_barriers(&self, barriers: &mut BarrierBatch, input: &LightResourceStates, output: &LightResourceStates) {
        barriers.push_if_required(&*self.input.num_lights, input.num_lights_state, output.num_lights_state);
        barriers.push_if_required(&*self.input.light_indices, input.light_indices_state, output.light_indices_state);
        barriers.push_if_required(&*self.input.light_bounds, input.light_bounds_state, output.light_bounds_state);
        barriers.push_if_required(
            &*self.index_per_tile,
            input.index_per_tile_state,
            output.index_per_tile_state,
        );
        barriers.push_if_required(
            &*self.range_per_tile,
            input.range_per_tile_state,
            output.range_per_tile_state,
        );
    }

    fn fill_table(&mut self, builder: DescriptorTableBuilder, first_uav_slot: u32) -> DescriptorTableBuilder {
        self.indices_offset_slot = first_uav_slot;
        builder
            .srv(self.input.num_lights.srv())
            .srv(self.input.light_indices.srv())
            .srv(self.input.light_bounds.srv())
            .uav(self.indices_offset.uav())
            .uav(self.index_per_tile.uav())
            .uav(self.range_per_tile.uav())
    }

    fn commit(&self, states: &LightResourceStates) {
        let outputs: [(&dyn GraphicsResource, ResourceState); 5] = [
            (&*self.input.num_lights, states.num_lights_state),
            (&*self.input.light_indices, states.light_indices_state),
            (&*self.input.light_bounds, states.light_bounds_state),
            (&*self.index_per_tile, states.index_per_tile_state),
            (&*self.range_per_tile, states.range_per_tile_state),
        ];
        commit_states(outputs);
    }
}

fn light_output_states() -> LightResourceStates {
    LightResourceStates {
        num_lights_state: ResourceState::NonPixelShaderResource,
        light_indices_state: ResourceState::NonPixelShaderResource,
        light_bounds_state: ResourceState::NonPixelShaderResource,
        index_per_tile_state: ResourceState::UnorderedAccess,
        range_per_tile_state: ResourceState::UnorderedAccess,
    }
}

#[derive(Debug)]
pub struct TiledLightCullingPass {
    root_signature: RootSignature,
    pipeline: PipelineState,
    table: DescriptorTable,
    barriers: BarrierBatch,
    output_states: ResourceStates,
    depth: Rc<Texture>,
    point_lights: Option<LightCullingOutput>,
    spot_lights: Option<LightCullingOutput>,
    num_thread_groups: [u32; 2],
}

impl TiledLightCullingPass {
    /// # Panics
    /// Panics if neither light type is given, if a light type has a maximum count of zero, or if the input
    /// states of a given light type are missing.
    pub fn init(env: &mut RenderEnv, params: InitParams) -> Result<Self> {
        assert!(
            params.point_lights.is_some() || params.spot_lights.is_some(),
            "{NAME} needs point lights, spot lights or both."
        );
        let num_tiles = params.num_tiles_x as u64 * params.num_tiles_y as u64;
        let light_output = |env: &mut RenderEnv, prefix: &str, input: Option<LightInput>, states: Option<LightResourceStates>| {
            input
                .map(|input| {
                    assert!(input.max_num_lights > 0, "{NAME}: maximum number of {prefix} lights is zero.");
                    let states = states
                        .unwrap_or_else(|| panic!("{NAME}: missing input states of the {prefix} light resources."));
                    LightCullingOutput::new(env, prefix, input, num_tiles, &states)
                })
                .transpose()
        };
        let max_num_point_lights = params.point_lights.as_ref().map_or(0, |input| input.max_num_lights);
        let max_num_spot_lights = params.spot_lights.as_ref().map_or(0, |input| input.max_num_lights);
        let mut point_lights = light_output(env, "point", params.point_lights, params.input_states.point_lights)?;
        let mut spot_lights = light_output(env, "spot", params.spot_lights, params.input_states.spot_lights)?;

        let output_states = ResourceStates {
            depth_state: ResourceState::NonPixelShaderResource,
            point_lights: point_lights.as_ref().map(|_| light_output_states()),
            spot_lights: spot_lights.as_ref().map(|_| light_output_states()),
        };
        let mut barriers = BarrierBatch::new();
        barriers.push_if_required(&*params.depth, params.input_states.depth_state, output_states.depth_state);
        if let (Some(output), Some(input), Some(required)) =
            (&point_lights, &params.input_states.point_lights, &output_states.point_lights)
        {
            output.push_barriers(&mut barriers, input, required);
        }
        if let (Some(output), Some(input), Some(required)) =
            (&spot_lights, &params.input_states.spot_lights, &output_states.spot_lights)
        {
            output.push_barriers(&mut barriers, input, required);
        }

        let mut ranges = vec![DescriptorRange::srv(1, 0)];
        if point_lights.is_some() {
            ranges.push(DescriptorRange::srv(3, 1));
            ranges.push(DescriptorRange::uav(3, 0));
        }
        if spot_lights.is_some() {
            ranges.push(DescriptorRange::srv(3, 4));
            ranges.push(DescriptorRange::uav(3, 3));
        }
        let root_signature = RootSignatureBuilder::new()
            .cbv(0, ShaderVisibility::All)
            .table(ranges, ShaderVisibility::All)
            .build(&env.device, NAME)?;

        let mut builder = DescriptorTableBuilder::new(
            &mut env.heaps.shader_visible,
            NAME,
            root_signature.table_ranges(TABLE_PARAM),
        )
        .srv(params.depth.srv());
        let mut next_slot = 1;
        if let Some(output) = point_lights.as_mut() {
            builder = output.fill_table(builder, next_slot + 3);
            next_slot += 6;
        }
        if let Some(output) = spot_lights.as_mut() {
            builder = output.fill_table(builder, next_slot + 3);
        }
        let table = builder.build(&env.device)?;

        let shader = Shader::compute("TiledLightCullingCS.hlsl", "Main")
            .define("TILE_SIZE", params.tile_size)
            .define("NUM_TILES_X", params.num_tiles_x)
            .define("MAX_NUM_POINT_LIGHTS", max_num_point_lights)
            .define("MAX_NUM_SPOT_LIGHTS", max_num_spot_lights);
        let pipeline = PipelineState::compute(&env.device, NAME, &root_signature, shader)?;

        info!(
            "Initialized {} for {}x{} tiles, {} point and {} spot lights",
            NAME, params.num_tiles_x, params.num_tiles_y, max_num_point_lights, max_num_spot_lights
        );
        Ok(Self {
            root_signature,
            pipeline,
            table,
            barriers,
            output_states,
            depth: params.depth,
            point_lights,
            spot_lights,
            num_thread_groups: [params.num_tiles_x, params.num_tiles_y],
        })
    }

    /// `app_data` is bound as the root constant buffer at `b0`.
    pub fn record(&self, env: &mut RenderEnv, cmd: &mut CommandList, app_data: &Buffer) -> Result<()> {
        let profile = env.start_profile(cmd, NAME);
        cmd.set_pipeline_state(&self.pipeline);
        cmd.set_compute_root_signature(&self.root_signature);
        self.barriers.record(cmd);

        cmd.set_descriptor_heaps(&[&env.heaps.shader_visible]);
        cmd.set_root_constant_buffer_view(BindPoint::Compute, CBV_PARAM, app_data);
        cmd.set_root_descriptor_table(BindPoint::Compute, TABLE_PARAM, self.table.start());
        for output in self.point_lights.iter().chain(self.spot_lights.iter()) {
            cmd.clear_unordered_access_view_uint(
                self.table.slot(output.indices_offset_slot),
                output.indices_offset.uav(),
                &output.indices_offset,
                [0; 4],
            );
        }
        let [x, y] = self.num_thread_groups;
        cmd.dispatch(x, y, 1);
        env.end_profile(cmd, profile);

        self.depth.set_state(self.output_states.depth_state);
        if let (Some(output), Some(states)) = (&self.point_lights, &self.output_states.point_lights) {
            output.commit(states);
        }
        if let (Some(output), Some(states)) = (&self.spot_lights, &self.output_states.spot_lights) {
            output.commit(states);
        }
        Ok(())
    }

    pub fn point_lights(&self) -> Option<&LightCullingOutput> {
        self.point_lights.as_ref()
    }

    pub fn spot_lights(&self) -> Option<&LightCullingOutput> {
        self.spot_lights.as_ref()
    }

    pub fn num_thread_groups(&self) -> [u32; 2] {
        self.num_thread_groups
    }

    pub fn barriers(&self) -> &BarrierBatch {
        &self.barriers
    }

    pub fn output_resource_states(&self) -> ResourceStates {
        self.output_states
    }
}
