//! Builds summed area tables of every tile of a tiled variance shadow map.
//!
//! The table is built in two passes: one over the rows, writing an intermediate texture, and one over the
//! columns of that intermediate texture. Each pass is an indirect dispatch with one record per shadow map tile,
//! which sets the top left corner of the tile as two root constants. Tiles of different sizes need different
//! thread group shapes, so one pipeline is compiled per power of two tile size.
//!
//! Root parameters: `0` tile top left constants, `1` table. The row pass table is `[t0 shadow map, u0 row sums]`,
//! the column pass table `[t0 row sums, u0 summed area table]`.

use std::mem::size_of;
use std::rc::Rc;

use anyhow::Result;

use crate::command_buffer::CommandList;
use crate::core::error::Error;
use crate::core::render_env::RenderEnv;
use crate::descriptor::table::{DescriptorTable, DescriptorTableBuilder};
use crate::graph::barrier::{BarrierBatch, ResourceBarrier};
use crate::passes::shadow::{LightType, NUM_CUBE_MAP_FACES};
use crate::pipeline::command_signature::{CommandSignature, IndirectArgumentDesc};
use crate::pipeline::indirect::CreateSatCommand;
use crate::pipeline::pipeline_state::PipelineState;
use crate::pipeline::root_signature::{DescriptorRange, RootSignature, RootSignatureBuilder, ShaderVisibility};
use crate::pipeline::shader::Shader;
use crate::resource::buffer::{Buffer, BufferDesc};
use crate::resource::format::Format;
use crate::resource::state::ResourceState;
use crate::resource::texture::{Texture, TextureDesc};

const NAME: &str = "CreateTiledShadowMapSATPass";
const CONSTANTS_PARAM: u32 = 0;
const TABLE_PARAM: u32 = 1;
const MAX_THREADS_PER_GROUP: u32 = 1024;
/// Smallest supported tile size.
pub const MIN_TILE_SIZE: u32 = 64;
/// Largest supported tile size.
pub const MAX_TILE_SIZE: u32 = 1024;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ResourceStates {
    pub tiled_shadow_map_state: ResourceState,
    pub summed_area_table_state: ResourceState,
}

#[derive(Debug)]
pub struct InitParams {
    pub name: String,
    pub light_type: LightType,
    pub max_num_lights: u32,
    pub min_tile_size: u32,
    pub max_tile_size: u32,
    pub tiled_shadow_map: Rc<Texture>,
    pub input_states: ResourceStates,
}

/// Pipeline compiled for one tile size.
#[derive(Debug)]
pub struct SatPermutation {
    pub tile_size: u32,
    pub num_threads: [u32; 2],
    pub num_thread_groups: [u32; 2],
    pub pipeline: PipelineState,
}

#[derive(Debug)]
pub struct CreateTiledShadowMapSatPass {
    name: String,
    root_signature: RootSignature,
    command_signature: CommandSignature,
    permutations: Vec<SatPermutation>,
    argument_buffer: Buffer,
    upload_argument_buffer: Buffer,
    row_sums: Texture,
    summed_area_table: Rc<Texture>,
    row_table: DescriptorTable,
    column_table: DescriptorTable,
    upload_barriers: BarrierBatch,
    row_barriers: BarrierBatch,
    column_barriers: BarrierBatch,
    output_states: ResourceStates,
}

impl CreateTiledShadowMapSatPass {
    /// # Panics
    /// Panics unless both tile sizes are powers of two with `64 <= min_tile_size <= max_tile_size <= 1024`, or if
    /// `max_num_lights` is zero.
    pub fn init(env: &mut RenderEnv, params: InitParams) -> Result<Self> {
        assert!(
            params.min_tile_size.is_power_of_two() && params.max_tile_size.is_power_of_two(),
            "{}: tile sizes {} and {} must be powers of two.",
            params.name,
            params.min_tile_size,
            params.max_tile_size
        );
        assert!(
            MIN_TILE_SIZE <= params.min_tile_size
                && params.min_tile_size <= params.max_tile_size
                && params.max_tile_size <= MAX_TILE_SIZE,
            "{}: tile sizes must satisfy {} <= min ({}) <= max ({}) <= {}.",
            params.name,
            MIN_TILE_SIZE,
            params.min_tile_size,
            params.max_tile_size,
            MAX_TILE_SIZE
        );
        assert!(params.max_num_lights > 0, "{}: maximum number of lights is zero.", params.name);

        let output_states = ResourceStates {
            tiled_shadow_map_state: ResourceState::NonPixelShaderResource,
            summed_area_table_state: ResourceState::UnorderedAccess,
        };
        let max_num_tiles = match params.light_type {
            LightType::Point => NUM_CUBE_MAP_FACES * params.max_num_lights,
            LightType::Spot => params.max_num_lights,
        };
        let command_size = size_of::<CreateSatCommand>() as u64;
        let argument_buffer = Buffer::new(
            &env.device,
            &mut env.heaps,
            BufferDesc::indirect_argument(format!("{} arguments", params.name), max_num_tiles as u64, command_size)
                .unordered_access(false),
        )?;
        let upload_argument_buffer = Buffer::new(
            &env.device,
            &mut env.heaps,
            BufferDesc::upload(format!("{} upload arguments", params.name), max_num_tiles as u64 * command_size),
        )?;

        let (width, height) = (params.tiled_shadow_map.width(), params.tiled_shadow_map.height());
        let row_sums = Texture::new(
            &env.device,
            &mut env.heaps,
            TextureDesc::storage(format!("{} row sums", params.name), width, height, Format::R32G32Float)
                .initial_state(ResourceState::NonPixelShaderResource),
        )?;
        let summed_area_table = Texture::new(
            &env.device,
            &mut env.heaps,
            TextureDesc::storage(format!("{} summed area table", params.name), width, height, Format::R32G32Float)
                .initial_state(params.input_states.summed_area_table_state),
        )?;

        let mut upload_barriers = BarrierBatch::new();
        upload_barriers.push(ResourceBarrier::transition(
            &argument_buffer,
            ResourceState::IndirectArgument,
            ResourceState::CopyDest,
        ));

        let mut row_barriers = BarrierBatch::new();
        row_barriers.push(ResourceBarrier::transition(
            &argument_buffer,
            ResourceState::CopyDest,
            ResourceState::IndirectArgument,
        ));
        row_barriers.push_if_required(
            &*params.tiled_shadow_map,
            params.input_states.tiled_shadow_map_state,
            output_states.tiled_shadow_map_state,
        );
        row_barriers.push(ResourceBarrier::transition(
            &row_sums,
            ResourceState::NonPixelShaderResource,
            ResourceState::UnorderedAccess,
        ));

        let mut column_barriers = BarrierBatch::new();
        column_barriers.push_if_required(
            &summed_area_table,
            params.input_states.summed_area_table_state,
            output_states.summed_area_table_state,
        );
        column_barriers.push(ResourceBarrier::transition(
            &row_sums,
            ResourceState::UnorderedAccess,
            ResourceState::NonPixelShaderResource,
        ));

        let root_signature = RootSignatureBuilder::new()
            .constants(0, 2, ShaderVisibility::All)
            .table([DescriptorRange::srv(1, 0), DescriptorRange::uav(1, 0)], ShaderVisibility::All)
            .build(&env.device, &params.name)?;
        let ranges = root_signature.table_ranges(TABLE_PARAM);
        let row_table = DescriptorTableBuilder::new(&mut env.heaps.shader_visible, &params.name, ranges)
            .srv(params.tiled_shadow_map.srv())
            .uav(row_sums.uav())
            .build(&env.device)?;
        let column_table = DescriptorTableBuilder::new(&mut env.heaps.shader_visible, &params.name, ranges)
            .srv(row_sums.srv())
            .uav(summed_area_table.uav())
            .build(&env.device)?;

        let mut permutations = Vec::new();
        let mut tile_size = params.max_tile_size;
        while tile_size >= params.min_tile_size {
            let num_threads_x = tile_size / 2;
            let num_threads_y = MAX_THREADS_PER_GROUP / num_threads_x;
            let shader = Shader::compute("CreateTiledShadowMapSATCS.hlsl", "Main")
                .define("NUM_THREADS_X", num_threads_x)
                .define("NUM_THREADS_Y", num_threads_y);
            let pipeline = PipelineState::compute(
                &env.device,
                &format!("{} {}x{}", params.name, tile_size, tile_size),
                &root_signature,
                shader,
            )?;
            permutations.push(SatPermutation {
                tile_size,
                num_threads: [num_threads_x, num_threads_y],
                num_thread_groups: [1, tile_size / num_threads_y],
                pipeline,
            });
            tile_size /= 2;
        }

        let command_signature = CommandSignature::new(
            &env.device,
            &params.name,
            Some(&root_signature),
            vec![
                IndirectArgumentDesc::Constant {
                    root_index: CONSTANTS_PARAM,
                    dest_offset_in_values: 0,
                    num_values: 2,
                },
                IndirectArgumentDesc::Dispatch,
            ],
            command_size as u32,
        )?;

        info!("Initialized {} `{}` with {} permutations", NAME, params.name, permutations.len());
        Ok(Self {
            name: params.name,
            root_signature,
            command_signature,
            permutations,
            argument_buffer,
            upload_argument_buffer,
            row_sums,
            summed_area_table: Rc::new(summed_area_table),
            row_table,
            column_table,
            upload_barriers,
            row_barriers,
            column_barriers,
            output_states,
        })
    }

    /// Uploading the per tile arguments and the indirect dispatches are not available yet.
    pub fn record(&self, _env: &mut RenderEnv, _cmd: &mut CommandList) -> Result<()> {
        warn!("{}: summed area table construction requested", self.name);
        Err(Error::NotImplemented("indirect summed area table construction").into())
    }

    /// Permutations from the largest to the smallest tile size.
    pub fn permutations(&self) -> &[SatPermutation] {
        &self.permutations
    }

    pub fn summed_area_table(&self) -> &Rc<Texture> {
        &self.summed_area_table
    }

    pub fn row_sums(&self) -> &Texture {
        &self.row_sums
    }

    pub fn argument_buffer(&self) -> &Buffer {
        &self.argument_buffer
    }

    pub fn upload_argument_buffer(&self) -> &Buffer {
        &self.upload_argument_buffer
    }

    pub fn command_signature(&self) -> &CommandSignature {
        &self.command_signature
    }

    pub fn root_signature(&self) -> &RootSignature {
        &self.root_signature
    }

    /// Tables bound for the row pass and for the column pass.
    pub fn tables(&self) -> (DescriptorTable, DescriptorTable) {
        (self.row_table, self.column_table)
    }

    /// Transitions before copying new arguments into the argument buffer.
    pub fn upload_barriers(&self) -> &BarrierBatch {
        &self.upload_barriers
    }

    /// Transitions before the row pass.
    pub fn row_barriers(&self) -> &BarrierBatch {
        &self.row_barriers
    }

    /// Transitions between the row pass and the column pass.
    pub fn column_barriers(&self) -> &BarrierBatch {
        &self.column_barriers
    }

    pub fn output_resource_states(&self) -> ResourceStates {
        self.output_states
    }
}
