//! Writes the mesh type of every pixel into a depth buffer, so later passes can use the depth test to run only
//! on pixels of one mesh type.
//!
//! Root parameters (pixel shader): `0` number of mesh types as a root constant, `1` table
//! `[t0 material id texture, t1 mesh type per material id buffer]`.

use std::rc::Rc;

use anyhow::Result;

use crate::command_buffer::CommandList;
use crate::command_buffer::command::BindPoint;
use crate::command_buffer::viewport::Viewport;
use crate::core::render_env::RenderEnv;
use crate::descriptor::table::{DescriptorTable, DescriptorTableBuilder};
use crate::graph::barrier::BarrierBatch;
use crate::graph::tracker::commit_states;
use crate::pipeline::pipeline_state::{ComparisonFunc, DepthStencilState, GraphicsPipelineDesc, PipelineState};
use crate::pipeline::root_signature::{DescriptorRange, RootSignature, RootSignatureBuilder, ShaderVisibility};
use crate::pipeline::shader::Shader;
use crate::resource::buffer::Buffer;
use crate::resource::format::Format;
use crate::resource::GraphicsResource;
use crate::resource::state::ResourceState;
use crate::resource::texture::{Texture, TextureDesc};

const NAME: &str = "FillDepthBufferWithMeshTypePass";
const CONSTANT_PARAM: u32 = 0;
const TABLE_PARAM: u32 = 1;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ResourceStates {
    pub material_id_texture_state: ResourceState,
    pub mesh_type_per_material_id_state: ResourceState,
    pub depth_texture_with_mesh_type_state: ResourceState,
}

#[derive(Debug)]
pub struct InitParams {
    pub material_id_texture: Rc<Texture>,
    pub mesh_type_per_material_id: Rc<Buffer>,
    /// `depth_texture_with_mesh_type_state` is the state the owned depth texture is created in.
    pub input_states: ResourceStates,
}

#[derive(Debug)]
pub struct FillDepthBufferWithMeshTypePass {
    root_signature: RootSignature,
    pipeline: PipelineState,
    table: DescriptorTable,
    barriers: BarrierBatch,
    output_states: ResourceStates,
    material_id_texture: Rc<Texture>,
    mesh_type_per_material_id: Rc<Buffer>,
    depth_texture_with_mesh_type: Rc<Texture>,
}

impl FillDepthBufferWithMeshTypePass {
    pub fn init(env: &mut RenderEnv, params: InitParams) -> Result<Self> {
        let output_states = ResourceStates {
            material_id_texture_state: ResourceState::PixelShaderResource,
            mesh_type_per_material_id_state: ResourceState::PixelShaderResource,
            depth_texture_with_mesh_type_state: ResourceState::DepthWrite,
        };
        let depth_texture = Texture::new(
            &env.device,
            &mut env.heaps,
            TextureDesc::depth(
                format!("{NAME} depth with mesh type"),
                params.material_id_texture.width(),
                params.material_id_texture.height(),
                Format::R16Typeless,
            )
            .initial_state(params.input_states.depth_texture_with_mesh_type_state),
        )?;

        let mut barriers = BarrierBatch::new();
        barriers.push_if_required(
            &*params.material_id_texture,
            params.input_states.material_id_texture_state,
            output_states.material_id_texture_state,
        );
        barriers.push_if_required(
            &*params.mesh_type_per_material_id,
            params.input_states.mesh_type_per_material_id_state,
            output_states.mesh_type_per_material_id_state,
        );
        barriers.push_if_required(
            &depth_texture,
            params.input_states.depth_texture_with_mesh_type_state,
            output_states.depth_texture_with_mesh_type_state,
        );

        let root_signature = RootSignatureBuilder::new()
            .constants(0, 1, ShaderVisibility::Pixel)
            .table([DescriptorRange::srv(2, 0)], ShaderVisibility::Pixel)
            .build(&env.device, NAME)?;
        let table = DescriptorTableBuilder::new(
            &mut env.heaps.shader_visible,
            NAME,
            root_signature.table_ranges(TABLE_PARAM),
        )
        .srv(params.material_id_texture.srv())
        .srv(params.mesh_type_per_material_id.srv())
        .build(&env.device)?;

        let desc = GraphicsPipelineDesc::new(Shader::fullscreen_triangle())
            .pixel_shader(Shader::pixel("FillDepthBufferWithMeshTypePS.hlsl", "Main"))
            .depth_stencil(depth_texture.target_format(), DepthStencilState::enabled(ComparisonFunc::Always, true));
        let pipeline = PipelineState::graphics(&env.device, NAME, &root_signature, desc)?;

        info!(
            "Initialized {} ({}x{})",
            NAME,
            depth_texture.width(),
            depth_texture.height()
        );
        Ok(Self {
            root_signature,
            pipeline,
            table,
            barriers,
            output_states,
            material_id_texture: params.material_id_texture,
            mesh_type_per_material_id: params.mesh_type_per_material_id,
            depth_texture_with_mesh_type: Rc::new(depth_texture),
        })
    }

    pub fn record(&self, env: &mut RenderEnv, cmd: &mut CommandList, num_mesh_types: u32, viewport: &Viewport) -> Result<()> {
        let profile = env.start_profile(cmd, NAME);
        cmd.set_pipeline_state(&self.pipeline);
        cmd.set_graphics_root_signature(&self.root_signature);
        self.barriers.record(cmd);

        cmd.set_descriptor_heaps(&[&env.heaps.shader_visible]);
        cmd.set_root_32bit_constants(BindPoint::Graphics, CONSTANT_PARAM, &[num_mesh_types], 0);
        cmd.set_root_descriptor_table(BindPoint::Graphics, TABLE_PARAM, self.table.start());
        cmd.set_render_targets(&[], Some(self.depth_texture_with_mesh_type.dsv()));
        cmd.set_viewport_and_scissor(viewport);
        cmd.draw_fullscreen_triangle();
        env.end_profile(cmd, profile);

        let outputs: [(&dyn GraphicsResource, ResourceState); 3] = [
            (&*self.material_id_texture, self.output_states.material_id_texture_state),
            (&*self.mesh_type_per_material_id, self.output_states.mesh_type_per_material_id_state),
            (&*self.depth_texture_with_mesh_type, self.output_states.depth_texture_with_mesh_type_state),
        ];
        commit_states(outputs);
        Ok(())
    }

    /// Depth texture holding the mesh type of every pixel.
    pub fn depth_texture_with_mesh_type(&self) -> &Rc<Texture> {
        &self.depth_texture_with_mesh_type
    }

    pub fn barriers(&self) -> &BarrierBatch {
        &self.barriers
    }

    pub fn output_resource_states(&self) -> ResourceStates {
        self.output_states
    }
}
