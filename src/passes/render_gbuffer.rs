//! Renders a mesh batch into the G-buffer.
//!
//! The draws come from [`CreateRenderGBufferCommandsPass`](crate::passes::create_render_gbuffer_commands::CreateRenderGBufferCommandsPass),
//! so they are issued with `ExecuteIndirect` and a count buffer. Which vertex attributes and material maps the
//! shaders use is fixed at initialization through [`ShaderFlags`].
//!
//! Render targets: `0` normal, `1` diffuse, `2` specular. Root parameters: `0` instance offset constant,
//! `1` table `[b0 camera transform, t0 instance world matrices, t1 material index per instance]`.

use std::mem::size_of;
use std::rc::Rc;

use anyhow::Result;
use bitflags::bitflags;

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
use crate::pipeline::pipeline_state::{ComparisonFunc, DepthStencilState, GraphicsPipelineDesc, PipelineState};
use crate::pipeline::root_signature::{DescriptorRange, RootSignature, RootSignatureBuilder, ShaderVisibility};
use crate::pipeline::shader::{Shader, ShaderMacro};
use crate::resource::buffer::Buffer;
use crate::resource::GraphicsResource;
use crate::resource::state::ResourceState;
use crate::resource::texture::Texture;

const NAME: &str = "RenderGBufferPass";
const INSTANCE_OFFSET_PARAM: u32 = 0;
const TABLE_PARAM: u32 = 1;

bitflags! {
    /// Shader features, each compiled in through a macro of the same name.
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
    pub struct ShaderFlags: u32 {
        const USE_TEX_COORDS = 1 << 0;
        const USE_DIFFUSE_MAP = 1 << 1;
        const USE_SPECULAR_MAP = 1 << 2;
        const USE_SPECULAR_POWER_MAP = 1 << 3;
    }
}

impl ShaderFlags {
    /// One macro per flag, set to `1` if the flag is present and `0` otherwise.
    pub fn macros(&self) -> Vec<ShaderMacro> {
        Self::all()
            .iter_names()
            .map(|(name, flag)| ShaderMacro::new(name, u32::from(self.contains(flag))))
            .collect()
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ResourceStates {
    pub normal_texture_state: ResourceState,
    pub diffuse_texture_state: ResourceState,
    pub specular_texture_state: ResourceState,
    pub depth_texture_state: ResourceState,
    pub instance_world_matrices_state: ResourceState,
    pub material_ids_state: ResourceState,
    pub draw_commands_state: ResourceState,
    pub num_draws_state: ResourceState,
}

#[derive(Debug)]
pub struct InitParams {
    pub shader_flags: ShaderFlags,
    pub mesh_batch: Rc<MeshBatch>,
    pub camera_transform: Rc<Buffer>,
    pub instance_world_matrices: Rc<Buffer>,
    pub material_ids: Rc<Buffer>,
    pub normal_texture: Rc<Texture>,
    pub diffuse_texture: Rc<Texture>,
    pub specular_texture: Rc<Texture>,
    pub depth_texture: Rc<Texture>,
    pub draw_commands: Rc<Buffer>,
    pub num_draws: Rc<Buffer>,
    pub input_states: ResourceStates,
}

#[derive(Debug)]
pub struct RenderGBufferPass {
    root_signature: RootSignature,
    pipeline: PipelineState,
    command_signature: CommandSignature,
    table: DescriptorTable,
    barriers: BarrierBatch,
    output_states: ResourceStates,
    shader_flags: ShaderFlags,
    mesh_batch: Rc<MeshBatch>,
    instance_world_matrices: Rc<Buffer>,
    material_ids: Rc<Buffer>,
    render_targets: [Rc<Texture>; 3],
    depth_texture: Rc<Texture>,
    draw_commands: Rc<Buffer>,
    num_draws: Rc<Buffer>,
}

impl RenderGBufferPass {
    pub fn init(env: &mut RenderEnv, params: InitParams) -> Result<Self> {
        let output_states = ResourceStates {
            normal_texture_state: ResourceState::RenderTarget,
            diffuse_texture_state: ResourceState::RenderTarget,
            specular_texture_state: ResourceState::RenderTarget,
            depth_texture_state: ResourceState::DepthWrite,
            instance_world_matrices_state: ResourceState::NonPixelShaderResource,
            material_ids_state: ResourceState::NonPixelShaderResource,
            draw_commands_state: ResourceState::IndirectArgument,
            num_draws_state: ResourceState::IndirectArgument,
        };
        let input = params.input_states;
        let mut barriers = BarrierBatch::new();
        barriers.push_if_required(&*params.normal_texture, input.normal_texture_state, output_states.normal_texture_state);
        barriers.push_if_required(&*params.diffuse_texture, input.diffuse_texture_state, output_states.diffuse_texture_state);
        barriers.push_if_required(
            &*params.specular_texture,
            input.specular_texture_state,
            output_states.specular_texture_state,
        );
        barriers.push_if_required(&*params.depth_texture, input.depth_texture_state, output_states.depth_texture_state);
        barriers.push_if_required(
            &*params.instance_world_matrices,
            input.instance_world_matrices_state,
            output_states.instance_world_matrices_state,
        );
        barriers.push_if_required(&*params.material_ids, input.material_ids_state, output_states.material_ids_state);
        barriers.push_if_required(&*params.draw_commands, input.draw_commands_state, output_states.draw_commands_state);
        barriers.push_if_required(&*params.num_draws, input.num_draws_state, output_states.num_draws_state);

        let root_signature = RootSignatureBuilder::new()
            .constants(1, 1, ShaderVisibility::Vertex)
            .table([DescriptorRange::cbv(1, 0), DescriptorRange::srv(2, 0)], ShaderVisibility::Vertex)
            .allow_input_assembler()
            .build(&env.device, NAME)?;
        let table = DescriptorTableBuilder::new(
            &mut env.heaps.shader_visible,
            NAME,
            root_signature.table_ranges(TABLE_PARAM),
        )
        .cbv(params.camera_transform.cbv())
        .srv(params.instance_world_matrices.srv())
        .srv(params.material_ids.srv())
        .build(&env.device)?;

        let macros = params.shader_flags.macros();
        let mut desc = GraphicsPipelineDesc::new(
            Shader::vertex("RenderGBufferVS.hlsl", "Main").with_macros(macros.clone()),
        )
        .pixel_shader(Shader::pixel("RenderGBufferPS.hlsl", "Main").with_macros(macros))
        .render_target(params.normal_texture.target_format())
        .render_target(params.diffuse_texture.target_format())
        .render_target(params.specular_texture.target_format())
        .depth_stencil(params.depth_texture.target_format(), DepthStencilState::enabled(ComparisonFunc::Less, true));
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

        info!("Initialized {} for `{}` with {:?}", NAME, params.mesh_batch.name(), params.shader_flags);
        Ok(Self {
            root_signature,
            pipeline,
            command_signature,
            table,
            barriers,
            output_states,
            shader_flags: params.shader_flags,
            mesh_batch: params.mesh_batch,
            instance_world_matrices: params.instance_world_matrices,
            material_ids: params.material_ids,
            render_targets: [params.normal_texture, params.diffuse_texture, params.specular_texture],
            depth_texture: params.depth_texture,
            draw_commands: params.draw_commands,
            num_draws: params.num_draws,
        })
    }

    /// Clears the G-buffer, then draws every mesh whose command was generated this frame.
    pub fn record(&self, env: &mut RenderEnv, cmd: &mut CommandList, viewport: &Viewport) -> Result<()> {
        let profile = env.start_profile(cmd, NAME);
        cmd.set_pipeline_state(&self.pipeline);
        cmd.set_graphics_root_signature(&self.root_signature);
        self.barriers.record(cmd);

        cmd.set_descriptor_heaps(&[&env.heaps.shader_visible]);
        cmd.set_root_descriptor_table(BindPoint::Graphics, TABLE_PARAM, self.table.start());

        let render_target_views: Vec<_> = self.render_targets.iter().map(|target| target.rtv()).collect();
        for view in &render_target_views {
            cmd.clear_render_target_view(*view, [0.0; 4]);
        }
        cmd.clear_depth_stencil_view(self.depth_texture.dsv(), 1.0);
        cmd.set_render_targets(&render_target_views, Some(self.depth_texture.dsv()));
        cmd.set_viewport_and_scissor(viewport);

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

        let [normal, diffuse, specular] = &self.render_targets;
        let outputs: [(&dyn GraphicsResource, ResourceState); 8] = [
            (&**normal, self.output_states.normal_texture_state),
            (&**diffuse, self.output_states.diffuse_texture_state),
            (&**specular, self.output_states.specular_texture_state),
            (&*self.depth_texture, self.output_states.depth_texture_state),
            (&*self.instance_world_matrices, self.output_states.instance_world_matrices_state),
            (&*self.material_ids, self.output_states.material_ids_state),
            (&*self.draw_commands, self.output_states.draw_commands_state),
            (&*self.num_draws, self.output_states.num_draws_state),
        ];
        commit_states(outputs);
        Ok(())
    }

    pub fn shader_flags(&self) -> ShaderFlags {
        self.shader_flags
    }

    pub fn barriers(&self) -> &BarrierBatch {
        &self.barriers
    }

    pub fn output_resource_states(&self) -> ResourceStates {
        self.output_states
    }
}
