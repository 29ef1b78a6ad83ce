//! Draws the meshes of one material into the G-buffer, one indexed draw per mesh.
//!
//! The root signature depends on which maps the material has. Parameters are added in this order, skipping the
//! ones the material does not need:
//!
//! * object transform CBV (`b0`, vertex shader)
//! * material CBV (`b1`, pixel shader)
//! * sampler table (`s0`), if the material has any map
//! * diffuse map table (`t0`)
//! * normal map table (`t1`)
//! * specular map table (`t2`)
//!
//! Render targets: `0` normal, `1` diffuse, `2` specular.

use std::rc::Rc;

use anyhow::Result;
use bitflags::bitflags;
use bytemuck::{Pod, Zeroable};
use static_assertions::const_assert_eq;

use crate::command_buffer::CommandList;
use crate::command_buffer::command::BindPoint;
use crate::command_buffer::viewport::Viewport;
use crate::core::render_env::RenderEnv;
use crate::descriptor::sampler::{AddressMode, Filter, Sampler, SamplerDesc};
use crate::descriptor::table::{DescriptorTable, DescriptorTableBuilder};
use crate::graph::barrier::BarrierBatch;
use crate::graph::tracker::commit_states;
use crate::passes::mesh_batch::MeshBatch;
use crate::pipeline::pipeline_state::{ComparisonFunc, DepthStencilState, GraphicsPipelineDesc, PipelineState};
use crate::pipeline::root_signature::{DescriptorRange, RootSignature, RootSignatureBuilder, ShaderVisibility};
use crate::pipeline::shader::{Shader, ShaderMacro};
use crate::resource::buffer::{Buffer, BufferDesc};
use crate::resource::GraphicsResource;
use crate::resource::state::ResourceState;
use crate::resource::texture::Texture;

bitflags! {
    /// Vertex attributes and maps a material uses. Each flag is also passed to the shaders as a macro.
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
    pub struct MaterialFlags: u32 {
        const USE_TEX_COORDS = 1 << 0;
        const USE_DIFFUSE_MAP = 1 << 1;
        const USE_NORMAL_MAP = 1 << 2;
        const USE_SPECULAR_MAP = 1 << 3;
    }
}

impl MaterialFlags {
    fn uses_maps(&self) -> bool {
        self.intersects(Self::USE_DIFFUSE_MAP | Self::USE_NORMAL_MAP | Self::USE_SPECULAR_MAP)
    }

    fn macros(&self) -> Vec<ShaderMacro> {
        Self::all()
            .iter_names()
            .map(|(name, flag)| ShaderMacro::new(name, u32::from(self.contains(flag))))
            .collect()
    }
}

/// Constant buffer contents of a material, padded to the 256 byte constant buffer alignment.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct MaterialBufferData {
    pub ambient_color: [f32; 4],
    pub diffuse_color: [f32; 4],
    pub specular_color: [f32; 4],
    pub emissive_color: [f32; 4],
    pub specular_power: f32,
    _padding: [f32; 3],
    _reserved: [[f32; 4]; 11],
}

const_assert_eq!(std::mem::size_of::<MaterialBufferData>(), 256);

impl MaterialBufferData {
    pub fn new(diffuse_color: [f32; 4], specular_color: [f32; 4], specular_power: f32) -> Self {
        Self {
            diffuse_color,
            specular_color,
            specular_power,
            ..Self::zeroed()
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ResourceStates {
    pub normal_texture_state: ResourceState,
    pub diffuse_texture_state: ResourceState,
    pub specular_texture_state: ResourceState,
    pub depth_texture_state: ResourceState,
    /// State of every map of the material.
    pub material_maps_state: ResourceState,
}

/// Textures sampled by a material. Each must be present exactly when its flag is set.
#[derive(Debug, Default)]
pub struct MaterialMaps {
    pub diffuse: Option<Rc<Texture>>,
    pub normal: Option<Rc<Texture>>,
    pub specular: Option<Rc<Texture>>,
}

#[derive(Debug)]
pub struct InitParams {
    pub name: String,
    pub flags: MaterialFlags,
    pub material: MaterialBufferData,
    pub maps: MaterialMaps,
    pub mesh_batch: Rc<MeshBatch>,
    pub object_transform: Rc<Buffer>,
    pub normal_texture: Rc<Texture>,
    pub diffuse_texture: Rc<Texture>,
    pub specular_texture: Rc<Texture>,
    pub depth_texture: Rc<Texture>,
    pub input_states: ResourceStates,
}

/// Root parameter indices, assigned while building the root signature.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct RootParameters {
    pub transform_cbv: u32,
    pub material_cbv: u32,
    pub sampler_table: Option<u32>,
    pub diffuse_map_table: Option<u32>,
    pub normal_map_table: Option<u32>,
    pub specular_map_table: Option<u32>,
}

#[derive(Debug)]
pub struct FillGBufferPass {
    name: String,
    root_signature: RootSignature,
    root_parameters: RootParameters,
    pipeline: PipelineState,
    sampler: Option<Sampler>,
    map_tables: Vec<(u32, DescriptorTable)>,
    material_buffer: Buffer,
    object_transform: Rc<Buffer>,
    barriers: BarrierBatch,
    output_states: ResourceStates,
    mesh_batch: Rc<MeshBatch>,
    maps: Vec<Rc<Texture>>,
    render_targets: [Rc<Texture>; 3],
    depth_texture: Rc<Texture>,
}

impl FillGBufferPass {
    pub fn init(env: &mut RenderEnv, params: InitParams) -> Result<Self> {
        let flags = params.flags;
        let map_slots = [
            (MaterialFlags::USE_DIFFUSE_MAP, &params.maps.diffuse, "diffuse"),
            (MaterialFlags::USE_NORMAL_MAP, &params.maps.normal, "normal"),
            (MaterialFlags::USE_SPECULAR_MAP, &params.maps.specular, "specular"),
        ];
        for (flag, map, kind) in &map_slots {
            assert_eq!(
                flags.contains(*flag),
                map.is_some(),
                "{}: {} map must be given exactly when {:?} is set.",
                params.name,
                kind,
                flag
            );
        }
        assert!(
            !flags.uses_maps() || flags.contains(MaterialFlags::USE_TEX_COORDS),
            "{}: material maps need texture coordinates.",
            params.name
        );

        let output_states = ResourceStates {
            normal_texture_state: ResourceState::RenderTarget,
            diffuse_texture_state: ResourceState::RenderTarget,
            specular_texture_state: ResourceState::RenderTarget,
            depth_texture_state: ResourceState::DepthWrite,
            material_maps_state: ResourceState::PixelShaderResource,
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
        let maps: Vec<Rc<Texture>> = map_slots.iter().filter_map(|(_, map, _)| (*map).clone()).collect();
        for map in &maps {
            barriers.push_if_required(&**map, input.material_maps_state, output_states.material_maps_state);
        }

        let mut root_parameters = RootParameters::default();
        let mut builder = RootSignatureBuilder::new().allow_input_assembler();
        root_parameters.transform_cbv = builder.num_parameters();
        builder = builder.cbv(0, ShaderVisibility::Vertex);
        root_parameters.material_cbv = builder.num_parameters();
        builder = builder.cbv(1, ShaderVisibility::Pixel);
        if flags.uses_maps() {
            root_parameters.sampler_table = Some(builder.num_parameters());
            builder = builder.table([DescriptorRange::sampler(1, 0)], ShaderVisibility::Pixel);
        }
        let mut map_parameters = Vec::new();
        for (register, (_, map, _)) in map_slots.iter().enumerate() {
            if let Some(map) = map {
                let index = builder.num_parameters();
                builder = builder.table([DescriptorRange::srv(1, register as u32)], ShaderVisibility::Pixel);
                let slot = match register {
                    0 => &mut root_parameters.diffuse_map_table,
                    1 => &mut root_parameters.normal_map_table,
                    _ => &mut root_parameters.specular_map_table,
                };
                *slot = Some(index);
                map_parameters.push((index, map.clone()));
            }
        }
        let root_signature = builder.build(&env.device, &params.name)?;

        let map_tables = map_parameters
            .into_iter()
            .map(|(index, map)| {
                let table = DescriptorTableBuilder::new(
                    &mut env.heaps.shader_visible,
                    &params.name,
                    root_signature.table_ranges(index),
                )
                .srv(map.srv())
                .build(&env.device)?;
                Ok((index, table))
            })
            .collect::<Result<Vec<_>>>()?;
        let sampler = if flags.uses_maps() {
            let desc = SamplerDesc {
                filter: Filter::Anisotropic,
                address_mode: AddressMode::Wrap,
            };
            Some(Sampler::new(&env.device, &mut env.heaps.sampler, &params.name, desc)?)
        } else {
            None
        };

        let material_buffer = Buffer::new(
            &env.device,
            &mut env.heaps,
            BufferDesc::constant(format!("{} material", params.name), std::mem::size_of::<MaterialBufferData>() as u64),
        )?;
        material_buffer.write(0, bytemuck::bytes_of(&params.material))?;

        let macros = flags.macros();
        let mut desc = GraphicsPipelineDesc::new(Shader::vertex("FillGBufferVS.hlsl", "Main").with_macros(macros.clone()))
            .pixel_shader(Shader::pixel("FillGBufferPS.hlsl", "Main").with_macros(macros))
            .render_target(params.normal_texture.target_format())
            .render_target(params.diffuse_texture.target_format())
            .render_target(params.specular_texture.target_format())
            .depth_stencil(params.depth_texture.target_format(), DepthStencilState::enabled(ComparisonFunc::Less, true));
        for element in params.mesh_batch.input_layout() {
            desc = desc.input_element(element.clone());
        }
        let pipeline = PipelineState::graphics(&env.device, &params.name, &root_signature, desc)?;

        info!(
            "Initialized `{}` with {:?} ({} root parameters)",
            params.name,
            flags,
            root_signature.desc().parameters.len()
        );
        Ok(Self {
            name: params.name,
            root_signature,
            root_parameters,
            pipeline,
            sampler,
            map_tables,
            material_buffer,
            object_transform: params.object_transform,
            barriers,
            output_states,
            mesh_batch: params.mesh_batch,
            maps,
            render_targets: [params.normal_texture, params.diffuse_texture, params.specular_texture],
            depth_texture: params.depth_texture,
        })
    }

    pub fn record(&self, env: &mut RenderEnv, cmd: &mut CommandList, viewport: &Viewport) -> Result<()> {
        let profile = env.start_profile(cmd, &self.name);
        cmd.set_pipeline_state(&self.pipeline);
        cmd.set_graphics_root_signature(&self.root_signature);
        self.barriers.record(cmd);

        cmd.set_descriptor_heaps(&[&env.heaps.shader_visible, &env.heaps.sampler]);
        cmd.set_root_constant_buffer_view(BindPoint::Graphics, self.root_parameters.transform_cbv, &self.object_transform);
        cmd.set_root_constant_buffer_view(BindPoint::Graphics, self.root_parameters.material_cbv, &self.material_buffer);
        if let (Some(index), Some(sampler)) = (self.root_parameters.sampler_table, &self.sampler) {
            cmd.set_root_descriptor_table(BindPoint::Graphics, index, sampler.handle());
        }
        for (index, table) in &self.map_tables {
            cmd.set_root_descriptor_table(BindPoint::Graphics, *index, table.start());
        }

        let render_target_views: Vec<_> = self.render_targets.iter().map(|target| target.rtv()).collect();
        cmd.set_render_targets(&render_target_views, Some(self.depth_texture.dsv()));
        cmd.set_viewport_and_scissor(viewport);
        self.mesh_batch.bind(cmd);
        for mesh in self.mesh_batch.meshes() {
            cmd.draw_indexed_instanced(mesh.index_count, mesh.num_instances().max(1), mesh.start_index, mesh.base_vertex, 0);
        }
        env.end_profile(cmd, profile);

        let [normal, diffuse, specular] = &self.render_targets;
        let targets: [(&dyn GraphicsResource, ResourceState); 4] = [
            (&**normal, self.output_states.normal_texture_state),
            (&**diffuse, self.output_states.diffuse_texture_state),
            (&**specular, self.output_states.specular_texture_state),
            (&*self.depth_texture, self.output_states.depth_texture_state),
        ];
        let maps = self
            .maps
            .iter()
            .map(|map| (&**map as &dyn GraphicsResource, self.output_states.material_maps_state));
        let outputs = targets.into_iter().chain(maps);
        commit_states(outputs);
        Ok(())
    }

    /// Indices of the root parameters the material needed.
    pub fn root_parameters(&self) -> RootParameters {
        self.root_parameters
    }

    pub fn root_signature(&self) -> &RootSignature {
        &self.root_signature
    }

    pub fn material_buffer(&self) -> &Buffer {
        &self.material_buffer
    }

    pub fn barriers(&self) -> &BarrierBatch {
        &self.barriers
    }

    pub fn output_resource_states(&self) -> ResourceStates {
        self.output_states
    }
}
