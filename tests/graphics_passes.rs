use std::rc::Rc;

use anyhow::Result;
use glam::Vec3;

use deimos::command_buffer::command::Command;
use deimos::passes::fill_gbuffer::{MaterialBufferData, MaterialFlags, MaterialMaps};
use deimos::passes::render_gbuffer::ShaderFlags;
use deimos::passes::visualize_texture::TextureType;
use deimos::pipeline::pipeline_state::{InputElement, PipelineDesc};
use deimos::prelude::*;

mod framework;

/// The graphics description of the most recently created pipeline called `name`.
fn graphics_pipeline(context: &framework::Context, name: &str) -> Result<GraphicsPipelineDesc> {
    let pipelines = context.backend.pipelines()?;
    let record = pipelines
        .into_iter()
        .rev()
        .find(|pipeline| pipeline.name == name)
        .expect("Pipeline should have been created.");
    match record.desc {
        PipelineDesc::Graphics(desc) => Ok(desc),
        PipelineDesc::Compute(_) => panic!("`{name}` should be a graphics pipeline."),
    }
}

struct GBuffer {
    normal: Rc<Texture>,
    diffuse: Rc<Texture>,
    specular: Rc<Texture>,
    depth: Rc<Texture>,
}

fn gbuffer(env: &mut RenderEnv, target_state: ResourceState) -> Result<GBuffer> {
    Ok(GBuffer {
        normal: framework::texture(
            env,
            TextureDesc::render_target("normals", 64, 64, Format::R10G10B10A2Unorm).initial_state(target_state),
        )?,
        diffuse: framework::texture(
            env,
            TextureDesc::render_target("diffuse", 64, 64, Format::R8G8B8A8Unorm).initial_state(target_state),
        )?,
        specular: framework::texture(
            env,
            TextureDesc::render_target("specular", 64, 64, Format::R8G8B8A8Unorm).initial_state(target_state),
        )?,
        depth: framework::texture(env, TextureDesc::depth("depth", 64, 64, Format::R32Typeless))?,
    })
}

fn mesh_batch(env: &mut RenderEnv) -> Result<Rc<MeshBatch>> {
    let bounds = Aabb::new(Vec3::splat(-1.0), Vec3::splat(1.0));
    let meshes = vec![
        Mesh::new(36, 0, 0).instance(bounds),
        Mesh::new(12, 36, 8).instance(bounds).instance(bounds),
    ];
    let layout = vec![
        InputElement::new("POSITION", Format::R32G32B32Float, 0),
        InputElement::new("TEXCOORD", Format::R16G16Float, 12),
    ];
    Ok(Rc::new(MeshBatch::new(env, "scene", 16, 16, 48, layout, meshes)?))
}

#[test]
pub fn visualize_voxel_grid() -> Result<()> {
    let mut context = framework::make_context().expect("Can initialize context.");
    let env = &mut context.env;
    let grid_config = framework::buffer(env, BufferDesc::constant("grid config", 256))?;
    let camera_transform = framework::buffer(env, BufferDesc::constant("camera transform", 256))?;
    let depth = framework::texture(env, TextureDesc::depth("depth", 64, 64, Format::R32Typeless))?;
    let grid = framework::buffer(
        env,
        BufferDesc::structured("grid", 512, 16).initial_state(ResourceState::UnorderedAccess),
    )?;
    let render_target = framework::texture(env, TextureDesc::render_target("back buffer", 64, 64, Format::R8G8B8A8Unorm))?;
    let pass = VisualizeVoxelGridPass::init(
        env,
        visualize_voxel_grid::InitParams {
            grid_config,
            camera_transform,
            depth: depth.clone(),
            grid: grid.clone(),
            render_target: render_target.clone(),
            input_states: visualize_voxel_grid::ResourceStates {
                render_target_state: ResourceState::RenderTarget,
                depth_state: ResourceState::DepthWrite,
                grid_state: ResourceState::UnorderedAccess,
            },
        },
    )?;
    assert_eq!(pass.barriers().len(), 2, "The render target already is in its write state.");

    env.execute_pass("visualize voxel grid", |env, cmd| pass.record(env, cmd))?;
    let submission = framework::last_submission(&context)?;
    assert_eq!(
        framework::count_commands(&submission, |command| *command
            == Command::DrawInstanced {
                vertex_count: 3,
                instance_count: 1,
                start_vertex: 0,
                start_instance: 0
            }),
        1,
        "The grid should be drawn with a single fullscreen triangle."
    );
    assert_eq!(
        framework::count_commands(&submission, |command| *command
            == Command::SetRenderTargets {
                render_targets: vec![render_target.rtv()],
                depth_stencil: None
            }),
        1
    );
    assert_eq!(depth.state(), ResourceState::PixelShaderResource);
    assert_eq!(grid.state(), ResourceState::PixelShaderResource);
    assert_eq!(pass.output_resource_states().render_target_state, ResourceState::RenderTarget);
    Ok(())
}

#[test]
pub fn visualize_texture() -> Result<()> {
    let mut context = framework::make_context().expect("Can initialize context.");
    let env = &mut context.env;
    let texture = framework::texture(env, TextureDesc::render_target("ambient occlusion", 64, 64, Format::R16Float))?;
    let render_target = framework::texture(
        env,
        TextureDesc::render_target("back buffer", 64, 64, Format::R8G8B8A8Unorm).initial_state(ResourceState::Present),
    )?;
    let app_data = Buffer::new(&env.device, &mut env.heaps, BufferDesc::constant("app data", 256))?;
    let pass = VisualizeTexturePass::init(
        env,
        visualize_texture::InitParams {
            name: "show ambient occlusion".to_owned(),
            texture: texture.clone(),
            render_target: render_target.clone(),
            texture_type: TextureType::R,
            input_states: visualize_texture::ResourceStates {
                texture_state: ResourceState::RenderTarget,
                render_target_state: ResourceState::Present,
            },
        },
    )?;
    assert_eq!(pass.barriers().len(), 2);

    let viewport = Viewport::new(64, 64);
    env.execute_pass("visualize texture", |env, cmd| pass.record(env, cmd, &app_data, &viewport))?;
    let desc = graphics_pipeline(&context, "show ambient occlusion")?;
    assert_eq!(
        desc.pixel_shader.as_ref().and_then(|shader| shader.macro_value("TEXTURE_TYPE")),
        Some("4"),
        "Single channel textures should be shown as grayscale."
    );
    assert_eq!(desc.render_target_formats, vec![Format::R8G8B8A8Unorm]);

    let submission = framework::last_submission(&context)?;
    assert_eq!(
        framework::count_commands(&submission, |command| matches!(
            command,
            Command::SetRootConstantBufferView { index: 0, buffer, .. } if *buffer == app_data.id()
        )),
        1
    );
    assert_eq!(texture.state(), ResourceState::PixelShaderResource);
    assert_eq!(render_target.state(), ResourceState::RenderTarget);
    Ok(())
}

#[test]
pub fn fill_depth_buffer_with_mesh_type() -> Result<()> {
    let mut context = framework::make_context().expect("Can initialize context.");
    let env = &mut context.env;
    let material_ids = framework::texture(env, TextureDesc::render_target("material ids", 64, 32, Format::R16Unorm))?;
    let mesh_types = framework::buffer(
        env,
        BufferDesc::formatted("mesh type per material", 8, Format::R32Uint)
            .initial_state(ResourceState::NonPixelShaderResource),
    )?;
    let pass = FillDepthBufferWithMeshTypePass::init(
        env,
        fill_depth_with_mesh_type::InitParams {
            material_id_texture: material_ids.clone(),
            mesh_type_per_material_id: mesh_types.clone(),
            input_states: fill_depth_with_mesh_type::ResourceStates {
                material_id_texture_state: ResourceState::RenderTarget,
                mesh_type_per_material_id_state: ResourceState::NonPixelShaderResource,
                depth_texture_with_mesh_type_state: ResourceState::DepthWrite,
            },
        },
    )?;
    let depth = pass.depth_texture_with_mesh_type().clone();
    assert_eq!((depth.width(), depth.height()), (64, 32), "Depth should match the material id texture.");
    assert_eq!(depth.target_format(), Format::D16Unorm);
    assert_eq!(pass.barriers().len(), 2, "The owned depth texture is created in its write state.");

    let viewport = Viewport::new(64, 32);
    env.execute_pass("fill depth", |env, cmd| pass.record(env, cmd, 3, &viewport))?;
    let submission = framework::last_submission(&context)?;
    assert_eq!(
        framework::count_commands(&submission, |command| *command
            == Command::SetRootConstants {
                bind_point: BindPoint::Graphics,
                index: 0,
                dest_offset: 0,
                values: vec![3]
            }),
        1,
        "The number of mesh types should be passed as a root constant."
    );
    assert_eq!(
        framework::count_commands(&submission, |command| *command
            == Command::SetRenderTargets {
                render_targets: vec![],
                depth_stencil: Some(depth.dsv())
            }),
        1
    );
    assert_eq!(material_ids.state(), ResourceState::PixelShaderResource);
    assert_eq!(mesh_types.state(), ResourceState::PixelShaderResource);
    assert_eq!(depth.state(), ResourceState::DepthWrite);
    Ok(())
}

#[test]
pub fn render_gbuffer() -> Result<()> {
    let mut context = framework::make_context().expect("Can initialize context.");
    let env = &mut context.env;
    let targets = gbuffer(env, ResourceState::PixelShaderResource)?;
    let batch = mesh_batch(env)?;
    let camera_transform = framework::buffer(env, BufferDesc::constant("camera transform", 256))?;
    let instance_world_matrices = framework::buffer(
        env,
        BufferDesc::structured("instance world matrices", 3, 64).initial_state(ResourceState::NonPixelShaderResource),
    )?;
    let material_ids = framework::buffer(
        env,
        BufferDesc::formatted("material ids", 3, Format::R32Uint).initial_state(ResourceState::NonPixelShaderResource),
    )?;
    let draw_commands = framework::buffer(
        env,
        BufferDesc::structured("draw commands", 2, 24).initial_state(ResourceState::UnorderedAccess),
    )?;
    let num_draws = framework::buffer(
        env,
        BufferDesc::formatted("num draws", 1, Format::R32Uint).initial_state(ResourceState::UnorderedAccess),
    )?;
    let pass = RenderGBufferPass::init(
        env,
        render_gbuffer::InitParams {
            shader_flags: ShaderFlags::USE_TEX_COORDS,
            mesh_batch: batch.clone(),
            camera_transform,
            instance_world_matrices,
            material_ids,
            normal_texture: targets.normal.clone(),
            diffuse_texture: targets.diffuse.clone(),
            specular_texture: targets.specular.clone(),
            depth_texture: targets.depth.clone(),
            draw_commands: draw_commands.clone(),
            num_draws: num_draws.clone(),
            input_states: render_gbuffer::ResourceStates {
                normal_texture_state: ResourceState::PixelShaderResource,
                diffuse_texture_state: ResourceState::PixelShaderResource,
                specular_texture_state: ResourceState::PixelShaderResource,
                depth_texture_state: ResourceState::DepthWrite,
                instance_world_matrices_state: ResourceState::NonPixelShaderResource,
                material_ids_state: ResourceState::NonPixelShaderResource,
                draw_commands_state: ResourceState::UnorderedAccess,
                num_draws_state: ResourceState::UnorderedAccess,
            },
        },
    )?;
    assert_eq!(pass.barriers().len(), 5, "Three render targets and both indirect buffers need transitions.");
    assert_eq!(pass.shader_flags(), ShaderFlags::USE_TEX_COORDS);

    let desc = graphics_pipeline(&context, "RenderGBufferPass")?;
    assert_eq!(desc.vertex_shader.macro_value("USE_TEX_COORDS"), Some("1"));
    assert_eq!(desc.vertex_shader.macro_value("USE_DIFFUSE_MAP"), Some("0"));
    assert_eq!(desc.input_layout.len(), 2, "The input layout should come from the mesh batch.");
    assert_eq!(desc.render_target_formats.len(), 3);
    assert_eq!(desc.depth_stencil_format, Some(Format::D32Float));

    let viewport = Viewport::new(64, 64);
    context.env.execute_pass("render gbuffer", |env, cmd| pass.record(env, cmd, &viewport))?;
    let submission = framework::last_submission(&context)?;
    assert_eq!(
        framework::count_commands(&submission, |command| matches!(command, Command::ClearRenderTargetView { .. })),
        3
    );
    assert_eq!(
        framework::count_commands(&submission, |command| matches!(command, Command::ClearDepthStencilView { .. })),
        1
    );
    assert_eq!(
        framework::count_commands(&submission, |command| matches!(
            command,
            Command::ExecuteIndirect { max_commands: 2, count: Some(count), .. } if *count == num_draws.id()
        )),
        1,
        "Draws should be read from the generated commands, bounded by the number of meshes."
    );
    assert_eq!(targets.normal.state(), ResourceState::RenderTarget);
    assert_eq!(draw_commands.state(), ResourceState::IndirectArgument);
    assert_eq!(batch.num_instances(), 3);
    Ok(())
}

#[test]
pub fn create_voxel_grid() -> Result<()> {
    let mut context = framework::make_context().expect("Can initialize context.");
    let env = &mut context.env;
    let batch = mesh_batch(env)?;
    let object_transform = framework::buffer(env, BufferDesc::constant("object transform", 256))?;
    let camera_transform = framework::buffer(env, BufferDesc::constant("camera transform", 256))?;
    let grid_config = framework::buffer(env, BufferDesc::constant("grid config", 256))?;
    let grid = framework::buffer(
        env,
        BufferDesc::structured("grid", 512, 16).initial_state(ResourceState::NonPixelShaderResource),
    )?;
    let draw_commands = framework::buffer(
        env,
        BufferDesc::structured("draw commands", 2, 24).initial_state(ResourceState::UnorderedAccess),
    )?;
    let num_draws = framework::buffer(
        env,
        BufferDesc::formatted("num draws", 1, Format::R32Uint).initial_state(ResourceState::IndirectArgument),
    )?;
    let pass = CreateVoxelGridPass::init(
        env,
        create_voxel_grid::InitParams {
            object_transform,
            camera_transform,
            grid_config,
            grid: grid.clone(),
            mesh_batch: batch,
            draw_commands: draw_commands.clone(),
            num_draws,
            input_states: create_voxel_grid::ResourceStates {
                grid_state: ResourceState::NonPixelShaderResource,
                draw_commands_state: ResourceState::UnorderedAccess,
                num_draws_state: ResourceState::IndirectArgument,
            },
        },
    )?;
    assert_eq!(pass.barriers().len(), 2);

    let viewport = Viewport::new(8, 8);
    env.execute_pass("create voxel grid", |env, cmd| pass.record(env, cmd, &viewport))?;
    let submission = framework::last_submission(&context)?;
    assert_eq!(
        framework::count_commands(&submission, |command| *command
            == Command::SetRenderTargets {
                render_targets: vec![],
                depth_stencil: None
            }),
        1,
        "Voxelization writes through a UAV only."
    );
    assert_eq!(
        framework::count_commands(&submission, |command| matches!(command, Command::ExecuteIndirect { .. })),
        1
    );
    let batches = framework::barrier_batches(&submission);
    assert_eq!(batches.len(), 1);
    assert_eq!(
        framework::transitions_of(&batches[0], &*grid),
        vec![(ResourceState::NonPixelShaderResource, ResourceState::UnorderedAccess)]
    );
    assert_eq!(grid.state(), ResourceState::UnorderedAccess);
    assert_eq!(draw_commands.state(), ResourceState::IndirectArgument);
    Ok(())
}

#[test]
pub fn copy_texture_with_end_states() -> Result<()> {
    let mut context = framework::make_context().expect("Can initialize context.");
    let env = &mut context.env;
    let src = framework::texture(env, TextureDesc::render_target("hdr", 64, 64, Format::R16G16B16A16Float))?;
    let dest = framework::texture(
        env,
        TextureDesc::render_target("ldr", 64, 64, Format::R8G8B8A8Unorm)
            .initial_state(ResourceState::PixelShaderResource),
    )?;
    let pass = CopyTexturePass::init(
        env,
        copy_texture::InitParams {
            name: "tone map copy".to_owned(),
            src_texture: src.clone(),
            dest_texture: dest.clone(),
            input_states: copy_texture::ResourceStates {
                src_texture_state: ResourceState::RenderTarget,
                dest_texture_state: ResourceState::PixelShaderResource,
            },
            end_states: Some(copy_texture::ResourceStates {
                src_texture_state: ResourceState::RenderTarget,
                dest_texture_state: ResourceState::PixelShaderResource,
            }),
        },
    )?;
    assert_eq!(pass.barriers().len(), 2);
    assert_eq!(pass.end_barriers().len(), 2, "Both textures should be moved back after the copy.");

    env.execute_pass("copy", |env, cmd| pass.record(env, cmd))?;
    let submission = framework::last_submission(&context)?;
    let batches = framework::barrier_batches(&submission);
    assert_eq!(batches.len(), 2);
    assert_eq!(
        framework::transitions_of(&batches[1], &*dest),
        vec![(ResourceState::RenderTarget, ResourceState::PixelShaderResource)]
    );
    assert_eq!(src.state(), ResourceState::RenderTarget);
    assert_eq!(dest.state(), ResourceState::PixelShaderResource);
    Ok(())
}

#[test]
pub fn copy_texture_without_end_states() -> Result<()> {
    let mut context = framework::make_context().expect("Can initialize context.");
    let env = &mut context.env;
    let src = framework::texture(
        env,
        TextureDesc::sampled("source", 32, 32, Format::R16G16B16A16Float),
    )?;
    let dest = framework::texture(env, TextureDesc::render_target("destination", 32, 32, Format::R8G8B8A8Unorm))?;
    let pass = CopyTexturePass::init(
        env,
        copy_texture::InitParams {
            name: "copy".to_owned(),
            src_texture: src.clone(),
            dest_texture: dest.clone(),
            input_states: copy_texture::ResourceStates {
                src_texture_state: ResourceState::PixelShaderResource,
                dest_texture_state: ResourceState::RenderTarget,
            },
            end_states: None,
        },
    )?;
    assert!(pass.barriers().is_empty());
    assert!(pass.end_barriers().is_empty());
    assert_eq!(pass.output_resource_states().dest_texture_state, ResourceState::RenderTarget);

    env.execute_pass("copy", |env, cmd| pass.record(env, cmd))?;
    let submission = framework::last_submission(&context)?;
    assert!(framework::barrier_batches(&submission).is_empty(), "Nothing to transition, nothing recorded.");
    Ok(())
}

#[test]
pub fn fill_gbuffer_with_diffuse_map() -> Result<()> {
    let mut context = framework::make_context().expect("Can initialize context.");
    let env = &mut context.env;
    let targets = gbuffer(env, ResourceState::RenderTarget)?;
    let batch = mesh_batch(env)?;
    let object_transform = framework::buffer(env, BufferDesc::constant("object transform", 256))?;
    let diffuse_map = framework::texture(env, TextureDesc::sampled("bricks", 256, 256, Format::R8G8B8A8Unorm))?;
    let material = MaterialBufferData::new([0.5, 0.25, 0.125, 1.0], [1.0; 4], 16.0);
    let pass = FillGBufferPass::init(
        env,
        fill_gbuffer::InitParams {
            name: "bricks".to_owned(),
            flags: MaterialFlags::USE_TEX_COORDS | MaterialFlags::USE_DIFFUSE_MAP,
            material,
            maps: MaterialMaps {
                diffuse: Some(diffuse_map.clone()),
                ..Default::default()
            },
            mesh_batch: batch,
            object_transform,
            normal_texture: targets.normal.clone(),
            diffuse_texture: targets.diffuse.clone(),
            specular_texture: targets.specular.clone(),
            depth_texture: targets.depth.clone(),
            input_states: fill_gbuffer::ResourceStates {
                normal_texture_state: ResourceState::RenderTarget,
                diffuse_texture_state: ResourceState::RenderTarget,
                specular_texture_state: ResourceState::RenderTarget,
                depth_texture_state: ResourceState::DepthWrite,
                material_maps_state: ResourceState::PixelShaderResource,
            },
        },
    )?;
    let parameters = pass.root_parameters();
    assert_eq!((parameters.transform_cbv, parameters.material_cbv), (0, 1));
    assert_eq!(parameters.sampler_table, Some(2), "Materials with maps need a sampler table.");
    assert_eq!(parameters.diffuse_map_table, Some(3));
    assert_eq!(parameters.normal_map_table, None);
    assert_eq!(pass.root_signature().desc().parameters.len(), 4);
    assert!(pass.barriers().is_empty(), "Everything already arrives in the state it is used in.");
    assert_eq!(
        context.backend.buffer_data(pass.material_buffer().id())?,
        bytemuck::bytes_of(&material).to_vec(),
        "Material constants should be uploaded at init."
    );

    let viewport = Viewport::new(64, 64);
    context.env.execute_pass("fill gbuffer", |env, cmd| pass.record(env, cmd, &viewport))?;
    let submission = framework::last_submission(&context)?;
    let draws: Vec<_> = submission
        .commands
        .iter()
        .filter_map(|command| match command {
            Command::DrawIndexedInstanced {
                index_count,
                instance_count,
                ..
            } => Some((*index_count, *instance_count)),
            _ => None,
        })
        .collect();
    assert_eq!(draws, vec![(36, 1), (12, 2)], "One draw per mesh with all of its instances.");
    assert_eq!(
        framework::count_commands(&submission, |command| matches!(command, Command::SetDescriptorHeaps(heaps) if heaps.len() == 2)),
        1,
        "The sampler heap should be bound next to the shader visible heap."
    );
    assert_eq!(diffuse_map.state(), ResourceState::PixelShaderResource);
    Ok(())
}

#[test]
#[should_panic]
pub fn fill_gbuffer_flag_without_map() {
    let mut context = framework::make_context().expect("Can initialize context.");
    let env = &mut context.env;
    let targets = gbuffer(env, ResourceState::RenderTarget).unwrap();
    let batch = mesh_batch(env).unwrap();
    let object_transform = framework::buffer(env, BufferDesc::constant("object transform", 256)).unwrap();
    let _ = FillGBufferPass::init(
        env,
        fill_gbuffer::InitParams {
            name: "missing map".to_owned(),
            flags: MaterialFlags::USE_TEX_COORDS | MaterialFlags::USE_SPECULAR_MAP,
            material: MaterialBufferData::new([1.0; 4], [1.0; 4], 1.0),
            maps: MaterialMaps::default(),
            mesh_batch: batch,
            object_transform,
            normal_texture: targets.normal,
            diffuse_texture: targets.diffuse,
            specular_texture: targets.specular,
            depth_texture: targets.depth,
            input_states: fill_gbuffer::ResourceStates {
                normal_texture_state: ResourceState::RenderTarget,
                diffuse_texture_state: ResourceState::RenderTarget,
                specular_texture_state: ResourceState::RenderTarget,
                depth_texture_state: ResourceState::DepthWrite,
                material_maps_state: ResourceState::PixelShaderResource,
            },
        },
    );
}

#[test]
pub fn material_placeholders() -> Result<()> {
    let mut context = framework::make_context().expect("Can initialize context.");
    let materials = [
        Material::new("plastic", Vec3::new(1.0, 0.0, 0.0), Vec3::splat(0.5), 32.0),
        Material::new("metal", Vec3::splat(0.75), Vec3::ONE, 128.0),
    ];
    let resources = MaterialRenderResources::new(&mut context.env, &materials)?;

    assert_eq!(resources.num_materials(), 2);
    assert_eq!(resources.all_textures().count(), 6, "Every material gets three textures.");
    assert!(resources
        .all_textures()
        .all(|texture| texture.state() == ResourceState::PixelShaderResource));
    let plastic = resources.textures(0);
    assert_eq!(plastic.diffuse.name(), "plastic Diffuse Map");
    assert_eq!(plastic.shininess.format(), Format::R16Float);

    let submission = framework::last_submission(&context)?;
    assert_eq!(
        framework::count_commands(&submission, |command| *command
            == Command::ClearRenderTargetView {
                view: plastic.diffuse.rtv(),
                color: [1.0, 0.0, 0.0, 1.0]
            }),
        1,
        "Placeholders should be filled with the material color."
    );
    assert_eq!(
        framework::count_commands(&submission, |command| matches!(command, Command::ClearRenderTargetView { .. })),
        6
    );
    let batches = framework::barrier_batches(&submission);
    assert_eq!(batches.len(), 1, "All placeholders should be transitioned in one batch.");
    assert_eq!(batches[0].len(), 6);
    Ok(())
}

#[test]
pub fn material_with_texture_map() -> Result<()> {
    let mut context = framework::make_context().expect("Can initialize context.");
    let mut material = Material::new("bricks", Vec3::ONE, Vec3::ONE, 1.0);
    material.diffuse_map = Some("textures/bricks.dds".into());
    let error = MaterialRenderResources::new(&mut context.env, &[material])
        .expect_err("Loading texture files is not available.");
    assert!(matches!(error.downcast_ref::<Error>(), Some(Error::NotImplemented(_))));
    Ok(())
}
