//! Shadow map resources and the indirect draw commands that render static geometry into them.
//!
//! Static geometry never moves, so the draws touching each light's view volume are found once on the CPU by
//! culling every mesh instance against the light frustum. Every mesh with at least one visible instance gets a
//! [`DrawMeshCommand`]: its `instance_offset` points into a list of visible instance indices, which the vertex
//! shader reads to find the instance's world matrix. The commands of one light (or one cube map face of a point
//! light) form one contiguous [`CommandRange`].

use std::f32::consts::FRAC_PI_2;
use std::mem::size_of;
use std::rc::Rc;

use anyhow::Result;
use glam::{Mat4, Vec3};

use crate::core::error::Error;
use crate::core::render_env::RenderEnv;
use crate::graph::barrier::{BarrierBatch, ResourceBarrier};
use crate::graph::tracker::commit_states;
use crate::math::frustum::Frustum;
use crate::math::transform::Transform;
use crate::passes::mesh_batch::MeshBatch;
use crate::pipeline::indirect::{CommandRange, DrawMeshCommand};
use crate::resource::buffer::{Buffer, BufferDesc};
use crate::resource::format::Format;
use crate::resource::GraphicsResource;
use crate::resource::state::ResourceState;
use crate::resource::texture::{Texture, TextureDesc};

/// Faces of a cube map, and of a point light's view volume.
pub const NUM_CUBE_MAP_FACES: u32 = 6;
/// Size of the depth maps the active lights render into.
pub const STANDARD_SHADOW_MAP_SIZE: u32 = 1024;
/// Size of the filtered exponential shadow maps sampled when shading.
pub const EXP_SHADOW_MAP_SIZE: u32 = 512;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum LightType {
    Point,
    Spot,
}

/// Whether a shadow map still has to be rendered.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ShadowMapState {
    Outdated,
    UpToDate,
}

/// A spot light casting shadows. The light shines along the local Z axis of its transform, with Y as up.
#[derive(Debug, Clone)]
pub struct SpotLight {
    pub transform: Transform,
    /// Full opening angle of the outer cone, in radians.
    pub outer_cone_angle: f32,
    pub shadow_near_plane: f32,
    pub range: f32,
}

impl SpotLight {
    pub fn view_projection(&self) -> Mat4 {
        let position = self.transform.position();
        let rotation = self.transform.rotation();
        let direction = rotation * Vec3::Z;
        let up = rotation * Vec3::Y;
        let view = Mat4::look_at_lh(position, position + direction, up);
        let projection = Mat4::perspective_lh(self.outer_cone_angle, 1.0, self.shadow_near_plane, self.range);
        projection * view
    }
}

/// A point light casting shadows in all directions, one cube map face at a time.
#[derive(Debug, Clone)]
pub struct PointLight {
    pub position: Vec3,
    pub shadow_near_plane: f32,
    pub range: f32,
}

impl PointLight {
    /// View projection matrix of cube map face `face`, in `+X, -X, +Y, -Y, +Z, -Z` order.
    pub fn face_view_projection(&self, face: u32) -> Mat4 {
        let (look_at, up) = match face {
            0 => (Vec3::X, Vec3::Y),
            1 => (Vec3::NEG_X, Vec3::Y),
            2 => (Vec3::Y, Vec3::Z),
            3 => (Vec3::NEG_Y, Vec3::NEG_Z),
            4 => (Vec3::Z, Vec3::Y),
            5 => (Vec3::NEG_Z, Vec3::Y),
            _ => panic!("Cube map face {face} out of range."),
        };
        let view = Mat4::look_at_lh(self.position, self.position + look_at, up);
        let projection = Mat4::perspective_lh(FRAC_PI_2, 1.0, self.shadow_near_plane, self.range);
        projection * view
    }
}

/// Draw commands of static geometry for a list of view volumes.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ShadowCommands {
    pub commands: Vec<DrawMeshCommand>,
    /// Indices of the visible instances, referenced by `DrawMeshCommand::instance_offset`.
    pub instance_indices: Vec<u32>,
    /// One range of `commands` per view volume.
    pub ranges: Vec<CommandRange>,
}

impl ShadowCommands {
    /// Cull every instance of `mesh_batch` against each frustum in turn. Instance indices count the instances of
    /// all meshes of the batch, in mesh order.
    pub fn build(frustums: impl IntoIterator<Item = Frustum>, mesh_batch: &MeshBatch) -> Self {
        let mut result = Self::default();
        for frustum in frustums {
            let start = result.commands.len() as u32;
            let mut first_instance = 0;
            for mesh in mesh_batch.meshes() {
                let visible_before = result.instance_indices.len();
                for (index, bounds) in mesh.instance_bounds.iter().enumerate() {
                    if frustum.intersects_aabb(bounds) {
                        result.instance_indices.push(first_instance + index as u32);
                    }
                }
                let num_visible = (result.instance_indices.len() - visible_before) as u32;
                if num_visible > 0 {
                    result.commands.push(DrawMeshCommand {
                        instance_offset: visible_before as u32,
                        draw: mesh.draw_arguments(num_visible),
                    });
                }
                first_instance += mesh.num_instances();
            }
            result.ranges.push(CommandRange {
                start,
                count: result.commands.len() as u32 - start,
            });
        }
        result
    }
}

#[derive(Debug)]
pub struct SpotLightShadowInitParams {
    pub spot_lights: Vec<SpotLight>,
    pub max_num_active_spot_lights: u32,
    pub static_mesh_batch: Rc<MeshBatch>,
}

/// Owns the spot light shadow maps and the draw commands of static geometry for every spot light.
#[derive(Debug)]
pub struct SpotLightShadowRenderer {
    active_shadow_maps: Rc<Texture>,
    shadow_maps: Rc<Texture>,
    shadow_map_states: Vec<ShadowMapState>,
    max_num_active_lights: u32,
    outdated_shadow_maps: Vec<u32>,
    command_ranges: Vec<CommandRange>,
    command_buffer: Rc<Buffer>,
    instance_index_buffer: Rc<Buffer>,
}

impl SpotLightShadowRenderer {
    /// Create the shadow maps, cull static geometry and upload the resulting commands. Blocks until the upload
    /// completed.
    pub fn new(env: &mut RenderEnv, params: SpotLightShadowInitParams) -> Result<Self> {
        let num_lights = params.spot_lights.len() as u32;
        assert!(num_lights > 0, "SpotLightShadowRenderer needs at least one spot light.");
        assert!(
            (1..=num_lights).contains(&params.max_num_active_spot_lights),
            "Maximum number of active spot lights {} is not in 1..={}.",
            params.max_num_active_spot_lights,
            num_lights
        );

        let active_shadow_maps = Texture::new(
            &env.device,
            &mut env.heaps,
            TextureDesc::depth(
                "SpotLightShadowRenderer active shadow maps",
                STANDARD_SHADOW_MAP_SIZE,
                STANDARD_SHADOW_MAP_SIZE,
                Format::R16Typeless,
            )
            .array_size(params.max_num_active_spot_lights as u16),
        )?;
        let shadow_maps = Texture::new(
            &env.device,
            &mut env.heaps,
            TextureDesc::storage(
                "SpotLightShadowRenderer shadow maps",
                EXP_SHADOW_MAP_SIZE,
                EXP_SHADOW_MAP_SIZE,
                Format::R16Unorm,
            )
            .array_size(num_lights as u16),
        )?;

        let frustums = params
            .spot_lights
            .iter()
            .map(|light| Frustum::from_view_projection(&light.view_projection()));
        let commands = ShadowCommands::build(frustums, &params.static_mesh_batch);
        let (command_buffer, instance_index_buffer) = upload_commands(env, "SpotLightShadowRenderer", &commands)?;

        info!(
            "Initialized SpotLightShadowRenderer: {} lights, {} static draw commands, {} visible instances",
            num_lights,
            commands.commands.len(),
            commands.instance_indices.len()
        );
        Ok(Self {
            active_shadow_maps: Rc::new(active_shadow_maps),
            shadow_maps: Rc::new(shadow_maps),
            shadow_map_states: vec![ShadowMapState::Outdated; num_lights as usize],
            max_num_active_lights: params.max_num_active_spot_lights,
            outdated_shadow_maps: Vec::with_capacity(params.max_num_active_spot_lights as usize),
            command_ranges: commands.ranges,
            command_buffer: Rc::new(command_buffer),
            instance_index_buffer: Rc::new(instance_index_buffer),
        })
    }

    /// Collect the active lights whose shadow maps are outdated, in the order given.
    ///
    /// # Panics
    /// Panics if more lights are active than the renderer was created for, or if an index is out of range.
    pub fn collect_outdated_shadow_maps(&mut self, active_light_indices: &[u32]) -> &[u32] {
        assert!(
            active_light_indices.len() <= self.max_num_active_lights as usize,
            "{} active spot lights, at most {} supported.",
            active_light_indices.len(),
            self.max_num_active_lights
        );
        self.outdated_shadow_maps.clear();
        for &index in active_light_indices {
            if self.shadow_map_state(index) == ShadowMapState::Outdated {
                self.outdated_shadow_maps.push(index);
            }
        }
        debug!(
            "{} of {} active spot light shadow maps are outdated",
            self.outdated_shadow_maps.len(),
            active_light_indices.len()
        );
        &self.outdated_shadow_maps
    }

    pub fn shadow_map_state(&self, light_index: u32) -> ShadowMapState {
        *self
            .shadow_map_states
            .get(light_index as usize)
            .unwrap_or_else(|| panic!("Spot light {light_index} out of range."))
    }

    pub fn set_shadow_map_state(&mut self, light_index: u32, state: ShadowMapState) {
        let slot = self
            .shadow_map_states
            .get_mut(light_index as usize)
            .unwrap_or_else(|| panic!("Spot light {light_index} out of range."));
        *slot = state;
    }

    /// Commands of static geometry visible to spot light `light_index`.
    pub fn command_range(&self, light_index: u32) -> CommandRange {
        self.command_ranges[light_index as usize]
    }

    pub fn command_ranges(&self) -> &[CommandRange] {
        &self.command_ranges
    }

    pub fn command_buffer(&self) -> &Rc<Buffer> {
        &self.command_buffer
    }

    pub fn instance_index_buffer(&self) -> &Rc<Buffer> {
        &self.instance_index_buffer
    }

    pub fn active_shadow_maps(&self) -> &Rc<Texture> {
        &self.active_shadow_maps
    }

    pub fn shadow_maps(&self) -> &Rc<Texture> {
        &self.shadow_maps
    }
}

#[derive(Debug)]
pub struct PointLightShadowInitParams {
    pub point_lights: Vec<PointLight>,
    pub static_mesh_batch: Rc<MeshBatch>,
}

/// Culls static geometry against the six faces of every point light.
#[derive(Debug)]
pub struct PointLightShadowRenderer {
    commands: ShadowCommands,
}

impl PointLightShadowRenderer {
    pub fn new(params: PointLightShadowInitParams) -> Self {
        let frustums = params.point_lights.iter().flat_map(|light| {
            (0..NUM_CUBE_MAP_FACES).map(move |face| Frustum::from_view_projection(&light.face_view_projection(face)))
        });
        let commands = ShadowCommands::build(frustums, &params.static_mesh_batch);
        info!(
            "Initialized PointLightShadowRenderer: {} lights, {} static draw commands",
            params.point_lights.len(),
            commands.commands.len()
        );
        Self { commands }
    }

    /// Commands of static geometry visible to `face` of point light `light_index`.
    pub fn command_range(&self, light_index: u32, face: u32) -> CommandRange {
        assert!(face < NUM_CUBE_MAP_FACES, "Cube map face {face} out of range.");
        self.commands.ranges[(light_index * NUM_CUBE_MAP_FACES + face) as usize]
    }

    pub fn commands(&self) -> &ShadowCommands {
        &self.commands
    }

    /// Upload the commands to device memory.
    pub fn upload(&self, _env: &mut RenderEnv) -> Result<()> {
        Err(Error::NotImplemented("point light shadow command upload").into())
    }
}

/// Create device buffers for `commands` and copy the data in through a staging buffer. Both buffers end up in
/// the states they are read in: the commands as indirect arguments, the instance indices as shader resource.
fn upload_commands(env: &mut RenderEnv, owner: &str, commands: &ShadowCommands) -> Result<(Buffer, Buffer)> {
    let command_bytes: &[u8] = bytemuck::cast_slice(&commands.commands);
    let index_bytes: &[u8] = bytemuck::cast_slice(&commands.instance_indices);

    // Zero sized buffers are not allowed, so keep one unused element when nothing is visible.
    let command_buffer = Buffer::new(
        &env.device,
        &mut env.heaps,
        BufferDesc::indirect_argument(
            format!("{owner} static mesh commands"),
            commands.commands.len().max(1) as u64,
            size_of::<DrawMeshCommand>() as u64,
        )
        .unordered_access(false)
        .initial_state(ResourceState::CopyDest),
    )?;
    let instance_index_buffer = Buffer::new(
        &env.device,
        &mut env.heaps,
        BufferDesc::formatted(
            format!("{owner} static mesh instance indices"),
            commands.instance_indices.len().max(1) as u64,
            Format::R32Uint,
        )
        .unordered_access(false)
        .initial_state(ResourceState::CopyDest),
    )?;
    let upload_buffer = Buffer::new(
        &env.device,
        &mut env.heaps,
        BufferDesc::upload(format!("{owner} upload"), command_buffer.size() + instance_index_buffer.size()),
    )?;
    upload_buffer.write(0, command_bytes)?;
    upload_buffer.write(command_buffer.size(), index_bytes)?;

    let mut barriers = BarrierBatch::new();
    barriers.push(ResourceBarrier::transition(
        &command_buffer,
        ResourceState::CopyDest,
        ResourceState::IndirectArgument,
    ));
    barriers.push(ResourceBarrier::transition(
        &instance_index_buffer,
        ResourceState::CopyDest,
        ResourceState::NonPixelShaderResource,
    ));

    env.execute_pass(&format!("{owner} upload"), |_, cmd| {
        if !command_bytes.is_empty() {
            cmd.copy_buffer_region(&command_buffer, 0, &upload_buffer, 0, command_bytes.len() as u64);
        }
        if !index_bytes.is_empty() {
            cmd.copy_buffer_region(
                &instance_index_buffer,
                0,
                &upload_buffer,
                command_buffer.size(),
                index_bytes.len() as u64,
            );
        }
        barriers.record(cmd);
        Ok(())
    })?;
    let outputs: [(&dyn GraphicsResource, ResourceState); 2] = [
        (&command_buffer, ResourceState::IndirectArgument),
        (&instance_index_buffer, ResourceState::NonPixelShaderResource),
    ];
    commit_states(outputs);
    Ok((command_buffer, instance_index_buffer))
}
