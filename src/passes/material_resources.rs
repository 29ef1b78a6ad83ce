//! Per material textures sampled by the G-buffer passes.
//!
//! Materials without texture maps get small placeholder textures filled with the material's constant color,
//! so the shaders can sample every material the same way.

use std::path::PathBuf;
use std::rc::Rc;

use anyhow::Result;
use glam::Vec3;

use crate::core::error::Error;
use crate::core::render_env::RenderEnv;
use crate::graph::barrier::BarrierBatch;
use crate::graph::tracker::commit_states;
use crate::resource::GraphicsResource;
use crate::resource::format::Format;
use crate::resource::state::ResourceState;
use crate::resource::texture::{ClearValue, Texture, TextureDesc};

/// Width and height of a placeholder texture.
pub const PLACEHOLDER_SIZE: u32 = 4;
pub const NUM_TEXTURES_PER_MATERIAL: usize = 3;

/// Surface description of a mesh. A map path replaces the corresponding constant.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub name: String,
    pub diffuse_color: Vec3,
    pub specular_color: Vec3,
    pub shininess: f32,
    pub diffuse_map: Option<PathBuf>,
    pub specular_map: Option<PathBuf>,
    pub shininess_map: Option<PathBuf>,
}

impl Material {
    pub fn new(name: impl Into<String>, diffuse_color: Vec3, specular_color: Vec3, shininess: f32) -> Self {
        Self {
            name: name.into(),
            diffuse_color,
            specular_color,
            shininess,
            diffuse_map: None,
            specular_map: None,
            shininess_map: None,
        }
    }
}

/// Textures of one material, all left in [`ResourceState::PixelShaderResource`].
#[derive(Debug, Clone)]
pub struct MaterialTextures {
    pub diffuse: Rc<Texture>,
    pub specular: Rc<Texture>,
    pub shininess: Rc<Texture>,
}

#[derive(Debug)]
pub struct MaterialRenderResources {
    textures: Vec<MaterialTextures>,
}

fn placeholder(env: &mut RenderEnv, name: String, format: Format, color: [f32; 4]) -> Result<Rc<Texture>> {
    let desc = TextureDesc::render_target(name, PLACEHOLDER_SIZE, PLACEHOLDER_SIZE, format)
        .clear_value(ClearValue::Color(color));
    Ok(Rc::new(Texture::new(&env.device, &mut env.heaps, desc)?))
}

fn load_or_placeholder(
    env: &mut RenderEnv,
    map: &Option<PathBuf>,
    name: String,
    format: Format,
    color: [f32; 4],
    placeholders: &mut Vec<(Rc<Texture>, [f32; 4])>,
) -> Result<Rc<Texture>> {
    if let Some(path) = map {
        warn!("Cannot load `{}` for `{}`", path.display(), name);
        return Err(Error::NotImplemented("material texture loading").into());
    }
    let texture = placeholder(env, name, format, color)?;
    placeholders.push((texture.clone(), color));
    Ok(texture)
}

impl MaterialRenderResources {
    /// Creates the textures of every material and fills the placeholders. Blocks until the GPU is done.
    pub fn new(env: &mut RenderEnv, materials: &[Material]) -> Result<Self> {
        let mut textures = Vec::with_capacity(materials.len());
        let mut placeholders = Vec::with_capacity(materials.len() * NUM_TEXTURES_PER_MATERIAL);
        for material in materials {
            let diffuse = load_or_placeholder(
                env,
                &material.diffuse_map,
                format!("{} Diffuse Map", material.name),
                Format::R16G16B16A16Float,
                material.diffuse_color.extend(1.0).to_array(),
                &mut placeholders,
            )?;
            let specular = load_or_placeholder(
                env,
                &material.specular_map,
                format!("{} Specular Map", material.name),
                Format::R16G16B16A16Float,
                material.specular_color.extend(1.0).to_array(),
                &mut placeholders,
            )?;
            let shininess = load_or_placeholder(
                env,
                &material.shininess_map,
                format!("{} Shininess Map", material.name),
                Format::R16Float,
                Vec3::splat(material.shininess).extend(1.0).to_array(),
                &mut placeholders,
            )?;
            textures.push(MaterialTextures {
                diffuse,
                specular,
                shininess,
            });
        }

        if !placeholders.is_empty() {
            let mut barriers = BarrierBatch::new();
            for (texture, _) in &placeholders {
                barriers.push_if_required(
                    &**texture,
                    ResourceState::RenderTarget,
                    ResourceState::PixelShaderResource,
                );
            }
            env.execute_pass("MaterialRenderResources", |_, cmd| {
                for (texture, color) in &placeholders {
                    cmd.clear_render_target_view(texture.rtv(), *color);
                }
                barriers.record(cmd);
                Ok(())
            })?;
            commit_states(
                placeholders
                    .iter()
                    .map(|(texture, _)| (&**texture as &dyn GraphicsResource, ResourceState::PixelShaderResource)),
            );
        }

        info!(
            "Created textures for {} material(s), {} placeholder(s)",
            materials.len(),
            placeholders.len()
        );
        Ok(Self { textures })
    }

    pub fn textures(&self, material_index: usize) -> &MaterialTextures {
        &self.textures[material_index]
    }

    pub fn num_materials(&self) -> usize {
        self.textures.len()
    }

    /// All textures, three per material in diffuse, specular, shininess order.
    pub fn all_textures(&self) -> impl Iterator<Item = &Rc<Texture>> {
        self.textures
            .iter()
            .flat_map(|material| [&material.diffuse, &material.specular, &material.shininess])
    }
}
