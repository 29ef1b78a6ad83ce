pub use ash::vk;

pub use crate::core::backend::{Backend, ObjectId};
pub use crate::core::device::Device;
pub use crate::core::error::Error;
pub use crate::core::headless::HeadlessBackend;
pub use crate::core::render_env::RenderEnv;
pub use crate::core::settings::{RenderSettings, RenderSettingsBuilder};

pub use crate::sync::fence::*;

pub use crate::command_buffer::CommandList;
pub use crate::command_buffer::command::BindPoint;
pub use crate::command_buffer::pool::CommandListPool;
pub use crate::command_buffer::queue::CommandQueue;
pub use crate::command_buffer::viewport::{Rect, Viewport};

pub use crate::resource::{GraphicsResource, ResourceId};
pub use crate::resource::buffer::{Buffer, BufferDesc};
pub use crate::resource::format::Format;
pub use crate::resource::state::ResourceState;
pub use crate::resource::texture::{ClearValue, Texture, TextureDesc};

pub use crate::descriptor::heap::{DescriptorHandle, DescriptorHeap, DescriptorHeaps};
pub use crate::descriptor::sampler::{AddressMode, Filter, Sampler, SamplerDesc};
pub use crate::descriptor::table::{DescriptorTable, DescriptorTableBuilder};

pub use crate::pipeline::command_signature::{CommandSignature, IndirectArgumentDesc};
pub use crate::pipeline::indirect::*;
pub use crate::pipeline::pipeline_state::{GraphicsPipelineDesc, PipelineState};
pub use crate::pipeline::root_signature::{DescriptorRange, RootSignature, RootSignatureBuilder, ShaderVisibility};
pub use crate::pipeline::shader::{Shader, ShaderMacro};

pub use crate::graph::barrier::{BarrierBatch, ResourceBarrier};
pub use crate::graph::schedule::{FrameSchedule, ScheduledPassBuilder};
pub use crate::graph::tracker::{commit_states, StateTracker};
pub use crate::graph::virtual_resource::VirtualResource;

pub use crate::math::frustum::{Aabb, Frustum};
pub use crate::math::transform::Transform;

pub use crate::profiler::{GpuProfiler, ProfileReport};

pub use crate::passes::clear_voxel_grid::{self, ClearVoxelGridPass};
pub use crate::passes::copy_texture::{self, CopyTexturePass};
pub use crate::passes::create_render_gbuffer_commands::{self, CreateRenderGBufferCommandsPass};
pub use crate::passes::create_voxel_grid::{self, CreateVoxelGridPass};
pub use crate::passes::cube_map_to_sh::{self, CubeMapToShCoefficientsPass};
pub use crate::passes::fill_depth_with_mesh_type::{self, FillDepthBufferWithMeshTypePass};
pub use crate::passes::fill_gbuffer::{self, FillGBufferPass};
pub use crate::passes::material_resources::{Material, MaterialRenderResources};
pub use crate::passes::mesh_batch::{Mesh, MeshBatch};
pub use crate::passes::render_gbuffer::{self, RenderGBufferPass};
pub use crate::passes::shadow::{PointLightShadowRenderer, SpotLightShadowRenderer};
pub use crate::passes::tiled_light_culling::{self, TiledLightCullingPass};
pub use crate::passes::tiled_shadow_map_sat::{self, CreateTiledShadowMapSatPass};
pub use crate::passes::visualize_texture::{self, VisualizeTexturePass};
pub use crate::passes::visualize_voxel_grid::{self, VisualizeVoxelGridPass};
