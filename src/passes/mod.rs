//! The render passes of the voxel GI and tiled deferred renderer.
//!
//! Every pass has the same two phase life cycle:
//!
//! * `init` creates the resources the pass owns, fills its descriptor tables, compiles its root signature and
//!   pipelines, and computes the transitions needed to get each input from the state it arrives in
//!   (`InputResourceStates`) to the state the pass needs.
//! * `record` records those transitions as a single batch, binds everything and issues the draw or dispatch.
//!   Afterwards every resource is in the state reported by `output_resource_states`, which is what the next pass
//!   should declare as its input states.
//!
//! `record` expects a command list that is already recording, so that several passes can share a list, and so
//! that passes can run inside a [`FrameSchedule`](crate::graph::schedule::FrameSchedule). The order of descriptors
//! in each table is part of the binding contract with the pass's shader and is documented on each pass.
//!
//! # Example
//! ```ignore
//! let clear = ClearVoxelGridPass::init(&mut env, clear_voxel_grid::InitParams {
//!     grid_config: grid_config.clone(),
//!     grid: grid.clone(),
//!     num_grid_cells: env.settings.num_grid_cells,
//! })?;
//! env.execute_pass("clear voxel grid", |env, cmd| clear.record(env, cmd))?;
//! ```

pub mod clear_voxel_grid;
pub mod copy_texture;
pub mod create_render_gbuffer_commands;
pub mod create_voxel_grid;
pub mod cube_map_to_sh;
pub mod fill_depth_with_mesh_type;
pub mod fill_gbuffer;
pub mod material_resources;
pub mod mesh_batch;
pub mod render_gbuffer;
pub mod shadow;
pub mod tiled_light_culling;
pub mod tiled_shadow_map_sat;
pub mod visualize_texture;
pub mod visualize_voxel_grid;
