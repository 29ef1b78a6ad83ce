//! Resource state tracking and pass recording for a tiled deferred renderer with voxel based global illumination.
//!
//! Deimos models the GPU side of a frame as a sequence of passes. Each pass owns its pipelines and private
//! resources, shares the rest of its inputs through `Rc`, and knows exactly which state every resource has to be in.
//! Transitions are computed once when a pass is initialized and recorded as one batch per pass, so a frame records
//! the minimum number of barriers. Passes report the states they leave their outputs in, which become the input
//! states of the passes after them.
//!
//! To get started, the easiest way is to simply
//! ```
//! // Import types under a namespace.
//! use deimos::prelude as dm;
//!
//! // Or, if you dont care about using the types under a namespace
//! use deimos::prelude::*;
//! ```
//!
//! # Example
//!
//! The render environment bundles the device, the command queue, the descriptor heaps and the fence. Without a real
//! device, it can run on the headless backend, which executes command lists on the CPU and records everything that
//! was submitted.
//! ```ignore
//! use deimos::prelude::*;
//!
//! let settings = RenderSettingsBuilder::new()
//!     .name("deimos demo app")
//!     .num_tiles(16, 16)
//!     .voxel_grid(64, 100.0)
//!     .build();
//! let (mut env, backend) = RenderEnv::headless(settings)?;
//! ```
//! Now passes can be initialized and recorded.
//! ```ignore
//! let grid_config = Rc::new(Buffer::new(&env.device, &mut env.heaps, BufferDesc::constant("grid config", 256))?);
//! let grid = Rc::new(Buffer::new(&env.device, &mut env.heaps, grid_buffer_desc)?);
//! let clear = ClearVoxelGridPass::init(&mut env, clear_voxel_grid::InitParams {
//!     grid_config,
//!     grid,
//!     num_grid_cells: env.settings.num_grid_cells,
//! })?;
//! // Records the pass, submits it and blocks until the device finished it.
//! env.execute_pass("clear voxel grid", |env, cmd| clear.record(env, cmd))?;
//! ```
//! For further example code, check out the following modules
//! - [`passes`] for the passes that make up a frame.
//! - [`graph`] for barrier batches, state tracking and the frame schedule.
//! - [`pipeline`] for root signatures and pipeline creation.
//! - [`descriptor`] for descriptor heaps and tables.
//! - [`command_buffer`] for the commands available on a command list.
//! - [`resource`] for buffers and textures.
//! - [`sync`] for the fence and waiting on the device.

#[macro_use]
extern crate derivative;
#[macro_use]
extern crate log;

pub mod prelude;
pub use crate::prelude::*;

pub mod command_buffer;
pub mod core;
pub mod descriptor;
pub mod graph;
pub mod math;
pub mod passes;
pub mod pipeline;
pub mod profiler;
pub mod resource;
pub mod sync;
pub mod util;
