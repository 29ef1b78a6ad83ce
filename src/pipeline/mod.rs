//! Root signatures, pipeline state objects and command signatures.
//!
//! A pass builds its root signature first, then compiles one pipeline per macro permutation it needs against
//! that root signature. Permutation spaces are small and bounded, so all permutations are compiled at
//! initialization time.
//!
//! # Example
//! ```ignore
//! let root_signature = RootSignatureBuilder::new()
//!     .cbv(0, ShaderVisibility::All)
//!     .table([DescriptorRange::srv(1, 0), DescriptorRange::uav(1, 0)], ShaderVisibility::All)
//!     .build(&device, "my pass")?;
//! let shader = Shader::compute("MyPassCS.hlsl", "Main").define("NUM_THREADS_X", 8);
//! let pipeline = PipelineState::compute(&device, "my pass", &root_signature, shader)?;
//! ```

pub mod command_signature;
pub mod indirect;
pub mod pipeline_state;
pub mod root_signature;
pub mod shader;
