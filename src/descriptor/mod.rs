//! Descriptor heaps, descriptor tables and samplers.
//!
//! Views are created next to their resource in the shader invisible heap. A pass then copies the views it
//! needs into a table of the shader visible heap, in the order its shader expects them.

pub mod heap;
pub mod sampler;
pub mod table;
