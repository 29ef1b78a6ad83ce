//! Exposes the deimos error type

use std::sync::PoisonError;

use thiserror::Error;

use crate::resource::state::ResourceState;

/// Error type that deimos can return.
///
/// Misuse of the API (exhausted descriptor heaps, recording into a closed command list, no-op barriers, ...)
/// is not reported through this type. Those are programming errors and abort through an assertion.
#[derive(Error, Debug)]
pub enum Error {
    /// The requested operation exists as a placeholder only.
    #[error("Not implemented: {0}")]
    NotImplemented(&'static str),
    /// Frame schedule contains a cycle and is impossible to order.
    #[error("Frame schedule contains cycle.")]
    GraphHasCycle,
    /// Node not found in graph. Generally this should not happen.
    #[error("Implementation error. Node not found.")]
    NodeNotFound,
    /// A pass consumes a resource in a different state than the producing pass leaves it in.
    #[error("Resource `{resource}` is left in state {produced:?} but consumed in state {expected:?}")]
    StateHandoffMismatch {
        /// Name of the virtual resource
        resource: String,
        /// State reported by the producer
        produced: ResourceState,
        /// State the consumer expects it to arrive in
        expected: ResourceState,
    },
    /// Two passes in a schedule produce the same version of a resource.
    #[error("Resource version `{0}` is produced by more than one pass.")]
    IllegalSchedule(String),
    /// No pass produces a versioned resource that is consumed.
    #[error("No resource bound to virtual resource `{0}`")]
    NoResourceBound(String),
    /// Backend does not know the given object.
    #[error("Unknown backend object `{0}`")]
    UnknownObject(String),
    /// Shader could not be compiled into a pipeline.
    #[error("Shader compilation failed: {0}")]
    ShaderCompilation(String),
    /// The device was lost. This is never recovered from.
    #[error("Device removed.")]
    DeviceRemoved,
    /// Poisoned mutex
    #[error("Poisoned mutex")]
    PoisonError,
    /// Uncategorized error.
    #[error("Uncategorized error: `{0}`")]
    Uncategorized(&'static str),
}

impl<T> From<PoisonError<T>> for Error {
    fn from(_: PoisonError<T>) -> Self {
        Error::PoisonError
    }
}
