use std::ops::Deref;
use std::sync::Arc;

use crate::core::backend::Backend;

/// Cheaply clonable handle to the backend. All resources and pipeline objects keep one around.
///
/// `Device` dereferences to the [`Backend`] trait object, so backend functions can be called on it directly.
#[derive(Clone, Derivative)]
#[derivative(Debug)]
pub struct Device {
    #[derivative(Debug = "ignore")]
    backend: Arc<dyn Backend>,
    name: String,
}

impl Device {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        let name = backend.name().to_owned();
        info!("Using `{}` backend", name);
        Self { backend, name }
    }

    /// Name of the backend behind this device.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Deref for Device {
    type Target = dyn Backend;

    fn deref(&self) -> &Self::Target {
        self.backend.as_ref()
    }
}
