//! The core module holds the device abstraction, the render environment, settings and the error type.

pub mod backend;
pub mod device;
pub mod error;
pub mod headless;
pub mod render_env;
pub mod settings;
