//! Small amount of math needed on the CPU side: cached object transforms and frustum culling.

pub mod frustum;
pub mod transform;
