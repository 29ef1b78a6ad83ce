//! Object transforms with lazily recomputed matrices.

use std::cell::Cell;

use bitflags::bitflags;
use glam::{Mat4, Quat, Vec3, Vec4};

bitflags! {
    /// Cached matrices that are out of date.
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    struct DirtyFlags: u8 {
        const LOCAL_TO_WORLD = 1 << 0;
        const WORLD_TO_LOCAL = 1 << 1;
    }
}

/// Scaling, rotation and position of an object.
///
/// The local to world matrix and its inverse are computed on first access after a change, and cached until
/// the next setter call.
#[derive(Debug, Clone)]
pub struct Transform {
    scaling: Vec3,
    rotation: Quat,
    position: Vec3,
    local_to_world: Cell<Mat4>,
    world_to_local: Cell<Mat4>,
    dirty: Cell<DirtyFlags>,
}

impl Default for Transform {
    fn default() -> Self {
        Self::new(Vec3::ONE, Quat::IDENTITY, Vec3::ZERO)
    }
}

impl Transform {
    pub fn new(scaling: Vec3, rotation: Quat, position: Vec3) -> Self {
        Self {
            scaling,
            rotation,
            position,
            local_to_world: Cell::new(Mat4::IDENTITY),
            world_to_local: Cell::new(Mat4::IDENTITY),
            dirty: Cell::new(DirtyFlags::all()),
        }
    }

    pub fn scaling(&self) -> Vec3 {
        self.scaling
    }

    pub fn set_scaling(&mut self, scaling: Vec3) {
        self.scaling = scaling;
        self.dirty.set(DirtyFlags::all());
    }

    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    pub fn set_rotation(&mut self, rotation: Quat) {
        self.rotation = rotation;
        self.dirty.set(DirtyFlags::all());
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.dirty.set(DirtyFlags::all());
    }

    /// Scale, then rotate, then translate.
    pub fn local_to_world(&self) -> Mat4 {
        let dirty = self.dirty.get();
        if dirty.contains(DirtyFlags::LOCAL_TO_WORLD) {
            self.local_to_world
                .set(Mat4::from_scale_rotation_translation(self.scaling, self.rotation, self.position));
            self.dirty.set(dirty - DirtyFlags::LOCAL_TO_WORLD);
        }
        self.local_to_world.get()
    }

    pub fn world_to_local(&self) -> Mat4 {
        if self.dirty.get().contains(DirtyFlags::WORLD_TO_LOCAL) {
            let inverse = self.local_to_world().inverse();
            self.world_to_local.set(inverse);
            self.dirty.set(self.dirty.get() - DirtyFlags::WORLD_TO_LOCAL);
        }
        self.world_to_local.get()
    }

    /// Whether a matrix will be recomputed on its next access.
    pub fn is_dirty(&self) -> bool {
        !self.dirty.get().is_empty()
    }

    /// Transform a point or direction given in homogeneous coordinates.
    pub fn transform_vector(&self, vector: Vec4) -> Vec4 {
        self.local_to_world() * vector
    }

    /// Transform a normal. Normals are multiplied with the inverse transpose, so non-uniform scaling keeps them
    /// perpendicular to the surface.
    pub fn transform_normal(&self, normal: Vec4) -> Vec4 {
        self.world_to_local().transpose() * normal
    }
}
