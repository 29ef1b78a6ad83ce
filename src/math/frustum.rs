//! View frustums and bounding boxes for CPU side culling.

use glam::{Mat4, Vec3, Vec4};

/// Axis aligned bounding box.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        assert!(min.cmple(max).all(), "Bounding box min {min} is not below max {max}.");
        Self { min, max }
    }

    pub fn center(&self) -> Vec3 {
        0.5 * (self.min + self.max)
    }

    /// Bounding box of this box after transforming it with `matrix`.
    pub fn transformed(&self, matrix: &Mat4) -> Aabb {
        let corners = (0..8).map(|i| {
            let corner = Vec3::new(
                if i & 1 == 0 { self.min.x } else { self.max.x },
                if i & 2 == 0 { self.min.y } else { self.max.y },
                if i & 4 == 0 { self.min.z } else { self.max.z },
            );
            matrix.transform_point3(corner)
        });
        let (min, max) = corners.fold((Vec3::splat(f32::MAX), Vec3::splat(f32::MIN)), |(min, max), corner| {
            (min.min(corner), max.max(corner))
        });
        Aabb { min, max }
    }
}

/// Six planes bounding a view volume, with normals pointing inside.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Frustum {
    // Left, right, bottom, top, near, far
    planes: [Vec4; 6],
}

impl Frustum {
    /// Extract the planes of a view projection matrix with a [0, 1] depth range.
    pub fn from_view_projection(matrix: &Mat4) -> Self {
        let rows = [matrix.row(0), matrix.row(1), matrix.row(2), matrix.row(3)];
        let mut planes = [
            rows[3] + rows[0],
            rows[3] - rows[0],
            rows[3] + rows[1],
            rows[3] - rows[1],
            rows[2],
            rows[3] - rows[2],
        ];
        for plane in &mut planes {
            *plane /= plane.truncate().length();
        }
        Self { planes }
    }

    pub fn planes(&self) -> &[Vec4; 6] {
        &self.planes
    }

    pub fn contains_point(&self, point: Vec3) -> bool {
        self.planes.iter().all(|plane| plane.truncate().dot(point) + plane.w >= 0.0)
    }

    /// Conservative overlap test: may report boxes outside the frustum near its corners, never misses a visible box.
    pub fn intersects_aabb(&self, aabb: &Aabb) -> bool {
        self.planes.iter().all(|plane| {
            let normal = plane.truncate();
            // Corner furthest along the plane normal
            let positive = Vec3::select(normal.cmpge(Vec3::ZERO), aabb.max, aabb.min);
            normal.dot(positive) + plane.w >= 0.0
        })
    }
}
