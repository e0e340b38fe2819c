// Transform utilities for Mat4
//
// glam::Mat4 already provides transform_point3(), transform_vector3() and
// inverse(); this adds what scene traversal needs on top.

use glam::{Mat4, Quat, Vec3};
use crate::Aabb;

/// Determinant magnitude below which a matrix is treated as singular.
const SINGULAR_DETERMINANT: f32 = 1.0e-12;

/// Extension trait for Mat4 with scene-graph helpers.
pub trait Mat4Ext {
    /// Map a surface normal through this matrix.
    ///
    /// `self` is expected to be the *inverse* of the point transform; the
    /// normal is multiplied by its transpose. The result is not normalized.
    fn transform_normal3(&self, normal: Vec3) -> Vec3;

    /// Transform an axis-aligned bounding box.
    /// Computes the bounding box of all 8 transformed corners.
    fn transform_aabb(&self, aabb: &Aabb) -> Aabb;

    /// True when the matrix can be inverted without producing non-finite values.
    fn is_invertible(&self) -> bool;
}

impl Mat4Ext for Mat4 {
    fn transform_normal3(&self, normal: Vec3) -> Vec3 {
        self.transpose().transform_vector3(normal)
    }

    fn transform_aabb(&self, aabb: &Aabb) -> Aabb {
        let min_point = Vec3::new(aabb.x.min, aabb.y.min, aabb.z.min);
        let max_point = Vec3::new(aabb.x.max, aabb.y.max, aabb.z.max);

        let mut result_min = Vec3::splat(f32::INFINITY);
        let mut result_max = Vec3::splat(f32::NEG_INFINITY);

        for i in 0..8 {
            let corner = Vec3::new(
                if i & 1 == 0 { min_point.x } else { max_point.x },
                if i & 2 == 0 { min_point.y } else { max_point.y },
                if i & 4 == 0 { min_point.z } else { max_point.z },
            );
            let p = self.transform_point3(corner);
            result_min = result_min.min(p);
            result_max = result_max.max(p);
        }

        Aabb::from_points(result_min, result_max)
    }

    fn is_invertible(&self) -> bool {
        let det = self.determinant();
        det.is_finite() && det.abs() > SINGULAR_DETERMINANT
    }
}

/// Compose a local transform in translation * rotation * scale order.
#[inline]
pub fn compose_trs(translation: Vec3, rotation: Quat, scale: Vec3) -> Mat4 {
    Mat4::from_translation(translation) * Mat4::from_quat(rotation) * Mat4::from_scale(scale)
}
