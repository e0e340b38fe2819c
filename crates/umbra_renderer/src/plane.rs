//! Infinite plane surface.

use umbra_core::{Intersection, Surface};
use umbra_math::{Ray, Vec2, Vec3};

/// Epsilon-table key for planes.
pub const PLANE_KIND: &str = "plane";

/// The plane through `point` with unit normal `normal`. Unbounded, so it
/// never contributes a bounding volume.
#[derive(Debug, Clone, Copy)]
pub struct Plane {
    point: Vec3,
    normal: Vec3,
    tangent: Vec3,
    bitangent: Vec3,
}

impl Plane {
    pub fn new(point: Vec3, normal: Vec3) -> Self {
        let normal = normal.normalize_or_zero();
        let (tangent, bitangent) = normal.any_orthonormal_pair();
        Self {
            point,
            normal,
            tangent,
            bitangent,
        }
    }

    /// Ground plane `y = height` facing up.
    pub fn ground(height: f32) -> Self {
        Self::new(Vec3::new(0.0, height, 0.0), Vec3::Y)
    }

    fn crossing(&self, ray: &Ray) -> Option<f32> {
        let denom = ray.direction.dot(self.normal);
        if denom.abs() < 1e-8 {
            return None;
        }
        Some((self.point - ray.origin).dot(self.normal) / denom)
    }
}

impl Surface for Plane {
    fn kind(&self) -> &'static str {
        PLANE_KIND
    }

    fn intersect(&self, ray: &Ray, best: &mut f32, hit: &mut Intersection, epsilon: f32) -> bool {
        match self.crossing(ray) {
            Some(t) if t > epsilon && t < *best => {
                *best = t;
                let p = ray.at(t);
                hit.local = p;
                hit.world = p;
                hit.set_face_normal(ray.direction, self.normal);
                true
            }
            _ => false,
        }
    }

    fn casts_shadow(&self, ray: &Ray, best: &mut f32, epsilon: f32, max_time: f32) -> bool {
        match self.crossing(ray) {
            Some(t) if t > epsilon && t < *best && t <= max_time => {
                *best = t;
                true
            }
            _ => false,
        }
    }

    fn uv(&self, local: Vec3) -> Vec2 {
        let d = local - self.point;
        Vec2::new(d.dot(self.tangent), d.dot(self.bitangent))
    }
}
