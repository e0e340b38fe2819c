//! Triangle surface.
//!
//! Uses the Möller-Trumbore algorithm for ray-triangle intersection.

use umbra_core::{Intersection, Surface};
use umbra_math::{Aabb, Ray, Vec2, Vec3};

/// Epsilon-table key for triangles.
pub const TRIANGLE_KIND: &str = "triangle";

/// A single triangle.
#[derive(Debug, Clone, Copy)]
pub struct Triangle {
    v0: Vec3,
    edge1: Vec3,
    edge2: Vec3,
    /// Face normal (unit length), counter-clockwise winding.
    normal: Vec3,
}

impl Triangle {
    pub fn new(v0: Vec3, v1: Vec3, v2: Vec3) -> Self {
        let edge1 = v1 - v0;
        let edge2 = v2 - v0;
        Self {
            v0,
            edge1,
            edge2,
            normal: edge1.cross(edge2).normalize_or_zero(),
        }
    }

    pub fn normal(&self) -> Vec3 {
        self.normal
    }

    /// Hit time and barycentric (u, v) of the ray/triangle crossing.
    fn crossing(&self, ray: &Ray) -> Option<(f32, f32, f32)> {
        let h = ray.direction.cross(self.edge2);
        let a = self.edge1.dot(h);

        // Ray is parallel to triangle
        if a.abs() < 1e-8 {
            return None;
        }

        let f = 1.0 / a;
        let s = ray.origin - self.v0;
        let u = f * s.dot(h);
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(self.edge1);
        let v = f * ray.direction.dot(q);
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        Some((f * self.edge2.dot(q), u, v))
    }
}

impl Surface for Triangle {
    fn kind(&self) -> &'static str {
        TRIANGLE_KIND
    }

    fn intersect(&self, ray: &Ray, best: &mut f32, hit: &mut Intersection, epsilon: f32) -> bool {
        match self.crossing(ray) {
            Some((t, _, _)) if t > epsilon && t < *best => {
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
            Some((t, _, _)) if t > epsilon && t < *best && t <= max_time => {
                *best = t;
                true
            }
            _ => false,
        }
    }

    fn bounds(&self) -> Option<Aabb> {
        let v1 = self.v0 + self.edge1;
        let v2 = self.v0 + self.edge2;
        Some(Aabb::from_points(self.v0.min(v1).min(v2), self.v0.max(v1).max(v2)))
    }

    /// Barycentric coordinates of `local` with respect to (v1, v2).
    fn uv(&self, local: Vec3) -> Vec2 {
        let d = local - self.v0;
        let d00 = self.edge1.dot(self.edge1);
        let d01 = self.edge1.dot(self.edge2);
        let d11 = self.edge2.dot(self.edge2);
        let d20 = d.dot(self.edge1);
        let d21 = d.dot(self.edge2);
        let denom = d00 * d11 - d01 * d01;
        if denom.abs() < 1e-12 {
            return Vec2::ZERO;
        }
        Vec2::new((d11 * d20 - d01 * d21) / denom, (d00 * d21 - d01 * d20) / denom)
    }
}
