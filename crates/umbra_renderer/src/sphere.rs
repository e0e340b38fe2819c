//! Sphere surface.

use std::f32::consts::PI;

use umbra_core::{Intersection, Surface};
use umbra_math::{Aabb, Interval, Ray, Vec2, Vec3};

/// Epsilon-table key for spheres.
pub const SPHERE_KIND: &str = "sphere";

/// A sphere centered at `center` in its actor's local space.
#[derive(Debug, Clone, Copy)]
pub struct Sphere {
    center: Vec3,
    radius: f32,
}

impl Sphere {
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self {
            center,
            radius: radius.max(0.0),
        }
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Nearest root of the ray/sphere quadratic strictly inside `window`.
    ///
    /// Works for non-unit directions, which is what rays carried into a
    /// scaled local space look like.
    fn nearest_root(&self, ray: &Ray, window: Interval) -> Option<f32> {
        let oc = self.center - ray.origin;
        let a = ray.direction.length_squared();
        let h = ray.direction.dot(oc);
        let c = oc.length_squared() - self.radius * self.radius;

        let discriminant = h * h - a * c;
        if discriminant < 0.0 || a == 0.0 {
            return None;
        }
        let sqrtd = discriminant.sqrt();

        let near = (h - sqrtd) / a;
        if window.surrounds(near) {
            return Some(near);
        }
        let far = (h + sqrtd) / a;
        window.surrounds(far).then_some(far)
    }
}

impl Surface for Sphere {
    fn kind(&self) -> &'static str {
        SPHERE_KIND
    }

    fn intersect(&self, ray: &Ray, best: &mut f32, hit: &mut Intersection, epsilon: f32) -> bool {
        let Some(t) = self.nearest_root(ray, Interval::hit_window(epsilon, *best)) else {
            return false;
        };

        *best = t;
        let p = ray.at(t);
        hit.local = p;
        hit.world = p;
        hit.set_face_normal(ray.direction, (p - self.center).normalize_or_zero());
        true
    }

    fn casts_shadow(&self, ray: &Ray, best: &mut f32, epsilon: f32, max_time: f32) -> bool {
        match self.nearest_root(ray, Interval::hit_window(epsilon, *best)) {
            Some(t) if t <= max_time => {
                *best = t;
                true
            }
            _ => false,
        }
    }

    fn bounds(&self) -> Option<Aabb> {
        Some(Aabb::around(self.center, self.radius))
    }

    fn uv(&self, local: Vec3) -> Vec2 {
        // theta: angle down from +Y, phi: angle around Y from -X
        let p = (local - self.center).normalize_or_zero();
        let theta = (-p.y).acos();
        let phi = (-p.z).atan2(p.x) + PI;
        Vec2::new(phi / (2.0 * PI), theta / PI)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sphere_hit() {
        let sphere = Sphere::new(Vec3::new(0.0, 0.0, -1.0), 0.5);
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));

        let mut hit = Intersection::default();
        let mut best = f32::INFINITY;
        assert!(sphere.intersect(&ray, &mut best, &mut hit, 1e-4));
        assert!((best - 0.5).abs() < 0.001);
        assert!(!hit.reversed);
        assert!((hit.normal - Vec3::Z).length() < 1e-5);
    }

    #[test]
    fn test_sphere_miss_leaves_state() {
        let sphere = Sphere::new(Vec3::new(0.0, 0.0, -1.0), 0.5);
        let ray = Ray::new(Vec3::ZERO, Vec3::Y);

        let mut hit = Intersection::default();
        let mut best = 7.0;
        assert!(!sphere.intersect(&ray, &mut best, &mut hit, 1e-4));
        assert_eq!(best, 7.0);
        assert_eq!(hit, Intersection::default());
    }

    #[test]
    fn test_inside_hit_is_reversed() {
        let sphere = Sphere::new(Vec3::ZERO, 2.0);
        let ray = Ray::new(Vec3::ZERO, Vec3::X);

        let mut hit = Intersection::default();
        let mut best = f32::INFINITY;
        assert!(sphere.intersect(&ray, &mut best, &mut hit, 1e-4));
        assert!((best - 2.0).abs() < 1e-5);
        assert!(hit.reversed);
        assert!((hit.normal + Vec3::X).length() < 1e-5);
    }

    #[test]
    fn test_epsilon_skips_surface_at_origin() {
        let sphere = Sphere::new(Vec3::ZERO, 1.0);
        // Ray starts on the surface, heading outward.
        let ray = Ray::new(Vec3::X, Vec3::X);

        let mut hit = Intersection::default();
        let mut best = f32::INFINITY;
        assert!(!sphere.intersect(&ray, &mut best, &mut hit, 1e-3));
    }

    #[test]
    fn test_shadow_bounded_by_max_time() {
        let sphere = Sphere::new(Vec3::new(0.0, 0.0, 5.0), 1.0);
        let ray = Ray::new(Vec3::ZERO, Vec3::Z);

        let mut best = f32::INFINITY;
        assert!(!sphere.casts_shadow(&ray, &mut best, 1e-4, 3.5));
        assert!(sphere.casts_shadow(&ray, &mut best, 1e-4, 4.0));
        assert!((best - 4.0).abs() < 1e-4);
    }

    #[test]
    fn test_scaled_direction() {
        let sphere = Sphere::new(Vec3::ZERO, 1.0);
        let mut ray = Ray::default();
        ray.reset(Vec3::new(0.0, 0.0, -4.0), Vec3::new(0.0, 0.0, 0.5));

        let mut hit = Intersection::default();
        let mut best = f32::INFINITY;
        assert!(sphere.intersect(&ray, &mut best, &mut hit, 1e-4));
        // Surface at z = -1 is 3 units away, i.e. t = 6 at half speed.
        assert!((best - 6.0).abs() < 1e-4);
    }

    #[test]
    fn test_point_sphere_stays_finite() {
        let sphere = Sphere::new(Vec3::new(0.0, 0.0, -3.0), 0.0);
        let ray = Ray::new(Vec3::ZERO, -Vec3::Z);
        let mut hit = Intersection::default();
        let mut best = f32::INFINITY;

        assert!(sphere.intersect(&ray, &mut best, &mut hit, 1e-4));
        assert!((best - 3.0).abs() < 1e-5);
        assert!(hit.normal.is_finite());
        assert!(sphere.uv(hit.local).is_finite());
    }

    #[test]
    fn test_uv_range() {
        let sphere = Sphere::new(Vec3::ZERO, 1.0);
        for p in [Vec3::X, Vec3::Y, -Vec3::Y, Vec3::Z, -Vec3::Z] {
            let uv = sphere.uv(p);
            assert!((0.0..=1.0).contains(&uv.x));
            assert!((0.0..=1.0).contains(&uv.y));
        }
        assert!((sphere.uv(Vec3::Y).y - 1.0).abs() < 1e-5);
    }
}
