use crate::{Interval, Ray, Vec3};

/// Axis-aligned bounding box used as a fast reject in front of exact tests.
///
/// An AABB is defined by three intervals (one per axis) that bound a 3D volume.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Aabb {
    pub x: Interval,
    pub y: Interval,
    pub z: Interval,
}

impl Aabb {
    /// Create an AABB from two corner points.
    pub fn from_points(a: Vec3, b: Vec3) -> Self {
        let x = Interval::new(a.x.min(b.x), a.x.max(b.x));
        let y = Interval::new(a.y.min(b.y), a.y.max(b.y));
        let z = Interval::new(a.z.min(b.z), a.z.max(b.z));

        let mut aabb = Self { x, y, z };
        aabb.pad_to_minimums();
        aabb
    }

    /// Box of half-extent `radius` around `center`.
    pub fn around(center: Vec3, radius: f32) -> Self {
        let r = Vec3::splat(radius.abs());
        Self::from_points(center - r, center + r)
    }

    /// Create an AABB that surrounds two other AABBs.
    pub fn surrounding(box0: &Aabb, box1: &Aabb) -> Self {
        Self {
            x: Interval::surrounding(&box0.x, &box1.x),
            y: Interval::surrounding(&box0.y, &box1.y),
            z: Interval::surrounding(&box0.z, &box1.z),
        }
    }

    pub fn min(&self) -> Vec3 {
        Vec3::new(self.x.min, self.y.min, self.z.min)
    }

    pub fn max(&self) -> Vec3 {
        Vec3::new(self.x.max, self.y.max, self.z.max)
    }

    /// Slab test against `ray` restricted to `ray_t`.
    ///
    /// Uses the ray's precomputed inverse direction, so no division happens here.
    pub fn hit(&self, ray: &Ray, ray_t: Interval) -> bool {
        let t0 = (self.min() - ray.origin) * ray.inv_direction;
        let t1 = (self.max() - ray.origin) * ray.inv_direction;

        let near = t0.min(t1).max_element().max(ray_t.min);
        let far = t0.max(t1).min_element().min(ray_t.max);

        near <= far
    }

    /// Returns true if `p` lies inside or on the box.
    pub fn contains(&self, p: Vec3) -> bool {
        self.x.contains(p.x) && self.y.contains(p.y) && self.z.contains(p.z)
    }

    /// Returns the center point of the bounding box.
    pub fn centroid(&self) -> Vec3 {
        (self.min() + self.max()) * 0.5
    }

    /// Pad intervals to avoid zero-width AABBs (degenerate cases).
    fn pad_to_minimums(&mut self) {
        let delta = 0.0001;
        if self.x.size() < delta {
            self.x = self.x.expand(delta);
        }
        if self.y.size() < delta {
            self.y = self.y.expand(delta);
        }
        if self.z.size() < delta {
            self.z = self.z.expand(delta);
        }
    }

    pub const EMPTY: Aabb = Aabb {
        x: Interval::EMPTY,
        y: Interval::EMPTY,
        z: Interval::EMPTY,
    };

    pub const UNIVERSE: Aabb = Aabb {
        x: Interval::UNIVERSE,
        y: Interval::UNIVERSE,
        z: Interval::UNIVERSE,
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box() -> Aabb {
        Aabb::from_points(Vec3::splat(-1.0), Vec3::splat(1.0))
    }

    #[test]
    fn test_aabb_hit() {
        let aabb = unit_box();

        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::Z);
        assert!(aabb.hit(&ray, Interval::new(0.0, 100.0)));

        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), -Vec3::Z);
        assert!(!aabb.hit(&ray, Interval::new(0.0, 100.0)));

        let ray = Ray::new(Vec3::new(10.0, 0.0, 0.0), Vec3::Z);
        assert!(!aabb.hit(&ray, Interval::new(0.0, 100.0)));
    }

    #[test]
    fn test_aabb_hit_respects_window() {
        let aabb = unit_box();
        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::Z);

        // Box spans t in [4, 6].
        assert!(!aabb.hit(&ray, Interval::new(0.0, 3.5)));
        assert!(aabb.hit(&ray, Interval::new(0.0, 4.5)));
        assert!(!aabb.hit(&ray, Interval::new(6.5, 10.0)));
    }

    #[test]
    fn test_aabb_hit_axis_parallel_ray() {
        let aabb = unit_box();
        // Direction has zero x and y; the safe inverse must keep this finite.
        let ray = Ray::new(Vec3::new(0.5, 0.5, 3.0), -Vec3::Z);
        assert!(aabb.hit(&ray, Interval::new(0.0, f32::INFINITY)));

        let ray = Ray::new(Vec3::new(1.5, 0.5, 3.0), -Vec3::Z);
        assert!(!aabb.hit(&ray, Interval::new(0.0, f32::INFINITY)));
    }

    #[test]
    fn test_aabb_origin_inside() {
        let ray = Ray::new(Vec3::ZERO, Vec3::new(1.0, 1.0, 0.0));
        assert!(unit_box().hit(&ray, Interval::new(0.0, f32::INFINITY)));
    }

    #[test]
    fn test_around_and_centroid() {
        let aabb = Aabb::around(Vec3::new(1.0, 2.0, 3.0), 0.5);

        assert_eq!(aabb.centroid(), Vec3::new(1.0, 2.0, 3.0));
        assert!(aabb.contains(Vec3::new(1.4, 2.0, 3.4)));
        assert!(!aabb.contains(Vec3::new(1.6, 2.0, 3.0)));
    }

    #[test]
    fn test_flat_box_is_padded() {
        let aabb = Aabb::from_points(Vec3::new(-1.0, 0.0, -1.0), Vec3::new(1.0, 0.0, 1.0));
        assert!(aabb.y.size() > 0.0);

        let ray = Ray::new(Vec3::new(0.0, 5.0, 0.0), -Vec3::Y);
        assert!(aabb.hit(&ray, Interval::new(0.0, 10.0)));
    }
}
