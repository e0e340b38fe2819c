use crate::{Mat4, Vec3};

/// Reciprocal that never divides by zero.
///
/// Axis-parallel rays produce a zero direction component; the slab test wants a
/// huge-but-finite reciprocal with the right sign instead of an infinity.
#[inline]
pub fn safe_inverse(x: f32) -> f32 {
    if x.abs() <= f32::EPSILON {
        if x.is_sign_negative() {
            -1.0 / f32::EPSILON
        } else {
            1.0 / f32::EPSILON
        }
    } else {
        1.0 / x
    }
}

/// A ray in 3D space.
///
/// Rays built with [`Ray::new`] carry a unit-length direction. Rays carried
/// into an actor's local space with [`Ray::transform_from`] keep the
/// transformed direction as-is, so a parametric hit time means the same point
/// in both spaces.
///
/// Scratch rays are recycled through pools: the fields are rewritten in place
/// with [`Ray::reset`] rather than building a new value.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
    /// Per-component reciprocal of `direction`, used by box tests.
    pub inv_direction: Vec3,
}

impl Ray {
    /// Create a ray with a normalized direction.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        let mut ray = Self::default();
        ray.reset(origin, direction.normalize_or_zero());
        ray
    }

    /// Overwrite this ray in place. `direction` is stored as given.
    #[inline]
    pub fn reset(&mut self, origin: Vec3, direction: Vec3) {
        self.origin = origin;
        self.direction = direction;
        self.inv_direction = Vec3::new(
            safe_inverse(direction.x),
            safe_inverse(direction.y),
            safe_inverse(direction.z),
        );
    }

    /// Overwrite this ray with `source` mapped through `matrix`.
    ///
    /// The direction is not renormalized.
    #[inline]
    pub fn transform_from(&mut self, matrix: &Mat4, source: &Ray) {
        let origin = matrix.transform_point3(source.origin);
        let direction = matrix.transform_vector3(source.direction);
        self.reset(origin, direction);
    }

    /// Get the origin point of the ray.
    #[inline]
    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    /// Get the direction vector of the ray.
    #[inline]
    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    /// Get the point along the ray at parameter t.
    ///
    /// Returns: origin + t * direction
    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

impl Default for Ray {
    fn default() -> Self {
        Self {
            origin: Vec3::ZERO,
            direction: Vec3::Z,
            inv_direction: Vec3::new(1.0 / f32::EPSILON, 1.0 / f32::EPSILON, 1.0),
        }
    }
}
