//! Pinhole camera for primary ray generation.

use umbra_math::{Ray, Vec2, Vec3};

/// Pinhole camera. Build with the `with_*` methods, then call
/// [`Camera::initialize`] before generating rays.
#[derive(Debug, Clone)]
pub struct Camera {
    pub image_width: u32,
    pub image_height: u32,

    look_from: Vec3,
    look_at: Vec3,
    vup: Vec3,
    /// Vertical field of view in degrees
    vfov: f32,

    // Set by initialize()
    center: Vec3,
    pixel00_loc: Vec3,
    pixel_delta_u: Vec3,
    pixel_delta_v: Vec3,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

impl Camera {
    pub fn new() -> Self {
        Self {
            image_width: 320,
            image_height: 240,
            look_from: Vec3::ZERO,
            look_at: Vec3::new(0.0, 0.0, -1.0),
            vup: Vec3::Y,
            vfov: 90.0,
            center: Vec3::ZERO,
            pixel00_loc: Vec3::ZERO,
            pixel_delta_u: Vec3::ZERO,
            pixel_delta_v: Vec3::ZERO,
        }
    }

    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.image_width = width.max(1);
        self.image_height = height.max(1);
        self
    }

    pub fn with_position(mut self, look_from: Vec3, look_at: Vec3, vup: Vec3) -> Self {
        self.look_from = look_from;
        self.look_at = look_at;
        self.vup = vup;
        self
    }

    pub fn with_fov(mut self, vfov: f32) -> Self {
        self.vfov = vfov;
        self
    }

    /// Build-and-initialize shorthand.
    pub fn initialized(mut self) -> Self {
        self.initialize();
        self
    }

    /// Recompute the viewport basis (must be called before generating rays).
    pub fn initialize(&mut self) {
        self.center = self.look_from;

        let h = (self.vfov.to_radians() / 2.0).tan();
        let viewport_height = 2.0 * h;
        let viewport_width = viewport_height * (self.image_width as f32 / self.image_height as f32);

        let w = (self.look_from - self.look_at).normalize_or_zero();
        let u = self.vup.cross(w).normalize_or_zero();
        let v = w.cross(u);

        let viewport_u = viewport_width * u;
        let viewport_v = -viewport_height * v;

        self.pixel_delta_u = viewport_u / self.image_width as f32;
        self.pixel_delta_v = viewport_v / self.image_height as f32;

        let viewport_upper_left = self.center - w - viewport_u / 2.0 - viewport_v / 2.0;
        self.pixel00_loc = viewport_upper_left + 0.5 * (self.pixel_delta_u + self.pixel_delta_v);
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    /// Aim `ray` through pixel `(i, j)`. `offset` is in pixel units relative
    /// to the pixel center, `(0, 0)` for the center itself.
    pub fn aim(&self, i: u32, j: u32, offset: Vec2, ray: &mut Ray) {
        let target = self.pixel00_loc
            + (i as f32 + offset.x) * self.pixel_delta_u
            + (j as f32 + offset.y) * self.pixel_delta_v;
        ray.reset(self.center, (target - self.center).normalize_or_zero());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_pixel_looks_forward() {
        let camera = Camera::new().with_resolution(101, 101).initialized();
        let mut ray = Ray::default();
        camera.aim(50, 50, Vec2::ZERO, &mut ray);

        assert_eq!(ray.origin, Vec3::ZERO);
        assert!((ray.direction - Vec3::new(0.0, 0.0, -1.0)).length() < 1e-5);
    }

    #[test]
    fn test_top_left_points_up_and_left() {
        let camera = Camera::new().with_resolution(64, 48).initialized();
        let mut ray = Ray::default();
        camera.aim(0, 0, Vec2::ZERO, &mut ray);

        assert!(ray.direction.x < 0.0);
        assert!(ray.direction.y > 0.0);
        assert!((ray.direction.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_position_moves_origin() {
        let from = Vec3::new(0.0, 2.0, 5.0);
        let camera = Camera::new()
            .with_resolution(10, 10)
            .with_position(from, Vec3::ZERO, Vec3::Y)
            .with_fov(40.0)
            .initialized();
        let mut ray = Ray::default();
        camera.aim(5, 5, Vec2::new(-0.5, -0.5), &mut ray);

        assert_eq!(ray.origin, from);
        assert!((ray.direction - (-from).normalize()).length() < 1e-4);
    }
}
