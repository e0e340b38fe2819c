//! Point lights.

use umbra_math::{Color, Vec3};

/// Isotropic point light with inverse-square falloff.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    pub position: Vec3,
    pub color: Color,
    pub intensity: f32,
}

/// Direction and distance from a light to a surface point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Incidence {
    /// Unit vector from the light toward the point.
    pub incident: Vec3,
    pub distance: f32,
}

impl PointLight {
    pub fn new(position: Vec3, color: Color, intensity: f32) -> Self {
        Self {
            position,
            color,
            intensity,
        }
    }

    pub fn white(position: Vec3, intensity: f32) -> Self {
        Self::new(position, Color::ONE, intensity)
    }

    /// `None` when the point sits on the light.
    pub fn incidence(&self, world: Vec3) -> Option<Incidence> {
        let to_point = world - self.position;
        let distance = to_point.length();
        (distance > f32::EPSILON).then(|| Incidence {
            incident: to_point / distance,
            distance,
        })
    }

    /// Radiance arriving at `distance`.
    pub fn radiance(&self, distance: f32) -> Color {
        self.color * (self.intensity / (distance * distance).max(1e-6))
    }
}
