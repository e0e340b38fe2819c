//! Reference direct-lighting tracer.
//!
//! One primary ray per sample, Lambert shading against every point light,
//! each light gated by its own shadow detector. Surfaces are colored with a
//! flat albedo or a checker pattern over their UV.

use rand::Rng;
use umbra_core::{Intersection, Probe, Scene, ScratchBundle, TraceError, TraceResult};
use umbra_math::{Color, Vec2};

use crate::camera::Camera;
use crate::config::RenderConfig;
use crate::light::PointLight;
use crate::order::PixelCoord;
use crate::pipeline::Tracer;
use crate::shadow::{ShadowDetector, ShadowStrategy};

struct LightSlot {
    light: PointLight,
    detector: Box<dyn ShadowDetector>,
}

pub struct DirectTracer {
    camera: Camera,
    strategy: ShadowStrategy,
    lights: Vec<LightSlot>,
    samples: u32,
    /// Epsilon for surface kinds the scene has no override for.
    epsilon: f32,
    background: Color,
    ambient: Color,
    albedo: Color,
    /// Checker cells per UV unit; `None` for flat albedo.
    checker: Option<f32>,
}

impl DirectTracer {
    pub fn new(camera: Camera, config: &RenderConfig) -> Self {
        Self {
            camera,
            strategy: config.shadows,
            lights: Vec::new(),
            samples: config.samples_per_pixel.max(1),
            epsilon: config.epsilon,
            background: Color::new(0.05, 0.05, 0.08),
            ambient: Color::splat(0.05),
            albedo: Color::splat(0.8),
            checker: None,
        }
    }

    /// Add a light; it gets the next slot and a fresh detector.
    pub fn with_light(mut self, light: PointLight) -> Self {
        let slot = self.lights.len();
        self.lights.push(LightSlot {
            light,
            detector: self.strategy.detector(slot),
        });
        self
    }

    pub fn with_background(mut self, background: Color) -> Self {
        self.background = background;
        self
    }

    pub fn with_ambient(mut self, ambient: Color) -> Self {
        self.ambient = ambient;
        self
    }

    pub fn with_albedo(mut self, albedo: Color) -> Self {
        self.albedo = albedo;
        self
    }

    pub fn with_checker(mut self, cells: f32) -> Self {
        self.checker = Some(cells);
        self
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn lights(&self) -> impl Iterator<Item = &PointLight> {
        self.lights.iter().map(|slot| &slot.light)
    }

    fn albedo_at(&self, uv: Vec2) -> Color {
        match self.checker {
            Some(cells) => {
                let cell = (uv * cells).floor();
                if (cell.x + cell.y) as i64 % 2 == 0 {
                    self.albedo
                } else {
                    self.albedo * 0.25
                }
            }
            None => self.albedo,
        }
    }

    fn sample(&self, cx: &mut Probe<'_>, coord: PixelCoord, offset: Vec2) -> TraceResult<Color> {
        cx.with_ray_and_hit(|cx, ray, hit| {
            self.camera.aim(coord.x, coord.y, offset, ray);
            hit.depth = 0;
            let mut best = f32::INFINITY;
            if !cx.intersect_root(ray, &mut best, hit)? {
                return Ok(self.background);
            }
            self.shade(cx, hit)
        })
    }

    fn shade(&self, cx: &mut Probe<'_>, hit: &Intersection) -> TraceResult<Color> {
        let id = hit
            .actor
            .ok_or_else(|| TraceError::Shading("hit record carries no actor".into()))?;
        let scene = cx.scene;
        let surface = scene.actor(id)?.surface();

        let base = cx.with_scratch(|s| &mut s.uvs, |_, uv| {
            *uv = surface.map_or(Vec2::ZERO, |s| s.uv(hit.local));
            Ok(self.albedo_at(*uv))
        })?;

        cx.with_scratch(|s| &mut s.colors, |cx, irradiance| {
            *irradiance = self.ambient;
            for slot in &self.lights {
                let Some(incidence) = slot.light.incidence(hit.world) else {
                    continue;
                };
                let lit = cx.with_scratch(|s| &mut s.vectors, |cx, to_light| {
                    *to_light = -incidence.incident;
                    let cosine = hit.normal.dot(*to_light);
                    if cosine <= 0.0 {
                        return Ok(Color::ZERO);
                    }
                    let visible = slot.detector.is_visible(
                        hit.world,
                        incidence.incident,
                        incidence.distance,
                        cx,
                    )?;
                    Ok(if visible {
                        slot.light.radiance(incidence.distance) * cosine
                    } else {
                        Color::ZERO
                    })
                })?;
                *irradiance += lit;
            }
            Ok(base * *irradiance)
        })
    }
}

impl Tracer for DirectTracer {
    fn trace(&self, scene: &Scene, coord: PixelCoord, scratch: &mut ScratchBundle) -> TraceResult<Color> {
        let mut cx = Probe::new(scene, scratch).with_default_epsilon(self.epsilon);
        if self.samples == 1 {
            return self.sample(&mut cx, coord, Vec2::ZERO);
        }

        cx.with_scratch(|s| &mut s.colors, |cx, sum| {
            *sum = Color::ZERO;
            for _ in 0..self.samples {
                let jitter = Vec2::new(
                    cx.scratch.rng.gen::<f32>() - 0.5,
                    cx.scratch.rng.gen::<f32>() - 0.5,
                );
                *sum += self.sample(cx, coord, jitter)?;
            }
            Ok(*sum / self.samples as f32)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use umbra_core::PoolConfig;
    use umbra_math::Vec3;

    use crate::plane::Plane;
    use crate::sphere::Sphere;

    /// Camera at z = 5 looking at a unit sphere resting on a ground plane,
    /// light straight above.
    fn setup(config: &RenderConfig) -> (Scene, DirectTracer) {
        let mut scene = Scene::new("root");
        let root = scene.root();
        scene.add_geometric(root, "ground", Plane::ground(-1.0)).unwrap();
        scene.add_geometric(root, "ball", Sphere::new(Vec3::ZERO, 1.0)).unwrap();
        scene.prepare().unwrap();

        let camera = Camera::new()
            .with_resolution(21, 21)
            .with_position(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y)
            .with_fov(60.0)
            .initialized();
        let tracer = DirectTracer::new(camera, config)
            .with_light(PointLight::white(Vec3::new(0.0, 6.0, 0.0), 40.0));
        (scene, tracer)
    }

    fn scratch() -> ScratchBundle {
        ScratchBundle::seeded(&PoolConfig::default(), 9)
    }

    #[test]
    fn test_background_on_miss() {
        let config = RenderConfig::default();
        let (scene, tracer) = setup(&config);
        let tracer = tracer.with_background(Color::new(0.1, 0.2, 0.3));
        let mut scratch = scratch();

        // Top-left corner looks over the ball and above the horizon.
        let color = tracer.trace(&scene, PixelCoord::new(0, 0), &mut scratch).unwrap();
        assert_eq!(color, Color::new(0.1, 0.2, 0.3));
        assert!(scratch.is_balanced());
    }

    #[test]
    fn test_lit_sphere_brighter_than_ambient() {
        let config = RenderConfig::default();
        let (scene, tracer) = setup(&config);
        let mut scratch = scratch();

        // Just above the center of the ball, facing the light.
        let color = tracer.trace(&scene, PixelCoord::new(10, 8), &mut scratch).unwrap();
        assert!(color.x > 0.05 * 0.8 * 2.0, "got {color:?}");
        assert!(scratch.is_balanced());
    }

    #[test]
    fn test_ground_under_ball_is_shadowed() {
        for shadows in [ShadowStrategy::Basic, ShadowStrategy::Caching] {
            let config = RenderConfig::default().with_shadows(shadows);
            let (scene, tracer) = setup(&config);
            let mut scratch = scratch();
            let mut cx = Probe::new(&scene, &mut scratch);

            let mut hit = Intersection::default();
            hit.actor = scene.find("ground");
            hit.world = Vec3::new(0.0, -1.0, 0.0);
            hit.local = hit.world;
            hit.normal = Vec3::Y;

            let color = tracer.shade(&mut cx, &hit).unwrap();
            let ambient_only = Color::splat(0.05) * 0.8;
            assert!((color - ambient_only).length() < 1e-5, "{shadows:?}: {color:?}");
        }
    }

    #[test]
    fn test_configured_epsilon_gates_hits() {
        let background = Color::new(0.1, 0.2, 0.3);
        // The center ray enters the ball at t = 4 and leaves at t = 6.
        let center = PixelCoord::new(10, 10);

        let config = RenderConfig::default().with_epsilon(3.5);
        let (scene, tracer) = setup(&config);
        let color = tracer.with_background(background).trace(&scene, center, &mut scratch()).unwrap();
        assert_ne!(color, background);

        let config = RenderConfig::default().with_epsilon(6.5);
        let (scene, tracer) = setup(&config);
        let color = tracer.with_background(background).trace(&scene, center, &mut scratch()).unwrap();
        assert_eq!(color, background);
    }

    #[test]
    fn test_multisample_is_reproducible() {
        let config = RenderConfig::default().with_samples(4);
        let (scene, tracer) = setup(&config);

        let a = tracer.trace(&scene, PixelCoord::new(10, 10), &mut scratch()).unwrap();
        let b = tracer.trace(&scene, PixelCoord::new(10, 10), &mut scratch()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_checker_alternates() {
        let tracer = DirectTracer::new(Camera::new(), &RenderConfig::default()).with_checker(2.0);
        assert_eq!(tracer.albedo_at(Vec2::new(0.1, 0.1)), Color::splat(0.8));
        assert_eq!(tracer.albedo_at(Vec2::new(0.6, 0.1)), Color::splat(0.2));
    }

    #[test]
    fn test_missing_actor_is_shading_error() {
        let config = RenderConfig::default();
        let (scene, tracer) = setup(&config);
        let mut scratch = scratch();
        let mut cx = Probe::new(&scene, &mut scratch);

        let err = tracer.shade(&mut cx, &Intersection::default()).unwrap_err();
        assert!(matches!(err, TraceError::Shading(_)));
    }
}
