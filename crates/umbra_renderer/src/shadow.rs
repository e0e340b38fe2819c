//! Shadow detectors: is a light visible from a surface point?
//!
//! Both detectors trace a shadow ray from the world point back toward the
//! light and ask the scene whether anything blocks it within `max_time`.
//! [`CachingShadowDetector`] remembers the last occluder per light and tests
//! it directly before falling back to a full traversal. The memory lives in
//! the calling thread's scratch bundle, so concurrent workers never share it.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use umbra_core::{CachedOccluder, Probe, TraceResult};
use umbra_math::{Ray, Vec3};

/// Light visibility query.
pub trait ShadowDetector: Send + Sync {
    /// `incident` points from the light toward `world`; `max_time` is the
    /// distance to the light along it. Occluders at or beyond that distance
    /// do not count.
    fn is_visible(
        &self,
        world: Vec3,
        incident: Vec3,
        max_time: f32,
        cx: &mut Probe<'_>,
    ) -> TraceResult<bool>;
}

/// Full scene traversal on every query.
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicShadowDetector;

impl ShadowDetector for BasicShadowDetector {
    fn is_visible(
        &self,
        world: Vec3,
        incident: Vec3,
        max_time: f32,
        cx: &mut Probe<'_>,
    ) -> TraceResult<bool> {
        let mut time = cx.scratch.floats.borrow()?;
        let blocked = cx.with_ray(|cx, ray| {
            ray.reset(world, -incident);
            time = f32::INFINITY;
            let mut occluder = None;
            cx.casts_shadow_root(ray, &mut time, &mut occluder, max_time)
        });
        cx.scratch.floats.reuse(time)?;
        Ok(!blocked?)
    }
}

/// Remembers the last occluder for one light slot.
///
/// The cached world-to-local chain is computed when an occluder is first
/// recorded, so the detector assumes the scene does not move while a render
/// is running. Clearing the [`umbra_core::ThreadCache`] drops every entry.
#[derive(Debug, Default)]
pub struct CachingShadowDetector {
    light: usize,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl CachingShadowDetector {
    pub fn new(light: usize) -> Self {
        Self {
            light,
            ..Default::default()
        }
    }

    pub fn light(&self) -> usize {
        self.light
    }

    /// Queries answered by the cached occluder alone.
    pub fn cache_hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Queries that needed a full traversal.
    pub fn cache_misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Test the cached occluder's surface in its own space.
    fn recheck(
        &self,
        entry: &CachedOccluder,
        ray: &Ray,
        time: &mut f32,
        max_time: f32,
        cx: &mut Probe<'_>,
    ) -> TraceResult<bool> {
        let scene = cx.scene;
        let actor = scene.actor(entry.actor)?;
        let Some(surface) = actor.surface() else {
            return Ok(false);
        };
        if !actor.header().enabled {
            return Ok(false);
        }

        let epsilon = cx.epsilon(surface.kind());
        cx.with_ray(|_, local| {
            local.transform_from(&entry.world_to_local, ray);
            Ok(surface.casts_shadow(local, time, epsilon, max_time))
        })
    }
}

impl ShadowDetector for CachingShadowDetector {
    fn is_visible(
        &self,
        world: Vec3,
        incident: Vec3,
        max_time: f32,
        cx: &mut Probe<'_>,
    ) -> TraceResult<bool> {
        let mut time = cx.scratch.floats.borrow()?;
        let visible = cx.with_ray(|cx, ray| {
            ray.reset(world, -incident);

            let cached = cx.scratch.cached_occluder(self.light);
            if let Some(entry) = &cached {
                time = f32::INFINITY;
                if self.recheck(entry, ray, &mut time, max_time, cx)? {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    return Ok(false);
                }
            }
            self.misses.fetch_add(1, Ordering::Relaxed);

            time = f32::INFINITY;
            let mut occluder = None;
            let blocked = cx.casts_shadow_root(ray, &mut time, &mut occluder, max_time)?;

            match occluder.filter(|_| blocked) {
                Some(actor) if cached.map(|c| c.actor) != Some(actor) => {
                    let world_to_local = cx.scene.inverse_chain(actor)?;
                    log::trace!("Light {} occluder replaced by {:?}", self.light, actor);
                    cx.scratch.set_cached_occluder(
                        self.light,
                        Some(CachedOccluder {
                            actor,
                            world_to_local,
                        }),
                    );
                }
                Some(_) => {}
                None => cx.scratch.set_cached_occluder(self.light, None),
            }
            Ok(!blocked)
        });
        cx.scratch.floats.reuse(time)?;
        visible
    }
}

/// Which detector a renderer builds for each light.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ShadowStrategy {
    Basic,
    #[default]
    Caching,
}

impl ShadowStrategy {
    /// Detector for the light at slot `light`.
    pub fn detector(&self, light: usize) -> Box<dyn ShadowDetector> {
        match self {
            ShadowStrategy::Basic => Box::new(BasicShadowDetector),
            ShadowStrategy::Caching => Box::new(CachingShadowDetector::new(light)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    use umbra_core::{Intersection, PoolConfig, Scene, ScratchBundle, Surface};
    use umbra_math::{Aabb, Quat, Vec2};

    use crate::plane::Plane;
    use crate::sphere::Sphere;

    /// Wraps a surface and counts how often traversal reaches it.
    struct Counted<S> {
        inner: S,
        calls: Arc<AtomicUsize>,
    }

    impl<S: Surface> Surface for Counted<S> {
        fn kind(&self) -> &'static str {
            self.inner.kind()
        }

        fn intersect(&self, ray: &Ray, best: &mut f32, hit: &mut Intersection, epsilon: f32) -> bool {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.intersect(ray, best, hit, epsilon)
        }

        fn casts_shadow(&self, ray: &Ray, best: &mut f32, epsilon: f32, max_time: f32) -> bool {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.casts_shadow(ray, best, epsilon, max_time)
        }

        fn bounds(&self) -> Option<Aabb> {
            self.inner.bounds()
        }

        fn uv(&self, local: Vec3) -> Vec2 {
            self.inner.uv(local)
        }
    }

    fn counted<S>(inner: S) -> (Counted<S>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Counted {
                inner,
                calls: calls.clone(),
            },
            calls,
        )
    }

    /// Light at y = 10 above the origin; a blocker sphere at y = 5 inside a
    /// translated group, plus a bystander plane that never blocks.
    fn blocked_scene() -> (Scene, Arc<AtomicUsize>, Arc<AtomicUsize>) {
        let mut scene = Scene::new("root");
        let root = scene.root();

        let (bystander, bystander_calls) = counted(Plane::new(Vec3::new(0.0, -50.0, 0.0), Vec3::Y));
        scene.add_geometric(root, "bystander", bystander).unwrap();

        let group = scene.add_group(root, "lifted").unwrap();
        scene.header_mut(group).unwrap().set_translation(Vec3::new(0.0, 4.0, 0.0));
        let (blocker, blocker_calls) = counted(Sphere::new(Vec3::new(0.0, 1.0, 0.0), 1.0));
        scene.add_geometric(group, "blocker", blocker).unwrap();

        scene.prepare().unwrap();
        (scene, bystander_calls, blocker_calls)
    }

    fn bundle() -> ScratchBundle {
        ScratchBundle::seeded(&PoolConfig::default(), 1)
    }

    const LIGHT: Vec3 = Vec3::new(0.0, 10.0, 0.0);

    fn query(detector: &dyn ShadowDetector, scene: &Scene, scratch: &mut ScratchBundle, from: Vec3) -> bool {
        let to_point = from - LIGHT;
        let distance = to_point.length();
        let mut cx = Probe::new(scene, scratch);
        detector
            .is_visible(from, to_point / distance, distance, &mut cx)
            .unwrap()
    }

    #[test]
    fn test_basic_detector_blocked_and_clear() {
        let (scene, _, _) = blocked_scene();
        let mut scratch = bundle();

        assert!(!query(&BasicShadowDetector, &scene, &mut scratch, Vec3::ZERO));
        assert!(query(&BasicShadowDetector, &scene, &mut scratch, Vec3::new(8.0, 0.0, 0.0)));
        assert!(scratch.is_balanced());
    }

    #[test]
    fn test_occluder_beyond_light_does_not_block() {
        let (scene, _, _) = blocked_scene();
        let mut scratch = bundle();
        let mut cx = Probe::new(&scene, &mut scratch);

        // Light sits between the point and the blocker.
        let world = Vec3::ZERO;
        let incident = -Vec3::Y;
        assert!(BasicShadowDetector.is_visible(world, incident, 2.0, &mut cx).unwrap());
    }

    #[test]
    fn test_caching_skips_traversal_on_repeat() {
        let (scene, bystander_calls, blocker_calls) = blocked_scene();
        let mut scratch = bundle();
        let detector = CachingShadowDetector::new(0);

        assert!(!query(&detector, &scene, &mut scratch, Vec3::ZERO));
        assert_eq!(detector.cache_misses(), 1);
        let cached = scratch.cached_occluder(0).unwrap();
        assert_eq!(Some(cached.actor), scene.find("blocker"));
        let bystander_after_first = bystander_calls.load(Ordering::SeqCst);
        assert_eq!(bystander_after_first, 1);

        // A nearby point, still shadowed by the same sphere.
        assert!(!query(&detector, &scene, &mut scratch, Vec3::new(0.1, 0.0, 0.0)));
        assert_eq!(detector.cache_hits(), 1);
        assert_eq!(bystander_calls.load(Ordering::SeqCst), bystander_after_first);
        assert_eq!(blocker_calls.load(Ordering::SeqCst), 2);
        assert!(scratch.is_balanced());
    }

    #[test]
    fn test_caching_agrees_with_basic() {
        let (scene, _, _) = blocked_scene();
        let mut basic_scratch = bundle();
        let mut caching_scratch = bundle();
        let detector = CachingShadowDetector::new(3);

        for i in -20..=20 {
            let from = Vec3::new(i as f32 * 0.25, 0.0, 0.1 * i as f32);
            assert_eq!(
                query(&BasicShadowDetector, &scene, &mut basic_scratch, from),
                query(&detector, &scene, &mut caching_scratch, from),
                "disagreement at {from:?}"
            );
        }
        assert!(detector.cache_hits() > 0);
    }

    #[test]
    fn test_cache_cleared_when_light_visible() {
        let (scene, _, _) = blocked_scene();
        let mut scratch = bundle();
        let detector = CachingShadowDetector::new(0);

        query(&detector, &scene, &mut scratch, Vec3::ZERO);
        assert!(scratch.cached_occluder(0).is_some());

        assert!(query(&detector, &scene, &mut scratch, Vec3::new(8.0, 0.0, 0.0)));
        assert!(scratch.cached_occluder(0).is_none());
    }

    #[test]
    fn test_cached_chain_honors_rotation() {
        let mut scene = Scene::new("root");
        let root = scene.root();
        let group = scene.add_group(root, "turned").unwrap();
        {
            let header = scene.header_mut(group).unwrap();
            header.set_translation(Vec3::new(0.0, 5.0, 0.0));
            header.set_rotation(Quat::from_rotation_z(std::f32::consts::FRAC_PI_2));
        }
        // Local +X maps to world +Y after the quarter turn.
        scene
            .add_geometric(group, "disc", Sphere::new(Vec3::new(0.5, 0.0, 0.0), 0.75))
            .unwrap();
        scene.prepare().unwrap();

        let mut scratch = bundle();
        let detector = CachingShadowDetector::new(0);
        assert!(!query(&detector, &scene, &mut scratch, Vec3::ZERO));
        assert!(!query(&detector, &scene, &mut scratch, Vec3::new(0.05, 0.0, 0.0)));
        assert_eq!(detector.cache_hits(), 1);
    }

    #[test]
    fn test_strategy_serde() {
        let strategy: ShadowStrategy = serde_json::from_str("\"basic\"").unwrap();
        assert_eq!(strategy, ShadowStrategy::Basic);
        assert_eq!(ShadowStrategy::default(), ShadowStrategy::Caching);
    }
}
