//! Traversal context threaded through every intersection call.

use umbra_math::Ray;

use crate::actor::ActorId;
use crate::epsilon::EpsilonTable;
use crate::error::TraceResult;
use crate::intersection::Intersection;
use crate::pool::Pool;
use crate::scene::Scene;
use crate::thread_cache::ScratchBundle;

/// The scene being traversed plus the calling thread's scratch bundle.
///
/// A default epsilon set with [`Probe::with_default_epsilon`] replaces the
/// scene table's default for this traversal; per-kind overrides still win.
///
/// Scratch values checked out through [`Probe::with_scratch`] and its
/// ray/record shorthands go back to their pools on every exit path,
/// including errors raised by the closure.
pub struct Probe<'a> {
    pub scene: &'a Scene,
    pub scratch: &'a mut ScratchBundle,
    default_epsilon: Option<f32>,
}

impl<'a> Probe<'a> {
    pub fn new(scene: &'a Scene, scratch: &'a mut ScratchBundle) -> Self {
        Self {
            scene,
            scratch,
            default_epsilon: None,
        }
    }

    pub fn with_default_epsilon(mut self, epsilon: f32) -> Self {
        self.default_epsilon = Some(epsilon);
        self
    }

    #[inline]
    pub fn epsilons(&self) -> &'a EpsilonTable {
        self.scene.epsilons()
    }

    /// Minimum valid hit time for a geometry kind.
    #[inline]
    pub fn epsilon(&self, kind: &str) -> f32 {
        let table = self.scene.epsilons();
        match self.default_epsilon {
            Some(fallback) => table.get_or(kind, fallback),
            None => table.get(kind),
        }
    }

    /// Closest hit for a world-space ray, starting at the scene root.
    pub fn intersect_root(
        &mut self,
        ray: &Ray,
        best: &mut f32,
        hit: &mut Intersection,
    ) -> TraceResult<bool> {
        let scene = self.scene;
        scene.actor(scene.root())?.intersect(ray, best, hit, self)
    }

    /// Any occluder for a world-space shadow ray, starting at the scene root.
    pub fn casts_shadow_root(
        &mut self,
        ray: &Ray,
        best: &mut f32,
        occluder: &mut Option<ActorId>,
        max_time: f32,
    ) -> TraceResult<bool> {
        let scene = self.scene;
        scene
            .actor(scene.root())?
            .casts_shadow(ray, best, occluder, self, max_time)
    }

    /// Run `f` with one value checked out of the pool `pool` selects, e.g.
    /// `|s| &mut s.colors`.
    pub fn with_scratch<T, R>(
        &mut self,
        pool: fn(&mut ScratchBundle) -> &mut Pool<T>,
        f: impl FnOnce(&mut Self, &mut T) -> TraceResult<R>,
    ) -> TraceResult<R> {
        let mut value = pool(&mut *self.scratch).borrow()?;
        let out = f(self, &mut value);
        pool(&mut *self.scratch).reuse(value)?;
        out
    }

    /// Run `f` with a scratch ray checked out of the pool.
    pub fn with_ray<R>(
        &mut self,
        f: impl FnOnce(&mut Self, &mut Ray) -> TraceResult<R>,
    ) -> TraceResult<R> {
        self.with_scratch(|s| &mut s.rays, f)
    }

    /// Run `f` with a scratch ray and record checked out of their pools.
    pub fn with_ray_and_hit<R>(
        &mut self,
        f: impl FnOnce(&mut Self, &mut Ray, &mut Intersection) -> TraceResult<R>,
    ) -> TraceResult<R> {
        let mut ray = self.scratch.rays.borrow()?;
        let mut hit = match self.scratch.hits.borrow() {
            Ok(hit) => hit,
            Err(err) => {
                self.scratch.rays.reuse(ray)?;
                return Err(err.into());
            }
        };
        let out = f(self, &mut ray, &mut hit);
        self.scratch.reuse_ray_and_hit(ray, hit)?;
        out
    }
}
