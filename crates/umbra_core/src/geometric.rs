//! Leaf scene-graph node wrapping one surface.

use umbra_math::Ray;

use crate::actor::{Actor, ActorHeader, ActorId, Surface};
use crate::error::TraceResult;
use crate::intersection::Intersection;
use crate::probe::Probe;

/// An actor that owns exactly one [`Surface`] and stamps itself into the
/// record on a hit.
///
/// A non-identity transform is honored the same way a group does it; with the
/// identity transform the surface sees the incoming ray directly.
pub struct Geometric {
    header: ActorHeader,
    surface: Box<dyn Surface>,
}

impl Geometric {
    pub(crate) fn new(header: ActorHeader, surface: Box<dyn Surface>) -> Self {
        Self { header, surface }
    }
}

impl Actor for Geometric {
    fn header(&self) -> &ActorHeader {
        &self.header
    }

    fn header_mut(&mut self) -> &mut ActorHeader {
        &mut self.header
    }

    fn intersect(
        &self,
        ray: &Ray,
        best: &mut f32,
        hit: &mut Intersection,
        cx: &mut Probe<'_>,
    ) -> TraceResult<bool> {
        if !self.header.enabled || !self.header.admits(ray, *best) {
            return Ok(false);
        }

        let epsilon = cx.epsilon(self.surface.kind());
        let motion = &self.header.motion;

        let found = if motion.is_identity() {
            self.surface.intersect(ray, best, hit, epsilon)
        } else {
            cx.with_ray(|_, local_ray| {
                local_ray.transform_from(motion.inverse(), ray);
                let found = self.surface.intersect(local_ray, best, hit, epsilon);
                if found {
                    hit.world = ray.at(*best);
                    hit.normal = motion.normal_to_parent(hit.normal);
                }
                Ok(found)
            })?
        };

        if found {
            hit.actor = Some(self.header.id());
        }
        Ok(found)
    }

    fn casts_shadow(
        &self,
        ray: &Ray,
        best: &mut f32,
        occluder: &mut Option<ActorId>,
        cx: &mut Probe<'_>,
        max_time: f32,
    ) -> TraceResult<bool> {
        if !self.header.enabled || !self.header.admits(ray, best.min(max_time)) {
            return Ok(false);
        }

        let epsilon = cx.epsilon(self.surface.kind());
        let motion = &self.header.motion;

        let found = if motion.is_identity() {
            self.surface.casts_shadow(ray, best, epsilon, max_time)
        } else {
            cx.with_ray(|_, local_ray| {
                local_ray.transform_from(motion.inverse(), ray);
                Ok(self.surface.casts_shadow(local_ray, best, epsilon, max_time))
            })?
        };

        if found {
            *occluder = Some(self.header.id());
        }
        Ok(found)
    }

    fn surface(&self) -> Option<&dyn Surface> {
        Some(self.surface.as_ref())
    }
}
