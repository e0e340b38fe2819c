//! Interior scene-graph node.

use umbra_math::Ray;

use crate::actor::{Actor, ActorHeader, ActorId};
use crate::error::TraceResult;
use crate::intersection::Intersection;
use crate::probe::Probe;

/// An actor that owns an ordered list of children and a local transform.
///
/// Queries are forwarded to the children in the group's local space: the
/// incoming ray is carried through the cached inverse transform, and the
/// winning normal is carried back out.
pub struct Group {
    header: ActorHeader,
    children: Vec<ActorId>,
}

impl Group {
    pub(crate) fn new(header: ActorHeader) -> Self {
        Self {
            header,
            children: Vec::new(),
        }
    }
}

impl Actor for Group {
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
        if !self.header.enabled || self.children.is_empty() {
            return Ok(false);
        }
        if !self.header.admits(ray, *best) {
            return Ok(false);
        }

        let scene = cx.scene;
        let motion = &self.header.motion;

        cx.with_ray_and_hit(|cx, local_ray, local_hit| {
            local_ray.transform_from(motion.inverse(), ray);
            local_hit.depth = hit.depth;

            let mut group_best = *best;
            let mut found = false;
            for &child in &self.children {
                let actor = scene.actor(child)?;
                let mut t = group_best;
                // Children only report strictly closer hits, so on a tie the
                // earlier child keeps the record.
                if actor.intersect(local_ray, &mut t, local_hit, cx)? && t <= group_best {
                    group_best = t;
                    found = true;
                }
            }

            if found {
                hit.copy_hit(local_hit);
                hit.world = ray.at(group_best);
                hit.normal = motion.normal_to_parent(local_hit.normal);
                *best = group_best;
            }
            Ok(found)
        })
    }

    fn casts_shadow(
        &self,
        ray: &Ray,
        best: &mut f32,
        occluder: &mut Option<ActorId>,
        cx: &mut Probe<'_>,
        max_time: f32,
    ) -> TraceResult<bool> {
        if !self.header.enabled || self.children.is_empty() {
            return Ok(false);
        }
        if !self.header.admits(ray, best.min(max_time)) {
            return Ok(false);
        }

        let scene = cx.scene;
        let inverse = self.header.motion.inverse();

        cx.with_ray(|cx, local_ray| {
            local_ray.transform_from(inverse, ray);
            for &child in &self.children {
                let actor = scene.actor(child)?;
                if actor.casts_shadow(local_ray, best, occluder, cx, max_time)? {
                    return Ok(true);
                }
            }
            Ok(false)
        })
    }

    fn children(&self) -> &[ActorId] {
        &self.children
    }

    fn children_mut(&mut self) -> Option<&mut Vec<ActorId>> {
        Some(&mut self.children)
    }
}
