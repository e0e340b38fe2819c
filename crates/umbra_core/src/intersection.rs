//! Intersection record filled in by successful ray/surface hits.

use umbra_math::Vec3;

use crate::actor::ActorId;

/// Result of the closest accepted hit so far.
///
/// Records are mutated in place by nested intersection calls and recycled
/// through scratch pools. A failed test leaves the record untouched, which is
/// what lets callers keep only the nearest hit without resetting anything.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intersection {
    /// Recursion depth of the ray that produced this hit.
    pub depth: u32,
    /// Hit position in the surface's own space.
    pub local: Vec3,
    /// Unit surface normal, facing against the incoming ray.
    pub normal: Vec3,
    /// The geometric actor that was hit.
    pub actor: Option<ActorId>,
    /// True when the surface was seen from behind and the normal was flipped.
    pub reversed: bool,
    /// Hit position in the space of whoever asked.
    pub world: Vec3,
}

impl Intersection {
    /// Store `outward` as the normal, flipped to face against `direction`.
    #[inline]
    pub fn set_face_normal(&mut self, direction: Vec3, outward: Vec3) {
        self.reversed = direction.dot(outward) > 0.0;
        self.normal = if self.reversed { -outward } else { outward };
    }

    /// Copy every field except `depth` from `other`.
    #[inline]
    pub fn copy_hit(&mut self, other: &Intersection) {
        self.local = other.local;
        self.normal = other.normal;
        self.actor = other.actor;
        self.reversed = other.reversed;
        self.world = other.world;
    }
}

impl Default for Intersection {
    fn default() -> Self {
        Self {
            depth: 0,
            local: Vec3::ZERO,
            normal: Vec3::Z,
            actor: None,
            reversed: false,
            world: Vec3::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_front_face_keeps_normal() {
        let mut hit = Intersection::default();
        hit.set_face_normal(-Vec3::Z, Vec3::Z);

        assert!(!hit.reversed);
        assert_eq!(hit.normal, Vec3::Z);
    }

    #[test]
    fn test_back_face_flips_normal() {
        let mut hit = Intersection::default();
        hit.set_face_normal(Vec3::Z, Vec3::Z);

        assert!(hit.reversed);
        assert_eq!(hit.normal, -Vec3::Z);
    }

    #[test]
    fn test_copy_hit_keeps_depth() {
        let mut target = Intersection { depth: 3, ..Default::default() };
        let source = Intersection {
            depth: 9,
            world: Vec3::ONE,
            reversed: true,
            ..Default::default()
        };
        target.copy_hit(&source);

        assert_eq!(target.depth, 3);
        assert_eq!(target.world, Vec3::ONE);
        assert!(target.reversed);
    }
}
