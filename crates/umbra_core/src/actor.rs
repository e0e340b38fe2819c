//! Actors: the nodes of the scene graph.
//!
//! Every actor carries an [`ActorHeader`] (name, enable flag, optional
//! bounding volume, parent back-reference and local transform) and implements
//! the two traversal queries of the [`Actor`] trait. The concrete kinds are
//! [`Group`](crate::Group) and [`Geometric`](crate::Geometric); the shapes a
//! geometric actor wraps come from downstream crates through [`Surface`].

use slotmap::new_key_type;
use umbra_math::{compose_trs, Aabb, Interval, Mat4, Mat4Ext, Quat, Ray, Vec2, Vec3};

use crate::error::{SceneError, SceneResult, TraceResult};
use crate::intersection::Intersection;
use crate::probe::Probe;

new_key_type! {
    /// Handle to an actor stored in a [`Scene`](crate::Scene).
    pub struct ActorId;
}

/// Local transform kept as rotation/scale/translation plus cached matrices.
///
/// Changing a component does not refresh the cache; call
/// [`Motion::update`] (or [`ActorHeader::update_transform`]) before the next
/// traversal.
#[derive(Debug, Clone, PartialEq)]
pub struct Motion {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
    matrix: Mat4,
    inverse: Mat4,
    identity: bool,
}

impl Motion {
    /// Recompute the cached matrix and inverse.
    ///
    /// Returns false (and leaves the cache alone) if the composed matrix is
    /// singular.
    pub fn update(&mut self) -> bool {
        let matrix = compose_trs(self.translation, self.rotation, self.scale);
        if !matrix.is_invertible() {
            return false;
        }
        self.matrix = matrix;
        self.inverse = matrix.inverse();
        self.identity = matrix.abs_diff_eq(Mat4::IDENTITY, 1.0e-7);
        true
    }

    /// Local-to-parent matrix.
    #[inline]
    pub fn matrix(&self) -> &Mat4 {
        &self.matrix
    }

    /// Parent-to-local matrix.
    #[inline]
    pub fn inverse(&self) -> &Mat4 {
        &self.inverse
    }

    #[inline]
    pub fn is_identity(&self) -> bool {
        self.identity
    }

    /// Map a local-space normal into the parent's space and renormalize.
    #[inline]
    pub fn normal_to_parent(&self, normal: Vec3) -> Vec3 {
        self.inverse.transform_normal3(normal).normalize_or_zero()
    }
}

impl Default for Motion {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            matrix: Mat4::IDENTITY,
            inverse: Mat4::IDENTITY,
            identity: true,
        }
    }
}

/// State shared by every actor kind.
#[derive(Debug, Clone)]
pub struct ActorHeader {
    id: ActorId,
    name: String,
    pub enabled: bool,
    /// Fast-reject volume in the parent's space.
    pub bounds: Option<Aabb>,
    /// Volume of the actor's contents in its own space.
    content: Option<Aabb>,
    parent: Option<ActorId>,
    pub motion: Motion,
}

impl ActorHeader {
    pub(crate) fn new(id: ActorId, name: String, parent: Option<ActorId>) -> Self {
        Self {
            id,
            name,
            enabled: true,
            bounds: None,
            content: None,
            parent,
            motion: Motion::default(),
        }
    }

    #[inline]
    pub fn id(&self) -> ActorId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Non-owning link to the enclosing group.
    #[inline]
    pub fn parent(&self) -> Option<ActorId> {
        self.parent
    }

    pub fn enable(&mut self) {
        self.enabled = true;
    }

    /// A disabled actor is skipped by every query.
    pub fn disable(&mut self) {
        self.enabled = false;
    }

    /// Set the volume of the actor's contents, in its own space.
    ///
    /// The fast-reject volume is that box carried through the current
    /// transform. `Scene::refresh_bounds` recomputes it from the contents.
    pub fn set_bounds(&mut self, content: Option<Aabb>) {
        self.content = content;
        self.refit();
    }

    /// Contents volume in the actor's own space.
    #[inline]
    pub fn content_bounds(&self) -> Option<Aabb> {
        self.content
    }

    fn refit(&mut self) {
        self.bounds = self.content.map(|b| self.motion.matrix().transform_aabb(&b));
    }

    pub fn set_translation(&mut self, translation: Vec3) {
        self.motion.translation = translation;
    }

    pub fn set_rotation(&mut self, rotation: Quat) {
        self.motion.rotation = rotation;
    }

    pub fn set_scale(&mut self, scale: Vec3) {
        self.motion.scale = scale;
    }

    /// Recompute the cached inverse after a motion change, and carry the
    /// contents volume through the new transform.
    ///
    /// Enclosing groups keep their old volume; [`Scene::update_transform`]
    /// refits them as well.
    ///
    /// [`Scene::update_transform`]: crate::Scene::update_transform
    pub fn update_transform(&mut self) -> SceneResult<()> {
        if self.motion.update() {
            self.refit();
            Ok(())
        } else {
            Err(SceneError::DegenerateTransform(self.name.clone()))
        }
    }

    /// Bounding-volume fast reject. Actors without bounds always pass.
    #[inline]
    pub fn admits(&self, ray: &Ray, max_time: f32) -> bool {
        match &self.bounds {
            Some(bounds) => bounds.hit(ray, Interval::new(0.0, max_time)),
            None => true,
        }
    }
}

/// The traversal contract implemented by every scene node.
pub trait Actor: Send + Sync {
    fn header(&self) -> &ActorHeader;

    fn header_mut(&mut self) -> &mut ActorHeader;

    /// Closest-hit query.
    ///
    /// On success the hit time is strictly below `*best` and above the
    /// geometry kind's epsilon; `hit` and `best` are updated. On failure both
    /// are left untouched.
    fn intersect(
        &self,
        ray: &Ray,
        best: &mut f32,
        hit: &mut Intersection,
        cx: &mut Probe<'_>,
    ) -> TraceResult<bool>;

    /// Any-hit query for shadow rays, bounded to `time <= max_time`.
    ///
    /// Writes the occluding actor into `occluder` on success.
    fn casts_shadow(
        &self,
        ray: &Ray,
        best: &mut f32,
        occluder: &mut Option<ActorId>,
        cx: &mut Probe<'_>,
        max_time: f32,
    ) -> TraceResult<bool>;

    /// Child actors, in registration order.
    fn children(&self) -> &[ActorId] {
        &[]
    }

    /// Mutable child list, for actors that can own children.
    fn children_mut(&mut self) -> Option<&mut Vec<ActorId>> {
        None
    }

    /// The wrapped surface, for geometric actors.
    fn surface(&self) -> Option<&dyn Surface> {
        None
    }
}

/// A concrete shape, positioned in its geometric actor's local space.
///
/// Implementations must honor the intersection protocol: accept only hits
/// with `epsilon < t < *best`, and leave `hit`/`best` alone on a miss.
pub trait Surface: Send + Sync {
    /// Geometry-kind identifier used for epsilon lookups.
    fn kind(&self) -> &'static str;

    fn intersect(&self, ray: &Ray, best: &mut f32, hit: &mut Intersection, epsilon: f32) -> bool;

    /// Shadow test, accepting hits with `epsilon < t < *best` and `t <= max_time`.
    fn casts_shadow(&self, ray: &Ray, best: &mut f32, epsilon: f32, max_time: f32) -> bool {
        let mut t = *best;
        let mut probe = Intersection::default();
        if self.intersect(ray, &mut t, &mut probe, epsilon) && t <= max_time {
            *best = t;
            true
        } else {
            false
        }
    }

    /// Local-space bounds, if the surface is finite.
    fn bounds(&self) -> Option<Aabb> {
        None
    }

    /// Texture coordinates of a local-space point on the surface.
    fn uv(&self, _local: Vec3) -> Vec2 {
        Vec2::ZERO
    }
}
