//! The scene graph: an arena of actors rooted at one group.
//!
//! Actors live in a slot map keyed by [`ActorId`]. Groups hold child ids and
//! every actor holds its parent's id, so the back-reference never owns
//! anything.

use std::collections::HashMap;

use slotmap::SlotMap;
use umbra_math::{Aabb, Mat4, Ray};

use crate::actor::{Actor, ActorHeader, ActorId, Surface};
use crate::epsilon::EpsilonTable;
use crate::error::{SceneError, SceneResult, TraceResult};
use crate::geometric::Geometric;
use crate::group::Group;
use crate::intersection::Intersection;
use crate::probe::Probe;
use crate::thread_cache::ScratchBundle;

pub struct Scene {
    name: String,
    actors: SlotMap<ActorId, Box<dyn Actor>>,
    names: HashMap<String, ActorId>,
    root: ActorId,
    epsilons: EpsilonTable,
}

impl Scene {
    /// Create a scene holding a single empty root group.
    pub fn new(root_name: impl Into<String>) -> Self {
        let name: String = root_name.into();
        let mut actors: SlotMap<ActorId, Box<dyn Actor>> = SlotMap::with_key();
        let root = actors.insert_with_key(|id| {
            Box::new(Group::new(ActorHeader::new(id, name.clone(), None))) as Box<dyn Actor>
        });
        let mut names = HashMap::new();
        names.insert(name.clone(), root);

        Self {
            name,
            actors,
            names,
            root,
            epsilons: EpsilonTable::default(),
        }
    }

    pub fn with_epsilons(mut self, epsilons: EpsilonTable) -> Self {
        self.epsilons = epsilons;
        self
    }

    pub fn set_epsilons(&mut self, epsilons: EpsilonTable) {
        self.epsilons = epsilons;
    }

    #[inline]
    pub fn epsilons(&self) -> &EpsilonTable {
        &self.epsilons
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn root(&self) -> ActorId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.actors.len()
    }

    /// True when the root group has no children.
    pub fn is_empty(&self) -> bool {
        self.actors.len() == 1
    }

    /// Add an empty group under `parent`.
    pub fn add_group(&mut self, parent: ActorId, name: impl Into<String>) -> SceneResult<ActorId> {
        self.insert(parent, name.into(), |header| Box::new(Group::new(header)))
    }

    /// Add a geometric actor wrapping `surface` under `parent`.
    pub fn add_geometric<S: Surface + 'static>(
        &mut self,
        parent: ActorId,
        name: impl Into<String>,
        surface: S,
    ) -> SceneResult<ActorId> {
        let bounds = surface.bounds();
        self.insert(parent, name.into(), move |mut header| {
            header.set_bounds(bounds);
            Box::new(Geometric::new(header, Box::new(surface)))
        })
    }

    fn insert(
        &mut self,
        parent: ActorId,
        name: String,
        build: impl FnOnce(ActorHeader) -> Box<dyn Actor>,
    ) -> SceneResult<ActorId> {
        if self.names.contains_key(&name) {
            return Err(SceneError::DuplicateName(name));
        }
        let parent_actor = self.actors.get_mut(parent).ok_or(SceneError::UnknownActor)?;
        if parent_actor.children_mut().is_none() {
            return Err(SceneError::NotAGroup(parent_actor.header().name().to_string()));
        }

        let header_name = name.clone();
        let id = self
            .actors
            .insert_with_key(|id| build(ActorHeader::new(id, header_name, Some(parent))));
        self.names.insert(name, id);
        if let Some(children) = self.actors.get_mut(parent).and_then(|a| a.children_mut()) {
            children.push(id);
        }
        Ok(id)
    }

    #[inline]
    pub fn actor(&self, id: ActorId) -> SceneResult<&dyn Actor> {
        self.actors
            .get(id)
            .map(|actor| actor.as_ref())
            .ok_or(SceneError::UnknownActor)
    }

    pub fn actor_mut(&mut self, id: ActorId) -> SceneResult<&mut (dyn Actor + 'static)> {
        self.actors
            .get_mut(id)
            .map(|actor| actor.as_mut())
            .ok_or(SceneError::UnknownActor)
    }

    /// Shorthand for `actor_mut(id)?.header_mut()`.
    pub fn header_mut(&mut self, id: ActorId) -> SceneResult<&mut ActorHeader> {
        Ok(self.actor_mut(id)?.header_mut())
    }

    /// Look an actor up by its unique name.
    pub fn find(&self, name: &str) -> Option<ActorId> {
        self.names.get(name).copied()
    }

    /// Recompute every actor's cached inverse transform, then refit every
    /// bounding volume to match.
    pub fn update_transforms(&mut self) -> SceneResult<()> {
        for (_, actor) in self.actors.iter_mut() {
            actor.header_mut().update_transform()?;
        }
        self.refresh_bounds()?;
        Ok(())
    }

    /// Recompute one actor's transform after a motion change and refit the
    /// volumes of the groups above it.
    pub fn update_transform(&mut self, id: ActorId) -> SceneResult<()> {
        self.header_mut(id)?.update_transform()?;
        let mut parent = self.actor(id)?.header().parent();
        while let Some(group) = parent {
            let union = self.union_of_children(group)?;
            let header = self.header_mut(group)?;
            header.set_bounds(union);
            parent = header.parent();
        }
        Ok(())
    }

    /// Fit every actor's bounding volume to its contents, bottom-up.
    ///
    /// Geometric actors take their surface's bounds; groups take the union of
    /// their children's. Anything containing an unbounded surface ends up
    /// without bounds.
    pub fn refresh_bounds(&mut self) -> SceneResult<Option<Aabb>> {
        self.refresh_bounds_of(self.root)
    }

    fn refresh_bounds_of(&mut self, id: ActorId) -> SceneResult<Option<Aabb>> {
        let (children, surface_bounds) = {
            let actor = self.actor(id)?;
            (actor.children().to_vec(), actor.surface().map(|s| s.bounds()))
        };

        let content = match surface_bounds {
            Some(bounds) => bounds,
            None => {
                for child in children {
                    self.refresh_bounds_of(child)?;
                }
                self.union_of_children(id)?
            }
        };

        let header = self.header_mut(id)?;
        header.set_bounds(content);
        Ok(header.bounds)
    }

    /// Union of the children's current volumes, in the group's own space.
    /// One unbounded child makes the whole group unbounded.
    fn union_of_children(&self, id: ActorId) -> SceneResult<Option<Aabb>> {
        let mut union: Option<Aabb> = None;
        for &child in self.actor(id)?.children() {
            match self.actor(child)?.header().bounds {
                Some(b) => union = Some(union.map_or(b, |u| Aabb::surrounding(&u, &b))),
                None => return Ok(None),
            }
        }
        Ok(union)
    }

    /// Refresh transforms and bounds. Call after building the scene.
    pub fn prepare(&mut self) -> SceneResult<()> {
        self.update_transforms()?;
        log::info!(
            "Scene '{}' prepared: {} actors, root bounds {:?}",
            self.name,
            self.actors.len(),
            self.actor(self.root)?.header().bounds
        );
        Ok(())
    }

    /// World-to-local matrix for `id`: its own inverse composed with every
    /// ancestor's, walking the parent chain up to the root.
    pub fn inverse_chain(&self, id: ActorId) -> SceneResult<Mat4> {
        let mut actor = self.actor(id)?;
        let mut chain = *actor.header().motion.inverse();
        while let Some(parent) = actor.header().parent() {
            actor = self.actor(parent)?;
            chain = chain * *actor.header().motion.inverse();
        }
        Ok(chain)
    }

    /// Closest hit along a world-space ray.
    pub fn intersect(
        &self,
        ray: &Ray,
        best: &mut f32,
        hit: &mut Intersection,
        scratch: &mut ScratchBundle,
    ) -> TraceResult<bool> {
        Probe::new(self, scratch).intersect_root(ray, best, hit)
    }

    /// Any occluder along a world-space shadow ray within `max_time`.
    pub fn casts_shadow(
        &self,
        ray: &Ray,
        best: &mut f32,
        occluder: &mut Option<ActorId>,
        scratch: &mut ScratchBundle,
        max_time: f32,
    ) -> TraceResult<bool> {
        Probe::new(self, scratch).casts_shadow_root(ray, best, occluder, max_time)
    }
}

impl std::fmt::Debug for Scene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scene")
            .field("name", &self.name)
            .field("actors", &self.actors.len())
            .field("epsilons", &self.epsilons)
            .finish()
    }
}
