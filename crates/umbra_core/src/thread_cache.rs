//! Per-thread scratch bundles.
//!
//! Each worker thread gets its own [`ScratchBundle`] (one pool per scratch
//! type, a random generator and the shadow-occluder cache). Bundles are never
//! shared between threads, so nothing inside traversal needs a lock; the
//! registry lock is only taken when a thread fetches its bundle.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, ThreadId};

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;
use umbra_math::{Color, Mat4, Ray, Vec2, Vec3};

use crate::actor::ActorId;
use crate::error::PoolResult;
use crate::intersection::Intersection;
use crate::pool::{Pool, PoolConfig};

/// Last occluder seen for one light, plus the world-to-local matrix that
/// takes a world ray into that occluder's surface space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CachedOccluder {
    pub actor: ActorId,
    pub world_to_local: Mat4,
}

/// Everything one worker thread needs to trace without allocating.
pub struct ScratchBundle {
    pub vectors: Pool<Vec3>,
    pub colors: Pool<Color>,
    pub rays: Pool<Ray>,
    pub hits: Pool<Intersection>,
    pub floats: Pool<f32>,
    pub uvs: Pool<Vec2>,
    pub rng: StdRng,
    occluders: Vec<Option<CachedOccluder>>,
}

impl ScratchBundle {
    pub fn new(config: &PoolConfig, rng: StdRng) -> Self {
        Self {
            vectors: Pool::with_config("vectors", config, || Vec3::ZERO),
            colors: Pool::with_config("colors", config, || Color::ZERO),
            rays: Pool::with_config("rays", config, Ray::default),
            hits: Pool::with_config("hits", config, Intersection::default),
            floats: Pool::with_config("floats", config, || 0.0),
            uvs: Pool::with_config("uvs", config, || Vec2::ZERO),
            rng,
            occluders: Vec::new(),
        }
    }

    /// Bundle with a fixed seed; handy in tests.
    pub fn seeded(config: &PoolConfig, seed: u64) -> Self {
        Self::new(config, StdRng::seed_from_u64(seed))
    }

    /// Cached occluder for `light`, if any.
    #[inline]
    pub fn cached_occluder(&self, light: usize) -> Option<CachedOccluder> {
        self.occluders.get(light).copied().flatten()
    }

    pub fn set_cached_occluder(&mut self, light: usize, entry: Option<CachedOccluder>) {
        if light >= self.occluders.len() {
            if entry.is_none() {
                return;
            }
            self.occluders.resize(light + 1, None);
        }
        self.occluders[light] = entry;
    }

    /// Return a scratch ray and record together.
    pub fn reuse_ray_and_hit(&mut self, ray: Ray, hit: Intersection) -> PoolResult<()> {
        self.hits.reuse(hit)?;
        self.rays.reuse(ray)
    }

    /// True when no scratch value is checked out of any pool.
    pub fn is_balanced(&self) -> bool {
        self.vectors.borrowed() == 0
            && self.colors.borrowed() == 0
            && self.rays.borrowed() == 0
            && self.hits.borrowed() == 0
            && self.floats.borrowed() == 0
            && self.uvs.borrowed() == 0
    }
}

impl std::fmt::Debug for ScratchBundle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScratchBundle")
            .field("rays", &self.rays)
            .field("hits", &self.hits)
            .field("cached_lights", &self.occluders.len())
            .finish_non_exhaustive()
    }
}

/// Shared handle to one thread's bundle.
pub type BundleHandle = Arc<Mutex<ScratchBundle>>;

/// Registry mapping worker threads to their scratch bundles.
#[derive(Debug)]
pub struct ThreadCache {
    config: PoolConfig,
    seed: Option<u64>,
    created: AtomicU64,
    bundles: Mutex<HashMap<ThreadId, BundleHandle>>,
}

impl ThreadCache {
    pub fn new(config: PoolConfig) -> Self {
        Self {
            config,
            seed: None,
            created: AtomicU64::new(0),
            bundles: Mutex::new(HashMap::new()),
        }
    }

    /// Derive every bundle's generator from `seed` instead of entropy.
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// The calling thread's bundle, created on first access.
    pub fn get(&self) -> BundleHandle {
        let id = thread::current().id();
        let mut bundles = self.bundles.lock();
        bundles
            .entry(id)
            .or_insert_with(|| {
                let n = self.created.fetch_add(1, Ordering::Relaxed);
                let rng = match self.seed {
                    Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(n)),
                    None => StdRng::from_entropy(),
                };
                log::debug!("Created scratch bundle #{} for {:?}", n, id);
                Arc::new(Mutex::new(ScratchBundle::new(&self.config, rng)))
            })
            .clone()
    }

    /// Drop every bundle for every thread.
    ///
    /// Handles already fetched stay valid but are no longer registered; the
    /// next [`ThreadCache::get`] on each thread builds a fresh bundle.
    pub fn clear(&self) {
        let mut bundles = self.bundles.lock();
        let count = bundles.len();
        bundles.clear();
        log::info!("Cleared {} scratch bundle(s)", count);
    }

    /// Number of threads that currently own a bundle.
    pub fn len(&self) -> usize {
        self.bundles.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ThreadCache {
    fn default() -> Self {
        Self::new(PoolConfig::default())
    }
}
