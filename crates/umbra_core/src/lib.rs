//! Umbra Core - scene graph and allocation-free traversal substrate.
//!
//! This crate provides:
//!
//! - **Scratch pools** (`Pool`) and the per-thread cache (`ThreadCache`) that
//!   keep the hot path free of heap allocation
//! - **Epsilon table**: per-geometry-kind minimum hit times
//! - **Scene graph**: `Scene` arena of `Group` and `Geometric` actors with
//!   nested transforms and bounding-volume pruning
//!
//! # Example
//!
//! ```ignore
//! use umbra_core::{Scene, ThreadCache, Intersection};
//!
//! let mut scene = Scene::new("root");
//! let ball = scene.add_geometric(scene.root(), "ball", my_sphere)?;
//! scene.prepare()?;
//!
//! let cache = ThreadCache::default();
//! let bundle = cache.get();
//! let mut hit = Intersection::default();
//! let mut best = f32::INFINITY;
//! scene.intersect(&ray, &mut best, &mut hit, &mut bundle.lock())?;
//! ```

pub mod actor;
pub mod epsilon;
pub mod error;
pub mod geometric;
pub mod group;
pub mod intersection;
pub mod pool;
pub mod probe;
pub mod scene;
pub mod thread_cache;

// Re-export commonly used types
pub use actor::{Actor, ActorHeader, ActorId, Motion, Surface};
pub use epsilon::{EpsilonTable, DEFAULT_EPSILON};
pub use error::{PoolError, PoolResult, SceneError, SceneResult, TraceError, TraceResult};
pub use geometric::Geometric;
pub use group::Group;
pub use intersection::Intersection;
pub use pool::{OverflowPolicy, Pool, PoolConfig};
pub use probe::Probe;
pub use scene::Scene;
pub use thread_cache::{BundleHandle, CachedOccluder, ScratchBundle, ThreadCache};
