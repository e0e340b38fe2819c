//! Error taxonomy for the ray-evaluation core.
//!
//! Nothing in here is retried locally: a pool violation or a broken scene
//! reference is a programmer error and travels up to whoever drives the
//! render.

use thiserror::Error;

/// Scratch pool contract violations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    #[error("pool '{pool}' exhausted at capacity {capacity} (unbalanced borrow/reuse or undersized pool)")]
    Exhausted { pool: &'static str, capacity: usize },

    #[error("pool '{pool}' overfilled past capacity {capacity} (value returned twice)")]
    Overfill { pool: &'static str, capacity: usize },
}

pub type PoolResult<T> = Result<T, PoolError>;

/// Structural scene-graph errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SceneError {
    #[error("an actor named '{0}' already exists")]
    DuplicateName(String),

    #[error("unknown actor reference")]
    UnknownActor,

    #[error("actor '{0}' is not a group and cannot own children")]
    NotAGroup(String),

    #[error("actor '{0}' has a degenerate transform (matrix is not invertible)")]
    DegenerateTransform(String),
}

pub type SceneResult<T> = Result<T, SceneError>;

/// Anything that can go wrong while evaluating a ray.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TraceError {
    #[error("scratch pool error: {0}")]
    Pool(#[from] PoolError),

    #[error("scene error: {0}")]
    Scene(#[from] SceneError),

    #[error("shading error: {0}")]
    Shading(String),
}

pub type TraceResult<T> = Result<T, TraceError>;
