//! Errors surfaced by the pipeline and configuration layer.

use thiserror::Error;
use umbra_core::TraceError;

/// Failure of a whole submission.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A pixel's evaluation failed; the coordinates identify which one.
    #[error("tracing pixel ({x}, {y}) failed: {source}")]
    Trace {
        x: u32,
        y: u32,
        #[source]
        source: TraceError,
    },

    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("viewport is empty")]
    EmptyViewport,

    #[error("pipeline is closed")]
    Closed,
}

pub type PipelineResult<T> = Result<T, PipelineError>;

/// Problems loading or validating a [`crate::RenderConfig`].
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to parse render config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("failed to read render config: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid render config: {0}")]
    Invalid(String),
}
