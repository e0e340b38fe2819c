//! Drawing-order pipeline.
//!
//! A submission walks the viewport in the configured drawing order and hands
//! each pixel to a rayon worker. Every worker is handed its own scratch
//! bundle before streaming starts, evaluates the pixel through the [`Tracer`] and forwards the result
//! to every listener. The first failing pixel aborts the submission; its
//! error comes back wrapped with the pixel coordinate.

use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use umbra_core::{Scene, ScratchBundle, ThreadCache, TraceResult};
use umbra_math::Color;

use crate::config::RenderConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::listener::{Listener, Pixel};
use crate::order::{Bounds, DrawingOrder, PixelCoord};

/// Per-pixel evaluation. Implementations read the scene and write only into
/// the caller's scratch bundle, so one tracer serves every worker.
pub trait Tracer: Send + Sync {
    fn trace(&self, scene: &Scene, coord: PixelCoord, scratch: &mut ScratchBundle) -> TraceResult<Color>;
}

/// Where the pipeline is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    /// `on_start` delivered, workers not yet running.
    Started,
    Streaming,
    Completed,
    Failed,
    Closed,
}

pub struct Pipeline {
    workers: Option<rayon::ThreadPool>,
    cache: ThreadCache,
    order: Box<dyn DrawingOrder>,
    bounds: Bounds,
    listeners: Vec<Arc<dyn Listener>>,
    state: PipelineState,
}

impl Pipeline {
    /// Build the worker pool and per-thread cache described by `config`.
    pub fn new(config: &RenderConfig) -> PipelineResult<Self> {
        let workers = rayon::ThreadPoolBuilder::new()
            .num_threads(config.threads)
            .thread_name(|i| format!("umbra-worker-{i}"))
            .build()?;
        log::debug!("Pipeline worker pool: {} threads", workers.current_num_threads());

        Ok(Self {
            workers: Some(workers),
            cache: ThreadCache::new(config.pools).with_seed(config.seed),
            order: config.order.build(),
            bounds: config.bounds(),
            listeners: Vec::new(),
            state: PipelineState::Idle,
        })
    }

    pub fn add_listener(&mut self, listener: Arc<dyn Listener>) {
        self.listeners.push(listener);
    }

    pub fn with_listener(mut self, listener: Arc<dyn Listener>) -> Self {
        self.add_listener(listener);
        self
    }

    /// Restrict the next submission to a sub-rectangle.
    pub fn set_bounds(&mut self, bounds: Bounds) {
        self.bounds = bounds;
    }

    pub fn set_order(&mut self, order: Box<dyn DrawingOrder>) {
        self.order = order;
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn cache(&self) -> &ThreadCache {
        &self.cache
    }

    pub fn threads(&self) -> usize {
        self.workers.as_ref().map_or(0, |w| w.current_num_threads())
    }

    /// Render every pixel of the current bounds and block until done.
    ///
    /// Listeners get `on_start`, then one `on_emit` per pixel, then
    /// `on_complete` on success. On failure `on_complete` is not sent and the
    /// error names the first pixel that failed.
    pub fn submit(&mut self, scene: &Scene, tracer: &dyn Tracer) -> PipelineResult<()> {
        let workers = self.workers.as_ref().ok_or(PipelineError::Closed)?;
        if self.bounds.is_empty() {
            return Err(PipelineError::EmptyViewport);
        }

        let coords = self.order.coordinates(&self.bounds);
        // Fresh bundles per submission; drops stale shadow-cache entries too.
        self.cache.clear();

        self.state = PipelineState::Started;
        for listener in &self.listeners {
            listener.on_start(&self.bounds);
        }
        log::info!(
            "Rendering {} pixels ({} order) on {} threads",
            coords.len(),
            self.order.name(),
            workers.current_num_threads()
        );

        self.state = PipelineState::Streaming;
        let started = Instant::now();
        let cache = &self.cache;
        let listeners = &self.listeners;
        // Indexed by worker; each bundle is only ever touched by its own
        // thread, so the per-pixel lock below never waits.
        let bundles = workers.broadcast(|_| cache.get());

        let result = workers.install(|| {
            coords.par_iter().try_for_each_init(
                || {
                    rayon::current_thread_index()
                        .and_then(|i| bundles.get(i).cloned())
                        .unwrap_or_else(|| cache.get())
                },
                |bundle, &coord| {
                    // Released before emitting, so a steal on this thread
                    // can take it again.
                    let color = {
                        let mut scratch = bundle.lock();
                        tracer.trace(scene, coord, &mut scratch)
                    }
                    .map_err(|source| PipelineError::Trace {
                        x: coord.x,
                        y: coord.y,
                        source,
                    })?;

                    let pixel = Pixel {
                        x: coord.x,
                        y: coord.y,
                        color,
                    };
                    for listener in listeners {
                        listener.on_emit(&pixel);
                    }
                    Ok(())
                },
            )
        });

        match result {
            Ok(()) => {
                self.state = PipelineState::Completed;
                for listener in &self.listeners {
                    listener.on_complete();
                }
                log::info!(
                    "Rendered {} pixels in {:.2?}",
                    coords.len(),
                    started.elapsed()
                );
                Ok(())
            }
            Err(err) => {
                self.state = PipelineState::Failed;
                log::error!("Render failed after {:.2?}: {}", started.elapsed(), err);
                Err(err)
            }
        }
    }

    /// Shut the worker pool down. Later submissions fail with
    /// [`PipelineError::Closed`].
    pub fn close(&mut self) {
        if self.workers.take().is_some() {
            self.cache.clear();
            log::info!("Pipeline closed");
        }
        self.state = PipelineState::Closed;
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("threads", &self.threads())
            .field("order", &self.order.name())
            .field("bounds", &self.bounds)
            .field("listeners", &self.listeners.len())
            .field("state", &self.state)
            .finish()
    }
}
