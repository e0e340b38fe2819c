//! Umbra renderer: the parallel half of the ray-evaluation substrate.
//!
//! Drives per-pixel evaluation over a rayon worker pool in a configurable
//! drawing order, streams finished pixels to listeners, and provides the
//! shadow detectors plus a small set of reference surfaces, a pinhole
//! camera and a direct-lighting tracer built on `umbra_core`.

pub mod camera;
pub mod config;
pub mod error;
pub mod light;
pub mod listener;
pub mod order;
pub mod pipeline;
pub mod plane;
pub mod shadow;
pub mod sphere;
pub mod tracer;
pub mod triangle;

pub use camera::Camera;
pub use config::RenderConfig;
pub use error::{ConfigError, PipelineError, PipelineResult};
pub use light::{Incidence, PointLight};
pub use listener::{color_to_rgba, linear_to_gamma, Event, ImageBuffer, Listener, Pixel, Progress, Recorder};
pub use order::{
    Bounds, DrawingOrder, Interleaved, Natural, OrderKind, PixelCoord, Shuffled, Spiral, DEFAULT_BUCKET_SIZE,
};
pub use pipeline::{Pipeline, PipelineState, Tracer};
pub use plane::{Plane, PLANE_KIND};
pub use shadow::{BasicShadowDetector, CachingShadowDetector, ShadowDetector, ShadowStrategy};
pub use sphere::{Sphere, SPHERE_KIND};
pub use tracer::DirectTracer;
pub use triangle::{Triangle, TRIANGLE_KIND};

/// Re-export the math and core types callers need alongside the renderer.
pub use umbra_core::{EpsilonTable, Scene};
pub use umbra_math::{Color, Vec3};
