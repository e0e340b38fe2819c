//! Pipeline listeners.
//!
//! Every listener sees `on_start` once, then one `on_emit` per pixel from
//! whichever worker finished it, then `on_complete` once if the submission
//! succeeded. Emits arrive concurrently and in no particular order.

use std::path::Path;

use parking_lot::Mutex;
use umbra_math::Color;

use crate::order::{Bounds, PixelCoord};

/// A finished pixel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pixel {
    pub x: u32,
    pub y: u32,
    pub color: Color,
}

impl Pixel {
    pub fn coord(&self) -> PixelCoord {
        PixelCoord::new(self.x, self.y)
    }
}

/// Observer of one submission.
pub trait Listener: Send + Sync {
    fn on_start(&self, bounds: &Bounds);
    fn on_emit(&self, pixel: &Pixel);
    fn on_complete(&self);
}

/// Apply gamma correction (gamma = 2.0).
#[inline]
pub fn linear_to_gamma(linear: f32) -> f32 {
    if linear > 0.0 {
        linear.sqrt()
    } else {
        0.0
    }
}

/// Convert a color to 8-bit RGBA.
pub fn color_to_rgba(color: Color) -> [u8; 4] {
    let channel = |c: f32| (255.0 * linear_to_gamma(c).clamp(0.0, 1.0)) as u8;
    [channel(color.x), channel(color.y), channel(color.z), 255]
}

struct Frame {
    bounds: Bounds,
    pixels: Vec<Color>,
    filled: usize,
}

impl Frame {
    fn index(&self, x: u32, y: u32) -> Option<usize> {
        self.bounds
            .contains(PixelCoord::new(x, y))
            .then(|| ((y - self.bounds.y0) * self.bounds.width() + (x - self.bounds.x0)) as usize)
    }
}

/// Collects emitted pixels into a linear color frame sized to the
/// submitted bounds.
pub struct ImageBuffer {
    frame: Mutex<Frame>,
}

impl Default for ImageBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageBuffer {
    pub fn new() -> Self {
        Self {
            frame: Mutex::new(Frame {
                bounds: Bounds::new(0, 0),
                pixels: Vec::new(),
                filled: 0,
            }),
        }
    }

    pub fn bounds(&self) -> Bounds {
        self.frame.lock().bounds
    }

    pub fn width(&self) -> u32 {
        self.frame.lock().bounds.width()
    }

    pub fn height(&self) -> u32 {
        self.frame.lock().bounds.height()
    }

    /// Pixels received since the last `on_start`.
    pub fn filled(&self) -> usize {
        self.frame.lock().filled
    }

    /// Color at image coordinate `(x, y)`, if inside the bounds.
    pub fn get(&self, x: u32, y: u32) -> Option<Color> {
        let frame = self.frame.lock();
        frame.index(x, y).map(|i| frame.pixels[i])
    }

    /// Gamma-corrected RGBA bytes, row-major over the bounds.
    pub fn to_rgba(&self) -> Vec<u8> {
        let frame = self.frame.lock();
        let mut bytes = Vec::with_capacity(frame.pixels.len() * 4);
        for color in &frame.pixels {
            bytes.extend_from_slice(&color_to_rgba(*color));
        }
        bytes
    }

    /// Save the frame as PNG.
    pub fn save_png(&self, path: impl AsRef<Path>) -> image::ImageResult<()> {
        let (width, height) = {
            let frame = self.frame.lock();
            (frame.bounds.width(), frame.bounds.height())
        };
        let img = image::RgbaImage::from_raw(width, height, self.to_rgba()).ok_or_else(|| {
            image::ImageError::Parameter(image::error::ParameterError::from_kind(
                image::error::ParameterErrorKind::DimensionMismatch,
            ))
        })?;
        img.save(path.as_ref())?;
        log::info!("Saved {}x{} image to {}", width, height, path.as_ref().display());
        Ok(())
    }
}

impl Listener for ImageBuffer {
    fn on_start(&self, bounds: &Bounds) {
        let mut frame = self.frame.lock();
        frame.bounds = *bounds;
        frame.pixels.clear();
        frame.pixels.resize(bounds.area(), Color::ZERO);
        frame.filled = 0;
    }

    fn on_emit(&self, pixel: &Pixel) {
        let mut frame = self.frame.lock();
        if let Some(i) = frame.index(pixel.x, pixel.y) {
            frame.pixels[i] = pixel.color;
            frame.filled += 1;
        }
    }

    fn on_complete(&self) {
        let frame = self.frame.lock();
        log::debug!("Image buffer complete: {}/{} pixels", frame.filled, frame.pixels.len());
    }
}

struct Tally {
    done: usize,
    total: usize,
    reported: usize,
}

/// Logs completion in 10% steps.
pub struct Progress {
    label: String,
    tally: Mutex<Tally>,
}

impl Progress {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            tally: Mutex::new(Tally {
                done: 0,
                total: 0,
                reported: 0,
            }),
        }
    }

    /// (pixels done, pixels expected)
    pub fn counts(&self) -> (usize, usize) {
        let tally = self.tally.lock();
        (tally.done, tally.total)
    }
}

impl Listener for Progress {
    fn on_start(&self, bounds: &Bounds) {
        let mut tally = self.tally.lock();
        tally.done = 0;
        tally.total = bounds.area();
        tally.reported = 0;
        log::info!("{}: rendering {} pixels", self.label, tally.total);
    }

    fn on_emit(&self, _pixel: &Pixel) {
        let mut tally = self.tally.lock();
        tally.done += 1;
        let decile = tally.done * 10 / tally.total.max(1);
        if decile > tally.reported {
            tally.reported = decile;
            log::info!("{}: {}% ({}/{})", self.label, decile * 10, tally.done, tally.total);
        }
    }

    fn on_complete(&self) {
        let tally = self.tally.lock();
        log::info!("{}: complete ({} pixels)", self.label, tally.done);
    }
}

/// Event seen by a [`Recorder`].
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Start(Bounds),
    Emit(Pixel),
    Complete,
}

/// Keeps every event in arrival order. Mostly useful for tests and for
/// replaying a render into another sink.
#[derive(Default)]
pub struct Recorder {
    events: Mutex<Vec<Event>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    pub fn emitted(&self) -> Vec<Pixel> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                Event::Emit(p) => Some(*p),
                _ => None,
            })
            .collect()
    }
}

impl Listener for Recorder {
    fn on_start(&self, bounds: &Bounds) {
        self.events.lock().push(Event::Start(*bounds));
    }

    fn on_emit(&self, pixel: &Pixel) {
        self.events.lock().push(Event::Emit(*pixel));
    }

    fn on_complete(&self) {
        self.events.lock().push(Event::Complete);
    }
}
