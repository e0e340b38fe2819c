//! Drawing orders: the sequence in which viewport pixels are handed to the
//! worker pool.
//!
//! An order only decides dispatch. Workers finish pixels in whatever order
//! the scheduler allows, so listeners must not rely on emit order matching
//! dispatch order.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// Integer pixel position in image space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PixelCoord {
    pub x: u32,
    pub y: u32,
}

impl PixelCoord {
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

/// Half-open pixel rectangle `[x0, x1) x [y0, y1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

impl Bounds {
    /// Full image of `width` by `height` pixels.
    pub const fn new(width: u32, height: u32) -> Self {
        Self {
            x0: 0,
            y0: 0,
            x1: width,
            y1: height,
        }
    }

    /// Sub-rectangle; an inverted range yields an empty region.
    pub fn crop(x0: u32, y0: u32, x1: u32, y1: u32) -> Self {
        Self {
            x0,
            y0,
            x1: x1.max(x0),
            y1: y1.max(y0),
        }
    }

    pub fn width(&self) -> u32 {
        self.x1.saturating_sub(self.x0)
    }

    pub fn height(&self) -> u32 {
        self.y1.saturating_sub(self.y0)
    }

    pub fn area(&self) -> usize {
        self.width() as usize * self.height() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.area() == 0
    }

    pub fn contains(&self, coord: PixelCoord) -> bool {
        (self.x0..self.x1).contains(&coord.x) && (self.y0..self.y1).contains(&coord.y)
    }

    /// Row-major coordinates of every pixel in the region.
    pub fn pixels(&self) -> impl Iterator<Item = PixelCoord> + '_ {
        (self.y0..self.y1).flat_map(move |y| (self.x0..self.x1).map(move |x| PixelCoord::new(x, y)))
    }
}

/// Produces the dispatch sequence for a region. Every pixel of `bounds`
/// must appear exactly once.
pub trait DrawingOrder: Send + Sync {
    fn name(&self) -> &'static str;
    fn coordinates(&self, bounds: &Bounds) -> Vec<PixelCoord>;
}

/// Row-major, top to bottom.
#[derive(Debug, Clone, Copy, Default)]
pub struct Natural;

impl DrawingOrder for Natural {
    fn name(&self) -> &'static str {
        "natural"
    }

    fn coordinates(&self, bounds: &Bounds) -> Vec<PixelCoord> {
        bounds.pixels().collect()
    }
}

/// Uniform random permutation, reproducible from `seed`.
#[derive(Debug, Clone, Copy)]
pub struct Shuffled {
    pub seed: u64,
}

impl DrawingOrder for Shuffled {
    fn name(&self) -> &'static str {
        "shuffled"
    }

    fn coordinates(&self, bounds: &Bounds) -> Vec<PixelCoord> {
        let mut coords: Vec<_> = bounds.pixels().collect();
        coords.shuffle(&mut StdRng::seed_from_u64(self.seed));
        coords
    }
}

/// Checkerboard parity: every pixel with even `x + y` first, then the odd
/// ones, each pass row-major. Gives a coarse full-frame preview halfway in.
#[derive(Debug, Clone, Copy, Default)]
pub struct Interleaved;

impl DrawingOrder for Interleaved {
    fn name(&self) -> &'static str {
        "interleaved"
    }

    fn coordinates(&self, bounds: &Bounds) -> Vec<PixelCoord> {
        let (even, odd): (Vec<_>, Vec<_>) = bounds.pixels().partition(|p| (p.x ^ p.y) & 1 == 0);
        let mut coords = even;
        coords.extend(odd);
        coords
    }
}

/// Default bucket edge for [`Spiral`].
pub const DEFAULT_BUCKET_SIZE: u32 = 32;

/// Square buckets sorted by distance from the region center, each bucket
/// row-major. The middle of the frame resolves first.
#[derive(Debug, Clone, Copy)]
pub struct Spiral {
    pub bucket_size: u32,
}

impl Default for Spiral {
    fn default() -> Self {
        Self {
            bucket_size: DEFAULT_BUCKET_SIZE,
        }
    }
}

impl Spiral {
    /// Bucket rectangles covering `bounds`, center first.
    pub fn buckets(&self, bounds: &Bounds) -> Vec<Bounds> {
        let size = self.bucket_size.max(1);
        let mut buckets = Vec::new();

        let mut y = bounds.y0;
        while y < bounds.y1 {
            let y_end = y.saturating_add(size).min(bounds.y1);
            let mut x = bounds.x0;
            while x < bounds.x1 {
                let x_end = x.saturating_add(size).min(bounds.x1);
                buckets.push(Bounds::crop(x, y, x_end, y_end));
                x = x_end;
            }
            y = y_end;
        }

        let midpoint = |a: u32, b: u32| (a as f64 + b as f64) / 2.0;
        let cx = midpoint(bounds.x0, bounds.x1);
        let cy = midpoint(bounds.y0, bounds.y1);
        let distance = |b: &Bounds| {
            let bx = midpoint(b.x0, b.x1);
            let by = midpoint(b.y0, b.y1);
            (bx - cx).powi(2) + (by - cy).powi(2)
        };
        // Stable sort keeps row-major order among equidistant buckets.
        buckets.sort_by(|a, b| distance(a).total_cmp(&distance(b)));
        buckets
    }
}

impl DrawingOrder for Spiral {
    fn name(&self) -> &'static str {
        "spiral"
    }

    fn coordinates(&self, bounds: &Bounds) -> Vec<PixelCoord> {
        let mut coords = Vec::with_capacity(bounds.area());
        for bucket in self.buckets(bounds) {
            coords.extend(bucket.pixels());
        }
        coords
    }
}

/// Serializable choice of drawing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OrderKind {
    #[default]
    Natural,
    Shuffled {
        seed: u64,
    },
    Interleaved,
    Spiral {
        bucket_size: u32,
    },
}

impl OrderKind {
    pub fn build(&self) -> Box<dyn DrawingOrder> {
        match *self {
            OrderKind::Natural => Box::new(Natural),
            OrderKind::Shuffled { seed } => Box::new(Shuffled { seed }),
            OrderKind::Interleaved => Box::new(Interleaved),
            OrderKind::Spiral { bucket_size } => Box::new(Spiral { bucket_size }),
        }
    }
}
