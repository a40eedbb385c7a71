//! Textures bound to BSDF parameters: either a uniform constant or a
//! bitmap sampled by UV (spec §6's `textures` asset category — "named
//! textures (bitmap HDR)").

use std::sync::Arc;

use crate::pbrt::Float;
use crate::vec::{Point2f, Vec3f};

/// A decoded HDR bitmap, row-major, origin at the top-left. Loaded once by
/// the `io` crate and shared read-only via `Arc` across every texture that
/// references it.
#[derive(Debug)]
pub struct Bitmap {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<Vec3f>,
}

impl Bitmap {
    pub fn new(width: u32, height: u32, pixels: Vec<Vec3f>) -> Self {
        debug_assert_eq!(pixels.len(), (width as usize) * (height as usize));
        Self { width, height, pixels }
    }

    /// Nearest-neighbor lookup at texture coordinates `uv`, wrapping `u`/`v`
    /// into `[0, 1)` first.
    pub fn sample(&self, uv: Point2f) -> Vec3f {
        let wrap = |v: Float| v - v.floor();
        let x = (wrap(uv.x) * self.width as Float) as u32;
        let y = (wrap(uv.y) * self.height as Float) as u32;
        let x = x.min(self.width - 1);
        let y = y.min(self.height - 1);
        self.pixels[(y * self.width + x) as usize]
    }
}

/// A texture bound to a BSDF parameter.
#[derive(Clone, Debug)]
pub enum Texture {
    Constant(Vec3f),
    Bitmap(Arc<Bitmap>, Point2f),
}

impl Texture {
    /// Evaluates the texture at mesh texture coordinates `uv`. `Constant`
    /// ignores `uv`; `Bitmap` additionally applies its own UV offset/scale
    /// (stored as the second tuple field) before sampling.
    pub fn evaluate(&self, uv: Point2f) -> Vec3f {
        match self {
            Texture::Constant(c) => *c,
            Texture::Bitmap(bitmap, scale) => bitmap.sample(Point2f::new(uv.x * scale.x, uv.y * scale.y)),
        }
    }
}
