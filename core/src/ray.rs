//! Rays.

use crate::pbrt::{Float, EPSILON};
use crate::vec::Vec3f;

/// A ray: origin, *unit* direction, and a mutable `[min_t, max_t)` window.
///
/// Invariants (spec §3): `min_t >= 0`, `max_t >= min_t`, `d` is never the
/// zero vector. `max_t` is tightened by the accelerator as nearer hits are
/// found (spec §4.2.2) — callers that need the original far bound should
/// snapshot it before calling `Scene::intersect`.
#[derive(Copy, Clone, Debug)]
pub struct Ray {
    pub o: Vec3f,
    pub d: Vec3f,
    pub min_t: Float,
    pub max_t: Float,
}

impl Ray {
    pub fn new(o: Vec3f, d: Vec3f) -> Self {
        debug_assert!(d.length_squared() > 0.0, "ray direction must not be zero");
        Self {
            o,
            d,
            min_t: EPSILON,
            max_t: Float::INFINITY,
        }
    }

    pub fn with_range(o: Vec3f, d: Vec3f, min_t: Float, max_t: Float) -> Self {
        debug_assert!(min_t >= 0.0);
        debug_assert!(max_t >= min_t);
        Self { o, d, min_t, max_t }
    }

    /// A shadow ray between two surface points, offset from both ends by
    /// `EPSILON` to avoid immediately re-intersecting the source geometry.
    pub fn shadow(from: Vec3f, to: Vec3f) -> Self {
        let delta = to - from;
        let dist = delta.length();
        let d = if dist > 0.0 {
            delta / dist
        } else {
            Vec3f::new(0.0, 0.0, 1.0)
        };
        Self {
            o: from,
            d,
            min_t: EPSILON,
            max_t: (dist - EPSILON).max(0.0),
        }
    }

    #[inline]
    pub fn at(&self, t: Float) -> Vec3f {
        self.o + self.d * t
    }
}
