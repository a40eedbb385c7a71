//! The acceleration-structure interface the scene builds against (spec
//! §4.2). `core` depends only on this trait; the concrete QBVH lives in the
//! `accelerators` crate and is wired in by the `io`/driver layer, keeping
//! `core` free of a dependency on its own accelerator implementation.

use crate::error::BuildError;
use crate::pbrt::Float;
use crate::ray::Ray;
use crate::vec::Vec3f;

/// One world-space triangle handed to the accelerator at build time, along
/// with the back-reference needed to reconstruct a full intersection
/// afterward (spec §4.2.1).
#[derive(Copy, Clone, Debug)]
pub struct BuildTriangle {
    pub positions: [Vec3f; 3],
    pub primitive_index: u32,
    pub face_index: u32,
}

/// The raw result of an accelerator query: which triangle was hit and where,
/// in barycentric coordinates. `Scene::intersect` turns this into a full
/// [`crate::interaction::Intersection`] via `store_intersection_from_barycentric`
/// (spec §4.3).
#[derive(Copy, Clone, Debug)]
pub struct AccelHit {
    pub primitive_index: u32,
    pub face_index: u32,
    /// Barycentric `(b1, b2)`; `b0 = 1 - b1 - b2` is implicit.
    pub b1: Float,
    pub b2: Float,
    pub t: Float,
}

/// Nearest-hit and any-hit queries over a fixed triangle soup, built once and
/// shared read-only across render threads (spec §5).
pub trait Accelerator: Send + Sync {
    /// Consumes the flattened triangle list and builds the structure.
    /// Deterministic given the input ordering (spec §4.2.1); an empty
    /// `triangles` still produces a valid (empty) structure, not an error —
    /// [`BuildError`] is reserved for malformed scene-level state the caller
    /// detects before reaching the accelerator (no camera, bad primitive
    /// index).
    fn build(&mut self, triangles: Vec<BuildTriangle>) -> Result<(), BuildError>;

    /// Nearest-hit query. `ray.max_t` is tightened in place as the search
    /// proceeds; returns `None` (leaving `ray` untouched) if nothing is hit.
    fn intersect(&self, ray: &mut Ray) -> Option<AccelHit>;

    /// Any-hit (occlusion) query; never reconstructs full intersection data.
    fn intersect_p(&self, ray: &Ray) -> bool;
}
