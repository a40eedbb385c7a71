//! Precomputed per-triangle intersection accelerators.
//!
//! Two forms, both described in spec §4.1:
//!
//! - [`TriAccel`]: Wald's dominant-axis projection form, used by the QBVH's
//!   *scalar* leaf mode.
//! - [`QuadTriangle`]: four triangles packed structure-of-arrays, used by the
//!   *quad* leaf mode; a single ray is tested against all four lanes at once.
//!   Both forms here are plain scalar Rust — there is no SIMD-intrinsic
//!   specialization in this crate; the SOA layout of `QuadTriangle` lets an
//!   optimizing compiler autovectorize the four-lane test, but nothing here
//!   reaches for `core::arch` or gates on `target_feature`.

use crate::pbrt::Float;
use crate::ray::Ray;
use crate::vec::{Dot, Vec3f};

/// Dominant-axis projection accelerator for a single triangle (Wald's
/// `TriAccel`, as used in Mitsuba and lightmetrica).
#[derive(Copy, Clone, Debug)]
pub struct TriAccel {
    /// Dominant projection axis; `3` marks a degenerate triangle that never
    /// intersects anything.
    pub k: u8,
    pub n_u: Float,
    pub n_v: Float,
    pub n_d: Float,
    pub a_u: Float,
    pub a_v: Float,
    pub b_nu: Float,
    pub b_nv: Float,
    pub c_nu: Float,
    pub c_nv: Float,
}

const WALD_MODULO: [usize; 4] = [1, 2, 0, 1];

impl TriAccel {
    /// Precompute the accelerator for triangle `(a, b, c)`. Returns a
    /// degenerate accelerator (`k == 3`) if the triangle is degenerate — it
    /// is retained in the leaf payload (so offsets stay stable) but silently
    /// never hits (spec §4.2.2).
    pub fn load(a: Vec3f, b_pt: Vec3f, c_pt: Vec3f) -> TriAccel {
        let b = c_pt - a;
        let c = b_pt - a;
        let n = c.cross(b);

        let mut k = 0usize;
        for j in 1..3 {
            if n[j].abs() > n[k].abs() {
                k = j;
            }
        }

        let u = WALD_MODULO[k];
        let v = WALD_MODULO[k + 1];
        let n_k = n[k];
        let denom = b[u] * c[v] - b[v] * c[u];

        if denom == 0.0 || n_k == 0.0 {
            return TriAccel {
                k: 3,
                n_u: 0.0,
                n_v: 0.0,
                n_d: 0.0,
                a_u: 0.0,
                a_v: 0.0,
                b_nu: 0.0,
                b_nv: 0.0,
                c_nu: 0.0,
                c_nv: 0.0,
            };
        }

        TriAccel {
            k: k as u8,
            n_u: n[u] / n_k,
            n_v: n[v] / n_k,
            n_d: a.dot(n) / n_k,
            b_nu: b[u] / denom,
            b_nv: -b[v] / denom,
            a_u: a[u],
            a_v: a[v],
            c_nu: c[v] / denom,
            c_nv: -c[u] / denom,
        }
    }

    /// Ray intersection. Returns `(u, v, t)` barycentric-ish coordinates
    /// (`u`, `v` correspond to `b.1`, `b.2` elsewhere in the engine, with
    /// `b0 = 1 - u - v`).
    pub fn intersect(&self, ray: &Ray, min_t: Float, max_t: Float) -> Option<(Float, Float, Float)> {
        if self.k == 3 {
            return None;
        }
        let (o_u, o_v, o_k, d_u, d_v, d_k) = match self.k {
            0 => (ray.o.y, ray.o.z, ray.o.x, ray.d.y, ray.d.z, ray.d.x),
            1 => (ray.o.z, ray.o.x, ray.o.y, ray.d.z, ray.d.x, ray.d.y),
            _ => (ray.o.x, ray.o.y, ray.o.z, ray.d.x, ray.d.y, ray.d.z),
        };

        let denom = d_u * self.n_u + d_v * self.n_v + d_k;
        if denom == 0.0 {
            return None;
        }
        let t = (self.n_d - o_u * self.n_u - o_v * self.n_v - o_k) / denom;
        if t < min_t || t > max_t {
            return None;
        }

        let hu = o_u + t * d_u - self.a_u;
        let hv = o_v + t * d_v - self.a_v;
        let u = hv * self.b_nu + hu * self.b_nv;
        let v = hu * self.c_nu + hv * self.c_nv;

        if u >= 0.0 && v >= 0.0 && u + v <= 1.0 {
            Some((u, v, t))
        } else {
            None
        }
    }
}

/// Four triangles packed structure-of-arrays: origin + two edge vectors per
/// lane. The tail of a partially-filled quad is padded with copies of the
/// last real triangle so masked-out lanes can never spuriously match (spec
/// §4.2.1).
#[derive(Copy, Clone, Debug)]
pub struct QuadTriangle {
    pub orig: [Vec3f; 4],
    pub edge1: [Vec3f; 4],
    pub edge2: [Vec3f; 4],
    /// Back-reference `(primitive_index, face_index)` per lane.
    pub refs: [(u32, u32); 4],
}

impl QuadTriangle {
    pub fn load(triangles: &[([Vec3f; 3], u32, u32)]) -> QuadTriangle {
        debug_assert!(triangles.len() <= 4 && !triangles.is_empty());
        let mut orig = [Vec3f::default(); 4];
        let mut edge1 = [Vec3f::default(); 4];
        let mut edge2 = [Vec3f::default(); 4];
        let mut refs = [(0u32, 0u32); 4];
        let last = triangles.last().unwrap();
        for lane in 0..4 {
            let (p, prim, face) = if lane < triangles.len() { &triangles[lane] } else { last };
            orig[lane] = p[0];
            edge1[lane] = p[1] - p[0];
            edge2[lane] = p[2] - p[0];
            refs[lane] = (*prim, *face);
        }
        QuadTriangle { orig, edge1, edge2, refs }
    }

    /// Möller-Trumbore intersection against all four lanes; returns the
    /// nearest valid hit within `[ray.min_t, ray.max_t]` as
    /// `(lane, b1, b2, t)`.
    pub fn intersect(&self, ray: &Ray) -> Option<(usize, Float, Float, Float)> {
        let mut best: Option<(usize, Float, Float, Float)> = None;
        let mut max_t = ray.max_t;
        for lane in 0..4 {
            let e1 = self.edge1[lane];
            let e2 = self.edge2[lane];
            let s1 = ray.d.cross(e2);
            let divisor = s1.dot(e1);
            if divisor == 0.0 {
                continue;
            }
            let inv_div = 1.0 / divisor;
            let d = ray.o - self.orig[lane];
            let b1 = d.dot(s1) * inv_div;
            if !(0.0..=1.0).contains(&b1) {
                continue;
            }
            let s2 = d.cross(e1);
            let b2 = ray.d.dot(s2) * inv_div;
            if b2 < 0.0 || b1 + b2 > 1.0 {
                continue;
            }
            let t = e2.dot(s2) * inv_div;
            if t > ray.min_t && t < max_t {
                max_t = t;
                best = Some((lane, b1, b2, t));
            }
        }
        best
    }
}
