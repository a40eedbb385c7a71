//! The O(n) ratio-based multiple-importance-sampling weight (spec §4.5.3).
//!
//! Rather than evaluating every `p_i(x)` independently (area-measure
//! probability of having sampled the assembled path with `i` vertices drawn
//! from the light subpath), we evaluate the adjacent ratios
//! `r_i = p_{i+1}/p_i` and walk them out from the technique that was
//! actually used, `i = s`. Each ratio only needs the two subpath vertices
//! next to the vertex changing ownership, using the per-vertex forward and
//! adjoint direction PDFs that [`crate::bpt::subpath::sample_subpath`]
//! already pre-computed — hence O(path length) total instead of O(path
//! length²).

use crate::pbrt::Float;
use crate::pdf::Measure;
use crate::vec::Dot;
use crate::vertex::BptVertex;

/// Cosines at the emitting and receiving ends of the edge `a -> b`, plus
/// the squared distance between them. Degenerate geometry (a delta
/// position, e.g. a pinhole camera) contributes a cosine of `1` rather than
/// reading a meaningless shading normal (spec §4.5.2).
fn geometry_terms(a: &BptVertex, b: &BptVertex) -> (Float, Float, Float) {
    let d = b.geom.p - a.geom.p;
    let dist_sq = d.length_squared();
    if dist_sq <= 0.0 {
        return (0.0, 0.0, 0.0);
    }
    let dir = d / dist_sq.sqrt();
    let cos_emit = if a.geom.degenerate { 1.0 } else { dir.dot(a.geom.sn).abs() };
    let cos_receive = if b.geom.degenerate { 1.0 } else { dir.dot(b.geom.sn).abs() };
    (cos_emit, cos_receive, dist_sq)
}

/// Converts a directional PDF sampled at the emitting vertex into the
/// area-measure density of having landed on the receiving vertex.
///
/// A `Discrete` (specular) PDF has no area-measure equivalent — a delta
/// direction lands on one point regardless of distance or foreshortening —
/// so by convention it contributes the neutral factor `1` whenever it is
/// itself the edge that was genuinely sampled, and `0` when read from a
/// vertex's *adjoint* slot that a non-specular BSDF never filled in (spec
/// §4.5.3's "fold a specular vertex's contribution into the adjacent ratio
/// directly"): a technique that would need to re-derive a delta bounce from
/// the other subpath has probability zero, and reading the unset adjoint
/// slot already evaluates to exactly that.
fn area_density(pdf_v: Float, measure: Measure, cos_emit: Float, cos_receive: Float, dist_sq: Float) -> Float {
    if pdf_v <= 0.0 {
        return 0.0;
    }
    match measure {
        Measure::Discrete => 1.0,
        Measure::ProjectedSolidAngle => {
            if dist_sq > 0.0 {
                pdf_v * cos_emit.abs() * cos_receive.abs() / dist_sq
            } else {
                0.0
            }
        }
        Measure::SolidAngle => {
            if dist_sq > 0.0 {
                pdf_v * cos_receive.abs() / dist_sq
            } else {
                0.0
            }
        }
        Measure::Area => pdf_v,
    }
}

/// The `i`'th vertex of the assembled full path `x_0..x_{s+t-1}`: the light
/// subpath in its own order, followed by the eye subpath reversed.
#[inline]
fn full_path_vertex<'a>(light: &[&'a BptVertex], eye: &[&'a BptVertex], n: usize, i: usize) -> &'a BptVertex {
    if i < light.len() {
        light[i]
    } else {
        eye[n - 1 - i]
    }
}

/// The multiple-importance-sampling weight `w_{s,t}` for a path assembled
/// from `s` light-subpath vertices and `t` eye-subpath vertices (spec
/// §4.5.3). `beta = 1` is the balance heuristic, `beta = 2` the power
/// heuristic (the default).
///
/// `light_endpoint_pdf_override` supplies the area-measure density of
/// treating the eye subpath's terminal (emitter-hit) vertex as a light
/// endpoint, needed only for the `s = 0` technique: that vertex was
/// actually generated by the eye subpath's own BSDF sampling, so it never
/// recorded a `pdf_position` in the light-selection sense, and the caller
/// (which alone knows which light the hit primitive is) must supply it.
///
/// `light_tracing_enabled` excludes the `t = 0` technique (`i = n`) from the
/// sum entirely when the camera has no finite-PDF direction sampling (a
/// pinhole camera can never be hit by a light subpath with nonzero
/// probability, so that term does not just evaluate to zero — it is not a
/// technique the renderer offers at all, spec §4.5.2).
pub fn mis_weight(
    light_path: &[&BptVertex],
    eye_path: &[&BptVertex],
    s: usize,
    t: usize,
    beta: Float,
    light_endpoint_pdf_override: Option<Float>,
    light_tracing_enabled: bool,
) -> Float {
    let n = s + t;
    if n < 2 {
        return 1.0;
    }
    debug_assert_eq!(light_path.len(), s);
    debug_assert_eq!(eye_path.len(), t);

    let x = |i: usize| full_path_vertex(light_path, eye_path, n, i);

    // r[i] = p_{i+1} / p_i, for i in 0..n.
    let mut r = vec![0.0f32; n];
    for i in 0..n {
        let xi = x(i);

        let light_side = if i == 0 {
            if s == 0 {
                light_endpoint_pdf_override.unwrap_or(0.0)
            } else {
                xi.pdf_position.v
            }
        } else {
            let prev = x(i - 1);
            let pdf = prev.pdf_direction_for(crate::gbsdf::TransportDirection::LightToEye);
            let (cos_emit, cos_receive, dist_sq) = geometry_terms(prev, xi);
            area_density(pdf.v, pdf.measure, cos_emit, cos_receive, dist_sq)
        };

        let eye_side = if i == n - 1 {
            xi.pdf_position.v
        } else {
            let next = x(i + 1);
            let pdf = next.pdf_direction_for(crate::gbsdf::TransportDirection::EyeToLight);
            let (cos_emit, cos_receive, dist_sq) = geometry_terms(next, xi);
            area_density(pdf.v, pdf.measure, cos_emit, cos_receive, dist_sq)
        };

        r[i] = if eye_side > 0.0 { light_side / eye_side } else { 0.0 };
    }

    // rel[i] = p_i / p_s, walked outward from the technique actually used.
    let mut rel = vec![0.0f32; n + 1];
    rel[s] = 1.0;
    for i in s..n {
        rel[i + 1] = rel[i] * r[i];
    }
    for i in (0..s).rev() {
        rel[i] = if r[i] > 0.0 { rel[i + 1] / r[i] } else { 0.0 };
    }

    let last = if light_tracing_enabled { n + 1 } else { n };
    let sum: Float = rel[..last].iter().map(|&v| v.max(0.0).powf(beta)).sum();
    if sum > 0.0 {
        1.0 / sum
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gbsdf::TransportDirection;
    use crate::interaction::SurfaceGeometry;
    use crate::pdf::PdfEval;
    use crate::vec::{Point2f, Vec3f};
    use crate::vertex::VertexType;

    fn v(p: Vec3f, pdf_position: PdfEval, pdf_fwd_light: PdfEval, pdf_fwd_eye: PdfEval, vertex_type: VertexType) -> BptVertex {
        BptVertex {
            vertex_type,
            geom: SurfaceGeometry::build_frame(p, Vec3f::new(0.0, 0.0, 1.0), Vec3f::new(0.0, 0.0, 1.0), Point2f::new(0.0, 0.0)),
            pdf_position,
            primitive_index: None,
            weight: Vec3f::splat(1.0),
            pdf_direction: [pdf_fwd_eye, pdf_fwd_light],
            pdf_rr: 1.0,
            transport_dir: TransportDirection::LightToEye,
            specular: false,
            wi: Vec3f::new(0.0, 0.0, 1.0),
            wo: Vec3f::new(0.0, 0.0, -1.0),
        }
    }

    /// Builds a toy two-vertex-per-subpath configuration: a light subpath
    /// `[y0, y1]` and an eye subpath `[z0, z1]`, all on the `z = 0` plane
    /// facing `+z`, with finite non-specular direction PDFs throughout —
    /// enough to exercise every branch of the ratio recurrence.
    fn toy_subpaths() -> (Vec<BptVertex>, Vec<BptVertex>) {
        let area_pdf = PdfEval::new(0.25, Measure::Area);
        let dir_pdf = PdfEval::new(crate::pbrt::INV_PI, Measure::ProjectedSolidAngle);
        let light = vec![
            v(Vec3f::new(0.0, 0.0, 2.0), area_pdf, dir_pdf, PdfEval::zero(Measure::ProjectedSolidAngle), VertexType::Endpoint),
            v(Vec3f::new(0.0, 0.0, 1.0), PdfEval::zero(Measure::Area), dir_pdf, dir_pdf, VertexType::IntermediatePoint),
        ];
        let eye = vec![
            v(Vec3f::new(0.0, 0.0, 0.0), area_pdf, PdfEval::zero(Measure::ProjectedSolidAngle), dir_pdf, VertexType::Endpoint),
            v(Vec3f::new(0.0, 0.0, 0.5), PdfEval::zero(Measure::Area), dir_pdf, dir_pdf, VertexType::IntermediatePoint),
        ];
        (light, eye)
    }

    #[test]
    fn weight_is_within_unit_range_and_matches_self_technique() {
        let (light, eye) = toy_subpaths();
        let light_refs: Vec<&BptVertex> = light.iter().collect();
        let eye_refs: Vec<&BptVertex> = eye.iter().collect();
        for s in 0..=2 {
            let t = 4 - s;
            if s > light_refs.len() || t == 0 || t > eye_refs.len() {
                continue;
            }
            let w = mis_weight(&light_refs[..s], &eye_refs[..t], s, t, 2.0, Some(0.2), true);
            assert!((0.0..=1.0 + 1e-4).contains(&w), "w_{{{s},{t}}} = {w} out of range");
        }
    }

    #[test]
    fn weights_for_all_techniques_of_a_path_sum_to_one() {
        let (light, eye) = toy_subpaths();
        let light_refs: Vec<&BptVertex> = light.iter().collect();
        let eye_refs: Vec<&BptVertex> = eye.iter().collect();
        let n = 3; // s + t == 3, so (s,t) in {(0,3)-invalid (only 2 eye verts), (1,2), (2,1)}
        let mut total = 0.0;
        let mut techniques = 0;
        for s in 0..=2usize {
            let t = n - s;
            if s > light_refs.len() || t == 0 || t > eye_refs.len() {
                continue;
            }
            let light_pdf_override = if s == 0 { Some(0.3) } else { None };
            total += mis_weight(&light_refs[..s], &eye_refs[..t], s, t, 1.0, light_pdf_override, true);
            techniques += 1;
        }
        assert!(techniques >= 2);
        assert!((total - 1.0).abs() < 1e-3, "sum of balance-heuristic weights was {total}");
    }

    /// Recomputes every `r[i]` fresh for every candidate technique instead
    /// of reusing the incremental `rel[]` walk `mis_weight` takes — O(n²)
    /// total work instead of O(n) — to check the incremental recurrence
    /// didn't drop a factor anywhere.
    fn brute_force_weight(
        light_path: &[&BptVertex],
        eye_path: &[&BptVertex],
        s: usize,
        t: usize,
        beta: Float,
        light_endpoint_pdf_override: Option<Float>,
        light_tracing_enabled: bool,
    ) -> Float {
        let n = s + t;
        if n < 2 {
            return 1.0;
        }
        let x = |i: usize| full_path_vertex(light_path, eye_path, n, i);

        let edge_ratio = |i: usize| -> Float {
            let xi = x(i);
            let light_side = if i == 0 {
                if s == 0 {
                    light_endpoint_pdf_override.unwrap_or(0.0)
                } else {
                    xi.pdf_position.v
                }
            } else {
                let prev = x(i - 1);
                let pdf = prev.pdf_direction_for(crate::gbsdf::TransportDirection::LightToEye);
                let (ce, cr, d2) = geometry_terms(prev, xi);
                area_density(pdf.v, pdf.measure, ce, cr, d2)
            };
            let eye_side = if i == n - 1 {
                xi.pdf_position.v
            } else {
                let next = x(i + 1);
                let pdf = next.pdf_direction_for(crate::gbsdf::TransportDirection::EyeToLight);
                let (ce, cr, d2) = geometry_terms(next, xi);
                area_density(pdf.v, pdf.measure, ce, cr, d2)
            };
            if eye_side > 0.0 {
                light_side / eye_side
            } else {
                0.0
            }
        };

        // p_i / p_s recomputed from scratch for each i, rather than walked
        // incrementally out from s as `mis_weight` does.
        let rel_from_scratch = |i: usize| -> Float {
            let mut v = 1.0;
            if i >= s {
                for k in s..i {
                    v *= edge_ratio(k);
                }
            } else {
                for k in i..s {
                    let r = edge_ratio(k);
                    if r <= 0.0 {
                        return 0.0;
                    }
                    v /= r;
                }
            }
            v
        };

        let last = if light_tracing_enabled { n + 1 } else { n };
        let sum: Float = (0..last).map(|i| rel_from_scratch(i).max(0.0).powf(beta)).sum();
        if sum > 0.0 {
            1.0 / sum
        } else {
            0.0
        }
    }

    #[test]
    fn ratio_method_matches_an_independently_recomputed_reference() {
        let (light, eye) = toy_subpaths();
        let light_refs: Vec<&BptVertex> = light.iter().collect();
        let eye_refs: Vec<&BptVertex> = eye.iter().collect();
        for s in 0..=2usize {
            let t = 4 - s;
            if s > light_refs.len() || t == 0 || t > eye_refs.len() {
                continue;
            }
            let light_pdf_override = if s == 0 { Some(0.2) } else { None };
            let fast = mis_weight(&light_refs[..s], &eye_refs[..t], s, t, 2.0, light_pdf_override, true);
            let direct = brute_force_weight(&light_refs[..s], &eye_refs[..t], s, t, 2.0, light_pdf_override, true);
            assert!((fast - direct).abs() < 1e-4, "w_{{{s},{t}}}: ratio={fast} direct={direct}");
        }
    }

    #[test]
    fn two_vertex_path_has_weight_one() {
        let (light, eye) = toy_subpaths();
        let light_refs: Vec<&BptVertex> = vec![&light[0]];
        let eye_refs: Vec<&BptVertex> = vec![&eye[0]];
        let w = mis_weight(&light_refs, &eye_refs, 1, 1, 2.0, None, true);
        assert!((w - 1.0).abs() < 1e-4);
    }
}
