//! Lambertian diffuse reflection, and the Fresnel-blended `All` combination
//! BSDF (a diffuse substrate under a specular coat, in the vein of pbrt's
//! "plastic" material).

use crate::gbsdf::{
    fresnel_dielectric_schlick, sample_u2, BsdfType, Directional, GbsdfQuery, SampleResult, TransportDirection,
};
use crate::pbrt::Float;
use crate::pdf::{Measure, PdfEval};
use crate::sampler::Sampler;
use crate::vec::{face_forward, Dot, Vec3f};
use crate::warp::cosine_sample_hemisphere;

/// Lambertian reflection: `f = albedo / π`, cosine-weighted sampling.
#[derive(Copy, Clone, Debug)]
pub struct Diffuse {
    pub albedo: Vec3f,
}

impl Directional for Diffuse {
    fn sample_direction(&self, q: &GbsdfQuery, sampler: &mut dyn Sampler) -> Option<SampleResult> {
        let n = face_forward(q.geom.sn, q.wi);
        let local = cosine_sample_hemisphere(sample_u2(sampler));
        let wo = q.geom.to_world(local).normalize();
        let wo = face_forward(wo, n);
        let cos_theta = wo.dot(n).abs();
        if cos_theta <= 0.0 {
            return None;
        }
        // Cosine-weighted sampling has a constant density in the *projected*
        // solid-angle measure (the cosθ/π solid-angle density divided by
        // cosθ), which is exactly the measure `β` is updated in (spec
        // §4.5.1f).
        Some(SampleResult {
            wo,
            sampled_type: self.bsdf_type(),
            pdf: PdfEval::new(crate::pbrt::INV_PI, Measure::ProjectedSolidAngle),
            value: self.albedo * crate::pbrt::INV_PI,
        })
    }

    fn evaluate_direction(&self, q: &GbsdfQuery, wo: Vec3f) -> Vec3f {
        if same_hemisphere(q.geom.sn, q.wi, wo) {
            self.albedo * crate::pbrt::INV_PI
        } else {
            Vec3f::splat(0.0)
        }
    }

    fn evaluate_direction_pdf(&self, q: &GbsdfQuery, wo: Vec3f) -> PdfEval {
        if !same_hemisphere(q.geom.sn, q.wi, wo) {
            return PdfEval::zero(Measure::ProjectedSolidAngle);
        }
        PdfEval::new(crate::pbrt::INV_PI, Measure::ProjectedSolidAngle)
    }

    fn bsdf_type(&self) -> BsdfType {
        BsdfType::DIFFUSE | BsdfType::REFLECTION
    }
}

#[inline]
fn same_hemisphere(n: Vec3f, a: Vec3f, b: Vec3f) -> bool {
    a.dot(n) * b.dot(n) > 0.0
}

/// Fresnel-weighted combination of a specular coat over a diffuse
/// substrate: with probability `Fr(cos θ_i)` sample the specular lobe
/// (treated as a perfect mirror for the coat), else sample the diffuse
/// substrate. `evaluate_direction`/`evaluate_direction_pdf` only ever see
/// the diffuse component, since the specular component is a Dirac delta
/// that can't be evaluated off the sampled direction (spec §4.5.3 — the
/// implementation must flag specular vertices and fold their contribution
/// into the adjacent MIS ratio directly).
#[derive(Copy, Clone, Debug)]
pub struct All {
    pub albedo: Vec3f,
    pub eta: Float,
}

impl All {
    fn diffuse(&self) -> Diffuse {
        Diffuse { albedo: self.albedo }
    }
}

impl Directional for All {
    fn sample_direction(&self, q: &GbsdfQuery, sampler: &mut dyn Sampler) -> Option<SampleResult> {
        let n = face_forward(q.geom.sn, q.wi);
        let cos_i = q.wi.dot(n).abs();
        let fr = fresnel_dielectric_schlick(cos_i, self.eta);
        if sampler.next() < fr {
            let wo = (-q.wi + n * (2.0 * q.wi.dot(n))).normalize();
            let cos_o = wo.dot(n).abs();
            let value = if cos_o > 0.0 {
                Vec3f::splat(fr) / cos_o
            } else {
                Vec3f::splat(0.0)
            };
            Some(SampleResult {
                wo,
                sampled_type: BsdfType::SPECULAR | BsdfType::REFLECTION,
                pdf: PdfEval::new(fr, Measure::Discrete),
                value,
            })
        } else {
            self.diffuse().sample_direction(q, sampler).map(|mut r| {
                r.pdf.v *= 1.0 - fr;
                r.value *= 1.0 - fr;
                r
            })
        }
    }

    fn evaluate_direction(&self, q: &GbsdfQuery, wo: Vec3f) -> Vec3f {
        let n = face_forward(q.geom.sn, q.wi);
        let cos_i = q.wi.dot(n).abs();
        let fr = fresnel_dielectric_schlick(cos_i, self.eta);
        self.diffuse().evaluate_direction(q, wo) * (1.0 - fr)
    }

    fn evaluate_direction_pdf(&self, q: &GbsdfQuery, wo: Vec3f) -> PdfEval {
        let n = face_forward(q.geom.sn, q.wi);
        let cos_i = q.wi.dot(n).abs();
        let fr = fresnel_dielectric_schlick(cos_i, self.eta);
        let mut pdf = self.diffuse().evaluate_direction_pdf(q, wo);
        pdf.v *= 1.0 - fr;
        pdf
    }

    fn bsdf_type(&self) -> BsdfType {
        BsdfType::DIFFUSE | BsdfType::SPECULAR | BsdfType::REFLECTION
    }
}

/// Unused directly but documents which transport directions need the
/// shading-normal correction at call sites in the BPT core.
pub const ADJOINT_TRANSPORT: TransportDirection = TransportDirection::LightToEye;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interaction::SurfaceGeometry;
    use crate::vec::Point2f;

    struct FixedSampler(Vec<Float>, usize);
    impl Clone for FixedSampler {
        fn clone(&self) -> Self {
            FixedSampler(self.0.clone(), self.1)
        }
    }
    impl Sampler for FixedSampler {
        fn next(&mut self) -> Float {
            let v = self.0[self.1 % self.0.len()];
            self.1 += 1;
            v
        }
        fn next_uint(&mut self) -> u32 {
            0
        }
        fn set_seed(&mut self, _seed: u32) {}
    }

    fn flat_geom() -> SurfaceGeometry {
        SurfaceGeometry::build_frame(
            Vec3f::new(0.0, 0.0, 0.0),
            Vec3f::new(0.0, 0.0, 1.0),
            Vec3f::new(0.0, 0.0, 1.0),
            Point2f::new(0.0, 0.0),
        )
    }

    #[test]
    fn diffuse_pdf_roundtrips_through_sample() {
        let d = Diffuse {
            albedo: Vec3f::splat(0.8),
        };
        let q = GbsdfQuery {
            geom: flat_geom(),
            wi: Vec3f::new(0.0, 0.0, 1.0),
            transport: TransportDirection::EyeToLight,
            raster_hint: None,
        };
        let mut sampler = FixedSampler(vec![0.3, 0.7], 0);
        let result = d.sample_direction(&q, &mut sampler).expect("diffuse should sample");
        let pdf = d.evaluate_direction_pdf(&q, result.wo);
        assert!((pdf.v - result.pdf.v).abs() < 1e-4);
    }

    #[test]
    fn diffuse_is_zero_across_hemisphere() {
        let d = Diffuse {
            albedo: Vec3f::splat(1.0),
        };
        let q = GbsdfQuery {
            geom: flat_geom(),
            wi: Vec3f::new(0.0, 0.0, 1.0),
            transport: TransportDirection::EyeToLight,
            raster_hint: None,
        };
        let wo = Vec3f::new(0.0, 0.0, -1.0);
        assert_eq!(d.evaluate_direction(&q, wo), Vec3f::splat(0.0));
    }
}
