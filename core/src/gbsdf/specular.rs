//! Delta (specular) BSDFs: mirror reflection, Fresnel-reflective dielectric
//! coatings, and full transmissive glass. All three are Dirac deltas in
//! direction — `evaluate_direction`/`evaluate_direction_pdf` always return
//! zero off the exact sampled direction, per spec §9's note that specular
//! factors are "conceptually zero in area measure" and must be folded into
//! the adjacent MIS ratio directly rather than evaluated independently.

use crate::gbsdf::{fresnel_dielectric_schlick, BsdfType, Directional, GbsdfQuery, SampleResult};
use crate::pbrt::Float;
use crate::pdf::{Measure, PdfEval};
use crate::sampler::Sampler;
use crate::vec::{face_forward, Dot, Vec3f};

/// A perfect mirror: `wo = reflect(wi, n)`, throughput `albedo / |cos θ|` so
/// that `f · cos θ = albedo` exactly (the usual specular-BSDF convention).
#[derive(Copy, Clone, Debug)]
pub struct Mirror {
    pub albedo: Vec3f,
}

impl Directional for Mirror {
    fn sample_direction(&self, q: &GbsdfQuery, _sampler: &mut dyn Sampler) -> Option<SampleResult> {
        let n = face_forward(q.geom.sn, q.wi);
        let wo = (-q.wi + n * (2.0 * q.wi.dot(n))).normalize();
        Some(SampleResult {
            wo,
            sampled_type: self.bsdf_type(),
            pdf: PdfEval::new(1.0, Measure::Discrete),
            value: specular_throughput(self.albedo, wo.dot(n).abs()),
        })
    }

    fn evaluate_direction(&self, _q: &GbsdfQuery, _wo: Vec3f) -> Vec3f {
        Vec3f::splat(0.0)
    }

    fn evaluate_direction_pdf(&self, _q: &GbsdfQuery, _wo: Vec3f) -> PdfEval {
        PdfEval::zero(Measure::Discrete)
    }

    fn bsdf_type(&self) -> BsdfType {
        BsdfType::SPECULAR | BsdfType::REFLECTION
    }
}

/// Throughput returned for a specular bounce: `albedo` (or the Fresnel- or
/// transmittance-weighted variant) divided by `|cos θ_o|`, so the caller's
/// `β *= f_s · |cos θ| / pdf_projected` recovers exactly `albedo / pdf`.
#[inline]
fn specular_throughput(value: Vec3f, cos_o: Float) -> Vec3f {
    if cos_o > 0.0 {
        value / cos_o
    } else {
        Vec3f::splat(0.0)
    }
}

/// A smooth dielectric interface that only reflects (a Fresnel-weighted
/// mirror coat, e.g. polished varnish over an otherwise inert substrate).
/// Distinguished from [`Glass`] below, which also transmits.
#[derive(Copy, Clone, Debug)]
pub struct Dielectric {
    pub eta: Float,
}

impl Directional for Dielectric {
    fn sample_direction(&self, q: &GbsdfQuery, _sampler: &mut dyn Sampler) -> Option<SampleResult> {
        let n = face_forward(q.geom.sn, q.wi);
        let cos_i = q.wi.dot(n).abs();
        let fr = fresnel_dielectric_schlick(cos_i, self.eta);
        let wo = (-q.wi + n * (2.0 * q.wi.dot(n))).normalize();
        Some(SampleResult {
            wo,
            sampled_type: BsdfType::SPECULAR | BsdfType::REFLECTION,
            pdf: PdfEval::new(1.0, Measure::Discrete),
            value: specular_throughput(Vec3f::splat(fr), wo.dot(n).abs()),
        })
    }

    fn evaluate_direction(&self, _q: &GbsdfQuery, _wo: Vec3f) -> Vec3f {
        Vec3f::splat(0.0)
    }

    fn evaluate_direction_pdf(&self, _q: &GbsdfQuery, _wo: Vec3f) -> PdfEval {
        PdfEval::zero(Measure::Discrete)
    }

    fn bsdf_type(&self) -> BsdfType {
        BsdfType::SPECULAR | BsdfType::REFLECTION
    }
}

/// Full smooth glass: reflects with probability `Fr(cos θ_i)` and refracts
/// otherwise, using Snell's law with relative index of refraction `eta`
/// (the ratio `eta_transmitted / eta_incident`, `> 1` entering a denser
/// medium). Total internal reflection forces the reflective branch.
#[derive(Copy, Clone, Debug)]
pub struct Glass {
    pub eta: Float,
}

impl Directional for Glass {
    fn sample_direction(&self, q: &GbsdfQuery, sampler: &mut dyn Sampler) -> Option<SampleResult> {
        let geometric_n = q.geom.sn;
        let entering = q.wi.dot(geometric_n) > 0.0;
        let (n, eta) = if entering {
            (geometric_n, 1.0 / self.eta)
        } else {
            (-geometric_n, self.eta)
        };
        let cos_i = q.wi.dot(n).abs();
        let fr = fresnel_dielectric_schlick(cos_i, self.eta);

        let sin2_t = eta * eta * (1.0 - cos_i * cos_i).max(0.0);
        let total_internal_reflection = sin2_t >= 1.0;

        if total_internal_reflection || sampler.next() < fr {
            let wo = (-q.wi + n * (2.0 * q.wi.dot(n))).normalize();
            let branch_pdf = if total_internal_reflection { 1.0 } else { fr };
            Some(SampleResult {
                wo,
                sampled_type: BsdfType::SPECULAR | BsdfType::REFLECTION,
                pdf: PdfEval::new(branch_pdf, Measure::Discrete),
                value: specular_throughput(Vec3f::splat(branch_pdf), wo.dot(n).abs()),
            })
        } else {
            let cos_t = (1.0 - sin2_t).max(0.0).sqrt();
            let wo = (-q.wi * eta + n * (eta * cos_i - cos_t)).normalize();
            let branch_pdf = 1.0 - fr;
            Some(SampleResult {
                wo,
                sampled_type: BsdfType::SPECULAR | BsdfType::TRANSMISSION,
                pdf: PdfEval::new(branch_pdf, Measure::Discrete),
                value: specular_throughput(Vec3f::splat(branch_pdf), wo.dot(n).abs()),
            })
        }
    }

    fn evaluate_direction(&self, _q: &GbsdfQuery, _wo: Vec3f) -> Vec3f {
        Vec3f::splat(0.0)
    }

    fn evaluate_direction_pdf(&self, _q: &GbsdfQuery, _wo: Vec3f) -> PdfEval {
        PdfEval::zero(Measure::Discrete)
    }

    fn bsdf_type(&self) -> BsdfType {
        BsdfType::SPECULAR | BsdfType::REFLECTION | BsdfType::TRANSMISSION
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gbsdf::TransportDirection;
    use crate::interaction::SurfaceGeometry;
    use crate::vec::Point2f;

    #[derive(Clone)]
    struct ZeroSampler;
    impl Sampler for ZeroSampler {
        fn next(&mut self) -> Float {
            0.0
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
    fn mirror_reflects_about_normal() {
        let m = Mirror {
            albedo: Vec3f::splat(1.0),
        };
        let q = GbsdfQuery {
            geom: flat_geom(),
            wi: Vec3f::new(0.3, 0.0, 0.95).normalize(),
            transport: TransportDirection::EyeToLight,
            raster_hint: None,
        };
        let mut s = ZeroSampler;
        let r = m.sample_direction(&q, &mut s).unwrap();
        assert!((r.wo.x - (-q.wi.x)).abs() < 1e-4);
        assert!((r.wo.z - q.wi.z).abs() < 1e-4);
    }

    #[test]
    fn glass_never_evaluates_off_the_delta() {
        let g = Glass { eta: 1.5 };
        let q = GbsdfQuery {
            geom: flat_geom(),
            wi: Vec3f::new(0.0, 0.0, 1.0),
            transport: TransportDirection::EyeToLight,
            raster_hint: None,
        };
        assert_eq!(g.evaluate_direction(&q, Vec3f::new(0.0, 0.0, -1.0)), Vec3f::splat(0.0));
        assert!(g.evaluate_direction_pdf(&q, Vec3f::new(0.0, 0.0, -1.0)).is_zero());
    }
}
