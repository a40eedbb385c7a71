//! Glossy reflection: an importance-sampled Phong specular lobe about the
//! mirror direction, for a non-delta "shiny but not mirror-sharp" surface.

use crate::gbsdf::{sample_u2, BsdfType, Directional, GbsdfQuery, SampleResult};
use crate::pbrt::{Float, TWO_PI};
use crate::pdf::{Measure, PdfEval};
use crate::sampler::Sampler;
use crate::vec::{coordinate_system, face_forward, Dot, Point2f, Vec3f};

/// `f(wi, wo) = albedo · (n+2)/(2π) · max(0, cos α)^n`, where `α` is the
/// angle between `wo` and the perfect mirror direction, sampled by warping
/// a canonical Phong lobe about `+z` and rotating it onto the mirror axis.
#[derive(Copy, Clone, Debug)]
pub struct Glossy {
    pub albedo: Vec3f,
    pub exponent: Float,
}

impl Glossy {
    fn mirror_direction(&self, n: Vec3f, wi: Vec3f) -> Vec3f {
        (-wi + n * (2.0 * wi.dot(n))).normalize()
    }

    fn lobe_pdf(&self, cos_alpha: Float) -> Float {
        if cos_alpha <= 0.0 {
            0.0
        } else {
            (self.exponent + 1.0) / TWO_PI * cos_alpha.powf(self.exponent)
        }
    }

    fn lobe_value(&self, cos_alpha: Float) -> Vec3f {
        if cos_alpha <= 0.0 {
            Vec3f::splat(0.0)
        } else {
            self.albedo * ((self.exponent + 2.0) / TWO_PI * cos_alpha.powf(self.exponent))
        }
    }
}

impl Directional for Glossy {
    fn sample_direction(&self, q: &GbsdfQuery, sampler: &mut dyn Sampler) -> Option<SampleResult> {
        let n = face_forward(q.geom.sn, q.wi);
        let mirror = self.mirror_direction(n, q.wi);

        let u: Point2f = sample_u2(sampler);
        let cos_alpha = u.x.powf(1.0 / (self.exponent + 1.0));
        let sin_alpha = (1.0 - cos_alpha * cos_alpha).max(0.0).sqrt();
        let phi = TWO_PI * u.y;
        let local = Vec3f::new(sin_alpha * phi.cos(), sin_alpha * phi.sin(), cos_alpha);

        let (t1, t2) = coordinate_system(mirror);
        let wo = (t1 * local.x + t2 * local.y + mirror * local.z).normalize();
        let wo = face_forward(wo, n);

        let cos_theta = wo.dot(n).abs();
        if cos_theta <= 0.0 {
            return None;
        }
        let cos_alpha_actual = wo.dot(mirror).max(0.0);
        let pdf_solid_angle = self.lobe_pdf(cos_alpha_actual);
        if pdf_solid_angle <= 0.0 {
            return None;
        }
        let value = self.lobe_value(cos_alpha_actual);
        Some(SampleResult {
            wo,
            sampled_type: self.bsdf_type(),
            pdf: PdfEval::new(pdf_solid_angle / cos_theta, Measure::ProjectedSolidAngle),
            value,
        })
    }

    fn evaluate_direction(&self, q: &GbsdfQuery, wo: Vec3f) -> Vec3f {
        let n = face_forward(q.geom.sn, q.wi);
        if wo.dot(n) <= 0.0 {
            return Vec3f::splat(0.0);
        }
        let mirror = self.mirror_direction(n, q.wi);
        self.lobe_value(wo.dot(mirror).max(0.0))
    }

    fn evaluate_direction_pdf(&self, q: &GbsdfQuery, wo: Vec3f) -> PdfEval {
        let n = face_forward(q.geom.sn, q.wi);
        let cos_theta = wo.dot(n);
        if cos_theta <= 0.0 {
            return PdfEval::zero(Measure::ProjectedSolidAngle);
        }
        let mirror = self.mirror_direction(n, q.wi);
        let pdf_solid_angle = self.lobe_pdf(wo.dot(mirror).max(0.0));
        PdfEval::new(pdf_solid_angle / cos_theta, Measure::ProjectedSolidAngle)
    }

    fn bsdf_type(&self) -> BsdfType {
        BsdfType::GLOSSY | BsdfType::REFLECTION
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gbsdf::TransportDirection;
    use crate::interaction::SurfaceGeometry;

    #[derive(Clone)]
    struct FixedSampler(Float, Float);
    impl Sampler for FixedSampler {
        fn next(&mut self) -> Float {
            self.0
        }
        fn next_uint(&mut self) -> u32 {
            0
        }
        fn next_vec2(&mut self) -> Point2f {
            Point2f::new(self.0, self.1)
        }
        fn set_seed(&mut self, _seed: u32) {}
    }

    fn flat_geom() -> SurfaceGeometry {
        SurfaceGeometry::build_frame(
            Vec3f::new(0.0, 0.0, 0.0),
            Vec3f::new(0.0, 0.0, 1.0),
            Vec3f::new(0.0, 0.0, 1.0),
            crate::vec::Point2f::new(0.0, 0.0),
        )
    }

    #[test]
    fn glossy_pdf_roundtrips_through_sample() {
        let g = Glossy {
            albedo: Vec3f::splat(0.9),
            exponent: 20.0,
        };
        let q = GbsdfQuery {
            geom: flat_geom(),
            wi: Vec3f::new(0.0, 0.0, 1.0),
            transport: TransportDirection::EyeToLight,
            raster_hint: None,
        };
        let mut sampler = FixedSampler(0.4, 0.6);
        let result = g.sample_direction(&q, &mut sampler).expect("glossy should sample");
        let pdf = g.evaluate_direction_pdf(&q, result.wo);
        assert!((pdf.v - result.pdf.v).abs() < 1e-3);
    }

    #[test]
    fn glossy_peaks_near_mirror_direction() {
        let g = Glossy {
            albedo: Vec3f::splat(1.0),
            exponent: 50.0,
        };
        let q = GbsdfQuery {
            geom: flat_geom(),
            wi: Vec3f::new(0.0, 0.0, 1.0),
            transport: TransportDirection::EyeToLight,
            raster_hint: None,
        };
        let mirror = Vec3f::new(0.0, 0.0, 1.0);
        let off_axis = Vec3f::new(0.5, 0.0, 0.5).normalize();
        let at_mirror = g.evaluate_direction(&q, mirror);
        let off = g.evaluate_direction(&q, off_axis);
        assert!(at_mirror.x > off.x);
    }
}
