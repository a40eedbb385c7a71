//! The directional component of a diffuse area light: cosine-weighted
//! emission into the upper hemisphere above the emitting surface (spec §3's
//! Emitter extension). Position sampling over the light's mesh (area-weighted
//! by triangle, producing a `Measure::Area` PDF) is handled by the `lights`
//! crate, which owns the mesh and its `Distribution1D`; this type only knows
//! about the emission direction given a fixed point already on the surface.

use crate::gbsdf::{sample_u2, BsdfType, Directional, GbsdfQuery, SampleResult};
use crate::pbrt::Float;
use crate::pdf::{Measure, PdfEval};
use crate::sampler::Sampler;
use crate::vec::{face_forward, Dot, Vec3f};
use crate::warp::cosine_sample_hemisphere;

/// A diffuse (Lambertian) emitter: radiant exitance `radiance` is uniform
/// over the hemisphere above `gn`, so `Le(wo) = radiance` for `wo` on the
/// same side as the geometric normal, zero otherwise.
#[derive(Copy, Clone, Debug)]
pub struct AreaLightDir {
    pub radiance: Vec3f,
    /// Emit from both sides of the surface, not just along `+gn`.
    pub two_sided: bool,
}

impl AreaLightDir {
    fn emits_toward(&self, geom_n: Vec3f, wo: Vec3f) -> bool {
        let c = wo.dot(geom_n);
        c > 0.0 || (self.two_sided && c < 0.0)
    }
}

impl Directional for AreaLightDir {
    fn sample_direction(&self, q: &GbsdfQuery, sampler: &mut dyn Sampler) -> Option<SampleResult> {
        // `q.wi` is meaningless at an emission endpoint (no previous
        // vertex); the side to emit from is whichever hemisphere of `gn`
        // faces the already-chosen shading normal (they coincide for a flat
        // emitter, but `face_forward` keeps this correct for curved meshes).
        let n = if self.two_sided && sampler.next() < 0.5 {
            -q.geom.gn
        } else {
            q.geom.gn
        };
        let local = cosine_sample_hemisphere(sample_u2(sampler));
        let wo = face_forward(q.geom.to_world(local).normalize(), n);
        let cos_theta = wo.dot(n).abs();
        if cos_theta <= 0.0 {
            return None;
        }
        let pdf_solid_angle = crate::warp::cosine_hemisphere_pdf(cos_theta);
        if pdf_solid_angle <= 0.0 {
            return None;
        }
        Some(SampleResult {
            wo,
            sampled_type: self.bsdf_type(),
            pdf: crate::pdf::convert_to_projected_solid_angle(
                PdfEval::new(pdf_solid_angle, Measure::SolidAngle),
                cos_theta,
            ),
            value: self.radiance,
        })
    }

    fn evaluate_direction(&self, q: &GbsdfQuery, wo: Vec3f) -> Vec3f {
        if self.emits_toward(q.geom.gn, wo) {
            self.radiance
        } else {
            Vec3f::splat(0.0)
        }
    }

    fn evaluate_direction_pdf(&self, q: &GbsdfQuery, wo: Vec3f) -> PdfEval {
        if !self.emits_toward(q.geom.gn, wo) {
            return PdfEval::zero(Measure::ProjectedSolidAngle);
        }
        let cos_theta = wo.dot(q.geom.gn).abs();
        let pdf_solid_angle = crate::warp::cosine_hemisphere_pdf(cos_theta);
        crate::pdf::convert_to_projected_solid_angle(PdfEval::new(pdf_solid_angle, Measure::SolidAngle), cos_theta)
    }

    fn bsdf_type(&self) -> BsdfType {
        BsdfType::DIFFUSE | BsdfType::LIGHT_DIRECTION
    }
}
