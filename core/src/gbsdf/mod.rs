//! The generalized BSDF (GBSDF): a single sealed enum covering surface BSDFs
//! and the directional components of emitters and sensors (spec §3, §9
//! Design Notes "Virtual GBSDF interface"). Dispatch is a `match`, not a
//! vtable call, so `sample_direction` inlines cleanly on the BPT hot path;
//! the component registry stays dynamic (string → constructor) but only at
//! load time (`io`), never at render time.

pub mod arealight;
pub mod camera;
pub mod glossy;
pub mod specular;
pub mod surface;

use bitflags::bitflags;

use crate::interaction::SurfaceGeometry;
use crate::pdf::PdfEval;
use crate::sampler::Sampler;
use crate::vec::{Point2f, Vec3f};

bitflags! {
    /// Capability flags over `{Diffuse, Specular, Glossy} × {Reflection,
    /// Transmission}` plus the two directional roles, matching spec §3.
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct BsdfType: u32 {
        const DIFFUSE        = 1 << 0;
        const SPECULAR       = 1 << 1;
        const GLOSSY         = 1 << 2;
        const REFLECTION     = 1 << 3;
        const TRANSMISSION   = 1 << 4;
        const LIGHT_DIRECTION = 1 << 5;
        const EYE_DIRECTION   = 1 << 6;
    }
}

impl BsdfType {
    #[inline]
    pub fn is_specular(self) -> bool {
        self.contains(BsdfType::SPECULAR)
    }
}

/// Which end of the light-transport path a vertex's throughput is carried
/// from: radiance flows eye-to-light, importance flows light-to-eye. Selects
/// the adjoint branch of BSDF evaluation (spec §3, §4.5.1f).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TransportDirection {
    EyeToLight,
    LightToEye,
}

impl TransportDirection {
    #[inline]
    pub fn flip(self) -> TransportDirection {
        match self {
            TransportDirection::EyeToLight => TransportDirection::LightToEye,
            TransportDirection::LightToEye => TransportDirection::EyeToLight,
        }
    }
}

/// Inputs shared by `sample_direction`/`evaluate_direction`/
/// `evaluate_direction_pdf`.
#[derive(Copy, Clone, Debug)]
pub struct GbsdfQuery {
    pub geom: SurfaceGeometry,
    /// Incoming direction, world space, pointing away from the surface
    /// (toward the previous vertex). Meaningless at an endpoint with no
    /// previous vertex yet (the very first `sample_direction` call on a
    /// camera or light); camera variants read `raster_hint` instead.
    pub wi: Vec3f,
    pub transport: TransportDirection,
    /// Which point within the pixel footprint to generate a ray through,
    /// in `[0,1)²` raster-fraction space. Only consulted by
    /// [`camera::PerspectiveCameraDir`] / [`camera::ThinLensCameraDir`]
    /// when sampling the very first direction out of the camera endpoint.
    pub raster_hint: Option<Point2f>,
}

/// Result of `sample_direction`: outgoing direction, sampled type, its PDF,
/// and the already-evaluated scalar-triple `value`. Carrying `value` here
/// (rather than making the caller re-call `evaluate_direction`) is what lets
/// specular/delta implementations participate at all — `evaluate_direction`
/// is always zero off the exact sampled direction for a Dirac delta, so the
/// *only* place its value is ever known is right here, at sample time.
#[derive(Copy, Clone, Debug)]
pub struct SampleResult {
    pub wo: Vec3f,
    pub sampled_type: BsdfType,
    pub pdf: PdfEval,
    /// For non-specular types, equals `evaluate_direction(q, wo)`. For
    /// specular types, the delta-cancelled throughput value (already
    /// includes any internal `1/|cos θ|` factor so that
    /// `value · |cos θ| / pdf.v` collapses correctly in the β update).
    pub value: Vec3f,
}

/// The sealed set of directional GBSDF implementations.
#[derive(Copy, Clone, Debug)]
pub enum Gbsdf {
    Diffuse(surface::Diffuse),
    Dielectric(specular::Dielectric),
    Mirror(specular::Mirror),
    Glass(specular::Glass),
    Glossy(glossy::Glossy),
    All(surface::All),
    PerspectiveCameraDir(camera::PerspectiveCameraDir),
    ThinLensCameraDir(camera::ThinLensCameraDir),
    AreaLightDir(arealight::AreaLightDir),
}

impl Gbsdf {
    pub fn sample_direction(&self, q: &GbsdfQuery, sampler: &mut dyn Sampler) -> Option<SampleResult> {
        match self {
            Gbsdf::Diffuse(b) => b.sample_direction(q, sampler),
            Gbsdf::Dielectric(b) => b.sample_direction(q, sampler),
            Gbsdf::Mirror(b) => b.sample_direction(q, sampler),
            Gbsdf::Glass(b) => b.sample_direction(q, sampler),
            Gbsdf::Glossy(b) => b.sample_direction(q, sampler),
            Gbsdf::All(b) => b.sample_direction(q, sampler),
            Gbsdf::PerspectiveCameraDir(b) => b.sample_direction(q, sampler),
            Gbsdf::ThinLensCameraDir(b) => b.sample_direction(q, sampler),
            Gbsdf::AreaLightDir(b) => b.sample_direction(q, sampler),
        }
    }

    pub fn evaluate_direction(&self, q: &GbsdfQuery, wo: Vec3f) -> Vec3f {
        match self {
            Gbsdf::Diffuse(b) => b.evaluate_direction(q, wo),
            Gbsdf::Dielectric(b) => b.evaluate_direction(q, wo),
            Gbsdf::Mirror(b) => b.evaluate_direction(q, wo),
            Gbsdf::Glass(b) => b.evaluate_direction(q, wo),
            Gbsdf::Glossy(b) => b.evaluate_direction(q, wo),
            Gbsdf::All(b) => b.evaluate_direction(q, wo),
            Gbsdf::PerspectiveCameraDir(b) => b.evaluate_direction(q, wo),
            Gbsdf::ThinLensCameraDir(b) => b.evaluate_direction(q, wo),
            Gbsdf::AreaLightDir(b) => b.evaluate_direction(q, wo),
        }
    }

    pub fn evaluate_direction_pdf(&self, q: &GbsdfQuery, wo: Vec3f) -> PdfEval {
        match self {
            Gbsdf::Diffuse(b) => b.evaluate_direction_pdf(q, wo),
            Gbsdf::Dielectric(b) => b.evaluate_direction_pdf(q, wo),
            Gbsdf::Mirror(b) => b.evaluate_direction_pdf(q, wo),
            Gbsdf::Glass(b) => b.evaluate_direction_pdf(q, wo),
            Gbsdf::Glossy(b) => b.evaluate_direction_pdf(q, wo),
            Gbsdf::All(b) => b.evaluate_direction_pdf(q, wo),
            Gbsdf::PerspectiveCameraDir(b) => b.evaluate_direction_pdf(q, wo),
            Gbsdf::ThinLensCameraDir(b) => b.evaluate_direction_pdf(q, wo),
            Gbsdf::AreaLightDir(b) => b.evaluate_direction_pdf(q, wo),
        }
    }

    pub fn bsdf_type(&self) -> BsdfType {
        match self {
            Gbsdf::Diffuse(b) => b.bsdf_type(),
            Gbsdf::Dielectric(b) => b.bsdf_type(),
            Gbsdf::Mirror(b) => b.bsdf_type(),
            Gbsdf::Glass(b) => b.bsdf_type(),
            Gbsdf::Glossy(b) => b.bsdf_type(),
            Gbsdf::All(b) => b.bsdf_type(),
            Gbsdf::PerspectiveCameraDir(b) => b.bsdf_type(),
            Gbsdf::ThinLensCameraDir(b) => b.bsdf_type(),
            Gbsdf::AreaLightDir(b) => b.bsdf_type(),
        }
    }

    #[inline]
    pub fn is_specular(&self) -> bool {
        self.bsdf_type().is_specular()
    }

    /// Samples the camera's position endpoint (lens center, or a point on a
    /// finite-area lens). Panics on any non-camera variant — callers only
    /// invoke this through a `Primitive::camera` slot, which the sealed enum
    /// cannot mix up with a light or surface BSDF.
    pub fn sample_camera_position(&self, u: Point2f) -> (Vec3f, PdfEval) {
        match self {
            Gbsdf::PerspectiveCameraDir(c) => c.sample_position(),
            Gbsdf::ThinLensCameraDir(c) => c.sample_position(u),
            _ => panic!("sample_camera_position called on a non-camera GBSDF"),
        }
    }

    /// The camera's optical axis in world space, used to build a degenerate
    /// surface frame at the camera endpoint.
    pub fn camera_forward(&self) -> Vec3f {
        match self {
            Gbsdf::PerspectiveCameraDir(c) => c.forward(),
            Gbsdf::ThinLensCameraDir(c) => c.forward(),
            _ => panic!("camera_forward called on a non-camera GBSDF"),
        }
    }

    /// Projects a world-space direction out of the camera endpoint back onto
    /// the raster plane, the inverse of the direction sampling performed
    /// inside `sample_direction` with a `raster_hint` (spec §4.5.2
    /// `camera.ray_to_raster`, used by the `t = 1` light-tracing connection
    /// strategy to find which pixel a light subpath vertex splats into).
    pub fn camera_ray_to_raster(&self, d: Vec3f) -> Option<Point2f> {
        match self {
            Gbsdf::PerspectiveCameraDir(c) => c.ray_to_raster(d),
            Gbsdf::ThinLensCameraDir(c) => c.ray_to_raster(d),
            _ => panic!("camera_ray_to_raster called on a non-camera GBSDF"),
        }
    }
}

/// The capability trio every concrete implementation provides (spec §9
/// "Deep-inheritance BSDF hierarchy"). Not an object-safe `dyn` trait on the
/// hot path — `Gbsdf::sample_direction` et al. `match` directly — but useful
/// to state the shared shape and let each submodule's unit tests call it
/// uniformly.
pub trait Directional {
    fn sample_direction(&self, q: &GbsdfQuery, sampler: &mut dyn Sampler) -> Option<SampleResult>;
    fn evaluate_direction(&self, q: &GbsdfQuery, wo: Vec3f) -> Vec3f;
    fn evaluate_direction_pdf(&self, q: &GbsdfQuery, wo: Vec3f) -> PdfEval;
    fn bsdf_type(&self) -> BsdfType;
}

/// Schlick's approximation to the Fresnel reflectance of an unpolarized
/// dielectric interface, `cos_i` measured from the surface normal on the
/// incident side.
#[inline]
pub fn fresnel_dielectric_schlick(cos_i: crate::pbrt::Float, eta: crate::pbrt::Float) -> crate::pbrt::Float {
    let r0 = ((eta - 1.0) / (eta + 1.0)).powi(2);
    let c = 1.0 - cos_i.abs();
    r0 + (1.0 - r0) * c.powi(5)
}

/// Shading-normal correction factor applied to adjoint (light-to-eye)
/// throughput at non-specular vertices, to preserve energy conservation when
/// `sn != gn` (spec §4.5.1f, §9 "shading-normal correction... canonical
/// rule"):  `|wi·gn| |wo·sn| / (|wi·sn| |wo·gn|)`.
pub fn shading_normal_correction(geom: &SurfaceGeometry, wi: Vec3f, wo: Vec3f) -> crate::pbrt::Float {
    use crate::vec::Dot;
    let num = wi.dot(geom.gn).abs() * wo.dot(geom.sn).abs();
    let den = wi.dot(geom.sn).abs() * wo.dot(geom.gn).abs();
    if den > 0.0 {
        num / den
    } else {
        0.0
    }
}

/// Random point sample generator used by all `sample_direction`
/// implementations below.
pub(crate) fn sample_u2(sampler: &mut dyn Sampler) -> Point2f {
    sampler.next_vec2()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn correction_is_one_when_shading_and_geometric_normals_agree() {
        let geom = SurfaceGeometry::build_frame(Vec3f::splat(0.0), Vec3f::new(0.0, 0.0, 1.0), Vec3f::new(0.0, 0.0, 1.0), Point2f::new(0.0, 0.0));
        let wi = Vec3f::new(0.3, 0.1, 1.0).normalize();
        let wo = Vec3f::new(-0.2, 0.4, 1.0).normalize();
        let factor = shading_normal_correction(&geom, wi, wo);
        assert!((factor - 1.0).abs() < 1e-4);
    }

    #[test]
    fn correction_diverges_from_one_when_normals_disagree() {
        let gn = Vec3f::new(0.0, 0.0, 1.0);
        let sn = Vec3f::new(0.3, 0.0, 1.0).normalize();
        let geom = SurfaceGeometry::build_frame(Vec3f::splat(0.0), gn, sn, Point2f::new(0.0, 0.0));
        let wi = Vec3f::new(0.0, 0.0, 1.0);
        let wo = Vec3f::new(0.6, 0.0, 1.0).normalize();
        let factor = shading_normal_correction(&geom, wi, wo);
        assert!((factor - 1.0).abs() > 1e-3);
        assert!(factor > 0.0);
    }

    #[test]
    fn correction_is_zero_when_geometric_grazing_angle_vanishes() {
        let gn = Vec3f::new(0.0, 0.0, 1.0);
        let sn = Vec3f::new(0.0, 0.0, 1.0);
        let geom = SurfaceGeometry::build_frame(Vec3f::splat(0.0), gn, sn, Point2f::new(0.0, 0.0));
        let wi = Vec3f::new(1.0, 0.0, 0.0);
        let wo = Vec3f::new(0.0, 0.0, 1.0);
        assert_eq!(shading_normal_correction(&geom, wi, wo), 0.0);
    }
}
