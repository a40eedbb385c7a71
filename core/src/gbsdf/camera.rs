//! Directional GBSDF components of the camera endpoint. The raster ↔ ray
//! mapping itself (`ray_to_raster`) lives in the `cameras` crate, alongside
//! film ownership — these types only carry the parameters and importance
//! function needed to sample/evaluate a direction out of a fixed camera
//! position, given a raster-space point on the image plane (spec §4.5.1,
//! §4.5.2).

use crate::gbsdf::{BsdfType, Directional, GbsdfQuery, SampleResult};
use crate::mat::Transform;
use crate::pbrt::Float;
use crate::pdf::{Measure, PdfEval};
use crate::sampler::Sampler;
use crate::vec::{Dot, Point2f, Vec3f};

/// Maps a raster-fraction point `(u, v) ∈ [0,1)²` to a unit direction in
/// camera space, looking down `+z`.
pub fn raster_to_camera_dir(raster: Point2f, fov_y: Float, aspect: Float) -> Vec3f {
    let tan_half = (fov_y * 0.5).tan();
    let screen_x = (2.0 * raster.x - 1.0) * aspect * tan_half;
    let screen_y = (1.0 - 2.0 * raster.y) * tan_half;
    Vec3f::new(screen_x, screen_y, 1.0).normalize()
}

/// The image-plane area in camera space at `z = 1`, used by the pinhole
/// importance function `We = 1 / (A · cos⁴θ)`.
#[inline]
pub fn image_plane_area(fov_y: Float, aspect: Float) -> Float {
    let side = 2.0 * (fov_y * 0.5).tan();
    side * side * aspect
}

/// Inverts [`raster_to_camera_dir`]: given a camera-space direction,
/// returns the raster-fraction point it was generated from, or `None` if
/// the direction points behind the camera or falls outside `[0,1)²` (spec
/// §4.5.2 `camera.ray_to_raster`).
pub fn camera_dir_to_raster(dir_camera: Vec3f, fov_y: Float, aspect: Float) -> Option<Point2f> {
    if dir_camera.z <= 0.0 {
        return None;
    }
    let tan_half = (fov_y * 0.5).tan();
    let screen_x = dir_camera.x / dir_camera.z;
    let screen_y = dir_camera.y / dir_camera.z;
    let u = (screen_x / (aspect * tan_half) + 1.0) * 0.5;
    let v = (1.0 - screen_y / tan_half) * 0.5;
    if (0.0..1.0).contains(&u) && (0.0..1.0).contains(&v) {
        Some(Point2f::new(u, v))
    } else {
        None
    }
}

/// A pinhole perspective camera: zero-area lens, so both position and
/// direction sampling are Dirac deltas (`Measure::Discrete`) — exactly one
/// ray per raster sample.
#[derive(Copy, Clone, Debug)]
pub struct PerspectiveCameraDir {
    pub camera_to_world: Transform,
    pub fov_y: Float,
    pub aspect: Float,
}

impl PerspectiveCameraDir {
    fn we(&self, cos_theta: Float) -> Float {
        if cos_theta <= 0.0 {
            return 0.0;
        }
        let a = image_plane_area(self.fov_y, self.aspect);
        1.0 / (a * cos_theta.powi(4))
    }

    pub fn forward(&self) -> Vec3f {
        self.camera_to_world.transform_vector(Vec3f::new(0.0, 0.0, 1.0)).normalize()
    }

    /// Projects a world-space direction back onto the image plane.
    pub fn ray_to_raster(&self, d: Vec3f) -> Option<Point2f> {
        let dir_camera = self.camera_to_world.inv.transform_vector(d);
        camera_dir_to_raster(dir_camera, self.fov_y, self.aspect)
    }

    /// Position endpoint: a single point, the lens center — a Dirac delta in
    /// area measure (spec §4.5.1's "camera's area PDF is typically a delta
    /// (pinhole) encoded as `Discrete`").
    pub fn sample_position(&self) -> (Vec3f, PdfEval) {
        (
            self.camera_to_world.transform_point(Vec3f::splat(0.0)),
            PdfEval::new(1.0, Measure::Discrete),
        )
    }
}

impl Directional for PerspectiveCameraDir {
    fn sample_direction(&self, q: &GbsdfQuery, _sampler: &mut dyn Sampler) -> Option<SampleResult> {
        let raster = q.raster_hint?;
        let dir_camera = raster_to_camera_dir(raster, self.fov_y, self.aspect);
        let wo = self.camera_to_world.transform_vector(dir_camera).normalize();
        let cos_theta = wo.dot(self.forward());
        let value = Vec3f::splat(self.we(cos_theta));
        Some(SampleResult {
            wo,
            sampled_type: self.bsdf_type(),
            pdf: PdfEval::new(1.0, Measure::Discrete),
            value,
        })
    }

    fn evaluate_direction(&self, _q: &GbsdfQuery, wo: Vec3f) -> Vec3f {
        let cos_theta = wo.dot(self.forward());
        Vec3f::splat(self.we(cos_theta))
    }

    fn evaluate_direction_pdf(&self, _q: &GbsdfQuery, wo: Vec3f) -> PdfEval {
        let cos_theta = wo.dot(self.forward());
        if cos_theta > 0.0 {
            PdfEval::new(1.0, Measure::Discrete)
        } else {
            PdfEval::zero(Measure::Discrete)
        }
    }

    fn bsdf_type(&self) -> BsdfType {
        BsdfType::SPECULAR | BsdfType::EYE_DIRECTION
    }
}

/// A thin-lens camera: the position endpoint samples a point on a
/// finite-area circular lens (continuous, `Measure::Area`, handled by the
/// `cameras` crate's position sampling), so direction sampling given a fixed
/// lens point and raster position is still deterministic — focus the ray
/// through the point on the focal plane that the corresponding pinhole ray
/// would have hit.
#[derive(Copy, Clone, Debug)]
pub struct ThinLensCameraDir {
    pub camera_to_world: Transform,
    pub fov_y: Float,
    pub aspect: Float,
    pub lens_radius: Float,
    pub focal_distance: Float,
}

impl ThinLensCameraDir {
    fn we(&self, cos_theta: Float) -> Float {
        if cos_theta <= 0.0 {
            return 0.0;
        }
        let a = image_plane_area(self.fov_y, self.aspect);
        let lens_area = std::f32::consts::PI * self.lens_radius * self.lens_radius;
        if lens_area <= 0.0 {
            1.0 / (a * cos_theta.powi(4))
        } else {
            1.0 / (a * lens_area * cos_theta.powi(4))
        }
    }

    pub fn forward(&self) -> Vec3f {
        self.camera_to_world.transform_vector(Vec3f::new(0.0, 0.0, 1.0)).normalize()
    }

    /// The camera-space direction for raster point `raster`, before
    /// depth-of-field refocusing through a lens sample.
    pub fn pinhole_camera_dir(&self, raster: Point2f) -> Vec3f {
        raster_to_camera_dir(raster, self.fov_y, self.aspect)
    }

    /// Projects a world-space direction back onto the image plane, ignoring
    /// any lens offset (an approximation shared with real-time DoF camera
    /// models: the thin-lens blur is resolved at sample time, not inverted
    /// here).
    pub fn ray_to_raster(&self, d: Vec3f) -> Option<Point2f> {
        let dir_camera = self.camera_to_world.inv.transform_vector(d);
        camera_dir_to_raster(dir_camera, self.fov_y, self.aspect)
    }

    /// Position endpoint: uniform over the circular lens (`Measure::Area`),
    /// or a point delta if the lens has zero radius.
    pub fn sample_position(&self, u: Point2f) -> (Vec3f, PdfEval) {
        if self.lens_radius <= 0.0 {
            return (
                self.camera_to_world.transform_point(Vec3f::splat(0.0)),
                PdfEval::new(1.0, Measure::Discrete),
            );
        }
        let d = crate::warp::concentric_sample_disk(u) * self.lens_radius;
        let p_camera = Vec3f::new(d.x, d.y, 0.0);
        let lens_area = std::f32::consts::PI * self.lens_radius * self.lens_radius;
        (
            self.camera_to_world.transform_point(p_camera),
            PdfEval::new(1.0 / lens_area, Measure::Area),
        )
    }
}

impl Directional for ThinLensCameraDir {
    fn sample_direction(&self, q: &GbsdfQuery, _sampler: &mut dyn Sampler) -> Option<SampleResult> {
        let raster = q.raster_hint?;
        let dir_camera = raster_to_camera_dir(raster, self.fov_y, self.aspect);
        let wo = self.camera_to_world.transform_vector(dir_camera).normalize();
        let cos_theta = wo.dot(self.forward());
        let value = Vec3f::splat(self.we(cos_theta));
        Some(SampleResult {
            wo,
            sampled_type: self.bsdf_type(),
            pdf: PdfEval::new(1.0, Measure::Discrete),
            value,
        })
    }

    fn evaluate_direction(&self, _q: &GbsdfQuery, wo: Vec3f) -> Vec3f {
        let cos_theta = wo.dot(self.forward());
        Vec3f::splat(self.we(cos_theta))
    }

    fn evaluate_direction_pdf(&self, _q: &GbsdfQuery, wo: Vec3f) -> PdfEval {
        let cos_theta = wo.dot(self.forward());
        if cos_theta > 0.0 {
            PdfEval::new(1.0, Measure::Discrete)
        } else {
            PdfEval::zero(Measure::Discrete)
        }
    }

    fn bsdf_type(&self) -> BsdfType {
        BsdfType::SPECULAR | BsdfType::EYE_DIRECTION
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone)]
    struct NullSampler;
    impl Sampler for NullSampler {
        fn next(&mut self) -> Float {
            0.0
        }
        fn next_uint(&mut self) -> u32 {
            0
        }
        fn set_seed(&mut self, _seed: u32) {}
    }

    #[test]
    fn center_raster_maps_to_forward_direction() {
        let cam = PerspectiveCameraDir {
            camera_to_world: Transform::identity(),
            fov_y: std::f32::consts::FRAC_PI_2,
            aspect: 1.0,
        };
        let q = GbsdfQuery {
            geom: crate::interaction::SurfaceGeometry::degenerate_at(Vec3f::splat(0.0), Vec3f::new(0.0, 0.0, 1.0)),
            wi: Vec3f::new(0.0, 0.0, 0.0),
            transport: crate::gbsdf::TransportDirection::EyeToLight,
            raster_hint: Some(Point2f::new(0.5, 0.5)),
        };
        let mut sampler = NullSampler;
        let r = cam.sample_direction(&q, &mut sampler).unwrap();
        assert!((r.wo.z - 1.0).abs() < 1e-4);
    }
}
