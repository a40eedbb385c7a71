//! Camera construction: builds the `camera_to_world` transform from a
//! look-at triple and wraps the resulting [`core::gbsdf::camera`] directional
//! GBSDF alongside the film it owns (spec §6's `cameras` scene-node kind;
//! directional sampling and raster mapping themselves live in `core`, see
//! `DESIGN.md`).

use core::film::Film;
use core::gbsdf::camera::{PerspectiveCameraDir, ThinLensCameraDir};
use core::gbsdf::Gbsdf;
use core::mat::{Mat4, Transform};
use core::pbrt::Float;
use core::vec::{Vec3f, Vec4f};

/// Builds a right-handed `camera_to_world` transform looking from `eye`
/// toward `target`, grounded in the standard graphics look-at construction
/// (orthonormal basis from `forward`, `up`, `right`).
pub fn look_at(eye: Vec3f, target: Vec3f, up: Vec3f) -> Transform {
    let forward = (target - eye).normalize();
    let right = forward.cross(up).normalize();
    let new_up = right.cross(forward);
    Transform::new(Mat4::from_rows([
        Vec4f::new(right.x, new_up.x, forward.x, eye.x),
        Vec4f::new(right.y, new_up.y, forward.y, eye.y),
        Vec4f::new(right.z, new_up.z, forward.z, eye.z),
        Vec4f::new(0.0, 0.0, 0.0, 1.0),
    ]))
}

/// A constructed camera: its directional GBSDF (to be placed on a
/// `core::primitive::Primitive`) plus the film it writes into.
pub struct Camera {
    pub dir: Gbsdf,
    pub film: Film,
}

/// Field of view is specified in degrees in configuration, radians inside
/// `core` (spec §6's config tree uses human-friendly units; `io::build`
/// lowers them before constructing runtime types).
pub fn build_perspective(eye: Vec3f, target: Vec3f, up: Vec3f, fov_y_degrees: Float, film_width: u32, film_height: u32) -> Camera {
    let aspect = film_width as Float / film_height as Float;
    Camera {
        dir: Gbsdf::PerspectiveCameraDir(PerspectiveCameraDir {
            camera_to_world: look_at(eye, target, up),
            fov_y: fov_y_degrees.to_radians(),
            aspect,
        }),
        film: Film::new(film_width, film_height),
    }
}

/// Builds a camera directly from an already-composed world transform (a
/// scene node's `transform`, spec §6), for callers that do not think in
/// terms of a look-at triple — this is the shape `io::build` actually uses.
pub fn from_camera_to_world(camera_to_world: Transform, fov_y_degrees: Float, film_width: u32, film_height: u32) -> Camera {
    let aspect = film_width as Float / film_height as Float;
    Camera {
        dir: Gbsdf::PerspectiveCameraDir(PerspectiveCameraDir {
            camera_to_world,
            fov_y: fov_y_degrees.to_radians(),
            aspect,
        }),
        film: Film::new(film_width, film_height),
    }
}

pub fn thin_lens_from_camera_to_world(
    camera_to_world: Transform,
    fov_y_degrees: Float,
    lens_radius: Float,
    focal_distance: Float,
    film_width: u32,
    film_height: u32,
) -> Camera {
    let aspect = film_width as Float / film_height as Float;
    Camera {
        dir: Gbsdf::ThinLensCameraDir(ThinLensCameraDir {
            camera_to_world,
            fov_y: fov_y_degrees.to_radians(),
            aspect,
            lens_radius,
            focal_distance,
        }),
        film: Film::new(film_width, film_height),
    }
}

pub fn build_thin_lens(
    eye: Vec3f,
    target: Vec3f,
    up: Vec3f,
    fov_y_degrees: Float,
    lens_radius: Float,
    focal_distance: Float,
    film_width: u32,
    film_height: u32,
) -> Camera {
    let aspect = film_width as Float / film_height as Float;
    Camera {
        dir: Gbsdf::ThinLensCameraDir(ThinLensCameraDir {
            camera_to_world: look_at(eye, target, up),
            fov_y: fov_y_degrees.to_radians(),
            aspect,
            lens_radius,
            focal_distance,
        }),
        film: Film::new(film_width, film_height),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn look_at_places_target_along_forward_axis() {
        let t = look_at(Vec3f::new(0.0, 0.0, -5.0), Vec3f::new(0.0, 0.0, 0.0), Vec3f::new(0.0, 1.0, 0.0));
        let forward = t.transform_vector(Vec3f::new(0.0, 0.0, 1.0)).normalize();
        assert!((forward - Vec3f::new(0.0, 0.0, 1.0)).length() < 1e-4);
    }

    #[test]
    fn perspective_camera_faces_its_target() {
        let cam = build_perspective(Vec3f::new(0.0, 0.0, -5.0), Vec3f::new(0.0, 0.0, 0.0), Vec3f::new(0.0, 1.0, 0.0), 60.0, 4, 4);
        let forward = cam.dir.camera_forward();
        assert!((forward - Vec3f::new(0.0, 0.0, 1.0)).length() < 1e-4);
    }

    #[test]
    fn from_camera_to_world_uses_the_transform_verbatim() {
        let cam = from_camera_to_world(Transform::identity(), 50.0, 10, 5);
        assert_eq!(cam.film.width, 10);
        assert_eq!(cam.film.height, 5);
        let forward = cam.dir.camera_forward();
        assert!((forward - Vec3f::new(0.0, 0.0, 1.0)).length() < 1e-4);
    }

    #[test]
    fn thin_lens_camera_samples_a_position_on_its_lens() {
        let cam = build_thin_lens(Vec3f::splat(0.0), Vec3f::new(0.0, 0.0, 1.0), Vec3f::new(0.0, 1.0, 0.0), 40.0, 0.1, 5.0, 8, 8);
        let (pos, pdf) = cam.dir.sample_camera_position(core::vec::Point2f::new(0.5, 0.5));
        assert!(pos.is_finite());
        assert!(pdf.v > 0.0);
    }
}
