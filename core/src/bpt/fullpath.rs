//! Full-path assembly and its unweighted contribution `C*_{s,t}` (spec
//! §4.5.2): the three cases (`s = 0` emitter-hit, `t = 0` light tracing,
//! `s ≥ 1 ∧ t ≥ 1` connection), plus the raster position each contributes
//! at.

use crate::gbsdf::{GbsdfQuery, TransportDirection};
use crate::pdf::Measure;
use crate::ray::Ray;
use crate::scene::Scene;
use crate::vec::{Dot, Point2f, Vec3f};
use crate::vertex::BptVertex;

/// An unweighted full-path sample: its radiance-throughput contribution and
/// the raster position to splat it at. `None` contributions (occluded,
/// off-image, or a zero BSDF evaluation) are represented as
/// `contribution: Vec3f::splat(0.0)` so that callers can skip the MIS-weight
/// computation without a separate `Option` layer.
pub struct PathSample {
    pub contribution: Vec3f,
    pub raster: Point2f,
}

fn zero_at(raster: Point2f) -> PathSample {
    PathSample {
        contribution: Vec3f::splat(0.0),
        raster,
    }
}

/// Geometry term between two connected vertices: both cosines use shading
/// normals, with degenerate endpoints (point cameras, point lights)
/// contributing a cosine of `1` (spec §4.5.2).
fn geometry_term(a: &BptVertex, dir_a_to_b: Vec3f, b: &BptVertex, dist_sq: crate::pbrt::Float) -> crate::pbrt::Float {
    if dist_sq <= 0.0 {
        return 0.0;
    }
    let cos_a = if a.geom.degenerate { 1.0 } else { dir_a_to_b.dot(a.geom.sn).abs() };
    let cos_b = if b.geom.degenerate { 1.0 } else { dir_a_to_b.dot(b.geom.sn).abs() };
    cos_a * cos_b / dist_sq
}

/// The `s = 0` technique: the eye subpath's terminal vertex must itself lie
/// on an emitter. Returns a zero contribution if it does not, or if its
/// own emission points away from the subpath.
fn emitter_hit_contribution(scene: &Scene, eye_path: &[&BptVertex], raster: Point2f) -> PathSample {
    let Some(&last) = eye_path.last() else {
        return zero_at(raster);
    };
    let Some(prim_index) = last.primitive_index else {
        return zero_at(raster);
    };
    let prim = &scene.primitives[prim_index as usize];
    let Some(light) = prim.light.as_ref() else {
        return zero_at(raster);
    };
    let query = GbsdfQuery {
        geom: last.geom,
        wi: Vec3f::splat(0.0),
        transport: TransportDirection::LightToEye,
        raster_hint: None,
    };
    let le = light.evaluate_direction(&query, last.wi);
    PathSample {
        contribution: last.weight.mul_element_wise(le),
        raster,
    }
}

/// The `s ≥ 1, t ≥ 1` connection technique: bridges the light subpath's last
/// vertex and the eye subpath's last vertex with a fresh shadow ray and
/// evaluates both sides' BSDFs off that new edge (never the edge either
/// subpath actually sampled, since `evaluate_direction` of a delta BSDF is
/// always zero — a connection that lands on a specular vertex is correctly
/// zero without any extra bookkeeping here).
fn connection_contribution(scene: &Scene, light_path: &[&BptVertex], eye_path: &[&BptVertex]) -> PathSample {
    let y = *light_path.last().expect("connection requires s >= 1");
    let z = *eye_path.last().expect("connection requires t >= 1");

    let d = z.geom.p - y.geom.p;
    let dist_sq = d.length_squared();
    if dist_sq <= 0.0 {
        return zero_at(Point2f::new(0.0, 0.0));
    }
    let dist = dist_sq.sqrt();
    let dir_y_to_z = d / dist;

    let raster = if eye_path.len() == 1 {
        let Some(cam_index) = z.primitive_index else {
            return zero_at(Point2f::new(0.0, 0.0));
        };
        let camera = scene.primitives[cam_index as usize].camera.as_ref().expect("t=1 connection vertex must carry the camera role");
        match camera.camera_ray_to_raster(-dir_y_to_z) {
            Some(r) => r,
            None => return zero_at(Point2f::new(0.0, 0.0)),
        }
    } else {
        Point2f::new(0.0, 0.0) // overwritten by the caller, which knows the eye subpath's own raster origin
    };

    if scene.intersect_p(&Ray::shadow(y.geom.p, z.geom.p)) {
        return zero_at(raster);
    }

    let f_l = match y.primitive_index.and_then(|i| scene.primitives[i as usize].light.as_ref().or(scene.primitives[i as usize].bsdf.as_ref())) {
        Some(bsdf) => {
            let q = GbsdfQuery {
                geom: y.geom,
                wi: y.wi,
                transport: TransportDirection::LightToEye,
                raster_hint: None,
            };
            bsdf.evaluate_direction(&q, dir_y_to_z)
        }
        None => return zero_at(raster),
    };
    if f_l == Vec3f::splat(0.0) {
        return zero_at(raster);
    }

    let f_e = match z.primitive_index.and_then(|i| scene.primitives[i as usize].camera.as_ref().or(scene.primitives[i as usize].bsdf.as_ref())) {
        Some(bsdf) => {
            let q = GbsdfQuery {
                geom: z.geom,
                wi: z.wi,
                transport: TransportDirection::EyeToLight,
                raster_hint: None,
            };
            bsdf.evaluate_direction(&q, -dir_y_to_z)
        }
        None => return zero_at(raster),
    };
    if f_e == Vec3f::splat(0.0) {
        return zero_at(raster);
    }

    let g = geometry_term(y, dir_y_to_z, z, dist_sq);
    if g <= 0.0 {
        return zero_at(raster);
    }

    let contribution = y.weight.mul_element_wise(f_l) * g;
    let contribution = contribution.mul_element_wise(f_e).mul_element_wise(z.weight);
    PathSample { contribution, raster }
}

/// Assembles the full path for technique `(s, t)` out of the first `s`
/// vertices of `light_path` and the first `t` vertices of `eye_path`, and
/// evaluates its unweighted contribution. `eye_raster` is the raster
/// position the eye subpath was itself sampled through, used directly for
/// `t >= 2` (spec §4.5.2's "for `t >= 2`, the raster position is the eye
/// subpath's pixel").
pub fn assemble_path(scene: &Scene, light_path: &[&BptVertex], eye_path: &[&BptVertex], s: usize, t: usize, eye_raster: Point2f) -> PathSample {
    debug_assert!(s + t >= 2);
    debug_assert_eq!(light_path.len(), s);
    debug_assert_eq!(eye_path.len(), t);

    if s == 0 {
        return emitter_hit_contribution(scene, eye_path, eye_raster);
    }
    if t == 0 {
        // Light tracing (camera hit by a light subpath): only meaningful for
        // a non-delta camera sampling model, which this engine does not yet
        // implement, so this technique is never enumerated by the driver.
        return zero_at(eye_raster);
    }

    let mut sample = connection_contribution(scene, light_path, eye_path);
    if t >= 2 {
        sample.raster = eye_raster;
    }
    sample
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accel::{AccelHit, Accelerator};
    use crate::error::BuildError;
    use crate::gbsdf::arealight::AreaLightDir;
    use crate::gbsdf::camera::PerspectiveCameraDir;
    use crate::gbsdf::surface::Diffuse;
    use crate::gbsdf::Gbsdf;
    use crate::interaction::SurfaceGeometry;
    use crate::mat::Transform;
    use crate::pdf::PdfEval;
    use crate::primitive::Primitive;
    use crate::vertex::VertexType;

    struct NullAccel;
    impl Accelerator for NullAccel {
        fn build(&mut self, _triangles: Vec<crate::accel::BuildTriangle>) -> Result<(), BuildError> {
            Ok(())
        }
        fn intersect(&self, _ray: &mut Ray) -> Option<AccelHit> {
            None
        }
        fn intersect_p(&self, _ray: &Ray) -> bool {
            false
        }
    }

    fn degenerate_vertex(p: Vec3f, n: Vec3f, prim: u32, weight: Vec3f, wi: Vec3f) -> BptVertex {
        BptVertex {
            vertex_type: VertexType::Endpoint,
            geom: SurfaceGeometry::degenerate_at(p, n),
            pdf_position: PdfEval::new(1.0, Measure::Discrete),
            primitive_index: Some(prim),
            weight,
            pdf_direction: [PdfEval::zero(Measure::Discrete), PdfEval::zero(Measure::Discrete)],
            pdf_rr: 1.0,
            transport_dir: TransportDirection::LightToEye,
            specular: false,
            wi,
            wo: Vec3f::splat(0.0),
        }
    }

    fn quad_mesh() -> std::sync::Arc<crate::mesh::TriangleMesh> {
        use crate::vec::Point2f as P2;
        std::sync::Arc::new(crate::mesh::TriangleMesh::new(
            vec![
                Vec3f::new(-1.0, -1.0, 0.0),
                Vec3f::new(1.0, -1.0, 0.0),
                Vec3f::new(1.0, 1.0, 0.0),
                Vec3f::new(-1.0, 1.0, 0.0),
            ],
            vec![Vec3f::new(0.0, 0.0, 1.0); 4],
            vec![P2::new(0.0, 0.0), P2::new(1.0, 0.0), P2::new(1.0, 1.0), P2::new(0.0, 1.0)],
            vec![[0, 1, 2], [0, 2, 3]],
        ))
    }

    fn scene_with_light_and_camera() -> Scene {
        let mut light_prim = Primitive::new(Transform::identity());
        light_prim.mesh = Some(quad_mesh());
        light_prim.light = Some(Gbsdf::AreaLightDir(AreaLightDir {
            radiance: Vec3f::splat(4.0),
            two_sided: false,
        }));
        let mut camera_prim = Primitive::new(Transform::identity());
        camera_prim.camera = Some(Gbsdf::PerspectiveCameraDir(PerspectiveCameraDir {
            camera_to_world: Transform::identity(),
            fov_y: std::f32::consts::FRAC_PI_2,
            aspect: 1.0,
        }));
        let mut scene = Scene::new(vec![light_prim, camera_prim], Box::new(NullAccel));
        scene.build().unwrap();
        scene
    }

    #[test]
    fn s0_contribution_uses_emitted_radiance_toward_previous_vertex() {
        let scene = scene_with_light_and_camera();
        // Eye subpath: [camera endpoint, emitter-hit vertex].
        let cam = degenerate_vertex(Vec3f::new(0.0, 0.0, 0.0), Vec3f::new(0.0, 0.0, 1.0), 1, Vec3f::splat(1.0), Vec3f::splat(0.0));
        let hit = degenerate_vertex(Vec3f::new(0.0, 0.0, 2.0), Vec3f::new(0.0, 0.0, -1.0), 0, Vec3f::splat(0.5), Vec3f::new(0.0, 0.0, -1.0));
        let eye_path = vec![&cam, &hit];
        let sample = assemble_path(&scene, &[], &eye_path, 0, 2, Point2f::new(0.5, 0.5));
        assert_eq!(sample.contribution, Vec3f::splat(0.5 * 4.0));
    }

    #[test]
    fn connection_is_zero_when_occluded() {
        struct OccludingAccel;
        impl Accelerator for OccludingAccel {
            fn build(&mut self, _triangles: Vec<crate::accel::BuildTriangle>) -> Result<(), BuildError> {
                Ok(())
            }
            fn intersect(&self, _ray: &mut Ray) -> Option<AccelHit> {
                None
            }
            fn intersect_p(&self, _ray: &Ray) -> bool {
                true
            }
        }
        let mut light_prim = Primitive::new(Transform::identity());
        light_prim.bsdf = Some(Gbsdf::Diffuse(Diffuse { albedo: Vec3f::splat(0.5) }));
        let mut camera_prim = Primitive::new(Transform::identity());
        camera_prim.bsdf = Some(Gbsdf::Diffuse(Diffuse { albedo: Vec3f::splat(0.5) }));
        camera_prim.camera = Some(Gbsdf::PerspectiveCameraDir(PerspectiveCameraDir {
            camera_to_world: Transform::identity(),
            fov_y: std::f32::consts::FRAC_PI_2,
            aspect: 1.0,
        }));
        let mut scene = Scene::new(vec![light_prim, camera_prim], Box::new(OccludingAccel));
        scene.build().unwrap();

        let y = degenerate_vertex(Vec3f::new(0.0, 0.0, 1.0), Vec3f::new(0.0, 0.0, 1.0), 0, Vec3f::splat(1.0), Vec3f::new(0.0, 0.0, 1.0));
        let z = degenerate_vertex(Vec3f::new(0.0, 0.0, 0.0), Vec3f::new(0.0, 0.0, -1.0), 1, Vec3f::splat(1.0), Vec3f::new(0.0, 0.0, -1.0));
        let sample = assemble_path(&scene, &[&y], &[&z], 1, 1, Point2f::new(0.5, 0.5));
        assert_eq!(sample.contribution, Vec3f::splat(0.0));
    }
}
