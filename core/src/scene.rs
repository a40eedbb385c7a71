//! The scene aggregate: primitives, the accelerator, and light selection
//! (spec §4.3).

use std::sync::Arc;

use crate::accel::{Accelerator, BuildTriangle};
use crate::distribution::Distribution1D;
use crate::error::BuildError;
use crate::film::WarningCounters;
use crate::interaction::{Intersection, SurfaceGeometry};
use crate::pdf::{Measure, PdfEval};
use crate::primitive::Primitive;
use crate::ray::Ray;
use crate::vec::Point2f;
use crate::warp::uniform_sample_triangle;

/// Owns every scene node and the accelerator built over their triangles.
/// Read-only after [`Scene::build`]; shared by immutable reference across
/// render threads (spec §5).
pub struct Scene {
    pub primitives: Vec<Primitive>,
    accelerator: Box<dyn Accelerator>,
    light_indices: Vec<u32>,
    light_selection: Distribution1D,
    /// Per-light, per-face area-weighted CDF for uniform positional sampling
    /// over that light's mesh (spec §4.5.1's `light.sample_position`).
    light_face_cdfs: Vec<Distribution1D>,
    light_total_areas: Vec<crate::pbrt::Float>,
    main_camera_index: Option<u32>,
    /// Shared counters for category-5 numeric warnings (spec §4.6), cloned
    /// by `Arc` into every render thread.
    pub warnings: Arc<WarningCounters>,
}

impl Scene {
    /// Takes ownership of the primitive list and an (unbuilt) accelerator.
    /// Call [`Scene::build`] before rendering.
    pub fn new(primitives: Vec<Primitive>, accelerator: Box<dyn Accelerator>) -> Self {
        Self {
            primitives,
            accelerator,
            light_indices: Vec::new(),
            light_selection: Distribution1D::build(&[]),
            light_face_cdfs: Vec::new(),
            light_total_areas: Vec::new(),
            main_camera_index: None,
            warnings: Arc::new(WarningCounters::default()),
        }
    }

    /// Flattens every primitive's mesh into world-space triangles, builds
    /// the accelerator, identifies the main camera, and builds the
    /// area-proportional light-selection distribution (spec §4.3).
    pub fn build(&mut self) -> Result<(), BuildError> {
        let mut triangles = Vec::new();
        let mut cameras = Vec::new();
        let mut light_weights = Vec::new();
        self.light_indices.clear();

        for (pi, prim) in self.primitives.iter().enumerate() {
            if let Some(mesh) = &prim.mesh {
                for face in 0..mesh.num_faces() {
                    let [p0, p1, p2] = mesh.face_positions(face);
                    let (wp0, wp1, wp2) = (
                        prim.transform.transform_point(p0),
                        prim.transform.transform_point(p1),
                        prim.transform.transform_point(p2),
                    );
                    if (wp1 - wp0).cross(wp2 - wp0).length() <= 0.0 {
                        self.warnings.record_degenerate_triangle();
                    }
                    triangles.push(BuildTriangle {
                        positions: [wp0, wp1, wp2],
                        primitive_index: pi as u32,
                        face_index: face as u32,
                    });
                }
            }
            if prim.is_camera() {
                cameras.push(pi as u32);
            }
            if prim.is_light() {
                self.light_indices.push(pi as u32);
                light_weights.push(prim.world_area());
            }
        }

        self.main_camera_index = match cameras.as_slice() {
            [] => return Err(BuildError::NoCamera),
            [single] => Some(*single),
            _ => return Err(BuildError::MultipleCameras),
        };

        self.light_selection = Distribution1D::build(&light_weights);
        self.light_face_cdfs = self
            .light_indices
            .iter()
            .map(|&pi| {
                let prim = &self.primitives[pi as usize];
                let mesh = prim.mesh.as_ref().expect("light primitive must own a mesh");
                let face_areas: Vec<crate::pbrt::Float> = (0..mesh.num_faces())
                    .map(|f| {
                        let [p0, p1, p2] = mesh.face_positions(f);
                        let (wp0, wp1, wp2) = (
                            prim.transform.transform_point(p0),
                            prim.transform.transform_point(p1),
                            prim.transform.transform_point(p2),
                        );
                        0.5 * (wp1 - wp0).cross(wp2 - wp0).length()
                    })
                    .collect();
                Distribution1D::build(&face_areas)
            })
            .collect();
        self.light_total_areas = light_weights;
        self.accelerator.build(triangles)
    }

    #[inline]
    pub fn main_camera_index(&self) -> u32 {
        self.main_camera_index.expect("Scene::build must run before main_camera_index")
    }

    #[inline]
    pub fn main_camera(&self) -> &Primitive {
        &self.primitives[self.main_camera_index() as usize]
    }

    #[inline]
    pub fn num_lights(&self) -> usize {
        self.light_indices.len()
    }

    #[inline]
    pub fn light(&self, i: usize) -> &Primitive {
        &self.primitives[self.light_indices[i] as usize]
    }

    /// Area-proportional discrete light selection; `u` consumes only one
    /// dimension, leaving a second uniform sample free for the caller's
    /// positional sampling (spec §4.3).
    pub fn sample_light_selection(&self, u: crate::pbrt::Float) -> (usize, PdfEval) {
        if self.light_selection.is_empty() || self.light_selection.degenerate {
            if self.light_selection.degenerate {
                self.warnings.record_zero_sum_cdf();
            }
            return (0, PdfEval::zero(Measure::Discrete));
        }
        let i = self.light_selection.sample(u);
        (i, PdfEval::new(self.light_selection.pdf_at(i), Measure::Discrete))
    }

    pub fn light_selection_pdf(&self, i: usize) -> PdfEval {
        PdfEval::new(self.light_selection.pdf_at(i), Measure::Discrete)
    }

    /// The index into `Scene::primitives` of light `i` (the `u32` a
    /// [`crate::vertex::BptVertex`] back-references).
    #[inline]
    pub fn light_primitive_index(&self, i: usize) -> u32 {
        self.light_indices[i]
    }

    /// The area-measure density of having sampled `primitive_index` as a
    /// light endpoint's position — `light_selection_pdf · (1 / total_area)`
    /// — or `None` if that primitive is not one of the scene's lights.
    /// Needed only by the `s = 0` MIS technique (spec §4.5.3), where the
    /// eye subpath's terminal vertex was actually generated by ordinary
    /// BSDF sampling and never recorded a `pdf_position` in the
    /// light-selection sense.
    pub fn light_endpoint_pdf(&self, primitive_index: u32) -> Option<crate::pbrt::Float> {
        let light_i = self.light_indices.iter().position(|&pi| pi == primitive_index)?;
        let total_area = self.light_total_areas[light_i];
        if total_area <= 0.0 {
            return Some(0.0);
        }
        Some(self.light_selection_pdf(light_i).v / total_area)
    }

    /// Uniform-over-area positional sample on light `i`'s mesh (spec
    /// §4.5.1's `light.sample_position(u1)`): pick a face proportional to
    /// its world-space area, then a uniform point within it. The combined
    /// density collapses to the constant `1 / total_area` since per-face
    /// selection probability already equals that face's area share.
    pub fn sample_light_position(&self, i: usize, u: Point2f) -> (SurfaceGeometry, PdfEval) {
        let prim = &self.primitives[self.light_indices[i] as usize];
        let mesh = prim.mesh.as_ref().expect("light primitive must own a mesh");
        let dist = &self.light_face_cdfs[i];
        let total_area = self.light_total_areas[i];
        if dist.degenerate || total_area <= 0.0 {
            if dist.degenerate {
                self.warnings.record_zero_sum_cdf();
            }
            return (
                SurfaceGeometry::degenerate_at(prim.transform.transform_point(crate::vec::Vec3f::splat(0.0)), prim.transform.transform_normal(crate::vec::Vec3f::new(0.0, 0.0, 1.0))),
                PdfEval::zero(Measure::Area),
            );
        }

        let (face, ru) = dist.sample_reuse(u.x);
        let (b0, b1) = uniform_sample_triangle(Point2f::new(ru, u.y));
        let b2 = 1.0 - b0 - b1;
        let idx = mesh.face(face);

        let p_local = mesh.position(idx[0]) * b0 + mesh.position(idx[1]) * b1 + mesh.position(idx[2]) * b2;
        let sn_local = (mesh.normal(idx[0]) * b0 + mesh.normal(idx[1]) * b1 + mesh.normal(idx[2]) * b2).normalize();
        let (p0, p1, p2) = (mesh.position(idx[0]), mesh.position(idx[1]), mesh.position(idx[2]));
        let gn_local = (p1 - p0).cross(p2 - p0).normalize();
        let uv = mesh.uv(idx[0]) * b0 + mesh.uv(idx[1]) * b1 + mesh.uv(idx[2]) * b2;

        let p_world = prim.transform.transform_point(p_local);
        let sn_world = prim.transform.transform_normal(sn_local).normalize();
        let gn_world = prim.transform.transform_normal(gn_local).normalize();

        let geom = SurfaceGeometry::build_frame(p_world, gn_world, sn_world, uv);
        (geom, PdfEval::new(1.0 / total_area, Measure::Area))
    }

    /// Nearest-hit query; `ray.max_t` is tightened in place.
    pub fn intersect(&self, ray: &mut Ray) -> Option<Intersection> {
        let hit = self.accelerator.intersect(ray)?;
        Some(self.store_intersection_from_barycentric(hit.primitive_index, hit.face_index, hit.b1, hit.b2))
    }

    /// Any-hit (shadow/occlusion) query.
    pub fn intersect_p(&self, ray: &Ray) -> bool {
        self.accelerator.intersect_p(ray)
    }

    /// Reconstructs full surface geometry from a barycentric hit, per the
    /// bit-exact formulas in spec §4.3.
    fn store_intersection_from_barycentric(
        &self,
        primitive_index: u32,
        face_index: u32,
        b1: crate::pbrt::Float,
        b2: crate::pbrt::Float,
    ) -> Intersection {
        let prim = &self.primitives[primitive_index as usize];
        let mesh = prim.mesh.as_ref().expect("hit primitive must own a mesh");
        let face = mesh.face(face_index as usize);
        let b0 = 1.0 - b1 - b2;

        let p_local = mesh.position(face[0]) * b0 + mesh.position(face[1]) * b1 + mesh.position(face[2]) * b2;
        let sn_local = (mesh.normal(face[0]) * b0 + mesh.normal(face[1]) * b1 + mesh.normal(face[2]) * b2).normalize();
        let p0 = mesh.position(face[0]);
        let p1 = mesh.position(face[1]);
        let p2 = mesh.position(face[2]);
        let gn_local = (p1 - p0).cross(p2 - p0).normalize();
        let uv = mesh.uv(face[0]) * b0 + mesh.uv(face[1]) * b1 + mesh.uv(face[2]) * b2;

        let p_world = prim.transform.transform_point(p_local);
        let sn_world = prim.transform.transform_normal(sn_local).normalize();
        let gn_world = prim.transform.transform_normal(gn_local).normalize();

        let geom = SurfaceGeometry::build_frame(p_world, gn_world, sn_world, uv);
        Intersection {
            geom,
            primitive_index,
            face_index,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accel::AccelHit;
    use crate::mat::Transform;
    use crate::mesh::TriangleMesh;
    use crate::vec::{Point2f, Vec3f};
    use std::sync::Arc;

    struct StubAccel {
        hit: Option<AccelHit>,
    }
    impl Accelerator for StubAccel {
        fn build(&mut self, _triangles: Vec<BuildTriangle>) -> Result<(), BuildError> {
            Ok(())
        }
        fn intersect(&self, ray: &mut Ray) -> Option<AccelHit> {
            if let Some(h) = self.hit {
                ray.max_t = h.t;
            }
            self.hit
        }
        fn intersect_p(&self, _ray: &Ray) -> bool {
            self.hit.is_some()
        }
    }

    fn unit_triangle_mesh() -> Arc<TriangleMesh> {
        Arc::new(TriangleMesh::new(
            vec![Vec3f::new(-1.0, -1.0, 0.0), Vec3f::new(1.0, -1.0, 0.0), Vec3f::new(0.0, 1.0, 0.0)],
            vec![Vec3f::new(0.0, 0.0, 1.0); 3],
            vec![Point2f::new(0.0, 0.0), Point2f::new(1.0, 0.0), Point2f::new(0.0, 1.0)],
            vec![[0, 1, 2]],
        ))
    }

    #[test]
    fn build_fails_without_a_camera() {
        let mut prim = Primitive::new(Transform::identity());
        prim.mesh = Some(unit_triangle_mesh());
        let mut scene = Scene::new(vec![prim], Box::new(StubAccel { hit: None }));
        assert!(matches!(scene.build(), Err(BuildError::NoCamera)));
    }

    #[test]
    fn reconstructed_hit_interpolates_centroid_normal() {
        let mut camera_prim = Primitive::new(Transform::identity());
        camera_prim.camera = Some(crate::gbsdf::Gbsdf::PerspectiveCameraDir(
            crate::gbsdf::camera::PerspectiveCameraDir {
                camera_to_world: Transform::identity(),
                fov_y: 1.0,
                aspect: 1.0,
            },
        ));
        let mut tri_prim = Primitive::new(Transform::identity());
        tri_prim.mesh = Some(unit_triangle_mesh());

        let mut scene = Scene::new(
            vec![camera_prim, tri_prim],
            Box::new(StubAccel {
                hit: Some(AccelHit {
                    primitive_index: 1,
                    face_index: 0,
                    b1: 1.0 / 3.0,
                    b2: 1.0 / 3.0,
                    t: 5.0,
                }),
            }),
        );
        scene.build().unwrap();
        let mut ray = Ray::with_range(Vec3f::new(0.0, -0.33, -5.0), Vec3f::new(0.0, 0.0, 1.0), 0.0, 100.0);
        let hit = scene.intersect(&mut ray).expect("expected a hit");
        assert!((hit.geom.sn - Vec3f::new(0.0, 0.0, 1.0)).length() < 1e-4);
    }

    #[test]
    fn sampling_light_selection_with_no_lights_records_a_warning() {
        let mut camera_prim = Primitive::new(Transform::identity());
        camera_prim.camera = Some(crate::gbsdf::Gbsdf::PerspectiveCameraDir(
            crate::gbsdf::camera::PerspectiveCameraDir {
                camera_to_world: Transform::identity(),
                fov_y: 1.0,
                aspect: 1.0,
            },
        ));
        let mut scene = Scene::new(vec![camera_prim], Box::new(StubAccel { hit: None }));
        scene.build().unwrap();
        assert_eq!(scene.warnings.total(), 0);
        let (i, pdf) = scene.sample_light_selection(0.5);
        assert_eq!(i, 0);
        assert_eq!(pdf.v, 0.0);
        assert_eq!(scene.warnings.total(), 1);
    }
}
