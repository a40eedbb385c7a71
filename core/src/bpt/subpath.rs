//! Light- and eye-subpath construction (spec §4.5.1).

use crate::arena::VertexArena;
use crate::gbsdf::{shading_normal_correction, GbsdfQuery, TransportDirection};
use crate::interaction::SurfaceGeometry;
use crate::pbrt::Float;
use crate::pdf::{Measure, PdfEval};
use crate::ray::Ray;
use crate::sampler::Sampler;
use crate::scene::Scene;
use crate::vec::{Dot, Point2f, Vec3f};
use crate::vertex::{BptVertex, Subpath, VertexType};

/// Converts a sampled direction's `(value, pdf)` into the throughput
/// multiplier for the edge it was sampled on. `ProjectedSolidAngle` pdfs
/// already divide out `|cos θ|`, so dividing by them directly recovers
/// `f_s · |cos θ| / pdf_solid_angle` with no further multiply; `Discrete`
/// and plain `SolidAngle` pdfs carry a `value` that still needs the
/// explicit `|cos θ|` applied (specular `value`s are pre-divided by
/// `|cos θ|` for exactly this reason — see `specular_throughput` in
/// `gbsdf::specular`).
fn throughput_factor(value: Vec3f, pdf: PdfEval, cos_theta: Float) -> Vec3f {
    if pdf.v <= 0.0 {
        return Vec3f::splat(0.0);
    }
    match pdf.measure {
        Measure::ProjectedSolidAngle => value / pdf.v,
        Measure::Discrete | Measure::SolidAngle => value * cos_theta.abs() / pdf.v,
        Measure::Area => value / pdf.v,
    }
}

/// Russian roulette on the edge throughput arriving at the vertex about to
/// be created: survive with probability `q = min(1, max-component(beta))`
/// once `depth >= rr_depth`, scaling the surviving throughput by `1/q`
/// (spec §4.5.1d).
fn russian_roulette(beta: Vec3f, depth: u32, rr_depth: u32, sampler: &mut dyn Sampler) -> Option<(Vec3f, Float)> {
    if depth < rr_depth {
        return Some((beta, 1.0));
    }
    let q = beta.max_component().min(1.0);
    if q <= 0.0 {
        return None;
    }
    if sampler.next() < q {
        Some((beta / q, q))
    } else {
        None
    }
}

fn zero_pdf_direction() -> [PdfEval; 2] {
    [PdfEval::zero(Measure::SolidAngle), PdfEval::zero(Measure::SolidAngle)]
}

/// Samples a full light or eye subpath, starting at the corresponding
/// endpoint (an emitter's surface for `LightToEye`, the scene's one camera
/// for `EyeToLight`) and extending it bounce by bounce until intersection
/// fails, Russian roulette kills the path, or `max_vertices` is reached
/// (spec §4.5.1). `raster` selects which point in the pixel footprint the
/// camera endpoint's first ray passes through; unused when building a
/// light subpath.
pub fn sample_subpath<'a>(
    direction: TransportDirection,
    scene: &Scene,
    sampler: &mut dyn Sampler,
    arena: &'a VertexArena,
    raster: Point2f,
    rr_depth: u32,
    max_vertices: u32,
) -> Subpath<'a> {
    let mut subpath = Subpath::new(direction);
    if max_vertices == 0 {
        return subpath;
    }

    let (endpoint_geom, pdf_position, endpoint_primitive) = match direction {
        TransportDirection::LightToEye => {
            let (light_i, pdf_select) = scene.sample_light_selection(sampler.next());
            if pdf_select.is_zero() {
                return subpath;
            }
            let (geom, pdf_area) = scene.sample_light_position(light_i, sampler.next_vec2());
            let combined = PdfEval::new(pdf_area.v * pdf_select.v, Measure::Area);
            (geom, combined, scene.light_primitive_index(light_i))
        }
        TransportDirection::EyeToLight => {
            let cam_index = scene.main_camera_index();
            let camera = scene.main_camera().camera.as_ref().expect("main camera primitive must carry a camera GBSDF");
            let (pos, pdf) = camera.sample_camera_position(sampler.next_vec2());
            let geom = SurfaceGeometry::degenerate_at(pos, camera.camera_forward());
            (geom, pdf, cam_index)
        }
    };
    if pdf_position.is_zero() {
        return subpath;
    }

    let endpoint_bsdf = match direction {
        TransportDirection::LightToEye => scene.primitives[endpoint_primitive as usize].light.as_ref(),
        TransportDirection::EyeToLight => scene.primitives[endpoint_primitive as usize].camera.as_ref(),
    }
    .expect("endpoint primitive must carry the matching GBSDF role");

    let raster_hint = match direction {
        TransportDirection::EyeToLight => Some(raster),
        TransportDirection::LightToEye => None,
    };
    let endpoint_query = GbsdfQuery {
        geom: endpoint_geom,
        wi: Vec3f::splat(0.0),
        transport: direction,
        raster_hint,
    };
    let endpoint_sample = endpoint_bsdf.sample_direction(&endpoint_query, sampler);

    let endpoint_weight = Vec3f::splat(1.0 / pdf_position.v);
    let (wo0, pdf_direction0, specular0) = match endpoint_sample {
        Some(s) => (s.wo, s.pdf, s.sampled_type.is_specular()),
        None => (Vec3f::splat(0.0), PdfEval::zero(Measure::Discrete), false),
    };
    let mut pdf_direction_v0 = zero_pdf_direction();
    pdf_direction_v0[direction as usize] = pdf_direction0;

    let v0 = arena.alloc_vertex(BptVertex {
        vertex_type: VertexType::Endpoint,
        geom: endpoint_geom,
        pdf_position,
        primitive_index: Some(endpoint_primitive),
        weight: endpoint_weight,
        pdf_direction: pdf_direction_v0,
        pdf_rr: 1.0,
        transport_dir: direction,
        specular: specular0,
        wi: Vec3f::splat(0.0),
        wo: wo0,
    });
    subpath.push(v0);

    let Some(sample0) = endpoint_sample else {
        return subpath;
    };

    let cos0 = if endpoint_geom.degenerate { 1.0 } else { sample0.wo.dot(endpoint_geom.sn).abs() };
    let mut edge_beta = endpoint_weight.mul_element_wise(throughput_factor(sample0.value, sample0.pdf, cos0));
    let mut prev: &BptVertex = v0;
    let mut k: u32 = 1;

    while subpath.len() < max_vertices as usize {
        let mut ray = Ray::new(prev.geom.p, prev.wo);
        let Some(hit) = scene.intersect(&mut ray) else {
            break;
        };
        let prim = &scene.primitives[hit.primitive_index as usize];
        let Some(bsdf) = prim.bsdf.as_ref() else {
            break;
        };

        let Some((surviving_beta, pdf_rr)) = russian_roulette(edge_beta, k, rr_depth, sampler) else {
            break;
        };

        let wi = -prev.wo;
        let query = GbsdfQuery {
            geom: hit.geom,
            wi,
            transport: direction,
            raster_hint: None,
        };
        let sample = bsdf.sample_direction(&query, sampler);

        let (wo, sampled_specular, mut pdf_direction) = match &sample {
            Some(s) => (s.wo, s.sampled_type.is_specular(), zero_pdf_direction()),
            None => (Vec3f::splat(0.0), false, zero_pdf_direction()),
        };
        if let Some(s) = &sample {
            pdf_direction[direction as usize] = s.pdf;
            if !sampled_specular {
                let reverse_query = GbsdfQuery {
                    geom: hit.geom,
                    wi: s.wo,
                    transport: direction.flip(),
                    raster_hint: None,
                };
                pdf_direction[direction.flip() as usize] = bsdf.evaluate_direction_pdf(&reverse_query, wi);
            }
        }

        let vk = arena.alloc_vertex(BptVertex {
            vertex_type: VertexType::IntermediatePoint,
            geom: hit.geom,
            pdf_position: PdfEval::zero(Measure::Area),
            primitive_index: Some(hit.primitive_index),
            weight: surviving_beta,
            pdf_direction,
            pdf_rr,
            transport_dir: direction,
            specular: sampled_specular,
            wi,
            wo,
        });
        subpath.push(vk);

        let Some(sample) = sample else {
            break;
        };

        let cos_k = if hit.geom.degenerate { 1.0 } else { sample.wo.dot(hit.geom.sn).abs() };
        let mut factor = throughput_factor(sample.value, sample.pdf, cos_k);
        if direction == TransportDirection::LightToEye {
            factor = factor * shading_normal_correction(&hit.geom, wi, sample.wo);
        }
        edge_beta = surviving_beta.mul_element_wise(factor);
        prev = vk;
        k += 1;
    }

    subpath
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accel::{Accelerator, AccelHit, BuildTriangle};
    use crate::error::BuildError;
    use crate::gbsdf::arealight::AreaLightDir;
    use crate::gbsdf::camera::PerspectiveCameraDir;
    use crate::gbsdf::Gbsdf;
    use crate::mat::Transform;
    use crate::mesh::TriangleMesh;
    use crate::primitive::Primitive;
    use std::sync::Arc;

    #[derive(Clone)]
    struct SequenceSampler {
        values: Vec<Float>,
        i: usize,
    }
    impl SequenceSampler {
        fn new(values: Vec<Float>) -> Self {
            Self { values, i: 0 }
        }
    }
    impl Sampler for SequenceSampler {
        fn next(&mut self) -> Float {
            let v = self.values[self.i % self.values.len()];
            self.i += 1;
            v
        }
        fn next_uint(&mut self) -> u32 {
            0
        }
        fn set_seed(&mut self, _seed: u32) {}
    }

    struct NullAccel;
    impl Accelerator for NullAccel {
        fn build(&mut self, _triangles: Vec<BuildTriangle>) -> Result<(), BuildError> {
            Ok(())
        }
        fn intersect(&self, _ray: &mut Ray) -> Option<AccelHit> {
            None
        }
        fn intersect_p(&self, _ray: &Ray) -> bool {
            false
        }
    }

    fn quad_mesh() -> Arc<TriangleMesh> {
        use crate::vec::Point2f as P2;
        Arc::new(TriangleMesh::new(
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

    fn scene_with_one_light() -> Scene {
        let mut light_prim = Primitive::new(Transform::identity());
        light_prim.mesh = Some(quad_mesh());
        light_prim.light = Some(Gbsdf::AreaLightDir(AreaLightDir {
            radiance: Vec3f::splat(2.0),
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
    fn light_subpath_endpoint_has_finite_weight() {
        let scene = scene_with_one_light();
        let mut sampler = SequenceSampler::new(vec![0.25, 0.5, 0.5, 0.1, 0.9]);
        let arena = VertexArena::new();
        let subpath = sample_subpath(TransportDirection::LightToEye, &scene, &mut sampler, &arena, Point2f::new(0.5, 0.5), 5, 8);
        assert!(!subpath.is_empty());
        let v0 = subpath.endpoint().unwrap();
        assert!(v0.is_endpoint());
        assert!(v0.weight.is_finite());
        assert!(v0.pdf_position.v > 0.0);
    }

    #[test]
    fn eye_subpath_terminates_at_endpoint_when_nothing_is_hit() {
        let scene = scene_with_one_light();
        let mut sampler = SequenceSampler::new(vec![0.4, 0.6]);
        let arena = VertexArena::new();
        let subpath = sample_subpath(TransportDirection::EyeToLight, &scene, &mut sampler, &arena, Point2f::new(0.5, 0.5), 5, 8);
        assert_eq!(subpath.len(), 1);
        let v0 = subpath.endpoint().unwrap();
        assert!((v0.wo.z - 1.0).abs() < 1e-3);
    }

    #[test]
    fn max_vertices_of_one_returns_only_the_endpoint() {
        let scene = scene_with_one_light();
        let mut sampler = SequenceSampler::new(vec![0.25, 0.5, 0.5]);
        let arena = VertexArena::new();
        let subpath = sample_subpath(TransportDirection::LightToEye, &scene, &mut sampler, &arena, Point2f::new(0.5, 0.5), 5, 1);
        assert_eq!(subpath.len(), 1);
    }
}
