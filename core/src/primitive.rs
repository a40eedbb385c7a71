//! Scene nodes.

use std::sync::Arc;

use crate::gbsdf::Gbsdf;
use crate::mat::Transform;
use crate::mesh::TriangleMesh;

/// A scene node: a world transform, an optional mesh, and at most one
/// role out of `{bsdf, camera, light}` layered on top of it (spec §3).
/// Primitives are owned by the [`crate::scene::Scene`] in a flat `Vec` and
/// referenced everywhere else by their stable index into it.
#[derive(Clone)]
pub struct Primitive {
    pub transform: Transform,
    pub mesh: Option<Arc<TriangleMesh>>,
    pub bsdf: Option<Gbsdf>,
    pub camera: Option<Gbsdf>,
    pub light: Option<Gbsdf>,
}

impl Primitive {
    pub fn new(transform: Transform) -> Self {
        Self {
            transform,
            mesh: None,
            bsdf: None,
            camera: None,
            light: None,
        }
    }

    #[inline]
    pub fn is_camera(&self) -> bool {
        self.camera.is_some()
    }

    #[inline]
    pub fn is_light(&self) -> bool {
        self.light.is_some()
    }

    /// World-space surface area of the instanced mesh, used to weight this
    /// primitive in the light-selection distribution (spec §4.3). Zero for
    /// primitives with no mesh.
    pub fn world_area(&self) -> crate::pbrt::Float {
        let Some(mesh) = &self.mesh else {
            return 0.0;
        };
        // A uniform scale factor would let us avoid per-face work, but the
        // transform may be a general affine map, so sum transformed face
        // areas directly.
        let mut area = 0.0;
        for i in 0..mesh.num_faces() {
            let [p0, p1, p2] = mesh.face_positions(i);
            let (wp0, wp1, wp2) = (
                self.transform.transform_point(p0),
                self.transform.transform_point(p1),
                self.transform.transform_point(p2),
            );
            area += 0.5 * (wp1 - wp0).cross(wp2 - wp0).length();
        }
        area
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mat::Mat4;
    use crate::vec::{Point2f, Vec3f};

    #[test]
    fn world_area_scales_with_transform() {
        let mesh = Arc::new(TriangleMesh::new(
            vec![Vec3f::new(0.0, 0.0, 0.0), Vec3f::new(1.0, 0.0, 0.0), Vec3f::new(0.0, 1.0, 0.0)],
            vec![Vec3f::new(0.0, 0.0, 1.0); 3],
            vec![Point2f::new(0.0, 0.0), Point2f::new(1.0, 0.0), Point2f::new(0.0, 1.0)],
            vec![[0, 1, 2]],
        ));
        let mut p = Primitive::new(Transform::new(Mat4::scale(Vec3f::new(2.0, 2.0, 1.0))));
        p.mesh = Some(mesh);
        assert!((p.world_area() - 2.0).abs() < 1e-5);
    }
}
