//! Area light construction: binds a mesh and a [`core::gbsdf::arealight::AreaLightDir`]
//! onto a [`core::primitive::Primitive`] (spec §6's `lights` scene-node kind).
//! Area-weighted position sampling over the mesh — the other half of a diffuse
//! area light — is mesh/primitive machinery that lives in `core::scene::Scene`
//! itself (it needs the whole light list to build the selection distribution),
//! not here; see `DESIGN.md`.

use std::sync::Arc;

use core::gbsdf::arealight::AreaLightDir;
use core::gbsdf::Gbsdf;
use core::mat::Transform;
use core::mesh::TriangleMesh;
use core::primitive::Primitive;
use core::vec::Vec3f;

/// Builds a diffuse area light primitive: `mesh` transformed by `transform`,
/// emitting `radiance` uniformly from the side(s) its geometric normal faces.
pub fn build_area_light(transform: Transform, mesh: Arc<TriangleMesh>, radiance: Vec3f, two_sided: bool) -> Primitive {
    let mut prim = Primitive::new(transform);
    prim.mesh = Some(mesh);
    prim.light = Some(Gbsdf::AreaLightDir(AreaLightDir { radiance, two_sided }));
    prim
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::vec::Point2f;

    fn quad_mesh() -> Arc<TriangleMesh> {
        Arc::new(TriangleMesh::new(
            vec![
                Vec3f::new(-1.0, -1.0, 0.0),
                Vec3f::new(1.0, -1.0, 0.0),
                Vec3f::new(1.0, 1.0, 0.0),
                Vec3f::new(-1.0, 1.0, 0.0),
            ],
            vec![Vec3f::new(0.0, 0.0, 1.0); 4],
            vec![Point2f::new(0.0, 0.0), Point2f::new(1.0, 0.0), Point2f::new(1.0, 1.0), Point2f::new(0.0, 1.0)],
            vec![[0, 1, 2], [0, 2, 3]],
        ))
    }

    #[test]
    fn built_primitive_is_a_light_but_not_a_camera() {
        let prim = build_area_light(Transform::identity(), quad_mesh(), Vec3f::splat(3.0), false);
        assert!(prim.is_light());
        assert!(!prim.is_camera());
        assert!(prim.mesh.is_some());
    }

    #[test]
    fn world_area_of_the_built_light_matches_its_mesh() {
        let prim = build_area_light(Transform::identity(), quad_mesh(), Vec3f::splat(1.0), true);
        assert!((prim.world_area() - 4.0).abs() < 1e-5);
    }

    #[test]
    fn two_sided_flag_is_forwarded_into_the_gbsdf() {
        let prim = build_area_light(Transform::identity(), quad_mesh(), Vec3f::splat(1.0), true);
        match prim.light {
            Some(Gbsdf::AreaLightDir(dir)) => assert!(dir.two_sided),
            _ => panic!("expected an AreaLightDir"),
        }
    }
}
