//! Surface-geometry and intersection records produced by scene queries.

use crate::mat::Mat4;
use crate::vec::{coordinate_system, Dot, Point2f, Vec3f};

/// Geometry at a point on a surface, in world space.
#[derive(Copy, Clone, Debug)]
pub struct SurfaceGeometry {
    pub p: Vec3f,
    pub gn: Vec3f,
    pub sn: Vec3f,
    pub ss: Vec3f,
    pub st: Vec3f,
    pub uv: Point2f,
    /// Maps world-space directions into the shading frame `(ss, st, sn)`.
    pub world_to_shading: Mat4,
    /// Maps shading-frame directions back to world space; the inverse of
    /// `world_to_shading`.
    pub shading_to_world: Mat4,
    /// Set for endpoints with no real positional geometry (e.g. an
    /// environment sample, or a delta-position camera/light); callers must
    /// replace the corresponding cosine term by `1` rather than reading `gn`
    /// or `sn` (spec §3, §4.5.2).
    pub degenerate: bool,
}

impl SurfaceGeometry {
    /// Construct the orthonormal shading frame `(ss, st, sn)` by Gram-Schmidt
    /// against an arbitrary tangent hint, right-handed: `cross(ss, sn) = st`.
    pub fn build_frame(p: Vec3f, gn: Vec3f, sn: Vec3f, uv: Point2f) -> SurfaceGeometry {
        let (mut ss, _) = coordinate_system(sn);
        // Gram-Schmidt: remove the sn component from the tangent hint.
        ss = (ss - sn * sn.dot(ss)).normalize();
        let st = sn.cross(ss);

        let world_to_shading = frame_matrix(ss, st, sn);
        let shading_to_world = world_to_shading.transpose();

        SurfaceGeometry {
            p,
            gn,
            sn,
            ss,
            st,
            uv,
            world_to_shading,
            shading_to_world,
            degenerate: false,
        }
    }

    /// A geometry record with no real surface (environment/delta endpoints).
    pub fn degenerate_at(p: Vec3f, dir: Vec3f) -> SurfaceGeometry {
        let n = if dir.length_squared() > 0.0 {
            dir.normalize()
        } else {
            Vec3f::new(0.0, 0.0, 1.0)
        };
        let mut g = SurfaceGeometry::build_frame(p, n, n, Point2f::new(0.0, 0.0));
        g.degenerate = true;
        g
    }

    #[inline]
    pub fn to_shading(&self, w: Vec3f) -> Vec3f {
        Vec3f::new(w.dot(self.ss), w.dot(self.st), w.dot(self.sn))
    }

    #[inline]
    pub fn to_world(&self, w: Vec3f) -> Vec3f {
        self.ss * w.x + self.st * w.y + self.sn * w.z
    }
}

/// A right-handed orthonormal-basis change-of-basis matrix with rows
/// `(ss, st, sn)`; its transpose is its inverse because the basis is
/// orthonormal.
fn frame_matrix(ss: Vec3f, st: Vec3f, sn: Vec3f) -> Mat4 {
    use crate::vec::Vec4f;
    Mat4::from_rows([
        Vec4f::new(ss.x, ss.y, ss.z, 0.0),
        Vec4f::new(st.x, st.y, st.z, 0.0),
        Vec4f::new(sn.x, sn.y, sn.z, 0.0),
        Vec4f::new(0.0, 0.0, 0.0, 1.0),
    ])
}

/// An intersection: surface geometry plus a back-reference to the hit
/// primitive and the triangle within its mesh.
#[derive(Copy, Clone, Debug)]
pub struct Intersection {
    pub geom: SurfaceGeometry,
    pub primitive_index: u32,
    pub face_index: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_is_orthonormal_and_right_handed() {
        let g = SurfaceGeometry::build_frame(
            Vec3f::new(0.0, 0.0, 0.0),
            Vec3f::new(0.0, 0.0, 1.0),
            Vec3f::new(0.0, 0.0, 1.0),
            Point2f::new(0.0, 0.0),
        );
        assert!((g.ss.dot(g.sn)).abs() < 1e-5);
        assert!((g.st.dot(g.sn)).abs() < 1e-5);
        assert!((g.ss.cross(g.sn) - g.st).length() < 1e-4);
    }

    #[test]
    fn to_shading_and_back_roundtrip() {
        let g = SurfaceGeometry::build_frame(
            Vec3f::new(0.0, 0.0, 0.0),
            Vec3f::new(0.3, 0.1, 0.9).normalize(),
            Vec3f::new(0.3, 0.1, 0.9).normalize(),
            Point2f::new(0.0, 0.0),
        );
        let w = Vec3f::new(0.2, -0.4, 0.8).normalize();
        let local = g.to_shading(w);
        let back = g.to_world(local);
        assert!((back - w).length() < 1e-4);
    }
}
