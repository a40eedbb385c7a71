//! Immutable triangle meshes.

use crate::aabb::Aabb;
use crate::vec::{Point2f, Vec3f};

/// A triangle mesh: positions, shading normals, texture coordinates and a
/// flat face-index buffer (three indices per face). Immutable after load
/// (spec §3) — built once by the asset loader, then shared by `Arc` across
/// every primitive that instances it.
#[derive(Clone, Debug)]
pub struct TriangleMesh {
    pub positions: Vec<Vec3f>,
    pub normals: Vec<Vec3f>,
    pub uvs: Vec<Point2f>,
    /// Three vertex indices per face.
    pub indices: Vec<[u32; 3]>,
}

impl TriangleMesh {
    pub fn new(positions: Vec<Vec3f>, normals: Vec<Vec3f>, uvs: Vec<Point2f>, indices: Vec<[u32; 3]>) -> Self {
        Self {
            positions,
            normals,
            uvs,
            indices,
        }
    }

    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn num_faces(&self) -> usize {
        self.indices.len()
    }

    #[inline]
    pub fn face(&self, i: usize) -> [u32; 3] {
        self.indices[i]
    }

    #[inline]
    pub fn position(&self, i: u32) -> Vec3f {
        self.positions[i as usize]
    }

    #[inline]
    pub fn normal(&self, i: u32) -> Vec3f {
        self.normals[i as usize]
    }

    #[inline]
    pub fn uv(&self, i: u32) -> Point2f {
        self.uvs[i as usize]
    }

    /// Object-space vertex positions of face `i`.
    #[inline]
    pub fn face_positions(&self, i: usize) -> [Vec3f; 3] {
        let f = self.face(i);
        [self.position(f[0]), self.position(f[1]), self.position(f[2])]
    }

    /// Surface area of face `i` in object space.
    pub fn face_area(&self, i: usize) -> f32 {
        let [p0, p1, p2] = self.face_positions(i);
        0.5 * (p1 - p0).cross(p2 - p0).length()
    }

    pub fn object_bounds(&self) -> Aabb {
        let mut b = Aabb::EMPTY;
        for &p in &self.positions {
            b = b.union_point(p);
        }
        b
    }
}
