//! Axis-aligned bounding boxes.

use crate::pbrt::{Axis, Float};
use crate::ray::Ray;
use crate::vec::Vec3f;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vec3f,
    pub max: Vec3f,
}

impl Aabb {
    /// The empty AABB: `min = +∞`, `max = -∞`, so that unioning it with any
    /// point or box yields exactly that point/box (spec §3).
    pub const EMPTY: Aabb = Aabb {
        min: Vec3f::new(Float::INFINITY, Float::INFINITY, Float::INFINITY),
        max: Vec3f::new(Float::NEG_INFINITY, Float::NEG_INFINITY, Float::NEG_INFINITY),
    };

    #[inline]
    pub fn new(min: Vec3f, max: Vec3f) -> Self {
        Self { min, max }
    }

    #[inline]
    pub fn from_point(p: Vec3f) -> Self {
        Self { min: p, max: p }
    }

    #[inline]
    pub fn union_point(&self, p: Vec3f) -> Aabb {
        Aabb::new(
            Vec3f::new(self.min.x.min(p.x), self.min.y.min(p.y), self.min.z.min(p.z)),
            Vec3f::new(self.max.x.max(p.x), self.max.y.max(p.y), self.max.z.max(p.z)),
        )
    }

    #[inline]
    pub fn union(&self, o: &Aabb) -> Aabb {
        Aabb::new(
            Vec3f::new(
                self.min.x.min(o.min.x),
                self.min.y.min(o.min.y),
                self.min.z.min(o.min.z),
            ),
            Vec3f::new(
                self.max.x.max(o.max.x),
                self.max.y.max(o.max.y),
                self.max.z.max(o.max.z),
            ),
        )
    }

    #[inline]
    pub fn contains(&self, p: Vec3f) -> bool {
        p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
            && p.z >= self.min.z
            && p.z <= self.max.z
    }

    #[inline]
    pub fn diagonal(&self) -> Vec3f {
        self.max - self.min
    }

    #[inline]
    pub fn centroid(&self) -> Vec3f {
        (self.min + self.max) * 0.5
    }

    pub fn surface_area(&self) -> Float {
        let d = self.diagonal();
        if d.x < 0.0 || d.y < 0.0 || d.z < 0.0 {
            return 0.0;
        }
        2.0 * (d.x * d.y + d.y * d.z + d.z * d.x)
    }

    pub fn longest_axis(&self) -> Axis {
        let d = self.diagonal();
        if d.x > d.y && d.x > d.z {
            Axis::X
        } else if d.y > d.z {
            Axis::Y
        } else {
            Axis::Z
        }
    }

    /// Is this box degenerate along its longest axis (zero extent)? Used by
    /// the QBVH builder to fall back to a leaf when the centroid bound
    /// cannot be split (spec §4.2.1).
    pub fn is_degenerate_along_longest_axis(&self) -> bool {
        let d = self.diagonal();
        let axis = self.longest_axis();
        d[axis.index()] <= 0.0
    }

    /// Slab test against a ray, returning `(t_enter, t_exit)` clipped to
    /// `[ray.min_t, ray.max_t]` if they overlap.
    pub fn intersect_ray(&self, ray: &Ray) -> Option<(Float, Float)> {
        let mut t0 = ray.min_t;
        let mut t1 = ray.max_t;
        for axis in 0..3 {
            let inv_d = 1.0 / ray.d[axis];
            let mut t_near = (self.min[axis] - ray.o[axis]) * inv_d;
            let mut t_far = (self.max[axis] - ray.o[axis]) * inv_d;
            if t_near > t_far {
                std::mem::swap(&mut t_near, &mut t_far);
            }
            t0 = t0.max(t_near);
            t1 = t1.min(t_far);
            if t0 > t1 {
                return None;
            }
        }
        Some((t0, t1))
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Aabb::EMPTY
    }
}
