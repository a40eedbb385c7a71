//! 3×3 and 4×4 matrices and the `Transform` wrapper (matrix + its inverse)
//! used by every scene node.

use crate::pbrt::Float;
use crate::vec::{Vec3f, Vec4f};

/// Row-major 4×4 matrix. `Vec4f` rows give the same 16-byte alignment as the
/// vector types so a `Mat4` maps to four SIMD registers.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Mat4 {
    pub rows: [Vec4f; 4],
}

impl Mat4 {
    pub const IDENTITY: Mat4 = Mat4 {
        rows: [
            Vec4f::new(1.0, 0.0, 0.0, 0.0),
            Vec4f::new(0.0, 1.0, 0.0, 0.0),
            Vec4f::new(0.0, 0.0, 1.0, 0.0),
            Vec4f::new(0.0, 0.0, 0.0, 1.0),
        ],
    };

    #[inline]
    pub fn from_rows(rows: [Vec4f; 4]) -> Self {
        Self { rows }
    }

    #[inline]
    pub fn get(&self, r: usize, c: usize) -> Float {
        match c {
            0 => self.rows[r].x,
            1 => self.rows[r].y,
            2 => self.rows[r].z,
            _ => self.rows[r].w,
        }
    }

    pub fn translate(t: Vec3f) -> Self {
        Mat4::from_rows([
            Vec4f::new(1.0, 0.0, 0.0, t.x),
            Vec4f::new(0.0, 1.0, 0.0, t.y),
            Vec4f::new(0.0, 0.0, 1.0, t.z),
            Vec4f::new(0.0, 0.0, 0.0, 1.0),
        ])
    }

    pub fn scale(s: Vec3f) -> Self {
        Mat4::from_rows([
            Vec4f::new(s.x, 0.0, 0.0, 0.0),
            Vec4f::new(0.0, s.y, 0.0, 0.0),
            Vec4f::new(0.0, 0.0, s.z, 0.0),
            Vec4f::new(0.0, 0.0, 0.0, 1.0),
        ])
    }

    /// Rotation by `angle_deg` degrees about unit (or non-unit, normalized
    /// internally) `axis`, Rodrigues' formula.
    pub fn rotate(angle_deg: Float, axis: Vec3f) -> Self {
        let a = axis.normalize();
        let s = angle_deg.to_radians().sin();
        let c = angle_deg.to_radians().cos();
        let mut m = Mat4::IDENTITY;
        m.rows[0].x = a.x * a.x + (1.0 - a.x * a.x) * c;
        m.rows[0].y = a.x * a.y * (1.0 - c) - a.z * s;
        m.rows[0].z = a.x * a.z * (1.0 - c) + a.y * s;
        m.rows[1].x = a.x * a.y * (1.0 - c) + a.z * s;
        m.rows[1].y = a.y * a.y + (1.0 - a.y * a.y) * c;
        m.rows[1].z = a.y * a.z * (1.0 - c) - a.x * s;
        m.rows[2].x = a.x * a.z * (1.0 - c) - a.y * s;
        m.rows[2].y = a.y * a.z * (1.0 - c) + a.x * s;
        m.rows[2].z = a.z * a.z + (1.0 - a.z * a.z) * c;
        m
    }

    pub fn mul(&self, rhs: &Mat4) -> Mat4 {
        let mut out = Mat4::from_rows([Vec4f::new(0.0, 0.0, 0.0, 0.0); 4]);
        for r in 0..4 {
            for c in 0..4 {
                let mut sum = 0.0;
                for k in 0..4 {
                    sum += self.get(r, k) * rhs.get(k, c);
                }
                match c {
                    0 => out.rows[r].x = sum,
                    1 => out.rows[r].y = sum,
                    2 => out.rows[r].z = sum,
                    _ => out.rows[r].w = sum,
                }
            }
        }
        out
    }

    pub fn transpose(&self) -> Mat4 {
        let mut out = Mat4::IDENTITY;
        for r in 0..4 {
            for c in 0..4 {
                set(&mut out, c, r, self.get(r, c));
            }
        }
        out
    }

    /// Transform a point (implicit w=1), applying perspective divide if w != 1.
    pub fn transform_point(&self, p: Vec3f) -> Vec3f {
        let x = self.rows[0].x * p.x + self.rows[0].y * p.y + self.rows[0].z * p.z + self.rows[0].w;
        let y = self.rows[1].x * p.x + self.rows[1].y * p.y + self.rows[1].z * p.z + self.rows[1].w;
        let z = self.rows[2].x * p.x + self.rows[2].y * p.y + self.rows[2].z * p.z + self.rows[2].w;
        let w = self.rows[3].x * p.x + self.rows[3].y * p.y + self.rows[3].z * p.z + self.rows[3].w;
        if (w - 1.0).abs() < 1e-8 || w == 0.0 {
            Vec3f::new(x, y, z)
        } else {
            Vec3f::new(x, y, z) * (1.0 / w)
        }
    }

    /// Transform a vector (implicit w=0): translation has no effect.
    pub fn transform_vector(&self, v: Vec3f) -> Vec3f {
        Vec3f::new(
            self.rows[0].x * v.x + self.rows[0].y * v.y + self.rows[0].z * v.z,
            self.rows[1].x * v.x + self.rows[1].y * v.y + self.rows[1].z * v.z,
            self.rows[2].x * v.x + self.rows[2].y * v.y + self.rows[2].z * v.z,
        )
    }

    /// General 4×4 inverse via Gauss-Jordan elimination with partial
    /// pivoting. Returns the identity if the matrix is singular (callers
    /// only ever invert well-formed scene transforms).
    pub fn inverse(&self) -> Mat4 {
        let mut a = [[0.0f64; 8]; 4];
        for r in 0..4 {
            for c in 0..4 {
                a[r][c] = self.get(r, c) as f64;
            }
            a[r][4 + r] = 1.0;
        }
        for col in 0..4 {
            let mut pivot = col;
            for r in (col + 1)..4 {
                if a[r][col].abs() > a[pivot][col].abs() {
                    pivot = r;
                }
            }
            if a[pivot][col].abs() < 1e-12 {
                return Mat4::IDENTITY;
            }
            a.swap(col, pivot);
            let div = a[col][col];
            for c in 0..8 {
                a[col][c] /= div;
            }
            for r in 0..4 {
                if r != col {
                    let factor = a[r][col];
                    for c in 0..8 {
                        a[r][c] -= factor * a[col][c];
                    }
                }
            }
        }
        let mut rows = [Vec4f::new(0.0, 0.0, 0.0, 0.0); 4];
        for r in 0..4 {
            rows[r] = Vec4f::new(
                a[r][4] as Float,
                a[r][5] as Float,
                a[r][6] as Float,
                a[r][7] as Float,
            );
        }
        Mat4::from_rows(rows)
    }
}

#[inline]
fn set(m: &mut Mat4, r: usize, c: usize, v: Float) {
    match c {
        0 => m.rows[r].x = v,
        1 => m.rows[r].y = v,
        2 => m.rows[r].z = v,
        _ => m.rows[r].w = v,
    }
}

/// A world transform plus its cached inverse, per primitive. The
/// inverse-transpose of the linear (upper-left 3×3) part is used to carry
/// normals, which transform contravariantly.
#[derive(Copy, Clone, Debug)]
pub struct Transform {
    pub m: Mat4,
    pub inv: Mat4,
}

impl Transform {
    pub fn new(m: Mat4) -> Self {
        let inv = m.inverse();
        Self { m, inv }
    }

    pub const fn identity() -> Self {
        Self {
            m: Mat4::IDENTITY,
            inv: Mat4::IDENTITY,
        }
    }

    pub fn then(&self, next: &Transform) -> Transform {
        Transform::new(next.m.mul(&self.m))
    }

    #[inline]
    pub fn transform_point(&self, p: Vec3f) -> Vec3f {
        self.m.transform_point(p)
    }

    #[inline]
    pub fn transform_vector(&self, v: Vec3f) -> Vec3f {
        self.m.transform_vector(v)
    }

    /// Transform a normal using the inverse-transpose of the linear part.
    #[inline]
    pub fn transform_normal(&self, n: Vec3f) -> Vec3f {
        let it = &self.inv;
        Vec3f::new(
            it.get(0, 0) * n.x + it.get(1, 0) * n.y + it.get(2, 0) * n.z,
            it.get(0, 1) * n.x + it.get(1, 1) * n.y + it.get(2, 1) * n.z,
            it.get(0, 2) * n.x + it.get(1, 2) * n.y + it.get(2, 2) * n.z,
        )
    }
}

impl Default for Transform {
    fn default() -> Self {
        Transform::identity()
    }
}
