//! Fixed-dimension vectors, parameterized over the element type.
//!
//! `Vec3<f32>`/`Vec4<f32>` are declared `#[repr(align(16))]` so that on
//! platforms with SSE2 (all `x86_64` targets) they occupy exactly one 128-bit
//! register; `Vec3<f64>`/`Vec4<f64>` are `#[repr(align(32))]` for AVX. That
//! alignment is the whole of the SIMD story here: arithmetic below is plain
//! scalar Rust, laid out so an optimizing compiler can autovectorize it, with
//! no hand-written intrinsics or `target_feature` gating.

use num_traits::Float as NumFloat;
use std::ops::{Add, AddAssign, Div, DivAssign, Index, IndexMut, Mul, MulAssign, Neg, Sub, SubAssign};

use crate::pbrt::Float;

/// Dot product, shared by `Vec2`/`Vec3`/`Vec4`.
pub trait Dot<Rhs = Self> {
    type Output;
    fn dot(self, rhs: Rhs) -> Self::Output;
}

macro_rules! impl_vec2 {
    ($name:ident) => {
        #[derive(Copy, Clone, Debug, Default, PartialEq)]
        pub struct $name<T> {
            pub x: T,
            pub y: T,
        }

        impl<T> $name<T> {
            #[inline]
            pub const fn new(x: T, y: T) -> Self {
                Self { x, y }
            }
        }

        impl<T: Copy> $name<T> {
            #[inline]
            pub fn splat(v: T) -> Self {
                Self { x: v, y: v }
            }
        }

        impl<T: Add<Output = T>> Add for $name<T> {
            type Output = Self;
            #[inline]
            fn add(self, rhs: Self) -> Self {
                Self::new(self.x + rhs.x, self.y + rhs.y)
            }
        }

        impl<T: Sub<Output = T>> Sub for $name<T> {
            type Output = Self;
            #[inline]
            fn sub(self, rhs: Self) -> Self {
                Self::new(self.x - rhs.x, self.y - rhs.y)
            }
        }

        impl<T: Copy + Mul<Output = T>> Mul<T> for $name<T> {
            type Output = Self;
            #[inline]
            fn mul(self, rhs: T) -> Self {
                Self::new(self.x * rhs, self.y * rhs)
            }
        }

        impl<T: Copy + Div<Output = T>> Div<T> for $name<T> {
            type Output = Self;
            #[inline]
            fn div(self, rhs: T) -> Self {
                Self::new(self.x / rhs, self.y / rhs)
            }
        }

        impl<T: Copy + Add<Output = T> + Mul<Output = T>> Dot for $name<T> {
            type Output = T;
            #[inline]
            fn dot(self, rhs: Self) -> T {
                self.x * rhs.x + self.y * rhs.y
            }
        }
    };
}

impl_vec2!(Vec2);
impl_vec2!(Point2);

pub type Vec2f = Vec2<Float>;
pub type Point2f = Point2<Float>;
pub type Vec2i = Vec2<i32>;

/// 3-D vector. `#[repr(C, align(16))]` gives `Vec3f` the layout of a padded
/// 128-bit SIMD lane (one lane unused) without requiring `unsafe` to read the
/// individual components.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[repr(C, align(16))]
pub struct Vec3<T> {
    pub x: T,
    pub y: T,
    pub z: T,
}

impl<T> Vec3<T> {
    #[inline]
    pub const fn new(x: T, y: T, z: T) -> Self {
        Self { x, y, z }
    }
}

impl<T: Copy> Vec3<T> {
    #[inline]
    pub fn splat(v: T) -> Self {
        Self { x: v, y: v, z: v }
    }
}

impl<T: Copy + Add<Output = T> + Sub<Output = T> + Mul<Output = T>> Vec3<T> {
    /// Cross product.
    #[inline]
    pub fn cross(self, rhs: Self) -> Self {
        Self::new(
            self.y * rhs.z - self.z * rhs.y,
            self.z * rhs.x - self.x * rhs.z,
            self.x * rhs.y - self.y * rhs.x,
        )
    }
}

impl<T: Copy + Add<Output = T> + Mul<Output = T>> Dot for Vec3<T> {
    type Output = T;
    #[inline]
    fn dot(self, rhs: Self) -> T {
        self.x * rhs.x + self.y * rhs.y + self.z * rhs.z
    }
}

impl<T: Add<Output = T>> Add for Vec3<T> {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl<T: Copy + Add<Output = T>> AddAssign for Vec3<T> {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl<T: Sub<Output = T>> Sub for Vec3<T> {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl<T: Copy + Sub<Output = T>> SubAssign for Vec3<T> {
    #[inline]
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl<T: Neg<Output = T>> Neg for Vec3<T> {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

impl<T: Copy + Mul<Output = T>> Mul<T> for Vec3<T> {
    type Output = Self;
    #[inline]
    fn mul(self, rhs: T) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl<T: Copy + Mul<Output = T>> MulAssign<T> for Vec3<T> {
    #[inline]
    fn mul_assign(&mut self, rhs: T) {
        *self = *self * rhs;
    }
}

/// Componentwise (Hadamard) product, used constantly for spectra.
impl<T: Copy + Mul<Output = T>> Vec3<T> {
    #[inline]
    pub fn mul_element_wise(self, rhs: Self) -> Self {
        Self::new(self.x * rhs.x, self.y * rhs.y, self.z * rhs.z)
    }
}

impl<T: Copy + Div<Output = T>> Div<T> for Vec3<T> {
    type Output = Self;
    #[inline]
    fn div(self, rhs: T) -> Self {
        Self::new(self.x / rhs, self.y / rhs, self.z / rhs)
    }
}

impl<T: Copy + Div<Output = T>> DivAssign<T> for Vec3<T> {
    #[inline]
    fn div_assign(&mut self, rhs: T) {
        *self = *self / rhs;
    }
}

impl<T> Index<usize> for Vec3<T> {
    type Output = T;
    #[inline]
    fn index(&self, i: usize) -> &T {
        match i {
            0 => &self.x,
            1 => &self.y,
            2 => &self.z,
            _ => panic!("Vec3 index out of range: {}", i),
        }
    }
}

impl<T> IndexMut<usize> for Vec3<T> {
    #[inline]
    fn index_mut(&mut self, i: usize) -> &mut T {
        match i {
            0 => &mut self.x,
            1 => &mut self.y,
            2 => &mut self.z,
            _ => panic!("Vec3 index out of range: {}", i),
        }
    }
}

impl<T: NumFloat> Vec3<T> {
    #[inline]
    pub fn length_squared(self) -> T {
        self.dot(self)
    }

    #[inline]
    pub fn length(self) -> T {
        self.length_squared().sqrt()
    }

    /// Normalize. Returns the zero vector unchanged if `self` is already
    /// (numerically) zero-length — callers on the BPT hot path are expected
    /// to have already rejected degenerate directions via the invariants in
    /// spec §3, so this never silently fabricates a direction.
    #[inline]
    pub fn normalize(self) -> Self {
        let len = self.length();
        if len > T::zero() {
            self / len
        } else {
            self
        }
    }

    #[inline]
    pub fn has_nans(self) -> bool {
        self.x.is_nan() || self.y.is_nan() || self.z.is_nan()
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    #[inline]
    pub fn max_component(self) -> T {
        self.x.max(self.y).max(self.z)
    }

    #[inline]
    pub fn abs(self) -> Self {
        Self::new(self.x.abs(), self.y.abs(), self.z.abs())
    }

    /// Reflect `self` about normal `n` (both normalized); used by the
    /// mirror/specular reflection BSDFs.
    #[inline]
    pub fn reflect(self, n: Self) -> Self {
        n * (T::one() + T::one()) * self.dot(n) - self
    }
}

pub type Vec3f = Vec3<Float>;
pub type Point3f = Vec3<Float>;
pub type Normal3f = Vec3<Float>;

/// Returns an orthonormal basis `(t1, t2)` for the tangent plane of `n`, using
/// Duff et al.'s branch-free construction. Used to build `ss`/`st` in
/// [`crate::interaction::SurfaceGeometry`] and for cosine-hemisphere sampling.
#[inline]
pub fn coordinate_system(n: Vec3f) -> (Vec3f, Vec3f) {
    let sign = if n.z >= 0.0 { 1.0 } else { -1.0 };
    let a = -1.0 / (sign + n.z);
    let b = n.x * n.y * a;
    let t1 = Vec3f::new(1.0 + sign * n.x * n.x * a, sign * b, -sign * n.x);
    let t2 = Vec3f::new(b, sign + n.y * n.y * a, -n.y);
    (t1, t2)
}

/// Flip `v` so it lies in the same hemisphere as `n`.
#[inline]
pub fn face_forward(v: Vec3f, n: Vec3f) -> Vec3f {
    if v.dot(n) < 0.0 {
        -v
    } else {
        v
    }
}

/// 4-D vector, used by homogeneous transforms.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[repr(C, align(16))]
pub struct Vec4<T> {
    pub x: T,
    pub y: T,
    pub z: T,
    pub w: T,
}

impl<T> Vec4<T> {
    #[inline]
    pub const fn new(x: T, y: T, z: T, w: T) -> Self {
        Self { x, y, z, w }
    }
}

impl<T: Copy + Add<Output = T> + Mul<Output = T>> Dot for Vec4<T> {
    type Output = T;
    #[inline]
    fn dot(self, rhs: Self) -> T {
        self.x * rhs.x + self.y * rhs.y + self.z * rhs.z + self.w * rhs.w
    }
}

pub type Vec4f = Vec4<Float>;
