//! Importance-sampled warps from the unit square to hemisphere/disk/triangle
//! shapes, in a canonical local frame (`+z` is the pole). Callers transform
//! into world space via [`crate::interaction::SurfaceGeometry::to_world`].

use crate::pbrt::{Float, PI};
use crate::vec::{Point2f, Vec3f};

/// Maps `u ∈ [0,1)²` to the unit disk with uniform area density, via
/// Shirley's concentric mapping (no distortion near the origin, unlike the
/// naive polar mapping).
pub fn concentric_sample_disk(u: Point2f) -> Point2f {
    let offset = Point2f::new(2.0 * u.x - 1.0, 2.0 * u.y - 1.0);
    if offset.x == 0.0 && offset.y == 0.0 {
        return Point2f::new(0.0, 0.0);
    }
    let (r, theta) = if offset.x.abs() > offset.y.abs() {
        (offset.x, PI / 4.0 * (offset.y / offset.x))
    } else {
        (offset.y, PI / 2.0 - PI / 4.0 * (offset.x / offset.y))
    };
    Point2f::new(r * theta.cos(), r * theta.sin())
}

/// Cosine-weighted hemisphere sample about `+z` (Malley's method): project a
/// concentric disk sample up onto the hemisphere. PDF in solid angle is
/// `cos θ / π`.
pub fn cosine_sample_hemisphere(u: Point2f) -> Vec3f {
    let d = concentric_sample_disk(u);
    let z = (1.0 - d.x * d.x - d.y * d.y).max(0.0).sqrt();
    Vec3f::new(d.x, d.y, z)
}

#[inline]
pub fn cosine_hemisphere_pdf(cos_theta: Float) -> Float {
    cos_theta.max(0.0) / PI
}

/// Uniform hemisphere sample about `+z`. PDF in solid angle is `1 / 2π`.
pub fn uniform_sample_hemisphere(u: Point2f) -> Vec3f {
    let z = u.x;
    let r = (1.0 - z * z).max(0.0).sqrt();
    let phi = 2.0 * PI * u.y;
    Vec3f::new(r * phi.cos(), r * phi.sin(), z)
}

#[inline]
pub fn uniform_hemisphere_pdf() -> Float {
    1.0 / (2.0 * PI)
}

/// Uniform full-sphere sample. PDF in solid angle is `1 / 4π`.
pub fn uniform_sample_sphere(u: Point2f) -> Vec3f {
    let z = 1.0 - 2.0 * u.x;
    let r = (1.0 - z * z).max(0.0).sqrt();
    let phi = 2.0 * PI * u.y;
    Vec3f::new(r * phi.cos(), r * phi.sin(), z)
}

#[inline]
pub fn uniform_sphere_pdf() -> Float {
    1.0 / (4.0 * PI)
}

/// Uniform sample of a triangle's barycentric coordinates `(b0, b1)`, with
/// `b2 = 1 - b0 - b1` implicit. PDF in area measure is `1 / area`.
pub fn uniform_sample_triangle(u: Point2f) -> (Float, Float) {
    let su0 = u.x.sqrt();
    (1.0 - su0, u.y * su0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_hemisphere_sample_is_unit_and_upper() {
        let v = cosine_sample_hemisphere(Point2f::new(0.3, 0.8));
        assert!(v.z >= 0.0);
        assert!((v.x * v.x + v.y * v.y + v.z * v.z - 1.0).abs() < 1e-4);
    }

    #[test]
    fn triangle_barycentrics_sum_to_at_most_one() {
        let (b0, b1) = uniform_sample_triangle(Point2f::new(0.6, 0.2));
        assert!(b0 >= 0.0 && b1 >= 0.0 && b0 + b1 <= 1.0 + 1e-6);
    }

    #[test]
    fn sphere_sample_is_unit_length() {
        let v = uniform_sample_sphere(Point2f::new(0.1, 0.9));
        assert!((v.length() - 1.0).abs() < 1e-4);
    }
}
