//! Pixel reconstruction filters (`film.filter.type`): each filter answers
//! "how much weight does a sample at offset `p` from a pixel center
//! contribute to that pixel", with a `splat` helper that distributes one
//! sample across every pixel within the filter's support.

use core::film::Film;
use core::pbrt::Float;
use core::vec::{Point2f, Vec2f, Vec3f};

/// A pixel reconstruction filter centered at the origin: `radius` bounds its
/// support in pixel units, `evaluate` gives its (unnormalized) weight at an
/// offset within that support.
pub trait PixelFilter {
    fn radius(&self) -> Vec2f;
    fn evaluate(&self, p: Point2f) -> Float;
}

/// A flat box filter: every offset within `radius` gets weight 1.
#[derive(Copy, Clone, Debug)]
pub struct BoxFilter {
    pub radius: Vec2f,
}

impl PixelFilter for BoxFilter {
    fn radius(&self) -> Vec2f {
        self.radius
    }

    fn evaluate(&self, _p: Point2f) -> Float {
        1.0
    }
}

/// A Gaussian bump centered at the pixel, clamped to zero at `radius` so the
/// filter has finite support: subtracting the value at the radius avoids a
/// discontinuity at the support boundary.
#[derive(Copy, Clone, Debug)]
pub struct GaussianFilter {
    pub radius: Vec2f,
    pub alpha: Float,
    exp_x: Float,
    exp_y: Float,
}

impl GaussianFilter {
    pub fn new(radius: Vec2f, alpha: Float) -> Self {
        Self {
            radius,
            alpha,
            exp_x: (-alpha * radius.x * radius.x).exp(),
            exp_y: (-alpha * radius.y * radius.y).exp(),
        }
    }

    fn gaussian(&self, d: Float, expv: Float) -> Float {
        ((-self.alpha * d * d).exp() - expv).max(0.0)
    }
}

impl PixelFilter for GaussianFilter {
    fn radius(&self) -> Vec2f {
        self.radius
    }

    fn evaluate(&self, p: Point2f) -> Float {
        self.gaussian(p.x, self.exp_x) * self.gaussian(p.y, self.exp_y)
    }
}

/// Distributes one sample of `value` sampled at continuous raster position
/// `raster_px` (in pixel units, i.e. already multiplied by film width/height,
/// unlike `Film::add_sample`'s `[0,1)²` fraction) across every pixel whose
/// center lies within `filter`'s support, weighting each by `filter`'s
/// response at that offset.
pub fn splat(film: &mut Film, raster_px: Point2f, value: Vec3f, filter: &dyn PixelFilter) {
    let r = filter.radius();
    let x_lo = (raster_px.x - r.x).floor().max(0.0) as i64;
    let x_hi = (raster_px.x + r.x).ceil().min(film.width as Float) as i64;
    let y_lo = (raster_px.y - r.y).floor().max(0.0) as i64;
    let y_hi = (raster_px.y + r.y).ceil().min(film.height as Float) as i64;

    for y in y_lo..y_hi {
        for x in x_lo..x_hi {
            let center = Point2f::new(x as Float + 0.5, y as Float + 0.5);
            let offset = Point2f::new(raster_px.x - center.x, raster_px.y - center.y);
            if offset.x.abs() > r.x || offset.y.abs() > r.y {
                continue;
            }
            let w = filter.evaluate(offset);
            if w <= 0.0 {
                continue;
            }
            film.add_weighted(x as u32, y as u32, value, w);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn box_filter_weight_is_uniform() {
        let f = BoxFilter { radius: Vec2f::new(0.5, 0.5) };
        assert_eq!(f.evaluate(Point2f::new(0.0, 0.0)), 1.0);
        assert_eq!(f.evaluate(Point2f::new(0.4, -0.3)), 1.0);
    }

    #[test]
    fn gaussian_filter_peaks_at_the_center() {
        let f = GaussianFilter::new(Vec2f::new(2.0, 2.0), 2.0);
        let center = f.evaluate(Point2f::new(0.0, 0.0));
        let off = f.evaluate(Point2f::new(1.0, 1.0));
        assert!(center > off);
        assert!(off >= 0.0);
    }

    #[test]
    fn gaussian_filter_vanishes_at_its_radius() {
        let f = GaussianFilter::new(Vec2f::new(2.0, 2.0), 2.0);
        assert!(f.evaluate(Point2f::new(2.0, 0.0)).abs() < 1e-6);
    }

    #[test]
    fn box_splat_lands_in_a_single_pixel_at_the_center() {
        let mut film = Film::new(4, 4);
        let filter = BoxFilter { radius: Vec2f::new(0.5, 0.5) };
        splat(&mut film, Point2f::new(1.5, 1.5), Vec3f::splat(2.0), &filter);
        let rgb = film.to_rgb();
        assert!((rgb[1 * 4 + 1].x - 2.0).abs() < 1e-5);
        assert!(rgb.iter().enumerate().filter(|&(i, _)| i != 5).all(|(_, &c)| c.x == 0.0));
    }

    #[test]
    fn gaussian_splat_spreads_weight_over_several_pixels() {
        let mut film = Film::new(8, 8);
        let filter = GaussianFilter::new(Vec2f::new(2.0, 2.0), 2.0);
        splat(&mut film, Point2f::new(4.0, 4.0), Vec3f::splat(1.0), &filter);
        let rgb = film.to_rgb();
        let lit = rgb.iter().filter(|&&c| c.x > 0.0).count();
        assert!(lit > 1);
    }
}
