//! Per-thread raster accumulation and the numeric-warning counters (spec
//! §5, §7.5).

use std::sync::atomic::{AtomicU64, Ordering};

use crate::pbrt::Float;
use crate::vec::{Point2f, Vec3f};

/// A width×height RGB accumulation buffer. Each render thread owns a
/// private `Film` and splats into it lock-free; films are merged with a
/// single-writer reduction at block boundaries (spec §5) rather than using
/// atomics in the hot path.
#[derive(Clone, Debug)]
pub struct Film {
    pub width: u32,
    pub height: u32,
    sum: Vec<Vec3f>,
    weight: Vec<Float>,
}

impl Film {
    pub fn new(width: u32, height: u32) -> Self {
        let n = (width as usize) * (height as usize);
        Self {
            width,
            height,
            sum: vec![Vec3f::splat(0.0); n],
            weight: vec![0.0; n],
        }
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Splat a weighted BPT contribution at a raster-fraction position
    /// `(u, v) ∈ [0,1)²` (spec §4.5.4). Out-of-bounds raster positions are
    /// dropped silently, matching the "if out of [0,1]² drop the sample"
    /// rule in §4.5.2.
    pub fn add_sample(&mut self, raster: Point2f, value: Vec3f) {
        if !(0.0..1.0).contains(&raster.x) || !(0.0..1.0).contains(&raster.y) {
            return;
        }
        let x = (raster.x * self.width as Float) as u32;
        let y = (raster.y * self.height as Float) as u32;
        let i = self.index(x.min(self.width - 1), y.min(self.height - 1));
        self.sum[i] += value;
        self.weight[i] += 1.0;
    }

    /// Splats a reconstruction-filter-weighted contribution directly onto
    /// pixel `(x, y)`, for callers (the `filters` crate) that have already
    /// distributed one sample across every pixel within a filter's support.
    /// Out-of-range `(x, y)` is a caller bug, not a silently-dropped sample
    /// (unlike `add_sample`'s raster-fraction range check), so this asserts.
    pub fn add_weighted(&mut self, x: u32, y: u32, value: Vec3f, weight: Float) {
        let i = self.index(x, y);
        self.sum[i] += value * weight;
        self.weight[i] += weight;
    }

    /// Folds `other`'s accumulated sums and weights into `self`, pixel by
    /// pixel. Both films must share dimensions.
    pub fn merge(&mut self, other: &Film) {
        debug_assert_eq!(self.width, other.width);
        debug_assert_eq!(self.height, other.height);
        for i in 0..self.sum.len() {
            self.sum[i] += other.sum[i];
            self.weight[i] += other.weight[i];
        }
    }

    /// Resolves the accumulated samples into a flat row-major RGB buffer,
    /// each pixel averaged by its own sample weight (zero-weight pixels
    /// stay black rather than dividing by zero).
    pub fn to_rgb(&self) -> Vec<Vec3f> {
        self.sum
            .iter()
            .zip(&self.weight)
            .map(|(&s, &w)| if w > 0.0 { s / w } else { Vec3f::splat(0.0) })
            .collect()
    }
}

/// Per-kind counters for category-5 numeric warnings (spec §7.5): logged,
/// the offending sample is discarded, and rendering continues. Counters are
/// shared read-only handles (`Arc<WarningCounters>`) across render threads.
#[derive(Default, Debug)]
pub struct WarningCounters {
    pub zero_sum_cdf: AtomicU64,
    pub degenerate_triangle: AtomicU64,
    pub zero_pdf_mis: AtomicU64,
}

impl WarningCounters {
    /// Logs only on the first occurrence of each kind; every occurrence
    /// (first or not) still increments the counter, so a pathological scene
    /// cannot flood the log but `total()`/[`WarningCounters::report`] still
    /// reflect the true count (spec §4.6).
    pub fn record_zero_sum_cdf(&self) {
        if self.zero_sum_cdf.fetch_add(1, Ordering::Relaxed) == 0 {
            log::warn!("zero-sum CDF encountered; sampling fixed index 0 (further occurrences suppressed)");
        }
    }

    pub fn record_degenerate_triangle(&self) {
        if self.degenerate_triangle.fetch_add(1, Ordering::Relaxed) == 0 {
            log::warn!("degenerate triangle encountered during build (further occurrences suppressed)");
        }
    }

    pub fn record_zero_pdf_mis(&self) {
        if self.zero_pdf_mis.fetch_add(1, Ordering::Relaxed) == 0 {
            log::warn!("zero-PDF evaluation during MIS; sample dropped (further occurrences suppressed)");
        }
    }

    pub fn total(&self) -> u64 {
        self.zero_sum_cdf.load(Ordering::Relaxed)
            + self.degenerate_triangle.load(Ordering::Relaxed)
            + self.zero_pdf_mis.load(Ordering::Relaxed)
    }

    /// Emits a single end-of-render summary line (spec §4.6); a no-op when
    /// nothing was ever recorded.
    pub fn report(&self) {
        let total = self.total();
        if total == 0 {
            return;
        }
        log::warn!(
            "{total} numeric warning(s) during render: {} zero-sum CDF, {} degenerate triangle, {} zero-PDF MIS",
            self.zero_sum_cdf.load(Ordering::Relaxed),
            self.degenerate_triangle.load(Ordering::Relaxed),
            self.zero_pdf_mis.load(Ordering::Relaxed),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merged_film_sums_both_contributors() {
        let mut a = Film::new(2, 2);
        let mut b = Film::new(2, 2);
        a.add_sample(Point2f::new(0.1, 0.1), Vec3f::splat(1.0));
        b.add_sample(Point2f::new(0.1, 0.1), Vec3f::splat(3.0));
        a.merge(&b);
        let rgb = a.to_rgb();
        assert!((rgb[0].x - 2.0).abs() < 1e-5);
    }

    #[test]
    fn out_of_bounds_raster_is_dropped() {
        let mut f = Film::new(2, 2);
        f.add_sample(Point2f::new(1.5, 0.5), Vec3f::splat(1.0));
        assert!(f.to_rgb().iter().all(|&c| c.x == 0.0));
    }

    #[test]
    fn warning_counters_accumulate() {
        let counters = WarningCounters::default();
        counters.record_zero_sum_cdf();
        counters.record_zero_pdf_mis();
        assert_eq!(counters.total(), 2);
    }

    #[test]
    fn repeated_warnings_of_the_same_kind_still_all_count() {
        let counters = WarningCounters::default();
        for _ in 0..5 {
            counters.record_degenerate_triangle();
        }
        assert_eq!(counters.degenerate_triangle.load(Ordering::Relaxed), 5);
        assert_eq!(counters.total(), 5);
    }

    #[test]
    fn report_is_a_no_op_when_nothing_was_recorded() {
        let counters = WarningCounters::default();
        counters.report();
        assert_eq!(counters.total(), 0);
    }
}
