//! Discrete probability distribution built by insertion-then-normalize, used
//! for light-selection and any other finite-alternative importance sampling.

use crate::pbrt::Float;

/// A normalized discrete distribution over `[0, n)`, built once from
/// unnormalized weights.
#[derive(Clone, Debug)]
pub struct Distribution1D {
    /// Cumulative weights, length `n + 1`; `cdf[0] == 0`, `cdf[n] == 1` (or
    /// `0` if every weight was zero — see [`Distribution1D::build`]).
    cdf: Vec<Float>,
    /// Per-entry normalized probability, length `n`.
    pdf: Vec<Float>,
    /// Set when every input weight was zero: `sample` always returns index
    /// `0` and a numeric warning should be logged by the caller (spec §7.5).
    pub degenerate: bool,
}

impl Distribution1D {
    pub fn build(weights: &[Float]) -> Distribution1D {
        let n = weights.len();
        let sum: Float = weights.iter().sum();
        let mut pdf = vec![0.0; n];
        let mut cdf = vec![0.0; n + 1];

        if sum <= 0.0 || n == 0 {
            return Distribution1D {
                cdf,
                pdf,
                degenerate: true,
            };
        }

        let inv_sum = 1.0 / sum;
        let mut running = 0.0;
        for (i, &w) in weights.iter().enumerate() {
            pdf[i] = w * inv_sum;
            running += w;
            cdf[i + 1] = running * inv_sum;
        }
        // Guard against accumulated rounding drift.
        if let Some(last) = cdf.last_mut() {
            *last = 1.0;
        }

        Distribution1D {
            cdf,
            pdf,
            degenerate: false,
        }
    }

    /// Number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.pdf.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pdf.is_empty()
    }

    /// Samples an index in `[0, n)` from `u ∈ [0, 1)`.
    pub fn sample(&self, u: Float) -> usize {
        if self.degenerate || self.pdf.is_empty() {
            return 0;
        }
        match self
            .cdf
            .binary_search_by(|v| v.partial_cmp(&u).unwrap())
        {
            Ok(i) => i.min(self.pdf.len() - 1),
            Err(i) => (i.max(1) - 1).min(self.pdf.len() - 1),
        }
    }

    #[inline]
    pub fn pdf_at(&self, i: usize) -> Float {
        if self.degenerate {
            0.0
        } else {
            self.pdf[i]
        }
    }

    /// Samples an index like [`Distribution1D::sample`], additionally
    /// remapping the residual entropy of `u` within the chosen bucket back
    /// into a fresh `[0, 1)` uniform — lets a single scalar double as both
    /// the discrete selector and (reused) input to a subsequent continuous
    /// warp, instead of spending an extra sampler dimension.
    pub fn sample_reuse(&self, u: Float) -> (usize, Float) {
        let i = self.sample(u);
        if self.degenerate || self.pdf.is_empty() {
            return (i, u);
        }
        let (lo, hi) = (self.cdf[i], self.cdf[i + 1]);
        let remapped = if hi > lo { ((u - lo) / (hi - lo)).clamp(0.0, 1.0) } else { 0.0 };
        (i, remapped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pdf_sums_to_one() {
        let d = Distribution1D::build(&[1.0, 2.0, 3.0, 4.0]);
        let sum: Float = (0..d.len()).map(|i| d.pdf_at(i)).sum();
        assert!((sum - 1.0).abs() < 1e-5);
    }

    #[test]
    fn zero_weights_are_degenerate_and_sample_zero() {
        let d = Distribution1D::build(&[0.0, 0.0, 0.0]);
        assert!(d.degenerate);
        assert_eq!(d.sample(0.7), 0);
    }

    #[test]
    fn sample_reuse_remaps_into_unit_range() {
        let d = Distribution1D::build(&[1.0, 1.0, 1.0, 1.0]);
        for i in 0..100 {
            let u = (i as Float + 0.5) / 100.0;
            let (_, r) = d.sample_reuse(u);
            assert!((0.0..=1.0).contains(&r));
        }
    }

    #[test]
    fn sample_is_weighted_toward_larger_entries() {
        let d = Distribution1D::build(&[1.0, 9.0]);
        let mut count_1 = 0;
        let n = 2000;
        for i in 0..n {
            let u = (i as Float + 0.5) / n as Float;
            if d.sample(u) == 1 {
                count_1 += 1;
            }
        }
        assert!(count_1 as Float / n as Float > 0.8);
    }
}
