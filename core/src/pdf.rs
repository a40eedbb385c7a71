//! Probability density values that carry the measure they were evaluated in.
//!
//! Spec §3 / §9: "Every PDF carries its measure... mixing measures is a
//! programmer error; conversions... are explicit." `PdfEval` enforces this in
//! the type system — there is deliberately no `Add`/`PartialOrd` impl that
//! would let two differently-measured values be compared silently.

use crate::pbrt::Float;

/// The measure a probability density is defined with respect to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Measure {
    SolidAngle,
    ProjectedSolidAngle,
    Area,
    Discrete,
}

/// A PDF evaluation, tagged with its measure.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PdfEval {
    pub v: Float,
    pub measure: Measure,
}

impl PdfEval {
    #[inline]
    pub fn new(v: Float, measure: Measure) -> Self {
        Self { v, measure }
    }

    #[inline]
    pub fn zero(measure: Measure) -> Self {
        Self { v: 0.0, measure }
    }

    #[inline]
    pub fn is_zero(self) -> bool {
        self.v == 0.0
    }

    /// Asserts both operands share the same measure before dividing; this is
    /// the only legal way to combine two `PdfEval`s directly (used by the
    /// MIS ratio recurrence once both sides have been brought to area
    /// measure by [`convert_to_area`]).
    #[inline]
    pub fn ratio(self, other: PdfEval) -> Float {
        debug_assert_eq!(
            self.measure, other.measure,
            "PdfEval::ratio requires matching measures"
        );
        if other.v == 0.0 {
            0.0
        } else {
            self.v / other.v
        }
    }
}

/// Convert a solid-angle (or projected-solid-angle) PDF at a vertex to the
/// area measure at the vertex it points towards, using the generalized
/// geometry factor `G = |cos θ| / d²`.
///
/// * `pdf_dir`   - Directional PDF, measure `SolidAngle`.
/// * `cos_theta` - Absolute cosine between the connecting direction and the
///                 *receiving* vertex's (shading) normal.
/// * `dist_sq`   - Squared distance between the two vertices.
#[inline]
pub fn convert_to_area(pdf_dir: PdfEval, cos_theta: Float, dist_sq: Float) -> PdfEval {
    debug_assert_eq!(pdf_dir.measure, Measure::SolidAngle);
    if dist_sq <= 0.0 {
        return PdfEval::zero(Measure::Area);
    }
    PdfEval::new(pdf_dir.v * cos_theta.abs() / dist_sq, Measure::Area)
}

/// Convert a solid-angle PDF to the projected-solid-angle measure by
/// dividing by `|cos θ|` at the emitting vertex.
#[inline]
pub fn convert_to_projected_solid_angle(pdf_dir: PdfEval, cos_theta: Float) -> PdfEval {
    debug_assert_eq!(pdf_dir.measure, Measure::SolidAngle);
    let c = cos_theta.abs();
    if c <= 0.0 {
        return PdfEval::zero(Measure::ProjectedSolidAngle);
    }
    PdfEval::new(pdf_dir.v / c, Measure::ProjectedSolidAngle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn area_conversion_scales_by_geometry_term() {
        let pdf = PdfEval::new(1.0 / std::f32::consts::PI, Measure::SolidAngle);
        let area = convert_to_area(pdf, 0.5, 4.0);
        assert_eq!(area.measure, Measure::Area);
        assert!((area.v - pdf.v * 0.5 / 4.0).abs() < 1e-6);
    }

    #[test]
    #[should_panic]
    fn ratio_panics_on_measure_mismatch_in_debug() {
        let a = PdfEval::new(1.0, Measure::Area);
        let b = PdfEval::new(1.0, Measure::SolidAngle);
        let _ = a.ratio(b);
    }
}
