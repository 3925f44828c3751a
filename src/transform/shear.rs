//! XY shear about a horizontal reference line.
//!
//! `x' = x + (y − y_ref) · tan θ`, `y' = y`. Nothing but X is ever changed.

use crate::models::{BoundingBox, Point2, WorkArea};

/// Applies `shear` once, for callers that hold no [`Shear`].
pub fn shear(p: Point2, angle: f64, y_ref: f64) -> Point2 {
    Shear::new(angle, y_ref).apply(p)
}

/// A shear with its slope precomputed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shear {
    /// `tan θ`.
    pub tan: f64,
    pub y_ref: f64,
}

impl Shear {
    /// `angle` is in radians.
    pub fn new(angle: f64, y_ref: f64) -> Self {
        Shear {
            tan: angle.tan(),
            y_ref,
        }
    }

    pub fn identity() -> Self {
        Shear { tan: 0.0, y_ref: 0.0 }
    }

    pub fn apply(&self, p: Point2) -> Point2 {
        Point2::new(p.x + (p.y - self.y_ref) * self.tan, p.y)
    }

    /// Shears a displacement vector, such as an arc centre offset. The
    /// reference line cancels out for vectors.
    pub fn apply_offset(&self, i: f64, j: f64) -> (f64, f64) {
        (i + j * self.tan, j)
    }
}

/// Reference line for AUTO mode: the Y midpoint of the model-only box, or
/// the working-area midpoint when no model geometry was found.
pub fn auto_reference(model: &BoundingBox, area: &WorkArea) -> f64 {
    match model.y_range() {
        Some((lo, hi)) => (lo + hi) / 2.0,
        None => {
            tracing::warn!(
                y_ref = area.y_center(),
                "no extruding in-bed moves; AUTO reference falls back to working-area centre"
            );
            area.y_center()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn points_on_the_reference_line_do_not_move() {
        let s = Shear::new(0.5f64.to_radians(), 100.0);
        let p = s.apply(Point2::new(42.0, 100.0));
        assert_eq!(p, Point2::new(42.0, 100.0));
    }

    #[test]
    fn concrete_correction_at_minus_0_15_degrees() {
        let p = shear(Point2::new(50.0, 200.0), (-0.15f64).to_radians(), 100.0);
        assert!((p.x - 49.738).abs() < 5e-4, "x = {}", p.x);
        assert_eq!(p.y, 200.0);
    }

    #[test]
    fn y_is_never_altered() {
        let s = Shear::new(10f64.to_radians(), -30.0);
        for y in [-100.0, 0.0, 0.1, 219.99] {
            assert_eq!(s.apply(Point2::new(5.0, y)).y, y);
        }
    }

    #[test]
    fn negated_angle_undoes_the_shear() {
        let fwd = Shear::new(0.3f64.to_radians(), 60.0);
        let back = Shear::new(-0.3f64.to_radians(), 60.0);
        let p = Point2::new(123.456, 7.89);
        let q = back.apply(fwd.apply(p));
        assert!((q.x - p.x).abs() < EPS);
        assert_eq!(q.y, p.y);
    }

    #[test]
    fn identity_is_a_no_op() {
        let p = Point2::new(-3.0, 17.0);
        assert_eq!(Shear::identity().apply(p), p);
    }

    #[test]
    fn offsets_ignore_the_reference_line() {
        let a = Shear::new(1f64.to_radians(), 0.0);
        let b = Shear::new(1f64.to_radians(), 500.0);
        assert_eq!(a.apply_offset(2.0, 3.0), b.apply_offset(2.0, 3.0));
        let (i, j) = a.apply_offset(0.0, 10.0);
        assert!((i - 10.0 * 1f64.to_radians().tan()).abs() < EPS);
        assert_eq!(j, 10.0);
    }

    #[test]
    fn auto_reference_is_model_y_midpoint() {
        let mut model = BoundingBox::new();
        model.include(Point2::new(10.0, 10.0));
        model.include(Point2::new(20.0, 110.0));
        assert_eq!(auto_reference(&model, &WorkArea::default()), 60.0);
    }

    #[test]
    fn auto_reference_falls_back_to_area_centre() {
        let area = WorkArea {
            y_min: -10.0,
            y_max: 210.0,
            ..WorkArea::default()
        };
        assert_eq!(auto_reference(&BoundingBox::new(), &area), 100.0);
    }
}
