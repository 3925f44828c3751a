//! Geometric correction applied in the emit pass: shear, then translation.

pub mod bounds;
pub mod shear;

use serde::Serialize;

use crate::models::Point2;

pub use bounds::{original_model_bounds, resolve_translation, Bounds};
pub use shear::{auto_reference, shear, Shear};

/// Global `(Δx, Δy)` applied to every emitted point.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Translation {
    pub dx: f64,
    pub dy: f64,
}

impl Translation {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn is_zero(&self) -> bool {
        self.dx == 0.0 && self.dy == 0.0
    }
}

/// Shear and translation together: the full original-to-output mapping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub shear: Shear,
    pub translation: Translation,
}

impl Placement {
    pub fn apply(&self, p: Point2) -> Point2 {
        let s = self.shear.apply(p);
        Point2::new(s.x + self.translation.dx, s.y + self.translation.dy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translation_follows_shear() {
        let placement = Placement {
            shear: Shear { tan: 0.01, y_ref: 100.0 },
            translation: Translation { dx: 2.0, dy: -3.0 },
        };
        let p = placement.apply(Point2::new(50.0, 200.0));
        assert!((p.x - 53.0).abs() < 1e-12);
        assert_eq!(p.y, 197.0);
    }

    #[test]
    fn zero_translation() {
        assert!(Translation::zero().is_zero());
        assert!(!Translation { dx: 0.0, dy: 0.1 }.is_zero());
    }
}
