//! Plain geometric value types shared by the scan, transform and report stages.

use serde::{Deserialize, Serialize};

/// A point in the horizontal (XY) plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    pub fn new(x: f64, y: f64) -> Self {
        Point2 { x, y }
    }
}

/// Resolved absolute machine position: the three linear axes plus the
/// cumulative extrusion amount.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub e: f64,
}

impl Position {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn xy(&self) -> Point2 {
        Point2::new(self.x, self.y)
    }
}

/// Axis-aligned `{min, max}` extent over the horizontal plane.
///
/// A box starts empty and grows by [`include`](BoundingBox::include). An
/// empty box has no extent and reports `None` from every accessor.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBox {
    extent: Option<Extent>,
}

/// The populated part of a [`BoundingBox`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Extent {
    pub min: Point2,
    pub max: Point2,
}

impl BoundingBox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grows the box so it contains `p`.
    pub fn include(&mut self, p: Point2) {
        self.extent = Some(match self.extent {
            None => Extent { min: p, max: p },
            Some(e) => Extent {
                min: Point2::new(e.min.x.min(p.x), e.min.y.min(p.y)),
                max: Point2::new(e.max.x.max(p.x), e.max.y.max(p.y)),
            },
        });
    }

    pub fn is_empty(&self) -> bool {
        self.extent.is_none()
    }

    pub fn extent(&self) -> Option<Extent> {
        self.extent
    }

    /// `(min, max)` along X.
    pub fn x_range(&self) -> Option<(f64, f64)> {
        self.extent.map(|e| (e.min.x, e.max.x))
    }

    /// `(min, max)` along Y.
    pub fn y_range(&self) -> Option<(f64, f64)> {
        self.extent.map(|e| (e.min.y, e.max.y))
    }

    /// The same box shifted by `(dx, dy)`.
    pub fn translated(&self, dx: f64, dy: f64) -> Self {
        BoundingBox {
            extent: self.extent.map(|e| Extent {
                min: Point2::new(e.min.x + dx, e.min.y + dy),
                max: Point2::new(e.max.x + dx, e.max.y + dy),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_box_is_empty() {
        let b = BoundingBox::new();
        assert!(b.is_empty());
        assert_eq!(b.x_range(), None);
        assert_eq!(b.y_range(), None);
    }

    #[test]
    fn first_point_is_degenerate_box() {
        let mut b = BoundingBox::new();
        b.include(Point2::new(3.0, -4.0));
        assert_eq!(b.x_range(), Some((3.0, 3.0)));
        assert_eq!(b.y_range(), Some((-4.0, -4.0)));
    }

    #[test]
    fn include_grows_in_every_direction() {
        let mut b = BoundingBox::new();
        for (x, y) in [(10.0, 10.0), (-5.0, 20.0), (30.0, -1.0)] {
            b.include(Point2::new(x, y));
        }
        assert_eq!(b.x_range(), Some((-5.0, 30.0)));
        assert_eq!(b.y_range(), Some((-1.0, 20.0)));
    }

    #[test]
    fn translated_shifts_both_corners() {
        let mut b = BoundingBox::new();
        b.include(Point2::new(0.0, 0.0));
        b.include(Point2::new(10.0, 5.0));
        let t = b.translated(1.5, -2.0);
        assert_eq!(t.x_range(), Some((1.5, 11.5)));
        assert_eq!(t.y_range(), Some((-2.0, 3.0)));
        assert!(BoundingBox::new().translated(1.0, 1.0).is_empty());
    }

    #[test]
    fn position_xy_drops_z_and_e() {
        let p = Position {
            x: 1.0,
            y: 2.0,
            z: 3.0,
            e: 4.0,
        };
        assert_eq!(p.xy(), Point2::new(1.0, 2.0));
    }
}
