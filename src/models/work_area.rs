//! The working-area rectangle the corrected geometry must stay inside.

use serde::{Deserialize, Serialize};

use super::geometry::Point2;

fn default_x_max() -> f64 {
    250.0
}

fn default_y_max() -> f64 {
    220.0
}

/// Axis-aligned working-area rectangle (`[work_area]` in the run config).
///
/// Defaults describe a 250 × 220 mm bed with its origin at the front-left
/// corner. Bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct WorkArea {
    #[serde(default)]
    pub x_min: f64,
    #[serde(default = "default_x_max")]
    pub x_max: f64,
    #[serde(default)]
    pub y_min: f64,
    #[serde(default = "default_y_max")]
    pub y_max: f64,
}

impl Default for WorkArea {
    fn default() -> Self {
        WorkArea {
            x_min: 0.0,
            x_max: default_x_max(),
            y_min: 0.0,
            y_max: default_y_max(),
        }
    }
}

impl WorkArea {
    /// Returns `true` when `p` lies inside the rectangle (edges included).
    pub fn contains(&self, p: Point2) -> bool {
        p.x >= self.x_min && p.x <= self.x_max && p.y >= self.y_min && p.y <= self.y_max
    }

    /// Vertical midpoint of the rectangle.
    pub fn y_center(&self) -> f64 {
        (self.y_min + self.y_max) / 2.0
    }

    /// `(min, max)` along `axis` (`'X'` or `'Y'`).
    pub fn range(&self, axis: char) -> (f64, f64) {
        match axis {
            'X' | 'x' => (self.x_min, self.x_max),
            _ => (self.y_min, self.y_max),
        }
    }
}
