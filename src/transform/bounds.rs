//! Bounds accumulation and the recentering decision.
//!
//! Two boxes are folded over the move arena: every motion target, and only
//! the model targets ([`ResolvedMove::is_model`]). The translation is chosen
//! from the model box alone and later applied to every emitted point.

use crate::config::{RecenterConfig, RecenterMode};
use crate::error::SkewFixError;
use crate::models::{BoundingBox, WorkArea};
use crate::toolpath::types::ResolvedMove;

use super::shear::Shear;
use super::Translation;

/// Both boxes after one fold over the arena.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bounds {
    pub all: BoundingBox,
    pub model: BoundingBox,
}

impl Bounds {
    /// Folds every motion record, sheared by `shear`, into the two boxes.
    pub fn accumulate(moves: &[ResolvedMove], shear: &Shear) -> Bounds {
        moves
            .iter()
            .filter(|m| m.is_motion())
            .fold(Bounds::default(), |mut b, m| {
                let p = shear.apply(m.target.xy());
                b.all.include(p);
                if m.is_model() {
                    b.model.include(p);
                }
                b
            })
    }
}

/// Model-only box in the untransformed coordinates.
pub fn original_model_bounds(moves: &[ResolvedMove]) -> BoundingBox {
    Bounds::accumulate(moves, &Shear::identity()).model
}

/// Chooses the single translation that keeps `model` inside `area` shrunk
/// by the configured margin.
///
/// An empty model box yields `(0, 0)`.
pub fn resolve_translation(
    model: &BoundingBox,
    rc: &RecenterConfig,
    area: &WorkArea,
) -> Result<Translation, SkewFixError> {
    let (Some(xr), Some(yr)) = (model.x_range(), model.y_range()) else {
        tracing::warn!("model-only bounds are empty; recentering leaves the toolpath in place");
        return Ok(Translation::zero());
    };
    Ok(Translation {
        dx: pick_axis('X', xr, area.range('X'), rc)?,
        dy: pick_axis('Y', yr, area.range('Y'), rc)?,
    })
}

/// Feasible interval of shifts on one axis.
fn feasible_interval(model: (f64, f64), area: (f64, f64), margin: f64) -> (f64, f64) {
    (area.0 + margin - model.0, area.1 - margin - model.1)
}

fn pick_axis(
    axis: char,
    model: (f64, f64),
    area: (f64, f64),
    rc: &RecenterConfig,
) -> Result<f64, SkewFixError> {
    let (lower, upper) = feasible_interval(model, area, rc.margin);

    if lower > upper {
        if lower - upper > rc.epsilon {
            return Err(SkewFixError::GeometryFit {
                axis,
                lower,
                upper,
                tolerance: rc.epsilon,
            });
        }
        tracing::debug!(%axis, lower, upper, "interval empty within tolerance; using midpoint");
        return Ok((lower + upper) / 2.0);
    }

    Ok(match rc.mode {
        RecenterMode::Center => (lower + upper) / 2.0,
        RecenterMode::Clamp => 0.0f64.clamp(lower, upper),
    })
}
