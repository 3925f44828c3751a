//! Arc linearizer: converts a G2/G3 arc into straight chords.
//!
//! [`linearize`] is a pure function of an [`ArcSpec`] and [`ArcCaps`]; it has
//! no notion of skew, so arc fidelity can be checked on its own.

use std::f64::consts::{PI, TAU};

use serde::{Deserialize, Serialize};

use crate::models::Point2;

/// Below this radius or sweep an arc is treated as degenerate.
const DEGENERATE_EPSILON: f64 = 1e-9;

/// Slack applied before rounding segment counts up, so a sweep that is an
/// exact multiple of the step does not gain a segment from rounding noise.
const COUNT_EPSILON: f64 = 1e-9;

/// Most chords a single arc may expand into. A full circle of radius 3 m at a
/// 0.2 mm chord stays below it; a mistyped centre offset does not.
pub const MAX_SEGMENTS: usize = 100_000;

/// Direction of travel around the arc centre.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    Clockwise,
    CounterClockwise,
}

/// How the arc's circle is specified.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ArcCenter {
    /// `I`/`J`: centre offset from the start point.
    Offset { i: f64, j: f64 },
    /// `R`: radius. The sign is interpreted per [`RadiusConvention`].
    Radius(f64),
}

/// Which of the two candidate circles a radius-form arc uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RadiusConvention {
    /// Positive `R` selects the minor arc, negative `R` the major arc.
    #[default]
    Signed,
    /// Always the minor arc, whatever the sign of `R`.
    Shorter,
}

/// Resolved arc endpoints plus circle and direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcSpec {
    pub start: Point2,
    pub end: Point2,
    pub center: ArcCenter,
    pub rotation: Rotation,
}

/// Limits on each generated chord.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcCaps {
    /// Longest allowed chord, in mm.
    pub max_chord: f64,
    /// Largest allowed angular step, in radians.
    pub max_angle: f64,
}

/// Circle parameters of a non-degenerate arc.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcGeometry {
    pub center: Point2,
    pub radius: f64,
    /// Angle of the start point around the centre, in radians.
    pub start_angle: f64,
    /// Unsigned angle travelled, in `(0, 2π]`.
    pub sweep: f64,
    pub rotation: Rotation,
}

/// Computes the sweep angle (in radians) traversed by an arc from `start` to
/// `end` around `center`, in the specified direction.
///
/// Returns a value in the range `(0, 2π]`. A result of `2π` indicates a
/// full circle (start and end coincide angularly around the center).
pub fn arc_sweep(start: Point2, center: Point2, end: Point2, rotation: Rotation) -> f64 {
    let angle_start = (start.y - center.y).atan2(start.x - center.x);
    let angle_end = (end.y - center.y).atan2(end.x - center.x);

    let diff = match rotation {
        Rotation::Clockwise => angle_start - angle_end,
        Rotation::CounterClockwise => angle_end - angle_start,
    };

    let sweep = diff.rem_euclid(TAU);

    // rem_euclid returns 0.0 when start and end angles are equal (full circle).
    if sweep == 0.0 {
        TAU
    } else {
        sweep
    }
}

/// Centre of a radius-form arc, or `None` when start and end coincide.
///
/// A radius shorter than half the chord is raised to half the chord, which
/// puts the centre on the chord midpoint.
fn radius_center(
    start: Point2,
    end: Point2,
    r: f64,
    rotation: Rotation,
    convention: RadiusConvention,
) -> Option<Point2> {
    let dx = end.x - start.x;
    let dy = end.y - start.y;
    let chord = dx.hypot(dy);
    if chord < DEGENERATE_EPSILON {
        return None;
    }

    let half = chord / 2.0;
    let radius = r.abs().max(half);
    let h = (radius * radius - half * half).max(0.0).sqrt();

    let major = convention == RadiusConvention::Signed && r < 0.0;
    // Minor counter-clockwise arcs (and major clockwise ones) turn around a
    // centre on the left of the chord direction.
    let left = (rotation == Rotation::CounterClockwise) != major;
    let side = if left { 1.0 } else { -1.0 };

    let mid = Point2::new(start.x + dx / 2.0, start.y + dy / 2.0);
    Some(Point2::new(
        mid.x - side * h * dy / chord,
        mid.y + side * h * dx / chord,
    ))
}

/// Resolves the circle an arc runs on. Returns `None` for degenerate arcs
/// (zero radius, zero sweep, or a radius-form arc whose endpoints coincide).
pub fn resolve_geometry(spec: &ArcSpec, convention: RadiusConvention) -> Option<ArcGeometry> {
    let center = match spec.center {
        ArcCenter::Offset { i, j } => Point2::new(spec.start.x + i, spec.start.y + j),
        ArcCenter::Radius(r) => radius_center(spec.start, spec.end, r, spec.rotation, convention)?,
    };

    let radius = (spec.start.x - center.x).hypot(spec.start.y - center.y);
    if radius < DEGENERATE_EPSILON {
        return None;
    }

    let sweep = arc_sweep(spec.start, center, spec.end, spec.rotation);
    if sweep < DEGENERATE_EPSILON {
        return None;
    }

    Some(ArcGeometry {
        center,
        radius,
        start_angle: (spec.start.y - center.y).atan2(spec.start.x - center.x),
        sweep,
        rotation: spec.rotation,
    })
}

/// Smallest segment count whose equal angular steps respect both caps.
pub fn segment_count(sweep: f64, radius: f64, caps: &ArcCaps) -> usize {
    let by_angle = (sweep / caps.max_angle - COUNT_EPSILON).ceil();

    // Chord of step φ on radius r is 2·r·sin(φ/2).
    let ratio = caps.max_chord / (2.0 * radius);
    let chord_step = if ratio >= 1.0 { PI } else { 2.0 * ratio.asin() };
    let by_chord = (sweep / chord_step - COUNT_EPSILON).ceil();

    by_angle.max(by_chord).max(1.0) as usize
}

/// Number of chords [`linearize`] will produce for `spec`.
pub fn planned_segments(spec: &ArcSpec, caps: &ArcCaps, convention: RadiusConvention) -> usize {
    match resolve_geometry(spec, convention) {
        Some(geo) => segment_count(geo.sweep, geo.radius, caps),
        None => 1,
    }
}

/// Converts an arc into the ordered end points of its chords.
///
/// The last point is always `spec.end` exactly. A degenerate arc yields the
/// single point `spec.end`.
pub fn linearize(spec: &ArcSpec, caps: &ArcCaps, convention: RadiusConvention) -> Vec<Point2> {
    let Some(geo) = resolve_geometry(spec, convention) else {
        return vec![spec.end];
    };

    let count = segment_count(geo.sweep, geo.radius, caps);
    let direction = match geo.rotation {
        Rotation::Clockwise => -1.0,
        Rotation::CounterClockwise => 1.0,
    };
    let step = direction * geo.sweep / count as f64;

    let mut points: Vec<Point2> = (1..count)
        .map(|k| {
            let angle = geo.start_angle + step * k as f64;
            Point2::new(
                geo.center.x + geo.radius * angle.cos(),
                geo.center.y + geo.radius * angle.sin(),
            )
        })
        .collect();
    points.push(spec.end);
    points
}
