//! Run summary: the one-line audit header written into the output, and the
//! analyze-only report (plain text or JSON).

use std::fmt::Write as _;

use serde::Serialize;

use crate::config::RecenterMode;
use crate::models::BoundingBox;
use crate::transform::Translation;

/// Prefix of the audit header line; also used to spot already-processed input.
pub const HEADER_PREFIX: &str = "; skewfix:";

/// `shear_y_ref` recorded in an audit header line, if `line` is one.
pub fn recorded_y_ref(line: &str) -> Option<f64> {
    line.strip_prefix(HEADER_PREFIX)?
        .split_whitespace()
        .find_map(|w| w.strip_prefix("shear_y_ref="))
        .and_then(|v| v.parse().ok())
}

/// Recentering outcome, present only when recentering ran.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecenterSummary {
    pub mode: &'static str,
    pub margin: f64,
    pub translation: Translation,
}

/// Everything worth reporting about one run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// SHA-256 of the input bytes, lowercase hex.
    pub input_sha256: String,
    pub lines: usize,
    pub moves: usize,
    pub arcs_linearized: usize,
    pub arc_segments: usize,
    pub arcs_kept: usize,

    pub skew_deg: f64,
    pub reference_mode: &'static str,
    pub y_ref: f64,

    pub linearize_arcs: bool,
    pub max_chord_mm: f64,
    pub max_angle_deg: f64,

    /// Model-only box before any correction.
    pub model_bounds_original: BoundingBox,
    /// Model-only box after the shear, before translation.
    pub model_bounds: BoundingBox,
    /// Every motion target after the shear, before translation.
    pub all_bounds: BoundingBox,
    pub recenter: Option<RecenterSummary>,

    pub xy_decimals: u32,
    pub other_decimals: u32,
    /// `false` in analyze-only mode.
    pub written: bool,
}

fn range(r: Option<(f64, f64)>) -> String {
    match r {
        Some((lo, hi)) => format!("[{lo:.4},{hi:.4}]"),
        None => "[]".to_string(),
    }
}

impl RecenterSummary {
    pub fn new(mode: RecenterMode, margin: f64, translation: Translation) -> Self {
        RecenterSummary {
            mode: mode.as_str(),
            margin,
            translation,
        }
    }
}

impl Report {
    /// The audit line written at the top of a rewritten file (no terminator).
    pub fn header_line(&self) -> String {
        let mut s = format!(
            "{HEADER_PREFIX} skew_deg={} shear_y_ref_mode={} shear_y_ref={:.4} linearize_arcs={}",
            self.skew_deg, self.reference_mode, self.y_ref, self.linearize_arcs
        );
        if self.linearize_arcs {
            let _ = write!(
                s,
                " max_chord_mm={} max_angle_deg={}",
                self.max_chord_mm, self.max_angle_deg
            );
        }
        match &self.recenter {
            None => s.push_str(" recenter=off"),
            Some(rc) => {
                let _ = write!(
                    s,
                    " recenter={} margin={} model_x={} model_y={} translate=({:.4},{:.4})",
                    rc.mode,
                    rc.margin,
                    range(self.model_bounds.x_range()),
                    range(self.model_bounds.y_range()),
                    rc.translation.dx,
                    rc.translation.dy
                );
            }
        }
        let _ = write!(
            s,
            " xy_decimals={} other_decimals={}",
            self.xy_decimals, self.other_decimals
        );
        s
    }

    /// Human-readable multi-line report.
    pub fn render_text(&self) -> String {
        let mut s = String::new();
        let _ = writeln!(s, "skewfix report");
        let _ = writeln!(s, "  input sha256:        {}", self.input_sha256);
        let _ = writeln!(s, "  lines / moves:       {} / {}", self.lines, self.moves);
        let _ = writeln!(
            s,
            "  arcs:                {} linearized into {} segments, {} kept",
            self.arcs_linearized, self.arc_segments, self.arcs_kept
        );
        let _ = writeln!(s, "  skew:                {}°", self.skew_deg);
        let _ = writeln!(
            s,
            "  reference line:      y = {:.4} ({})",
            self.y_ref, self.reference_mode
        );
        let _ = writeln!(
            s,
            "  model (original):    x {} y {}",
            range(self.model_bounds_original.x_range()),
            range(self.model_bounds_original.y_range())
        );
        let _ = writeln!(
            s,
            "  model (corrected):   x {} y {}",
            range(self.model_bounds.x_range()),
            range(self.model_bounds.y_range())
        );
        let _ = writeln!(
            s,
            "  all moves:           x {} y {}",
            range(self.all_bounds.x_range()),
            range(self.all_bounds.y_range())
        );
        match &self.recenter {
            None => {
                let _ = writeln!(s, "  recenter:            off");
            }
            Some(rc) => {
                let t = rc.translation;
                let moved = self.model_bounds.translated(t.dx, t.dy);
                let _ = writeln!(
                    s,
                    "  recenter:            {} (margin {}) translate ({:.4}, {:.4})",
                    rc.mode, rc.margin, t.dx, t.dy
                );
                let _ = writeln!(
                    s,
                    "  model (placed):      x {} y {}",
                    range(moved.x_range()),
                    range(moved.y_range())
                );
            }
        }
        let _ = writeln!(
            s,
            "  output:              {}",
            if self.written { "rewritten" } else { "not written (analyze only)" }
        );
        s
    }

    pub fn render_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
