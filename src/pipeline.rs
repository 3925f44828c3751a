//! Run driver: SCAN → RESOLVE_REFERENCE → RESOLVE_TRANSLATION → EMIT.
//!
//! Every fatal condition surfaces before emission starts, so a failed run
//! never produces partial output.

use std::path::Path;

use crate::config::{ReferenceLine, SkewFixConfig};
use crate::error::SkewFixError;
use crate::file;
use crate::models::WorkArea;
use crate::report::{recorded_y_ref, RecenterSummary, Report, HEADER_PREFIX};
use crate::toolpath::emit::{emit, EmitOptions};
use crate::toolpath::scan::scan;
use crate::transform::{
    auto_reference, original_model_bounds, resolve_translation, Bounds, Placement, Shear,
    Translation,
};

/// Result of processing text in memory.
#[derive(Debug)]
pub struct Outcome {
    pub report: Report,
    /// Rewritten file contents; `None` in analyze-only mode.
    pub output: Option<String>,
}

/// Line terminator of the input: `\r\n` when the first line ends with it.
pub fn detect_eol(text: &str) -> &'static str {
    match text.find('\n') {
        Some(i) if text[..i].ends_with('\r') => "\r\n",
        _ => "\n",
    }
}

/// Runs every phase over `text`. `input_sha256` is only recorded.
pub fn process(
    text: &str,
    cfg: &SkewFixConfig,
    input_sha256: String,
) -> Result<Outcome, SkewFixError> {
    let params = cfg.skew_parameters()?;

    // The newest header sits above any older ones.
    let previous = text.lines().find(|l| l.starts_with(HEADER_PREFIX));
    if previous.is_some() {
        tracing::warn!("input already carries a skewfix header; correcting again");
    }

    // ── SCAN ─────────────────────────────────────────────────────────────────
    let scanned = scan(text, &cfg.arcs, &cfg.work_area)?;
    tracing::info!(
        lines = scanned.lines.len(),
        moves = scanned.moves.len(),
        arcs_linearized = scanned.arcs_linearized,
        arcs_kept = scanned.arcs_kept,
        "scan complete"
    );
    if scanned.arcs_kept > 0 {
        tracing::warn!(
            count = scanned.arcs_kept,
            "arcs left un-linearized; a sheared circle is an ellipse, so their paths are approximate"
        );
    }

    // ── RESOLVE_REFERENCE ────────────────────────────────────────────────────
    let original = original_model_bounds(&scanned.moves);
    // AUTO on a re-run keeps the recorded line: the earlier shear may have
    // moved model points out of the area and changed the model set.
    let y_ref = match (params.reference, previous.and_then(recorded_y_ref)) {
        (ReferenceLine::Auto, Some(y)) => {
            tracing::info!(y_ref = y, "reusing reference line recorded by the previous run");
            y
        }
        (ReferenceLine::Auto, None) => auto_reference(&original, &cfg.work_area),
        (ReferenceLine::Fixed(y), _) => y,
    };
    let shear = Shear::new(params.angle, y_ref);
    let bounds = Bounds::accumulate(&scanned.moves, &shear);
    tracing::info!(
        y_ref,
        mode = params.reference.mode().as_str(),
        model_x = ?bounds.model.x_range(),
        model_y = ?bounds.model.y_range(),
        "reference line resolved"
    );

    // ── RESOLVE_TRANSLATION ──────────────────────────────────────────────────
    let (translation, recenter) = if cfg.recenter.enabled {
        let t = resolve_translation(&bounds.model, &cfg.recenter, &cfg.work_area)?;
        tracing::info!(dx = t.dx, dy = t.dy, mode = cfg.recenter.mode.as_str(), "translation resolved");
        warn_if_outside(&bounds, t, &cfg.work_area);
        (
            t,
            Some(RecenterSummary::new(cfg.recenter.mode, cfg.recenter.margin, t)),
        )
    } else {
        (Translation::zero(), None)
    };

    let report = Report {
        input_sha256,
        lines: scanned.lines.len(),
        moves: scanned.moves.len(),
        arcs_linearized: scanned.arcs_linearized,
        arc_segments: scanned.arc_segments(),
        arcs_kept: scanned.arcs_kept,
        skew_deg: params.angle_deg,
        reference_mode: params.reference.mode().as_str(),
        y_ref,
        linearize_arcs: cfg.arcs.linearize,
        max_chord_mm: cfg.arcs.max_chord_mm,
        max_angle_deg: cfg.arcs.max_angle_deg,
        model_bounds_original: original,
        model_bounds: bounds.model,
        all_bounds: bounds.all,
        recenter,
        xy_decimals: cfg.output.xy_decimals,
        other_decimals: cfg.output.other_decimals,
        written: !cfg.output.analyze_only,
    };

    if cfg.output.analyze_only {
        return Ok(Outcome {
            report,
            output: None,
        });
    }

    // ── EMIT ─────────────────────────────────────────────────────────────────
    let header = report.header_line();
    let opts = EmitOptions {
        placement: Placement { shear, translation },
        precision: cfg.precision(),
        header: &header,
        eol: detect_eol(text),
    };
    let output = emit(&scanned, &opts);

    Ok(Outcome {
        report,
        output: Some(output),
    })
}

/// Reads `path`, processes it, and replaces it unless analyze-only.
pub fn run(path: &Path, cfg: &SkewFixConfig) -> Result<Report, SkewFixError> {
    let input = file::read_gcode(path)?;
    let sha = file::sha256_hex(&input.bytes);
    tracing::info!(path = %path.display(), bytes = input.bytes.len(), sha256 = %sha, "input loaded");

    let outcome = process(&input.text, cfg, sha)?;

    if let Some(output) = outcome.output {
        file::replace_atomically(path, &output)?;
        tracing::info!(path = %path.display(), bytes = output.len(), "file rewritten");
    } else {
        tracing::info!("analyze only; file left untouched");
    }
    Ok(outcome.report)
}

/// Non-model geometry may still leave the area after translation; it is
/// moved anyway, but worth a warning.
fn warn_if_outside(bounds: &Bounds, t: Translation, area: &WorkArea) {
    let placed = bounds.all.translated(t.dx, t.dy);
    if let Some(e) = placed.extent() {
        if !(area.contains(e.min) && area.contains(e.max)) {
            tracing::warn!(
                x = ?placed.x_range(),
                y = ?placed.y_range(),
                "travel or purge moves extend beyond the working area after translation"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RecenterMode, ReferenceMode};

    fn cfg(angle_deg: f64) -> SkewFixConfig {
        let mut cfg = SkewFixConfig::default();
        cfg.skew.angle_deg = Some(angle_deg);
        cfg
    }

    fn rewrite(text: &str, cfg: &SkewFixConfig) -> String {
        process(text, cfg, String::new())
            .expect("process")
            .output
            .expect("output present")
    }

    #[test]
    fn eol_detection() {
        assert_eq!(detect_eol("G90\r\nG1 X1\r\n"), "\r\n");
        assert_eq!(detect_eol("G90\nG1 X1\r\n"), "\n");
        assert_eq!(detect_eol("G90"), "\n");
        assert_eq!(detect_eol(""), "\n");
    }

    #[test]
    fn missing_angle_fails_before_scanning() {
        let err = process("G1 X1 Y1\n", &SkewFixConfig::default(), String::new()).unwrap_err();
        assert!(matches!(err, SkewFixError::Parameter(_)));
    }

    #[test]
    fn malformed_number_is_a_parameter_error() {
        let err = process("G1 X1.2.3\n", &cfg(0.1), String::new()).unwrap_err();
        assert!(matches!(err, SkewFixError::Parameter(_)));
        assert!(err.to_string().contains("line 1"));
    }

    #[test]
    fn auto_reference_uses_model_moves_only() {
        let text = "G90\nM82\nG1 X-20 Y200 E0.5\nG1 X10 Y10 E1.0\nG1 X20 Y110 E2.0\nG0 X5 Y215\n";
        let out = process(text, &cfg(-0.15), String::new()).expect("process");
        assert_eq!(out.report.y_ref, 60.0);
        assert_eq!(out.report.reference_mode, "auto");
        let first = out.output.expect("output").lines().next().map(str::to_string);
        assert!(first.expect("header").contains("shear_y_ref=60.0000"));
    }

    #[test]
    fn auto_reference_reuses_recorded_header_value() {
        let text = "; skewfix: skew_deg=0.4 shear_y_ref_mode=auto shear_y_ref=123.4560 \
                    linearize_arcs=true recenter=off xy_decimals=3 other_decimals=5\n\
                    G90\nM82\nG1 X10 Y10 E1.0\nG1 X20 Y110 E2.0\n";
        let out = process(text, &cfg(-0.4), String::new()).expect("process");
        assert_eq!(out.report.y_ref, 123.456);
        assert_eq!(out.report.reference_mode, "auto");
    }

    #[test]
    fn fixed_reference_ignores_recorded_header_value() {
        let mut c = cfg(-0.4);
        c.skew.reference = ReferenceMode::Fixed;
        c.skew.reference_y = Some(80.0);
        let text = "; skewfix: skew_deg=0.4 shear_y_ref_mode=auto shear_y_ref=123.4560\nG1 X1 Y1 E1\n";
        let out = process(text, &c, String::new()).expect("process");
        assert_eq!(out.report.y_ref, 80.0);
    }

    #[test]
    fn fixed_reference_is_used_verbatim() {
        let mut c = cfg(-0.15);
        c.skew.reference = ReferenceMode::Fixed;
        c.skew.reference_y = Some(100.0);
        let out = rewrite("G1 X50 Y200 E1\n", &c);
        let lines: Vec<_> = out.lines().collect();
        assert!(lines[0].contains("shear_y_ref_mode=fixed shear_y_ref=100.0000"));
        assert_eq!(lines[1], "G1 X49.738 Y200 E1");
    }

    #[test]
    fn crlf_input_gives_crlf_output() {
        let out = rewrite("G90\r\nG1 X10 Y10 E1\r\n", &cfg(0.0));
        assert!(out.ends_with("G1 X10 Y10 E1\r\n"));
        assert_eq!(out.matches("\r\n").count(), 3);
    }

    #[test]
    fn analyze_only_produces_no_output() {
        let mut c = cfg(0.2);
        c.output.analyze_only = true;
        let out = process("G1 X10 Y10 E1\n", &c, "00".into()).expect("process");
        assert!(out.output.is_none());
        assert!(!out.report.written);
        assert_eq!(out.report.input_sha256, "00");
    }

    #[test]
    fn recenter_fit_error_aborts() {
        let mut c = cfg(0.0);
        c.recenter.enabled = true;
        c.recenter.mode = RecenterMode::Clamp;
        let text = "G1 X0 Y10 E1\nG1 X250 Y10 E2\n";
        c.recenter.margin = 1.0;
        let err = process(text, &c, String::new()).unwrap_err();
        assert!(matches!(err, SkewFixError::GeometryFit { axis: 'X', .. }));
    }

    #[test]
    fn recenter_translation_moves_every_point() {
        let mut c = cfg(0.0);
        c.recenter.enabled = true;
        c.recenter.mode = RecenterMode::Clamp;
        c.recenter.margin = 5.0;
        // Model X spans [2, 100]: the interval is [3, 145], so dx = 3.
        let text = "G0 X-3 Y50\nG1 X2 Y50 E1\nG1 X100 Y60 E2\n";
        let out = process(text, &c, String::new()).expect("process");
        let rc = out.report.recenter.as_ref().expect("recenter summary");
        assert_eq!(rc.translation, Translation { dx: 3.0, dy: 0.0 });
        let lines: Vec<_> = out.output.as_deref().expect("output").lines().collect();
        assert!(lines[0].contains("recenter=clamp"));
        assert!(lines[0].contains("translate=(3.0000,0.0000)"));
        assert_eq!(lines[1], "G0 X0 Y50");
        assert_eq!(lines[2], "G1 X5 Y50 E1");
        assert_eq!(lines[3], "G1 X103 Y60 E2");
    }
}
