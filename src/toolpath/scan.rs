//! Pass 1: classify every line, advance the mode tracker, expand arcs, and
//! record one or more [`ResolvedMove`]s per source line.

use crate::config::ArcsConfig;
use crate::gcode::arcs::{self, ArcCenter, ArcSpec, Rotation};
use crate::gcode::classify::{classify, Command, Instruction, Line};
use crate::gcode::modal::{ModeTracker, Resolved, Step};
use crate::gcode::GcodeError;
use crate::models::{Position, WorkArea};

use super::types::{MoveKind, ResolvedMove};

/// One line of the input, kept for the emit pass.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceLine {
    /// The line exactly as read, without its terminator.
    pub text: String,
    /// Terminator as read; `None` for an unterminated last line.
    pub eol: Option<&'static str>,
    /// Parsed form when the line is a recognized instruction.
    pub instruction: Option<Instruction>,
}

/// Output of pass 1.
#[derive(Debug, Default)]
pub struct Scan {
    pub lines: Vec<SourceLine>,
    /// Arena of resolved records in output order; every source line owns at
    /// least one record.
    pub moves: Vec<ResolvedMove>,
    /// G2/G3 instructions split into chords.
    pub arcs_linearized: usize,
    /// G2/G3 instructions kept as arcs.
    pub arcs_kept: usize,
}

impl Scan {
    /// Total number of chord records generated from arcs.
    pub fn arc_segments(&self) -> usize {
        self.moves
            .iter()
            .filter(|m| matches!(m.kind, MoveKind::ArcSegment { .. }))
            .count()
    }
}

/// Shared fields for every record pushed while scanning.
struct Recorder<'a> {
    area: &'a WorkArea,
    moves: Vec<ResolvedMove>,
}

impl Recorder<'_> {
    fn push(&mut self, line: usize, kind: MoveKind, tracker: &ModeTracker, target: Position, delta: f64) {
        self.moves.push(ResolvedMove {
            line,
            kind,
            target,
            positioning: tracker.positioning(),
            extrusion: tracker.extrusion(),
            extrusion_delta: delta,
            extruding: delta > 0.0,
            in_bed: self.area.contains(target.xy()),
        });
    }
}

/// Runs pass 1 over the whole input text.
pub fn scan(text: &str, arcs_cfg: &ArcsConfig, area: &WorkArea) -> Result<Scan, GcodeError> {
    let mut tracker = ModeTracker::new();
    let mut rec = Recorder {
        area,
        moves: Vec::new(),
    };
    let mut lines = Vec::new();
    let mut arcs_linearized = 0;
    let mut arcs_kept = 0;

    for (idx, (raw, eol)) in split_lines(text).enumerate() {
        let instruction = match classify(idx + 1, raw)? {
            Line::Instruction(i) => Some(i),
            Line::Passthrough => None,
        };

        match &instruction {
            None => rec.push(idx, MoveKind::Passthrough, &tracker, tracker.position(), 0.0),
            Some(instr) => match tracker.advance(instr) {
                Step::ModeChange | Step::PositionReset => {
                    rec.push(idx, MoveKind::Passthrough, &tracker, tracker.position(), 0.0)
                }
                Step::Motion(r) if instr.command.is_arc() && arcs_cfg.linearize => {
                    expand_arc(&mut rec, idx, instr, &r, arcs_cfg, &tracker)?;
                    arcs_linearized += 1;
                }
                Step::Motion(r) => {
                    let kind = if instr.command.is_arc() {
                        arcs_kept += 1;
                        MoveKind::Arc
                    } else {
                        MoveKind::Linear
                    };
                    rec.push(idx, kind, &tracker, r.target, r.extrusion_delta());
                }
            },
        }

        lines.push(SourceLine {
            text: raw.to_string(),
            eol,
            instruction,
        });
    }

    Ok(Scan {
        lines,
        moves: rec.moves,
        arcs_linearized,
        arcs_kept,
    })
}

/// Splits `text` into lines, each with the terminator it ended with.
fn split_lines(text: &str) -> impl Iterator<Item = (&str, Option<&'static str>)> {
    text.split_inclusive('\n').map(|chunk| match chunk.strip_suffix('\n') {
        Some(body) => match body.strip_suffix('\r') {
            Some(body) => (body, Some("\r\n")),
            None => (body, Some("\n")),
        },
        None => (chunk, None),
    })
}

/// Builds the [`ArcSpec`] for a resolved G2/G3.
///
/// `I`/`J` take precedence over `R`. An arc with neither gets a zero centre
/// offset, which the linearizer treats as degenerate.
fn arc_spec(instr: &Instruction, r: &Resolved) -> ArcSpec {
    let center = if instr.has('I') || instr.has('J') {
        ArcCenter::Offset {
            i: instr.get('I').unwrap_or(0.0),
            j: instr.get('J').unwrap_or(0.0),
        }
    } else if let Some(radius) = instr.get('R') {
        ArcCenter::Radius(radius)
    } else {
        ArcCenter::Offset { i: 0.0, j: 0.0 }
    };
    let rotation = if instr.command == Command::ArcCw {
        Rotation::Clockwise
    } else {
        Rotation::CounterClockwise
    };
    ArcSpec {
        start: r.start.xy(),
        end: r.target.xy(),
        center,
        rotation,
    }
}

/// Splits one arc into chord records. Z and E advance in equal shares per
/// chord; the last chord lands exactly on the resolved target.
fn expand_arc(
    rec: &mut Recorder<'_>,
    line: usize,
    instr: &Instruction,
    r: &Resolved,
    arcs_cfg: &ArcsConfig,
    tracker: &ModeTracker,
) -> Result<(), GcodeError> {
    let spec = arc_spec(instr, r);
    let caps = arcs_cfg.caps();
    let segments = arcs::planned_segments(&spec, &caps, arcs_cfg.radius_convention);
    if segments > arcs::MAX_SEGMENTS {
        return Err(GcodeError::ArcTooFine {
            line: line + 1,
            segments,
            limit: arcs::MAX_SEGMENTS,
        });
    }

    let points = arcs::linearize(&spec, &caps, arcs_cfg.radius_convention);
    let count = points.len();
    let share = r.extrusion_delta() / count as f64;
    let last = count - 1;

    for (k, pt) in points.into_iter().enumerate() {
        let target = if k == last {
            r.target
        } else {
            let fraction = (k + 1) as f64 / count as f64;
            Position {
                x: pt.x,
                y: pt.y,
                z: r.start.z + (r.target.z - r.start.z) * fraction,
                e: r.start.e + r.extrusion_delta() * fraction,
            }
        };
        let kind = MoveKind::ArcSegment {
            index: k as u32,
            count: count as u32,
        };
        rec.push(line, kind, tracker, target, share);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gcode::modal::AxisMode;

    fn arcs(linearize: bool, max_chord_mm: f64, max_angle_deg: f64) -> ArcsConfig {
        ArcsConfig {
            linearize,
            max_chord_mm,
            max_angle_deg,
            ..ArcsConfig::default()
        }
    }

    fn run(text: &str) -> Scan {
        scan(text, &arcs(true, 0.2, 5.0), &WorkArea::default()).expect("scan")
    }

    #[test]
    fn every_line_owns_a_record() {
        let s = run("; header\nG90\nM83\n\nG1 X10 Y10 E0.5\nM104 S200\n");
        assert_eq!(s.lines.len(), 6);
        assert_eq!(s.moves.len(), 6);
        for (i, m) in s.moves.iter().enumerate() {
            assert_eq!(m.line, i);
        }
        assert_eq!(s.moves[4].kind, MoveKind::Linear);
        assert_eq!(s.moves[5].kind, MoveKind::Passthrough);
    }

    #[test]
    fn records_carry_mode_registers() {
        let s = run("G91\nM83\nG1 X1 E1\n");
        let m = s.moves[2];
        assert_eq!(m.positioning, AxisMode::Relative);
        assert_eq!(m.extrusion, AxisMode::Relative);
        assert!(m.extruding);
    }

    #[test]
    fn in_bed_uses_original_coordinates() {
        let s = run("G1 X-10 Y0 E1\nG1 X20 Y20 E2\n");
        assert!(!s.moves[0].in_bed);
        assert!(s.moves[1].in_bed);
        assert!(!s.moves[0].is_model());
        assert!(s.moves[1].is_model());
    }

    #[test]
    fn passthrough_record_tracks_current_position() {
        let s = run("G1 X5 Y6\n; note\n");
        assert_eq!(s.moves[1].kind, MoveKind::Passthrough);
        assert_eq!(s.moves[1].target.xy(), s.moves[0].target.xy());
    }

    #[test]
    fn lines_keep_their_own_terminators() {
        let s = run("G90\r\n; note\nG1 X1 Y1");
        let eols: Vec<_> = s.lines.iter().map(|l| l.eol).collect();
        assert_eq!(eols, vec![Some("\r\n"), Some("\n"), None]);
        assert_eq!(s.lines[0].text, "G90");
        assert_eq!(s.lines[2].text, "G1 X1 Y1");
    }

    #[test]
    fn malformed_number_aborts_the_scan() {
        let err = scan("G1 X1\nG1 Y2..5\n", &arcs(true, 0.2, 5.0), &WorkArea::default())
            .unwrap_err();
        assert!(matches!(err, GcodeError::MalformedNumber { line: 2, .. }));
    }

    // ── arcs ─────────────────────────────────────────────────────────────────

    #[test]
    fn semicircle_expands_into_two_chords() {
        let s = scan(
            "G1 X0 Y0\nG2 X10 Y0 I5 J0 E2 F1200\n",
            &arcs(true, 100.0, 90.0),
            &WorkArea::default(),
        )
        .expect("scan");
        assert_eq!(s.arcs_linearized, 1);
        let chords: Vec<_> = s.moves.iter().filter(|m| m.line == 1).collect();
        assert_eq!(chords.len(), 2);
        assert_eq!(chords[0].kind, MoveKind::ArcSegment { index: 0, count: 2 });
        assert_eq!(chords[1].kind, MoveKind::ArcSegment { index: 1, count: 2 });
        assert_eq!(chords[1].target.x, 10.0);
        assert_eq!(chords[1].target.y, 0.0);
        assert_eq!(s.arc_segments(), 2);
    }

    #[test]
    fn arc_extrusion_is_split_evenly() {
        let s = scan(
            "M83\nG1 X0 Y10\nG3 X0 Y-10 I0 J-10 E2\n",
            &arcs(true, 100.0, 45.0),
            &WorkArea {
                x_min: -50.0,
                x_max: 50.0,
                y_min: -50.0,
                y_max: 50.0,
            },
        )
        .expect("scan");
        let chords: Vec<_> = s.moves.iter().filter(|m| m.line == 2).collect();
        assert_eq!(chords.len(), 4);
        for c in &chords {
            assert!((c.extrusion_delta - 0.5).abs() < 1e-12);
            assert!(c.extruding);
        }
        assert_eq!(chords[3].target.e, 2.0);
        assert!((chords[1].target.e - 1.0).abs() < 1e-12);
    }

    #[test]
    fn helical_arc_interpolates_z() {
        let s = scan(
            "G1 X10 Y0 Z0\nG3 X-10 Y0 Z2 I-10 J0\n",
            &arcs(true, 100.0, 90.0),
            &WorkArea::default(),
        )
        .expect("scan");
        let chords: Vec<_> = s.moves.iter().filter(|m| m.line == 1).collect();
        assert_eq!(chords.len(), 2);
        assert!((chords[0].target.z - 1.0).abs() < 1e-12);
        assert_eq!(chords[1].target.z, 2.0);
    }

    #[test]
    fn runaway_arc_is_rejected_with_its_line() {
        let err = scan(
            "G1 X0 Y0\nG2 X0 Y0 I1000000 J0 E1\n",
            &arcs(true, 0.2, 5.0),
            &WorkArea::default(),
        )
        .unwrap_err();
        assert!(matches!(err, GcodeError::ArcTooFine { line: 2, .. }));
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn large_but_plausible_arc_is_expanded() {
        let s = scan(
            "G1 X0 Y0\nG2 X0 Y0 I100 J0\n",
            &arcs(true, 0.2, 5.0),
            &WorkArea::default(),
        )
        .expect("scan");
        assert!(s.arc_segments() > 3000);
        assert!(s.arc_segments() <= arcs::MAX_SEGMENTS);
    }

    #[test]
    fn arcs_are_kept_when_linearization_is_off() {
        let s = scan(
            "G1 X10 Y10\nG2 X20 Y20 I0 J10 E1\n",
            &arcs(false, 0.2, 5.0),
            &WorkArea::default(),
        )
        .expect("scan");
        assert_eq!(s.arcs_kept, 1);
        assert_eq!(s.arcs_linearized, 0);
        assert_eq!(s.moves.len(), 2);
        assert_eq!(s.moves[1].kind, MoveKind::Arc);
        assert_eq!(s.moves[1].target.xy(), crate::models::Point2::new(20.0, 20.0));
    }

    #[test]
    fn mode_switch_line_is_passthrough_with_updated_register() {
        let s = run("G91\n");
        assert_eq!(s.moves[0].kind, MoveKind::Passthrough);
        assert_eq!(s.moves[0].positioning, AxisMode::Relative);
    }
}
