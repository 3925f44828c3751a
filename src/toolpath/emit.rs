//! Pass 2: walk the move arena and render the corrected program.

use crate::gcode::block::Block;
use crate::gcode::classify::Instruction;
use crate::gcode::formatter::{round_to, Precision};
use crate::gcode::modal::AxisMode;
use crate::models::{Point2, Position};
use crate::transform::Placement;

use super::scan::Scan;
use super::types::{MoveKind, ResolvedMove};

/// Everything the emitter needs besides the scan itself.
#[derive(Debug, Clone, Copy)]
pub struct EmitOptions<'a> {
    pub placement: Placement,
    pub precision: Precision,
    /// Audit line written first, without terminator.
    pub header: &'a str,
    /// Terminator for the header and for an unterminated last line.
    pub eol: &'a str,
}

/// Renders the whole output file. Every line, including the last, is
/// terminated: by its source line's own terminator, or by `opts.eol` for the
/// header and an unterminated last line.
pub fn emit(scan: &Scan, opts: &EmitOptions<'_>) -> String {
    let mut out = String::with_capacity(scan.lines.iter().map(|l| l.text.len() + 2).sum());
    let mut writer = Writer {
        opts,
        out: &mut out,
        eol: opts.eol,
        prev: Position::zero(),
    };
    writer.line(opts.header);

    let mut rest = scan.moves.as_slice();
    while let Some(first) = rest.first() {
        let len = rest.iter().take_while(|m| m.line == first.line).count();
        let (group, tail) = rest.split_at(len);
        let source = &scan.lines[first.line];
        writer.eol = source.eol.unwrap_or(opts.eol);

        match (first.kind, source.instruction.as_ref()) {
            (MoveKind::Linear, Some(instr)) => writer.linear(first, instr, &source.text),
            (MoveKind::Arc, Some(instr)) => writer.kept_arc(first, instr),
            (MoveKind::ArcSegment { .. }, Some(instr)) => writer.arc_segments(group, instr),
            _ => writer.line(&source.text),
        }
        if let Some(last) = group.last() {
            writer.prev = last.target;
        }
        rest = tail;
    }

    out
}

struct Writer<'a, 'o> {
    opts: &'a EmitOptions<'a>,
    out: &'o mut String,
    /// Terminator for the lines of the current source line.
    eol: &'a str,
    /// Untransformed target of the previous record.
    prev: Position,
}

impl Writer<'_, '_> {
    fn line(&mut self, text: &str) {
        self.out.push_str(text);
        self.out.push_str(self.eol);
    }

    /// X/Y to write for a record: absolute output position, or the output
    /// delta from the previous record in relative positioning. Deltas are
    /// taken between rounded absolute positions so rounding never accumulates.
    fn xy_words(&self, m: &ResolvedMove, from: Position) -> Point2 {
        let placement = &self.opts.placement;
        let to = placement.apply(m.target.xy());
        match m.positioning {
            AxisMode::Absolute => to,
            AxisMode::Relative => {
                let origin = placement.apply(from.xy());
                let d = self.opts.precision.xy_decimals;
                Point2::new(
                    round_to(to.x, d) - round_to(origin.x, d),
                    round_to(to.y, d) - round_to(origin.y, d),
                )
            }
        }
    }

    fn linear(&mut self, m: &ResolvedMove, instr: &Instruction, text: &str) {
        if !(instr.has('X') || instr.has('Y')) {
            self.line(text);
            return;
        }
        let xy = self.xy_words(m, self.prev);
        let mut block = Block::with_words(&instr.code, &instr.words)
            .line_number(instr.line_number.as_deref())
            .comment(instr.comment.as_deref());
        block.set('X', xy.x);
        block.set('Y', xy.y);
        let rendered = block.render(&self.opts.precision);
        self.line(&rendered);
    }

    /// G2/G3 left as an arc: end point like a linear move, I/J sheared as a
    /// vector, R untouched.
    fn kept_arc(&mut self, m: &ResolvedMove, instr: &Instruction) {
        let mut block = Block::with_words(&instr.code, &instr.words)
            .line_number(instr.line_number.as_deref())
            .comment(instr.comment.as_deref());
        if instr.has('X') || instr.has('Y') {
            let xy = self.xy_words(m, self.prev);
            block.set('X', xy.x);
            block.set('Y', xy.y);
        }
        if instr.has('I') || instr.has('J') {
            let (i, j) = self.opts.placement.shear.apply_offset(
                instr.get('I').unwrap_or(0.0),
                instr.get('J').unwrap_or(0.0),
            );
            block.set('I', i);
            block.set('J', j);
        }
        let rendered = block.render(&self.opts.precision);
        self.line(&rendered);
    }

    /// One `G1` per chord. F and the comment ride on the first chord only.
    fn arc_segments(&mut self, group: &[ResolvedMove], instr: &Instruction) {
        let mut from = self.prev;
        for (k, m) in group.iter().enumerate() {
            let first = k == 0;
            let mut block = Block::new("G1");
            if first {
                block = block
                    .line_number(instr.line_number.as_deref())
                    .comment(instr.comment.as_deref());
            }

            let xy = self.xy_words(m, from);
            block.set('X', xy.x);
            block.set('Y', xy.y);
            if instr.has('Z') {
                let z = match m.positioning {
                    AxisMode::Absolute => m.target.z,
                    AxisMode::Relative => m.target.z - from.z,
                };
                block.set('Z', z);
            }
            if instr.has('E') {
                let e = match m.extrusion {
                    AxisMode::Absolute => m.target.e,
                    AxisMode::Relative => m.extrusion_delta,
                };
                block.set('E', e);
            }
            if first {
                if let Some(f) = instr.get('F') {
                    block.set('F', f);
                }
            }

            let rendered = block.render(&self.opts.precision);
            self.line(&rendered);
            from = m.target;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ArcsConfig;
    use crate::models::WorkArea;
    use crate::toolpath::scan::scan;
    use crate::transform::{Shear, Translation};

    const HEADER: &str = "; test header";

    fn render(text: &str, arcs: &ArcsConfig, shear: Shear, translation: Translation) -> Vec<String> {
        let s = scan(text, arcs, &WorkArea::default()).expect("scan");
        let opts = EmitOptions {
            placement: Placement { shear, translation },
            precision: Precision::default(),
            header: HEADER,
            eol: "\n",
        };
        emit(&s, &opts).lines().map(str::to_string).collect()
    }

    fn plain(text: &str) -> Vec<String> {
        render(text, &ArcsConfig::default(), Shear::identity(), Translation::zero())
    }

    #[test]
    fn header_comes_first_and_passthrough_is_verbatim() {
        let out = plain("; comment\n\nM104 S215 ; hot\nG29.1 X3\n");
        assert_eq!(out, vec![HEADER, "; comment", "", "M104 S215 ; hot", "G29.1 X3"]);
    }

    #[test]
    fn every_line_ends_with_eol() {
        let s = scan("G1 X1 Y1", &ArcsConfig::default(), &WorkArea::default()).expect("scan");
        let opts = EmitOptions {
            placement: Placement {
                shear: Shear::identity(),
                translation: Translation::zero(),
            },
            precision: Precision::default(),
            header: HEADER,
            eol: "\r\n",
        };
        assert_eq!(emit(&s, &opts), "; test header\r\nG1 X1 Y1\r\n");
    }

    #[test]
    fn mixed_terminators_are_kept_per_line() {
        let s = scan("G90\r\n; note\nG1 X1 Y1\r\nM84", &ArcsConfig::default(), &WorkArea::default())
            .expect("scan");
        let opts = EmitOptions {
            placement: Placement {
                shear: Shear::identity(),
                translation: Translation::zero(),
            },
            precision: Precision::default(),
            header: HEADER,
            eol: "\r\n",
        };
        assert_eq!(
            emit(&s, &opts),
            "; test header\r\nG90\r\n; note\nG1 X1 Y1\r\nM84\r\n"
        );
    }

    #[test]
    fn linear_move_gains_the_missing_axis() {
        let out = plain("G1 X10 Y20\nG1 X15 E0.5 F1200 ; wall\n");
        assert_eq!(out[2], "G1 X15 Y20 E0.5 F1200 ; wall");
        let out = plain("G1 X10 Y20\nG1 Y30 F900\n");
        assert_eq!(out[2], "G1 X10 Y30 F900");
    }

    #[test]
    fn moves_without_xy_are_verbatim() {
        let out = plain("G1 X10 Y20\nG1 Z0.30000 F600\nG1 E-0.8\n");
        assert_eq!(out[2], "G1 Z0.30000 F600");
        assert_eq!(out[3], "G1 E-0.8");
    }

    #[test]
    fn sheared_absolute_move() {
        let shear = Shear::new((-0.15f64).to_radians(), 100.0);
        let out = render("G1 X50 Y200 E1\n", &ArcsConfig::default(), shear, Translation::zero());
        assert_eq!(out[1], "G1 X49.738 Y200 E1");
    }

    #[test]
    fn translation_applies_to_travel_too() {
        let out = render(
            "G0 X-5 Y0\nG1 X10 Y10 E1\n",
            &ArcsConfig::default(),
            Shear::identity(),
            Translation { dx: 2.0, dy: 3.0 },
        );
        assert_eq!(out[1], "G0 X-3 Y3");
        assert_eq!(out[2], "G1 X12 Y13 E1");
    }

    #[test]
    fn relative_moves_emit_transformed_deltas() {
        let shear = Shear { tan: 0.01, y_ref: 50.0 };
        let out = render(
            "G1 X10 Y10\nG91\nG1 Y100\nG1 X5\n",
            &ArcsConfig::default(),
            shear,
            Translation { dx: 7.0, dy: 7.0 },
        );
        assert_eq!(out[2], "G91");
        // (0, 100) sheared as a vector is (1, 100); translation cancels.
        assert_eq!(out[3], "G1 X1 Y100");
        assert_eq!(out[4], "G1 X5 Y0");
    }

    #[test]
    fn line_number_and_unknown_words_survive() {
        let out = plain("N7 G1 X1 Y2 Q3.50 F100\n");
        assert_eq!(out[1], "N7 G1 X1 Y2 Q3.5 F100");
    }

    // ── arcs ─────────────────────────────────────────────────────────────────

    fn coarse(linearize: bool) -> ArcsConfig {
        ArcsConfig {
            linearize,
            max_chord_mm: 100.0,
            max_angle_deg: 90.0,
            ..ArcsConfig::default()
        }
    }

    #[test]
    fn linearized_arc_emits_g1_chords() {
        let out = render(
            "M83\nG1 X0 Y0\nG2 X10 Y0 I5 J0 E2 F1200 ; arc\n",
            &coarse(true),
            Shear::identity(),
            Translation::zero(),
        );
        assert_eq!(out.len(), 5);
        assert_eq!(out[3], "G1 X5 Y5 E1 F1200 ; arc");
        assert_eq!(out[4], "G1 X10 Y0 E1");
    }

    #[test]
    fn linearized_arc_in_absolute_extrusion_uses_cumulative_e() {
        let out = render(
            "G1 X0 Y0 E3\nG2 X10 Y0 I5 J0 E5\n",
            &coarse(true),
            Shear::identity(),
            Translation::zero(),
        );
        assert_eq!(out[2], "G1 X5 Y5 E4");
        assert_eq!(out[3], "G1 X10 Y0 E5");
    }

    #[test]
    fn linearized_arc_in_relative_positioning_emits_chord_deltas() {
        let text = "G1 X10 Y10 E1\nG91\nM83\nG2 X10 Y0 I5 J0 E1 F600\n";
        let out = render(text, &coarse(true), Shear::identity(), Translation { dx: 3.0, dy: 4.0 });
        assert_eq!(out[1], "G1 X13 Y14 E1");
        assert_eq!(out[4], "G1 X5 Y5 E0.5 F600");
        assert_eq!(out[5], "G1 X5 Y-5 E0.5");

        // Chords (10,10)→(15,15)→(20,10) sheared at tan 0.01 about y 0.
        let out = render(text, &coarse(true), Shear { tan: 0.01, y_ref: 0.0 }, Translation::zero());
        assert_eq!(out[4], "G1 X5.05 Y5 E0.5 F600");
        assert_eq!(out[5], "G1 X4.95 Y-5 E0.5");
    }

    #[test]
    fn helical_arc_carries_z() {
        let out = render(
            "G1 X0 Y0 Z1\nG2 X10 Y0 Z2 I5 J0\n",
            &coarse(true),
            Shear::identity(),
            Translation::zero(),
        );
        assert_eq!(out[2], "G1 X5 Y5 Z1.5");
        assert_eq!(out[3], "G1 X10 Y0 Z2");
    }

    #[test]
    fn kept_arc_shears_center_offset() {
        let shear = Shear { tan: 0.01, y_ref: 0.0 };
        let out = render(
            "G1 X10 Y10\nG2 X20 Y20 I0 J10 E1\n",
            &coarse(false),
            shear,
            Translation::zero(),
        );
        assert_eq!(out[2], "G2 X20.2 Y20 I0.1 J10 E1");
    }

    #[test]
    fn kept_radius_arc_leaves_r_alone() {
        let out = render(
            "G1 X10 Y10\nG3 X20 Y20 R10\n",
            &coarse(false),
            Shear { tan: 0.01, y_ref: 20.0 },
            Translation::zero(),
        );
        assert_eq!(out[2], "G3 X20 Y20 R10");
    }
}
