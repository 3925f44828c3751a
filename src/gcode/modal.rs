//! Positional mode tracker: the single source of truth for where the tool is.
//!
//! Two independent registers are tracked. The positioning register
//! (G90/G91) governs X, Y and Z; the extrusion register (M82/M83) governs E.
//! Both start out [`AxisMode::Absolute`].

use super::classify::{Command, Instruction};
use crate::models::Position;

/// Absolute-versus-relative interpretation of axis words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AxisMode {
    #[default]
    Absolute,
    Relative,
}

impl AxisMode {
    /// Resolves a word value against the current absolute coordinate.
    pub fn resolve(self, current: f64, value: f64) -> f64 {
        match self {
            AxisMode::Absolute => value,
            AxisMode::Relative => current + value,
        }
    }
}

/// A motion instruction resolved to absolute coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolved {
    pub start: Position,
    pub target: Position,
}

impl Resolved {
    /// Change of the cumulative extrusion amount over this motion.
    pub fn extrusion_delta(&self) -> f64 {
        self.target.e - self.start.e
    }

    /// `true` iff the motion deposits material.
    pub fn is_extruding(&self) -> bool {
        self.extrusion_delta() > 0.0
    }
}

/// What one instruction did to the tracker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step {
    /// G0/G1/G2/G3: the tool moved.
    Motion(Resolved),
    /// G90/G91/M82/M83: a register changed; the tool did not move.
    ModeChange,
    /// G92/G28: the tracked position was redefined without a tracked move.
    PositionReset,
}

/// Tracks both mode registers and the current absolute position.
#[derive(Debug, Default)]
pub struct ModeTracker {
    positioning: AxisMode,
    extrusion: AxisMode,
    position: Position,
}

impl ModeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current X/Y/Z register.
    pub fn positioning(&self) -> AxisMode {
        self.positioning
    }

    /// Current E register.
    pub fn extrusion(&self) -> AxisMode {
        self.extrusion
    }

    /// Current resolved absolute position.
    pub fn position(&self) -> Position {
        self.position
    }

    /// Advances the tracker by exactly one instruction.
    pub fn advance(&mut self, instr: &Instruction) -> Step {
        match instr.command {
            Command::AbsolutePositioning => {
                self.positioning = AxisMode::Absolute;
                Step::ModeChange
            }
            Command::RelativePositioning => {
                self.positioning = AxisMode::Relative;
                Step::ModeChange
            }
            Command::AbsoluteExtrusion => {
                self.extrusion = AxisMode::Absolute;
                Step::ModeChange
            }
            Command::RelativeExtrusion => {
                self.extrusion = AxisMode::Relative;
                Step::ModeChange
            }
            Command::SetPosition => {
                self.set_position(instr);
                Step::PositionReset
            }
            Command::Home => {
                self.home(instr);
                Step::PositionReset
            }
            Command::Rapid | Command::Linear | Command::ArcCw | Command::ArcCcw => {
                let start = self.position;
                let target = self.resolve_target(instr);
                self.position = target;
                Step::Motion(Resolved { start, target })
            }
        }
    }

    /// Resolves the axis words of a motion instruction. Omitted axes keep
    /// their current value.
    fn resolve_target(&self, instr: &Instruction) -> Position {
        let cur = self.position;
        let axis = |letter: char, current: f64, mode: AxisMode| match instr.get(letter) {
            Some(v) => mode.resolve(current, v),
            None => current,
        };
        Position {
            x: axis('X', cur.x, self.positioning),
            y: axis('Y', cur.y, self.positioning),
            z: axis('Z', cur.z, self.positioning),
            e: axis('E', cur.e, self.extrusion),
        }
    }

    /// G92: named axes take the given logical value; no axes means all zero.
    fn set_position(&mut self, instr: &Instruction) {
        let any_axis = ['X', 'Y', 'Z', 'E'].iter().any(|&l| instr.has(l));
        if !any_axis {
            self.position = Position::zero();
            return;
        }
        let p = &mut self.position;
        for (letter, slot) in [('X', &mut p.x), ('Y', &mut p.y), ('Z', &mut p.z), ('E', &mut p.e)] {
            if let Some(v) = instr.get(letter) {
                *slot = v;
            }
        }
    }

    /// G28: named axes (all of X/Y/Z when none named) return to zero.
    fn home(&mut self, instr: &Instruction) {
        let any_axis = ['X', 'Y', 'Z'].iter().any(|&l| instr.has(l));
        let p = &mut self.position;
        for (letter, slot) in [('X', &mut p.x), ('Y', &mut p.y), ('Z', &mut p.z)] {
            if !any_axis || instr.has(letter) {
                *slot = 0.0;
            }
        }
    }
}
