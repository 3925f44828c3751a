//! Resolved-move records produced by the scan pass.
//!
//! A [`ResolvedMove`] is a small fixed-size record. The scan pass fills one
//! arena of them for the whole file; the analysis and emit passes then walk
//! that arena without re-parsing any text.

use crate::gcode::modal::AxisMode;
use crate::models::Position;

/// How a record is turned back into text by the emit pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveKind {
    /// A G0/G1 move, re-rendered from the source instruction's words.
    Linear,
    /// One chord of a linearized G2/G3 arc, rendered as a fresh G1.
    ArcSegment {
        /// 0-based position of this chord within its arc.
        index: u32,
        /// Number of chords the arc was split into.
        count: u32,
    },
    /// A G2/G3 kept as an arc (linearization disabled).
    Arc,
    /// Anything re-emitted byte-identical: comments, blank lines, unknown
    /// commands, mode switches, G92/G28.
    Passthrough,
}

/// One output unit of the scan pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedMove {
    /// 0-based source line this record came from. Consecutive records share
    /// a line when an arc was split into chords.
    pub line: usize,
    pub kind: MoveKind,
    /// Absolute target before any shear or translation. For passthrough
    /// records this is the tracked position after the line.
    pub target: Position,
    /// X/Y/Z register in force for this record.
    pub positioning: AxisMode,
    /// E register in force for this record.
    pub extrusion: AxisMode,
    /// Change of cumulative extrusion over this record.
    pub extrusion_delta: f64,
    /// `true` iff `extrusion_delta` is strictly positive.
    pub extruding: bool,
    /// `true` iff the untransformed target lies inside the working area.
    pub in_bed: bool,
}

impl ResolvedMove {
    /// `true` for records that move the tool.
    pub fn is_motion(&self) -> bool {
        !matches!(self.kind, MoveKind::Passthrough)
    }

    /// `true` for records that belong to the printed model: extruding moves
    /// whose original target was inside the working area. This one filter
    /// feeds both the model-only bounds and the AUTO reference line.
    pub fn is_model(&self) -> bool {
        self.is_motion() && self.extruding && self.in_bed
    }
}
