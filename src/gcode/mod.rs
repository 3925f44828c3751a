//! Line-level G-code handling: classification, word blocks, number
//! formatting, positional-mode tracking and arc linearization.

pub mod arcs;
pub mod block;
pub mod classify;
pub mod formatter;
pub mod modal;

/// Internal error type for malformed instruction text.
/// The pipeline maps these to `SkewFixError::Parameter` at the boundary.
///
/// Line numbers are 1-based, as an editor would show them.
#[derive(Debug, thiserror::Error)]
pub enum GcodeError {
    #[error("line {line}: malformed number in word `{word}`")]
    MalformedNumber { line: usize, word: String },
    #[error("line {line}: word `{letter}` requires a numeric value")]
    MissingValue { line: usize, letter: char },
    #[error("line {line}: unexpected character `{ch}` in instruction")]
    UnexpectedCharacter { line: usize, ch: char },
    #[error("line {line}: arc would expand into {segments} segments (limit {limit}); check its centre offset or radius")]
    ArcTooFine {
        line: usize,
        segments: usize,
        limit: usize,
    },
}
