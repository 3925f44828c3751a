//! The two passes over the buffered move arena.
//!
//! [`scan::scan`] reads the text once into [`types::ResolvedMove`]s;
//! [`emit::emit`] renders the corrected program from that arena.

pub mod emit;
pub mod scan;
pub mod types;

pub use emit::{emit, EmitOptions};
pub use scan::{scan, Scan, SourceLine};
pub use types::{MoveKind, ResolvedMove};
