//! Run-level error type returned by every fallible pipeline stage.
//!
//! Each variant corresponds to one entry of the failure taxonomy and maps to a
//! distinct process exit code so callers (slicer hooks, shell scripts) can
//! tell the failure classes apart without parsing messages.

use crate::gcode::GcodeError;

/// Top-level error returned by the pipeline driver and the file layer.
///
/// Every variant is fatal for the run. When any of them is returned the
/// original G-code file has not been touched.
#[derive(Debug, thiserror::Error)]
pub enum SkewFixError {
    /// The input is Prusa binary G-code (or otherwise not text).
    #[error("unsupported input format: {0}")]
    UnsupportedFormat(String),

    /// A malformed numeric token in the input, or an inconsistent
    /// configuration value.
    #[error("parameter error: {0}")]
    Parameter(String),

    /// Recentering was requested but no translation keeps the model inside
    /// the working area on `axis`.
    #[error(
        "model does not fit the working area on {axis}: feasible shift interval \
         [{lower:.4}, {upper:.4}] is empty beyond tolerance {tolerance}"
    )]
    GeometryFit {
        axis: char,
        lower: f64,
        upper: f64,
        tolerance: f64,
    },

    /// Reading the input, writing the temporary file, or the final rename
    /// failed. The inner [`std::io::Error`] is stringified at the boundary.
    #[error("i/o error: {0}")]
    Io(String),
}

impl SkewFixError {
    /// Process exit code for this failure class.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Parameter(_) => 2,
            Self::UnsupportedFormat(_) => 3,
            Self::GeometryFit { .. } => 4,
            Self::Io(_) => 5,
        }
    }
}

impl From<GcodeError> for SkewFixError {
    /// Malformed instruction text is a parameter error at the run boundary.
    fn from(e: GcodeError) -> Self {
        Self::Parameter(e.to_string())
    }
}

impl From<std::io::Error> for SkewFixError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}
