//! Run configuration, loaded from a TOML file.
//!
//! Every key has a default except `[skew].angle_deg`, which may instead come
//! from the command line. [`parse`] runs [`SkewFixConfig::validate`] so a
//! config that leaves this module is always internally consistent.

use serde::Deserialize;

use crate::error::SkewFixError;
use crate::gcode::arcs::{ArcCaps, RadiusConvention};
use crate::gcode::formatter::Precision;
use crate::models::WorkArea;

/// Largest skew angle accepted, in degrees. A first-order shear is only a
/// sound model of frame skew for small angles.
pub const MAX_SKEW_DEG: f64 = 45.0;

/// Largest decimal count accepted for either precision setting.
pub const MAX_DECIMALS: u32 = 12;

/// How the shear reference line is chosen (`skew.reference`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceMode {
    /// Midpoint of the model-only box's Y extent.
    #[default]
    Auto,
    /// The literal `skew.reference_y`.
    Fixed,
}

impl ReferenceMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ReferenceMode::Auto => "auto",
            ReferenceMode::Fixed => "fixed",
        }
    }
}

/// Placement strategy for recentering (`recenter.mode`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecenterMode {
    /// Midpoint of the feasible interval.
    #[default]
    Center,
    /// Smallest-magnitude feasible shift, zero when possible.
    Clamp,
}

impl RecenterMode {
    pub fn as_str(self) -> &'static str {
        match self {
            RecenterMode::Center => "center",
            RecenterMode::Clamp => "clamp",
        }
    }
}

/// Rendering of the analyze-only report (`output.report_format`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

/// Complete run configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct SkewFixConfig {
    pub skew: SkewConfig,
    pub arcs: ArcsConfig,
    pub recenter: RecenterConfig,
    pub work_area: WorkArea,
    pub output: OutputConfig,
}

/// `[skew]`: angle and reference line.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct SkewConfig {
    /// Measured skew, in degrees. Required before a run, but may be supplied
    /// on the command line instead.
    pub angle_deg: Option<f64>,
    pub reference: ReferenceMode,
    /// Literal reference line. Required when `reference = "fixed"`.
    pub reference_y: Option<f64>,
}

/// `[arcs]`: G2/G3 linearization.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct ArcsConfig {
    pub linearize: bool,
    pub max_chord_mm: f64,
    pub max_angle_deg: f64,
    pub radius_convention: RadiusConvention,
}

impl Default for ArcsConfig {
    fn default() -> Self {
        ArcsConfig {
            linearize: true,
            max_chord_mm: 0.2,
            max_angle_deg: 5.0,
            radius_convention: RadiusConvention::default(),
        }
    }
}

impl ArcsConfig {
    /// Chord limits in the units the linearizer works in.
    pub fn caps(&self) -> ArcCaps {
        ArcCaps {
            max_chord: self.max_chord_mm,
            max_angle: self.max_angle_deg.to_radians(),
        }
    }
}

/// `[recenter]`: post-shear placement inside the working area.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct RecenterConfig {
    pub enabled: bool,
    pub mode: RecenterMode,
    /// Clearance kept between the model and each working-area edge, in mm.
    pub margin: f64,
    /// Tolerance on an empty feasible interval before it counts as a misfit.
    pub epsilon: f64,
}

impl Default for RecenterConfig {
    fn default() -> Self {
        RecenterConfig {
            enabled: false,
            mode: RecenterMode::default(),
            margin: 0.0,
            epsilon: 0.01,
        }
    }
}

/// `[output]`: precision and run mode.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct OutputConfig {
    pub xy_decimals: u32,
    pub other_decimals: u32,
    /// Print the report instead of rewriting the file.
    pub analyze_only: bool,
    pub report_format: ReportFormat,
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            xy_decimals: 3,
            other_decimals: 5,
            analyze_only: false,
            report_format: ReportFormat::default(),
        }
    }
}

/// Reference line with its value, once resolved from the config.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReferenceLine {
    Auto,
    Fixed(f64),
}

impl ReferenceLine {
    pub fn mode(self) -> ReferenceMode {
        match self {
            ReferenceLine::Auto => ReferenceMode::Auto,
            ReferenceLine::Fixed(_) => ReferenceMode::Fixed,
        }
    }
}

/// Immutable skew inputs for one run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkewParameters {
    /// As given by the user.
    pub angle_deg: f64,
    /// `angle_deg` in radians.
    pub angle: f64,
    pub reference: ReferenceLine,
}

/// Parse a TOML string into a [`SkewFixConfig`], running validation.
pub fn parse(toml_str: &str) -> Result<SkewFixConfig, SkewFixError> {
    let cfg: SkewFixConfig =
        toml::from_str(toml_str).map_err(|e| SkewFixError::Parameter(e.to_string()))?;
    cfg.validate()?;
    Ok(cfg)
}

fn invalid(msg: impl Into<String>) -> SkewFixError {
    SkewFixError::Parameter(msg.into())
}

impl SkewFixConfig {
    /// Checks every cross-field rule. The skew angle itself is only checked
    /// when present; [`SkewFixConfig::skew_parameters`] rejects a missing one.
    pub fn validate(&self) -> Result<(), SkewFixError> {
        if let Some(deg) = self.skew.angle_deg {
            if !deg.is_finite() || deg.abs() >= MAX_SKEW_DEG {
                return Err(invalid(format!(
                    "skew.angle_deg must be finite and within ±{MAX_SKEW_DEG}°, got {deg}"
                )));
            }
        }

        if self.skew.reference == ReferenceMode::Fixed {
            match self.skew.reference_y {
                Some(y) if y.is_finite() => {}
                Some(y) => return Err(invalid(format!("skew.reference_y must be finite, got {y}"))),
                None => {
                    return Err(invalid(
                        "skew.reference_y must be defined when skew.reference = \"fixed\"",
                    ))
                }
            }
        }

        let arcs = &self.arcs;
        if !(arcs.max_chord_mm > 0.0 && arcs.max_chord_mm.is_finite()) {
            return Err(invalid(format!(
                "arcs.max_chord_mm must be positive, got {}",
                arcs.max_chord_mm
            )));
        }
        if !(arcs.max_angle_deg > 0.0 && arcs.max_angle_deg <= 180.0) {
            return Err(invalid(format!(
                "arcs.max_angle_deg must be in (0, 180], got {}",
                arcs.max_angle_deg
            )));
        }

        let rc = &self.recenter;
        if !(rc.margin >= 0.0 && rc.margin.is_finite()) {
            return Err(invalid(format!("recenter.margin must be non-negative, got {}", rc.margin)));
        }
        if !(rc.epsilon >= 0.0 && rc.epsilon.is_finite()) {
            return Err(invalid(format!(
                "recenter.epsilon must be non-negative, got {}",
                rc.epsilon
            )));
        }

        let wa = &self.work_area;
        for (axis, (lo, hi)) in [('x', wa.range('X')), ('y', wa.range('Y'))] {
            if !(lo.is_finite() && hi.is_finite() && hi > lo) {
                return Err(invalid(format!(
                    "work_area.{axis}_max must exceed work_area.{axis}_min ({lo} .. {hi})"
                )));
            }
        }

        let out = &self.output;
        if out.xy_decimals > MAX_DECIMALS || out.other_decimals > MAX_DECIMALS {
            return Err(invalid(format!(
                "output decimals must be at most {MAX_DECIMALS} (xy={}, other={})",
                out.xy_decimals, out.other_decimals
            )));
        }

        Ok(())
    }

    /// Skew inputs for the run. Fails when no angle was configured.
    pub fn skew_parameters(&self) -> Result<SkewParameters, SkewFixError> {
        let angle_deg = self
            .skew
            .angle_deg
            .ok_or_else(|| invalid("skew angle is required (skew.angle_deg or --skew-deg)"))?;
        let reference = match (self.skew.reference, self.skew.reference_y) {
            (ReferenceMode::Fixed, Some(y)) => ReferenceLine::Fixed(y),
            (ReferenceMode::Fixed, None) => {
                return Err(invalid(
                    "skew.reference_y must be defined when skew.reference = \"fixed\"",
                ))
            }
            (ReferenceMode::Auto, _) => ReferenceLine::Auto,
        };
        Ok(SkewParameters {
            angle_deg,
            angle: angle_deg.to_radians(),
            reference,
        })
    }

    pub fn precision(&self) -> Precision {
        Precision {
            xy_decimals: self.output.xy_decimals,
            other_decimals: self.output.other_decimals,
        }
    }
}
