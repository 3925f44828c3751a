//! skewfix CLI
//!
//! Usage:
//!   skewfix [OPTIONS] <GCODE>
//!
//! Options:
//!   -c, --config <FILE>   Run configuration (TOML)
//!       --skew-deg <DEG>  Skew angle in degrees, overrides [skew].angle_deg
//!       --analyze-only    Print the report instead of rewriting the file
//!   -h, --help            Print help

use std::path::PathBuf;

use clap::Parser;

use skewfix_lib::config::{self, ReportFormat, SkewFixConfig};
use skewfix_lib::{Report, SkewFixError};

#[derive(Parser)]
#[command(name = "skewfix")]
#[command(about = "XY skew correction for slicer G-code", version)]
struct Cli {
    /// G-code file to correct in place (the slicer passes this)
    gcode: PathBuf,

    /// Run configuration (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Skew angle in degrees, e.g. -0.15
    #[arg(long, allow_negative_numbers = true)]
    skew_deg: Option<f64>,

    /// Print the analysis report; leave the file untouched
    #[arg(long)]
    analyze_only: bool,
}

fn load_config(cli: &Cli) -> Result<SkewFixConfig, SkewFixError> {
    let mut cfg = match &cli.config {
        Some(path) => {
            let text = std::fs::read_to_string(path).map_err(|e| {
                SkewFixError::Io(format!("cannot read config {}: {e}", path.display()))
            })?;
            config::parse(&text)?
        }
        None => SkewFixConfig::default(),
    };
    if let Some(deg) = cli.skew_deg {
        cfg.skew.angle_deg = Some(deg);
    }
    if cli.analyze_only {
        cfg.output.analyze_only = true;
    }
    cfg.validate()?;
    Ok(cfg)
}

fn print_report(report: &Report, format: ReportFormat) -> Result<(), SkewFixError> {
    match format {
        ReportFormat::Text => print!("{}", report.render_text()),
        ReportFormat::Json => {
            let json = report
                .render_json()
                .map_err(|e| SkewFixError::Io(format!("cannot render report: {e}")))?;
            println!("{json}");
        }
    }
    Ok(())
}

fn execute(cli: &Cli) -> Result<(), SkewFixError> {
    let cfg = load_config(cli)?;
    let report = skewfix_lib::run(&cli.gcode, &cfg)?;
    if cfg.output.analyze_only {
        print_report(&report, cfg.output.report_format)?;
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    let guard = skewfix_lib::init_tracing();
    tracing::info!(path = %cli.gcode.display(), "skewfix starting");

    let code = match execute(&cli) {
        Ok(()) => 0,
        Err(e) => {
            tracing::error!(error = %e, "run failed");
            eprintln!("skewfix: {e}");
            e.exit_code()
        }
    };

    drop(guard);
    std::process::exit(code);
}
