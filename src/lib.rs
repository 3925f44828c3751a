pub mod config;
pub mod error;
pub mod file;
pub mod gcode;
pub mod models;
pub mod pipeline;
pub mod report;
pub mod toolpath;
pub mod transform;

pub use config::SkewFixConfig;
pub use error::SkewFixError;
pub use pipeline::{process, run, Outcome};
pub use report::Report;

use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};

const LOG_FILE: &str = "skewfix.log";

/// Installs the global tracing subscriber.
///
/// Slicer post-processing hooks discard stderr, so logs go to a single file
/// in the OS data dir:
///   Linux    ~/.local/share/skewfix/skewfix.log
///   macOS    ~/Library/Application Support/skewfix/skewfix.log
///   Windows  %LOCALAPPDATA%\skewfix\skewfix.log
///
/// When that directory cannot be used the system temp dir is tried, and when
/// neither works records are dropped; logging never aborts a run.
///
/// Log level is controlled by the RUST_LOG environment variable; defaults to
/// INFO when the variable is absent. The returned guard flushes pending
/// records when dropped, so the caller keeps it alive for the whole run.
pub fn init_tracing() -> WorkerGuard {
    let candidates = dirs::data_local_dir()
        .into_iter()
        .chain(std::iter::once(std::env::temp_dir()))
        .map(|d| d.join("skewfix"));

    let (non_blocking, guard) = match open_log(candidates) {
        Some(appender) => tracing_appender::non_blocking(appender),
        None => tracing_appender::non_blocking(std::io::sink()),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(non_blocking)
        .with_ansi(false)
        .init();

    guard
}

/// Opens the log file in the first directory that can be created and written.
fn open_log(candidates: impl IntoIterator<Item = PathBuf>) -> Option<RollingFileAppender> {
    candidates.into_iter().find_map(|dir| {
        std::fs::create_dir_all(&dir).ok()?;
        RollingFileAppender::builder()
            .rotation(Rotation::NEVER)
            .filename_prefix(LOG_FILE)
            .build(&dir)
            .ok()
    })
}
