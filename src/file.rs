//! Input loading and atomic rewrite of the G-code file.
//!
//! # Load
//! 1. Read the whole file.
//! 2. Reject Prusa binary G-code (`GCDE` magic) and anything with early NUL
//!    bytes before touching it.
//! 3. Decode as UTF-8, replacing invalid bytes.
//!
//! # Save
//! 1. Remove any stale `<name>.skewfix.tmp` beside the target.
//! 2. Create the temp file fresh (same directory → same filesystem), write,
//!    flush and sync it.
//! 3. Atomically rename the temp file over the target.
//! On any failure the temp file is deleted and the target is left intact.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::error::SkewFixError;

/// Magic that opens a Prusa binary G-code file.
const BINARY_MAGIC: &[u8] = b"GCDE";

/// How far into the file the magic is searched for.
const MAGIC_WINDOW: usize = 64;

/// How far into the file NUL bytes are searched for.
const NUL_WINDOW: usize = 512;

/// Suffix appended to the target's file name for the temp file.
const TMP_SUFFIX: &str = ".skewfix.tmp";

/// The input file: raw bytes for checksumming plus decoded text.
#[derive(Debug)]
pub struct GcodeInput {
    pub bytes: Vec<u8>,
    pub text: String,
}

/// Rejects anything that is not plain-text G-code.
pub fn ensure_text_gcode(bytes: &[u8]) -> Result<(), SkewFixError> {
    let magic_head = &bytes[..bytes.len().min(MAGIC_WINDOW)];
    if magic_head.windows(BINARY_MAGIC.len()).any(|w| w == BINARY_MAGIC) {
        return Err(SkewFixError::UnsupportedFormat(
            "binary G-code detected (magic 'GCDE'); disable binary G-code output in the slicer \
             and re-slice"
                .to_string(),
        ));
    }

    let nul_head = &bytes[..bytes.len().min(NUL_WINDOW)];
    if nul_head.contains(&0) {
        return Err(SkewFixError::UnsupportedFormat(
            "file appears to be binary (NUL bytes near the start); only text G-code is supported"
                .to_string(),
        ));
    }

    Ok(())
}

/// Reads and validates `path`.
pub fn read_gcode(path: &Path) -> Result<GcodeInput, SkewFixError> {
    let bytes = std::fs::read(path)
        .map_err(|e| SkewFixError::Io(format!("cannot read {}: {e}", path.display())))?;
    ensure_text_gcode(&bytes)?;

    let text = match String::from_utf8_lossy(&bytes) {
        std::borrow::Cow::Borrowed(s) => s.to_string(),
        std::borrow::Cow::Owned(s) => {
            tracing::warn!(path = %path.display(), "input is not valid UTF-8; invalid bytes replaced");
            s
        }
    };
    Ok(GcodeInput { bytes, text })
}

/// Lowercase hex SHA-256 of `bytes`.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

/// Temp-file location used when replacing `path`.
pub fn temp_path(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .into_owned();
    path.with_file_name(format!("{file_name}{TMP_SUFFIX}"))
}

/// Replaces `path` with `contents` using an atomic write.
pub fn replace_atomically(path: &Path, contents: &str) -> Result<(), SkewFixError> {
    let tmp_path = temp_path(path);

    if tmp_path.exists() {
        tracing::debug!(tmp = %tmp_path.display(), "removing stale temp file");
        std::fs::remove_file(&tmp_path).map_err(|e| {
            SkewFixError::Io(format!("cannot remove stale {}: {e}", tmp_path.display()))
        })?;
    }

    if let Err(e) = write_temp(&tmp_path, contents) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(e);
    }

    std::fs::rename(&tmp_path, path).map_err(|e| {
        let _ = std::fs::remove_file(&tmp_path);
        SkewFixError::Io(format!("rename to final path failed: {e}"))
    })
}

/// Write `contents` to a freshly created file at `path` and sync it.
fn write_temp(path: &Path, contents: &str) -> Result<(), SkewFixError> {
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|e| SkewFixError::Io(format!("cannot create {}: {e}", path.display())))?;
    file.write_all(contents.as_bytes())
        .map_err(|e| SkewFixError::Io(format!("write failed: {e}")))?;
    file.flush()
        .map_err(|e| SkewFixError::Io(format!("flush failed: {e}")))?;
    file.sync_all()
        .map_err(|e| SkewFixError::Io(format!("sync failed: {e}")))?;
    Ok(())
}
