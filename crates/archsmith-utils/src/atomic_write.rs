//! Atomic file writes: temp file in the target directory, fsync, rename.
//!
//! When the rename crosses filesystems the content is copied, fsynced and
//! renamed into place from a sibling temp file instead.

use anyhow::{Context, Result};
use camino::Utf8Path;
use std::fs;
use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

/// Result of an atomic write operation
#[derive(Debug, Clone, Default)]
pub struct AtomicWriteResult {
    /// Bytes written, exactly the content's UTF-8 length
    pub bytes_written: u64,
    /// Whether cross-filesystem fallback was used
    pub used_cross_filesystem_fallback: bool,
    /// Any warnings generated during the operation
    pub warnings: Vec<String>,
}

/// Atomically write UTF-8 content byte for byte.
///
/// Line endings are kept as given. Parent directories are created as needed.
pub fn write_file_atomic(path: &Utf8Path, content: &str) -> Result<AtomicWriteResult> {
    let mut result = AtomicWriteResult::default();

    result.bytes_written = content.len() as u64;

    let temp_dir = match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };
    fs::create_dir_all(temp_dir)
        .with_context(|| format!("Failed to create parent directory: {temp_dir}"))?;

    let mut temp_file = NamedTempFile::new_in(temp_dir)
        .with_context(|| format!("Failed to create temporary file in: {temp_dir}"))?;

    temp_file
        .write_all(content.as_bytes())
        .with_context(|| "Failed to write content to temporary file")?;

    temp_file
        .as_file()
        .sync_all()
        .with_context(|| "Failed to fsync temporary file")?;

    match temp_file.persist(path.as_std_path()) {
        Ok(_) => {}
        Err(persist_error) if is_cross_filesystem_error(&persist_error.error) => {
            result.used_cross_filesystem_fallback = true;
            result
                .warnings
                .push("Used cross-filesystem fallback (copy→fsync→replace)".to_string());
            cross_filesystem_copy(persist_error.file.path(), path)?;
        }
        Err(persist_error) => {
            return Err(anyhow::anyhow!(persist_error.error))
                .with_context(|| format!("Failed to atomically write file: {path}"));
        }
    }

    Ok(result)
}

#[cfg(unix)]
fn is_cross_filesystem_error(err: &std::io::Error) -> bool {
    // EXDEV on Linux and macOS
    err.raw_os_error() == Some(18)
}

#[cfg(windows)]
fn is_cross_filesystem_error(err: &std::io::Error) -> bool {
    // ERROR_NOT_SAME_DEVICE
    err.raw_os_error() == Some(17)
}

#[cfg(not(any(unix, windows)))]
fn is_cross_filesystem_error(_err: &std::io::Error) -> bool {
    false
}

fn cross_filesystem_copy(source: &Path, target: &Utf8Path) -> Result<()> {
    let target_dir = target.parent().unwrap_or_else(|| Utf8Path::new("."));
    let staging = NamedTempFile::new_in(target_dir)
        .with_context(|| format!("Failed to create staging file in: {target_dir}"))?;

    fs::copy(source, staging.path())
        .with_context(|| format!("Failed to copy {} to staging file", source.display()))?;
    staging
        .as_file()
        .sync_all()
        .with_context(|| "Failed to fsync staging file")?;
    staging
        .persist(target.as_std_path())
        .map_err(|e| anyhow::anyhow!(e.error))
        .with_context(|| format!("Failed to replace {target} with staging file"))?;

    Ok(())
}
