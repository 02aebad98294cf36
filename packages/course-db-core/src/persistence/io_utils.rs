//! I/O utilities for persistence operations.

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::Path;

use crate::error::DbError;

/// Classifies I/O errors into specific DbError variants.
pub fn classify_io_error(error: std::io::Error, context: &str) -> DbError {
    match error.kind() {
        ErrorKind::StorageFull | ErrorKind::OutOfMemory => {
            DbError::DiskFull(format!("{}: {}", context, error))
        }
        ErrorKind::WouldBlock | ErrorKind::TimedOut | ErrorKind::Interrupted => {
            DbError::TransientIoError(format!("{}: {}", context, error))
        }
        _ => DbError::IoError(format!("{}: {}", context, error)),
    }
}

/// Retries an operation that may fail with transient I/O errors.
///
/// Non-transient errors are returned immediately.
pub fn retry_io_operation<F, T>(
    operation: F,
    max_retries: u32,
    retry_delay_ms: u64,
    context: &str,
) -> Result<T, DbError>
where
    F: Fn() -> Result<T, DbError>,
{
    let mut attempt = 0;
    loop {
        match operation() {
            Ok(result) => return Ok(result),
            Err(DbError::TransientIoError(msg)) if attempt < max_retries => {
                attempt += 1;
                tracing::warn!(
                    "Transient I/O error in {} (attempt {}/{}): {}",
                    context,
                    attempt,
                    max_retries,
                    msg
                );
                if retry_delay_ms > 0 {
                    std::thread::sleep(std::time::Duration::from_millis(retry_delay_ms));
                }
            }
            Err(err) => return Err(err),
        }
    }
}

/// Writes `bytes` to `path` through a `.tmp` sibling, fsync and rename.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), DbError> {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| DbError::IoError(format!("Invalid snapshot path {}", path.display())))?;
    let temp_path = path.with_file_name(format!("{}.tmp", file_name));

    let mut file =
        File::create(&temp_path).map_err(|e| classify_io_error(e, "Failed to create temp file"))?;
    file.write_all(bytes)
        .map_err(|e| classify_io_error(e, "Failed to write temp file"))?;
    file.sync_all()
        .map_err(|e| classify_io_error(e, "Failed to sync temp file"))?;

    fs::rename(&temp_path, path).map_err(|e| classify_io_error(e, "Failed to rename temp file"))
}

/// Flushes directory entries so completed renames survive a power loss.
#[cfg(unix)]
pub fn sync_dir(dir: &Path) -> Result<(), DbError> {
    File::open(dir)
        .and_then(|handle| handle.sync_all())
        .map_err(|e| classify_io_error(e, "Failed to sync data directory"))
}

/// Directory handles cannot be synced on this platform.
#[cfg(not(unix))]
pub fn sync_dir(_dir: &Path) -> Result<(), DbError> {
    Ok(())
}

/// Computes the CRC32 checksum of `bytes`.
pub fn checksum(bytes: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(bytes);
    hasher.finalize()
}
