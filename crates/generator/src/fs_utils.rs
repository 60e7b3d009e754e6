//! Output tree helpers.
//!
//! Every write goes through [`write_file`], which creates missing parent
//! directories and maps IO failures to [`GeneratorError::Io`] naming the path.

use crate::{GeneratorError, Result};
use std::fs;
use std::path::Path;

// =========================================================================
// File system utilities
// =========================================================================

/// Ensure a directory exists (creates all parents if needed).
pub(crate) fn ensure_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|e| GeneratorError::Io {
        path: dir.to_path_buf(),
        message: e.to_string(),
    })
}

/// Ensure the parent directory for a file path exists.
pub(crate) fn ensure_parent_dir(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) => ensure_dir(parent),
        None => Ok(()),
    }
}

/// Write a UTF-8 text file, creating parent directories if necessary.
/// Existing files are overwritten.
pub(crate) fn write_file(path: &Path, contents: &str) -> Result<()> {
    ensure_parent_dir(path)?;
    fs::write(path, contents).map_err(|e| GeneratorError::Io {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}
