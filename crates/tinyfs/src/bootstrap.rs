//! Storage directory preparation.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

/// Makes sure `path` is a usable storage root and returns its absolute form.
///
/// A missing directory (including missing parents) is created. An existing
/// path that is not a directory is rejected.
pub fn prepare_storage(path: &Path) -> Result<PathBuf> {
    match fs::metadata(path) {
        Ok(metadata) if metadata.is_dir() => {}
        Ok(_) => bail!("Storage path is not a directory: {}", path.display()),
        Err(_) => {
            fs::create_dir_all(path).with_context(|| {
                format!("Failed to create storage directory: {}", path.display())
            })?;
            tracing::info!(path = %path.display(), "Created storage directory");
        }
    }

    fs::canonicalize(path)
        .with_context(|| format!("Failed to resolve storage directory: {}", path.display()))
}
