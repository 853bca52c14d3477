//! Persisted final-blob storage.

pub mod paths;

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

pub use paths::{final_blob_path, raw_dir};

/// Write a reassembled blob to `<data_dir>/final/<file_id>_<safe_filename>`,
/// creating the `final/` directory if needed.
pub fn persist_final_blob(
    data_dir: &Path,
    file_id: &str,
    safe_filename: &str,
    bytes: &[u8],
) -> Result<PathBuf> {
    let path = final_blob_path(data_dir, file_id, safe_filename);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, bytes)?;
    Ok(path)
}
