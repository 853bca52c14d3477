//! Filesystem layout under `data_dir`.

use std::path::{Path, PathBuf};

/// `<data_dir>/final/<file_id>_<safe_name>` — where reassembled blobs land.
pub fn final_blob_path(data_dir: &Path, file_id: &str, safe_filename: &str) -> PathBuf {
    data_dir.join("final").join(format!("{file_id}_{safe_filename}"))
}

/// `<data_dir>/raw` — reserved, unused by the core.
pub fn raw_dir(data_dir: &Path) -> PathBuf {
    data_dir.join("raw")
}
