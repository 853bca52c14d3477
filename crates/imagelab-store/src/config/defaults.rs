//! Default configuration values, per spec.md §6.

use std::path::PathBuf;

use super::schema::PipelineDefaults;

impl Default for PipelineDefaults {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            metrics_window_seconds: 60,
            sse_queue_size: 100,
            max_chunk_size: 256 * 1024,
            default_rs_n: 120,
            default_rs_k: 100,
        }
    }
}
