//! Configuration schema.

use std::path::PathBuf;

/// Process-wide defaults for the upload pipeline, overridable via
/// `IMAGE_LAB_`-prefixed environment variables.
#[derive(Debug, Clone)]
pub struct PipelineDefaults {
    /// Root directory for persisted final blobs (`<data_dir>/final/...`).
    pub data_dir: PathBuf,
    /// Width of the (out-of-scope) metrics aggregator's sliding window.
    pub metrics_window_seconds: u64,
    /// Capacity of the (out-of-scope) SSE broadcast queue.
    pub sse_queue_size: usize,
    /// Upper bound on a single envelope's payload length.
    pub max_chunk_size: usize,
    /// Default total RS shard count, when a client omits `fec.n`.
    pub default_rs_n: usize,
    /// Default data RS shard count, when a client omits `fec.k`.
    pub default_rs_k: usize,
}
