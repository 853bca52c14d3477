//! Print the effective configuration and exit.

use anyhow::Result;

pub async fn execute() -> Result<()> {
    let defaults = imagelab_store::config::load_from_env()?;

    println!("data_dir              = {}", defaults.data_dir.display());
    println!("metrics_window_seconds = {}", defaults.metrics_window_seconds);
    println!("sse_queue_size         = {}", defaults.sse_queue_size);
    println!("max_chunk_size         = {}", defaults.max_chunk_size);
    println!("default_rs_n           = {}", defaults.default_rs_n);
    println!("default_rs_k           = {}", defaults.default_rs_k);

    Ok(())
}
