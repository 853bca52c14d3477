//! CLI argument parsing

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "imagelab-server")]
#[command(author, version, about = "Demonstration harness for the imagelab lossy-channel pipeline", long_about = None)]
pub struct Cli {
    /// Verbose output (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a file through the full pipeline: compress, encrypt, FEC-encode,
    /// chunk, pass through simulated channel noise, then reassemble and
    /// persist it, reporting every stage's metrics.
    Demo(DemoArgs),

    /// Print the effective `IMAGE_LAB_*` configuration and exit.
    Doctor,
}

#[derive(Args)]
pub struct DemoArgs {
    /// File to push through the pipeline
    pub input: PathBuf,

    /// Forward error correction mode
    #[arg(long, default_value = "off")]
    pub fec: FecModeArg,

    /// Total RS shard count (only used when --fec=rs)
    #[arg(long)]
    pub rs_n: Option<usize>,

    /// Data RS shard count (only used when --fec=rs)
    #[arg(long)]
    pub rs_k: Option<usize>,

    /// Compression algorithm, or "none" to disable compression
    #[arg(long, default_value = "deflate")]
    pub compress: String,

    /// Compression level, 0-9
    #[arg(long, default_value_t = 6)]
    pub level: i32,

    /// Encrypt the payload with a simulated X25519 + AES-GCM handshake
    #[arg(long)]
    pub encrypt: bool,

    /// Chunk size in bytes
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// Probability (0.0-1.0) a chunk is dropped in transit
    #[arg(long, default_value_t = 0.0)]
    pub loss: f64,

    /// Per-bit probability of a bit flip in transit
    #[arg(long, default_value_t = 0.0)]
    pub ber: f64,

    /// Probability a chunk is duplicated in transit
    #[arg(long, default_value_t = 0.0)]
    pub duplicate: f64,

    /// Probability the chunk batch is reordered in transit
    #[arg(long, default_value_t = 0.0)]
    pub reorder: f64,

    /// Seed the noise emulator for a reproducible run
    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum FecModeArg {
    Off,
    Hamming,
    Rs,
}
