//! Chunk envelopes, assembly and filename sanitisation.

pub mod chunking;
pub mod sanitize;

pub use chunking::{build_chunk_envelopes, ChunkAssembler, ChunkEnvelope};
pub use sanitize::sanitize_filename;
