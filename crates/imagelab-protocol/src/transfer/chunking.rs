//! Chunk envelopes and the per-upload assembler.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ProtocolError;

/// Maximum payload length for a single envelope: 256 KiB.
pub const MAX_CHUNK_SIZE: usize = 256 * 1024;

/// One sequenced fragment of an upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkEnvelope {
    /// The upload this fragment belongs to.
    pub chunk_id: String,
    /// Sequence number, unique within this fragment's namespace (data or parity).
    pub sequence: u64,
    /// Fragment payload bytes.
    pub payload: Vec<u8>,
    /// Whether this is a parity (FEC) fragment rather than a data fragment.
    #[serde(default)]
    pub is_parity: bool,
    /// RS shard slot, when distinct from `sequence`.
    #[serde(default)]
    pub fec_index: Option<u64>,
    /// Expected total count of data fragments for this upload, if known.
    #[serde(default)]
    pub total_chunks: Option<u64>,
    /// Free-form metadata to be merged into the upload's meta, first-write-wins.
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
}

impl ChunkEnvelope {
    /// The slot this envelope occupies in an RS code: `fec_index` if
    /// present, else `sequence`.
    pub fn slot(&self) -> u64 {
        self.fec_index.unwrap_or(self.sequence)
    }
}

/// Slice `data` into sequential, non-parity envelopes of at most `chunk_size` bytes.
pub fn build_chunk_envelopes(chunk_id: &str, data: &[u8], chunk_size: usize) -> Vec<ChunkEnvelope> {
    assert!(chunk_size > 0, "chunk_size must be positive");

    let count = std::cmp::max(1, data.len().div_ceil(chunk_size));

    (0..count)
        .map(|seq| {
            let start = seq * chunk_size;
            let end = std::cmp::min(start + chunk_size, data.len());
            ChunkEnvelope {
                chunk_id: chunk_id.to_string(),
                sequence: seq as u64,
                payload: data[start..end].to_vec(),
                is_parity: false,
                fec_index: None,
                total_chunks: Some(count as u64),
                metadata: BTreeMap::new(),
            }
        })
        .collect()
}

/// Concatenate envelope payloads in ascending sequence order.
pub fn reassemble_from_envelopes<'a>(envelopes: impl Iterator<Item = &'a ChunkEnvelope>) -> Vec<u8> {
    let mut ordered: Vec<&ChunkEnvelope> = envelopes.collect();
    ordered.sort_by_key(|e| e.sequence);
    ordered.into_iter().flat_map(|e| e.payload.clone()).collect()
}

/// Per-upload accumulator of data and parity fragments.
///
/// Each slot stores the envelope alongside a monotonic arrival stamp so
/// that collisions on the same RS shard slot (§4.7's "last write wins")
/// can be resolved by true arrival order rather than by `sequence`, which
/// the noise engine may reorder independently of when an envelope actually
/// arrived.
#[derive(Debug, Clone)]
pub struct ChunkAssembler {
    chunk_id: String,
    data_by_seq: BTreeMap<u64, (u64, ChunkEnvelope)>,
    parity_by_seq: BTreeMap<u64, (u64, ChunkEnvelope)>,
    expected: Option<u64>,
    next_arrival: u64,
}

impl ChunkAssembler {
    /// Create an assembler bound to `chunk_id`.
    pub fn new(chunk_id: impl Into<String>) -> Self {
        Self {
            chunk_id: chunk_id.into(),
            data_by_seq: BTreeMap::new(),
            parity_by_seq: BTreeMap::new(),
            expected: None,
            next_arrival: 0,
        }
    }

    /// The upload id this assembler is bound to.
    pub fn chunk_id(&self) -> &str {
        &self.chunk_id
    }

    /// Add an envelope. Fails with `BadRequest` if `envelope.chunk_id` does
    /// not match this assembler's `chunk_id`.
    pub fn add(&mut self, envelope: ChunkEnvelope) -> Result<(), ProtocolError> {
        if envelope.chunk_id != self.chunk_id {
            return Err(ProtocolError::BadRequest(format!(
                "envelope chunk_id {} does not match assembler {}",
                envelope.chunk_id, self.chunk_id
            )));
        }

        if let Some(total) = envelope.total_chunks {
            self.expected = Some(total);
        }

        let arrival = self.next_arrival;
        self.next_arrival += 1;

        if envelope.is_parity {
            self.parity_by_seq.insert(envelope.sequence, (arrival, envelope));
        } else {
            self.data_by_seq.insert(envelope.sequence, (arrival, envelope));
        }

        Ok(())
    }

    /// The most recently observed `total_chunks`, if any.
    pub fn expected(&self) -> Option<u64> {
        self.expected
    }

    /// Data sequence numbers in `0..expected` not yet present, or `[]` if
    /// `expected` is unknown.
    pub fn missing_sequences(&self) -> Vec<u64> {
        match self.expected {
            None => Vec::new(),
            Some(expected) => (0..expected)
                .filter(|seq| !self.data_by_seq.contains_key(seq))
                .collect(),
        }
    }

    /// Whether every expected data fragment has arrived.
    pub fn has_all_data(&self) -> bool {
        match self.expected {
            None => false,
            Some(expected) => self.data_by_seq.len() as u64 >= expected,
        }
    }

    /// Data envelopes, in arbitrary order.
    pub fn data_envelopes(&self) -> impl Iterator<Item = &ChunkEnvelope> {
        self.data_by_seq.values().map(|(_, env)| env)
    }

    /// Parity envelopes, in arbitrary order.
    pub fn parity_envelopes(&self) -> impl Iterator<Item = &ChunkEnvelope> {
        self.parity_by_seq.values().map(|(_, env)| env)
    }

    /// Every data and parity envelope, oldest arrival first.
    ///
    /// Used to resolve RS shard-slot collisions by true arrival order: when
    /// two envelopes land in the same slot, the one that arrived later in
    /// this ordering is the one that should win, matching §4.7's
    /// last-write-wins policy regardless of how `sequence` compares.
    pub fn envelopes_by_arrival(&self) -> Vec<&ChunkEnvelope> {
        let mut all: Vec<(u64, &ChunkEnvelope)> = self
            .data_by_seq
            .values()
            .chain(self.parity_by_seq.values())
            .map(|(arrival, env)| (*arrival, env))
            .collect();
        all.sort_by_key(|(arrival, _)| *arrival);
        all.into_iter().map(|(_, env)| env).collect()
    }

    /// Reassemble the data fragments in sequence order.
    ///
    /// Fails with `BadRequest` if `has_all_data()` is false.
    pub fn reassemble(&self) -> Result<Vec<u8>, ProtocolError> {
        if !self.has_all_data() {
            return Err(ProtocolError::BadRequest(
                "not enough chunks to reassemble".into(),
            ));
        }
        Ok(reassemble_from_envelopes(self.data_envelopes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunking_scenario_matches_expected_count() {
        let payload = b"0123456789".repeat(64);
        let envelopes = build_chunk_envelopes("upload-1", &payload, 32);
        assert_eq!(envelopes.len(), 20);

        let mut assembler = ChunkAssembler::new("upload-1");
        for env in envelopes {
            assembler.add(env).unwrap();
        }

        assert!(assembler.missing_sequences().is_empty());
        assert_eq!(assembler.reassemble().unwrap(), payload);
    }

    #[test]
    fn missing_sequences_reports_gaps() {
        let payload = vec![0u8; 100];
        let mut envelopes = build_chunk_envelopes("u", &payload, 10);
        envelopes.remove(3);

        let mut assembler = ChunkAssembler::new("u");
        for env in envelopes {
            assembler.add(env).unwrap();
        }

        assert_eq!(assembler.missing_sequences(), vec![3]);
        assert!(!assembler.has_all_data());
    }

    #[test]
    fn data_and_parity_are_distinct_namespaces() {
        let mut assembler = ChunkAssembler::new("u");
        assembler
            .add(ChunkEnvelope {
                chunk_id: "u".into(),
                sequence: 0,
                payload: vec![1],
                is_parity: false,
                fec_index: None,
                total_chunks: Some(1),
                metadata: BTreeMap::new(),
            })
            .unwrap();
        assembler
            .add(ChunkEnvelope {
                chunk_id: "u".into(),
                sequence: 0,
                payload: vec![2],
                is_parity: true,
                fec_index: None,
                total_chunks: None,
                metadata: BTreeMap::new(),
            })
            .unwrap();

        assert_eq!(assembler.data_envelopes().count(), 1);
        assert_eq!(assembler.parity_envelopes().count(), 1);
    }

    #[test]
    fn mismatched_chunk_id_is_bad_request() {
        let mut assembler = ChunkAssembler::new("u");
        let err = assembler
            .add(ChunkEnvelope {
                chunk_id: "other".into(),
                sequence: 0,
                payload: vec![1],
                is_parity: false,
                fec_index: None,
                total_chunks: Some(1),
                metadata: BTreeMap::new(),
            })
            .unwrap_err();
        assert!(matches!(err, ProtocolError::BadRequest(_)));
    }

    #[test]
    fn reassemble_before_complete_is_bad_request() {
        let mut assembler = ChunkAssembler::new("u");
        assembler
            .add(ChunkEnvelope {
                chunk_id: "u".into(),
                sequence: 0,
                payload: vec![1],
                is_parity: false,
                fec_index: None,
                total_chunks: Some(2),
                metadata: BTreeMap::new(),
            })
            .unwrap();

        let err = assembler.reassemble().unwrap_err();
        assert!(matches!(err, ProtocolError::BadRequest(_)));
    }
}
