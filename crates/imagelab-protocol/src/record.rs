//! The upload orchestrator: `UploadRecord` and the `init`/`ingest`/`finish`/
//! `status` operations that drive it through noise, FEC, decryption,
//! decompression and the size check.

use std::collections::BTreeMap;

use imagelab_crypto::symmetric::AesGcmCipher;
use imagelab_crypto::HandshakeContext;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::compression;
use crate::error::ProtocolError;
use crate::noise::{NoiseEngine, NoiseStats};
use crate::settings::{FecMode, PipelineSettings};
use crate::transfer::{sanitize_filename, ChunkAssembler, ChunkEnvelope};

/// One append to an upload's `stage_metrics` trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageMetric {
    /// The stage name (`init`, `chunk`, `fec`, `encryption`, `compression`, `final`).
    pub stage: String,
    /// The stage's metric fields.
    pub data: BTreeMap<String, Value>,
}

/// Looks up a stored [`HandshakeContext`] by session id.
///
/// Implemented by `imagelab-store`'s handshake registry; kept as a trait
/// here so the orchestrator does not depend on the registry's storage.
pub trait SessionLookup {
    /// Resolve `session_id`, if a handshake was stored under it.
    fn get(&self, session_id: &str) -> Option<HandshakeContext>;
}

/// The outcome of a successful [`UploadRecord::finish`].
pub struct FinishOutcome {
    /// The fully reconstructed, decrypted, decompressed bytes.
    pub bytes: Vec<u8>,
    /// The sanitised filename to persist under.
    pub safe_filename: String,
}

/// A snapshot suitable for the (out-of-scope) `GET /api/status` response.
#[derive(Debug, Clone, Serialize)]
pub struct StatusSnapshot {
    /// Data sequence numbers still missing.
    pub missing: Vec<u64>,
    /// Whether `final_path` has been set.
    pub ready: bool,
    /// The full stage-metrics trail so far.
    pub stages: Vec<StageMetric>,
}

/// Per-upload state: negotiated settings, the chunk assembler, metadata,
/// the stage-metrics trail, and (once `finish` succeeds) the final path.
#[derive(Debug)]
pub struct UploadRecord {
    /// 128-bit random identifier, rendered as hex.
    pub file_id: String,
    /// Informational; sanitised only at persistence time.
    pub filename: String,
    /// Informational.
    pub mime_type: String,
    /// The negotiated pipeline settings.
    pub pipeline: PipelineSettings,
    /// Required iff `pipeline.encryption.enabled`.
    pub handshake_session_id: Option<String>,
    /// The chunk/parity accumulator.
    pub assembler: ChunkAssembler,
    /// First-writer-wins metadata merged in from envelopes.
    pub meta: BTreeMap<String, Value>,
    /// Ordered trail of per-stage metrics.
    pub stage_metrics: Vec<StageMetric>,
    /// Set exactly once, after `finish` succeeds and the blob is persisted.
    pub final_path: Option<String>,
    /// Informational wall-clock creation instant (unix seconds).
    pub created_at: i64,
}

impl UploadRecord {
    /// Allocate a new upload record. Fails with `BadRequest` if encryption
    /// is enabled but no session id is supplied, or if the FEC parameters
    /// are invalid.
    pub fn init(
        file_id: String,
        filename: String,
        mime_type: String,
        pipeline: PipelineSettings,
        handshake_session_id: Option<String>,
        created_at: i64,
    ) -> Result<Self, ProtocolError> {
        pipeline.fec.validate()?;

        if pipeline.encryption.enabled && handshake_session_id.is_none() {
            return Err(ProtocolError::BadRequest(
                "encryption enabled but no session_id supplied".into(),
            ));
        }

        let mut data = BTreeMap::new();
        data.insert("file_id".to_string(), Value::String(file_id.clone()));

        let record = Self {
            assembler: ChunkAssembler::new(file_id.clone()),
            file_id,
            filename,
            mime_type,
            pipeline,
            handshake_session_id,
            meta: BTreeMap::new(),
            stage_metrics: vec![StageMetric {
                stage: "init".to_string(),
                data,
            }],
            final_path: None,
            created_at,
        };
        debug!(file_id = %record.file_id, stage = "init", "upload initialised");
        Ok(record)
    }

    /// Ingest one chunk (or, with `force_parity`, one parity fragment)
    /// through the noise emulator, merging its metadata first-writer-wins
    /// and adding it to the assembler.
    ///
    /// Fails with `BadRequest` if an emitted envelope's `chunk_id` does not
    /// match this record's `file_id`.
    pub fn ingest(
        &mut self,
        mut envelope: ChunkEnvelope,
        force_parity: bool,
        noise: &mut NoiseEngine,
    ) -> Result<NoiseStats, ProtocolError> {
        if force_parity {
            envelope.is_parity = true;
        }

        let (emitted, stats) = noise.apply(std::slice::from_ref(&envelope));

        for env in emitted {
            for (key, value) in &env.metadata {
                self.meta.entry(key.clone()).or_insert_with(|| value.clone());
            }
            self.assembler.add(env)?;
        }

        let mut data = BTreeMap::new();
        data.insert("input".to_string(), stats.input.into());
        data.insert("output".to_string(), stats.output.into());
        data.insert("loss".to_string(), stats.loss.into());
        data.insert("bit_flips".to_string(), stats.bit_flips.into());
        data.insert("duplicate".to_string(), stats.duplicate.into());
        data.insert("reordered".to_string(), stats.reordered.into());
        self.stage_metrics.push(StageMetric {
            stage: "chunk".to_string(),
            data,
        });
        debug!(
            file_id = %self.file_id,
            stage = "chunk",
            loss = stats.loss,
            bit_flips = stats.bit_flips,
            duplicate = stats.duplicate,
            reordered = stats.reordered,
            "chunk ingested"
        );

        Ok(stats)
    }

    fn collect_shards(&self) -> Result<Vec<Option<Vec<u8>>>, ProtocolError> {
        match self.pipeline.fec.mode {
            FecMode::Rs => {
                let n = self.pipeline.fec.n;
                let mut slots: Vec<Option<Vec<u8>>> = vec![None; n];

                // Oldest arrival first, so a later arrival at the same slot
                // overwrites an earlier one below.
                for env in self.assembler.envelopes_by_arrival() {
                    let idx = env.slot() as usize;
                    if idx < n {
                        slots[idx] = Some(env.payload.clone());
                    }
                }

                if slots.iter().all(Option::is_none) {
                    return Err(ProtocolError::BadRequest(
                        "no shards collected at finish".into(),
                    ));
                }

                Ok(slots)
            }
            FecMode::Off | FecMode::Hamming => {
                let mut data: Vec<&ChunkEnvelope> = self.assembler.data_envelopes().collect();
                data.sort_by_key(|e| e.sequence);

                if data.is_empty() {
                    return Err(ProtocolError::BadRequest(
                        "no shards collected at finish".into(),
                    ));
                }

                let payload: Vec<u8> = data.into_iter().flat_map(|e| e.payload.clone()).collect();
                Ok(vec![Some(payload)])
            }
        }
    }

    fn fec_decode(&mut self, shards: Vec<Option<Vec<u8>>>) -> Result<Vec<u8>, ProtocolError> {
        let (decoded, metrics): (Vec<u8>, BTreeMap<String, Value>) = match self.pipeline.fec.mode {
            FecMode::Off => {
                let bytes = shards.into_iter().next().flatten().unwrap_or_default();
                let mut m = BTreeMap::new();
                m.insert("mode".to_string(), Value::String("off".to_string()));
                (bytes, m)
            }
            FecMode::Hamming => {
                let bytes = shards.into_iter().next().flatten().unwrap_or_default();
                let (decoded, metrics) = imagelab_fec::hamming::decode(&bytes)?;
                let mut m = BTreeMap::new();
                m.insert("mode".to_string(), Value::String("hamming".to_string()));
                m.insert("corrected".to_string(), metrics.corrected.into());
                m.insert("double_error".to_string(), metrics.double_error.into());
                (decoded, m)
            }
            FecMode::Rs => {
                let n = self.pipeline.fec.n;
                let k = self.pipeline.fec.k;
                let (decoded, metrics) = imagelab_fec::reed_solomon::decode(shards, n, k, None)?;
                let mut m = BTreeMap::new();
                m.insert("mode".to_string(), Value::String("rs".to_string()));
                m.insert("corrected".to_string(), metrics.corrected.into());
                m.insert("n".to_string(), (metrics.n as u64).into());
                m.insert("k".to_string(), (metrics.k as u64).into());
                (decoded, m)
            }
        };

        debug!(file_id = %self.file_id, stage = "fec", mode = ?self.pipeline.fec.mode, output_bytes = decoded.len(), "fec decoded");
        self.stage_metrics.push(StageMetric {
            stage: "fec".to_string(),
            data: metrics,
        });

        Ok(decoded)
    }

    fn decrypt(
        &mut self,
        bytes: Vec<u8>,
        lookup: &dyn SessionLookup,
    ) -> Result<Vec<u8>, ProtocolError> {
        if !self.pipeline.encryption.enabled {
            let mut m = BTreeMap::new();
            m.insert("enabled".to_string(), Value::Bool(false));
            self.stage_metrics.push(StageMetric {
                stage: "encryption".to_string(),
                data: m,
            });
            return Ok(bytes);
        }

        let session_id = self
            .handshake_session_id
            .clone()
            .or_else(|| self.pipeline.encryption.session_id.clone())
            .ok_or_else(|| {
                ProtocolError::CryptoSessionMissing(
                    "encryption enabled but no session id resolvable".into(),
                )
            })?;

        let ctx = lookup.get(&session_id).ok_or_else(|| {
            ProtocolError::CryptoSessionNotFound(format!("unknown session {session_id}"))
        })?;

        let cipher = AesGcmCipher::new(ctx.aes_key.clone(), ctx.nonce_base)?;
        let input_bytes = bytes.len();
        let plaintext = cipher.decrypt(0, &bytes, b"").inspect_err(|_| {
            warn!(file_id = %self.file_id, stage = "encryption", %session_id, "decryption failed");
        })?;

        let mut m = BTreeMap::new();
        m.insert("enabled".to_string(), Value::Bool(true));
        m.insert("input_bytes".to_string(), (input_bytes as u64).into());
        m.insert(
            "output_bytes".to_string(),
            (plaintext.len() as u64).into(),
        );
        m.insert("session_id".to_string(), Value::String(session_id));
        self.stage_metrics.push(StageMetric {
            stage: "encryption".to_string(),
            data: m,
        });

        Ok(plaintext)
    }

    fn decompress(&mut self, bytes: Vec<u8>) -> Result<Vec<u8>, ProtocolError> {
        let algorithm = self.pipeline.compression.algorithm()?;
        let enabled = self.pipeline.compression.enabled;
        let input_bytes = bytes.len();

        let output = compression::decompress(&bytes, enabled, algorithm)?;
        debug!(
            file_id = %self.file_id,
            stage = "compression",
            algorithm = algorithm.as_str(),
            input_bytes,
            output_bytes = output.len(),
            "decompressed"
        );

        let mut m = BTreeMap::new();
        m.insert("enabled".to_string(), Value::Bool(enabled));
        m.insert(
            "algorithm".to_string(),
            Value::String(algorithm.as_str().to_string()),
        );
        m.insert("input_bytes".to_string(), (input_bytes as u64).into());
        m.insert("output_bytes".to_string(), (output.len() as u64).into());
        self.stage_metrics.push(StageMetric {
            stage: "compression".to_string(),
            data: m,
        });

        Ok(output)
    }

    fn check_size(&self, bytes: &[u8]) -> Result<(), ProtocolError> {
        let Some(expected) = self.meta.get("original_size").and_then(Value::as_u64) else {
            return Ok(());
        };

        if bytes.len() as u64 != expected {
            warn!(
                file_id = %self.file_id,
                stage = "final",
                actual = bytes.len(),
                expected,
                "size mismatch after reassembly"
            );
            return Err(ProtocolError::SizeMismatch(format!(
                "reassembled {} bytes, expected {expected}; try lowering channel noise or enabling FEC",
                bytes.len()
            )));
        }

        Ok(())
    }

    /// Run the full `finish` sequence: shard collection, FEC decode,
    /// decrypt, decompress, size check. Does not write to disk; the
    /// caller persists `FinishOutcome::bytes` and sets `final_path`.
    pub fn finish(&mut self, lookup: &dyn SessionLookup) -> Result<FinishOutcome, ProtocolError> {
        let shards = self.collect_shards()?;
        let fec_decoded = self.fec_decode(shards)?;
        let decrypted = self.decrypt(fec_decoded, lookup)?;
        let decompressed = self.decompress(decrypted)?;
        self.check_size(&decompressed)?;

        let safe_filename = sanitize_filename(&self.filename);

        let mut m = BTreeMap::new();
        m.insert(
            "size_bytes".to_string(),
            (decompressed.len() as u64).into(),
        );
        if let Some(expected) = self.meta.get("original_size").and_then(Value::as_u64) {
            m.insert("expected_size_bytes".to_string(), expected.into());
            m.insert(
                "matches_expected_size".to_string(),
                Value::Bool(decompressed.len() as u64 == expected),
            );
        } else {
            m.insert("expected_size_bytes".to_string(), Value::Null);
        }
        self.stage_metrics.push(StageMetric {
            stage: "final".to_string(),
            data: m,
        });
        debug!(file_id = %self.file_id, stage = "final", size_bytes = decompressed.len(), "upload finished");

        Ok(FinishOutcome {
            bytes: decompressed,
            safe_filename,
        })
    }

    /// Record where the reassembled blob was persisted. Called by the
    /// storage layer once it has written `FinishOutcome::bytes` to disk.
    pub fn set_final_path(&mut self, path: String) {
        self.final_path = Some(path);
    }

    /// A snapshot for the (out-of-scope) status endpoint.
    pub fn status(&self) -> StatusSnapshot {
        StatusSnapshot {
            missing: self.assembler.missing_sequences(),
            ready: self.final_path.is_some(),
            stages: self.stage_metrics.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{CompressionSettings, EncryptionSettings, FecSettings};
    use crate::transfer::build_chunk_envelopes;

    fn settings() -> PipelineSettings {
        PipelineSettings {
            compression: CompressionSettings {
                enabled: false,
                level: 6,
                algorithm: "deflate".to_string(),
            },
            encryption: EncryptionSettings::default(),
            fec: FecSettings {
                mode: FecMode::Off,
                n: 120,
                k: 100,
            },
        }
    }

    struct NoSessions;
    impl SessionLookup for NoSessions {
        fn get(&self, _session_id: &str) -> Option<HandshakeContext> {
            None
        }
    }

    #[test]
    fn happy_path_without_fec_or_crypto() {
        let mut record = UploadRecord::init(
            "file-1".into(),
            "photo.png".into(),
            "image/png".into(),
            settings(),
            None,
            0,
        )
        .unwrap();

        let payload = b"hello imagelab".to_vec();
        let mut noise = NoiseEngine::from_seed(1);
        for env in build_chunk_envelopes("file-1", &payload, 4) {
            record.ingest(env, false, &mut noise).unwrap();
        }

        assert!(record.assembler.missing_sequences().is_empty());

        let outcome = record.finish(&NoSessions).unwrap();
        assert_eq!(outcome.bytes, payload);
        assert_eq!(outcome.safe_filename, "photo.png");
    }

    #[test]
    fn missing_session_id_for_encryption_is_bad_request() {
        let mut settings = settings();
        settings.encryption.enabled = true;

        let err = UploadRecord::init(
            "file-2".into(),
            "a.bin".into(),
            "application/octet-stream".into(),
            settings,
            None,
            0,
        )
        .unwrap_err();

        assert!(matches!(err, ProtocolError::BadRequest(_)));
    }

    #[test]
    fn finish_with_no_shards_is_bad_request() {
        let mut record = UploadRecord::init(
            "file-3".into(),
            "a.bin".into(),
            "application/octet-stream".into(),
            settings(),
            None,
            0,
        )
        .unwrap();

        let err = record.finish(&NoSessions).unwrap_err();
        assert!(matches!(err, ProtocolError::BadRequest(_)));
    }

    #[test]
    fn size_mismatch_is_reported() {
        let mut record = UploadRecord::init(
            "file-4".into(),
            "a.bin".into(),
            "application/octet-stream".into(),
            settings(),
            None,
            0,
        )
        .unwrap();

        let mut noise = NoiseEngine::from_seed(2);
        let mut env = build_chunk_envelopes("file-4", b"abcd", 4).remove(0);
        env.metadata
            .insert("original_size".to_string(), Value::from(999));
        record.ingest(env, false, &mut noise).unwrap();

        let err = record.finish(&NoSessions).unwrap_err();
        assert!(matches!(err, ProtocolError::SizeMismatch(_)));
    }

    #[test]
    fn mismatched_envelope_chunk_id_is_bad_request_not_a_panic() {
        let mut record = UploadRecord::init(
            "file-5".into(),
            "a.bin".into(),
            "application/octet-stream".into(),
            settings(),
            None,
            0,
        )
        .unwrap();

        let mut noise = NoiseEngine::from_seed(3);
        let foreign = build_chunk_envelopes("some-other-upload", b"abcd", 4).remove(0);

        let err = record.ingest(foreign, false, &mut noise).unwrap_err();
        assert!(matches!(err, ProtocolError::BadRequest(_)));
    }

    #[test]
    fn rs_slot_collision_resolves_by_arrival_not_sequence() {
        let mut rs_settings = settings();
        rs_settings.fec.mode = FecMode::Rs;
        rs_settings.fec.n = 2;
        rs_settings.fec.k = 1;

        let mut record =
            UploadRecord::init("file-6".into(), "a.bin".into(), "application/octet-stream".into(), rs_settings, None, 0)
                .unwrap();
        let mut noise = NoiseEngine::from_seed(4);

        // Two envelopes claim the same RS slot (fec_index 0): one with a
        // higher sequence number arrives first, then one with a lower
        // sequence number arrives second. Arrival order, not sequence
        // order, must decide which payload wins the slot.
        let mut first = build_chunk_envelopes("file-6", b"AAAA", 4).remove(0);
        first.sequence = 5;
        first.fec_index = Some(0);

        let mut second = build_chunk_envelopes("file-6", b"BBBB", 4).remove(0);
        second.sequence = 1;
        second.fec_index = Some(0);

        record.ingest(first, false, &mut noise).unwrap();
        record.ingest(second, false, &mut noise).unwrap();

        let shards = record.collect_shards().unwrap();
        assert_eq!(shards[0].as_deref(), Some(&b"BBBB"[..]));
    }
}
