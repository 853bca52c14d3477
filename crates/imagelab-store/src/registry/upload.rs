//! The upload registry: `file_id -> UploadRecord`, plus final-blob persistence.

use std::path::Path;

use dashmap::DashMap;
use imagelab_protocol::noise::{NoiseEngine, NoiseStats};
use imagelab_protocol::transfer::ChunkEnvelope;
use imagelab_protocol::{StatusSnapshot, UploadRecord};
use serde::Serialize;
use serde_json::Value;

use super::handshake::HandshakeRegistry;
use crate::error::{Result, StoreError};
use crate::persistence;

/// The actual persisted/reassembled byte count, read from the `final`
/// stage metric `UploadRecord::finish` records — not the client-declared,
/// optional `original_size` metadata, which may be absent or wrong.
fn persisted_size_bytes(record: &UploadRecord) -> u64 {
    record
        .stage_metrics
        .iter()
        .rev()
        .find(|m| m.stage == "final")
        .and_then(|m| m.data.get("size_bytes"))
        .and_then(Value::as_u64)
        .unwrap_or_default()
}

/// A finished, persisted upload, for the (out-of-scope) dashboard listing.
#[derive(Debug, Clone, Serialize)]
pub struct ImageSummary {
    /// The upload's id.
    pub file_id: String,
    /// Original (informational) filename.
    pub filename: String,
    /// Original (informational) MIME type.
    pub mime_type: String,
    /// Length of the persisted blob.
    pub size_bytes: u64,
    /// Where the blob was written.
    pub final_path: String,
    /// Informational creation timestamp (unix seconds).
    pub created_at: i64,
}

/// Holds one `UploadRecord` per in-flight or completed upload.
///
/// Each DashMap shard serialises access to the records it holds, giving the
/// "registry lookup under one lock, then per-record mutation serialised
/// against other operations on the same record" model directly: a
/// `get_mut` guard is held for the whole duration of the closure passed to
/// [`UploadRegistry::ingest`]/[`UploadRegistry::finish_and_persist`].
#[derive(Debug, Default)]
pub struct UploadRegistry {
    uploads: DashMap<String, UploadRecord>,
}

impl UploadRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            uploads: DashMap::new(),
        }
    }

    /// Register a freshly initialised upload.
    pub fn insert(&self, record: UploadRecord) {
        self.uploads.insert(record.file_id.clone(), record);
    }

    /// Ingest one chunk or parity fragment into the named upload.
    pub fn ingest(
        &self,
        file_id: &str,
        envelope: ChunkEnvelope,
        force_parity: bool,
        noise: &mut NoiseEngine,
    ) -> Result<NoiseStats> {
        let mut record = self
            .uploads
            .get_mut(file_id)
            .ok_or_else(|| StoreError::NotFound(file_id.to_string()))?;
        Ok(record.ingest(envelope, force_parity, noise)?)
    }

    /// A status snapshot for the named upload.
    pub fn status(&self, file_id: &str) -> Result<StatusSnapshot> {
        let record = self
            .uploads
            .get(file_id)
            .ok_or_else(|| StoreError::NotFound(file_id.to_string()))?;
        Ok(record.status())
    }

    /// Run `finish` on the named upload and persist the resulting bytes
    /// under `data_dir`, setting `final_path` on success.
    pub fn finish_and_persist(
        &self,
        file_id: &str,
        handshakes: &HandshakeRegistry,
        data_dir: &Path,
    ) -> Result<ImageSummary> {
        let mut record = self
            .uploads
            .get_mut(file_id)
            .ok_or_else(|| StoreError::NotFound(file_id.to_string()))?;

        let outcome = record.finish(handshakes)?;
        let path = persistence::persist_final_blob(
            data_dir,
            file_id,
            &outcome.safe_filename,
            &outcome.bytes,
        )?;

        record.set_final_path(path.to_string_lossy().into_owned());

        Ok(ImageSummary {
            file_id: file_id.to_string(),
            filename: record.filename.clone(),
            mime_type: record.mime_type.clone(),
            size_bytes: outcome.bytes.len() as u64,
            final_path: path.to_string_lossy().into_owned(),
            created_at: record.created_at,
        })
    }

    /// Summaries of every upload whose `final_path` is set.
    pub fn list_completed(&self) -> Vec<ImageSummary> {
        self.uploads
            .iter()
            .filter_map(|entry| {
                let record = entry.value();
                let final_path = record.final_path.clone()?;
                Some(ImageSummary {
                    file_id: record.file_id.clone(),
                    filename: record.filename.clone(),
                    mime_type: record.mime_type.clone(),
                    size_bytes: persisted_size_bytes(record),
                    final_path,
                    created_at: record.created_at,
                })
            })
            .collect()
    }

    /// A JSON dump of every in-memory upload, for ad hoc debugging.
    pub fn debug_snapshot(&self) -> Value {
        let uploads: Vec<Value> = self
            .uploads
            .iter()
            .map(|entry| {
                let record = entry.value();
                let status = record.status();
                serde_json::json!({
                    "file_id": record.file_id,
                    "filename": record.filename,
                    "mime_type": record.mime_type,
                    "missing": status.missing,
                    "ready": status.ready,
                    "stages": status.stages,
                })
            })
            .collect();

        serde_json::json!({ "uploads": uploads })
    }

    /// Number of tracked uploads (any state).
    pub fn len(&self) -> usize {
        self.uploads.len()
    }

    /// Whether the registry holds no uploads.
    pub fn is_empty(&self) -> bool {
        self.uploads.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use imagelab_protocol::settings::{CompressionSettings, EncryptionSettings, FecMode, FecSettings, PipelineSettings};
    use imagelab_protocol::transfer::build_chunk_envelopes;

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

    #[test]
    fn ingest_then_finish_and_persist_round_trips() {
        let registry = UploadRegistry::new();
        let handshakes = HandshakeRegistry::new();
        let dir = tempfile::tempdir().unwrap();

        let record =
            UploadRecord::init("file-1".into(), "a.bin".into(), "application/octet-stream".into(), settings(), None, 0)
                .unwrap();
        registry.insert(record);

        let mut noise = NoiseEngine::from_seed(1);
        for env in build_chunk_envelopes("file-1", b"payload bytes", 4) {
            registry.ingest("file-1", env, false, &mut noise).unwrap();
        }

        let summary = registry
            .finish_and_persist("file-1", &handshakes, dir.path())
            .unwrap();

        assert_eq!(summary.file_id, "file-1");
        assert!(std::path::Path::new(&summary.final_path).exists());
        assert_eq!(registry.list_completed().len(), 1);
    }

    #[test]
    fn unknown_upload_is_not_found() {
        let registry = UploadRegistry::new();
        let handshakes = HandshakeRegistry::new();
        let dir = tempfile::tempdir().unwrap();

        let err = registry
            .finish_and_persist("missing", &handshakes, dir.path())
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }
}
