//! Drives one file through the full pipeline: compress, encrypt, FEC-encode
//! and chunk it as a sending client would, pass the chunks through
//! simulated noise, then reassemble, decrypt, decompress and persist it as
//! the receiver would.
//!
//! This is the harness's entire reason for existing: `imagelab-protocol`'s
//! `UploadRecord` only ever sees the *receive* side of the pipeline, so
//! something has to play the sender to produce input for it.

use std::fs;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use imagelab_crypto::kem::x25519::{X25519KeyPair, X25519PublicKey};
use imagelab_crypto::symmetric::AesGcmCipher;
use imagelab_crypto::{HandshakeContext, HELLO_INFO};
use imagelab_fec::{hamming, reed_solomon};
use imagelab_protocol::compression::{self, CompressionAlgorithm};
use imagelab_protocol::events::{EventKind, EventPublisher};
use imagelab_protocol::ids::generate_id;
use imagelab_protocol::noise::{NoiseConfig, NoiseEngine};
use imagelab_protocol::settings::{CompressionSettings, EncryptionSettings, FecMode, FecSettings, PipelineSettings};
use imagelab_protocol::transfer::{build_chunk_envelopes, ChunkEnvelope};
use imagelab_protocol::UploadRecord;
use imagelab_store::{HandshakeRegistry, UploadRegistry};

use crate::cli::{DemoArgs, FecModeArg};
use crate::events::TracingEventPublisher;

fn now_unix() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// Build the sender-side encoding of `original`: compress, (optionally)
/// encrypt, FEC-encode, then slice into chunk envelopes.
///
/// Returns the envelopes, the negotiated [`PipelineSettings`], and (when
/// encryption is enabled) the session id the receiver must resolve to find
/// the matching [`HandshakeContext`].
#[allow(clippy::too_many_arguments)]
fn encode_for_transit(
    file_id: &str,
    original: &[u8],
    args: &DemoArgs,
    rs_n: usize,
    rs_k: usize,
    chunk_size: usize,
    handshakes: &HandshakeRegistry,
    publisher: &dyn EventPublisher,
) -> Result<(Vec<ChunkEnvelope>, PipelineSettings, Option<String>)> {
    let compression_enabled = args.compress != "none";
    let algorithm_str = if compression_enabled {
        args.compress.clone()
    } else {
        "deflate".to_string()
    };
    let algorithm = CompressionAlgorithm::parse(&algorithm_str)
        .context("unsupported --compress algorithm")?;

    let (compressed, metrics) = compression::compress(original, compression_enabled, algorithm, args.level)?;
    tracing::debug!(
        enabled = metrics.enabled,
        algorithm = %metrics.algorithm,
        input_bytes = metrics.input_bytes,
        output_bytes = metrics.output_bytes,
        ratio = metrics.ratio,
        "client: compressed payload"
    );

    let (encrypted, session_id) = if args.encrypt {
        let client = X25519KeyPair::generate();
        let session_id = generate_id();

        let ctx = HandshakeContext::new(session_id.clone(), *client.public_key(), now_unix())?;
        let server_public = X25519PublicKey::from(ctx.server_public_key);
        let shared = client.diffie_hellman(&server_public);

        // nonce_base is not HKDF output: the server draws it independently
        // and hands it to the client over the wire in the handshake
        // response, the same way it would carry `salt`/`server_public_key`.
        let client_aes_key = imagelab_crypto::kdf::derive(&ctx.salt, &shared.0, HELLO_INFO, 32)?;

        debug_assert_eq!(client_aes_key, ctx.aes_key, "client and server must derive the same key");

        let cipher = AesGcmCipher::new(client_aes_key, ctx.nonce_base)?;
        let ciphertext = cipher.encrypt(0, &compressed, b"")?;

        publisher.publish(
            EventKind::Handshake,
            serde_json::json!({"session_id": session_id, "file_id": file_id}),
        );
        handshakes.store(ctx);

        (ciphertext, Some(session_id))
    } else {
        (compressed, None)
    };

    let fec_mode = match args.fec {
        FecModeArg::Off => FecMode::Off,
        FecModeArg::Hamming => FecMode::Hamming,
        FecModeArg::Rs => FecMode::Rs,
    };

    let mut envelopes = match fec_mode {
        FecMode::Off => build_chunk_envelopes(file_id, &encrypted, chunk_size),
        FecMode::Hamming => {
            let encoded = hamming::encode(&encrypted);
            build_chunk_envelopes(file_id, &encoded, chunk_size)
        }
        FecMode::Rs => {
            let (shards, metrics) = reed_solomon::encode(&encrypted, rs_n, rs_k)?;
            tracing::debug!(n = metrics.n, k = metrics.k, shard_len = metrics.shard_len, "client: RS-encoded payload");
            shards
                .into_iter()
                .enumerate()
                .map(|(idx, payload)| ChunkEnvelope {
                    chunk_id: file_id.to_string(),
                    sequence: idx as u64,
                    payload,
                    is_parity: idx >= rs_k,
                    fec_index: Some(idx as u64),
                    total_chunks: if idx < rs_k { Some(rs_k as u64) } else { None },
                    metadata: Default::default(),
                })
                .collect()
        }
    };

    if let Some(first) = envelopes.first_mut() {
        first.metadata.insert(
            "original_size".to_string(),
            serde_json::Value::from(original.len() as u64),
        );
    }

    let pipeline = PipelineSettings {
        compression: CompressionSettings {
            enabled: compression_enabled,
            level: args.level,
            algorithm: algorithm_str,
        },
        encryption: EncryptionSettings {
            enabled: args.encrypt,
            session_id: session_id.clone(),
        },
        fec: FecSettings {
            mode: fec_mode,
            n: rs_n,
            k: rs_k,
        },
    };

    Ok((envelopes, pipeline, session_id))
}

pub async fn execute(args: DemoArgs) -> Result<()> {
    let defaults = imagelab_store::config::load_from_env()?;
    let publisher = TracingEventPublisher;

    let original = fs::read(&args.input)
        .with_context(|| format!("reading input file {}", args.input.display()))?;

    let rs_n = args.rs_n.unwrap_or(defaults.default_rs_n);
    let rs_k = args.rs_k.unwrap_or(defaults.default_rs_k);
    let chunk_size = args.chunk_size.unwrap_or(defaults.max_chunk_size);
    anyhow::ensure!(chunk_size > 0, "--chunk-size must be positive");

    let handshakes = HandshakeRegistry::new();
    let uploads = UploadRegistry::new();

    let file_id = generate_id();
    let filename = args
        .input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload.bin".to_string());

    let (envelopes, pipeline, session_id) = encode_for_transit(
        &file_id,
        &original,
        &args,
        rs_n,
        rs_k,
        chunk_size,
        &handshakes,
        &publisher,
    )?;

    let record = UploadRecord::init(
        file_id.clone(),
        filename.clone(),
        "application/octet-stream".to_string(),
        pipeline,
        session_id,
        now_unix(),
    )?;
    uploads.insert(record);
    publisher.publish(
        EventKind::UploadInit,
        serde_json::json!({"file_id": file_id, "filename": filename}),
    );

    let mut noise = match args.seed {
        Some(seed) => NoiseEngine::from_seed(seed),
        None => NoiseEngine::new(),
    };
    noise.configure(NoiseConfig {
        loss: args.loss,
        ber: args.ber,
        duplicate: args.duplicate,
        reorder: args.reorder,
    });
    publisher.publish(EventKind::NoiseConfig, serde_json::json!(noise.current_config()));

    for envelope in envelopes {
        let is_parity = envelope.is_parity;
        let stats = uploads.ingest(&file_id, envelope, is_parity, &mut noise)?;
        publisher.publish(EventKind::Chunk, serde_json::json!(stats));
    }

    let status = uploads.status(&file_id)?;
    publisher.publish(EventKind::UploadProgress, serde_json::json!(status));
    if !status.missing.is_empty() {
        tracing::debug!(missing = ?status.missing, "some data sequences never arrived; FEC may still recover them");
    }

    let summary = uploads.finish_and_persist(&file_id, &handshakes, &defaults.data_dir)?;
    publisher.publish(EventKind::ImageReady, serde_json::json!(summary));

    println!("{}", serde_json::to_string_pretty(&summary)?);

    let final_status = uploads.status(&file_id)?;
    publisher.publish(EventKind::StageMetrics, serde_json::json!(final_status.stages));
    println!("{}", serde_json::to_string_pretty(&final_status)?);

    Ok(())
}
