//! Deterministic, seedable channel noise emulator.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::transfer::ChunkEnvelope;

fn clamp01(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

/// Loss/bit-error/duplicate/reorder probabilities, each clamped to `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoiseConfig {
    /// Probability an envelope is dropped entirely.
    pub loss: f64,
    /// Per-bit probability of flipping a payload bit.
    pub ber: f64,
    /// Probability an emitted envelope is duplicated.
    pub duplicate: f64,
    /// Probability the whole output batch is shuffled.
    pub reorder: f64,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            loss: 0.0,
            ber: 0.0,
            duplicate: 0.0,
            reorder: 0.0,
        }
    }
}

impl NoiseConfig {
    /// Clamp every probability into `[0, 1]`.
    pub fn clamped(self) -> Self {
        Self {
            loss: clamp01(self.loss),
            ber: clamp01(self.ber),
            duplicate: clamp01(self.duplicate),
            reorder: clamp01(self.reorder),
        }
    }
}

/// Outcome of one [`NoiseEngine::apply`] call.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct NoiseStats {
    /// Number of envelopes fed in.
    pub input: u64,
    /// Number of envelopes emitted.
    pub output: u64,
    /// Number of envelopes dropped.
    pub loss: u64,
    /// Total number of payload bits flipped.
    pub bit_flips: u64,
    /// Number of envelopes duplicated.
    pub duplicate: u64,
    /// `1` if the output batch was shuffled, else `0`.
    pub reordered: u8,
}

/// A channel noise emulator driven by a seeded PRNG, for reproducible tests.
pub struct NoiseEngine {
    config: NoiseConfig,
    rng: ChaCha8Rng,
}

impl NoiseEngine {
    /// Build an engine seeded from OS entropy.
    pub fn new() -> Self {
        Self {
            config: NoiseConfig::default(),
            rng: ChaCha8Rng::from_entropy(),
        }
    }

    /// Build an engine with an explicit seed, for deterministic tests.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            config: NoiseConfig::default(),
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Replace the active configuration, clamping every probability.
    pub fn configure(&mut self, config: NoiseConfig) -> NoiseConfig {
        self.config = config.clamped();
        self.config
    }

    /// The active (already-clamped) configuration.
    pub fn current_config(&self) -> NoiseConfig {
        self.config
    }

    /// Apply loss, bit errors, duplication and reordering to `envelopes`.
    pub fn apply(&mut self, envelopes: &[ChunkEnvelope]) -> (Vec<ChunkEnvelope>, NoiseStats) {
        let cfg = self.config;
        let mut stats = NoiseStats::default();
        let mut processed = Vec::with_capacity(envelopes.len());

        for env in envelopes {
            stats.input += 1;

            if self.rng.gen::<f64>() < cfg.loss {
                stats.loss += 1;
                continue;
            }

            let mut payload = env.payload.clone();
            for byte in payload.iter_mut() {
                for bit in 0..8u8 {
                    if self.rng.gen::<f64>() < cfg.ber {
                        *byte ^= 1 << bit;
                        stats.bit_flips += 1;
                    }
                }
            }

            let mutated = ChunkEnvelope {
                chunk_id: env.chunk_id.clone(),
                sequence: env.sequence,
                payload,
                is_parity: env.is_parity,
                fec_index: env.fec_index,
                total_chunks: env.total_chunks,
                metadata: env.metadata.clone(),
            };

            processed.push(mutated.clone());

            if self.rng.gen::<f64>() < cfg.duplicate {
                stats.duplicate += 1;
                processed.push(mutated);
            }
        }

        if !processed.is_empty() && self.rng.gen::<f64>() < cfg.reorder {
            stats.reordered = 1;
            shuffle(&mut self.rng, &mut processed);
        }

        stats.output = processed.len() as u64;
        (processed, stats)
    }
}

impl Default for NoiseEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn shuffle(rng: &mut ChaCha8Rng, items: &mut [ChunkEnvelope]) {
    use rand::seq::SliceRandom;
    items.shuffle(rng);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn sample_envelopes(n: u64) -> Vec<ChunkEnvelope> {
        (0..n)
            .map(|seq| ChunkEnvelope {
                chunk_id: "u".into(),
                sequence: seq,
                payload: vec![0xAA; 4],
                is_parity: false,
                fec_index: None,
                total_chunks: Some(n),
                metadata: BTreeMap::new(),
            })
            .collect()
    }

    #[test]
    fn no_noise_is_identity_count() {
        let mut engine = NoiseEngine::from_seed(1);
        let envelopes = sample_envelopes(5);
        let (out, stats) = engine.apply(&envelopes);

        assert_eq!(stats.input, 5);
        assert_eq!(stats.output, 5);
        assert_eq!(out.len(), 5);
    }

    #[test]
    fn output_is_at_least_input_minus_loss() {
        let mut engine = NoiseEngine::from_seed(7);
        engine.configure(NoiseConfig {
            loss: 0.3,
            ber: 0.0,
            duplicate: 0.0,
            reorder: 0.0,
        });

        let envelopes = sample_envelopes(20);
        let (_out, stats) = engine.apply(&envelopes);

        assert!(stats.output >= stats.input - stats.loss);
    }

    #[test]
    fn same_seed_is_deterministic() {
        let config = NoiseConfig {
            loss: 0.2,
            ber: 0.0,
            duplicate: 0.5,
            reorder: 1.0,
        };
        let envelopes = sample_envelopes(5);

        let mut e1 = NoiseEngine::from_seed(1234);
        e1.configure(config);
        let (out1, stats1) = e1.apply(&envelopes);

        let mut e2 = NoiseEngine::from_seed(1234);
        e2.configure(config);
        let (out2, stats2) = e2.apply(&envelopes);

        assert_eq!(stats1.input, 5);
        assert_eq!(stats1.output, stats2.output);
        assert_eq!(stats1.loss, stats2.loss);
        assert_eq!(stats1.reordered, stats2.reordered);

        let seqs1: Vec<u64> = out1.iter().map(|e| e.sequence).collect();
        let seqs2: Vec<u64> = out2.iter().map(|e| e.sequence).collect();
        assert_eq!(seqs1, seqs2);
    }

    #[test]
    fn config_is_clamped() {
        let mut engine = NoiseEngine::from_seed(0);
        let clamped = engine.configure(NoiseConfig {
            loss: 2.0,
            ber: -1.0,
            duplicate: 0.5,
            reorder: 1.5,
        });

        assert_eq!(clamped.loss, 1.0);
        assert_eq!(clamped.ber, 0.0);
        assert_eq!(clamped.reorder, 1.0);
    }
}
