//! Systematic Reed-Solomon(n, k) codec, applied column-wise across shards.

use reed_solomon_erasure::galois_8::ReedSolomon;

use crate::error::{FecError, Result};

/// Metrics returned by [`encode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeMetrics {
    /// Total shard count (`n`).
    pub n: usize,
    /// Data shard count (`k`).
    pub k: usize,
    /// Length of the input payload in bytes.
    pub input_bytes: usize,
    /// Shard length in bytes (`L`).
    pub shard_len: usize,
}

/// Metrics returned by [`decode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeMetrics {
    /// Total number of erasures repaired, summed over all columns.
    pub corrected: u64,
    /// Total shard count (`n`).
    pub n: usize,
    /// Data shard count (`k`).
    pub k: usize,
}

fn validate_params(n: usize, k: usize) -> Result<()> {
    if !(n > k && k > 0) {
        return Err(FecError::InputMalformed(format!(
            "invalid RS parameters: n={n} k={k}, require n > k > 0"
        )));
    }
    Ok(())
}

/// Split `data` into `k` equal-length shards and append `n - k` parity
/// shards computed column-wise, per the systematic RS(n,k) code.
pub fn encode(data: &[u8], n: usize, k: usize) -> Result<(Vec<Vec<u8>>, EncodeMetrics)> {
    validate_params(n, k)?;

    let shard_len = std::cmp::max(1, data.len().div_ceil(k));
    let mut shards = vec![vec![0u8; shard_len]; n];

    for (i, &byte) in data.iter().enumerate() {
        shards[i % k][i / k] = byte;
    }

    let rs = ReedSolomon::new(k, n - k)
        .map_err(|e| FecError::InputMalformed(format!("failed to construct RS({n},{k}): {e}")))?;

    rs.encode(&mut shards)
        .map_err(|e| FecError::InputMalformed(format!("RS encode failed: {e}")))?;

    let metrics = EncodeMetrics {
        n,
        k,
        input_bytes: data.len(),
        shard_len,
    };

    Ok((shards, metrics))
}

/// Reconstruct the original data from `n` optional shards, of which at most
/// `n - k` may be missing (`None`).
///
/// `expected_len`, when supplied, truncates the output to that exact
/// length; otherwise trailing `0x00` bytes are stripped (lossy for payloads
/// that legitimately end in zero bytes).
pub fn decode(
    shards: Vec<Option<Vec<u8>>>,
    n: usize,
    k: usize,
    expected_len: Option<usize>,
) -> Result<(Vec<u8>, DecodeMetrics)> {
    validate_params(n, k)?;

    if shards.len() != n {
        return Err(FecError::InputMalformed(format!(
            "expected {n} shards, got {}",
            shards.len()
        )));
    }

    let shard_len = shards
        .iter()
        .find_map(|s| s.as_ref().map(|v| v.len()))
        .ok_or_else(|| FecError::InputMalformed("all shards are missing".into()))?;

    if shards
        .iter()
        .any(|s| s.as_ref().is_some_and(|v| v.len() != shard_len))
    {
        return Err(FecError::InputMalformed(
            "shards have inconsistent lengths".into(),
        ));
    }

    let erasures = shards.iter().filter(|s| s.is_none()).count();
    if erasures > n - k {
        return Err(FecError::Unrecoverable(format!(
            "{erasures} erasures exceed recoverable n-k={}",
            n - k
        )));
    }

    let mut shard_opts: Vec<Option<Vec<u8>>> = shards;

    let rs = ReedSolomon::new(k, n - k)
        .map_err(|e| FecError::InputMalformed(format!("failed to construct RS({n},{k}): {e}")))?;

    rs.reconstruct(&mut shard_opts)
        .map_err(|e| FecError::Unrecoverable(format!("RS reconstruction failed: {e}")))?;

    let corrected = (erasures * shard_len) as u64;

    let mut out = vec![0u8; shard_len * k];
    for (s, shard) in shard_opts.iter().take(k).enumerate() {
        let shard = shard
            .as_ref()
            .ok_or_else(|| FecError::Unrecoverable("shard missing after reconstruct".into()))?;
        for (off, &byte) in shard.iter().enumerate() {
            out[off * k + s] = byte;
        }
    }

    if let Some(len) = expected_len {
        out.truncate(len);
    } else {
        while out.last() == Some(&0) {
            out.pop();
        }
    }

    Ok((
        out,
        DecodeMetrics {
            corrected,
            n,
            k,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_no_loss() {
        let data: Vec<u8> = (0..120u32).map(|b| b as u8).collect();
        let (shards, _) = encode(&data, 12, 8).unwrap();

        let opts: Vec<Option<Vec<u8>>> = shards.into_iter().map(Some).collect();
        let (decoded, metrics) = decode(opts, 12, 8, Some(data.len())).unwrap();

        assert_eq!(decoded, data);
        assert_eq!(metrics.corrected, 0);
    }

    #[test]
    fn recovers_up_to_n_minus_k_erasures() {
        let data: Vec<u8> = (0..120u32).map(|b| b as u8).collect();
        let (shards, _) = encode(&data, 12, 8).unwrap();

        let mut opts: Vec<Option<Vec<u8>>> = shards.into_iter().map(Some).collect();
        for idx in [1, 7, 10] {
            opts[idx] = None;
        }

        let (decoded, metrics) = decode(opts, 12, 8, Some(data.len())).unwrap();

        assert_eq!(decoded, data);
        assert!(metrics.corrected >= 3);
    }

    #[test]
    fn exceeding_erasure_budget_is_unrecoverable() {
        let data = b"example-payload";
        let (shards, _) = encode(data, 8, 4).unwrap();

        let mut opts: Vec<Option<Vec<u8>>> = shards.into_iter().map(Some).collect();
        for idx in 0..5 {
            opts[idx] = None;
        }

        let err = decode(opts, 8, 4, Some(data.len())).unwrap_err();
        assert!(matches!(err, FecError::Unrecoverable(_)));
    }

    #[test]
    fn wrong_shard_count_is_malformed() {
        let err = decode(vec![Some(vec![0u8; 4]); 5], 12, 8, None).unwrap_err();
        assert!(matches!(err, FecError::InputMalformed(_)));
    }

    #[test]
    fn all_missing_is_malformed() {
        let err = decode(vec![None; 12], 12, 8, None).unwrap_err();
        assert!(matches!(err, FecError::InputMalformed(_)));
    }

    #[test]
    fn no_expected_len_trims_trailing_zeros() {
        let data = b"abcd"; // 4 bytes over k=3 shards leaves a zero-padded tail
        let (shards, _) = encode(data, 5, 3).unwrap();
        let opts: Vec<Option<Vec<u8>>> = shards.into_iter().map(Some).collect();

        let (decoded, _) = decode(opts, 5, 3, None).unwrap();
        assert_eq!(decoded, data);
    }
}
