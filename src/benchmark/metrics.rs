use std::time::{Duration, Instant};

use chrono::serde::ts_seconds;
use serde::{Deserialize, Serialize};

use crate::xmss::{Result, XmssError, XmssScheme};

/// Metrics collected during one benchmark run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkMetrics {
    pub tree_height: u32,
    pub winternitz_parameter: u32,
    pub tree_caching: bool,
    /// Time taken for key generation (full tree build)
    pub key_generation_time: Duration,
    /// Total time spent signing
    pub signing_time: Duration,
    /// Total time spent verifying
    pub verification_time: Duration,
    /// Number of signatures produced and verified
    pub signature_count: usize,
    /// Size of one signature's hash material in bytes
    pub signature_size_bytes: usize,
    /// Timestamp of the benchmark run
    #[serde(with = "ts_seconds")]
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl BenchmarkMetrics {
    /// Create a new metrics instance
    pub fn new(scheme: &XmssScheme, signature_count: usize) -> Self {
        Self {
            tree_height: scheme.height(),
            winternitz_parameter: scheme.winternitz().value(),
            tree_caching: scheme.config().cache_trees,
            key_generation_time: Duration::default(),
            signing_time: Duration::default(),
            verification_time: Duration::default(),
            signature_count,
            signature_size_bytes: 0,
            timestamp: chrono::Utc::now(),
        }
    }

    /// Generate one key, then sign and verify `signature_count` messages.
    ///
    /// Fails with `KeysExhausted` if the tree has fewer leaves than requested
    /// signatures; a failed verification is reported as `InvalidKeyState`.
    pub fn collect(scheme: &XmssScheme, signature_count: usize) -> Result<Self> {
        let mut metrics = Self::new(scheme, signature_count);

        let (keygen_time, pair) = Self::measure_time(|| scheme.generate_key_pair());
        let mut pair = pair?;
        metrics.key_generation_time = keygen_time;

        let messages: Vec<Vec<u8>> = (0..signature_count)
            .map(|i| format!("benchmark message {}", i).into_bytes())
            .collect();

        let mut signatures = Vec::with_capacity(signature_count);
        for message in &messages {
            let (elapsed, sig) = Self::measure_time(|| scheme.sign(&mut pair.private_key, message));
            metrics.signing_time += elapsed;
            signatures.push(sig?);
        }

        for (message, sig) in messages.iter().zip(&signatures) {
            let (elapsed, valid) =
                Self::measure_time(|| scheme.verify(&pair.public_key, message, sig));
            metrics.verification_time += elapsed;
            if !valid {
                return Err(XmssError::InvalidKeyState {
                    reason: format!("benchmark signature at leaf {} failed to verify", sig.leaf_index),
                });
            }
        }

        metrics.signature_size_bytes = signatures.first().map_or(0, |sig| {
            4 + (sig.auth_path.len() + sig.ots_signature.len() + 1) * crate::xmss::hash::HASH_LEN
        });
        Ok(metrics)
    }

    /// Mean signing time per signature
    pub fn average_sign_time(&self) -> Duration {
        average(self.signing_time, self.signature_count)
    }

    /// Mean verification time per signature
    pub fn average_verify_time(&self) -> Duration {
        average(self.verification_time, self.signature_count)
    }

    /// Measure execution time of a closure
    pub fn measure_time<F, R>(f: F) -> (Duration, R)
    where
        F: FnOnce() -> R,
    {
        let start = Instant::now();
        let result = f();
        let duration = start.elapsed();
        (duration, result)
    }
}

fn average(total: Duration, count: usize) -> Duration {
    if count == 0 {
        return Duration::ZERO;
    }
    total / count as u32
}
