// zcl-core/src/hashing.rs
// ============================================================================
// Module: ZCL Canonical Hashing
// Description: RFC 8785 JSON canonicalization and content hashing utilities.
// Purpose: Provide deterministic hashes for comparability keys, prompt ids,
//          and evidence digests.
// Dependencies: serde, serde_jcs, sha2
// ============================================================================

//! ## Overview
//! All hashes that gate comparability (campaign.run.state.json's
//! `comparabilityKey`, the mission prompt materializer's `id`) are computed
//! over RFC 8785 canonical JSON so two logically-identical values always hash
//! identically regardless of field insertion order.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use sha2::Digest;
use sha2::Sha256;
use thiserror::Error;

// ============================================================================
// SECTION: Hash Algorithm
// ============================================================================

/// Supported hash algorithms for ZCL artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HashAlgorithm {
    /// SHA-256 hashing (the only supported algorithm today).
    Sha256,
}

/// Default hash algorithm used across the engine.
pub const DEFAULT_HASH_ALGORITHM: HashAlgorithm = HashAlgorithm::Sha256;

// ============================================================================
// SECTION: Hash Digest
// ============================================================================

/// Deterministic content hash representation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashDigest {
    /// Hash algorithm identifier.
    pub algorithm: HashAlgorithm,
    /// Lowercase hex-encoded digest bytes.
    pub value: String,
}

impl HashDigest {
    /// Creates a new digest from raw bytes.
    #[must_use]
    pub fn new(algorithm: HashAlgorithm, bytes: &[u8]) -> Self {
        Self {
            algorithm,
            value: hex_encode(bytes),
        }
    }

    /// Returns the first 8 bytes of the digest as a big-endian `u64`.
    ///
    /// Used by the mission prompt materializer to derive a deterministic
    /// `createdAt` value from input content rather than the wall clock.
    #[must_use]
    pub fn leading_u64(&self) -> u64 {
        let mut buf = [0_u8; 8];
        for (index, byte) in buf.iter_mut().enumerate() {
            let hex_pair = self.value.get(index * 2..index * 2 + 2);
            *byte = hex_pair.and_then(|pair| u8::from_str_radix(pair, 16).ok()).unwrap_or(0);
        }
        u64::from_be_bytes(buf)
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised when computing canonical hashes.
#[derive(Debug, Error)]
pub enum HashError {
    /// JSON canonicalization failed.
    #[error("failed to canonicalize json: {0}")]
    Canonicalization(String),
}

// ============================================================================
// SECTION: Hashing Helpers
// ============================================================================

/// Returns canonical JSON bytes for a serializable value using RFC 8785.
///
/// # Errors
///
/// Returns [`HashError::Canonicalization`] when serialization fails.
pub fn canonical_json_bytes<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, HashError> {
    serde_jcs::to_vec(value).map_err(|err| HashError::Canonicalization(err.to_string()))
}

/// Returns the canonical JSON text for a serializable value using RFC 8785.
///
/// # Errors
///
/// Returns [`HashError::Canonicalization`] when serialization fails.
pub fn canonical_json_string<T: Serialize + ?Sized>(value: &T) -> Result<String, HashError> {
    let bytes = canonical_json_bytes(value)?;
    String::from_utf8(bytes).map_err(|err| HashError::Canonicalization(err.to_string()))
}

/// Hashes canonical JSON using the provided algorithm.
///
/// # Errors
///
/// Returns [`HashError::Canonicalization`] when serialization fails.
pub fn hash_canonical_json<T: Serialize + ?Sized>(
    algorithm: HashAlgorithm,
    value: &T,
) -> Result<HashDigest, HashError> {
    let bytes = canonical_json_bytes(value)?;
    Ok(hash_bytes(algorithm, &bytes))
}

/// Hashes raw bytes using the provided algorithm.
#[must_use]
pub fn hash_bytes(algorithm: HashAlgorithm, bytes: &[u8]) -> HashDigest {
    match algorithm {
        HashAlgorithm::Sha256 => {
            let mut hasher = Sha256::new();
            hasher.update(bytes);
            let digest = hasher.finalize();
            HashDigest::new(HashAlgorithm::Sha256, &digest)
        }
    }
}

// ============================================================================
// SECTION: Hex Encoding
// ============================================================================

/// Encodes bytes as a lowercase hex string.
fn hex_encode(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push(HEX[(byte >> 4) as usize] as char);
        out.push(HEX[(byte & 0x0f) as usize] as char);
    }
    out
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "test-only assertions")]

    use serde_json::json;

    use super::DEFAULT_HASH_ALGORITHM;
    use super::hash_canonical_json;

    #[test]
    fn key_order_does_not_affect_hash() {
        let a = json!({"b": 1, "a": 2});
        let b = json!({"a": 2, "b": 1});
        let hash_a = hash_canonical_json(DEFAULT_HASH_ALGORITHM, &a).unwrap();
        let hash_b = hash_canonical_json(DEFAULT_HASH_ALGORITHM, &b).unwrap();
        assert_eq!(hash_a, hash_b);
    }

    #[test]
    fn different_values_hash_differently() {
        let a = hash_canonical_json(DEFAULT_HASH_ALGORITHM, &json!({"a": 1})).unwrap();
        let b = hash_canonical_json(DEFAULT_HASH_ALGORITHM, &json!({"a": 2})).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn leading_u64_is_deterministic() {
        let digest = hash_canonical_json(DEFAULT_HASH_ALGORITHM, &json!({"x": 1})).unwrap();
        assert_eq!(digest.leading_u64(), digest.leading_u64());
    }
}
