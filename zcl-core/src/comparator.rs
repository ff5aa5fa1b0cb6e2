// zcl-core/src/comparator.rs
// ============================================================================
// Module: Comparability Key
// Description: Stable hash of a run's shape, used to decide result parity.
// Purpose: Implement the comparability key described in §3 DATA MODEL.
// Dependencies: crate::hashing
// ============================================================================

//! ## Overview
//! Two runs with equal comparability keys are considered comparable: their
//! mode, timeouts, isolation, finalization, runtime strategy, parallelism,
//! fail-fast policy, blind-mode setting, and shim configuration all match.
//! The key is computed over canonical JSON so field order never matters.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Serialize;

use crate::hashing::DEFAULT_HASH_ALGORITHM;
use crate::hashing::HashError;
use crate::hashing::hash_canonical_json;

// ============================================================================
// SECTION: Run Shape
// ============================================================================

/// The subset of a run's configuration that determines comparability.
///
/// Constructed by the campaign engine from the resolved spec and CLI
/// overrides before the first attempt is scheduled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunShape {
    /// Suite execution mode label.
    pub mode: String,
    /// Per-mission timeout, in milliseconds.
    pub timeout_ms: u64,
    /// Deadline-start policy.
    pub timeout_start: String,
    /// Isolation model for attempts in this run.
    pub isolation: String,
    /// Finalization mode for attempts in this run.
    pub finalization: String,
    /// Resolved native runtime strategy id, when applicable.
    pub runtime_strategy: Option<String>,
    /// Wave width (`parallel`) used to schedule missions.
    pub parallelism: u32,
    /// Whether fail-fast is enabled.
    pub fail_fast: bool,
    /// Whether blind-mode contamination scanning is enabled.
    pub blind: bool,
    /// Sorted list of configured shim names, by flow.
    pub shims: Vec<String>,
}

/// Computes the comparability key for a run shape.
///
/// # Errors
///
/// Returns [`HashError`] when the shape fails to canonicalize, which only
/// happens if it (indirectly) contains a non-finite float.
pub fn comparability_key(shape: &RunShape) -> Result<String, HashError> {
    let digest = hash_canonical_json(DEFAULT_HASH_ALGORITHM, shape)?;
    Ok(digest.value)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "test-only assertions")]

    use super::RunShape;
    use super::comparability_key;

    fn base_shape() -> RunShape {
        RunShape {
            mode: "default".to_string(),
            timeout_ms: 60_000,
            timeout_start: "attempt_start".to_string(),
            isolation: "process_runner".to_string(),
            finalization: "strict".to_string(),
            runtime_strategy: None,
            parallelism: 4,
            fail_fast: false,
            blind: false,
            shims: Vec::new(),
        }
    }

    #[test]
    fn identical_shapes_produce_identical_keys() {
        let a = comparability_key(&base_shape()).expect("hash ok");
        let b = comparability_key(&base_shape()).expect("hash ok");
        assert_eq!(a, b);
    }

    #[test]
    fn differing_timeout_changes_the_key() {
        let mut other = base_shape();
        other.timeout_ms = 120_000;
        let a = comparability_key(&base_shape()).expect("hash ok");
        let b = comparability_key(&other).expect("hash ok");
        assert_ne!(a, b);
    }

    #[test]
    fn shim_ordering_within_shape_affects_the_key() {
        let mut one = base_shape();
        one.shims = vec!["browser".to_string(), "editor".to_string()];
        let mut two = base_shape();
        two.shims = vec!["editor".to_string(), "browser".to_string()];
        let a = comparability_key(&one).expect("hash ok");
        let b = comparability_key(&two).expect("hash ok");
        assert_ne!(a, b, "callers must pre-sort shims before hashing");
    }
}
