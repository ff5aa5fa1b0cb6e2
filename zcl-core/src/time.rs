// zcl-core/src/time.rs
// ============================================================================
// Module: ZCL Time Model
// Description: Canonical timestamp representation for evidence and ledgers.
// Purpose: Provide a deterministic, replayable time value for all records.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! The engine never reads the wall clock from inside deterministic code paths
//! (the mission prompt materializer, canonical hashing). Hosts supply
//! timestamps explicitly through this type so replays and property tests stay
//! reproducible.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Timestamp
// ============================================================================

/// Canonical timestamp used in progress ledgers and evidence records.
///
/// # Invariants
/// - Values are explicitly provided by callers; this type never samples the
///   wall clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Creates a timestamp from unix epoch milliseconds.
    #[must_use]
    pub const fn from_unix_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Returns the timestamp as unix epoch milliseconds.
    #[must_use]
    pub const fn as_unix_millis(self) -> i64 {
        self.0
    }

    /// Returns a timestamp `delta_ms` after this one (may be negative).
    #[must_use]
    pub const fn offset_millis(self, delta_ms: i64) -> Self {
        Self(self.0 + delta_ms)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "test-only assertions")]

    use super::Timestamp;

    #[test]
    fn offset_is_additive() {
        let t = Timestamp::from_unix_millis(1_000);
        assert_eq!(t.offset_millis(500).as_unix_millis(), 1_500);
        assert_eq!(t.offset_millis(-200).as_unix_millis(), 800);
    }
}
