// zcl-core/src/ids.rs
// ============================================================================
// Module: ZCL Identifiers
// Description: Canonical opaque identifiers for campaigns, flows, and runs.
// Purpose: Provide strongly typed, serializable IDs with stable string forms.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! This module defines the canonical string-based identifiers used throughout
//! the campaign engine. Identifiers are opaque and serialize as strings.
//! Construction sanitizes the raw input so malformed ids are rejected at the
//! boundary rather than propagated into the evidence trail.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Sanitization
// ============================================================================

/// Maximum length, in bytes, of a sanitized identifier.
pub const MAX_ID_LEN: usize = 128;

/// Errors raised when constructing a sanitized identifier.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdError {
    /// The identifier was empty after trimming.
    #[error("identifier must not be empty")]
    Empty,
    /// The identifier exceeded [`MAX_ID_LEN`].
    #[error("identifier exceeds {MAX_ID_LEN} bytes: {0}")]
    TooLong(String),
    /// The identifier contained a character outside `[a-zA-Z0-9_-]`.
    #[error("identifier contains an invalid character: {0}")]
    InvalidChar(String),
}

/// Validates and normalizes a raw identifier string.
///
/// # Errors
///
/// Returns [`IdError`] when the raw value is empty, too long, or contains a
/// character outside `[a-zA-Z0-9_-]`.
pub fn sanitize_id(raw: &str) -> Result<String, IdError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(IdError::Empty);
    }
    if trimmed.len() > MAX_ID_LEN {
        return Err(IdError::TooLong(trimmed.to_string()));
    }
    if !trimmed.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
        return Err(IdError::InvalidChar(trimmed.to_string()));
    }
    Ok(trimmed.to_string())
}

// ============================================================================
// SECTION: Identifier Macro
// ============================================================================

/// Declares a sanitized newtype identifier with the standard trait surface.
macro_rules! sanitized_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, sanitizing the raw input.
            ///
            /// # Errors
            ///
            /// Returns [`IdError`] when the raw value fails sanitization.
            pub fn new(raw: impl AsRef<str>) -> Result<Self, IdError> {
                Ok(Self(sanitize_id(raw.as_ref())?))
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl TryFrom<&str> for $name {
            type Error = IdError;

            fn try_from(value: &str) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl TryFrom<String> for $name {
            type Error = IdError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }
    };
}

sanitized_id!(CampaignId, "Campaign identifier scoped to the output root.");
sanitized_id!(FlowId, "Flow identifier scoped to a campaign.");
sanitized_id!(SuiteId, "Suite identifier scoped to a campaign or flow.");
sanitized_id!(MissionId, "Mission identifier scoped to a suite.");
sanitized_id!(RunId, "Run identifier formed as `<utcTimestamp>-<6hexRandom>`.");
sanitized_id!(AttemptId, "Attempt identifier unique per (run, flow, mission, retry).");
sanitized_id!(AgentId, "Agent identifier for the runner under evaluation.");

// ============================================================================
// SECTION: Non-Sanitized Indices
// ============================================================================

/// Zero-based mission position within a resolved suite.
///
/// # Invariants
/// - Immutable once assigned during mission-window resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MissionIndex(pub u32);

impl fmt::Display for MissionIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Monotonic retry counter within `(runId, missionId)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RetryIndex(pub u32);

impl fmt::Display for RetryIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "test-only assertions")]

    use super::CampaignId;
    use super::IdError;
    use super::sanitize_id;

    #[test]
    fn accepts_alnum_dash_underscore() {
        assert_eq!(sanitize_id("cmp-int_01").unwrap(), "cmp-int_01");
    }

    #[test]
    fn rejects_empty() {
        assert_eq!(sanitize_id("   ").unwrap_err(), IdError::Empty);
    }

    #[test]
    fn rejects_path_separator() {
        assert!(matches!(sanitize_id("../etc"), Err(IdError::InvalidChar(_))));
    }

    #[test]
    fn campaign_id_round_trips_display() {
        let id = CampaignId::new("cmp-int").unwrap();
        assert_eq!(id.to_string(), "cmp-int");
        assert_eq!(id.as_str(), "cmp-int");
    }
}
