// zcl-sources/src/error.rs
// ============================================================================
// Module: Source Adapter Errors
// Description: Error type for result-channel reads and oracle invocation.
// Purpose: Carry a stable `zcl_core::Code` alongside a free-form message so
//          callers can fold failures into the reason-code taxonomy (§7).
// Dependencies: std, thiserror, zcl-core
// ============================================================================

//! ## Overview
//! Every variant here maps to exactly one §6/§7 reason code via [`SourceError::code`],
//! matching the distilled spec's finalization-policy and oracle-gate failure modes.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;

use thiserror::Error;
use zcl_core::Code;

// ============================================================================
// SECTION: Source Error
// ============================================================================

/// Errors raised while reading a result channel or invoking an oracle evaluator.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The result channel source (file or stdout tail) had no content.
    #[error("mission result missing: {0}")]
    ResultMissing(String),
    /// The result payload was present but malformed or type-invalid.
    #[error("mission result invalid: {0}")]
    ResultInvalid(String),
    /// The payload's `turn` field was below the configured `resultMinTurn`.
    #[error("mission result turn too early: observed {observed:?}, required {required}")]
    ResultTurnTooEarly {
        /// The `turn` value observed in the payload, if present.
        observed: Option<u64>,
        /// The minimum turn required by `resultMinTurn`.
        required: u32,
    },
    /// A filesystem operation failed while locating the result channel source.
    #[error("io error at {path}: {source}")]
    Io {
        /// Path the failing operation targeted.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
    /// The oracle evaluator process could not be spawned.
    #[error("oracle evaluator spawn failed: {0}")]
    OracleSpawn(String),
    /// The oracle evaluator did not exit within its configured timeout.
    #[error("oracle evaluator timed out")]
    OracleTimeout,
    /// The oracle evaluator's stdout was not a valid verdict payload.
    #[error("oracle evaluator produced an invalid verdict: {0}")]
    OracleInvalidOutput(String),
}

impl SourceError {
    /// Wraps an [`std::io::Error`] with the path that produced it.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }

    /// Maps this error onto the stable reason-code taxonomy (§7).
    #[must_use]
    pub const fn code(&self) -> Code {
        match self {
            Self::ResultMissing(_) => Code::MissionResultMissing,
            Self::ResultInvalid(_) => Code::MissionResultInvalid,
            Self::ResultTurnTooEarly { .. } => Code::MissionResultTurnTooEarly,
            Self::Io { .. } => Code::Io,
            Self::OracleSpawn(_) => Code::Spawn,
            Self::OracleTimeout => Code::Timeout,
            Self::OracleInvalidOutput(_) => Code::CampaignOracleEvaluationFailed,
        }
    }
}
