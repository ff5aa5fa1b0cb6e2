// zcl-runner/src/error.rs
// ============================================================================
// Module: Suite Runner Errors
// Description: Error taxonomy for attempt allocation, process/native
//              dispatch, and finalization (§4.B/§4.G/§4.H).
// Purpose: Fold every failure mode onto the stable §7 reason codes so the
//          Campaign Engine can translate them into an `AttemptStatus`.
// Dependencies: thiserror, zcl-core, zcl-evidence, zcl-runtime, zcl-sources
// ============================================================================

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;
use zcl_core::Code;
use zcl_core::ids::IdError;

// ============================================================================
// SECTION: Runner Error
// ============================================================================

/// Errors raised while allocating, running, or finalizing a single attempt.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// An identifier could not be constructed (§4.B usage error).
    #[error("invalid identifier: {0}")]
    Usage(#[from] IdError),
    /// An evidence-store operation failed.
    #[error("evidence store failure: {0}")]
    Evidence(#[from] zcl_evidence::EvidenceError),
    /// A native-runtime session operation failed.
    #[error("runtime failure: {0}")]
    Runtime(#[from] zcl_runtime::RuntimeError),
    /// A result-channel or oracle-adapter operation failed.
    #[error("source adapter failure: {0}")]
    Source(#[from] zcl_sources::SourceError),
    /// The process runner could not be spawned (path/exec error, never a
    /// process that then exited nonzero).
    #[error("failed to spawn runner process: {0}")]
    Spawn(String),
    /// A filesystem operation outside the evidence store failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// The flow declares `isolation=native_spawn` but the runtime registry
    /// could not resolve a capable strategy when `isolation=process` was not
    /// explicit, or a native flow declared no runtime chain.
    #[error("native isolation requires an explicit runtime chain")]
    NativeIsolationUnconfigured,
}

impl RunnerError {
    /// Maps this error onto the stable reason-code taxonomy (§7).
    #[must_use]
    pub fn code(&self) -> Code {
        match self {
            Self::Usage(_) => Code::Usage,
            Self::Evidence(_) | Self::Io(_) => Code::Io,
            Self::Runtime(err) => err.code(),
            Self::Source(err) => err.code(),
            Self::Spawn(_) => Code::Spawn,
            Self::NativeIsolationUnconfigured => Code::Usage,
        }
    }
}
