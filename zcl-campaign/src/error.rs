// zcl-campaign/src/error.rs
// ============================================================================
// Module: Campaign Engine Errors
// Description: Error taxonomy for campaign lock, selection, hook, and
//              orchestration failures (§4.J).
// Purpose: Carry a stable `zcl_core::Code` alongside every failure the
//          Campaign Engine can raise, and distinguish `aborted` from
//          ordinary usage errors.
// Dependencies: std, thiserror, zcl-core, zcl-evidence, zcl-gate, zcl-runner
// ============================================================================

//! ## Overview
//! [`CampaignError::code`] feeds the run's `reasonCodes` and the process exit
//! code (§7). Lock contention, a fatal non-cleanup hook, and global timeout
//! are the only failures that roll the run up to `aborted` rather than
//! `invalid`; [`CampaignError::aborts_run`] names exactly those.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;
use zcl_core::Code;
use zcl_core::ids::FlowId;
use zcl_core::ids::IdError;

// ============================================================================
// SECTION: Campaign Error
// ============================================================================

/// Errors raised while running or resuming a campaign.
#[derive(Debug, Error)]
pub enum CampaignError {
    /// A malformed request: empty mission window, `parallel=0`, a flow
    /// requiring an oracle evaluator with none configured, and similar.
    #[error("usage error: {0}")]
    Usage(String),
    /// The campaign lock directory was already present.
    #[error("campaign lock already held at {0}")]
    LockHeld(std::path::PathBuf),
    /// A mission prompt violated `promptMode` vocabulary rules.
    #[error("mission {mission_id} prompt violates prompt_mode vocabulary (term {term:?})")]
    PromptModeViolation {
        /// Offending mission.
        mission_id: String,
        /// Banned term the prompt contained.
        term: String,
    },
    /// A non-cleanup hook exited nonzero or failed to spawn.
    #[error("hook {hook} failed: {stderr_tail}")]
    HookFailed {
        /// Which hook failed (`pre_flight`, `pre_mission`, `post_mission`).
        hook: &'static str,
        /// Stderr tail, truncated to 512 bytes.
        stderr_tail: String,
    },
    /// The campaign's global timeout elapsed.
    #[error("campaign global timeout elapsed")]
    GlobalTimeout,
    /// An identifier could not be constructed.
    #[error("invalid identifier: {0}")]
    InvalidId(#[from] IdError),
    /// A filesystem operation outside the evidence store failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// An evidence-store operation failed.
    #[error("evidence store failure: {0}")]
    Evidence(#[from] zcl_evidence::EvidenceError),
    /// A hash/canonicalization operation failed while building the
    /// comparability key.
    #[error("failed to compute comparability key: {0}")]
    Hashing(#[from] zcl_core::hashing::HashError),
    /// Running one mission's attempts failed at the runner layer.
    #[error("runner failure: {0}")]
    Runner(#[from] zcl_runner::RunnerError),
    /// Evaluating a mission gate failed at the gate layer.
    #[error("gate evaluation failure: {0}")]
    Gate(#[from] zcl_gate::GateError),
    /// `evaluation.mode = native_spawn` but the caller's dispatch resolver
    /// declared no entry for this flow.
    #[error("flow {0} has no native dispatch context configured")]
    NativeDispatchUnconfigured(FlowId),
}

impl CampaignError {
    /// Maps this error onto the stable reason-code taxonomy (§7).
    #[must_use]
    pub fn code(&self) -> Code {
        match self {
            Self::Usage(_) | Self::InvalidId(_) | Self::NativeDispatchUnconfigured(_) => Code::Usage,
            Self::LockHeld(_) => Code::CampaignLock,
            Self::PromptModeViolation { .. } => Code::CampaignPromptModeViolation,
            Self::GlobalTimeout => Code::Timeout,
            Self::HookFailed { .. } | Self::Io(_) | Self::Evidence(_) | Self::Hashing(_) => Code::Io,
            Self::Runner(err) => err.code(),
            Self::Gate(err) => err.code(),
        }
    }

    /// Whether this failure rolls the run's status up to `aborted` rather
    /// than `invalid` (§4.J step 8).
    #[must_use]
    pub fn aborts_run(&self) -> bool {
        matches!(self, Self::LockHeld(_) | Self::HookFailed { .. } | Self::GlobalTimeout)
    }
}
