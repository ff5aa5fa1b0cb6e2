// zcl-runtime/src/error.rs
// ============================================================================
// Module: Runtime Errors
// Description: Error taxonomy for runtime resolution and session supervision.
// Purpose: Classify native-runtime failures onto the stable §7 reason codes.
// Dependencies: thiserror, zcl-core
// ============================================================================

//! ## Overview
//! [`RuntimeError`] distinguishes resolution-time failures (no candidate
//! strategy supports the required capability set) from session-time
//! failures (the classification table in §4.E: rate limit, auth, stream
//! disconnect, crash, timeout).

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;
use zcl_core::Code;

// ============================================================================
// SECTION: Strategy Failure Record
// ============================================================================

/// One candidate strategy's resolution failure, aggregated into
/// [`RuntimeError::StrategyUnavailable`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyFailure {
    /// The strategy id that was attempted.
    pub strategy: String,
    /// The stable reason code for why it failed.
    pub code: Code,
    /// Free-form explanation.
    pub message: String,
}

// ============================================================================
// SECTION: Runtime Error
// ============================================================================

/// Errors raised by the Native Runtime Registry & Resolver and Session
/// Supervisor.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// The requested strategy id is not registered.
    #[error("unknown or unsupported runtime strategy: {0}")]
    CapabilityUnsupported(String),
    /// No candidate in the resolution chain supported every required capability.
    #[error("no candidate runtime strategy satisfied the required capabilities")]
    StrategyUnavailable(Vec<StrategyFailure>),
    /// The runtime peer reported a rate limit or quota error.
    #[error("runtime rate limit: {0}")]
    RateLimit(String),
    /// The runtime peer reported an authentication/authorization error.
    #[error("runtime auth failure: {0}")]
    Auth(String),
    /// The runtime peer's stream closed mid-turn.
    #[error("runtime stream disconnected mid-turn")]
    StreamDisconnect,
    /// The runtime peer process exited mid-turn.
    #[error("runtime process crashed mid-turn: {0}")]
    Crash(String),
    /// The attempt deadline elapsed while waiting on the runtime peer.
    #[error("runtime session timed out")]
    Timeout,
    /// The session process could not be spawned.
    #[error("failed to spawn native runtime session: {0}")]
    Spawn(String),
    /// A JSON-RPC request/response violated the expected protocol shape.
    #[error("runtime protocol error: {0}")]
    Protocol(String),
    /// A listener failed to persist a session event.
    #[error("trace listener failed to persist a session event: {0}")]
    ListenerFailure(String),
}

impl RuntimeError {
    /// Maps this error onto the stable reason-code taxonomy (§7).
    #[must_use]
    pub fn code(&self) -> Code {
        match self {
            Self::CapabilityUnsupported(_) => Code::CapabilityUnsupported,
            Self::StrategyUnavailable(_) => Code::StrategyUnavailable,
            Self::RateLimit(_) => Code::RuntimeRateLimit,
            Self::Auth(_) => Code::RuntimeAuth,
            Self::StreamDisconnect => Code::RuntimeStreamDisconnect,
            Self::Crash(_) => Code::RuntimeCrash,
            Self::Timeout => Code::Timeout,
            Self::Spawn(_) => Code::Spawn,
            Self::Protocol(_) => Code::Io,
            Self::ListenerFailure(_) => Code::RuntimeListenerFailure,
        }
    }

    /// Classifies a runtime peer error message per the §4.E table.
    ///
    /// Checked in order: rate limit, then auth, since some peers describe a
    /// quota error using both "limit" and "unauthorized" vocabulary and the
    /// spec's table lists rate-limit first.
    #[must_use]
    pub fn classify_peer_message(message: &str) -> Self {
        let lower = message.to_ascii_lowercase();
        if lower.contains("ratelimit")
            || lower.contains("rate limit")
            || lower.contains("429")
            || lower.contains("quota")
            || lower.contains("usagelimitexceeded")
        {
            return Self::RateLimit(message.to_string());
        }
        if lower.contains("401")
            || lower.contains("403")
            || lower.contains("unauthorized")
            || lower.contains("httpconnectionfailed")
        {
            return Self::Auth(message.to_string());
        }
        Self::Protocol(message.to_string())
    }
}
