// zcl-gate/src/error.rs
// ============================================================================
// Module: Gate Evaluator Errors
// Description: Error taxonomy for trace reads and oracle gate invocation.
// Purpose: Carry a stable `zcl_core::Code` alongside a free-form message for
//          every failure mode the Gate Evaluator can hit.
// Dependencies: std, thiserror, zcl-core, zcl-sources
// ============================================================================

//! ## Overview
//! Gate *failures* (a dimension evaluating to `False`) are not errors; they
//! become [`zcl_core::model::gate::GateReason`] entries. [`GateError`] is
//! reserved for cases the evaluator cannot proceed at all: an unreadable
//! trace file, or an oracle evaluator that could not be invoked.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;
use zcl_core::Code;

// ============================================================================
// SECTION: Gate Error
// ============================================================================

/// Errors raised while evaluating a mission gate.
#[derive(Debug, Error)]
pub enum GateError {
    /// A filesystem operation failed while reading attempt artifacts.
    #[error("io error reading attempt artifacts: {0}")]
    Io(#[from] std::io::Error),
    /// A non-empty `tool.calls.jsonl` line failed to parse as a `TraceEvent`.
    #[error("trace event failed to parse: {0}")]
    TraceInvalid(String),
    /// The oracle evaluator subprocess could not be invoked or parsed.
    #[error("oracle gate failed: {0}")]
    Oracle(#[from] zcl_sources::SourceError),
    /// Persisting `oracle.verdict.json` failed.
    #[error("failed to persist oracle verdict: {0}")]
    Evidence(#[from] zcl_evidence::EvidenceError),
}

impl GateError {
    /// Maps this error onto the stable reason-code taxonomy (§7).
    #[must_use]
    pub fn code(&self) -> Code {
        match self {
            Self::Io(_) | Self::TraceInvalid(_) => Code::Io,
            Self::Oracle(source) => source.code(),
            Self::Evidence(_) => Code::Io,
        }
    }
}
