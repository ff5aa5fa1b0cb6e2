// zcl-evidence/src/error.rs
// ============================================================================
// Module: Evidence Store Errors
// Description: Error type for atomic writes, JSONL append, and redaction.
// Purpose: Wrap low-level IO failures with path context (§7 propagation policy).
// Dependencies: std, thiserror
// ============================================================================

//! ## Overview
//! Every IO failure is wrapped with the offending path; nothing here is
//! silently swallowed, matching the Evidence Store's `io` failure mode.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;

use thiserror::Error;

// ============================================================================
// SECTION: Evidence Error
// ============================================================================

/// Errors raised by the evidence store and trace recorder.
#[derive(Debug, Error)]
pub enum EvidenceError {
    /// A filesystem operation failed at the given path.
    #[error("io error at {path}: {source}")]
    Io {
        /// Path the failing operation targeted.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
    /// JSON serialization failed while preparing a value for canonicalization.
    #[error("failed to canonicalize value: {0}")]
    Canonicalization(String),
    /// The requested path escaped the attempt directory root.
    #[error("path escapes attempt root: {0}")]
    PathEscapesRoot(PathBuf),
}

impl EvidenceError {
    /// Wraps an [`std::io::Error`] with the path that produced it.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }
}
