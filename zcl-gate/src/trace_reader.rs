// zcl-gate/src/trace_reader.rs
// ============================================================================
// Module: Trace Reader
// Description: Reads `tool.calls.jsonl` back for gate evaluation.
// Purpose: Give the trace-profile and tool-policy gates the event stream
//          `zcl-evidence`'s `TraceRecorder` wrote during dispatch.
// Dependencies: zcl-core, zcl-evidence
// ============================================================================

//! ## Overview
//! `zcl-evidence` is write-only by design (§4.A); gate evaluation is the one
//! reader of its own trace output, so the parse step lives here rather than
//! growing a read API onto the evidence store.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;

use zcl_evidence::TraceEvent;

use crate::error::GateError;

// ============================================================================
// SECTION: Read
// ============================================================================

/// Reads and parses every event in `tool.calls.jsonl` under `attempt_dir`.
///
/// Returns an empty vector if the file does not exist, matching
/// `AttemptIntegrity::trace_present = false`.
///
/// # Errors
///
/// Returns [`GateError::TraceInvalid`] if a non-empty line fails to parse as
/// a [`TraceEvent`].
pub fn read(attempt_dir: &Path) -> Result<Vec<TraceEvent>, GateError> {
    let path = zcl_core::layout::tool_calls_jsonl(attempt_dir);
    let raw = match std::fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(GateError::Io(err)),
    };
    raw.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            serde_json::from_str(line).map_err(|err| GateError::TraceInvalid(format!("{path:?}: {err}")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "test-only assertions")]

    use tempfile::tempdir;

    use super::read;

    #[test]
    fn a_missing_trace_file_reads_as_empty() {
        let dir = tempdir().expect("tempdir");
        let events = read(dir.path()).expect("reads");
        assert!(events.is_empty());
    }
}
