// zcl-evidence/src/trace.rs
// ============================================================================
// Module: Trace Recorder
// Description: Append-only tool-call/runtime-event trace writer (§4.C).
// Purpose: Record one self-contained JSONL record per tool call or event,
//          redacting argv/previews/captured files before persisting.
// Dependencies: crate::atomic, crate::redact, zcl-core, serde
// ============================================================================

//! ## Overview
//! `tool.calls.jsonl` is append-only; every record is self-contained.
//! Previews are hard-capped (default 16 KiB); bytes beyond the cap increment
//! `truncated=true` without dropping byte counts (§4.C).

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::sync::Mutex;

use serde::Deserialize;
use serde::Serialize;
use zcl_core::ids::AgentId;
use zcl_core::ids::AttemptId;
use zcl_core::ids::MissionId;
use zcl_core::ids::RunId;
use zcl_core::ids::SuiteId;
use zcl_core::time::Timestamp;

use crate::atomic::EvidenceRoot;
use crate::error::EvidenceError;
use crate::redact::Redactor;

// ============================================================================
// SECTION: Preview Cap
// ============================================================================

/// Default hard cap, in bytes, on a single stdout/stderr preview.
pub const DEFAULT_PREVIEW_CAP_BYTES: usize = 16 * 1024;

// ============================================================================
// SECTION: Trace Event
// ============================================================================

/// One append-only tool-call or runtime-event trace record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceEvent {
    /// Schema version of this record shape.
    pub v: u32,
    /// Timestamp the event was recorded.
    pub ts: Timestamp,
    /// Run this event belongs to.
    pub run_id: RunId,
    /// Suite the mission is drawn from.
    pub suite_id: SuiteId,
    /// Mission this event covers.
    pub mission_id: MissionId,
    /// Attempt this event covers.
    pub attempt_id: AttemptId,
    /// Runner-under-evaluation identifier.
    pub agent_id: AgentId,
    /// Tool namespace (e.g. `mcp`, `browser`, `shell`).
    pub tool: String,
    /// Operation name within the tool's namespace.
    pub op: String,
    /// Redacted input payload for this call.
    pub input: serde_json::Value,
    /// Outcome of the call.
    pub result: TraceResult,
    /// Captured stdio summary for process-backed tools.
    pub io: TraceIo,
    /// Evidence-integrity sub-flags for this single record.
    pub integrity: TraceIntegrity,
}

/// Outcome of a single traced call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceResult {
    /// Whether the call succeeded.
    pub ok: bool,
    /// Process exit code, when the call spawned a process.
    #[serde(default)]
    pub exit_code: Option<i32>,
    /// Wall-clock duration of the call, in milliseconds.
    pub duration_ms: u64,
    /// Spawn-time error message, when the call never produced a process.
    #[serde(default)]
    pub spawn_error: Option<String>,
}

/// Captured stdio summary for a traced call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceIo {
    /// Total stdout bytes observed, including bytes beyond the preview cap.
    pub out_bytes: u64,
    /// Total stderr bytes observed, including bytes beyond the preview cap.
    pub err_bytes: u64,
    /// Redacted, cap-bounded stdout preview.
    pub out_preview: String,
    /// Redacted, cap-bounded stderr preview.
    pub err_preview: String,
    /// Whether `out_preview` was truncated to the cap.
    pub out_truncated: bool,
    /// Whether `err_preview` was truncated to the cap.
    pub err_truncated: bool,
}

/// Per-record integrity sub-flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceIntegrity {
    /// Set when this record itself was truncated (distinct from io truncation).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub truncated: Option<bool>,
}

// ============================================================================
// SECTION: Trace Recorder
// ============================================================================

/// Single-writer-per-file append-only recorder for `tool.calls.jsonl`.
pub struct TraceRecorder {
    /// Evidence root the recorder writes into (the attempt directory).
    root: EvidenceRoot,
    /// Relative path to the trace file within the root.
    relative_path: PathBuf,
    /// Redactor applied to previews and input payloads before persistence.
    redactor: Box<dyn Redactor>,
    /// Serializes appends so interleaved calls never corrupt a line.
    write_lock: Mutex<()>,
}

impl TraceRecorder {
    /// Creates a trace recorder writing `tool.calls.jsonl` under `attempt_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`EvidenceError::Io`] if `attempt_dir` cannot be opened.
    pub fn new(attempt_dir: &Path, redactor: Box<dyn Redactor>) -> Result<Self, EvidenceError> {
        let root = EvidenceRoot::open_or_create(attempt_dir)?;
        Ok(Self {
            root,
            relative_path: PathBuf::from("tool.calls.jsonl"),
            redactor,
            write_lock: Mutex::new(()),
        })
    }

    /// Builds a cap-bounded, redacted preview from raw captured bytes.
    #[must_use]
    pub fn build_preview(&self, raw: &[u8], cap: usize) -> (String, bool) {
        let lossy = String::from_utf8_lossy(raw);
        let redacted = self.redactor.redact(&lossy);
        if redacted.len() <= cap {
            (redacted, false)
        } else {
            let mut boundary = cap;
            while boundary > 0 && !redacted.is_char_boundary(boundary) {
                boundary -= 1;
            }
            (redacted[..boundary].to_string(), true)
        }
    }

    /// Appends `event` to the trace file, serializing concurrent callers.
    ///
    /// # Errors
    ///
    /// Returns [`EvidenceError`] if the append fails or the write lock is
    /// poisoned by a prior panic.
    pub fn append(&self, event: &TraceEvent) -> Result<(), EvidenceError> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_poison| EvidenceError::Io {
                path: self.relative_path.clone(),
                source: std::io::Error::other("trace recorder write lock poisoned"),
            })?;
        self.root.append_jsonl(&self.relative_path, event)
    }

    /// Returns true when the trace file exists and has at least one
    /// non-empty line (the contract-gate `traceNonEmpty` check).
    ///
    /// # Errors
    ///
    /// Returns [`EvidenceError::Io`] if the file exists but cannot be read.
    pub fn has_non_empty_trace(&self) -> Result<bool, EvidenceError> {
        self.root.jsonl_has_non_empty_line(&self.relative_path)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "test-only assertions")]

    use tempfile::tempdir;

    use super::TraceRecorder;
    use crate::redact::PatternRedactor;

    #[test]
    fn preview_is_redacted_and_capped() {
        let dir = tempdir().expect("tempdir");
        let recorder =
            TraceRecorder::new(dir.path(), Box::new(PatternRedactor::new())).expect("recorder");
        let raw = b"token sk-abcdefghijklmnopqrstuvwxyz end";
        let (preview, truncated) = recorder.build_preview(raw, 1024);
        assert!(preview.contains("[REDACTED:OPENAI_KEY]"));
        assert!(!truncated);
    }

    #[test]
    fn preview_truncates_at_cap() {
        let dir = tempdir().expect("tempdir");
        let recorder =
            TraceRecorder::new(dir.path(), Box::new(PatternRedactor::new())).expect("recorder");
        let raw = vec![b'a'; 100];
        let (preview, truncated) = recorder.build_preview(&raw, 10);
        assert_eq!(preview.len(), 10);
        assert!(truncated);
    }

    #[test]
    fn empty_trace_reports_no_non_empty_line() {
        let dir = tempdir().expect("tempdir");
        let recorder =
            TraceRecorder::new(dir.path(), Box::new(PatternRedactor::new())).expect("recorder");
        assert!(!recorder.has_non_empty_trace().expect("check ok"));
    }
}
