// zcl-core/src/model/attempt.rs
// ============================================================================
// Module: Attempt & Feedback
// Description: Types describing a single scheduled mission attempt.
// Purpose: Typed representation of attempt.json, feedback.json, and the
//          post-hoc attempt.report.json artifact.
// ============================================================================

//! ## Overview
//! An [`Attempt`] is unique per `(runId, flowId, missionId, retry)`; its
//! directory is never reused (§3). [`Feedback`] is the only artifact that
//! proves mission outcome, and is written at most once.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::ids::AgentId;
use crate::ids::AttemptId;
use crate::ids::FlowId;
use crate::ids::MissionId;
use crate::ids::RetryIndex;
use crate::ids::RunId;
use crate::ids::SuiteId;
use crate::model::campaign::IsolationModel;
use crate::model::campaign::TimeoutStart;
use crate::model::suite::Suite;
use crate::time::Timestamp;

// ============================================================================
// SECTION: Attempt
// ============================================================================

/// A single scheduled mission attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attempt {
    /// Stable attempt identifier.
    pub attempt_id: AttemptId,
    /// Run this attempt belongs to.
    pub run_id: RunId,
    /// Flow this attempt was scheduled under.
    pub flow_id: FlowId,
    /// Suite the mission is drawn from.
    pub suite_id: SuiteId,
    /// Mission being attempted.
    pub mission_id: MissionId,
    /// Monotonic retry counter within `(runId, missionId)`.
    pub retry: RetryIndex,
    /// Absolute path to the attempt's on-disk directory.
    pub attempt_dir: PathBuf,
    /// Timestamp the attempt was allocated.
    pub started_at: Timestamp,
    /// Per-attempt deadline budget, in milliseconds.
    pub timeout_ms: u64,
    /// When the deadline starts counting down.
    pub timeout_start: TimeoutStart,
    /// Timestamp the deadline actually began, set once observed for
    /// `timeout_start = first_tool_call`.
    #[serde(default)]
    pub timeout_started_at: Option<Timestamp>,
    /// Process vs native-spawn isolation for this attempt.
    pub isolation_model: IsolationModel,
    /// Materialized prompt text.
    pub prompt: String,
    /// Canonical suite snapshot frozen at allocation time.
    pub suite_snapshot: Suite,
    /// Runner-under-evaluation identifier.
    pub agent_id: AgentId,
    /// Current lifecycle state.
    pub state: AttemptState,
}

/// Monotonic attempt lifecycle state (§3).
///
/// # Invariants
/// - Transitions only move forward through this ordering; backward
///   transitions are rejected by the Session Supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptState {
    /// Allocated but not yet dispatched.
    Queued,
    /// A native session is being started.
    SessionStarting,
    /// A native session is ready to accept a turn.
    SessionReady,
    /// A conversation thread has been started.
    ThreadStarted,
    /// A turn has been started.
    TurnStarted,
    /// The turn completed successfully.
    TurnCompleted,
    /// The turn failed.
    TurnFailed,
    /// The turn was interrupted (cancellation).
    TurnInterrupted,
    /// The attempt has been sealed; `attempt.report.json` is written.
    Finalized,
}

impl AttemptState {
    /// Returns whether `next` is a legal forward transition from `self`.
    #[must_use]
    pub fn can_advance_to(self, next: Self) -> bool {
        next >= self
    }
}

// ============================================================================
// SECTION: Feedback
// ============================================================================

/// Terminal mission outcome; the only artifact that proves mission outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    /// Whether the runner claims the mission succeeded.
    pub ok: bool,
    /// Free-form result string, mutually exclusive with `result_json`.
    #[serde(default)]
    pub result: Option<String>,
    /// Structured result payload, mutually exclusive with `result`.
    #[serde(default)]
    pub result_json: Option<serde_json::Value>,
    /// Non-empty decision tags describing how the outcome was reached.
    #[serde(default)]
    pub decision_tags: Vec<String>,
    /// Optional classification label assigned by the runner.
    #[serde(default)]
    pub classification: Option<String>,
    /// Timestamp this feedback was written.
    pub created_at: Timestamp,
}

// ============================================================================
// SECTION: Attempt Report
// ============================================================================

/// Post-hoc integrity and metrics summary built by the Suite Runner (§4.G).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptReport {
    /// Overall claimed outcome, mirrored from feedback when present.
    #[serde(default)]
    pub ok: Option<bool>,
    /// Evidence-integrity checks.
    pub integrity: AttemptIntegrity,
    /// Attempt-level metrics.
    pub metrics: AttemptMetrics,
    /// Count of each failure code observed during the attempt.
    #[serde(default)]
    pub failure_code_histogram: std::collections::BTreeMap<String, u32>,
    /// Whether the deadline elapsed before any tool call was observed.
    pub timed_out_before_first_tool_call: bool,
    /// Timestamp the attempt was sealed.
    pub ended_at: Timestamp,
}

/// Evidence-integrity sub-checks used by the contract gate (§4.I step 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptIntegrity {
    /// Whether `tool.calls.jsonl` exists.
    pub trace_present: bool,
    /// Whether `tool.calls.jsonl` contains at least one non-empty line.
    pub trace_non_empty: bool,
    /// Whether `feedback.json` exists.
    pub feedback_present: bool,
    /// Whether the blind-mode contamination scan flagged the prompt.
    pub prompt_contaminated: bool,
}

/// Attempt-level metrics captured by the Attempt Finalizer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttemptMetrics {
    /// Total recorded tool calls.
    pub tool_calls_total: u32,
    /// Optional token-usage estimate, when the runtime reports one.
    #[serde(default)]
    pub token_estimates: Option<u64>,
}

// ============================================================================
// SECTION: Attempt Status
// ============================================================================

/// Campaign-level rollup status for a single flow's attempt at a mission
/// (§4.J step 4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    /// The attempt passed every applicable gate.
    Valid,
    /// The attempt was evaluated but failed a gate.
    Invalid,
    /// The attempt was never run (e.g. fail-fast).
    Skipped,
    /// The attempt failed for infrastructure reasons rather than a gate.
    InfraFailed,
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "test-only assertions")]

    use super::AttemptState;

    #[test]
    fn forward_transitions_are_legal() {
        assert!(AttemptState::Queued.can_advance_to(AttemptState::SessionStarting));
        assert!(AttemptState::TurnStarted.can_advance_to(AttemptState::Finalized));
    }

    #[test]
    fn backward_transitions_are_rejected() {
        assert!(!AttemptState::Finalized.can_advance_to(AttemptState::Queued));
        assert!(!AttemptState::TurnCompleted.can_advance_to(AttemptState::TurnStarted));
    }

    #[test]
    fn same_state_is_a_legal_no_op_advance() {
        assert!(AttemptState::ThreadStarted.can_advance_to(AttemptState::ThreadStarted));
    }
}
