// zcl-core/src/model/run.rs
// ============================================================================
// Module: Campaign Run State & Progress Ledger
// Description: Types describing one campaign execution and its event trail.
// Purpose: Typed representation of campaign.run.state.json and
//          campaign.progress.jsonl.
// ============================================================================

//! ## Overview
//! [`CampaignRunState`] is rewritten atomically at every progress transition
//! (§3). [`ProgressEvent`] records are append-only and drive resume replay:
//! the Campaign Engine iterates only missions absent from the ledger.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::error::Code;
use crate::ids::AttemptId;
use crate::ids::CampaignId;
use crate::ids::FlowId;
use crate::ids::MissionId;
use crate::ids::MissionIndex;
use crate::ids::RunId;
use crate::model::attempt::AttemptStatus;
use crate::model::gate::MissionGate;
use crate::time::Timestamp;

// ============================================================================
// SECTION: Campaign Run State
// ============================================================================

/// Overall campaign run status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// The run is in progress.
    Running,
    /// Every mission passed its gate.
    Valid,
    /// At least one mission failed its gate.
    Invalid,
    /// Every non-valid mission failed for infrastructure reasons (timeout,
    /// spawn failure, missing artifact) rather than a genuine gate failure.
    InfraFailed,
    /// The run was aborted (lock contention, global timeout, fatal hook).
    Aborted,
}

/// Persistent campaign run state, rewritten atomically at every transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignRunState {
    /// Current rollup status.
    pub status: RunStatus,
    /// This run's identifier.
    pub run_id: RunId,
    /// The prior run this execution resumed from, if any.
    #[serde(default)]
    pub resumed_from_run_id: Option<RunId>,
    /// Stable hash of the run's shape; equal keys mean comparable results.
    pub comparability_key: String,
    /// Per-mission gate verdicts accumulated so far.
    pub mission_gates: Vec<MissionGate>,
    /// Per-flow run summaries.
    pub flow_runs: Vec<FlowRunSummary>,
    /// Deduplicated, sorted reason codes explaining a non-`valid` status.
    pub reason_codes: Vec<Code>,
    /// Total missions selected for this run's window.
    pub total_missions: u32,
    /// Missions completed so far (valid, invalid, skipped, or infra-failed).
    pub missions_completed: u32,
    /// Output root this run writes under.
    pub out_root: PathBuf,
    /// Path to the campaign spec this run was launched from.
    pub spec_path: PathBuf,
}

/// Per-flow summary folded into [`CampaignRunState::flow_runs`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowRunSummary {
    /// Flow this summary covers.
    pub flow_id: FlowId,
    /// Count of attempts per rollup status for this flow.
    pub valid: u32,
    /// Count of invalid attempts for this flow.
    pub invalid: u32,
    /// Count of skipped attempts for this flow.
    pub skipped: u32,
    /// Count of infra-failed attempts for this flow.
    pub infra_failed: u32,
}

// ============================================================================
// SECTION: Progress Ledger
// ============================================================================

/// An append-only progress ledger record (§3, §4.J step 5).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// Event kind, describing the lifecycle transition observed.
    pub kind: ProgressEventKind,
    /// Timestamp the event was recorded.
    pub ts: Timestamp,
    /// Campaign this event belongs to.
    pub campaign_id: CampaignId,
    /// Mission position within the resolved window.
    pub mission_index: MissionIndex,
    /// Mission this event covers.
    pub mission_id: MissionId,
    /// Flow this event covers, when applicable.
    #[serde(default)]
    pub flow_id: Option<FlowId>,
    /// Attempt this event covers, when applicable.
    #[serde(default)]
    pub attempt_id: Option<AttemptId>,
    /// Additional structured detail specific to `kind`.
    #[serde(default)]
    pub details: serde_json::Value,
}

/// Lifecycle transition kinds recorded in the progress ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressEventKind {
    /// A mission attempt was allocated.
    AttemptAllocated,
    /// A mission attempt started executing.
    AttemptStarted,
    /// A mission attempt was finalized.
    AttemptFinalized,
    /// A mission gate verdict was recorded.
    MissionGated,
    /// A mission was skipped (e.g. fail-fast).
    MissionSkipped,
    /// The campaign run completed.
    RunCompleted,
}

/// Translates a finalized attempt's report outcome into a rollup status.
///
/// Timeout-class failures specifically downgrade to `infra_failed` rather
/// than `invalid` once pair-gating has been applied (§4.I step 6); this
/// helper implements the attempt-local half of that rule.
#[must_use]
pub fn status_for_timeout_class(gate_failed: bool, timeout_class: bool) -> AttemptStatus {
    match (gate_failed, timeout_class) {
        (false, _) => AttemptStatus::Valid,
        (true, true) => AttemptStatus::InfraFailed,
        (true, false) => AttemptStatus::Invalid,
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "test-only assertions")]

    use super::status_for_timeout_class;
    use crate::model::attempt::AttemptStatus;

    #[test]
    fn timeout_class_failures_downgrade_to_infra_failed() {
        assert_eq!(status_for_timeout_class(true, true), AttemptStatus::InfraFailed);
        assert_eq!(status_for_timeout_class(true, false), AttemptStatus::Invalid);
        assert_eq!(status_for_timeout_class(false, true), AttemptStatus::Valid);
    }
}
