// zcl-report/src/summary.rs
// ============================================================================
// Module: Build Summary
// Description: Per-mission claimed-vs-verified deltas (§4.K), matching the
//              `campaign.summary.json` shape.
// Purpose: Surface where a runner's self-reported outcome (`feedback.ok`)
//          disagreed with the gate's own verdict, so a reviewer can spot
//          over- or under-claiming without re-reading every attempt.
// Dependencies: zcl-core
// ============================================================================

//! ## Overview
//! The gate evaluator is the only source of truth for `verified_status`;
//! `claimed_ok` is whatever the runner itself wrote into `feedback.json`, or
//! `None` when no feedback was produced at all. A mismatch isn't itself a
//! gate failure; it is reported so a reviewer can tell a runner that claims
//! success on a mission the gate marked invalid from one that is simply
//! honest about failing.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use zcl_core::ids::MissionId;
use zcl_core::model::AttemptStatus;
use zcl_core::model::CampaignRunState;
use zcl_core::model::GateReason;

// ============================================================================
// SECTION: Mission Delta
// ============================================================================

/// One mission's claimed-vs-verified outcome delta.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionDelta {
    /// Mission this delta covers.
    pub mission_id: MissionId,
    /// The runner's self-reported outcome, or `None` if no flow produced
    /// usable feedback for this mission.
    pub claimed_ok: Option<bool>,
    /// The gate evaluator's pair-gated verdict.
    pub verified_status: AttemptStatus,
    /// Reasons backing `verified_status`, copied from the mission gate.
    pub mismatches: Vec<GateReason>,
}

/// Aggregate campaign summary, matching `campaign.summary.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildSummary {
    /// Per-mission deltas, ordered the same as `state.mission_gates`.
    pub missions: Vec<MissionDelta>,
    /// Count of missions where `claimed_ok` disagreed with whether
    /// `verified_status == Valid`.
    pub mismatch_count: u32,
}

/// Builds a [`BuildSummary`] from `state`, pairing each mission gate with its
/// claimed outcome from `claimed`.
///
/// `claimed` is supplied by the caller (the Campaign Engine), which already
/// holds each attempt's [`zcl_core::model::Feedback`] in memory; a mission
/// absent from `claimed` is treated as having produced no feedback.
#[must_use]
pub fn build_summary(
    state: &CampaignRunState,
    claimed: &BTreeMap<MissionId, Option<bool>>,
) -> BuildSummary {
    let mut mismatch_count = 0u32;
    let missions = state
        .mission_gates
        .iter()
        .map(|gate| {
            let claimed_ok = claimed.get(&gate.mission_id).copied().flatten();
            let verified_ok = gate.status == AttemptStatus::Valid;
            if claimed_ok.is_some_and(|ok| ok != verified_ok) {
                mismatch_count += 1;
            }
            MissionDelta {
                mission_id: gate.mission_id.clone(),
                claimed_ok,
                verified_status: gate.status,
                mismatches: gate.reasons.clone(),
            }
        })
        .collect();

    BuildSummary { missions, mismatch_count }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "test-only assertions")]

    use std::collections::BTreeMap;
    use std::path::PathBuf;

    use zcl_core::ids::MissionId;
    use zcl_core::ids::RunId;
    use zcl_core::model::AttemptStatus;
    use zcl_core::model::MissionGate;
    use zcl_core::model::RunStatus;

    use super::build_summary;
    use super::CampaignRunState;

    fn state_with(mission: &str, status: AttemptStatus) -> CampaignRunState {
        CampaignRunState {
            status: RunStatus::Invalid,
            run_id: RunId::new("20260101T000000Z-abc123").expect("valid id"),
            resumed_from_run_id: None,
            comparability_key: "key".to_string(),
            mission_gates: vec![MissionGate {
                mission_id: MissionId::new(mission).expect("valid id"),
                status,
                flow_verdicts: BTreeMap::new(),
                reasons: Vec::new(),
            }],
            flow_runs: Vec::new(),
            reason_codes: Vec::new(),
            total_missions: 1,
            missions_completed: 1,
            out_root: PathBuf::from(".zcl"),
            spec_path: PathBuf::from("campaign.toml"),
        }
    }

    #[test]
    fn a_claim_of_success_on_an_invalid_mission_is_a_mismatch() {
        let state = state_with("m0", AttemptStatus::Invalid);
        let mut claimed = BTreeMap::new();
        claimed.insert(MissionId::new("m0").expect("valid id"), Some(true));
        let summary = build_summary(&state, &claimed);
        assert_eq!(summary.mismatch_count, 1);
        assert_eq!(summary.missions[0].claimed_ok, Some(true));
    }

    #[test]
    fn a_mission_with_no_recorded_claim_is_not_a_mismatch() {
        let state = state_with("m0", AttemptStatus::Valid);
        let summary = build_summary(&state, &BTreeMap::new());
        assert_eq!(summary.mismatch_count, 0);
        assert_eq!(summary.missions[0].claimed_ok, None);
    }

    #[test]
    fn agreement_is_not_a_mismatch() {
        let state = state_with("m0", AttemptStatus::Valid);
        let mut claimed = BTreeMap::new();
        claimed.insert(MissionId::new("m0").expect("valid id"), Some(true));
        let summary = build_summary(&state, &claimed);
        assert_eq!(summary.mismatch_count, 0);
    }
}
