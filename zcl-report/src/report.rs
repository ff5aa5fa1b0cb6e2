// zcl-report/src/report.rs
// ============================================================================
// Module: Build Report
// Description: Aggregates a campaign run's mission gates into the
//              `campaign.report.json` shape (§4.K).
// Purpose: Turn a persisted `CampaignRunState` into a small, countable
//          summary of what passed, what failed, and why.
// Dependencies: zcl-core
// ============================================================================

//! ## Overview
//! [`build_report`] is a pure fold over [`CampaignRunState::mission_gates`].
//! It never reads the filesystem; the Campaign Engine owns persisting the
//! result as `campaign.report.json`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use zcl_core::Code;
use zcl_core::model::AttemptStatus;
use zcl_core::model::CampaignRunState;
use zcl_core::model::RunStatus;

/// How many distinct failure codes [`build_report`] surfaces in
/// [`BuildReport::top_failure_codes`].
const TOP_FAILURE_CODES_LIMIT: usize = 5;

// ============================================================================
// SECTION: Build Report
// ============================================================================

/// Aggregate rollup of a campaign run, matching `campaign.report.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildReport {
    /// The run's overall status at the time this report was built.
    pub status: RunStatus,
    /// Count of missions whose pair-gated status is `valid`.
    pub gates_passed: u32,
    /// Count of missions whose pair-gated status is not `valid`.
    pub gates_failed: u32,
    /// The most frequent failure codes across every mission gate, ranked by
    /// descending frequency then ascending code, capped at
    /// [`TOP_FAILURE_CODES_LIMIT`] entries.
    pub top_failure_codes: Vec<Code>,
    /// Total token usage across every attempt, when the runtime reported one.
    #[serde(default)]
    pub token_estimates: Option<u64>,
}

/// Builds a [`BuildReport`] from `state`.
///
/// `token_estimates` is supplied by the caller because token usage is
/// tracked per attempt in `attempt.report.json`, not in the run state this
/// crate folds over.
#[must_use]
pub fn build_report(state: &CampaignRunState, token_estimates: Option<u64>) -> BuildReport {
    let mut gates_passed = 0u32;
    let mut gates_failed = 0u32;
    let mut frequency: BTreeMap<Code, u32> = BTreeMap::new();

    for gate in &state.mission_gates {
        if gate.status == AttemptStatus::Valid {
            gates_passed += 1;
        } else {
            gates_failed += 1;
        }
        for reason in &gate.reasons {
            *frequency.entry(reason.code).or_insert(0) += 1;
        }
    }

    let mut ranked: Vec<(Code, u32)> = frequency.into_iter().collect();
    ranked.sort_by(|left, right| right.1.cmp(&left.1).then_with(|| left.0.cmp(&right.0)));
    let top_failure_codes =
        ranked.into_iter().take(TOP_FAILURE_CODES_LIMIT).map(|(code, _count)| code).collect();

    BuildReport { status: state.status, gates_passed, gates_failed, top_failure_codes, token_estimates }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "test-only assertions")]

    use std::collections::BTreeMap;
    use std::path::PathBuf;

    use zcl_core::ids::MissionId;
    use zcl_core::ids::RunId;
    use zcl_core::model::GateReason;
    use zcl_core::model::MissionGate;

    use super::build_report;
    use super::CampaignRunState;
    use super::RunStatus;

    fn gate(mission: &str, status: zcl_core::model::AttemptStatus, reasons: Vec<GateReason>) -> MissionGate {
        MissionGate {
            mission_id: MissionId::new(mission).expect("valid id"),
            status,
            flow_verdicts: BTreeMap::new(),
            reasons,
        }
    }

    fn state(mission_gates: Vec<MissionGate>) -> CampaignRunState {
        CampaignRunState {
            status: RunStatus::Invalid,
            run_id: RunId::new("20260101T000000Z-abc123").expect("valid id"),
            resumed_from_run_id: None,
            comparability_key: "key".to_string(),
            mission_gates,
            flow_runs: Vec::new(),
            reason_codes: Vec::new(),
            total_missions: 2,
            missions_completed: 2,
            out_root: PathBuf::from(".zcl"),
            spec_path: PathBuf::from("campaign.toml"),
        }
    }

    #[test]
    fn counts_valid_and_non_valid_gates() {
        let report = build_report(
            &state(vec![
                gate("m0", zcl_core::model::AttemptStatus::Valid, Vec::new()),
                gate(
                    "m1",
                    zcl_core::model::AttemptStatus::Invalid,
                    vec![GateReason::new(zcl_core::Code::CampaignArtifactGate)],
                ),
            ]),
            None,
        );
        assert_eq!(report.gates_passed, 1);
        assert_eq!(report.gates_failed, 1);
        assert_eq!(report.top_failure_codes, vec![zcl_core::Code::CampaignArtifactGate]);
    }

    #[test]
    fn ranks_failure_codes_by_frequency_then_code() {
        let report = build_report(
            &state(vec![
                gate(
                    "m0",
                    zcl_core::model::AttemptStatus::Invalid,
                    vec![GateReason::new(zcl_core::Code::CampaignArtifactGate)],
                ),
                gate(
                    "m1",
                    zcl_core::model::AttemptStatus::Invalid,
                    vec![
                        GateReason::new(zcl_core::Code::CampaignArtifactGate),
                        GateReason::new(zcl_core::Code::CampaignTimeoutGate),
                    ],
                ),
            ]),
            Some(42),
        );
        assert_eq!(
            report.top_failure_codes,
            vec![zcl_core::Code::CampaignArtifactGate, zcl_core::Code::CampaignTimeoutGate]
        );
        assert_eq!(report.token_estimates, Some(42));
    }
}
