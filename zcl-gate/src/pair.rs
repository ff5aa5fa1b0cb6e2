// zcl-gate/src/pair.rs
// ============================================================================
// Module: Pair Gate
// Description: Cross-flow mission rollup (§4.I step 6).
// Purpose: Combine every flow's per-attempt verdict for a mission into a
//          single mission-level status, applying the configured policy when
//          more than one flow covers the mission.
// Dependencies: zcl-core
// ============================================================================

//! ## Overview
//! A timeout-class failure downgrades to `infra_failed` rather than
//! `invalid`, per §4.I step 6; the caller supplies which flows timed out.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use zcl_core::Code;
use zcl_core::ids::FlowId;
use zcl_core::model::AttemptStatus;
use zcl_core::model::GateReason;
use zcl_core::model::PairGatePolicy;

// ============================================================================
// SECTION: Rollup
// ============================================================================

/// Applies `policy` across `flow_verdicts` to produce the mission-level
/// status and any reasons the rollup itself contributes.
///
/// A single flow always rolls up to its own verdict regardless of policy.
#[must_use]
pub fn apply(
    policy: PairGatePolicy,
    flow_verdicts: &BTreeMap<FlowId, AttemptStatus>,
) -> (AttemptStatus, Vec<GateReason>) {
    let Some(first) = flow_verdicts.values().next().copied() else {
        return (AttemptStatus::Skipped, vec![GateReason::new(Code::CampaignSkipped)]);
    };
    if flow_verdicts.len() == 1 {
        return (first, Vec::new());
    }

    let all_valid = flow_verdicts.values().all(|status| matches!(status, AttemptStatus::Valid));
    let all_identical = flow_verdicts.values().all(|status| *status == first);
    let satisfied = match policy {
        PairGatePolicy::RequireAllValid => all_valid,
        PairGatePolicy::RequireIdentical => all_identical,
    };
    if satisfied {
        return (first, Vec::new());
    }

    let any_infra_failed =
        flow_verdicts.values().any(|status| matches!(status, AttemptStatus::InfraFailed));
    let status = if any_infra_failed { AttemptStatus::InfraFailed } else { AttemptStatus::Invalid };
    (status, vec![GateReason::new(Code::CampaignAttemptNotValid)])
}
