// zcl-core/tests/model.rs
// ============================================================================
// Module: Data Model Integration Tests
// Description: Cross-module tests for campaign/attempt/gate serialization.
// Purpose: Ensure the data model round-trips through serde the way every
//          downstream crate and the on-disk evidence tree expects.
// Dependencies: zcl-core, serde_json
// ============================================================================

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::collections::BTreeMap;

use zcl_core::ids::MissionId;
use zcl_core::ids::MissionIndex;
use zcl_core::ids::RetryIndex;
use zcl_core::model::AttemptStatus;
use zcl_core::model::GateReason;
use zcl_core::model::MissionGate;
use zcl_core::Code;

#[test]
fn mission_gate_round_trips_through_json() {
    let gate = MissionGate {
        mission_id: MissionId::new("m0").unwrap(),
        status: AttemptStatus::Invalid,
        flow_verdicts: BTreeMap::new(),
        reasons: vec![GateReason::new(Code::CampaignArtifactGate)],
    };
    let json = serde_json::to_string(&gate).unwrap();
    let round_tripped: MissionGate = serde_json::from_str(&json).unwrap();
    assert_eq!(gate, round_tripped);
}

#[test]
fn attempt_status_serializes_in_snake_case() {
    let json = serde_json::to_value(AttemptStatus::InfraFailed).unwrap();
    assert_eq!(json, serde_json::json!("infra_failed"));
}

#[test]
fn layout_attempt_id_uses_zero_padded_index() {
    let mission_id = MissionId::new("render-chart").unwrap();
    let id =
        zcl_core::layout::attempt_id_for(7, &mission_id, RetryIndex(2)).unwrap();
    assert_eq!(id.as_str(), "007-render-chart-r2");
}
