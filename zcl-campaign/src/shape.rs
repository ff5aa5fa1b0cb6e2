// zcl-campaign/src/shape.rs
// ============================================================================
// Module: Run Shape
// Description: Builds the comparability-key `RunShape` from a resolved
//              campaign and the caller's CLI overrides (§3 DATA MODEL).
// Purpose: Fold per-flow shim configuration and the wave-scheduling
//          overrides into the single shape the engine hashes before the
//          first attempt is scheduled.
// Dependencies: zcl-core
// ============================================================================

//! ## Overview
//! `parallelism` and `fail_fast` are never persisted campaign-spec fields;
//! they are `campaign run`/`campaign canary` CLI overrides threaded through
//! [`crate::engine::RunRequest`]. This module is the one place that folds
//! them, together with the resolved `Campaign`, into the shape the
//! comparability key is hashed over.

// ============================================================================
// SECTION: Imports
// ============================================================================

use zcl_core::comparator::RunShape;
use zcl_core::model::Campaign;

// ============================================================================
// SECTION: Build
// ============================================================================

/// Builds the [`RunShape`] for `campaign` under the given wave-scheduling
/// overrides and resolved native runtime strategy.
///
/// Per-flow `timeout_ms`/`timeout_start`/`isolation`/`finalization` are taken
/// from the first flow, matching the single-mode assumption the distilled
/// comparability key describes; a campaign mixing flow shapes is still
/// hashed consistently run to run, since flow order is stable.
#[must_use]
pub fn build(campaign: &Campaign, parallel: u32, fail_fast: bool, runtime_strategy: Option<String>) -> RunShape {
    let mut shims: Vec<String> = campaign.flows.iter().flat_map(|flow| flow.shims.keys().cloned()).collect();
    shims.sort();
    shims.dedup();

    let primary = campaign.flows.first();
    RunShape {
        mode: "default".to_string(),
        timeout_ms: primary.map_or(0, |flow| flow.timeout_ms),
        timeout_start: primary.map_or("attempt_start", |flow| timeout_start_label(flow.timeout_start)).to_string(),
        isolation: primary.map_or("process_runner", |flow| isolation_label(flow.isolation)).to_string(),
        finalization: primary.map_or("strict", |flow| finalization_label(flow.finalization.mode)).to_string(),
        runtime_strategy,
        parallelism: parallel,
        fail_fast,
        blind: false,
        shims,
    }
}

fn timeout_start_label(value: zcl_core::model::TimeoutStart) -> &'static str {
    match value {
        zcl_core::model::TimeoutStart::AttemptStart => "attempt_start",
        zcl_core::model::TimeoutStart::FirstToolCall => "first_tool_call",
    }
}

fn isolation_label(value: zcl_core::model::IsolationModel) -> &'static str {
    match value {
        zcl_core::model::IsolationModel::ProcessRunner => "process_runner",
        zcl_core::model::IsolationModel::NativeSpawn => "native_spawn",
    }
}

fn finalization_label(value: zcl_core::model::FinalizationMode) -> &'static str {
    match value {
        zcl_core::model::FinalizationMode::Strict => "strict",
        zcl_core::model::FinalizationMode::AutoFail => "auto_fail",
        zcl_core::model::FinalizationMode::AutoFromResultJson => "auto_from_result_json",
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "test-only assertions")]

    use zcl_core::ids::CampaignId;
    use zcl_core::model::Campaign;
    use zcl_core::model::FlowMode;
    use zcl_core::model::GateConfig;
    use zcl_core::model::HooksConfig;
    use zcl_core::model::InvalidRunPolicy;
    use zcl_core::model::MissionSelection;
    use zcl_core::model::MissionSourceConfig;
    use zcl_core::model::PairGatePolicy;
    use zcl_core::model::PromptMode;
    use zcl_core::model::TimeoutsConfig;

    use super::build;

    fn empty_campaign() -> Campaign {
        Campaign {
            campaign_id: CampaignId::new("cmp-int").expect("valid id"),
            schema_version: 1,
            flows: Vec::new(),
            gate: GateConfig { pair_gate: PairGatePolicy::RequireAllValid },
            invalid_run_policy: InvalidRunPolicy::StrictValidOnly,
            prompt_mode: PromptMode::Free,
            flow_mode: FlowMode::Sequential,
            mission_source: MissionSourceConfig {
                suite_path: "suite.toml".into(),
                selection: MissionSelection::Whole,
                mission_offset: 0,
                total_missions: None,
            },
            hooks: HooksConfig::default(),
            timeouts: TimeoutsConfig { campaign_global_timeout_ms: 60_000, cleanup_hook_timeout_ms: 5_000 },
        }
    }

    #[test]
    fn parallelism_and_fail_fast_flow_through_from_the_caller() {
        let shape = build(&empty_campaign(), 4, true, None);
        assert_eq!(shape.parallelism, 4);
        assert!(shape.fail_fast);
    }

    #[test]
    fn an_empty_flow_list_still_produces_a_shape() {
        let shape = build(&empty_campaign(), 1, false, None);
        assert_eq!(shape.timeout_ms, 0);
        assert!(shape.shims.is_empty());
    }
}
