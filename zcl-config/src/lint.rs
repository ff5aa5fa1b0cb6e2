// zcl-config/src/lint.rs
// ============================================================================
// Module: Campaign Lint
// Description: Cross-field validation a bare `Deserialize` cannot express.
// Purpose: Catch configuration mistakes before lock acquisition (§4.J step 1,
//          campaign lint / canary CLI surfaces).
// Dependencies: zcl-core, zcl-gate
// ============================================================================

//! ## Overview
//! [`lint`] runs every cross-field rule against a parsed [`Campaign`] and
//! returns every violation found, rather than failing on the first one; the
//! `campaign lint` CLI surface reports the full list in one pass.

// ============================================================================
// SECTION: Imports
// ============================================================================

use zcl_core::Code;
use zcl_core::model::Campaign;
use zcl_core::model::EvaluationMode;
use zcl_core::model::Flow;
use zcl_core::model::PromptMode;
use zcl_core::model::RunnerType;

// ============================================================================
// SECTION: Findings
// ============================================================================

/// A single lint violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintFinding {
    /// Taxonomy code for this violation.
    pub code: Code,
    /// Flow this finding applies to, when scoped to one.
    pub flow_id: Option<String>,
    /// Human-readable detail.
    pub detail: String,
}

impl LintFinding {
    fn new(code: Code, flow_id: Option<&str>, detail: impl Into<String>) -> Self {
        Self { code, flow_id: flow_id.map(ToString::to_string), detail: detail.into() }
    }
}

// ============================================================================
// SECTION: Lint
// ============================================================================

/// Runs every cross-field lint rule against `campaign`, returning every
/// violation found.
#[must_use]
pub fn lint(campaign: &Campaign) -> Vec<LintFinding> {
    let mut findings = Vec::new();

    if campaign.mission_source.total_missions == Some(0) {
        findings.push(LintFinding::new(
            Code::Usage,
            None,
            "mission_source.total_missions is zero; the run would select no missions",
        ));
    }

    for flow in &campaign.flows {
        lint_flow(campaign.prompt_mode, flow, &mut findings);
    }

    findings
}

/// Lints a single flow against `prompt_mode` and the flow's own fields.
fn lint_flow(prompt_mode: PromptMode, flow: &Flow, findings: &mut Vec<LintFinding>) {
    let flow_id = flow.flow_id.as_str();

    if flow.runner == RunnerType::ProcessCmd && flow.command.is_none() {
        findings.push(LintFinding::new(
            Code::Usage,
            Some(flow_id),
            "runner = process_cmd requires a non-empty command",
        ));
    }

    if let Some(policy) = &flow.tool_policy {
        if let Err(code) = zcl_gate::tool_policy::validate(policy) {
            findings.push(LintFinding::new(code, Some(flow_id), "tool_policy.allow entry specifies neither namespace nor prefix"));
        }
    }

    match flow.evaluation.mode {
        EvaluationMode::Oracle if flow.evaluation.oracle_command.is_none() => {
            findings.push(LintFinding::new(
                Code::CampaignOracleEvaluatorRequired,
                Some(flow_id),
                "evaluation.mode = oracle requires evaluation.oracle_command",
            ));
        }
        EvaluationMode::Semantic if flow.evaluation.semantic_rules.is_none() => {
            findings.push(LintFinding::new(
                Code::Usage,
                Some(flow_id),
                "evaluation.mode = semantic requires evaluation.semantic_rules",
            ));
        }
        _ => {}
    }

    if prompt_mode == PromptMode::Exam && flow.evaluation.mode == EvaluationMode::None {
        findings.push(LintFinding::new(
            Code::CampaignPromptModeViolation,
            Some(flow_id),
            "prompt_mode = exam requires every flow to declare an evaluator",
        ));
    }

    if matches!(flow.runner, RunnerType::CodexSubagent | RunnerType::ClaudeSubagent) && flow.tool_driver.is_none() {
        findings.push(LintFinding::new(
            Code::CampaignToolDriverShimRequired,
            Some(flow_id),
            "subagent runners require tool_driver to resolve shim commands",
        ));
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "test-only assertions")]

    use zcl_core::model::EvaluationConfig;
    use zcl_core::model::EvaluationMode;
    use zcl_core::model::FinalizationConfig;
    use zcl_core::model::FinalizationMode;
    use zcl_core::model::Flow;
    use zcl_core::model::IsolationModel;
    use zcl_core::model::RunnerType;
    use zcl_core::model::TimeoutStart;
    use zcl_core::model::TraceProfile;

    use super::Campaign;
    use super::lint;
    use crate::examples::campaign_toml_example;
    use crate::load::load_campaign;

    fn bare_flow(flow_id: &str, runner: RunnerType) -> Flow {
        Flow {
            flow_id: zcl_core::ids::FlowId::new(flow_id).expect("valid id"),
            runner,
            command: None,
            env: Default::default(),
            timeout_ms: 1000,
            timeout_start: TimeoutStart::AttemptStart,
            isolation: IsolationModel::ProcessRunner,
            tool_driver: None,
            shims: Default::default(),
            finalization: FinalizationConfig { mode: FinalizationMode::AutoFail, result_channel: None },
            tool_policy: None,
            trace_profile: TraceProfile::None,
            evaluation: EvaluationConfig {
                mode: EvaluationMode::None,
                semantic_rules: None,
                oracle_command: None,
                oracle_policy: None,
            },
            max_in_flight: None,
            min_start_interval_ms: None,
            mcp_call_limit: None,
        }
    }

    fn example_campaign() -> Campaign {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("campaign.toml");
        std::fs::write(&path, campaign_toml_example()).expect("write");
        load_campaign(&path).expect("parses")
    }

    #[test]
    fn the_canonical_example_lints_clean() {
        let campaign = example_campaign();
        assert!(lint(&campaign).is_empty());
    }

    #[test]
    fn a_process_cmd_flow_without_a_command_is_flagged() {
        let mut campaign = example_campaign();
        campaign.flows = vec![bare_flow("no-command", RunnerType::ProcessCmd)];
        let findings = lint(&campaign);
        assert!(findings.iter().any(|finding| finding.detail.contains("command")));
    }

    #[test]
    fn a_subagent_runner_without_a_tool_driver_is_flagged() {
        let mut campaign = example_campaign();
        campaign.flows = vec![bare_flow("subagent", RunnerType::ClaudeSubagent)];
        let findings = lint(&campaign);
        assert!(findings.iter().any(|finding| finding.code == zcl_core::Code::CampaignToolDriverShimRequired));
    }
}
