// zcl-gate/src/lib.rs
// ============================================================================
// Crate: zcl-gate
// Description: Gate Evaluator (§4.I), built on the standalone `ret-logic`
//              tri-state requirement engine.
// Purpose: Evaluate every attempt against the contract, trace-profile,
//          semantic, oracle, and tool-policy dimensions, then roll up
//          cross-flow pair-gate verdicts into a per-mission `MissionGate`.
// ============================================================================

//! # zcl-gate
//!
//! Each gate dimension is expressed as a `Requirement<GateFact>` evaluated
//! under [`ret_logic::LogicMode::Kleene`], so a fact nobody computed yields
//! `Unknown` rather than a silent pass or fail. Reasons accumulate across
//! every dimension instead of short-circuiting, matching the distilled
//! spec's "reasons are deduplicated and sorted before persistence" contract.

#![deny(missing_docs)]

pub mod contract;
pub mod error;
pub mod fact;
pub mod oracle;
pub mod pair;
pub mod semantic;
pub mod tool_policy;
pub mod trace_profile;
pub mod trace_reader;

pub use error::GateError;
pub use fact::GateFact;
pub use fact::GateFactReader;

use std::path::Path;
use std::time::Duration;

use zcl_core::model::AttemptReport;
use zcl_core::model::AttemptStatus;
use zcl_core::model::EvaluationMode;
use zcl_core::model::Feedback;
use zcl_core::model::Flow;
use zcl_core::model::GateReason;

// ============================================================================
// SECTION: Flow-Level Evaluation
// ============================================================================

/// One flow's gate verdict for a single mission attempt, before pair-gating.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowGateVerdict {
    /// Rolled-up status for this flow's attempt.
    pub status: AttemptStatus,
    /// Deduplicated, sorted reasons explaining `status`.
    pub reasons: Vec<GateReason>,
}

/// Evaluates every non-oracle gate dimension for one flow's attempt,
/// reading `tool.calls.jsonl` from `attempt_dir`.
///
/// Timeout-class failures (a contract-gate failure driven by
/// `timed_out_before_first_tool_call` or a `timeout` entry in the failure
/// histogram) roll up to [`AttemptStatus::InfraFailed`] rather than
/// [`AttemptStatus::Invalid`], matching §4.I step 6's timeout-class carve-out.
///
/// The oracle dimension is evaluated separately via [`evaluate_oracle`]
/// since it is the one dimension requiring an async subprocess call; its
/// result should be folded into this verdict by the caller before pair-gating.
///
/// # Errors
///
/// Returns [`GateError`] if `tool.calls.jsonl` cannot be read or parsed.
pub fn evaluate_flow(
    attempt_dir: &Path,
    flow: &Flow,
    report: &AttemptReport,
    feedback: Option<&Feedback>,
) -> Result<FlowGateVerdict, GateError> {
    let events = trace_reader::read(attempt_dir)?;
    let mut reasons = Vec::new();
    let mut timed_out = report.timed_out_before_first_tool_call
        || report.failure_code_histogram.get("timeout").copied().unwrap_or(0) > 0;

    let contract_facts = contract::facts(report);
    let (contract_status, contract_trace) = fact::evaluate(&contract::requirement(), &contract_facts);
    if !contract_status.is_true() {
        reasons.push(GateReason::with_detail(
            zcl_core::Code::CampaignArtifactGate,
            fact::describe_failures(&contract_trace),
        ));
    }

    if let Some(requirement) = trace_profile::requirement(flow.trace_profile) {
        let facts = trace_profile::facts(&events);
        let (status, trace) = fact::evaluate(&requirement, &facts);
        if !status.is_true() {
            reasons.push(GateReason::with_detail(
                trace_profile::code_for(flow.trace_profile),
                fact::describe_failures(&trace),
            ));
        }
    }

    if flow.evaluation.mode == EvaluationMode::Semantic {
        if let Some(rules) = &flow.evaluation.semantic_rules {
            let result_json = feedback.and_then(|feedback| feedback.result_json.as_ref());
            let facts = semantic::facts(rules, result_json);
            let (status, trace) = fact::evaluate(&semantic::requirement(rules), &facts);
            if !status.is_true() {
                reasons.push(GateReason::with_detail(
                    zcl_core::Code::SemanticFailed,
                    fact::describe_failures(&trace),
                ));
            }
        }
    }

    if let Some(policy) = &flow.tool_policy {
        reasons.extend(tool_policy::violations(policy, &events));
    }

    if !contract_status.is_true() {
        timed_out = timed_out || !report.integrity.trace_non_empty;
    }

    let status = zcl_core::model::status_for_timeout_class(!reasons.is_empty(), timed_out);
    reasons.sort();
    reasons.dedup();
    Ok(FlowGateVerdict { status, reasons })
}

/// Invokes the oracle dimension for a flow whose `evaluation.mode = oracle`,
/// returning the reasons to fold into the flow's [`FlowGateVerdict`].
///
/// # Errors
///
/// Returns [`GateError::Oracle`] if the evaluator cannot be invoked, and
/// [`GateError::CampaignOracleEvaluatorRequired`]-equivalent validation is
/// the caller's responsibility at lint time (`zcl-config`).
pub async fn evaluate_oracle(
    attempt_dir: &Path,
    flow: &Flow,
    mission_context: &serde_json::Value,
    timeout: Duration,
) -> Result<oracle::OracleOutcome, GateError> {
    let command = flow.evaluation.oracle_command.as_deref().unwrap_or(&[]);
    let policy = flow.evaluation.oracle_policy.unwrap_or(zcl_core::model::OraclePolicy::Strict);
    oracle::evaluate(attempt_dir, command, mission_context, timeout, policy).await
}

/// Folds an [`oracle::OracleOutcome`] into an existing flow verdict.
#[must_use]
pub fn fold_oracle_outcome(
    mut verdict: FlowGateVerdict,
    outcome: &oracle::OracleOutcome,
) -> FlowGateVerdict {
    if !outcome.ok {
        verdict.status = AttemptStatus::Invalid;
    }
    verdict.reasons.extend(outcome.reasons.clone());
    verdict.reasons.sort();
    verdict.reasons.dedup();
    verdict
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "test-only assertions")]

    use std::collections::BTreeMap;

    use tempfile::tempdir;
    use zcl_core::model::AttemptIntegrity;
    use zcl_core::model::AttemptMetrics;
    use zcl_core::model::AttemptReport;
    use zcl_core::model::EvaluationConfig;
    use zcl_core::model::EvaluationMode;
    use zcl_core::model::FinalizationConfig;
    use zcl_core::model::FinalizationMode;
    use zcl_core::model::Flow;
    use zcl_core::model::IsolationModel;
    use zcl_core::model::RunnerType;
    use zcl_core::model::TimeoutStart;
    use zcl_core::model::TraceProfile;
    use zcl_core::time::Timestamp;

    use super::evaluate_flow;

    fn flow() -> Flow {
        Flow {
            flow_id: zcl_core::ids::FlowId::new("f0").expect("valid id"),
            runner: RunnerType::ProcessCmd,
            command: Some(vec!["true".to_string()]),
            env: BTreeMap::new(),
            timeout_ms: 1000,
            timeout_start: TimeoutStart::AttemptStart,
            isolation: IsolationModel::ProcessRunner,
            tool_driver: None,
            shims: BTreeMap::new(),
            finalization: FinalizationConfig { mode: FinalizationMode::Strict, result_channel: None },
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

    fn clean_report() -> AttemptReport {
        AttemptReport {
            ok: Some(true),
            integrity: AttemptIntegrity {
                trace_present: true,
                trace_non_empty: true,
                feedback_present: true,
                prompt_contaminated: false,
            },
            metrics: AttemptMetrics { tool_calls_total: 0, token_estimates: None },
            failure_code_histogram: BTreeMap::new(),
            timed_out_before_first_tool_call: false,
            ended_at: Timestamp::from_unix_millis(0),
        }
    }

    #[test]
    fn a_clean_attempt_with_no_extra_dimensions_is_valid() {
        let dir = tempdir().expect("tempdir");
        let verdict =
            evaluate_flow(dir.path(), &flow(), &clean_report(), None).expect("evaluates");
        assert!(matches!(verdict.status, zcl_core::model::AttemptStatus::Valid));
        assert!(verdict.reasons.is_empty());
    }

    #[test]
    fn a_missing_trace_fails_the_contract_gate_as_invalid() {
        let dir = tempdir().expect("tempdir");
        let mut report = clean_report();
        report.integrity.trace_non_empty = false;
        let verdict = evaluate_flow(dir.path(), &flow(), &report, None).expect("evaluates");
        assert!(matches!(verdict.status, zcl_core::model::AttemptStatus::Invalid));
        assert!(!verdict.reasons.is_empty());
    }

    #[test]
    fn a_timed_out_attempt_rolls_up_to_infra_failed() {
        let dir = tempdir().expect("tempdir");
        let mut report = clean_report();
        report.timed_out_before_first_tool_call = true;
        report.integrity.feedback_present = false;
        let verdict = evaluate_flow(dir.path(), &flow(), &report, None).expect("evaluates");
        assert!(matches!(verdict.status, zcl_core::model::AttemptStatus::InfraFailed));
    }
}
