// zcl-report/src/publish_check.rs
// ============================================================================
// Module: Publish Check
// Description: Publish-gate predicate for the `campaign publish-check` CLI
//              surface (§4.K).
// Purpose: Decide whether a finished run may be exported outside evaluation,
//          including a post-hoc re-scan of prompts against `promptMode`
//          rules since prompts may have been edited after the run completed.
// Dependencies: zcl-core
// ============================================================================

//! ## Overview
//! [`check`] combines two independent gates: the run's own [`RunStatus`]
//! against `invalid_run_policy`/`publish_requires_valid`/`--force`, and a
//! fresh [`zcl_core::prompt_policy::mission_only_violation`] scan over the
//! suite's mission prompts. `--force` only overrides the status gate; a
//! prompt-mode compliance failure can never be forced through, since it
//! indicates the published artifact itself would leak harness vocabulary.

// ============================================================================
// SECTION: Imports
// ============================================================================

use zcl_core::Code;
use zcl_core::model::InvalidRunPolicy;
use zcl_core::model::PromptMode;
use zcl_core::model::RunStatus;
use zcl_core::model::Suite;
use zcl_core::prompt_policy::mission_only_violation;

// ============================================================================
// SECTION: Request / Result
// ============================================================================

/// Inputs to a publish-check evaluation.
#[derive(Debug, Clone, Copy)]
pub struct PublishCheckRequest<'a> {
    /// The run's rollup status.
    pub status: RunStatus,
    /// Policy controlling which statuses may still be published.
    pub invalid_run_policy: InvalidRunPolicy,
    /// Whether the campaign requires `status = valid` to publish at all.
    pub publish_requires_valid: bool,
    /// `--force` override for the status gate only.
    pub force: bool,
    /// The campaign's prompt-vocabulary policy.
    pub prompt_mode: PromptMode,
    /// The suite whose mission prompts are re-scanned for compliance.
    pub suite: &'a Suite,
}

/// Outcome of a publish-check evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishCheckResult {
    /// Whether the run may be published.
    pub ok: bool,
    /// Reason codes explaining a `false` result; empty when `ok = true`.
    pub reason_codes: Vec<Code>,
}

// ============================================================================
// SECTION: Check
// ============================================================================

/// Evaluates the publish-gate predicate described in §4.K.
#[must_use]
pub fn check(request: &PublishCheckRequest<'_>) -> PublishCheckResult {
    let mut reason_codes = Vec::new();

    let status_ok = !request.publish_requires_valid
        || request.force
        || status_allowed(request.status, request.invalid_run_policy);
    if !status_ok {
        reason_codes.push(Code::CampaignAttemptNotValid);
    }

    if request.prompt_mode == PromptMode::MissionOnly {
        for mission in &request.suite.missions {
            if mission_only_violation(&mission.prompt).is_some() {
                reason_codes.push(Code::CampaignPromptModeViolation);
                break;
            }
        }
    }

    reason_codes.sort();
    reason_codes.dedup();
    PublishCheckResult { ok: reason_codes.is_empty(), reason_codes }
}

/// Returns whether `status` is publishable under `policy` without `--force`.
fn status_allowed(status: RunStatus, policy: InvalidRunPolicy) -> bool {
    match policy {
        InvalidRunPolicy::StrictValidOnly => status == RunStatus::Valid,
        InvalidRunPolicy::AllowInvalid => matches!(status, RunStatus::Valid | RunStatus::Invalid),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "test-only assertions")]

    use zcl_core::ids::MissionId;
    use zcl_core::ids::MissionIndex;
    use zcl_core::ids::SuiteId;
    use zcl_core::model::Mission;
    use zcl_core::model::Suite;
    use zcl_core::model::SuiteDefaults;
    use zcl_core::model::TimeoutStart;

    use super::check;
    use super::InvalidRunPolicy;
    use super::PromptMode;
    use super::PublishCheckRequest;
    use super::RunStatus;

    fn suite_with_prompt(prompt: &str) -> Suite {
        Suite {
            suite_id: SuiteId::new("suite-a").expect("valid id"),
            defaults: SuiteDefaults {
                mode: "default".to_string(),
                timeout_ms: 60_000,
                timeout_start: TimeoutStart::AttemptStart,
                feedback_policy: "strict".to_string(),
                blind: false,
                blind_terms: Vec::new(),
            },
            missions: vec![Mission {
                mission_id: MissionId::new("m0").expect("valid id"),
                mission_index: MissionIndex(0),
                prompt: prompt.to_string(),
                tags: Vec::new(),
                expects: None,
            }],
        }
    }

    #[test]
    fn a_valid_run_with_a_clean_prompt_passes() {
        let suite = suite_with_prompt("Summarize the attached document.");
        let result = check(&PublishCheckRequest {
            status: RunStatus::Valid,
            invalid_run_policy: InvalidRunPolicy::StrictValidOnly,
            publish_requires_valid: true,
            force: false,
            prompt_mode: PromptMode::MissionOnly,
            suite: &suite,
        });
        assert!(result.ok);
    }

    #[test]
    fn an_invalid_run_fails_under_strict_valid_only() {
        let suite = suite_with_prompt("Summarize the attached document.");
        let result = check(&PublishCheckRequest {
            status: RunStatus::Invalid,
            invalid_run_policy: InvalidRunPolicy::StrictValidOnly,
            publish_requires_valid: true,
            force: false,
            prompt_mode: PromptMode::Free,
            suite: &suite,
        });
        assert!(!result.ok);
        assert!(result.reason_codes.contains(&zcl_core::Code::CampaignAttemptNotValid));
    }

    #[test]
    fn force_overrides_the_status_gate_but_not_prompt_compliance() {
        let suite = suite_with_prompt("Check the feedback file for the oracle verdict.");
        let result = check(&PublishCheckRequest {
            status: RunStatus::Invalid,
            invalid_run_policy: InvalidRunPolicy::StrictValidOnly,
            publish_requires_valid: true,
            force: true,
            prompt_mode: PromptMode::MissionOnly,
            suite: &suite,
        });
        assert!(!result.ok);
        assert_eq!(result.reason_codes, vec![zcl_core::Code::CampaignPromptModeViolation]);
    }

    #[test]
    fn allow_invalid_policy_widens_the_status_gate() {
        let suite = suite_with_prompt("Summarize the attached document.");
        let result = check(&PublishCheckRequest {
            status: RunStatus::Invalid,
            invalid_run_policy: InvalidRunPolicy::AllowInvalid,
            publish_requires_valid: true,
            force: false,
            prompt_mode: PromptMode::Free,
            suite: &suite,
        });
        assert!(result.ok);
    }
}
