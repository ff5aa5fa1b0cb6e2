// zcl-gate/src/oracle.rs
// ============================================================================
// Module: Oracle Gate
// Description: External-evaluator gate dimension (§4.I step 4).
// Purpose: Invoke the configured oracle evaluator for a mission, apply the
//          oracle-policy mismatch downgrade, and persist the verdict.
// Dependencies: zcl-sources, zcl-evidence, zcl-core
// ============================================================================

//! ## Overview
//! The verdict is always persisted to `oracle.verdict.json`, even when the
//! oracle policy downgrades its mismatches to a non-gating warning, so the
//! raw evaluator output remains auditable.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::time::Duration;

use serde_json::Value;
use zcl_core::Code;
use zcl_core::model::GateReason;
use zcl_core::model::OraclePolicy;
use zcl_evidence::EvidenceRoot;
use zcl_sources::OracleVerdict;

use crate::error::GateError;

// ============================================================================
// SECTION: Outcome
// ============================================================================

/// Oracle gate outcome: whether the mission gates, plus any reasons.
#[derive(Debug, Clone, PartialEq)]
pub struct OracleOutcome {
    /// Whether this dimension passed.
    pub ok: bool,
    /// Reasons explaining a failing or downgraded verdict.
    pub reasons: Vec<GateReason>,
}

// ============================================================================
// SECTION: Evaluation
// ============================================================================

/// Invokes `oracle_command` against `mission_context`, applies `policy`, and
/// persists the verdict to `attempt_dir/oracle.verdict.json`.
///
/// # Errors
///
/// Returns [`GateError::Oracle`] if the evaluator cannot be invoked or its
/// output cannot be parsed, and [`GateError::Evidence`] if the verdict
/// cannot be persisted.
pub async fn evaluate(
    attempt_dir: &Path,
    oracle_command: &[String],
    mission_context: &Value,
    timeout: Duration,
    policy: OraclePolicy,
) -> Result<OracleOutcome, GateError> {
    let verdict = zcl_sources::oracle::invoke(oracle_command, mission_context, timeout).await?;

    let root = EvidenceRoot::open_or_create(attempt_dir)?;
    root.write_json_atomic(Path::new("oracle.verdict.json"), &verdict)?;

    Ok(disposition(&verdict, policy))
}

/// Derives the gate outcome from an already-invoked verdict, applying the
/// oracle-policy mismatch downgrade.
#[must_use]
pub fn disposition(verdict: &OracleVerdict, policy: OraclePolicy) -> OracleOutcome {
    if verdict.ok {
        return OracleOutcome { ok: true, reasons: Vec::new() };
    }
    if matches!(policy, OraclePolicy::WarnOnFormatMismatch) && verdict.is_format_only() {
        return OracleOutcome {
            ok: true,
            reasons: vec![GateReason::with_detail(
                Code::CampaignOracleEvaluationFailed,
                "policyDisposition=warn (format-only mismatch)",
            )],
        };
    }
    let detail = verdict.message.clone().unwrap_or_else(|| "oracle evaluator reported ok=false".to_string());
    OracleOutcome {
        ok: false,
        reasons: vec![GateReason::with_detail(Code::CampaignOracleEvaluationFailed, detail)],
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "test-only assertions")]

    use zcl_core::model::OraclePolicy;
    use zcl_sources::OracleMismatch;
    use zcl_sources::OracleVerdict;

    use super::disposition;

    fn verdict(ok: bool, mismatches: Vec<OracleMismatch>) -> OracleVerdict {
        OracleVerdict { ok, reason_codes: Vec::new(), message: None, mismatches }
    }

    #[test]
    fn a_passing_verdict_gates_clean() {
        let outcome = disposition(&verdict(true, vec![]), OraclePolicy::Strict);
        assert!(outcome.ok);
        assert!(outcome.reasons.is_empty());
    }

    #[test]
    fn a_format_only_mismatch_downgrades_under_warn_policy() {
        let mismatch =
            OracleMismatch { mismatch_class: "format".to_string(), detail: serde_json::json!({}) };
        let outcome =
            disposition(&verdict(false, vec![mismatch]), OraclePolicy::WarnOnFormatMismatch);
        assert!(outcome.ok);
        assert_eq!(outcome.reasons.len(), 1);
    }

    #[test]
    fn a_format_only_mismatch_still_gates_under_strict_policy() {
        let mismatch =
            OracleMismatch { mismatch_class: "format".to_string(), detail: serde_json::json!({}) };
        let outcome = disposition(&verdict(false, vec![mismatch]), OraclePolicy::Strict);
        assert!(!outcome.ok);
    }
}
