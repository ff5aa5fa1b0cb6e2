// zcl-core/src/error.rs
// ============================================================================
// Module: ZCL Error Taxonomy
// Description: Stable textual error codes shared across every crate.
// Purpose: Give every user-visible error a stable `code` alongside a message.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Every error visible to users carries a stable `code` string plus a
//! free-form message. Gate evaluation accumulates reason codes rather than
//! short-circuiting, so [`Code`] is also the currency of
//! `MissionGate::reasons`. [`Code`] serializes as a plain string (never a
//! tagged object) so `reasonCodes` arrays stay a flat list of strings even
//! though [`Code::CampaignFlowExit`] carries a numeric suffix.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;
use serde::de::Error as DeError;

// ============================================================================
// SECTION: Code Taxonomy
// ============================================================================

/// Stable textual error/reason code.
///
/// # Invariants
/// - Renders as the exact lower-`snake_case` string listed in the design
///   document's error taxonomy; never renamed across releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Code {
    // Usage / validation
    /// Malformed CLI invocation or campaign spec.
    Usage,
    /// A mission prompt violated `promptMode` vocabulary rules.
    CampaignPromptModeViolation,
    /// A flow declared a tool driver that requires shims but none were configured.
    CampaignToolDriverShimRequired,
    /// A flow's `toolPolicy.allow` entry was malformed.
    CampaignToolPolicyInvalid,
    /// `evaluation.mode = oracle` but no evaluator command was configured.
    CampaignOracleEvaluatorRequired,

    // Infrastructure
    /// Generic I/O failure, always wrapped with the offending path.
    Io,
    /// Process spawn failed before a process existed.
    Spawn,
    /// Attempt deadline elapsed.
    Timeout,
    /// Shim resolution or execution failed.
    Shim,
    /// An expected artifact was absent.
    MissingArtifact,
    /// A recorded tool invocation failed.
    ToolFailed,

    // Native runtime
    /// Runtime peer reported a rate limit / quota error.
    RuntimeRateLimit,
    /// Runtime peer reported an authentication/authorization error.
    RuntimeAuth,
    /// The runtime peer's stream closed mid-turn.
    RuntimeStreamDisconnect,
    /// The runtime peer process exited mid-turn.
    RuntimeCrash,
    /// A trace listener failed to persist an event.
    RuntimeListenerFailure,
    /// No candidate runtime strategy exposed the required capability.
    CapabilityUnsupported,
    /// Every candidate runtime strategy failed to start.
    StrategyUnavailable,

    // Gate
    /// An attempt did not reach a `valid` status.
    CampaignAttemptNotValid,
    /// The contract gate failed (missing/incomplete artifacts).
    CampaignArtifactGate,
    /// The trace-profile gate failed.
    CampaignTraceGate,
    /// The `mcp_required` trace-profile gate failed specifically.
    CampaignTraceProfileMcpRequired,
    /// The contract gate's timeout sub-check failed.
    CampaignTimeoutGate,
    /// The semantic gate's declarative rule set failed.
    SemanticFailed,
    /// The oracle evaluator reported a non-format mismatch.
    CampaignOracleEvaluationFailed,
    /// A recorded tool call fell outside the flow's tool policy allow-list.
    ToolPolicyViolation,
    /// A blind-mode prompt contained harness contamination terms.
    ContaminatedPrompt,

    // Mission result channel
    /// The configured result channel produced no payload.
    MissionResultMissing,
    /// The result channel payload failed to decode.
    MissionResultInvalid,
    /// The result channel payload referenced a turn below `resultMinTurn`.
    MissionResultTurnTooEarly,

    // Campaign control
    /// The campaign lock directory was already present.
    CampaignLock,
    /// A flow process (hook or helper) exited with the carried nonzero status.
    CampaignFlowExit(i32),
    /// A `suite.run.summary.json` failed to parse.
    CampaignSummaryParse,
    /// An attempt directory referenced by the ledger was missing on resume.
    CampaignMissingAttempt,
    /// A mission was skipped (e.g. fail-fast).
    CampaignSkipped,
}

/// Error returned when parsing a [`Code`] from its string form fails.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized error code: {0}")]
pub struct ParseCodeError(pub String);

impl Code {
    /// Returns the process exit code this error code maps to, per the CLI
    /// exit-code contract (`0` success is never returned from an error path).
    #[must_use]
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::Usage
            | Self::CampaignPromptModeViolation
            | Self::CampaignToolDriverShimRequired
            | Self::CampaignToolPolicyInvalid
            | Self::CampaignOracleEvaluatorRequired
            | Self::CampaignAttemptNotValid
            | Self::CampaignArtifactGate
            | Self::CampaignTraceGate
            | Self::CampaignTraceProfileMcpRequired
            | Self::CampaignTimeoutGate
            | Self::SemanticFailed
            | Self::CampaignOracleEvaluationFailed
            | Self::ToolPolicyViolation
            | Self::ContaminatedPrompt
            | Self::MissionResultMissing
            | Self::MissionResultInvalid
            | Self::MissionResultTurnTooEarly => 2,
            _ => 1,
        }
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Usage => f.write_str("usage"),
            Self::CampaignPromptModeViolation => f.write_str("campaign_prompt_mode_violation"),
            Self::CampaignToolDriverShimRequired => {
                f.write_str("campaign_tool_driver_shim_required")
            }
            Self::CampaignToolPolicyInvalid => f.write_str("campaign_tool_policy_invalid"),
            Self::CampaignOracleEvaluatorRequired => {
                f.write_str("campaign_oracle_evaluator_required")
            }
            Self::Io => f.write_str("io"),
            Self::Spawn => f.write_str("spawn"),
            Self::Timeout => f.write_str("timeout"),
            Self::Shim => f.write_str("shim"),
            Self::MissingArtifact => f.write_str("missing_artifact"),
            Self::ToolFailed => f.write_str("tool_failed"),
            Self::RuntimeRateLimit => f.write_str("runtime_rate_limit"),
            Self::RuntimeAuth => f.write_str("runtime_auth"),
            Self::RuntimeStreamDisconnect => f.write_str("runtime_stream_disconnect"),
            Self::RuntimeCrash => f.write_str("runtime_crash"),
            Self::RuntimeListenerFailure => f.write_str("runtime_listener_failure"),
            Self::CapabilityUnsupported => f.write_str("capability_unsupported"),
            Self::StrategyUnavailable => f.write_str("strategy_unavailable"),
            Self::CampaignAttemptNotValid => f.write_str("campaign_attempt_not_valid"),
            Self::CampaignArtifactGate => f.write_str("campaign_artifact_gate"),
            Self::CampaignTraceGate => f.write_str("campaign_trace_gate"),
            Self::CampaignTraceProfileMcpRequired => {
                f.write_str("campaign_trace_profile_mcp_required")
            }
            Self::CampaignTimeoutGate => f.write_str("campaign_timeout_gate"),
            Self::SemanticFailed => f.write_str("semantic_failed"),
            Self::CampaignOracleEvaluationFailed => {
                f.write_str("campaign_oracle_evaluation_failed")
            }
            Self::ToolPolicyViolation => f.write_str("tool_policy_violation"),
            Self::ContaminatedPrompt => f.write_str("contaminated_prompt"),
            Self::MissionResultMissing => f.write_str("mission_result_missing"),
            Self::MissionResultInvalid => f.write_str("mission_result_invalid"),
            Self::MissionResultTurnTooEarly => f.write_str("mission_result_turn_too_early"),
            Self::CampaignLock => f.write_str("campaign_lock"),
            Self::CampaignFlowExit(status) => write!(f, "campaign_flow_exit_{status}"),
            Self::CampaignSummaryParse => f.write_str("campaign_summary_parse"),
            Self::CampaignMissingAttempt => f.write_str("campaign_missing_attempt"),
            Self::CampaignSkipped => f.write_str("campaign_skipped"),
        }
    }
}

impl FromStr for Code {
    type Err = ParseCodeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if let Some(suffix) = value.strip_prefix("campaign_flow_exit_") {
            let status =
                suffix.parse::<i32>().map_err(|_err| ParseCodeError(value.to_string()))?;
            return Ok(Self::CampaignFlowExit(status));
        }
        Ok(match value {
            "usage" => Self::Usage,
            "campaign_prompt_mode_violation" => Self::CampaignPromptModeViolation,
            "campaign_tool_driver_shim_required" => Self::CampaignToolDriverShimRequired,
            "campaign_tool_policy_invalid" => Self::CampaignToolPolicyInvalid,
            "campaign_oracle_evaluator_required" => Self::CampaignOracleEvaluatorRequired,
            "io" => Self::Io,
            "spawn" => Self::Spawn,
            "timeout" => Self::Timeout,
            "shim" => Self::Shim,
            "missing_artifact" => Self::MissingArtifact,
            "tool_failed" => Self::ToolFailed,
            "runtime_rate_limit" => Self::RuntimeRateLimit,
            "runtime_auth" => Self::RuntimeAuth,
            "runtime_stream_disconnect" => Self::RuntimeStreamDisconnect,
            "runtime_crash" => Self::RuntimeCrash,
            "runtime_listener_failure" => Self::RuntimeListenerFailure,
            "capability_unsupported" => Self::CapabilityUnsupported,
            "strategy_unavailable" => Self::StrategyUnavailable,
            "campaign_attempt_not_valid" => Self::CampaignAttemptNotValid,
            "campaign_artifact_gate" => Self::CampaignArtifactGate,
            "campaign_trace_gate" => Self::CampaignTraceGate,
            "campaign_trace_profile_mcp_required" => Self::CampaignTraceProfileMcpRequired,
            "campaign_timeout_gate" => Self::CampaignTimeoutGate,
            "semantic_failed" => Self::SemanticFailed,
            "campaign_oracle_evaluation_failed" => Self::CampaignOracleEvaluationFailed,
            "tool_policy_violation" => Self::ToolPolicyViolation,
            "contaminated_prompt" => Self::ContaminatedPrompt,
            "mission_result_missing" => Self::MissionResultMissing,
            "mission_result_invalid" => Self::MissionResultInvalid,
            "mission_result_turn_too_early" => Self::MissionResultTurnTooEarly,
            "campaign_lock" => Self::CampaignLock,
            "campaign_summary_parse" => Self::CampaignSummaryParse,
            "campaign_missing_attempt" => Self::CampaignMissingAttempt,
            "campaign_skipped" => Self::CampaignSkipped,
            other => return Err(ParseCodeError(other.to_string())),
        })
    }
}

impl Serialize for Code {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Code {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(|err: ParseCodeError| DeError::custom(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "test-only assertions")]

    use super::Code;

    #[test]
    fn usage_errors_exit_with_two_or_one() {
        assert_eq!(Code::Usage.exit_code(), 1);
        assert_eq!(Code::CampaignAttemptNotValid.exit_code(), 2);
        assert_eq!(Code::CampaignLock.exit_code(), 1);
    }

    #[test]
    fn display_is_snake_case() {
        assert_eq!(Code::MissionResultTurnTooEarly.to_string(), "mission_result_turn_too_early");
    }

    #[test]
    fn flow_exit_round_trips_through_string_form() {
        let code = Code::CampaignFlowExit(17);
        assert_eq!(code.to_string(), "campaign_flow_exit_17");
        assert_eq!("campaign_flow_exit_17".parse::<Code>().expect("parses"), code);
    }

    #[test]
    fn serializes_as_a_plain_string() {
        let json = serde_json::to_value(Code::CampaignFlowExit(2)).expect("serializes");
        assert_eq!(json, serde_json::json!("campaign_flow_exit_2"));
    }

    #[test]
    fn unknown_code_fails_to_parse() {
        assert!("not_a_real_code".parse::<Code>().is_err());
    }
}
