// zcl-gate/src/tool_policy.rs
// ============================================================================
// Module: Tool-Policy Gate
// Description: Allow-list enforcement over the recorded tool-call stream
//              (§4.I step 5).
// Purpose: Flag every recorded call outside a flow's declared allow-list,
//          and lint malformed allow-list entries before a run starts.
// Dependencies: zcl-core, zcl-evidence
// ============================================================================

//! ## Overview
//! Lint and runtime enforcement are deliberately separate: [`validate`] is a
//! pure, pre-run check (an empty entry is a configuration mistake, not a
//! runtime fact), while [`violations`] scans an attempt's actual trace.

// ============================================================================
// SECTION: Imports
// ============================================================================

use zcl_core::Code;
use zcl_core::model::GateReason;
use zcl_core::model::ToolPolicy;
use zcl_core::model::ToolPolicyEntry;
use zcl_evidence::TraceEvent;

// ============================================================================
// SECTION: Lint
// ============================================================================

/// Validates that every allow-list entry specifies at least one of
/// `namespace`/`prefix`.
///
/// # Errors
///
/// Returns [`Code::CampaignToolPolicyInvalid`] when any entry specifies
/// neither field.
pub fn validate(policy: &ToolPolicy) -> Result<(), Code> {
    let well_formed =
        policy.allow.iter().all(|entry| entry.namespace.is_some() || entry.prefix.is_some());
    if well_formed { Ok(()) } else { Err(Code::CampaignToolPolicyInvalid) }
}

// ============================================================================
// SECTION: Enforcement
// ============================================================================

/// Returns whether `event` is permitted by `entry`.
fn entry_allows(entry: &ToolPolicyEntry, event: &TraceEvent) -> bool {
    let namespace_ok = entry.namespace.as_deref().is_none_or(|ns| ns == event.tool);
    let prefix_ok = entry.prefix.as_deref().is_none_or(|prefix| event.op.starts_with(prefix));
    namespace_ok && prefix_ok
}

/// Scans `events` for calls outside `policy`'s allow-list, returning one
/// [`GateReason`] per violating event.
#[must_use]
pub fn violations(policy: &ToolPolicy, events: &[TraceEvent]) -> Vec<GateReason> {
    events
        .iter()
        .filter(|event| !policy.allow.iter().any(|entry| entry_allows(entry, event)))
        .map(|event| {
            GateReason::with_detail(
                Code::ToolPolicyViolation,
                format!("{tool}.{op}", tool = event.tool, op = event.op),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "test-only assertions")]

    use zcl_core::ids::AgentId;
    use zcl_core::ids::AttemptId;
    use zcl_core::ids::MissionId;
    use zcl_core::ids::RunId;
    use zcl_core::ids::SuiteId;
    use zcl_core::model::ToolPolicy;
    use zcl_core::model::ToolPolicyEntry;
    use zcl_core::time::Timestamp;
    use zcl_evidence::TraceIntegrity;
    use zcl_evidence::TraceIo;
    use zcl_evidence::TraceResult;

    use super::TraceEvent;
    use super::validate;
    use super::violations;

    fn event(tool: &str, op: &str) -> TraceEvent {
        TraceEvent {
            v: 1,
            ts: Timestamp::from_unix_millis(0),
            run_id: RunId::new("r0").expect("valid id"),
            suite_id: SuiteId::new("s0").expect("valid id"),
            mission_id: MissionId::new("m0").expect("valid id"),
            attempt_id: AttemptId::new("a0").expect("valid id"),
            agent_id: AgentId::new("agent").expect("valid id"),
            tool: tool.to_string(),
            op: op.to_string(),
            input: serde_json::json!({}),
            result: TraceResult { ok: true, exit_code: None, duration_ms: 1, spawn_error: None },
            io: TraceIo {
                out_bytes: 0,
                err_bytes: 0,
                out_preview: String::new(),
                err_preview: String::new(),
                out_truncated: false,
                err_truncated: false,
            },
            integrity: TraceIntegrity { truncated: None },
        }
    }

    #[test]
    fn an_empty_allow_list_entry_fails_validation() {
        let policy = ToolPolicy { allow: vec![ToolPolicyEntry { namespace: None, prefix: None }] };
        assert!(validate(&policy).is_err());
    }

    #[test]
    fn a_call_outside_the_allow_list_is_a_violation() {
        let policy = ToolPolicy {
            allow: vec![ToolPolicyEntry {
                namespace: Some("mcp".to_string()),
                prefix: None,
            }],
        };
        let events = vec![event("browser", "click")];
        let found = violations(&policy, &events);
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn an_allowed_call_produces_no_violation() {
        let policy = ToolPolicy {
            allow: vec![ToolPolicyEntry {
                namespace: Some("mcp".to_string()),
                prefix: Some("read_".to_string()),
            }],
        };
        let events = vec![event("mcp", "read_file")];
        assert!(violations(&policy, &events).is_empty());
    }
}
