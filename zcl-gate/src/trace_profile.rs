// zcl-gate/src/trace_profile.rs
// ============================================================================
// Module: Trace Profile Gate
// Description: Structural requirements on the tool-call stream (§4.I step 2).
// Purpose: Require `strict_browser_comparison` or `mcp_required` flows to
//          have observed at least one tool call of the matching category.
// Dependencies: ret-logic, zcl-core, zcl-evidence
// ============================================================================

//! ## Overview
//! `TraceProfile::None` has no requirement tree at all: [`requirement`]
//! returns `None` and the caller skips this dimension entirely rather than
//! evaluating a trivially-satisfied tree.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use ret_logic::Requirement;
use ret_logic::TriState;
use ret_logic::convenience;

use zcl_core::Code;
use zcl_core::model::TraceProfile;
use zcl_evidence::TraceEvent;

use crate::fact::GateFact;

// ============================================================================
// SECTION: Category Detection
// ============================================================================

/// Tool namespace considered "browser-category" for `strict_browser_comparison`.
const BROWSER_NAMESPACE: &str = "browser";

/// Tool namespace considered "MCP-category" for `mcp_required`.
const MCP_NAMESPACE: &str = "mcp";

// ============================================================================
// SECTION: Facts
// ============================================================================

/// Builds the trace-profile fact table from the attempt's recorded events.
#[must_use]
pub fn facts(events: &[TraceEvent]) -> BTreeMap<GateFact, TriState> {
    let browser_seen = events.iter().any(|event| event.tool == BROWSER_NAMESPACE);
    let mcp_seen = events.iter().any(|event| event.tool == MCP_NAMESPACE);
    let mut facts = BTreeMap::new();
    facts.insert(GateFact::BrowserToolCallSeen, TriState::from(browser_seen));
    facts.insert(GateFact::McpToolCallSeen, TriState::from(mcp_seen));
    facts
}

// ============================================================================
// SECTION: Requirement
// ============================================================================

/// Builds the requirement tree for `profile`, or `None` when no structural
/// requirement applies.
#[must_use]
pub fn requirement(profile: TraceProfile) -> Option<Requirement<GateFact>> {
    match profile {
        TraceProfile::None => None,
        TraceProfile::StrictBrowserComparison => {
            Some(convenience::predicate(GateFact::BrowserToolCallSeen))
        }
        TraceProfile::McpRequired => Some(convenience::predicate(GateFact::McpToolCallSeen)),
    }
}

/// The reason code a failure of `profile`'s requirement should be reported
/// under.
#[must_use]
pub const fn code_for(profile: TraceProfile) -> Code {
    match profile {
        TraceProfile::None | TraceProfile::StrictBrowserComparison => Code::CampaignTraceGate,
        TraceProfile::McpRequired => Code::CampaignTraceProfileMcpRequired,
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "test-only assertions")]

    use zcl_core::ids::AgentId;
    use zcl_core::ids::AttemptId;
    use zcl_core::ids::MissionId;
    use zcl_core::ids::RunId;
    use zcl_core::ids::SuiteId;
    use zcl_core::time::Timestamp;
    use zcl_evidence::TraceIntegrity;
    use zcl_evidence::TraceIo;
    use zcl_evidence::TraceResult;

    use super::TraceEvent;
    use super::facts;
    use super::requirement;

    fn event(tool: &str) -> TraceEvent {
        TraceEvent {
            v: 1,
            ts: Timestamp::from_unix_millis(0),
            run_id: RunId::new("r0").expect("valid id"),
            suite_id: SuiteId::new("s0").expect("valid id"),
            mission_id: MissionId::new("m0").expect("valid id"),
            attempt_id: AttemptId::new("a0").expect("valid id"),
            agent_id: AgentId::new("agent").expect("valid id"),
            tool: tool.to_string(),
            op: "call".to_string(),
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
    fn no_profile_has_no_requirement() {
        assert!(requirement(zcl_core::model::TraceProfile::None).is_none());
    }

    #[test]
    fn mcp_required_fails_without_an_mcp_call() {
        let events = vec![event("browser")];
        let req = requirement(zcl_core::model::TraceProfile::McpRequired).expect("some");
        let (status, _) = crate::fact::evaluate(&req, &facts(&events));
        assert_eq!(status, ret_logic::TriState::False);
    }

    #[test]
    fn strict_browser_comparison_passes_with_a_browser_call() {
        let events = vec![event("browser")];
        let req =
            requirement(zcl_core::model::TraceProfile::StrictBrowserComparison).expect("some");
        let (status, _) = crate::fact::evaluate(&req, &facts(&events));
        assert_eq!(status, ret_logic::TriState::True);
    }
}
