// zcl-gate/src/contract.rs
// ============================================================================
// Module: Contract Gate
// Description: Artifact-presence and timeout sub-checks (§4.I step 1).
// Purpose: Require that an attempt produced a complete, non-timed-out
//          evidence trail before any later gate dimension runs.
// Dependencies: ret-logic, zcl-core
// ============================================================================

//! ## Overview
//! The contract gate reads only `attempt.report.json`'s already-computed
//! fields; it never re-reads the trace or feedback files itself.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use ret_logic::Requirement;
use ret_logic::TriState;
use ret_logic::convenience;

use zcl_core::model::AttemptReport;

use crate::fact::GateFact;

// ============================================================================
// SECTION: Facts
// ============================================================================

/// Builds the contract-gate fact table from a sealed attempt report.
#[must_use]
pub fn facts(report: &AttemptReport) -> BTreeMap<GateFact, TriState> {
    let mut facts = BTreeMap::new();
    facts.insert(GateFact::FeedbackPresent, TriState::from(report.integrity.feedback_present));
    facts.insert(GateFact::TracePresent, TriState::from(report.integrity.trace_present));
    facts.insert(GateFact::TraceNonEmpty, TriState::from(report.integrity.trace_non_empty));
    facts.insert(
        GateFact::NotTimedOutBeforeFirstToolCall,
        TriState::from(!report.timed_out_before_first_tool_call),
    );
    let timeout_count = report.failure_code_histogram.get("timeout").copied().unwrap_or(0);
    facts.insert(GateFact::NoTimeoutInFailureHistogram, TriState::from(timeout_count == 0));
    facts
}

// ============================================================================
// SECTION: Requirement
// ============================================================================

/// The contract gate's fixed requirement tree: every sub-check must hold.
#[must_use]
pub fn requirement() -> Requirement<GateFact> {
    convenience::all(vec![
        convenience::predicate(GateFact::FeedbackPresent),
        convenience::predicate(GateFact::TracePresent),
        convenience::predicate(GateFact::TraceNonEmpty),
        convenience::predicate(GateFact::NotTimedOutBeforeFirstToolCall),
        convenience::predicate(GateFact::NoTimeoutInFailureHistogram),
    ])
}
