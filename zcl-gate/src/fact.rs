// zcl-gate/src/fact.rs
// ============================================================================
// Module: Gate Fact Predicate
// Description: The `ret-logic` predicate leaf shared by every gate dimension.
// Purpose: Let contract, trace-profile, and semantic rules compose as
//          `Requirement<GateFact>` trees instead of hand-rolled booleans.
// Dependencies: ret-logic
// ============================================================================

//! ## Overview
//! A [`GateFact`] names one piece of precomputed evidence; it carries no
//! evaluation logic of its own. A dimension module builds a
//! `BTreeMap<GateFact, TriState>` from an attempt's artifacts, wraps it in a
//! [`GateFactReader`], and evaluates a `Requirement<GateFact>` tree against
//! it under [`ret_logic::LogicMode::Kleene`] so a fact nobody computed
//! surfaces as `Unknown` rather than silently passing.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;

use ret_logic::LogicMode;
use ret_logic::RequirementTrace;
use ret_logic::TriState;
use ret_logic::TriStatePredicateEval;

// ============================================================================
// SECTION: Gate Fact
// ============================================================================

/// A single named fact a gate dimension evaluates its requirement tree over.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GateFact {
    /// `feedback.json` was written for this attempt.
    FeedbackPresent,
    /// `tool.calls.jsonl` exists.
    TracePresent,
    /// `tool.calls.jsonl` contains at least one event.
    TraceNonEmpty,
    /// The attempt did not time out before its first tool call.
    NotTimedOutBeforeFirstToolCall,
    /// The attempt's failure-code histogram records no `timeout` entries.
    NoTimeoutInFailureHistogram,
    /// At least one browser-category tool call was observed.
    BrowserToolCallSeen,
    /// At least one MCP-category tool call was observed.
    McpToolCallSeen,
    /// `feedback.resultJson` resolves the given JSON pointer to a non-empty value.
    SemanticNonEmptyPointer(String),
    /// `feedback.resultJson` does not equal the forbidden placeholder at the given pointer.
    SemanticPlaceholderOk(String),
}

impl fmt::Display for GateFact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FeedbackPresent => write!(f, "feedback_present"),
            Self::TracePresent => write!(f, "trace_present"),
            Self::TraceNonEmpty => write!(f, "trace_non_empty"),
            Self::NotTimedOutBeforeFirstToolCall => write!(f, "not_timed_out_before_first_tool_call"),
            Self::NoTimeoutInFailureHistogram => write!(f, "no_timeout_in_failure_histogram"),
            Self::BrowserToolCallSeen => write!(f, "browser_tool_call_seen"),
            Self::McpToolCallSeen => write!(f, "mcp_tool_call_seen"),
            Self::SemanticNonEmptyPointer(pointer) => write!(f, "non_empty_json_pointer({pointer})"),
            Self::SemanticPlaceholderOk(pointer) => write!(f, "placeholder_ok({pointer})"),
        }
    }
}

// ============================================================================
// SECTION: Fact Reader
// ============================================================================

/// Lookup table of precomputed facts, read by [`GateFact::eval_row_tristate`].
pub struct GateFactReader<'a> {
    facts: &'a BTreeMap<GateFact, TriState>,
}

impl<'a> GateFactReader<'a> {
    /// Wraps a precomputed fact table for evaluation.
    #[must_use]
    pub const fn new(facts: &'a BTreeMap<GateFact, TriState>) -> Self {
        Self { facts }
    }
}

impl TriStatePredicateEval for GateFact {
    type Reader<'a> = GateFactReader<'a>;

    fn eval_row_tristate(&self, reader: &Self::Reader<'_>, _row: usize) -> TriState {
        reader.facts.get(self).copied().unwrap_or(TriState::Unknown)
    }
}

// ============================================================================
// SECTION: Trace Collector
// ============================================================================

/// Collects `(fact, result)` pairs observed while evaluating a requirement
/// tree, used to describe which facts failed a dimension's gate.
#[derive(Default)]
pub struct GateTrace {
    /// Facts evaluated, in evaluation order.
    pub entries: Vec<(GateFact, TriState)>,
}

impl RequirementTrace<GateFact> for GateTrace {
    fn on_predicate_evaluated(&mut self, predicate: &GateFact, result: TriState) {
        self.entries.push((predicate.clone(), result));
    }
}

// ============================================================================
// SECTION: Evaluation Helper
// ============================================================================

/// Evaluates `requirement` against `facts` under Kleene tri-state logic,
/// returning the overall status and the per-fact trace.
#[must_use]
pub fn evaluate(
    requirement: &ret_logic::Requirement<GateFact>,
    facts: &BTreeMap<GateFact, TriState>,
) -> (TriState, Vec<(GateFact, TriState)>) {
    let reader = GateFactReader::new(facts);
    let mut trace = GateTrace::default();
    let status = requirement.eval_tristate_with_trace(&reader, 0, &LogicMode::Kleene, &mut trace);
    (status, trace.entries)
}

/// Renders the facts in `trace` that did not evaluate to `True`, for use as
/// a [`zcl_core::model::gate::GateReason`] detail string.
#[must_use]
pub fn describe_failures(trace: &[(GateFact, TriState)]) -> String {
    trace
        .iter()
        .filter(|(_, result)| !result.is_true())
        .map(|(fact, result)| format!("{fact}={result:?}"))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "test-only assertions")]

    use std::collections::BTreeMap;

    use ret_logic::TriState;
    use ret_logic::convenience;

    use super::GateFact;
    use super::describe_failures;
    use super::evaluate;

    #[test]
    fn a_missing_fact_evaluates_unknown_not_false() {
        let requirement = convenience::predicate(GateFact::FeedbackPresent);
        let facts = BTreeMap::new();
        let (status, _) = evaluate(&requirement, &facts);
        assert_eq!(status, TriState::Unknown);
    }

    #[test]
    fn an_all_requirement_fails_closed_on_one_false_fact() {
        let requirement = convenience::all(vec![
            convenience::predicate(GateFact::FeedbackPresent),
            convenience::predicate(GateFact::TraceNonEmpty),
        ]);
        let mut facts = BTreeMap::new();
        facts.insert(GateFact::FeedbackPresent, TriState::True);
        facts.insert(GateFact::TraceNonEmpty, TriState::False);
        let (status, trace) = evaluate(&requirement, &facts);
        assert_eq!(status, TriState::False);
        assert!(describe_failures(&trace).contains("trace_non_empty"));
    }
}
