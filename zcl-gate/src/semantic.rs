// zcl-gate/src/semantic.rs
// ============================================================================
// Module: Semantic Gate
// Description: Declarative rule evaluation over `feedback.resultJson` (§4.I step 3).
// Purpose: Check non-empty-value and forbidden-placeholder rules against the
//          structured mission result, folding every violation into
//          `semantic_failed` rather than short-circuiting on the first one.
// Dependencies: ret-logic, serde_json, zcl-core
// ============================================================================

//! ## Overview
//! Every rule is evaluated even after one fails, so [`crate::fact::describe_failures`]
//! can report every failing pointer in a single pass.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use ret_logic::Requirement;
use ret_logic::TriState;
use ret_logic::convenience;
use serde_json::Value;

use zcl_core::model::SemanticRules;

use crate::fact::GateFact;

// ============================================================================
// SECTION: Facts
// ============================================================================

/// Value JSON pointer resolution is considered empty for a non-empty check.
fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

/// Builds the semantic-gate fact table from `rules` evaluated against
/// `result_json`. A missing `result_json` evaluates every pointer as
/// `Unknown` rather than `False`, letting Kleene logic fail the gate closed
/// without claiming certainty about a pointer that was never observable.
#[must_use]
pub fn facts(rules: &SemanticRules, result_json: Option<&Value>) -> BTreeMap<GateFact, TriState> {
    let mut facts = BTreeMap::new();
    for pointer in &rules.non_empty_json_pointers {
        let state = match result_json.and_then(|value| value.pointer(pointer)) {
            Some(value) => TriState::from(!is_empty_value(value)),
            None => TriState::Unknown,
        };
        facts.insert(GateFact::SemanticNonEmptyPointer(pointer.clone()), state);
    }
    for rule in &rules.placeholder_values {
        let state = match result_json.and_then(|value| value.pointer(&rule.pointer)) {
            Some(value) => TriState::from(value != &rule.forbidden_value),
            None => TriState::Unknown,
        };
        facts.insert(GateFact::SemanticPlaceholderOk(rule.pointer.clone()), state);
    }
    facts
}

// ============================================================================
// SECTION: Requirement
// ============================================================================

/// Builds the requirement tree requiring every declared rule to hold.
#[must_use]
pub fn requirement(rules: &SemanticRules) -> Requirement<GateFact> {
    let mut clauses = Vec::with_capacity(
        rules.non_empty_json_pointers.len() + rules.placeholder_values.len(),
    );
    for pointer in &rules.non_empty_json_pointers {
        clauses.push(convenience::predicate(GateFact::SemanticNonEmptyPointer(pointer.clone())));
    }
    for rule in &rules.placeholder_values {
        clauses.push(convenience::predicate(GateFact::SemanticPlaceholderOk(rule.pointer.clone())));
    }
    convenience::all(clauses)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "test-only assertions")]

    use zcl_core::model::PlaceholderRule;
    use zcl_core::model::SemanticRules;

    use super::facts;
    use super::requirement;

    #[test]
    fn an_empty_pointer_value_fails_the_non_empty_rule() {
        let rules = SemanticRules {
            non_empty_json_pointers: vec!["/answer".to_string()],
            placeholder_values: vec![],
        };
        let result = serde_json::json!({"answer": ""});
        let (status, _) = crate::fact::evaluate(&requirement(&rules), &facts(&rules, Some(&result)));
        assert_eq!(status, ret_logic::TriState::False);
    }

    #[test]
    fn a_forbidden_placeholder_fails_the_gate() {
        let rules = SemanticRules {
            non_empty_json_pointers: vec![],
            placeholder_values: vec![PlaceholderRule {
                pointer: "/answer".to_string(),
                forbidden_value: serde_json::json!("TODO"),
            }],
        };
        let result = serde_json::json!({"answer": "TODO"});
        let (status, _) = crate::fact::evaluate(&requirement(&rules), &facts(&rules, Some(&result)));
        assert_eq!(status, ret_logic::TriState::False);
    }

    #[test]
    fn a_missing_result_json_is_unknown_not_false() {
        let rules = SemanticRules {
            non_empty_json_pointers: vec!["/answer".to_string()],
            placeholder_values: vec![],
        };
        let (status, _) = crate::fact::evaluate(&requirement(&rules), &facts(&rules, None));
        assert_eq!(status, ret_logic::TriState::Unknown);
    }
}
