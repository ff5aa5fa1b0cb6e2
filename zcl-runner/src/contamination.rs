// zcl-runner/src/contamination.rs
// ============================================================================
// Module: Blind-Mode Contamination Scan
// Description: Scans a mission prompt for harness vocabulary before spawn
//              (§4.G step 2).
// Purpose: Refuse to run a blind-mode attempt whose prompt leaks evidence of
//          the harness, synthesizing `CONTAMINATED_PROMPT` feedback instead
//          of dispatching to a runner.
// Dependencies: none (pure)
// ============================================================================

//! ## Overview
//! The built-in term list names the harness's own vocabulary; suites may
//! extend it via `SuiteDefaults::blind_terms`. Matching is case-insensitive
//! substring search, consistent with the suite's own contamination-term
//! authoring style (plain words, not regular expressions).

// ============================================================================
// SECTION: Built-In Terms
// ============================================================================

/// Harness vocabulary scanned for by default when `blind=true`.
const BUILT_IN_TERMS: &[&str] = &["zcl", "feedback.json", "attempt.json", "suite runner", "runner-driver"];

// ============================================================================
// SECTION: Scan
// ============================================================================

/// Returns the first contamination term found in `prompt`, case-insensitively,
/// checking the built-in list before `extra_terms`.
#[must_use]
pub fn scan(prompt: &str, extra_terms: &[String]) -> Option<String> {
    let lowered = prompt.to_ascii_lowercase();
    for term in BUILT_IN_TERMS {
        if lowered.contains(&term.to_ascii_lowercase()) {
            return Some((*term).to_string());
        }
    }
    for term in extra_terms {
        if !term.is_empty() && lowered.contains(&term.to_ascii_lowercase()) {
            return Some(term.clone());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::scan;

    #[test]
    fn clean_prompt_is_not_contaminated() {
        assert_eq!(scan("write a function that reverses a list", &[]), None);
    }

    #[test]
    fn built_in_term_is_detected_case_insensitively() {
        assert_eq!(scan("Please check ZCL_RESULT_JSON", &[]), Some("zcl".to_string()));
    }

    #[test]
    fn suite_supplied_term_is_detected() {
        let extra = vec!["codename-falcon".to_string()];
        assert_eq!(scan("the project codename-falcon ships today", &extra), Some("codename-falcon".to_string()));
    }
}
