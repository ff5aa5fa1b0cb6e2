// zcl-core/src/prompt_policy.rs
// ============================================================================
// Module: Prompt Vocabulary Policy
// Description: Pure `mission_only`/`exam` prompt-mode vocabulary check
//              (§4.J step 3).
// Purpose: Shared by the Campaign Engine (pre-run lint) and the Reporter's
//          post-hoc `publish-check` compliance re-scan, so both sides apply
//          the exact same rule.
// Dependencies: none
// ============================================================================

//! ## Overview
//! `mission_only` prompts must not reference harness vocabulary: the engine
//! name, its artifact concepts, or a runner-driver name. The scan is
//! case-insensitive and whole-word, so a mission whose answer legitimately
//! contains e.g. `"suitcase"` is not flagged for containing `"suit"`.

// ============================================================================
// SECTION: Vocabulary
// ============================================================================

/// Harness vocabulary terms forbidden from a `mission_only` prompt.
pub const BANNED_TERMS: &[&str] =
    &["zcl", "feedback", "suite", "attempt", "mission_id", "flow_id", "oracle", "gate"];

/// Returns the first banned term found in `prompt`, case-insensitively and
/// on word boundaries, or `None` if the prompt is clean.
#[must_use]
pub fn mission_only_violation(prompt: &str) -> Option<&'static str> {
    let lower = prompt.to_lowercase();
    BANNED_TERMS.iter().copied().find(|term| contains_word(&lower, term))
}

/// Returns whether `haystack` contains `needle` on a word boundary (not as
/// a substring of a longer word).
fn contains_word(haystack: &str, needle: &str) -> bool {
    haystack.split(|c: char| !c.is_alphanumeric() && c != '_').any(|word| word == needle)
}

#[cfg(test)]
mod tests {
    use super::mission_only_violation;

    #[test]
    fn a_clean_prompt_has_no_violation() {
        assert_eq!(mission_only_violation("Summarize the attached report."), None);
    }

    #[test]
    fn a_harness_word_is_flagged_case_insensitively() {
        assert_eq!(mission_only_violation("Check the Feedback file."), Some("feedback"));
    }

    #[test]
    fn a_substring_match_is_not_flagged() {
        assert_eq!(mission_only_violation("Pack a suitcase for the trip."), None);
    }
}
