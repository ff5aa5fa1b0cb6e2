// zcl-report/src/markdown.rs
// ============================================================================
// Module: Results Markdown
// Description: Deterministic `RESULTS.md` emitter (§4.K).
// Purpose: Render a `BuildReport`/`BuildSummary` pair into human-readable
//          Markdown whose byte content depends only on its inputs, never on
//          wall-clock time or map iteration order.
// Dependencies: std
// ============================================================================

//! ## Overview
//! [`render_results_md`] sorts every section it emits (missions by id, codes
//! by their already-ranked order) so two renders of the same report produce
//! byte-identical output, matching the evidence store's deterministic
//! persistence contract.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt::Write as _;

use crate::report::BuildReport;
use crate::summary::BuildSummary;

// ============================================================================
// SECTION: Rendering
// ============================================================================

/// Renders `report` and `summary` into the `RESULTS.md` Markdown document.
#[must_use]
pub fn render_results_md(campaign_id: &str, report: &BuildReport, summary: &BuildSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# Campaign Results: {campaign_id}");
    let _ = writeln!(out);
    let _ = writeln!(out, "Status: **{}**", report.status_label());
    let _ = writeln!(out);
    let _ = writeln!(out, "| Metric | Value |");
    let _ = writeln!(out, "|---|---|");
    let _ = writeln!(out, "| Gates passed | {} |", report.gates_passed);
    let _ = writeln!(out, "| Gates failed | {} |", report.gates_failed);
    let _ = writeln!(out, "| Mismatched self-reports | {} |", summary.mismatch_count);
    if let Some(tokens) = report.token_estimates {
        let _ = writeln!(out, "| Token estimate | {tokens} |");
    }
    let _ = writeln!(out);

    if !report.top_failure_codes.is_empty() {
        let _ = writeln!(out, "## Top failure codes");
        let _ = writeln!(out);
        for code in &report.top_failure_codes {
            let _ = writeln!(out, "- `{code}`");
        }
        let _ = writeln!(out);
    }

    let _ = writeln!(out, "## Missions");
    let _ = writeln!(out);
    let _ = writeln!(out, "| Mission | Claimed | Verified | Reasons |");
    let _ = writeln!(out, "|---|---|---|---|");
    let mut missions = summary.missions.clone();
    missions.sort_by(|left, right| left.mission_id.as_str().cmp(right.mission_id.as_str()));
    for mission in &missions {
        let claimed = match mission.claimed_ok {
            Some(true) => "ok",
            Some(false) => "fail",
            None => "none",
        };
        let reasons = if mission.mismatches.is_empty() {
            String::new()
        } else {
            mission.mismatches.iter().map(|reason| reason.code.to_string()).collect::<Vec<_>>().join(", ")
        };
        let _ = writeln!(
            out,
            "| {} | {claimed} | {} | {reasons} |",
            mission.mission_id,
            attempt_status_label(mission.verified_status)
        );
    }
    out
}

impl BuildReport {
    /// Returns a lowercase label for this report's status, for Markdown output.
    fn status_label(&self) -> &'static str {
        match self.status {
            zcl_core::model::RunStatus::Running => "running",
            zcl_core::model::RunStatus::Valid => "valid",
            zcl_core::model::RunStatus::Invalid => "invalid",
            zcl_core::model::RunStatus::InfraFailed => "infra_failed",
            zcl_core::model::RunStatus::Aborted => "aborted",
        }
    }
}

/// Returns a lowercase label for an [`zcl_core::model::AttemptStatus`].
fn attempt_status_label(status: zcl_core::model::AttemptStatus) -> &'static str {
    match status {
        zcl_core::model::AttemptStatus::Valid => "valid",
        zcl_core::model::AttemptStatus::Invalid => "invalid",
        zcl_core::model::AttemptStatus::Skipped => "skipped",
        zcl_core::model::AttemptStatus::InfraFailed => "infra_failed",
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "test-only assertions")]

    use super::render_results_md;
    use crate::report::BuildReport;
    use crate::summary::BuildSummary;
    use crate::summary::MissionDelta;

    #[test]
    fn rendering_is_deterministic() {
        let report = BuildReport {
            status: zcl_core::model::RunStatus::Valid,
            gates_passed: 2,
            gates_failed: 0,
            top_failure_codes: Vec::new(),
            token_estimates: Some(10),
        };
        let summary = BuildSummary {
            missions: vec![MissionDelta {
                mission_id: zcl_core::ids::MissionId::new("m0").expect("valid id"),
                claimed_ok: Some(true),
                verified_status: zcl_core::model::AttemptStatus::Valid,
                mismatches: Vec::new(),
            }],
            mismatch_count: 0,
        };
        let first = render_results_md("cmp-int", &report, &summary);
        let second = render_results_md("cmp-int", &report, &summary);
        assert_eq!(first, second);
        assert!(first.contains("Status: **valid**"));
        assert!(first.contains("| m0 | ok |"));
    }
}
