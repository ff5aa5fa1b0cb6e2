// zcl-report/src/lib.rs
// ============================================================================
// Crate: zcl-report
// Description: Reporter & Publish-Check (§4.K). Aggregates a campaign's run
//              state into machine-readable and Markdown artifacts, then
//              gates whether the run may be published outside evaluation.
// Purpose: Give the Campaign Engine and the `campaign report`/`publish-check`
//          CLI surfaces one place that turns `CampaignRunState` into
//          `campaign.report.json`, `campaign.summary.json`, and `RESULTS.md`.
// ============================================================================

//! # zcl-report
//!
//! [`report::build_report`] and [`summary::build_summary`] are pure
//! functions over an already-persisted [`zcl_core::model::CampaignRunState`];
//! this crate performs no I/O of its own. [`markdown::render_results_md`]
//! renders the same inputs deterministically, and [`publish_check::check`]
//! applies the publish-gate predicate described in §4.K.

#![deny(missing_docs)]

pub mod markdown;
pub mod publish_check;
pub mod report;
pub mod summary;

pub use publish_check::PublishCheckRequest;
pub use publish_check::PublishCheckResult;
pub use publish_check::check as publish_check;
pub use report::BuildReport;
pub use report::build_report;
pub use summary::BuildSummary;
pub use summary::MissionDelta;
pub use summary::build_summary;
