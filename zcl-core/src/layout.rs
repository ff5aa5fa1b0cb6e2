// zcl-core/src/layout.rs
// ============================================================================
// Module: Filesystem Layout
// Description: Path construction helpers for the on-disk evidence tree.
// Purpose: Centralize the filesystem layout table from §6 EXTERNAL INTERFACES
//          so every crate builds paths the same way.
// Dependencies: crate::ids
// ============================================================================

//! ## Overview
//! All paths are relative to an `outRoot` (default `.zcl`). This module only
//! builds [`PathBuf`]s; it performs no I/O. See `zcl-evidence` for the
//! atomic-write layer that actually touches the filesystem.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;

use crate::ids::AttemptId;
use crate::ids::CampaignId;
use crate::ids::FlowId;
use crate::ids::MissionId;
use crate::ids::RetryIndex;
use crate::ids::RunId;

// ============================================================================
// SECTION: Default Output Root
// ============================================================================

/// Default output root directory name, relative to the working directory.
pub const DEFAULT_OUT_ROOT: &str = ".zcl";

// ============================================================================
// SECTION: Run Layout
// ============================================================================

/// Path to `runs/<runId>/`.
#[must_use]
pub fn run_dir(out_root: &Path, run_id: &RunId) -> PathBuf {
    out_root.join("runs").join(run_id.as_str())
}

/// Path to `runs/<runId>/run.json`.
#[must_use]
pub fn run_json(out_root: &Path, run_id: &RunId) -> PathBuf {
    run_dir(out_root, run_id).join("run.json")
}

/// Path to `runs/<runId>/suite.run.summary.json`.
#[must_use]
pub fn suite_run_summary_json(out_root: &Path, run_id: &RunId) -> PathBuf {
    run_dir(out_root, run_id).join("suite.run.summary.json")
}

/// Path to an attempt's directory:
/// `runs/<runId>/attempts/NNN-<missionId>-r<retry>/`.
#[must_use]
pub fn attempt_dir(
    out_root: &Path,
    run_id: &RunId,
    mission_index: u32,
    mission_id: &MissionId,
    retry: RetryIndex,
) -> PathBuf {
    run_dir(out_root, run_id)
        .join("attempts")
        .join(format!("{mission_index:03}-{mission_id}-r{retry}"))
}

/// Path to `attempt.json` within an attempt directory.
#[must_use]
pub fn attempt_json(attempt_dir: &Path) -> PathBuf {
    attempt_dir.join("attempt.json")
}

/// Path to `prompt.txt` within an attempt directory.
#[must_use]
pub fn prompt_txt(attempt_dir: &Path) -> PathBuf {
    attempt_dir.join("prompt.txt")
}

/// Path to the canonical `suite.json` snapshot within an attempt directory.
#[must_use]
pub fn suite_json(attempt_dir: &Path) -> PathBuf {
    attempt_dir.join("suite.json")
}

/// Path to `feedback.json` within an attempt directory.
#[must_use]
pub fn feedback_json(attempt_dir: &Path) -> PathBuf {
    attempt_dir.join("feedback.json")
}

/// Path to `attempt.report.json` within an attempt directory.
#[must_use]
pub fn attempt_report_json(attempt_dir: &Path) -> PathBuf {
    attempt_dir.join("attempt.report.json")
}

/// Path to the append-only tool-call trace within an attempt directory.
#[must_use]
pub fn tool_calls_jsonl(attempt_dir: &Path) -> PathBuf {
    attempt_dir.join("tool.calls.jsonl")
}

/// Path to `runner.command.txt` within an attempt directory.
#[must_use]
pub fn runner_command_txt(attempt_dir: &Path) -> PathBuf {
    attempt_dir.join("runner.command.txt")
}

/// Path to `runner.stdout.log` within an attempt directory.
#[must_use]
pub fn runner_stdout_log(attempt_dir: &Path) -> PathBuf {
    attempt_dir.join("runner.stdout.log")
}

/// Path to `runner.stderr.log` within an attempt directory.
#[must_use]
pub fn runner_stderr_log(attempt_dir: &Path) -> PathBuf {
    attempt_dir.join("runner.stderr.log")
}

/// Path to `runner.ref.json` within an attempt directory (native mode only).
#[must_use]
pub fn runner_ref_json(attempt_dir: &Path) -> PathBuf {
    attempt_dir.join("runner.ref.json")
}

/// Path to the mission result file within an attempt directory, for
/// `result_channel.kind = file_json` (default name `mission.result.json`).
#[must_use]
pub fn mission_result_json(attempt_dir: &Path, result_file: &str) -> PathBuf {
    attempt_dir.join(result_file)
}

/// Path to a CLI-capture log file under `captures/cli/<nanots>.<stream>.log`.
#[must_use]
pub fn capture_log(attempt_dir: &Path, nanots: u128, stream: &str) -> PathBuf {
    attempt_dir.join("captures").join("cli").join(format!("{nanots}.{stream}.log"))
}

/// Path to `oracle.verdict.json` within an attempt directory (oracle mode only).
#[must_use]
pub fn oracle_verdict_json(attempt_dir: &Path) -> PathBuf {
    attempt_dir.join("oracle.verdict.json")
}

// ============================================================================
// SECTION: Campaign Layout
// ============================================================================

/// Path to `campaigns/<campaignId>/`.
#[must_use]
pub fn campaign_dir(out_root: &Path, campaign_id: &CampaignId) -> PathBuf {
    out_root.join("campaigns").join(campaign_id.as_str())
}

/// Path to the campaign lock directory, whose presence gates ownership.
#[must_use]
pub fn campaign_lock_dir(out_root: &Path, campaign_id: &CampaignId) -> PathBuf {
    campaign_dir(out_root, campaign_id).join("campaign.lock")
}

/// Path to `campaign.lock/owner.json`.
#[must_use]
pub fn campaign_lock_owner_json(out_root: &Path, campaign_id: &CampaignId) -> PathBuf {
    campaign_lock_dir(out_root, campaign_id).join("owner.json")
}

/// Path to `campaign.run.state.json`.
#[must_use]
pub fn campaign_run_state_json(out_root: &Path, campaign_id: &CampaignId) -> PathBuf {
    campaign_dir(out_root, campaign_id).join("campaign.run.state.json")
}

/// Path to `campaign.progress.jsonl`.
#[must_use]
pub fn campaign_progress_jsonl(out_root: &Path, campaign_id: &CampaignId) -> PathBuf {
    campaign_dir(out_root, campaign_id).join("campaign.progress.jsonl")
}

/// Path to `campaign.report.json`.
#[must_use]
pub fn campaign_report_json(out_root: &Path, campaign_id: &CampaignId) -> PathBuf {
    campaign_dir(out_root, campaign_id).join("campaign.report.json")
}

/// Path to `campaign.summary.json`.
#[must_use]
pub fn campaign_summary_json(out_root: &Path, campaign_id: &CampaignId) -> PathBuf {
    campaign_dir(out_root, campaign_id).join("campaign.summary.json")
}

/// Path to `RESULTS.md`.
#[must_use]
pub fn results_md(out_root: &Path, campaign_id: &CampaignId) -> PathBuf {
    campaign_dir(out_root, campaign_id).join("RESULTS.md")
}

/// Path to a flow's synthesized suite snapshot under `generated-suites/`.
#[must_use]
pub fn generated_suite_json(out_root: &Path, campaign_id: &CampaignId, flow_id: &FlowId) -> PathBuf {
    campaign_dir(out_root, campaign_id)
        .join("generated-suites")
        .join(format!("{flow_id}.suite.json"))
}

/// Builds the `attempt_id` composed of `<missionIndex>-<missionId>-r<retry>`,
/// matching the on-disk attempt directory name without the run scope.
///
/// # Errors
///
/// Returns [`crate::ids::IdError`] if the composed string somehow exceeds
/// [`crate::ids::MAX_ID_LEN`]; sanitized `mission_id` inputs never otherwise
/// produce an invalid character here.
pub fn attempt_id_for(
    mission_index: u32,
    mission_id: &MissionId,
    retry: RetryIndex,
) -> Result<AttemptId, crate::ids::IdError> {
    AttemptId::new(format!("{mission_index:03}-{mission_id}-r{retry}"))
}
