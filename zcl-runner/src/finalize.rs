// zcl-runner/src/finalize.rs
// ============================================================================
// Module: Finalization Policy
// Description: Resolves `feedback.json` from runner outcome (§4.H).
// Purpose: Selects one of `strict`/`auto_fail`/`auto_from_result_json`,
//          reads or synthesizes the terminal [`Feedback`] artifact, and
//          reports which reason codes (if any) the synthesis carries.
// Dependencies: zcl-sources, zcl-core, zcl-evidence
// ============================================================================

//! ## Overview
//! A runner is free to write `feedback.json` itself; when present, it is
//! read as-is and the configured mode never runs. Only a missing artifact
//! triggers the mode's own behavior. Auto-finalization via
//! `auto_from_result_json` is suppressed (falls back to `auto_fail`) when
//! the runner process never produced a clean exit, since a crashed or
//! errored runner cannot be trusted to have written a coherent result
//! channel payload.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;

use zcl_core::Code;
use zcl_core::model::attempt::Feedback;
use zcl_core::model::campaign::FinalizationConfig;
use zcl_core::model::campaign::FinalizationMode;
use zcl_core::model::campaign::ResultChannelConfig;
use zcl_core::model::campaign::ResultChannelKind;
use zcl_core::time::Timestamp;
use zcl_evidence::EvidenceRoot;
use zcl_sources::result_channel;

use crate::error::RunnerError;

// ============================================================================
// SECTION: Runner Outcome
// ============================================================================

/// What actually happened when the runner process or native session ran,
/// independent of whether it wrote `feedback.json` itself.
pub struct RunnerOutcome<'a> {
    /// `Some(code)` for a process that ran and exited; `None` for a native
    /// session (exit codes do not apply) or a process that never spawned.
    pub exit_code: Option<i32>,
    /// `true` when the process never actually ran (a harness spawn error).
    pub spawn_failed: bool,
    /// `true` when the runtime/session layer itself reported an error.
    pub runner_errored: bool,
    /// `true` when the attempt's deadline elapsed before completion.
    pub timed_out: bool,
    /// Captured stdout tail, used by `stdout_json` result channels.
    pub stdout_tail: &'a str,
}

impl RunnerOutcome<'_> {
    /// A clean run is one that actually produced a process/session exit
    /// with no harness-side error — the only case `auto_from_result_json`
    /// is trusted to run as configured.
    fn is_clean(&self) -> bool {
        !self.spawn_failed && !self.runner_errored && matches!(self.exit_code, None | Some(0))
    }
}

// ============================================================================
// SECTION: Finalization Outcome
// ============================================================================

/// The result of applying the finalization policy to one attempt.
pub struct FinalizeOutcome {
    /// The resolved feedback, present unless `strict` mode left it missing.
    pub feedback: Option<Feedback>,
    /// `true` when this module synthesized `feedback` itself (i.e. the
    /// runner did not write `feedback.json`).
    pub synthesized: bool,
    /// Reason code recorded in the attempt's failure histogram, if any.
    pub failure_code: Option<Code>,
}

// ============================================================================
// SECTION: Finalize
// ============================================================================

/// Resolves `feedback.json` for one attempt under `attempt_dir`.
///
/// # Errors
///
/// Returns [`RunnerError::Evidence`] if the existing `feedback.json` cannot
/// be read for an I/O reason other than not-existing.
pub fn finalize(
    attempt_dir: &Path,
    config: &FinalizationConfig,
    outcome: &RunnerOutcome<'_>,
    created_at: Timestamp,
) -> Result<FinalizeOutcome, RunnerError> {
    if let Some(feedback) = read_existing_feedback(attempt_dir)? {
        return Ok(FinalizeOutcome { feedback: Some(feedback), synthesized: false, failure_code: None });
    }

    let mode = effective_mode(config.mode, outcome);
    match mode {
        FinalizationMode::Strict => {
            Ok(FinalizeOutcome { feedback: None, synthesized: false, failure_code: Some(Code::MissingArtifact) })
        }
        FinalizationMode::AutoFail => {
            let code = infra_failure_code(outcome);
            let feedback = synthesize_infra_failure(code, outcome.timed_out, created_at);
            Ok(FinalizeOutcome { feedback: Some(feedback), synthesized: true, failure_code: Some(code) })
        }
        FinalizationMode::AutoFromResultJson => {
            let Some(channel) = config.result_channel.as_ref() else {
                let code = Code::MissingArtifact;
                let feedback = synthesize_infra_failure(code, outcome.timed_out, created_at);
                return Ok(FinalizeOutcome { feedback: Some(feedback), synthesized: true, failure_code: Some(code) });
            };
            Ok(read_result_channel(attempt_dir, channel, outcome, created_at))
        }
    }
}

/// `auto_from_result_json` degrades to `auto_fail` once the runner did not
/// produce a trustworthy exit; every other mode runs as configured.
fn effective_mode(configured: FinalizationMode, outcome: &RunnerOutcome<'_>) -> FinalizationMode {
    if configured == FinalizationMode::AutoFromResultJson && !outcome.is_clean() {
        FinalizationMode::AutoFail
    } else {
        configured
    }
}

fn infra_failure_code(outcome: &RunnerOutcome<'_>) -> Code {
    if outcome.timed_out {
        Code::Timeout
    } else if outcome.spawn_failed {
        Code::Spawn
    } else {
        Code::MissingArtifact
    }
}

fn read_existing_feedback(attempt_dir: &Path) -> Result<Option<Feedback>, RunnerError> {
    let path = zcl_core::layout::feedback_json(attempt_dir);
    match std::fs::read_to_string(&path) {
        Ok(raw) => Ok(serde_json::from_str(&raw).ok()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(RunnerError::Io(err)),
    }
}

fn synthesize_infra_failure(code: Code, timed_out: bool, created_at: Timestamp) -> Feedback {
    let mut decision_tags = vec!["blocked".to_string()];
    if timed_out {
        decision_tags.push("timeout".to_string());
    }
    Feedback {
        ok: false,
        result: None,
        result_json: Some(serde_json::json!({
            "kind": "infra_failure",
            "source": "suite_run",
            "code": code.to_string(),
        })),
        decision_tags,
        classification: None,
        created_at,
    }
}

fn read_result_channel(
    attempt_dir: &Path,
    channel: &ResultChannelConfig,
    outcome: &RunnerOutcome<'_>,
    created_at: Timestamp,
) -> FinalizeOutcome {
    let payload = match channel.kind {
        ResultChannelKind::None => {
            let code = infra_failure_code(outcome);
            return FinalizeOutcome {
                feedback: Some(synthesize_infra_failure(code, outcome.timed_out, created_at)),
                synthesized: true,
                failure_code: Some(code),
            };
        }
        ResultChannelKind::FileJson => result_channel::read_file_json(attempt_dir, &channel.result_file),
        ResultChannelKind::StdoutJson => {
            result_channel::read_stdout_json(outcome.stdout_tail, &channel.marker)
        }
    };

    let payload = match payload {
        Ok(payload) => payload,
        Err(err) => {
            let code = err.code();
            return FinalizeOutcome {
                feedback: Some(synthesize_infra_failure(code, outcome.timed_out, created_at)),
                synthesized: true,
                failure_code: Some(code),
            };
        }
    };

    match result_channel::decode_payload(payload, channel.result_min_turn, created_at) {
        Ok(feedback) => FinalizeOutcome { feedback: Some(feedback), synthesized: true, failure_code: None },
        Err(err) => {
            let code = err.code();
            FinalizeOutcome {
                feedback: Some(synthesize_infra_failure(code, outcome.timed_out, created_at)),
                synthesized: true,
                failure_code: Some(code),
            }
        }
    }
}

/// Persists `feedback` as `feedback.json`, atomically, for any outcome this
/// module synthesized (a runner-written feedback is never overwritten by
/// this function since [`finalize`] only synthesizes when none exists).
///
/// # Errors
///
/// Returns [`RunnerError::Evidence`] if the write fails.
pub fn persist_feedback(attempt_dir: &Path, feedback: &Feedback) -> Result<(), RunnerError> {
    let root = EvidenceRoot::open_or_create(attempt_dir)?;
    root.write_json_atomic(Path::new("feedback.json"), feedback)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "test-only assertions")]

    use tempfile::tempdir;

    use super::RunnerOutcome;
    use super::finalize;
    use zcl_core::model::campaign::FinalizationConfig;
    use zcl_core::model::campaign::FinalizationMode;
    use zcl_core::model::campaign::ResultChannelConfig;
    use zcl_core::model::campaign::ResultChannelKind;
    use zcl_core::time::Timestamp;

    fn clean_outcome<'a>(tail: &'a str) -> RunnerOutcome<'a> {
        RunnerOutcome { exit_code: Some(0), spawn_failed: false, runner_errored: false, timed_out: false, stdout_tail: tail }
    }

    #[test]
    fn strict_mode_leaves_missing_feedback_missing() {
        let dir = tempdir().unwrap();
        let config = FinalizationConfig { mode: FinalizationMode::Strict, result_channel: None };
        let outcome = finalize(dir.path(), &config, &clean_outcome(""), Timestamp::from_unix_millis(0)).unwrap();
        assert!(outcome.feedback.is_none());
        assert!(!outcome.synthesized);
    }

    #[test]
    fn auto_fail_synthesizes_an_infra_failure() {
        let dir = tempdir().unwrap();
        let config = FinalizationConfig { mode: FinalizationMode::AutoFail, result_channel: None };
        let outcome = finalize(dir.path(), &config, &clean_outcome(""), Timestamp::from_unix_millis(0)).unwrap();
        let feedback = outcome.feedback.expect("synthesized");
        assert!(!feedback.ok);
        assert!(outcome.synthesized);
    }

    #[test]
    fn auto_from_result_json_reads_the_stdout_marker() {
        let dir = tempdir().unwrap();
        let config = FinalizationConfig {
            mode: FinalizationMode::AutoFromResultJson,
            result_channel: Some(ResultChannelConfig {
                kind: ResultChannelKind::StdoutJson,
                result_file: "mission.result.json".to_string(),
                marker: "ZCL_RESULT_JSON:".to_string(),
                result_min_turn: None,
            }),
        };
        let tail = "noise\nZCL_RESULT_JSON:{\"ok\":true,\"answer\":42}\n";
        let outcome = finalize(dir.path(), &config, &clean_outcome(tail), Timestamp::from_unix_millis(0)).unwrap();
        let feedback = outcome.feedback.expect("decoded");
        assert!(feedback.ok);
        assert!(!outcome.synthesized || feedback.result_json == Some(serde_json::json!({"answer": 42})));
    }

    #[test]
    fn auto_from_result_json_degrades_to_auto_fail_on_nonzero_exit() {
        let dir = tempdir().unwrap();
        let config = FinalizationConfig {
            mode: FinalizationMode::AutoFromResultJson,
            result_channel: Some(ResultChannelConfig {
                kind: ResultChannelKind::StdoutJson,
                result_file: "mission.result.json".to_string(),
                marker: "ZCL_RESULT_JSON:".to_string(),
                result_min_turn: None,
            }),
        };
        let dirty = RunnerOutcome { exit_code: Some(1), spawn_failed: false, runner_errored: false, timed_out: false, stdout_tail: "" };
        let outcome = finalize(dir.path(), &config, &dirty, Timestamp::from_unix_millis(0)).unwrap();
        let feedback = outcome.feedback.expect("synthesized");
        assert!(!feedback.ok);
        assert!(outcome.synthesized);
    }

    #[test]
    fn an_existing_feedback_json_is_read_as_is_and_not_overwritten() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("feedback.json"), r#"{"ok":true,"createdAt":{"unixMillis":0}}"#).unwrap();
        let config = FinalizationConfig { mode: FinalizationMode::Strict, result_channel: None };
        let outcome = finalize(dir.path(), &config, &clean_outcome(""), Timestamp::from_unix_millis(0)).unwrap();
        assert!(outcome.feedback.unwrap().ok);
        assert!(!outcome.synthesized);
    }
}
