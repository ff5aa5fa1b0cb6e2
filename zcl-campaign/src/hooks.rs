// zcl-campaign/src/hooks.rs
// ============================================================================
// Module: Campaign Hooks
// Description: `preFlight`/`preMission`/`postMission`/`cleanup` shell hook
//              execution, bounded by `cleanupHookTimeoutMs` (§4.J step 6).
// Purpose: Run an optional shell command per lifecycle point, truncating its
//          stderr to 512 bytes for the abort reason when it fails.
// Dependencies: tokio, zcl-evidence
// ============================================================================

//! ## Overview
//! Every hook kind shares the same timeout bound
//! (`timeouts.cleanupHookTimeoutMs`); only `cleanup` failures are tolerated
//! (the campaign has already finished), every other hook kind aborts the run
//! on nonzero exit or spawn failure.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use zcl_evidence::PatternRedactor;
use zcl_evidence::Redactor;

use crate::error::CampaignError;

/// Stderr tail cap for a failed hook's abort reason (§4.J step 6).
const HOOK_STDERR_CAP_BYTES: usize = 512;

// ============================================================================
// SECTION: Hook Kind
// ============================================================================

/// Which lifecycle point a hook ran at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookKind {
    /// Runs once before mission selection / prompt-policy checks.
    PreFlight,
    /// Runs before each mission's attempts.
    PreMission,
    /// Runs after each mission's attempts are gated.
    PostMission,
    /// Runs once at the end of the run, regardless of outcome.
    Cleanup,
}

impl HookKind {
    const fn label(self) -> &'static str {
        match self {
            Self::PreFlight => "pre_flight",
            Self::PreMission => "pre_mission",
            Self::PostMission => "post_mission",
            Self::Cleanup => "cleanup",
        }
    }
}

// ============================================================================
// SECTION: Hook Execution
// ============================================================================

/// Runs every command in `commands` in order, under `timeout`, merging
/// `env` into the child's environment.
///
/// `kind` controls failure tolerance: a `Cleanup` hook's failure is
/// swallowed (logged via the returned stderr tail, never returned as an
/// error) since the campaign's own status has already been decided; every
/// other kind returns [`CampaignError::HookFailed`] on the first failing
/// command.
///
/// # Errors
///
/// Returns [`CampaignError::HookFailed`] for a non-cleanup hook that exits
/// nonzero, fails to spawn, or exceeds `timeout`.
pub async fn run(
    kind: HookKind,
    commands: &[String],
    env: &[(String, String)],
    timeout: Duration,
) -> Result<(), CampaignError> {
    for command in commands {
        let outcome = run_one(command, env, timeout).await;
        match outcome {
            Ok(()) => {}
            Err(stderr_tail) if kind == HookKind::Cleanup => {
                let _ = stderr_tail;
            }
            Err(stderr_tail) => return Err(CampaignError::HookFailed { hook: kind.label(), stderr_tail }),
        }
    }
    Ok(())
}

/// Runs a single shell command, returning `Err(stderrTail)` on nonzero exit,
/// spawn failure, or timeout.
async fn run_one(command: &str, env: &[(String, String)], timeout: Duration) -> Result<(), String> {
    let mut built = tokio::process::Command::new("sh");
    built.arg("-c").arg(command).envs(env.iter().map(|(key, value)| (key.as_str(), value.as_str())));

    let spawned = match tokio::time::timeout(timeout, built.output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(err)) => return Err(format!("failed to spawn hook command: {err}")),
        Err(_elapsed) => return Err("hook command exceeded cleanup_hook_timeout_ms".to_string()),
    };

    if spawned.status.success() {
        return Ok(());
    }
    Err(truncate_stderr(&spawned.stderr, HOOK_STDERR_CAP_BYTES))
}

/// Redacts and truncates `raw` to at most `cap` bytes, backing off to the
/// nearest UTF-8 char boundary.
fn truncate_stderr(raw: &[u8], cap: usize) -> String {
    let lossy = String::from_utf8_lossy(raw);
    let redacted = PatternRedactor::new().redact(&lossy);
    if redacted.len() <= cap {
        return redacted;
    }
    let mut boundary = cap;
    while boundary > 0 && !redacted.is_char_boundary(boundary) {
        boundary -= 1;
    }
    redacted[..boundary].to_string()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "test-only assertions")]

    use std::time::Duration;

    use super::HookKind;
    use super::run;

    #[tokio::test]
    async fn a_successful_hook_returns_ok() {
        run(HookKind::PreFlight, &["exit 0".to_string()], &[], Duration::from_secs(5)).await.expect("ok");
    }

    #[tokio::test]
    async fn a_failing_pre_mission_hook_is_an_error() {
        let err = run(HookKind::PreMission, &["echo boom 1>&2; exit 1".to_string()], &[], Duration::from_secs(5))
            .await
            .expect_err("fails");
        assert!(matches!(err, super::CampaignError::HookFailed { .. }));
    }

    #[tokio::test]
    async fn a_failing_cleanup_hook_is_swallowed() {
        run(HookKind::Cleanup, &["exit 1".to_string()], &[], Duration::from_secs(5)).await.expect("swallowed");
    }

    #[tokio::test]
    async fn a_hook_exceeding_its_timeout_is_an_error() {
        let err = run(HookKind::PreFlight, &["sleep 5".to_string()], &[], Duration::from_millis(10))
            .await
            .expect_err("times out");
        assert!(matches!(err, super::CampaignError::HookFailed { .. }));
    }
}
