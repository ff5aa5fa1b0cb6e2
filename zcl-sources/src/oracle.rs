// zcl-sources/src/oracle.rs
// ============================================================================
// Module: Oracle Evaluator Subprocess Adapter
// Description: Timeout-bounded invocation of an external oracle process (§4.I.4).
// Purpose: Spawn the configured evaluator command, feed it the mission
//          context on stdin, and parse its JSON verdict from stdout.
// Dependencies: tokio, serde_json, zcl-core
// ============================================================================

//! ## Overview
//! The oracle gate never trusts a missing or malformed verdict as a pass:
//! spawn failures, timeouts, and invalid output all become typed errors the
//! Gate Evaluator folds into `campaign_oracle_evaluation_failed`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::process::Stdio;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::error::SourceError;

// ============================================================================
// SECTION: Verdict
// ============================================================================

/// Parsed verdict produced by an oracle evaluator process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OracleVerdict {
    /// Whether the evaluator judged the mission outcome correct.
    pub ok: bool,
    /// Stable reason codes explaining the verdict.
    #[serde(default)]
    pub reason_codes: Vec<String>,
    /// Optional free-form explanation.
    #[serde(default)]
    pub message: Option<String>,
    /// Detailed mismatches between the claimed and expected outcome.
    #[serde(default)]
    pub mismatches: Vec<OracleMismatch>,
}

/// A single discrepancy reported by the oracle evaluator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OracleMismatch {
    /// The mismatch category (e.g. `format`); unrecognized categories are
    /// preserved verbatim rather than rejected.
    pub mismatch_class: String,
    /// Any additional evaluator-specific mismatch detail.
    #[serde(flatten)]
    pub detail: Value,
}

impl OracleVerdict {
    /// Returns true when every mismatch is format-only, so an
    /// `oraclePolicy = warn_on_format_mismatch` may downgrade this verdict
    /// to a non-gating warning.
    #[must_use]
    pub fn is_format_only(&self) -> bool {
        !self.mismatches.is_empty()
            && self.mismatches.iter().all(|mismatch| mismatch.mismatch_class == "format")
    }
}

// ============================================================================
// SECTION: Invocation
// ============================================================================

/// Invokes an oracle evaluator command, writing `mission_context` as
/// canonical JSON to its stdin and parsing its stdout as an [`OracleVerdict`].
///
/// # Errors
///
/// Returns [`SourceError::OracleSpawn`] if the process cannot be started,
/// [`SourceError::OracleTimeout`] if it does not exit within `timeout`, and
/// [`SourceError::OracleInvalidOutput`] if stdout is not a valid verdict.
pub async fn invoke(
    command: &[String],
    mission_context: &Value,
    timeout: Duration,
) -> Result<OracleVerdict, SourceError> {
    let [program, args @ ..] = command else {
        return Err(SourceError::OracleSpawn("oracle command is empty".to_string()));
    };

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|err| SourceError::OracleSpawn(err.to_string()))?;

    let input = serde_json::to_vec(mission_context)
        .map_err(|err| SourceError::OracleInvalidOutput(format!("encoding mission context: {err}")))?;
    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(&input)
            .await
            .map_err(|err| SourceError::OracleSpawn(format!("writing stdin: {err}")))?;
    }

    let wait = tokio::time::timeout(timeout, child.wait_with_output()).await;
    let output = match wait {
        Ok(Ok(output)) => output,
        Ok(Err(err)) => return Err(SourceError::OracleSpawn(err.to_string())),
        Err(_elapsed) => return Err(SourceError::OracleTimeout),
    };

    if !output.status.success() {
        return Err(SourceError::OracleInvalidOutput(format!(
            "evaluator exited with status {status}",
            status = output.status
        )));
    }

    serde_json::from_slice(&output.stdout)
        .map_err(|err| SourceError::OracleInvalidOutput(format!("invalid verdict json: {err}")))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "test-only assertions")]

    use std::time::Duration;

    use super::invoke;

    #[tokio::test]
    async fn empty_command_is_a_spawn_error() {
        let result = invoke(&[], &serde_json::json!({}), Duration::from_secs(1)).await;
        assert!(matches!(result, Err(super::SourceError::OracleSpawn(_))));
    }

    #[tokio::test]
    async fn echoing_evaluator_produces_a_parsed_verdict() {
        let command = vec![
            "sh".to_string(),
            "-c".to_string(),
            "echo '{\"ok\":true,\"reasonCodes\":[]}'".to_string(),
        ];
        let verdict = invoke(&command, &serde_json::json!({"answer": 1}), Duration::from_secs(5))
            .await
            .expect("verdict parses");
        assert!(verdict.ok);
    }

    #[tokio::test]
    async fn a_slow_evaluator_times_out() {
        let command = vec!["sh".to_string(), "-c".to_string(), "sleep 5".to_string()];
        let result =
            invoke(&command, &serde_json::json!({}), Duration::from_millis(50)).await;
        assert!(matches!(result, Err(super::SourceError::OracleTimeout)));
    }
}
