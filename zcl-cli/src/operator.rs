// zcl-cli/src/operator.rs
// ============================================================================
// Module: Operator Output
// Description: Stdout/stderr passthrough plumbing and the host-supplied
//              wall clock, shared by every command handler.
// Purpose: Give every command the same `OperatorWriter` funnel `zcl-campaign`
//          and `zcl-runner` already pass attempts through, and the one place
//          a wall-clock `Timestamp` is ever sampled.
// Dependencies: std, zcl-runner, zcl-runtime
// ============================================================================

//! ## Overview
//! Neither `zcl_core::Timestamp` nor any crate downstream of it can
//! construct a wall-clock value; every host is expected to sample
//! `SystemTime` itself and hand the result down as a [`zcl_runtime::ClockFn`].
//! This module is the one place in the CLI that does so.

use std::io::Write;
use std::sync::Arc;
use std::sync::Mutex as StdMutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use zcl_core::Timestamp;
use zcl_runner::process::OperatorWriter;

use crate::commands::CliError;

/// Wraps `std::io::stdout()` as an [`OperatorWriter`].
#[must_use]
pub fn stdout_writer() -> OperatorWriter {
    Arc::new(StdMutex::new(std::io::stdout())) as OperatorWriter
}

/// Wraps `std::io::stderr()` as an [`OperatorWriter`].
#[must_use]
pub fn stderr_writer() -> OperatorWriter {
    Arc::new(StdMutex::new(std::io::stderr())) as OperatorWriter
}

/// Writes one line to an [`OperatorWriter`], mapping a poisoned lock or
/// write failure onto [`CliError::Io`].
///
/// # Errors
///
/// Returns [`CliError::Io`] if the writer's mutex is poisoned or the
/// underlying write fails.
pub fn write_line(writer: &OperatorWriter, message: &str) -> Result<(), CliError> {
    let mut guard = writer.lock().map_err(|_| CliError::Io("operator writer mutex poisoned".to_string()))?;
    writeln!(guard, "{message}").map_err(|err| CliError::Io(err.to_string()))
}

/// Samples the wall clock once, as a [`Timestamp`].
///
/// # Errors
///
/// Returns [`CliError::Usage`] if the system clock reports a time before
/// the Unix epoch, or one that overflows a signed 64-bit millisecond count.
pub fn now() -> Result<Timestamp, CliError> {
    let duration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|err| CliError::Usage(format!("system clock before unix epoch: {err}")))?;
    let millis = i64::try_from(duration.as_millis())
        .map_err(|_| CliError::Usage("system clock overflowed i64 milliseconds".to_string()))?;
    Ok(Timestamp::from_unix_millis(millis))
}

/// Builds a [`zcl_runtime::ClockFn`] that samples the wall clock on every
/// call, clamping an out-of-range reading to [`Timestamp::from_unix_millis`]
/// of `0` rather than panicking; callers that need a fallible sample should
/// use [`now`] instead.
#[must_use]
pub fn clock_fn() -> zcl_runtime::ClockFn {
    Arc::new(|| now().unwrap_or_else(|_| Timestamp::from_unix_millis(0)))
}
