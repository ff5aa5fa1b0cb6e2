// zcl-runner/src/native.rs
// ============================================================================
// Module: Native-Mode Dispatch
// Description: Drives one attempt through a native runtime session (§4.G
//              step 4).
// Purpose: Acquire a scheduler slot, start a session, start a thread, start
//          a turn, and persist `runner.ref.json` for post-mortem.
// Dependencies: zcl-scheduler, zcl-runtime, zcl-evidence
// ============================================================================

//! ## Overview
//! Unlike process mode, native mode keeps no tail buffers of its own: every
//! peer notification is already mirrored into the trace by
//! [`zcl_runtime::TraceListener`], registered on the session before the
//! thread is started. This module only owns the request/response skeleton
//! (`initialize` → `thread/start` → `turn/start`) and the scheduler slot
//! that bounds how many native sessions run at once.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use zcl_evidence::EvidenceRoot;
use zcl_evidence::TraceRecorder;
use zcl_runtime::RuntimeFactory;
use zcl_runtime::Session;
use zcl_runtime::SessionListener;
use zcl_runtime::SessionOptions;
use zcl_runtime::TraceListener;
use zcl_scheduler::CancelToken;
use zcl_scheduler::Scheduler;

use crate::error::RunnerError;

// ============================================================================
// SECTION: Runner Ref
// ============================================================================

/// Persisted verbatim as `runner.ref.json`, the native-mode analogue of a
/// process's exit code: enough to locate the session post-mortem.
#[derive(Debug, Clone, Serialize)]
pub struct RunnerRef {
    /// Strategy id the session was started against (e.g. `codex_app_server`).
    pub runtime_id: String,
    /// Peer-assigned thread id.
    pub thread_id: String,
    /// Peer-assigned turn id.
    pub turn_id: String,
    /// Peer-reported terminal turn status.
    pub turn_status: String,
}

/// The result of driving one native-mode attempt to completion.
pub struct NativeOutcome {
    /// The persisted session reference.
    pub runner_ref: RunnerRef,
    /// `true` once the peer reported a non-failed terminal turn status.
    pub turn_succeeded: bool,
}

// ============================================================================
// SECTION: Dispatch
// ============================================================================

/// Acquires a scheduler slot, starts a native runtime session through
/// `factory`, drives it through `initialize` → `thread/start` →
/// `turn/start` carrying `prompt` as the turn's sole input, and persists
/// `runner.ref.json` under `attempt_dir`.
///
/// # Errors
///
/// Returns [`RunnerError::Runtime`] if the session cannot be spawned or any
/// request fails, or [`RunnerError::Spawn`] if `ctx` is cancelled before a
/// scheduler slot is acquired.
pub async fn run(
    attempt_dir: &Path,
    factory: &dyn RuntimeFactory,
    opts: &SessionOptions,
    prompt: String,
    recorder: TraceRecorder,
    scheduler: &Scheduler,
    ctx: &CancelToken,
    close_grace: Duration,
) -> Result<NativeOutcome, RunnerError> {
    let permit = scheduler.acquire(ctx).await.map_err(|err| RunnerError::Spawn(err.to_string()))?;

    let listener: Arc<dyn SessionListener> = Arc::new(TraceListener::new(
        recorder,
        opts.run_id.clone(),
        opts.suite_id.clone(),
        opts.mission_id.clone(),
        opts.attempt_id.clone(),
        opts.agent_id.clone(),
        opts.clock.clone(),
    ));

    let mut session = factory.start_session(opts, vec![Arc::clone(&listener)])?;
    let dispatch_result = drive(&mut session, &listener, opts, prompt, factory.id()).await;
    session.close(close_grace).await;
    drop(permit);

    let (runner_ref, turn_succeeded) = dispatch_result?;
    let root = EvidenceRoot::open_or_create(attempt_dir)?;
    root.write_json_atomic(Path::new("runner.ref.json"), &runner_ref)?;
    Ok(NativeOutcome { runner_ref, turn_succeeded })
}

/// Runs `initialize` → `thread/start` → `turn/start` against an
/// already-spawned session. `listener` is only threaded through to keep it
/// alive for the session's lifetime; notifications are delivered directly
/// by the reader task the session owns internally.
async fn drive(
    session: &mut Session,
    _listener: &Arc<dyn SessionListener>,
    opts: &SessionOptions,
    prompt: String,
    runtime_id: &str,
) -> Result<(RunnerRef, bool), RunnerError> {
    session.initialize().await?;
    let thread_id = session.thread_start(opts).await?;
    let turn = session.turn_start(prompt).await?;
    let turn_succeeded = turn.turn.status != "failed";
    let runner_ref = RunnerRef {
        runtime_id: runtime_id.to_string(),
        thread_id,
        turn_id: turn.turn.id,
        turn_status: turn.turn.status,
    };
    Ok((runner_ref, turn_succeeded))
}
