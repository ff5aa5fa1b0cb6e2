// zcl-runner/src/suite.rs
// ============================================================================
// Module: Suite Runner
// Description: Drives one already-allocated attempt through dispatch and
//              finalization (§4.G).
// Purpose: Sequence the blind-mode contamination scan, process- or
//          native-mode dispatch (bounded by the attempt's deadline),
//          the Finalization Policy, and the sealed `attempt.report.json`.
// Dependencies: zcl-core, zcl-evidence, zcl-runtime, zcl-scheduler, tokio
// ============================================================================

//! ## Overview
//! A timed-out dispatch is handled by racing [`dispatch`] against
//! `tokio::time::timeout(attempt.timeout_ms, ..)` rather than threading a
//! deadline through every backend: cancelling the dispatch future drops its
//! spawned child process (both [`process::run`] and the native
//! [`zcl_runtime::Session`] spawn with `kill_on_drop(true)`), and that
//! process's own background tee/flush tasks self-terminate once its stdio
//! pipes close, so no explicit teardown step is needed here.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::path::Path;

use zcl_core::Code;
use zcl_core::ids::AttemptId;
use zcl_core::model::attempt::AttemptIntegrity;
use zcl_core::model::attempt::AttemptMetrics;
use zcl_core::model::attempt::AttemptReport;
use zcl_core::model::attempt::Feedback;
use zcl_core::model::campaign::Flow;
use zcl_core::model::campaign::IsolationModel;
use zcl_core::time::Timestamp;
use zcl_evidence::EvidenceRoot;
use zcl_evidence::PatternRedactor;
use zcl_evidence::Redactor;
use zcl_evidence::TraceRecorder;
use zcl_runtime::ClockFn;
use zcl_runtime::RuntimeFactory;
use zcl_runtime::SessionOptions;
use zcl_scheduler::CancelToken;
use zcl_scheduler::Scheduler;

use crate::allocator::Allocation;
use crate::contamination;
use crate::error::RunnerError;
use crate::finalize;
use crate::finalize::FinalizeOutcome;
use crate::finalize::RunnerOutcome;
use crate::native;
use crate::process;
use crate::process::OperatorWriter;

// ============================================================================
// SECTION: Native Dispatch Context
// ============================================================================

/// Context required only when an attempt's `isolation_model` is
/// [`IsolationModel::NativeSpawn`].
pub struct NativeDispatch<'a> {
    /// Resolved runtime factory to start the session through.
    pub factory: &'a dyn RuntimeFactory,
    /// Session parameters for this attempt.
    pub session_options: SessionOptions,
    /// Scheduler bounding concurrent native sessions for this flow's strategy.
    pub scheduler: &'a Scheduler,
    /// Grace period given to the peer to acknowledge `turn/interrupt` on close.
    pub close_grace: std::time::Duration,
}

// ============================================================================
// SECTION: Run Attempt Request
// ============================================================================

/// Everything needed to drive one already-allocated attempt to a sealed
/// `attempt.report.json`.
pub struct RunAttemptRequest<'a> {
    /// The attempt allocation returned by [`crate::allocator::allocate`].
    pub allocation: &'a Allocation,
    /// The flow configuration this attempt was scheduled under.
    pub flow: &'a Flow,
    /// Whether the suite's `blind` contamination scan applies.
    pub blind: bool,
    /// Suite-supplied extra contamination terms.
    pub blind_terms: &'a [String],
    /// Operator-facing stdout passthrough (process mode only).
    pub operator_out: OperatorWriter,
    /// Operator-facing stderr passthrough (process mode only).
    pub operator_err: OperatorWriter,
    /// Native-mode dispatch context; required when `isolation = native_spawn`.
    pub native: Option<NativeDispatch<'a>>,
    /// Cancellation signal for the campaign/flow this attempt belongs to.
    pub cancel: &'a CancelToken,
    /// Host-supplied clock; never sampled internally.
    pub clock: ClockFn,
}

// ============================================================================
// SECTION: Run Attempt Outcome
// ============================================================================

/// The terminal result of running one attempt end to end.
pub struct AttemptRunOutcome {
    /// The attempt this outcome covers.
    pub attempt_id: AttemptId,
    /// The resolved feedback, absent only under `strict` finalization with
    /// no runner-written artifact.
    pub feedback: Option<Feedback>,
    /// The sealed attempt report, also persisted as `attempt.report.json`.
    pub report: AttemptReport,
    /// The dominant failure code for this attempt, if any.
    pub failure_code: Option<Code>,
}

// ============================================================================
// SECTION: Dispatch Result
// ============================================================================

/// Owned dispatch result, converted into a borrowed [`RunnerOutcome`] once
/// its tail buffer has settled.
struct DispatchResult {
    exit_code: Option<i32>,
    spawn_failed: bool,
    stdout_tail: String,
}

impl DispatchResult {
    const fn empty() -> Self {
        Self { exit_code: None, spawn_failed: false, stdout_tail: String::new() }
    }
}

// ============================================================================
// SECTION: Run Attempt
// ============================================================================

/// Runs one already-allocated attempt: scans for blind-mode contamination,
/// dispatches to process or native mode bounded by the attempt's own
/// deadline, applies the Finalization Policy, and seals
/// `attempt.report.json`.
///
/// # Errors
///
/// Returns [`RunnerError::NativeIsolationUnconfigured`] if the attempt
/// requires native isolation but `req.native` was not supplied, or
/// [`RunnerError::Usage`] if the attempt requires process isolation but its
/// flow carries no command. Any other dispatch or evidence failure is
/// surfaced directly; only a genuine deadline elapse is folded into the
/// outcome rather than returned as an error.
pub async fn run_attempt(req: RunAttemptRequest<'_>) -> Result<AttemptRunOutcome, RunnerError> {
    let attempt = &req.allocation.attempt;
    let attempt_dir = req.allocation.attempt_dir.as_path();

    if req.blind {
        if let Some(term) = contamination::scan(&attempt.prompt, req.blind_terms) {
            let created_at = (req.clock)();
            return finalize_contaminated(attempt_dir, attempt.attempt_id.clone(), &term, created_at);
        }
    }

    let deadline = std::time::Duration::from_millis(attempt.timeout_ms);
    let dispatch_outcome = tokio::time::timeout(deadline, dispatch(&req, attempt_dir)).await;

    let created_at = (req.clock)();
    let (dispatch_result, timed_out, dispatch_err) = match dispatch_outcome {
        Ok(Ok(result)) => (result, false, None),
        Ok(Err(err)) => (DispatchResult { spawn_failed: matches!(err.code(), Code::Spawn), ..DispatchResult::empty() }, false, Some(err)),
        Err(_elapsed) => (DispatchResult::empty(), true, None),
    };

    let runner_outcome = RunnerOutcome {
        exit_code: dispatch_result.exit_code,
        spawn_failed: dispatch_result.spawn_failed,
        runner_errored: dispatch_err.is_some(),
        timed_out,
        stdout_tail: &dispatch_result.stdout_tail,
    };

    let finalize_outcome = finalize::finalize(attempt_dir, &req.flow.finalization, &runner_outcome, created_at)?;
    if finalize_outcome.synthesized {
        if let Some(feedback) = &finalize_outcome.feedback {
            finalize::persist_feedback(attempt_dir, feedback)?;
        }
    }

    let report = build_report(attempt_dir, &finalize_outcome, false, timed_out, created_at)?;
    persist_report(attempt_dir, &report)?;

    Ok(AttemptRunOutcome {
        attempt_id: attempt.attempt_id.clone(),
        feedback: finalize_outcome.feedback,
        report,
        failure_code: finalize_outcome.failure_code.or_else(|| dispatch_err.map(|err| err.code())),
    })
}

/// Dispatches one attempt to its configured isolation backend.
async fn dispatch(req: &RunAttemptRequest<'_>, attempt_dir: &Path) -> Result<DispatchResult, RunnerError> {
    let attempt = &req.allocation.attempt;
    match attempt.isolation_model {
        IsolationModel::ProcessRunner => {
            let command = req
                .flow
                .command
                .as_ref()
                .ok_or_else(|| RunnerError::Spawn("flow has no command for process isolation".to_string()))?;
            let env_pairs = req.allocation.env.as_pairs();
            let cwd = attempt_dir.to_str().unwrap_or(".");
            let outcome = process::run(
                attempt_dir,
                command,
                &env_pairs,
                &req.flow.env,
                cwd,
                req.operator_out.clone(),
                req.operator_err.clone(),
            )
            .await?;
            let redactor = PatternRedactor::new();
            let stdout_tail = redactor.redact(&String::from_utf8_lossy(&outcome.stdout_tail));
            Ok(DispatchResult {
                exit_code: outcome.exit_code,
                spawn_failed: outcome.is_spawn_failure(),
                stdout_tail,
            })
        }
        IsolationModel::NativeSpawn => {
            let native = req.native.as_ref().ok_or(RunnerError::NativeIsolationUnconfigured)?;
            let recorder = TraceRecorder::new(attempt_dir, Box::new(PatternRedactor::new()))?;
            native::run(
                attempt_dir,
                native.factory,
                &native.session_options,
                attempt.prompt.clone(),
                recorder,
                native.scheduler,
                req.cancel,
                native.close_grace,
            )
            .await?;
            Ok(DispatchResult::empty())
        }
    }
}

// ============================================================================
// SECTION: Contaminated Prompt Shortcut
// ============================================================================

/// Seals an attempt that never spawned because its prompt was flagged by
/// the blind-mode contamination scan (§4.G step 2).
fn finalize_contaminated(
    attempt_dir: &Path,
    attempt_id: AttemptId,
    term: &str,
    created_at: Timestamp,
) -> Result<AttemptRunOutcome, RunnerError> {
    let feedback = Feedback {
        ok: false,
        result: None,
        result_json: Some(serde_json::json!({
            "kind": "contaminated_prompt",
            "term": term,
        })),
        decision_tags: vec!["blocked".to_string(), "contaminated".to_string()],
        classification: None,
        created_at,
    };
    finalize::persist_feedback(attempt_dir, &feedback)?;

    let report = AttemptReport {
        ok: Some(false),
        integrity: AttemptIntegrity {
            trace_present: false,
            trace_non_empty: false,
            feedback_present: true,
            prompt_contaminated: true,
        },
        metrics: AttemptMetrics { tool_calls_total: 0, token_estimates: None },
        failure_code_histogram: one_code_histogram(Code::ContaminatedPrompt),
        timed_out_before_first_tool_call: false,
        ended_at: created_at,
    };
    persist_report(attempt_dir, &report)?;

    Ok(AttemptRunOutcome {
        attempt_id,
        feedback: Some(feedback),
        report,
        failure_code: Some(Code::ContaminatedPrompt),
    })
}

// ============================================================================
// SECTION: Attempt Report
// ============================================================================

/// Builds the post-hoc integrity/metrics report for a non-contaminated
/// attempt, reading the trace and feedback artifacts back off disk.
fn build_report(
    attempt_dir: &Path,
    outcome: &FinalizeOutcome,
    prompt_contaminated: bool,
    timed_out: bool,
    ended_at: Timestamp,
) -> Result<AttemptReport, RunnerError> {
    let trace_path = zcl_core::layout::tool_calls_jsonl(attempt_dir);
    let trace_present = trace_path.exists();
    let trace_non_empty = trace_present && count_non_empty_lines(&trace_path)? > 0;
    let tool_calls_total = if trace_present { count_non_empty_lines(&trace_path)? } else { 0 };
    let feedback_present = zcl_core::layout::feedback_json(attempt_dir).exists();

    Ok(AttemptReport {
        ok: outcome.feedback.as_ref().map(|feedback| feedback.ok),
        integrity: AttemptIntegrity {
            trace_present,
            trace_non_empty,
            feedback_present,
            prompt_contaminated,
        },
        metrics: AttemptMetrics { tool_calls_total, token_estimates: None },
        failure_code_histogram: outcome.failure_code.map_or_else(BTreeMap::new, one_code_histogram),
        timed_out_before_first_tool_call: timed_out && !trace_non_empty,
        ended_at,
    })
}

/// Counts non-empty lines in a JSONL file, returning `0` for an absent file.
fn count_non_empty_lines(path: &Path) -> Result<u32, RunnerError> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(err) => return Err(RunnerError::Io(err)),
    };
    Ok(u32::try_from(raw.lines().filter(|line| !line.trim().is_empty()).count()).unwrap_or(u32::MAX))
}

/// Builds a single-entry failure-code histogram keyed by the code's stable
/// string rendering.
fn one_code_histogram(code: Code) -> BTreeMap<String, u32> {
    let mut histogram = BTreeMap::new();
    histogram.insert(code.to_string(), 1);
    histogram
}

/// Persists `report` as `attempt.report.json`.
fn persist_report(attempt_dir: &Path, report: &AttemptReport) -> Result<(), RunnerError> {
    let root = EvidenceRoot::open_or_create(attempt_dir)?;
    root.write_json_atomic(Path::new("attempt.report.json"), report)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "test-only assertions")]

    use std::io::Cursor;
    use std::sync::Arc;
    use std::sync::Mutex;

    use tempfile::tempdir;

    use super::NativeDispatch;
    use super::RunAttemptRequest;
    use super::run_attempt;
    use zcl_core::ids::AgentId;
    use zcl_core::ids::FlowId;
    use zcl_core::ids::MissionId;
    use zcl_core::ids::RetryIndex;
    use zcl_core::ids::RunId;
    use zcl_core::ids::SuiteId;
    use zcl_core::model::campaign::EvaluationConfig;
    use zcl_core::model::campaign::EvaluationMode;
    use zcl_core::model::campaign::FinalizationConfig;
    use zcl_core::model::campaign::FinalizationMode;
    use zcl_core::model::campaign::Flow;
    use zcl_core::model::campaign::IsolationModel;
    use zcl_core::model::campaign::RunnerType;
    use zcl_core::model::campaign::TimeoutStart;
    use zcl_core::model::campaign::TraceProfile;
    use zcl_core::model::suite::Suite;
    use zcl_core::model::suite::SuiteDefaults;
    use zcl_core::time::Timestamp;
    use zcl_scheduler::CancelToken;

    fn sink() -> super::OperatorWriter {
        Arc::new(Mutex::new(Cursor::new(Vec::new())))
    }

    fn sample_flow(command: Vec<String>) -> Flow {
        Flow {
            flow_id: FlowId::new("flow-a").unwrap(),
            runner: RunnerType::ProcessCmd,
            command: Some(command),
            env: std::collections::BTreeMap::new(),
            timeout_ms: 2000,
            timeout_start: TimeoutStart::AttemptStart,
            isolation: IsolationModel::ProcessRunner,
            tool_driver: None,
            shims: std::collections::BTreeMap::new(),
            finalization: FinalizationConfig { mode: FinalizationMode::AutoFail, result_channel: None },
            tool_policy: None,
            trace_profile: TraceProfile::None,
            evaluation: EvaluationConfig {
                mode: EvaluationMode::None,
                semantic_rules: None,
                oracle_command: None,
                oracle_policy: None,
            },
            max_in_flight: None,
            min_start_interval_ms: None,
            mcp_call_limit: None,
        }
    }

    fn sample_suite() -> Suite {
        Suite {
            suite_id: SuiteId::new("suite-a").unwrap(),
            defaults: SuiteDefaults {
                mode: "default".to_string(),
                timeout_ms: 2000,
                timeout_start: TimeoutStart::AttemptStart,
                feedback_policy: "strict".to_string(),
                blind: false,
                blind_terms: Vec::new(),
            },
            missions: vec![],
        }
    }

    fn allocate_attempt(dir: &std::path::Path, command: Vec<String>) -> (super::Allocation, Flow) {
        let flow = sample_flow(command);
        let req = crate::allocator::AllocateRequest {
            out_root: dir,
            run_id: RunId::new("run-1").unwrap(),
            flow_id: flow.flow_id.clone(),
            mission_index: 0,
            mission_id: MissionId::new("m0").unwrap(),
            retry: RetryIndex(0),
            timeout_ms: flow.timeout_ms,
            timeout_start: flow.timeout_start,
            isolation_model: flow.isolation,
            prompt: "do the thing".to_string(),
            suite_snapshot: sample_suite(),
            agent_id: AgentId::new("agent-1").unwrap(),
            started_at: Timestamp::from_unix_millis(0),
        };
        (crate::allocator::allocate(req).unwrap(), flow)
    }

    #[tokio::test]
    async fn a_clean_process_run_seals_a_valid_report() {
        let dir = tempdir().unwrap();
        let (allocation, flow) = allocate_attempt(
            dir.path(),
            vec!["sh".to_string(), "-c".to_string(), "exit 0".to_string()],
        );
        let cancel = CancelToken::new();
        let outcome = run_attempt(RunAttemptRequest {
            allocation: &allocation,
            flow: &flow,
            blind: false,
            blind_terms: &[],
            operator_out: sink(),
            operator_err: sink(),
            native: None,
            cancel: &cancel,
            clock: Arc::new(|| Timestamp::from_unix_millis(1)),
        })
        .await
        .unwrap();
        assert!(!outcome.report.integrity.prompt_contaminated);
        assert!(dir.path().join("000-m0-r0").exists() || allocation.attempt_dir.join("attempt.report.json").exists());
    }

    #[tokio::test]
    async fn a_blind_contaminated_prompt_never_spawns() {
        let dir = tempdir().unwrap();
        let flow = sample_flow(vec!["sh".to_string(), "-c".to_string(), "exit 1".to_string()]);
        let req = crate::allocator::AllocateRequest {
            out_root: dir.path(),
            run_id: RunId::new("run-1").unwrap(),
            flow_id: flow.flow_id.clone(),
            mission_index: 0,
            mission_id: MissionId::new("m0").unwrap(),
            retry: RetryIndex(0),
            timeout_ms: flow.timeout_ms,
            timeout_start: flow.timeout_start,
            isolation_model: flow.isolation,
            prompt: "please avoid zcl vocabulary".to_string(),
            suite_snapshot: sample_suite(),
            agent_id: AgentId::new("agent-1").unwrap(),
            started_at: Timestamp::from_unix_millis(0),
        };
        let allocation = crate::allocator::allocate(req).unwrap();
        let cancel = CancelToken::new();
        let outcome = run_attempt(RunAttemptRequest {
            allocation: &allocation,
            flow: &flow,
            blind: true,
            blind_terms: &[],
            operator_out: sink(),
            operator_err: sink(),
            native: None,
            cancel: &cancel,
            clock: Arc::new(|| Timestamp::from_unix_millis(1)),
        })
        .await
        .unwrap();
        assert!(outcome.report.integrity.prompt_contaminated);
        assert!(!outcome.feedback.unwrap().ok);
    }

    #[tokio::test]
    async fn native_isolation_without_a_dispatch_context_is_a_usage_error() {
        let dir = tempdir().unwrap();
        let mut flow = sample_flow(vec![]);
        flow.isolation = IsolationModel::NativeSpawn;
        let req = crate::allocator::AllocateRequest {
            out_root: dir.path(),
            run_id: RunId::new("run-1").unwrap(),
            flow_id: flow.flow_id.clone(),
            mission_index: 0,
            mission_id: MissionId::new("m0").unwrap(),
            retry: RetryIndex(0),
            timeout_ms: flow.timeout_ms,
            timeout_start: flow.timeout_start,
            isolation_model: flow.isolation,
            prompt: "do the thing".to_string(),
            suite_snapshot: sample_suite(),
            agent_id: AgentId::new("agent-1").unwrap(),
            started_at: Timestamp::from_unix_millis(0),
        };
        let allocation = crate::allocator::allocate(req).unwrap();
        let cancel = CancelToken::new();
        let err = run_attempt(RunAttemptRequest {
            allocation: &allocation,
            flow: &flow,
            blind: false,
            blind_terms: &[],
            operator_out: sink(),
            operator_err: sink(),
            native: None,
            cancel: &cancel,
            clock: Arc::new(|| Timestamp::from_unix_millis(1)),
        })
        .await
        .unwrap_err();
        assert!(matches!(err, super::RunnerError::NativeIsolationUnconfigured));
    }
}
