// zcl-campaign/src/engine.rs
// ============================================================================
// Module: Campaign Engine
// Description: Top-level orchestration loop driving one campaign run from
//              lock acquisition through final persistence (§4.J).
// Purpose: Select missions, run every flow's attempts for each mission
//          (wave-parallel across missions, sequential-or-parallel across
//          flows within a mission), gate the results, and seal the run's
//          evidence artifacts.
// Dependencies: futures, tokio, zcl-core, zcl-evidence, zcl-gate, zcl-report,
//               zcl-runner, zcl-scheduler
// ============================================================================

//! ## Overview
//! [`run`] implements the nine steps of the campaign lifecycle: acquire the
//! campaign lock, select the mission window, check the prompt-vocabulary
//! policy, run `pre_flight`, then for every wave of up to `parallel` missions
//! run `pre_mission`, dispatch each mission's flows, gate the mission,
//! append to the progress ledger, run `post_mission`, and finally roll up
//! the run status, persist the report/summary/`RESULTS.md`, run `cleanup`,
//! and release the lock.
//!
//! `parallel` and `fail_fast` are never persisted campaign-spec fields; they
//! are `campaign run`/`campaign canary` CLI overrides carried by
//! [`RunRequest`]. A resumed run replays `campaign.progress.jsonl` via
//! [`crate::progress::replay`] and skips any mission already recorded as
//! `MissionGated`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::num::NonZeroU32;
use std::path::Path;

use zcl_core::Code;
use zcl_core::Timestamp;
use zcl_core::ids::AgentId;
use zcl_core::ids::FlowId;
use zcl_core::ids::MissionId;
use zcl_core::ids::RetryIndex;
use zcl_core::ids::RunId;
use zcl_core::layout;
use zcl_core::model::Campaign;
use zcl_core::model::FlowMode;
use zcl_core::model::FlowRunSummary;
use zcl_core::model::GateReason;
use zcl_core::model::Mission;
use zcl_core::model::MissionGate;
use zcl_core::model::PromptMode;
use zcl_core::model::ProgressEvent;
use zcl_core::model::ProgressEventKind;
use zcl_core::model::CampaignRunState;
use zcl_core::model::RunStatus;
use zcl_core::model::Suite;
use zcl_evidence::EvidenceRoot;
use zcl_runner::suite::NativeDispatch;
use zcl_runner::suite::RunAttemptRequest;
use zcl_runner::allocator;
use zcl_runner::allocator::AllocateRequest;
use zcl_runner::process::OperatorWriter;
use zcl_runtime::ClockFn;
use zcl_scheduler::CancelToken;

use crate::error::CampaignError;
use crate::hooks;
use crate::hooks::HookKind;
use crate::progress;
use crate::run_id;
use crate::selection;
use crate::shape;
use crate::lock::LockGuard;

// ============================================================================
// SECTION: Native Dispatch Resolver
// ============================================================================

/// Identifiers an attempt carries into native-spawn dispatch, threaded
/// through so [`NativeDispatchResolver::resolve`] can stamp a fresh
/// [`zcl_runtime::SessionOptions`] per attempt rather than reusing one
/// across every mission a flow runs.
pub struct NativeDispatchContext<'a> {
    /// Flow this attempt was scheduled under.
    pub flow: &'a zcl_core::model::Flow,
    /// Run this attempt belongs to.
    pub run_id: &'a RunId,
    /// Suite the mission is drawn from.
    pub suite_id: &'a zcl_core::ids::SuiteId,
    /// Mission being attempted.
    pub mission_id: &'a MissionId,
    /// Stable attempt identifier.
    pub attempt_id: &'a zcl_core::ids::AttemptId,
    /// Identifier of the runner under evaluation.
    pub agent_id: &'a AgentId,
    /// Absolute path to the allocated attempt directory, used as the native
    /// session's working directory.
    pub attempt_dir: &'a Path,
}

/// Resolves native-spawn dispatch context for an attempt, supplied by the
/// caller (`zcl-cli`) since only it owns the runtime-factory / scheduler
/// table that backs native-mode attempts.
pub trait NativeDispatchResolver: Sync {
    /// Returns the native dispatch context for `ctx.flow`, or `None` when
    /// the caller has no such flow configured for native isolation.
    fn resolve(&self, ctx: &NativeDispatchContext<'_>) -> Option<NativeDispatch<'_>>;
}

// ============================================================================
// SECTION: Run Request
// ============================================================================

/// Everything the Campaign Engine needs to drive one run.
pub struct RunRequest<'a> {
    /// The resolved campaign this run drives.
    pub campaign: &'a Campaign,
    /// The resolved suite the campaign's missions are drawn from.
    pub suite: &'a Suite,
    /// Output root (`.zcl` by default).
    pub out_root: &'a Path,
    /// Identifier of the runner under evaluation, injected into every attempt.
    pub agent_id: &'a AgentId,
    /// Wave width: how many missions run concurrently at a time.
    pub parallel: NonZeroU32,
    /// Whether a completed wave's failure skips every remaining mission.
    pub fail_fast: bool,
    /// Resolved native runtime strategy id, folded into the comparability key.
    pub runtime_strategy: Option<String>,
    /// Operator-facing stdout passthrough (process mode only).
    pub operator_out: OperatorWriter,
    /// Operator-facing stderr passthrough (process mode only).
    pub operator_err: OperatorWriter,
    /// Native-mode dispatch resolver; `None` if the campaign has no native
    /// flows.
    pub native: Option<&'a dyn NativeDispatchResolver>,
    /// Host-supplied clock; never sampled internally.
    pub clock: ClockFn,
    /// Cancellation signal, shared with every spawned attempt.
    pub cancel: &'a CancelToken,
}

// ============================================================================
// SECTION: Run
// ============================================================================

/// Runs (or resumes) one campaign end to end.
///
/// Lock contention is the one failure that returns a bare `Err` with no
/// persistence attempted, since writing anything would race the actual lock
/// holder. Every other abort (a fatal non-cleanup hook, the campaign's
/// global timeout) is folded into a persisted [`CampaignRunState`] with
/// `status = aborted`, returned as `Ok`; callers derive the process exit
/// code from `state.status` / `state.reason_codes`, not from a `Result::Err`.
///
/// # Errors
///
/// Returns [`CampaignError::LockHeld`] if another process already holds the
/// campaign lock. Returns [`CampaignError::Usage`] if mission selection
/// produces an empty window, or if `promptMode = exam` is misconfigured
/// (that specific check is the lint-time responsibility of `zcl-config`; this
/// function only re-validates `mission_only` vocabulary). Propagates
/// [`CampaignError::Evidence`]/[`CampaignError::Hashing`]/[`CampaignError::Io`]
/// for any persistence failure.
#[allow(clippy::too_many_lines, reason = "single orchestration entry point, sequenced per §4.J")]
pub async fn run(req: RunRequest<'_>) -> Result<CampaignRunState, CampaignError> {
    let now = (req.clock)();
    let campaign_dir = layout::campaign_dir(req.out_root, &req.campaign.campaign_id);

    let lock = LockGuard::acquire(req.out_root, &req.campaign.campaign_id, now)?;

    let result = run_locked(&req, &campaign_dir, now).await;

    let state = match result {
        Ok(state) => state,
        Err(err) if err.aborts_run() => {
            let aborted = build_aborted_state(&req, &err, now)?;
            persist_final(&req, &campaign_dir, &aborted)?;
            aborted
        }
        Err(err) => return Err(err),
    };

    let cleanup_timeout = std::time::Duration::from_millis(req.campaign.timeouts.cleanup_hook_timeout_ms);
    if let Some(commands) = &req.campaign.hooks.cleanup {
        let _ = hooks::run(HookKind::Cleanup, commands, &[], cleanup_timeout).await;
    }

    lock.release()?;
    Ok(state)
}

/// Builds a minimal aborted [`CampaignRunState`] for an abort that happened
/// before (or without) any other persisted state.
///
/// # Errors
///
/// Returns [`CampaignError::InvalidId`] or [`CampaignError::Hashing`] only if
/// run-id generation or comparability-key hashing itself fails.
fn build_aborted_state(
    req: &RunRequest<'_>,
    err: &CampaignError,
    now: Timestamp,
) -> Result<CampaignRunState, CampaignError> {
    let run_id = run_id::generate_run_id(now)?;
    let shape = shape::build(req.campaign, req.parallel.get(), req.fail_fast, req.runtime_strategy.clone());
    let comparability_key = zcl_core::comparator::comparability_key(&shape)?;
    Ok(CampaignRunState {
        status: RunStatus::Aborted,
        run_id,
        resumed_from_run_id: None,
        comparability_key,
        mission_gates: Vec::new(),
        flow_runs: Vec::new(),
        reason_codes: vec![err.code()],
        total_missions: 0,
        missions_completed: 0,
        out_root: req.out_root.to_path_buf(),
        spec_path: req.campaign.mission_source.suite_path.clone(),
    })
}

/// Runs the body of the campaign once the lock is held.
async fn run_locked(
    req: &RunRequest<'_>,
    campaign_dir: &Path,
    now: Timestamp,
) -> Result<CampaignRunState, CampaignError> {
    let global_timeout = std::time::Duration::from_millis(req.campaign.timeouts.campaign_global_timeout_ms);
    let body = run_body(req, campaign_dir, now);
    match tokio::time::timeout(global_timeout, body).await {
        Ok(result) => result,
        Err(_elapsed) => Err(CampaignError::GlobalTimeout),
    }
}

/// The actual selection -> hooks -> wave loop -> persistence sequence.
async fn run_body(
    req: &RunRequest<'_>,
    campaign_dir: &Path,
    now: Timestamp,
) -> Result<CampaignRunState, CampaignError> {
    let prior_state = load_prior_state(campaign_dir);
    let already_done = progress::replay(campaign_dir)?;

    let hook_timeout = std::time::Duration::from_millis(req.campaign.timeouts.cleanup_hook_timeout_ms);
    if let Some(commands) = &req.campaign.hooks.pre_flight {
        hooks::run(HookKind::PreFlight, commands, &[], hook_timeout).await?;
    }

    let window = selection::select(req.suite, &req.campaign.mission_source)?;

    if req.campaign.prompt_mode == PromptMode::MissionOnly {
        for mission in &window {
            if let Some(term) = zcl_core::prompt_policy::mission_only_violation(&mission.prompt) {
                return Err(CampaignError::PromptModeViolation {
                    mission_id: mission.mission_id.as_str().to_string(),
                    term: term.to_string(),
                });
            }
        }
    }

    let run_id = run_id::generate_run_id(now)?;
    let shape = shape::build(req.campaign, req.parallel.get(), req.fail_fast, req.runtime_strategy.clone());
    let comparability_key = zcl_core::comparator::comparability_key(&shape)?;

    let mut mission_gates: Vec<MissionGate> = prior_state
        .as_ref()
        .map(|state| state.mission_gates.clone())
        .unwrap_or_default();
    let mut flow_totals: BTreeMap<FlowId, FlowRunSummary> = prior_state
        .as_ref()
        .map(|state| state.flow_runs.iter().map(|summary| (summary.flow_id.clone(), summary.clone())).collect())
        .unwrap_or_default();

    let mut state = CampaignRunState {
        status: RunStatus::Running,
        run_id: run_id.clone(),
        resumed_from_run_id: prior_state.map(|state| state.run_id),
        comparability_key,
        mission_gates: mission_gates.clone(),
        flow_runs: flow_totals.values().cloned().collect(),
        reason_codes: Vec::new(),
        total_missions: u32::try_from(window.len()).unwrap_or(u32::MAX),
        missions_completed: u32::try_from(already_done.len()).unwrap_or(0),
        out_root: req.out_root.to_path_buf(),
        spec_path: req.campaign.mission_source.suite_path.clone(),
    };

    let pending: Vec<&Mission> =
        window.into_iter().filter(|mission| !already_done.contains(&mission.mission_id)).collect();

    let mut fail_fast_tripped = false;
    for wave in pending.chunks(req.parallel.get() as usize) {
        if fail_fast_tripped {
            for mission in wave.iter().copied() {
                progress::append(campaign_dir, &skipped_event(req, mission, now))?;
                let gate = MissionGate {
                    mission_id: mission.mission_id.clone(),
                    status: zcl_core::model::AttemptStatus::Skipped,
                    flow_verdicts: BTreeMap::new(),
                    reasons: vec![GateReason::with_detail(Code::CampaignSkipped, "fail_fast_prior_failure")],
                };
                mission_gates.push(gate);
            }
            continue;
        }

        let outcomes = futures::future::join_all(
            wave.iter().copied().map(|mission| run_mission(req, campaign_dir, &run_id, mission, hook_timeout)),
        )
        .await;

        for outcome in outcomes {
            let (gate, summaries) = outcome?;
            if !matches!(gate.status, zcl_core::model::AttemptStatus::Valid) && req.fail_fast {
                fail_fast_tripped = true;
            }
            for summary in summaries {
                fold_flow_summary(&mut flow_totals, summary);
            }
            mission_gates.push(gate);
        }

        state.mission_gates = mission_gates.clone();
        state.flow_runs = flow_totals.values().cloned().collect();
        state.missions_completed = u32::try_from(mission_gates.len()).unwrap_or(u32::MAX);
        persist_state(campaign_dir, &state)?;
    }

    state.status = rollup_status(&mission_gates);
    state.reason_codes = rollup_reasons(&mission_gates);
    state.mission_gates = mission_gates;
    state.flow_runs = flow_totals.values().cloned().collect();
    persist_final(req, campaign_dir, &state)?;

    progress::append(
        campaign_dir,
        &ProgressEvent {
            kind: ProgressEventKind::RunCompleted,
            ts: now,
            campaign_id: req.campaign.campaign_id.clone(),
            mission_index: zcl_core::ids::MissionIndex(0),
            mission_id: MissionId::new("__run__")?,
            flow_id: None,
            attempt_id: None,
            details: serde_json::json!({ "status": state.status }),
        },
    )?;

    Ok(state)
}

fn skipped_event(req: &RunRequest<'_>, mission: &Mission, now: Timestamp) -> ProgressEvent {
    ProgressEvent {
        kind: ProgressEventKind::MissionSkipped,
        ts: now,
        campaign_id: req.campaign.campaign_id.clone(),
        mission_index: mission.mission_index,
        mission_id: mission.mission_id.clone(),
        flow_id: None,
        attempt_id: None,
        details: serde_json::json!({ "skipReason": "fail_fast_prior_failure" }),
    }
}

/// Runs every flow's attempt at one mission, then pair-gates the result.
async fn run_mission(
    req: &RunRequest<'_>,
    campaign_dir: &Path,
    run_id: &RunId,
    mission: &Mission,
    hook_timeout: std::time::Duration,
) -> Result<(MissionGate, Vec<FlowRunSummary>), CampaignError> {
    if let Some(commands) = &req.campaign.hooks.pre_mission {
        hooks::run(HookKind::PreMission, commands, &[], hook_timeout).await?;
    }

    let flow_results = if req.campaign.flow_mode == FlowMode::Parallel {
        futures::future::join_all(req.campaign.flows.iter().map(|flow| run_flow_attempt(req, campaign_dir, run_id, mission, flow)))
            .await
            .into_iter()
            .collect::<Result<Vec<_>, _>>()?
    } else {
        let mut results = Vec::with_capacity(req.campaign.flows.len());
        for flow in &req.campaign.flows {
            results.push(run_flow_attempt(req, campaign_dir, run_id, mission, flow).await?);
        }
        results
    };

    let mut flow_verdicts = BTreeMap::new();
    let mut reasons = Vec::new();
    let mut summaries = Vec::with_capacity(flow_results.len());
    for (flow_id, status, flow_reasons, summary) in flow_results {
        flow_verdicts.insert(flow_id, status);
        reasons.extend(flow_reasons);
        summaries.push(summary);
    }

    let (status, pair_reasons) = zcl_gate::pair::apply(req.campaign.gate.pair_gate, &flow_verdicts);
    reasons.extend(pair_reasons);
    reasons.sort();
    reasons.dedup();

    let gate = MissionGate { mission_id: mission.mission_id.clone(), status, flow_verdicts, reasons };

    progress::append(
        campaign_dir,
        &ProgressEvent {
            kind: ProgressEventKind::MissionGated,
            ts: (req.clock)(),
            campaign_id: req.campaign.campaign_id.clone(),
            mission_index: mission.mission_index,
            mission_id: mission.mission_id.clone(),
            flow_id: None,
            attempt_id: None,
            details: serde_json::json!({ "status": status }),
        },
    )?;

    if let Some(commands) = &req.campaign.hooks.post_mission {
        hooks::run(HookKind::PostMission, commands, &[], hook_timeout).await?;
    }

    Ok((gate, summaries))
}

/// Allocates and runs one flow's attempt at one mission, then evaluates its
/// gate dimensions (including the oracle dimension, when configured).
async fn run_flow_attempt(
    req: &RunRequest<'_>,
    campaign_dir: &Path,
    run_id: &RunId,
    mission: &Mission,
    flow: &zcl_core::model::Flow,
) -> Result<(FlowId, zcl_core::model::AttemptStatus, Vec<GateReason>, FlowRunSummary), CampaignError> {
    let started_at = (req.clock)();
    let allocation = allocator::allocate(AllocateRequest {
        out_root: req.out_root,
        run_id: run_id.clone(),
        flow_id: flow.flow_id.clone(),
        mission_index: mission.mission_index.0,
        mission_id: mission.mission_id.clone(),
        retry: RetryIndex(0),
        timeout_ms: flow.timeout_ms,
        timeout_start: flow.timeout_start,
        isolation_model: flow.isolation,
        prompt: mission.prompt.clone(),
        suite_snapshot: req.suite.clone(),
        agent_id: req.agent_id.clone(),
        started_at,
    })?;

    progress::append(
        campaign_dir,
        &ProgressEvent {
            kind: ProgressEventKind::AttemptAllocated,
            ts: started_at,
            campaign_id: req.campaign.campaign_id.clone(),
            mission_index: mission.mission_index,
            mission_id: mission.mission_id.clone(),
            flow_id: Some(flow.flow_id.clone()),
            attempt_id: Some(allocation.attempt.attempt_id.clone()),
            details: serde_json::json!({}),
        },
    )?;

    let native = match flow.isolation {
        zcl_core::model::IsolationModel::NativeSpawn => {
            let dispatch_ctx = NativeDispatchContext {
                flow,
                run_id,
                suite_id: &req.suite.suite_id,
                mission_id: &mission.mission_id,
                attempt_id: &allocation.attempt.attempt_id,
                agent_id: req.agent_id,
                attempt_dir: allocation.attempt_dir.as_path(),
            };
            let resolved = req
                .native
                .and_then(|resolver| resolver.resolve(&dispatch_ctx))
                .ok_or_else(|| CampaignError::NativeDispatchUnconfigured(flow.flow_id.clone()))?;
            Some(resolved)
        }
        zcl_core::model::IsolationModel::ProcessRunner => None,
    };

    progress::append(
        campaign_dir,
        &ProgressEvent {
            kind: ProgressEventKind::AttemptStarted,
            ts: (req.clock)(),
            campaign_id: req.campaign.campaign_id.clone(),
            mission_index: mission.mission_index,
            mission_id: mission.mission_id.clone(),
            flow_id: Some(flow.flow_id.clone()),
            attempt_id: Some(allocation.attempt.attempt_id.clone()),
            details: serde_json::json!({}),
        },
    )?;

    let outcome = zcl_runner::suite::run_attempt(RunAttemptRequest {
        allocation: &allocation,
        flow,
        blind: req.suite.defaults.blind,
        blind_terms: &req.suite.defaults.blind_terms,
        operator_out: req.operator_out.clone(),
        operator_err: req.operator_err.clone(),
        native,
        cancel: req.cancel,
        clock: req.clock.clone(),
    })
    .await?;

    progress::append(
        campaign_dir,
        &ProgressEvent {
            kind: ProgressEventKind::AttemptFinalized,
            ts: (req.clock)(),
            campaign_id: req.campaign.campaign_id.clone(),
            mission_index: mission.mission_index,
            mission_id: mission.mission_id.clone(),
            flow_id: Some(flow.flow_id.clone()),
            attempt_id: Some(allocation.attempt.attempt_id.clone()),
            details: serde_json::json!({ "ok": outcome.report.ok, "failureCode": outcome.failure_code }),
        },
    )?;

    let mut verdict =
        zcl_gate::evaluate_flow(&allocation.attempt_dir, flow, &outcome.report, outcome.feedback.as_ref())?;

    if flow.evaluation.mode == zcl_core::model::EvaluationMode::Oracle {
        let mission_context = mission.expects.clone().unwrap_or_else(|| serde_json::json!({}));
        let oracle_timeout = std::time::Duration::from_millis(flow.timeout_ms);
        let oracle_outcome =
            zcl_gate::evaluate_oracle(&allocation.attempt_dir, flow, &mission_context, oracle_timeout).await?;
        verdict = zcl_gate::fold_oracle_outcome(verdict, &oracle_outcome);
    }

    let summary = summary_for(&flow.flow_id, verdict.status);
    Ok((flow.flow_id.clone(), verdict.status, verdict.reasons, summary))
}

fn summary_for(flow_id: &FlowId, status: zcl_core::model::AttemptStatus) -> FlowRunSummary {
    let mut summary =
        FlowRunSummary { flow_id: flow_id.clone(), valid: 0, invalid: 0, skipped: 0, infra_failed: 0 };
    match status {
        zcl_core::model::AttemptStatus::Valid => summary.valid = 1,
        zcl_core::model::AttemptStatus::Invalid => summary.invalid = 1,
        zcl_core::model::AttemptStatus::Skipped => summary.skipped = 1,
        zcl_core::model::AttemptStatus::InfraFailed => summary.infra_failed = 1,
    }
    summary
}

fn fold_flow_summary(totals: &mut BTreeMap<FlowId, FlowRunSummary>, summary: FlowRunSummary) {
    totals
        .entry(summary.flow_id.clone())
        .and_modify(|existing| {
            existing.valid += summary.valid;
            existing.invalid += summary.invalid;
            existing.skipped += summary.skipped;
            existing.infra_failed += summary.infra_failed;
        })
        .or_insert(summary);
}

/// Rolls every mission gate up to a single run status (§4.J step 8).
///
/// A mission gate that is `InfraFailed` reflects a timeout, spawn failure, or
/// missing artifact rather than a genuine gate rejection. A run where every
/// non-valid gate is of that kind rolls up to `InfraFailed`, not `Invalid`, so
/// the CLI can tell an infrastructure problem from a failed evaluation.
fn rollup_status(gates: &[MissionGate]) -> RunStatus {
    use zcl_core::model::AttemptStatus;

    if gates.iter().all(|gate| gate.status == AttemptStatus::Valid) {
        RunStatus::Valid
    } else if gates
        .iter()
        .all(|gate| matches!(gate.status, AttemptStatus::Valid | AttemptStatus::InfraFailed))
        && gates.iter().any(|gate| gate.status == AttemptStatus::InfraFailed)
    {
        RunStatus::InfraFailed
    } else {
        RunStatus::Invalid
    }
}

/// Deduplicated, sorted reason codes across every non-valid mission gate.
fn rollup_reasons(gates: &[MissionGate]) -> Vec<Code> {
    let mut codes: Vec<Code> = gates.iter().flat_map(|gate| gate.reasons.iter().map(|reason| reason.code)).collect();
    codes.sort();
    codes.dedup();
    codes
}

// ============================================================================
// SECTION: Persistence
// ============================================================================

/// Reads an existing `campaign.run.state.json`, tolerating its absence for a
/// fresh run.
fn load_prior_state(campaign_dir: &Path) -> Option<CampaignRunState> {
    let path = campaign_dir.join("campaign.run.state.json");
    let raw = std::fs::read_to_string(path).ok()?;
    serde_json::from_str(&raw).ok()
}

/// Rewrites `campaign.run.state.json` mid-run, after each completed wave.
fn persist_state(campaign_dir: &Path, state: &CampaignRunState) -> Result<(), CampaignError> {
    let root = EvidenceRoot::open_or_create(campaign_dir)?;
    root.write_json_atomic(Path::new("campaign.run.state.json"), state)?;
    Ok(())
}

/// Persists the final run state plus the derived report, summary, and
/// `RESULTS.md` (§4.K).
fn persist_final(req: &RunRequest<'_>, campaign_dir: &Path, state: &CampaignRunState) -> Result<(), CampaignError> {
    persist_state(campaign_dir, state)?;

    let report = zcl_report::build_report(state, None);
    let claimed = BTreeMap::new();
    let summary = zcl_report::build_summary(state, &claimed);
    let results_md = zcl_report::markdown::render_results_md(req.campaign.campaign_id.as_str(), &report, &summary);

    let root = EvidenceRoot::open_or_create(campaign_dir)?;
    root.write_json_atomic(Path::new("campaign.report.json"), &report)?;
    root.write_json_atomic(Path::new("campaign.summary.json"), &summary)?;
    root.write_file_atomic(Path::new("RESULTS.md"), results_md.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "test-only assertions")]

    use std::io::Cursor;
    use std::sync::Arc;
    use std::sync::Mutex as StdMutex;

    use tempfile::tempdir;

    use super::run;
    use super::RunRequest;
    use zcl_core::ids::AgentId;
    use zcl_core::ids::CampaignId;
    use zcl_core::ids::FlowId;
    use zcl_core::ids::MissionId;
    use zcl_core::ids::MissionIndex;
    use zcl_core::ids::SuiteId;
    use zcl_core::model::Campaign;
    use zcl_core::model::EvaluationConfig;
    use zcl_core::model::EvaluationMode;
    use zcl_core::model::FinalizationConfig;
    use zcl_core::model::FinalizationMode;
    use zcl_core::model::Flow;
    use zcl_core::model::FlowMode;
    use zcl_core::model::GateConfig;
    use zcl_core::model::HooksConfig;
    use zcl_core::model::InvalidRunPolicy;
    use zcl_core::model::IsolationModel;
    use zcl_core::model::Mission;
    use zcl_core::model::MissionSelection;
    use zcl_core::model::MissionSourceConfig;
    use zcl_core::model::PairGatePolicy;
    use zcl_core::model::PromptMode;
    use zcl_core::model::RunnerType;
    use zcl_core::model::RunStatus;
    use zcl_core::model::Suite;
    use zcl_core::model::SuiteDefaults;
    use zcl_core::model::TimeoutStart;
    use zcl_core::model::TimeoutsConfig;
    use zcl_core::model::TraceProfile;
    use zcl_core::time::Timestamp;
    use zcl_scheduler::CancelToken;

    fn sink() -> zcl_runner::process::OperatorWriter {
        Arc::new(StdMutex::new(Cursor::new(Vec::new())))
    }

    fn flow(command: &str) -> Flow {
        Flow {
            flow_id: FlowId::new("f0").unwrap(),
            runner: RunnerType::ProcessCmd,
            command: Some(vec!["sh".to_string(), "-c".to_string(), command.to_string()]),
            env: std::collections::BTreeMap::new(),
            timeout_ms: 2000,
            timeout_start: TimeoutStart::AttemptStart,
            isolation: IsolationModel::ProcessRunner,
            tool_driver: None,
            shims: std::collections::BTreeMap::new(),
            finalization: FinalizationConfig { mode: FinalizationMode::AutoFail, result_channel: None },
            tool_policy: None,
            trace_profile: TraceProfile::None,
            evaluation: EvaluationConfig { mode: EvaluationMode::None, semantic_rules: None, oracle_command: None, oracle_policy: None },
            max_in_flight: None,
            min_start_interval_ms: None,
            mcp_call_limit: None,
        }
    }

    fn campaign() -> Campaign {
        Campaign {
            campaign_id: CampaignId::new("cmp-int").unwrap(),
            schema_version: 1,
            flows: vec![flow("exit 0")],
            gate: GateConfig { pair_gate: PairGatePolicy::RequireAllValid },
            invalid_run_policy: InvalidRunPolicy::StrictValidOnly,
            prompt_mode: PromptMode::Free,
            flow_mode: FlowMode::Sequential,
            mission_source: MissionSourceConfig {
                suite_path: "suite.toml".into(),
                selection: MissionSelection::Whole,
                mission_offset: 0,
                total_missions: None,
            },
            hooks: HooksConfig::default(),
            timeouts: TimeoutsConfig { campaign_global_timeout_ms: 60_000, cleanup_hook_timeout_ms: 5_000 },
        }
    }

    fn suite() -> Suite {
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
            missions: vec![Mission {
                mission_id: MissionId::new("m0").unwrap(),
                mission_index: MissionIndex(0),
                prompt: "do the thing".to_string(),
                tags: Vec::new(),
                expects: None,
            }],
        }
    }

    #[tokio::test]
    async fn a_clean_single_mission_run_is_valid() {
        let dir = tempdir().unwrap();
        let campaign = campaign();
        let suite = suite();
        let cancel = CancelToken::new();
        let state = run(RunRequest {
            campaign: &campaign,
            suite: &suite,
            out_root: dir.path(),
            agent_id: &AgentId::new("agent-1").unwrap(),
            parallel: std::num::NonZeroU32::new(1).unwrap(),
            fail_fast: false,
            runtime_strategy: None,
            operator_out: sink(),
            operator_err: sink(),
            native: None,
            clock: Arc::new(|| Timestamp::from_unix_millis(1)),
            cancel: &cancel,
        })
        .await
        .unwrap();
        assert_eq!(state.status, RunStatus::Valid);
        assert_eq!(state.mission_gates.len(), 1);
    }

    #[tokio::test]
    async fn a_failing_flow_rolls_up_to_invalid() {
        let dir = tempdir().unwrap();
        let mut campaign = campaign();
        campaign.flows = vec![flow("exit 1")];
        let suite = suite();
        let cancel = CancelToken::new();
        let state = run(RunRequest {
            campaign: &campaign,
            suite: &suite,
            out_root: dir.path(),
            agent_id: &AgentId::new("agent-1").unwrap(),
            parallel: std::num::NonZeroU32::new(1).unwrap(),
            fail_fast: false,
            runtime_strategy: None,
            operator_out: sink(),
            operator_err: sink(),
            native: None,
            clock: Arc::new(|| Timestamp::from_unix_millis(1)),
            cancel: &cancel,
        })
        .await
        .unwrap();
        assert_eq!(state.status, RunStatus::Invalid);
        assert!(dir.path().join("campaigns").join("cmp-int").join("RESULTS.md").exists());
    }

    #[tokio::test]
    async fn a_second_acquisition_while_the_first_is_held_is_rejected() {
        let dir = tempdir().unwrap();
        let campaign = campaign();
        let lock = crate::lock::LockGuard::acquire(dir.path(), &campaign.campaign_id, Timestamp::from_unix_millis(0)).unwrap();
        let suite = suite();
        let cancel = CancelToken::new();
        let err = run(RunRequest {
            campaign: &campaign,
            suite: &suite,
            out_root: dir.path(),
            agent_id: &AgentId::new("agent-1").unwrap(),
            parallel: std::num::NonZeroU32::new(1).unwrap(),
            fail_fast: false,
            runtime_strategy: None,
            operator_out: sink(),
            operator_err: sink(),
            native: None,
            clock: Arc::new(|| Timestamp::from_unix_millis(1)),
            cancel: &cancel,
        })
        .await
        .unwrap_err();
        assert!(matches!(err, super::CampaignError::LockHeld(_)));
        lock.release().unwrap();
    }
}
