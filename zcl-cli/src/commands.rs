// zcl-cli/src/commands.rs
// ============================================================================
// Module: Command Handlers
// Description: Implements every `zcl` subcommand on top of
//              zcl-campaign/zcl-config/zcl-gate/zcl-prompt/zcl-report/
//              zcl-runner (§6).
// Purpose: Translate parsed CLI arguments into calls against the workspace's
//          library crates, and render their results to stdout/stderr.
// Dependencies: zcl-campaign, zcl-config, zcl-core, zcl-evidence, zcl-gate,
//               zcl-prompt, zcl-report, zcl-runner, zcl-runtime, zcl-scheduler
// ============================================================================

//! ## Overview
//! [`run`] is the one entry point `main` and any in-process caller use.
//! Each handler below owns exactly one subcommand and returns the process
//! exit code to use; none of them call `std::process::exit`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::num::NonZeroU32;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use thiserror::Error;

use zcl_campaign::NativeDispatchResolver;
use zcl_campaign::RunRequest;
use zcl_core::Code;
use zcl_core::ids::AgentId;
use zcl_core::ids::CampaignId;
use zcl_core::ids::FlowId;
use zcl_core::ids::MissionId;
use zcl_core::ids::RetryIndex;
use zcl_core::ids::RunId;
use zcl_core::layout;
use zcl_core::model::AttemptIntegrity;
use zcl_core::model::AttemptMetrics;
use zcl_core::model::AttemptReport;
use zcl_core::model::Campaign;
use zcl_core::model::CampaignRunState;
use zcl_core::model::IsolationModel;
use zcl_core::model::RunnerType;
use zcl_core::model::Suite;
use zcl_runner::AttemptRunOutcome;
use zcl_runner::RunAttemptRequest;
use zcl_runner::RunnerOutcome;
use zcl_runner::allocator;
use zcl_runner::allocator::AllocateRequest;
use zcl_scheduler::CancelToken;

use crate::cli::AttemptCommand;
use crate::cli::AttemptEnvArgs;
use crate::cli::AttemptFinishArgs;
use crate::cli::AttemptStartArgs;
use crate::cli::CampaignCanaryArgs;
use crate::cli::CampaignCommand;
use crate::cli::CampaignRefArgs;
use crate::cli::CampaignRunArgs;
use crate::cli::CampaignSpecArgs;
use crate::cli::Cli;
use crate::cli::Command;
use crate::cli::IsolationModelArg;
use crate::cli::MissionCommand;
use crate::cli::MissionPromptsBuildArgs;
use crate::cli::MissionPromptsCommand;
use crate::cli::PublishCheckArgs;
use crate::cli::SuiteCommand;
use crate::cli::SuiteRunArgs;
use crate::native_dispatch::CliNativeDispatchResolver;
use crate::operator;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors surfaced to the process boundary by every command handler.
#[derive(Debug, Error)]
pub enum CliError {
    /// A malformed request: bad flag combination, unknown flow id, missing
    /// file.
    #[error("usage error: {0}")]
    Usage(String),
    /// A filesystem or locking failure outside the library crates' own
    /// error types.
    #[error("io error: {0}")]
    Io(String),
    /// Loading a campaign or suite document failed.
    #[error("{0}")]
    Config(#[from] zcl_config::ConfigError),
    /// Running or resuming a campaign failed.
    #[error("{0}")]
    Campaign(#[from] zcl_campaign::CampaignError),
    /// Allocating, dispatching, or finalizing an attempt failed.
    #[error("{0}")]
    Runner(#[from] zcl_runner::RunnerError),
    /// Evaluating a mission gate failed.
    #[error("{0}")]
    Gate(#[from] zcl_gate::GateError),
    /// Materializing mission prompts failed.
    #[error("{0}")]
    Prompt(#[from] zcl_prompt::MaterializeError),
    /// An evidence-store operation failed.
    #[error("{0}")]
    Evidence(#[from] zcl_evidence::EvidenceError),
    /// A persisted JSON artifact failed to parse.
    #[error("failed to parse json: {0}")]
    Json(#[from] serde_json::Error),
    /// A run's publish-check or mission-gate outcome was negative.
    #[error("{0}")]
    GateFailed(String),
}

impl CliError {
    /// Maps this error onto the process exit-code convention: `2` for usage,
    /// validation, and gate-failure outcomes, `1` for everything else (§6).
    #[must_use]
    pub fn exit_code(&self) -> ExitCode {
        let usage_like = match self {
            Self::Usage(_) | Self::GateFailed(_) | Self::Config(_) => true,
            Self::Campaign(err) => {
                matches!(err, zcl_campaign::CampaignError::Usage(_) | zcl_campaign::CampaignError::PromptModeViolation { .. })
            }
            _ => false,
        };
        if usage_like { ExitCode::from(2) } else { ExitCode::from(1) }
    }
}

/// Convenience alias for every command handler's result type.
pub type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// Parses `args` and dispatches to the matching command handler.
///
/// `args` must include the program name as its first element, matching
/// `std::env::args()`'s own convention.
///
/// # Errors
///
/// Returns [`CliError`] for any failure surfaced by the underlying library
/// crates; a clap usage error is instead rendered to stderr and folded into
/// the returned [`ExitCode`] directly.
pub async fn run(args: Vec<String>) -> CliResult<ExitCode> {
    let cli = match <Cli as clap::Parser>::try_parse_from(args) {
        Ok(cli) => cli,
        Err(err) => {
            operator::write_line(&operator::stderr_writer(), err.render().to_string().trim_end())?;
            let code = u8::try_from(err.exit_code()).unwrap_or(2);
            return Ok(ExitCode::from(code));
        }
    };

    match cli.command {
        Command::Campaign { command } => campaign_command(command).await,
        Command::Suite { command } => suite_command(command).await,
        Command::Attempt { command } => attempt_command(command),
        Command::Mission { command } => mission_command(command),
    }
}

// ============================================================================
// SECTION: Campaign Commands
// ============================================================================

/// Dispatches a `campaign` subcommand.
async fn campaign_command(command: CampaignCommand) -> CliResult<ExitCode> {
    match command {
        CampaignCommand::Lint(args) => campaign_lint(&args),
        CampaignCommand::Run(args) => campaign_run(&args, false).await,
        CampaignCommand::Canary(args) => campaign_canary(&args).await,
        CampaignCommand::Resume(args) => campaign_run(&args, true).await,
        CampaignCommand::Status(args) => campaign_status(&args),
        CampaignCommand::Report(args) => campaign_report(&args),
        CampaignCommand::PublishCheck(args) => campaign_publish_check(&args),
        CampaignCommand::Doctor(args) => campaign_doctor(&args),
    }
}

/// Resolves a campaign's suite path, which is relative to the spec file's
/// own directory.
fn resolve_suite_path(spec_path: &Path, campaign: &Campaign) -> PathBuf {
    let base = spec_path.parent().unwrap_or_else(|| Path::new("."));
    base.join(&campaign.mission_source.suite_path)
}

/// Loads a campaign spec and the suite it references.
fn load_campaign_and_suite(args: &CampaignSpecArgs) -> CliResult<(Campaign, Suite)> {
    let campaign = zcl_config::load_campaign(&args.spec)?;
    let suite_path = resolve_suite_path(&args.spec, &campaign);
    let suite = zcl_config::load_suite(&suite_path)?;
    Ok((campaign, suite))
}

/// Runs `campaign lint`.
fn campaign_lint(args: &CampaignSpecArgs) -> CliResult<ExitCode> {
    let campaign = zcl_config::load_campaign(&args.spec)?;
    let findings = zcl_config::lint(&campaign);
    let payload = serde_json::json!({ "findings": findings.iter().map(lint_finding_json).collect::<Vec<_>>() });
    print_json(&payload)?;
    Ok(if findings.is_empty() { ExitCode::SUCCESS } else { ExitCode::from(2) })
}

/// Renders one lint finding as a JSON object.
fn lint_finding_json(finding: &zcl_config::LintFinding) -> serde_json::Value {
    serde_json::json!({
        "code": finding.code.to_string(),
        "flow_id": finding.flow_id,
        "detail": finding.detail,
    })
}

/// Builds the Codex app-server argv from `--codex-app-server-cmd`, falling
/// back to `ZCL_CODEX_APP_SERVER_CMD`.
fn resolve_codex_app_server_cmd(flag: Option<&str>) -> Vec<String> {
    let raw = flag.map(ToString::to_string).or_else(|| std::env::var("ZCL_CODEX_APP_SERVER_CMD").ok());
    raw.map(|raw| raw.split_whitespace().map(ToString::to_string).collect()).unwrap_or_default()
}

/// Runs `campaign run`/`campaign resume`, validating prior state exists first when `resume` is set.
async fn campaign_run(args: &CampaignRunArgs, resume: bool) -> CliResult<ExitCode> {
    let (campaign, suite) = load_campaign_and_suite(&args.spec)?;

    if resume {
        let state_path = layout::campaign_run_state_json(&args.spec.out_root, &campaign.campaign_id);
        if !state_path.exists() {
            return Err(CliError::Usage(format!(
                "nothing to resume: no prior run state at {}",
                state_path.display()
            )));
        }
    }

    let state = execute_campaign_run(args, &campaign, &suite).await?;
    print_json(&state)?;
    Ok(exit_code_for_status(state.status))
}

/// Runs `campaign canary`, overriding the mission window to a small count.
async fn campaign_canary(args: &CampaignCanaryArgs) -> CliResult<ExitCode> {
    let (mut campaign, suite) = load_campaign_and_suite(&args.run.spec)?;
    campaign.mission_source.total_missions = Some(args.missions);

    let state = execute_campaign_run(&args.run, &campaign, &suite).await?;
    print_json(&state)?;
    Ok(exit_code_for_status(state.status))
}

/// Maps a run's rollup status onto the process exit-code convention.
fn exit_code_for_status(status: zcl_core::model::RunStatus) -> ExitCode {
    match status {
        zcl_core::model::RunStatus::Valid | zcl_core::model::RunStatus::Running => ExitCode::SUCCESS,
        zcl_core::model::RunStatus::Invalid => ExitCode::from(2),
        zcl_core::model::RunStatus::InfraFailed | zcl_core::model::RunStatus::Aborted => ExitCode::from(1),
    }
}

/// Builds a `RunRequest` and drives a campaign run to completion.
async fn execute_campaign_run(
    args: &CampaignRunArgs,
    campaign: &Campaign,
    suite: &Suite,
) -> CliResult<CampaignRunState> {
    let agent_id = AgentId::new(args.agent_id.clone()).map_err(|err| CliError::Usage(err.to_string()))?;
    let parallel = NonZeroU32::new(args.parallel).ok_or_else(|| CliError::Usage("--parallel must be nonzero".to_string()))?;
    let cancel = CancelToken::new();
    let clock = operator::clock_fn();

    let command = resolve_codex_app_server_cmd(args.codex_app_server_cmd.as_deref());
    let resolver = CliNativeDispatchResolver::new(
        &campaign.flows,
        command,
        Duration::from_secs(args.request_timeout_secs),
        clock.clone(),
        operator::stderr_writer(),
    );
    let has_native_flows = campaign.flows.iter().any(|flow| flow.runner == RunnerType::CodexAppServer);
    let native: Option<&dyn NativeDispatchResolver> = if has_native_flows { Some(&resolver) } else { None };

    let request = RunRequest {
        campaign,
        suite,
        out_root: &args.spec.out_root,
        agent_id: &agent_id,
        parallel,
        fail_fast: args.fail_fast,
        runtime_strategy: args.runtime_strategy.clone(),
        operator_out: operator::stdout_writer(),
        operator_err: operator::stderr_writer(),
        native,
        clock,
        cancel: &cancel,
    };

    Ok(zcl_campaign::run(request).await?)
}

/// Runs `campaign status`, reading the persisted run state.
fn campaign_status(args: &CampaignRefArgs) -> CliResult<ExitCode> {
    let campaign_id = CampaignId::new(args.campaign_id.clone()).map_err(|err| CliError::Usage(err.to_string()))?;
    let path = layout::campaign_run_state_json(&args.out_root, &campaign_id);
    let state: CampaignRunState = read_json(&path)?;
    print_json(&state)?;
    Ok(exit_code_for_status(state.status))
}

/// Runs `campaign report`, reading the persisted report and summary.
fn campaign_report(args: &CampaignRefArgs) -> CliResult<ExitCode> {
    let campaign_id = CampaignId::new(args.campaign_id.clone()).map_err(|err| CliError::Usage(err.to_string()))?;
    let report_path = layout::campaign_report_json(&args.out_root, &campaign_id);
    let report: zcl_report::BuildReport = read_json(&report_path)?;
    let summary_path = layout::campaign_summary_json(&args.out_root, &campaign_id);
    let summary: zcl_report::BuildSummary = read_json(&summary_path)?;
    print_json(&serde_json::json!({ "report": report, "summary": summary }))?;
    Ok(exit_code_for_status(report.status))
}

/// Runs `campaign publish-check`.
fn campaign_publish_check(args: &PublishCheckArgs) -> CliResult<ExitCode> {
    let (campaign, suite) = load_campaign_and_suite(&args.spec)?;
    let report_path = layout::campaign_report_json(&args.spec.out_root, &campaign.campaign_id);
    let report: zcl_report::BuildReport = read_json(&report_path)?;

    let result = zcl_report::publish_check(&zcl_report::PublishCheckRequest {
        status: report.status,
        invalid_run_policy: campaign.invalid_run_policy,
        publish_requires_valid: true,
        force: args.force,
        prompt_mode: campaign.prompt_mode,
        suite: &suite,
    });

    print_json(&serde_json::json!({
        "ok": result.ok,
        "reason_codes": result.reason_codes.iter().map(ToString::to_string).collect::<Vec<_>>(),
    }))?;

    if result.ok { Ok(ExitCode::SUCCESS) } else { Ok(ExitCode::from(2)) }
}

/// Runs `campaign doctor`: lint plus environment sanity checks.
fn campaign_doctor(args: &CampaignSpecArgs) -> CliResult<ExitCode> {
    let campaign = zcl_config::load_campaign(&args.spec)?;
    let mut findings = zcl_config::lint(&campaign);

    let suite_path = resolve_suite_path(&args.spec, &campaign);
    if !suite_path.exists() {
        findings.push(zcl_config::LintFinding { code: Code::Usage, flow_id: None, detail: format!("suite path {} does not exist", suite_path.display()) });
    }

    for flow in &campaign.flows {
        if flow.runner == RunnerType::CodexAppServer
            && resolve_codex_app_server_cmd(None).is_empty()
        {
            findings.push(zcl_config::LintFinding {
                code: Code::Usage,
                flow_id: Some(flow.flow_id.as_str().to_string()),
                detail: "runner = codex_app_server but ZCL_CODEX_APP_SERVER_CMD is unset".to_string(),
            });
        }
    }

    let payload = serde_json::json!({ "findings": findings.iter().map(lint_finding_json).collect::<Vec<_>>() });
    print_json(&payload)?;
    Ok(if findings.is_empty() { ExitCode::SUCCESS } else { ExitCode::from(2) })
}

// ============================================================================
// SECTION: Suite Commands
// ============================================================================

/// Dispatches a `suite` subcommand.
async fn suite_command(command: SuiteCommand) -> CliResult<ExitCode> {
    match command {
        SuiteCommand::Run(args) => suite_run(&args).await,
    }
}

/// Runs `suite run`: one flow driven directly over a suite's missions.
async fn suite_run(args: &SuiteRunArgs) -> CliResult<ExitCode> {
    let (campaign, suite) = load_campaign_and_suite(&args.spec)?;
    let flow = campaign
        .flows
        .iter()
        .find(|flow| flow.flow_id.as_str() == args.flow_id)
        .ok_or_else(|| CliError::Usage(format!("no flow {} in {}", args.flow_id, args.spec.spec.display())))?;

    if flow.runner == RunnerType::CodexAppServer {
        return Err(CliError::Usage(
            "suite run only supports process-mode flows; use campaign run for native dispatch".to_string(),
        ));
    }

    let flow_id = FlowId::new(args.flow_id.clone()).map_err(|err| CliError::Usage(err.to_string()))?;
    let agent_id = AgentId::new(args.agent_id.clone()).map_err(|err| CliError::Usage(err.to_string()))?;
    let now = operator::now()?;
    let run_id = zcl_campaign::run_id::generate_run_id(now).map_err(|err| CliError::Usage(err.to_string()))?;
    let cancel = CancelToken::new();
    let mut outcomes = Vec::with_capacity(suite.missions.len());

    for mission in &suite.missions {
        let prompt_artifact = zcl_prompt::materialize(&zcl_prompt::MaterializeRequest {
            campaign_id: &campaign.campaign_id,
            suite_id: &suite.suite_id,
            flow_ids: std::slice::from_ref(&flow_id),
            missions: &[mission],
            template: "{{prompt}}",
        })?;
        let prompt = prompt_artifact
            .prompts
            .first()
            .map(|prompt| prompt.prompt.clone())
            .unwrap_or_else(|| mission.prompt.clone());

        let allocation = allocator::allocate(AllocateRequest {
            out_root: &args.spec.out_root,
            run_id: run_id.clone(),
            flow_id: flow_id.clone(),
            mission_index: mission.mission_index.0,
            mission_id: mission.mission_id.clone(),
            retry: RetryIndex(0),
            timeout_ms: flow.timeout_ms,
            timeout_start: flow.timeout_start,
            isolation_model: flow.isolation,
            prompt,
            suite_snapshot: suite.clone(),
            agent_id: agent_id.clone(),
            started_at: now,
        })?;

        let outcome: AttemptRunOutcome = zcl_runner::run_attempt(RunAttemptRequest {
            allocation: &allocation,
            flow,
            blind: suite.defaults.blind,
            blind_terms: &suite.defaults.blind_terms,
            operator_out: operator::stdout_writer(),
            operator_err: operator::stderr_writer(),
            native: None,
            cancel: &cancel,
            clock: operator::clock_fn(),
        })
        .await?;

        let verdict = zcl_gate::evaluate_flow(&allocation.attempt_dir, flow, &outcome.report, outcome.feedback.as_ref())?;
        outcomes.push(serde_json::json!({
            "mission_id": mission.mission_id.as_str(),
            "attempt_id": outcome.attempt_id.as_str(),
            "status": verdict.status,
            "reasons": verdict.reasons,
        }));
    }

    print_json(&outcomes)?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Attempt Commands
// ============================================================================

/// Dispatches an `attempt` subcommand.
fn attempt_command(command: AttemptCommand) -> CliResult<ExitCode> {
    match command {
        AttemptCommand::Start(args) => attempt_start(&args),
        AttemptCommand::Finish(args) => attempt_finish(&args),
        AttemptCommand::Env(args) => attempt_env(&args),
    }
}

/// Runs `attempt start`.
fn attempt_start(args: &AttemptStartArgs) -> CliResult<ExitCode> {
    let suite = zcl_config::load_suite(&args.suite)?;
    let prompt = std::fs::read_to_string(&args.prompt_file).map_err(|err| CliError::Io(err.to_string()))?;
    let now = operator::now()?;

    let isolation_model = match args.isolation {
        IsolationModelArg::ProcessRunner => IsolationModel::ProcessRunner,
        IsolationModelArg::NativeSpawn => IsolationModel::NativeSpawn,
    };

    let allocation = allocator::allocate(AllocateRequest {
        out_root: &args.out_root,
        run_id: RunId::new(args.run_id.clone()).map_err(|err| CliError::Usage(err.to_string()))?,
        flow_id: FlowId::new(args.flow_id.clone()).map_err(|err| CliError::Usage(err.to_string()))?,
        mission_index: args.mission_index,
        mission_id: MissionId::new(args.mission_id.clone()).map_err(|err| CliError::Usage(err.to_string()))?,
        retry: RetryIndex(args.retry),
        timeout_ms: args.timeout_ms,
        timeout_start: suite.defaults.timeout_start,
        isolation_model,
        prompt,
        suite_snapshot: suite,
        agent_id: AgentId::new(args.agent_id.clone()).map_err(|err| CliError::Usage(err.to_string()))?,
        started_at: now,
    })?;

    print_json(&serde_json::json!({
        "attempt_dir": allocation.attempt_dir.to_string_lossy(),
        "env": allocation.env.as_pairs().into_iter().collect::<BTreeMap<_, _>>(),
    }))?;
    Ok(ExitCode::SUCCESS)
}

/// Runs `attempt finish`.
fn attempt_finish(args: &AttemptFinishArgs) -> CliResult<ExitCode> {
    let attempt_json_path = layout::attempt_json(&args.attempt_dir);
    let attempt: zcl_core::model::Attempt = read_json(&attempt_json_path)?;

    let campaign = zcl_config::load_campaign(&args.spec)?;
    let flow = campaign
        .flows
        .iter()
        .find(|flow| flow.flow_id == attempt.flow_id)
        .ok_or_else(|| CliError::Usage(format!("no flow {} in {}", attempt.flow_id, args.spec.display())))?;

    let now = operator::now()?;
    let outcome = RunnerOutcome {
        exit_code: args.exit_code,
        spawn_failed: args.spawn_failed,
        runner_errored: args.runner_errored,
        timed_out: args.timed_out,
        stdout_tail: &args.stdout_tail,
    };

    let finalize_outcome = zcl_runner::finalize::finalize(&args.attempt_dir, &flow.finalization, &outcome, now)?;
    if finalize_outcome.synthesized {
        if let Some(feedback) = &finalize_outcome.feedback {
            zcl_runner::finalize::persist_feedback(&args.attempt_dir, feedback)?;
        }
    }

    let prompt_contaminated = if attempt.suite_snapshot.defaults.blind {
        zcl_runner::contamination::scan(&attempt.prompt, &attempt.suite_snapshot.defaults.blind_terms).is_some()
    } else {
        false
    };

    let report = build_attempt_report(&args.attempt_dir, &finalize_outcome, prompt_contaminated, args.timed_out, now)?;

    let root = zcl_evidence::EvidenceRoot::open_or_create(&args.attempt_dir)?;
    root.write_json_atomic(Path::new("attempt.report.json"), &report)?;

    print_json(&report)?;
    Ok(if report.ok == Some(true) { ExitCode::SUCCESS } else { ExitCode::from(2) })
}

/// Reimplements `zcl_runner::suite`'s private `build_report`, since the
/// CLI finalizes attempts the Suite Runner did not itself dispatch.
fn build_attempt_report(
    attempt_dir: &Path,
    outcome: &zcl_runner::FinalizeOutcome,
    prompt_contaminated: bool,
    timed_out: bool,
    ended_at: zcl_core::Timestamp,
) -> CliResult<AttemptReport> {
    let trace_path = layout::tool_calls_jsonl(attempt_dir);
    let trace_present = trace_path.exists();
    let tool_calls_total = if trace_present { count_non_empty_lines(&trace_path)? } else { 0 };
    let trace_non_empty = trace_present && tool_calls_total > 0;
    let feedback_present = layout::feedback_json(attempt_dir).exists();

    Ok(AttemptReport {
        ok: outcome.feedback.as_ref().map(|feedback| feedback.ok),
        integrity: AttemptIntegrity { trace_present, trace_non_empty, feedback_present, prompt_contaminated },
        metrics: AttemptMetrics { tool_calls_total, token_estimates: None },
        failure_code_histogram: outcome.failure_code.map_or_else(BTreeMap::new, one_code_histogram),
        timed_out_before_first_tool_call: timed_out && !trace_non_empty,
        ended_at,
    })
}

/// Counts non-empty lines in a JSONL file, returning `0` for an absent file.
fn count_non_empty_lines(path: &Path) -> CliResult<u32> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(err) => return Err(CliError::Io(err.to_string())),
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

/// Runs `attempt env`.
fn attempt_env(args: &AttemptEnvArgs) -> CliResult<ExitCode> {
    let attempt_json_path = layout::attempt_json(&args.attempt_dir);
    let attempt: zcl_core::model::Attempt = read_json(&attempt_json_path)?;

    let isolation_model = match attempt.isolation_model {
        IsolationModel::ProcessRunner => "process_runner",
        IsolationModel::NativeSpawn => "native_spawn",
    };
    let tmp_dir = attempt.attempt_dir.join("tmp");

    let pairs: BTreeMap<&str, String> = BTreeMap::from([
        ("ZCL_RUN_ID", attempt.run_id.as_str().to_string()),
        ("ZCL_SUITE_ID", attempt.suite_id.as_str().to_string()),
        ("ZCL_MISSION_ID", attempt.mission_id.as_str().to_string()),
        ("ZCL_ATTEMPT_ID", attempt.attempt_id.as_str().to_string()),
        ("ZCL_OUT_DIR", attempt.attempt_dir.to_string_lossy().into_owned()),
        ("ZCL_TMP_DIR", tmp_dir.to_string_lossy().into_owned()),
        ("ZCL_AGENT_ID", attempt.agent_id.as_str().to_string()),
        ("ZCL_ISOLATION_MODEL", isolation_model.to_string()),
        ("ZCL_PROMPT_PATH", layout::prompt_txt(&attempt.attempt_dir).to_string_lossy().into_owned()),
    ]);

    print_json(&pairs)?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Mission Commands
// ============================================================================

/// Dispatches a `mission` subcommand.
fn mission_command(command: MissionCommand) -> CliResult<ExitCode> {
    match command {
        MissionCommand::Prompts { command } => match command {
            MissionPromptsCommand::Build(args) => mission_prompts_build(&args),
        },
    }
}

/// Runs `mission prompts build`.
fn mission_prompts_build(args: &MissionPromptsBuildArgs) -> CliResult<ExitCode> {
    let suite = zcl_config::load_suite(&args.suite)?;
    let template = std::fs::read_to_string(&args.template).map_err(|err| CliError::Io(err.to_string()))?;

    let flow_ids: Vec<FlowId> =
        args.flow_ids.iter().map(|id| FlowId::new(id.clone())).collect::<Result<_, _>>().map_err(|err| CliError::Usage(err.to_string()))?;
    let missions: Vec<&zcl_core::model::Mission> = suite.missions.iter().collect();

    let artifact = zcl_prompt::materialize(&zcl_prompt::MaterializeRequest {
        campaign_id: &CampaignId::new("ad-hoc").map_err(|err| CliError::Usage(err.to_string()))?,
        suite_id: &suite.suite_id,
        flow_ids: &flow_ids,
        missions: &missions,
        template: &template,
    })?;

    print_json(&artifact)?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Serializes `value` as pretty JSON and writes it to stdout.
fn print_json<T: serde::Serialize>(value: &T) -> CliResult<()> {
    let rendered = serde_json::to_string_pretty(value)?;
    operator::write_line(&operator::stdout_writer(), &rendered)
}

/// Reads and parses a persisted JSON artifact.
fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> CliResult<T> {
    let raw = std::fs::read_to_string(path).map_err(|err| CliError::Io(format!("{}: {err}", path.display())))?;
    Ok(serde_json::from_str(&raw)?)
}
