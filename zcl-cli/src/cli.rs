// zcl-cli/src/cli.rs
// ============================================================================
// Module: Command-Line Surface
// Description: The clap-derived command tree for `zcl` (§6).
// Purpose: Declare every flag and subcommand; all behavior lives in
//          `commands.rs`.
// Dependencies: clap
// ============================================================================

//! ## Overview
//! Four top-level command groups mirror the artifacts they operate on:
//! `campaign` drives the Campaign Engine end to end, `suite` is a
//! lower-level debug surface that runs one flow against a suite directly,
//! `attempt` exposes the Attempt Allocator and Finalizer individually, and
//! `mission` wraps the Prompt Materializer.

use std::path::PathBuf;

use clap::Args;
use clap::Parser;
use clap::Subcommand;

/// ZCL campaign and evaluation engine command-line interface.
#[derive(Debug, Parser)]
#[command(name = "zcl", about = "Run and inspect ZCL campaigns", version)]
pub struct Cli {
    /// The command to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Top-level command groups.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Campaign-level operations: lint, run, resume, report, publish-check.
    Campaign {
        /// Campaign subcommand.
        #[command(subcommand)]
        command: CampaignCommand,
    },
    /// Suite-level debug operations: run one flow over a suite directly.
    Suite {
        /// Suite subcommand.
        #[command(subcommand)]
        command: SuiteCommand,
    },
    /// Attempt-level operations: allocate, finalize, inspect injected env.
    Attempt {
        /// Attempt subcommand.
        #[command(subcommand)]
        command: AttemptCommand,
    },
    /// Mission prompt operations.
    Mission {
        /// Mission subcommand.
        #[command(subcommand)]
        command: MissionCommand,
    },
}

/// `campaign` subcommands.
#[derive(Debug, Subcommand)]
pub enum CampaignCommand {
    /// Validate a campaign spec's cross-field rules without acquiring the
    /// campaign lock.
    Lint(CampaignSpecArgs),
    /// Run a campaign to completion (or its current mission window).
    Run(CampaignRunArgs),
    /// Run a campaign against a small mission window, for a quick
    /// smoke-test pass.
    Canary(CampaignCanaryArgs),
    /// Resume a campaign run that previously persisted state.
    Resume(CampaignRunArgs),
    /// Print the persisted run state for a campaign.
    Status(CampaignRefArgs),
    /// Print the persisted report for a campaign run.
    Report(CampaignRefArgs),
    /// Decide whether a finished run may be published.
    PublishCheck(PublishCheckArgs),
    /// Sanity-check a campaign spec and its environment.
    Doctor(CampaignSpecArgs),
}

/// `suite` subcommands.
#[derive(Debug, Subcommand)]
pub enum SuiteCommand {
    /// Run one flow from a campaign spec over its resolved suite directly,
    /// bypassing the lock, hooks, and resume machinery.
    Run(SuiteRunArgs),
}

/// `attempt` subcommands.
#[derive(Debug, Subcommand)]
pub enum AttemptCommand {
    /// Allocate a fresh attempt directory and print its injected env.
    Start(AttemptStartArgs),
    /// Finalize an already-run attempt and seal `attempt.report.json`.
    Finish(AttemptFinishArgs),
    /// Print the injected environment for an already-allocated attempt.
    Env(AttemptEnvArgs),
}

/// `mission` subcommands.
#[derive(Debug, Subcommand)]
pub enum MissionCommand {
    /// Materialize prompts for a suite's missions.
    Prompts {
        /// Prompt materialization subcommand.
        #[command(subcommand)]
        command: MissionPromptsCommand,
    },
}

/// `mission prompts` subcommands.
#[derive(Debug, Subcommand)]
pub enum MissionPromptsCommand {
    /// Build a prompt artifact from a suite and a template.
    Build(MissionPromptsBuildArgs),
}

// ============================================================================
// SECTION: Campaign Args
// ============================================================================

/// Arguments identifying a campaign spec on disk.
#[derive(Debug, Args)]
pub struct CampaignSpecArgs {
    /// Path to the campaign spec (TOML).
    #[arg(long)]
    pub spec: PathBuf,
    /// Output root the campaign writes evidence under.
    #[arg(long, default_value = ".zcl")]
    pub out_root: PathBuf,
}

/// Arguments for `campaign run`/`campaign resume`.
#[derive(Debug, Args)]
pub struct CampaignRunArgs {
    /// Campaign spec and output root.
    #[command(flatten)]
    pub spec: CampaignSpecArgs,
    /// Identifier of the runner under evaluation.
    #[arg(long)]
    pub agent_id: String,
    /// Wave width: how many missions run concurrently.
    #[arg(long, default_value_t = 1)]
    pub parallel: u32,
    /// Whether a failed wave skips every remaining mission.
    #[arg(long)]
    pub fail_fast: bool,
    /// Label recorded as the resolved native runtime strategy, folded into
    /// the comparability key.
    #[arg(long)]
    pub runtime_strategy: Option<String>,
    /// Argv used to spawn the Codex app-server peer for `codex_app_server`
    /// flows, whitespace-separated. Falls back to `ZCL_CODEX_APP_SERVER_CMD`.
    #[arg(long)]
    pub codex_app_server_cmd: Option<String>,
    /// Per-request timeout applied to native-spawn JSON-RPC calls, in seconds.
    #[arg(long, default_value_t = 30)]
    pub request_timeout_secs: u64,
}

/// Arguments for `campaign canary`.
#[derive(Debug, Args)]
pub struct CampaignCanaryArgs {
    /// Shared run arguments.
    #[command(flatten)]
    pub run: CampaignRunArgs,
    /// Number of missions to run, overriding the spec's mission window.
    #[arg(long, default_value_t = 1)]
    pub missions: u32,
}

/// Arguments identifying a persisted campaign run by id, for read-only
/// artifact inspection.
#[derive(Debug, Args)]
pub struct CampaignRefArgs {
    /// Output root the campaign wrote evidence under.
    #[arg(long, default_value = ".zcl")]
    pub out_root: PathBuf,
    /// Campaign identifier.
    #[arg(long)]
    pub campaign_id: String,
}

/// Arguments for `campaign publish-check`.
#[derive(Debug, Args)]
pub struct PublishCheckArgs {
    /// Campaign spec and output root.
    #[command(flatten)]
    pub spec: CampaignSpecArgs,
    /// Override the status gate; a prompt-mode compliance failure can never
    /// be forced through.
    #[arg(long)]
    pub force: bool,
}

// ============================================================================
// SECTION: Suite Args
// ============================================================================

/// Arguments for `suite run`.
#[derive(Debug, Args)]
pub struct SuiteRunArgs {
    /// Campaign spec and output root.
    #[command(flatten)]
    pub spec: CampaignSpecArgs,
    /// Flow, by id, to run over the suite.
    #[arg(long)]
    pub flow_id: String,
    /// Identifier of the runner under evaluation.
    #[arg(long)]
    pub agent_id: String,
}

// ============================================================================
// SECTION: Attempt Args
// ============================================================================

/// Arguments for `attempt start`.
#[derive(Debug, Args)]
pub struct AttemptStartArgs {
    /// Output root to allocate the attempt directory under.
    #[arg(long, default_value = ".zcl")]
    pub out_root: PathBuf,
    /// Run this attempt belongs to.
    #[arg(long)]
    pub run_id: String,
    /// Flow this attempt is scheduled under.
    #[arg(long)]
    pub flow_id: String,
    /// Suite document to snapshot into the attempt.
    #[arg(long)]
    pub suite: PathBuf,
    /// Mission being attempted.
    #[arg(long)]
    pub mission_id: String,
    /// Mission's 0-based position within the resolved suite.
    #[arg(long)]
    pub mission_index: u32,
    /// Monotonic retry counter within `(runId, missionId)`.
    #[arg(long, default_value_t = 0)]
    pub retry: u32,
    /// Per-attempt deadline budget, in milliseconds.
    #[arg(long)]
    pub timeout_ms: u64,
    /// Process vs native-spawn isolation for this attempt.
    #[arg(long, value_enum, default_value_t = IsolationModelArg::ProcessRunner)]
    pub isolation: IsolationModelArg,
    /// Path to the materialized prompt text to inject.
    #[arg(long)]
    pub prompt_file: PathBuf,
    /// Identifier of the runner under evaluation.
    #[arg(long)]
    pub agent_id: String,
}

/// `--isolation` values for [`AttemptStartArgs`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum IsolationModelArg {
    /// Spawn the runner as an external OS process.
    ProcessRunner,
    /// Drive the runner through a native in-process runtime session.
    NativeSpawn,
}

/// Arguments for `attempt finish`.
#[derive(Debug, Args)]
pub struct AttemptFinishArgs {
    /// Path to the already-allocated attempt directory.
    #[arg(long)]
    pub attempt_dir: PathBuf,
    /// Campaign spec the attempt's flow was declared in, to resolve its
    /// finalization policy.
    #[arg(long)]
    pub spec: PathBuf,
    /// Observed process exit code, when the runner was an OS process.
    #[arg(long)]
    pub exit_code: Option<i32>,
    /// The runner process could not be spawned at all.
    #[arg(long)]
    pub spawn_failed: bool,
    /// The runner reported an internal error independent of exit code.
    #[arg(long)]
    pub runner_errored: bool,
    /// The attempt's deadline elapsed before completion.
    #[arg(long)]
    pub timed_out: bool,
    /// Captured stdout tail, scanned for a `stdout_json` result marker.
    #[arg(long, default_value = "")]
    pub stdout_tail: String,
}

/// Arguments for `attempt env`.
#[derive(Debug, Args)]
pub struct AttemptEnvArgs {
    /// Path to the already-allocated attempt directory.
    #[arg(long)]
    pub attempt_dir: PathBuf,
}

// ============================================================================
// SECTION: Mission Args
// ============================================================================

/// Arguments for `mission prompts build`.
#[derive(Debug, Args)]
pub struct MissionPromptsBuildArgs {
    /// Suite document whose missions are materialized.
    #[arg(long)]
    pub suite: PathBuf,
    /// Flow ids to materialize a prompt for, in order. Repeat the flag for
    /// more than one flow.
    #[arg(long = "flow-id", required = true)]
    pub flow_ids: Vec<String>,
    /// Path to the prompt template file.
    #[arg(long)]
    pub template: PathBuf,
}
