// zcl-core/src/model/campaign.rs
// ============================================================================
// Module: Campaign & Flow Declaration
// Description: Types describing a campaign spec before resolution.
// Purpose: Typed representation of the user-authored campaign document.
// ============================================================================

//! ## Overview
//! A [`Campaign`] is the parsed, validated form of the user-authored campaign
//! document (see `zcl-config` for the raw deserialization + validation
//! layer). Everything here is inert data; no I/O, no process model.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use crate::ids::CampaignId;
use crate::ids::FlowId;

// ============================================================================
// SECTION: Campaign
// ============================================================================

/// A fully resolved campaign declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    /// Stable campaign identifier, scoped to the output root.
    pub campaign_id: CampaignId,
    /// Spec schema version, for forward-compatible parsing.
    pub schema_version: u32,
    /// Ordered list of flows this campaign drives.
    pub flows: Vec<Flow>,
    /// Gate configuration shared across flows unless overridden.
    pub gate: GateConfig,
    /// Policy applied when rolling up invalid/aborted runs.
    pub invalid_run_policy: InvalidRunPolicy,
    /// Prompt vocabulary policy.
    pub prompt_mode: PromptMode,
    /// Flow execution ordering (sequential per mission, or parallel).
    pub flow_mode: FlowMode,
    /// Mission selection and windowing applied before the run starts.
    pub mission_source: MissionSourceConfig,
    /// Optional lifecycle shell hooks.
    #[serde(default)]
    pub hooks: HooksConfig,
    /// Campaign-wide timeout budgets.
    pub timeouts: TimeoutsConfig,
}

// ============================================================================
// SECTION: Mission Source & Selection
// ============================================================================

/// Where a campaign's suite comes from and which missions within it run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionSourceConfig {
    /// Path to the suite document, relative to the campaign spec.
    pub suite_path: std::path::PathBuf,
    /// Mission selection applied before the offset/total window.
    #[serde(default)]
    pub selection: MissionSelection,
    /// 0-based offset into the selected missions.
    #[serde(default)]
    pub mission_offset: u32,
    /// Count of missions to run starting at `mission_offset`; `None` means
    /// every selected mission from the offset onward.
    #[serde(default)]
    pub total_missions: Option<u32>,
}

/// Which missions within a suite a campaign selects before windowing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissionSelection {
    /// Every mission in the suite, in declared order.
    Whole,
    /// Only missions at the given 0-based indexes, in declared order.
    Indexes(Vec<u32>),
    /// Only missions carrying at least one of the given tags.
    Tags(Vec<String>),
}

impl Default for MissionSelection {
    fn default() -> Self {
        Self::Whole
    }
}

// ============================================================================
// SECTION: Hooks & Timeouts
// ============================================================================

/// Optional lifecycle shell hooks (§4.J step 6).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HooksConfig {
    /// Runs once before mission selection, before any attempt starts.
    #[serde(default)]
    pub pre_flight: Option<Vec<String>>,
    /// Runs before each mission's flows are attempted.
    #[serde(default)]
    pub pre_mission: Option<Vec<String>>,
    /// Runs after each mission's flows complete and are gated.
    #[serde(default)]
    pub post_mission: Option<Vec<String>>,
    /// Runs once after the run concludes, regardless of status.
    #[serde(default)]
    pub cleanup: Option<Vec<String>>,
}

/// Campaign-wide timeout budgets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeoutsConfig {
    /// Deadline for the entire campaign run, cancelling all in-flight work.
    pub campaign_global_timeout_ms: u64,
    /// Bound on any single hook invocation, including `cleanup`.
    pub cleanup_hook_timeout_ms: u64,
}

/// Policy controlling which statuses a run may still be published under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidRunPolicy {
    /// Only `valid` runs may be published.
    StrictValidOnly,
    /// `invalid` runs may also be published (still requires an explicit ok flag).
    AllowInvalid,
}

/// Prompt vocabulary policy (§4.J step 3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptMode {
    /// No vocabulary restriction.
    Free,
    /// Prompts must not reference harness vocabulary.
    MissionOnly,
    /// Prompts and oracle sources are kept separate; an evaluator is required.
    Exam,
}

/// Whether flows for a given mission run sequentially or concurrently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowMode {
    /// Flows for a mission run one after another, in declaration order.
    Sequential,
    /// Flows for a mission run concurrently.
    Parallel,
}

// ============================================================================
// SECTION: Flow
// ============================================================================

/// A runner adapter configuration within a campaign.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flow {
    /// Stable flow identifier, scoped to the campaign.
    pub flow_id: FlowId,
    /// Runner descriptor selecting how missions are executed.
    pub runner: RunnerType,
    /// Command to spawn, required when `runner = process_cmd`.
    #[serde(default)]
    pub command: Option<Vec<String>>,
    /// Environment variables merged into the spawned process or session.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    /// Default per-attempt timeout.
    pub timeout_ms: u64,
    /// When the attempt deadline starts counting down.
    pub timeout_start: TimeoutStart,
    /// Process vs native-spawn isolation hint.
    pub isolation: IsolationModel,
    /// Tool-driver identifier; some drivers require shims.
    #[serde(default)]
    pub tool_driver: Option<String>,
    /// Shim commands keyed by shim name.
    #[serde(default)]
    pub shims: BTreeMap<String, Vec<String>>,
    /// Finalization policy for this flow.
    pub finalization: FinalizationConfig,
    /// Tool-policy allow-list; empty means unrestricted.
    #[serde(default)]
    pub tool_policy: Option<ToolPolicy>,
    /// Trace-profile gate configuration.
    pub trace_profile: TraceProfile,
    /// Oracle/semantic evaluation configuration.
    pub evaluation: EvaluationConfig,
    /// Soft cap on concurrent attempts for this flow's strategy.
    #[serde(default)]
    pub max_in_flight: Option<u32>,
    /// Minimum wall-clock gap between two scheduler acquisitions.
    #[serde(default)]
    pub min_start_interval_ms: Option<u64>,
    /// MCP tool-call ceiling, when applicable.
    #[serde(default)]
    pub mcp_call_limit: Option<u32>,
}

/// Runner descriptor selecting the execution strategy for a flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunnerType {
    /// Spawn an arbitrary external process.
    ProcessCmd,
    /// Drive a Codex non-interactive execution runtime.
    CodexExec,
    /// Drive a Codex subagent runtime.
    CodexSubagent,
    /// Drive a Claude subagent runtime.
    ClaudeSubagent,
    /// Drive a Codex app-server runtime.
    CodexAppServer,
}

/// When the attempt deadline begins counting down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeoutStart {
    /// The deadline begins at `attempt.startedAt`.
    AttemptStart,
    /// The deadline begins at the first observed tool invocation.
    FirstToolCall,
}

/// Process isolation vs native in-process session spawning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IsolationModel {
    /// Spawn the runner as an external OS process.
    ProcessRunner,
    /// Drive the runner through a native in-process runtime session.
    NativeSpawn,
}

// ============================================================================
// SECTION: Finalization
// ============================================================================

/// Resolved finalization policy for an attempt (§4.H).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalizationConfig {
    /// Selected mode.
    pub mode: FinalizationMode,
    /// Result-channel configuration, required when `mode = auto_from_result_json`.
    #[serde(default)]
    pub result_channel: Option<ResultChannelConfig>,
}

/// The three finalization modes described in §4.H.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinalizationMode {
    /// Missing `feedback.json` fails the attempt outright.
    Strict,
    /// Missing `feedback.json` synthesizes an infra-failure feedback.
    AutoFail,
    /// Read mission result from a result channel.
    AutoFromResultJson,
}

/// Where an `auto_from_result_json` finalizer reads the mission outcome from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultChannelConfig {
    /// Which channel kind to read.
    pub kind: ResultChannelKind,
    /// File name, relative to the attempt dir, for `file_json`.
    #[serde(default = "default_result_file")]
    pub result_file: String,
    /// Marker prefix scanned for in `stdout_json` mode.
    #[serde(default = "default_result_marker")]
    pub marker: String,
    /// Minimum `turn` value a result payload must carry to be accepted.
    #[serde(default)]
    pub result_min_turn: Option<u32>,
}

/// Default `resultFile` name for `file_json` result channels.
fn default_result_file() -> String {
    "mission.result.json".to_string()
}

/// Default marker prefix for `stdout_json` result channels.
fn default_result_marker() -> String {
    "ZCL_RESULT_JSON:".to_string()
}

/// Result channel kinds (§4.H).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultChannelKind {
    /// Read `<attemptDir>/<resultFile>`.
    FileJson,
    /// Scan captured stdout tail for a marker-prefixed line.
    StdoutJson,
    /// No channel configured; equivalent to `auto_fail`.
    None,
}

// ============================================================================
// SECTION: Tool Policy & Trace Profile
// ============================================================================

/// Tool-call allow-list for a flow (§4.I step 5).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolPolicy {
    /// Allowed `(namespace, prefix)` entries; each must specify at least one.
    pub allow: Vec<ToolPolicyEntry>,
}

/// A single allow-list entry. At least one of `namespace`/`prefix` must be set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolPolicyEntry {
    /// Tool namespace to allow (e.g. `mcp`).
    #[serde(default)]
    pub namespace: Option<String>,
    /// Tool name prefix to allow.
    #[serde(default)]
    pub prefix: Option<String>,
}

/// Trace-profile gate selection (§4.I step 2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceProfile {
    /// No trace-profile requirement beyond the contract gate.
    None,
    /// Require at least one browser-category tool call.
    StrictBrowserComparison,
    /// Require at least one MCP tool call.
    McpRequired,
}

// ============================================================================
// SECTION: Evaluation / Gate Configuration
// ============================================================================

/// Semantic/oracle evaluation configuration for a flow (§4.I steps 3-4).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationConfig {
    /// Which evaluation mode applies.
    pub mode: EvaluationMode,
    /// Declarative semantic rule set, used when `mode = semantic`.
    #[serde(default)]
    pub semantic_rules: Option<SemanticRules>,
    /// Oracle evaluator command, required when `mode = oracle`.
    #[serde(default)]
    pub oracle_command: Option<Vec<String>>,
    /// Oracle mismatch downgrade policy.
    #[serde(default)]
    pub oracle_policy: Option<OraclePolicy>,
}

/// Evaluation strategy selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationMode {
    /// No semantic or oracle evaluation beyond contract/trace gates.
    None,
    /// Evaluate a declarative rule set against `feedback.resultJson`.
    Semantic,
    /// Invoke an external evaluator process.
    Oracle,
}

/// Declarative semantic rule set (§4.I step 3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticRules {
    /// JSON pointers into `resultJson` that must resolve to a non-empty value.
    #[serde(default)]
    pub non_empty_json_pointers: Vec<String>,
    /// JSON pointers paired with a forbidden placeholder value.
    #[serde(default)]
    pub placeholder_values: Vec<PlaceholderRule>,
}

/// A single placeholder-value prohibition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceholderRule {
    /// JSON pointer into `resultJson`.
    pub pointer: String,
    /// Value considered a placeholder / non-answer at this pointer.
    pub forbidden_value: serde_json::Value,
}

/// Oracle mismatch downgrade policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OraclePolicy {
    /// Format-only mismatches gate the mission as usual.
    Strict,
    /// Format-only mismatches are downgraded to non-gating warnings.
    WarnOnFormatMismatch,
}

/// Campaign-wide gate defaults (per-flow configuration may override).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateConfig {
    /// Pair-gate policy applied when multiple flows cover the same mission.
    pub pair_gate: PairGatePolicy,
}

/// Pair-gate policy for multi-flow missions (§4.I step 6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairGatePolicy {
    /// All flow verdicts for the mission must be `valid`.
    RequireAllValid,
    /// All flow verdicts must be identical (still gates if any is invalid).
    RequireIdentical,
}
