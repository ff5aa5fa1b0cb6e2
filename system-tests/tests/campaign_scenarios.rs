// system-tests/tests/campaign_scenarios.rs
// ============================================================================
// Module: Campaign End-to-End Scenarios
// Description: Drives `zcl_cli::run` in-process over a small temporary
//              campaign, one test per concrete scenario in the campaign
//              engine's spec.
// Purpose: Exercise the full stack (cli -> campaign -> runner -> gate ->
//          report) the way an operator actually invokes it, without
//          spawning a built binary.
// Dependencies: zcl-cli, zcl-core, zcl-report, serde_json, tempfile, tokio
// ============================================================================

//! ## Overview
//! Every scenario uses `sh -c` as its runner command, since the only
//! process-mode contract the Suite Runner relies on is "spawns, runs under
//! the attempt directory as cwd, exits" (`zcl-runner/src/suite.rs`'s own
//! unit tests use the same fixture). Artifacts are asserted by reading the
//! persisted JSON under `out_root` directly rather than capturing stdout,
//! since `zcl-cli::operator` wraps the real `std::io::stdout()`.

#![allow(clippy::unwrap_used, clippy::expect_used, reason = "test-only assertions")]

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use zcl_core::Code;
use zcl_core::model::AttemptStatus;
use zcl_core::model::CampaignRunState;
use zcl_core::model::RunStatus;
use zcl_report::BuildReport;

// ============================================================================
// SECTION: Fixture Helpers
// ============================================================================

/// Writes `campaign.toml` and `suite.toml` under `dir`, returning the spec
/// path. `flows_toml` is spliced in verbatim as the `[[flows]]` tables.
fn write_campaign(dir: &Path, campaign_id: &str, flows_toml: &str, mission_source_extra: &str) -> PathBuf {
    let spec_path = dir.join("campaign.toml");
    let body = format!(
        r#"campaign_id = "{campaign_id}"
schema_version = 1
invalid_run_policy = "strict_valid_only"
prompt_mode = "free"
flow_mode = "sequential"

[gate]
pair_gate = "require_all_valid"

[mission_source]
suite_path = "suite.toml"
selection = "whole"
mission_offset = 0
{mission_source_extra}

[timeouts]
campaign_global_timeout_ms = 60000
cleanup_hook_timeout_ms = 5000

{flows_toml}
"#
    );
    fs::write(&spec_path, body).expect("write campaign.toml");
    spec_path
}

/// Writes a `suite.toml` with `mission_count` trivial missions under `dir`.
fn write_suite(dir: &Path, mission_count: u32) {
    let mut body = String::from(
        r#"suite_id = "smoke-suite"

[defaults]
mode = "code"
timeout_ms = 5000
timeout_start = "attempt_start"
feedback_policy = "auto_from_result_json"
blind = false
"#,
    );
    for index in 0..mission_count {
        body.push_str(&format!(
            r#"
[[missions]]
mission_id = "m{index}"
mission_index = {index}
prompt = "Do task {index}."
"#
        ));
    }
    fs::write(dir.join("suite.toml"), body).expect("write suite.toml");
}

/// A `process_cmd` flow table that writes `ok: true` to its result channel.
fn ok_flow_toml(flow_id: &str) -> String {
    format!(
        r#"[[flows]]
flow_id = "{flow_id}"
runner = "process_cmd"
command = ["sh", "-c", "printf '{{\"ok\":true,\"turn\":1}}' > mission.result.json"]
timeout_ms = 5000
timeout_start = "attempt_start"
isolation = "process_runner"
trace_profile = "none"

[flows.finalization]
mode = "auto_from_result_json"

[flows.finalization.result_channel]
kind = "file_json"

[flows.evaluation]
mode = "none"
"#
    )
}

/// A `process_cmd` flow table that exits cleanly without writing any
/// result-channel payload, forcing `auto_fail` synthesis.
fn no_feedback_flow_toml(flow_id: &str) -> String {
    format!(
        r#"[[flows]]
flow_id = "{flow_id}"
runner = "process_cmd"
command = ["sh", "-c", "exit 0"]
timeout_ms = 5000
timeout_start = "attempt_start"
isolation = "process_runner"
trace_profile = "none"

[flows.finalization]
mode = "auto_fail"

[flows.evaluation]
mode = "none"
"#
    )
}

/// A `process_cmd` flow table whose command outlives `timeout_ms`.
fn sleepy_flow_toml(flow_id: &str, timeout_ms: u64) -> String {
    format!(
        r#"[[flows]]
flow_id = "{flow_id}"
runner = "process_cmd"
command = ["sh", "-c", "sleep 3"]
timeout_ms = {timeout_ms}
timeout_start = "attempt_start"
isolation = "process_runner"
trace_profile = "none"

[flows.finalization]
mode = "auto_fail"

[flows.evaluation]
mode = "none"
"#
    )
}

async fn run_cli(args: &[&str]) -> std::process::ExitCode {
    let argv: Vec<String> = std::iter::once("zcl".to_string()).chain(args.iter().map(ToString::to_string)).collect();
    zcl_cli::run(argv).await.expect("command handler did not error")
}

fn read_run_state(out_root: &Path, campaign_id: &str) -> CampaignRunState {
    let path = zcl_core::layout::campaign_run_state_json(out_root, &zcl_core::CampaignId::new(campaign_id).unwrap());
    let raw = fs::read_to_string(path).expect("read campaign.run.state.json");
    serde_json::from_str(&raw).expect("parse campaign.run.state.json")
}

fn read_report(out_root: &Path, campaign_id: &str) -> BuildReport {
    let path = zcl_core::layout::campaign_report_json(out_root, &zcl_core::CampaignId::new(campaign_id).unwrap());
    let raw = fs::read_to_string(path).expect("read campaign.report.json");
    serde_json::from_str(&raw).expect("parse campaign.report.json")
}

// ============================================================================
// SECTION: Scenario 1 - Happy Path, Two Flows
// ============================================================================

#[tokio::test]
async fn happy_path_with_two_flows_is_valid_and_publishable() {
    let dir = tempfile::tempdir().unwrap();
    let out_root = dir.path().join(".zcl");
    let flows = format!("{}\n{}", ok_flow_toml("flow-a"), ok_flow_toml("flow-b"));
    let spec = write_campaign(dir.path(), "cmp-int", &flows, "");
    write_suite(dir.path(), 1);

    let spec_str = spec.to_string_lossy().into_owned();
    let out_root_str = out_root.to_string_lossy().into_owned();
    let code = run_cli(&["campaign", "run", "--spec", &spec_str, "--out-root", &out_root_str, "--agent-id", "agent-1"])
        .await;
    assert_eq!(code, std::process::ExitCode::SUCCESS);

    let state = read_run_state(&out_root, "cmp-int");
    assert_eq!(state.status, RunStatus::Valid);

    let report = read_report(&out_root, "cmp-int");
    assert_eq!(report.gates_passed, 1);
    assert_eq!(report.gates_failed, 0);

    assert!(zcl_core::layout::campaign_summary_json(&out_root, &zcl_core::CampaignId::new("cmp-int").unwrap())
        .exists());
    assert!(zcl_core::layout::results_md(&out_root, &zcl_core::CampaignId::new("cmp-int").unwrap()).exists());

    let publish_code =
        run_cli(&["campaign", "publish-check", "--spec", &spec_str, "--out-root", &out_root_str]).await;
    assert_eq!(publish_code, std::process::ExitCode::SUCCESS);
}

// ============================================================================
// SECTION: Scenario 2 - Missing Feedback
// ============================================================================

#[tokio::test]
async fn a_clean_exit_with_no_result_channel_payload_synthesizes_an_infra_failure() {
    let dir = tempfile::tempdir().unwrap();
    let out_root = dir.path().join(".zcl");
    let flows = no_feedback_flow_toml("flow-a");
    let spec = write_campaign(dir.path(), "cmp-no-feedback", &flows, "");
    write_suite(dir.path(), 1);

    let spec_str = spec.to_string_lossy().into_owned();
    let out_root_str = out_root.to_string_lossy().into_owned();
    let code = run_cli(&["campaign", "run", "--spec", &spec_str, "--out-root", &out_root_str, "--agent-id", "agent-1"])
        .await;
    assert_eq!(code, std::process::ExitCode::from(1));

    let state = read_run_state(&out_root, "cmp-no-feedback");
    assert_eq!(state.status, RunStatus::InfraFailed);
    assert_eq!(state.mission_gates.len(), 1);
    assert_eq!(state.mission_gates[0].status, AttemptStatus::InfraFailed);
    assert!(state.mission_gates[0].reasons.iter().any(|reason| reason.code == Code::CampaignArtifactGate));

    let feedback_path = zcl_core::layout::feedback_json(&zcl_core::layout::attempt_dir(
        &out_root,
        &state.run_id,
        0,
        &zcl_core::MissionId::new("m0").unwrap(),
        zcl_core::RetryIndex(0),
    ));
    let feedback: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(feedback_path).expect("read feedback.json")).unwrap();
    assert_eq!(feedback["ok"], serde_json::json!(false));
    assert_eq!(feedback["result_json"]["kind"], serde_json::json!("infra_failure"));

    let publish_code =
        run_cli(&["campaign", "publish-check", "--spec", &spec_str, "--out-root", &out_root_str]).await;
    assert_eq!(publish_code, std::process::ExitCode::from(2));
}

// ============================================================================
// SECTION: Scenario 3 - Attempt Timeout
// ============================================================================

#[tokio::test]
async fn an_attempt_that_outlives_its_deadline_is_reported_as_a_timeout() {
    let dir = tempfile::tempdir().unwrap();
    let out_root = dir.path().join(".zcl");
    let flows = sleepy_flow_toml("flow-a", 40);
    let spec = write_campaign(dir.path(), "cmp-timeout", &flows, "");
    write_suite(dir.path(), 1);

    let spec_str = spec.to_string_lossy().into_owned();
    let out_root_str = out_root.to_string_lossy().into_owned();
    let code = run_cli(&["campaign", "run", "--spec", &spec_str, "--out-root", &out_root_str, "--agent-id", "agent-1"])
        .await;
    assert_eq!(code, std::process::ExitCode::from(1));

    let state = read_run_state(&out_root, "cmp-timeout");
    assert_eq!(state.status, RunStatus::InfraFailed);
    assert_eq!(state.mission_gates[0].status, AttemptStatus::InfraFailed);
    assert!(state.mission_gates[0].reasons.iter().any(|reason| reason.code == Code::CampaignArtifactGate));

    let feedback_path = zcl_core::layout::feedback_json(&zcl_core::layout::attempt_dir(
        &out_root,
        &state.run_id,
        0,
        &zcl_core::MissionId::new("m0").unwrap(),
        zcl_core::RetryIndex(0),
    ));
    let feedback: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(feedback_path).expect("read feedback.json")).unwrap();
    assert_eq!(feedback["ok"], serde_json::json!(false));
    assert_eq!(feedback["result_json"]["code"], serde_json::json!("timeout"));
    assert!(feedback["decision_tags"].as_array().unwrap().iter().any(|tag| tag == "timeout"));
}

// ============================================================================
// SECTION: Scenario 4 - Lock Contention
// ============================================================================

#[tokio::test]
async fn a_pre_existing_lock_directory_aborts_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let out_root = dir.path().join(".zcl");
    let flows = ok_flow_toml("flow-a");
    let spec = write_campaign(dir.path(), "cmp-locked", &flows, "");
    write_suite(dir.path(), 1);

    let campaign_id = zcl_core::CampaignId::new("cmp-locked").unwrap();
    let lock_dir = zcl_core::layout::campaign_lock_dir(&out_root, &campaign_id);
    fs::create_dir_all(&lock_dir).expect("pre-create lock directory");

    let spec_str = spec.to_string_lossy().into_owned();
    let out_root_str = out_root.to_string_lossy().into_owned();
    let argv = vec![
        "zcl".to_string(),
        "campaign".to_string(),
        "run".to_string(),
        "--spec".to_string(),
        spec_str,
        "--out-root".to_string(),
        out_root_str,
        "--agent-id".to_string(),
        "agent-1".to_string(),
    ];

    // Lock contention is the one failure the engine returns as a bare `Err`
    // with no state persisted, since writing anything would race the
    // actual lock holder; `campaign.run.state.json` is never created here.
    let err = zcl_cli::run(argv).await.expect_err("a held lock must not let the run proceed");
    assert_eq!(err.exit_code(), std::process::ExitCode::from(1));
    assert!(
        !zcl_core::layout::campaign_run_state_json(&out_root, &campaign_id).exists(),
        "lock contention must not persist any run state"
    );
}

// ============================================================================
// SECTION: Scenario 5 - Mission Window
// ============================================================================

#[tokio::test]
async fn a_mission_offset_and_total_windows_the_suite_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let out_root = dir.path().join(".zcl");
    let flows = ok_flow_toml("flow-a");
    let spec = write_campaign(dir.path(), "cmp-window", &flows, "mission_offset = 6\ntotal_missions = 3");
    write_suite(dir.path(), 10);

    let spec_str = spec.to_string_lossy().into_owned();
    let out_root_str = out_root.to_string_lossy().into_owned();
    let code = run_cli(&["campaign", "run", "--spec", &spec_str, "--out-root", &out_root_str, "--agent-id", "agent-1"])
        .await;
    assert_eq!(code, std::process::ExitCode::SUCCESS);

    let state = read_run_state(&out_root, "cmp-window");
    assert_eq!(state.total_missions, 3);
    let mission_ids: Vec<String> =
        state.mission_gates.iter().map(|gate| gate.mission_id.as_str().to_string()).collect();
    assert_eq!(mission_ids, vec!["m6", "m7", "m8"]);
}

// ============================================================================
// SECTION: Scenario 6 - Adapter Parity
// ============================================================================

#[tokio::test]
async fn four_runner_kinds_routed_to_the_same_command_all_go_valid() {
    let dir = tempfile::tempdir().unwrap();
    let out_root = dir.path().join(".zcl");
    let mut flows = ok_flow_toml("process-flow");
    flows.push_str(&ok_flow_toml("codex-exec-flow").replace("\"process_cmd\"", "\"codex_exec\""));
    flows.push_str(&ok_flow_toml("codex-subagent-flow").replace("\"process_cmd\"", "\"codex_subagent\""));
    flows.push_str(&ok_flow_toml("claude-subagent-flow").replace("\"process_cmd\"", "\"claude_subagent\""));
    let spec = write_campaign(dir.path(), "cmp-parity", &flows, "");
    write_suite(dir.path(), 1);

    let spec_str = spec.to_string_lossy().into_owned();
    let out_root_str = out_root.to_string_lossy().into_owned();
    let code = run_cli(&["campaign", "run", "--spec", &spec_str, "--out-root", &out_root_str, "--agent-id", "agent-1"])
        .await;
    assert_eq!(code, std::process::ExitCode::SUCCESS);

    let state = read_run_state(&out_root, "cmp-parity");
    assert_eq!(state.flow_runs.len(), 4);
    for summary in &state.flow_runs {
        assert_eq!(summary.valid, 1, "flow {} did not produce a valid attempt", summary.flow_id);
        assert_eq!(summary.invalid, 0);
        assert_eq!(summary.infra_failed, 0);
    }
}
