// zcl-config/src/examples.rs
// ============================================================================
// Module: Config Examples
// Description: Canonical example configuration payloads.
// Purpose: Deterministic examples for docs and tooling.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Canonical examples for campaign configuration. Outputs are deterministic
//! and kept in sync with schema and docs.

/// Returns a canonical example `campaign.toml` configuration.
#[must_use]
pub fn campaign_toml_example() -> String {
    String::from(
        r#"campaign_id = "nightly-coding-eval"
schema_version = 1
invalid_run_policy = "strict_valid_only"
prompt_mode = "mission_only"
flow_mode = "sequential"

[gate]
pair_gate = "require_all_valid"

[mission_source]
suite_path = "suite.toml"
selection = "whole"
mission_offset = 0

[hooks]
pre_flight = ["./hooks/pre-flight.sh"]
cleanup = ["./hooks/cleanup.sh"]

[timeouts]
campaign_global_timeout_ms = 3600000
cleanup_hook_timeout_ms = 30000

[[flows]]
flow_id = "codex-process"
runner = "process_cmd"
command = ["codex", "exec", "--json"]
timeout_ms = 900000
timeout_start = "attempt_start"
isolation = "process_runner"
trace_profile = "none"

[flows.finalization]
mode = "auto_from_result_json"

[flows.finalization.result_channel]
kind = "file_json"

[flows.evaluation]
mode = "semantic"

[flows.evaluation.semantic_rules]
non_empty_json_pointers = ["/summary"]

[[flows.evaluation.semantic_rules.placeholder_values]]
pointer = "/summary"
forbidden_value = "TODO"

[flows.tool_policy]
allow = [{ namespace = "mcp" }, { namespace = "shell", prefix = "read_" }]
"#,
    )
}
