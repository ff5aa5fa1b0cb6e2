// zcl-config/src/schema.rs
// ============================================================================
// Module: Config Schema
// Description: JSON schema builder for `campaign.toml`.
// Purpose: Provide canonical validation schema for config tooling and docs.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! This module defines the JSON Schema for a campaign document. It is the
//! single source of truth [`crate::docs::config_docs_markdown`] renders from.

use serde_json::Value;
use serde_json::json;

/// Returns the JSON schema for a campaign document.
#[must_use]
pub fn config_schema() -> Value {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "$id": "zcl://contract/schemas/campaign.schema.json",
        "title": "ZCL Campaign Configuration",
        "description": "Configuration for a campaign run of the evaluation engine.",
        "type": "object",
        "required": ["campaign_id", "schema_version", "flows", "gate", "invalid_run_policy", "prompt_mode", "flow_mode", "mission_source", "timeouts"],
        "properties": {
            "campaign_id": { "type": "string", "description": "Stable campaign identifier, scoped to the output root." },
            "schema_version": { "type": "integer", "minimum": 1 },
            "flows": { "type": "array", "items": flow_schema(), "minItems": 1 },
            "gate": {
                "type": "object",
                "required": ["pair_gate"],
                "properties": {
                    "pair_gate": { "enum": ["require_all_valid", "require_identical"] }
                }
            },
            "invalid_run_policy": { "enum": ["strict_valid_only", "allow_invalid"] },
            "prompt_mode": { "enum": ["free", "mission_only", "exam"] },
            "flow_mode": { "enum": ["sequential", "parallel"] },
            "mission_source": mission_source_schema(),
            "hooks": hooks_schema(),
            "timeouts": {
                "type": "object",
                "required": ["campaign_global_timeout_ms", "cleanup_hook_timeout_ms"],
                "properties": {
                    "campaign_global_timeout_ms": { "type": "integer", "minimum": 1 },
                    "cleanup_hook_timeout_ms": { "type": "integer", "minimum": 1 }
                }
            }
        },
        "additionalProperties": false
    })
}

/// Schema for a single `[[flows]]` entry.
fn flow_schema() -> Value {
    json!({
        "type": "object",
        "required": ["flow_id", "runner", "timeout_ms", "timeout_start", "isolation", "finalization", "trace_profile", "evaluation"],
        "properties": {
            "flow_id": { "type": "string" },
            "runner": { "enum": ["process_cmd", "codex_exec", "codex_subagent", "claude_subagent", "codex_app_server"] },
            "command": { "type": "array", "items": { "type": "string" } },
            "env": { "type": "object", "additionalProperties": { "type": "string" } },
            "timeout_ms": { "type": "integer", "minimum": 1 },
            "timeout_start": { "enum": ["attempt_start", "first_tool_call"] },
            "isolation": { "enum": ["process_runner", "native_spawn"] },
            "tool_driver": { "type": "string" },
            "shims": { "type": "object" },
            "finalization": {
                "type": "object",
                "required": ["mode"],
                "properties": {
                    "mode": { "enum": ["strict", "auto_fail", "auto_from_result_json"] },
                    "result_channel": {
                        "type": "object",
                        "required": ["kind"],
                        "properties": {
                            "kind": { "enum": ["file_json", "stdout_json", "none"] },
                            "result_file": { "type": "string" },
                            "marker": { "type": "string" },
                            "result_min_turn": { "type": "integer" }
                        }
                    }
                }
            },
            "tool_policy": {
                "type": "object",
                "required": ["allow"],
                "properties": {
                    "allow": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "namespace": { "type": "string" },
                                "prefix": { "type": "string" }
                            }
                        }
                    }
                }
            },
            "trace_profile": { "enum": ["none", "strict_browser_comparison", "mcp_required"] },
            "evaluation": {
                "type": "object",
                "required": ["mode"],
                "properties": {
                    "mode": { "enum": ["none", "semantic", "oracle"] },
                    "semantic_rules": {
                        "type": "object",
                        "properties": {
                            "non_empty_json_pointers": { "type": "array", "items": { "type": "string" } },
                            "placeholder_values": {
                                "type": "array",
                                "items": {
                                    "type": "object",
                                    "required": ["pointer", "forbidden_value"],
                                    "properties": {
                                        "pointer": { "type": "string" }
                                    }
                                }
                            }
                        }
                    },
                    "oracle_command": { "type": "array", "items": { "type": "string" } },
                    "oracle_policy": { "enum": ["strict", "warn_on_format_mismatch"] }
                }
            },
            "max_in_flight": { "type": "integer", "minimum": 1 },
            "min_start_interval_ms": { "type": "integer", "minimum": 0 },
            "mcp_call_limit": { "type": "integer", "minimum": 0 }
        },
        "additionalProperties": false
    })
}

/// Schema for `mission_source`.
fn mission_source_schema() -> Value {
    json!({
        "type": "object",
        "required": ["suite_path"],
        "properties": {
            "suite_path": { "type": "string" },
            "selection": {
                "oneOf": [
                    { "enum": ["whole"] },
                    { "type": "object", "required": ["indexes"], "properties": { "indexes": { "type": "array", "items": { "type": "integer" } } } },
                    { "type": "object", "required": ["tags"], "properties": { "tags": { "type": "array", "items": { "type": "string" } } } }
                ],
                "default": "whole"
            },
            "mission_offset": { "type": "integer", "minimum": 0, "default": 0 },
            "total_missions": { "type": "integer", "minimum": 1 }
        }
    })
}

/// Schema for `hooks`.
fn hooks_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "pre_flight": { "type": "array", "items": { "type": "string" } },
            "pre_mission": { "type": "array", "items": { "type": "string" } },
            "post_mission": { "type": "array", "items": { "type": "string" } },
            "cleanup": { "type": "array", "items": { "type": "string" } }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::config_schema;

    #[test]
    fn the_schema_declares_required_top_level_keys() {
        let schema = config_schema();
        let required = schema["required"].as_array().expect("required array");
        assert!(required.iter().any(|value| value == "campaign_id"));
        assert!(required.iter().any(|value| value == "flows"));
    }
}
