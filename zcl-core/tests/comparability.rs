// zcl-core/tests/comparability.rs
// ============================================================================
// Module: Comparability Key Integration Tests
// Description: End-to-end tests for the run-shape comparability hash.
// Purpose: Guard against accidental drift in which fields gate comparability.
// Dependencies: zcl-core
// ============================================================================

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use zcl_core::comparator::RunShape;
use zcl_core::comparator::comparability_key;

fn shape() -> RunShape {
    RunShape {
        mode: "default".to_string(),
        timeout_ms: 30_000,
        timeout_start: "first_tool_call".to_string(),
        isolation: "native_spawn".to_string(),
        finalization: "auto_from_result_json".to_string(),
        runtime_strategy: Some("codex_app_server".to_string()),
        parallelism: 2,
        fail_fast: true,
        blind: true,
        shims: vec!["browser".to_string()],
    }
}

#[test]
fn blind_mode_flag_participates_in_the_key() {
    let blind = comparability_key(&shape()).unwrap();
    let mut not_blind = shape();
    not_blind.blind = false;
    let not_blind_key = comparability_key(&not_blind).unwrap();
    assert_ne!(blind, not_blind_key);
}

#[test]
fn runtime_strategy_absence_participates_in_the_key() {
    let with_strategy = comparability_key(&shape()).unwrap();
    let mut without = shape();
    without.runtime_strategy = None;
    let without_key = comparability_key(&without).unwrap();
    assert_ne!(with_strategy, without_key);
}

#[test]
fn key_is_a_64_character_hex_sha256_digest() {
    let key = comparability_key(&shape()).unwrap();
    assert_eq!(key.len(), 64);
    assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
}
