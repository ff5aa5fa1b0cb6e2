// zcl-cli/src/main.rs
// ============================================================================
// Module: CLI Process Entry Point
// Description: Thin process wrapper around `zcl_cli::run`.
// Purpose: Translate process `argv` into the library entry point and fold
//          its result onto the process exit code.
// Dependencies: tokio, zcl-cli
// ============================================================================

//! ## Overview
//! All behavior lives in [`zcl_cli::commands::run`]; this binary only owns
//! the `tokio` runtime and the final `ExitCode` mapping, matching the
//! `fn main() -> ExitCode` convention used throughout this workspace's
//! binaries rather than `std::process::exit`.

use std::process::ExitCode;

/// Process entry point: parses `argv`, runs the matching command, and maps
/// its result onto the process exit code.
#[tokio::main]
async fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    match zcl_cli::run(args).await {
        Ok(code) => code,
        Err(err) => {
            let writer = zcl_cli::operator::stderr_writer();
            let _ = zcl_cli::operator::write_line(&writer, &err.to_string());
            err.exit_code()
        }
    }
}
