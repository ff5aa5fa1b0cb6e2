// zcl-cli/src/lib.rs
// ============================================================================
// Crate: zcl-cli
// Description: Command-line surface for the ZCL campaign engine: campaign,
//              suite, attempt, and mission prompt subcommands (§6).
// Purpose: Wire the clap-derived command tree onto zcl-campaign/zcl-config/
//          zcl-report/zcl-prompt/zcl-gate/zcl-runner/zcl-runtime without
//          duplicating their orchestration logic.
// ============================================================================

//! # zcl-cli
//!
//! [`run`] is the library entry point both `main` and `system-tests` call:
//! `main` wraps it in a process, tests call it directly against a temporary
//! `.zcl` root. [`native_dispatch`] and [`runtime_factory`] supply the one
//! piece `zcl-campaign` cannot own itself: a concrete native runtime
//! strategy table and the per-attempt [`zcl_campaign::NativeDispatchResolver`]
//! built from it.

#![deny(missing_docs)]

pub mod cli;
pub mod commands;
pub mod native_dispatch;
pub mod operator;
pub mod runtime_factory;

pub use cli::Cli;
pub use commands::CliError;
pub use commands::run;
