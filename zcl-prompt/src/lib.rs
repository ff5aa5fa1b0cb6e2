// zcl-prompt/src/lib.rs
// ============================================================================
// Crate: zcl-prompt
// Description: Mission Prompt Materializer (§4.L). Deterministic prompt
//              assembly from a template and a resolved mission window.
// Purpose: Back the `mission prompts build` CLI surface with a pure,
//          content-addressed artifact a reviewer can diff across builds.
// ============================================================================

//! # zcl-prompt
//!
//! [`materialize`] is the crate's single entry point. It performs no I/O;
//! callers (the `mission prompts build` CLI command) decide where the
//! resulting [`PromptArtifact`] is written.

#![deny(missing_docs)]

pub mod materializer;

pub use materializer::MaterializeError;
pub use materializer::MaterializeRequest;
pub use materializer::MaterializedPrompt;
pub use materializer::PromptArtifact;
pub use materializer::materialize;
