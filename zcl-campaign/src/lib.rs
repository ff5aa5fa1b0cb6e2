// zcl-campaign/src/lib.rs
// ============================================================================
// Crate: zcl-campaign
// Description: Campaign Engine — lock, mission selection, hooks, wave
//              scheduling, gating, and resume (§4.J, §4.K).
// Purpose: Drive one campaign run end to end, from lock acquisition through
//          sealed `campaign.report.json`/`campaign.summary.json`/
//          `RESULTS.md`, on top of the Suite Runner and Gate Evaluator.
// ============================================================================

//! # zcl-campaign
//!
//! [`engine::run`] is the crate's single entry point. [`lock`] guarantees one
//! in-flight run per campaign id; [`selection`] resolves the mission window;
//! [`hooks`] runs the lifecycle shell commands; [`shape`] builds the
//! comparability key; [`progress`] is the append-only ledger a resumed run
//! replays; [`run_id`] mints fresh run identifiers.

#![deny(missing_docs)]

pub mod engine;
pub mod error;
pub mod hooks;
pub mod lock;
pub mod progress;
pub mod run_id;
pub mod selection;
pub mod shape;

pub use engine::NativeDispatchContext;
pub use engine::NativeDispatchResolver;
pub use engine::RunRequest;
pub use engine::run;
pub use error::CampaignError;
pub use lock::LockGuard;
