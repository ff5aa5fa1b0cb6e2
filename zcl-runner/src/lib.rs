// zcl-runner/src/lib.rs
// ============================================================================
// Crate: zcl-runner
// Description: Attempt Allocator, Suite Runner, Finalization Policy (§4.B,
//              §4.G, §4.H).
// Purpose: Drive a single mission attempt from allocation through dispatch
//          to a sealed `attempt.report.json`, in either process or native
//          isolation.
// ============================================================================

//! # zcl-runner
//!
//! [`allocator`] seals a fresh attempt directory; [`suite`] then drives that
//! attempt through the blind-mode contamination scan, process- or
//! native-mode dispatch, [`finalize`]'s Finalization Policy, and a final
//! `attempt.report.json`. [`process`] and [`native`] are the two dispatch
//! backends; [`contamination`] is the pure prompt scan used by both.

#![deny(missing_docs)]

pub mod allocator;
pub mod contamination;
pub mod error;
pub mod finalize;
pub mod native;
pub mod process;
pub mod suite;

pub use allocator::AllocateRequest;
pub use allocator::Allocation;
pub use allocator::InjectedEnv;
pub use error::RunnerError;
pub use finalize::FinalizeOutcome;
pub use finalize::RunnerOutcome;
pub use native::NativeOutcome;
pub use native::RunnerRef;
pub use process::OperatorWriter;
pub use process::ProcessOutcome;
pub use suite::AttemptRunOutcome;
pub use suite::NativeDispatch;
pub use suite::RunAttemptRequest;
pub use suite::run_attempt;
