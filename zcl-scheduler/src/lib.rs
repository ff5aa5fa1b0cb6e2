// zcl-scheduler/src/lib.rs
// ============================================================================
// Crate: zcl-scheduler
// Description: Per-strategy bounded-concurrency scheduler for attempt launch.
// Purpose: Cap in-flight attempts per runtime strategy and pace acquisitions
//          by a minimum wall-clock interval, without ever reordering the
//          request queue.
// Dependencies: tokio, zcl-core
// ============================================================================

//! ## Overview
//! A [`Scheduler`] bounds how many attempts for a single strategy may be
//! in flight at once (`maxInFlight`, defaulting to the wave width) and
//! enforces a minimum gap between two successive `acquire()` returns
//! (`minStartInterval`), for runtimes whose backing provider rate-limits
//! session starts. Waiting time is reported on a health channel rather than
//! silently absorbed, so the Suite Runner can surface scheduler pressure.
//!
//! Acquisitions are served in FIFO order: [`tokio::sync::Semaphore`] already
//! wakes waiters in acquire order, and the pacing gate below it does not
//! reorder around that queue.

// ============================================================================
// SECTION: Modules
// ============================================================================

mod cancel;
mod scheduler;

pub use cancel::CancelToken;
pub use scheduler::AcquireError;
pub use scheduler::Permit;
pub use scheduler::Scheduler;
pub use scheduler::SchedulerConfig;
pub use scheduler::SchedulerWaitEvent;
