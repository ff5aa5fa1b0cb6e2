// zcl-runtime/src/lib.rs
// ============================================================================
// Crate: zcl-runtime
// Description: Native Runtime Registry & Resolver and Session Supervisor (§4.D, §4.E).
// Purpose: Resolve a strategy chain against required capabilities, then drive
//          a stdio JSON-RPC session against the chosen peer process.
// ============================================================================

//! # zcl-runtime
//!
//! Native runtimes are resolved purely from their advertised capability set;
//! spawning only happens once a strategy has been chosen. Session I/O runs
//! on genuinely async stdio (`tokio::process` plus `tokio::io::BufReader` /
//! `AsyncBufReadExt` / `AsyncWriteExt`), not a blocking call wrapped in
//! `spawn_blocking`, so turn cancellation and interrupt requests can race a
//! pending read without starving the runtime.

#![deny(missing_docs)]

pub mod capability;
pub mod error;
pub mod protocol;
pub mod registry;
pub mod session;
pub mod trace_listener;

pub use capability::Capability;
pub use error::RuntimeError;
pub use error::StrategyFailure;
pub use registry::RuntimeFactory;
pub use registry::RuntimeRegistry;
pub use session::ClockFn;
pub use session::Session;
pub use session::SessionListener;
pub use session::SessionOptions;
pub use trace_listener::TraceListener;
