// zcl-evidence/src/lib.rs
// ============================================================================
// Crate: zcl-evidence
// Description: Evidence Store (§4.A) and Trace Recorder (§4.C).
// Purpose: Capability-scoped, atomic, append-only persistence for campaign
//          evidence artifacts, with secret redaction on the way to disk.
// ============================================================================

//! Evidence persistence for ZCL campaign runs.
//!
//! This crate owns every byte that lands under `.zcl/`: atomic whole-file and
//! JSON writes, append-only JSONL evidence, and the redaction pass applied to
//! captured tool output before it is persisted.

pub mod atomic;
pub mod error;
pub mod redact;
pub mod trace;

pub use atomic::EvidenceRoot;
pub use error::EvidenceError;
pub use redact::NullRedactor;
pub use redact::PatternRedactor;
pub use redact::Redactor;
pub use trace::DEFAULT_PREVIEW_CAP_BYTES;
pub use trace::TraceEvent;
pub use trace::TraceIntegrity;
pub use trace::TraceIo;
pub use trace::TraceRecorder;
pub use trace::TraceResult;
