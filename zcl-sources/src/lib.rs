// zcl-sources/src/lib.rs
// ============================================================================
// Crate: zcl-sources
// Description: Result-channel readers and the oracle-evaluator subprocess
//              adapter (§4.H, §4.I.4).
// Purpose: Give the Finalization Policy and Gate Evaluator a single place to
//          read externally-produced mission outcomes.
// ============================================================================

//! Source adapters external to the campaign engine's own evidence trail:
//! reading a runner's self-reported mission result, and invoking an oracle
//! evaluator process to judge that result against ground truth.

pub mod error;
pub mod oracle;
pub mod result_channel;

pub use error::SourceError;
pub use oracle::OracleMismatch;
pub use oracle::OracleVerdict;
pub use result_channel::decode_payload;
pub use result_channel::read_file_json;
pub use result_channel::read_stdout_json;
