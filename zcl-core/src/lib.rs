// zcl-core/src/lib.rs
// ============================================================================
// Crate: zcl-core
// Description: Canonical data model, identifiers, hashing, and filesystem
//              layout shared by every ZCL campaign-engine crate.
// Purpose: Give every downstream crate a single source of truth for types
//          that cross process and crate boundaries.
// Dependencies: ret-logic, serde, serde_jcs, serde_json, sha2, thiserror
// ============================================================================

//! # zcl-core
//!
//! Pure data types and deterministic helpers for the ZCL campaign engine.
//! This crate performs no I/O and spawns no processes; it exists so that
//! `zcl-evidence`, `zcl-runtime`, `zcl-gate`, `zcl-scheduler`, `zcl-runner`,
//! `zcl-campaign`, `zcl-report`, and `zcl-prompt` all agree on the same
//! `Campaign`, `Attempt`, `MissionGate`, and `Code` shapes.

pub mod comparator;
pub mod error;
pub mod hashing;
pub mod ids;
pub mod layout;
pub mod model;
pub mod prompt_policy;
pub mod time;

pub use error::Code;
pub use hashing::HashAlgorithm;
pub use hashing::HashDigest;
pub use ids::AgentId;
pub use ids::AttemptId;
pub use ids::CampaignId;
pub use ids::FlowId;
pub use ids::MissionId;
pub use ids::MissionIndex;
pub use ids::RetryIndex;
pub use ids::RunId;
pub use ids::SuiteId;
pub use time::Timestamp;
