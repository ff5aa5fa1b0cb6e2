// zcl-core/src/model/gate.rs
// ============================================================================
// Module: Mission Gate Verdict
// Description: Per-mission gate verdict carrying per-attempt sub-verdicts.
// Purpose: Typed representation of the Gate Evaluator's output (§4.I).
// ============================================================================

//! ## Overview
//! A [`MissionGate`] is produced once per mission after pair-gating across
//! every flow attempt. Reason codes are deduplicated and sorted before
//! persistence, matching the evidence store's canonical-ordering guarantee.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use crate::error::Code;
use crate::ids::FlowId;
use crate::ids::MissionId;
use crate::model::attempt::AttemptStatus;

// ============================================================================
// SECTION: Mission Gate
// ============================================================================

/// Per-mission verdict after pair-gating (§3, §4.I).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionGate {
    /// Mission this verdict covers.
    pub mission_id: MissionId,
    /// Overall rollup status after pair-gating.
    pub status: AttemptStatus,
    /// Per-flow sub-verdicts before pair-gating was applied.
    pub flow_verdicts: BTreeMap<FlowId, AttemptStatus>,
    /// Deduplicated, sorted reason codes explaining `status`.
    pub reasons: Vec<GateReason>,
}

impl MissionGate {
    /// Inserts `reasons` into this verdict's reason list, then deduplicates
    /// and sorts it, matching the persistence contract in §4.I.
    pub fn add_reasons(&mut self, reasons: impl IntoIterator<Item = GateReason>) {
        self.reasons.extend(reasons);
        self.reasons.sort();
        self.reasons.dedup();
    }
}

/// A single gate failure/pass reason, pairing a stable [`Code`] with an
/// optional human-readable detail.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GateReason {
    /// Stable reason code.
    pub code: Code,
    /// Optional free-form detail (e.g. which pointer failed a semantic rule).
    #[serde(default)]
    pub detail: Option<String>,
}

impl GateReason {
    /// Creates a reason with no additional detail.
    #[must_use]
    pub const fn new(code: Code) -> Self {
        Self { code, detail: None }
    }

    /// Creates a reason carrying a free-form detail string.
    #[must_use]
    pub fn with_detail(code: Code, detail: impl Into<String>) -> Self {
        Self { code, detail: Some(detail.into()) }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "test-only assertions")]

    use std::collections::BTreeMap;

    use super::GateReason;
    use super::MissionGate;
    use crate::error::Code;
    use crate::ids::MissionId;
    use crate::model::attempt::AttemptStatus;

    #[test]
    fn add_reasons_deduplicates_and_sorts() {
        let mut gate = MissionGate {
            mission_id: MissionId::new("m0").expect("valid id"),
            status: AttemptStatus::Invalid,
            flow_verdicts: BTreeMap::new(),
            reasons: vec![GateReason::new(Code::CampaignTimeoutGate)],
        };
        gate.add_reasons([
            GateReason::new(Code::CampaignArtifactGate),
            GateReason::new(Code::CampaignTimeoutGate),
        ]);
        assert_eq!(
            gate.reasons,
            vec![
                GateReason::new(Code::CampaignArtifactGate),
                GateReason::new(Code::CampaignTimeoutGate),
            ]
        );
    }
}
