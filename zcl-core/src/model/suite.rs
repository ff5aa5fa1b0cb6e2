// zcl-core/src/model/suite.rs
// ============================================================================
// Module: Suite & Mission Declaration
// Description: Types describing the ordered set of missions a flow runs.
// Purpose: Typed representation of a resolved suite, independent of source.
// ============================================================================

//! ## Overview
//! A [`Suite`] may be file-attached to a flow or synthesized from a mission
//! pack directory; by the time it reaches this type the distinction no
//! longer matters.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::ids::MissionId;
use crate::ids::MissionIndex;
use crate::ids::SuiteId;
use crate::model::campaign::TimeoutStart;

// ============================================================================
// SECTION: Suite
// ============================================================================

/// A resolved, ordered set of missions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suite {
    /// Stable suite identifier.
    pub suite_id: SuiteId,
    /// Defaults applied to every mission unless a mission overrides them.
    pub defaults: SuiteDefaults,
    /// Ordered missions; position determines `missionIndex`.
    pub missions: Vec<Mission>,
}

impl Suite {
    /// Returns missions within `[offset, offset + total)`, re-deriving each
    /// mission's `missionIndex` from its position in the full suite.
    #[must_use]
    pub fn window(&self, offset: u32, total: u32) -> Vec<&Mission> {
        let offset = offset as usize;
        let total = total as usize;
        self.missions.iter().skip(offset).take(total).collect()
    }
}

/// Defaults applied to every mission in a suite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuiteDefaults {
    /// Default execution mode label (free-form; interpreted by runners).
    pub mode: String,
    /// Default per-mission timeout, in milliseconds.
    pub timeout_ms: u64,
    /// Default deadline-start policy.
    pub timeout_start: TimeoutStart,
    /// Default feedback-finalization policy name (resolved by the flow's
    /// finalization config unless a CLI flag overrides it).
    pub feedback_policy: String,
    /// Whether prompts are scanned for harness contamination by default.
    pub blind: bool,
    /// Additional contamination terms to scan for beyond the built-in list.
    #[serde(default)]
    pub blind_terms: Vec<String>,
}

// ============================================================================
// SECTION: Mission
// ============================================================================

/// A single mission within a suite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mission {
    /// Stable mission identifier, scoped to the suite.
    pub mission_id: MissionId,
    /// Immutable 0-based position within the resolved suite.
    pub mission_index: MissionIndex,
    /// The mission prompt text.
    pub prompt: String,
    /// Free-form tags used for selection and reporting.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Optional oracle hints describing the expected outcome shape.
    #[serde(default)]
    pub expects: Option<serde_json::Value>,
}
