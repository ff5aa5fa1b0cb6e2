// zcl-prompt/src/materializer.rs
// ============================================================================
// Module: Mission Prompt Materializer
// Description: Deterministic prompt assembly from a template string and the
//              resolved (flow, mission) pairs of a campaign window (§4.L).
// Purpose: Give reviewers a byte-identical preview of what an agent will be
//          prompted with, without running a single attempt.
// Dependencies: zcl-core
// ============================================================================

//! ## Overview
//! [`materialize`] substitutes the fixed placeholder set
//! `{{campaignId|flowId|suiteId|missionId|missionIndex|prompt|tagsCsv}}` into
//! a template, once per (flow, mission) pair in the resolved window, and
//! wraps the result in a [`PromptArtifact`] whose `created_at` is derived
//! from a hash of every input rather than the wall clock: two builds of the
//! same inputs produce byte-identical JSON.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use zcl_core::CampaignId;
use zcl_core::FlowId;
use zcl_core::MissionId;
use zcl_core::MissionIndex;
use zcl_core::SuiteId;
use zcl_core::Timestamp;
use zcl_core::hashing::DEFAULT_HASH_ALGORITHM;
use zcl_core::hashing::HashError;
use zcl_core::hashing::hash_canonical_json;
use zcl_core::ids::IdError;
use zcl_core::ids::sanitize_id;
use zcl_core::model::Mission;

// ============================================================================
// SECTION: Deterministic Clock
// ============================================================================

/// Unix epoch milliseconds at 2020-01-01T00:00:00Z, the window's floor.
const EPOCH_OFFSET_MILLIS: i64 = 1_577_836_800_000;

/// 40 Gregorian years, in milliseconds (40 * 365 days plus 10 leap days),
/// the window's span.
const WINDOW_MILLIS: u64 = (40 * 365 + 10) * 86_400_000;

/// Maps a digest's leading 64 bits onto the `createdAt` window.
fn deterministic_timestamp(leading_u64: u64) -> Timestamp {
    let offset = (leading_u64 % WINDOW_MILLIS) as i64;
    Timestamp::from_unix_millis(EPOCH_OFFSET_MILLIS + offset)
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while materializing mission prompts.
#[derive(Debug, thiserror::Error)]
pub enum MaterializeError {
    /// Canonicalization/hashing of the request inputs failed.
    #[error("failed to hash materializer inputs: {0}")]
    Hashing(#[from] HashError),
    /// A derived prompt id failed sanitization.
    #[error("derived prompt id is invalid: {0}")]
    InvalidId(#[from] IdError),
}

// ============================================================================
// SECTION: Request
// ============================================================================

/// Inputs to one prompt-materialization pass.
///
/// # Invariants
/// - `flow_ids` and `missions` are both non-empty for a non-trivial artifact;
///   an empty combination simply yields an artifact with no prompts.
#[derive(Debug, Clone)]
pub struct MaterializeRequest<'a> {
    /// Campaign the materialized prompts belong to.
    pub campaign_id: &'a CampaignId,
    /// Suite the resolved missions were drawn from.
    pub suite_id: &'a SuiteId,
    /// Flows to materialize a prompt for, in declared order.
    pub flow_ids: &'a [FlowId],
    /// Resolved mission window, in selection order.
    pub missions: &'a [&'a Mission],
    /// Template string containing zero or more recognized placeholders.
    pub template: &'a str,
}

// ============================================================================
// SECTION: Artifact
// ============================================================================

/// One materialized (flow, mission) prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterializedPrompt {
    /// `sanitize(flowId-missionId-NNN-<sha256[0:6]>)`.
    pub id: String,
    /// Flow this prompt was materialized for.
    pub flow_id: FlowId,
    /// Suite the mission was drawn from.
    pub suite_id: SuiteId,
    /// Mission this prompt was materialized for.
    pub mission_id: MissionId,
    /// Mission's 0-based position within the resolved suite.
    pub mission_index: MissionIndex,
    /// Fully substituted prompt text.
    pub prompt: String,
}

/// The stable, deterministic artifact produced by [`materialize`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptArtifact {
    /// Campaign the materialized prompts belong to.
    pub campaign_id: CampaignId,
    /// Deterministic timestamp derived from a hash of every input.
    pub created_at: Timestamp,
    /// One entry per (flow, mission) pair, in flow-major, mission-minor
    /// order matching `flow_ids` × `missions`.
    pub prompts: Vec<MaterializedPrompt>,
}

// ============================================================================
// SECTION: Materialization
// ============================================================================

/// Builds a [`PromptArtifact`] from a template and a resolved mission window.
///
/// Placeholders are substituted in sorted key order
/// (`campaignId`, `flowId`, `missionId`, `missionIndex`, `prompt`, `suiteId`,
/// `tagsCsv`) so that a template containing text which happens to match a
/// later placeholder's substituted value is never re-substituted.
///
/// # Errors
///
/// Returns [`MaterializeError`] if hashing the canonicalized inputs fails, or
/// if a derived prompt `id` fails sanitization.
pub fn materialize(req: &MaterializeRequest<'_>) -> Result<PromptArtifact, MaterializeError> {
    let digest = hash_canonical_json(DEFAULT_HASH_ALGORITHM, &canonical_inputs(req))?;
    let created_at = deterministic_timestamp(digest.leading_u64());

    let mut prompts = Vec::with_capacity(req.flow_ids.len() * req.missions.len());
    for flow_id in req.flow_ids {
        for mission in req.missions {
            prompts.push(materialize_one(req, flow_id, mission)?);
        }
    }

    Ok(PromptArtifact {
        campaign_id: req.campaign_id.clone(),
        created_at,
        prompts,
    })
}

/// Canonicalizable snapshot of a request, used only to derive `created_at`.
#[derive(Serialize)]
struct CanonicalInputs<'a> {
    campaign_id: &'a str,
    suite_id: &'a str,
    flow_ids: Vec<&'a str>,
    mission_ids: Vec<&'a str>,
    template: &'a str,
}

/// Projects a request into the fields that feed `created_at`'s digest.
fn canonical_inputs<'a>(req: &'a MaterializeRequest<'a>) -> CanonicalInputs<'a> {
    CanonicalInputs {
        campaign_id: req.campaign_id.as_str(),
        suite_id: req.suite_id.as_str(),
        flow_ids: req.flow_ids.iter().map(FlowId::as_str).collect(),
        mission_ids: req.missions.iter().map(|mission| mission.mission_id.as_str()).collect(),
        template: req.template,
    }
}

/// Materializes a single (flow, mission) prompt.
fn materialize_one(
    req: &MaterializeRequest<'_>,
    flow_id: &FlowId,
    mission: &Mission,
) -> Result<MaterializedPrompt, MaterializeError> {
    let tags_csv = mission.tags.join(",");
    let mission_index_str = mission.mission_index.to_string();

    let mut prompt = req.template.to_string();
    for (placeholder, value) in sorted_substitutions(req, flow_id, mission, &mission_index_str, &tags_csv) {
        prompt = prompt.replace(placeholder, value);
    }

    let id_digest =
        hash_canonical_json(DEFAULT_HASH_ALGORITHM, &(flow_id.as_str(), mission.mission_id.as_str()))?;
    let short_hash = &id_digest.value[..6.min(id_digest.value.len())];
    let raw_id =
        format!("{flow_id}-{}-{:03}-{short_hash}", mission.mission_id, mission.mission_index.0);
    let id = sanitize_id(&raw_id)?;

    Ok(MaterializedPrompt {
        id,
        flow_id: flow_id.clone(),
        suite_id: req.suite_id.clone(),
        mission_id: mission.mission_id.clone(),
        mission_index: mission.mission_index,
        prompt,
    })
}

/// Returns the fixed placeholder substitutions in sorted key order.
fn sorted_substitutions<'a>(
    req: &'a MaterializeRequest<'a>,
    flow_id: &'a FlowId,
    mission: &'a Mission,
    mission_index_str: &'a str,
    tags_csv: &'a str,
) -> [(&'static str, &'a str); 7] {
    [
        ("{{campaignId}}", req.campaign_id.as_str()),
        ("{{flowId}}", flow_id.as_str()),
        ("{{missionId}}", mission.mission_id.as_str()),
        ("{{missionIndex}}", mission_index_str),
        ("{{prompt}}", mission.prompt.as_str()),
        ("{{suiteId}}", req.suite_id.as_str()),
        ("{{tagsCsv}}", tags_csv),
    ]
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "test-only assertions")]

    use zcl_core::MissionIndex;
    use zcl_core::ids::MissionId;

    use super::MaterializeRequest;
    use super::materialize;

    fn mission(id: &str, index: u32, tags: &[&str]) -> zcl_core::model::Mission {
        zcl_core::model::Mission {
            mission_id: MissionId::new(id).expect("valid id"),
            mission_index: MissionIndex(index),
            prompt: format!("do task {id}"),
            tags: tags.iter().map(|tag| (*tag).to_string()).collect(),
            expects: None,
        }
    }

    #[test]
    fn substitutes_every_placeholder() {
        let campaign_id = zcl_core::CampaignId::new("cmp-a").unwrap();
        let suite_id = zcl_core::SuiteId::new("suite-a").unwrap();
        let flow_id = zcl_core::FlowId::new("flow-a").unwrap();
        let flow_ids = [flow_id];
        let m = mission("m0", 0, &["alpha", "beta"]);
        let missions = [&m];
        let template = "[{{campaignId}}/{{suiteId}}/{{flowId}}] #{{missionIndex}} {{missionId}}: \
                         {{prompt}} (tags: {{tagsCsv}})";
        let req = MaterializeRequest {
            campaign_id: &campaign_id,
            suite_id: &suite_id,
            flow_ids: &flow_ids,
            missions: &missions,
            template,
        };

        let artifact = materialize(&req).expect("materializes");
        assert_eq!(artifact.prompts.len(), 1);
        let rendered = &artifact.prompts[0].prompt;
        assert_eq!(rendered, "[cmp-a/suite-a/flow-a] #0 m0: do task m0 (tags: alpha,beta)");
        assert!(artifact.prompts[0].id.starts_with("flow-a-m0-000-"));
    }

    #[test]
    fn is_deterministic_across_builds() {
        let campaign_id = zcl_core::CampaignId::new("cmp-a").unwrap();
        let suite_id = zcl_core::SuiteId::new("suite-a").unwrap();
        let flow_id = zcl_core::FlowId::new("flow-a").unwrap();
        let flow_ids = [flow_id];
        let m = mission("m0", 0, &[]);
        let missions = [&m];
        let req = MaterializeRequest {
            campaign_id: &campaign_id,
            suite_id: &suite_id,
            flow_ids: &flow_ids,
            missions: &missions,
            template: "{{prompt}}",
        };

        let first = materialize(&req).expect("materializes");
        let second = materialize(&req).expect("materializes");
        assert_eq!(first, second);
    }

    #[test]
    fn produces_one_prompt_per_flow_mission_pair() {
        let campaign_id = zcl_core::CampaignId::new("cmp-a").unwrap();
        let suite_id = zcl_core::SuiteId::new("suite-a").unwrap();
        let flow_ids =
            [zcl_core::FlowId::new("flow-a").unwrap(), zcl_core::FlowId::new("flow-b").unwrap()];
        let m0 = mission("m0", 0, &[]);
        let m1 = mission("m1", 1, &[]);
        let missions = [&m0, &m1];
        let req = MaterializeRequest {
            campaign_id: &campaign_id,
            suite_id: &suite_id,
            flow_ids: &flow_ids,
            missions: &missions,
            template: "{{prompt}}",
        };

        let artifact = materialize(&req).expect("materializes");
        assert_eq!(artifact.prompts.len(), 4);
    }

    #[test]
    fn unknown_placeholders_are_left_untouched() {
        let campaign_id = zcl_core::CampaignId::new("cmp-a").unwrap();
        let suite_id = zcl_core::SuiteId::new("suite-a").unwrap();
        let flow_id = zcl_core::FlowId::new("flow-a").unwrap();
        let flow_ids = [flow_id];
        let m = mission("m0", 0, &[]);
        let missions = [&m];
        let req = MaterializeRequest {
            campaign_id: &campaign_id,
            suite_id: &suite_id,
            flow_ids: &flow_ids,
            missions: &missions,
            template: "{{prompt}} {{unknownPlaceholder}}",
        };

        let artifact = materialize(&req).expect("materializes");
        assert!(artifact.prompts[0].prompt.ends_with("{{unknownPlaceholder}}"));
    }
}
