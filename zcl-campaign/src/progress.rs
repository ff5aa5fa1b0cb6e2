// zcl-campaign/src/progress.rs
// ============================================================================
// Module: Progress Ledger
// Description: Append-only `campaign.progress.jsonl` writer and resume
//              replay (§4.J step 5, resume contract).
// Purpose: Record every state transition so a resumed run can tell which
//          missions are already complete without re-reading every attempt
//          directory.
// Dependencies: std, zcl-core, zcl-evidence
// ============================================================================

//! ## Overview
//! [`replay`] reads the ledger directly off disk rather than through
//! [`zcl_evidence::EvidenceRoot`], which has no generic JSONL-read-back
//! method; it tolerates a missing file (a first run has no ledger yet) the
//! same way `zcl_runner::suite::count_non_empty_lines` does.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::path::Path;

use zcl_core::ids::MissionId;
use zcl_core::model::ProgressEvent;
use zcl_core::model::ProgressEventKind;
use zcl_evidence::EvidenceRoot;

use crate::error::CampaignError;

// ============================================================================
// SECTION: Append
// ============================================================================

/// Appends one progress event to `campaign.progress.jsonl` under
/// `campaign_dir`.
///
/// # Errors
///
/// Returns [`CampaignError::Evidence`] if the append fails.
pub fn append(campaign_dir: &Path, event: &ProgressEvent) -> Result<(), CampaignError> {
    let root = EvidenceRoot::open_or_create(campaign_dir)?;
    root.append_jsonl(Path::new("campaign.progress.jsonl"), event)?;
    Ok(())
}

// ============================================================================
// SECTION: Replay
// ============================================================================

/// Reads every event from an existing `campaign.progress.jsonl`, returning
/// the set of mission ids already recorded as `MissionGated` — missions a
/// resumed run must not re-attempt.
///
/// Returns an empty set, not an error, when the ledger does not exist yet.
///
/// # Errors
///
/// Returns [`CampaignError::Io`] if the file exists but cannot be read, or
/// [`CampaignError::Usage`] if a non-empty line fails to parse as a
/// [`ProgressEvent`].
pub fn replay(campaign_dir: &Path) -> Result<BTreeSet<MissionId>, CampaignError> {
    let path = campaign_dir.join("campaign.progress.jsonl");
    let raw = match std::fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeSet::new()),
        Err(err) => return Err(CampaignError::Io(err)),
    };

    let mut completed = BTreeSet::new();
    for line in raw.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let event: ProgressEvent = serde_json::from_str(line)
            .map_err(|err| CampaignError::Usage(format!("corrupt progress ledger entry: {err}")))?;
        if event.kind == ProgressEventKind::MissionGated {
            completed.insert(event.mission_id);
        }
    }
    Ok(completed)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "test-only assertions")]

    use tempfile::tempdir;
    use zcl_core::Timestamp;
    use zcl_core::ids::CampaignId;
    use zcl_core::ids::MissionId;
    use zcl_core::ids::MissionIndex;
    use zcl_core::model::ProgressEvent;
    use zcl_core::model::ProgressEventKind;

    use super::append;
    use super::replay;

    fn event(kind: ProgressEventKind, mission: &str) -> ProgressEvent {
        ProgressEvent {
            kind,
            ts: Timestamp::from_unix_millis(0),
            campaign_id: CampaignId::new("cmp-int").expect("valid id"),
            mission_index: MissionIndex(0),
            mission_id: MissionId::new(mission).expect("valid id"),
            flow_id: None,
            attempt_id: None,
            details: serde_json::json!({}),
        }
    }

    #[test]
    fn replay_of_a_missing_ledger_is_empty() {
        let dir = tempdir().expect("tempdir");
        assert!(replay(dir.path()).expect("ok").is_empty());
    }

    #[test]
    fn replay_collects_only_gated_missions() {
        let dir = tempdir().expect("tempdir");
        append(dir.path(), &event(ProgressEventKind::AttemptStarted, "m0")).expect("append");
        append(dir.path(), &event(ProgressEventKind::MissionGated, "m0")).expect("append");
        append(dir.path(), &event(ProgressEventKind::AttemptAllocated, "m1")).expect("append");
        let completed = replay(dir.path()).expect("ok");
        assert_eq!(completed.len(), 1);
        assert!(completed.contains(&MissionId::new("m0").expect("valid id")));
    }
}
