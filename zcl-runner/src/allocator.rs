// zcl-runner/src/allocator.rs
// ============================================================================
// Module: Attempt Allocator
// Description: Allocates a fresh attempt directory and its initial artifacts
//              (§4.B).
// Purpose: Given a mission and flow context, create `<attemptDir>/`, write
//          `attempt.json`, `prompt.txt`, and a canonical `suite.json`
//          snapshot, and return the environment to inject into the runner.
// Dependencies: zcl-core, zcl-evidence
// ============================================================================

//! ## Overview
//! Exactly one `attemptDir` exists per `(runId, flowId, missionIndex, retry)`
//! and it is never reused (§3). The retry counter is supplied by the caller
//! (the Suite Runner tracks it monotonically per `(runId, missionId)`); this
//! module only performs the allocation itself.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;

use zcl_core::ids::AgentId;
use zcl_core::ids::FlowId;
use zcl_core::ids::MissionId;
use zcl_core::ids::RetryIndex;
use zcl_core::ids::RunId;
use zcl_core::layout;
use zcl_core::model::attempt::Attempt;
use zcl_core::model::attempt::AttemptState;
use zcl_core::model::campaign::IsolationModel;
use zcl_core::model::campaign::TimeoutStart;
use zcl_core::model::suite::Suite;
use zcl_core::time::Timestamp;
use zcl_evidence::EvidenceRoot;

use crate::error::RunnerError;

// ============================================================================
// SECTION: Allocation Request
// ============================================================================

/// Everything the allocator needs to seal one fresh attempt directory.
pub struct AllocateRequest<'a> {
    /// Output root (`.zcl` by default).
    pub out_root: &'a Path,
    /// Run this attempt belongs to.
    pub run_id: RunId,
    /// Flow this attempt was scheduled under.
    pub flow_id: FlowId,
    /// Mission's 0-based position within the resolved suite.
    pub mission_index: u32,
    /// Mission being attempted.
    pub mission_id: MissionId,
    /// Monotonic retry counter within `(runId, missionId)`.
    pub retry: RetryIndex,
    /// Per-attempt deadline budget, in milliseconds.
    pub timeout_ms: u64,
    /// When the deadline starts counting down.
    pub timeout_start: TimeoutStart,
    /// Process vs native-spawn isolation for this attempt.
    pub isolation_model: IsolationModel,
    /// Materialized prompt text.
    pub prompt: String,
    /// Canonical suite snapshot frozen at allocation time.
    pub suite_snapshot: Suite,
    /// Runner-under-evaluation identifier.
    pub agent_id: AgentId,
    /// Allocation timestamp, supplied by the host clock.
    pub started_at: Timestamp,
}

// ============================================================================
// SECTION: Injected Environment
// ============================================================================

/// The environment variables injected into a spawned runner or native
/// session, mirrored verbatim from `attempt.json.ids` for the pre-spawn
/// integrity check (§3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InjectedEnv {
    /// `ZCL_RUN_ID`
    pub run_id: String,
    /// `ZCL_SUITE_ID`
    pub suite_id: String,
    /// `ZCL_MISSION_ID`
    pub mission_id: String,
    /// `ZCL_ATTEMPT_ID`
    pub attempt_id: String,
    /// `ZCL_OUT_DIR`
    pub out_dir: String,
    /// `ZCL_TMP_DIR`
    pub tmp_dir: String,
    /// `ZCL_AGENT_ID`
    pub agent_id: String,
    /// `ZCL_ISOLATION_MODEL`
    pub isolation_model: String,
    /// `ZCL_PROMPT_PATH`
    pub prompt_path: String,
}

impl InjectedEnv {
    /// Returns the injected variables as `(name, value)` pairs, in the
    /// fixed order named by §4.B.
    #[must_use]
    pub fn as_pairs(&self) -> [(&'static str, &str); 9] {
        [
            ("ZCL_RUN_ID", &self.run_id),
            ("ZCL_SUITE_ID", &self.suite_id),
            ("ZCL_MISSION_ID", &self.mission_id),
            ("ZCL_ATTEMPT_ID", &self.attempt_id),
            ("ZCL_OUT_DIR", &self.out_dir),
            ("ZCL_TMP_DIR", &self.tmp_dir),
            ("ZCL_AGENT_ID", &self.agent_id),
            ("ZCL_ISOLATION_MODEL", &self.isolation_model),
            ("ZCL_PROMPT_PATH", &self.prompt_path),
        ]
    }

    /// Verifies that the environment a process actually received matches
    /// this attempt's `attempt.json.ids` (the pre-spawn integrity check
    /// required by §3).
    #[must_use]
    pub fn matches(&self, observed: &std::collections::BTreeMap<String, String>) -> bool {
        self.as_pairs().into_iter().all(|(name, value)| observed.get(name).map(String::as_str) == Some(value))
    }
}

fn isolation_model_str(model: IsolationModel) -> &'static str {
    match model {
        IsolationModel::ProcessRunner => "process_runner",
        IsolationModel::NativeSpawn => "native_spawn",
    }
}

// ============================================================================
// SECTION: Allocation
// ============================================================================

/// The result of allocating a fresh attempt directory.
pub struct Allocation {
    /// The sealed-in attempt record, also persisted as `attempt.json`.
    pub attempt: Attempt,
    /// Environment to inject into the spawned runner or native session.
    pub env: InjectedEnv,
    /// Absolute path to the allocated attempt directory.
    pub attempt_dir: PathBuf,
}

/// Allocates a fresh attempt directory, writing `attempt.json`, `prompt.txt`,
/// and the canonical `suite.json` snapshot.
///
/// # Errors
///
/// Returns [`RunnerError::Usage`] if `req.mission_id`/`req.agent_id` cannot
/// be composed into a valid [`AttemptId`], or [`RunnerError::Evidence`] if
/// any write fails.
pub fn allocate(req: AllocateRequest<'_>) -> Result<Allocation, RunnerError> {
    let attempt_dir =
        layout::attempt_dir(req.out_root, &req.run_id, req.mission_index, &req.mission_id, req.retry);
    let attempt_id = layout::attempt_id_for(req.mission_index, &req.mission_id, req.retry)?;

    let tmp_dir = attempt_dir.join("tmp");
    std::fs::create_dir_all(&tmp_dir)?;

    let env = InjectedEnv {
        run_id: req.run_id.as_str().to_string(),
        suite_id: req.suite_snapshot.suite_id.as_str().to_string(),
        mission_id: req.mission_id.as_str().to_string(),
        attempt_id: attempt_id.as_str().to_string(),
        out_dir: attempt_dir.to_string_lossy().into_owned(),
        tmp_dir: tmp_dir.to_string_lossy().into_owned(),
        agent_id: req.agent_id.as_str().to_string(),
        isolation_model: isolation_model_str(req.isolation_model).to_string(),
        prompt_path: layout::prompt_txt(&attempt_dir).to_string_lossy().into_owned(),
    };

    let attempt = Attempt {
        attempt_id,
        run_id: req.run_id,
        flow_id: req.flow_id,
        suite_id: req.suite_snapshot.suite_id.clone(),
        mission_id: req.mission_id,
        retry: req.retry,
        attempt_dir: attempt_dir.clone(),
        started_at: req.started_at,
        timeout_ms: req.timeout_ms,
        timeout_start: req.timeout_start,
        timeout_started_at: None,
        isolation_model: req.isolation_model,
        prompt: req.prompt,
        suite_snapshot: req.suite_snapshot,
        agent_id: req.agent_id,
        state: AttemptState::Queued,
    };

    let root = EvidenceRoot::open_or_create(&attempt_dir)?;
    root.write_json_atomic(Path::new("attempt.json"), &attempt)?;
    root.write_file_atomic(Path::new("prompt.txt"), attempt.prompt.as_bytes())?;
    root.write_json_atomic(Path::new("suite.json"), &attempt.suite_snapshot)?;

    Ok(Allocation { attempt, env, attempt_dir })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "test-only assertions")]

    use tempfile::tempdir;

    use super::AllocateRequest;
    use super::allocate;
    use zcl_core::ids::AgentId;
    use zcl_core::ids::MissionId;
    use zcl_core::ids::MissionIndex;
    use zcl_core::ids::RetryIndex;
    use zcl_core::ids::RunId;
    use zcl_core::ids::SuiteId;
    use zcl_core::model::campaign::IsolationModel;
    use zcl_core::model::campaign::TimeoutStart;
    use zcl_core::model::suite::Suite;
    use zcl_core::model::suite::SuiteDefaults;
    use zcl_core::time::Timestamp;

    fn sample_suite() -> Suite {
        Suite {
            suite_id: SuiteId::new("suite-a").unwrap(),
            defaults: SuiteDefaults {
                mode: "default".to_string(),
                timeout_ms: 1000,
                timeout_start: TimeoutStart::AttemptStart,
                feedback_policy: "strict".to_string(),
                blind: false,
                blind_terms: Vec::new(),
            },
            missions: vec![],
        }
    }

    #[test]
    fn allocation_writes_the_three_seed_artifacts() {
        let dir = tempdir().unwrap();
        let req = AllocateRequest {
            out_root: dir.path(),
            run_id: RunId::new("run-1").unwrap(),
            flow_id: zcl_core::ids::FlowId::new("flow-1").unwrap(),
            mission_index: 0,
            mission_id: MissionId::new("m0").unwrap(),
            retry: RetryIndex(0),
            timeout_ms: 1000,
            timeout_start: TimeoutStart::AttemptStart,
            isolation_model: IsolationModel::ProcessRunner,
            prompt: "do the thing".to_string(),
            suite_snapshot: sample_suite(),
            agent_id: AgentId::new("agent-1").unwrap(),
            started_at: Timestamp::from_unix_millis(0),
        };
        let allocation = allocate(req).unwrap();
        assert!(allocation.attempt_dir.join("attempt.json").exists());
        assert!(allocation.attempt_dir.join("prompt.txt").exists());
        assert!(allocation.attempt_dir.join("suite.json").exists());
        assert_eq!(allocation.env.mission_id, "m0");
        assert!(allocation.attempt.attempt_id.as_str().starts_with("000-m0-r0"));
    }

    #[test]
    fn injected_env_matches_itself() {
        let dir = tempdir().unwrap();
        let req = AllocateRequest {
            out_root: dir.path(),
            run_id: RunId::new("run-1").unwrap(),
            flow_id: zcl_core::ids::FlowId::new("flow-1").unwrap(),
            mission_index: MissionIndex(2).0,
            mission_id: MissionId::new("m2").unwrap(),
            retry: RetryIndex(1),
            timeout_ms: 1000,
            timeout_start: TimeoutStart::AttemptStart,
            isolation_model: IsolationModel::NativeSpawn,
            prompt: "prompt".to_string(),
            suite_snapshot: sample_suite(),
            agent_id: AgentId::new("agent-1").unwrap(),
            started_at: Timestamp::from_unix_millis(0),
        };
        let allocation = allocate(req).unwrap();
        let observed = allocation
            .env
            .as_pairs()
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        assert!(allocation.env.matches(&observed));
    }
}
