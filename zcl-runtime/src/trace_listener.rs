// zcl-runtime/src/trace_listener.rs
// ============================================================================
// Module: Trace Listener
// Description: Bridges Session Supervisor notifications into the evidence
//              trail (§4.C, §4.E).
// Purpose: Turn every peer notification into one `TraceEvent` record, so the
//          append-only trace reflects the full runtime conversation.
// Dependencies: zcl-evidence, zcl-core, crate::session, crate::error
// ============================================================================

//! ## Overview
//! One listener instance is bound to a single attempt's [`TraceRecorder`].
//! Each notification becomes a trace record under the `runtime` tool
//! namespace, with the JSON-RPC method name as the operation.

// ============================================================================
// SECTION: Imports
// ============================================================================

use zcl_core::ids::AgentId;
use zcl_core::ids::AttemptId;
use zcl_core::ids::MissionId;
use zcl_core::ids::RunId;
use zcl_core::ids::SuiteId;

use zcl_evidence::TraceEvent;
use zcl_evidence::TraceIntegrity;
use zcl_evidence::TraceIo;
use zcl_evidence::TraceRecorder;
use zcl_evidence::TraceResult;

use crate::error::RuntimeError;
use crate::session::ClockFn;
use crate::session::SessionListener;

/// Writes every session notification to the attempt's trace file.
pub struct TraceListener {
    recorder: TraceRecorder,
    run_id: RunId,
    suite_id: SuiteId,
    mission_id: MissionId,
    attempt_id: AttemptId,
    agent_id: AgentId,
    clock: ClockFn,
}

impl TraceListener {
    /// Builds a listener writing into `recorder`, stamping every record with
    /// the given identifiers and the host-supplied clock.
    #[must_use]
    pub fn new(
        recorder: TraceRecorder,
        run_id: RunId,
        suite_id: SuiteId,
        mission_id: MissionId,
        attempt_id: AttemptId,
        agent_id: AgentId,
        clock: ClockFn,
    ) -> Self {
        Self { recorder, run_id, suite_id, mission_id, attempt_id, agent_id, clock }
    }
}

impl SessionListener for TraceListener {
    fn on_notification(
        &self,
        method: &str,
        params: &serde_json::Value,
    ) -> Result<(), RuntimeError> {
        let (preview, truncated) = self.recorder.build_preview(
            params.to_string().as_bytes(),
            zcl_evidence::DEFAULT_PREVIEW_CAP_BYTES,
        );
        let event = TraceEvent {
            v: 1,
            ts: (self.clock)(),
            run_id: self.run_id.clone(),
            suite_id: self.suite_id.clone(),
            mission_id: self.mission_id.clone(),
            attempt_id: self.attempt_id.clone(),
            agent_id: self.agent_id.clone(),
            tool: "runtime".to_string(),
            op: method.to_string(),
            input: serde_json::Value::Null,
            result: TraceResult { ok: true, exit_code: None, duration_ms: 0, spawn_error: None },
            io: TraceIo {
                out_bytes: params.to_string().len() as u64,
                err_bytes: 0,
                out_preview: preview,
                err_preview: String::new(),
                out_truncated: truncated,
                err_truncated: false,
            },
            integrity: TraceIntegrity { truncated: None },
        };
        self.recorder
            .append(&event)
            .map_err(|err| RuntimeError::ListenerFailure(err.to_string()))
    }
}
