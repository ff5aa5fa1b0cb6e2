// zcl-runtime/src/protocol.rs
// ============================================================================
// Module: Stdio JSON-RPC Protocol
// Description: Wire types for the §4.E request/response/notification table.
// Purpose: Typed request params and result payloads for the native runtime
//          stdio peer; framing is newline-delimited JSON.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! We are always the initiating peer; this module has no server-side
//! dispatch, only the client-side request/response/notification shapes.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Method Names
// ============================================================================

/// JSON-RPC method name constants, matching the §4.E wire table verbatim.
pub mod method {
    /// Handshake request; returns `{userAgent}`.
    pub const INITIALIZE: &str = "initialize";
    /// Starts a conversation thread; returns `{thread:{id}}`.
    pub const THREAD_START: &str = "thread/start";
    /// Starts a turn; returns `{turn:{id,status,items[]}}`.
    pub const TURN_START: &str = "turn/start";
    /// Requests cancellation of the active turn.
    pub const TURN_INTERRUPT: &str = "turn/interrupt";
    /// Requests mid-turn steering input.
    pub const TURN_STEER: &str = "turn/steer";
    /// Notification: a thread has started.
    pub const THREAD_STARTED: &str = "thread/started";
    /// Notification: a turn has started.
    pub const TURN_STARTED: &str = "turn/started";
    /// Notification: a turn completed successfully.
    pub const TURN_COMPLETED: &str = "turn/completed";
    /// Notification: a turn failed.
    pub const TURN_FAILED: &str = "turn/failed";
    /// Notification: a streamed agent-message delta.
    pub const ITEM_AGENT_MESSAGE_DELTA: &str = "item/agentMessage/delta";
    /// Prefix for vendor-specific Codex event notifications.
    pub const CODEX_EVENT_PREFIX: &str = "codex/event/";
}

// ============================================================================
// SECTION: Envelope
// ============================================================================

/// A JSON-RPC 2.0 request envelope.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcRequest<'a> {
    /// Protocol version, always `"2.0"`.
    pub jsonrpc: &'static str,
    /// Monotonic request id, echoed in the matching response.
    pub id: u64,
    /// The method being invoked.
    pub method: &'a str,
    /// Method parameters, when applicable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
}

impl<'a> JsonRpcRequest<'a> {
    /// Builds a request envelope for `method` with `id` and `params`.
    #[must_use]
    pub const fn new(id: u64, method: &'a str, params: Option<serde_json::Value>) -> Self {
        Self { jsonrpc: "2.0", id, method, params }
    }
}

/// A JSON-RPC 2.0 response envelope, or an unsolicited notification.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcMessage {
    /// Present on responses; absent on notifications.
    #[serde(default)]
    pub id: Option<u64>,
    /// Present on notifications (and, by convention here, echoed on responses
    /// we issued ourselves is not required since `id` already correlates).
    #[serde(default)]
    pub method: Option<String>,
    /// The success payload, when present.
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    /// The error payload, when present.
    #[serde(default)]
    pub error: Option<JsonRpcErrorPayload>,
    /// Notification parameters.
    #[serde(default)]
    pub params: Option<serde_json::Value>,
}

/// A JSON-RPC error payload.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcErrorPayload {
    /// Peer-assigned error code.
    #[serde(default)]
    pub code: i64,
    /// Human-readable error message.
    pub message: String,
}

// ============================================================================
// SECTION: Typed Results
// ============================================================================

/// Result of `initialize`.
#[derive(Debug, Clone, Deserialize)]
pub struct InitializeResult {
    /// The peer's advertised user agent string.
    pub user_agent: String,
}

/// Params for `thread/start`.
#[derive(Debug, Clone, Serialize)]
pub struct ThreadStartParams {
    /// Model identifier to drive the thread with.
    pub model: String,
    /// Reasoning-effort hint, when supported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_reasoning_effort: Option<String>,
    /// Reasoning-policy hint, when supported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_reasoning_policy: Option<String>,
    /// Working directory for the thread.
    pub cwd: String,
}

/// Result of `thread/start`.
#[derive(Debug, Clone, Deserialize)]
pub struct ThreadStartResult {
    /// The started thread's identity.
    pub thread: ThreadHandle,
}

/// A thread identity handle.
#[derive(Debug, Clone, Deserialize)]
pub struct ThreadHandle {
    /// Peer-assigned thread id.
    pub id: String,
}

/// Params for `turn/start`.
#[derive(Debug, Clone, Serialize)]
pub struct TurnStartParams {
    /// The thread this turn belongs to.
    pub thread_id: String,
    /// Turn input items.
    pub input: Vec<TurnInputItem>,
}

/// A single turn input item.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TurnInputItem {
    /// Plain text input.
    Text {
        /// The text payload.
        text: String,
    },
}

/// Result of `turn/start`.
#[derive(Debug, Clone, Deserialize)]
pub struct TurnStartResult {
    /// The started turn's identity and initial status.
    pub turn: TurnHandle,
}

/// A turn identity/status handle.
#[derive(Debug, Clone, Deserialize)]
pub struct TurnHandle {
    /// Peer-assigned turn id.
    pub id: String,
    /// Peer-reported turn status at the time of the response.
    pub status: String,
    /// Items produced so far.
    #[serde(default)]
    pub items: Vec<serde_json::Value>,
}

/// Params shared by `turn/interrupt` and `turn/steer`.
#[derive(Debug, Clone, Serialize)]
pub struct TurnControlParams {
    /// The thread the turn belongs to.
    pub thread_id: String,
    /// The turn being controlled.
    pub turn_id: String,
}
