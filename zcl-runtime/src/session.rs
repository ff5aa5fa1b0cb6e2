// zcl-runtime/src/session.rs
// ============================================================================
// Module: Session Supervisor
// Description: Stdio JSON-RPC client session against a native runtime peer (§4.E).
// Purpose: Drive initialize/thread/turn requests, enforce monotonic attempt
//          state, classify peer failures, and fan out notifications to
//          listeners (including the trace recorder).
// Dependencies: tokio (process, io-util, sync, time), zcl-core, zcl-evidence,
//               crate::protocol, crate::error
// ============================================================================

//! ## Overview
//! We are always the initiating peer: every request we send carries a
//! monotonic id; every response is correlated back to its waiter through a
//! one-shot channel. Unsolicited peer messages (`thread/started`,
//! `turn/completed`, `item/agentMessage/delta`, `codex/event/*`, ...) are
//! notifications and are fanned out to registered [`SessionListener`]s
//! instead.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::process::Stdio;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use tokio::io::AsyncBufReadExt;
use tokio::io::AsyncWriteExt;
use tokio::io::BufReader;
use tokio::process::Child;
use tokio::process::ChildStdin;
use tokio::process::Command;
use tokio::sync::Mutex as AsyncMutex;
use tokio::sync::oneshot;
use tokio::time::Duration;
use tokio::time::timeout;

use zcl_core::ids::AgentId;
use zcl_core::ids::AttemptId;
use zcl_core::ids::MissionId;
use zcl_core::ids::RunId;
use zcl_core::ids::SuiteId;
use zcl_core::time::Timestamp;

use crate::error::RuntimeError;
use crate::protocol::InitializeResult;
use crate::protocol::JsonRpcErrorPayload;
use crate::protocol::JsonRpcMessage;
use crate::protocol::JsonRpcRequest;
use crate::protocol::ThreadStartParams;
use crate::protocol::ThreadStartResult;
use crate::protocol::TurnControlParams;
use crate::protocol::TurnInputItem;
use crate::protocol::TurnStartParams;
use crate::protocol::TurnStartResult;
use crate::protocol::method;

use zcl_core::model::attempt::AttemptState;

// ============================================================================
// SECTION: Session Options
// ============================================================================

/// A monotonic clock supplied by the host; the session never samples the
/// wall clock itself.
pub type ClockFn = Arc<dyn Fn() -> Timestamp + Send + Sync>;

/// Parameters needed to start a native runtime session.
#[derive(Clone)]
pub struct SessionOptions {
    /// Argv used to spawn the peer process.
    pub command: Vec<String>,
    /// Working directory for the thread.
    pub cwd: String,
    /// Model identifier to drive the thread with.
    pub model: String,
    /// Reasoning-effort hint, when supported.
    pub model_reasoning_effort: Option<String>,
    /// Reasoning-policy hint, when supported.
    pub model_reasoning_policy: Option<String>,
    /// Run this session's attempt belongs to.
    pub run_id: RunId,
    /// Suite the mission is drawn from.
    pub suite_id: SuiteId,
    /// Mission being attempted.
    pub mission_id: MissionId,
    /// Attempt this session is servicing.
    pub attempt_id: AttemptId,
    /// Runner-under-evaluation identifier.
    pub agent_id: AgentId,
    /// Per-request round-trip deadline.
    pub request_timeout: Duration,
    /// Host-supplied clock.
    pub clock: ClockFn,
}

// ============================================================================
// SECTION: Session Listener
// ============================================================================

/// Receives every notification the peer emits for a session.
pub trait SessionListener: Send + Sync {
    /// Called once per unsolicited peer notification.
    ///
    /// # Errors
    ///
    /// Returning `Err` surfaces as [`RuntimeError::ListenerFailure`]; the
    /// session keeps running, but the failure is logged by the caller.
    fn on_notification(&self, method: &str, params: &serde_json::Value) -> Result<(), RuntimeError>;
}

// ============================================================================
// SECTION: Pending Request Table
// ============================================================================

/// Shared state the reader task and the session handle both touch.
struct Shared {
    /// Responses awaited by id.
    pending: AsyncMutex<HashMap<u64, oneshot::Sender<JsonRpcMessage>>>,
    /// Listeners notified of every unsolicited peer message.
    listeners: Vec<Arc<dyn SessionListener>>,
}

// ============================================================================
// SECTION: Session
// ============================================================================

/// A live stdio JSON-RPC session against one native runtime peer process.
pub struct Session {
    child: Child,
    stdin: ChildStdin,
    next_id: AtomicU64,
    shared: Arc<Shared>,
    reader_task: tokio::task::JoinHandle<()>,
    request_timeout: Duration,
    state: AsyncMutex<AttemptState>,
    thread_id: AsyncMutex<Option<String>>,
}

impl Session {
    /// Spawns `opts.command` and wires up the stdio JSON-RPC transport.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::Spawn`] if the peer process cannot be started.
    pub fn spawn(
        opts: &SessionOptions,
        listeners: Vec<Arc<dyn SessionListener>>,
    ) -> Result<Self, RuntimeError> {
        let Some((program, args)) = opts.command.split_first() else {
            return Err(RuntimeError::Spawn("empty runtime command".to_string()));
        };
        let mut child = Command::new(program)
            .args(args)
            .current_dir(&opts.cwd)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|err| RuntimeError::Spawn(err.to_string()))?;

        let stdin = child.stdin.take().ok_or_else(|| {
            RuntimeError::Spawn("child process did not expose a stdin pipe".to_string())
        })?;
        let stdout = child.stdout.take().ok_or_else(|| {
            RuntimeError::Spawn("child process did not expose a stdout pipe".to_string())
        })?;

        let shared = Arc::new(Shared { pending: AsyncMutex::new(HashMap::new()), listeners });
        let reader_task = tokio::spawn(read_loop(BufReader::new(stdout), Arc::clone(&shared)));

        Ok(Self {
            child,
            stdin,
            next_id: AtomicU64::new(1),
            shared,
            reader_task,
            request_timeout: opts.request_timeout,
            state: AsyncMutex::new(AttemptState::Queued),
            thread_id: AsyncMutex::new(None),
        })
    }

    /// Advances the tracked attempt state, rejecting any backward transition.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::Protocol`] if `next` is not a legal forward
    /// transition from the current state.
    pub async fn advance_state(&self, next: AttemptState) -> Result<(), RuntimeError> {
        let mut state = self.state.lock().await;
        if !state.can_advance_to(next) {
            return Err(RuntimeError::Protocol(format!(
                "illegal attempt state transition: {state:?} -> {next:?}"
            )));
        }
        *state = next;
        Ok(())
    }

    /// Returns the currently tracked attempt state.
    pub async fn state(&self) -> AttemptState {
        *self.state.lock().await
    }

    /// Sends a request and waits for its correlated response, or the shared
    /// request timeout, whichever comes first.
    async fn call(
        &mut self,
        method: &str,
        params: Option<serde_json::Value>,
    ) -> Result<serde_json::Value, RuntimeError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = oneshot::channel();
        self.shared.pending.lock().await.insert(id, tx);

        let request = JsonRpcRequest::new(id, method, params);
        let mut line = serde_json::to_string(&request)
            .map_err(|err| RuntimeError::Protocol(format!("cannot encode request: {err}")))?;
        line.push('\n');
        self.stdin
            .write_all(line.as_bytes())
            .await
            .map_err(|err| RuntimeError::Protocol(format!("cannot write request: {err}")))?;
        self.stdin
            .flush()
            .await
            .map_err(|err| RuntimeError::Protocol(format!("cannot flush request: {err}")))?;

        let response = match timeout(self.request_timeout, rx).await {
            Ok(Ok(message)) => message,
            Ok(Err(_canceled)) => return Err(RuntimeError::StreamDisconnect),
            Err(_elapsed) => {
                self.shared.pending.lock().await.remove(&id);
                return Err(RuntimeError::Timeout);
            }
        };

        if let Some(JsonRpcErrorPayload { message, .. }) = response.error {
            return Err(RuntimeError::classify_peer_message(&message));
        }
        response.result.ok_or_else(|| {
            RuntimeError::Protocol(format!("response to {method} carried neither result nor error"))
        })
    }

    /// Performs the `initialize` handshake.
    ///
    /// # Errors
    ///
    /// Propagates any transport, timeout, or peer-reported error.
    pub async fn initialize(&mut self) -> Result<InitializeResult, RuntimeError> {
        let result = self.call(method::INITIALIZE, None).await?;
        serde_json::from_value(result)
            .map_err(|err| RuntimeError::Protocol(format!("malformed initialize result: {err}")))
    }

    /// Starts a conversation thread.
    ///
    /// # Errors
    ///
    /// Propagates any transport, timeout, or peer-reported error, and fails
    /// if the attempt state cannot legally advance to `ThreadStarted`.
    pub async fn thread_start(&mut self, opts: &SessionOptions) -> Result<String, RuntimeError> {
        self.advance_state(AttemptState::SessionReady).await?;
        let params = ThreadStartParams {
            model: opts.model.clone(),
            model_reasoning_effort: opts.model_reasoning_effort.clone(),
            model_reasoning_policy: opts.model_reasoning_policy.clone(),
            cwd: opts.cwd.clone(),
        };
        let params_value = serde_json::to_value(params)
            .map_err(|err| RuntimeError::Protocol(format!("cannot encode thread/start: {err}")))?;
        let result = self.call(method::THREAD_START, Some(params_value)).await?;
        let parsed: ThreadStartResult = serde_json::from_value(result).map_err(|err| {
            RuntimeError::Protocol(format!("malformed thread/start result: {err}"))
        })?;
        self.advance_state(AttemptState::ThreadStarted).await?;
        *self.thread_id.lock().await = Some(parsed.thread.id.clone());
        Ok(parsed.thread.id)
    }

    /// Starts a turn carrying `text` as a single text input item.
    ///
    /// # Errors
    ///
    /// Propagates any transport, timeout, or peer-reported error, and fails
    /// if no thread has been started yet.
    pub async fn turn_start(&mut self, text: String) -> Result<TurnStartResult, RuntimeError> {
        let thread_id = self
            .thread_id
            .lock()
            .await
            .clone()
            .ok_or_else(|| RuntimeError::Protocol("turn/start before thread/start".to_string()))?;
        self.advance_state(AttemptState::TurnStarted).await?;
        let params = TurnStartParams { thread_id, input: vec![TurnInputItem::Text { text }] };
        let params_value = serde_json::to_value(params)
            .map_err(|err| RuntimeError::Protocol(format!("cannot encode turn/start: {err}")))?;
        let result = self.call(method::TURN_START, Some(params_value)).await?;
        serde_json::from_value(result)
            .map_err(|err| RuntimeError::Protocol(format!("malformed turn/start result: {err}")))
    }

    /// Requests cancellation of the active turn, best-effort.
    ///
    /// # Errors
    ///
    /// Propagates a transport failure, but a peer-reported rejection is not
    /// escalated since interruption is inherently racy with completion.
    pub async fn interrupt(&mut self, turn_id: String) -> Result<(), RuntimeError> {
        let thread_id = self
            .thread_id
            .lock()
            .await
            .clone()
            .ok_or_else(|| RuntimeError::Protocol("interrupt before thread/start".to_string()))?;
        let params = TurnControlParams { thread_id, turn_id };
        let params_value = serde_json::to_value(params)
            .map_err(|err| RuntimeError::Protocol(format!("cannot encode turn/interrupt: {err}")))?;
        match self.call(method::TURN_INTERRUPT, Some(params_value)).await {
            Ok(_) | Err(RuntimeError::Timeout) => {
                self.advance_state(AttemptState::TurnInterrupted).await
            }
            Err(err) => Err(err),
        }
    }

    /// Closes the session: requests interruption with a bounded grace
    /// period, then kills the child process regardless of outcome.
    pub async fn close(mut self, grace: Duration) {
        let thread_id = self.thread_id.lock().await.clone();
        if let Some(thread_id) = thread_id {
            let params = TurnControlParams { thread_id, turn_id: String::new() };
            if let Ok(params_value) = serde_json::to_value(params) {
                let _ = timeout(grace, self.call(method::TURN_INTERRUPT, Some(params_value))).await;
            }
        }
        self.reader_task.abort();
        let _ = self.child.kill().await;
    }
}

// ============================================================================
// SECTION: Reader Loop
// ============================================================================

/// Reads newline-delimited JSON-RPC messages from the peer until EOF,
/// correlating responses and fanning out notifications.
async fn read_loop<R>(mut reader: BufReader<R>, shared: Arc<Shared>)
where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut line = String::new();
    loop {
        line.clear();
        let bytes_read = match reader.read_line(&mut line).await {
            Ok(bytes_read) => bytes_read,
            Err(_io_error) => break,
        };
        if bytes_read == 0 {
            break;
        }
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let Ok(message) = serde_json::from_str::<JsonRpcMessage>(trimmed) else {
            continue;
        };
        dispatch(&shared, message).await;
    }
    fail_all_pending(&shared).await;
}

/// Routes one decoded message to its waiter (if a response) or every
/// listener (if a notification).
async fn dispatch(shared: &Arc<Shared>, message: JsonRpcMessage) {
    if let Some(id) = message.id {
        if let Some(waiter) = shared.pending.lock().await.remove(&id) {
            let _ = waiter.send(message);
        }
        return;
    }
    let Some(method_name) = message.method.clone() else { return };
    let params = message.params.clone().unwrap_or(serde_json::Value::Null);
    for listener in &shared.listeners {
        let _ = listener.on_notification(&method_name, &params);
    }
}

/// Fails every still-pending request once the reader loop exits, so callers
/// blocked on `call` observe a stream disconnect instead of hanging forever.
async fn fail_all_pending(shared: &Arc<Shared>) {
    let mut pending = shared.pending.lock().await;
    for (_id, waiter) in pending.drain() {
        drop(waiter);
    }
}
