// zcl-cli/src/runtime_factory.rs
// ============================================================================
// Module: Native Runtime Factories
// Description: Concrete `RuntimeFactory` implementations the CLI registers
//              against `zcl_runtime::RuntimeRegistry` (§4.D).
// Purpose: Translate a flow's `runner = codex_app_server` declaration into a
//          spawnable session, leaving everything else to `zcl_runtime::Session`.
// Dependencies: zcl-runtime
// ============================================================================

//! ## Overview
//! A [`RuntimeFactory`] is only a capability declaration plus a spawn
//! recipe; [`zcl_runtime::Session::spawn`] already owns the process-spawn
//! and stdio JSON-RPC wiring, so [`SpawnFactory`] is a thin adapter that
//! remembers which argv starts the peer and forwards everything else.

use std::sync::Arc;

use zcl_runtime::Capability;
use zcl_runtime::RuntimeError;
use zcl_runtime::RuntimeFactory;
use zcl_runtime::Session;
use zcl_runtime::SessionListener;
use zcl_runtime::SessionOptions;

/// The strategy id the Codex app-server runtime registers under.
pub const CODEX_APP_SERVER_STRATEGY: &str = "codex_app_server";

/// Capabilities advertised by [`SpawnFactory`] for the Codex app-server
/// strategy: everything but `turn/steer`, which that peer does not
/// implement.
const CODEX_APP_SERVER_CAPABILITIES: [Capability; 4] =
    [Capability::ThreadStart, Capability::EventStream, Capability::ToolCall, Capability::ModelList];

/// Runtime factory that spawns its peer process on every call, per §4.D's
/// "session startup happens through `RuntimeFactory::start_session`"
/// contract.
pub struct SpawnFactory {
    id: String,
    capabilities: Vec<Capability>,
}

impl SpawnFactory {
    /// Builds the Codex app-server factory, registered under
    /// [`CODEX_APP_SERVER_STRATEGY`].
    #[must_use]
    pub fn codex_app_server() -> Self {
        Self { id: CODEX_APP_SERVER_STRATEGY.to_string(), capabilities: CODEX_APP_SERVER_CAPABILITIES.to_vec() }
    }
}

impl RuntimeFactory for SpawnFactory {
    fn id(&self) -> &str {
        &self.id
    }

    fn capabilities(&self) -> &[Capability] {
        &self.capabilities
    }

    fn start_session(
        &self,
        opts: &SessionOptions,
        listeners: Vec<Arc<dyn SessionListener>>,
    ) -> Result<Session, RuntimeError> {
        Session::spawn(opts, listeners)
    }
}
