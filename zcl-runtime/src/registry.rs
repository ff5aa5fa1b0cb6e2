// zcl-runtime/src/registry.rs
// ============================================================================
// Module: Native Runtime Registry & Resolver
// Description: Strategy registration and capability-based resolution (§4.D).
// Purpose: Select a runtime strategy supporting every required capability,
//          with deterministic fallback across a preference chain.
// Dependencies: zcl-core, crate::capability, crate::error, crate::session
// ============================================================================

//! ## Overview
//! Resolution is pure: it inspects each candidate's advertised
//! [`Capability`] set and never spawns a process or opens a socket. Session
//! startup (spawning the peer) happens later, through [`RuntimeFactory::start_session`],
//! invoked by the Suite Runner once resolution has picked a strategy.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use std::sync::Arc;

use crate::capability::Capability;
use crate::error::RuntimeError;
use crate::error::StrategyFailure;
use crate::session::Session;
use crate::session::SessionListener;
use crate::session::SessionOptions;

// ============================================================================
// SECTION: Runtime Factory
// ============================================================================

/// A registered native runtime strategy.
pub trait RuntimeFactory: Send + Sync {
    /// The strategy id this factory is registered under (e.g. `codex_app_server`).
    fn id(&self) -> &str;

    /// The capabilities this strategy advertises.
    fn capabilities(&self) -> &[Capability];

    /// Starts a new session for this strategy, registering `listeners` to
    /// receive every notification the peer emits.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::Spawn`] if the underlying peer process cannot
    /// be started.
    fn start_session(
        &self,
        opts: &SessionOptions,
        listeners: Vec<Arc<dyn SessionListener>>,
    ) -> Result<Session, RuntimeError>;
}

// ============================================================================
// SECTION: Registry
// ============================================================================

/// Holds registered runtime factories keyed by strategy id.
#[derive(Default)]
pub struct RuntimeRegistry {
    /// Registered factories, keyed by strategy id.
    factories: BTreeMap<String, Box<dyn RuntimeFactory>>,
}

impl RuntimeRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self { factories: BTreeMap::new() }
    }

    /// Registers a runtime factory, keyed by its own `id()`.
    pub fn register(&mut self, factory: Box<dyn RuntimeFactory>) {
        self.factories.insert(factory.id().to_string(), factory);
    }

    /// Resolves the first strategy in `chain` that supports every capability
    /// in `required`.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::StrategyUnavailable`] carrying one
    /// [`StrategyFailure`] per candidate in `chain` when none qualifies.
    pub fn resolve(
        &self,
        chain: &[String],
        required: &[Capability],
    ) -> Result<&dyn RuntimeFactory, RuntimeError> {
        let mut failures = Vec::with_capacity(chain.len());
        for strategy_id in chain {
            let Some(factory) = self.factories.get(strategy_id) else {
                failures.push(StrategyFailure {
                    strategy: strategy_id.clone(),
                    code: zcl_core::Code::CapabilityUnsupported,
                    message: format!("no runtime registered for strategy id {strategy_id:?}"),
                });
                continue;
            };
            let missing: Vec<Capability> = required
                .iter()
                .copied()
                .filter(|capability| !factory.capabilities().contains(capability))
                .collect();
            if missing.is_empty() {
                return Ok(factory.as_ref());
            }
            let missing_list =
                missing.iter().map(Capability::to_string).collect::<Vec<_>>().join(", ");
            failures.push(StrategyFailure {
                strategy: strategy_id.clone(),
                code: zcl_core::Code::CapabilityUnsupported,
                message: format!("missing required capabilities: {missing_list}"),
            });
        }
        Err(RuntimeError::StrategyUnavailable(failures))
    }
}
