// zcl-cli/src/native_dispatch.rs
// ============================================================================
// Module: CLI Native Dispatch Resolver
// Description: The `zcl_campaign::NativeDispatchResolver` implementation
//              backing `campaign run`/`canary`/`resume` (§4.D, §4.J).
// Purpose: Own the one runtime-factory / per-flow-scheduler table the
//          Campaign Engine itself never builds, and stamp a fresh
//          `SessionOptions` for every native-spawn attempt.
// Dependencies: zcl-campaign, zcl-core, zcl-runtime, zcl-scheduler
// ============================================================================

//! ## Overview
//! Only one native strategy exists today ([`crate::runtime_factory::SpawnFactory::codex_app_server`]),
//! so the resolved chain is always the single-element
//! `[codex_app_server]`. A flow only gets a native dispatch when its
//! `runner = codex_app_server`; every other runner type is process-mode and
//! this resolver returns `None` for it, which the engine only reaches when
//! such a flow was misconfigured with `isolation = native_spawn`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::time::Duration;

use zcl_campaign::NativeDispatchContext;
use zcl_campaign::NativeDispatchResolver;
use zcl_core::ids::FlowId;
use zcl_core::model::Flow;
use zcl_core::model::RunnerType;
use zcl_runner::OperatorWriter;
use zcl_runner::suite::NativeDispatch;
use zcl_runtime::RuntimeRegistry;
use zcl_runtime::SessionOptions;
use zcl_scheduler::Scheduler;
use zcl_scheduler::SchedulerConfig;

use crate::operator;
use crate::runtime_factory::CODEX_APP_SERVER_STRATEGY;
use crate::runtime_factory::SpawnFactory;

/// Grace period given to a native peer to acknowledge `turn/interrupt` on
/// session close. Not presently configurable per flow; §4.D leaves the
/// value to the host.
const DEFAULT_CLOSE_GRACE: Duration = Duration::from_secs(5);

/// Model env-var conventions a flow may carry, since [`Flow`] has no
/// dedicated model field (model selection is a native-runtime concern, not
/// a cross-runner one).
const MODEL_ENV_KEY: &str = "ZCL_MODEL";
/// See [`MODEL_ENV_KEY`].
const MODEL_REASONING_EFFORT_ENV_KEY: &str = "ZCL_MODEL_REASONING_EFFORT";
/// See [`MODEL_ENV_KEY`].
const MODEL_REASONING_POLICY_ENV_KEY: &str = "ZCL_MODEL_REASONING_POLICY";
/// Fallback model id when a flow declares none.
const DEFAULT_MODEL: &str = "default";

/// Capabilities every native-spawn attempt requires of its resolved
/// strategy, regardless of which flow it came from.
const REQUIRED_CAPABILITIES: [zcl_runtime::Capability; 3] =
    [zcl_runtime::Capability::ThreadStart, zcl_runtime::Capability::EventStream, zcl_runtime::Capability::ToolCall];

/// Resolves native-spawn dispatch for every `runner = codex_app_server`
/// flow in one campaign, against a registry holding exactly one strategy.
pub struct CliNativeDispatchResolver {
    registry: RuntimeRegistry,
    chain: Vec<String>,
    command: Vec<String>,
    schedulers: BTreeMap<FlowId, Scheduler>,
    request_timeout: Duration,
    clock: zcl_runtime::ClockFn,
}

impl CliNativeDispatchResolver {
    /// Builds a resolver for `flows`, spawning one [`Scheduler`] per flow
    /// whose `runner = codex_app_server`, and draining each scheduler's
    /// `scheduler_wait` health channel onto `operator_err` for the campaign's
    /// lifetime.
    ///
    /// `command` is the argv used to spawn the Codex app-server peer,
    /// sourced from `ZCL_CODEX_APP_SERVER_CMD` by the caller.
    #[must_use]
    pub fn new(
        flows: &[Flow],
        command: Vec<String>,
        request_timeout: Duration,
        clock: zcl_runtime::ClockFn,
        operator_err: OperatorWriter,
    ) -> Self {
        let mut registry = RuntimeRegistry::new();
        registry.register(Box::new(SpawnFactory::codex_app_server()));

        let mut schedulers = BTreeMap::new();
        for flow in flows {
            if flow.runner != RunnerType::CodexAppServer {
                continue;
            }
            let max_in_flight =
                NonZeroUsize::new(flow.max_in_flight.unwrap_or(1) as usize).unwrap_or(NonZeroUsize::MIN);
            let min_start_interval = Duration::from_millis(flow.min_start_interval_ms.unwrap_or(0));
            let config = SchedulerConfig { max_in_flight, min_start_interval };
            let scheduler_clock: zcl_scheduler::ClockFn = clock.clone();
            let (scheduler, mut wait_rx) = Scheduler::new(flow.flow_id.as_str(), config, scheduler_clock);
            let sink = operator_err.clone();
            let strategy_label = flow.flow_id.as_str().to_string();
            tokio::spawn(async move {
                while let Some(event) = wait_rx.recv().await {
                    let line = format!(
                        "scheduler_wait flow={strategy_label} strategy={} waited_ms={}",
                        event.strategy,
                        event.waited.as_millis()
                    );
                    let _ = operator::write_line(&sink, &line);
                }
            });
            schedulers.insert(flow.flow_id.clone(), scheduler);
        }

        Self {
            registry,
            chain: vec![CODEX_APP_SERVER_STRATEGY.to_string()],
            command,
            schedulers,
            request_timeout,
            clock,
        }
    }
}

impl NativeDispatchResolver for CliNativeDispatchResolver {
    fn resolve(&self, ctx: &NativeDispatchContext<'_>) -> Option<NativeDispatch<'_>> {
        if ctx.flow.runner != RunnerType::CodexAppServer {
            return None;
        }
        let scheduler = self.schedulers.get(&ctx.flow.flow_id)?;
        let factory = self.registry.resolve(&self.chain, &REQUIRED_CAPABILITIES).ok()?;

        let model = ctx.flow.env.get(MODEL_ENV_KEY).cloned().unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let model_reasoning_effort = ctx.flow.env.get(MODEL_REASONING_EFFORT_ENV_KEY).cloned();
        let model_reasoning_policy = ctx.flow.env.get(MODEL_REASONING_POLICY_ENV_KEY).cloned();

        let session_options = SessionOptions {
            command: self.command.clone(),
            cwd: ctx.attempt_dir.to_string_lossy().into_owned(),
            model,
            model_reasoning_effort,
            model_reasoning_policy,
            run_id: ctx.run_id.clone(),
            suite_id: ctx.suite_id.clone(),
            mission_id: ctx.mission_id.clone(),
            attempt_id: ctx.attempt_id.clone(),
            agent_id: ctx.agent_id.clone(),
            request_timeout: self.request_timeout,
            clock: self.clock.clone(),
        };

        Some(NativeDispatch { factory, session_options, scheduler, close_grace: DEFAULT_CLOSE_GRACE })
    }
}
