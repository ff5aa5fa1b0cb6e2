// zcl-scheduler/src/scheduler.rs
// ============================================================================
// Module: Attempt Scheduler
// Description: Semaphore-bounded, pacing-gated attempt launch scheduler.
// Purpose: Serve `acquire()` requests in FIFO order, capped at `maxInFlight`
//          concurrent holders and spaced by `minStartInterval`, reporting
//          wait time on a health channel.
// Dependencies: tokio, zcl-core, thiserror
// ============================================================================

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::Mutex;
use tokio::sync::Semaphore;
use tokio::sync::OwnedSemaphorePermit;
use tokio::sync::mpsc;
use tokio::time::Instant;
use zcl_core::Code;
use zcl_core::Timestamp;

use crate::cancel::CancelToken;

// ============================================================================
// SECTION: Clock
// ============================================================================

/// Produces the current [`Timestamp`] for a `scheduler_wait` health event.
///
/// Schedulers never read the wall clock directly; callers supply this so
/// the same scheduler logic is deterministically testable.
pub type ClockFn = Arc<dyn Fn() -> Timestamp + Send + Sync>;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Tuning parameters for a single strategy's scheduler.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Soft cap on concurrent holders for this strategy.
    pub max_in_flight: NonZeroUsize,
    /// Minimum wall-clock gap between two `acquire()` returns.
    pub min_start_interval: Duration,
}

impl SchedulerConfig {
    /// Builds a config with no pacing gate, capped at `max_in_flight`.
    #[must_use]
    pub const fn unpaced(max_in_flight: NonZeroUsize) -> Self {
        Self { max_in_flight, min_start_interval: Duration::ZERO }
    }
}

// ============================================================================
// SECTION: Wait Event
// ============================================================================

/// A `scheduler_wait` health event, emitted once per `acquire()` call that
/// actually had to wait for a permit or the pacing gate.
#[derive(Debug, Clone)]
pub struct SchedulerWaitEvent {
    /// Name of the strategy this scheduler instance serves.
    pub strategy: String,
    /// Total time spent waiting before the permit was granted.
    pub waited: Duration,
    /// Timestamp at which the wait resolved, from the caller-supplied clock.
    pub at: Timestamp,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Failure modes for [`Scheduler::acquire`].
#[derive(Debug, Error)]
pub enum AcquireError {
    /// The caller's [`CancelToken`] was cancelled before a permit was granted.
    #[error("acquire cancelled before a scheduler slot was available")]
    Cancelled,
}

impl AcquireError {
    /// Maps this error onto the stable reason-code taxonomy (§7).
    #[must_use]
    pub const fn code(&self) -> Code {
        match self {
            Self::Cancelled => Code::Timeout,
        }
    }
}

// ============================================================================
// SECTION: Permit
// ============================================================================

/// A held scheduler slot.
///
/// Dropping a permit releases it exactly like calling [`Permit::release`];
/// calling `release` more than once (or dropping after an explicit release)
/// is a no-op, satisfying the "idempotent per acquisition" requirement.
#[derive(Debug)]
pub struct Permit {
    inner: Option<OwnedSemaphorePermit>,
}

impl Permit {
    const fn holding(permit: OwnedSemaphorePermit) -> Self {
        Self { inner: Some(permit) }
    }

    /// Releases this permit back to the scheduler. Idempotent.
    pub fn release(&mut self) {
        self.inner = None;
    }
}

// ============================================================================
// SECTION: Scheduler
// ============================================================================

/// A per-strategy bounded scheduler.
pub struct Scheduler {
    strategy: String,
    semaphore: Arc<Semaphore>,
    min_start_interval: Duration,
    last_start: Arc<Mutex<Option<Instant>>>,
    wait_tx: mpsc::UnboundedSender<SchedulerWaitEvent>,
    clock: ClockFn,
}

impl Scheduler {
    /// Builds a scheduler for `strategy`, returning it alongside the receiver
    /// half of its `scheduler_wait` health channel.
    #[must_use]
    pub fn new(
        strategy: impl Into<String>,
        config: SchedulerConfig,
        clock: ClockFn,
    ) -> (Self, mpsc::UnboundedReceiver<SchedulerWaitEvent>) {
        let (wait_tx, wait_rx) = mpsc::unbounded_channel();
        let scheduler = Self {
            strategy: strategy.into(),
            semaphore: Arc::new(Semaphore::new(config.max_in_flight.get())),
            min_start_interval: config.min_start_interval,
            last_start: Arc::new(Mutex::new(None)),
            wait_tx,
            clock,
        };
        (scheduler, wait_rx)
    }

    /// Blocks until a slot is free and the pacing gate has elapsed, or
    /// `ctx` is cancelled first.
    ///
    /// # Errors
    ///
    /// Returns [`AcquireError::Cancelled`] if `ctx` is cancelled before a
    /// permit could be granted.
    pub async fn acquire(&self, ctx: &CancelToken) -> Result<Permit, AcquireError> {
        let wait_start = Instant::now();

        let permit = tokio::select! {
            biased;
            () = ctx.cancelled() => return Err(AcquireError::Cancelled),
            acquired = self.semaphore.clone().acquire_owned() => {
                // The semaphore is never closed, so acquiring a clone of the
                // `Arc` can only fail if `close()` was called, which this
                // type never does.
                match acquired {
                    Ok(permit) => permit,
                    Err(_closed) => return Err(AcquireError::Cancelled),
                }
            }
        };

        self.wait_for_pacing_gate(ctx).await?;

        let waited = wait_start.elapsed();
        if waited > Duration::ZERO {
            let _ignored = self.wait_tx.send(SchedulerWaitEvent {
                strategy: self.strategy.clone(),
                waited,
                at: (self.clock)(),
            });
        }

        Ok(Permit::holding(permit))
    }

    async fn wait_for_pacing_gate(&self, ctx: &CancelToken) -> Result<(), AcquireError> {
        if self.min_start_interval == Duration::ZERO {
            return Ok(());
        }

        let mut last_start = self.last_start.lock().await;
        let now = Instant::now();
        if let Some(previous) = *last_start {
            let elapsed = now.saturating_duration_since(previous);
            if elapsed < self.min_start_interval {
                let remaining = self.min_start_interval - elapsed;
                tokio::select! {
                    biased;
                    () = ctx.cancelled() => return Err(AcquireError::Cancelled),
                    () = tokio::time::sleep(remaining) => {}
                }
            }
        }
        *last_start = Some(Instant::now());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "test-only assertions")]

    use std::num::NonZeroUsize;
    use std::sync::Arc;
    use std::time::Duration;

    use zcl_core::Timestamp;

    use super::CancelToken;
    use super::Scheduler;
    use super::SchedulerConfig;

    fn fixed_clock() -> super::ClockFn {
        Arc::new(|| Timestamp::from_unix_millis(0))
    }

    #[tokio::test]
    async fn acquire_never_exceeds_max_in_flight() {
        let (scheduler, _wait_rx) = Scheduler::new(
            "codex",
            SchedulerConfig::unpaced(NonZeroUsize::new(1).expect("nonzero")),
            fixed_clock(),
        );
        let ctx = CancelToken::new();

        let first = scheduler.acquire(&ctx).await.expect("first acquire succeeds");
        let second = tokio::time::timeout(Duration::from_millis(30), scheduler.acquire(&ctx)).await;
        assert!(second.is_err(), "second acquire should block while the slot is held");

        drop(first);
        let third = scheduler.acquire(&ctx).await;
        assert!(third.is_ok(), "releasing the first permit frees the slot");
    }

    #[tokio::test]
    async fn acquire_is_cancellable_while_waiting() {
        let (scheduler, _wait_rx) = Scheduler::new(
            "codex",
            SchedulerConfig::unpaced(NonZeroUsize::new(1).expect("nonzero")),
            fixed_clock(),
        );
        let ctx = CancelToken::new();
        let _held = scheduler.acquire(&ctx).await.expect("first acquire succeeds");

        let ctx_clone = ctx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            ctx_clone.cancel();
        });

        let cancelled = tokio::time::timeout(Duration::from_millis(200), scheduler.acquire(&ctx)).await;
        assert!(matches!(cancelled, Ok(Err(super::AcquireError::Cancelled))));
    }

    #[tokio::test]
    async fn min_start_interval_spaces_out_acquisitions() {
        let (scheduler, _wait_rx) = Scheduler::new(
            "codex",
            SchedulerConfig {
                max_in_flight: NonZeroUsize::new(4).expect("nonzero"),
                min_start_interval: Duration::from_millis(40),
            },
            fixed_clock(),
        );
        let ctx = CancelToken::new();

        let start = tokio::time::Instant::now();
        drop(scheduler.acquire(&ctx).await.expect("first acquire succeeds"));
        drop(scheduler.acquire(&ctx).await.expect("second acquire succeeds"));
        assert!(start.elapsed() >= Duration::from_millis(40));
    }

    #[tokio::test]
    async fn a_permit_release_is_idempotent() {
        let (scheduler, _wait_rx) = Scheduler::new(
            "codex",
            SchedulerConfig::unpaced(NonZeroUsize::new(1).expect("nonzero")),
            fixed_clock(),
        );
        let ctx = CancelToken::new();
        let mut permit = scheduler.acquire(&ctx).await.expect("acquire succeeds");
        permit.release();
        permit.release();

        let reacquired =
            tokio::time::timeout(Duration::from_millis(50), scheduler.acquire(&ctx)).await;
        assert!(reacquired.is_ok());
    }

    #[tokio::test]
    async fn waiting_acquisitions_report_on_the_health_channel() {
        let (scheduler, mut wait_rx) = Scheduler::new(
            "codex",
            SchedulerConfig::unpaced(NonZeroUsize::new(1).expect("nonzero")),
            fixed_clock(),
        );
        let ctx = CancelToken::new();
        let held = scheduler.acquire(&ctx).await.expect("first acquire succeeds");

        let scheduler = Arc::new(scheduler);
        let scheduler_clone = Arc::clone(&scheduler);
        let waiter_ctx = ctx.clone();
        let waiter = tokio::spawn(async move { scheduler_clone.acquire(&waiter_ctx).await });

        tokio::time::sleep(Duration::from_millis(20)).await;
        drop(held);
        let _second = waiter.await.expect("task join").expect("second acquire succeeds");

        let event = wait_rx.recv().await.expect("a wait event was reported");
        assert_eq!(event.strategy, "codex");
        assert!(event.waited >= Duration::from_millis(15));
    }
}
