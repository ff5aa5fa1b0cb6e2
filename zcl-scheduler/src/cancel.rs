// zcl-scheduler/src/cancel.rs
// ============================================================================
// Module: Cancellation Token
// Description: A cooperative cancellation signal shared between a caller and
//              a pending `acquire()`.
// Purpose: Let the Suite Runner abandon a queued acquisition (attempt
//          deadline elapsed, campaign shutting down) without tearing down
//          the scheduler itself.
// Dependencies: tokio::sync::watch
// ============================================================================

use tokio::sync::watch;

/// A cancellation signal that can be shared across clones and observed
/// without consuming it.
///
/// # Invariants
/// - Once [`CancelToken::cancel`] is called, every clone observes the
///   cancellation; the signal never resets.
#[derive(Debug, Clone)]
pub struct CancelToken {
    tx: watch::Sender<bool>,
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    /// Creates a fresh, uncancelled token.
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self { tx, rx }
    }

    /// Marks this token, and every clone of it, as cancelled.
    pub fn cancel(&self) {
        let _ignored = self.tx.send(true);
    }

    /// Returns whether this token has already been cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once this token is cancelled.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        if *rx.borrow() {
            return;
        }
        // The sender is held by every clone of this token, never dropped
        // independently, so `changed()` only errors if all senders (and thus
        // all tokens) were already dropped, which makes cancellation moot.
        let _ignored = rx.wait_for(|cancelled| *cancelled).await;
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::CancelToken;

    #[tokio::test]
    async fn cancelling_a_clone_is_observed_by_the_original() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!token.is_cancelled());
        clone.cancel();
        assert!(token.is_cancelled());
        token.cancelled().await;
    }

    #[tokio::test]
    async fn an_uncancelled_token_never_resolves_cancelled_immediately() {
        let token = CancelToken::new();
        let waited = tokio::time::timeout(std::time::Duration::from_millis(20), token.cancelled()).await;
        assert!(waited.is_err());
    }
}
