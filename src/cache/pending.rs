//! In-flight render handle.
//!
//! One `PendingRender` exists per track while its render runs. The owner
//! publishes the outcome once; every waiter, including ones that subscribe
//! after publication, observes that same outcome.

use bytes::Bytes;
use tokio::sync::watch;

use crate::error::{PreviewError, Result};

/// Result of one render attempt, shared by all callers of that attempt.
pub type RenderOutcome = Result<Bytes>;

/// Completion signal for a render in progress.
pub struct PendingRender {
    outcome: watch::Sender<Option<RenderOutcome>>,
}

impl PendingRender {
    pub fn new() -> Self {
        let (outcome, _) = watch::channel(None);
        Self { outcome }
    }

    /// Publishes the outcome and wakes all waiters.
    pub fn complete(&self, outcome: RenderOutcome) {
        self.outcome.send_replace(Some(outcome));
    }

    /// Returns true once an outcome has been published.
    pub fn is_complete(&self) -> bool {
        self.outcome.borrow().is_some()
    }

    /// Suspends until the outcome is published.
    pub async fn wait(&self) -> RenderOutcome {
        let mut receiver = self.outcome.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait.
        let outcome = match receiver.wait_for(Option::is_some).await {
            Ok(outcome) => outcome
                .clone()
                .unwrap_or_else(|| Err(PreviewError::internal("render finished without outcome"))),
            Err(_) => Err(PreviewError::internal("render abandoned")),
        };
        outcome
    }
}

impl Default for PendingRender {
    fn default() -> Self {
        Self::new()
    }
}
