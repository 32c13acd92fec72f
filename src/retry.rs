//! Retry controller for session-key-store operations.
//!
//! Session store writes touch cryptographic ratchet state, so ad hoc retry
//! loops at call sites are dangerous; every caller goes through
//! [`SessionStoreRetry`] instead and shares identical semantics. The
//! controller is a single-step decision oracle: it classifies the most recent
//! failure, sleeps, and tells the caller whether to re-invoke. How many
//! attempts are tolerable is caller policy - different session operations
//! have different ceilings - so no cap is enforced here.

use crate::error::{RetryDecision, StoreError, classify};
use crate::pool::StoreHandle;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, warn};

/// Linear backoff: `wait(n) = 2n` seconds. Retries here are rare
/// infrastructure blips rather than congestion, so the pacing stays gentle
/// and `wait(0)` is an immediate retry.
pub fn backoff(attempt_index: u32) -> Duration {
    Duration::from_secs(u64::from(attempt_index) * 2)
}

/// Decision oracle wrapping session-store operations.
#[derive(Debug, Clone)]
pub struct SessionStoreRetry {
    handle: Arc<StoreHandle>,
}

impl SessionStoreRetry {
    pub fn new(handle: Arc<StoreHandle>) -> Self {
        Self { handle }
    }

    /// Handle a failure from one attempt of a session-store operation.
    ///
    /// Returns `true` after sleeping the backoff if the caller should retry,
    /// `false` if the caller must surface the error. The embedded dialect is
    /// checked first and never retries: there is no network hop, so the
    /// failure is assumed permanent for this operation. The sleep suspends
    /// only the calling task; once entered it always completes.
    pub async fn handle_error(
        &self,
        device_id: &str,
        action: &str,
        attempt_index: u32,
        err: &StoreError,
    ) -> bool {
        if !self.handle.dialect().is_embedded() && classify(err) == RetryDecision::Retry {
            let wait = backoff(attempt_index);
            warn!(
                device = device_id,
                action,
                attempt = attempt_index + 1,
                wait_secs = wait.as_secs(),
                error = %err,
                "Transient session store failure, retrying"
            );
            tokio::time::sleep(wait).await;
            return true;
        }
        error!(
            device = device_id,
            action,
            error = %err,
            "Session store operation failed"
        );
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_is_linear_and_starts_at_zero() {
        assert_eq!(backoff(0), Duration::ZERO);
        assert_eq!(backoff(1), Duration::from_secs(2));
        assert_eq!(backoff(2), Duration::from_secs(4));
        assert_eq!(backoff(5), Duration::from_secs(10));
    }

    #[test]
    fn test_backoff_monotone() {
        let mut last = Duration::ZERO;
        for attempt in 0..10 {
            let wait = backoff(attempt);
            assert!(wait >= last);
            last = wait;
        }
    }
}
