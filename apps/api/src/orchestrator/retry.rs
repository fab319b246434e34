use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::warn;

use super::error::SubmissionError;
use super::events::SubmissionObserver;
use super::{SubmissionOrchestrator, SubmissionRequest};
use crate::protocol::RankedCandidate;

/// Caller-level retry for submissions that failed because the backend was unavailable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Zero behaves like one.
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
        }
    }

    /// Delay before retry number `retry` (1-based): base, 2x base, 4x base...
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(1u32 << exponent)
    }
}

/// Runs `submit` until it succeeds, fails with a non-retryable error, or the
/// attempts run out. Every attempt reports its own events to `observer`.
pub async fn submit_with_retry(
    orchestrator: &SubmissionOrchestrator,
    request: &SubmissionRequest,
    observer: &dyn SubmissionObserver,
    cancel: &CancellationToken,
    policy: RetryPolicy,
) -> Result<Vec<RankedCandidate>, SubmissionError> {
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match orchestrator.submit(request, observer, cancel).await {
            Err(e) if e.is_retryable() && attempt < max_attempts => {
                let delay = policy.delay_for(attempt);
                warn!(
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Backend unavailable, retrying"
                );

                tokio::select! {
                    _ = cancel.cancelled() => return Err(SubmissionError::Cancelled),
                    _ = tokio::time::sleep(delay) => {}
                }
                attempt += 1;
            }
            outcome => return outcome,
        }
    }
}
