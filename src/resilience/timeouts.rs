//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap each upstream attempt with the per-attempt deadline
//! - Cancel the attempt future cleanly on timeout
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities (respects a paused test clock)
//! - Timeout errors are distinct from transport errors

use std::future::Future;
use std::time::Duration;

use crate::resilience::error::AttemptError;

/// Run `attempt`, failing with [`AttemptError::Timeout`] once `limit` elapses.
pub async fn with_timeout<T, F>(limit: Duration, attempt: F) -> Result<T, AttemptError>
where
    F: Future<Output = Result<T, AttemptError>>,
{
    match tokio::time::timeout(limit, attempt).await {
        Ok(result) => result,
        Err(_) => Err(AttemptError::Timeout(limit)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_pending_attempt_times_out() {
        let result: Result<(), _> =
            with_timeout(Duration::from_millis(500), std::future::pending()).await;
        assert!(matches!(result, Err(AttemptError::Timeout(d)) if d == Duration::from_millis(500)));
    }

    #[tokio::test]
    async fn test_fast_attempt_passes_through() {
        let ok = with_timeout(Duration::from_secs(1), async { Ok::<_, AttemptError>(7) }).await;
        assert_eq!(ok.unwrap(), 7);

        let err = with_timeout(Duration::from_secs(1), async {
            Err::<(), _>(AttemptError::UpstreamFault { status: 503 })
        })
        .await;
        assert!(matches!(err, Err(AttemptError::UpstreamFault { status: 503 })));
    }
}
