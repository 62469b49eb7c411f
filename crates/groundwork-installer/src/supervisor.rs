//! Attempt supervision
//!
//! One attempt is the whole create (or destroy) flow run end to end. The
//! supervisor races each attempt against a fixed deadline and feeds the
//! result into the whole-task retry loop, so a wedged cloud operation
//! costs one attempt instead of the entire run. The deadline is generous
//! on purpose: a healthy attempt finishes well under it, and anything
//! still going at the deadline is stuck, not slow.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use groundwork_common::{retry_task, Error, Result, RetryTaskConfig};

/// Upper bound for a single attempt
pub const ATTEMPT_TIMEOUT: Duration = Duration::from_secs(2400);

/// Attempts before the run fails
pub const MAX_ATTEMPTS: u32 = 3;

/// Delay between attempts
pub const RETRY_DELAY: Duration = Duration::from_secs(10);

/// Race one attempt against the deadline.
async fn bounded_attempt<Fut, T>(task_name: &str, attempt: Fut) -> Result<T>
where
    Fut: Future<Output = Result<T>>,
{
    tokio::select! {
        result = attempt => result,
        _ = tokio::time::sleep(ATTEMPT_TIMEOUT) => {
            warn!(task = %task_name, seconds = ATTEMPT_TIMEOUT.as_secs(), "attempt deadline reached");
            Err(Error::AttemptTimeout {
                seconds: ATTEMPT_TIMEOUT.as_secs(),
            })
        }
    }
}

/// Run `attempt` under the deadline, retrying the whole attempt on
/// failure. Every retry re-runs the full orchestration; the per-resource
/// loops make that idempotent.
pub async fn supervise<F, Fut, T>(task_name: &str, mut attempt: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let config = RetryTaskConfig {
        max_attempts: MAX_ATTEMPTS,
        delay: RETRY_DELAY,
    };
    retry_task(&config, task_name, || bounded_attempt(task_name, attempt())).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn hung_attempt_times_out_and_next_attempt_runs() {
        let count = Arc::new(AtomicU32::new(0));
        let c = count.clone();

        let result = supervise("create", || {
            let c = c.clone();
            async move {
                if c.fetch_add(1, Ordering::SeqCst) == 0 {
                    // First attempt hangs past the deadline.
                    tokio::time::sleep(Duration::from_secs(100_000)).await;
                }
                Ok("done")
            }
        })
        .await;

        assert_eq!(result.ok(), Some("done"));
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn all_attempts_timing_out_surfaces_timeout() {
        let result: Result<()> = supervise("create", || async {
            tokio::time::sleep(Duration::from_secs(100_000)).await;
            Ok(())
        })
        .await;

        assert!(matches!(result, Err(Error::AttemptTimeout { seconds: 2400 })));
    }

    #[tokio::test]
    async fn fast_success_passes_through() {
        let result = supervise("create", || async { Ok(11) }).await;
        assert_eq!(result.ok(), Some(11));
    }
}
