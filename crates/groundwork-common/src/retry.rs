//! Whole-task retry
//!
//! Cluster creation is retried as a unit: every attempt re-runs the full
//! orchestration against whatever infrastructure already exists, relying on
//! the per-resource loops being idempotent. Unlike per-call backoff, the
//! delay here is fixed; attempts are minutes long and a ramp adds nothing.

use std::future::Future;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::error::{Error, Result};

/// Configuration for retrying a long-running task as a whole
#[derive(Clone, Debug)]
pub struct RetryTaskConfig {
    /// Maximum number of attempts before the last error is surfaced
    pub max_attempts: u32,
    /// Fixed delay between attempts
    pub delay: Duration,
}

impl Default for RetryTaskConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(10),
        }
    }
}

/// Run `task` until it succeeds or `max_attempts` attempts have failed.
///
/// Errors flagged quiet (attempt timeouts) are logged without detail; the
/// attempt counter alone tells the story for those.
pub async fn retry_task<F, Fut, T>(
    config: &RetryTaskConfig,
    task_name: &str,
    mut task: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0u32;

    loop {
        attempt += 1;
        info!(task = %task_name, attempt, max_attempts = config.max_attempts, "starting attempt");

        match task().await {
            Ok(result) => return Ok(result),
            Err(e) => {
                if attempt >= config.max_attempts {
                    error!(
                        task = %task_name,
                        attempt,
                        error = %e,
                        "task failed after max attempts"
                    );
                    return Err(e);
                }

                if e.is_quiet() {
                    warn!(task = %task_name, attempt, "attempt failed, retrying");
                } else {
                    warn!(task = %task_name, attempt, error = %e, "attempt failed, retrying");
                }

                tokio::time::sleep(config.delay).await;
            }
        }
    }
}
