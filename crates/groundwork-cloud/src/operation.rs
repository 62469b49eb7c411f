//! Long-running operation polling
//!
//! Some provider mutations (service-networking VPC peering) return an
//! operation handle instead of a resource. [`follow_operation`] polls the
//! handle until the provider reports a terminal payload. There is no
//! timeout here; callers race the whole attempt against a deadline.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info};

use groundwork_common::{Error, Result};

#[cfg(test)]
use mockall::automock;

/// Interval between operation polls
pub const OPERATION_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// One poll of a long-running operation
///
/// Terminal-state detection follows the provider payload shape: an `error`
/// field wins over any `response` field, a `response` field alone means
/// success, and neither means the operation is still running.
#[derive(Debug, Clone, Default)]
pub struct OperationPoll {
    pub error: Option<OperationError>,
    pub response: Option<Value>,
}

/// Error payload of a failed operation
#[derive(Debug, Clone)]
pub struct OperationError {
    pub message: String,
}

impl OperationPoll {
    pub fn running() -> Self {
        Self::default()
    }

    pub fn succeeded(response: Value) -> Self {
        Self {
            error: None,
            response: Some(response),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            error: Some(OperationError {
                message: message.into(),
            }),
            response: None,
        }
    }
}

/// Provider seam for fetching operation state
#[cfg_attr(test, automock)]
#[async_trait]
pub trait OperationApi: Send + Sync {
    async fn get_operation(&self, handle: &str) -> Result<OperationPoll>;
}

/// Poll `handle` until it reaches a terminal state.
///
/// Returns the success payload, or [`Error::OperationFailed`] when the
/// provider reports an error payload. Owners of the operation react to the
/// permanent failure by restarting their create sequence from scratch.
pub async fn follow_operation(api: &dyn OperationApi, handle: &str) -> Result<Value> {
    loop {
        let poll = api.get_operation(handle).await?;

        if let Some(err) = poll.error {
            return Err(Error::operation_failed(handle, err.message));
        }
        if let Some(response) = poll.response {
            info!(operation = %handle, "operation succeeded");
            return Ok(response);
        }

        debug!(operation = %handle, "operation still running");
        tokio::time::sleep(OPERATION_POLL_INTERVAL).await;
    }
}
