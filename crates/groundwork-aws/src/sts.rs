//! Credential preflight
//!
//! One cheap STS call up front turns bad credentials into a clear error
//! before any resource is touched.

use tracing::info;

use groundwork_common::{Error, Result};

use crate::api::StsApi;

/// Verify credentials work and return the caller's account id.
pub async fn preflight_account_id(api: &dyn StsApi) -> Result<String> {
    let account_id = api.get_account_id().await.map_err(|e| {
        Error::api_permanent("aws", "sts", format!("credential preflight failed: {e}"))
    })?;
    info!(account_id = %account_id, "AWS credential preflight passed");
    Ok(account_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockStsApi;

    #[tokio::test]
    async fn returns_account_id() {
        let mut api = MockStsApi::new();
        api.expect_get_account_id()
            .returning(|| Ok("123456789012".to_string()));
        assert_eq!(preflight_account_id(&api).await.unwrap(), "123456789012");
    }

    #[tokio::test]
    async fn failure_is_permanent() {
        let mut api = MockStsApi::new();
        api.expect_get_account_id()
            .returning(|| Err(Error::api("aws", "sts", "expired token")));
        let err = preflight_account_id(&api).await.unwrap_err();
        assert!(!err.is_retryable());
    }
}
