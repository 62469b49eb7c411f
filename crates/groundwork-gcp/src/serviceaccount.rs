//! Per-component service accounts with workload identity
//!
//! Each in-cluster component that talks to a GCP API gets its own service
//! account, role grants, and a workload-identity binding to its Kubernetes
//! service account. Grants and bindings are idempotent at the seam and are
//! replayed on every run.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use groundwork_cloud::{ensure_exists, CloudResource, CreateOutcome, DeleteOutcome, Observation};
use groundwork_common::Result;

use crate::api::{GcpIamApi, ServiceAccountDesc};

/// One component's cloud identity
pub struct ComponentAccount {
    pub api: Arc<dyn GcpIamApi>,
    /// Account id, e.g. `<cluster>-cert-manager`
    pub account_id: String,
    /// Roles granted on the project
    pub roles: Vec<String>,
    /// Kubernetes service account bound via workload identity
    pub namespace: String,
    pub ksa_name: String,
}

#[async_trait]
impl CloudResource for ComponentAccount {
    type Output = ServiceAccountDesc;

    fn name(&self) -> &str {
        &self.account_id
    }

    fn poll_interval(&self) -> Duration {
        Duration::from_secs(1)
    }

    async fn observe(&self) -> Result<Observation<ServiceAccountDesc>> {
        match self.api.find_service_account(&self.account_id).await? {
            Some(account) => Ok(Observation::Ready(account)),
            None => Ok(Observation::Absent),
        }
    }

    async fn create(&self) -> Result<CreateOutcome> {
        self.api.create_service_account(&self.account_id).await
    }

    async fn delete(&self) -> Result<DeleteOutcome> {
        match self.api.find_service_account(&self.account_id).await? {
            Some(account) => self.api.delete_service_account(&account.email).await,
            None => Ok(DeleteOutcome::NotFound),
        }
    }
}

/// Ensure the account exists, then replay grants and the binding.
pub async fn ensure_component_account(account: &ComponentAccount) -> Result<ServiceAccountDesc> {
    let desc = ensure_exists(account).await?;
    for role in &account.roles {
        account.api.grant_role(&desc.email, role).await?;
    }
    account
        .api
        .bind_workload_identity(&desc.email, &account.namespace, &account.ksa_name)
        .await?;
    Ok(desc)
}
