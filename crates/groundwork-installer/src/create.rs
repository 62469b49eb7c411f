//! Cluster creation and teardown entry points
//!
//! Validation happens once, before any cloud call. Tenant tokens are also
//! generated once, outside the retry loop, so a retried attempt hands the
//! same tokens to the cluster instead of rotating them. Everything after
//! that point is idempotent and runs under the attempt supervisor.

use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;
use rand::distributions::Alphanumeric;
use rand::Rng;
use tracing::{info, warn};

use groundwork_common::{ClusterConfig, Result};

use crate::result::ClusterInfraResult;
use crate::supervisor::supervise;

#[cfg(test)]
use mockall::automock;

/// Length of a generated tenant API token
const TENANT_TOKEN_LENGTH: usize = 48;

/// Tenant always present alongside the user-declared ones
const SYSTEM_TENANT: &str = "system";

/// Provider-specific half of cluster creation
///
/// `ensure_infra` provisions everything up to a reachable Kubernetes API;
/// `finalize` performs the in-cluster work and waits for convergence.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ClusterPlatform: Send + Sync {
    async fn ensure_infra(&self, cfg: &ClusterConfig) -> Result<ClusterInfraResult>;
    async fn finalize(
        &self,
        cfg: &ClusterConfig,
        infra: &ClusterInfraResult,
        tenant_tokens: BTreeMap<String, String>,
    ) -> Result<()>;
    async fn destroy_infra(&self, cfg: &ClusterConfig) -> Result<()>;
}

fn random_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TENANT_TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

/// One token per tenant, plus the system tenant
fn generate_tenant_tokens(cfg: &ClusterConfig) -> BTreeMap<String, String> {
    let mut tokens = BTreeMap::new();
    tokens.insert(SYSTEM_TENANT.to_string(), random_token());
    for tenant in &cfg.tenants {
        tokens
            .entry(tenant.clone())
            .or_insert_with(random_token);
    }
    tokens
}

/// Persist the kubeconfig for the operator. Failure here is logged but
/// never fails the run; the cluster is already up.
fn write_kubeconfig(path: &Path, kubeconfig: &str) {
    match std::fs::write(path, kubeconfig) {
        Ok(()) => info!(path = %path.display(), "kubeconfig written"),
        Err(e) => warn!(path = %path.display(), error = %e, "could not write kubeconfig"),
    }
}

/// Create the cluster end to end and wait until it has converged.
pub async fn create_cluster(
    cfg: &ClusterConfig,
    platform: &dyn ClusterPlatform,
    kubeconfig_path: Option<&Path>,
) -> Result<ClusterInfraResult> {
    cfg.validate()?;
    let tokens = generate_tenant_tokens(cfg);

    info!(
        cluster = %cfg.cluster_name,
        provider = cfg.cloud_provider.as_str(),
        "starting cluster creation"
    );

    let infra = supervise("cluster creation", || {
        let tokens = tokens.clone();
        async move {
            let infra = platform.ensure_infra(cfg).await?;
            if let Some(path) = kubeconfig_path {
                write_kubeconfig(path, &infra.kubeconfig);
            }
            platform.finalize(cfg, &infra, tokens).await?;
            Ok(infra)
        }
    })
    .await?;

    info!(cluster = %cfg.cluster_name, "cluster creation complete");
    Ok(infra)
}

/// Tear the cluster down.
pub async fn destroy_cluster(cfg: &ClusterConfig, platform: &dyn ClusterPlatform) -> Result<()> {
    cfg.validate()?;

    info!(
        cluster = %cfg.cluster_name,
        provider = cfg.cloud_provider.as_str(),
        "starting cluster teardown"
    );
    supervise("cluster teardown", || platform.destroy_infra(cfg)).await?;
    info!(cluster = %cfg.cluster_name, "cluster teardown complete");
    Ok(())
}
