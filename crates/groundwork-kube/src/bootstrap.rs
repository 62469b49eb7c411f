//! Cluster bootstrap
//!
//! Minimal writes the installer performs directly before handing the
//! cluster to its controller: connectivity probe, system namespace, tenant
//! API token secret, and the provider auth ConfigMap on EKS.

use std::collections::BTreeMap;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::{ConfigMap, Namespace, Secret};
use kube::api::{ListParams, Patch, PatchParams, PostParams};
use kube::{Api, Client};
use tracing::info;

use groundwork_common::Result;

#[cfg(test)]
use mockall::automock;

/// Namespace owned by the installer and controller
pub const SYSTEM_NAMESPACE: &str = "groundwork-system";

/// Name of the tenant API token secret
pub const TENANT_TOKEN_SECRET: &str = "tenant-api-tokens";

/// Field manager used for server-side apply
const FIELD_MANAGER: &str = "groundwork-installer";

/// Kubernetes write seam, mockable in tests
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ClusterAccess: Send + Sync {
    /// Cheap list call proving the API server is reachable and authorized
    async fn probe(&self) -> Result<()>;
    async fn ensure_namespace(&self, name: &str) -> Result<()>;
    async fn apply_config_map(
        &self,
        namespace: &str,
        name: &str,
        data: BTreeMap<String, String>,
    ) -> Result<()>;
    /// Create-if-absent; an existing secret is left untouched so tokens
    /// survive re-runs
    async fn create_secret_if_absent(
        &self,
        namespace: &str,
        name: &str,
        data: BTreeMap<String, String>,
    ) -> Result<()>;
}

/// Real implementation over a kube client
pub struct KubeClusterAccess {
    pub client: Client,
}

#[async_trait]
impl ClusterAccess for KubeClusterAccess {
    async fn probe(&self) -> Result<()> {
        let api: Api<Namespace> = Api::all(self.client.clone());
        api.list(&ListParams::default().limit(1)).await?;
        Ok(())
    }

    async fn ensure_namespace(&self, name: &str) -> Result<()> {
        let api: Api<Namespace> = Api::all(self.client.clone());
        let ns = Namespace {
            metadata: kube::api::ObjectMeta {
                name: Some(name.to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        match api.create(&PostParams::default(), &ns).await {
            Ok(_) => Ok(()),
            Err(kube::Error::Api(ae)) if ae.code == 409 => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn apply_config_map(
        &self,
        namespace: &str,
        name: &str,
        data: BTreeMap<String, String>,
    ) -> Result<()> {
        let api: Api<ConfigMap> = Api::namespaced(self.client.clone(), namespace);
        let cm = ConfigMap {
            metadata: kube::api::ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some(namespace.to_string()),
                ..Default::default()
            },
            data: Some(data),
            ..Default::default()
        };
        api.patch(
            name,
            &PatchParams::apply(FIELD_MANAGER).force(),
            &Patch::Apply(&cm),
        )
        .await?;
        Ok(())
    }

    async fn create_secret_if_absent(
        &self,
        namespace: &str,
        name: &str,
        data: BTreeMap<String, String>,
    ) -> Result<()> {
        let api: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
        let secret = Secret {
            metadata: kube::api::ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some(namespace.to_string()),
                ..Default::default()
            },
            string_data: Some(data),
            ..Default::default()
        };
        match api.create(&PostParams::default(), &secret).await {
            Ok(_) => Ok(()),
            Err(kube::Error::Api(ae)) if ae.code == 409 => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Probe the API server, then create the system namespace and the tenant
/// token secret.
pub async fn bootstrap_cluster(
    access: &dyn ClusterAccess,
    tenant_tokens: BTreeMap<String, String>,
) -> Result<()> {
    access.probe().await?;
    access.ensure_namespace(SYSTEM_NAMESPACE).await?;
    access
        .create_secret_if_absent(SYSTEM_NAMESPACE, TENANT_TOKEN_SECRET, tenant_tokens)
        .await?;
    info!(namespace = SYSTEM_NAMESPACE, "cluster bootstrap complete");
    Ok(())
}
