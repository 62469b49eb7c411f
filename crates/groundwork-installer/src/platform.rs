//! Real provider platforms
//!
//! Glue between the orchestration graphs and the in-cluster finish line:
//! build a client from the rendered kubeconfig, bootstrap, install the
//! controller, then watch the cluster until everything it deploys has
//! converged.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::{Container, PodSpec, PodTemplateSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;
use kube::api::{ObjectMeta, Patch, PatchParams};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Api, Client, Config};
use tokio::sync::mpsc;
use tracing::info;

use groundwork_aws::auth::map_roles_document;
use groundwork_common::{ClusterConfig, Error, Result};
use groundwork_kube::feed::spawn_watch_feed;
use groundwork_kube::snapshot::spawn_reducer;
use groundwork_kube::{
    bootstrap_cluster, wait_for_controller_deployment, wait_for_convergence, ClusterAccess,
    KubeClusterAccess, KubeCertificateOps, CONTROLLER_DEPLOYMENT, SYSTEM_NAMESPACE,
};

use crate::aws::{self, AwsApis};
use crate::create::ClusterPlatform;
use crate::gcp::{self, GcpApis};
use crate::result::ClusterInfraResult;

const FIELD_MANAGER: &str = "groundwork-installer";

/// Buffer between the watch feed and the reducer
const WATCH_CHANNEL_CAPACITY: usize = 256;

async fn client_from_kubeconfig(kubeconfig: &str) -> Result<Client> {
    let kc = Kubeconfig::from_yaml(kubeconfig)
        .map_err(|e| Error::serialization(format!("kubeconfig parse failed: {e}")))?;
    let config = Config::from_custom_kubeconfig(kc, &KubeConfigOptions::default())
        .await
        .map_err(|e| Error::serialization(format!("kubeconfig load failed: {e}")))?;
    Ok(Client::try_from(config)?)
}

/// Server-side apply of the controller Deployment.
async fn apply_controller_deployment(client: &Client, cfg: &ClusterConfig) -> Result<()> {
    let labels: BTreeMap<String, String> =
        [("app".to_string(), CONTROLLER_DEPLOYMENT.to_string())].into();
    let deployment = Deployment {
        metadata: ObjectMeta {
            name: Some(CONTROLLER_DEPLOYMENT.to_string()),
            namespace: Some(SYSTEM_NAMESPACE.to_string()),
            labels: Some(labels.clone()),
            ..Default::default()
        },
        spec: Some(DeploymentSpec {
            replicas: Some(1),
            selector: LabelSelector {
                match_labels: Some(labels.clone()),
                ..Default::default()
            },
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(labels),
                    ..Default::default()
                }),
                spec: Some(PodSpec {
                    containers: vec![Container {
                        name: "controller".to_string(),
                        image: Some(cfg.controller_image.clone()),
                        ..Default::default()
                    }],
                    ..Default::default()
                }),
            },
            ..Default::default()
        }),
        status: None,
    };

    let api: Api<Deployment> = Api::namespaced(client.clone(), SYSTEM_NAMESPACE);
    api.patch(
        CONTROLLER_DEPLOYMENT,
        &PatchParams::apply(FIELD_MANAGER).force(),
        &Patch::Apply(&deployment),
    )
    .await?;
    info!(image = %cfg.controller_image, "controller deployment applied");
    Ok(())
}

/// Bootstrap, install the controller, then watch until converged.
async fn finish_cluster(client: Client, cfg: &ClusterConfig, tokens: BTreeMap<String, String>)
    -> Result<()>
{
    let access = KubeClusterAccess {
        client: client.clone(),
    };
    bootstrap_cluster(&access, tokens).await?;
    apply_controller_deployment(&client, cfg).await?;

    let (tx, rx) = mpsc::channel(WATCH_CHANNEL_CAPACITY);
    let feed = spawn_watch_feed(client.clone(), tx);
    let store = spawn_reducer(rx);

    let cert_ops = KubeCertificateOps { client };
    let result = async {
        wait_for_controller_deployment(&store.snapshots).await?;
        wait_for_convergence(&store.snapshots, &cert_ops).await
    }
    .await;

    feed.abort();
    store.reducer.abort();
    result
}

/// AWS platform wiring
pub struct AwsPlatform {
    pub apis: AwsApis,
    // ensure_infra facts finalize needs beyond the common result
    extras: Mutex<Option<AwsExtras>>,
}

struct AwsExtras {
    node_role_arn: String,
    zone_id: String,
}

impl AwsPlatform {
    pub fn new(apis: AwsApis) -> Self {
        Self {
            apis,
            extras: Mutex::new(None),
        }
    }
}

#[async_trait]
impl ClusterPlatform for AwsPlatform {
    async fn ensure_infra(&self, cfg: &ClusterConfig) -> Result<ClusterInfraResult> {
        let infra = aws::ensure_infra_exists(cfg, &self.apis).await?;
        *self.extras.lock().map_err(|_| Error::api("aws", "platform", "state lock poisoned"))? =
            Some(AwsExtras {
                node_role_arn: infra.node_role_arn,
                zone_id: infra.zone_id,
            });
        Ok(infra.result)
    }

    async fn finalize(
        &self,
        cfg: &ClusterConfig,
        infra: &ClusterInfraResult,
        tenant_tokens: BTreeMap<String, String>,
    ) -> Result<()> {
        let (node_role_arn, zone_id) = {
            let extras = self
                .extras
                .lock()
                .map_err(|_| Error::api("aws", "platform", "state lock poisoned"))?;
            let extras = extras
                .as_ref()
                .ok_or_else(|| Error::api("aws", "platform", "finalize before ensure_infra"))?;
            (extras.node_role_arn.clone(), extras.zone_id.clone())
        };
        let aws_cfg = cfg
            .aws
            .as_ref()
            .ok_or_else(|| Error::config_field("aws", "required for provider aws"))?;

        let client = client_from_kubeconfig(&infra.kubeconfig).await?;

        // Nodes can only join once the aws-auth map grants their role.
        let access = KubeClusterAccess {
            client: client.clone(),
        };
        let map_roles = map_roles_document(&node_role_arn, &aws_cfg.eks_admin_roles)?;
        access
            .apply_config_map(
                "kube-system",
                "aws-auth",
                [("mapRoles".to_string(), map_roles)].into(),
            )
            .await?;

        finish_cluster(client, cfg, tenant_tokens).await?;

        // Converged in-cluster is not reachable yet; wait for the tenant
        // records the cluster publishes to its zone.
        aws::wait_for_tenant_records(
            self.apis.route53.as_ref(),
            &zone_id,
            &cfg.dns_name,
            &cfg.tenants,
        )
        .await
    }

    async fn destroy_infra(&self, cfg: &ClusterConfig) -> Result<()> {
        aws::ensure_infra_absent(cfg, &self.apis).await
    }
}

/// GCP platform wiring
pub struct GcpPlatform {
    pub apis: GcpApis,
}

impl GcpPlatform {
    pub fn new(apis: GcpApis) -> Self {
        Self { apis }
    }
}

#[async_trait]
impl ClusterPlatform for GcpPlatform {
    async fn ensure_infra(&self, cfg: &ClusterConfig) -> Result<ClusterInfraResult> {
        gcp::ensure_infra_exists(cfg, &self.apis).await
    }

    async fn finalize(
        &self,
        cfg: &ClusterConfig,
        infra: &ClusterInfraResult,
        tenant_tokens: BTreeMap<String, String>,
    ) -> Result<()> {
        let client = client_from_kubeconfig(&infra.kubeconfig).await?;
        finish_cluster(client, cfg, tenant_tokens).await
    }

    async fn destroy_infra(&self, cfg: &ClusterConfig) -> Result<()> {
        gcp::ensure_infra_absent(cfg, &self.apis).await
    }
}
