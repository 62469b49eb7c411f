//! GCP infrastructure orchestration
//!
//! Mirrors the AWS graph with the provider-specific forks: the network
//! fabric is sequential, then the GKE cluster and the private-service
//! chain (reserved range, peering, Cloud SQL) provision side by side. The
//! SQL chain depends on the peering and nothing in GKE does, so the two
//! arms never contend.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::info;

use groundwork_cloud::{ensure_absent, ensure_exists};
use groundwork_common::{ClusterConfig, Error, Result, CLUSTER_DB_NAME};
use groundwork_gcp::api::{
    ComputeApi, DnsApi, GcpIamApi, GcsApi, GkeApi, GkeSpec, SecondaryRange, ServiceNetworkingApi,
    SqlApi,
};
use groundwork_gcp::bucket::GcsBucket;
use groundwork_gcp::cloudsql::{ensure_sql_absent, ensure_sql_exists, SqlDatabase, SqlInstance};
use groundwork_gcp::dns::ManagedZone;
use groundwork_gcp::gke::GkeCluster;
use groundwork_gcp::kubeconfig::kubeconfig_for_gke;
use groundwork_gcp::network::{GlobalAddress, NatRouter, Network, Subnetwork};
use groundwork_gcp::peering::{ensure_peering_absent, ensure_peering_exists};
use groundwork_gcp::serviceaccount::{ensure_component_account, ComponentAccount};

use crate::result::ClusterInfraResult;

/// Primary subnet range for nodes
const SUBNET_CIDR: &str = "10.0.0.0/20";
/// Secondary range for pods
const PODS_RANGE: (&str, &str) = ("gke-pods", "10.4.0.0/14");
/// Secondary range for services
const SERVICES_RANGE: (&str, &str) = ("gke-services", "10.8.0.0/20");
/// Reserved /16 handed to the service producer network
const PEERING_ADDRESS: &str = "192.168.64.0";
const PEERING_PREFIX_LENGTH: u32 = 16;

/// All GCP API seams bundled for the orchestrator
#[derive(Clone)]
pub struct GcpApis {
    pub compute: Arc<dyn ComputeApi>,
    pub service_networking: Arc<dyn ServiceNetworkingApi>,
    pub gcs: Arc<dyn GcsApi>,
    pub gke: Arc<dyn GkeApi>,
    pub sql: Arc<dyn SqlApi>,
    pub dns: Arc<dyn DnsApi>,
    pub iam: Arc<dyn GcpIamApi>,
}

fn peering_address(cfg: &ClusterConfig, api: &GcpApis) -> GlobalAddress {
    GlobalAddress {
        api: api.compute.clone(),
        address_name: format!("google-managed-services-{}", cfg.cluster_name),
        network: cfg.cluster_name.clone(),
        address: PEERING_ADDRESS.to_string(),
        prefix_length: PEERING_PREFIX_LENGTH,
    }
}

/// Per-component identities and their project role grants
fn component_accounts(cfg: &ClusterConfig, api: &GcpApis) -> Vec<ComponentAccount> {
    let name = &cfg.cluster_name;
    vec![
        ComponentAccount {
            api: api.iam.clone(),
            account_id: format!("{name}-cert-manager"),
            roles: vec!["roles/dns.admin".to_string()],
            namespace: "cert-manager".to_string(),
            ksa_name: "cert-manager".to_string(),
        },
        ComponentAccount {
            api: api.iam.clone(),
            account_id: format!("{name}-external-dns"),
            roles: vec!["roles/dns.admin".to_string()],
            namespace: "external-dns".to_string(),
            ksa_name: "external-dns".to_string(),
        },
        ComponentAccount {
            api: api.iam.clone(),
            account_id: format!("{name}-loki"),
            roles: vec!["roles/storage.objectAdmin".to_string()],
            namespace: "loki".to_string(),
            ksa_name: "loki".to_string(),
        },
        ComponentAccount {
            api: api.iam.clone(),
            account_id: format!("{name}-cortex"),
            roles: vec!["roles/storage.objectAdmin".to_string()],
            namespace: "cortex".to_string(),
            ksa_name: "cortex".to_string(),
        },
    ]
}

pub async fn ensure_infra_exists(cfg: &ClusterConfig, apis: &GcpApis) -> Result<ClusterInfraResult> {
    let gcp = cfg
        .gcp
        .as_ref()
        .ok_or_else(|| Error::config_field("gcp", "required for provider gcp"))?;
    let name = cfg.cluster_name.clone();

    ensure_exists(&ManagedZone {
        api: apis.dns.clone(),
        zone_name: name.clone(),
        dns_name: cfg.dns_name.clone(),
    })
    .await?;

    let loki_bucket = GcsBucket {
        api: apis.gcs.clone(),
        bucket_name: cfg.bucket_name("loki"),
        region: gcp.region.clone(),
        retention_days: cfg.log_retention_days,
    };
    let cortex_bucket = GcsBucket {
        api: apis.gcs.clone(),
        bucket_name: cfg.bucket_name("cortex"),
        region: gcp.region.clone(),
        retention_days: cfg.metric_retention_days,
    };
    let network = Network {
        api: apis.compute.clone(),
        network_name: name.clone(),
    };
    let (_, _, network_desc) = tokio::try_join!(
        ensure_exists(&loki_bucket),
        ensure_exists(&cortex_bucket),
        ensure_exists(&network),
    )?;
    info!(network = %network_desc.name, "network fabric root ready");

    ensure_exists(&Subnetwork {
        api: apis.compute.clone(),
        region: gcp.region.clone(),
        subnetwork_name: name.clone(),
        network: name.clone(),
        ip_cidr_range: SUBNET_CIDR.to_string(),
        secondary_ranges: vec![
            SecondaryRange {
                range_name: PODS_RANGE.0.to_string(),
                ip_cidr_range: PODS_RANGE.1.to_string(),
            },
            SecondaryRange {
                range_name: SERVICES_RANGE.0.to_string(),
                ip_cidr_range: SERVICES_RANGE.1.to_string(),
            },
        ],
    })
    .await?;

    ensure_exists(&NatRouter {
        api: apis.compute.clone(),
        region: gcp.region.clone(),
        router_name: format!("{name}-nat"),
        network: name.clone(),
    })
    .await?;

    let mut component_identities = BTreeMap::new();
    for account in component_accounts(cfg, apis) {
        let desc = ensure_component_account(&account).await?;
        let component = account
            .account_id
            .strip_prefix(&format!("{name}-"))
            .unwrap_or(&account.account_id)
            .to_string();
        component_identities.insert(component, desc.email);
    }

    // GKE and the private-service chain are independent.
    let gke = GkeCluster {
        api: apis.gke.clone(),
        cluster_name: name.clone(),
        spec: GkeSpec {
            network: name.clone(),
            subnetwork: name.clone(),
            zone: format!("{}{}", gcp.region, gcp.zone_suffix),
            node_count: cfg.node_count,
            machine_type: gcp.machine_type.clone(),
            pods_range_name: PODS_RANGE.0.to_string(),
            services_range_name: SERVICES_RANGE.0.to_string(),
            authorized_networks: cfg.authorized_networks.clone(),
        },
    };
    let sql_chain = async {
        let address = peering_address(cfg, apis);
        ensure_peering_exists(apis.service_networking.as_ref(), &address, &name).await?;
        let instance = SqlInstance {
            api: apis.sql.clone(),
            cluster_name: name.clone(),
            instance_name: format!("{name}-db"),
            network: name.clone(),
        };
        let database = SqlDatabase {
            api: apis.sql.clone(),
            cluster_name: name.clone(),
            instance_name: format!("{name}-db"),
            database: CLUSTER_DB_NAME.to_string(),
        };
        ensure_sql_exists(&instance, &database).await
    };
    let (gke_desc, sql_desc) = tokio::try_join!(ensure_exists(&gke), sql_chain)?;
    info!(cluster = %name, "control plane and database ready");

    let kubeconfig = kubeconfig_for_gke(&gcp.project_id, &gke_desc)?;
    let db_endpoint = sql_desc.private_ip.ok_or_else(|| {
        Error::api("gcp", format!("{name}-db"), "instance has no private address yet")
    })?;

    Ok(ClusterInfraResult {
        kubeconfig,
        db_endpoint,
        db_name: CLUSTER_DB_NAME.to_string(),
        component_identities,
    })
}

/// Teardown, in dependency-reverse order.
pub async fn ensure_infra_absent(cfg: &ClusterConfig, apis: &GcpApis) -> Result<()> {
    let gcp = cfg
        .gcp
        .as_ref()
        .ok_or_else(|| Error::config_field("gcp", "required for provider gcp"))?;
    let name = cfg.cluster_name.clone();

    let gke = GkeCluster {
        api: apis.gke.clone(),
        cluster_name: name.clone(),
        spec: GkeSpec {
            network: String::new(),
            subnetwork: String::new(),
            zone: String::new(),
            node_count: 0,
            machine_type: String::new(),
            pods_range_name: String::new(),
            services_range_name: String::new(),
            authorized_networks: vec![],
        },
    };
    let sql_teardown = async {
        let instance = SqlInstance {
            api: apis.sql.clone(),
            cluster_name: name.clone(),
            instance_name: format!("{name}-db"),
            network: name.clone(),
        };
        let database = SqlDatabase {
            api: apis.sql.clone(),
            cluster_name: name.clone(),
            instance_name: format!("{name}-db"),
            database: CLUSTER_DB_NAME.to_string(),
        };
        ensure_sql_absent(&instance, &database).await
    };
    tokio::try_join!(ensure_absent(&gke), sql_teardown)?;

    let address = peering_address(cfg, apis);
    ensure_peering_absent(apis.service_networking.as_ref(), &address, &name).await?;

    ensure_absent(&NatRouter {
        api: apis.compute.clone(),
        region: gcp.region.clone(),
        router_name: format!("{name}-nat"),
        network: name.clone(),
    })
    .await?;
    ensure_absent(&Subnetwork {
        api: apis.compute.clone(),
        region: gcp.region.clone(),
        subnetwork_name: name.clone(),
        network: name.clone(),
        ip_cidr_range: String::new(),
        secondary_ranges: vec![],
    })
    .await?;
    ensure_absent(&Network {
        api: apis.compute.clone(),
        network_name: name.clone(),
    })
    .await?;

    for account in component_accounts(cfg, apis) {
        ensure_absent(&account).await?;
    }

    for bucket_name in [cfg.bucket_name("loki"), cfg.bucket_name("cortex")] {
        ensure_absent(&GcsBucket {
            api: apis.gcs.clone(),
            bucket_name,
            region: gcp.region.clone(),
            retention_days: 0,
        })
        .await?;
    }

    ensure_absent(&ManagedZone {
        api: apis.dns.clone(),
        zone_name: name.clone(),
        dns_name: cfg.dns_name.clone(),
    })
    .await?;

    info!(cluster = %name, "GCP infrastructure removed");
    Ok(())
}
