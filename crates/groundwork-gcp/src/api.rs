//! GCP API seams
//!
//! Adapters fold idempotency-relevant responses the same way the AWS seams
//! do: 409 conflicts become [`CreateOutcome::AlreadyExists`], 404 deletions
//! become [`DeleteOutcome::NotFound`], and the transient `resource is not
//! ready` 400 during network convergence is reported as a retryable error.

use async_trait::async_trait;

use groundwork_cloud::{CreateOutcome, DeleteOutcome, OperationPoll};
use groundwork_common::Result;

#[cfg(test)]
use mockall::automock;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressDesc {
    pub name: String,
    pub status: String,
    pub address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkDesc {
    pub name: String,
    pub self_link: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubnetworkDesc {
    pub name: String,
    pub ip_cidr_range: String,
}

/// Secondary range attached to a subnetwork
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecondaryRange {
    pub range_name: String,
    pub ip_cidr_range: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterDesc {
    pub name: String,
    pub nat_configured: bool,
}

/// Compute surface: addresses, networks, subnetworks, routers
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ComputeApi: Send + Sync {
    async fn get_global_address(&self, name: &str) -> Result<Option<AddressDesc>>;
    /// Reserves a /16 for VPC peering (purpose VPC_PEERING)
    async fn insert_global_address(
        &self,
        name: &str,
        network: &str,
        address: &str,
        prefix_length: u32,
    ) -> Result<CreateOutcome>;
    async fn delete_global_address(&self, name: &str) -> Result<DeleteOutcome>;

    async fn get_network(&self, name: &str) -> Result<Option<NetworkDesc>>;
    /// Custom-mode network, no auto subnets
    async fn insert_network(&self, name: &str) -> Result<CreateOutcome>;
    async fn delete_network(&self, name: &str) -> Result<DeleteOutcome>;

    async fn get_subnetwork(&self, region: &str, name: &str) -> Result<Option<SubnetworkDesc>>;
    async fn insert_subnetwork(
        &self,
        region: &str,
        name: &str,
        network: &str,
        ip_cidr_range: &str,
        secondary_ranges: &[SecondaryRange],
    ) -> Result<CreateOutcome>;
    async fn delete_subnetwork(&self, region: &str, name: &str) -> Result<DeleteOutcome>;

    async fn get_router(&self, region: &str, name: &str) -> Result<Option<RouterDesc>>;
    /// Router with a NAT config covering all subnet ranges
    async fn insert_router_with_nat(
        &self,
        region: &str,
        name: &str,
        network: &str,
    ) -> Result<CreateOutcome>;
    async fn delete_router(&self, region: &str, name: &str) -> Result<DeleteOutcome>;
}

/// Service-networking surface for private service access peering
///
/// `create_peering` returns the handle of a long-running operation; the
/// caller follows it through [`get_operation`] until a terminal payload.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ServiceNetworkingApi: Send + Sync {
    async fn create_peering(
        &self,
        network: &str,
        reserved_range_name: &str,
    ) -> Result<String>;
    async fn get_operation(&self, handle: &str) -> Result<OperationPoll>;
    async fn peering_exists(&self, network: &str) -> Result<bool>;
    async fn delete_peering(&self, network: &str) -> Result<DeleteOutcome>;
}

/// GCS surface
#[cfg_attr(test, automock)]
#[async_trait]
pub trait GcsApi: Send + Sync {
    async fn bucket_exists(&self, name: &str) -> Result<bool>;
    async fn create_bucket(&self, name: &str, region: &str, retention_days: u32)
        -> Result<CreateOutcome>;
    async fn delete_bucket(&self, name: &str) -> Result<DeleteOutcome>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GkeDesc {
    pub name: String,
    pub status: String,
    pub endpoint: Option<String>,
    pub cluster_ca_certificate: Option<String>,
    pub status_message: Option<String>,
}

/// Spec passed to GKE cluster creation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GkeSpec {
    pub network: String,
    pub subnetwork: String,
    pub zone: String,
    pub node_count: u32,
    pub machine_type: String,
    pub pods_range_name: String,
    pub services_range_name: String,
    pub authorized_networks: Vec<String>,
}

/// GKE surface
#[cfg_attr(test, automock)]
#[async_trait]
pub trait GkeApi: Send + Sync {
    /// Lookup is by the cluster ownership label, not by name
    async fn find_cluster(&self, cluster_name: &str) -> Result<Option<GkeDesc>>;
    async fn create_cluster(&self, cluster_name: &str, spec: &GkeSpec) -> Result<CreateOutcome>;
    async fn delete_cluster(&self, cluster_name: &str) -> Result<DeleteOutcome>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlInstanceDesc {
    pub name: String,
    pub state: String,
    pub private_ip: Option<String>,
}

/// Cloud SQL surface
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SqlApi: Send + Sync {
    /// Lookup is by the cluster ownership label
    async fn find_instance(&self, cluster_name: &str) -> Result<Option<SqlInstanceDesc>>;
    async fn create_instance(
        &self,
        cluster_name: &str,
        instance_name: &str,
        network: &str,
    ) -> Result<CreateOutcome>;
    async fn delete_instance(&self, instance_name: &str) -> Result<DeleteOutcome>;

    async fn database_exists(&self, instance_name: &str, database: &str) -> Result<bool>;
    async fn create_database(&self, instance_name: &str, database: &str) -> Result<CreateOutcome>;
    async fn delete_database(&self, instance_name: &str, database: &str) -> Result<DeleteOutcome>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedZoneDesc {
    pub name: String,
    pub dns_name: String,
}

/// Cloud DNS surface
#[cfg_attr(test, automock)]
#[async_trait]
pub trait DnsApi: Send + Sync {
    async fn find_zone(&self, dns_name: &str) -> Result<Option<ManagedZoneDesc>>;
    async fn create_zone(&self, zone_name: &str, dns_name: &str) -> Result<CreateOutcome>;
    async fn delete_zone(&self, zone_name: &str) -> Result<DeleteOutcome>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceAccountDesc {
    pub email: String,
}

/// IAM surface: per-component service accounts with workload identity
#[cfg_attr(test, automock)]
#[async_trait]
pub trait GcpIamApi: Send + Sync {
    async fn find_service_account(&self, account_id: &str) -> Result<Option<ServiceAccountDesc>>;
    async fn create_service_account(&self, account_id: &str) -> Result<CreateOutcome>;
    async fn delete_service_account(&self, email: &str) -> Result<DeleteOutcome>;
    /// Idempotent: an existing identical binding is success
    async fn grant_role(&self, email: &str, role: &str) -> Result<()>;
    /// Idempotent workload-identity binding to a Kubernetes service account
    async fn bind_workload_identity(
        &self,
        email: &str,
        namespace: &str,
        ksa_name: &str,
    ) -> Result<()>;
}
