//! AWS API seams
//!
//! The installer talks to AWS through these traits only. Adapters are
//! expected to fold idempotency-relevant API responses into the tagged
//! outcomes: name/id conflicts become [`CreateOutcome::AlreadyExists`],
//! not-found deletions become [`DeleteOutcome::NotFound`], and duplicate
//! rule/attachment conflicts are treated as success. Lookups are by the
//! cluster ownership tag unless a kind is named (EKS, RDS).

use async_trait::async_trait;

use groundwork_cloud::{CreateOutcome, DeleteOutcome};
use groundwork_common::Result;

#[cfg(test)]
use mockall::automock;

/// VPC as described by the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VpcDesc {
    pub id: String,
    pub state: String,
    pub cidr_block: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubnetDesc {
    pub id: String,
    pub state: String,
    pub cidr_block: String,
    pub availability_zone: String,
    pub public: bool,
}

/// Spec for one subnet of the cluster's address plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubnetSpec {
    pub cidr_block: String,
    pub availability_zone: String,
    pub public: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InternetGatewayDesc {
    pub id: String,
    pub attached_vpc: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressDesc {
    pub allocation_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NatGatewayDesc {
    pub id: String,
    pub state: String,
    pub failure_detail: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTableDesc {
    pub id: String,
    pub associated_subnet_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VpcEndpointDesc {
    pub id: String,
    pub state: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityGroupDesc {
    pub id: String,
    pub group_name: String,
}

/// One ingress or egress permission of a security group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityGroupRule {
    pub protocol: String,
    pub from_port: i32,
    pub to_port: i32,
    pub cidr_block: Option<String>,
    /// Peer security group instead of a CIDR block
    pub source_group_id: Option<String>,
}

/// Target of a route in a route table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteTarget {
    InternetGateway(String),
    NatGateway(String),
}

/// EC2 surface: VPC, subnets, gateways, routing, security groups
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Ec2Api: Send + Sync {
    async fn find_vpc(&self, cluster_name: &str) -> Result<Option<VpcDesc>>;
    async fn create_vpc(&self, cluster_name: &str, cidr_block: &str) -> Result<CreateOutcome>;
    async fn delete_vpc(&self, vpc_id: &str) -> Result<DeleteOutcome>;

    async fn list_subnets(&self, cluster_name: &str) -> Result<Vec<SubnetDesc>>;
    async fn create_subnet(
        &self,
        cluster_name: &str,
        vpc_id: &str,
        spec: &SubnetSpec,
    ) -> Result<CreateOutcome>;
    async fn delete_subnet(&self, subnet_id: &str) -> Result<DeleteOutcome>;

    async fn find_internet_gateway(&self, cluster_name: &str)
        -> Result<Option<InternetGatewayDesc>>;
    async fn create_internet_gateway(&self, cluster_name: &str) -> Result<CreateOutcome>;
    /// Idempotent: an already-attached gateway is success
    async fn attach_internet_gateway(&self, igw_id: &str, vpc_id: &str) -> Result<()>;
    async fn detach_internet_gateway(&self, igw_id: &str, vpc_id: &str) -> Result<()>;
    async fn delete_internet_gateway(&self, igw_id: &str) -> Result<DeleteOutcome>;

    async fn find_address(&self, cluster_name: &str) -> Result<Option<AddressDesc>>;
    async fn allocate_address(&self, cluster_name: &str) -> Result<CreateOutcome>;
    async fn release_address(&self, allocation_id: &str) -> Result<DeleteOutcome>;

    async fn find_nat_gateway(&self, cluster_name: &str) -> Result<Option<NatGatewayDesc>>;
    async fn create_nat_gateway(
        &self,
        cluster_name: &str,
        subnet_id: &str,
        allocation_id: &str,
    ) -> Result<CreateOutcome>;
    async fn delete_nat_gateway(&self, nat_gateway_id: &str) -> Result<DeleteOutcome>;

    async fn find_route_table(&self, name: &str) -> Result<Option<RouteTableDesc>>;
    async fn create_route_table(&self, name: &str, vpc_id: &str) -> Result<CreateOutcome>;
    async fn delete_route_table(&self, route_table_id: &str) -> Result<DeleteOutcome>;
    /// Idempotent: an existing identical route is success
    async fn ensure_route(
        &self,
        route_table_id: &str,
        destination_cidr: &str,
        target: &RouteTarget,
    ) -> Result<()>;
    /// Idempotent: an existing association is success
    async fn associate_route_table(&self, route_table_id: &str, subnet_id: &str) -> Result<()>;

    async fn find_vpc_endpoint(&self, cluster_name: &str) -> Result<Option<VpcEndpointDesc>>;
    async fn create_vpc_endpoint(
        &self,
        cluster_name: &str,
        vpc_id: &str,
        service_name: &str,
        route_table_ids: &[String],
    ) -> Result<CreateOutcome>;
    async fn delete_vpc_endpoint(&self, endpoint_id: &str) -> Result<DeleteOutcome>;

    async fn find_security_group(
        &self,
        vpc_id: &str,
        group_name: &str,
    ) -> Result<Option<SecurityGroupDesc>>;
    async fn create_security_group(
        &self,
        cluster_name: &str,
        vpc_id: &str,
        group_name: &str,
        description: &str,
    ) -> Result<CreateOutcome>;
    async fn delete_security_group(&self, group_id: &str) -> Result<DeleteOutcome>;
    /// Idempotent: duplicate-rule conflicts are success
    async fn authorize_ingress(&self, group_id: &str, rule: &SecurityGroupRule) -> Result<()>;
    /// Idempotent: duplicate-rule conflicts are success
    async fn authorize_egress(&self, group_id: &str, rule: &SecurityGroupRule) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleDesc {
    pub name: String,
    pub arn: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyDesc {
    pub name: String,
    pub arn: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceProfileDesc {
    pub name: String,
    pub arn: String,
    pub role_names: Vec<String>,
}

/// IAM surface: roles, policies, attachments, instance profiles
#[cfg_attr(test, automock)]
#[async_trait]
pub trait IamApi: Send + Sync {
    async fn find_role(&self, name: &str) -> Result<Option<RoleDesc>>;
    async fn create_role(
        &self,
        name: &str,
        assume_role_policy: &serde_json::Value,
    ) -> Result<CreateOutcome>;
    async fn delete_role(&self, name: &str) -> Result<DeleteOutcome>;

    async fn find_policy(&self, name: &str) -> Result<Option<PolicyDesc>>;
    async fn create_policy(
        &self,
        name: &str,
        document: &serde_json::Value,
    ) -> Result<CreateOutcome>;
    async fn delete_policy(&self, arn: &str) -> Result<DeleteOutcome>;

    /// Idempotent: attaching an already-attached policy is success
    async fn attach_role_policy(&self, role_name: &str, policy_arn: &str) -> Result<()>;
    async fn detach_role_policy(&self, role_name: &str, policy_arn: &str) -> Result<()>;

    async fn find_instance_profile(&self, name: &str) -> Result<Option<InstanceProfileDesc>>;
    async fn create_instance_profile(&self, name: &str) -> Result<CreateOutcome>;
    async fn delete_instance_profile(&self, name: &str) -> Result<DeleteOutcome>;
    /// Idempotent: an already-added role is success
    async fn add_role_to_instance_profile(&self, profile_name: &str, role_name: &str)
        -> Result<()>;
}

/// S3 surface
#[cfg_attr(test, automock)]
#[async_trait]
pub trait S3Api: Send + Sync {
    async fn bucket_exists(&self, name: &str) -> Result<bool>;
    async fn create_bucket(&self, name: &str, region: &str) -> Result<CreateOutcome>;
    async fn put_bucket_lifecycle(&self, name: &str, expiration_days: u32) -> Result<()>;
    async fn put_bucket_tagging(&self, name: &str, cluster_name: &str) -> Result<()>;
    async fn delete_bucket(&self, name: &str) -> Result<DeleteOutcome>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EksDesc {
    pub name: String,
    pub status: String,
    pub endpoint: Option<String>,
    pub certificate_authority_data: Option<String>,
    pub failure_detail: Option<String>,
}

/// Spec passed to EKS cluster creation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EksSpec {
    pub role_arn: String,
    pub subnet_ids: Vec<String>,
    pub security_group_ids: Vec<String>,
    pub public_access_cidrs: Vec<String>,
}

/// EKS surface
#[cfg_attr(test, automock)]
#[async_trait]
pub trait EksApi: Send + Sync {
    async fn describe_cluster(&self, name: &str) -> Result<Option<EksDesc>>;
    async fn create_cluster(&self, name: &str, spec: &EksSpec) -> Result<CreateOutcome>;
    async fn delete_cluster(&self, name: &str) -> Result<DeleteOutcome>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbClusterDesc {
    pub id: String,
    pub status: String,
    pub endpoint: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbInstanceDesc {
    pub id: String,
    pub status: String,
}

/// RDS surface: subnet group, Aurora cluster, instance
#[cfg_attr(test, automock)]
#[async_trait]
pub trait RdsApi: Send + Sync {
    async fn subnet_group_exists(&self, name: &str) -> Result<bool>;
    async fn create_subnet_group(
        &self,
        name: &str,
        cluster_name: &str,
        subnet_ids: &[String],
    ) -> Result<CreateOutcome>;
    async fn delete_subnet_group(&self, name: &str) -> Result<DeleteOutcome>;

    async fn describe_db_cluster(&self, id: &str) -> Result<Option<DbClusterDesc>>;
    async fn create_db_cluster(
        &self,
        id: &str,
        cluster_name: &str,
        subnet_group: &str,
        security_group_id: &str,
    ) -> Result<CreateOutcome>;
    /// Skips the final snapshot; the data is derivable from object storage
    async fn delete_db_cluster(&self, id: &str) -> Result<DeleteOutcome>;

    async fn describe_db_instance(&self, id: &str) -> Result<Option<DbInstanceDesc>>;
    async fn create_db_instance(
        &self,
        id: &str,
        db_cluster_id: &str,
        instance_class: &str,
    ) -> Result<CreateOutcome>;
    async fn delete_db_instance(&self, id: &str) -> Result<DeleteOutcome>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostedZoneDesc {
    pub id: String,
    pub name: String,
}

/// One DNS record as listed from the zone
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordDesc {
    pub name: String,
    pub record_type: String,
}

/// Route53 surface
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Route53Api: Send + Sync {
    async fn find_zone(&self, dns_name: &str) -> Result<Option<HostedZoneDesc>>;
    async fn create_zone(&self, dns_name: &str, cluster_name: &str) -> Result<CreateOutcome>;
    async fn delete_zone(&self, zone_id: &str) -> Result<DeleteOutcome>;
    async fn list_records(&self, zone_id: &str) -> Result<Vec<RecordDesc>>;
}

/// STS surface, used only for preflight checks
#[cfg_attr(test, automock)]
#[async_trait]
pub trait StsApi: Send + Sync {
    async fn get_account_id(&self) -> Result<String>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsgDesc {
    pub name: String,
    pub desired_capacity: u32,
}

/// Autoscaling surface: launch configuration and node group
#[cfg_attr(test, automock)]
#[async_trait]
pub trait AutoscalingApi: Send + Sync {
    async fn launch_configuration_exists(&self, name: &str) -> Result<bool>;
    async fn create_launch_configuration(
        &self,
        name: &str,
        instance_type: &str,
        instance_profile_arn: &str,
        security_group_id: &str,
        user_data: &str,
    ) -> Result<CreateOutcome>;
    async fn delete_launch_configuration(&self, name: &str) -> Result<DeleteOutcome>;

    async fn describe_autoscaling_group(&self, name: &str) -> Result<Option<AsgDesc>>;
    async fn create_autoscaling_group(
        &self,
        name: &str,
        cluster_name: &str,
        launch_configuration: &str,
        subnet_ids: &[String],
        desired_capacity: u32,
    ) -> Result<CreateOutcome>;
    async fn delete_autoscaling_group(&self, name: &str) -> Result<DeleteOutcome>;
}
