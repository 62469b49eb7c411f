//! VPC, subnets, gateways and routing
//!
//! Each kind maps its provider state table onto [`Observation`]; the
//! generic loops in groundwork-cloud do the rest. Route and association
//! writes are plain idempotent calls and live with the orchestrator, not
//! here.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use groundwork_cloud::{CloudResource, CreateOutcome, DeleteOutcome, Observation};
use groundwork_common::Result;

use crate::api::{
    AddressDesc, Ec2Api, InternetGatewayDesc, NatGatewayDesc, RouteTableDesc, SubnetDesc,
    SubnetSpec, VpcDesc, VpcEndpointDesc,
};

pub struct Vpc {
    pub api: Arc<dyn Ec2Api>,
    pub cluster_name: String,
    pub cidr_block: String,
}

#[async_trait]
impl CloudResource for Vpc {
    type Output = VpcDesc;

    fn name(&self) -> &str {
        &self.cluster_name
    }

    async fn observe(&self) -> Result<Observation<VpcDesc>> {
        match self.api.find_vpc(&self.cluster_name).await? {
            Some(vpc) if vpc.state == "available" => Ok(Observation::Ready(vpc)),
            Some(_) => Ok(Observation::Provisioning),
            None => Ok(Observation::Absent),
        }
    }

    async fn create(&self) -> Result<CreateOutcome> {
        self.api.create_vpc(&self.cluster_name, &self.cidr_block).await
    }

    async fn delete(&self) -> Result<DeleteOutcome> {
        match self.api.find_vpc(&self.cluster_name).await? {
            Some(vpc) => self.api.delete_vpc(&vpc.id).await,
            None => Ok(DeleteOutcome::NotFound),
        }
    }
}

/// The full subnet set of the cluster's address plan, reconciled as one unit
pub struct SubnetSet {
    pub api: Arc<dyn Ec2Api>,
    pub cluster_name: String,
    pub vpc_id: String,
    pub specs: Vec<SubnetSpec>,
}

#[async_trait]
impl CloudResource for SubnetSet {
    type Output = Vec<SubnetDesc>;

    fn name(&self) -> &str {
        &self.cluster_name
    }

    fn poll_interval(&self) -> Duration {
        Duration::from_secs(5)
    }

    async fn observe(&self) -> Result<Observation<Vec<SubnetDesc>>> {
        let existing = self.api.list_subnets(&self.cluster_name).await?;
        if existing.is_empty() {
            return Ok(Observation::Absent);
        }
        // A planned CIDR with no subnet at all means a previous run stopped
        // partway. Report Absent so the loop re-enters create, which fills
        // only the gaps.
        let any_missing = self.specs.iter().any(|spec| {
            !existing.iter().any(|s| s.cidr_block == spec.cidr_block)
        });
        if any_missing {
            return Ok(Observation::Absent);
        }
        let all_available = self.specs.iter().all(|spec| {
            existing
                .iter()
                .any(|s| s.cidr_block == spec.cidr_block && s.state == "available")
        });
        if all_available {
            Ok(Observation::Ready(existing))
        } else {
            Ok(Observation::Provisioning)
        }
    }

    async fn create(&self) -> Result<CreateOutcome> {
        let existing = self.api.list_subnets(&self.cluster_name).await?;
        let mut any_created = false;
        for spec in &self.specs {
            if existing.iter().any(|s| s.cidr_block == spec.cidr_block) {
                continue;
            }
            if let CreateOutcome::Created = self
                .api
                .create_subnet(&self.cluster_name, &self.vpc_id, spec)
                .await?
            {
                any_created = true;
            }
        }
        Ok(if any_created {
            CreateOutcome::Created
        } else {
            CreateOutcome::AlreadyExists
        })
    }

    async fn delete(&self) -> Result<DeleteOutcome> {
        let existing = self.api.list_subnets(&self.cluster_name).await?;
        if existing.is_empty() {
            return Ok(DeleteOutcome::NotFound);
        }
        for subnet in &existing {
            self.api.delete_subnet(&subnet.id).await?;
        }
        Ok(DeleteOutcome::Deleted)
    }
}

/// Internet gateway; attachment to the VPC is a separate idempotent call
/// issued by the orchestrator once the gateway exists
pub struct InternetGateway {
    pub api: Arc<dyn Ec2Api>,
    pub cluster_name: String,
    pub vpc_id: String,
}

#[async_trait]
impl CloudResource for InternetGateway {
    type Output = InternetGatewayDesc;

    fn name(&self) -> &str {
        &self.cluster_name
    }

    fn poll_interval(&self) -> Duration {
        Duration::from_secs(5)
    }

    async fn observe(&self) -> Result<Observation<InternetGatewayDesc>> {
        match self.api.find_internet_gateway(&self.cluster_name).await? {
            Some(igw) => Ok(Observation::Ready(igw)),
            None => Ok(Observation::Absent),
        }
    }

    async fn create(&self) -> Result<CreateOutcome> {
        self.api.create_internet_gateway(&self.cluster_name).await
    }

    async fn delete(&self) -> Result<DeleteOutcome> {
        match self.api.find_internet_gateway(&self.cluster_name).await? {
            Some(igw) => {
                if igw.attached_vpc.is_some() {
                    self.api
                        .detach_internet_gateway(&igw.id, &self.vpc_id)
                        .await?;
                }
                self.api.delete_internet_gateway(&igw.id).await
            }
            None => Ok(DeleteOutcome::NotFound),
        }
    }
}

/// Elastic IP allocation for the NAT gateway
pub struct ElasticIp {
    pub api: Arc<dyn Ec2Api>,
    pub cluster_name: String,
}

#[async_trait]
impl CloudResource for ElasticIp {
    type Output = AddressDesc;

    fn name(&self) -> &str {
        &self.cluster_name
    }

    fn poll_interval(&self) -> Duration {
        Duration::from_secs(5)
    }

    async fn observe(&self) -> Result<Observation<AddressDesc>> {
        match self.api.find_address(&self.cluster_name).await? {
            Some(addr) => Ok(Observation::Ready(addr)),
            None => Ok(Observation::Absent),
        }
    }

    async fn create(&self) -> Result<CreateOutcome> {
        self.api.allocate_address(&self.cluster_name).await
    }

    async fn delete(&self) -> Result<DeleteOutcome> {
        match self.api.find_address(&self.cluster_name).await? {
            Some(addr) => self.api.release_address(&addr.allocation_id).await,
            None => Ok(DeleteOutcome::NotFound),
        }
    }
}

/// NAT gateway; can fail asynchronously after create, so it opts into
/// delete-and-recreate recovery
pub struct NatGateway {
    pub api: Arc<dyn Ec2Api>,
    pub cluster_name: String,
    pub public_subnet_id: String,
    pub allocation_id: String,
}

#[async_trait]
impl CloudResource for NatGateway {
    type Output = NatGatewayDesc;

    fn name(&self) -> &str {
        &self.cluster_name
    }

    fn recreate_on_failure(&self) -> bool {
        true
    }

    async fn observe(&self) -> Result<Observation<NatGatewayDesc>> {
        match self.api.find_nat_gateway(&self.cluster_name).await? {
            Some(nat) => Ok(match nat.state.as_str() {
                "available" => Observation::Ready(nat),
                "pending" => Observation::Provisioning,
                "failed" => Observation::Failed(
                    nat.failure_detail
                        .unwrap_or_else(|| "no failure detail reported".to_string()),
                ),
                "deleting" => Observation::Terminating,
                // "deleted" entries linger in list responses for a while
                _ => Observation::Absent,
            }),
            None => Ok(Observation::Absent),
        }
    }

    async fn create(&self) -> Result<CreateOutcome> {
        self.api
            .create_nat_gateway(&self.cluster_name, &self.public_subnet_id, &self.allocation_id)
            .await
    }

    async fn delete(&self) -> Result<DeleteOutcome> {
        match self.api.find_nat_gateway(&self.cluster_name).await? {
            Some(nat) => self.api.delete_nat_gateway(&nat.id).await,
            None => Ok(DeleteOutcome::NotFound),
        }
    }
}

/// A named route table; routes and subnet associations are applied by the
/// orchestrator once the table exists
pub struct RouteTable {
    pub api: Arc<dyn Ec2Api>,
    /// Full table name, e.g. `<cluster>-public`
    pub table_name: String,
    pub vpc_id: String,
}

#[async_trait]
impl CloudResource for RouteTable {
    type Output = RouteTableDesc;

    fn name(&self) -> &str {
        &self.table_name
    }

    fn poll_interval(&self) -> Duration {
        Duration::from_secs(5)
    }

    async fn observe(&self) -> Result<Observation<RouteTableDesc>> {
        match self.api.find_route_table(&self.table_name).await? {
            Some(table) => Ok(Observation::Ready(table)),
            None => Ok(Observation::Absent),
        }
    }

    async fn create(&self) -> Result<CreateOutcome> {
        self.api.create_route_table(&self.table_name, &self.vpc_id).await
    }

    async fn delete(&self) -> Result<DeleteOutcome> {
        match self.api.find_route_table(&self.table_name).await? {
            Some(table) => self.api.delete_route_table(&table.id).await,
            None => Ok(DeleteOutcome::NotFound),
        }
    }
}

/// Gateway endpoint keeping S3 traffic off the NAT path
pub struct VpcEndpoint {
    pub api: Arc<dyn Ec2Api>,
    pub cluster_name: String,
    pub vpc_id: String,
    pub service_name: String,
    pub route_table_ids: Vec<String>,
}

#[async_trait]
impl CloudResource for VpcEndpoint {
    type Output = VpcEndpointDesc;

    fn name(&self) -> &str {
        &self.cluster_name
    }

    async fn observe(&self) -> Result<Observation<VpcEndpointDesc>> {
        match self.api.find_vpc_endpoint(&self.cluster_name).await? {
            Some(ep) => Ok(match ep.state.as_str() {
                "available" => Observation::Ready(ep),
                "deleting" => Observation::Terminating,
                _ => Observation::Provisioning,
            }),
            None => Ok(Observation::Absent),
        }
    }

    async fn create(&self) -> Result<CreateOutcome> {
        self.api
            .create_vpc_endpoint(
                &self.cluster_name,
                &self.vpc_id,
                &self.service_name,
                &self.route_table_ids,
            )
            .await
    }

    async fn delete(&self) -> Result<DeleteOutcome> {
        match self.api.find_vpc_endpoint(&self.cluster_name).await? {
            Some(ep) => self.api.delete_vpc_endpoint(&ep.id).await,
            None => Ok(DeleteOutcome::NotFound),
        }
    }
}
