//! VPC network, subnetwork, router/NAT and the peering address

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use groundwork_cloud::{CloudResource, CreateOutcome, DeleteOutcome, Observation};
use groundwork_common::Result;

use crate::api::{
    AddressDesc, ComputeApi, NetworkDesc, RouterDesc, SecondaryRange, SubnetworkDesc,
};

/// Global address reserving the peering range for private service access
pub struct GlobalAddress {
    pub api: Arc<dyn ComputeApi>,
    pub address_name: String,
    pub network: String,
    pub address: String,
    pub prefix_length: u32,
}

#[async_trait]
impl CloudResource for GlobalAddress {
    type Output = AddressDesc;

    fn name(&self) -> &str {
        &self.address_name
    }

    fn poll_interval(&self) -> Duration {
        Duration::from_secs(5)
    }

    async fn observe(&self) -> Result<Observation<AddressDesc>> {
        match self.api.get_global_address(&self.address_name).await? {
            Some(addr) => Ok(match addr.status.as_str() {
                // IN_USE means the peering already consumed the range
                "RESERVED" | "IN_USE" => Observation::Ready(addr),
                _ => Observation::Provisioning,
            }),
            None => Ok(Observation::Absent),
        }
    }

    async fn create(&self) -> Result<CreateOutcome> {
        self.api
            .insert_global_address(
                &self.address_name,
                &self.network,
                &self.address,
                self.prefix_length,
            )
            .await
    }

    async fn delete(&self) -> Result<DeleteOutcome> {
        self.api.delete_global_address(&self.address_name).await
    }
}

/// Custom-mode VPC network
pub struct Network {
    pub api: Arc<dyn ComputeApi>,
    pub network_name: String,
}

#[async_trait]
impl CloudResource for Network {
    type Output = NetworkDesc;

    fn name(&self) -> &str {
        &self.network_name
    }

    fn poll_interval(&self) -> Duration {
        Duration::from_secs(1)
    }

    async fn observe(&self) -> Result<Observation<NetworkDesc>> {
        match self.api.get_network(&self.network_name).await? {
            Some(network) => Ok(Observation::Ready(network)),
            None => Ok(Observation::Absent),
        }
    }

    async fn create(&self) -> Result<CreateOutcome> {
        self.api.insert_network(&self.network_name).await
    }

    async fn delete(&self) -> Result<DeleteOutcome> {
        self.api.delete_network(&self.network_name).await
    }
}

/// Subnetwork with secondary ranges for pods and services
pub struct Subnetwork {
    pub api: Arc<dyn ComputeApi>,
    pub region: String,
    pub subnetwork_name: String,
    pub network: String,
    pub ip_cidr_range: String,
    pub secondary_ranges: Vec<SecondaryRange>,
}

#[async_trait]
impl CloudResource for Subnetwork {
    type Output = SubnetworkDesc;

    fn name(&self) -> &str {
        &self.subnetwork_name
    }

    fn poll_interval(&self) -> Duration {
        Duration::from_secs(1)
    }

    async fn observe(&self) -> Result<Observation<SubnetworkDesc>> {
        match self
            .api
            .get_subnetwork(&self.region, &self.subnetwork_name)
            .await?
        {
            Some(subnet) => Ok(Observation::Ready(subnet)),
            None => Ok(Observation::Absent),
        }
    }

    async fn create(&self) -> Result<CreateOutcome> {
        self.api
            .insert_subnetwork(
                &self.region,
                &self.subnetwork_name,
                &self.network,
                &self.ip_cidr_range,
                &self.secondary_ranges,
            )
            .await
    }

    async fn delete(&self) -> Result<DeleteOutcome> {
        self.api
            .delete_subnetwork(&self.region, &self.subnetwork_name)
            .await
    }
}

/// Cloud Router carrying the NAT config for private nodes
pub struct NatRouter {
    pub api: Arc<dyn ComputeApi>,
    pub region: String,
    pub router_name: String,
    pub network: String,
}

#[async_trait]
impl CloudResource for NatRouter {
    type Output = RouterDesc;

    fn name(&self) -> &str {
        &self.router_name
    }

    fn poll_interval(&self) -> Duration {
        Duration::from_secs(5)
    }

    async fn observe(&self) -> Result<Observation<RouterDesc>> {
        match self.api.get_router(&self.region, &self.router_name).await? {
            Some(router) if router.nat_configured => Ok(Observation::Ready(router)),
            Some(_) => Ok(Observation::Provisioning),
            None => Ok(Observation::Absent),
        }
    }

    async fn create(&self) -> Result<CreateOutcome> {
        self.api
            .insert_router_with_nat(&self.region, &self.router_name, &self.network)
            .await
    }

    async fn delete(&self) -> Result<DeleteOutcome> {
        self.api.delete_router(&self.region, &self.router_name).await
    }
}
