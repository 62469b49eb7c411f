//! Cloud DNS managed zone

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use groundwork_cloud::{CloudResource, CreateOutcome, DeleteOutcome, Observation};
use groundwork_common::Result;

use crate::api::{DnsApi, ManagedZoneDesc};

pub struct ManagedZone {
    pub api: Arc<dyn DnsApi>,
    /// Zone resource name, derived from the cluster name
    pub zone_name: String,
    /// Fully qualified DNS name with trailing dot
    pub dns_name: String,
}

#[async_trait]
impl CloudResource for ManagedZone {
    type Output = ManagedZoneDesc;

    fn name(&self) -> &str {
        &self.dns_name
    }

    fn poll_interval(&self) -> Duration {
        Duration::from_secs(5)
    }

    async fn observe(&self) -> Result<Observation<ManagedZoneDesc>> {
        match self.api.find_zone(&self.dns_name).await? {
            Some(zone) => Ok(Observation::Ready(zone)),
            None => Ok(Observation::Absent),
        }
    }

    async fn create(&self) -> Result<CreateOutcome> {
        self.api.create_zone(&self.zone_name, &self.dns_name).await
    }

    async fn delete(&self) -> Result<DeleteOutcome> {
        self.api.delete_zone(&self.zone_name).await
    }
}
