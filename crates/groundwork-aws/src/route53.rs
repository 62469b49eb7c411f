//! Route53 hosted zone and record convergence
//!
//! After the in-cluster DNS automation takes over, the installer waits for
//! every tenant's A record to appear and for the ACME DNS-01 challenge
//! records to drain before declaring the cluster reachable.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};

use groundwork_cloud::{CloudResource, CreateOutcome, DeleteOutcome, Observation};
use groundwork_common::Result;

use crate::api::{HostedZoneDesc, Route53Api};

/// Interval between record list polls
pub const RECORD_POLL_INTERVAL: Duration = Duration::from_secs(30);

pub struct HostedZone {
    pub api: Arc<dyn Route53Api>,
    pub cluster_name: String,
    /// Fully qualified zone name with trailing dot
    pub dns_name: String,
}

#[async_trait]
impl CloudResource for HostedZone {
    type Output = HostedZoneDesc;

    fn name(&self) -> &str {
        &self.dns_name
    }

    fn poll_interval(&self) -> Duration {
        Duration::from_secs(5)
    }

    async fn observe(&self) -> Result<Observation<HostedZoneDesc>> {
        match self.api.find_zone(&self.dns_name).await? {
            Some(zone) => Ok(Observation::Ready(zone)),
            None => Ok(Observation::Absent),
        }
    }

    async fn create(&self) -> Result<CreateOutcome> {
        self.api.create_zone(&self.dns_name, &self.cluster_name).await
    }

    async fn delete(&self) -> Result<DeleteOutcome> {
        match self.api.find_zone(&self.dns_name).await? {
            Some(zone) => self.api.delete_zone(&zone.id).await,
            None => Ok(DeleteOutcome::NotFound),
        }
    }
}

/// Wait until every tenant endpoint has an A record and no ACME challenge
/// TXT record is still in flight.
pub async fn wait_for_tenant_records(
    api: &dyn Route53Api,
    zone_id: &str,
    dns_name: &str,
    tenants: &[String],
) -> Result<()> {
    loop {
        let records = api.list_records(zone_id).await?;

        let missing: Vec<&String> = tenants
            .iter()
            .filter(|tenant| {
                let fqdn = format!("{tenant}.{dns_name}");
                !records
                    .iter()
                    .any(|r| r.record_type == "A" && r.name == fqdn)
            })
            .collect();

        let challenges_pending = records
            .iter()
            .any(|r| r.record_type == "TXT" && r.name.starts_with("_acme-challenge"));

        if missing.is_empty() && !challenges_pending {
            info!(zone = %dns_name, "all tenant records present, challenges drained");
            return Ok(());
        }

        debug!(
            zone = %dns_name,
            missing = missing.len(),
            challenges_pending,
            "waiting for DNS records to converge"
        );
        tokio::time::sleep(RECORD_POLL_INTERVAL).await;
    }
}
