//! Private service access peering
//!
//! Connecting the cluster VPC to the service producer network is the one
//! mutation here that returns a long-running operation instead of a
//! resource. The operation is followed to its terminal state; a permanent
//! failure restarts the whole sequence (reserved address included) from
//! scratch, since a half-established peering cannot be repaired in place.

use async_trait::async_trait;
use tracing::{info, warn};

use groundwork_cloud::{ensure_exists, follow_operation, CloudResource, OperationApi, OperationPoll};
use groundwork_common::{Error, Result};

use crate::api::ServiceNetworkingApi;
use crate::network::GlobalAddress;

struct PeeringOps<'a>(&'a dyn ServiceNetworkingApi);

#[async_trait]
impl OperationApi for PeeringOps<'_> {
    async fn get_operation(&self, handle: &str) -> Result<OperationPoll> {
        self.0.get_operation(handle).await
    }
}

/// Ensure the reserved range exists and the peering connection is
/// established.
pub async fn ensure_peering_exists(
    api: &dyn ServiceNetworkingApi,
    address: &GlobalAddress,
    network: &str,
) -> Result<()> {
    loop {
        ensure_exists(address).await?;

        if api.peering_exists(network).await? {
            info!(network = %network, "peering connection already established");
            return Ok(());
        }

        let handle = api.create_peering(network, &address.address_name).await?;
        info!(network = %network, operation = %handle, "peering requested, following operation");

        match follow_operation(&PeeringOps(api), &handle).await {
            Ok(_) => return Ok(()),
            Err(Error::OperationFailed { detail, .. }) => {
                warn!(
                    network = %network,
                    detail = %detail,
                    "peering failed permanently, restarting from reserved range"
                );
                api.delete_peering(network).await?;
                address.delete().await?;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Tear the peering down ahead of the network itself.
pub async fn ensure_peering_absent(
    api: &dyn ServiceNetworkingApi,
    address: &GlobalAddress,
    network: &str,
) -> Result<()> {
    if api.peering_exists(network).await? {
        api.delete_peering(network).await?;
    }
    groundwork_cloud::ensure_absent(address).await
}
