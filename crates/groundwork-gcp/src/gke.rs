//! GKE cluster
//!
//! Discovery is by the cluster ownership label rather than by name, so a
//! renamed or half-created cluster is still found. ERROR is terminal;
//! STOPPING is waited out on teardown.

use std::sync::Arc;

use async_trait::async_trait;

use groundwork_cloud::{CloudResource, CreateOutcome, DeleteOutcome, Observation};
use groundwork_common::Result;

use crate::api::{GkeApi, GkeDesc, GkeSpec};

pub struct GkeCluster {
    pub api: Arc<dyn GkeApi>,
    pub cluster_name: String,
    pub spec: GkeSpec,
}

#[async_trait]
impl CloudResource for GkeCluster {
    type Output = GkeDesc;

    fn name(&self) -> &str {
        &self.cluster_name
    }

    async fn observe(&self) -> Result<Observation<GkeDesc>> {
        match self.api.find_cluster(&self.cluster_name).await? {
            Some(desc) => Ok(match desc.status.as_str() {
                "RUNNING" => Observation::Ready(desc),
                "ERROR" | "DEGRADED" => Observation::Failed(
                    desc.status_message
                        .unwrap_or_else(|| "no status message reported".to_string()),
                ),
                "STOPPING" => Observation::Terminating,
                // PROVISIONING, RECONCILING
                _ => Observation::Provisioning,
            }),
            None => Ok(Observation::Absent),
        }
    }

    async fn create(&self) -> Result<CreateOutcome> {
        self.api.create_cluster(&self.cluster_name, &self.spec).await
    }

    async fn delete(&self) -> Result<DeleteOutcome> {
        self.api.delete_cluster(&self.cluster_name).await
    }
}
