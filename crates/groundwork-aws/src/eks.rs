//! EKS cluster
//!
//! EKS creation can fail minutes after the create call is accepted, so the
//! resource opts into delete-and-recreate recovery. Status mapping follows
//! the provider state table: CREATING, ACTIVE, DELETING, FAILED.

use std::sync::Arc;

use async_trait::async_trait;

use groundwork_cloud::{CloudResource, CreateOutcome, DeleteOutcome, Observation};
use groundwork_common::Result;

use crate::api::{EksApi, EksDesc, EksSpec};

pub struct EksCluster {
    pub api: Arc<dyn EksApi>,
    pub cluster_name: String,
    pub spec: EksSpec,
}

#[async_trait]
impl CloudResource for EksCluster {
    type Output = EksDesc;

    fn name(&self) -> &str {
        &self.cluster_name
    }

    fn recreate_on_failure(&self) -> bool {
        true
    }

    async fn observe(&self) -> Result<Observation<EksDesc>> {
        match self.api.describe_cluster(&self.cluster_name).await? {
            Some(desc) => Ok(match desc.status.as_str() {
                "ACTIVE" => Observation::Ready(desc),
                "FAILED" => Observation::Failed(
                    desc.failure_detail
                        .unwrap_or_else(|| "no failure detail reported".to_string()),
                ),
                "DELETING" => Observation::Terminating,
                // CREATING, UPDATING
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
