//! Aurora PostgreSQL: subnet group, cluster, instance
//!
//! Cluster and instance can both reach a terminal `failed` status after a
//! successful create call; both opt into delete-and-recreate recovery. The
//! instance is only created once the cluster is available, which the
//! orchestrator enforces by sequencing the two ensure calls.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use groundwork_cloud::{CloudResource, CreateOutcome, DeleteOutcome, Observation};
use groundwork_common::Result;

use crate::api::{DbClusterDesc, DbInstanceDesc, RdsApi};

/// DB subnet group spanning the private subnets
pub struct DbSubnetGroup {
    pub api: Arc<dyn RdsApi>,
    pub cluster_name: String,
    pub group_name: String,
    pub subnet_ids: Vec<String>,
}

#[async_trait]
impl CloudResource for DbSubnetGroup {
    type Output = String;

    fn name(&self) -> &str {
        &self.group_name
    }

    fn poll_interval(&self) -> Duration {
        Duration::from_secs(1)
    }

    async fn observe(&self) -> Result<Observation<String>> {
        if self.api.subnet_group_exists(&self.group_name).await? {
            Ok(Observation::Ready(self.group_name.clone()))
        } else {
            Ok(Observation::Absent)
        }
    }

    async fn create(&self) -> Result<CreateOutcome> {
        self.api
            .create_subnet_group(&self.group_name, &self.cluster_name, &self.subnet_ids)
            .await
    }

    async fn delete(&self) -> Result<DeleteOutcome> {
        self.api.delete_subnet_group(&self.group_name).await
    }
}

fn map_db_status<T>(status: &str, desc: T) -> Observation<T> {
    match status {
        "available" => Observation::Ready(desc),
        "failed" | "inaccessible-encryption-credentials" | "incompatible-network" => {
            Observation::Failed(status.to_string())
        }
        "deleting" => Observation::Terminating,
        // creating, backing-up, modifying, ...
        _ => Observation::Provisioning,
    }
}

pub struct RdsCluster {
    pub api: Arc<dyn RdsApi>,
    pub cluster_name: String,
    pub db_cluster_id: String,
    pub subnet_group: String,
    pub security_group_id: String,
}

#[async_trait]
impl CloudResource for RdsCluster {
    type Output = DbClusterDesc;

    fn name(&self) -> &str {
        &self.db_cluster_id
    }

    fn recreate_on_failure(&self) -> bool {
        true
    }

    async fn observe(&self) -> Result<Observation<DbClusterDesc>> {
        match self.api.describe_db_cluster(&self.db_cluster_id).await? {
            Some(desc) => {
                let status = desc.status.clone();
                Ok(map_db_status(&status, desc))
            }
            None => Ok(Observation::Absent),
        }
    }

    async fn create(&self) -> Result<CreateOutcome> {
        self.api
            .create_db_cluster(
                &self.db_cluster_id,
                &self.cluster_name,
                &self.subnet_group,
                &self.security_group_id,
            )
            .await
    }

    async fn delete(&self) -> Result<DeleteOutcome> {
        self.api.delete_db_cluster(&self.db_cluster_id).await
    }
}

pub struct RdsInstance {
    pub api: Arc<dyn RdsApi>,
    pub db_instance_id: String,
    pub db_cluster_id: String,
    pub instance_class: String,
}

#[async_trait]
impl CloudResource for RdsInstance {
    type Output = DbInstanceDesc;

    fn name(&self) -> &str {
        &self.db_instance_id
    }

    fn recreate_on_failure(&self) -> bool {
        true
    }

    async fn observe(&self) -> Result<Observation<DbInstanceDesc>> {
        match self.api.describe_db_instance(&self.db_instance_id).await? {
            Some(desc) => {
                let status = desc.status.clone();
                Ok(map_db_status(&status, desc))
            }
            None => Ok(Observation::Absent),
        }
    }

    async fn create(&self) -> Result<CreateOutcome> {
        self.api
            .create_db_instance(&self.db_instance_id, &self.db_cluster_id, &self.instance_class)
            .await
    }

    async fn delete(&self) -> Result<DeleteOutcome> {
        self.api.delete_db_instance(&self.db_instance_id).await
    }
}
