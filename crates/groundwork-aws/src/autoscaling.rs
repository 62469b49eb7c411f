//! Worker node group: launch configuration and autoscaling group

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use groundwork_cloud::{CloudResource, CreateOutcome, DeleteOutcome, Observation};
use groundwork_common::Result;

use crate::api::{AsgDesc, AutoscalingApi};

pub struct LaunchConfiguration {
    pub api: Arc<dyn AutoscalingApi>,
    pub config_name: String,
    pub instance_type: String,
    pub instance_profile_arn: String,
    pub security_group_id: String,
    /// Bootstrap script joining the node to the EKS cluster
    pub user_data: String,
}

#[async_trait]
impl CloudResource for LaunchConfiguration {
    type Output = String;

    fn name(&self) -> &str {
        &self.config_name
    }

    fn poll_interval(&self) -> Duration {
        Duration::from_secs(1)
    }

    async fn observe(&self) -> Result<Observation<String>> {
        if self.api.launch_configuration_exists(&self.config_name).await? {
            Ok(Observation::Ready(self.config_name.clone()))
        } else {
            Ok(Observation::Absent)
        }
    }

    async fn create(&self) -> Result<CreateOutcome> {
        self.api
            .create_launch_configuration(
                &self.config_name,
                &self.instance_type,
                &self.instance_profile_arn,
                &self.security_group_id,
                &self.user_data,
            )
            .await
    }

    async fn delete(&self) -> Result<DeleteOutcome> {
        self.api.delete_launch_configuration(&self.config_name).await
    }
}

pub struct AutoscalingGroup {
    pub api: Arc<dyn AutoscalingApi>,
    pub cluster_name: String,
    pub group_name: String,
    pub launch_configuration: String,
    pub subnet_ids: Vec<String>,
    pub desired_capacity: u32,
}

#[async_trait]
impl CloudResource for AutoscalingGroup {
    type Output = AsgDesc;

    fn name(&self) -> &str {
        &self.group_name
    }

    async fn observe(&self) -> Result<Observation<AsgDesc>> {
        match self.api.describe_autoscaling_group(&self.group_name).await? {
            Some(asg) => Ok(Observation::Ready(asg)),
            None => Ok(Observation::Absent),
        }
    }

    async fn create(&self) -> Result<CreateOutcome> {
        self.api
            .create_autoscaling_group(
                &self.group_name,
                &self.cluster_name,
                &self.launch_configuration,
                &self.subnet_ids,
                self.desired_capacity,
            )
            .await
    }

    async fn delete(&self) -> Result<DeleteOutcome> {
        self.api.delete_autoscaling_group(&self.group_name).await
    }
}

/// Bootstrap script for EKS worker nodes
pub fn node_user_data(cluster_name: &str) -> String {
    format!(
        "#!/bin/bash\nset -o xtrace\n/etc/eks/bootstrap.sh {cluster_name}\n"
    )
}
