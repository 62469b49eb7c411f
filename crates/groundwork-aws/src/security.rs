//! Security groups
//!
//! Groups are looked up by group name within the VPC. Rule authorization
//! happens after the group exists; the API seam folds duplicate-rule
//! conflicts, so replaying a rule set is harmless.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use groundwork_cloud::{CloudResource, CreateOutcome, DeleteOutcome, Observation};
use groundwork_common::Result;

use crate::api::{Ec2Api, SecurityGroupDesc, SecurityGroupRule};

pub struct SecurityGroup {
    pub api: Arc<dyn Ec2Api>,
    pub cluster_name: String,
    pub vpc_id: String,
    pub group_name: String,
    pub description: String,
}

#[async_trait]
impl CloudResource for SecurityGroup {
    type Output = SecurityGroupDesc;

    fn name(&self) -> &str {
        &self.group_name
    }

    fn poll_interval(&self) -> Duration {
        Duration::from_secs(5)
    }

    async fn observe(&self) -> Result<Observation<SecurityGroupDesc>> {
        match self
            .api
            .find_security_group(&self.vpc_id, &self.group_name)
            .await?
        {
            Some(group) => Ok(Observation::Ready(group)),
            None => Ok(Observation::Absent),
        }
    }

    async fn create(&self) -> Result<CreateOutcome> {
        self.api
            .create_security_group(
                &self.cluster_name,
                &self.vpc_id,
                &self.group_name,
                &self.description,
            )
            .await
    }

    async fn delete(&self) -> Result<DeleteOutcome> {
        match self
            .api
            .find_security_group(&self.vpc_id, &self.group_name)
            .await?
        {
            Some(group) => self.api.delete_security_group(&group.id).await,
            None => Ok(DeleteOutcome::NotFound),
        }
    }
}

impl SecurityGroupRule {
    pub fn all_traffic_from_cidr(cidr: &str) -> Self {
        Self {
            protocol: "-1".to_string(),
            from_port: 0,
            to_port: 0,
            cidr_block: Some(cidr.to_string()),
            source_group_id: None,
        }
    }

    pub fn tcp_from_group(port: i32, group_id: &str) -> Self {
        Self {
            protocol: "tcp".to_string(),
            from_port: port,
            to_port: port,
            cidr_block: None,
            source_group_id: Some(group_id.to_string()),
        }
    }

    pub fn tcp_range_from_group(from_port: i32, to_port: i32, group_id: &str) -> Self {
        Self {
            protocol: "tcp".to_string(),
            from_port,
            to_port,
            cidr_block: None,
            source_group_id: Some(group_id.to_string()),
        }
    }
}

/// Rules allowing the control plane and workers to talk to each other and
/// the world; replayed on every run
pub async fn apply_cluster_rules(
    api: &dyn Ec2Api,
    master_group_id: &str,
    worker_group_id: &str,
) -> Result<()> {
    // Workers accept everything from peers and the control plane.
    api.authorize_ingress(
        worker_group_id,
        &SecurityGroupRule::tcp_range_from_group(0, 65535, worker_group_id),
    )
    .await?;
    api.authorize_ingress(
        worker_group_id,
        &SecurityGroupRule::tcp_range_from_group(0, 65535, master_group_id),
    )
    .await?;
    // Control plane accepts API and webhook traffic from workers.
    api.authorize_ingress(
        master_group_id,
        &SecurityGroupRule::tcp_from_group(443, worker_group_id),
    )
    .await?;
    api.authorize_ingress(
        master_group_id,
        &SecurityGroupRule::tcp_range_from_group(1025, 65535, worker_group_id),
    )
    .await?;
    api.authorize_egress(
        master_group_id,
        &SecurityGroupRule::all_traffic_from_cidr("0.0.0.0/0"),
    )
    .await?;
    api.authorize_egress(
        worker_group_id,
        &SecurityGroupRule::all_traffic_from_cidr("0.0.0.0/0"),
    )
    .await?;
    Ok(())
}

/// Allow workers to reach the database on the PostgreSQL port
pub async fn apply_db_rules(
    api: &dyn Ec2Api,
    db_group_id: &str,
    worker_group_id: &str,
) -> Result<()> {
    api.authorize_ingress(
        db_group_id,
        &SecurityGroupRule::tcp_from_group(5432, worker_group_id),
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockEc2Api;

    #[tokio::test]
    async fn group_lookup_is_scoped_to_vpc_and_name() {
        let mut api = MockEc2Api::new();
        api.expect_find_security_group()
            .withf(|vpc, name| vpc == "vpc-1" && name == "dev-worker")
            .returning(|_, _| {
                Ok(Some(SecurityGroupDesc {
                    id: "sg-9".to_string(),
                    group_name: "dev-worker".to_string(),
                }))
            });

        let group = SecurityGroup {
            api: Arc::new(api),
            cluster_name: "dev".to_string(),
            vpc_id: "vpc-1".to_string(),
            group_name: "dev-worker".to_string(),
            description: "worker nodes".to_string(),
        };
        match group.observe().await.unwrap() {
            Observation::Ready(desc) => assert_eq!(desc.id, "sg-9"),
            other => panic!("expected Ready, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn cluster_rules_cover_both_directions() {
        let mut api = MockEc2Api::new();
        api.expect_authorize_ingress().times(4).returning(|_, _| Ok(()));
        api.expect_authorize_egress().times(2).returning(|_, _| Ok(()));
        apply_cluster_rules(&api, "sg-master", "sg-worker").await.unwrap();
    }

    #[tokio::test]
    async fn db_rule_targets_postgres_port() {
        let mut api = MockEc2Api::new();
        api.expect_authorize_ingress()
            .withf(|group, rule| {
                group == "sg-db"
                    && rule.from_port == 5432
                    && rule.source_group_id.as_deref() == Some("sg-worker")
            })
            .times(1)
            .returning(|_, _| Ok(()));
        apply_db_rules(&api, "sg-db", "sg-worker").await.unwrap();
    }
}
