//! IAM roles, policies and instance profiles
//!
//! IAM has no transitional states worth polling; existence is the whole
//! story. Attachment calls are idempotent at the API seam.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use groundwork_cloud::{CloudResource, CreateOutcome, DeleteOutcome, Observation};
use groundwork_common::Result;

use crate::api::{IamApi, InstanceProfileDesc, PolicyDesc, RoleDesc};

pub struct IamRole {
    pub api: Arc<dyn IamApi>,
    pub role_name: String,
    pub assume_role_policy: Value,
}

#[async_trait]
impl CloudResource for IamRole {
    type Output = RoleDesc;

    fn name(&self) -> &str {
        &self.role_name
    }

    fn poll_interval(&self) -> Duration {
        Duration::from_secs(1)
    }

    async fn observe(&self) -> Result<Observation<RoleDesc>> {
        match self.api.find_role(&self.role_name).await? {
            Some(role) => Ok(Observation::Ready(role)),
            None => Ok(Observation::Absent),
        }
    }

    async fn create(&self) -> Result<CreateOutcome> {
        self.api
            .create_role(&self.role_name, &self.assume_role_policy)
            .await
    }

    async fn delete(&self) -> Result<DeleteOutcome> {
        self.api.delete_role(&self.role_name).await
    }
}

pub struct IamPolicy {
    pub api: Arc<dyn IamApi>,
    pub policy_name: String,
    pub document: Value,
}

#[async_trait]
impl CloudResource for IamPolicy {
    type Output = PolicyDesc;

    fn name(&self) -> &str {
        &self.policy_name
    }

    fn poll_interval(&self) -> Duration {
        Duration::from_secs(1)
    }

    async fn observe(&self) -> Result<Observation<PolicyDesc>> {
        match self.api.find_policy(&self.policy_name).await? {
            Some(policy) => Ok(Observation::Ready(policy)),
            None => Ok(Observation::Absent),
        }
    }

    async fn create(&self) -> Result<CreateOutcome> {
        self.api.create_policy(&self.policy_name, &self.document).await
    }

    async fn delete(&self) -> Result<DeleteOutcome> {
        match self.api.find_policy(&self.policy_name).await? {
            Some(policy) => self.api.delete_policy(&policy.arn).await,
            None => Ok(DeleteOutcome::NotFound),
        }
    }
}

pub struct InstanceProfile {
    pub api: Arc<dyn IamApi>,
    pub profile_name: String,
}

#[async_trait]
impl CloudResource for InstanceProfile {
    type Output = InstanceProfileDesc;

    fn name(&self) -> &str {
        &self.profile_name
    }

    fn poll_interval(&self) -> Duration {
        Duration::from_secs(1)
    }

    async fn observe(&self) -> Result<Observation<InstanceProfileDesc>> {
        match self.api.find_instance_profile(&self.profile_name).await? {
            Some(profile) => Ok(Observation::Ready(profile)),
            None => Ok(Observation::Absent),
        }
    }

    async fn create(&self) -> Result<CreateOutcome> {
        self.api.create_instance_profile(&self.profile_name).await
    }

    async fn delete(&self) -> Result<DeleteOutcome> {
        self.api.delete_instance_profile(&self.profile_name).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockIamApi;
    use crate::policies;
    use groundwork_cloud::ensure_exists;

    #[tokio::test(start_paused = true)]
    async fn role_create_then_found() {
        let mut api = MockIamApi::new();
        let mut finds = vec![
            Some(RoleDesc {
                name: "dev-eks-controlplane".to_string(),
                arn: "arn:aws:iam::1:role/dev-eks-controlplane".to_string(),
            }),
            None,
        ];
        api.expect_find_role()
            .times(2)
            .returning(move |_| Ok(finds.pop().expect("script exhausted")));
        api.expect_create_role()
            .times(1)
            .returning(|_, _| Ok(CreateOutcome::Created));

        let role = IamRole {
            api: Arc::new(api),
            role_name: "dev-eks-controlplane".to_string(),
            assume_role_policy: policies::eks_assume_role_document(),
        };
        let out = ensure_exists(&role).await.unwrap();
        assert!(out.arn.ends_with("dev-eks-controlplane"));
    }

    #[tokio::test]
    async fn policy_delete_resolves_arn_first() {
        let mut api = MockIamApi::new();
        api.expect_find_policy().returning(|_| {
            Ok(Some(PolicyDesc {
                name: "dev-loki-s3".to_string(),
                arn: "arn:aws:iam::1:policy/dev-loki-s3".to_string(),
            }))
        });
        api.expect_delete_policy()
            .withf(|arn| arn == "arn:aws:iam::1:policy/dev-loki-s3")
            .times(1)
            .returning(|_| Ok(DeleteOutcome::Deleted));

        let policy = IamPolicy {
            api: Arc::new(api),
            policy_name: "dev-loki-s3".to_string(),
            document: policies::s3_access_document("dev-loki"),
        };
        assert_eq!(policy.delete().await.unwrap(), DeleteOutcome::Deleted);
    }
}
