//! S3 buckets with retention lifecycle

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use groundwork_cloud::{CloudResource, CreateOutcome, DeleteOutcome, Observation};
use groundwork_common::Result;

use crate::api::S3Api;

pub struct S3Bucket {
    pub api: Arc<dyn S3Api>,
    pub cluster_name: String,
    pub bucket_name: String,
    pub region: String,
    pub retention_days: u32,
}

#[async_trait]
impl CloudResource for S3Bucket {
    type Output = String;

    fn name(&self) -> &str {
        &self.bucket_name
    }

    fn poll_interval(&self) -> Duration {
        Duration::from_secs(5)
    }

    async fn observe(&self) -> Result<Observation<String>> {
        if self.api.bucket_exists(&self.bucket_name).await? {
            Ok(Observation::Ready(self.bucket_name.clone()))
        } else {
            Ok(Observation::Absent)
        }
    }

    /// Create and configure in one step; lifecycle and tagging calls are
    /// overwrite-style and safe to replay
    async fn create(&self) -> Result<CreateOutcome> {
        let outcome = self.api.create_bucket(&self.bucket_name, &self.region).await?;
        self.api
            .put_bucket_lifecycle(&self.bucket_name, self.retention_days)
            .await?;
        self.api
            .put_bucket_tagging(&self.bucket_name, &self.cluster_name)
            .await?;
        Ok(outcome)
    }

    async fn delete(&self) -> Result<DeleteOutcome> {
        self.api.delete_bucket(&self.bucket_name).await
    }
}
