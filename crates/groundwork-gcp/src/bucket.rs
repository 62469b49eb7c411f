//! GCS buckets with retention lifecycle

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use groundwork_cloud::{CloudResource, CreateOutcome, DeleteOutcome, Observation};
use groundwork_common::Result;

use crate::api::GcsApi;

pub struct GcsBucket {
    pub api: Arc<dyn GcsApi>,
    pub bucket_name: String,
    pub region: String,
    pub retention_days: u32,
}

#[async_trait]
impl CloudResource for GcsBucket {
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

    async fn create(&self) -> Result<CreateOutcome> {
        self.api
            .create_bucket(&self.bucket_name, &self.region, self.retention_days)
            .await
    }

    async fn delete(&self) -> Result<DeleteOutcome> {
        self.api.delete_bucket(&self.bucket_name).await
    }
}
