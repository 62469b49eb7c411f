//! Cloud SQL instance and database
//!
//! The peering can be reported established before the producer network is
//! actually usable; instance creation then fails with a not-peered error.
//! [`ensure_sql_exists`] therefore wraps instance and database creation in
//! a bounded retry window instead of trusting the first failure.
//!
//! The database is gated on the owning instance: while the instance is not
//! RUNNABLE, the database resource reports a dependency skip and the loop
//! keeps waiting without attempting a create.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;
use tracing::warn;

use groundwork_cloud::{ensure_exists, CloudResource, CreateOutcome, DeleteOutcome, Observation};
use groundwork_common::{Error, Result};

use crate::api::{SqlApi, SqlInstanceDesc};

/// Window in which instance/database creation failures are retried
pub const SQL_CREATE_DEADLINE: Duration = Duration::from_secs(15 * 60);

/// Delay between retries inside the window
pub const SQL_CREATE_RETRY_DELAY: Duration = Duration::from_secs(15);

pub struct SqlInstance {
    pub api: Arc<dyn SqlApi>,
    pub cluster_name: String,
    pub instance_name: String,
    pub network: String,
}

#[async_trait]
impl CloudResource for SqlInstance {
    type Output = SqlInstanceDesc;

    fn name(&self) -> &str {
        &self.instance_name
    }

    async fn observe(&self) -> Result<Observation<SqlInstanceDesc>> {
        match self.api.find_instance(&self.cluster_name).await? {
            Some(desc) => Ok(match desc.state.as_str() {
                "RUNNABLE" => Observation::Ready(desc),
                "FAILED" | "SUSPENDED" => Observation::Failed(desc.state),
                "STOPPING" => Observation::Terminating,
                // PENDING_CREATE, MAINTENANCE
                _ => Observation::Provisioning,
            }),
            None => Ok(Observation::Absent),
        }
    }

    async fn create(&self) -> Result<CreateOutcome> {
        self.api
            .create_instance(&self.cluster_name, &self.instance_name, &self.network)
            .await
    }

    async fn delete(&self) -> Result<DeleteOutcome> {
        match self.api.find_instance(&self.cluster_name).await? {
            Some(desc) => self.api.delete_instance(&desc.name).await,
            None => Ok(DeleteOutcome::NotFound),
        }
    }
}

/// Database inside an instance; fast polling, created only once the
/// instance reports RUNNABLE
pub struct SqlDatabase {
    pub api: Arc<dyn SqlApi>,
    pub cluster_name: String,
    pub instance_name: String,
    pub database: String,
}

#[async_trait]
impl CloudResource for SqlDatabase {
    type Output = String;

    fn name(&self) -> &str {
        &self.database
    }

    fn poll_interval(&self) -> Duration {
        Duration::from_secs(1)
    }

    async fn observe(&self) -> Result<Observation<String>> {
        // Gate on the owning instance first; a create against a non-runnable
        // instance would fail anyway.
        let instance = self.api.find_instance(&self.cluster_name).await?;
        match instance {
            Some(desc) if desc.state == "RUNNABLE" => {
                if self
                    .api
                    .database_exists(&self.instance_name, &self.database)
                    .await?
                {
                    Ok(Observation::Ready(self.database.clone()))
                } else {
                    Ok(Observation::Absent)
                }
            }
            // Instance still converging (or gone): report provisioning so
            // the loop waits without attempting a create.
            _ => Ok(Observation::Provisioning),
        }
    }

    async fn create(&self) -> Result<CreateOutcome> {
        self.api
            .create_database(&self.instance_name, &self.database)
            .await
    }

    async fn delete(&self) -> Result<DeleteOutcome> {
        self.api
            .delete_database(&self.instance_name, &self.database)
            .await
    }
}

/// Drive instance and database to existence inside the creation window.
pub async fn ensure_sql_exists(
    instance: &SqlInstance,
    database: &SqlDatabase,
) -> Result<SqlInstanceDesc> {
    let deadline = Instant::now() + SQL_CREATE_DEADLINE;

    loop {
        let attempt = async {
            let desc = ensure_exists(instance).await?;
            ensure_exists(database).await?;
            Ok::<_, Error>(desc)
        };

        tokio::select! {
            result = attempt => match result {
                Ok(desc) => return Ok(desc),
                Err(e) => {
                    if Instant::now() >= deadline {
                        return Err(e);
                    }
                    warn!(
                        instance = %instance.instance_name,
                        error = %e,
                        "Cloud SQL setup failed, retrying within creation window"
                    );
                    tokio::time::sleep(SQL_CREATE_RETRY_DELAY).await;
                }
            },
            _ = tokio::time::sleep_until(deadline) => {
                return Err(Error::api(
                    "gcp",
                    instance.instance_name.clone(),
                    "Cloud SQL setup did not complete within the creation window",
                ));
            }
        }
    }
}

/// Teardown order: database, then instance.
pub async fn ensure_sql_absent(instance: &SqlInstance, database: &SqlDatabase) -> Result<()> {
    // The database disappears with the instance; only delete it explicitly
    // when the instance is still runnable.
    if let Some(desc) = database.api.find_instance(&database.cluster_name).await? {
        if desc.state == "RUNNABLE" {
            database
                .api
                .delete_database(&database.instance_name, &database.database)
                .await?;
        }
    }
    groundwork_cloud::ensure_absent(instance).await
}
