//! Shared types for the groundwork installer workspace
//!
//! Holds the error taxonomy, the rendered cluster configuration consumed by
//! the per-provider orchestrators, and the whole-task retry helper used by
//! the creation supervisor.

pub mod config;
pub mod error;
pub mod retry;

pub use config::{AwsConfig, CloudProvider, ClusterConfig, GcpConfig, CLUSTER_DB_NAME, CLUSTER_TAG_KEY};
pub use error::{Error, Result};
pub use retry::{retry_task, RetryTaskConfig};
