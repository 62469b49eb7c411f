//! Cluster installer
//!
//! Ties the provider orchestration graphs, the attempt supervisor and the
//! Kubernetes finish line together behind two entry points:
//! [`create_cluster`] and [`destroy_cluster`]. Callers hand in a validated
//! configuration and the provider API seams; everything in between is
//! idempotent and safe to re-run against partial infrastructure.

pub mod aws;
pub mod create;
pub mod gcp;
pub mod platform;
pub mod result;
pub mod supervisor;

pub use aws::AwsApis;
pub use create::{create_cluster, destroy_cluster, ClusterPlatform};
pub use gcp::GcpApis;
pub use platform::{AwsPlatform, GcpPlatform};
pub use result::ClusterInfraResult;
