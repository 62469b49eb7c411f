//! AWS resource reconciliation
//!
//! Per-kind [`groundwork_cloud::CloudResource`] implementations over the
//! API seam traits in [`api`]. The dependency ordering between kinds lives
//! with the orchestrator, not here.

pub mod api;
pub mod auth;
pub mod autoscaling;
pub mod eks;
pub mod iam;
pub mod kubeconfig;
pub mod network;
pub mod policies;
pub mod rds;
pub mod route53;
pub mod s3;
pub mod security;
pub mod sts;
