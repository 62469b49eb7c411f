//! GCP resource reconciliation
//!
//! Per-kind [`groundwork_cloud::CloudResource`] implementations over the
//! API seams in [`api`], plus the peering sequence with its followed
//! long-running operation.

pub mod api;
pub mod bucket;
pub mod cloudsql;
pub mod dns;
pub mod gke;
pub mod kubeconfig;
pub mod network;
pub mod peering;
pub mod serviceaccount;
