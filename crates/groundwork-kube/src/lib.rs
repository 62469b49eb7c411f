//! Kubernetes-side machinery for the installer
//!
//! A single-writer snapshot of the watched cluster state, rollout
//! predicates over it, the certificate self-heal, the readiness waits, and
//! the handful of direct writes the installer performs itself.

pub mod bootstrap;
pub mod certificates;
pub mod crd;
pub mod feed;
pub mod readiness;
pub mod rollout;
pub mod snapshot;

pub use bootstrap::{bootstrap_cluster, ClusterAccess, KubeClusterAccess, SYSTEM_NAMESPACE};
pub use certificates::{heal_failed_certificates, CertificateOps, KubeCertificateOps};
pub use readiness::{wait_for_controller_deployment, wait_for_convergence, CONTROLLER_DEPLOYMENT};
pub use snapshot::{spawn_reducer, ClusterSnapshot, SnapshotStore, WatchEvent, WatchedObject};
