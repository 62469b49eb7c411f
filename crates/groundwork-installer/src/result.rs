//! What infrastructure provisioning hands back

use std::collections::BTreeMap;

/// Everything later phases need from the provisioned infrastructure
#[derive(Debug, Clone)]
pub struct ClusterInfraResult {
    /// Rendered kubeconfig for the new cluster
    pub kubeconfig: String,
    /// PostgreSQL endpoint, reachable only inside the cluster network
    pub db_endpoint: String,
    /// Database name for the cluster's internal state
    pub db_name: String,
    /// Provider identities handed to in-cluster components, keyed by
    /// component name (cert-manager, external-dns, ...)
    pub component_identities: BTreeMap<String, String>,
}
