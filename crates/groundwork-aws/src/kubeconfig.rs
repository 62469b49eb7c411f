//! Kubeconfig rendering for EKS clusters
//!
//! The rendered document authenticates through the provider CLI credential
//! plugin; no token is minted here.

use serde_json::json;

use groundwork_common::{Error, Result};

use crate::api::EksDesc;

/// Render a kubeconfig string for an ACTIVE EKS cluster.
pub fn kubeconfig_for_eks(region: &str, cluster: &EksDesc) -> Result<String> {
    let endpoint = cluster.endpoint.as_deref().ok_or_else(|| {
        Error::api("aws", &cluster.name, "cluster has no endpoint yet")
    })?;
    let ca_data = cluster
        .certificate_authority_data
        .as_deref()
        .ok_or_else(|| {
            Error::api("aws", &cluster.name, "cluster has no certificate authority data yet")
        })?;

    let doc = json!({
        "apiVersion": "v1",
        "kind": "Config",
        "clusters": [{
            "name": cluster.name,
            "cluster": {
                "server": endpoint,
                "certificate-authority-data": ca_data,
            }
        }],
        "contexts": [{
            "name": cluster.name,
            "context": { "cluster": cluster.name, "user": cluster.name }
        }],
        "current-context": cluster.name,
        "users": [{
            "name": cluster.name,
            "user": {
                "exec": {
                    "apiVersion": "client.authentication.k8s.io/v1beta1",
                    "command": "aws",
                    "args": [
                        "--region", region,
                        "eks", "get-token",
                        "--cluster-name", cluster.name
                    ]
                }
            }
        }]
    });

    serde_yaml::to_string(&doc).map_err(|e| Error::serialization(e.to_string()))
}
