//! Kubeconfig rendering for GKE clusters

use serde_json::json;

use groundwork_common::{Error, Result};

use crate::api::GkeDesc;

/// Render a kubeconfig string for a RUNNING GKE cluster.
pub fn kubeconfig_for_gke(project_id: &str, cluster: &GkeDesc) -> Result<String> {
    let endpoint = cluster
        .endpoint
        .as_deref()
        .ok_or_else(|| Error::api("gcp", &cluster.name, "cluster has no endpoint yet"))?;
    let ca = cluster
        .cluster_ca_certificate
        .as_deref()
        .ok_or_else(|| Error::api("gcp", &cluster.name, "cluster has no CA certificate yet"))?;

    let context = format!("gke_{project_id}_{}", cluster.name);
    let doc = json!({
        "apiVersion": "v1",
        "kind": "Config",
        "clusters": [{
            "name": context,
            "cluster": {
                "server": format!("https://{endpoint}"),
                "certificate-authority-data": ca,
            }
        }],
        "contexts": [{
            "name": context,
            "context": { "cluster": context, "user": context }
        }],
        "current-context": context,
        "users": [{
            "name": context,
            "user": {
                "exec": {
                    "apiVersion": "client.authentication.k8s.io/v1beta1",
                    "command": "gke-gcloud-auth-plugin",
                    "provideClusterInfo": true
                }
            }
        }]
    });

    serde_yaml::to_string(&doc).map_err(|e| Error::serialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_context_and_auth_plugin() {
        let cluster = GkeDesc {
            name: "dev".to_string(),
            status: "RUNNING".to_string(),
            endpoint: Some("34.1.2.3".to_string()),
            cluster_ca_certificate: Some("Y2E=".to_string()),
            status_message: None,
        };
        let kc = kubeconfig_for_gke("my-project", &cluster).unwrap();
        assert!(kc.contains("gke_my-project_dev"));
        assert!(kc.contains("https://34.1.2.3"));
        assert!(kc.contains("gke-gcloud-auth-plugin"));
    }

    #[test]
    fn missing_ca_is_an_error() {
        let cluster = GkeDesc {
            name: "dev".to_string(),
            status: "RUNNING".to_string(),
            endpoint: Some("34.1.2.3".to_string()),
            cluster_ca_certificate: None,
            status_message: None,
        };
        assert!(kubeconfig_for_gke("my-project", &cluster).is_err());
    }
}
