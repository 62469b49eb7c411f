//! aws-auth ConfigMap payload
//!
//! Worker nodes join the cluster only once their role is mapped in the
//! `aws-auth` ConfigMap in kube-system. The installer applies this payload
//! right after the EKS control plane is active.

use serde_json::json;

use groundwork_common::{Error, Result};

/// Render the `mapRoles` document for the aws-auth ConfigMap.
///
/// Additional admin role ARNs are mapped into `system:masters`.
pub fn map_roles_document(node_role_arn: &str, admin_role_arns: &[String]) -> Result<String> {
    let mut entries = vec![json!({
        "rolearn": node_role_arn,
        "username": "system:node:{{EC2PrivateDNSName}}",
        "groups": ["system:bootstrappers", "system:nodes"],
    })];
    for arn in admin_role_arns {
        entries.push(json!({
            "rolearn": arn,
            "username": "admin",
            "groups": ["system:masters"],
        }));
    }
    serde_yaml::to_string(&entries).map_err(|e| Error::serialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_node_role_into_node_groups() {
        let doc = map_roles_document("arn:aws:iam::1:role/dev-nodes", &[]).unwrap();
        assert!(doc.contains("arn:aws:iam::1:role/dev-nodes"));
        assert!(doc.contains("system:nodes"));
        assert!(!doc.contains("system:masters"));
    }

    #[test]
    fn admin_roles_get_masters() {
        let admins = vec!["arn:aws:iam::1:role/ops".to_string()];
        let doc = map_roles_document("arn:aws:iam::1:role/dev-nodes", &admins).unwrap();
        assert!(doc.contains("arn:aws:iam::1:role/ops"));
        assert!(doc.contains("system:masters"));
    }
}
