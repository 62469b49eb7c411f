//! Rendered cluster configuration
//!
//! The installer consumes a fully-rendered configuration: every default has
//! already been applied by the caller, so the structs here hold concrete
//! values only. Validation is fail-fast and runs before any cloud call.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Tag/label key marking every cloud resource owned by a cluster
pub const CLUSTER_TAG_KEY: &str = "groundwork_cluster_name";

/// Name of the database created for the cluster's internal state
pub const CLUSTER_DB_NAME: &str = "groundwork";

/// Target cloud provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CloudProvider {
    Aws,
    Gcp,
}

impl CloudProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            CloudProvider::Aws => "aws",
            CloudProvider::Gcp => "gcp",
        }
    }
}

/// AWS-specific settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AwsConfig {
    pub region: String,
    pub zone_suffix: String,
    pub instance_type: String,
    /// IAM role ARNs granted system:masters through the aws-auth map
    pub eks_admin_roles: Vec<String>,
}

/// GCP-specific settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GcpConfig {
    pub project_id: String,
    pub region: String,
    pub zone_suffix: String,
    pub machine_type: String,
}

/// Fully-rendered cluster configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterConfig {
    pub cluster_name: String,
    pub cloud_provider: CloudProvider,
    pub node_count: u32,
    pub tenants: Vec<String>,
    pub log_retention_days: u32,
    pub metric_retention_days: u32,
    pub controller_image: String,
    pub dns_name: String,
    /// Networks allowed to reach the cluster API endpoints, CIDR notation
    pub authorized_networks: Vec<String>,
    pub aws: Option<AwsConfig>,
    pub gcp: Option<GcpConfig>,
}

impl ClusterConfig {
    /// Validate the rendered configuration before any cloud call
    ///
    /// Cluster names end up in DNS labels, bucket names and tag values, so
    /// the character set is the strictest intersection of those.
    pub fn validate(&self) -> Result<()> {
        if self.cluster_name.is_empty() || self.cluster_name.len() > 23 {
            return Err(Error::config_field(
                "cluster_name",
                "must be 1-23 characters",
            ));
        }
        if !self
            .cluster_name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
            || self.cluster_name.starts_with('-')
            || self.cluster_name.ends_with('-')
        {
            return Err(Error::config_field(
                "cluster_name",
                "must match [a-z0-9-] and not begin or end with a dash",
            ));
        }
        if self.node_count == 0 {
            return Err(Error::config_field("node_count", "must be at least 1"));
        }
        if self.tenants.is_empty() {
            return Err(Error::config_field("tenants", "at least one tenant required"));
        }
        match self.cloud_provider {
            CloudProvider::Aws => {
                let aws = self
                    .aws
                    .as_ref()
                    .ok_or_else(|| Error::config_field("aws", "required for provider aws"))?;
                if aws.region.is_empty() {
                    return Err(Error::config_field("aws.region", "must not be empty"));
                }
            }
            CloudProvider::Gcp => {
                let gcp = self
                    .gcp
                    .as_ref()
                    .ok_or_else(|| Error::config_field("gcp", "required for provider gcp"))?;
                if gcp.project_id.is_empty() {
                    return Err(Error::config_field("gcp.project_id", "must not be empty"));
                }
                if gcp.region.is_empty() {
                    return Err(Error::config_field("gcp.region", "must not be empty"));
                }
            }
        }
        Ok(())
    }

    /// Name of an object storage bucket owned by this cluster
    pub fn bucket_name(&self, suffix: &str) -> String {
        format!("{}-{}", self.cluster_name, suffix)
    }

    /// The standard ownership tag pair applied to every created resource
    pub fn cluster_tag(&self) -> (String, String) {
        (CLUSTER_TAG_KEY.to_string(), self.cluster_name.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> ClusterConfig {
        ClusterConfig {
            cluster_name: "dev".to_string(),
            cloud_provider: CloudProvider::Aws,
            node_count: 3,
            tenants: vec!["default".to_string()],
            log_retention_days: 7,
            metric_retention_days: 7,
            controller_image: "groundwork/controller:latest".to_string(),
            dns_name: "dev.groundwork.example.".to_string(),
            authorized_networks: vec!["0.0.0.0/0".to_string()],
            aws: Some(AwsConfig {
                region: "us-west-2".to_string(),
                zone_suffix: "a".to_string(),
                instance_type: "t3.xlarge".to_string(),
                eks_admin_roles: vec![],
            }),
            gcp: None,
        }
    }

    #[test]
    fn valid_config_passes() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn cluster_name_character_set_enforced() {
        let mut cfg = base_config();
        cfg.cluster_name = "Has_Caps".to_string();
        assert!(cfg.validate().is_err());

        cfg.cluster_name = "-leading".to_string();
        assert!(cfg.validate().is_err());

        cfg.cluster_name = "x".repeat(24);
        assert!(cfg.validate().is_err());

        cfg.cluster_name = "ok-name-7".to_string();
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn provider_section_required() {
        let mut cfg = base_config();
        cfg.aws = None;
        assert!(matches!(
            cfg.validate(),
            Err(Error::Config { field: Some(f), .. }) if f == "aws"
        ));

        let mut cfg = base_config();
        cfg.cloud_provider = CloudProvider::Gcp;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn zero_nodes_rejected() {
        let mut cfg = base_config();
        cfg.node_count = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn bucket_names_are_cluster_scoped() {
        let cfg = base_config();
        assert_eq!(cfg.bucket_name("loki"), "dev-loki");
        assert_eq!(cfg.cluster_tag().0, CLUSTER_TAG_KEY);
    }
}
