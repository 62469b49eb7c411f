//! cert-manager resource types
//!
//! Only the fields the installer reads or writes are modeled; everything
//! else passes through the API server untouched.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Specification for a cert-manager Certificate
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "cert-manager.io",
    version = "v1",
    kind = "Certificate",
    plural = "certificates",
    status = "CertificateStatus",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct CertificateSpec {
    /// Secret the issued certificate is written to
    pub secret_name: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dns_names: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer_ref: Option<IssuerRef>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IssuerRef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CertificateStatus {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<CertificateCondition>,
}

/// Condition as reported by cert-manager
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CertificateCondition {
    pub r#type: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Specification for a cert-manager CertificateRequest
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "cert-manager.io",
    version = "v1",
    kind = "CertificateRequest",
    plural = "certificaterequests",
    status = "CertificateRequestStatus",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct CertificateRequestSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer_ref: Option<IssuerRef>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CertificateRequestStatus {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<CertificateCondition>,
}

impl Certificate {
    /// The Ready condition, if cert-manager has reported one
    pub fn ready_condition(&self) -> Option<&CertificateCondition> {
        self.status
            .as_ref()?
            .conditions
            .iter()
            .find(|c| c.r#type == "Ready")
    }

    pub fn is_ready(&self) -> bool {
        self.ready_condition().map(|c| c.status == "True").unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cert_with_condition(status: &str, message: Option<&str>) -> Certificate {
        let mut cert = Certificate::new(
            "https-cert",
            CertificateSpec {
                secret_name: "https-cert".to_string(),
                ..Default::default()
            },
        );
        cert.status = Some(CertificateStatus {
            conditions: vec![CertificateCondition {
                r#type: "Ready".to_string(),
                status: status.to_string(),
                reason: None,
                message: message.map(String::from),
            }],
        });
        cert
    }

    #[test]
    fn ready_condition_lookup() {
        assert!(cert_with_condition("True", None).is_ready());
        assert!(!cert_with_condition("False", Some("pending")).is_ready());

        let no_status = Certificate::new("c", CertificateSpec::default());
        assert!(!no_status.is_ready());
    }
}
