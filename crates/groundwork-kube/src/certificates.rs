//! Certificate self-heal
//!
//! An ACME order can end up permanently invalid (rate limits, CAA
//! misconfiguration fixed after the fact). cert-manager will not retry an
//! invalid order on its own; deleting the Certificate and its in-flight
//! CertificateRequests makes the owning controller mint fresh ones.
//!
//! Detection is a substring match on the Ready condition message because
//! the issuer reports no structured reason for this case. If the upstream
//! wording changes, this check stops firing and certificates stay stuck.

use async_trait::async_trait;
use kube::api::DeleteParams;
use kube::{Api, Client, ResourceExt};
use tracing::{info, warn};

use groundwork_common::Result;

use crate::crd::{Certificate, CertificateRequest};
use crate::snapshot::ClusterSnapshot;

#[cfg(test)]
use mockall::automock;

/// Upstream failure message fragment marking a dead ACME order
pub const INVALID_ACME_ORDER_SNIPPET: &str = "order is in \"invalid\" state";

/// Deletion seam, mockable in tests
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CertificateOps: Send + Sync {
    async fn delete_certificate(&self, namespace: &str, name: &str) -> Result<()>;
    async fn delete_certificate_request(&self, namespace: &str, name: &str) -> Result<()>;
}

/// Real implementation over a kube client
pub struct KubeCertificateOps {
    pub client: Client,
}

#[async_trait]
impl CertificateOps for KubeCertificateOps {
    async fn delete_certificate(&self, namespace: &str, name: &str) -> Result<()> {
        let api: Api<Certificate> = Api::namespaced(self.client.clone(), namespace);
        match api.delete(name, &DeleteParams::default()).await {
            Ok(_) => Ok(()),
            Err(kube::Error::Api(ae)) if ae.code == 404 => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete_certificate_request(&self, namespace: &str, name: &str) -> Result<()> {
        let api: Api<CertificateRequest> = Api::namespaced(self.client.clone(), namespace);
        match api.delete(name, &DeleteParams::default()).await {
            Ok(_) => Ok(()),
            Err(kube::Error::Api(ae)) if ae.code == 404 => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

fn has_invalid_order(cert: &Certificate) -> bool {
    cert.ready_condition()
        .and_then(|c| c.message.as_deref())
        .map(|m| m.contains(INVALID_ACME_ORDER_SNIPPET))
        .unwrap_or(false)
}

/// Delete certificates stuck on an invalid ACME order, together with their
/// in-flight requests. Returns the number of certificates healed.
pub async fn heal_failed_certificates(
    snapshot: &ClusterSnapshot,
    ops: &dyn CertificateOps,
) -> Result<u32> {
    let mut healed = 0;

    for cert in snapshot.certificates.values() {
        if !has_invalid_order(cert) {
            continue;
        }
        let namespace = cert.namespace().unwrap_or_default();
        let name = cert.name_any();
        warn!(
            certificate = %name,
            namespace = %namespace,
            "certificate stuck on invalid ACME order, deleting for re-issue"
        );

        for request in snapshot.certificate_requests.values() {
            let owned = request
                .metadata
                .owner_references
                .as_deref()
                .unwrap_or(&[])
                .iter()
                .any(|or| or.kind == "Certificate" && or.name == name);
            if owned && request.namespace().as_deref() == Some(namespace.as_str()) {
                ops.delete_certificate_request(&namespace, &request.name_any())
                    .await?;
            }
        }

        ops.delete_certificate(&namespace, &name).await?;
        healed += 1;
    }

    if healed > 0 {
        info!(healed, "certificates deleted for re-issue");
    }
    Ok(healed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::{CertificateCondition, CertificateSpec, CertificateStatus};
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};

    fn certificate(name: &str, message: Option<&str>) -> Certificate {
        let mut cert = Certificate::new(name, CertificateSpec::default());
        cert.metadata.namespace = Some("ingress".to_string());
        cert.status = message.map(|m| CertificateStatus {
            conditions: vec![CertificateCondition {
                r#type: "Ready".to_string(),
                status: "False".to_string(),
                reason: Some("Failed".to_string()),
                message: Some(m.to_string()),
            }],
        });
        cert
    }

    fn request_owned_by(cert_name: &str, name: &str) -> CertificateRequest {
        let mut req = CertificateRequest::new(name, Default::default());
        req.metadata = ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some("ingress".to_string()),
            owner_references: Some(vec![OwnerReference {
                api_version: "cert-manager.io/v1".to_string(),
                kind: "Certificate".to_string(),
                name: cert_name.to_string(),
                uid: "u1".to_string(),
                ..Default::default()
            }]),
            ..Default::default()
        };
        req
    }

    #[tokio::test]
    async fn invalid_order_certificate_and_requests_deleted() {
        let mut snapshot = ClusterSnapshot::default();
        snapshot.certificates.insert(
            "ingress/https-cert".to_string(),
            certificate(
                "https-cert",
                Some("acme: order is in \"invalid\" state, cannot proceed"),
            ),
        );
        snapshot.certificate_requests.insert(
            "ingress/https-cert-1".to_string(),
            request_owned_by("https-cert", "https-cert-1"),
        );

        let mut ops = MockCertificateOps::new();
        ops.expect_delete_certificate_request()
            .withf(|ns, name| ns == "ingress" && name == "https-cert-1")
            .times(1)
            .returning(|_, _| Ok(()));
        ops.expect_delete_certificate()
            .withf(|ns, name| ns == "ingress" && name == "https-cert")
            .times(1)
            .returning(|_, _| Ok(()));

        let healed = heal_failed_certificates(&snapshot, &ops).await.unwrap();
        assert_eq!(healed, 1);
    }

    #[tokio::test]
    async fn healthy_and_pending_certificates_untouched() {
        let mut snapshot = ClusterSnapshot::default();
        snapshot.certificates.insert(
            "ingress/pending".to_string(),
            certificate("pending", Some("waiting for dns-01 propagation")),
        );
        snapshot
            .certificates
            .insert("ingress/silent".to_string(), certificate("silent", None));

        let ops = MockCertificateOps::new();
        let healed = heal_failed_certificates(&snapshot, &ops).await.unwrap();
        assert_eq!(healed, 0);
    }

    #[tokio::test]
    async fn unrelated_requests_survive() {
        let mut snapshot = ClusterSnapshot::default();
        snapshot.certificates.insert(
            "ingress/broken".to_string(),
            certificate("broken", Some("order is in \"invalid\" state")),
        );
        snapshot.certificate_requests.insert(
            "ingress/other-1".to_string(),
            request_owned_by("other", "other-1"),
        );

        let mut ops = MockCertificateOps::new();
        ops.expect_delete_certificate()
            .times(1)
            .returning(|_, _| Ok(()));
        // No delete_certificate_request expectation: calling it would panic.
        let healed = heal_failed_certificates(&snapshot, &ops).await.unwrap();
        assert_eq!(healed, 1);
    }
}
