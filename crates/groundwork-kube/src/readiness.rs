//! Cluster readiness waits
//!
//! Two phases after the controller is deployed: first wait for the
//! controller Deployment itself to appear and report a ready replica, then
//! wait for everything it creates to converge. Neither wait has an internal
//! timeout; the creation supervisor bounds the whole attempt.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info};

use groundwork_common::Result;

use crate::certificates::{heal_failed_certificates, CertificateOps};
use crate::rollout::active_resources;
use crate::snapshot::ClusterSnapshot;

/// Name of the in-cluster controller Deployment
pub const CONTROLLER_DEPLOYMENT: &str = "groundwork-controller";

/// Poll interval while waiting for the controller Deployment to appear
const APPEARANCE_INTERVAL: Duration = Duration::from_secs(5);
/// Poll interval while waiting for its first ready replica
const READY_REPLICA_INTERVAL: Duration = Duration::from_secs(3);
/// Poll interval of the convergence loop
const CONVERGENCE_INTERVAL: Duration = Duration::from_secs(5);
/// Quick re-check while the snapshot has not seen any event yet
const UNPOPULATED_INTERVAL: Duration = Duration::from_secs(1);

fn find_controller(snapshot: &ClusterSnapshot) -> Option<i32> {
    snapshot
        .deployments
        .values()
        .find(|d| d.metadata.name.as_deref() == Some(CONTROLLER_DEPLOYMENT))
        .map(|d| {
            d.status
                .as_ref()
                .and_then(|s| s.ready_replicas)
                .unwrap_or(0)
        })
}

/// Wait until the controller Deployment exists and has a ready replica.
pub async fn wait_for_controller_deployment(
    snapshots: &watch::Receiver<Arc<ClusterSnapshot>>,
) -> Result<()> {
    loop {
        let snapshot = snapshots.borrow().clone();
        match find_controller(&snapshot) {
            Some(ready) if ready >= 1 => {
                info!(deployment = CONTROLLER_DEPLOYMENT, "controller deployment ready");
                return Ok(());
            }
            Some(_) => {
                debug!(
                    deployment = CONTROLLER_DEPLOYMENT,
                    "controller deployment present, waiting for ready replica"
                );
                tokio::time::sleep(READY_REPLICA_INTERVAL).await;
            }
            None => {
                debug!(
                    deployment = CONTROLLER_DEPLOYMENT,
                    "waiting for controller deployment to appear"
                );
                tokio::time::sleep(APPEARANCE_INTERVAL).await;
            }
        }
    }
}

/// Wait until no tracked resource is still converging.
///
/// Runs the certificate self-heal every cycle so a stuck ACME order does
/// not hold convergence hostage.
pub async fn wait_for_convergence(
    snapshots: &watch::Receiver<Arc<ClusterSnapshot>>,
    cert_ops: &dyn CertificateOps,
) -> Result<()> {
    loop {
        let snapshot = snapshots.borrow().clone();

        if snapshot.is_unpopulated() {
            debug!("no watch events yet, deferring convergence check");
            tokio::time::sleep(UNPOPULATED_INTERVAL).await;
            continue;
        }

        heal_failed_certificates(&snapshot, cert_ops).await?;

        let active = active_resources(&snapshot);
        if active.is_empty() {
            info!("all tracked resources converged");
            return Ok(());
        }

        info!(
            remaining = active.len(),
            next = %active[0],
            "waiting for resources to converge"
        );
        tokio::time::sleep(CONVERGENCE_INTERVAL).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::certificates::MockCertificateOps;
    use k8s_openapi::api::apps::v1::{Deployment, DeploymentStatus};
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

    fn controller(ready: Option<i32>) -> Deployment {
        Deployment {
            metadata: ObjectMeta {
                name: Some(CONTROLLER_DEPLOYMENT.to_string()),
                namespace: Some("groundwork-system".to_string()),
                ..Default::default()
            },
            spec: None,
            status: Some(DeploymentStatus {
                ready_replicas: ready,
                ..Default::default()
            }),
        }
    }

    fn publish(snapshot: ClusterSnapshot) -> watch::Receiver<Arc<ClusterSnapshot>> {
        let (tx, rx) = watch::channel(Arc::new(snapshot));
        // Keep the sender alive for the duration of the test.
        std::mem::forget(tx);
        rx
    }

    #[tokio::test(start_paused = true)]
    async fn controller_wait_progresses_through_phases() {
        let (tx, rx) = watch::channel(Arc::new(ClusterSnapshot::default()));

        let waiter = tokio::spawn({
            let rx = rx.clone();
            async move { wait_for_controller_deployment(&rx).await }
        });

        // Appear without ready replicas.
        let mut appeared = ClusterSnapshot::default();
        appeared
            .deployments
            .insert("groundwork-system/ctl".to_string(), controller(None));
        appeared.events_applied = 1;
        tx.send(Arc::new(appeared)).unwrap();
        tokio::time::sleep(Duration::from_secs(6)).await;
        assert!(!waiter.is_finished());

        // First replica ready.
        let mut ready = ClusterSnapshot::default();
        ready
            .deployments
            .insert("groundwork-system/ctl".to_string(), controller(Some(1)));
        ready.events_applied = 2;
        tx.send(Arc::new(ready)).unwrap();
        tokio::time::sleep(Duration::from_secs(4)).await;
        waiter.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn convergence_defers_while_unpopulated() {
        let rx = publish(ClusterSnapshot::default());
        let ops = MockCertificateOps::new();
        let wait = wait_for_convergence(&rx, &ops);
        tokio::select! {
            _ = wait => panic!("must not converge on an unpopulated snapshot"),
            _ = tokio::time::sleep(Duration::from_secs(10)) => {}
        }
    }

    #[tokio::test]
    async fn convergence_finishes_on_quiet_populated_snapshot() {
        let mut snapshot = ClusterSnapshot::default();
        snapshot.events_applied = 5;
        let rx = publish(snapshot);
        let ops = MockCertificateOps::new();
        wait_for_convergence(&rx, &ops).await.unwrap();
    }
}
