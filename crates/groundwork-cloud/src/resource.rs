//! Generic cloud resource reconciliation
//!
//! Every cloud resource kind implements [`CloudResource`]; the provided
//! [`ensure_exists`] and [`ensure_absent`] loops drive it to the desired
//! state. State is re-derived from a fresh provider query on every cycle
//! and never cached across cycles, so a crashed installer resumes cleanly
//! against whatever it left behind.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use groundwork_common::{Error, Result};

/// The state of one resource as re-derived from a provider query
#[derive(Debug, Clone, PartialEq)]
pub enum Observation<T> {
    /// The resource exists and is usable; carries its provider description
    Ready(T),
    /// The resource exists but is still converging toward usable
    Provisioning,
    /// The resource does not exist
    Absent,
    /// The provider reports a terminal failure state
    Failed(String),
    /// The resource is being torn down by the provider
    Terminating,
}

/// What a create call actually did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    /// The provider reported a name/id conflict; someone got there first
    AlreadyExists,
}

/// What a delete call actually did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// The resource was already gone
    NotFound,
}

/// One reconcilable cloud resource kind
///
/// `observe` must query the provider fresh each call. `create` and `delete`
/// must be idempotent: API adapters fold conflict and not-found responses
/// into [`CreateOutcome::AlreadyExists`] and [`DeleteOutcome::NotFound`]
/// rather than surfacing them as errors.
#[async_trait]
pub trait CloudResource: Send + Sync {
    /// Provider description of the ready resource, handed to dependents
    type Output: Send;

    /// Display name used in logs and error context
    fn name(&self) -> &str;

    /// Interval between observation cycles
    fn poll_interval(&self) -> Duration {
        Duration::from_secs(10)
    }

    /// Whether a Failed observation is recovered by deleting and creating
    /// again instead of surfacing an error
    ///
    /// Managed resources that can fail asynchronously after a successful
    /// create call (EKS, RDS, NAT gateways) opt in.
    fn recreate_on_failure(&self) -> bool {
        false
    }

    async fn observe(&self) -> Result<Observation<Self::Output>>;

    async fn create(&self) -> Result<CreateOutcome>;

    async fn delete(&self) -> Result<DeleteOutcome>;
}

/// Drive a resource to existence, returning its provider description.
///
/// Observes before the first create, so a re-run after a crash adopts the
/// already-created resource instead of issuing a second create.
pub async fn ensure_exists<R: CloudResource>(resource: &R) -> Result<R::Output> {
    let name = resource.name().to_string();
    let mut creation_triggered = false;

    loop {
        match resource.observe().await? {
            Observation::Ready(output) => {
                info!(resource = %name, "resource ready");
                return Ok(output);
            }
            Observation::Provisioning => {
                debug!(resource = %name, "resource still provisioning");
            }
            Observation::Terminating => {
                // A leftover teardown is still draining; wait it out, then
                // the Absent arm re-creates.
                debug!(resource = %name, "resource terminating, waiting before create");
            }
            Observation::Absent => {
                if creation_triggered {
                    debug!(resource = %name, "creation triggered, waiting for resource to appear");
                } else {
                    match resource.create().await? {
                        CreateOutcome::Created => {
                            info!(resource = %name, "creation triggered");
                        }
                        CreateOutcome::AlreadyExists => {
                            info!(resource = %name, "resource already exists, adopting");
                        }
                    }
                    creation_triggered = true;
                }
            }
            Observation::Failed(detail) => {
                if resource.recreate_on_failure() {
                    warn!(
                        resource = %name,
                        detail = %detail,
                        "resource entered failed state, deleting for re-create"
                    );
                    resource.delete().await?;
                    creation_triggered = false;
                } else {
                    return Err(Error::resource_failed(name, detail));
                }
            }
        }

        tokio::time::sleep(resource.poll_interval()).await;
    }
}

/// Drive a resource to absence.
///
/// A resource observed absent on entry completes without any delete call,
/// and one observed terminating is waited out rather than deleted again.
pub async fn ensure_absent<R: CloudResource>(resource: &R) -> Result<()> {
    let name = resource.name().to_string();
    let mut deletion_triggered = false;

    loop {
        match resource.observe().await? {
            Observation::Absent => {
                info!(resource = %name, "resource absent");
                return Ok(());
            }
            Observation::Terminating => {
                debug!(resource = %name, "resource terminating");
            }
            Observation::Ready(_) | Observation::Provisioning | Observation::Failed(_) => {
                if deletion_triggered {
                    debug!(resource = %name, "deletion triggered, waiting for resource to drain");
                } else {
                    match resource.delete().await? {
                        DeleteOutcome::Deleted => {
                            info!(resource = %name, "deletion triggered");
                        }
                        DeleteOutcome::NotFound => {
                            info!(resource = %name, "resource already gone");
                        }
                    }
                    deletion_triggered = true;
                }
            }
        }

        tokio::time::sleep(resource.poll_interval()).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    /// Scripted resource: pops one observation per cycle and counts calls.
    struct Scripted {
        observations: Mutex<Vec<Observation<String>>>,
        creates: AtomicU32,
        deletes: AtomicU32,
        recreate: bool,
    }

    impl Scripted {
        fn new(mut observations: Vec<Observation<String>>) -> Self {
            observations.reverse();
            Self {
                observations: Mutex::new(observations),
                creates: AtomicU32::new(0),
                deletes: AtomicU32::new(0),
                recreate: false,
            }
        }

        fn recreating(mut self) -> Self {
            self.recreate = true;
            self
        }
    }

    #[async_trait]
    impl CloudResource for Scripted {
        type Output = String;

        fn name(&self) -> &str {
            "scripted"
        }

        fn poll_interval(&self) -> Duration {
            Duration::from_secs(10)
        }

        fn recreate_on_failure(&self) -> bool {
            self.recreate
        }

        async fn observe(&self) -> Result<Observation<String>> {
            let mut obs = self.observations.lock().unwrap();
            Ok(obs.pop().expect("script exhausted"))
        }

        async fn create(&self) -> Result<CreateOutcome> {
            self.creates.fetch_add(1, Ordering::SeqCst);
            Ok(CreateOutcome::Created)
        }

        async fn delete(&self) -> Result<DeleteOutcome> {
            self.deletes.fetch_add(1, Ordering::SeqCst);
            Ok(DeleteOutcome::Deleted)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn exists_creates_then_waits_for_ready() {
        let r = Scripted::new(vec![
            Observation::Absent,
            Observation::Absent,
            Observation::Provisioning,
            Observation::Ready("vpc-1".to_string()),
        ]);
        let out = ensure_exists(&r).await.unwrap();
        assert_eq!(out, "vpc-1");
        // One create despite two Absent observations.
        assert_eq!(r.creates.load(Ordering::SeqCst), 1);
        assert_eq!(r.deletes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn exists_adopts_already_ready_resource() {
        let r = Scripted::new(vec![Observation::Ready("found".to_string())]);
        let out = ensure_exists(&r).await.unwrap();
        assert_eq!(out, "found");
        assert_eq!(r.creates.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn exists_waits_out_terminating_before_create() {
        let r = Scripted::new(vec![
            Observation::Terminating,
            Observation::Absent,
            Observation::Ready("fresh".to_string()),
        ]);
        let out = ensure_exists(&r).await.unwrap();
        assert_eq!(out, "fresh");
        assert_eq!(r.creates.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn exists_surfaces_terminal_failure() {
        let r = Scripted::new(vec![Observation::Failed("LIMIT_EXCEEDED".to_string())]);
        let err = ensure_exists(&r).await.unwrap_err();
        assert!(matches!(err, Error::ResourceFailed { .. }));
        assert!(err.to_string().contains("LIMIT_EXCEEDED"));
    }

    #[tokio::test(start_paused = true)]
    async fn exists_recreates_failed_resource_when_opted_in() {
        let r = Scripted::new(vec![
            Observation::Absent,
            Observation::Failed("CREATE_FAILED".to_string()),
            Observation::Terminating,
            Observation::Absent,
            Observation::Ready("second".to_string()),
        ])
        .recreating();
        let out = ensure_exists(&r).await.unwrap();
        assert_eq!(out, "second");
        assert_eq!(r.creates.load(Ordering::SeqCst), 2);
        assert_eq!(r.deletes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn absent_is_noop_when_already_gone() {
        let r = Scripted::new(vec![Observation::Absent]);
        ensure_absent(&r).await.unwrap();
        assert_eq!(r.deletes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn absent_deletes_once_and_waits() {
        let r = Scripted::new(vec![
            Observation::Ready("x".to_string()),
            Observation::Terminating,
            Observation::Terminating,
            Observation::Absent,
        ]);
        ensure_absent(&r).await.unwrap();
        assert_eq!(r.deletes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn absent_waits_out_foreign_termination_without_delete() {
        let r = Scripted::new(vec![Observation::Terminating, Observation::Absent]);
        ensure_absent(&r).await.unwrap();
        assert_eq!(r.deletes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn absent_deletes_failed_resource() {
        let r = Scripted::new(vec![
            Observation::Failed("FAILED".to_string()),
            Observation::Absent,
        ]);
        ensure_absent(&r).await.unwrap();
        assert_eq!(r.deletes.load(Ordering::SeqCst), 1);
    }
}
