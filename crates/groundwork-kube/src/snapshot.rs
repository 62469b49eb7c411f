//! Cluster state snapshot
//!
//! All watch streams funnel into one mpsc channel; a single reducer task
//! applies events in receipt order and publishes a fresh immutable snapshot
//! after every event. Readers hold a `watch::Receiver` and never observe a
//! partially-applied update.

use std::collections::BTreeMap;
use std::sync::Arc;

use k8s_openapi::api::apps::v1::{DaemonSet, Deployment, StatefulSet};
use k8s_openapi::api::core::v1::{ConfigMap, Secret};
use kube::ResourceExt;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::crd::{Certificate, CertificateRequest};

/// One object as carried by a watch event
#[derive(Debug, Clone)]
pub enum WatchedObject {
    Deployment(Box<Deployment>),
    DaemonSet(Box<DaemonSet>),
    StatefulSet(Box<StatefulSet>),
    ConfigMap(Box<ConfigMap>),
    Secret(Box<Secret>),
    Certificate(Box<Certificate>),
    CertificateRequest(Box<CertificateRequest>),
}

/// One event from any of the per-kind watch streams
#[derive(Debug, Clone)]
pub enum WatchEvent {
    Applied(WatchedObject),
    Deleted(WatchedObject),
}

fn key(namespace: Option<String>, name: String) -> String {
    match namespace {
        Some(ns) => format!("{ns}/{name}"),
        None => name,
    }
}

/// Immutable view of the tracked cluster state
#[derive(Debug, Clone, Default)]
pub struct ClusterSnapshot {
    pub deployments: BTreeMap<String, Deployment>,
    pub daemon_sets: BTreeMap<String, DaemonSet>,
    pub stateful_sets: BTreeMap<String, StatefulSet>,
    pub config_maps: BTreeMap<String, ConfigMap>,
    pub secrets: BTreeMap<String, Secret>,
    pub certificates: BTreeMap<String, Certificate>,
    pub certificate_requests: BTreeMap<String, CertificateRequest>,
    /// Number of events applied so far; zero means the streams have not
    /// delivered anything yet and emptiness is meaningless
    pub events_applied: u64,
}

impl ClusterSnapshot {
    /// True before any event arrived; used to guard the startup window
    /// where an empty snapshot would be mistaken for a converged cluster.
    pub fn is_unpopulated(&self) -> bool {
        self.events_applied == 0
    }

    fn apply(&mut self, event: WatchEvent) {
        match event {
            WatchEvent::Applied(obj) => self.upsert(obj),
            WatchEvent::Deleted(obj) => self.remove(obj),
        }
        self.events_applied += 1;
    }

    fn upsert(&mut self, obj: WatchedObject) {
        match obj {
            WatchedObject::Deployment(o) => {
                self.deployments.insert(key(o.namespace(), o.name_any()), *o);
            }
            WatchedObject::DaemonSet(o) => {
                self.daemon_sets.insert(key(o.namespace(), o.name_any()), *o);
            }
            WatchedObject::StatefulSet(o) => {
                self.stateful_sets.insert(key(o.namespace(), o.name_any()), *o);
            }
            WatchedObject::ConfigMap(o) => {
                self.config_maps.insert(key(o.namespace(), o.name_any()), *o);
            }
            WatchedObject::Secret(o) => {
                self.secrets.insert(key(o.namespace(), o.name_any()), *o);
            }
            WatchedObject::Certificate(o) => {
                self.certificates.insert(key(o.namespace(), o.name_any()), *o);
            }
            WatchedObject::CertificateRequest(o) => {
                self.certificate_requests
                    .insert(key(o.namespace(), o.name_any()), *o);
            }
        }
    }

    fn remove(&mut self, obj: WatchedObject) {
        match obj {
            WatchedObject::Deployment(o) => {
                self.deployments.remove(&key(o.namespace(), o.name_any()));
            }
            WatchedObject::DaemonSet(o) => {
                self.daemon_sets.remove(&key(o.namespace(), o.name_any()));
            }
            WatchedObject::StatefulSet(o) => {
                self.stateful_sets.remove(&key(o.namespace(), o.name_any()));
            }
            WatchedObject::ConfigMap(o) => {
                self.config_maps.remove(&key(o.namespace(), o.name_any()));
            }
            WatchedObject::Secret(o) => {
                self.secrets.remove(&key(o.namespace(), o.name_any()));
            }
            WatchedObject::Certificate(o) => {
                self.certificates.remove(&key(o.namespace(), o.name_any()));
            }
            WatchedObject::CertificateRequest(o) => {
                self.certificate_requests
                    .remove(&key(o.namespace(), o.name_any()));
            }
        }
    }
}

/// Handle to the reducer task and its published snapshots
pub struct SnapshotStore {
    pub snapshots: watch::Receiver<Arc<ClusterSnapshot>>,
    pub reducer: JoinHandle<()>,
}

/// Spawn the single-writer reducer over `events`.
///
/// The task exits when every sender is dropped.
pub fn spawn_reducer(mut events: mpsc::Receiver<WatchEvent>) -> SnapshotStore {
    let (tx, rx) = watch::channel(Arc::new(ClusterSnapshot::default()));

    let reducer = tokio::spawn(async move {
        let mut state = ClusterSnapshot::default();
        while let Some(event) = events.recv().await {
            state.apply(event);
            // Publish a full copy; readers keep whatever Arc they cloned.
            if tx.send(Arc::new(state.clone())).is_err() {
                break;
            }
        }
        debug!("watch event channel closed, reducer exiting");
    });

    SnapshotStore {
        snapshots: rx,
        reducer,
    }
}
