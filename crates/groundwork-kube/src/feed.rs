//! Live watch feed
//!
//! One watcher per tracked kind, all forwarding into the single reducer
//! channel. Watcher restarts (relist after a dropped connection) surface as
//! ordinary apply events and are absorbed by the reducer's upsert
//! semantics.

use futures::StreamExt;
use k8s_openapi::api::apps::v1::{DaemonSet, Deployment, StatefulSet};
use k8s_openapi::api::core::v1::{ConfigMap, Secret};
use kube::runtime::watcher;
use kube::{Api, Client};
use serde::de::DeserializeOwned;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::crd::{Certificate, CertificateRequest};
use crate::snapshot::{WatchEvent, WatchedObject};

async fn forward<K, F>(api: Api<K>, tx: mpsc::Sender<WatchEvent>, wrap: F)
where
    K: kube::Resource + Clone + DeserializeOwned + std::fmt::Debug + Send + 'static,
    K::DynamicType: Default,
    F: Fn(K) -> WatchedObject,
{
    let mut stream = watcher(api, watcher::Config::default()).boxed();
    while let Some(event) = stream.next().await {
        let forwarded = match event {
            Ok(watcher::Event::Apply(obj)) | Ok(watcher::Event::InitApply(obj)) => {
                tx.send(WatchEvent::Applied(wrap(obj))).await
            }
            Ok(watcher::Event::Delete(obj)) => tx.send(WatchEvent::Deleted(wrap(obj))).await,
            Ok(_) => Ok(()),
            Err(e) => {
                warn!(error = %e, "watch stream error, watcher will relist");
                Ok(())
            }
        };
        // The reducer dropped its receiver; nothing left to feed.
        if forwarded.is_err() {
            return;
        }
    }
}

/// Spawn watchers for every tracked kind across all namespaces.
///
/// The returned handle never completes on its own; abort it once readiness
/// is established.
pub fn spawn_watch_feed(client: Client, tx: mpsc::Sender<WatchEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        futures::join!(
            forward(Api::<Deployment>::all(client.clone()), tx.clone(), |o| {
                WatchedObject::Deployment(Box::new(o))
            }),
            forward(Api::<DaemonSet>::all(client.clone()), tx.clone(), |o| {
                WatchedObject::DaemonSet(Box::new(o))
            }),
            forward(Api::<StatefulSet>::all(client.clone()), tx.clone(), |o| {
                WatchedObject::StatefulSet(Box::new(o))
            }),
            forward(Api::<ConfigMap>::all(client.clone()), tx.clone(), |o| {
                WatchedObject::ConfigMap(Box::new(o))
            }),
            forward(Api::<Secret>::all(client.clone()), tx.clone(), |o| {
                WatchedObject::Secret(Box::new(o))
            }),
            forward(Api::<Certificate>::all(client.clone()), tx.clone(), |o| {
                WatchedObject::Certificate(Box::new(o))
            }),
            forward(Api::<CertificateRequest>::all(client.clone()), tx, |o| {
                WatchedObject::CertificateRequest(Box::new(o))
            }),
        );
    })
}
