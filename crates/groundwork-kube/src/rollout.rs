//! Rollout predicates
//!
//! A resource is "active" while its controller still has work to do. The
//! convergence wait finishes when no tracked resource is active.

use k8s_openapi::api::apps::v1::{DaemonSet, Deployment, StatefulSet};

use crate::snapshot::ClusterSnapshot;

/// Why a deployment is still rolling out, if it is
pub fn deployment_pending(d: &Deployment) -> Option<String> {
    let generation = d.metadata.generation.unwrap_or(0);
    let status = d.status.as_ref();
    let observed = status.and_then(|s| s.observed_generation).unwrap_or(0);
    if observed < generation {
        return Some(format!("observed generation {observed} behind {generation}"));
    }
    let desired = d.spec.as_ref().and_then(|s| s.replicas).unwrap_or(1);
    let updated = status.and_then(|s| s.updated_replicas).unwrap_or(0);
    if updated < desired {
        return Some(format!("{updated} of {desired} replicas updated"));
    }
    let available = status.and_then(|s| s.available_replicas).unwrap_or(0);
    if available < desired {
        return Some(format!("{available} of {desired} replicas available"));
    }
    None
}

pub fn daemon_set_pending(d: &DaemonSet) -> Option<String> {
    let generation = d.metadata.generation.unwrap_or(0);
    let status = d.status.as_ref();
    let observed = status.and_then(|s| s.observed_generation).unwrap_or(0);
    if observed < generation {
        return Some(format!("observed generation {observed} behind {generation}"));
    }
    let desired = status.map(|s| s.desired_number_scheduled).unwrap_or(0);
    let updated = status.and_then(|s| s.updated_number_scheduled).unwrap_or(0);
    if updated < desired {
        return Some(format!("{updated} of {desired} pods updated"));
    }
    let available = status.and_then(|s| s.number_available).unwrap_or(0);
    if available < desired {
        return Some(format!("{available} of {desired} pods available"));
    }
    None
}

pub fn stateful_set_pending(s: &StatefulSet) -> Option<String> {
    let generation = s.metadata.generation.unwrap_or(0);
    let status = s.status.as_ref();
    let observed = status.and_then(|st| st.observed_generation).unwrap_or(0);
    if observed < generation {
        return Some(format!("observed generation {observed} behind {generation}"));
    }
    let desired = s.spec.as_ref().and_then(|sp| sp.replicas).unwrap_or(1);
    let updated = status.and_then(|st| st.updated_replicas).unwrap_or(0);
    if updated < desired {
        return Some(format!("{updated} of {desired} replicas updated"));
    }
    let ready = status.and_then(|st| st.ready_replicas).unwrap_or(0);
    if ready < desired {
        return Some(format!("{ready} of {desired} replicas ready"));
    }
    None
}

/// Human-readable descriptions of everything still converging
pub fn active_resources(snapshot: &ClusterSnapshot) -> Vec<String> {
    let mut active = Vec::new();
    for (key, d) in &snapshot.deployments {
        if let Some(why) = deployment_pending(d) {
            active.push(format!("Deployment {key}: {why}"));
        }
    }
    for (key, d) in &snapshot.daemon_sets {
        if let Some(why) = daemon_set_pending(d) {
            active.push(format!("DaemonSet {key}: {why}"));
        }
    }
    for (key, s) in &snapshot.stateful_sets {
        if let Some(why) = stateful_set_pending(s) {
            active.push(format!("StatefulSet {key}: {why}"));
        }
    }
    for (key, c) in &snapshot.certificates {
        if !c.is_ready() {
            let why = c
                .ready_condition()
                .and_then(|cond| cond.message.clone())
                .unwrap_or_else(|| "no Ready condition yet".to_string());
            active.push(format!("Certificate {key}: {why}"));
        }
    }
    active
}
