//! Shared live collections of monitors and incidents
//!
//! Each board wraps a copy-on-write snapshot behind an RwLock: writers swap
//! in a freshly reconciled vector, readers clone the current snapshot. No
//! reader ever observes a half-applied update.

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::reconcile::{apply_incident_update, apply_monitor_update};
use crate::types::{Incident, Monitor};

/// Live monitor collection
#[derive(Clone, Default)]
pub struct MonitorBoard {
    monitors: Arc<RwLock<Vec<Monitor>>>,
}

impl MonitorBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole collection, e.g. from a REST snapshot
    pub async fn replace_all(&self, monitors: Vec<Monitor>) {
        *self.monitors.write().await = monitors;
    }

    /// Reconcile one push update into the collection
    pub async fn apply(&self, incoming: Monitor) {
        let mut guard = self.monitors.write().await;
        *guard = apply_monitor_update(&guard, incoming);
    }

    /// Snapshot of the current collection
    pub async fn snapshot(&self) -> Vec<Monitor> {
        self.monitors.read().await.clone()
    }

    pub async fn get(&self, id: &str) -> Option<Monitor> {
        self.monitors.read().await.iter().find(|m| m.id == id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.monitors.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.monitors.read().await.is_empty()
    }
}

/// Live incident collection
#[derive(Clone, Default)]
pub struct IncidentBoard {
    incidents: Arc<RwLock<Vec<Incident>>>,
}

impl IncidentBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn replace_all(&self, incidents: Vec<Incident>) {
        *self.incidents.write().await = incidents;
    }

    /// Reconcile one push update, returning the prior record if the id was
    /// already on the board
    pub async fn apply(&self, incoming: Incident) -> Option<Incident> {
        let mut guard = self.incidents.write().await;
        let prior = guard.iter().find(|i| i.id == incoming.id).cloned();
        *guard = apply_incident_update(&guard, incoming);
        prior
    }

    pub async fn snapshot(&self) -> Vec<Incident> {
        self.incidents.read().await.clone()
    }

    pub async fn get(&self, id: &str) -> Option<Incident> {
        self.incidents.read().await.iter().find(|i| i.id == id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.incidents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.incidents.read().await.is_empty()
    }
}
