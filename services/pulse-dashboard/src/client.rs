//! Dashboard facade: session, REST snapshot, live boards, notifications
//!
//! Ties the pieces together: logging in persists the session record;
//! `start` takes a REST snapshot of the org's monitors and incidents,
//! then opens both push streams and keeps the boards reconciled as events
//! arrive. Incident changes worth surfacing to the user come out on a
//! notification broadcast.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::{broadcast, Mutex};
use tracing::{info, warn};

use pb_session::{SessionStore, User};

use crate::api::ApiClient;
use crate::board::{IncidentBoard, MonitorBoard};
use crate::config::Config;
use crate::error::{DashboardError, Result};
use crate::events::PushEvent;
use crate::reconcile::{classify_change, filter_by_services, sorted_for_display, IncidentChange};
use crate::stream::{Channel, StreamClient};
use crate::types::{Incident, Monitor};

/// User-facing incident notification
#[derive(Debug, Clone)]
pub enum Notification {
    /// A new incident appeared via the creation event
    IncidentCreated(Incident),
    /// A known incident's severity went up
    SeverityEscalated(Incident),
    /// A known incident changed in some other way
    IncidentUpdated(Incident),
}

/// Decide what, if anything, to surface for an incoming incident event
///
/// An update or resolution for an incident that was never on the board is
/// applied silently: there is nothing meaningful to announce about a record
/// the user has never seen.
fn notification_for(prior: Option<&Incident>, event: &PushEvent) -> Option<Notification> {
    let incoming = event.incident()?;
    match classify_change(prior, event.is_incident_creation(), incoming) {
        IncidentChange::Created => Some(Notification::IncidentCreated(incoming.clone())),
        IncidentChange::Escalated => Some(Notification::SeverityEscalated(incoming.clone())),
        IncidentChange::Updated if prior.is_some() => {
            Some(Notification::IncidentUpdated(incoming.clone()))
        }
        IncidentChange::Updated => None,
    }
}

/// The client core behind a status dashboard
pub struct Dashboard {
    session: Arc<SessionStore>,
    api: Arc<ApiClient>,
    monitors: MonitorBoard,
    incidents: IncidentBoard,
    monitor_stream: Arc<StreamClient>,
    incident_stream: Arc<StreamClient>,
    notifier: broadcast::Sender<Notification>,
    apply_tasks: Mutex<Vec<tokio::task::JoinHandle<()>>>,
}

impl Dashboard {
    pub fn new(config: &Config, session: Arc<SessionStore>) -> Result<Self> {
        let monitor_stream = Arc::new(StreamClient::new(config.stream.clone(), Channel::Monitors));
        let incident_stream =
            Arc::new(StreamClient::new(config.stream.clone(), Channel::Incidents));
        Self::with_streams(config, session, monitor_stream, incident_stream)
    }

    /// Construct with externally built stream clients
    ///
    /// Lets tests substitute mock connection factories.
    pub fn with_streams(
        config: &Config,
        session: Arc<SessionStore>,
        monitor_stream: Arc<StreamClient>,
        incident_stream: Arc<StreamClient>,
    ) -> Result<Self> {
        let (notifier, _) = broadcast::channel(100);
        Ok(Self {
            session,
            api: Arc::new(ApiClient::new(&config.api)?),
            monitors: MonitorBoard::new(),
            incidents: IncidentBoard::new(),
            monitor_stream,
            incident_stream,
            notifier,
            apply_tasks: Mutex::new(Vec::new()),
        })
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Subscribe to user-facing incident notifications
    pub fn subscribe_notifications(&self) -> broadcast::Receiver<Notification> {
        self.notifier.subscribe()
    }

    /// Subscribe to the live monitor event feed
    ///
    /// Pending ticks are already filtered out upstream; every event here
    /// carries a settled check result.
    pub fn subscribe_monitor_updates(&self) -> broadcast::Receiver<PushEvent> {
        self.monitor_stream.subscribe()
    }

    /// Log in and persist the session record
    pub async fn login(&self, email: &str, password: &str) -> Result<User> {
        let user = self.api.login(email, password).await?;
        self.session.set_user(Some(user.clone()))?;
        info!("Logged in as {}", user.email);
        Ok(user)
    }

    /// Close streams and clear the session
    pub async fn logout(&self) -> Result<()> {
        self.shutdown().await;
        self.session.logout()?;
        Ok(())
    }

    /// Take the REST snapshot and go live on both push streams
    ///
    /// Stream subscriptions are registered before the streams open, so no
    /// event published after connect can be missed.
    pub async fn start(&self) -> Result<()> {
        let organization_id = self
            .session
            .organization_id()
            .ok_or(DashboardError::NotLoggedIn)?;

        let monitors = self.api.monitors_with_latest(&organization_id).await?;
        self.monitors.replace_all(monitors).await;

        let incidents = self.api.incidents(&organization_id).await?;
        self.incidents.replace_all(incidents).await;
        info!(
            "Snapshot loaded: {} monitors, {} incidents",
            self.monitors.len().await,
            self.incidents.len().await
        );

        let monitor_rx = self.monitor_stream.subscribe();
        let incident_rx = self.incident_stream.subscribe();
        let mut tasks = self.apply_tasks.lock().await;
        tasks.push(tokio::spawn(apply_monitor_events(
            monitor_rx,
            self.monitors.clone(),
        )));
        tasks.push(tokio::spawn(apply_incident_events(
            incident_rx,
            self.incidents.clone(),
            self.notifier.clone(),
        )));
        drop(tasks);

        self.monitor_stream.open(&organization_id).await;
        self.incident_stream.open(&organization_id).await;
        Ok(())
    }

    /// Close both streams and stop the apply tasks. Idempotent.
    pub async fn shutdown(&self) {
        self.monitor_stream.close().await;
        self.incident_stream.close().await;
        for task in self.apply_tasks.lock().await.drain(..) {
            task.abort();
            let _ = task.await;
        }
    }

    /// Current monitor collection
    pub async fn monitors(&self) -> Vec<Monitor> {
        self.monitors.snapshot().await
    }

    /// Incidents in display order, optionally filtered by affected services
    pub async fn incidents(&self, service_filter: &HashSet<String>) -> Vec<Incident> {
        let all = self.incidents.snapshot().await;
        let filtered: Vec<Incident> = filter_by_services(&all, service_filter)
            .into_iter()
            .cloned()
            .collect();
        sorted_for_display(&filtered)
    }
}

async fn apply_monitor_events(
    mut receiver: broadcast::Receiver<PushEvent>,
    board: MonitorBoard,
) {
    loop {
        match receiver.recv().await {
            Ok(PushEvent::MonitorUpdate(monitor)) => board.apply(monitor).await,
            Ok(_) => {}
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!("Monitor apply task lagged, skipped {} events", skipped);
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

async fn apply_incident_events(
    mut receiver: broadcast::Receiver<PushEvent>,
    board: IncidentBoard,
    notifier: broadcast::Sender<Notification>,
) {
    loop {
        match receiver.recv().await {
            Ok(event) => {
                let Some(incoming) = event.incident() else {
                    continue;
                };
                let prior = board.apply(incoming.clone()).await;
                if let Some(notification) = notification_for(prior.as_ref(), &event) {
                    let _ = notifier.send(notification);
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!("Incident apply task lagged, skipped {} events", skipped);
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{IncidentSeverity, IncidentStatus};
    use chrono::{TimeZone, Utc};

    fn incident(id: &str, severity: IncidentSeverity) -> Incident {
        Incident {
            id: id.to_string(),
            organization_id: "org-1".to_string(),
            title: id.to_string(),
            description: None,
            status: IncidentStatus::Open,
            severity,
            auto_created: false,
            auto_resolved: false,
            monitor_id: None,
            affected_service_ids: Vec::new(),
            created_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
            resolved_at: None,
            created_by_user_id: None,
            updates: Vec::new(),
            failed_pings: None,
        }
    }

    #[test]
    fn test_creation_event_without_prior_notifies() {
        let event = PushEvent::IncidentCreated(incident("i-1", IncidentSeverity::High));
        assert!(matches!(
            notification_for(None, &event),
            Some(Notification::IncidentCreated(_))
        ));
    }

    #[test]
    fn test_escalation_notifies() {
        let prior = incident("i-1", IncidentSeverity::Low);
        let event = PushEvent::IncidentUpdated(incident("i-1", IncidentSeverity::Critical));
        assert!(matches!(
            notification_for(Some(&prior), &event),
            Some(Notification::SeverityEscalated(_))
        ));
    }

    #[test]
    fn test_known_incident_update_notifies_as_update() {
        let prior = incident("i-1", IncidentSeverity::High);
        let event = PushEvent::IncidentResolved(incident("i-1", IncidentSeverity::High));
        assert!(matches!(
            notification_for(Some(&prior), &event),
            Some(Notification::IncidentUpdated(_))
        ));
    }

    #[test]
    fn test_update_for_unseen_incident_is_silent() {
        let event = PushEvent::IncidentUpdated(incident("i-9", IncidentSeverity::Low));
        assert!(notification_for(None, &event).is_none());
    }

    #[test]
    fn test_monitor_event_never_notifies() {
        let json = r#"{"type":"monitor_update","payload":{
            "id":"m-1","name":"API","url":"https://a","method":"GET",
            "interval":60,"active":true,"serviceId":"s-1"
        }}"#;
        let crate::events::DecodedFrame::Event(event) = crate::events::decode_frame(json)
        else {
            panic!("Expected event");
        };
        assert!(notification_for(None, &event).is_none());
    }
}
