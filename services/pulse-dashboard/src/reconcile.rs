//! Pure reconciliation over monitor and incident collections
//!
//! Every function here is copy-on-write: the input slice is never mutated,
//! and a reader holding the old collection observes either the fully-old or
//! fully-new state. Events carry whole records and the last write wins, so
//! applying the same event twice is a no-op beyond the final state.

use std::collections::{HashMap, HashSet};

use crate::types::{Incident, IncidentStatus, Monitor, MonitorStatus};

/// Upsert a monitor into the collection
///
/// A matching id is replaced in place; an unseen id is prepended. On a
/// match, old fields are shallow-merged under the incoming record: the
/// incoming payload wins everywhere, except that timestamps it omits are
/// carried over. The incoming latest result always wins, even when absent.
pub fn apply_monitor_update(monitors: &[Monitor], incoming: Monitor) -> Vec<Monitor> {
    match monitors.iter().position(|m| m.id == incoming.id) {
        Some(index) => {
            let mut next = monitors.to_vec();
            next[index] = merge_monitor(&monitors[index], incoming);
            next
        }
        None => {
            let mut next = Vec::with_capacity(monitors.len() + 1);
            next.push(incoming);
            next.extend(monitors.iter().cloned());
            next
        }
    }
}

fn merge_monitor(prior: &Monitor, incoming: Monitor) -> Monitor {
    Monitor {
        created_at: incoming.created_at.or(prior.created_at),
        updated_at: incoming.updated_at.or(prior.updated_at),
        ..incoming
    }
}

/// Upsert an incident into the collection
///
/// Same upsert-or-prepend rule as monitors, but a matching entry is fully
/// replaced by the incoming payload.
pub fn apply_incident_update(incidents: &[Incident], incoming: Incident) -> Vec<Incident> {
    match incidents.iter().position(|i| i.id == incoming.id) {
        Some(index) => {
            let mut next = incidents.to_vec();
            next[index] = incoming;
            next
        }
        None => {
            let mut next = Vec::with_capacity(incidents.len() + 1);
            next.push(incoming);
            next.extend(incidents.iter().cloned());
            next
        }
    }
}

/// How an incoming incident event relates to the current view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncidentChange {
    /// First sighting via the creation event type
    Created,
    /// Severity rank increased relative to the prior record
    Escalated,
    /// Anything else
    Updated,
}

/// Classify an incoming incident against the prior record, if any
///
/// Advisory only: it drives the notification side-channel and never gates
/// the upsert itself.
pub fn classify_change(
    prior: Option<&Incident>,
    is_creation_event: bool,
    incoming: &Incident,
) -> IncidentChange {
    match prior {
        Some(prior) if incoming.severity > prior.severity => IncidentChange::Escalated,
        Some(_) => IncidentChange::Updated,
        None if is_creation_event => IncidentChange::Created,
        None => IncidentChange::Updated,
    }
}

/// Incidents whose affected services intersect the filter
///
/// An empty filter means no filter: all incidents are returned.
pub fn filter_by_services<'a>(
    incidents: &'a [Incident],
    filter: &HashSet<String>,
) -> Vec<&'a Incident> {
    if filter.is_empty() {
        return incidents.iter().collect();
    }
    incidents
        .iter()
        .filter(|incident| {
            incident
                .affected_service_ids
                .iter()
                .any(|id| filter.contains(id))
        })
        .collect()
}

/// Record a monitor's pushed status; returns it when it differs from the
/// last one seen for that monitor
///
/// The first sighting of a monitor counts as a transition. Events without a
/// settled status leave the record untouched and report nothing.
pub fn status_transition(
    seen: &mut HashMap<String, MonitorStatus>,
    monitor: &Monitor,
) -> Option<MonitorStatus> {
    let status = monitor.latest_result.as_ref()?.status?;
    let prior = seen.insert(monitor.id.clone(), status);
    (prior != Some(status)).then_some(status)
}

/// Display order: unresolved before resolved, newest first within each group
pub fn sorted_for_display(incidents: &[Incident]) -> Vec<Incident> {
    let mut sorted = incidents.to_vec();
    sorted.sort_by(|a, b| {
        let a_resolved = a.status == IncidentStatus::Resolved;
        let b_resolved = b.status == IncidentStatus::Resolved;
        a_resolved
            .cmp(&b_resolved)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{IncidentSeverity, LatestResult, MonitorStatus};
    use chrono::{TimeZone, Utc};

    fn monitor(id: &str, name: &str) -> Monitor {
        Monitor {
            id: id.to_string(),
            name: name.to_string(),
            url: "https://example.com".to_string(),
            method: "GET".to_string(),
            interval: 60,
            monitor_type: "HTTP".to_string(),
            headers: Vec::new(),
            active: true,
            degraded_threshold: Some(2000),
            timeout: Some(5000),
            service_id: "s-1".to_string(),
            service_name: None,
            created_at: None,
            updated_at: None,
            latest_result: None,
        }
    }

    fn incident(id: &str, severity: IncidentSeverity, status: IncidentStatus) -> Incident {
        Incident {
            id: id.to_string(),
            organization_id: "org-1".to_string(),
            title: format!("incident {}", id),
            description: None,
            status,
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
    fn test_upsert_replaces_matched_entry() {
        let v1 = monitor("a", "v1");
        let mut v2 = monitor("a", "v2");
        v2.latest_result = Some(LatestResult {
            status: Some(MonitorStatus::Up),
            response_time_ms: Some(50),
            http_status_code: Some(200),
            checked_at: None,
            error: None,
        });

        let next = apply_monitor_update(&[v1], v2.clone());
        assert_eq!(next.len(), 1);
        assert_eq!(next[0].name, "v2");
        assert_eq!(
            next[0].latest_result.as_ref().unwrap().response_time_ms,
            Some(50)
        );
    }

    #[test]
    fn test_upsert_prepends_unseen_entry() {
        let a = monitor("a", "a");
        let b = monitor("b", "b");

        let next = apply_monitor_update(&[a], b);
        assert_eq!(next.len(), 2);
        assert_eq!(next[0].id, "b");
        assert_eq!(next[1].id, "a");
    }

    #[test]
    fn test_upsert_is_idempotent() {
        let base = vec![monitor("a", "a"), monitor("b", "b")];
        let incoming = monitor("a", "a2");

        let once = apply_monitor_update(&base, incoming.clone());
        let twice = apply_monitor_update(&once, incoming);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_input_collection_is_not_mutated() {
        let base = vec![monitor("a", "a")];
        let saved = base.clone();

        let _ = apply_monitor_update(&base, monitor("a", "changed"));
        let _ = apply_monitor_update(&base, monitor("b", "b"));
        assert_eq!(base, saved);
    }

    #[test]
    fn test_incoming_latest_result_wins_even_when_absent() {
        let mut prior = monitor("a", "a");
        prior.latest_result = Some(LatestResult {
            status: Some(MonitorStatus::Down),
            response_time_ms: Some(900),
            http_status_code: Some(503),
            checked_at: None,
            error: Some("503".to_string()),
        });
        let incoming = monitor("a", "a"); // no latest result

        let next = apply_monitor_update(&[prior], incoming);
        assert!(next[0].latest_result.is_none());
    }

    #[test]
    fn test_merge_keeps_prior_timestamps_when_omitted() {
        let mut prior = monitor("a", "a");
        prior.created_at = Some(Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap());
        let incoming = monitor("a", "renamed"); // push payload without timestamps

        let next = apply_monitor_update(&[prior.clone()], incoming);
        assert_eq!(next[0].name, "renamed");
        assert_eq!(next[0].created_at, prior.created_at);
    }

    #[test]
    fn test_incident_upsert_is_full_replacement() {
        let mut prior = incident("i-1", IncidentSeverity::Low, IncidentStatus::Open);
        prior.description = Some("old description".to_string());
        let incoming = incident("i-1", IncidentSeverity::High, IncidentStatus::Open);

        let next = apply_incident_update(&[prior], incoming);
        assert_eq!(next.len(), 1);
        assert_eq!(next[0].severity, IncidentSeverity::High);
        assert!(next[0].description.is_none());
    }

    #[test]
    fn test_escalation_detection() {
        let prior = incident("i-1", IncidentSeverity::Medium, IncidentStatus::Open);
        let escalated = incident("i-1", IncidentSeverity::High, IncidentStatus::Open);
        assert_eq!(
            classify_change(Some(&prior), false, &escalated),
            IncidentChange::Escalated
        );

        let prior = incident("i-1", IncidentSeverity::High, IncidentStatus::Open);
        let downgraded = incident("i-1", IncidentSeverity::Medium, IncidentStatus::Open);
        assert_eq!(
            classify_change(Some(&prior), false, &downgraded),
            IncidentChange::Updated
        );
    }

    #[test]
    fn test_classification_without_prior_record() {
        let incoming = incident("i-1", IncidentSeverity::Low, IncidentStatus::Open);
        assert_eq!(
            classify_change(None, true, &incoming),
            IncidentChange::Created
        );
        // A non-creation event for an unseen id still upserts, but reports
        // as a plain update.
        assert_eq!(
            classify_change(None, false, &incoming),
            IncidentChange::Updated
        );
    }

    #[test]
    fn test_filter_by_services() {
        let mut first = incident("i-1", IncidentSeverity::Low, IncidentStatus::Open);
        first.affected_service_ids = vec!["s1".to_string()];
        let mut second = incident("i-2", IncidentSeverity::Low, IncidentStatus::Open);
        second.affected_service_ids = vec!["s2".to_string()];
        let mut third = incident("i-3", IncidentSeverity::Low, IncidentStatus::Open);
        third.affected_service_ids = vec!["s1".to_string(), "s2".to_string()];
        let all = vec![first, second, third];

        let filter: HashSet<String> = ["s2".to_string()].into_iter().collect();
        let matched = filter_by_services(&all, &filter);
        assert_eq!(matched.len(), 2);
        assert_eq!(matched[0].id, "i-2");
        assert_eq!(matched[1].id, "i-3");

        let no_filter = HashSet::new();
        assert_eq!(filter_by_services(&all, &no_filter).len(), 3);
    }

    fn monitor_with_status(id: &str, status: Option<MonitorStatus>) -> Monitor {
        let mut m = monitor(id, id);
        m.latest_result = Some(LatestResult {
            status,
            response_time_ms: Some(42),
            http_status_code: Some(200),
            checked_at: None,
            error: None,
        });
        m
    }

    #[test]
    fn test_status_transition_reports_changes_only() {
        let mut seen = HashMap::new();

        // First sighting is a transition.
        assert_eq!(
            status_transition(&mut seen, &monitor_with_status("a", Some(MonitorStatus::Up))),
            Some(MonitorStatus::Up)
        );
        // Same status again is not.
        assert_eq!(
            status_transition(&mut seen, &monitor_with_status("a", Some(MonitorStatus::Up))),
            None
        );
        // A flip is.
        assert_eq!(
            status_transition(&mut seen, &monitor_with_status("a", Some(MonitorStatus::Down))),
            Some(MonitorStatus::Down)
        );
        // Monitors are tracked independently.
        assert_eq!(
            status_transition(&mut seen, &monitor_with_status("b", Some(MonitorStatus::Down))),
            Some(MonitorStatus::Down)
        );
    }

    #[test]
    fn test_status_transition_ignores_unsettled_results() {
        let mut seen = HashMap::new();
        assert_eq!(status_transition(&mut seen, &monitor("a", "a")), None);
        assert_eq!(
            status_transition(&mut seen, &monitor_with_status("a", None)),
            None
        );
        assert!(seen.is_empty());

        // An unsettled event does not erase the last seen status.
        let _ = status_transition(&mut seen, &monitor_with_status("a", Some(MonitorStatus::Up)));
        let _ = status_transition(&mut seen, &monitor_with_status("a", None));
        assert_eq!(seen.get("a"), Some(&MonitorStatus::Up));
    }

    #[test]
    fn test_display_sort_unresolved_first_then_newest() {
        let mut old_open = incident("old-open", IncidentSeverity::Low, IncidentStatus::Open);
        old_open.created_at = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let mut new_open = incident("new-open", IncidentSeverity::Low, IncidentStatus::Monitoring);
        new_open.created_at = Utc.with_ymd_and_hms(2026, 1, 2, 0, 0, 0).unwrap();
        let mut resolved =
            incident("resolved", IncidentSeverity::Low, IncidentStatus::Resolved);
        resolved.created_at = Utc.with_ymd_and_hms(2026, 1, 3, 0, 0, 0).unwrap();

        let sorted = sorted_for_display(&[resolved, old_open, new_open]);
        let ids: Vec<&str> = sorted.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["new-open", "old-open", "resolved"]);
    }
}
