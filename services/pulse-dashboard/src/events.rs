//! Push channel frames and event decoding
//!
//! Frames arrive as JSON text `{"type": ..., "payload": ...}`. Decoding is
//! two-stage: the envelope first, then the payload for the recognized types.
//! Anything else is reported as unknown or malformed so the stream client
//! can drop it without tearing down the connection.

use serde::Deserialize;

use crate::types::{Incident, Monitor};

/// Wire envelope for a push frame
#[derive(Debug, Deserialize)]
struct RawFrame {
    #[serde(rename = "type")]
    kind: String,
    payload: serde_json::Value,
}

/// A decoded push event
#[derive(Debug, Clone)]
pub enum PushEvent {
    MonitorUpdate(Monitor),
    IncidentCreated(Incident),
    IncidentUpdated(Incident),
    IncidentResolved(Incident),
}

impl PushEvent {
    /// The incident payload, for the three incident variants
    pub fn incident(&self) -> Option<&Incident> {
        match self {
            PushEvent::IncidentCreated(i)
            | PushEvent::IncidentUpdated(i)
            | PushEvent::IncidentResolved(i) => Some(i),
            PushEvent::MonitorUpdate(_) => None,
        }
    }

    /// Whether this is the incident creation event type
    pub fn is_incident_creation(&self) -> bool {
        matches!(self, PushEvent::IncidentCreated(_))
    }
}

/// Outcome of decoding one wire frame
#[derive(Debug)]
pub enum DecodedFrame {
    /// A recognized event with a well-formed payload
    Event(PushEvent),
    /// Valid envelope whose type is not recognized; carries the type string
    Unknown(String),
    /// Not a valid frame at all, or a payload that does not match its type
    Malformed(serde_json::Error),
}

/// Decode a single frame of wire text
pub fn decode_frame(line: &str) -> DecodedFrame {
    let raw: RawFrame = match serde_json::from_str(line) {
        Ok(raw) => raw,
        Err(e) => return DecodedFrame::Malformed(e),
    };

    match raw.kind.as_str() {
        "monitor_update" => match serde_json::from_value(raw.payload) {
            Ok(monitor) => DecodedFrame::Event(PushEvent::MonitorUpdate(monitor)),
            Err(e) => DecodedFrame::Malformed(e),
        },
        "incident_created" => decode_incident(raw.payload, PushEvent::IncidentCreated),
        "incident_updated" => decode_incident(raw.payload, PushEvent::IncidentUpdated),
        "incident_resolved" => decode_incident(raw.payload, PushEvent::IncidentResolved),
        _ => DecodedFrame::Unknown(raw.kind),
    }
}

fn decode_incident(
    payload: serde_json::Value,
    variant: fn(Incident) -> PushEvent,
) -> DecodedFrame {
    match serde_json::from_value(payload) {
        Ok(incident) => DecodedFrame::Event(variant(incident)),
        Err(e) => DecodedFrame::Malformed(e),
    }
}

/// A monitor payload whose latest result is present but carries no response
/// time is a "still pending" tick and must not reach the reconciler. A
/// payload with no latest result at all is forwarded; the asymmetry matches
/// the backend's contract.
pub fn is_pending_tick(monitor: &Monitor) -> bool {
    monitor
        .latest_result
        .as_ref()
        .is_some_and(|latest| latest.response_time_ms.is_none())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monitor_frame(response_time: &str) -> String {
        format!(
            r#"{{"type":"monitor_update","payload":{{
                "id":"m-1","name":"API","url":"https://api.example.com",
                "method":"GET","interval":60,"active":true,"serviceId":"s-1",
                "latestResult":{{"status":"UP","responseTimeMs":{response_time},
                    "httpStatusCode":200,"checkedAt":null,"error":null}}
            }}}}"#
        )
    }

    #[test]
    fn test_decode_monitor_update() {
        match decode_frame(&monitor_frame("42")) {
            DecodedFrame::Event(PushEvent::MonitorUpdate(monitor)) => {
                assert_eq!(monitor.id, "m-1");
                assert_eq!(
                    monitor.latest_result.unwrap().response_time_ms,
                    Some(42)
                );
            }
            other => panic!("Expected MonitorUpdate, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_incident_created() {
        let json = r#"{"type":"incident_created","payload":{
            "id":"i-1","organizationId":"org-1","title":"Outage",
            "status":"OPEN","severity":"CRITICAL",
            "createdAt":"2026-01-01T00:00:00Z","updatedAt":"2026-01-01T00:00:00Z"
        }}"#;
        match decode_frame(json) {
            DecodedFrame::Event(event) => {
                assert!(event.is_incident_creation());
                assert_eq!(event.incident().unwrap().title, "Outage");
            }
            other => panic!("Expected IncidentCreated, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_incident_resolved() {
        let json = r#"{"type":"incident_resolved","payload":{
            "id":"i-1","organizationId":"org-1","title":"Outage",
            "status":"RESOLVED","severity":"LOW",
            "createdAt":"2026-01-01T00:00:00Z","updatedAt":"2026-01-01T01:00:00Z",
            "resolvedAt":"2026-01-01T01:00:00Z"
        }}"#;
        match decode_frame(json) {
            DecodedFrame::Event(PushEvent::IncidentResolved(incident)) => {
                assert!(incident.resolved_at.is_some());
            }
            other => panic!("Expected IncidentResolved, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_type_is_reported_not_erred() {
        let json = r#"{"type":"maintenance_started","payload":{}}"#;
        match decode_frame(json) {
            DecodedFrame::Unknown(kind) => assert_eq!(kind, "maintenance_started"),
            other => panic!("Expected Unknown, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_frame() {
        assert!(matches!(
            decode_frame("not json at all"),
            DecodedFrame::Malformed(_)
        ));
        // Valid envelope, payload missing required fields.
        assert!(matches!(
            decode_frame(r#"{"type":"monitor_update","payload":{"id":"m-1"}}"#),
            DecodedFrame::Malformed(_)
        ));
    }

    #[test]
    fn test_pending_tick_detection() {
        let DecodedFrame::Event(PushEvent::MonitorUpdate(pending)) =
            decode_frame(&monitor_frame("null"))
        else {
            panic!("Expected MonitorUpdate");
        };
        assert!(is_pending_tick(&pending));

        let DecodedFrame::Event(PushEvent::MonitorUpdate(live)) =
            decode_frame(&monitor_frame("42"))
        else {
            panic!("Expected MonitorUpdate");
        };
        assert!(!is_pending_tick(&live));
    }

    #[test]
    fn test_absent_latest_result_is_not_pending() {
        let json = r#"{"type":"monitor_update","payload":{
            "id":"m-1","name":"API","url":"https://api.example.com",
            "method":"GET","interval":60,"active":true,"serviceId":"s-1"
        }}"#;
        let DecodedFrame::Event(PushEvent::MonitorUpdate(monitor)) = decode_frame(json)
        else {
            panic!("Expected MonitorUpdate");
        };
        assert!(!is_pending_tick(&monitor));
    }
}
