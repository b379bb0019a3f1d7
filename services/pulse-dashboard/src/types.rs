//! Domain types shared by the REST client and the push channel
//!
//! Field names follow the backend wire contract (camelCase JSON). Read
//! models mirror what the backend returns; draft/patch types are the
//! request bodies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Monitors
// ============================================================================

/// Result status of a single health check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MonitorStatus {
    #[serde(rename = "UP")]
    Up,
    #[serde(rename = "DOWN")]
    Down,
    #[serde(rename = "DEGRADED")]
    Degraded,
}

impl std::fmt::Display for MonitorStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MonitorStatus::Up => write!(f, "UP"),
            MonitorStatus::Down => write!(f, "DOWN"),
            MonitorStatus::Degraded => write!(f, "DEGRADED"),
        }
    }
}

/// A custom request header attached to a monitor's checks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderPair {
    pub key: String,
    pub value: String,
}

/// Outcome of the most recent check for a monitor
///
/// `status` is null while the first check is pending; `response_time_ms` is
/// null while a check is in flight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestResult {
    #[serde(default)]
    pub status: Option<MonitorStatus>,
    #[serde(default)]
    pub response_time_ms: Option<u64>,
    #[serde(default)]
    pub http_status_code: Option<u16>,
    #[serde(default)]
    pub checked_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub error: Option<String>,
}

/// An HTTP monitor attached to a service
///
/// `created_at`/`updated_at` are present in REST reads but omitted from push
/// payloads; `latest_result` is present in push payloads and the
/// latest-results listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Monitor {
    pub id: String,
    pub name: String,
    pub url: String,
    pub method: String,
    pub interval: u32,
    #[serde(rename = "type", default = "default_monitor_type")]
    pub monitor_type: String,
    #[serde(default)]
    pub headers: Vec<HeaderPair>,
    pub active: bool,
    #[serde(default)]
    pub degraded_threshold: Option<u32>,
    #[serde(default)]
    pub timeout: Option<u32>,
    pub service_id: String,
    #[serde(default)]
    pub service_name: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub latest_result: Option<LatestResult>,
}

pub(crate) fn default_monitor_type() -> String {
    "HTTP".to_string()
}

/// Form data for creating a monitor
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorDraft {
    pub name: String,
    pub url: String,
    pub method: String,
    pub headers: Vec<HeaderPair>,
    pub active: bool,
    pub interval: u32,
    #[serde(rename = "type")]
    pub monitor_type: String,
    pub degraded_threshold: Option<u32>,
    pub timeout: Option<u32>,
}

/// Partial update for a monitor
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<Vec<HeaderPair>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub degraded_threshold: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u32>,
}

/// A single stored check result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorResult {
    pub id: String,
    pub monitor_id: String,
    pub checked_at: DateTime<Utc>,
    pub status: MonitorStatus,
    #[serde(default)]
    pub response_time_ms: Option<u64>,
    #[serde(default)]
    pub http_status_code: Option<u16>,
    #[serde(default)]
    pub error: Option<String>,
}

/// One point in the uptime history graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryPoint {
    pub timestamp: DateTime<Utc>,
    pub status: MonitorStatus,
}

/// Aggregated statistics for a monitor, computed by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorStats {
    pub uptime: f64,
    pub failures: u64,
    #[serde(default)]
    pub p50: Option<f64>,
    #[serde(default)]
    pub p75: Option<f64>,
    #[serde(default)]
    pub p90: Option<f64>,
    #[serde(default)]
    pub p95: Option<f64>,
    #[serde(default)]
    pub p99: Option<f64>,
    pub total_pings: u64,
    #[serde(default)]
    pub last_ping: Option<DateTime<Utc>>,
    #[serde(default)]
    pub history_graph: Vec<HistoryPoint>,
}

// ============================================================================
// Services
// ============================================================================

/// Overall service status shown on the status page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServiceStatus {
    #[serde(rename = "OPERATIONAL")]
    Operational,
    #[serde(rename = "DEGRADED")]
    Degraded,
    #[serde(rename = "MAINTENANCE")]
    Maintenance,
    #[serde(rename = "OUTAGE")]
    Outage,
}

/// A monitored service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: String,
    pub name: String,
    pub status: ServiceStatus,
    #[serde(default)]
    pub description: Option<String>,
    pub organization_id: String,
    pub organization_name: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Form data for creating a service
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDraft {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: ServiceStatus,
    pub organization_id: String,
}

/// Partial update for a service
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServicePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ServiceStatus>,
}

// ============================================================================
// Incidents
// ============================================================================

/// Incident lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IncidentStatus {
    #[serde(rename = "OPEN")]
    Open,
    #[serde(rename = "RESOLVED")]
    Resolved,
    #[serde(rename = "MONITORING")]
    Monitoring,
}

/// Incident severity with the total order LOW < MEDIUM < HIGH < CRITICAL
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum IncidentSeverity {
    #[serde(rename = "LOW")]
    Low,
    #[serde(rename = "MEDIUM")]
    Medium,
    #[serde(rename = "HIGH")]
    High,
    #[serde(rename = "CRITICAL")]
    Critical,
}

impl IncidentSeverity {
    /// Numeric rank: LOW=1 .. CRITICAL=4
    pub fn rank(&self) -> u8 {
        match self {
            IncidentSeverity::Low => 1,
            IncidentSeverity::Medium => 2,
            IncidentSeverity::High => 3,
            IncidentSeverity::Critical => 4,
        }
    }
}

impl std::fmt::Display for IncidentSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IncidentSeverity::Low => write!(f, "LOW"),
            IncidentSeverity::Medium => write!(f, "MEDIUM"),
            IncidentSeverity::High => write!(f, "HIGH"),
            IncidentSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// A timeline entry on an incident
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentUpdate {
    pub id: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub created_by: Option<String>,
}

/// A failed check recorded against an auto-created incident
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedPing {
    pub checked_at: DateTime<Utc>,
    #[serde(default)]
    pub response_time_ms: Option<u64>,
    #[serde(default)]
    pub http_status_code: Option<u16>,
    #[serde(default)]
    pub error: Option<String>,
}

/// An incident as read from the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Incident {
    pub id: String,
    pub organization_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub status: IncidentStatus,
    pub severity: IncidentSeverity,
    #[serde(default)]
    pub auto_created: bool,
    #[serde(default)]
    pub auto_resolved: bool,
    #[serde(default)]
    pub monitor_id: Option<String>,
    #[serde(default)]
    pub affected_service_ids: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub resolved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_by_user_id: Option<String>,
    #[serde(default)]
    pub updates: Vec<IncidentUpdate>,
    #[serde(default)]
    pub failed_pings: Option<Vec<FailedPing>>,
}

/// Form data for opening an incident
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentDraft {
    pub organization_id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub severity: IncidentSeverity,
    pub affected_service_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monitor_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_created: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by_user_id: Option<String>,
}

/// Partial update for an incident
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<IncidentStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Form data for appending an incident timeline entry
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentUpdateDraft {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
}

// ============================================================================
// Authentication
// ============================================================================

/// Login request body
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Signup request body
#[derive(Debug, Clone, Serialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_total_order() {
        assert!(IncidentSeverity::Low < IncidentSeverity::Medium);
        assert!(IncidentSeverity::Medium < IncidentSeverity::High);
        assert!(IncidentSeverity::High < IncidentSeverity::Critical);
        assert_eq!(IncidentSeverity::Low.rank(), 1);
        assert_eq!(IncidentSeverity::Critical.rank(), 4);
    }

    #[test]
    fn test_monitor_parsing_with_latest_result() {
        let json = r#"{
            "id":"m-1","name":"API","url":"https://api.example.com/health",
            "method":"GET","interval":60,"type":"HTTP","headers":[],
            "active":true,"degradedThreshold":2000,"timeout":5000,
            "serviceId":"s-1","serviceName":"API",
            "latestResult":{"status":"UP","responseTimeMs":123,
                "httpStatusCode":200,"checkedAt":"2026-01-01T00:00:00Z","error":null}
        }"#;
        let monitor: Monitor = serde_json::from_str(json).unwrap();
        assert_eq!(monitor.id, "m-1");
        assert_eq!(monitor.monitor_type, "HTTP");
        let latest = monitor.latest_result.unwrap();
        assert_eq!(latest.status, Some(MonitorStatus::Up));
        assert_eq!(latest.response_time_ms, Some(123));
    }

    #[test]
    fn test_monitor_parsing_without_timestamps() {
        // Push payloads omit createdAt/updatedAt entirely.
        let json = r#"{
            "id":"m-2","name":"Web","url":"https://example.com","method":"GET",
            "interval":30,"active":true,"serviceId":"s-1"
        }"#;
        let monitor: Monitor = serde_json::from_str(json).unwrap();
        assert!(monitor.created_at.is_none());
        assert!(monitor.latest_result.is_none());
        assert_eq!(monitor.monitor_type, "HTTP");
    }

    #[test]
    fn test_incident_parsing_with_updates() {
        let json = r#"{
            "id":"i-1","organizationId":"org-1","title":"API outage",
            "status":"OPEN","severity":"HIGH","autoCreated":true,
            "autoResolved":false,"affectedServiceIds":["s-1","s-2"],
            "createdAt":"2026-01-01T00:00:00Z","updatedAt":"2026-01-01T00:05:00Z",
            "updates":[{"id":"u-1","message":"Investigating",
                "createdAt":"2026-01-01T00:01:00Z","createdBy":"ada"}],
            "failedPings":[{"checkedAt":"2026-01-01T00:00:30Z",
                "responseTimeMs":null,"httpStatusCode":503,"error":"503"}]
        }"#;
        let incident: Incident = serde_json::from_str(json).unwrap();
        assert_eq!(incident.severity, IncidentSeverity::High);
        assert_eq!(incident.affected_service_ids.len(), 2);
        assert_eq!(incident.updates.len(), 1);
        assert_eq!(incident.failed_pings.as_ref().unwrap().len(), 1);
        assert!(incident.resolved_at.is_none());
    }

    #[test]
    fn test_incident_patch_skips_absent_fields() {
        let patch = IncidentPatch {
            status: Some(IncidentStatus::Resolved),
            ..Default::default()
        };
        let json = serde_json::to_string(&patch).unwrap();
        assert_eq!(json, r#"{"status":"RESOLVED"}"#);
    }

    #[test]
    fn test_monitor_patch_skips_absent_fields() {
        let patch = MonitorPatch {
            active: Some(false),
            ..Default::default()
        };
        let json = serde_json::to_string(&patch).unwrap();
        assert_eq!(json, r#"{"active":false}"#);
    }

    #[test]
    fn test_service_parsing() {
        let json = r#"{
            "id":"s-1","name":"API","status":"OPERATIONAL",
            "organizationId":"org-1","organizationName":"Example",
            "createdAt":"2026-01-01T00:00:00Z"
        }"#;
        let service: Service = serde_json::from_str(json).unwrap();
        assert_eq!(service.status, ServiceStatus::Operational);
        assert!(service.updated_at.is_none());
    }
}
