//! Pulseboard Dashboard Client Library
//!
//! The client core behind a service-status dashboard: a typed REST client
//! for the backend API, a reconnecting push-stream client for live monitor
//! and incident events, and the reconcilers that keep the local collections
//! consistent as events arrive.

pub mod api;
pub mod board;
pub mod client;
pub mod config;
pub mod error;
pub mod events;
pub mod io;
pub mod reconcile;
pub mod stream;
pub mod types;

pub use api::{default_monitor_draft, ApiClient};
pub use board::{IncidentBoard, MonitorBoard};
pub use client::{Dashboard, Notification};
pub use config::{load_config, ApiConfig, Config, StreamConfig};
pub use error::{DashboardError, Result};
pub use events::{decode_frame, is_pending_tick, DecodedFrame, PushEvent};
pub use io::{ConnectionFactory, ConnectionPair, FrameReader, FrameWriter};
pub use reconcile::{
    apply_incident_update, apply_monitor_update, classify_change, filter_by_services,
    sorted_for_display, status_transition, IncidentChange,
};
pub use stream::{Channel, StreamClient, StreamPhase};
pub use types::{
    HeaderPair, Incident, IncidentDraft, IncidentPatch, IncidentSeverity, IncidentStatus,
    IncidentUpdate, IncidentUpdateDraft, LatestResult, Monitor, MonitorDraft, MonitorPatch,
    MonitorResult, MonitorStats, MonitorStatus, Service, ServiceDraft, ServicePatch,
    ServiceStatus, SignupRequest,
};
