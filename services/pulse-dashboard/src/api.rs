//! REST client for the dashboard backend
//!
//! Thin typed wrapper over reqwest. Every call goes through `request`, which
//! maps non-2xx responses into `DashboardError::Api`, preferring the
//! backend's `detail` field over the raw body. The backend authenticates the
//! connection itself; no credential header is attached to requests, and
//! `POST /login` / `POST /signup` answer with the bare user record.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ApiConfig;
use crate::error::{DashboardError, Result};
use crate::types::{
    Credentials, Incident, IncidentDraft, IncidentPatch, IncidentUpdate, IncidentUpdateDraft,
    Monitor, MonitorDraft, MonitorPatch, MonitorResult, MonitorStats, Service, ServiceDraft,
    ServicePatch, SignupRequest,
};
use pb_session::User;

/// Error body shape used by the backend
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    detail: String,
}

/// Map a non-2xx response to a typed error, preferring the `detail` field
fn api_error(status: u16, body: String) -> DashboardError {
    let detail = serde_json::from_str::<ApiErrorBody>(&body)
        .map(|e| e.detail)
        .unwrap_or(body);
    DashboardError::Api { status, detail }
}

/// Typed HTTP client for the backend REST API
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()?;
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Option<&(impl Serialize + ?Sized)>,
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        debug!("{} {}", method, url);

        let mut builder = self.http.request(method, &url);
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(api_error(status.as_u16(), response.text().await.unwrap_or_default()));
        }

        Ok(response.json().await?)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.request(reqwest::Method::GET, path, None::<&()>).await
    }

    /// DELETE has no response body to parse
    async fn delete(&self, path: &str) -> Result<()> {
        let url = format!("{}{}", self.base_url, path);
        debug!("DELETE {}", url);

        let response = self.http.delete(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(api_error(status.as_u16(), response.text().await.unwrap_or_default()));
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Authentication
    // ------------------------------------------------------------------

    /// Log in; the backend answers with the bare user record
    pub async fn login(&self, email: &str, password: &str) -> Result<User> {
        let body = Credentials {
            email: email.to_string(),
            password: password.to_string(),
        };
        self.request(reqwest::Method::POST, "/login", Some(&body))
            .await
    }

    pub async fn signup(&self, request: &SignupRequest) -> Result<User> {
        self.request(reqwest::Method::POST, "/signup", Some(request))
            .await
    }

    // ------------------------------------------------------------------
    // Services
    // ------------------------------------------------------------------

    pub async fn services(&self, organization_id: &str) -> Result<Vec<Service>> {
        self.get(&format!("/services?organizationId={}", organization_id))
            .await
    }

    pub async fn service(&self, id: &str) -> Result<Service> {
        self.get(&format!("/services/{}", id)).await
    }

    pub async fn create_service(&self, draft: &ServiceDraft) -> Result<Service> {
        self.request(reqwest::Method::POST, "/services", Some(draft))
            .await
    }

    pub async fn update_service(&self, id: &str, patch: &ServicePatch) -> Result<Service> {
        self.request(
            reqwest::Method::PATCH,
            &format!("/services/{}", id),
            Some(patch),
        )
        .await
    }

    pub async fn delete_service(&self, id: &str) -> Result<()> {
        self.delete(&format!("/services/{}", id)).await
    }

    // ------------------------------------------------------------------
    // Monitors
    // ------------------------------------------------------------------

    pub async fn monitors(&self, service_id: &str) -> Result<Vec<Monitor>> {
        self.get(&format!("/services/{}/monitors", service_id)).await
    }

    /// All of the organization's monitors, each carrying its latest result
    pub async fn monitors_with_latest(&self, organization_id: &str) -> Result<Vec<Monitor>> {
        self.get(&format!(
            "/monitors/latest-results?organizationId={}",
            organization_id
        ))
        .await
    }

    pub async fn create_monitor(&self, service_id: &str, draft: &MonitorDraft) -> Result<Monitor> {
        self.request(
            reqwest::Method::POST,
            &format!("/services/{}/monitors", service_id),
            Some(draft),
        )
        .await
    }

    pub async fn update_monitor(
        &self,
        service_id: &str,
        monitor_id: &str,
        patch: &MonitorPatch,
    ) -> Result<Monitor> {
        self.request(
            reqwest::Method::PATCH,
            &format!("/services/{}/monitors/{}", service_id, monitor_id),
            Some(patch),
        )
        .await
    }

    pub async fn delete_monitor(&self, service_id: &str, monitor_id: &str) -> Result<()> {
        self.delete(&format!("/services/{}/monitors/{}", service_id, monitor_id))
            .await
    }

    /// Recent check results, newest first
    pub async fn monitor_results(
        &self,
        service_id: &str,
        monitor_id: &str,
        limit: u32,
    ) -> Result<Vec<MonitorResult>> {
        self.get(&format!(
            "/services/{}/monitors/{}/results?limit={}",
            service_id, monitor_id, limit
        ))
        .await
    }

    pub async fn monitor_stats(&self, service_id: &str, monitor_id: &str) -> Result<MonitorStats> {
        self.get(&format!(
            "/services/{}/monitors/{}/stats",
            service_id, monitor_id
        ))
        .await
    }

    // ------------------------------------------------------------------
    // Incidents
    // ------------------------------------------------------------------

    pub async fn incidents(&self, organization_id: &str) -> Result<Vec<Incident>> {
        self.get(&format!("/incidents?organizationId={}", organization_id))
            .await
    }

    pub async fn incident(&self, id: &str) -> Result<Incident> {
        self.get(&format!("/incidents/{}", id)).await
    }

    pub async fn create_incident(&self, draft: &IncidentDraft) -> Result<Incident> {
        self.request(reqwest::Method::POST, "/incidents", Some(draft))
            .await
    }

    pub async fn update_incident(&self, id: &str, patch: &IncidentPatch) -> Result<Incident> {
        self.request(
            reqwest::Method::PATCH,
            &format!("/incidents/{}", id),
            Some(patch),
        )
        .await
    }

    pub async fn add_incident_update(
        &self,
        id: &str,
        draft: &IncidentUpdateDraft,
    ) -> Result<IncidentUpdate> {
        self.request(
            reqwest::Method::POST,
            &format!("/incidents/{}/updates", id),
            Some(draft),
        )
        .await
    }
}

/// A monitor draft with the backend's form defaults filled in
pub fn default_monitor_draft(name: &str, url: &str) -> MonitorDraft {
    MonitorDraft {
        name: name.to_string(),
        url: url.to_string(),
        method: "GET".to_string(),
        headers: Vec::new(),
        active: true,
        interval: 60,
        monitor_type: "HTTP".to_string(),
        degraded_threshold: Some(2000),
        timeout: Some(5000),
    }
}
