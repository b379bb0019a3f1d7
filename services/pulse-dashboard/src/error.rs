//! Error types for the dashboard client

/// Errors that can occur when talking to the status backend
#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    #[error("Not connected to the status backend")]
    NotConnected,

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {detail}")]
    Api { status: u16, detail: String },

    #[error("Failed to send message: {0}")]
    SendError(String),

    #[error("Session error: {0}")]
    Session(#[from] pb_session::SessionError),

    #[error("Not logged in")]
    NotLoggedIn,
}

/// Result type alias for dashboard operations
pub type Result<T> = std::result::Result<T, DashboardError>;
