//! Session and UI preference state for Pulseboard clients
//!
//! Holds the authenticated user record and the theme flag, both persisted
//! through a pluggable storage backend so they survive process restarts.
//! Stores are explicit values handed to whoever needs them; there are no
//! ambient globals.

mod session;
mod storage;
mod theme;

pub use session::{Role, SessionStore, User, REDIRECT_KEY, SESSION_USER_KEY};
pub use storage::{FileStorage, MemoryStorage, StorageBackend};
pub use theme::{NullThemeSink, Theme, ThemeSink, ThemeStore, THEME_KEY};

/// Errors raised by the session and preference stores
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Not logged in")]
    NotLoggedIn,

    #[error("Operation requires the ADMIN role")]
    NotAuthorized,
}

/// Result type alias for session operations
pub type Result<T> = std::result::Result<T, SessionError>;
