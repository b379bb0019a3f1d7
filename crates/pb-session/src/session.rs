//! Authenticated-user session state
//!
//! One logical session per process: created at login, read for the app's
//! lifetime, cleared at logout. The persisted copy is the sole source of
//! truth on startup; rehydration happens synchronously in the constructor,
//! with no server round-trip.

use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::storage::StorageBackend;
use crate::{Result, SessionError};

/// Storage key for the persisted user record
pub const SESSION_USER_KEY: &str = "session-user";

/// Storage key for the transient post-login navigation target
pub const REDIRECT_KEY: &str = "redirectTo";

/// User role as assigned by the backend at login
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "ADMIN")]
    Admin,
    #[serde(rename = "USER")]
    User,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Admin => write!(f, "ADMIN"),
            Role::User => write!(f, "USER"),
        }
    }
}

/// Authenticated user record as returned by login/signup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub user_id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub organization_id: String,
    pub organization_name: String,
}

/// Process-wide session store backed by durable storage
///
/// Only the user record is persisted. Reads go through the in-memory copy;
/// every write goes through the backend before the cached copy is updated,
/// so the persisted state never lags a completed call.
pub struct SessionStore {
    backend: Arc<dyn StorageBackend>,
    user: RwLock<Option<User>>,
}

impl SessionStore {
    /// Create a session store, rehydrating the persisted user synchronously
    ///
    /// A missing record means "logged out". A record that fails to parse is
    /// treated the same way, with a diagnostic log.
    pub fn new(backend: Arc<dyn StorageBackend>) -> Result<Self> {
        let user = match backend.load(SESSION_USER_KEY)? {
            Some(raw) => match serde_json::from_str::<User>(&raw) {
                Ok(user) => {
                    debug!("Rehydrated session for {}", user.email);
                    Some(user)
                }
                Err(e) => {
                    warn!("Discarding unreadable session record: {}", e);
                    None
                }
            },
            None => None,
        };
        Ok(Self {
            backend,
            user: RwLock::new(user),
        })
    }

    /// Replace the session user, persisting the change before it is visible
    pub fn set_user(&self, user: Option<User>) -> Result<()> {
        let mut guard = self.user.write().unwrap();
        match &user {
            Some(user) => {
                let raw = serde_json::to_string(user)?;
                self.backend.store(SESSION_USER_KEY, &raw)?;
            }
            None => self.backend.remove(SESSION_USER_KEY)?,
        }
        *guard = user;
        Ok(())
    }

    /// Clear the session (equivalent to `set_user(None)`)
    pub fn logout(&self) -> Result<()> {
        debug!("Clearing session");
        self.set_user(None)
    }

    /// Current user, if logged in
    pub fn user(&self) -> Option<User> {
        self.user.read().unwrap().clone()
    }

    /// Current role, if logged in
    pub fn role(&self) -> Option<Role> {
        self.user.read().unwrap().as_ref().map(|u| u.role)
    }

    /// Organization id of the current user; the push subscription key
    pub fn organization_id(&self) -> Option<String> {
        self.user
            .read()
            .unwrap()
            .as_ref()
            .map(|u| u.organization_id.clone())
    }

    /// Gate for ADMIN-only operations
    ///
    /// Reads the live role at call time; a cached snapshot would miss a
    /// logout between the check and the call.
    pub fn ensure_admin(&self) -> Result<()> {
        match self.role() {
            Some(Role::Admin) => Ok(()),
            Some(Role::User) => Err(SessionError::NotAuthorized),
            None => Err(SessionError::NotLoggedIn),
        }
    }

    /// Remember where to navigate after the next login
    pub fn set_redirect(&self, target: &str) -> Result<()> {
        self.backend.store(REDIRECT_KEY, target)
    }

    /// Consume the stored post-login target, removing it
    pub fn take_redirect(&self) -> Result<Option<String>> {
        let target = self.backend.load(REDIRECT_KEY)?;
        if target.is_some() {
            self.backend.remove(REDIRECT_KEY)?;
        }
        Ok(target)
    }
}
