//! UI theme preference
//!
//! The theme survives restarts via the storage backend and is applied to the
//! rendering root through an injected sink. Persist and apply happen under
//! the store's write lock, so a caller never observes the new value without
//! it having been stored and applied.

use std::sync::{Arc, RwLock};

use tracing::debug;

use crate::storage::StorageBackend;
use crate::Result;

/// Storage key for the persisted theme; the raw value is `light` or `dark`
pub const THEME_KEY: &str = "theme";

/// UI theme flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    fn from_stored(raw: &str) -> Option<Self> {
        match raw {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            _ => None,
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Side-effect target for theme changes (the rendering root)
pub trait ThemeSink: Send + Sync {
    fn apply(&self, theme: Theme);
}

/// Sink that discards theme changes; for headless use and tests
#[derive(Default, Clone)]
pub struct NullThemeSink;

impl ThemeSink for NullThemeSink {
    fn apply(&self, _theme: Theme) {}
}

/// Theme store with persistence and render-root application
pub struct ThemeStore {
    backend: Arc<dyn StorageBackend>,
    sink: Arc<dyn ThemeSink>,
    theme: RwLock<Theme>,
}

impl ThemeStore {
    /// Create a theme store, rehydrating the persisted value synchronously
    ///
    /// An absent or unrecognized stored value falls back to `default`. The
    /// rehydrated theme is applied to the sink immediately.
    pub fn new(
        backend: Arc<dyn StorageBackend>,
        sink: Arc<dyn ThemeSink>,
        default: Theme,
    ) -> Result<Self> {
        let theme = backend
            .load(THEME_KEY)?
            .as_deref()
            .and_then(Theme::from_stored)
            .unwrap_or(default);
        sink.apply(theme);
        Ok(Self {
            backend,
            sink,
            theme: RwLock::new(theme),
        })
    }

    /// Current theme
    pub fn theme(&self) -> Theme {
        *self.theme.read().unwrap()
    }

    /// Set the theme, persisting and applying it before returning
    pub fn set(&self, theme: Theme) -> Result<()> {
        let mut guard = self.theme.write().unwrap();
        self.backend.store(THEME_KEY, theme.as_str())?;
        self.sink.apply(theme);
        *guard = theme;
        debug!("Theme set to {}", theme);
        Ok(())
    }

    /// Flip between light and dark, returning the new theme
    pub fn toggle(&self) -> Result<Theme> {
        let next = self.theme().toggled();
        self.set(next)?;
        Ok(next)
    }
}
