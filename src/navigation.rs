//! Navigation abstraction and well-known routes
//!
//! The portal never touches a concrete location bar. Anything that needs to move
//! the user (the role gate on denial, the API client on 401) goes through a
//! [`Navigator`], so the terminal client and tests can each supply their own.

use std::sync::Mutex;

pub const LOGIN: &str = "/login";
pub const REGISTER: &str = "/register";
pub const ROOT: &str = "/";
pub const SUPER_ADMIN_LOGIN: &str = "/super-admin/login";

/// Current location plus the ability to move somewhere else
pub trait Navigator: Send + Sync {
    /// Path currently displayed
    fn location(&self) -> String;

    /// Replace the current location
    fn navigate(&self, path: &str);
}

/// Login page for a session kind
pub fn login_surface(elevated: bool) -> &'static str {
    if elevated {
        SUPER_ADMIN_LOGIN
    } else {
        LOGIN
    }
}

/// Whether `path` is one of the login pages
pub fn is_login_surface(path: &str) -> bool {
    let path = normalize(path);
    path == LOGIN || path == SUPER_ADMIN_LOGIN
}

/// Strip query/fragment and trailing slashes; the empty path becomes `/`
pub fn normalize(path: &str) -> &str {
    let path = path
        .split(['?', '#'])
        .next()
        .unwrap_or(path)
        .trim_end_matches('/');
    if path.is_empty() {
        ROOT
    } else {
        path
    }
}

/// In-process navigator that records every navigation
#[derive(Debug)]
pub struct MemoryNavigator {
    location: Mutex<String>,
    history: Mutex<Vec<String>>,
}

impl MemoryNavigator {
    pub fn new(start: impl Into<String>) -> Self {
        Self {
            location: Mutex::new(start.into()),
            history: Mutex::new(Vec::new()),
        }
    }

    /// Every path navigated to, in order (the starting location is not included)
    pub fn history(&self) -> Vec<String> {
        self.history
            .lock()
            .map(|h| h.clone())
            .unwrap_or_default()
    }

    /// Move without recording a redirect, as the user typing a URL would
    pub fn visit(&self, path: &str) {
        if let Ok(mut location) = self.location.lock() {
            *location = path.to_string();
        }
    }
}

impl Default for MemoryNavigator {
    fn default() -> Self {
        Self::new(ROOT)
    }
}

impl Navigator for MemoryNavigator {
    fn location(&self) -> String {
        self.location
            .lock()
            .map(|l| l.clone())
            .unwrap_or_else(|_| ROOT.to_string())
    }

    fn navigate(&self, path: &str) {
        tracing::debug!(to = path, "navigate");
        if let Ok(mut location) = self.location.lock() {
            *location = path.to_string();
        }
        if let Ok(mut history) = self.history.lock() {
            history.push(path.to_string());
        }
    }
}
