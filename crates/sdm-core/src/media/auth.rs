//! Session credential resolution for conversion requests.

use crate::config::AuthConfig;

/// Cookie that carries the signed-in session token.
pub const SESSION_COOKIE: &str = "__session";

/// Credentials borrowed from the signed-in page session.
#[derive(Debug, Clone, Default)]
pub struct SessionCredentials {
    token: Option<String>,
    cookie: Option<String>,
}

impl SessionCredentials {
    pub fn new(token: Option<String>, cookie: Option<String>) -> Self {
        Self { token, cookie }
    }

    pub fn from_config(cfg: &AuthConfig) -> Self {
        Self::new(cfg.session_token.clone(), cfg.cookie.clone())
    }

    /// The bearer token to use: the explicit session token first, then the
    /// session cookie. `None` when the page is not signed in.
    pub fn resolve(&self) -> Option<String> {
        if let Some(token) = self.token.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            return Some(token.to_string());
        }
        self.cookie
            .as_deref()
            .and_then(session_cookie_value)
            .map(str::to_string)
    }
}

/// Value of the `__session` cookie in a `Cookie` header, if present and non-empty.
pub fn session_cookie_value(cookie_header: &str) -> Option<&str> {
    cookie_header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| name.trim() == SESSION_COOKIE)
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
}
