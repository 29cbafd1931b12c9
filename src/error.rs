//! Error types for the clinic portal

use thiserror::Error;

use crate::resources::ValidationErrors;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    /// Non-2xx response other than 401, with the server's message
    #[error("{message} (HTTP {status})")]
    Api { status: u16, message: String },

    #[error("Session expired or invalid, please log in again")]
    Unauthorized,

    #[error("Access denied: {0}")]
    Forbidden(String),

    #[error("Not logged in. Run 'clinic login' first.")]
    NotAuthenticated,

    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("Session storage error: {0}")]
    Storage(String),

    #[error("Config file not found. Run 'clinic init' first.")]
    ConfigNotFound,
}

impl Error {
    /// Whether the server rejected the credential itself (401 or 403)
    pub fn is_auth_failure(&self) -> bool {
        match self {
            Error::Unauthorized => true,
            Error::Api { status, .. } => *status == 401 || *status == 403,
            _ => false,
        }
    }

    /// Transport-level failure: connect, timeout, or 5xx
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Http(_) => true,
            Error::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl From<ValidationErrors> for Error {
    fn from(errors: ValidationErrors) -> Self {
        Error::Validation(errors)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
