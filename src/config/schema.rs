//! Configuration schema definitions

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub storage: StorageConfig,
}

/// REST API connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL every resource path is joined onto, e.g. `http://localhost:8080/api`
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Transport timeout for a single request
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:8080/api".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Durable session storage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_session_file")]
    pub session_file: PathBuf,
}

fn default_session_file() -> PathBuf {
    PathBuf::from("./.clinic/session.json")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            session_file: default_session_file(),
        }
    }
}

impl Config {
    /// Replace the API base URL, typically from `--api-url` / `CLINIC_API_URL`
    pub fn with_base_url(mut self, base_url: Option<String>) -> Self {
        if let Some(url) = base_url {
            self.api.base_url = url;
        }
        self
    }
}
