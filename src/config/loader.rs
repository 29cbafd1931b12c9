//! Configuration loading and environment variable interpolation

use crate::error::{Error, Result};
use regex::{Captures, Regex};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use super::Config;

pub const CONFIG_FILENAME: &str = "clinic.toml";

/// `${NAME}` or `${NAME:-fallback}`
static ENV_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)(?::-([^}]*))?\}")
        .expect("Invalid regex pattern - this is a bug in the codebase")
});

/// Load clinic.toml from the current directory or the nearest parent holding one
pub fn load_config() -> Result<Config> {
    let cwd = env::current_dir().map_err(|e| Error::Config(e.to_string()))?;
    let path = locate(&cwd).ok_or(Error::ConfigNotFound)?;
    load_config_from_path(&path)
}

pub fn load_config_from_path(path: &Path) -> Result<Config> {
    let raw = fs::read_to_string(path).map_err(|_| Error::ConfigNotFound)?;
    Ok(toml::from_str(&interpolate_env_vars(&raw))?)
}

/// Write `config` to `path` as TOML
pub fn save_config(config: &Config, path: &Path) -> Result<()> {
    let rendered = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
    fs::write(path, rendered)?;
    Ok(())
}

fn locate(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(CONFIG_FILENAME))
        .find(|candidate| candidate.is_file())
}

/// Unset variables without a fallback become empty
fn interpolate_env_vars(content: &str) -> String {
    ENV_REF
        .replace_all(content, |caps: &Captures| {
            env::var(&caps[1])
                .unwrap_or_else(|_| caps.get(2).map_or("", |m| m.as_str()).to_string())
        })
        .into_owned()
}

/// Generate a default configuration file content
pub fn default_config_content() -> &'static str {
    r#"# Clinic portal configuration

[api]
# Base URL of the clinic REST API
base_url = "${CLINIC_API_URL:-http://localhost:8080/api}"
# Per-request transport timeout
timeout_secs = 30

[storage]
# Where the logged-in session (token, profile, selected clinic) is kept
session_file = "./.clinic/session.json"
"#
}
