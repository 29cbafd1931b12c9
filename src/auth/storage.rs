//! Durable session storage
//!
//! The whole record is one document so the token, the elevated flag and the
//! profile are always written together.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::auth::models::{Session, UserProfile};
use crate::error::{Error, Result};

/// What survives between runs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedSession {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub is_super_admin: bool,
    #[serde(default)]
    pub selected_clinic_id: Option<String>,
    #[serde(default)]
    pub user: Option<UserProfile>,
}

impl PersistedSession {
    pub fn is_empty(&self) -> bool {
        self.token.is_none()
    }
}

impl From<&Session> for PersistedSession {
    fn from(session: &Session) -> Self {
        Self {
            token: Some(session.token.clone()),
            is_super_admin: session.elevated,
            selected_clinic_id: session.clinic_id.clone(),
            user: Some(session.user.clone()),
        }
    }
}

/// Backing store for the persisted session
pub trait SessionStorage: Send + Sync {
    /// Read the record; a missing record is an empty one
    fn load(&self) -> Result<PersistedSession>;

    /// Replace the record in one write
    fn store(&self, session: &PersistedSession) -> Result<()>;

    /// Remove the record; removing nothing is not an error
    fn clear(&self) -> Result<()>;
}

/// JSON file on disk, replaced atomically via a sibling temp file
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "session.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl SessionStorage for FileStorage {
    fn load(&self) -> Result<PersistedSession> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(PersistedSession::default())
            }
            Err(e) => return Err(e.into()),
        };
        if content.trim().is_empty() {
            return Ok(PersistedSession::default());
        }
        Ok(serde_json::from_str(&content)?)
    }

    fn store(&self, session: &PersistedSession) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let temp = self.temp_path();
        fs::write(&temp, serde_json::to_vec_pretty(session)?)?;
        fs::rename(&temp, &self.path)?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Process-local storage, for tests and embedding
#[derive(Debug, Default)]
pub struct MemoryStorage {
    record: Mutex<PersistedSession>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with an existing record, as if left behind by a previous run
    pub fn with_record(record: PersistedSession) -> Self {
        Self {
            record: Mutex::new(record),
        }
    }
}

impl SessionStorage for MemoryStorage {
    fn load(&self) -> Result<PersistedSession> {
        self.record
            .lock()
            .map(|r| r.clone())
            .map_err(|e| Error::Storage(e.to_string()))
    }

    fn store(&self, session: &PersistedSession) -> Result<()> {
        let mut record = self
            .record
            .lock()
            .map_err(|e| Error::Storage(e.to_string()))?;
        *record = session.clone();
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let mut record = self
            .record
            .lock()
            .map_err(|e| Error::Storage(e.to_string()))?;
        *record = PersistedSession::default();
        Ok(())
    }
}
