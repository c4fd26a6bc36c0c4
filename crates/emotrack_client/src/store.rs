use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use client_logging::client_debug;
use emotrack_core::PersistedSession;
use tempfile::NamedTempFile;

use crate::StoreError;

pub const SESSION_FILENAME: &str = "session.ron";

/// Durable client-side storage for the session keys (`token`, `user_email`, `user_id`).
pub trait SessionStore: Send + Sync {
    /// Returns the stored keys; an absent store is an empty session, not an error.
    fn load(&self) -> Result<PersistedSession, StoreError>;
    fn save(&self, session: &PersistedSession) -> Result<(), StoreError>;
    fn clear(&self) -> Result<(), StoreError>;
}

/// In-process store; contents are lost when dropped.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<PersistedSession>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contents(session: PersistedSession) -> Self {
        Self {
            inner: Mutex::new(session),
        }
    }

    pub fn snapshot(&self) -> PersistedSession {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, PersistedSession> {
        // A poisoned lock still holds plain data; keep using it.
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SessionStore for MemoryStore {
    fn load(&self) -> Result<PersistedSession, StoreError> {
        Ok(self.snapshot())
    }

    fn save(&self, session: &PersistedSession) -> Result<(), StoreError> {
        *self.lock() = session.clone();
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        *self.lock() = PersistedSession::default();
        Ok(())
    }
}

/// Stores the session as RON in `{dir}/session.ron`, replacing it atomically.
#[derive(Debug, Clone)]
pub struct RonFileStore {
    dir: PathBuf,
}

impl RonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(SESSION_FILENAME)
    }
}

impl SessionStore for RonFileStore {
    fn load(&self) -> Result<PersistedSession, StoreError> {
        let path = self.path();
        let content = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Ok(PersistedSession::default());
            }
            Err(err) => return Err(err.into()),
        };
        ron::from_str(&content).map_err(|err| StoreError::Parse(err.to_string()))
    }

    fn save(&self, session: &PersistedSession) -> Result<(), StoreError> {
        let pretty = ron::ser::PrettyConfig::new();
        let content = ron::ser::to_string_pretty(session, pretty)
            .map_err(|err| StoreError::Serialize(err.to_string()))?;
        write_atomically(&self.dir, SESSION_FILENAME, &content)?;
        client_debug!("Saved session to {:?}", self.path());
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        match fs::remove_file(self.path()) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// Ensure the state directory exists; create if missing.
fn ensure_state_dir(dir: &Path) -> Result<(), StoreError> {
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| StoreError::StateDir(e.to_string()))?;
        if !meta.is_dir() {
            return Err(StoreError::StateDir("path is not a directory".into()));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| StoreError::StateDir(e.to_string()))?;
    }
    Ok(())
}

/// Write `content` to `{dir}/{filename}` via a temp file and rename.
fn write_atomically(dir: &Path, filename: &str, content: &str) -> Result<PathBuf, StoreError> {
    ensure_state_dir(dir)?;

    let target = dir.join(filename);
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content.as_bytes())?;
    tmp.flush()?;
    tmp.as_file_mut().sync_all()?;
    tmp.persist(&target).map_err(|e| StoreError::Io(e.error))?;
    Ok(target)
}
