use crate::domain::constants::{CONFIG_DIR, SESSION_FILE};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The two durable entries backing a session, as raw strings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct StoredSession {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

/// Durable key/value store for `token` and `role`. Only the session store
/// writes through this trait.
pub trait SessionStorage: Send + Sync {
    fn read(&self) -> anyhow::Result<StoredSession>;
    fn write(&self, entry: &StoredSession) -> anyhow::Result<()>;
    /// Removes both entries in one operation.
    fn clear(&self) -> anyhow::Result<()>;
}

pub fn config_dir() -> anyhow::Result<PathBuf> {
    let home = std::env::var("HOME")?;
    Ok(PathBuf::from(home).join(CONFIG_DIR))
}

pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self::at(config_dir()?.join(SESSION_FILE)))
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStorage for FileStorage {
    fn read(&self) -> anyhow::Result<StoredSession> {
        if !self.path.exists() {
            return Ok(StoredSession::default());
        }
        let raw = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    fn write(&self, entry: &StoredSession) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        // rename keeps the token/role pair replaced as a unit
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_string_pretty(entry)?)?;
        std::fs::rename(tmp, &self.path)?;
        Ok(())
    }

    fn clear(&self) -> anyhow::Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-process storage for tests and throwaway sessions.
#[derive(Default)]
pub struct MemoryStorage {
    entry: Mutex<StoredSession>,
}

impl MemoryStorage {
    pub fn with_entry(entry: StoredSession) -> Self {
        Self {
            entry: Mutex::new(entry),
        }
    }
}

impl SessionStorage for MemoryStorage {
    fn read(&self) -> anyhow::Result<StoredSession> {
        Ok(self.entry.lock().clone())
    }

    fn write(&self, entry: &StoredSession) -> anyhow::Result<()> {
        *self.entry.lock() = entry.clone();
        Ok(())
    }

    fn clear(&self) -> anyhow::Result<()> {
        *self.entry.lock() = StoredSession::default();
        Ok(())
    }
}
