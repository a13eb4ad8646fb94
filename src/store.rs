use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use thiserror::Error;
use tokio::fs;
use tracing::debug;

use crate::models::Alarm;

pub const DEFAULT_DB_PATH: &str = "data/alarms.json";

// Failures of the persistence collaborator. None of them touch in-memory state.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage unavailable: {0}")]
    Unavailable(#[from] io::Error),

    #[error("storage full")]
    Full,

    #[error("stored alarms are corrupt: {0}")]
    Corrupt(String),
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        StorageError::Corrupt(e.to_string())
    }
}

fn map_io(e: io::Error) -> StorageError {
    if e.kind() == io::ErrorKind::StorageFull {
        StorageError::Full
    } else {
        StorageError::Unavailable(e)
    }
}

// Where the alarm collection lives between runs.
#[async_trait]
pub trait AlarmStorage: Send + Sync {
    async fn load_alarms(&self) -> Result<Vec<Alarm>, StorageError>;

    async fn save_alarms(&self, alarms: &[Alarm]) -> Result<(), StorageError>;
}

// Whole collection as one JSON array; times are RFC 3339 strings.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl AlarmStorage for JsonFileStorage {
    async fn load_alarms(&self) -> Result<Vec<Alarm>, StorageError> {
        let text = match fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(map_io(e)),
        };
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let alarms: Vec<Alarm> = serde_json::from_str(&text)?;
        for alarm in &alarms {
            alarm
                .validate()
                .map_err(|e| StorageError::Corrupt(format!("alarm {}: {e}", alarm.id)))?;
        }
        debug!(path = %self.path.display(), count = alarms.len(), "alarms loaded");
        Ok(alarms)
    }

    // write to a sibling temp file, then rename over the old one
    async fn save_alarms(&self, alarms: &[Alarm]) -> Result<(), StorageError> {
        let text = serde_json::to_string_pretty(alarms)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(map_io)?;
        }

        let mut tmp_path = self.path.clone().into_os_string();
        tmp_path.push(".tmp");
        fs::write(&tmp_path, text).await.map_err(map_io)?;
        fs::rename(&tmp_path, &self.path).await.map_err(map_io)?;

        debug!(path = %self.path.display(), count = alarms.len(), "alarms saved");
        Ok(())
    }
}

// In-process storage. A set `save_error` makes every save fail with that kind until cleared.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    alarms: Mutex<Vec<Alarm>>,
    save_error: Mutex<Option<io::ErrorKind>>,
}

impl MemoryStorage {
    pub fn new(alarms: Vec<Alarm>) -> Self {
        Self {
            alarms: Mutex::new(alarms),
            save_error: Mutex::new(None),
        }
    }

    pub fn set_save_error(&self, kind: Option<io::ErrorKind>) {
        *self.save_error.lock().unwrap_or_else(|e| e.into_inner()) = kind;
    }

    pub fn snapshot(&self) -> Vec<Alarm> {
        self.alarms.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl AlarmStorage for MemoryStorage {
    async fn load_alarms(&self) -> Result<Vec<Alarm>, StorageError> {
        Ok(self.snapshot())
    }

    async fn save_alarms(&self, alarms: &[Alarm]) -> Result<(), StorageError> {
        if let Some(kind) = *self.save_error.lock().unwrap_or_else(|e| e.into_inner()) {
            return Err(map_io(io::Error::from(kind)));
        }
        *self.alarms.lock().unwrap_or_else(|e| e.into_inner()) = alarms.to_vec();
        Ok(())
    }
}
