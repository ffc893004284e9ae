//! # Persistent registration storage.
//!
//! [`RegistrationStore`] holds one optional serialized [`Registration`](crate::Registration).
//! Implementations must be read-your-writes consistent within a process.
//!
//! - [`MemoryStore`] keeps the value in memory (tests, ephemeral processes).
//! - [`FileStore`] keeps it in a single file, replaced atomically via rename.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::StoreError;

/// Storage for the serialized registration.
#[async_trait]
pub trait RegistrationStore: Send + Sync + 'static {
    /// Returns the persisted value, if any.
    async fn get_registration(&self) -> Result<Option<String>, StoreError>;

    /// Replaces the persisted value; `None` removes it.
    async fn set_registration(&self, value: Option<String>) -> Result<(), StoreError>;
}

/// In-memory store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    value: RwLock<Option<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store already holding `value`.
    pub fn with_value(value: impl Into<String>) -> Self {
        Self {
            value: RwLock::new(Some(value.into())),
        }
    }
}

#[async_trait]
impl RegistrationStore for MemoryStore {
    async fn get_registration(&self) -> Result<Option<String>, StoreError> {
        Ok(self.value.read().await.clone())
    }

    async fn set_registration(&self, value: Option<String>) -> Result<(), StoreError> {
        *self.value.write().await = value;
        Ok(())
    }
}

/// Single-file store.
///
/// Writes go to a sibling temporary file first and are renamed over the
/// target, so readers never see a partially written value. Writes are
/// serialized through an internal lock.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    write_lock: tokio::sync::Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl RegistrationStore for FileStore {
    async fn get_registration(&self) -> Result<Option<String>, StoreError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set_registration(&self, value: Option<String>) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        match value {
            Some(value) => {
                let temp = self.temp_path();
                tokio::fs::write(&temp, value).await?;
                tokio::fs::rename(&temp, &self.path).await?;
            }
            None => match tokio::fs::remove_file(&self.path).await {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            },
        }
        Ok(())
    }
}
