//! Preference storage: a get/set key-value port for the chosen language.
//!
//! The session persists a single string under [`LANGUAGE_KEY`]. Every
//! failure surfaces as [`I18nError::Storage`] and the session degrades to
//! non-persisted behaviour instead of propagating it.

use crate::i18n::I18nError;
use futures::future::{self, BoxFuture};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Key under which the chosen language code is stored.
pub const LANGUAGE_KEY: &str = "lang";

/// A boxed, sendable storage operation in progress.
pub type StoreFuture<'a, T> = BoxFuture<'a, Result<T, I18nError>>;

/// Key-value storage for user preferences.
///
/// Operations are async so that file or network backed stores never block a
/// runtime worker.
pub trait PreferenceStore: Send + Sync {
    fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<String>>;
    fn set<'a>(&'a self, key: &'a str, value: &'a str) -> StoreFuture<'a, ()>;
}

/// In-memory store, useful for tests and hosts without persistence.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store with one value already present.
    pub fn with_value(key: &str, value: &str) -> Self {
        let mut values = HashMap::new();
        values.insert(key.to_string(), value.to_string());
        Self {
            values: Mutex::new(values),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, I18nError> {
        self.values
            .lock()
            .map_err(|_| I18nError::Storage("memory store lock poisoned".to_string()))
    }
}

impl PreferenceStore for MemoryStore {
    fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<String>> {
        let result = self.lock().map(|values| values.get(key).cloned());
        Box::pin(future::ready(result))
    }

    fn set<'a>(&'a self, key: &'a str, value: &'a str) -> StoreFuture<'a, ()> {
        let result = self.lock().map(|mut values| {
            values.insert(key.to_string(), value.to_string());
        });
        Box::pin(future::ready(result))
    }
}

/// File-backed store: one file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }
}

impl PreferenceStore for FileStore {
    fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<String>> {
        Box::pin(async move {
            let path = self.path_for(key);
            match tokio::fs::read_to_string(&path).await {
                Ok(contents) => {
                    let value = contents.trim();
                    Ok((!value.is_empty()).then(|| value.to_string()))
                }
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
                Err(e) => Err(I18nError::Storage(format!(
                    "failed to read {}: {}",
                    path.display(),
                    e
                ))),
            }
        })
    }

    fn set<'a>(&'a self, key: &'a str, value: &'a str) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
                I18nError::Storage(format!("failed to create {}: {}", self.dir.display(), e))
            })?;
            let path = self.path_for(key);
            tokio::fs::write(&path, value).await.map_err(|e| {
                I18nError::Storage(format!("failed to write {}: {}", path.display(), e))
            })
        })
    }
}

/// A store that always fails, standing in for a host without storage.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableStore;

impl PreferenceStore for UnavailableStore {
    fn get<'a>(&'a self, _key: &'a str) -> StoreFuture<'a, Option<String>> {
        Box::pin(future::ready(Err(I18nError::Storage(
            "storage is not available".to_string(),
        ))))
    }

    fn set<'a>(&'a self, _key: &'a str, _value: &'a str) -> StoreFuture<'a, ()> {
        Box::pin(future::ready(Err(I18nError::Storage(
            "storage is not available".to_string(),
        ))))
    }
}
