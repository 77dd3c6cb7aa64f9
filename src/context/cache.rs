//! Durable store of diff summaries keyed by file and content hash.
//!
//! Storage is abstracted behind [`CacheBackend`] so the builder can run
//! against a JSON file on disk or an in-memory buffer. [`ContextCache`] never
//! fails: unreadable or corrupt data reads as an empty store and write errors
//! are logged and dropped.

use std::collections::BTreeMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::ai::Language;
use crate::context::ContextError;

/// Cache location relative to the working directory.
pub const DEFAULT_CACHE_PATH: &str = ".cache/context.json";

/// One stored summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Final summary text, without marker.
    pub summary: String,
    /// Creation time in Unix milliseconds.
    pub timestamp: i64,
    /// Response language code the summary was produced for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl CacheEntry {
    /// Creates an entry stamped with the current time.
    pub fn new(summary: impl Into<String>, language: Language) -> Self {
        Self {
            summary: summary.into(),
            timestamp: chrono::Utc::now().timestamp_millis(),
            language: Some(language.code().to_string()),
        }
    }

    /// Whether this entry can be reused for `language`.
    ///
    /// Entries that carry no language match any language.
    pub fn matches_language(&self, language: Language) -> bool {
        self.language
            .as_deref()
            .map_or(true, |code| code.eq_ignore_ascii_case(language.code()))
    }
}

/// In-memory form of the whole cache, ordered by key.
pub type CacheStore = BTreeMap<String, CacheEntry>;

/// Raw storage for the serialized cache.
pub trait CacheBackend: Send + Sync {
    /// Returns the stored document, or `None` when nothing has been stored.
    fn load(&self) -> Result<Option<String>, ContextError>;

    /// Replaces the stored document.
    fn save(&self, contents: &str) -> Result<(), ContextError>;

    /// Removes the stored document. Removing nothing is not an error.
    fn clear(&self) -> Result<(), ContextError>;

    /// Human-readable location for messages.
    fn location(&self) -> String;
}

/// JSON file on disk, replaced atomically on every save.
#[derive(Debug, Clone)]
pub struct DiskCache {
    path: PathBuf,
}

impl DiskCache {
    /// Cache file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Cache file at [`DEFAULT_CACHE_PATH`].
    pub fn default_location() -> Self {
        Self::new(DEFAULT_CACHE_PATH)
    }

    fn parent_dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }
}

impl CacheBackend for DiskCache {
    fn load(&self) -> Result<Option<String>, ContextError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ContextError::cache_io(&self.path, e)),
        }
    }

    fn save(&self, contents: &str) -> Result<(), ContextError> {
        let dir = self.parent_dir();
        fs::create_dir_all(dir).map_err(|e| ContextError::cache_io(dir, e))?;

        let mut temp = NamedTempFile::new_in(dir).map_err(|e| ContextError::cache_io(dir, e))?;
        temp.write_all(contents.as_bytes())
            .and_then(|()| temp.flush())
            .map_err(|e| ContextError::cache_io(temp.path(), e))?;
        temp.persist(&self.path)
            .map_err(|e| ContextError::cache_io(&self.path, e.error))?;

        Ok(())
    }

    fn clear(&self) -> Result<(), ContextError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ContextError::cache_io(&self.path, e)),
        }
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

/// Process-local backend, mainly for tests.
#[derive(Debug, Default)]
pub struct MemoryCache {
    contents: Mutex<Option<String>>,
}

impl MemoryCache {
    /// Empty in-memory backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend pre-loaded with a raw document.
    pub fn with_contents(contents: impl Into<String>) -> Self {
        Self {
            contents: Mutex::new(Some(contents.into())),
        }
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.contents
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl CacheBackend for MemoryCache {
    fn load(&self) -> Result<Option<String>, ContextError> {
        Ok(self.slot().clone())
    }

    fn save(&self, contents: &str) -> Result<(), ContextError> {
        *self.slot() = Some(contents.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), ContextError> {
        *self.slot() = None;
        Ok(())
    }

    fn location(&self) -> String {
        "<memory>".to_string()
    }
}

/// Summary cache with best-effort persistence.
pub struct ContextCache {
    backend: Box<dyn CacheBackend>,
}

impl ContextCache {
    /// Cache over an arbitrary backend.
    pub fn new(backend: Box<dyn CacheBackend>) -> Self {
        Self { backend }
    }

    /// Cache stored at `./.cache/context.json`.
    pub fn disk() -> Self {
        Self::new(Box::new(DiskCache::default_location()))
    }

    /// Cache that lives only as long as this value.
    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryCache::new()))
    }

    /// Where the cache is stored.
    pub fn location(&self) -> String {
        self.backend.location()
    }

    /// Loads the whole store. Missing, unreadable or corrupt data reads as empty.
    pub fn read(&self) -> CacheStore {
        let contents = match self.backend.load() {
            Ok(Some(contents)) => contents,
            Ok(None) => return CacheStore::new(),
            Err(e) => {
                warn!(error = %e, "Failed to read context cache; starting empty");
                return CacheStore::new();
            }
        };

        match serde_json::from_str::<CacheStore>(&contents) {
            Ok(store) => {
                debug!(entries = store.len(), "Loaded context cache");
                store
            }
            Err(e) => {
                warn!(
                    location = %self.backend.location(),
                    error = %e,
                    "Context cache is corrupt; starting empty"
                );
                CacheStore::new()
            }
        }
    }

    /// Persists the whole store. Failures are logged and ignored.
    pub fn write(&self, store: &CacheStore) {
        let contents = match serde_json::to_string_pretty(store) {
            Ok(contents) => contents,
            Err(e) => {
                warn!(error = %e, "Failed to serialize context cache");
                return;
            }
        };

        match self.backend.save(&contents) {
            Ok(()) => debug!(entries = store.len(), "Saved context cache"),
            Err(e) => warn!(error = %e, "Failed to write context cache"),
        }
    }

    /// Deletes all stored summaries. Failures are logged and ignored.
    pub fn clear(&self) {
        if let Err(e) = self.backend.clear() {
            warn!(error = %e, "Failed to clear context cache");
        }
    }
}
