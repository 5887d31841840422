//! Story persistence over a local key-value store.
//!
//! The whole [`StoryRecord`] lives as one JSON document under one well-known
//! key. Saves always overwrite the full document; there is no merge logic.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::record::StoryRecord;

/// Default store key for the story document.
pub const DEFAULT_STORAGE_KEY: &str = "valentine-timeline-data";

/// Errors from writing to the store.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Storage quota exceeded: {needed} bytes needed, {available} available")]
    QuotaExceeded { needed: usize, available: usize },

    #[error("Storage rejected the write: {0}")]
    Rejected(String),
}

/// Errors from reading a persisted or imported document.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Invalid file format: {0}")]
    InvalidFormat(#[from] serde_json::Error),

    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),
}

/// A string key-value store, the moral equivalent of browser local storage.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

/// In-memory store with an optional byte quota.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
    quota: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject any write that would push total stored bytes past `bytes`.
    pub fn with_quota(mut self, bytes: usize) -> Self {
        self.quota = Some(bytes);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn used_excluding(&self, key: &str) -> usize {
        self.entries
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        if let Some(quota) = self.quota {
            let used = self.used_excluding(key);
            let needed = key.len() + value.len();
            let available = quota.saturating_sub(used);
            if needed > available {
                return Err(StorageError::QuotaExceeded { needed, available });
            }
        }
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Directory-backed store: one JSON file per key.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File backing a key.
    pub fn path_for(&self, key: &str) -> PathBuf {
        let sanitized = key
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' { c } else { '_' })
            .collect::<String>();
        self.dir.join(format!("{sanitized}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        if let Err(e) = fs::write(&tmp, value).and_then(|()| fs::rename(&tmp, &path)) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Reads and writes the story record under one key.
#[derive(Debug)]
pub struct StoryStorage<S> {
    store: S,
    key: String,
}

impl<S: KeyValueStore> StoryStorage<S> {
    pub fn new(store: S) -> Self {
        Self::with_key(store, DEFAULT_STORAGE_KEY)
    }

    pub fn with_key(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Overwrite the stored document with `record`, stamped with the current time.
    pub fn save(&mut self, record: &StoryRecord) -> Result<DateTime<Utc>, StorageError> {
        self.save_at(record, Utc::now())
    }

    /// Overwrite the stored document with `record`, stamped with `saved_at`.
    pub fn save_at(
        &mut self,
        record: &StoryRecord,
        saved_at: DateTime<Utc>,
    ) -> Result<DateTime<Utc>, StorageError> {
        let mut stamped = record.clone();
        stamped.last_saved = Some(saved_at);
        let content = serde_json::to_string(&stamped)?;
        self.store.set(&self.key, &content).inspect_err(|e| {
            warn!(error = %e, key = %self.key, "failed to save story");
        })?;
        debug!(bytes = content.len(), key = %self.key, "story saved");
        Ok(saved_at)
    }

    /// The stored record, or `None` when absent or unreadable.
    pub fn load(&self) -> Option<StoryRecord> {
        let content = match self.store.get(&self.key) {
            Ok(Some(content)) => content,
            Ok(None) => return None,
            Err(e) => {
                warn!(error = %e, key = %self.key, "failed to read stored story");
                return None;
            }
        };

        match serde_json::from_str::<StoryRecord>(&content) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(error = %e, key = %self.key, "stored story is corrupt, ignoring it");
                None
            }
        }
    }

    /// Remove the stored document. Failures are logged, not surfaced.
    pub fn clear(&mut self) {
        match self.store.remove(&self.key) {
            Ok(()) => info!(key = %self.key, "stored story cleared"),
            Err(e) => warn!(error = %e, key = %self.key, "failed to clear stored story"),
        }
    }
}

/// Serialize a record as a human-readable backup document.
pub fn export_backup(record: &StoryRecord) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(record)
}

/// Parse a backup document.
pub fn import_backup(content: &str) -> Result<StoryRecord, ParseError> {
    Ok(serde_json::from_str(content)?)
}

/// Read and parse a backup file.
pub async fn import_backup_file(path: impl AsRef<Path>) -> Result<StoryRecord, ParseError> {
    let content = tokio::fs::read_to_string(path).await?;
    import_backup(&content)
}

/// Write a backup document to `path`.
pub async fn write_backup_file(
    record: &StoryRecord,
    path: impl AsRef<Path>,
) -> Result<(), StorageError> {
    let content = export_backup(record)?;
    tokio::fs::write(path, content).await?;
    Ok(())
}

/// Default backup file name for a given day.
pub fn backup_file_name(now: DateTime<Utc>) -> String {
    format!("our-story-backup-{}.json", now.format("%Y-%m-%d"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::PhotoRef;
    use chrono::TimeZone;

    fn sample_record() -> StoryRecord {
        let mut record = StoryRecord::new();
        record.set_story("beginning", "It rained.");
        record.set_story("today", "Still here.");
        record.set_photo(
            "first-met",
            Some(PhotoRef::from_data_url("data:image/png;base64,iVBORw0KGgo=")),
        );
        record.set_photo("today", None);
        record
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let mut storage = StoryStorage::new(MemoryStore::new());
        let record = sample_record();
        let at = Utc.with_ymd_and_hms(2025, 2, 14, 9, 30, 0).unwrap();

        storage.save_at(&record, at).unwrap();
        let loaded = storage.load().expect("record should load");

        assert!(loaded.same_content(&record));
        assert_eq!(loaded.last_saved, Some(at));
    }

    #[test]
    fn test_clear_then_load_is_none() {
        let mut storage = StoryStorage::new(MemoryStore::new());
        storage.save(&sample_record()).unwrap();
        storage.clear();
        assert!(storage.load().is_none());
    }

    #[test]
    fn test_corrupt_payload_loads_as_none() {
        let mut store = MemoryStore::new();
        store.set(DEFAULT_STORAGE_KEY, "{not json").unwrap();
        let storage = StoryStorage::new(store);
        assert!(storage.load().is_none());
    }

    #[test]
    fn test_quota_exceeded_is_an_error() {
        let mut storage = StoryStorage::new(MemoryStore::new().with_quota(64));
        let mut record = StoryRecord::new();
        record.set_story("beginning", "x".repeat(500));

        let err = storage.save(&record).unwrap_err();
        assert!(matches!(err, StorageError::QuotaExceeded { .. }));
        assert!(storage.load().is_none());
    }

    #[test]
    fn test_save_overwrites_whole_document() {
        let mut storage = StoryStorage::new(MemoryStore::new());
        storage.save(&sample_record()).unwrap();

        let mut smaller = StoryRecord::new();
        smaller.set_story("today", "only this");
        storage.save(&smaller).unwrap();

        let loaded = storage.load().unwrap();
        assert!(loaded.same_content(&smaller));
        assert!(loaded.story("beginning").is_none());
    }

    #[test]
    fn test_file_store_round_trip() {
        let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
        let store = FileStore::open(temp_dir.path().join("data")).unwrap();
        let mut storage = StoryStorage::new(store);

        storage.save(&sample_record()).unwrap();
        assert!(storage.store().path_for(DEFAULT_STORAGE_KEY).exists());
        assert!(storage.load().unwrap().same_content(&sample_record()));

        storage.clear();
        assert!(storage.load().is_none());
        // Clearing twice is harmless.
        storage.clear();
    }

    #[test]
    fn test_file_store_key_sanitizing() {
        let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
        let store = FileStore::open(temp_dir.path()).unwrap();
        let path = store.path_for("../escape me");
        assert_eq!(path.parent(), Some(temp_dir.path()));
        assert!(path.to_string_lossy().ends_with("___escape_me.json"));
    }

    #[test]
    fn test_import_rejects_garbage() {
        let err = import_backup("this is not a story").unwrap_err();
        assert!(matches!(err, ParseError::InvalidFormat(_)));
    }

    #[tokio::test]
    async fn test_backup_file_round_trip() {
        let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("backup.json");

        write_backup_file(&sample_record(), &path).await.unwrap();
        let imported = import_backup_file(&path).await.unwrap();
        assert!(imported.same_content(&sample_record()));
    }

    #[test]
    fn test_backup_file_name() {
        let at = Utc.with_ymd_and_hms(2025, 2, 14, 0, 0, 0).unwrap();
        assert_eq!(backup_file_name(at), "our-story-backup-2025-02-14.json");
    }
}
