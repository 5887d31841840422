//! Testing utilities for the timeline.
//!
//! This module provides tools for integration testing:
//! - `RecordingStore` that remembers every write
//! - `FailingStore` that rejects every write
//! - `RecordingHost` that keeps exported documents in memory
//! - `TestHarness` that drives a session on a manual clock

use std::path::{Path, PathBuf};

use chrono::{TimeZone, Utc};

use crate::catalog::SectionCatalog;
use crate::clock::{Clock, ManualClock};
use crate::config::Timings;
use crate::export::{Document, ExportError};
use crate::host::Host;
use crate::persist::{KeyValueStore, MemoryStore, StorageError, StoryStorage};
use crate::presentation::Stage;
use crate::record::StoryRecord;
use crate::session::TimelineSession;
use crate::visibility::RegionId;

/// A memory store that logs every write and removal.
#[derive(Debug, Default, Clone)]
pub struct RecordingStore {
    inner: MemoryStore,
    writes: Vec<String>,
    removals: usize,
}

impl RecordingStore {
    /// Create an empty recording store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds `value` under `key`.
    pub fn seeded(key: &str, value: &str) -> Self {
        let mut store = Self::new();
        // Seeding is not a write the session made.
        let _ = store.inner.set(key, value);
        store
    }

    /// Every value written, oldest first.
    pub fn writes(&self) -> &[String] {
        &self.writes
    }

    /// The last value written, parsed as a record.
    pub fn last_record(&self) -> Option<StoryRecord> {
        self.writes
            .last()
            .and_then(|w| serde_json::from_str(w).ok())
    }

    /// How many times a key was removed.
    pub fn removals(&self) -> usize {
        self.removals
    }
}

impl KeyValueStore for RecordingStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.inner.get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.writes.push(value.to_string());
        self.inner.set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.removals += 1;
        self.inner.remove(key)
    }
}

/// A store whose writes always fail, like a full browser quota.
#[derive(Debug, Default, Clone)]
pub struct FailingStore {
    attempts: usize,
}

impl FailingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rejected writes.
    pub fn attempts(&self) -> usize {
        self.attempts
    }
}

impl KeyValueStore for FailingStore {
    fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Ok(None)
    }

    fn set(&mut self, _key: &str, value: &str) -> Result<(), StorageError> {
        self.attempts += 1;
        Err(StorageError::QuotaExceeded {
            needed: value.len(),
            available: 0,
        })
    }

    fn remove(&mut self, _key: &str) -> Result<(), StorageError> {
        Ok(())
    }
}

/// A host that keeps documents instead of writing files.
#[derive(Debug, Default)]
pub struct RecordingHost {
    /// Documents downloaded so far.
    pub downloads: Vec<Document>,
    /// Documents printed so far.
    pub printed: Vec<Document>,
    /// Deliveries accepted before every later one fails.
    pub fail_after: Option<usize>,
    /// Paths taken back through `discard`.
    pub discarded: Vec<PathBuf>,
    deliveries: usize,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// A host whose deliveries always fail.
    pub fn failing() -> Self {
        Self::failing_after(0)
    }

    /// A host that accepts `accepted` deliveries, then fails.
    pub fn failing_after(accepted: usize) -> Self {
        Self {
            fail_after: Some(accepted),
            ..Self::default()
        }
    }

    fn deliver(&mut self, document: &Document) -> Result<PathBuf, ExportError> {
        if self.fail_after.is_some_and(|n| self.deliveries >= n) {
            return Err(ExportError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "delivery refused",
            )));
        }
        self.deliveries += 1;
        Ok(PathBuf::from(&document.filename))
    }
}

impl Host for RecordingHost {
    fn download(&mut self, document: &Document) -> Result<PathBuf, ExportError> {
        let path = self.deliver(document)?;
        self.downloads.push(document.clone());
        Ok(path)
    }

    fn print(&mut self, document: &Document) -> Result<PathBuf, ExportError> {
        let path = self.deliver(document)?;
        self.printed.push(document.clone());
        Ok(path)
    }

    fn discard(&mut self, path: &Path) -> Result<(), ExportError> {
        self.downloads.retain(|doc| Path::new(&doc.filename) != path);
        self.discarded.push(path.to_path_buf());
        Ok(())
    }
}

/// Test harness for driving a session through fake time.
pub struct TestHarness<S = RecordingStore> {
    /// The session under test.
    pub session: TimelineSession<S, ManualClock>,
    /// Shared with the session; advancing it moves session time.
    pub clock: ManualClock,
    /// Receives exports.
    pub host: RecordingHost,
}

impl TestHarness<RecordingStore> {
    /// Create a harness over the standard catalog and an empty store.
    pub fn new() -> Self {
        Self::with_store(RecordingStore::new())
    }

    /// Create a harness over a custom catalog.
    pub fn with_catalog(catalog: SectionCatalog) -> Self {
        Self::build(catalog, RecordingStore::new())
    }

    /// Number of writes the session has made.
    pub fn writes(&self) -> usize {
        self.session.storage().store().writes().len()
    }

    /// The last record written to the store.
    pub fn last_written(&self) -> Option<StoryRecord> {
        self.session.storage().store().last_record()
    }
}

impl Default for TestHarness<RecordingStore> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: KeyValueStore> TestHarness<S> {
    /// Create a harness over the standard catalog and `store`.
    pub fn with_store(store: S) -> Self {
        Self::build(SectionCatalog::standard().clone(), store)
    }

    fn build(catalog: SectionCatalog, store: S) -> Self {
        let base = Utc
            .with_ymd_and_hms(2025, 2, 14, 9, 0, 0)
            .single()
            .unwrap_or_default();
        let clock = ManualClock::new(base);
        let session = TimelineSession::new(
            catalog,
            StoryStorage::new(store),
            clock.clone(),
            Timings::default(),
        );
        Self {
            session,
            clock,
            host: RecordingHost::new(),
        }
    }

    /// Move time forward and fire whatever came due.
    pub fn advance_ms(&mut self, ms: u64) -> &mut Self {
        self.clock.advance_ms(ms);
        self.session.tick();
        self
    }

    /// Report a region as fully on screen.
    pub fn see(&mut self, region: RegionId) -> &mut Self {
        self.session.report_visibility(&region, 1.0);
        self
    }

    /// Scroll to the transition and wait for the recap to start.
    pub fn reach_recap(&mut self) -> &mut Self {
        self.see(RegionId::Transition);
        let delay = self.session.presentation().timings().recap_start;
        self.advance_ms(delay.as_millis() as u64);
        self
    }

    /// Skip the recap and scroll to the proposal.
    pub fn reach_proposal(&mut self) -> &mut Self {
        self.reach_recap();
        self.session.skip_recap();
        self.see(RegionId::Proposal);
        self
    }

    /// Continue through the celebration into the export stage.
    pub fn reach_export(&mut self) -> &mut Self {
        self.reach_proposal();
        self.session.continue_journey();
        self.session.dismiss_celebration();
        self
    }

    /// Current stage.
    pub fn stage(&self) -> Stage {
        self.session.stage()
    }

    /// Milliseconds since the harness started.
    pub fn now_ms(&self) -> u64 {
        self.clock.now().as_millis() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_harness_reaches_export() {
        let mut harness = TestHarness::new();
        harness.reach_export();
        assert_eq!(harness.stage(), Stage::Export);
    }

    #[test]
    fn test_recording_store_counts_writes() {
        let mut store = RecordingStore::new();
        store.set("k", "v1").unwrap();
        store.set("k", "v2").unwrap();
        store.remove("k").unwrap();
        assert_eq!(store.writes(), ["v1", "v2"]);
        assert_eq!(store.removals(), 1);
        assert!(store.get("k").unwrap().is_none());
    }

    #[test]
    fn test_failing_store_rejects() {
        let mut store = FailingStore::new();
        assert!(store.set("k", "v").is_err());
        assert_eq!(store.attempts(), 1);
    }
}
