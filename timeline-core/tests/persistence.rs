//! Persistence tests: autosave debounce, immediate photo saves, failures,
//! reload and backups.

use tempfile::TempDir;
use timeline_core::persist::DEFAULT_STORAGE_KEY;
use timeline_core::testing::{FailingStore, RecordingStore, TestHarness};
use timeline_core::{
    FileStore, ManualClock, Notice, PhotoRef, SectionCatalog, StoryRecord, StoryStorage,
    TimelineSession, Timings,
};

fn photo() -> PhotoRef {
    PhotoRef::from_data_url("data:image/jpeg;base64,/9j/4AAQSkZJRg==")
}

// =============================================================================
// Autosave
// =============================================================================

#[test]
fn test_two_edits_in_window_write_once_with_final_text() {
    let mut harness = TestHarness::new();
    harness.session.edit_story("beginning", "It was").unwrap();
    harness.advance_ms(600);
    harness
        .session
        .edit_story("beginning", "It was raining")
        .unwrap();
    harness.advance_ms(999);
    assert_eq!(harness.writes(), 0);

    harness.advance_ms(1);
    assert_eq!(harness.writes(), 1);
    let written = harness.last_written().unwrap();
    assert_eq!(written.story("beginning"), Some("It was raining"));
    assert!(written.last_saved.is_some());

    harness.advance_ms(10_000);
    assert_eq!(harness.writes(), 1);
}

#[test]
fn test_photo_saves_immediately_with_whole_record() {
    let mut harness = TestHarness::new();
    harness.session.edit_story("today", "typing...").unwrap();
    harness.session.set_photo("today", photo()).unwrap();

    assert_eq!(harness.writes(), 1);
    let written = harness.last_written().unwrap();
    assert_eq!(written.photo("today"), Some(&photo()));
    // The whole record goes out, including text still waiting on the debounce.
    assert_eq!(written.story("today"), Some("typing..."));
}

#[test]
fn test_remove_photo_persists_null() {
    let mut harness = TestHarness::new();
    harness.session.set_photo("first-met", photo()).unwrap();
    harness.session.remove_photo("first-met").unwrap();

    assert_eq!(harness.writes(), 2);
    let written = harness.last_written().unwrap();
    assert!(written.photo("first-met").is_none());
    assert!(written.photos.contains_key("first-met"));
}

#[test]
fn test_every_save_gets_a_fresh_timestamp() {
    let mut harness = TestHarness::new();
    harness.session.save_now();
    let first = harness.last_written().unwrap().last_saved;
    harness.advance_ms(5000);
    harness.session.save_now();
    let second = harness.last_written().unwrap().last_saved;
    assert!(second > first);
    assert_eq!(harness.session.record().last_saved, second);
}

#[test]
fn test_manual_save_folds_pending_autosave() {
    let mut harness = TestHarness::new();
    harness.session.edit_story("today", "now").unwrap();
    assert!(harness.session.save_now());
    assert!(harness.session.take_notices().contains(&Notice::Saved));

    harness.advance_ms(2000);
    assert_eq!(harness.writes(), 1);
}

#[test]
fn test_flush_writes_pending_edit() {
    let mut harness = TestHarness::new();
    harness.session.edit_story("today", "before quitting").unwrap();
    harness.session.flush();
    assert_eq!(harness.writes(), 1);
    harness.session.teardown();
    assert_eq!(
        harness.last_written().unwrap().story("today"),
        Some("before quitting")
    );
}

// =============================================================================
// Failures
// =============================================================================

#[test]
fn test_failed_save_raises_blocking_notice_without_retry() {
    let mut harness = TestHarness::with_store(FailingStore::new());
    harness.session.edit_story("today", "too big").unwrap();
    harness.advance_ms(1000);

    let notices = harness.session.take_notices();
    assert_eq!(notices, vec![Notice::StorageFull]);
    assert!(notices[0].is_blocking());

    harness.advance_ms(10_000);
    assert_eq!(harness.session.storage().store().attempts(), 1);
    // The session keeps working.
    assert_eq!(harness.session.record().story("today"), Some("too big"));
}

#[test]
fn test_failed_manual_save_has_no_success_notice() {
    let mut harness = TestHarness::with_store(FailingStore::new());
    assert!(!harness.session.save_now());
    assert_eq!(harness.session.take_notices(), vec![Notice::StorageFull]);
}

// =============================================================================
// Reload
// =============================================================================

#[test]
fn test_session_loads_previous_record() {
    let mut record = StoryRecord::new();
    record.set_story("first-laugh", "The umbrella.");
    record.set_story("retired-section", "gone");
    let stored = serde_json::to_string(&record).unwrap();

    let harness = TestHarness::with_store(RecordingStore::seeded(DEFAULT_STORAGE_KEY, &stored));
    let loaded = harness.session.record();
    assert_eq!(loaded.story("first-laugh"), Some("The umbrella."));
    assert!(loaded.stories.get("retired-section").is_none());
}

#[test]
fn test_corrupt_store_starts_empty() {
    let harness = TestHarness::with_store(RecordingStore::seeded(DEFAULT_STORAGE_KEY, "{{{"));
    assert!(harness.session.record().is_empty());
}

#[test]
fn test_file_store_survives_restart_of_session() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let clock = ManualClock::new(chrono::Utc::now());

    {
        let store = FileStore::open(temp_dir.path()).unwrap();
        let mut session = TimelineSession::new(
            SectionCatalog::standard().clone(),
            StoryStorage::new(store),
            clock.clone(),
            Timings::default(),
        );
        session.edit_story("today", "persisted").unwrap();
        session.flush();
        session.teardown();
    }

    let store = FileStore::open(temp_dir.path()).unwrap();
    let session = TimelineSession::new(
        SectionCatalog::standard().clone(),
        StoryStorage::new(store),
        clock,
        Timings::default(),
    );
    assert_eq!(session.record().story("today"), Some("persisted"));
}

// =============================================================================
// Backups
// =============================================================================

#[test]
fn test_backup_then_import() {
    let mut harness = TestHarness::new();
    harness.session.edit_story("beginning", "Once.").unwrap();
    harness.session.set_photo("today", photo()).unwrap();
    let backup = harness.session.backup().unwrap();

    let mut other = TestHarness::new();
    other.session.import(&backup).unwrap();
    assert!(other
        .session
        .record()
        .same_content(harness.session.record()));
    assert!(other.session.take_notices().contains(&Notice::Imported));
    assert_eq!(other.writes(), 1);
}

#[test]
fn test_corrupt_import_is_rejected_with_message() {
    let mut harness = TestHarness::new();
    harness.session.edit_story("today", "untouched").unwrap();

    assert!(harness.session.import("definitely not json").is_err());
    let notices = harness.session.take_notices();
    assert!(matches!(notices.as_slice(), [Notice::ImportFailed(_)]));
    assert_eq!(harness.session.record().story("today"), Some("untouched"));
}

#[tokio::test]
async fn test_backup_file_round_trip_through_session() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let mut harness = TestHarness::new();
    harness.session.edit_story("first-memory", "Snow.").unwrap();

    let path = temp_dir.path().join("backup.json");
    timeline_core::persist::write_backup_file(harness.session.record(), &path)
        .await
        .unwrap();
    let content = tokio::fs::read_to_string(&path).await.unwrap();

    let mut other = TestHarness::new();
    other.session.import(&content).unwrap();
    assert_eq!(other.session.record().story("first-memory"), Some("Snow."));
}
