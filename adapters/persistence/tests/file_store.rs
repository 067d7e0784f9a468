use std::fs;

use wave_escape_core::{PersistedValues, ProgressStore, Statistics, DIFFICULTY_KEY};
use wave_escape_persistence::{
    default_settings, default_statistics, FileStore, StoreError, SETTINGS_FILE, STATS_FILE,
};

#[test]
fn missing_settings_store_is_created_with_defaults() {
    let dir = tempfile::tempdir().expect("temp dir");
    let mut store = FileStore::settings(dir.path());
    assert!(!store.path().exists());

    let values = store.read().expect("missing store is recovered");

    assert_eq!(values, default_settings());
    let written = fs::read_to_string(dir.path().join(SETTINGS_FILE)).expect("store persisted");
    assert_eq!(written.trim(), "difficulty = 0");
}

#[test]
fn missing_statistics_store_defaults_every_counter_to_zero() {
    let dir = tempfile::tempdir().expect("temp dir");
    let mut store = FileStore::statistics(dir.path());

    let values = store.read().expect("missing store is recovered");

    assert_eq!(values, default_statistics());
    assert_eq!(Statistics::from_values(&values), Statistics::default());
    assert!(dir.path().join(STATS_FILE).exists());
}

#[test]
fn written_values_read_back_identically() {
    let dir = tempfile::tempdir().expect("temp dir");
    let stats = Statistics {
        levels_completed: 7,
        total_time_seconds: 431,
        wins: 7,
        losses: 12,
    };

    let mut store = FileStore::statistics(dir.path());
    store.write(&stats.to_values()).expect("write succeeds");

    let mut reopened = FileStore::statistics(dir.path());
    let values = reopened.read().expect("read succeeds");
    assert_eq!(Statistics::from_values(&values), stats);
    assert_eq!(values, stats.to_values());
}

#[test]
fn settings_round_trip_through_disk() {
    let dir = tempfile::tempdir().expect("temp dir");
    let mut values = PersistedValues::new();
    let _ = values.insert(DIFFICULTY_KEY.to_owned(), 3);

    FileStore::settings(dir.path())
        .write(&values)
        .expect("write succeeds");

    let read_back = FileStore::settings(dir.path()).read().expect("read succeeds");
    assert_eq!(read_back, values);
}

#[test]
fn corrupt_store_is_reported() {
    let dir = tempfile::tempdir().expect("temp dir");
    fs::write(dir.path().join(STATS_FILE), "wins = \"many\"\n").expect("seed file");

    let error = FileStore::statistics(dir.path())
        .read()
        .expect_err("non-integer values must be rejected");
    assert!(matches!(error, StoreError::Parse { .. }));
}

#[test]
fn negative_values_are_rejected() {
    let dir = tempfile::tempdir().expect("temp dir");
    fs::write(dir.path().join(SETTINGS_FILE), "difficulty = -1\n").expect("seed file");

    let error = FileStore::settings(dir.path())
        .read()
        .expect_err("negative values must be rejected");
    assert!(matches!(error, StoreError::Parse { .. }));
}

#[test]
fn unreadable_store_location_is_an_io_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    fs::create_dir(dir.path().join(SETTINGS_FILE)).expect("directory in place of file");

    let error = FileStore::settings(dir.path())
        .read()
        .expect_err("a directory cannot be read as a store");
    assert!(matches!(error, StoreError::Io { .. }));
}
