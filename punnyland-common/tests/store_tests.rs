//! Dataset load/commit tests against real files

use punnyland_common::fsutil::temp_path_for;
use punnyland_common::store::{CommitOptions, CommitOutcome};
use punnyland_common::{CornLevel, Error, JokeRecord, JokeStore};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const DATASET: &str = r#"{
  "1": [
    "I used to be a banker, but I lost interest."
  ],
  "2": [
    "Why did the chicken cross the road? To get to the other side!"
  ],
  "3": [
    "What do you call a fake noodle? An impasta!"
  ],
  "4": [],
  "5": [
    "What do you call a cow with no legs? Ground beef!"
  ]
}
"#;

fn write_dataset(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("jokes.json");
    fs::write(&path, DATASET).unwrap();
    path
}

fn backups_in(dir: &Path) -> Vec<String> {
    fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|n| n.contains(".backup-"))
        .collect()
}

#[test]
fn test_load_write_round_trip_is_identity() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_dataset(temp_dir.path());

    let store = JokeStore::load(&path).unwrap();
    assert_eq!(store.len(), 4);
    // canonical formatting: writing back what was read changes nothing
    assert_eq!(store.to_json_string().unwrap(), DATASET);

    let outcome = store
        .commit(&path, &CommitOptions { operation: "clean", dry_run: false })
        .unwrap();
    assert_eq!(outcome, CommitOutcome::Unchanged);
    assert!(backups_in(temp_dir.path()).is_empty());
}

#[test]
fn test_commit_writes_backup_first() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_dataset(temp_dir.path());
    let store = JokeStore::load(&path).unwrap();

    let mut records = store.into_records();
    records.push(JokeRecord::new(
        "Why did the bicycle fall over? It was two-tired!",
        CornLevel::GroanZone,
    ));
    let updated = JokeStore::from_records(records);

    let outcome = updated
        .commit(&path, &CommitOptions { operation: "reclassify", dry_run: false })
        .unwrap();
    let CommitOutcome::Written { backup: Some(backup) } = outcome else {
        panic!("expected a written commit with a backup, got {:?}", outcome);
    };

    assert_eq!(fs::read_to_string(&backup).unwrap(), DATASET);
    let name = backup.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("jokes.backup-reclassify-"), "{}", name);
    assert!(name.ends_with(".json"));

    let reloaded = JokeStore::load(&path).unwrap();
    assert_eq!(reloaded, updated);
    assert_eq!(reloaded.texts(CornLevel::GroanZone).len(), 1);
    assert!(!temp_path_for(&path).exists());
}

#[test]
fn test_dry_run_touches_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_dataset(temp_dir.path());
    let empty = JokeStore::default();

    let outcome = empty
        .commit(&path, &CommitOptions { operation: "dedup", dry_run: true })
        .unwrap();
    assert_eq!(outcome, CommitOutcome::DryRun);
    assert_eq!(fs::read_to_string(&path).unwrap(), DATASET);
    assert!(backups_in(temp_dir.path()).is_empty());
}

#[test]
fn test_commit_to_new_file_has_no_backup() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_dataset(temp_dir.path());
    let store = JokeStore::load(&path).unwrap();
    let output = temp_dir.path().join("out").join("cleaned.json");

    let outcome = store
        .commit(&output, &CommitOptions { operation: "clean", dry_run: false })
        .unwrap();
    assert_eq!(outcome, CommitOutcome::Written { backup: None });
    assert_eq!(JokeStore::load(&output).unwrap(), store);
}

#[test]
fn test_failed_write_leaves_original_and_backup() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_dataset(temp_dir.path());
    // a directory squatting on the temp path makes the write fail
    let squatter = temp_path_for(&path);
    fs::create_dir(&squatter).unwrap();
    fs::write(squatter.join("keep"), "x").unwrap();

    let result = JokeStore::default()
        .commit(&path, &CommitOptions { operation: "clean", dry_run: false });
    assert!(matches!(result, Err(Error::Io(_))));

    assert_eq!(fs::read_to_string(&path).unwrap(), DATASET);
    let backups = backups_in(temp_dir.path());
    assert_eq!(backups.len(), 1);
    assert_eq!(
        fs::read_to_string(temp_dir.path().join(&backups[0])).unwrap(),
        DATASET
    );
}

#[test]
fn test_malformed_file_fails_without_changes() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("jokes.json");
    let bad = r#"{"1": ["ok joke here"], "2": [42], "3": [], "4": [], "5": []}"#;
    fs::write(&path, bad).unwrap();

    let err = JokeStore::load(&path).unwrap_err();
    assert!(matches!(err, Error::MalformedDataset(_)));
    assert_eq!(fs::read_to_string(&path).unwrap(), bad);
}

#[test]
fn test_missing_file_is_malformed_dataset() {
    let temp_dir = TempDir::new().unwrap();
    let err = JokeStore::load(&temp_dir.path().join("nope.json")).unwrap_err();
    assert!(matches!(err, Error::MalformedDataset(ref m) if m.contains("not found")));
}
