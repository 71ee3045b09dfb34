//! Tests for the storage contract across backends
//!
//! These tests verify:
//! - Opening every backend through StorageConfig
//! - Delta semantics (entries added/overwritten, never dropped)
//! - JSON and memory backends
//! - The fold helpers
//! - Snapshot capability reporting

use std::fs;
use std::path::PathBuf;

use docstore::config::{AccessMode, Backend, StorageConfig};
use docstore::storage::{fold, fold_into, DatabaseState, JsonStorage, MemoryStorage, Storage, Table};
use docstore::{open_storage, DocStoreError};
use serde_json::{json, Value};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_dir() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().to_path_buf();
    (temp_dir, path)
}

fn table(value: Value) -> Table {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {}", other),
    }
}

fn state(value: Value) -> DatabaseState {
    serde_json::from_value(value).unwrap()
}

fn all_backends(dir: &PathBuf) -> Vec<StorageConfig> {
    vec![
        StorageConfig::builder().path(dir.join("frame.db")).frame("t1").build(),
        StorageConfig::builder().path(dir.join("lines.db")).line(Vec::<String>::new()).build(),
        StorageConfig::builder().path(dir.join("full.json")).backend(Backend::Json).build(),
        StorageConfig::builder().backend(Backend::Memory).build(),
    ]
}

// =============================================================================
// Contract Tests
// =============================================================================

#[test]
fn test_every_backend_starts_absent() {
    let (_temp, dir) = setup_temp_dir();

    for config in all_backends(&dir) {
        let mut storage = open_storage(&config).unwrap();
        assert!(storage.read().unwrap().is_none(), "{:?}", config.backend);
    }
}

#[test]
fn test_every_backend_applies_deltas() {
    let (_temp, dir) = setup_temp_dir();

    for config in all_backends(&dir) {
        let mut storage = config.open().unwrap();

        storage.write(&state(json!({"t1": {"1": {"a": 1}, "2": {"a": 2}}}))).unwrap();
        storage.write(&state(json!({"t1": {"1": {"a": 9}}}))).unwrap();

        let expected = state(json!({"t1": {"1": {"a": 9}, "2": {"a": 2}}}));
        assert_eq!(storage.read().unwrap(), Some(expected), "{:?}", config.backend);

        storage.close().unwrap();
        storage.close().unwrap();
    }
}

#[test]
fn test_every_backend_survives_reopen() {
    let (_temp, dir) = setup_temp_dir();

    for config in all_backends(&dir) {
        if config.backend == Backend::Memory {
            continue;
        }

        {
            let mut storage = config.open().unwrap();
            storage.write(&state(json!({"t1": {"1": "one"}}))).unwrap();
        }

        let mut storage = config.open().unwrap();
        let result = storage.read().unwrap().unwrap();
        assert_eq!(result["t1"]["1"], json!("one"), "{:?}", config.backend);
    }
}

#[test]
fn test_snapshot_support() {
    let (_temp, dir) = setup_temp_dir();

    let supported: Vec<bool> = all_backends(&dir)
        .iter()
        .map(|config| config.open().unwrap().supports_snapshot())
        .collect();

    assert_eq!(supported, vec![true, true, true, false]);
}

// =============================================================================
// JSON Backend Tests
// =============================================================================

#[test]
fn test_json_file_holds_whole_state() {
    let (_temp, dir) = setup_temp_dir();
    let path = dir.join("full.json");
    let config = StorageConfig::builder().path(&path).backend(Backend::Json).build();
    let mut storage = JsonStorage::open(&config).unwrap();

    storage.write(&state(json!({"a": {"1": 1}}))).unwrap();
    storage.write(&state(json!({"b": {"2": 2}}))).unwrap();

    let on_disk: Value = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
    assert_eq!(on_disk, json!({"a": {"1": 1}, "b": {"2": 2}}));
    assert_eq!(JsonStorage::load(&path).unwrap(), storage.read().unwrap());
}

#[test]
fn test_json_indent_pretty_prints() {
    let (_temp, dir) = setup_temp_dir();
    let path = dir.join("pretty.json");
    let config = StorageConfig::builder()
        .path(&path)
        .backend(Backend::Json)
        .json_indent(4)
        .build();
    let mut storage = JsonStorage::open(&config).unwrap();

    storage.write(&state(json!({"a": {"1": 1}}))).unwrap();

    let content = fs::read_to_string(&path).unwrap();
    assert!(content.contains("\n    \"a\""), "{}", content);
    assert!(storage.read().unwrap().is_some());
}

#[test]
fn test_json_read_only_write_is_mode_error() {
    let (_temp, dir) = setup_temp_dir();
    let path = dir.join("ro.json");
    fs::write(&path, "{}").unwrap();

    let config = StorageConfig::builder()
        .path(&path)
        .backend(Backend::Json)
        .access_mode(AccessMode::ReadOnly)
        .build();
    let mut storage = config.open().unwrap();

    assert_eq!(storage.read().unwrap(), Some(DatabaseState::new()));
    assert!(matches!(
        storage.write(&state(json!({"a": {}}))),
        Err(DocStoreError::Mode { .. })
    ));
}

#[test]
fn test_json_write_replaces_file_through_staging() {
    let (_temp, dir) = setup_temp_dir();
    let path = dir.join("full.json");
    let config = StorageConfig::builder().path(&path).backend(Backend::Json).build();
    let mut storage = JsonStorage::open(&config).unwrap();

    for round in 0..5 {
        storage.write(&state(json!({"a": {"1": round}}))).unwrap();
    }
    storage.write(&state(json!({"b": {"2": 2}}))).unwrap();

    let mut staging = path.as_os_str().to_owned();
    staging.push(".compact");
    assert!(!PathBuf::from(staging).exists());

    // The handle follows the replaced file
    let expected = state(json!({"a": {"1": 4}, "b": {"2": 2}}));
    assert_eq!(storage.read().unwrap(), Some(expected.clone()));
    assert_eq!(JsonStorage::load(&path).unwrap(), Some(expected));
}

#[test]
fn test_json_write_on_closed_handle_keeps_file() {
    let (_temp, dir) = setup_temp_dir();
    let path = dir.join("full.json");
    let config = StorageConfig::builder().path(&path).backend(Backend::Json).build();
    let mut storage = JsonStorage::open(&config).unwrap();

    storage.write(&state(json!({"a": {"1": 1}}))).unwrap();
    let before = fs::read(&path).unwrap();
    storage.close().unwrap();

    assert!(matches!(
        storage.write(&state(json!({"a": {"1": 2}}))),
        Err(DocStoreError::Closed)
    ));
    assert_eq!(fs::read(&path).unwrap(), before);
}

#[test]
fn test_json_corrupt_file_is_format_error() {
    let (_temp, dir) = setup_temp_dir();
    let path = dir.join("bad.json");
    fs::write(&path, "{\"a\": {").unwrap();

    let config = StorageConfig::builder().path(&path).backend(Backend::Json).build();
    let mut storage = config.open().unwrap();

    assert!(matches!(storage.read(), Err(DocStoreError::Format(_))));
}

// =============================================================================
// Memory Backend Tests
// =============================================================================

#[test]
fn test_memory_absent_then_present() {
    let mut storage = MemoryStorage::new();

    assert!(storage.read().unwrap().is_none());

    storage.write(&DatabaseState::new()).unwrap();
    assert_eq!(storage.read().unwrap(), Some(DatabaseState::new()));
}

#[test]
fn test_memory_snapshot_unsupported() {
    let mut storage = MemoryStorage::new();

    let result = storage.snapshot(&DatabaseState::new());

    assert!(matches!(result, Err(DocStoreError::Unsupported(_))));
}

// =============================================================================
// Fold Tests
// =============================================================================

#[test]
fn test_fold_later_overwrites_earlier() {
    let records = vec![
        ("t".to_string(), table(json!({"1": "test1", "2": "test2"}))),
        ("t".to_string(), table(json!({"1": "test3", "2": "test4"}))),
        ("t".to_string(), table(json!({"1": "test5", "2": "test6", "3": "test7"}))),
    ];

    let result = fold(records);

    assert_eq!(result, state(json!({"t": {"1": "test5", "2": "test6", "3": "test7"}})));
}

#[test]
fn test_fold_order_matters() {
    let first = table(json!({"1": "test1", "2": "test2"}));
    let second = table(json!({"1": "test3", "2": "test4"}));
    let third = table(json!({"1": "test5", "2": "test6", "3": "test7"}));

    let mut result = DatabaseState::new();
    fold_into(&mut result, "t", third);
    fold_into(&mut result, "t", second);
    fold_into(&mut result, "t", first);

    assert_eq!(result, state(json!({"t": {"1": "test1", "2": "test2", "3": "test7"}})));
}

// =============================================================================
// Config Tests
// =============================================================================

#[test]
fn test_access_mode_parsing() {
    assert_eq!("r".parse::<AccessMode>().unwrap(), AccessMode::ReadOnly);
    assert_eq!("r+".parse::<AccessMode>().unwrap(), AccessMode::ReadWrite);
    assert!(matches!("x".parse::<AccessMode>(), Err(DocStoreError::Config(_))));
    assert_eq!(AccessMode::ReadWrite.to_string(), "r+");
}

#[test]
fn test_config_defaults() {
    let config = StorageConfig::default();

    assert_eq!(config.access_mode, AccessMode::ReadWrite);
    assert!(!config.create_dirs);
    assert!(!config.archive_on_compact);
    assert_eq!(config.json_indent, None);
    assert_eq!(config.backend, Backend::Line { tables: Vec::new() });
}
