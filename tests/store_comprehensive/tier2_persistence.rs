//! Tier 2: Persistence
//!
//! serialize/hydrate round trips, invalid blobs falling back to defaults,
//! and checkpoint/restart through the runtime with real backends.

use crate::test_utils::*;
use keystate::{
    Backend, DataLossReason, FilePersistence, MemoryPersistence, Persistence, StateKey,
    StoreConfig, StoreRuntime,
};
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;

#[test]
fn test_round_trip_restores_items() {
    let (mut tree, _) = teams_tree();
    tree.dispatch(&receive("global", &["a", "b"])).unwrap();
    tree.dispatch(&receive("2916284", &["c"])).unwrap();
    tree.dispatch(&request("2916284")).unwrap();

    let blob = tree.serialize().unwrap();

    let (mut restored, teams) = teams_tree();
    let report = restored.hydrate(&blob);
    assert!(report.is_clean());
    assert_eq!(report.restored, vec!["teams.items"]);
    assert_eq!(report.reset, vec!["teams.is_requesting"]);

    assert_eq!(restored.to_persisted_json().unwrap(), tree.to_persisted_json().unwrap());
    assert_eq!(
        teams.items(&restored, &StateKey::global()).unwrap(),
        &strings(&["a", "b"])
    );
    // request flags are volatile
    assert!(!teams.is_requesting(&restored, &key("2916284")).unwrap());
}

#[test]
fn test_serialized_shape_is_nested_by_path() {
    let (mut tree, _) = teams_tree();
    tree.dispatch(&receive("global", &["a"])).unwrap();

    let blob: serde_json::Value = serde_json::from_slice(&tree.serialize().unwrap()).unwrap();
    assert_eq!(blob, json!({ "teams": { "items": { "global": ["a"] } } }));
}

#[test]
fn test_invalid_blob_falls_back_to_default() {
    init_tracing();
    let (mut tree, teams) = teams_tree();
    tree.dispatch(&receive("global", &["stale"])).unwrap();

    let report = tree.hydrate(b"not valid json shape");

    assert!(teams.items(&tree, &StateKey::global()).unwrap().is_empty());
    assert_eq!(report.data_loss.len(), 1);
    assert!(report.data_loss[0].slice.is_none());
    assert!(matches!(
        report.data_loss[0].reason,
        DataLossReason::Unparseable(_)
    ));
    assert_eq!(tree.data_loss().len(), 1);
}

#[test]
fn test_schema_violation_resets_only_that_slice() {
    let mut tree = keystate::StateTree::new();
    let teams = register_teams(&mut tree);
    let pings = tree
        .register_value(
            "pings",
            keystate::ValueSlice::new(
                0u64,
                keystate::RuleTable::new().on(Kind::Ping, |n: &u64, _| n + 1),
            ),
        )
        .unwrap();

    let report = tree.hydrate(br#"{"pings": 7, "teams": {"items": {"global": [1, 2]}}}"#);

    assert_eq!(*tree.value(&pings).unwrap(), 7);
    assert!(teams.items(&tree, &StateKey::global()).unwrap().is_empty());
    assert_eq!(report.data_loss.len(), 1);
    assert_eq!(report.data_loss[0].slice.as_deref(), Some("teams.items"));
    assert!(matches!(report.data_loss[0].reason, DataLossReason::Invalid(_)));
}

#[test]
fn test_missing_slice_in_blob_resets_to_default() {
    let (mut tree, teams) = teams_tree();
    tree.dispatch(&receive("global", &["a"])).unwrap();

    let report = tree.hydrate(b"{}");
    assert!(report.is_clean());
    assert!(teams.items(&tree, &StateKey::global()).unwrap().is_empty());
}

#[test]
fn test_take_data_loss_drains() {
    let (mut tree, _) = teams_tree();
    tree.hydrate(b"[]");
    tree.hydrate(b"42");

    assert_eq!(tree.take_data_loss().len(), 2);
    assert!(tree.data_loss().is_empty());
}

#[test]
fn test_file_backend_restart() {
    let temp_dir = TempDir::new().unwrap();
    let config = StoreConfig::new()
        .namespace("reader")
        .backend(Backend::File)
        .dir(temp_dir.path().join("state"));

    // Phase 1: write and tear down
    {
        let (tree, _) = teams_tree();
        let runtime = StoreRuntime::init(tree, config.clone()).unwrap();
        runtime.dispatch(&request("global")).unwrap();
        runtime.dispatch(&receive("global", &["a", "b"])).unwrap();
        runtime.dispatch(&request("global")).unwrap();
        runtime.teardown().unwrap();
    }

    assert!(temp_dir.path().join("state").join("reader.state").exists());

    // Phase 2: restart and verify
    {
        let (tree, teams) = teams_tree();
        let runtime = StoreRuntime::init(tree, config).unwrap();
        assert!(runtime.data_loss().is_empty());
        runtime.read(|tree| {
            assert_eq!(
                teams.items(tree, &StateKey::global()).unwrap(),
                &strings(&["a", "b"])
            );
            assert!(!teams.is_requesting(tree, &StateKey::global()).unwrap());
        });
    }
}

#[test]
fn test_corrupt_file_starts_from_defaults() {
    init_tracing();
    let temp_dir = TempDir::new().unwrap();
    let backend = FilePersistence::open(temp_dir.path()).unwrap();
    std::fs::write(backend.path_for("reader"), b"KST1 definitely not a valid frame").unwrap();

    let (tree, teams) = teams_tree();
    let runtime = StoreRuntime::init(
        tree,
        StoreConfig::new()
            .namespace("reader")
            .backend(Backend::File)
            .dir(temp_dir.path()),
    )
    .unwrap();

    let loss = runtime.data_loss();
    assert_eq!(loss.len(), 1);
    assert!(matches!(loss[0].reason, DataLossReason::Corrupt(_)));
    runtime.read(|tree| {
        assert!(teams.items(tree, &StateKey::global()).unwrap().is_empty());
    });

    // the next checkpoint replaces the corrupt file
    runtime.dispatch(&receive("global", &["fresh"])).unwrap();
    assert!(runtime.checkpoint().unwrap());
    assert!(backend.load("reader").unwrap().is_some());
}

#[test]
fn test_checkpoint_skipped_when_unchanged() {
    let backend = Arc::new(MemoryPersistence::new());
    let (tree, _) = teams_tree();
    let runtime =
        StoreRuntime::with_persistence(tree, StoreConfig::new(), backend.clone()).unwrap();

    runtime.dispatch(&receive("global", &["a"])).unwrap();
    assert!(runtime.checkpoint().unwrap());
    assert!(!runtime.checkpoint().unwrap());

    runtime.dispatch(&Ev::new(Kind::Unhandled)).unwrap();
    assert!(!runtime.checkpoint().unwrap());
}

#[test]
fn test_config_from_toml_drives_runtime() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path().join("toml-state");
    let text = format!(
        "namespace = \"calypso\"\n\n[persistence]\nbackend = \"file\"\ndir = {:?}\ncheckpoint_every = 2\n",
        dir.to_string_lossy()
    );
    let config = StoreConfig::from_toml_str(&text).unwrap();

    let (tree, _) = teams_tree();
    let runtime = StoreRuntime::init(tree, config).unwrap();
    runtime.dispatch(&receive("global", &["a"])).unwrap();
    assert!(!dir.join("calypso.state").exists());
    runtime.dispatch(&receive("global", &["b"])).unwrap();
    assert!(dir.join("calypso.state").exists());
}
