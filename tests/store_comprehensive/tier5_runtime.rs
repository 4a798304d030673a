//! Tier 5: Runtime
//!
//! A cloned runtime shared across threads: readers never observe a
//! half-applied dispatch, and automatic checkpoints keep up with writers.

use crate::test_utils::*;
use keystate::{
    MemoryPersistence, Persistence, RuleTable, Schema, StateTree, StoreConfig, StoreRuntime,
    ValueSlice,
};
use std::sync::Arc;
use std::thread;

fn twin_counters() -> (StateTree<Ev>, keystate::ValueHandle<u64>, keystate::ValueHandle<u64>) {
    let mut tree = StateTree::new();
    let left = tree
        .register_value(
            "left.count",
            ValueSlice::new(0u64, RuleTable::new().on(Kind::Ping, |n: &u64, _| n + 1)),
        )
        .unwrap();
    let right = tree
        .register_value(
            "right.count",
            ValueSlice::new(0u64, RuleTable::new().on(Kind::Ping, |n: &u64, _| n + 1))
                .with_schema(Schema::Integer),
        )
        .unwrap();
    (tree, left, right)
}

#[test]
fn test_readers_never_see_partial_dispatch() {
    let (tree, left, right) = twin_counters();
    let runtime = StoreRuntime::init(tree, StoreConfig::new()).unwrap();

    let writer = {
        let runtime = runtime.clone();
        thread::spawn(move || {
            for _ in 0..500 {
                runtime.dispatch(&ping()).unwrap();
            }
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let runtime = runtime.clone();
            let (left, right) = (left.clone(), right.clone());
            thread::spawn(move || {
                for _ in 0..500 {
                    let (l, r) = runtime.read(|tree| {
                        (*tree.value(&left).unwrap(), *tree.value(&right).unwrap())
                    });
                    assert_eq!(l, r);
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for reader in readers {
        reader.join().unwrap();
    }

    assert_eq!(runtime.read(|tree| *tree.value(&left).unwrap()), 500);
    assert_eq!(runtime.version(), 500);
}

#[test]
fn test_concurrent_writers_all_apply() {
    let (tree, left, _) = twin_counters();
    let runtime = StoreRuntime::init(tree, StoreConfig::new()).unwrap();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let runtime = runtime.clone();
            thread::spawn(move || {
                for _ in 0..100 {
                    runtime.dispatch(&ping()).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(runtime.read(|tree| *tree.value(&left).unwrap()), 400);
}

#[test]
fn test_automatic_checkpoints() {
    init_tracing();
    let backend = Arc::new(MemoryPersistence::new());
    let (tree, _, _) = twin_counters();
    let runtime = StoreRuntime::with_persistence(
        tree,
        StoreConfig::new().namespace("counters").checkpoint_every(10),
        backend.clone(),
    )
    .unwrap();

    for _ in 0..9 {
        runtime.dispatch(&ping()).unwrap();
    }
    assert!(backend.load("counters").unwrap().is_none());

    runtime.dispatch(&ping()).unwrap();
    let blob = backend.load("counters").unwrap().unwrap();
    let saved: serde_json::Value = serde_json::from_slice(&blob).unwrap();
    assert_eq!(
        saved,
        serde_json::json!({ "left": { "count": 10 }, "right": { "count": 10 } })
    );
}

#[test]
fn test_teardown_without_final_checkpoint() {
    let backend = Arc::new(MemoryPersistence::new());
    let (tree, _, _) = twin_counters();
    let runtime = StoreRuntime::with_persistence(
        tree,
        StoreConfig::new().checkpoint_on_teardown(false),
        backend.clone(),
    )
    .unwrap();

    runtime.dispatch(&ping()).unwrap();
    runtime.teardown().unwrap();
    assert!(backend.load(keystate::DEFAULT_NAMESPACE).unwrap().is_none());
}

#[test]
fn test_runtime_hydrate_replaces_state() {
    let (tree, left, right) = twin_counters();
    let runtime = StoreRuntime::init(tree, StoreConfig::new()).unwrap();
    runtime.dispatch(&ping()).unwrap();

    let report = runtime.hydrate(br#"{"left": {"count": 41}, "right": {"count": "x"}}"#);

    assert_eq!(report.data_loss.len(), 1);
    assert_eq!(runtime.read(|tree| *tree.value(&left).unwrap()), 41);
    assert_eq!(runtime.read(|tree| *tree.value(&right).unwrap()), 0);
    assert_eq!(runtime.data_loss().len(), 1);
}
