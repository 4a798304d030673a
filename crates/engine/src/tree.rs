//! State tree
//!
//! The tree combines independent slices under dotted paths and drives them
//! from one action stream.
//!
//! # Dispatch
//!
//! Every slice sees every action, in order, exactly once. Dispatch is
//! two-phase: all slices stage their next value first; if any rule fails,
//! every staged value is discarded and the error is returned, otherwise all
//! slices commit together. Slices that update from the same action (a value
//! and its request flag) therefore never disagree, even transiently.
//!
//! # Persistence
//!
//! `serialize` emits the persisted slices as one nested JSON object.
//! `hydrate` replaces the tree wholesale from such a blob; any slice whose
//! persisted value is unusable falls back to its default and a [`DataLoss`]
//! is recorded. Hydrate never fails.

use crate::path;
use crate::slice::{KeyedSlice, Slice, SliceValue, ValueSlice};
use keystate_core::{Action, DataLoss, DataLossReason, StateKey, StoreError, StoreResult};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_TREE_ID: AtomicU64 = AtomicU64::new(1);

/// Typed handle to a [`ValueSlice`] registered in a tree.
pub struct ValueHandle<V> {
    tree: u64,
    path: String,
    _value: PhantomData<fn() -> V>,
}

/// Typed handle to a [`KeyedSlice`] registered in a tree.
pub struct KeyedHandle<V> {
    tree: u64,
    path: String,
    _value: PhantomData<fn() -> V>,
}

macro_rules! handle_impls {
    ($handle:ident) => {
        impl<V> $handle<V> {
            fn new(tree: u64, path: &str) -> Self {
                Self {
                    tree,
                    path: path.to_string(),
                    _value: PhantomData,
                }
            }

            /// Path the slice is registered under.
            pub fn path(&self) -> &str {
                &self.path
            }
        }

        impl<V> Clone for $handle<V> {
            fn clone(&self) -> Self {
                Self::new(self.tree, &self.path)
            }
        }

        impl<V> fmt::Debug for $handle<V> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_struct(stringify!($handle))
                    .field("path", &self.path)
                    .finish()
            }
        }
    };
}

handle_impls!(ValueHandle);
handle_impls!(KeyedHandle);

/// Result of a successful dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Paths of the slices whose value changed
    pub changed: Vec<String>,
    /// Tree version after the dispatch
    pub version: u64,
}

impl DispatchOutcome {
    /// True if no slice changed.
    pub fn is_noop(&self) -> bool {
        self.changed.is_empty()
    }
}

/// What a hydrate did to each slice.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HydrateReport {
    /// Slices restored from the blob
    pub restored: Vec<String>,
    /// Slices reset to their default because the blob had nothing for them
    /// or they are volatile
    pub reset: Vec<String>,
    /// Persisted state that was discarded
    pub data_loss: Vec<DataLoss>,
}

impl HydrateReport {
    /// True if nothing was discarded.
    pub fn is_clean(&self) -> bool {
        self.data_loss.is_empty()
    }
}

/// Tree of slices driven by one action stream.
pub struct StateTree<A: Action + 'static> {
    id: u64,
    slices: BTreeMap<String, Box<dyn Slice<A>>>,
    version: u64,
    data_loss: Vec<DataLoss>,
}

impl<A: Action + 'static> StateTree<A> {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self {
            id: NEXT_TREE_ID.fetch_add(1, Ordering::Relaxed),
            slices: BTreeMap::new(),
            version: 0,
            data_loss: Vec::new(),
        }
    }

    // ========================================================================
    // Registration
    // ========================================================================

    /// Register a single-value slice at `path`.
    pub fn register_value<V: SliceValue>(
        &mut self,
        path: &str,
        slice: ValueSlice<V, A>,
    ) -> StoreResult<ValueHandle<V>> {
        self.insert(path, Box::new(slice))?;
        Ok(ValueHandle::new(self.id, path))
    }

    /// Register a keyed slice at `path`.
    pub fn register_keyed<V: SliceValue>(
        &mut self,
        path: &str,
        slice: KeyedSlice<V, A>,
    ) -> StoreResult<KeyedHandle<V>> {
        self.insert(path, Box::new(slice))?;
        Ok(KeyedHandle::new(self.id, path))
    }

    fn insert(&mut self, slice_path: &str, slice: Box<dyn Slice<A>>) -> StoreResult<()> {
        path::validate(slice_path)?;
        path::check_conflicts(slice_path, self.slices.keys())?;
        tracing::debug!(
            path = %slice_path,
            persisted = slice.persist_mode().is_persisted(),
            "Slice registered"
        );
        self.slices.insert(slice_path.to_string(), slice);
        Ok(())
    }

    /// Registered slice paths, sorted.
    pub fn paths(&self) -> Vec<&str> {
        self.slices.keys().map(String::as_str).collect()
    }

    /// Number of registered slices.
    pub fn len(&self) -> usize {
        self.slices.len()
    }

    /// True if no slices are registered.
    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }

    /// Monotonic counter bumped by every changing dispatch and every hydrate.
    pub fn version(&self) -> u64 {
        self.version
    }

    // ========================================================================
    // Dispatch
    // ========================================================================

    /// Run `action` through every slice.
    ///
    /// Unhandled actions are a no-op. If any rule fails the tree is left
    /// exactly as it was and [`StoreError::Rule`] is returned.
    pub fn dispatch(&mut self, action: &A) -> StoreResult<DispatchOutcome> {
        let kind = action.kind();
        let mut changed = Vec::new();
        let mut failure = None;

        for (slice_path, slice) in self.slices.iter_mut() {
            match slice.stage(action) {
                Ok(true) => changed.push(slice_path.clone()),
                Ok(false) => {}
                Err(e) => {
                    failure = Some((slice_path.clone(), e));
                    break;
                }
            }
        }

        if let Some((slice_path, e)) = failure {
            for slice in self.slices.values_mut() {
                slice.discard();
            }
            return Err(StoreError::Rule {
                slice: slice_path,
                kind: format!("{:?}", kind),
                reason: e.reason,
            });
        }

        for slice in self.slices.values_mut() {
            slice.commit();
        }
        if !changed.is_empty() {
            self.version += 1;
        }

        tracing::trace!(kind = ?kind, changed = changed.len(), version = self.version, "Dispatched");
        Ok(DispatchOutcome {
            changed,
            version: self.version,
        })
    }

    /// Dispatch each action in order, stopping at the first failure.
    pub fn dispatch_all<'a>(
        &mut self,
        actions: impl IntoIterator<Item = &'a A>,
    ) -> StoreResult<u64> {
        for action in actions {
            self.dispatch(action)?;
        }
        Ok(self.version)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    fn slice_as<S: 'static>(&self, tree: u64, slice_path: &str) -> StoreResult<&S> {
        if tree != self.id {
            return Err(StoreError::HandleMismatch(slice_path.to_string()));
        }
        self.slices
            .get(slice_path)
            .and_then(|slice| slice.as_any().downcast_ref::<S>())
            .ok_or_else(|| StoreError::HandleMismatch(slice_path.to_string()))
    }

    /// Current value of a single-value slice.
    pub fn value<V: SliceValue>(&self, handle: &ValueHandle<V>) -> StoreResult<&V> {
        self.slice_as::<ValueSlice<V, A>>(handle.tree, &handle.path)
            .map(ValueSlice::get)
    }

    /// Value at `key` in a keyed slice, or its default if never written.
    pub fn get<V: SliceValue>(&self, handle: &KeyedHandle<V>, key: &StateKey) -> StoreResult<&V> {
        self.slice_as::<KeyedSlice<V, A>>(handle.tree, &handle.path)
            .map(|slice| slice.get(key))
    }

    /// True if `key` holds a non-default value in a keyed slice.
    pub fn contains<V: SliceValue>(
        &self,
        handle: &KeyedHandle<V>,
        key: &StateKey,
    ) -> StoreResult<bool> {
        self.slice_as::<KeyedSlice<V, A>>(handle.tree, &handle.path)
            .map(|slice| slice.contains(key))
    }

    /// Keys holding non-default values in a keyed slice, sorted.
    pub fn keys<V: SliceValue>(&self, handle: &KeyedHandle<V>) -> StoreResult<Vec<StateKey>> {
        self.slice_as::<KeyedSlice<V, A>>(handle.tree, &handle.path)
            .map(KeyedSlice::keys)
    }

    /// Every slice, volatile ones included, as one nested JSON object.
    pub fn state_json(&self) -> StoreResult<Value> {
        self.to_json(|_| true)
    }

    fn to_json(&self, include: impl Fn(&dyn Slice<A>) -> bool) -> StoreResult<Value> {
        let mut root = Map::new();
        for (slice_path, slice) in &self.slices {
            if include(slice.as_ref()) {
                path::insert(&mut root, slice_path, slice.to_json()?);
            }
        }
        Ok(Value::Object(root))
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    /// Persisted slices as one nested JSON object.
    pub fn to_persisted_json(&self) -> StoreResult<Value> {
        self.to_json(|slice| slice.persist_mode().is_persisted())
    }

    /// Persisted slices as a blob accepted by [`hydrate`](Self::hydrate).
    pub fn serialize(&self) -> StoreResult<Vec<u8>> {
        Ok(serde_json::to_vec(&self.to_persisted_json()?)?)
    }

    /// Replace the tree's contents from a persisted blob.
    ///
    /// Never fails: an unparseable blob resets every slice, an invalid slice
    /// value resets that slice. Both are recorded as [`DataLoss`].
    pub fn hydrate(&mut self, blob: &[u8]) -> HydrateReport {
        match serde_json::from_slice::<Value>(blob) {
            Ok(root @ Value::Object(_)) => self.hydrate_json(&root),
            Ok(other) => self.discard_persisted(DataLossReason::Unparseable(format!(
                "expected an object at the root, found {}",
                json_type(&other)
            ))),
            Err(e) => self.discard_persisted(DataLossReason::Unparseable(e.to_string())),
        }
    }

    /// Replace the tree's contents from an already-parsed persisted value.
    pub fn hydrate_json(&mut self, root: &Value) -> HydrateReport {
        let mut report = HydrateReport::default();

        for (slice_path, slice) in self.slices.iter_mut() {
            match slice.restore(path::lookup(root, slice_path)) {
                Ok(true) => report.restored.push(slice_path.clone()),
                Ok(false) => report.reset.push(slice_path.clone()),
                Err(reason) => {
                    tracing::warn!(
                        slice = %slice_path,
                        reason = %reason,
                        "Persisted slice discarded, using default"
                    );
                    report.data_loss.push(DataLoss::slice(slice_path.clone(), reason));
                }
            }
        }

        self.data_loss.extend(report.data_loss.iter().cloned());
        self.version += 1;
        report
    }

    /// Reset every slice to its default, recording that persisted state was
    /// lost for `reason`.
    pub fn discard_persisted(&mut self, reason: DataLossReason) -> HydrateReport {
        tracing::warn!(reason = %reason, "Persisted state discarded, using defaults");
        self.reset();

        let loss = DataLoss::whole(reason);
        self.data_loss.push(loss.clone());
        HydrateReport {
            restored: Vec::new(),
            reset: self.slices.keys().cloned().collect(),
            data_loss: vec![loss],
        }
    }

    /// Reset every slice to its default.
    pub fn reset(&mut self) {
        for slice in self.slices.values_mut() {
            slice.reset();
        }
        self.version += 1;
    }

    // ========================================================================
    // Diagnostics
    // ========================================================================

    /// Every data-loss event recorded since creation or the last
    /// [`take_data_loss`](Self::take_data_loss).
    pub fn data_loss(&self) -> &[DataLoss] {
        &self.data_loss
    }

    /// Drain the recorded data-loss events.
    pub fn take_data_loss(&mut self) -> Vec<DataLoss> {
        std::mem::take(&mut self.data_loss)
    }
}

impl<A: Action + 'static> Default for StateTree<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Action + 'static> fmt::Debug for StateTree<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateTree")
            .field("slices", &self.slices.keys().collect::<Vec<_>>())
            .field("version", &self.version)
            .finish()
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
