//! Keyed map with a declared default
//!
//! Backing storage for keyed slices. A key has no entry until it is first
//! written; reads of unwritten keys return the declared default.
//!
//! # Design
//!
//! - FxHashMap: O(1) lookups, fast non-crypto hash
//! - Default held inline so reads can hand out `&V` without allocating
//! - Entries equal to the default are not stored (`set` prunes them), so
//!   the persisted shape only carries keys that differ from the default

use keystate_core::StateKey;
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;

/// Map from [`StateKey`] to `V` with a declared default.
#[derive(Debug, Clone)]
pub struct KeyedMap<V> {
    /// HashMap with FxHash for O(1) lookups
    data: FxHashMap<StateKey, V>,
    /// Value returned for keys never written
    default: V,
}

impl<V: Clone + PartialEq> KeyedMap<V> {
    /// Create an empty map with the given default.
    pub fn new(default: V) -> Self {
        Self {
            data: FxHashMap::default(),
            default,
        }
    }

    /// Create a map with pre-allocated capacity.
    pub fn with_capacity(default: V, capacity: usize) -> Self {
        Self {
            data: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            default,
        }
    }

    /// The declared default.
    pub fn default_value(&self) -> &V {
        &self.default
    }

    /// Current value for `key`, or the default if never written.
    #[inline]
    pub fn get(&self, key: &StateKey) -> &V {
        self.data.get(key).unwrap_or(&self.default)
    }

    /// True if `key` holds a non-default value.
    pub fn contains(&self, key: &StateKey) -> bool {
        self.data.contains_key(key)
    }

    /// Write `value` at `key`.
    ///
    /// Writing the default removes the entry. Returns true if the observable
    /// value at `key` changed.
    pub fn set(&mut self, key: StateKey, value: V) -> bool {
        if value == self.default {
            return self.data.remove(&key).is_some();
        }
        match self.data.get(&key) {
            Some(existing) if *existing == value => false,
            _ => {
                self.data.insert(key, value);
                true
            }
        }
    }

    /// Remove `key`, returning its previous value if it had one.
    pub fn remove(&mut self, key: &StateKey) -> Option<V> {
        self.data.remove(key)
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// Number of keys holding a non-default value.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True if no key holds a non-default value.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Keys holding a non-default value, sorted.
    pub fn keys(&self) -> Vec<StateKey> {
        let mut keys: Vec<StateKey> = self.data.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Iterate over stored entries in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&StateKey, &V)> {
        self.data.iter()
    }

    /// Sorted copy of the stored entries.
    ///
    /// Used for serialization so the persisted form is deterministic.
    pub fn to_sorted(&self) -> BTreeMap<String, V> {
        self.data
            .iter()
            .map(|(k, v)| (k.as_str().to_string(), v.clone()))
            .collect()
    }

    /// Replace all entries wholesale. Entries equal to the default are
    /// dropped.
    pub fn replace_all(&mut self, entries: impl IntoIterator<Item = (StateKey, V)>) {
        self.data.clear();
        for (key, value) in entries {
            if value != self.default {
                self.data.insert(key, value);
            }
        }
    }
}

impl<V: Clone + PartialEq + Default> Default for KeyedMap<V> {
    fn default() -> Self {
        Self::new(V::default())
    }
}
