//! Slices: the individual stores inside a tree
//!
//! - [`ValueSlice`]: one value, replaced wholesale by its reducer
//! - [`KeyedSlice`]: a [`KeyedMap`]; the reducer updates the entry at the
//!   action's target key (`"global"` when the action has none)
//!
//! Both follow the same two-phase protocol driven by the tree: `stage`
//! computes the next value without touching live state, then either
//! `commit` or `discard` is called. A dispatch is therefore all-or-nothing
//! across every slice in the tree.

use crate::reducer::Reducer;
use keystate_core::{Action, DataLossReason, RuleError, Schema, StateKey, StoreResult};
use keystate_storage::KeyedMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;

/// Bounds every slice value satisfies.
pub trait SliceValue:
    Clone + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
}

impl<T> SliceValue for T where
    T: Clone + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
}

/// How a slice is persisted.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Persist {
    /// Never persisted; reset to the default on hydrate
    Volatile,
    /// Persisted; restored if it deserializes into the value type
    #[default]
    Unchecked,
    /// Persisted; restored only if it passes the schema
    Validated(Schema),
}

impl Persist {
    /// True unless volatile.
    pub fn is_persisted(&self) -> bool {
        !matches!(self, Persist::Volatile)
    }

    /// Validate and decode a persisted value.
    fn decode<T: DeserializeOwned>(&self, persisted: &Value) -> Result<T, DataLossReason> {
        if let Persist::Validated(schema) = self {
            schema.validate(persisted)?;
        }
        serde_json::from_value(persisted.clone())
            .map_err(|e| DataLossReason::Incompatible(e.to_string()))
    }
}

/// Object-safe interface the tree uses to drive a slice.
pub trait Slice<A: Action>: Send + Sync {
    /// Compute the next value for `action` without publishing it.
    ///
    /// Returns true if the slice would change.
    fn stage(&mut self, action: &A) -> Result<bool, RuleError>;

    /// Publish the staged value, if any.
    fn commit(&mut self);

    /// Drop the staged value, if any.
    fn discard(&mut self);

    /// Persistence mode.
    fn persist_mode(&self) -> &Persist;

    /// Current value as JSON.
    fn to_json(&self) -> StoreResult<Value>;

    /// Replace the current value with a persisted one.
    ///
    /// Returns `Ok(true)` if restored, `Ok(false)` if reset to the default
    /// because nothing applicable was persisted. On `Err` the slice has also
    /// been reset to the default.
    fn restore(&mut self, persisted: Option<&Value>) -> Result<bool, DataLossReason>;

    /// Reset to the default.
    fn reset(&mut self);

    /// Downcast support for typed handles.
    fn as_any(&self) -> &dyn Any;
}

/// Single-value slice.
pub struct ValueSlice<V, A: Action> {
    default: V,
    value: V,
    reducer: Box<dyn Reducer<V, A>>,
    persist: Persist,
    pending: Option<V>,
}

impl<V: SliceValue, A: Action> ValueSlice<V, A> {
    /// Create a slice holding `default` until its reducer says otherwise.
    pub fn new(default: V, reducer: impl Reducer<V, A> + 'static) -> Self {
        Self {
            value: default.clone(),
            default,
            reducer: Box::new(reducer),
            persist: Persist::default(),
            pending: None,
        }
    }

    /// Set the persistence mode.
    pub fn persist(mut self, persist: Persist) -> Self {
        self.persist = persist;
        self
    }

    /// Persist, validated by `schema`.
    pub fn with_schema(self, schema: Schema) -> Self {
        self.persist(Persist::Validated(schema))
    }

    /// Never persist.
    pub fn volatile(self) -> Self {
        self.persist(Persist::Volatile)
    }

    /// Current value.
    pub fn get(&self) -> &V {
        &self.value
    }

    /// Declared default.
    pub fn default_value(&self) -> &V {
        &self.default
    }
}

impl<V: SliceValue, A: Action + 'static> Slice<A> for ValueSlice<V, A> {
    fn stage(&mut self, action: &A) -> Result<bool, RuleError> {
        self.pending = None;
        match self.reducer.reduce(&self.value, action)? {
            Some(next) if next != self.value => {
                self.pending = Some(next);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn commit(&mut self) {
        if let Some(next) = self.pending.take() {
            self.value = next;
        }
    }

    fn discard(&mut self) {
        self.pending = None;
    }

    fn persist_mode(&self) -> &Persist {
        &self.persist
    }

    fn to_json(&self) -> StoreResult<Value> {
        Ok(serde_json::to_value(&self.value)?)
    }

    fn restore(&mut self, persisted: Option<&Value>) -> Result<bool, DataLossReason> {
        self.reset();
        let persisted = match persisted {
            Some(value) if self.persist.is_persisted() => value,
            _ => return Ok(false),
        };
        self.value = self.persist.decode(persisted)?;
        Ok(true)
    }

    fn reset(&mut self) {
        self.pending = None;
        self.value = self.default.clone();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl<V: fmt::Debug, A: Action> fmt::Debug for ValueSlice<V, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueSlice")
            .field("value", &self.value)
            .field("persist", &self.persist)
            .finish()
    }
}

/// Slice holding one value per [`StateKey`].
pub struct KeyedSlice<V, A: Action> {
    map: KeyedMap<V>,
    reducer: Box<dyn Reducer<V, A>>,
    persist: Persist,
    pending: Option<(StateKey, V)>,
}

impl<V: SliceValue, A: Action> KeyedSlice<V, A> {
    /// Create a keyed slice; unwritten keys read as `default`.
    pub fn new(default: V, reducer: impl Reducer<V, A> + 'static) -> Self {
        Self {
            map: KeyedMap::new(default),
            reducer: Box::new(reducer),
            persist: Persist::default(),
            pending: None,
        }
    }

    /// Set the persistence mode. A schema applies to the whole map, so it
    /// is normally built with [`Schema::map`].
    pub fn persist(mut self, persist: Persist) -> Self {
        self.persist = persist;
        self
    }

    /// Persist, validated by `schema`.
    pub fn with_schema(self, schema: Schema) -> Self {
        self.persist(Persist::Validated(schema))
    }

    /// Never persist.
    pub fn volatile(self) -> Self {
        self.persist(Persist::Volatile)
    }

    /// Value at `key`, or the default.
    pub fn get(&self, key: &StateKey) -> &V {
        self.map.get(key)
    }

    /// True if `key` holds a non-default value.
    pub fn contains(&self, key: &StateKey) -> bool {
        self.map.contains(key)
    }

    /// Keys holding non-default values, sorted.
    pub fn keys(&self) -> Vec<StateKey> {
        self.map.keys()
    }

    /// Declared default.
    pub fn default_value(&self) -> &V {
        self.map.default_value()
    }
}

impl<V: SliceValue, A: Action + 'static> Slice<A> for KeyedSlice<V, A> {
    fn stage(&mut self, action: &A) -> Result<bool, RuleError> {
        self.pending = None;
        let key = action.target().unwrap_or_else(StateKey::global);
        let current = self.map.get(&key);
        match self.reducer.reduce(current, action)? {
            Some(next) if next != *current => {
                self.pending = Some((key, next));
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn commit(&mut self) {
        if let Some((key, next)) = self.pending.take() {
            self.map.set(key, next);
        }
    }

    fn discard(&mut self) {
        self.pending = None;
    }

    fn persist_mode(&self) -> &Persist {
        &self.persist
    }

    fn to_json(&self) -> StoreResult<Value> {
        Ok(serde_json::to_value(self.map.to_sorted())?)
    }

    fn restore(&mut self, persisted: Option<&Value>) -> Result<bool, DataLossReason> {
        self.reset();
        let persisted = match persisted {
            Some(value) if self.persist.is_persisted() => value,
            _ => return Ok(false),
        };
        let entries: BTreeMap<String, V> = self.persist.decode(persisted)?;
        self.map
            .replace_all(entries.into_iter().map(|(k, v)| (StateKey::from(k), v)));
        Ok(true)
    }

    fn reset(&mut self) {
        self.pending = None;
        self.map.clear();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl<V: fmt::Debug, A: Action> fmt::Debug for KeyedSlice<V, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyedSlice")
            .field("map", &self.map)
            .field("persist", &self.persist)
            .finish()
    }
}
