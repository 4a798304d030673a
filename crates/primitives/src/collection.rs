//! "Items + is-requesting" collections
//!
//! The most common shape of fetched server data: a list that is filled by a
//! receive action, and a flag telling whether a fetch is in flight. Both
//! live under one namespace:
//!
//! ```text
//! <ns>.items          persisted, optionally schema-validated
//! <ns>.is_requesting  volatile request flag
//! ```
//!
//! and are registered together so they always change in the same dispatch.
//!
//! # Example
//!
//! ```ignore
//! let teams = Collection::new(Vec::<Team>::new())
//!     .requested_by(Kind::TeamsRequest)
//!     .received_by(Kind::TeamsReceive, |event| payload::field(event, "teams"))
//!     .schema(Schema::array(team_schema))
//!     .register(&mut tree, "reader.teams")?;
//!
//! tree.dispatch(&Event::new(Kind::TeamsRequest))?;
//! assert!(teams.is_requesting(&tree)?);
//! ```

use crate::request::{request_flag, request_flags};
use keystate_core::{Action, RuleError, Schema, StateKey, StoreResult};
use keystate_engine::{
    KeyedHandle, KeyedSlice, Persist, RuleTable, SliceValue, StateTree, ValueHandle, ValueSlice,
};

type Extract<V, A> = Box<dyn Fn(&A) -> Result<V, RuleError> + Send + Sync>;

/// Builder for an items slice paired with its request flag.
pub struct Collection<V, A: Action> {
    default: V,
    requested_by: Vec<A::Kind>,
    received_by: Vec<(A::Kind, Extract<V, A>)>,
    failed_by: Vec<A::Kind>,
    schema: Option<Schema>,
}

impl<V: SliceValue, A: Action + 'static> Collection<V, A> {
    /// Start a collection whose items default to `default`.
    pub fn new(default: V) -> Self {
        Self {
            default,
            requested_by: Vec::new(),
            received_by: Vec::new(),
            failed_by: Vec::new(),
            schema: None,
        }
    }

    /// `kind` starts a request.
    pub fn requested_by(mut self, kind: A::Kind) -> Self {
        self.requested_by.push(kind);
        self
    }

    /// `kind` delivers the items and finishes the request.
    ///
    /// `extract` pulls the new items out of the action. An error aborts the
    /// dispatch.
    pub fn received_by<F>(mut self, kind: A::Kind, extract: F) -> Self
    where
        F: Fn(&A) -> Result<V, RuleError> + Send + Sync + 'static,
    {
        self.received_by.push((kind, Box::new(extract)));
        self
    }

    /// `kind` finishes the request without touching the items.
    pub fn failed_by(mut self, kind: A::Kind) -> Self {
        self.failed_by.push(kind);
        self
    }

    /// Validate persisted items against `schema` on hydrate.
    ///
    /// For keyed collections this is the schema of one entry.
    pub fn schema(mut self, schema: Schema) -> Self {
        self.schema = Some(schema);
        self
    }

    fn finished(&self) -> Vec<A::Kind> {
        self.received_by
            .iter()
            .map(|(kind, _)| *kind)
            .chain(self.failed_by.iter().copied())
            .collect()
    }

    fn items_rules(received_by: Vec<(A::Kind, Extract<V, A>)>) -> RuleTable<V, A> {
        received_by
            .into_iter()
            .fold(RuleTable::new(), |table, (kind, extract)| {
                table.try_on(kind, move |_, action| extract(action))
            })
    }

    /// Register `<ns>.items` and `<ns>.is_requesting` as single values.
    pub fn register(
        self,
        tree: &mut StateTree<A>,
        ns: &str,
    ) -> StoreResult<CollectionHandles<V>> {
        let finished = self.finished();
        let persist = match self.schema {
            Some(schema) => Persist::Validated(schema),
            None => Persist::Unchecked,
        };

        let items = ValueSlice::new(self.default, Self::items_rules(self.received_by))
            .persist(persist);
        let items = tree.register_value(&format!("{}.items", ns), items)?;
        let is_requesting = tree.register_value(
            &format!("{}.is_requesting", ns),
            request_flag(&self.requested_by, &finished),
        )?;

        tracing::debug!(namespace = %ns, "Collection registered");
        Ok(CollectionHandles {
            items,
            is_requesting,
        })
    }

    /// Register `<ns>.items` and `<ns>.is_requesting` keyed by the action
    /// target.
    pub fn register_keyed(
        self,
        tree: &mut StateTree<A>,
        ns: &str,
    ) -> StoreResult<KeyedCollectionHandles<V>> {
        let finished = self.finished();
        let persist = match self.schema {
            Some(schema) => Persist::Validated(Schema::map(schema)),
            None => Persist::Unchecked,
        };

        let items = KeyedSlice::new(self.default, Self::items_rules(self.received_by))
            .persist(persist);
        let items = tree.register_keyed(&format!("{}.items", ns), items)?;
        let is_requesting = tree.register_keyed(
            &format!("{}.is_requesting", ns),
            request_flags(&self.requested_by, &finished),
        )?;

        tracing::debug!(namespace = %ns, "Keyed collection registered");
        Ok(KeyedCollectionHandles {
            items,
            is_requesting,
        })
    }
}

/// Handles to a registered [`Collection`].
#[derive(Debug, Clone)]
pub struct CollectionHandles<V> {
    /// Items slice
    pub items: ValueHandle<V>,
    /// Request flag
    pub is_requesting: ValueHandle<bool>,
}

impl<V: SliceValue> CollectionHandles<V> {
    /// Current items.
    pub fn items<'t, A: Action + 'static>(&self, tree: &'t StateTree<A>) -> StoreResult<&'t V> {
        tree.value(&self.items)
    }

    /// True while a request is in flight.
    pub fn is_requesting<A: Action + 'static>(&self, tree: &StateTree<A>) -> StoreResult<bool> {
        tree.value(&self.is_requesting).copied()
    }
}

/// Handles to a [`Collection`] registered with
/// [`register_keyed`](Collection::register_keyed).
#[derive(Debug, Clone)]
pub struct KeyedCollectionHandles<V> {
    /// Items slice, one entry per target key
    pub items: KeyedHandle<V>,
    /// Request flags, one per target key
    pub is_requesting: KeyedHandle<bool>,
}

impl<V: SliceValue> KeyedCollectionHandles<V> {
    /// Items at `key`, or the default.
    pub fn items<'t, A: Action + 'static>(
        &self,
        tree: &'t StateTree<A>,
        key: &StateKey,
    ) -> StoreResult<&'t V> {
        tree.get(&self.items, key)
    }

    /// True while a request for `key` is in flight.
    pub fn is_requesting<A: Action + 'static>(
        &self,
        tree: &StateTree<A>,
        key: &StateKey,
    ) -> StoreResult<bool> {
        tree.get(&self.is_requesting, key).copied()
    }
}
