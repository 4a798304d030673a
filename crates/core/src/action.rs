//! Actions
//!
//! Actions are the only way state changes. Each action exposes a `kind`
//! drawn from a closed enum owned by the application, and optionally the
//! key it targets. Rule tables are keyed by kind, so an application that
//! defines its kinds as an enum gets exhaustiveness checking wherever it
//! matches on them.
//!
//! [`Event`] is a generic envelope for applications that want a uniform,
//! serializable action shape: `{ kind, payload, target }`.

use crate::key::StateKey;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;

/// A dispatched action.
///
/// # Example
///
/// ```
/// use keystate_core::{Action, StateKey};
///
/// #[derive(Debug)]
/// enum TeamsAction {
///     Request,
///     Receive(Vec<String>),
/// }
///
/// #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// enum TeamsKind {
///     Request,
///     Receive,
/// }
///
/// impl Action for TeamsAction {
///     type Kind = TeamsKind;
///
///     fn kind(&self) -> TeamsKind {
///         match self {
///             TeamsAction::Request => TeamsKind::Request,
///             TeamsAction::Receive(_) => TeamsKind::Receive,
///         }
///     }
/// }
///
/// assert_eq!(TeamsAction::Request.kind(), TeamsKind::Request);
/// assert_eq!(TeamsAction::Request.target(), None);
/// ```
pub trait Action: fmt::Debug {
    /// Closed set of action kinds. Rule tables are keyed by this.
    type Kind: Copy + Eq + Hash + fmt::Debug + Send + Sync + 'static;

    /// The kind of this action.
    fn kind(&self) -> Self::Kind;

    /// Key this action targets inside keyed slices.
    ///
    /// `None` means the `"global"` key.
    fn target(&self) -> Option<StateKey> {
        None
    }
}

/// Generic action envelope: `{ kind, payload, target }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event<K> {
    /// Action kind
    pub kind: K,
    /// Free-form payload, interpreted by the rules that handle `kind`
    #[serde(default)]
    pub payload: serde_json::Value,
    /// Target key for keyed slices
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<StateKey>,
}

impl<K> Event<K> {
    /// Create an event with a null payload and no target.
    pub fn new(kind: K) -> Self {
        Self {
            kind,
            payload: serde_json::Value::Null,
            target: None,
        }
    }

    /// Set the payload.
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }

    /// Set the target key.
    pub fn with_target(mut self, target: impl Into<StateKey>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Look up a top-level payload field.
    pub fn field(&self, name: &str) -> Option<&serde_json::Value> {
        self.payload.get(name)
    }
}

impl<K> Action for Event<K>
where
    K: Copy + Eq + Hash + fmt::Debug + Send + Sync + 'static,
{
    type Kind = K;

    fn kind(&self) -> K {
        self.kind
    }

    fn target(&self) -> Option<StateKey> {
        self.target.clone()
    }
}
