//! Reducers and rule tables
//!
//! A reducer maps `(current value, action)` to a new value, or to `None`
//! when the action is not one it handles. Reducers are pure and
//! synchronous: they see `&V` and `&A` only, so they cannot dispatch,
//! cannot reach other slices, and replaying the same actions always
//! produces the same state.
//!
//! Two ways to write one:
//! - [`RuleTable`]: one rule per action kind, registered with `on`/`try_on`
//! - any closure `Fn(&V, &A) -> Result<Option<V>, RuleError>`, which lets a
//!   feature match exhaustively on its own action enum
//!
//! # Example
//!
//! ```ignore
//! let items = RuleTable::new()
//!     .try_on(Kind::TeamsReceive, |_, action: &Event<Kind>| {
//!         payload::field(action, "teams")
//!     });
//!
//! let is_requesting = RuleTable::new()
//!     .on(Kind::TeamsRequest, |_, _| true)
//!     .on(Kind::TeamsReceive, |_, _| false);
//! ```

use keystate_core::{Action, RuleError};
use rustc_hash::FxHashMap;
use std::fmt;

/// Pure state transform for one slice.
pub trait Reducer<V, A: Action>: Send + Sync {
    /// Compute the next value.
    ///
    /// Returns `Ok(None)` if `action` is not handled; the slice is left
    /// untouched. An `Err` aborts the whole dispatch.
    fn reduce(&self, current: &V, action: &A) -> Result<Option<V>, RuleError>;
}

impl<V, A, F> Reducer<V, A> for F
where
    A: Action,
    F: Fn(&V, &A) -> Result<Option<V>, RuleError> + Send + Sync,
{
    fn reduce(&self, current: &V, action: &A) -> Result<Option<V>, RuleError> {
        self(current, action)
    }
}

/// Pin a closure's signature so it can be used as a [`Reducer`] without
/// annotating argument types.
pub fn from_fn<V, A, F>(f: F) -> F
where
    A: Action,
    F: Fn(&V, &A) -> Result<Option<V>, RuleError> + Send + Sync,
{
    f
}

type Rule<V, A> = Box<dyn Fn(&V, &A) -> Result<V, RuleError> + Send + Sync>;

/// Reducer built from one rule per action kind.
///
/// At most one rule exists per kind; registering a kind again replaces the
/// earlier rule. Kinds without a rule are a no-op.
pub struct RuleTable<V, A: Action> {
    rules: FxHashMap<A::Kind, Rule<V, A>>,
}

impl<V, A: Action> RuleTable<V, A> {
    /// Create an empty table.
    pub fn new() -> Self {
        Self {
            rules: FxHashMap::default(),
        }
    }

    /// Register an infallible rule for `kind`.
    pub fn on<F>(self, kind: A::Kind, rule: F) -> Self
    where
        F: Fn(&V, &A) -> V + Send + Sync + 'static,
    {
        self.insert(kind, Box::new(move |current, action| Ok(rule(current, action))))
    }

    /// Register a fallible rule for `kind`.
    pub fn try_on<F>(self, kind: A::Kind, rule: F) -> Self
    where
        F: Fn(&V, &A) -> Result<V, RuleError> + Send + Sync + 'static,
    {
        self.insert(kind, Box::new(rule))
    }

    fn insert(mut self, kind: A::Kind, rule: Rule<V, A>) -> Self {
        if self.rules.insert(kind, rule).is_some() {
            tracing::warn!(kind = ?kind, "Rule registered twice; keeping the later one");
        }
        self
    }

    /// True if a rule exists for `kind`.
    pub fn handles(&self, kind: A::Kind) -> bool {
        self.rules.contains_key(&kind)
    }

    /// Number of registered rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// True if no rules are registered.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl<V, A: Action> Default for RuleTable<V, A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V, A: Action> fmt::Debug for RuleTable<V, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleTable")
            .field("kinds", &self.rules.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<V, A> Reducer<V, A> for RuleTable<V, A>
where
    A: Action,
    V: Send + Sync,
{
    fn reduce(&self, current: &V, action: &A) -> Result<Option<V>, RuleError> {
        match self.rules.get(&action.kind()) {
            Some(rule) => rule(current, action).map(Some),
            None => Ok(None),
        }
    }
}
