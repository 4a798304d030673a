//! State keys
//!
//! A `StateKey` addresses one entry inside a keyed slice. Keys are opaque
//! strings: either the `"global"` sentinel, or a key derived from a domain
//! identifier such as a site id.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Sentinel key used when an action carries no explicit target.
pub const GLOBAL_KEY: &str = "global";

/// Opaque key into a keyed slice.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateKey(String);

impl StateKey {
    /// Create a key from any string.
    pub fn new(key: impl Into<String>) -> Self {
        StateKey(key.into())
    }

    /// The `"global"` sentinel key.
    pub fn global() -> Self {
        StateKey(GLOBAL_KEY.to_string())
    }

    /// True if this is the `"global"` sentinel.
    pub fn is_global(&self) -> bool {
        self.0 == GLOBAL_KEY
    }

    /// Borrow the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the key, returning the inner string.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl Default for StateKey {
    fn default() -> Self {
        Self::global()
    }
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StateKey {
    fn from(s: &str) -> Self {
        StateKey(s.to_string())
    }
}

impl From<String> for StateKey {
    fn from(s: String) -> Self {
        StateKey(s)
    }
}

impl From<u64> for StateKey {
    fn from(id: u64) -> Self {
        StateKey(id.to_string())
    }
}

impl AsRef<str> for StateKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
