//! Error types for keystate
//!
//! Two layers:
//! - [`RuleError`]: returned by a rule transform. Carries only a reason;
//!   the tree wraps it with the slice name and action kind.
//! - [`StoreError`]: everything a caller of the store can see.
//!
//! Schema failures ([`ValidationError`](crate::ValidationError)) are not
//! part of `StoreError`: hydration absorbs them and records a
//! [`DataLoss`] instead.

use crate::schema::ValidationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Failure inside a rule transform.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}")]
pub struct RuleError {
    /// Human-readable reason
    pub reason: String,
}

impl RuleError {
    /// Create a rule error.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    /// Payload did not have the shape the rule expects.
    pub fn malformed_payload(detail: impl fmt::Display) -> Self {
        Self::new(format!("malformed payload: {}", detail))
    }
}

/// Store error
#[derive(Debug, Error)]
pub enum StoreError {
    /// A rule transform failed. The tree is unchanged.
    #[error("rule for {kind} in slice '{slice}' failed: {reason}")]
    Rule {
        /// Slice whose rule failed
        slice: String,
        /// Debug rendering of the action kind
        kind: String,
        /// Reason reported by the rule
        reason: String,
    },

    /// A slice with this path is already registered
    #[error("slice '{0}' is already registered")]
    DuplicateSlice(String),

    /// One slice path is a prefix of another
    #[error("slice path '{path}' conflicts with '{existing}'")]
    ConflictingPath {
        /// Path being registered
        path: String,
        /// Already-registered path it collides with
        existing: String,
    },

    /// Slice path is empty or has an empty segment
    #[error("invalid slice path '{0}'")]
    InvalidPath(String),

    /// Handle does not belong to this tree or names a slice of another type
    #[error("handle for '{0}' does not match this tree")]
    HandleMismatch(String),

    /// Persistence namespace contains unsupported characters
    #[error("invalid namespace '{0}'")]
    InvalidNamespace(String),

    /// Persisted blob failed integrity checks
    #[error("persisted state for '{namespace}' is corrupt: {reason}")]
    Corrupt {
        /// Namespace that was being loaded
        namespace: String,
        /// What was wrong with it
        reason: String,
    },

    /// Invalid configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    /// True for failures caused by a rule transform.
    pub fn is_rule_error(&self) -> bool {
        matches!(self, StoreError::Rule { .. })
    }

    /// True for integrity failures of persisted data.
    pub fn is_corrupt(&self) -> bool {
        matches!(self, StoreError::Corrupt { .. })
    }
}

/// Why persisted state was dropped during hydration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DataLossReason {
    /// Blob was not parseable as the persisted tree shape
    Unparseable(String),
    /// Blob failed integrity checks in the persistence backend
    Corrupt(String),
    /// Slice value failed schema validation
    Invalid(String),
    /// Slice value passed the schema but did not deserialize into its type
    Incompatible(String),
}

impl fmt::Display for DataLossReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataLossReason::Unparseable(e) => write!(f, "unparseable: {}", e),
            DataLossReason::Corrupt(e) => write!(f, "corrupt: {}", e),
            DataLossReason::Invalid(e) => write!(f, "invalid: {}", e),
            DataLossReason::Incompatible(e) => write!(f, "incompatible: {}", e),
        }
    }
}

impl From<ValidationError> for DataLossReason {
    fn from(err: ValidationError) -> Self {
        DataLossReason::Invalid(err.to_string())
    }
}

/// Record of persisted state discarded during hydration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataLoss {
    /// Slice that fell back to its default; `None` when the whole blob was lost
    pub slice: Option<String>,
    /// Why it was dropped
    pub reason: DataLossReason,
    /// When it happened
    pub at: DateTime<Utc>,
}

impl DataLoss {
    /// Data loss affecting one slice.
    pub fn slice(slice: impl Into<String>, reason: DataLossReason) -> Self {
        Self {
            slice: Some(slice.into()),
            reason,
            at: Utc::now(),
        }
    }

    /// Data loss affecting the whole blob.
    pub fn whole(reason: DataLossReason) -> Self {
        Self {
            slice: None,
            reason,
            at: Utc::now(),
        }
    }
}

impl fmt::Display for DataLoss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.slice {
            Some(slice) => write!(f, "slice '{}' reset to default ({})", slice, self.reason),
            None => write!(f, "persisted state discarded ({})", self.reason),
        }
    }
}
