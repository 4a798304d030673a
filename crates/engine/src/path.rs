//! Dotted slice paths
//!
//! Slices live at dotted paths (`reader.teams.items`). The persisted tree is
//! the nested JSON object those paths describe:
//!
//! ```text
//! reader.teams.items         -> {"reader":{"teams":{"items":[...]}}}
//! reader.teams.is_requesting
//! ```
//!
//! No registered path may be a prefix of another, so every path addresses a
//! leaf and nesting never collides.

use keystate_core::{StoreError, StoreResult};
use serde_json::{Map, Value};

/// Check that `path` is non-empty and has no empty segments.
pub(crate) fn validate(path: &str) -> StoreResult<()> {
    if path.is_empty() || path.split('.').any(|segment| segment.is_empty()) {
        return Err(StoreError::InvalidPath(path.to_string()));
    }
    Ok(())
}

/// Check `path` against the already-registered paths.
pub(crate) fn check_conflicts<'a>(
    path: &str,
    existing: impl IntoIterator<Item = &'a String>,
) -> StoreResult<()> {
    for other in existing {
        if other == path {
            return Err(StoreError::DuplicateSlice(path.to_string()));
        }
        if is_ancestor(other, path) || is_ancestor(path, other) {
            return Err(StoreError::ConflictingPath {
                path: path.to_string(),
                existing: other.clone(),
            });
        }
    }
    Ok(())
}

fn is_ancestor(ancestor: &str, path: &str) -> bool {
    path.len() > ancestor.len()
        && path.starts_with(ancestor)
        && path.as_bytes()[ancestor.len()] == b'.'
}

/// Place `value` at `path` inside `root`, creating intermediate objects.
pub(crate) fn insert(root: &mut Map<String, Value>, path: &str, value: Value) {
    let mut segments = path.split('.').peekable();
    let mut node = root;
    while let Some(segment) = segments.next() {
        if segments.peek().is_none() {
            node.insert(segment.to_string(), value);
            return;
        }
        let child = node
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !child.is_object() {
            *child = Value::Object(Map::new());
        }
        node = match child {
            Value::Object(map) => map,
            _ => return,
        };
    }
}

/// Find the value at `path` inside `root`.
pub(crate) fn lookup<'v>(root: &'v Value, path: &str) -> Option<&'v Value> {
    path.split('.')
        .try_fold(root, |node, segment| node.as_object()?.get(segment))
}
