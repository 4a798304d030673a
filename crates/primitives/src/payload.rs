//! Payload extraction helpers for [`Event`] rules
//!
//! Rules receiving an [`Event`] usually pull one typed field out of the
//! payload. These helpers turn a missing or mistyped field into a
//! [`RuleError`], which aborts the dispatch and leaves the tree untouched.

use keystate_core::{Event, RuleError};
use serde::de::DeserializeOwned;

/// Deserialize the top-level payload field `name`.
///
/// ```ignore
/// RuleTable::new().try_on(Kind::TeamsReceive, |_, event| payload::field(event, "teams"))
/// ```
pub fn field<V: DeserializeOwned, K>(event: &Event<K>, name: &str) -> Result<V, RuleError> {
    let value = event
        .field(name)
        .ok_or_else(|| RuleError::malformed_payload(format!("missing field `{}`", name)))?;
    serde_json::from_value(value.clone())
        .map_err(|e| RuleError::malformed_payload(format!("field `{}`: {}", name, e)))
}

/// Deserialize the whole payload.
pub fn whole<V: DeserializeOwned, K>(event: &Event<K>) -> Result<V, RuleError> {
    serde_json::from_value(event.payload.clone()).map_err(RuleError::malformed_payload)
}
