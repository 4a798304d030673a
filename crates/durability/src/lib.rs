//! Durable storage for persisted state trees
//!
//! The store only produces and consumes opaque blobs; this crate moves them
//! to and from durable storage.
//!
//! - [`Persistence`]: `load` / `save` / `remove` by namespace
//! - [`MemoryPersistence`]: process-local backend for tests and ephemeral use
//! - [`FilePersistence`]: one checksummed file per namespace

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod file;
pub mod memory;

pub use file::FilePersistence;
pub use memory::MemoryPersistence;

use keystate_core::{StoreError, StoreResult};

/// Durable blob storage keyed by namespace.
///
/// Implementations must be safe to call from a background thread while the
/// store keeps dispatching: they only ever see an immutable snapshot.
pub trait Persistence: Send + Sync {
    /// Load the blob last saved under `namespace`.
    ///
    /// Returns `Ok(None)` if nothing was saved. Integrity failures are
    /// reported as [`StoreError::Corrupt`].
    fn load(&self, namespace: &str) -> StoreResult<Option<Vec<u8>>>;

    /// Save `blob` under `namespace`, replacing any previous blob.
    fn save(&self, namespace: &str, blob: &[u8]) -> StoreResult<()>;

    /// Remove the blob saved under `namespace`. Missing blobs are not an error.
    fn remove(&self, namespace: &str) -> StoreResult<()>;
}

/// Validate a persistence namespace.
///
/// Namespaces become file names, so they are restricted to ASCII
/// alphanumerics, `-`, `_` and `.`, and may not start with `.`.
pub fn validate_namespace(namespace: &str) -> StoreResult<()> {
    let valid = !namespace.is_empty()
        && !namespace.starts_with('.')
        && namespace
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidNamespace(namespace.to_string()))
    }
}
