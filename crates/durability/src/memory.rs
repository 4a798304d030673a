//! In-memory persistence backend

use crate::{validate_namespace, Persistence};
use keystate_core::StoreResult;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;

/// Process-local persistence.
///
/// Blobs survive for the lifetime of this value only. Share it through an
/// `Arc` to simulate a restart: drop the runtime, keep the backend, init a
/// new runtime against it.
#[derive(Debug, Default)]
pub struct MemoryPersistence {
    blobs: RwLock<FxHashMap<String, Vec<u8>>>,
}

impl MemoryPersistence {
    /// Create an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of namespaces currently saved.
    pub fn len(&self) -> usize {
        self.blobs.read().len()
    }

    /// True if nothing is saved.
    pub fn is_empty(&self) -> bool {
        self.blobs.read().is_empty()
    }
}

impl Persistence for MemoryPersistence {
    fn load(&self, namespace: &str) -> StoreResult<Option<Vec<u8>>> {
        validate_namespace(namespace)?;
        Ok(self.blobs.read().get(namespace).cloned())
    }

    fn save(&self, namespace: &str, blob: &[u8]) -> StoreResult<()> {
        validate_namespace(namespace)?;
        self.blobs
            .write()
            .insert(namespace.to_string(), blob.to_vec());
        Ok(())
    }

    fn remove(&self, namespace: &str) -> StoreResult<()> {
        validate_namespace(namespace)?;
        self.blobs.write().remove(namespace);
        Ok(())
    }
}
