//! Store configuration
//!
//! Configuration can be built in code:
//!
//! ```ignore
//! let config = StoreConfig::new()
//!     .namespace("calypso")
//!     .backend(Backend::File)
//!     .dir("/var/lib/app/state")
//!     .checkpoint_every(50);
//! ```
//!
//! or read from TOML:
//!
//! ```toml
//! namespace = "calypso"
//!
//! [persistence]
//! backend = "file"
//! dir = "/var/lib/app/state"
//! checkpoint_on_teardown = true
//! checkpoint_every = 50
//! ```

use keystate_core::{StoreError, StoreResult};
use keystate_durability::{validate_namespace, FilePersistence, MemoryPersistence, Persistence};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Namespace used when none is configured.
pub const DEFAULT_NAMESPACE: &str = "keystate";

/// Persistence backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// No persistence; state lives only as long as the process (default).
    #[default]
    Disabled,
    /// In-process memory; mainly for tests.
    Memory,
    /// Checksummed file per namespace under `dir`.
    File,
}

/// Persistence settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PersistenceConfig {
    /// Which backend to open
    pub backend: Backend,
    /// Directory for the file backend
    pub dir: Option<PathBuf>,
    /// Write a final checkpoint on teardown
    pub checkpoint_on_teardown: bool,
    /// Checkpoint automatically after this many state-changing dispatches
    pub checkpoint_every: Option<u64>,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Disabled,
            dir: None,
            checkpoint_on_teardown: true,
            checkpoint_every: None,
        }
    }
}

/// Store configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// Persistence namespace (file name for the file backend)
    pub namespace: String,
    /// Persistence settings
    pub persistence: PersistenceConfig,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            persistence: PersistenceConfig::default(),
        }
    }
}

impl StoreConfig {
    /// Default configuration: no persistence.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the persistence namespace.
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Select the persistence backend.
    pub fn backend(mut self, backend: Backend) -> Self {
        self.persistence.backend = backend;
        self
    }

    /// Set the file backend directory.
    pub fn dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.persistence.dir = Some(dir.into());
        self
    }

    /// Enable or disable the final checkpoint on teardown.
    pub fn checkpoint_on_teardown(mut self, enabled: bool) -> Self {
        self.persistence.checkpoint_on_teardown = enabled;
        self
    }

    /// Checkpoint automatically every `n` state-changing dispatches.
    pub fn checkpoint_every(mut self, n: u64) -> Self {
        self.persistence.checkpoint_every = Some(n);
        self
    }

    /// Parse a TOML document.
    pub fn from_toml_str(text: &str) -> StoreResult<Self> {
        let config: StoreConfig =
            toml::from_str(text).map_err(|e| StoreError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> StoreResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Check the configuration for consistency.
    pub fn validate(&self) -> StoreResult<()> {
        validate_namespace(&self.namespace)?;
        if self.persistence.backend == Backend::File && self.persistence.dir.is_none() {
            return Err(StoreError::Config(
                "file backend requires persistence.dir".to_string(),
            ));
        }
        if self.persistence.checkpoint_every == Some(0) {
            return Err(StoreError::Config(
                "persistence.checkpoint_every must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Open the configured backend, or `None` when persistence is disabled.
    pub fn open_backend(&self) -> StoreResult<Option<Arc<dyn Persistence>>> {
        self.validate()?;
        match self.persistence.backend {
            Backend::Disabled => Ok(None),
            Backend::Memory => Ok(Some(Arc::new(MemoryPersistence::new()))),
            Backend::File => {
                let dir = self.persistence.dir.as_ref().ok_or_else(|| {
                    StoreError::Config("file backend requires persistence.dir".to_string())
                })?;
                Ok(Some(Arc::new(FilePersistence::open(dir)?)))
            }
        }
    }
}
