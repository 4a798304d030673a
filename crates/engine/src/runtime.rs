//! Store runtime: lifecycle and shared access
//!
//! `StoreRuntime` is the explicit store object handed to whichever module
//! needs it. It owns the tree behind a read-write lock and the configured
//! persistence backend.
//!
//! # Lifecycle
//!
//! 1. `init`: open the backend, load the namespace, hydrate
//! 2. `dispatch` / `read`: normal operation; optional automatic checkpoints
//! 3. `teardown`: final checkpoint if configured
//!
//! # Thread Safety
//!
//! StoreRuntime is Clone and Send + Sync. Clones share the same tree.
//! Writes are serialized by the lock. A checkpoint serializes the tree
//! under the read lock, releases it, and only then performs I/O, so
//! persistence never holds up dispatch for longer than a snapshot.

use crate::config::StoreConfig;
use crate::tree::{DispatchOutcome, HydrateReport, StateTree};
use keystate_core::{Action, DataLoss, DataLossReason, StoreError, StoreResult};
use keystate_durability::Persistence;
use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Default)]
struct CheckpointState {
    /// Tree version last written to the backend
    saved_version: Option<u64>,
    /// State-changing dispatches since the last checkpoint
    dispatches_since: u64,
}

struct Inner<A: Action + 'static> {
    tree: RwLock<StateTree<A>>,
    persistence: Option<Arc<dyn Persistence>>,
    config: StoreConfig,
    checkpoint: Mutex<CheckpointState>,
    /// Serializes checkpoint writers
    save_lock: Mutex<()>,
}

/// Shared handle to a state tree and its persistence.
pub struct StoreRuntime<A: Action + 'static> {
    inner: Arc<Inner<A>>,
}

impl<A: Action + 'static> Clone for StoreRuntime<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A: Action + 'static> StoreRuntime<A> {
    /// Start a runtime using the backend named by `config`.
    ///
    /// All slices must already be registered on `tree`.
    pub fn init(tree: StateTree<A>, config: StoreConfig) -> StoreResult<Self> {
        let backend = config.open_backend()?;
        Self::start(tree, config, backend)
    }

    /// Start a runtime with an injected backend; `config.persistence.backend`
    /// is ignored.
    pub fn with_persistence(
        tree: StateTree<A>,
        config: StoreConfig,
        backend: Arc<dyn Persistence>,
    ) -> StoreResult<Self> {
        config.validate()?;
        Self::start(tree, config, Some(backend))
    }

    fn start(
        mut tree: StateTree<A>,
        config: StoreConfig,
        backend: Option<Arc<dyn Persistence>>,
    ) -> StoreResult<Self> {
        let mut checkpoint = CheckpointState::default();

        if let Some(backend) = &backend {
            let report = match backend.load(&config.namespace) {
                Ok(Some(blob)) => Some(tree.hydrate(&blob)),
                Ok(None) => None,
                Err(StoreError::Corrupt { reason, .. }) => {
                    Some(tree.discard_persisted(DataLossReason::Corrupt(reason)))
                }
                Err(e) => return Err(e),
            };

            match report {
                Some(report) => {
                    tracing::info!(
                        namespace = %config.namespace,
                        restored = report.restored.len(),
                        reset = report.reset.len(),
                        discarded = report.data_loss.len(),
                        "State restored"
                    );
                    if report.is_clean() {
                        checkpoint.saved_version = Some(tree.version());
                    }
                }
                None => {
                    tracing::info!(namespace = %config.namespace, "No persisted state, starting from defaults");
                }
            }
        }

        Ok(Self {
            inner: Arc::new(Inner {
                tree: RwLock::new(tree),
                persistence: backend,
                config,
                checkpoint: Mutex::new(checkpoint),
                save_lock: Mutex::new(()),
            }),
        })
    }

    /// Dispatch an action.
    ///
    /// Rule failures are returned and leave the tree unchanged. A failed
    /// automatic checkpoint is logged; the dispatch itself has succeeded.
    pub fn dispatch(&self, action: &A) -> StoreResult<DispatchOutcome> {
        let outcome = self.inner.tree.write().dispatch(action)?;

        if !outcome.is_noop() {
            if let Some(every) = self.inner.config.persistence.checkpoint_every {
                let due = {
                    let mut state = self.inner.checkpoint.lock();
                    state.dispatches_since += 1;
                    state.dispatches_since >= every
                };
                if due {
                    if let Err(e) = self.checkpoint() {
                        tracing::warn!(
                            namespace = %self.inner.config.namespace,
                            error = %e,
                            "Automatic checkpoint failed"
                        );
                    }
                }
            }
        }

        Ok(outcome)
    }

    /// Run a query against the tree under the read lock.
    pub fn read<R>(&self, query: impl FnOnce(&StateTree<A>) -> R) -> R {
        query(&self.inner.tree.read())
    }

    /// Current tree version.
    pub fn version(&self) -> u64 {
        self.inner.tree.read().version()
    }

    /// Data-loss events recorded so far.
    pub fn data_loss(&self) -> Vec<DataLoss> {
        self.inner.tree.read().data_loss().to_vec()
    }

    /// Replace the tree's contents from a blob, as if loaded at startup.
    pub fn hydrate(&self, blob: &[u8]) -> HydrateReport {
        self.inner.tree.write().hydrate(blob)
    }

    /// Configuration this runtime was started with.
    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }

    /// True if a persistence backend is attached.
    pub fn is_persistent(&self) -> bool {
        self.inner.persistence.is_some()
    }

    /// Write the persisted slices to the backend.
    ///
    /// Returns `Ok(false)` if there is no backend or nothing changed since
    /// the last checkpoint.
    pub fn checkpoint(&self) -> StoreResult<bool> {
        let Some(backend) = &self.inner.persistence else {
            return Ok(false);
        };
        let _writer = self.inner.save_lock.lock();

        let saved_version = self.inner.checkpoint.lock().saved_version;
        let (version, blob) = {
            let tree = self.inner.tree.read();
            if saved_version == Some(tree.version()) {
                return Ok(false);
            }
            (tree.version(), tree.serialize()?)
        };

        backend.save(&self.inner.config.namespace, &blob)?;

        let mut state = self.inner.checkpoint.lock();
        state.saved_version = Some(version);
        state.dispatches_since = 0;

        tracing::debug!(
            namespace = %self.inner.config.namespace,
            version,
            bytes = blob.len(),
            "Checkpoint written"
        );
        Ok(true)
    }

    /// Shut down, writing a final checkpoint if configured.
    pub fn teardown(self) -> StoreResult<()> {
        if self.inner.config.persistence.checkpoint_on_teardown {
            self.checkpoint()?;
        }
        tracing::info!(namespace = %self.inner.config.namespace, "Store torn down");
        Ok(())
    }
}

impl<A: Action + 'static> fmt::Debug for StoreRuntime<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreRuntime")
            .field("namespace", &self.inner.config.namespace)
            .field("persistent", &self.inner.persistence.is_some())
            .finish()
    }
}
