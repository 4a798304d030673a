//! Public types for keystate.
//!
//! This module re-exports types from internal crates with a clean public interface.

// ============================================================================
// Actions and keys
// ============================================================================

pub use keystate_core::{Action, Event, StateKey, GLOBAL_KEY};

// ============================================================================
// Schemas
// ============================================================================

pub use keystate_core::{ObjectSchema, Schema, ValidationError};

// ============================================================================
// Errors and diagnostics
// ============================================================================

pub use keystate_core::{DataLoss, DataLossReason, RuleError, StoreError, StoreResult};

// ============================================================================
// Tree, slices and reducers
// ============================================================================

pub use keystate_engine::{
    from_fn, DispatchOutcome, HydrateReport, KeyedHandle, KeyedSlice, Persist, Reducer,
    RuleTable, SliceValue, StateTree, ValueHandle, ValueSlice,
};
pub use keystate_storage::KeyedMap;

// ============================================================================
// Runtime and configuration
// ============================================================================

pub use keystate_engine::{
    Backend, PersistenceConfig, StoreConfig, StoreRuntime, DEFAULT_NAMESPACE,
};

// Persistence backends, for injection via `StoreRuntime::with_persistence`
pub use keystate_durability::{FilePersistence, MemoryPersistence, Persistence};

// ============================================================================
// Ready-made patterns
// ============================================================================

pub use keystate_primitives::{
    payload, request_flag, request_flags, Collection, CollectionHandles, KeyedCollectionHandles,
};
