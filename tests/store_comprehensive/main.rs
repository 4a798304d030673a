//! Store Comprehensive Test Suite
//!
//! End-to-end behavior of a keyed state store driven through the public
//! `keystate` facade.
//!
//! ## Test Tiers
//!
//! - **Tier 1**: Dispatch scenarios
//! - **Tier 2**: Persistence (serialize, hydrate, checkpoint, restart)
//! - **Tier 3**: Request-flag invariants
//! - **Tier 4**: Property tests over arbitrary event streams
//! - **Tier 5**: Shared runtime under concurrent access
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test --test store_comprehensive
//! ```

// Test modules
mod test_utils;


// Tier 2: Persistence
mod tier2_persistence;

// Tier 3: Request Flags
mod tier3_request_flags;

// Tier 4: Properties
mod tier4_properties;

// Tier 5: Runtime
mod tier5_runtime;
