//! Core types for keystate
//!
//! This crate defines the vocabulary shared by every layer:
//! - [`StateKey`]: opaque key into a keyed slice (`"global"` or derived)
//! - [`Action`]: dispatched actions with a closed `Kind` enum
//! - [`Schema`]: validator for persisted state
//! - [`StoreError`] / [`RuleError`] / [`DataLoss`]: error taxonomy

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod action;
pub mod error;
pub mod key;
pub mod schema;

pub use action::{Action, Event};
pub use error::{DataLoss, DataLossReason, RuleError, StoreError, StoreResult};
pub use key::{StateKey, GLOBAL_KEY};
pub use schema::{ObjectSchema, Schema, ValidationError};
