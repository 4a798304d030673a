//! Store engine for keystate
//!
//! This crate ties the layers together:
//! - `reducer`: reducers and per-kind rule tables
//! - `slice`: single-value and keyed slices with their persistence modes
//! - `tree`: the state tree (dispatch, queries, hydrate, serialize)
//! - `config`: store configuration (TOML or builder)
//! - `runtime`: shared runtime with init/checkpoint/teardown lifecycle

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
mod path;
pub mod reducer;
pub mod runtime;
pub mod slice;
pub mod tree;

pub use config::{Backend, PersistenceConfig, StoreConfig, DEFAULT_NAMESPACE};
pub use reducer::{from_fn, Reducer, RuleTable};
pub use runtime::StoreRuntime;
pub use slice::{KeyedSlice, Persist, Slice, SliceValue, ValueSlice};
pub use tree::{DispatchOutcome, HydrateReport, KeyedHandle, StateTree, ValueHandle};
