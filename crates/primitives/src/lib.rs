//! Ready-made slice patterns for keystate trees
//!
//! - [`request_flag`] / [`request_flags`]: request-in-flight flags
//! - [`Collection`]: items plus their request flag, registered together
//! - [`payload`]: typed field extraction for [`Event`](keystate_core::Event) rules

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod collection;
pub mod payload;
pub mod request;

pub use collection::{Collection, CollectionHandles, KeyedCollectionHandles};
pub use request::{request_flag, request_flags};
