//! In-memory storage for keystate slices

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod keyed;

pub use keyed::KeyedMap;
