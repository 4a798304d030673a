//! keystate: a persisted, schema-validated keyed state container
//!
//! Independent slices of state are registered under dotted paths in a
//! [`StateTree`]. Every dispatched action runs through every slice's
//! reducer; the tree is then serialized for persistence and hydrated back
//! at the next start.
//!
//! # Example
//!
//! ```
//! use keystate::{payload, Collection, Event, Schema, StateTree};
//! use serde_json::json;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
//! enum Kind {
//!     TeamsRequest,
//!     TeamsReceive,
//! }
//!
//! let mut tree = StateTree::new();
//! let teams = Collection::new(Vec::<String>::new())
//!     .requested_by(Kind::TeamsRequest)
//!     .received_by(Kind::TeamsReceive, |event: &Event<Kind>| {
//!         payload::field(event, "teams")
//!     })
//!     .schema(Schema::array(Schema::String))
//!     .register(&mut tree, "reader.teams")
//!     .unwrap();
//!
//! tree.dispatch(&Event::new(Kind::TeamsRequest)).unwrap();
//! assert!(teams.is_requesting(&tree).unwrap());
//!
//! tree.dispatch(&Event::new(Kind::TeamsReceive).with_payload(json!({ "teams": ["a8c"] })))
//!     .unwrap();
//! assert!(!teams.is_requesting(&tree).unwrap());
//! assert_eq!(teams.items(&tree).unwrap(), &vec!["a8c".to_string()]);
//!
//! let blob = tree.serialize().unwrap();
//! let report = tree.hydrate(&blob);
//! assert!(report.is_clean());
//! ```
//!
//! For shared access and persistence across restarts, hand the tree to a
//! [`StoreRuntime`].

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod types;

pub use types::*;
