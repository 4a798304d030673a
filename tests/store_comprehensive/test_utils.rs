//! Shared fixtures: a "teams" store keyed by site, plus event constructors.

#![allow(dead_code)]

use keystate::{
    payload, Collection, Event, KeyedCollectionHandles, RuleTable, Schema, StateKey, StateTree,
    ValueHandle, ValueSlice,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Kind {
    Request,
    Receive,
    Failure,
    Ping,
    Unhandled,
}

pub type Ev = Event<Kind>;

pub type Teams = KeyedCollectionHandles<Vec<String>>;

/// Register the teams collection under `teams`.
pub fn register_teams(tree: &mut StateTree<Ev>) -> Teams {
    Collection::new(Vec::new())
        .requested_by(Kind::Request)
        .received_by(Kind::Receive, |event: &Ev| payload::field(event, "items"))
        .failed_by(Kind::Failure)
        .schema(Schema::array(Schema::String))
        .register_keyed(tree, "teams")
        .unwrap()
}

/// Fresh tree holding only the teams collection.
pub fn teams_tree() -> (StateTree<Ev>, Teams) {
    let mut tree = StateTree::new();
    let teams = register_teams(&mut tree);
    (tree, teams)
}

/// Fresh tree holding only a `pings` counter.
pub fn ping_tree() -> (StateTree<Ev>, ValueHandle<u64>) {
    let mut tree = StateTree::new();
    let pings = tree
        .register_value(
            "pings",
            ValueSlice::new(0u64, RuleTable::new().on(Kind::Ping, |n: &u64, _| n + 1))
                .with_schema(Schema::Integer),
        )
        .unwrap();
    (tree, pings)
}

pub fn request(key: &str) -> Ev {
    Ev::new(Kind::Request).with_target(key)
}

pub fn receive(key: &str, items: &[&str]) -> Ev {
    Ev::new(Kind::Receive)
        .with_target(key)
        .with_payload(json!({ "items": items }))
}

pub fn failure(key: &str) -> Ev {
    Ev::new(Kind::Failure).with_target(key)
}

pub fn ping() -> Ev {
    Ev::new(Kind::Ping)
}

pub fn key(key: &str) -> StateKey {
    StateKey::from(key)
}

pub fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Install a test subscriber so `tracing` output shows up with `--nocapture`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}
