//! Tier 3: Request Flags
//!
//! The flag for a key is true strictly between its REQUEST and the matching
//! RECEIVE (or FAILURE), whatever else is dispatched in between.

use crate::test_utils::*;
use keystate::{request_flag, StateKey, StateTree};

#[test]
fn test_flag_survives_unrelated_events() {
    let (mut tree, teams) = teams_tree();
    let site = key("2916284");

    tree.dispatch(&request("2916284")).unwrap();
    for event in [ping(), request("77203074"), receive("77203074", &["x"]), ping()] {
        tree.dispatch(&event).unwrap();
        assert!(teams.is_requesting(&tree, &site).unwrap());
    }

    tree.dispatch(&receive("2916284", &["a8c"])).unwrap();
    assert!(!teams.is_requesting(&tree, &site).unwrap());
}

#[test]
fn test_flag_and_items_change_in_one_dispatch() {
    let (mut tree, teams) = teams_tree();
    tree.dispatch(&request("global")).unwrap();

    let outcome = tree.dispatch(&receive("global", &["a"])).unwrap();
    assert_eq!(outcome.changed, vec!["teams.is_requesting", "teams.items"]);
    assert!(!teams.is_requesting(&tree, &StateKey::global()).unwrap());
}

#[test]
fn test_failure_clears_flag_and_keeps_items() {
    let (mut tree, teams) = teams_tree();
    tree.dispatch(&receive("global", &["a"])).unwrap();
    tree.dispatch(&request("global")).unwrap();

    let outcome = tree.dispatch(&failure("global")).unwrap();
    assert_eq!(outcome.changed, vec!["teams.is_requesting"]);
    assert_eq!(
        teams.items(&tree, &StateKey::global()).unwrap(),
        &strings(&["a"])
    );
}

#[test]
fn test_repeated_request_keeps_flag_set() {
    let (mut tree, teams) = teams_tree();
    tree.dispatch(&request("global")).unwrap();

    let outcome = tree.dispatch(&request("global")).unwrap();
    assert!(outcome.is_noop());
    assert!(teams.is_requesting(&tree, &StateKey::global()).unwrap());
}

#[test]
fn test_receive_without_request_leaves_flag_false() {
    let (mut tree, teams) = teams_tree();
    tree.dispatch(&receive("global", &["a"])).unwrap();
    assert!(!teams.is_requesting(&tree, &StateKey::global()).unwrap());
    assert!(tree.keys(&teams.is_requesting).unwrap().is_empty());
}

#[test]
fn test_single_value_flag_ignores_target() {
    let mut tree = StateTree::<Ev>::new();
    let busy = tree
        .register_value("busy", request_flag(&[Kind::Request], &[Kind::Receive]))
        .unwrap();

    tree.dispatch(&request("1")).unwrap();
    assert!(*tree.value(&busy).unwrap());
    tree.dispatch(&receive("2", &[])).unwrap();
    assert!(!tree.value(&busy).unwrap());
}
