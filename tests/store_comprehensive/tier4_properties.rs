//! Tier 4: Properties
//!
//! Determinism, the serialize/hydrate round trip, unmatched no-ops and the
//! request-flag invariant over arbitrary event streams.

use crate::test_utils::*;
use keystate::StateKey;
use proptest::prelude::*;
use std::collections::HashMap;

const KEYS: &[&str] = &["global", "2916284", "77203074"];

fn key_strategy() -> impl Strategy<Value = &'static str> {
    prop::sample::select(KEYS)
}

fn event_strategy() -> impl Strategy<Value = Ev> {
    prop_oneof![
        key_strategy().prop_map(request),
        (key_strategy(), prop::collection::vec("[a-z]{1,6}", 0..4)).prop_map(|(k, items)| {
            let items: Vec<&str> = items.iter().map(String::as_str).collect();
            receive(k, &items)
        }),
        key_strategy().prop_map(failure),
        Just(ping()),
    ]
}

fn stream_strategy() -> impl Strategy<Value = Vec<Ev>> {
    prop::collection::vec(event_strategy(), 0..40)
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]

    #[test]
    fn replaying_a_stream_is_deterministic(events in stream_strategy()) {
        let (mut first, _) = teams_tree();
        let (mut second, _) = teams_tree();
        first.dispatch_all(&events).unwrap();
        second.dispatch_all(&events).unwrap();

        prop_assert_eq!(first.state_json().unwrap(), second.state_json().unwrap());
        prop_assert_eq!(first.version(), second.version());
    }

    #[test]
    fn hydrate_of_serialize_restores_persisted_state(events in stream_strategy()) {
        let (mut tree, _) = teams_tree();
        tree.dispatch_all(&events).unwrap();

        let (mut restored, _) = teams_tree();
        let report = restored.hydrate(&tree.serialize().unwrap());

        prop_assert!(report.is_clean());
        prop_assert_eq!(
            restored.to_persisted_json().unwrap(),
            tree.to_persisted_json().unwrap()
        );
    }

    #[test]
    fn unmatched_kind_leaves_state_unchanged(events in stream_strategy(), k in key_strategy()) {
        let (mut tree, _) = teams_tree();
        tree.dispatch_all(&events).unwrap();
        let before = tree.state_json().unwrap();

        let outcome = tree.dispatch(&Ev::new(Kind::Unhandled).with_target(k)).unwrap();

        prop_assert!(outcome.is_noop());
        prop_assert_eq!(tree.state_json().unwrap(), before);
    }

    #[test]
    fn unwritten_key_reads_default(events in stream_strategy()) {
        let (mut tree, teams) = teams_tree();
        tree.dispatch_all(&events).unwrap();

        let never = key("never-written");
        prop_assert!(teams.items(&tree, &never).unwrap().is_empty());
        prop_assert!(!teams.is_requesting(&tree, &never).unwrap());
    }

    #[test]
    fn flag_is_true_strictly_between_request_and_finish(events in stream_strategy()) {
        let (mut tree, teams) = teams_tree();
        let mut in_flight: HashMap<&str, bool> = HashMap::new();

        for event in &events {
            tree.dispatch(event).unwrap();

            if let Some(target) = &event.target {
                let k = KEYS.iter().copied().find(|k| *k == target.as_str()).unwrap();
                match event.kind {
                    Kind::Request => { in_flight.insert(k, true); }
                    Kind::Receive | Kind::Failure => { in_flight.insert(k, false); }
                    Kind::Ping | Kind::Unhandled => {}
                }
            }

            for k in KEYS {
                let expected = in_flight.get(k).copied().unwrap_or(false);
                prop_assert_eq!(
                    teams.is_requesting(&tree, &StateKey::from(*k)).unwrap(),
                    expected
                );
            }
        }
    }
}
