//! Request-in-flight flags
//!
//! A request flag is a `bool` slice that defaults to `false`, flips to
//! `true` on any "started" kind and back to `false` on any "finished" kind.
//! Flags are volatile: a request cannot be in flight across a restart, so
//! hydrate always resets them.
//!
//! A kind listed in both `started` and `finished` ends up as "finished".

use keystate_core::Action;
use keystate_engine::{KeyedSlice, RuleTable, ValueSlice};

fn flag_rules<A: Action + 'static>(
    started: &[A::Kind],
    finished: &[A::Kind],
) -> RuleTable<bool, A> {
    let table: RuleTable<bool, A> = started
        .iter()
        .fold(RuleTable::new(), |table, &kind| table.on(kind, |_, _| true));
    finished
        .iter()
        .fold(table, |table, &kind| table.on(kind, |_, _| false))
}

/// Volatile keyed flag, one entry per action target.
pub fn request_flags<A: Action + 'static>(
    started: &[A::Kind],
    finished: &[A::Kind],
) -> KeyedSlice<bool, A> {
    KeyedSlice::new(false, flag_rules(started, finished)).volatile()
}

/// Volatile single flag.
pub fn request_flag<A: Action + 'static>(
    started: &[A::Kind],
    finished: &[A::Kind],
) -> ValueSlice<bool, A> {
    ValueSlice::new(false, flag_rules(started, finished)).volatile()
}
