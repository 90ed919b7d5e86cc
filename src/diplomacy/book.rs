//! Symmetric relation book for one shard
//!
//! Every transition writes both `(a, b)` and `(b, a)`; callers never touch a
//! single direction. The neutral pseudo-nation and self-pairs are ignored.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::relation::{Relation, RelationState};
use crate::core::types::NationId;

/// Nation-level casualty totals
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarStats {
    pub total_deaths: u64,
    pub by_opponent: BTreeMap<NationId, u64>,
}

/// Pairs whose state changed during a term-decay pass (each unordered pair once)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecayReport {
    pub decremented: usize,
    pub wars_started: Vec<(NationId, NationId)>,
    pub treaties_expired: Vec<(NationId, NationId, RelationState)>,
    /// True when this decay key was already applied and nothing changed
    pub skipped: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelationBook {
    relations: BTreeMap<(NationId, NationId), Relation>,
    war_stats: BTreeMap<NationId, WarStats>,
    last_decay_key: Option<u64>,
}

fn participates(a: NationId, b: NationId) -> bool {
    !a.is_neutral() && !b.is_neutral() && a != b
}

impl RelationBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create default Peace/0 relations for every ordered pair not yet present
    pub fn initialize(&mut self, nations: &[NationId]) {
        for &a in nations {
            for &b in nations {
                if participates(a, b) {
                    self.relations.entry((a, b)).or_default();
                }
            }
        }
    }

    pub fn relation(&self, me: NationId, you: NationId) -> Option<&Relation> {
        self.relations.get(&(me, you))
    }

    pub fn state(&self, me: NationId, you: NationId) -> Option<RelationState> {
        self.relation(me, you).map(|r| r.state)
    }

    pub fn at_war(&self, a: NationId, b: NationId) -> bool {
        self.state(a, b) == Some(RelationState::War)
    }

    pub fn len(&self) -> usize {
        self.relations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&(NationId, NationId), &Relation)> {
        self.relations.iter()
    }

    pub fn war_stats(&self, nation: NationId) -> Option<&WarStats> {
        self.war_stats.get(&nation)
    }

    fn set_bilateral(&mut self, a: NationId, b: NationId, state: RelationState, term: u32) -> bool {
        if !participates(a, b) {
            return false;
        }
        for key in [(a, b), (b, a)] {
            let rel = self.relations.entry(key).or_default();
            rel.state = state;
            rel.term = term;
        }
        true
    }

    /// Declaration of war; becomes war when the term runs out
    pub fn declare_war(&mut self, a: NationId, b: NationId, term: u32) -> bool {
        self.set_bilateral(a, b, RelationState::Declaration, term)
    }

    pub fn enter_war(&mut self, a: NationId, b: NationId) -> bool {
        self.set_bilateral(a, b, RelationState::War, 0)
    }

    pub fn make_peace(&mut self, a: NationId, b: NationId) -> bool {
        self.set_bilateral(a, b, RelationState::Peace, 0)
    }

    pub fn form_alliance(&mut self, a: NationId, b: NationId, term: u32) -> bool {
        self.set_bilateral(a, b, RelationState::Alliance, term)
    }

    pub fn sign_no_aggression(&mut self, a: NationId, b: NationId, term: u32) -> bool {
        self.set_bilateral(a, b, RelationState::NoAggression, term)
    }

    /// One turn of term decay
    pub fn decay_terms(&mut self) -> DecayReport {
        let mut report = DecayReport::default();

        for (&(me, you), rel) in self.relations.iter_mut() {
            if rel.term > 0 {
                rel.term -= 1;
                report.decremented += 1;
            }
            if rel.term > 0 {
                continue;
            }
            let next = rel.state.on_term_expiry();
            if next == rel.state {
                continue;
            }
            let previous = rel.state;
            rel.state = next;
            if me < you {
                match next {
                    RelationState::War => report.wars_started.push((me, you)),
                    _ => report.treaties_expired.push((me, you, previous)),
                }
            }
        }

        report
    }

    /// Term decay guarded by a cycle key; re-running the same key is a no-op
    pub fn decay_terms_once(&mut self, key: u64) -> DecayReport {
        if self.last_decay_key.is_some_and(|k| k >= key) {
            return DecayReport { skipped: true, ..Default::default() };
        }
        let report = self.decay_terms();
        self.last_decay_key = Some(key);
        report
    }

    /// Add battle deaths suffered by `me` against `you`
    pub fn record_battle_deaths(&mut self, me: NationId, you: NationId, deaths: u64) {
        if !participates(me, you) || deaths == 0 {
            return;
        }
        // Relations of a destroyed nation stay deleted; the totals still count
        if let Some(rel) = self.relations.get_mut(&(me, you)) {
            rel.deaths = rel.deaths.saturating_add(deaths);
        }

        let stats = self.war_stats.entry(me).or_default();
        stats.total_deaths = stats.total_deaths.saturating_add(deaths);
        let by = stats.by_opponent.entry(you).or_insert(0);
        *by = by.saturating_add(deaths);
    }

    /// Delete every relation involving `nation`; returns how many were removed
    pub fn remove_nation(&mut self, nation: NationId) -> usize {
        if nation.is_neutral() {
            return 0;
        }
        let before = self.relations.len();
        self.relations.retain(|&(me, you), _| me != nation && you != nation);
        self.war_stats.remove(&nation);
        before - self.relations.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const A: NationId = NationId(1);
    const B: NationId = NationId(2);
    const C: NationId = NationId(3);

    fn book() -> RelationBook {
        let mut book = RelationBook::new();
        book.initialize(&[A, B, C]);
        book
    }

    fn assert_symmetric(book: &RelationBook) {
        for (&(me, you), rel) in book.iter() {
            let back = book.relation(you, me).expect("reverse relation missing");
            assert_eq!(rel.state, back.state);
            assert_eq!(rel.term, back.term);
        }
    }

    #[test]
    fn test_initialize_creates_ordered_pairs() {
        let book = book();
        assert_eq!(book.len(), 6);
        assert_eq!(book.state(A, B), Some(RelationState::Peace));
        assert_eq!(book.relation(A, A), None);
    }

    #[test]
    fn test_neutral_never_participates() {
        let mut book = RelationBook::new();
        book.initialize(&[NationId::NEUTRAL, A]);
        assert!(book.is_empty());
        assert!(!book.declare_war(NationId::NEUTRAL, A, 5));
        book.record_battle_deaths(A, NationId::NEUTRAL, 100);
        assert!(book.is_empty());
        assert!(book.war_stats(A).is_none());
    }

    #[test]
    fn test_declaration_becomes_war_after_term() {
        let mut book = book();
        book.declare_war(A, B, 5);
        for _ in 0..4 {
            let report = book.decay_terms();
            assert!(report.wars_started.is_empty());
            assert_eq!(book.state(B, A), Some(RelationState::Declaration));
        }
        let report = book.decay_terms();
        assert_eq!(report.wars_started, vec![(A, B)]);
        assert!(book.at_war(A, B));
        assert!(book.at_war(B, A));
        assert_symmetric(&book);
    }

    #[test]
    fn test_treaties_expire_to_peace() {
        let mut book = book();
        book.form_alliance(A, B, 1);
        book.sign_no_aggression(A, C, 2);

        let report = book.decay_terms();
        assert_eq!(report.treaties_expired, vec![(A, B, RelationState::Alliance)]);
        assert_eq!(book.state(A, C), Some(RelationState::NoAggression));

        let report = book.decay_terms();
        assert_eq!(report.treaties_expired, vec![(A, C, RelationState::NoAggression)]);
        assert_eq!(book.state(C, A), Some(RelationState::Peace));
    }

    #[test]
    fn test_decay_at_war_boundary_is_idempotent() {
        let mut book = book();
        book.enter_war(A, B);
        let before = *book.relation(A, B).unwrap();

        let first = book.decay_terms();
        assert_eq!(*book.relation(A, B).unwrap(), before);
        let second = book.decay_terms();
        assert_eq!(*book.relation(A, B).unwrap(), before);
        assert!(first.wars_started.is_empty() && second.wars_started.is_empty());
    }

    #[test]
    fn test_decay_key_guards_retries() {
        let mut book = book();
        book.declare_war(A, B, 2);
        assert!(!book.decay_terms_once(10).skipped);
        assert!(book.decay_terms_once(10).skipped);
        assert_eq!(book.relation(A, B).unwrap().term, 1);
        book.decay_terms_once(11);
        assert!(book.at_war(A, B));
    }

    #[test]
    fn test_battle_deaths_accumulate() {
        let mut book = book();
        book.record_battle_deaths(A, B, 300);
        book.record_battle_deaths(A, C, 200);
        book.record_battle_deaths(A, B, 100);

        assert_eq!(book.relation(A, B).unwrap().deaths, 400);
        assert_eq!(book.relation(B, A).unwrap().deaths, 0);
        let stats = book.war_stats(A).unwrap();
        assert_eq!(stats.total_deaths, 600);
        assert_eq!(stats.by_opponent[&B], 400);
        assert_eq!(stats.by_opponent[&C], 200);
    }

    #[test]
    fn test_remove_nation_is_idempotent() {
        let mut book = book();
        book.record_battle_deaths(B, A, 10);
        assert_eq!(book.remove_nation(B), 4);
        assert_eq!(book.remove_nation(B), 0);
        assert_eq!(book.len(), 2);
        assert!(book.relation(A, B).is_none());
        assert!(book.war_stats(B).is_none());
    }

    #[derive(Debug, Clone)]
    enum Op {
        Declare(u32, u32, u32),
        War(u32, u32),
        Peace(u32, u32),
        Ally(u32, u32, u32),
        Nap(u32, u32, u32),
        Decay,
        Deaths(u32, u32, u64),
        Remove(u32),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0u32..5, 0u32..5, 0u32..8).prop_map(|(a, b, t)| Op::Declare(a, b, t)),
            (0u32..5, 0u32..5).prop_map(|(a, b)| Op::War(a, b)),
            (0u32..5, 0u32..5).prop_map(|(a, b)| Op::Peace(a, b)),
            (0u32..5, 0u32..5, 0u32..15).prop_map(|(a, b, t)| Op::Ally(a, b, t)),
            (0u32..5, 0u32..5, 0u32..15).prop_map(|(a, b, t)| Op::Nap(a, b, t)),
            Just(Op::Decay),
            (0u32..5, 0u32..5, 0u64..1000).prop_map(|(a, b, d)| Op::Deaths(a, b, d)),
            (0u32..5).prop_map(Op::Remove),
        ]
    }

    proptest! {
        #[test]
        fn prop_relations_stay_symmetric(ops in proptest::collection::vec(op(), 0..60)) {
            let mut book = RelationBook::new();
            book.initialize(&[NationId(0), NationId(1), NationId(2), NationId(3), NationId(4)]);
            for op in ops {
                match op {
                    Op::Declare(a, b, t) => { book.declare_war(NationId(a), NationId(b), t); }
                    Op::War(a, b) => { book.enter_war(NationId(a), NationId(b)); }
                    Op::Peace(a, b) => { book.make_peace(NationId(a), NationId(b)); }
                    Op::Ally(a, b, t) => { book.form_alliance(NationId(a), NationId(b), t); }
                    Op::Nap(a, b, t) => { book.sign_no_aggression(NationId(a), NationId(b), t); }
                    Op::Decay => { book.decay_terms(); }
                    Op::Deaths(a, b, d) => book.record_battle_deaths(NationId(a), NationId(b), d),
                    Op::Remove(n) => { book.remove_nation(NationId(n)); }
                }
                for (&(me, you), rel) in book.iter() {
                    let back = book.relation(you, me);
                    prop_assert!(back.is_some());
                    let back = back.unwrap();
                    prop_assert_eq!(rel.state, back.state);
                    prop_assert_eq!(rel.term, back.term);
                    prop_assert!(!me.is_neutral() && !you.is_neutral());
                }
            }
        }
    }
}
