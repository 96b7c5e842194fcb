//! Dense columnar storage for one module's signal graph.
//!
//! Signals live in parallel columns indexed by `SignalId`; operand edges are
//! a flat CSR table. Feedback edges (state updates) are kept in a separate
//! list so that graph ordering never traverses them.

use super::node::{SignalKind, SignalMeta};
use serde::{Deserialize, Serialize};

/// A unique, stable identifier for a signal within one module graph.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct SignalId(pub u32);

impl SignalId {
    #[inline(always)]
    pub fn index(&self) -> usize {
        self.0 as usize
    }
    pub fn new(idx: usize) -> Self {
        Self(idx as u32)
    }
}

/// A declared state-update edge: `driver` is latched into `state` at the
/// invocation boundary. Never part of the combinational topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackEdge {
    pub state: SignalId,
    pub driver: SignalId,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignalArena {
    // Columnar arrays
    pub kinds: Vec<SignalKind>,
    pub meta: Vec<SignalMeta>,
    /// Timeline cycle-group each signal was elaborated in.
    pub groups: Vec<u32>,

    // Operand topology (CSR)
    pub parents_flat: Vec<SignalId>,
    pub parents_ranges: Vec<(u32, u32)>, // (start, count)

    pub feedback: Vec<FeedbackEdge>,
}

impl SignalArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.kinds.len()
    }

    pub fn add_signal(
        &mut self,
        kind: SignalKind,
        parents: &[SignalId],
        meta: SignalMeta,
        group: u32,
    ) -> SignalId {
        let id = SignalId(self.kinds.len() as u32);

        let start = self.parents_flat.len() as u32;
        let count = parents.len() as u32;
        self.parents_flat.extend_from_slice(parents);
        self.parents_ranges.push((start, count));

        self.kinds.push(kind);
        self.meta.push(meta);
        self.groups.push(group);

        id
    }

    /// Replaces a signal's operand list. Elaboration uses this to resolve
    /// forward references; the old CSR range is abandoned in place.
    pub fn rebind_operands(&mut self, id: SignalId, parents: &[SignalId]) {
        let start = self.parents_flat.len() as u32;
        let count = parents.len() as u32;
        self.parents_flat.extend_from_slice(parents);
        self.parents_ranges[id.index()] = (start, count);
    }

    pub fn add_feedback(&mut self, state: SignalId, driver: SignalId) {
        self.feedback.push(FeedbackEdge { state, driver });
    }

    #[inline(always)]
    pub fn get_parents(&self, id: SignalId) -> &[SignalId] {
        let (start, count) = self.parents_ranges[id.index()];
        &self.parents_flat[start as usize..(start + count) as usize]
    }

    pub fn ids(&self) -> impl Iterator<Item = SignalId> {
        (0..self.count()).map(SignalId::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::node::Operator;

    fn meta(name: &str) -> SignalMeta {
        SignalMeta::named(name)
    }

    #[test]
    fn parents_round_trip_through_csr() {
        let mut arena = SignalArena::new();
        let a = arena.add_signal(SignalKind::Const, &[], meta("a"), 0);
        let b = arena.add_signal(SignalKind::Const, &[], meta("b"), 0);
        let sum = arena.add_signal(SignalKind::Op(Operator::Add), &[a, b], meta("sum"), 0);

        assert_eq!(arena.get_parents(sum), &[a, b]);
        assert_eq!(arena.get_parents(a), &[] as &[SignalId]);
        assert_eq!(arena.count(), 3);
    }

    #[test]
    fn rebind_replaces_operands_without_disturbing_others() {
        let mut arena = SignalArena::new();
        let a = arena.add_signal(SignalKind::Const, &[], meta("a"), 0);
        let b = arena.add_signal(SignalKind::Const, &[], meta("b"), 0);
        let wire = arena.add_signal(SignalKind::Op(Operator::And), &[a, a], meta("wire"), 0);
        let other = arena.add_signal(SignalKind::Op(Operator::Not), &[wire], meta("other"), 0);

        arena.rebind_operands(wire, &[a, b]);

        assert_eq!(arena.get_parents(wire), &[a, b]);
        assert_eq!(arena.get_parents(other), &[wire]);
    }
}
