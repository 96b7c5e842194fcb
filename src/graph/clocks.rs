//! The clock-domain relation table.
//!
//! Domains are declared by name; pairs of domains relate via integer
//! multiply/divide ratios. Two domains are crossing-related when a finite
//! chain of declared relations connects them; the effective ratio over a
//! chain composes by ordinary fraction multiplication (reduced at each hop).

use crate::rythm::Ratio;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// A unique, stable identifier for a clock domain.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct DomainId(pub u32);

impl DomainId {
    #[inline(always)]
    pub fn index(&self) -> usize {
        self.0 as usize
    }
    pub fn new(idx: usize) -> Self {
        Self(idx as u32)
    }
}

/// One declared relation: `a` ticks `a_ticks` times while `b` ticks
/// `b_ticks` times over a shared reference interval. Stored reduced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct Relation {
    a: DomainId,
    b: DomainId,
    a_ticks: u32,
    b_ticks: u32,
}

/// Named clock domains plus their declared ratio relations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClockTable {
    names: Vec<String>,
    relations: Vec<Relation>,
}

pub(crate) fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a.max(1)
}

impl ClockTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_domain(&mut self, name: impl Into<String>) -> DomainId {
        let id = DomainId::new(self.names.len());
        self.names.push(name.into());
        id
    }

    pub fn domain_name(&self, d: DomainId) -> &str {
        &self.names[d.index()]
    }

    pub fn domain_count(&self) -> usize {
        self.names.len()
    }

    /// Declares that `a` ticks `a_ticks` times per `b_ticks` ticks of `b`.
    /// A multiply relation (`b = a * 3`) is `declare_ratio(b, a, 3, 1)`;
    /// a divide relation is the reverse.
    pub fn declare_ratio(&mut self, a: DomainId, b: DomainId, a_ticks: u32, b_ticks: u32) {
        let g = gcd(a_ticks as u64, b_ticks as u64) as u32;
        self.relations.push(Relation {
            a,
            b,
            a_ticks: a_ticks / g,
            b_ticks: b_ticks / g,
        });
    }

    /// The reduced tick ratio of `from` against `to`: `from` ticks `.0`
    /// times per `.1` ticks of `to`. `None` when no relation chain connects
    /// the two domains.
    pub fn ratio_between(&self, from: DomainId, to: DomainId) -> Option<(u32, u32)> {
        if from == to {
            return Some((1, 1));
        }
        // BFS over the relation chain, composing fractions hop by hop.
        let mut seen = vec![false; self.names.len()];
        let mut queue: VecDeque<(DomainId, u64, u64)> = VecDeque::new();
        seen[from.index()] = true;
        queue.push_back((from, 1, 1));

        while let Some((here, num, den)) = queue.pop_front() {
            for rel in &self.relations {
                let (next, hop_num, hop_den) = if rel.a == here {
                    (rel.b, rel.a_ticks as u64, rel.b_ticks as u64)
                } else if rel.b == here {
                    (rel.a, rel.b_ticks as u64, rel.a_ticks as u64)
                } else {
                    continue;
                };
                if seen[next.index()] {
                    continue;
                }
                seen[next.index()] = true;
                let mut n = num * hop_num;
                let mut d = den * hop_den;
                let g = gcd(n, d);
                n /= g;
                d /= g;
                if next == to {
                    return Some((n as u32, d as u32));
                }
                queue.push_back((next, n, d));
            }
        }
        None
    }

    /// Whether any chain of declared relations connects the two domains.
    pub fn crossing_related(&self, a: DomainId, b: DomainId) -> bool {
        self.ratio_between(a, b).is_some()
    }

    /// Orients the ratio of `(from, to)` into a reduced fast:slow [`Ratio`],
    /// also reporting whether `from` is the fast side.
    pub fn oriented_ratio(&self, from: DomainId, to: DomainId) -> Option<(Ratio, bool)> {
        let (from_ticks, to_ticks) = self.ratio_between(from, to)?;
        if from_ticks >= to_ticks {
            Some((Ratio::new(from_ticks, to_ticks), true))
        } else {
            Some((Ratio::new(to_ticks, from_ticks), false))
        }
    }
}
