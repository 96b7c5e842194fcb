//! Timeline patterns: the regex-like cadence declaration of a streaming
//! module.
//!
//! The alphabet is the cross-product of per-port presence for one cycle,
//! packed into a [`CycleToken`] bitmask over the declaring module's timeline
//! ports. Patterns compose by sequence, alternation, repetition and option.

use crate::graph::PortId;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// One letter of the timeline alphabet: which declared ports carry valid
/// data this cycle. Bit `i` corresponds to `TimelineDecl::ports[i]`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct CycleToken(pub u32);

impl CycleToken {
    pub fn empty() -> Self {
        Self(0)
    }

    pub fn with_bit(self, bit: usize) -> Self {
        Self(self.0 | (1 << bit))
    }

    pub fn contains(self, bit: usize) -> bool {
        self.0 & (1 << bit) != 0
    }

    /// No declared port fires this cycle.
    pub fn is_idle(self) -> bool {
        self.0 == 0
    }
}

/// The pattern grammar. `Alt(vec![])` denotes the empty language (no trace
/// accepted at all) and is what makes a timeline unsatisfiable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Pattern {
    /// A single cycle with exactly this presence assignment.
    Cycle(CycleToken),
    Seq(Vec<Pattern>),
    Alt(Vec<Pattern>),
    Star(Box<Pattern>),
    Plus(Box<Pattern>),
    Opt(Box<Pattern>),
}

impl Pattern {
    pub fn cycle(token: CycleToken) -> Self {
        Pattern::Cycle(token)
    }
    pub fn seq(items: impl Into<Vec<Pattern>>) -> Self {
        Pattern::Seq(items.into())
    }
    pub fn alt(items: impl Into<Vec<Pattern>>) -> Self {
        Pattern::Alt(items.into())
    }
    pub fn star(inner: Pattern) -> Self {
        Pattern::Star(Box::new(inner))
    }
    pub fn plus(inner: Pattern) -> Self {
        Pattern::Plus(Box::new(inner))
    }
    pub fn opt(inner: Pattern) -> Self {
        Pattern::Opt(Box::new(inner))
    }
}

/// A streaming module's timeline declaration, attached to its graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineDecl {
    /// The ports the pattern ranges over; their index is the token bit.
    pub ports: Vec<PortId>,
    pub pattern: Pattern,
    /// The contiguous range of realized cycle-groups that repeats per
    /// streaming iteration (the timeline-step-delimited loop body).
    pub loop_groups: Range<usize>,
}
