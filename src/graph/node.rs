//! The node schema of the elaborated module graph.
//!
//! Upstream elaboration has already resolved all compile-time generics; what
//! arrives here is a flat dataflow graph of signals. Each signal has one
//! producing kind, operand edges to its inputs, and metadata for reporting.

use super::clocks::DomainId;
use super::storage::SignalId;
use crate::rythm::Rythm;
use serde::{Deserialize, Serialize};

/// A unique, stable identifier for a module within a design.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct ModuleKey(pub u32);

impl ModuleKey {
    #[inline(always)]
    pub fn index(&self) -> usize {
        self.0 as usize
    }
    pub fn new(idx: usize) -> Self {
        Self(idx as u32)
    }
}

/// Index into a module's port table.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct PortId(pub u32);

impl PortId {
    #[inline(always)]
    pub fn index(&self) -> usize {
        self.0 as usize
    }
    pub fn new(idx: usize) -> Self {
        Self(idx as u32)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PortDirection {
    Input,
    Output,
}

/// One externally visible port of a module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Port {
    pub name: String,
    pub direction: PortDirection,
    pub domain: DomainId,
    /// The `Input` or `Output` signal node realizing this port.
    pub signal: SignalId,
}

/// Pure combinational operators. All of these preserve time coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    And,
    Or,
    Xor,
    Not,
    Add,
    Subtract,
    Multiply,
    Mux,
    Concat,
    Slice,
}

/// The producing kind of one signal node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SignalKind {
    /// Module input port; enters at stage 0 of its declared domain.
    Input { domain: DomainId },
    /// Module output port; adopts its operand's coordinate, which becomes
    /// the port's stage in the module contract.
    Output { port: PortId },
    /// Combinational logic over its operands.
    Op(Operator),
    /// Compile-time constant; compatible with any coordinate.
    Const,
    /// Pipeline-step marker: a register, advancing stage by exactly 1.
    StageMarker,
    /// Timeline-step marker: coordinate-preserving pass-through that closes
    /// the current cycle-group of a streaming body.
    TimelineMarker,
    /// Explicit delay assertion; `delta` must be strictly positive.
    DelayCast { domain: DomainId, delta: i64 },
    /// Latched state: definitionally at stage 0 of the current invocation.
    /// Its update edges are feedback edges, declared separately.
    State { domain: DomainId },
    /// Clock-domain crossing into `to_domain`, optionally carrying a
    /// user-declared rythm to check against the derived one.
    Crossing {
        to_domain: DomainId,
        declared: Option<Rythm>,
    },
    /// Sub-instance of another module; operands are the signals bound to the
    /// callee's input ports, in the callee's port order.
    Instance { module: ModuleKey },
    /// One output port of a sub-instance.
    InstancePort { instance: SignalId, port: PortId },
}

/// Reporting metadata carried by every signal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalMeta {
    pub name: String,
}

impl SignalMeta {
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}
