//! The elaborated module graph handed to the verifier.
//!
//! Wraps the columnar [`SignalArena`] with the builder API upstream
//! elaboration drives, plus the graph algorithms the checker needs:
//! a feedback-aware topological order and the derivation of a streaming
//! body's realized cycle-groups.

use super::clocks::DomainId;
use super::node::{ModuleKey, Operator, Port, PortDirection, PortId, SignalKind, SignalMeta};
use super::storage::{SignalArena, SignalId};
use crate::rythm::Rythm;
use crate::timeline::{CycleToken, TimelineDecl};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModuleGraph {
    pub name: String,
    pub(crate) arena: SignalArena,
    pub ports: Vec<Port>,
    pub timeline: Option<TimelineDecl>,
    /// Current cycle-group during elaboration; timeline-step markers close it.
    group_cursor: u32,
}

impl ModuleGraph {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    // --- Builder API (driven by upstream elaboration) ---

    pub fn add_input(&mut self, name: &str, domain: DomainId) -> SignalId {
        let signal = self.add(SignalKind::Input { domain }, &[], name);
        self.ports.push(Port {
            name: name.to_string(),
            direction: PortDirection::Input,
            domain,
            signal,
        });
        signal
    }

    pub fn add_output(&mut self, name: &str, domain: DomainId, driver: SignalId) -> SignalId {
        let port = PortId::new(self.ports.len());
        let signal = self.add(SignalKind::Output { port }, &[driver], name);
        self.ports.push(Port {
            name: name.to_string(),
            direction: PortDirection::Output,
            domain,
            signal,
        });
        signal
    }

    pub fn add_op(&mut self, name: &str, op: Operator, operands: &[SignalId]) -> SignalId {
        self.add(SignalKind::Op(op), operands, name)
    }

    pub fn add_const(&mut self, name: &str) -> SignalId {
        self.add(SignalKind::Const, &[], name)
    }

    /// Inserts a pipeline-step register on `operand`.
    pub fn add_stage(&mut self, name: &str, operand: SignalId) -> SignalId {
        self.add(SignalKind::StageMarker, &[operand], name)
    }

    /// Closes the current cycle-group and threads `operand` through the
    /// timeline-step marker.
    pub fn step_timeline(&mut self, name: &str, operand: SignalId) -> SignalId {
        let signal = self.add(SignalKind::TimelineMarker, &[operand], name);
        self.group_cursor += 1;
        signal
    }

    pub fn add_delay_cast(
        &mut self,
        name: &str,
        operand: SignalId,
        domain: DomainId,
        delta: i64,
    ) -> SignalId {
        self.add(SignalKind::DelayCast { domain, delta }, &[operand], name)
    }

    pub fn add_state(&mut self, name: &str, domain: DomainId) -> SignalId {
        self.add(SignalKind::State { domain }, &[], name)
    }

    /// Declares that `driver` updates `state` at the invocation boundary.
    pub fn bind_feedback(&mut self, state: SignalId, driver: SignalId) {
        self.arena.add_feedback(state, driver);
    }

    pub fn add_crossing(
        &mut self,
        name: &str,
        operand: SignalId,
        to_domain: DomainId,
        declared: Option<Rythm>,
    ) -> SignalId {
        self.add(SignalKind::Crossing { to_domain, declared }, &[operand], name)
    }

    /// Instantiates `module`, binding `inputs` to its input ports in the
    /// callee's port order.
    pub fn add_instance(&mut self, name: &str, module: ModuleKey, inputs: &[SignalId]) -> SignalId {
        self.add(SignalKind::Instance { module }, inputs, name)
    }

    pub fn instance_output(&mut self, name: &str, instance: SignalId, port: PortId) -> SignalId {
        self.add(SignalKind::InstancePort { instance, port }, &[instance], name)
    }

    /// Re-points a signal's operands. Elaboration uses this to resolve
    /// forward references between wires, which is also how a combinational
    /// cycle can reach the checker.
    pub fn bind_operands(&mut self, signal: SignalId, operands: &[SignalId]) {
        self.arena.rebind_operands(signal, operands);
    }

    pub fn set_timeline(&mut self, decl: TimelineDecl) {
        self.timeline = Some(decl);
    }

    fn add(&mut self, kind: SignalKind, parents: &[SignalId], name: &str) -> SignalId {
        self.arena
            .add_signal(kind, parents, SignalMeta::named(name), self.group_cursor)
    }

    // --- Accessors ---

    pub fn signal_count(&self) -> usize {
        self.arena.count()
    }

    pub fn kind(&self, id: SignalId) -> &SignalKind {
        &self.arena.kinds[id.index()]
    }

    pub fn signal_name(&self, id: SignalId) -> &str {
        &self.arena.meta[id.index()].name
    }

    pub fn parents(&self, id: SignalId) -> &[SignalId] {
        self.arena.get_parents(id)
    }

    pub fn feedback_edges(&self) -> &[super::storage::FeedbackEdge] {
        &self.arena.feedback
    }

    pub fn input_ports(&self) -> impl Iterator<Item = (PortId, &Port)> {
        self.ports
            .iter()
            .enumerate()
            .map(|(i, p)| (PortId::new(i), p))
            .filter(|(_, p)| p.direction == PortDirection::Input)
    }

    /// Sub-instance signals and the modules they reference.
    pub fn instances(&self) -> impl Iterator<Item = (SignalId, ModuleKey)> + '_ {
        self.arena.ids().filter_map(|id| match self.kind(id) {
            SignalKind::Instance { module } => Some((id, *module)),
            _ => None,
        })
    }

    // --- Graph algorithms ---

    /// Topological order, producer before consumer. State signals have no
    /// combinational operands (their updates are feedback edges), so they
    /// are the only thing that legally breaks a loop; any cycle that remains
    /// is combinational and is returned as the offending signal.
    pub fn topo_order(&self) -> Result<Vec<SignalId>, SignalId> {
        let count = self.arena.count();
        let mut order = Vec::with_capacity(count);
        let mut state = vec![VisitState::None; count];

        for i in 0..count {
            if state[i] == VisitState::None {
                self.visit(SignalId::new(i), &mut state, &mut order)?;
            }
        }
        Ok(order)
    }

    fn visit(
        &self,
        node: SignalId,
        state: &mut Vec<VisitState>,
        order: &mut Vec<SignalId>,
    ) -> Result<(), SignalId> {
        match state[node.index()] {
            VisitState::Visited => return Ok(()),
            VisitState::Visiting => return Err(node),
            VisitState::None => state[node.index()] = VisitState::Visiting,
        }

        for &parent in self.arena.get_parents(node) {
            self.visit(parent, state, order)?;
        }

        state[node.index()] = VisitState::Visited;
        order.push(node);
        Ok(())
    }

    /// Derives the realized per-cycle-group port activity of a streaming
    /// body: a timeline port is present in the group where elaboration read
    /// it (inputs) or drove it (outputs).
    pub fn realized_groups(&self, decl: &TimelineDecl) -> Vec<CycleToken> {
        let group_count = self.group_cursor as usize + 1;
        let mut tokens = vec![CycleToken::empty(); group_count];

        for (bit, &port_id) in decl.ports.iter().enumerate() {
            let port = &self.ports[port_id.index()];
            match port.direction {
                PortDirection::Output => {
                    let g = self.arena.groups[port.signal.index()] as usize;
                    tokens[g] = tokens[g].with_bit(bit);
                }
                PortDirection::Input => {
                    for consumer in self.arena.ids() {
                        if self.arena.get_parents(consumer).contains(&port.signal) {
                            let g = self.arena.groups[consumer.index()] as usize;
                            tokens[g] = tokens[g].with_bit(bit);
                        }
                    }
                }
            }
        }
        tokens
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum VisitState {
    None,
    Visiting, // Used for cycle detection
    Visited,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dom() -> DomainId {
        DomainId::new(0)
    }

    #[test]
    fn topo_order_puts_producers_first() {
        // Shape: a -> x, b -> x, x -> out (diamond-ish fan-in)
        let mut m = ModuleGraph::new("m");
        let a = m.add_input("a", dom());
        let b = m.add_input("b", dom());
        let x = m.add_op("x", Operator::Add, &[a, b]);
        let out = m.add_output("out", dom(), x);

        let order = m.topo_order().expect("acyclic");
        let pos = |id: SignalId| order.iter().position(|&s| s == id).unwrap();
        assert!(pos(a) < pos(x));
        assert!(pos(b) < pos(x));
        assert!(pos(x) < pos(out));
    }

    #[test]
    fn forward_reference_cycle_is_detected() {
        let mut m = ModuleGraph::new("m");
        let a = m.add_input("a", dom());
        // wire is created with a placeholder operand, then rebound to close
        // a loop through y.
        let wire = m.add_op("wire", Operator::And, &[a]);
        let y = m.add_op("y", Operator::Not, &[wire]);
        m.bind_operands(wire, &[y]);

        assert!(m.topo_order().is_err());
    }

    #[test]
    fn state_feedback_does_not_form_a_cycle() {
        let mut m = ModuleGraph::new("m");
        let a = m.add_input("a", dom());
        let acc = m.add_state("acc", dom());
        let next = m.add_op("next", Operator::Add, &[acc, a]);
        m.bind_feedback(acc, next);

        assert!(m.topo_order().is_ok());
    }
}
