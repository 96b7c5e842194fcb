//! The slice checker: assigns a time coordinate to every signal of one
//! module graph and rejects illegal cross-time combinations.
//!
//! Signals are processed in topological order, producer before consumer.
//! Mismatches are collected rather than fail-fast, capped per consuming
//! signal so one bad producer cannot flood the report. Only a combinational
//! cycle aborts the pass for the module: no coordinate assignment exists at
//! all, so no annotated graph is produced.

use crate::graph::{
    ClockTable, DomainId, ModuleGraph, ModuleKey, PortDirection, SignalId, SignalKind,
};
use crate::rythm::{self, Direction, RythmCache, RythmError};
use crate::time::{self, SliceError, TimeCoordinate};
use crate::timeline;
use crate::verify::{
    CheckedModule, ContractStore, CrossingContract, Diagnostic, DiagnosticKind, ModuleContract,
    PortContract,
};
use std::collections::HashMap;

/// Mismatch diagnostics kept per consuming signal before further offenders
/// of the same signal are dropped (one root cause upstream would otherwise
/// explode into one report per operand pair).
const MAX_MISMATCHES_PER_SIGNAL: u8 = 4;

/// A signal's position while the pass runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    /// Not yet computed (only observable for feedback drivers mid-pass).
    Pending,
    /// Compile-time constant territory: compatible with any coordinate.
    Free,
    Fixed(TimeCoordinate),
    /// Could not be resolved; propagated silently to avoid cascading noise.
    Unknown,
}

pub struct SliceChecker<'a> {
    module: ModuleKey,
    graph: &'a ModuleGraph,
    clocks: &'a ClockTable,
    contracts: &'a ContractStore,
    rythms: &'a RythmCache,
    slots: Vec<Slot>,
    mismatch_counts: Vec<u8>,
    diagnostics: Vec<Diagnostic>,
    crossings: Vec<CrossingContract>,
    /// Per instance signal, the caller-side entry stage of each callee domain.
    instance_entries: HashMap<SignalId, HashMap<DomainId, i64>>,
}

impl<'a> SliceChecker<'a> {
    pub fn new(
        module: ModuleKey,
        graph: &'a ModuleGraph,
        clocks: &'a ClockTable,
        contracts: &'a ContractStore,
        rythms: &'a RythmCache,
    ) -> Self {
        let count = graph.signal_count();
        Self {
            module,
            graph,
            clocks,
            contracts,
            rythms,
            slots: vec![Slot::Pending; count],
            mismatch_counts: vec![0; count],
            diagnostics: Vec::new(),
            crossings: Vec::new(),
            instance_entries: HashMap::new(),
        }
    }

    /// Runs the full pass. `Ok` carries the annotated graph; `Err` the
    /// collected diagnostics, all of which block code generation.
    pub fn check(mut self) -> Result<CheckedModule, Vec<Diagnostic>> {
        // Definitional timeline errors surface regardless of the body.
        let compiled_timeline = match &self.graph.timeline {
            None => None,
            Some(decl) => match timeline::compile(&decl.pattern) {
                Ok(compiled) => Some(compiled),
                Err(err) => {
                    self.push_module_diag(DiagnosticKind::UnsatisfiableTimeline, err.to_string());
                    None
                }
            },
        };

        let order = match self.graph.topo_order() {
            Ok(order) => order,
            Err(offender) => {
                self.push_diag(
                    offender,
                    DiagnosticKind::CombinationalCycle,
                    format!(
                        "signal '{}' sits on a feedback cycle with no state break",
                        self.graph.signal_name(offender)
                    ),
                );
                return Err(self.diagnostics);
            }
        };

        for id in order {
            self.slots[id.index()] = self.assign(id);
        }
        self.check_feedback_domains();

        if let (Some(compiled), Some(decl)) = (compiled_timeline, &self.graph.timeline) {
            let groups = self.graph.realized_groups(decl);
            if let Err(err) = compiled.validate_realized(&groups, decl.loop_groups.clone()) {
                self.push_module_diag(DiagnosticKind::TimelineMismatch, err.to_string());
            }
        }

        if self.diagnostics.is_empty() {
            Ok(self.into_checked())
        } else {
            Err(self.diagnostics)
        }
    }

    fn assign(&mut self, id: SignalId) -> Slot {
        match self.graph.kind(id).clone() {
            SignalKind::Input { domain } => Slot::Fixed(TimeCoordinate::entry(domain)),
            SignalKind::Const => Slot::Free,
            // Reading latched state is definitionally the invocation
            // boundary: stage 0 of the current invocation, never a mismatch.
            SignalKind::State { domain } => Slot::Fixed(TimeCoordinate::entry(domain)),
            SignalKind::Op(_) => self.combine_operands(id),
            SignalKind::TimelineMarker => self.operand_slot(id),
            SignalKind::StageMarker => match self.operand_slot(id) {
                Slot::Fixed(c) => Slot::Fixed(c.advanced()),
                other => other,
            },
            SignalKind::Output { port } => self.assign_output(id, port.index()),
            SignalKind::DelayCast { domain, delta } => self.assign_delay_cast(id, domain, delta),
            SignalKind::Crossing { to_domain, declared } => {
                self.assign_crossing(id, to_domain, declared.as_ref())
            }
            SignalKind::Instance { module } => self.assign_instance(id, module),
            SignalKind::InstancePort { instance, port } => {
                self.assign_instance_port(instance, port.index())
            }
        }
    }

    /// Folds `combine` over the operands of a combinational node, reporting
    /// every offending pair up to the per-signal cap. The first resolvable
    /// coordinate is kept so checking continues past a mismatch.
    fn combine_operands(&mut self, id: SignalId) -> Slot {
        let mut acc: Option<(TimeCoordinate, SignalId)> = None;
        let mut poisoned = false;

        for &operand in self.graph.parents(id) {
            match self.slots[operand.index()] {
                Slot::Pending | Slot::Unknown => poisoned = true,
                Slot::Free => {}
                Slot::Fixed(c) => match acc {
                    None => acc = Some((c, operand)),
                    Some((prev, prev_sig)) => {
                        if let Err(err) = time::combine(prev, c) {
                            self.push_mismatch(id, prev_sig, operand, err);
                        }
                    }
                },
            }
        }

        if poisoned {
            Slot::Unknown
        } else {
            match acc {
                Some((c, _)) => Slot::Fixed(c),
                None => Slot::Free,
            }
        }
    }

    fn assign_output(&mut self, id: SignalId, port_idx: usize) -> Slot {
        let slot = self.operand_slot(id);
        let port_domain = self.graph.ports[port_idx].domain;
        if let Slot::Fixed(c) = slot {
            if c.domain != port_domain {
                self.push_diag(
                    id,
                    DiagnosticKind::TimeSliceMismatch,
                    format!(
                        "output port '{}' is declared in domain '{}' but is driven from {}",
                        self.graph.ports[port_idx].name,
                        self.clocks.domain_name(port_domain),
                        self.fmt_coord(c),
                    ),
                );
            }
        }
        slot
    }

    fn assign_delay_cast(&mut self, id: SignalId, domain: DomainId, delta: i64) -> Slot {
        // delta <= 0 is illegal no matter what feeds the cast.
        if delta <= 0 {
            self.push_diag(
                id,
                DiagnosticKind::NegativeOrZeroDelayCast,
                SliceError::NegativeOrZeroDelayCast { delta }.to_string(),
            );
            return Slot::Unknown;
        }
        match self.operand_slot(id) {
            Slot::Fixed(c) => match time::delay_cast(c, domain, delta) {
                Ok(out) => Slot::Fixed(out),
                Err(_) => unreachable!("positive delta checked above"),
            },
            other => other,
        }
    }

    fn assign_crossing(
        &mut self,
        id: SignalId,
        to_domain: DomainId,
        declared: Option<&rythm::Rythm>,
    ) -> Slot {
        let from = match self.operand_slot(id) {
            Slot::Fixed(c) => c.domain,
            Slot::Free => return Slot::Free, // constants need no crossing
            _ => return Slot::Unknown,
        };

        let Some((ratio, from_is_fast)) = self.clocks.oriented_ratio(from, to_domain) else {
            self.push_diag(
                id,
                DiagnosticKind::UnresolvedDependency,
                format!(
                    "no declared ratio chain relates domain '{}' to domain '{}'",
                    self.clocks.domain_name(from),
                    self.clocks.domain_name(to_domain),
                ),
            );
            return Slot::Unknown;
        };
        let direction = if from_is_fast {
            Direction::FastToSlow
        } else {
            Direction::SlowToFast
        };

        let derived = self.rythms.get_or_derive(ratio, direction);
        if let Some(declared) = declared {
            if let Err(RythmError::RythmMismatch { index }) =
                rythm::check_compatible(declared, &derived)
            {
                self.push_diag(
                    id,
                    DiagnosticKind::RythmMismatch,
                    format!(
                        "declared rythm for '{}' differs from the {}:{} {:?} rythm at cycle {}",
                        self.graph.signal_name(id),
                        ratio.p,
                        ratio.q,
                        direction,
                        index,
                    ),
                );
            }
        }
        self.crossings.push(CrossingContract {
            signal: id,
            from,
            to: to_domain,
            direction,
            rythm: (*derived).clone(),
        });

        // A crossing enters a fresh pipeline in the target domain.
        Slot::Fixed(TimeCoordinate::entry(to_domain))
    }

    /// Checks the instance's bound inputs against the callee's stage-0
    /// expectation: per callee domain, every binding must arrive at one
    /// shared coordinate, which becomes the instance's entry offset there.
    fn assign_instance(&mut self, id: SignalId, module: ModuleKey) -> Slot {
        let Some(contract) = self.contracts.get(module) else {
            self.push_diag(
                id,
                DiagnosticKind::UnresolvedDependency,
                format!(
                    "sub-instance '{}' requires module {} whose contract is not finalized",
                    self.graph.signal_name(id),
                    module.index(),
                ),
            );
            return Slot::Unknown;
        };

        let callee_inputs: Vec<_> = contract
            .ports
            .iter()
            .filter(|p| p.direction == PortDirection::Input)
            .cloned()
            .collect();

        let mut entries: HashMap<DomainId, (TimeCoordinate, SignalId)> = HashMap::new();
        let bindings: Vec<SignalId> = self.graph.parents(id).to_vec();
        for (bound, port) in bindings.iter().zip(callee_inputs.iter()) {
            let Slot::Fixed(c) = self.slots[bound.index()] else {
                continue;
            };
            if c.domain != port.domain {
                self.push_diag(
                    id,
                    DiagnosticKind::TimeSliceMismatch,
                    format!(
                        "instance input '{}' expects domain '{}' but '{}' arrives at {}",
                        port.name,
                        self.clocks.domain_name(port.domain),
                        self.graph.signal_name(*bound),
                        self.fmt_coord(c),
                    ),
                );
                continue;
            }
            match entries.get(&c.domain) {
                None => {
                    entries.insert(c.domain, (c, *bound));
                }
                Some(&(prev, prev_sig)) => {
                    if let Err(err) = time::combine(prev, c) {
                        self.push_mismatch(id, prev_sig, *bound, err);
                    }
                }
            }
        }

        self.instance_entries.insert(
            id,
            entries.into_iter().map(|(d, (c, _))| (d, c.stage)).collect(),
        );
        // The instance node itself carries no data.
        Slot::Free
    }

    fn assign_instance_port(&mut self, instance: SignalId, port_idx: usize) -> Slot {
        let SignalKind::Instance { module } = self.graph.kind(instance) else {
            return Slot::Unknown;
        };
        let Some(contract) = self.contracts.get(*module) else {
            return Slot::Unknown; // already diagnosed on the instance node
        };
        let port = &contract.ports[port_idx];
        let Some(stage) = port.stage else {
            return Slot::Free;
        };
        let entry = self
            .instance_entries
            .get(&instance)
            .and_then(|m| m.get(&port.domain))
            .copied()
            .unwrap_or(0);
        Slot::Fixed(TimeCoordinate::new(port.domain, entry + stage))
    }

    /// A state update must stay inside the state's own domain; the stage is
    /// free by definition (the write lands at the next invocation boundary).
    fn check_feedback_domains(&mut self) {
        for edge in self.graph.feedback_edges().to_vec() {
            let SignalKind::State { domain } = *self.graph.kind(edge.state) else {
                continue;
            };
            if let Slot::Fixed(c) = self.slots[edge.driver.index()] {
                if c.domain != domain {
                    self.push_diag(
                        edge.state,
                        DiagnosticKind::TimeSliceMismatch,
                        format!(
                            "state '{}' in domain '{}' is updated from {}",
                            self.graph.signal_name(edge.state),
                            self.clocks.domain_name(domain),
                            self.fmt_coord(c),
                        ),
                    );
                }
            }
        }
    }

    fn into_checked(self) -> CheckedModule {
        let coordinates: Vec<Option<TimeCoordinate>> = self
            .slots
            .iter()
            .map(|slot| match slot {
                Slot::Fixed(c) => Some(*c),
                _ => None,
            })
            .collect();

        let ports = self
            .graph
            .ports
            .iter()
            .map(|port| PortContract {
                name: port.name.clone(),
                direction: port.direction,
                domain: port.domain,
                stage: coordinates[port.signal.index()].map(|c| c.stage),
            })
            .collect();

        CheckedModule {
            contract: ModuleContract {
                key: self.module,
                name: self.graph.name.clone(),
                ports,
                timeline_ok: true,
            },
            coordinates,
            crossings: self.crossings,
        }
    }

    // --- helpers ---

    fn operand_slot(&self, id: SignalId) -> Slot {
        match self.graph.parents(id).first() {
            Some(&operand) => self.slots[operand.index()],
            None => Slot::Unknown,
        }
    }

    fn fmt_coord(&self, c: TimeCoordinate) -> String {
        format!(
            "({}, stage {})",
            self.clocks.domain_name(c.domain),
            c.stage
        )
    }

    fn push_mismatch(
        &mut self,
        consumer: SignalId,
        left_sig: SignalId,
        right_sig: SignalId,
        err: SliceError,
    ) {
        let count = &mut self.mismatch_counts[consumer.index()];
        if *count >= MAX_MISMATCHES_PER_SIGNAL {
            return;
        }
        *count += 1;

        let SliceError::TimeSliceMismatch { left, right } = err else {
            return;
        };
        let message = format!(
            "cannot combine '{}' at {} with '{}' at {}: operands must share one time slice",
            self.graph.signal_name(left_sig),
            self.fmt_coord(left),
            self.graph.signal_name(right_sig),
            self.fmt_coord(right),
        );
        self.diagnostics.push(Diagnostic::at_signal(
            self.module,
            consumer,
            DiagnosticKind::TimeSliceMismatch,
            message,
        ));
    }

    fn push_diag(&mut self, signal: SignalId, kind: DiagnosticKind, message: String) {
        self.diagnostics
            .push(Diagnostic::at_signal(self.module, signal, kind, message));
    }

    fn push_module_diag(&mut self, kind: DiagnosticKind, message: String) {
        self.diagnostics
            .push(Diagnostic::module_level(self.module, kind, message));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Operator, PortId};
    use crate::timeline::{CycleToken, Pattern, TimelineDecl};

    struct Fixture {
        clocks: ClockTable,
        clk: DomainId,
        contracts: ContractStore,
        rythms: RythmCache,
    }

    impl Fixture {
        fn new() -> Self {
            let mut clocks = ClockTable::new();
            let clk = clocks.add_domain("clk");
            Self {
                clocks,
                clk,
                contracts: ContractStore::default(),
                rythms: RythmCache::new(),
            }
        }

        fn check(&self, graph: &ModuleGraph) -> Result<CheckedModule, Vec<Diagnostic>> {
            SliceChecker::new(
                ModuleKey::new(0),
                graph,
                &self.clocks,
                &self.contracts,
                &self.rythms,
            )
            .check()
        }
    }

    #[test]
    fn combinational_logic_preserves_coordinates() {
        let fx = Fixture::new();
        let mut m = ModuleGraph::new("adder");
        let a = m.add_input("a", fx.clk);
        let b = m.add_input("b", fx.clk);
        let sum = m.add_op("sum", Operator::Add, &[a, b]);
        let out = m.add_output("out", fx.clk, sum);

        let checked = fx.check(&m).expect("clean module");
        let at = |id: SignalId| checked.coordinates[id.index()].unwrap();
        assert_eq!(at(sum), TimeCoordinate::entry(fx.clk));
        assert_eq!(at(out).stage, 0);
        assert_eq!(checked.contract.ports[2].stage, Some(0));
    }

    #[test]
    fn stage_markers_advance_every_crossing_signal_by_one() {
        let fx = Fixture::new();
        let mut m = ModuleGraph::new("pipe");
        let a = m.add_input("a", fx.clk);
        let r1 = m.add_stage("r1", a);
        let r2 = m.add_stage("r2", r1);
        m.add_output("out", fx.clk, r2);

        let checked = fx.check(&m).expect("clean module");
        assert_eq!(checked.coordinates[r1.index()].unwrap().stage, 1);
        assert_eq!(checked.coordinates[r2.index()].unwrap().stage, 2);
        assert_eq!(checked.contract.ports[1].stage, Some(2));
    }

    #[test]
    fn combining_stage_2_with_stage_3_names_both() {
        let fx = Fixture::new();
        let mut m = ModuleGraph::new("skew");
        let a = m.add_input("a", fx.clk);
        let s1 = m.add_stage("s1", a);
        let s2 = m.add_stage("s2", s1);
        let s3 = m.add_stage("s3", s2);
        // s2 is at stage 2, s3 at stage 3: combining them must fail.
        let bad = m.add_op("bad", Operator::Xor, &[s2, s3]);
        m.add_output("out", fx.clk, bad);

        let diags = fx.check(&m).unwrap_err();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].kind, DiagnosticKind::TimeSliceMismatch);
        assert_eq!(diags[0].signal, Some(bad));
        assert!(diags[0].message.contains("stage 2"), "{}", diags[0].message);
        assert!(diags[0].message.contains("stage 3"), "{}", diags[0].message);
    }

    #[test]
    fn delay_cast_repairs_a_skewed_combination() {
        let fx = Fixture::new();
        let mut m = ModuleGraph::new("repaired");
        let a = m.add_input("a", fx.clk);
        let s1 = m.add_stage("s1", a);
        let cast = m.add_delay_cast("cast", a, fx.clk, 1);
        let ok = m.add_op("ok", Operator::And, &[s1, cast]);
        m.add_output("out", fx.clk, ok);

        let checked = fx.check(&m).expect("cast aligns the slices");
        assert_eq!(checked.coordinates[ok.index()].unwrap().stage, 1);
    }

    #[test]
    fn zero_and_negative_delay_casts_are_rejected() {
        let fx = Fixture::new();
        for delta in [0i64, -2] {
            let mut m = ModuleGraph::new("bad_cast");
            let a = m.add_input("a", fx.clk);
            let cast = m.add_delay_cast("cast", a, fx.clk, delta);
            m.add_output("out", fx.clk, cast);

            let diags = fx.check(&m).unwrap_err();
            assert_eq!(diags[0].kind, DiagnosticKind::NegativeOrZeroDelayCast);
        }
    }

    #[test]
    fn constants_unify_with_any_coordinate() {
        let fx = Fixture::new();
        let mut m = ModuleGraph::new("const_mix");
        let a = m.add_input("a", fx.clk);
        let s1 = m.add_stage("s1", a);
        let k = m.add_const("k");
        let scaled = m.add_op("scaled", Operator::Multiply, &[s1, k]);
        m.add_output("out", fx.clk, scaled);

        let checked = fx.check(&m).expect("constant operand is free");
        assert_eq!(checked.coordinates[scaled.index()].unwrap().stage, 1);
        assert_eq!(checked.coordinates[k.index()], None);
    }

    #[test]
    fn feedback_without_state_is_combinational_cycle() {
        let fx = Fixture::new();
        let mut m = ModuleGraph::new("looped");
        let a = m.add_input("a", fx.clk);
        let wire = m.add_op("wire", Operator::Or, &[a]);
        let back = m.add_op("back", Operator::And, &[wire]);
        m.bind_operands(wire, &[a, back]);
        m.add_output("out", fx.clk, back);

        let diags = fx.check(&m).unwrap_err();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].kind, DiagnosticKind::CombinationalCycle);
    }

    #[test]
    fn state_reads_are_stage_zero_and_never_mismatch() {
        let fx = Fixture::new();
        let mut m = ModuleGraph::new("accumulator");
        let a = m.add_input("a", fx.clk);
        let acc = m.add_state("acc", fx.clk);
        let next = m.add_op("next", Operator::Add, &[acc, a]);
        m.bind_feedback(acc, next);
        m.add_output("out", fx.clk, next);

        let checked = fx.check(&m).expect("state breaks the loop");
        assert_eq!(
            checked.coordinates[acc.index()],
            Some(TimeCoordinate::entry(fx.clk))
        );
    }

    #[test]
    fn crossing_derives_rythm_and_reenters_at_stage_zero() {
        let mut fx = Fixture::new();
        let slow = fx.clocks.add_domain("clk_slow");
        fx.clocks.declare_ratio(fx.clk, slow, 2, 1);

        let mut m = ModuleGraph::new("cdc");
        let a = m.add_input("a", slow);
        let fastened = m.add_crossing("fastened", a, fx.clk, None);
        m.add_output("out", fx.clk, fastened);

        let checked = fx.check(&m).expect("related domains");
        assert_eq!(
            checked.coordinates[fastened.index()],
            Some(TimeCoordinate::entry(fx.clk))
        );
        assert_eq!(checked.crossings.len(), 1);
        let crossing = &checked.crossings[0];
        assert_eq!(crossing.direction, Direction::SlowToFast);
        assert_eq!(crossing.rythm.fast, vec![true, false]);
    }

    #[test]
    fn declared_rythm_is_checked_against_derived() {
        let mut fx = Fixture::new();
        let slow = fx.clocks.add_domain("clk_slow");
        fx.clocks.declare_ratio(fx.clk, slow, 2, 1);

        let mut wrong = rythm::derive(rythm::Ratio::new(2, 1), Direction::SlowToFast);
        wrong.fast = vec![false, true]; // sampling edge shifted by one

        let mut m = ModuleGraph::new("cdc_declared");
        let a = m.add_input("a", slow);
        let crossed = m.add_crossing("crossed", a, fx.clk, Some(wrong));
        m.add_output("out", fx.clk, crossed);

        let diags = fx.check(&m).unwrap_err();
        assert_eq!(diags[0].kind, DiagnosticKind::RythmMismatch);
        assert!(diags[0].message.contains("cycle 0"), "{}", diags[0].message);
    }

    #[test]
    fn unrelated_domains_cannot_cross() {
        let mut fx = Fixture::new();
        let orphan = fx.clocks.add_domain("orphan");

        let mut m = ModuleGraph::new("no_relation");
        let a = m.add_input("a", orphan);
        let crossed = m.add_crossing("crossed", a, fx.clk, None);
        m.add_output("out", fx.clk, crossed);

        let diags = fx.check(&m).unwrap_err();
        assert_eq!(diags[0].kind, DiagnosticKind::UnresolvedDependency);
    }

    #[test]
    fn unsatisfiable_timeline_reported_without_instantiation() {
        let fx = Fixture::new();
        let mut m = ModuleGraph::new("never");
        let a = m.add_input("a", fx.clk);
        m.add_output("out", fx.clk, a);
        m.set_timeline(TimelineDecl {
            ports: vec![PortId::new(0), PortId::new(1)],
            pattern: Pattern::alt(Vec::new()),
            loop_groups: 0..0,
        });

        let diags = fx.check(&m).unwrap_err();
        assert_eq!(diags[0].kind, DiagnosticKind::UnsatisfiableTimeline);
        assert_eq!(diags[0].signal, None);
    }

    #[test]
    fn blur_shaped_module_conforms_to_its_timeline() {
        // Streaming body: group 0 reads `a` only (no result yet); the
        // looping group reads `a` and drives `r`.
        let fx = Fixture::new();
        let mut m = ModuleGraph::new("blur2");
        let a = m.add_input("a", fx.clk);
        let held = m.add_state("held", fx.clk);
        let warm = m.add_op("warmup", Operator::Or, &[a]);
        let marker = m.step_timeline("iter", warm);
        let sum = m.add_op("sum", Operator::Add, &[a, held]);
        m.bind_feedback(held, a);
        let blended = m.add_op("blended", Operator::And, &[sum, marker]);
        m.add_output("r", fx.clk, blended);

        m.set_timeline(TimelineDecl {
            ports: vec![PortId::new(0), PortId::new(1)],
            pattern: Pattern::seq(vec![
                Pattern::cycle(CycleToken::empty().with_bit(0)),
                Pattern::star(
                    Pattern::cycle(CycleToken::empty().with_bit(0).with_bit(1)),
                ),
            ]),
            loop_groups: 1..2,
        });

        assert!(fx.check(&m).is_ok());
    }

    #[test]
    fn realized_trace_outside_declaration_is_timeline_mismatch() {
        // Declared: result only in the loop. Realized: result driven in the
        // prologue group, before any input cycle elapsed.
        let fx = Fixture::new();
        let mut m = ModuleGraph::new("eager");
        let a = m.add_input("a", fx.clk);
        m.add_output("r", fx.clk, a);
        m.set_timeline(TimelineDecl {
            ports: vec![PortId::new(0), PortId::new(1)],
            pattern: Pattern::seq(vec![
                Pattern::cycle(CycleToken::empty().with_bit(0)),
                Pattern::star(
                    Pattern::cycle(CycleToken::empty().with_bit(0).with_bit(1)),
                ),
            ]),
            loop_groups: 1..1,
        });

        let diags = fx.check(&m).unwrap_err();
        assert_eq!(diags[0].kind, DiagnosticKind::TimelineMismatch);
    }

    #[test]
    fn mismatch_diagnostics_are_capped_per_signal() {
        let fx = Fixture::new();
        let mut m = ModuleGraph::new("noisy");
        let a = m.add_input("a", fx.clk);
        let mut skewed = Vec::new();
        let mut prev = a;
        for i in 0..8 {
            prev = m.add_stage(&format!("s{i}"), prev);
            skewed.push(prev);
        }
        let mut operands = vec![a];
        operands.extend(&skewed);
        let bad = m.add_op("bad", Operator::Concat, &operands);
        m.add_output("out", fx.clk, bad);

        let diags = fx.check(&m).unwrap_err();
        let for_bad = diags.iter().filter(|d| d.signal == Some(bad)).count();
        assert_eq!(for_bad, MAX_MISMATCHES_PER_SIGNAL as usize);
    }
}
