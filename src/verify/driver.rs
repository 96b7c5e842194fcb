//! The verification driver: schedules module checks bottom-up over the
//! instantiation DAG and aggregates every diagnostic into one report.
//!
//! A module is checked only once all of its sub-instances carry finalized,
//! immutable contracts. Modules whose dependencies are all ready form a
//! wave and are verified concurrently; nothing a check reads is mutated
//! while a wave runs (contracts are inserted between waves, the rythm cache
//! tolerates concurrent first computation).

use super::report::{
    CheckedModule, ContractStore, Diagnostic, DiagnosticKind, VerificationReport,
};
use crate::graph::{ClockTable, ModuleGraph, ModuleKey};
use crate::rythm::RythmCache;
use crate::slice::SliceChecker;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction as EdgeDirection;
use rayon::prelude::*;

/// A whole elaborated design: the clock table plus every module graph,
/// addressable by [`ModuleKey`].
#[derive(Debug, Clone, Default)]
pub struct Design {
    pub clocks: ClockTable,
    modules: Vec<ModuleGraph>,
}

impl Design {
    pub fn new(clocks: ClockTable) -> Self {
        Self {
            clocks,
            modules: Vec::new(),
        }
    }

    pub fn add_module(&mut self, graph: ModuleGraph) -> ModuleKey {
        let key = ModuleKey::new(self.modules.len());
        self.modules.push(graph);
        key
    }

    pub fn module(&self, key: ModuleKey) -> &ModuleGraph {
        &self.modules[key.index()]
    }

    pub fn module_count(&self) -> usize {
        self.modules.len()
    }
}

enum Outcome {
    Checked(Box<CheckedModule>),
    Failed(Vec<Diagnostic>),
    Skipped(Vec<Diagnostic>),
}

/// Verifies every module of the design, bottom-up, concurrently where the
/// instantiation DAG allows. One failure never aborts the pass: unrelated
/// modules continue, dependents are recorded as skipped.
pub fn verify(design: &Design) -> VerificationReport {
    let count = design.module_count();
    let rythms = RythmCache::new();

    // Instantiation DAG, edges callee -> caller so dependencies come first.
    let mut dag: DiGraph<ModuleKey, ()> = DiGraph::with_capacity(count, count);
    let nodes: Vec<NodeIndex> = (0..count)
        .map(|i| dag.add_node(ModuleKey::new(i)))
        .collect();
    for (caller_idx, node) in nodes.iter().enumerate() {
        for (_, callee) in design.modules[caller_idx].instances() {
            dag.add_edge(nodes[callee.index()], *node, ());
        }
    }

    let mut indegree: Vec<usize> = nodes
        .iter()
        .map(|&ix| dag.neighbors_directed(ix, EdgeDirection::Incoming).count())
        .collect();
    let mut ready: Vec<NodeIndex> = nodes
        .iter()
        .copied()
        .filter(|&ix| indegree[ix.index()] == 0)
        .collect();
    let mut processed = vec![false; count];

    let mut store = ContractStore::with_capacity(count);
    let mut checked: Vec<Option<CheckedModule>> = vec![None; count];
    let mut diagnostics: Vec<Diagnostic> = Vec::new();
    let mut skipped: Vec<ModuleKey> = Vec::new();

    while !ready.is_empty() {
        let wave = std::mem::take(&mut ready);

        let outcomes: Vec<(ModuleKey, Outcome)> = wave
            .par_iter()
            .map(|&ix| {
                let key = dag[ix];
                let graph = design.module(key);
                (key, verify_one(key, graph, design, &store, &rythms))
            })
            .collect();

        for (key, outcome) in outcomes {
            match outcome {
                Outcome::Checked(module) => {
                    store.insert(module.contract.clone());
                    checked[key.index()] = Some(*module);
                }
                Outcome::Failed(diags) => diagnostics.extend(diags),
                Outcome::Skipped(diags) => {
                    diagnostics.extend(diags);
                    skipped.push(key);
                }
            }
        }

        for &ix in &wave {
            processed[ix.index()] = true;
            for succ in dag.neighbors_directed(ix, EdgeDirection::Outgoing) {
                indegree[succ.index()] -= 1;
                if indegree[succ.index()] == 0 {
                    ready.push(succ);
                }
            }
        }
    }

    // Whatever never became ready sits on an instantiation cycle, or behind
    // one. Name the actual cycle members distinctly.
    if processed.iter().any(|&p| !p) {
        let mut recursive = vec![false; count];
        for scc in tarjan_scc(&dag) {
            let looped = scc.len() > 1
                || (scc.len() == 1 && dag.contains_edge(scc[0], scc[0]));
            if looped {
                for ix in scc {
                    recursive[ix.index()] = true;
                }
            }
        }
        for (i, &done) in processed.iter().enumerate() {
            if done {
                continue;
            }
            let key = ModuleKey::new(i);
            let message = if recursive[i] {
                format!("module '{}' instantiates itself, directly or transitively", design.modules[i].name)
            } else {
                format!("module '{}' depends on a recursive instantiation", design.modules[i].name)
            };
            diagnostics.push(Diagnostic::module_level(
                key,
                DiagnosticKind::UnresolvedDependency,
                message,
            ));
            skipped.push(key);
        }
    }

    diagnostics.sort_by(|a, b| {
        (a.module, a.signal, a.kind, &a.message).cmp(&(b.module, b.signal, b.kind, &b.message))
    });
    skipped.sort();

    VerificationReport {
        checked,
        diagnostics,
        skipped,
    }
}

fn verify_one(
    key: ModuleKey,
    graph: &ModuleGraph,
    design: &Design,
    store: &ContractStore,
    rythms: &RythmCache,
) -> Outcome {
    // A dependency whose contract never materialized (it failed, or was
    // itself skipped) makes this module uncheckable, not failed.
    let unmet: Vec<Diagnostic> = graph
        .instances()
        .filter(|(_, callee)| store.get(*callee).is_none())
        .map(|(signal, callee)| {
            Diagnostic::at_signal(
                key,
                signal,
                DiagnosticKind::UnresolvedDependency,
                format!(
                    "sub-instance '{}' requires module '{}' which was not verified",
                    graph.signal_name(signal),
                    design.modules[callee.index()].name,
                ),
            )
        })
        .collect();
    if !unmet.is_empty() {
        return Outcome::Skipped(unmet);
    }

    match SliceChecker::new(key, graph, &design.clocks, store, rythms).check() {
        Ok(module) => Outcome::Checked(Box::new(module)),
        Err(diags) => Outcome::Failed(diags),
    }
}
