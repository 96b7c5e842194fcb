//! Structured verification outputs: diagnostics, per-module contracts and
//! the aggregate report handed to downstream code generation.

use crate::graph::{DomainId, ModuleKey, PortDirection, SignalId};
use crate::rythm::{Direction, Rythm};
use crate::time::TimeCoordinate;
use serde::{Deserialize, Serialize};

/// The category of a diagnostic. Every kind is fatal at "this module cannot
/// reach code generation" granularity.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum DiagnosticKind {
    TimeSliceMismatch,
    NegativeOrZeroDelayCast,
    CombinationalCycle,
    UnsatisfiableTimeline,
    TimelineMismatch,
    RythmMismatch,
    UnresolvedDependency,
}

/// A structured report from the verifier. Rendering beyond the `message`
/// field is the caller's responsibility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub module: ModuleKey,
    /// The offending signal, when one can be named; `None` for module-level
    /// findings such as an unsatisfiable timeline.
    pub signal: Option<SignalId>,
    pub kind: DiagnosticKind,
    pub message: String,
}

impl Diagnostic {
    pub fn module_level(module: ModuleKey, kind: DiagnosticKind, message: String) -> Self {
        Self {
            module,
            signal: None,
            kind,
            message,
        }
    }

    pub fn at_signal(
        module: ModuleKey,
        signal: SignalId,
        kind: DiagnosticKind,
        message: String,
    ) -> Self {
        Self {
            module,
            signal: Some(signal),
            kind,
            message,
        }
    }
}

/// One port of a verified module, as seen by callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortContract {
    pub name: String,
    pub direction: PortDirection,
    pub domain: DomainId,
    /// The port's resolved stage relative to the module's stage-0 entry;
    /// `None` for coordinate-free ports (e.g. constant-driven outputs).
    pub stage: Option<i64>,
}

/// A module's finalized temporal contract. Immutable once stored; callers
/// check instance bindings against it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleContract {
    pub key: ModuleKey,
    pub name: String,
    pub ports: Vec<PortContract>,
    /// Whether the module declares a timeline and it was validated. `true`
    /// for modules without a declaration.
    pub timeline_ok: bool,
}

/// The derived handshake contract of one clock-domain crossing, letting code
/// generation choose a synchronous path versus handshake/buffering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossingContract {
    pub signal: SignalId,
    pub from: DomainId,
    pub to: DomainId,
    pub direction: Direction,
    pub rythm: Rythm,
}

/// A fully annotated, safety-proven module graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckedModule {
    pub contract: ModuleContract,
    /// Per signal, the resolved coordinate; `None` for coordinate-free
    /// signals (constants and whatever they alone drive).
    pub coordinates: Vec<Option<TimeCoordinate>>,
    pub crossings: Vec<CrossingContract>,
}

/// Finalized contracts addressable by module identity. Only the driver
/// writes it, and only between verification waves.
#[derive(Debug, Clone, Default)]
pub struct ContractStore {
    slots: Vec<Option<ModuleContract>>,
}

impl ContractStore {
    pub fn with_capacity(count: usize) -> Self {
        Self {
            slots: vec![None; count],
        }
    }

    pub fn get(&self, key: ModuleKey) -> Option<&ModuleContract> {
        self.slots.get(key.index())?.as_ref()
    }

    pub fn insert(&mut self, contract: ModuleContract) {
        let idx = contract.key.index();
        if idx >= self.slots.len() {
            self.slots.resize(idx + 1, None);
        }
        self.slots[idx] = Some(contract);
    }
}

/// The union of every module's verification result for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationReport {
    /// Annotated graphs, indexed by module key; `None` for failed or
    /// skipped modules.
    pub checked: Vec<Option<CheckedModule>>,
    /// All diagnostics of the run, sorted by (module, signal, kind) so an
    /// unchanged design yields an identical report under any schedule.
    pub diagnostics: Vec<Diagnostic>,
    /// Modules left unchecked because a dependency's contract never
    /// materialized.
    pub skipped: Vec<ModuleKey>,
}

impl VerificationReport {
    /// Whether the whole compilation pass may proceed to code generation.
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty() && self.skipped.is_empty()
    }

    /// A module is eligible for code generation iff it produced an
    /// annotated graph (no fatal diagnostic in itself or a sub-instance).
    pub fn codegen_eligible(&self, key: ModuleKey) -> bool {
        self.checked
            .get(key.index())
            .map_or(false, Option::is_some)
    }

    pub fn diagnostics_for(&self, key: ModuleKey) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(move |d| d.module == key)
    }
}
