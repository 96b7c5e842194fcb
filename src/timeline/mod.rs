//! The timeline pattern engine: compiles a streaming module's declared
//! cadence to an automaton and validates the body's realized behavior
//! against it.

mod engine;
mod nfa;
mod pattern;

pub use engine::{compile, CompiledTimeline, TimelineError, TraceCase};
pub use nfa::{Nfa, StateSet};
pub use pattern::{CycleToken, Pattern, TimelineDecl};
