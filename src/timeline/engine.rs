//! Validation of a streaming module's realized behavior against its
//! declared timeline.
//!
//! Realized behavior is never enumerated trace by trace: an unbounded stream
//! has unboundedly many traces. Instead three representative cases derived
//! from the body's control structure are checked: a single invocation, the
//! steady state of the loop body (proven for every run length by a
//! state-set invariant), and the all-invalid boundary.

use super::nfa::{self, Nfa, StateSet};
use super::pattern::{CycleToken, Pattern};
use std::collections::HashSet;
use std::fmt;
use std::ops::Range;
use thiserror::Error;

/// Which representative trace left the declared pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceCase {
    SingleShot,
    SteadyState,
    IdleBoundary,
}

impl fmt::Display for TraceCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TraceCase::SingleShot => "single-invocation",
            TraceCase::SteadyState => "steady-state",
            TraceCase::IdleBoundary => "idle-boundary",
        })
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimelineError {
    /// The compiled pattern accepts no trace at all. A definition error,
    /// reported whether or not the module is ever instantiated.
    #[error("timeline pattern accepts no trace at all")]
    UnsatisfiableTimeline,
    /// A realizable trace falls outside the declared pattern.
    #[error("realized {case} trace leaves the declared timeline at cycle-group {position}")]
    TimelineMismatch { case: TraceCase, position: usize },
}

/// A compiled, emptiness-checked timeline declaration.
#[derive(Debug, Clone)]
pub struct CompiledTimeline {
    nfa: Nfa,
}

/// Compiles a pattern, rejecting the empty language up front.
pub fn compile(pattern: &Pattern) -> Result<CompiledTimeline, TimelineError> {
    let nfa = nfa::compile(pattern);
    if nfa.is_empty_language() {
        return Err(TimelineError::UnsatisfiableTimeline);
    }
    Ok(CompiledTimeline { nfa })
}

impl CompiledTimeline {
    /// Advances the live set by one token. Idle tokens (no declared port
    /// fires) do not advance the automaton: the cadence ranges over cycles
    /// where something happens.
    fn advance(&self, set: StateSet, token: CycleToken) -> StateSet {
        if token.is_idle() {
            set
        } else {
            self.nfa.step(&set, token)
        }
    }

    /// Runs a concrete trace under prefix acceptance: legal as long as the
    /// live set stays non-empty. Returns the final live set, or the first
    /// position where the trace left the language.
    pub fn run_trace(&self, start: StateSet, trace: &[CycleToken]) -> Result<StateSet, usize> {
        let mut set = start;
        for (position, &token) in trace.iter().enumerate() {
            set = self.advance(set, token);
            if set.is_empty() {
                return Err(position);
            }
        }
        Ok(set)
    }

    pub fn start_set(&self) -> StateSet {
        self.nfa.start_set()
    }

    /// Validates the module's realized cycle-groups against the declaration.
    ///
    /// `groups` is prologue ++ loop body ++ epilogue in elaboration order;
    /// `loop_groups` delimits the body that repeats once per streaming
    /// iteration.
    pub fn validate_realized(
        &self,
        groups: &[CycleToken],
        loop_groups: Range<usize>,
    ) -> Result<(), TimelineError> {
        let loop_start = loop_groups.start.min(groups.len());
        let loop_end = loop_groups.end.min(groups.len());

        // (iii) All-invalid boundary: a run where no declared port ever
        // fires. Idle cycles don't advance the automaton, so this reduces to
        // the start set being live, which emptiness checking guarantees.
        let idle = vec![CycleToken::empty(); groups.len().max(1)];
        self.run_trace(self.start_set(), &idle)
            .map_err(|position| TimelineError::TimelineMismatch {
                case: TraceCase::IdleBoundary,
                position,
            })?;

        // (i) Single invocation: prologue, one loop iteration, epilogue.
        self.run_trace(self.start_set(), groups).map_err(|position| {
            TimelineError::TimelineMismatch {
                case: TraceCase::SingleShot,
                position,
            }
        })?;

        // (ii) Steady state: iterate the loop body over the live set until
        // the set sequence repeats. Every set along the way must stay live
        // and must still admit the epilogue; since state sets are finite,
        // the repetition closes the argument for arbitrary N.
        if loop_start < loop_end {
            let body = &groups[loop_start..loop_end];
            let epilogue = &groups[loop_end..];

            let after_prologue = self
                .run_trace(self.start_set(), &groups[..loop_start])
                .map_err(|position| TimelineError::TimelineMismatch {
                    case: TraceCase::SteadyState,
                    position,
                })?;

            let mut seen: HashSet<StateSet> = HashSet::new();
            let mut live = after_prologue;
            while seen.insert(live.clone()) {
                live = self.run_trace(live, body).map_err(|offset| {
                    TimelineError::TimelineMismatch {
                        case: TraceCase::SteadyState,
                        position: loop_start + offset,
                    }
                })?;
                self.run_trace(live.clone(), epilogue).map_err(|offset| {
                    TimelineError::TimelineMismatch {
                        case: TraceCase::SteadyState,
                        position: loop_end + offset,
                    }
                })?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tok(bits: u32) -> CycleToken {
        CycleToken(bits)
    }

    /// The two-wide blur declaration: `(a -> /) .. (a -> r)*`.
    /// Bit 0 = input `a` present, bit 1 = result `r` present.
    fn blur_pattern() -> Pattern {
        Pattern::seq(vec![
            Pattern::cycle(tok(0b01)),
            Pattern::star(Pattern::cycle(tok(0b11))),
        ])
    }

    #[test]
    fn blur_accepts_any_run_length() {
        let compiled = compile(&blur_pattern()).unwrap();
        for n in 0..6 {
            let mut groups = vec![tok(0b01)];
            groups.extend(std::iter::repeat(tok(0b11)).take(n));
            let last = groups.len();
            assert_eq!(
                compiled.validate_realized(&groups, 1..last.max(1)),
                Ok(()),
                "run length {n}"
            );
        }
    }

    #[test]
    fn blur_loop_invariant_proves_unbounded_runs() {
        // One prologue group, one looping group; the engine must accept this
        // for arbitrary N without enumerating.
        let compiled = compile(&blur_pattern()).unwrap();
        let groups = vec![tok(0b01), tok(0b11)];
        assert_eq!(compiled.validate_realized(&groups, 1..2), Ok(()));
    }

    #[test]
    fn blur_rejects_result_without_input() {
        // A group producing a result with no input cycle falls outside the
        // declaration.
        let compiled = compile(&blur_pattern()).unwrap();
        let groups = vec![tok(0b01), tok(0b11), tok(0b10)];
        assert_eq!(
            compiled.validate_realized(&groups, 1..2),
            Err(TimelineError::TimelineMismatch {
                case: TraceCase::SingleShot,
                position: 2,
            })
        );
    }

    #[test]
    fn diverging_loop_body_fails_steady_state() {
        // Declared: exactly one `a` cycle then exactly one `a+r` cycle.
        // Realized loop repeats the `a+r` group, so a second iteration
        // leaves the language even though a single one fits.
        let pattern = Pattern::seq(vec![
            Pattern::cycle(tok(0b01)),
            Pattern::cycle(tok(0b11)),
        ]);
        let compiled = compile(&pattern).unwrap();
        let groups = vec![tok(0b01), tok(0b11)];
        assert_eq!(
            compiled.validate_realized(&groups, 1..2),
            Err(TimelineError::TimelineMismatch {
                case: TraceCase::SteadyState,
                position: 1,
            })
        );
    }

    #[test]
    fn conservative_declaration_is_accepted() {
        // Declaration permits an optional extra result group the body never
        // realizes; narrower behavior is legal.
        let pattern = Pattern::seq(vec![
            Pattern::cycle(tok(0b01)),
            Pattern::star(Pattern::alt(vec![
                Pattern::cycle(tok(0b11)),
                Pattern::cycle(tok(0b10)),
            ])),
        ]);
        let compiled = compile(&pattern).unwrap();
        let groups = vec![tok(0b01), tok(0b11)];
        assert_eq!(compiled.validate_realized(&groups, 1..2), Ok(()));
    }

    #[test]
    fn unsatisfiable_pattern_is_rejected_at_compile_time() {
        let err = compile(&Pattern::seq(vec![
            Pattern::cycle(tok(1)),
            Pattern::alt(Vec::new()),
        ]))
        .unwrap_err();
        assert_eq!(err, TimelineError::UnsatisfiableTimeline);
    }

    #[test]
    fn idle_groups_do_not_advance_the_cadence() {
        let compiled = compile(&blur_pattern()).unwrap();
        // An idle group between the prologue and the loop is invisible.
        let groups = vec![tok(0b01), tok(0), tok(0b11)];
        assert_eq!(compiled.validate_realized(&groups, 2..3), Ok(()));
    }
}
