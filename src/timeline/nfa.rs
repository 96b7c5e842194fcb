//! Thompson construction over the cycle-token alphabet.
//!
//! No backtracking: validation simulates the live state set directly, so
//! pattern ambiguity affects diagnostic quality only, never safety.

use super::pattern::{CycleToken, Pattern};
use smallvec::SmallVec;
use std::collections::BTreeSet;

/// A nondeterministic automaton compiled from one timeline pattern.
#[derive(Debug, Clone)]
pub struct Nfa {
    eps: Vec<SmallVec<[u32; 2]>>,
    sym: Vec<SmallVec<[(CycleToken, u32); 1]>>,
    start: u32,
    accept: u32,
}

/// The deterministic simulation set: epsilon-closed NFA states; ordered so
/// that set equality is canonical.
pub type StateSet = BTreeSet<u32>;

pub fn compile(pattern: &Pattern) -> Nfa {
    let mut b = Builder {
        eps: Vec::new(),
        sym: Vec::new(),
    };
    let (start, accept) = b.fragment(pattern);
    Nfa {
        eps: b.eps,
        sym: b.sym,
        start,
        accept,
    }
}

struct Builder {
    eps: Vec<SmallVec<[u32; 2]>>,
    sym: Vec<SmallVec<[(CycleToken, u32); 1]>>,
}

impl Builder {
    fn state(&mut self) -> u32 {
        let id = self.eps.len() as u32;
        self.eps.push(SmallVec::new());
        self.sym.push(SmallVec::new());
        id
    }

    /// Builds the fragment for `pattern`, returning its (entry, exit) states.
    fn fragment(&mut self, pattern: &Pattern) -> (u32, u32) {
        match pattern {
            Pattern::Cycle(token) => {
                let entry = self.state();
                let exit = self.state();
                self.sym[entry as usize].push((*token, exit));
                (entry, exit)
            }
            Pattern::Seq(items) => {
                let entry = self.state();
                let mut cursor = entry;
                for item in items {
                    let (f_entry, f_exit) = self.fragment(item);
                    self.eps[cursor as usize].push(f_entry);
                    cursor = f_exit;
                }
                (entry, cursor)
            }
            Pattern::Alt(items) => {
                // No branches means no path from entry to exit: the empty
                // language.
                let entry = self.state();
                let exit = self.state();
                for item in items {
                    let (f_entry, f_exit) = self.fragment(item);
                    self.eps[entry as usize].push(f_entry);
                    self.eps[f_exit as usize].push(exit);
                }
                (entry, exit)
            }
            Pattern::Star(inner) => {
                let entry = self.state();
                let exit = self.state();
                let (f_entry, f_exit) = self.fragment(inner);
                self.eps[entry as usize].push(f_entry);
                self.eps[entry as usize].push(exit);
                self.eps[f_exit as usize].push(f_entry);
                self.eps[f_exit as usize].push(exit);
                (entry, exit)
            }
            Pattern::Plus(inner) => {
                let entry = self.state();
                let exit = self.state();
                let (f_entry, f_exit) = self.fragment(inner);
                self.eps[entry as usize].push(f_entry);
                self.eps[f_exit as usize].push(f_entry);
                self.eps[f_exit as usize].push(exit);
                (entry, exit)
            }
            Pattern::Opt(inner) => {
                let entry = self.state();
                let exit = self.state();
                let (f_entry, f_exit) = self.fragment(inner);
                self.eps[entry as usize].push(f_entry);
                self.eps[entry as usize].push(exit);
                self.eps[f_exit as usize].push(exit);
                (entry, exit)
            }
        }
    }
}

impl Nfa {
    fn close(&self, set: &mut StateSet) {
        let mut work: Vec<u32> = set.iter().copied().collect();
        while let Some(s) = work.pop() {
            for &next in &self.eps[s as usize] {
                if set.insert(next) {
                    work.push(next);
                }
            }
        }
    }

    /// The epsilon closure of the start state.
    pub fn start_set(&self) -> StateSet {
        let mut set = StateSet::new();
        set.insert(self.start);
        self.close(&mut set);
        set
    }

    /// Consumes one token from every live state. An empty result means the
    /// trace left the declared language at this token.
    pub fn step(&self, set: &StateSet, token: CycleToken) -> StateSet {
        let mut next = StateSet::new();
        for &s in set {
            for &(tok, target) in &self.sym[s as usize] {
                if tok == token {
                    next.insert(target);
                }
            }
        }
        self.close(&mut next);
        next
    }

    pub fn accepts(&self, set: &StateSet) -> bool {
        set.contains(&self.accept)
    }

    /// True when the accept state is unreachable: the pattern accepts no
    /// trace at all.
    pub fn is_empty_language(&self) -> bool {
        let mut reach = StateSet::new();
        reach.insert(self.start);
        let mut work = vec![self.start];
        while let Some(s) = work.pop() {
            if s == self.accept {
                return false;
            }
            for &next in &self.eps[s as usize] {
                if reach.insert(next) {
                    work.push(next);
                }
            }
            for &(_, next) in &self.sym[s as usize] {
                if reach.insert(next) {
                    work.push(next);
                }
            }
        }
        !reach.contains(&self.accept)
    }
}
