//! The rythm calculator.
//!
//! A rythm is the periodic valid/invalid handshake sequence governing a
//! clock-domain crossing: per tick of each domain, whether a transfer may
//! legally occur without loss or duplication. It is a pure function of the
//! reduced frequency ratio and the transfer direction, derived by simulating
//! two free-running counters over one shared reference interval.

mod cache;

pub use cache::RythmCache;

use crate::graph::clocks::gcd;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A reduced fast:slow tick ratio. `p` ticks of the fast domain per `q`
/// ticks of the slow domain over the shared reference interval; `p >= q`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ratio {
    pub p: u32,
    pub q: u32,
}

impl Ratio {
    /// Builds a gcd-reduced ratio. `fast_ticks` must be >= `slow_ticks`.
    pub fn new(fast_ticks: u32, slow_ticks: u32) -> Self {
        debug_assert!(fast_ticks >= slow_ticks && slow_ticks > 0);
        let g = gcd(fast_ticks as u64, slow_ticks as u64) as u32;
        Self {
            p: fast_ticks / g,
            q: slow_ticks / g,
        }
    }
}

/// The direction of a crossing, relative to the faster domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    SlowToFast,
    FastToSlow,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RythmError {
    /// The declared rythm diverges from the derived one. Sequences are
    /// periodic, so one period suffices; `index` is the first differing
    /// cycle over the concatenated fast-then-slow period.
    #[error("declared rythm differs from the derived rythm at cycle {index}")]
    RythmMismatch { index: usize },
}

/// A periodic transfer schedule for one (domain pair, direction).
///
/// `fast[k]` states whether a transfer may occur on fast tick `k`, and
/// `slow[j]` likewise for slow tick `j`; the full period is `p + q`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rythm {
    pub ratio: Ratio,
    pub direction: Direction,
    pub fast: Vec<bool>,
    pub slow: Vec<bool>,
}

impl Rythm {
    pub fn period(&self) -> usize {
        (self.ratio.p + self.ratio.q) as usize
    }

    /// One full period as a flat sequence: fast-side ticks then slow-side.
    pub fn cycles(&self) -> impl Iterator<Item = bool> + '_ {
        self.fast.iter().chain(self.slow.iter()).copied()
    }
}

/// Derives the transfer schedule for a reduced ratio and direction.
///
/// Both directions admit exactly one transfer per slow tick:
/// - slow -> fast: every slow tick is a valid source; the fast domain samples
///   on the first of its ticks falling within each slow tick's interval.
/// - fast -> slow: every slow edge samples; the fast domain may only send on
///   the single tick landing on (or last before) each slow sampling edge, so
///   no two fast ticks map to one slow edge.
pub fn derive(ratio: Ratio, direction: Direction) -> Rythm {
    let ratio = Ratio::new(ratio.p, ratio.q);
    let (p, q) = (ratio.p as u64, ratio.q as u64);
    let mut fast = vec![false; p as usize];
    let slow = vec![true; q as usize];

    match direction {
        Direction::SlowToFast => {
            // Fast tick k falls in slow interval floor(k*q/p); sample on the
            // first fast tick of each interval, exactly once per slow tick.
            for k in 0..p {
                let interval = k * q / p;
                let first_of_interval = k == 0 || (k - 1) * q / p != interval;
                fast[k as usize] = first_of_interval;
            }
        }
        Direction::FastToSlow => {
            // Slow edge j lands at fast tick floor(j*p/q); with p >= q these
            // indices are distinct, so each slow edge samples a unique send.
            for j in 0..q {
                fast[(j * p / q) as usize] = true;
            }
        }
    }

    Rythm {
        ratio,
        direction,
        fast,
        slow,
    }
}

/// Compares a declared rythm against the derived one, over one period.
pub fn check_compatible(declared: &Rythm, derived: &Rythm) -> Result<(), RythmError> {
    let declared_cycles: Vec<bool> = declared.cycles().collect();
    let derived_cycles: Vec<bool> = derived.cycles().collect();
    let longest = declared_cycles.len().max(derived_cycles.len());
    for index in 0..longest {
        if declared_cycles.get(index) != derived_cycles.get(index) {
            return Err(RythmError::RythmMismatch { index });
        }
    }
    Ok(())
}
