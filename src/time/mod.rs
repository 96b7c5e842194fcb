//! The time-coordinate model: where a signal lives in clocked time.
//!
//! Every signal carries a `TimeCoordinate` once checked: the clock domain it
//! belongs to, and its integer stage offset within that domain's pipeline,
//! counted from the pipeline's entry point (stage 0). Combinational logic
//! preserves coordinates; only pipeline-step markers and explicit delay casts
//! move a value forward in time.

use crate::graph::DomainId;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A signal's position in clocked time: (clock domain, pipeline stage).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeCoordinate {
    pub domain: DomainId,
    pub stage: i64,
}

impl TimeCoordinate {
    pub fn new(domain: DomainId, stage: i64) -> Self {
        Self { domain, stage }
    }

    /// The entry point of a domain's pipeline: stage 0.
    pub fn entry(domain: DomainId) -> Self {
        Self { domain, stage: 0 }
    }

    /// The coordinate one pipeline-step marker later. Stage advances by
    /// exactly 1; the domain is preserved.
    pub fn advanced(self) -> Self {
        Self {
            domain: self.domain,
            stage: self.stage + 1,
        }
    }
}

impl fmt::Display for TimeCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(domain {}, stage {})", self.domain.index(), self.stage)
    }
}

/// Errors of the coordinate algebra itself.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliceError {
    /// Two operands of one combinational operator live at different moments.
    #[error("cannot combine {left} with {right}: operands must share one time slice")]
    TimeSliceMismatch {
        left: TimeCoordinate,
        right: TimeCoordinate,
    },
    /// A delay cast must move strictly forward. Zero is a disguised no-op,
    /// negative would require data from the future.
    #[error("delay cast must advance time by at least one stage, got delta {delta}")]
    NegativeOrZeroDelayCast { delta: i64 },
}

/// Combines the coordinates of two operands feeding one combinational
/// operator. Succeeds only when domain and stage are identical in both.
pub fn combine(a: TimeCoordinate, b: TimeCoordinate) -> Result<TimeCoordinate, SliceError> {
    if a == b {
        Ok(a)
    } else {
        Err(SliceError::TimeSliceMismatch { left: a, right: b })
    }
}

/// An explicit, checked delay: asserts that the value is consumed `delta`
/// stages later, in `domain`. `delta` must be strictly positive.
pub fn delay_cast(
    c: TimeCoordinate,
    domain: DomainId,
    delta: i64,
) -> Result<TimeCoordinate, SliceError> {
    if delta <= 0 {
        return Err(SliceError::NegativeOrZeroDelayCast { delta });
    }
    Ok(TimeCoordinate::new(domain, c.stage + delta))
}
