//! Temporal-safety verification core for a hardware-description language.
//!
//! Every signal's type includes its position in clock time: a
//! [`time::TimeCoordinate`] of (clock domain, pipeline stage). Combining
//! data from different moments is statically rejected unless explicitly and
//! checkedly delayed. On top of that sit two contract systems: streaming
//! modules declare the cadence of their valid cycles as a regex-like
//! timeline, and clock-domain crossings must satisfy the handshake rythm
//! derived from the domains' frequency ratio.
//!
//! Upstream elaboration supplies [`graph::ModuleGraph`]s and a
//! [`graph::ClockTable`]; [`verify::verify`] checks the whole design
//! bottom-up over the instantiation DAG and hands downstream code
//! generation either annotated, safety-proven graphs or the full diagnostic
//! set.

pub mod display;
pub mod graph;
pub mod rythm;
pub mod slice;
pub mod time;
pub mod timeline;
pub mod verify;

pub use graph::{ClockTable, DomainId, ModuleGraph, ModuleKey, Operator, PortId, SignalId};
pub use time::{combine, delay_cast, SliceError, TimeCoordinate};
pub use verify::{verify, Design, Diagnostic, DiagnosticKind, VerificationReport};
