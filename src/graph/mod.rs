//! Core data structures of the elaborated module graph.

pub mod clocks;
pub mod dag;
pub mod node;
pub mod storage;

// Re-export key types for convenient access
pub use clocks::{ClockTable, DomainId};
pub use dag::ModuleGraph;
pub use node::{ModuleKey, Operator, Port, PortDirection, PortId, SignalKind, SignalMeta};
pub use storage::{FeedbackEdge, SignalArena, SignalId};
