//! The slice checker: coordinate assignment and cross-time safety for one
//! elaborated module graph.

mod checker;

pub use checker::SliceChecker;
