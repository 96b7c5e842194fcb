//! The verification driver and its structured outputs.

mod driver;
mod report;

pub use driver::{verify, Design};
pub use report::{
    CheckedModule, ContractStore, CrossingContract, Diagnostic, DiagnosticKind, ModuleContract,
    PortContract, VerificationReport,
};
