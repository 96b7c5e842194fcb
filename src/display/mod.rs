//! Plain-text rendering of a verification report.

mod report;

pub use report::render_report;
