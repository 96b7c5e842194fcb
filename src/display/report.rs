//! Indented, human-readable rendering of one verification run.
//!
//! The structured [`VerificationReport`] is the machine surface; this is the
//! CLI surface. Richer rendering (spans, colors, editor integration) is a
//! downstream concern.

use crate::graph::ModuleKey;
use crate::verify::{Design, VerificationReport};
use std::fmt::Write;

pub fn render_report(report: &VerificationReport, design: &Design) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "TEMPORAL VERIFICATION REPORT");
    let _ = writeln!(out, "--------------------------------------------------");

    let mut verified = 0usize;
    let mut failed = 0usize;

    for idx in 0..design.module_count() {
        let key = ModuleKey::new(idx);
        let graph = design.module(key);
        let diags: Vec<_> = report.diagnostics_for(key).collect();
        let skipped = report.skipped.contains(&key);

        if diags.is_empty() && !skipped {
            verified += 1;
            let _ = writeln!(out, "[ok]      {}", graph.name);
            if let Some(checked) = report.checked.get(idx).and_then(Option::as_ref) {
                for port in &checked.contract.ports {
                    let stage = port
                        .stage
                        .map_or("free".to_string(), |s| format!("stage {s}"));
                    let _ = writeln!(
                        out,
                        "    port {:<16} {:?} ({}, {})",
                        port.name,
                        port.direction,
                        design.clocks.domain_name(port.domain),
                        stage,
                    );
                }
                for crossing in &checked.crossings {
                    let _ = writeln!(
                        out,
                        "    crossing {} -> {} ({:?}, period {})",
                        design.clocks.domain_name(crossing.from),
                        design.clocks.domain_name(crossing.to),
                        crossing.direction,
                        crossing.rythm.period(),
                    );
                }
            }
            continue;
        }

        failed += 1;
        let status = if skipped { "[skipped]" } else { "[failed]" };
        let _ = writeln!(out, "{status} {}", graph.name);
        for diag in diags {
            let place = diag
                .signal
                .map_or_else(|| "module".to_string(), |s| {
                    format!("'{}'", graph.signal_name(s))
                });
            let _ = writeln!(out, "    {:?} at {}: {}", diag.kind, place, diag.message);
        }
    }

    let _ = writeln!(out, "--------------------------------------------------");
    let _ = writeln!(
        out,
        "{} verified, {} with findings, {} skipped",
        verified,
        failed.saturating_sub(report.skipped.len()),
        report.skipped.len(),
    );
    out
}
