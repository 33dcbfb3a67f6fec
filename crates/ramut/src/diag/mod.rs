//! Diagnostics — injected sink for per-line/per-file problems, and scan counters.

pub mod sink;
pub mod stats;

pub use sink::{CollectingSink, Diagnostic, DiagnosticsSink, NullSink, Severity, Stage, TracingSink};
pub use stats::ScanStats;
