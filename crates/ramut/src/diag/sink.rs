use parking_lot::Mutex;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Debug,
    Info,
    Warn,
    Error,
}

/// Pipeline stage that produced a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Scan,
    Normalize,
    Prune,
    Anomaly,
    Pipeline,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Scan => "scan",
            Stage::Normalize => "normalize",
            Stage::Prune => "prune",
            Stage::Anomaly => "anomaly",
            Stage::Pipeline => "pipeline",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub stage: Stage,
    /// File (relative path) or column the diagnostic refers to
    pub subject: Option<String>,
    pub message: String,
}

impl Diagnostic {
    pub fn new(severity: Severity, stage: Stage, message: impl Into<String>) -> Self {
        Self {
            severity,
            stage,
            subject: None,
            message: message.into(),
        }
    }

    pub fn debug(stage: Stage, message: impl Into<String>) -> Self {
        Self::new(Severity::Debug, stage, message)
    }

    pub fn info(stage: Stage, message: impl Into<String>) -> Self {
        Self::new(Severity::Info, stage, message)
    }

    pub fn warn(stage: Stage, message: impl Into<String>) -> Self {
        Self::new(Severity::Warn, stage, message)
    }

    pub fn error(stage: Stage, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, stage, message)
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }
}

/// Receiver for pipeline diagnostics.
///
/// Components take a `&dyn DiagnosticsSink` instead of logging through a
/// global, so tests can capture exactly what a stage reported.
pub trait DiagnosticsSink: Send + Sync {
    fn emit(&self, diagnostic: Diagnostic);
}

/// Forwards diagnostics to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticsSink for TracingSink {
    fn emit(&self, d: Diagnostic) {
        let stage = d.stage.as_str();
        let subject = d.subject.as_deref().unwrap_or("-");
        match d.severity {
            Severity::Debug => tracing::debug!(stage, subject, "{}", d.message),
            Severity::Info => tracing::info!(stage, subject, "{}", d.message),
            Severity::Warn => tracing::warn!(stage, subject, "{}", d.message),
            Severity::Error => tracing::error!(stage, subject, "{}", d.message),
        }
    }
}

/// Keeps every diagnostic in memory.
#[derive(Debug, Default)]
pub struct CollectingSink {
    entries: Mutex<Vec<Diagnostic>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<Diagnostic> {
        self.entries.lock().clone()
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.entries
            .lock()
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }

    pub fn contains(&self, stage: Stage, needle: &str) -> bool {
        self.entries
            .lock()
            .iter()
            .any(|d| d.stage == stage && d.message.contains(needle))
    }
}

impl DiagnosticsSink for CollectingSink {
    fn emit(&self, diagnostic: Diagnostic) {
        self.entries.lock().push(diagnostic);
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DiagnosticsSink for NullSink {
    fn emit(&self, _diagnostic: Diagnostic) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collecting_sink_records_in_order() {
        let sink = CollectingSink::new();
        sink.emit(Diagnostic::warn(Stage::Scan, "unreadable").with_subject("a/b.txt"));
        sink.emit(Diagnostic::debug(Stage::Normalize, "bad number"));

        let entries = sink.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].subject.as_deref(), Some("a/b.txt"));
        assert_eq!(sink.count(Severity::Warn), 1);
        assert!(sink.contains(Stage::Normalize, "bad"));
        assert!(!sink.contains(Stage::Scan, "bad"));
    }

    #[test]
    fn test_sinks_are_object_safe() {
        let sinks: Vec<Box<dyn DiagnosticsSink>> = vec![Box::new(TracingSink), Box::new(NullSink)];
        for sink in &sinks {
            sink.emit(Diagnostic::info(Stage::Pipeline, "hello"));
        }
    }
}
