//! Pipeline — root validation, per-file workers, reduction, report assembly.

pub mod error;

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::{Id, JoinError, JoinSet};
use tracing::info;

use crate::aggregate::{self, Reduction};
use crate::anomaly::detect_anomalies;
use crate::conf::AnalysisConfig;
use crate::diag::{Diagnostic, DiagnosticsSink, Stage};
use crate::launch;
use crate::model::ParsedEvent;
use crate::registry::PatternRegistry;
use crate::report::AnalysisReport;
use crate::scan::{CandidateFile, FileExtractor, FileRules};

pub use error::PipelineError;

pub struct Pipeline {
    config: AnalysisConfig,
    registry: Arc<PatternRegistry>,
    sink: Arc<dyn DiagnosticsSink>,
}

impl Pipeline {
    /// Pipeline over the built-in pattern registry.
    pub fn new(config: AnalysisConfig, sink: Arc<dyn DiagnosticsSink>) -> Result<Self, PipelineError> {
        let registry = PatternRegistry::builtin()?;
        Self::with_registry(config, registry, sink)
    }

    pub fn with_registry(
        config: AnalysisConfig,
        registry: PatternRegistry,
        sink: Arc<dyn DiagnosticsSink>,
    ) -> Result<Self, PipelineError> {
        config.validate().map_err(PipelineError::Config)?;
        Ok(Self {
            config,
            registry: Arc::new(registry),
            sink,
        })
    }

    /// Scan every candidate file under `root` and build the report.
    ///
    /// Fails before any file is read when `root` is missing or not a
    /// directory. Unreadable files are reported and skipped.
    pub async fn run(&self, root: &Path) -> Result<AnalysisReport, PipelineError> {
        if !root.exists() {
            return Err(PipelineError::RootNotFound(root.to_path_buf()));
        }
        if !root.is_dir() {
            return Err(PipelineError::NotADirectory(root.to_path_buf()));
        }

        let extractor = FileExtractor::new(
            Arc::clone(&self.registry),
            self.config.timestamp_policy(),
            self.config.kill,
            Arc::clone(&self.sink),
        )?;

        let discovery = FileRules::new(&self.config.files).discover(root);
        for e in &discovery.errors {
            let subject = e
                .path()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| root.display().to_string());
            self.sink
                .emit(Diagnostic::warn(Stage::Scan, format!("walk error: {}", e)).with_subject(subject));
        }
        info!(
            "Discovered {} candidate files under {} ({} workers)",
            discovery.files.len(),
            root.display(),
            self.config.max_workers
        );

        let discovered = discovery.files.len() as u64;
        let mut reduction = self.scan(extractor, discovery.files).await?;
        reduction.stats.files_discovered = discovered;
        reduction.stats.files_failed += discovery.errors.len() as u64;

        Ok(self.build_report(reduction))
    }

    /// One blocking worker per file, at most `max_workers` at a time.
    async fn scan(&self, extractor: FileExtractor, files: Vec<CandidateFile>) -> Result<Reduction, PipelineError> {
        let semaphore = Arc::new(Semaphore::new(self.config.max_workers.max(1)));
        let mut workers = Workers::new();

        for file in files {
            let permit = Arc::clone(&semaphore)
                .acquire_owned()
                .await
                .map_err(|e| PipelineError::Worker(e.to_string()))?;
            let extractor = extractor.clone();
            let relative = file.relative.clone();
            workers.spawn(relative, move || {
                let _permit = permit;
                let result = extractor.extract(&file);
                (file, result)
            });
        }

        let mut reduction = Reduction::new();
        while let Some(joined) = workers.next().await {
            match joined {
                Ok((_, Ok(extract))) => reduction.absorb(extract),
                Ok((file, Err(e))) => {
                    reduction.stats.files_failed += 1;
                    self.sink.emit(
                        Diagnostic::warn(Stage::Scan, format!("file skipped: {}", e))
                            .with_subject(file.relative),
                    );
                }
                Err((file, e)) => {
                    reduction.stats.files_failed += 1;
                    self.sink.emit(
                        Diagnostic::error(Stage::Pipeline, format!("worker failed: {}", e))
                            .with_subject(file),
                    );
                }
            }
        }
        Ok(reduction)
    }

    /// Everything downstream of the reduction. Deterministic for a given
    /// set of extracts, whatever order they were absorbed in.
    pub fn build_report(&self, reduction: Reduction) -> AnalysisReport {
        let events = &reduction.events;

        let memory = aggregate::memory_table(events);
        let memory_pruned = self.config.pruner().prune(&memory);
        let removed = memory.width() - memory_pruned.width();
        if removed > 0 {
            self.sink.emit(Diagnostic::debug(
                Stage::Prune,
                format!("pruned {} of {} memory columns", removed, memory.width()),
            ));
        }
        let anomalies = detect_anomalies(&memory_pruned, &self.config.thresholds(), self.sink.as_ref());

        let mut package_versions = BTreeMap::new();
        if let Some(latest) = reduction.latest_bugreport() {
            let mut found: Vec<_> = events
                .iter()
                .filter(|e| e.file == latest)
                .filter_map(|e| match &e.event {
                    ParsedEvent::PackageVersion(v) => Some((e.line, v)),
                    _ => None,
                })
                .collect();
            found.sort_by_key(|(line, _)| *line);
            for (_, v) in found {
                package_versions.insert(v.package.clone(), v.version.clone());
            }
        }

        AnalysisReport {
            ram_status: aggregate::ram_status_table(events),
            cpu: aggregate::cpu_table(events),
            pss: aggregate::pss_table(events),
            launch: aggregate::launch_table(events),
            launch_summary: launch::summarize_events(events),
            lifecycle: aggregate::lifecycle_events(events),
            kills: reduction.kills.summarize(),
            memory,
            memory_pruned,
            anomalies,
            package_versions,
            stats: reduction.stats,
        }
    }
}

/// Blocking workers, each remembering the file it was given.
struct Workers<T> {
    set: JoinSet<T>,
    files: HashMap<Id, String>,
}

impl<T: Send + 'static> Workers<T> {
    fn new() -> Self {
        Self {
            set: JoinSet::new(),
            files: HashMap::new(),
        }
    }

    fn spawn<F>(&mut self, file: String, work: F)
    where
        F: FnOnce() -> T + Send + 'static,
    {
        let handle = self.set.spawn_blocking(work);
        self.files.insert(handle.id(), file);
    }

    /// Next finished worker. A panicked or cancelled one comes back with
    /// its file.
    async fn next(&mut self) -> Option<Result<T, (String, JoinError)>> {
        let joined = self.set.join_next_with_id().await?;
        Some(match joined {
            Ok((id, output)) => {
                self.files.remove(&id);
                Ok(output)
            }
            Err(e) => Err((self.files.remove(&e.id()).unwrap_or_default(), e)),
        })
    }
}
