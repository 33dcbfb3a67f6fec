use std::collections::HashSet;
use std::io;
use std::sync::Arc;
use std::time::SystemTime;

use crate::diag::{Diagnostic, DiagnosticsSink, ScanStats, Stage};
use crate::kill::{KillThresholds, KillTally};
use crate::model::{
    EventKind, Located, PackageVersion, ParsedEvent, RamStatusSample,
};
use crate::normalize::{self, MeminfoBlock, NormalizeError, TimestampPolicy};
use crate::registry::{block_markers, PatternRegistry};

use super::prefilter::{LinePrefilter, PrefilterError};
use super::reader::scan_lines;
use super::walk::{CandidateFile, FileClass};

/// Everything one worker produced from one file.
#[derive(Debug)]
pub struct FileExtract {
    pub file: String,
    pub class: FileClass,
    pub modified: Option<SystemTime>,
    pub events: Vec<Located<ParsedEvent>>,
    pub kills: KillTally,
    pub stats: ScanStats,
}

/// Scans one file at a time. Cheap to clone; clones share the registry,
/// prefilter and sink.
#[derive(Clone)]
pub struct FileExtractor {
    registry: Arc<PatternRegistry>,
    prefilter: Arc<LinePrefilter>,
    policy: TimestampPolicy,
    kill_thresholds: KillThresholds,
    sink: Arc<dyn DiagnosticsSink>,
}

impl FileExtractor {
    pub fn new(
        registry: Arc<PatternRegistry>,
        policy: TimestampPolicy,
        kill_thresholds: KillThresholds,
        sink: Arc<dyn DiagnosticsSink>,
    ) -> Result<Self, PrefilterError> {
        let mut literals = registry.triggers(&EventKind::ALL);
        literals.extend(block_markers());
        let prefilter = LinePrefilter::new(&literals)?;

        Ok(Self {
            registry,
            prefilter: Arc::new(prefilter),
            policy,
            kill_thresholds,
            sink,
        })
    }

    /// Read `file` once, front to back. I/O errors abort this file only.
    pub fn extract(&self, file: &CandidateFile) -> io::Result<FileExtract> {
        let modified = std::fs::metadata(&file.path)
            .and_then(|m| m.modified())
            .ok();

        let mut state = LineState::new(self, file);
        let matched = scan_lines(&file.path, &self.prefilter, |n, line| state.on_line(n, line))?;

        let mut extract = state.finish(modified);
        extract.stats.files_scanned = 1;
        extract.stats.lines_matched = matched;

        self.sink.emit(
            Diagnostic::debug(
                Stage::Scan,
                format!(
                    "{} candidate lines, {} records, {} dropped",
                    matched, extract.stats.records_extracted, extract.stats.records_dropped
                ),
            )
            .with_subject(&file.relative),
        );
        Ok(extract)
    }
}

struct LineState<'a> {
    extractor: &'a FileExtractor,
    file: &'a CandidateFile,
    meminfo: MeminfoBlock,
    ram: Vec<(String, u64)>,
    ram_seen: HashSet<String>,
    /// Package named by the last `Package [..]` header, awaiting its version
    package: Option<String>,
    events: Vec<Located<ParsedEvent>>,
    kills: KillTally,
    stats: ScanStats,
}

impl<'a> LineState<'a> {
    fn new(extractor: &'a FileExtractor, file: &'a CandidateFile) -> Self {
        Self {
            extractor,
            file,
            meminfo: MeminfoBlock::new(),
            ram: Vec::new(),
            ram_seen: HashSet::new(),
            package: None,
            events: Vec::new(),
            kills: KillTally::new(),
            stats: ScanStats::default(),
        }
    }

    fn on_line(&mut self, line_number: u64, line: &str) {
        if self.file.class.has_meminfo() && self.meminfo.observe_marker(line) {
            return;
        }

        let extractor = self.extractor;
        let policy = extractor.policy;
        for &kind in self.file.class.kinds() {
            if kind == EventKind::MeminfoCategory && !self.meminfo.is_collecting() {
                continue;
            }
            let Some(m) = extractor.registry.first_match(kind, line) else {
                continue;
            };

            let result: Result<(), NormalizeError> = match kind {
                EventKind::MeminfoCategory => normalize::meminfo_category(&m).map(|(name, kb)| {
                    self.meminfo.insert(name, kb);
                }),
                EventKind::RamStatus => normalize::ram_status(&m).map(|(label, kb)| {
                    if self.ram_seen.insert(label.clone()) {
                        self.ram.push((label, kb));
                    }
                }),
                EventKind::Kill => normalize::kill_event(&m, policy).map(|kill| {
                    self.kills.record(&kill, &extractor.kill_thresholds);
                    self.stats.records_extracted += 1;
                }),
                EventKind::CpuProcess => normalize::cpu_process(&m, policy)
                    .map(|s| self.push(line_number, ParsedEvent::Cpu(s))),
                EventKind::CpuTotal => normalize::cpu_total(&m, policy)
                    .map(|s| self.push(line_number, ParsedEvent::Cpu(s))),
                EventKind::Launch => normalize::launch_event(&m, policy)
                    .map(|e| self.push(line_number, ParsedEvent::Launch(e))),
                EventKind::Pss => normalize::pss_sample(&m, policy)
                    .map(|s| self.push(line_number, ParsedEvent::Pss(s))),
                EventKind::ProcessDied => normalize::lifecycle_event(&m, policy)
                    .map(|e| self.push(line_number, ParsedEvent::Lifecycle(e))),
                EventKind::PackageHeader => {
                    self.package = m.get("package").map(|p| p.trim().to_string());
                    Ok(())
                }
                EventKind::PackageVersion => {
                    if let (Some(package), Some(version)) = (self.package.take(), m.get("version")) {
                        let event = PackageVersion {
                            package,
                            version: version.trim().to_string(),
                        };
                        self.push(line_number, ParsedEvent::PackageVersion(event));
                    }
                    Ok(())
                }
            };

            if let Err(e) = result {
                self.stats.records_dropped += 1;
                extractor.sink.emit(
                    Diagnostic::debug(Stage::Normalize, format!("{} ({}): {}", kind.as_str(), m.version, e))
                        .with_subject(format!("{}:{}", self.file.relative, line_number)),
                );
            }
        }
    }

    fn push(&mut self, line_number: u64, event: ParsedEvent) {
        self.stats.records_extracted += 1;
        self.events
            .push(Located::new(self.file.relative.clone(), line_number, event));
    }

    fn finish(mut self, modified: Option<SystemTime>) -> FileExtract {
        let source = self.file.relative.clone();
        if let Some(sample) = self.meminfo.finish(source.clone()) {
            self.stats.records_extracted += 1;
            self.events
                .push(Located::new(source.clone(), 0, ParsedEvent::Meminfo(sample)));
        }
        if !self.ram.is_empty() {
            self.stats.records_extracted += 1;
            let sample = RamStatusSample {
                source: source.clone(),
                fields: self.ram,
            };
            self.events
                .push(Located::new(source.clone(), 0, ParsedEvent::RamStatus(sample)));
        }

        FileExtract {
            file: source,
            class: self.file.class,
            modified,
            events: self.events,
            kills: self.kills,
            stats: self.stats,
        }
    }
}
