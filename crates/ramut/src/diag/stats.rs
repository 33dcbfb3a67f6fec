use serde::Serialize;

/// Scan counters.
///
/// Every worker fills its own copy and the driver folds them with
/// [`ScanStats::merge`], so no counter is shared between threads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanStats {
    /// Candidate files found under the root
    pub files_discovered: u64,
    /// Files read to the end
    pub files_scanned: u64,
    /// Files skipped because they could not be read
    pub files_failed: u64,
    /// Lines that passed the prefilter
    pub lines_matched: u64,
    /// Records produced
    pub records_extracted: u64,
    /// Records dropped because a captured field did not coerce
    pub records_dropped: u64,
}

impl ScanStats {
    pub fn merge(&mut self, other: &ScanStats) {
        self.files_discovered += other.files_discovered;
        self.files_scanned += other.files_scanned;
        self.files_failed += other.files_failed;
        self.lines_matched += other.lines_matched;
        self.records_extracted += other.records_extracted;
        self.records_dropped += other.records_dropped;
    }
}
