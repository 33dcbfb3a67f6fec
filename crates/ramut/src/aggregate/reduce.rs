use std::time::SystemTime;

use crate::diag::ScanStats;
use crate::kill::KillTally;
use crate::model::{Located, ParsedEvent};
use crate::scan::{FileClass, FileExtract};

/// Fan-in of per-file results.
///
/// Every operation is a concatenation, a counter sum or a max, so the final
/// state does not depend on the order in which files finished. Ordering is
/// restored later by sorting on (key, file, line).
#[derive(Debug, Default)]
pub struct Reduction {
    pub events: Vec<Located<ParsedEvent>>,
    pub kills: KillTally,
    pub stats: ScanStats,
    bugreports: Vec<(Option<SystemTime>, String)>,
}

impl Reduction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn absorb(&mut self, extract: FileExtract) {
        if extract.class == FileClass::Bugreport {
            self.bugreports.push((extract.modified, extract.file.clone()));
        }
        self.events.extend(extract.events);
        self.kills.merge(&extract.kills);
        self.stats.merge(&extract.stats);
    }

    pub fn merge(&mut self, other: Reduction) {
        self.events.extend(other.events);
        self.kills.merge(&other.kills);
        self.stats.merge(&other.stats);
        self.bugreports.extend(other.bugreports);
    }

    /// The most recently modified bugreport; ties go to the greatest path.
    pub fn latest_bugreport(&self) -> Option<&str> {
        self.bugreports
            .iter()
            .max_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)))
            .map(|(_, file)| file.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn extract(file: &str, class: FileClass, modified: Option<SystemTime>) -> FileExtract {
        FileExtract {
            file: file.to_string(),
            class,
            modified,
            events: Vec::new(),
            kills: KillTally::new(),
            stats: ScanStats {
                files_scanned: 1,
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_latest_bugreport_by_mtime() {
        let t0 = SystemTime::UNIX_EPOCH + Duration::from_secs(100);
        let t1 = t0 + Duration::from_secs(5);

        let mut reduction = Reduction::new();
        reduction.absorb(extract("z/bugreport-old.txt", FileClass::Bugreport, Some(t0)));
        reduction.absorb(extract("a/bugreport-new.txt", FileClass::Bugreport, Some(t1)));
        reduction.absorb(extract("b/x-Stream-s.txt", FileClass::Stream, Some(t1 + Duration::from_secs(9))));

        assert_eq!(reduction.latest_bugreport(), Some("a/bugreport-new.txt"));
        assert_eq!(reduction.stats.files_scanned, 3);
    }

    #[test]
    fn test_mtime_tie_goes_to_greatest_path() {
        let t = SystemTime::UNIX_EPOCH + Duration::from_secs(100);
        let mut reduction = Reduction::new();
        reduction.absorb(extract("b/bugreport.txt", FileClass::Bugreport, Some(t)));
        reduction.absorb(extract("a/bugreport.txt", FileClass::Bugreport, Some(t)));
        assert_eq!(reduction.latest_bugreport(), Some("b/bugreport.txt"));
    }

    #[test]
    fn test_merge_combines_partial_reductions() {
        let mut left = Reduction::new();
        left.absorb(extract("a", FileClass::Events, None));
        let mut right = Reduction::new();
        right.absorb(extract("bugreport", FileClass::Bugreport, None));

        left.merge(right);
        assert_eq!(left.stats.files_scanned, 2);
        assert_eq!(left.latest_bugreport(), Some("bugreport"));
        assert_eq!(Reduction::new().latest_bugreport(), None);
    }
}
