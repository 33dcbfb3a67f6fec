use std::collections::HashSet;

use crate::model::MeminfoSample;
use crate::registry::{MEMINFO_BLOCK_END, MEMINFO_BLOCK_START};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockState {
    Idle,
    Collecting,
    Done,
}

/// Collects the OOM-adjustment category block of one meminfo dump.
///
/// Only lines between [`MEMINFO_BLOCK_START`] and the first
/// [`MEMINFO_BLOCK_END`] count. A category seen twice keeps its first size.
#[derive(Debug)]
pub struct MeminfoBlock {
    state: BlockState,
    categories: Vec<(String, u64)>,
    seen: HashSet<String>,
}

impl Default for MeminfoBlock {
    fn default() -> Self {
        Self::new()
    }
}

impl MeminfoBlock {
    pub fn new() -> Self {
        Self {
            state: BlockState::Idle,
            categories: Vec::new(),
            seen: HashSet::new(),
        }
    }

    /// Advance on block markers. Returns true when `line` was a marker.
    pub fn observe_marker(&mut self, line: &str) -> bool {
        match self.state {
            BlockState::Idle if line.contains(MEMINFO_BLOCK_START) => {
                self.state = BlockState::Collecting;
                true
            }
            BlockState::Collecting if line.contains(MEMINFO_BLOCK_END) => {
                self.state = BlockState::Done;
                true
            }
            _ => false,
        }
    }

    pub fn is_collecting(&self) -> bool {
        self.state == BlockState::Collecting
    }

    pub fn insert(&mut self, name: String, kb: u64) {
        if self.seen.insert(name.clone()) {
            self.categories.push((name, kb));
        }
    }

    /// The collected snapshot, or `None` when no category was seen.
    pub fn finish(self, source: impl Into<String>) -> Option<MeminfoSample> {
        if self.categories.is_empty() {
            return None;
        }
        Some(MeminfoSample {
            source: source.into(),
            categories: self.categories,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines_outside_block_are_ignored() {
        let mut block = MeminfoBlock::new();
        assert!(!block.is_collecting());
        assert!(block.observe_marker("Total PSS by OOM adjustment:"));
        assert!(block.is_collecting());
        block.insert("Native".into(), 100);
        assert!(block.observe_marker("Total PSS by category:"));
        assert!(!block.is_collecting());

        // A second block in the same file is not read.
        assert!(!block.observe_marker("Total PSS by OOM adjustment:"));
        assert!(!block.is_collecting());

        let sample = block.finish("dir/meminfo.txt").unwrap();
        assert_eq!(sample.source, "dir/meminfo.txt");
        assert_eq!(sample.categories, vec![("Native".to_string(), 100)]);
    }

    #[test]
    fn test_first_value_wins() {
        let mut block = MeminfoBlock::new();
        block.observe_marker("Total PSS by OOM adjustment:");
        block.insert("System".into(), 10);
        block.insert("Cached".into(), 5);
        block.insert("System".into(), 99);
        let sample = block.finish("a").unwrap();
        assert_eq!(
            sample.categories,
            vec![("System".to_string(), 10), ("Cached".to_string(), 5)]
        );
    }

    #[test]
    fn test_empty_block_yields_nothing() {
        let mut block = MeminfoBlock::new();
        block.observe_marker("Total PSS by OOM adjustment:");
        assert!(block.finish("a").is_none());
    }
}
