use std::io;
use std::path::Path;

use grep_searcher::sinks::Lossy;
use grep_searcher::{BinaryDetection, SearcherBuilder};

use super::prefilter::LinePrefilter;

/// Stream the candidate lines of `path` to `on_line`, with 1-based line
/// numbers and the line terminator removed. Invalid UTF-8 is replaced, never
/// fatal. Returns the number of candidate lines.
pub fn scan_lines<F>(path: &Path, prefilter: &LinePrefilter, mut on_line: F) -> io::Result<u64>
where
    F: FnMut(u64, &str),
{
    let mut searcher = SearcherBuilder::new()
        .line_number(true)
        .binary_detection(BinaryDetection::none())
        .build();

    let mut matched = 0u64;
    searcher.search_path(
        prefilter.matcher(),
        path,
        Lossy(|line_number, line| {
            matched += 1;
            on_line(line_number, line.trim_end_matches(['\r', '\n']));
            Ok(true)
        }),
    )?;
    Ok(matched)
}
