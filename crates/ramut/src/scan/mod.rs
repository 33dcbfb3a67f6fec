//! Scan — file discovery, prefiltered line streaming, per-file extraction.

pub mod extract;
pub mod prefilter;
pub mod reader;
pub mod walk;

pub use extract::{FileExtract, FileExtractor};
pub use prefilter::{LinePrefilter, PrefilterError};
pub use reader::scan_lines;
pub use walk::{CandidateFile, Discovery, FileClass, FileRules};
