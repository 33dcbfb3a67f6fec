use grep_matcher::Matcher;
use grep_regex::{RegexMatcher, RegexMatcherBuilder};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PrefilterError {
    #[error("Prefilter needs at least one literal")]
    NoLiterals,

    #[error("Invalid prefilter pattern: {0}")]
    InvalidRegex(String),
}

/// Line-level prefilter: a line is a candidate when it contains any of the
/// registered literals. Only candidates reach the registry.
#[derive(Debug, Clone)]
pub struct LinePrefilter {
    matcher: RegexMatcher,
}

impl LinePrefilter {
    pub fn new<S: AsRef<str>>(literals: &[S]) -> Result<Self, PrefilterError> {
        if literals.is_empty() {
            return Err(PrefilterError::NoLiterals);
        }
        let pattern = literals
            .iter()
            .map(|l| regex::escape(l.as_ref()))
            .collect::<Vec<_>>()
            .join("|");

        let matcher = RegexMatcherBuilder::new()
            .case_insensitive(false)
            .multi_line(false)
            .line_terminator(Some(b'\n'))
            .build(&pattern)
            .map_err(|e| PrefilterError::InvalidRegex(e.to_string()))?;

        Ok(Self { matcher })
    }

    pub fn matcher(&self) -> &RegexMatcher {
        &self.matcher
    }

    #[inline]
    pub fn is_candidate(&self, line: &[u8]) -> bool {
        self.matcher.is_match(line).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literals_are_matched_verbatim() {
        let filter = LinePrefilter::new(&["killinfo:", "Package [", "45% TOTAL"]).unwrap();
        assert!(filter.is_candidate(b"I killinfo: [1,2,3]"));
        assert!(filter.is_candidate(b"  Package [com.foo] (1a):"));
        assert!(!filter.is_candidate(b"  Package com.foo"));
        assert!(!filter.is_candidate(b"45%TOTAL"));
    }

    #[test]
    fn test_case_sensitive() {
        let filter = LinePrefilter::new(&["TOTAL:"]).unwrap();
        assert!(!filter.is_candidate(b"total: 5"));
    }

    #[test]
    fn test_empty_literal_list_is_rejected() {
        let empty: [&str; 0] = [];
        assert!(matches!(LinePrefilter::new(&empty), Err(PrefilterError::NoLiterals)));
    }
}
