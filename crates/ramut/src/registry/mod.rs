//! Pattern registry: per event kind, an ordered list of line layouts.
//!
//! Log producers changed their line formats across software versions. Each
//! layout is a [`PatternSpec`] tagged with a version; for a given kind the
//! layouts are tried in registration order and the first match wins. A line
//! can still match several different kinds.

pub mod builtin;

use std::collections::BTreeMap;

use regex::{Captures, Regex};
use thiserror::Error;

use crate::model::EventKind;

pub use builtin::{block_markers, builtin_specs, MEMINFO_BLOCK_END, MEMINFO_BLOCK_START};

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Invalid pattern {kind}/{version}: {source}")]
    InvalidPattern {
        kind: &'static str,
        version: String,
        #[source]
        source: regex::Error,
    },

    #[error("Pattern {kind}/{version} has an empty trigger")]
    EmptyTrigger { kind: &'static str, version: String },
}

/// One line layout, before compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternSpec {
    pub kind: EventKind,
    /// Free-form tag naming the producer/version the layout belongs to
    pub version: String,
    /// Literal substring every matching line contains; feeds the scan prefilter
    pub trigger: String,
    pub pattern: String,
}

impl PatternSpec {
    pub fn new(
        kind: EventKind,
        version: impl Into<String>,
        trigger: impl Into<String>,
        pattern: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            version: version.into(),
            trigger: trigger.into(),
            pattern: pattern.into(),
        }
    }
}

#[derive(Debug)]
struct CompiledPattern {
    version: String,
    trigger: String,
    regex: Regex,
}

/// A successful match: which layout matched and what it captured.
#[derive(Debug)]
pub struct PatternMatch<'r, 'l> {
    pub kind: EventKind,
    pub version: &'r str,
    captures: Captures<'l>,
}

impl<'r, 'l> PatternMatch<'r, 'l> {
    /// Text of a named group, if the layout has it and it participated.
    pub fn get(&self, name: &str) -> Option<&'l str> {
        self.captures.name(name).map(|m| m.as_str())
    }
}

#[derive(Debug, Default)]
pub struct PatternRegistry {
    layouts: BTreeMap<EventKind, Vec<CompiledPattern>>,
}

impl PatternRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registry loaded with every built-in layout.
    pub fn builtin() -> Result<Self, RegistryError> {
        let mut registry = Self::empty();
        for spec in builtin_specs() {
            registry.append(spec)?;
        }
        Ok(registry)
    }

    /// Add a layout after the existing ones for its kind.
    pub fn append(&mut self, spec: PatternSpec) -> Result<(), RegistryError> {
        if spec.trigger.is_empty() {
            return Err(RegistryError::EmptyTrigger {
                kind: spec.kind.as_str(),
                version: spec.version,
            });
        }
        let regex = Regex::new(&spec.pattern).map_err(|source| RegistryError::InvalidPattern {
            kind: spec.kind.as_str(),
            version: spec.version.clone(),
            source,
        })?;
        self.layouts.entry(spec.kind).or_default().push(CompiledPattern {
            version: spec.version,
            trigger: spec.trigger,
            regex,
        });
        Ok(())
    }

    /// First layout of `kind` that matches `line`.
    pub fn first_match<'r, 'l>(&'r self, kind: EventKind, line: &'l str) -> Option<PatternMatch<'r, 'l>> {
        self.layouts.get(&kind)?.iter().find_map(|layout| {
            // The trigger check is cheaper than running the regex.
            if !line.contains(layout.trigger.as_str()) {
                return None;
            }
            layout.regex.captures(line).map(|captures| PatternMatch {
                kind,
                version: layout.version.as_str(),
                captures,
            })
        })
    }

    /// At most one match per kind in `kinds`, in the order given.
    pub fn matches<'r, 'l>(
        &'r self,
        kinds: &'r [EventKind],
        line: &'l str,
    ) -> impl Iterator<Item = PatternMatch<'r, 'l>> + 'r
    where
        'l: 'r,
    {
        kinds.iter().filter_map(move |kind| self.first_match(*kind, line))
    }

    /// Version tags registered for `kind`, in priority order.
    pub fn versions(&self, kind: EventKind) -> Vec<&str> {
        self.layouts
            .get(&kind)
            .map(|l| l.iter().map(|p| p.version.as_str()).collect())
            .unwrap_or_default()
    }

    /// Distinct trigger literals of the given kinds.
    pub fn triggers(&self, kinds: &[EventKind]) -> Vec<&str> {
        let mut triggers: Vec<&str> = kinds
            .iter()
            .filter_map(|k| self.layouts.get(k))
            .flatten()
            .map(|p| p.trigger.as_str())
            .collect();
        triggers.sort_unstable();
        triggers.dedup();
        triggers
    }
}
