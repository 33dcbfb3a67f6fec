//! Model — AnalysisConfig and related structs.

use serde::{Deserialize, Serialize};

use crate::anomaly::AnomalyThresholds;
use crate::kill::KillThresholds;
use crate::normalize::TimestampPolicy;
use crate::prune::{SchemaPruner, HEAVY_CATEGORIES, LIGHT_BOUNDARIES};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Directory to scan; the CLI argument takes precedence
    pub root: Option<String>,
    pub ref_cov: f64,
    pub ref_diff: f64,
    /// Attach a real year to timestamps instead of the placeholder year
    pub parse_date: bool,
    /// Year used when `parse_date` is set; required in that case
    pub reference_year: Option<i32>,
    pub max_workers: usize,
    pub kill: KillThresholds,
    pub files: FilesConfig,
    pub prune: PruneConfig,
}

/// File-name substrings that select and classify input files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilesConfig {
    pub stream: Vec<String>,
    pub events: Vec<String>,
    pub log: Vec<String>,
    pub meminfo: Vec<String>,
    pub bugreport: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PruneConfig {
    pub heavy: Vec<String>,
    pub light_boundaries: Vec<String>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            root: None,
            ref_cov: 0.25,
            ref_diff: 80_000.0,
            parse_date: false,
            reference_year: None,
            max_workers: default_workers(),
            kill: KillThresholds::default(),
            files: FilesConfig::default(),
            prune: PruneConfig::default(),
        }
    }
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            stream: vec!["Stream-s".to_string()],
            events: vec!["events".to_string()],
            log: vec!["aplog".to_string(), "logcat".to_string()],
            meminfo: vec!["meminfo".to_string()],
            bugreport: vec!["bugreport".to_string()],
        }
    }
}

impl Default for PruneConfig {
    fn default() -> Self {
        Self {
            heavy: HEAVY_CATEGORIES.iter().map(|s| s.to_string()).collect(),
            light_boundaries: LIGHT_BOUNDARIES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

pub(crate) fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

impl AnalysisConfig {
    pub fn thresholds(&self) -> AnomalyThresholds {
        AnomalyThresholds {
            ref_cov: self.ref_cov,
            ref_diff: self.ref_diff,
        }
    }

    pub fn timestamp_policy(&self) -> TimestampPolicy {
        TimestampPolicy::from_config(self.parse_date, self.reference_year)
    }

    pub fn pruner(&self) -> SchemaPruner {
        SchemaPruner::new(self.prune.heavy.clone(), self.prune.light_boundaries.clone())
    }
}

impl FilesConfig {
    pub fn validate(&self) -> Result<(), String> {
        let all = [
            ("stream", &self.stream),
            ("events", &self.events),
            ("log", &self.log),
            ("meminfo", &self.meminfo),
            ("bugreport", &self.bugreport),
        ];
        if all.iter().all(|(_, markers)| markers.is_empty()) {
            return Err("files: at least one file name marker is required".to_string());
        }
        for (name, markers) in all {
            if markers.iter().any(|m| m.is_empty()) {
                return Err(format!("files.{} contains an empty marker", name));
            }
        }
        Ok(())
    }
}
