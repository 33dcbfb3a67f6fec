//! Kill bucket classifier: severity buckets per day and PSI extrema.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::model::{KillEvent, PsiSample, AM_KILL_ADJ};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KillBucket {
    AmKill,
    Heavy,
    Critical,
    Medium,
}

/// Right-exclusive adj cutoffs. `heavy_upper = 200, critical_upper = 920`
/// reproduces the older reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KillThresholds {
    pub heavy_upper: i32,
    pub critical_upper: i32,
}

impl Default for KillThresholds {
    fn default() -> Self {
        Self {
            heavy_upper: 201,
            critical_upper: 921,
        }
    }
}

impl KillThresholds {
    pub fn classify(&self, adj: i32) -> KillBucket {
        if adj == AM_KILL_ADJ {
            KillBucket::AmKill
        } else if adj < self.heavy_upper {
            KillBucket::Heavy
        } else if adj < self.critical_upper {
            KillBucket::Critical
        } else {
            KillBucket::Medium
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.heavy_upper <= 0 {
            return Err("kill.heavy_upper must be > 0".to_string());
        }
        if self.critical_upper <= self.heavy_upper {
            return Err(format!(
                "kill.critical_upper ({}) must be greater than kill.heavy_upper ({})",
                self.critical_upper, self.heavy_upper
            ));
        }
        Ok(())
    }
}

/// Classify with the default 201/921 cutoffs.
pub fn classify_kill(adj: i32) -> KillBucket {
    KillThresholds::default().classify(adj)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct KillCounts {
    pub heavy: u64,
    pub critical: u64,
    pub medium: u64,
    pub am_kill: u64,
}

impl KillCounts {
    pub fn add(&mut self, bucket: KillBucket) {
        match bucket {
            KillBucket::AmKill => self.am_kill += 1,
            KillBucket::Heavy => self.heavy += 1,
            KillBucket::Critical => self.critical += 1,
            KillBucket::Medium => self.medium += 1,
        }
    }

    pub fn merge(&mut self, other: &KillCounts) {
        self.heavy += other.heavy;
        self.critical += other.critical;
        self.medium += other.medium;
        self.am_kill += other.am_kill;
    }

    pub fn total(&self) -> u64 {
        self.heavy + self.critical + self.medium + self.am_kill
    }
}

/// Running kill counters of one or more files.
///
/// Merging is a per-day counter sum plus an element-wise PSI max, so
/// tallies can be folded in any order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KillTally {
    per_day: BTreeMap<NaiveDate, KillCounts>,
    psi_max: Option<PsiSample>,
}

impl KillTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, event: &KillEvent, thresholds: &KillThresholds) {
        let bucket = thresholds.classify(event.killed_adj);
        self.per_day
            .entry(event.timestamp.date())
            .or_default()
            .add(bucket);
        if let Some(psi) = event.psi {
            self.psi_max = Some(match self.psi_max {
                Some(current) => current.max(psi),
                None => psi,
            });
        }
    }

    pub fn merge(&mut self, other: &KillTally) {
        for (day, counts) in &other.per_day {
            self.per_day.entry(*day).or_default().merge(counts);
        }
        self.psi_max = match (self.psi_max, other.psi_max) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
    }

    pub fn summarize(&self) -> KillReport {
        let rows = self
            .per_day
            .iter()
            .map(|(date, counts)| KillSummaryRow::new(*date, counts))
            .collect();
        KillReport {
            rows,
            psi_max: self.psi_max,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KillSummaryRow {
    pub date: NaiveDate,
    pub heavy_kill: u64,
    pub critical_kill: u64,
    pub medium_kill: u64,
    pub am_kill: u64,
    pub total_kills: u64,
    pub heavy_kill_per_hour: f64,
}

impl KillSummaryRow {
    fn new(date: NaiveDate, counts: &KillCounts) -> Self {
        Self {
            date,
            heavy_kill: counts.heavy,
            critical_kill: counts.critical,
            medium_kill: counts.medium,
            am_kill: counts.am_kill,
            total_kills: counts.total(),
            heavy_kill_per_hour: counts.heavy as f64 / 24.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct KillReport {
    /// One row per day, ascending
    pub rows: Vec<KillSummaryRow>,
    /// Largest value seen per PSI metric, if any kill carried PSI
    pub psi_max: Option<PsiSample>,
}
