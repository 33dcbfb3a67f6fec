//! Report — the result bundle and the hand-off to a reporting collaborator.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::info;

use crate::anomaly::AnomalyRecord;
use crate::diag::ScanStats;
use crate::kill::KillReport;
use crate::launch::LaunchSummaryRow;
use crate::model::{ProcessLifecycleEvent, WideTable};

/// KB to MB, for human-facing numbers.
pub const KB_PER_MB: i64 = 1024;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    /// Memory categories per meminfo file (KB)
    pub memory: WideTable,
    /// `memory` after schema pruning; the anomaly input
    pub memory_pruned: WideTable,
    pub ram_status: WideTable,
    pub cpu: WideTable,
    pub pss: WideTable,
    pub launch: WideTable,
    /// In KB; see [`AnomalyRecord::rescaled`]
    pub anomalies: Vec<AnomalyRecord>,
    pub kills: KillReport,
    pub launch_summary: Vec<LaunchSummaryRow>,
    pub lifecycle: Vec<ProcessLifecycleEvent>,
    /// Package → versionName from the most recent bugreport
    pub package_versions: BTreeMap<String, String>,
    pub stats: ScanStats,
}

/// Receives the finished analysis. Persistence and rendering live behind
/// this trait.
pub trait Reporter {
    fn report(&self, report: &AnalysisReport);
}

/// Logs a short summary.
#[derive(Debug, Default, Clone, Copy)]
pub struct SummaryReporter;

impl Reporter for SummaryReporter {
    fn report(&self, report: &AnalysisReport) {
        let stats = &report.stats;
        info!(
            "Scanned {}/{} files ({} failed), {} records, {} dropped",
            stats.files_scanned,
            stats.files_discovered,
            stats.files_failed,
            stats.records_extracted,
            stats.records_dropped
        );
        info!(
            "Tables: memory {}x{}, cpu {}x{}, pss {}x{}, launch {}x{}",
            report.memory.len(),
            report.memory.width(),
            report.cpu.len(),
            report.cpu.width(),
            report.pss.len(),
            report.pss.width(),
            report.launch.len(),
            report.launch.width()
        );

        for a in &report.anomalies {
            let mb = a.rescaled(KB_PER_MB);
            info!(
                process = %a.process,
                "Abnormal growth: cov={:.3} initial={}MB end={}MB min={}MB max={}MB",
                a.cov, mb.initial, mb.end, mb.min, mb.max
            );
        }

        for row in &report.kills.rows {
            info!(
                "Kills {}: heavy={} critical={} medium={} am_kill={} total={} heavy/h={:.2}",
                row.date,
                row.heavy_kill,
                row.critical_kill,
                row.medium_kill,
                row.am_kill,
                row.total_kills,
                row.heavy_kill_per_hour
            );
        }
        if let Some(psi) = &report.kills.psi_max {
            info!(
                "PSI max: mem some={} full={} io some={} full={} cpu={}",
                psi.memory_some, psi.memory_full, psi.io_some, psi.io_full, psi.cpu
            );
        }

        for row in &report.launch_summary {
            info!(
                "Launches {}: total={} warm={} ratio={:.2} mean={:.0}ms",
                row.date,
                row.total_launch_count,
                row.warm_process_count,
                row.warm_process_ratio,
                row.mean_duration_ms
            );
        }
        if !report.package_versions.is_empty() {
            info!("{} package versions recorded", report.package_versions.len());
        }
    }
}
