use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::normalize::state::ProcessState;

/// The kind of record a registry pattern extracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// One `size: name` line inside a meminfo OOM-adjustment block
    MeminfoCategory,
    /// Total/Free/Used/Lost RAM and ZRAM summary lines of a meminfo dump
    RamStatus,
    /// lmkd `killinfo` and ActivityManager `am_kill` lines
    Kill,
    /// Per-process line of an ActivityManager CPU usage dump
    CpuProcess,
    /// TOTAL line of a CPU usage dump
    CpuTotal,
    /// App launch completion lines
    Launch,
    /// `am_pss` event lines
    Pss,
    /// `am_proc_died` event lines
    ProcessDied,
    /// `Package [name]` header of a package manager dump
    PackageHeader,
    /// `versionName=` line of a package manager dump
    PackageVersion,
}

impl EventKind {
    pub const ALL: [EventKind; 10] = [
        EventKind::MeminfoCategory,
        EventKind::RamStatus,
        EventKind::Kill,
        EventKind::CpuProcess,
        EventKind::CpuTotal,
        EventKind::Launch,
        EventKind::Pss,
        EventKind::ProcessDied,
        EventKind::PackageHeader,
        EventKind::PackageVersion,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::MeminfoCategory => "meminfo_category",
            EventKind::RamStatus => "ram_status",
            EventKind::Kill => "kill",
            EventKind::CpuProcess => "cpu_process",
            EventKind::CpuTotal => "cpu_total",
            EventKind::Launch => "launch",
            EventKind::Pss => "pss",
            EventKind::ProcessDied => "process_died",
            EventKind::PackageHeader => "package_header",
            EventKind::PackageVersion => "package_version",
        }
    }
}

/// Adj value reserved for kills that carry no adj information (`am_kill`).
pub const AM_KILL_ADJ: i32 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KillSource {
    /// lmkd `killinfo` record
    Kill,
    /// ActivityManager `am_kill` record
    AmKill,
}

/// Pressure-stall information attached to newer lmkd kill records.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PsiSample {
    pub memory_some: f64,
    pub memory_full: f64,
    pub io_some: f64,
    pub io_full: f64,
    pub cpu: f64,
}

impl PsiSample {
    /// Element-wise maximum of two samples.
    pub fn max(self, other: PsiSample) -> PsiSample {
        PsiSample {
            memory_some: self.memory_some.max(other.memory_some),
            memory_full: self.memory_full.max(other.memory_full),
            io_some: self.io_some.max(other.io_some),
            io_full: self.io_full.max(other.io_full),
            cpu: self.cpu.max(other.cpu),
        }
    }
}

/// Per-category sizes of one meminfo snapshot, in first-seen order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeminfoSample {
    /// File identity (path relative to the scan root)
    pub source: String,
    pub categories: Vec<(String, u64)>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RamStatusSample {
    pub source: String,
    pub fields: Vec<(String, u64)>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KillEvent {
    pub timestamp: NaiveDateTime,
    pub killed_adj: i32,
    pub source: KillSource,
    pub psi: Option<PsiSample>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct CpuSample {
    pub timestamp: NaiveDateTime,
    pub total: Option<f64>,
    pub user: Option<f64>,
    pub kernel: Option<f64>,
    pub iowait: Option<f64>,
    pub per_process: Vec<(String, f64)>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LaunchEvent {
    pub timestamp: NaiveDateTime,
    pub date: NaiveDate,
    pub component: String,
    pub process_launch_type: String,
    pub activity_launch_type: String,
    pub duration_ms: u64,
}

impl LaunchEvent {
    /// Warm process launch: the process was already resident.
    pub fn is_warm_process(&self) -> bool {
        self.process_launch_type == "wp"
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PssSample {
    pub timestamp: NaiveDateTime,
    pub pid: u32,
    pub uid: u32,
    pub package: String,
    pub pss_kb: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessLifecycleEvent {
    pub timestamp: NaiveDateTime,
    pub pid: u32,
    pub name: String,
    pub adj: i32,
    pub process_state_code: i32,
    pub state: ProcessState,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PackageVersion {
    pub package: String,
    pub version: String,
}

/// A normalized record extracted from one or more log lines.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ParsedEvent {
    Meminfo(MeminfoSample),
    RamStatus(RamStatusSample),
    Kill(KillEvent),
    Cpu(CpuSample),
    Launch(LaunchEvent),
    Pss(PssSample),
    Lifecycle(ProcessLifecycleEvent),
    PackageVersion(PackageVersion),
}

/// An event together with the place it was read from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Located<T> {
    pub file: String,
    pub line: u64,
    pub event: T,
}

impl<T> Located<T> {
    pub fn new(file: impl Into<String>, line: u64, event: T) -> Self {
        Self {
            file: file.into(),
            line,
            event,
        }
    }
}
