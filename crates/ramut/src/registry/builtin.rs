//! Built-in extraction layouts.
//!
//! One row per historical line layout. Supporting a new firmware variant means
//! adding a row here (or calling [`super::PatternRegistry::append`]); the
//! normalizer only reads named groups:
//!
//! | group | meaning |
//! |---|---|
//! | `ts` | `MM-DD HH:MM:SS[.mmm]` line timestamp |
//! | `adj` | killed process adj (absent for `am_kill`) |
//! | `psi_ms` `psi_mf` `psi_is` `psi_if` `psi_cpu` | pressure-stall values |
//! | `pct` `name` | per-process CPU percentage |
//! | `total` `user` `kernel` `iowait` | CPU summary |
//! | `component` `process_type` `activity_type` `duration` | app launch |
//! | `pid` `uid` `package` `pss` | `am_pss` (pss in bytes) |
//! | `pid` `name` `adj` `state` | `am_proc_died` |
//! | `kb` `name` | meminfo category line |
//! | `label` `kb` | RAM summary line |
//! | `package` / `version` | package manager dump |

use crate::model::EventKind;

use super::PatternSpec;

/// Meminfo category lines are only read between these markers.
pub const MEMINFO_BLOCK_START: &str = "Total PSS by OOM adjustment:";
pub const MEMINFO_BLOCK_END: &str = "Total PSS by category";

const TS: &str = r"^(?P<ts>\d{2}-\d{2} \d{2}:\d{2}:\d{2}(?:\.\d{1,6})?)\s";
const TS_SECONDS: &str = r"^(?P<ts>\d{2}-\d{2} \d{2}:\d{2}:\d{2})(?:\.\d{1,6})?\s";
const NUM: &str = r"\d+(?:\.\d+)?";

/// (kind, version, trigger literal, regex body). `{TS}`/`{TSS}`/`{NUM}` are
/// expanded before compiling.
const BUILTIN: &[(EventKind, &str, &str, &str)] = &[
    // Newer lmkd layouts end with five decimal PSI values.
    (
        EventKind::Kill,
        "lmkd-psi",
        "killinfo:",
        r"{TS}.*?killinfo: \[(?P<pid>\d+),(?P<uid>\d+),(?P<adj>-?\d+),(?:[^\]]*,)?(?P<psi_ms>\d+\.\d+),(?P<psi_mf>\d+\.\d+),(?P<psi_is>\d+\.\d+),(?P<psi_if>\d+\.\d+),(?P<psi_cpu>\d+\.\d+)\]",
    ),
    (
        EventKind::Kill,
        "lmkd-legacy",
        "killinfo:",
        r"{TS}.*?killinfo: \[(?P<pid>\d+),(?P<uid>\d+),(?P<adj>-?\d+),",
    ),
    (
        EventKind::Kill,
        "am-kill",
        "am_kill",
        r"{TS}.*?am_kill\s*: \[(?P<user>\d+),(?P<pid>\d+),(?P<name>[^,\]]+),(?:-?\d+),",
    ),
    (
        EventKind::CpuProcess,
        "am-cpu",
        "ActivityManager:",
        r"{TSS}\s*\d+\s+\d+\s+I\s+ActivityManager:\s+(?P<pct>{NUM})% \d+/(?P<name>\S+):",
    ),
    (
        EventKind::CpuProcess,
        "cpu-tracker",
        "ProcessCpuTracker:",
        r"{TSS}\s*\d+\s+\d+\s+I\s+ProcessCpuTracker:\s+(?P<pct>{NUM})% \d+/(?P<name>\S+):",
    ),
    (
        EventKind::CpuTotal,
        "am-total",
        "TOTAL:",
        r"{TSS}.*?(?:ActivityManager|ProcessCpuTracker):\s+(?P<total>{NUM})% TOTAL: (?P<user>{NUM})% user \+ (?P<kernel>{NUM})% kernel(?: \+ (?P<iowait>{NUM})% iowait)?",
    ),
    (
        EventKind::CpuTotal,
        "toybox-top",
        "%cpu",
        r"{TSS}.*?(?P<total>\d+)%cpu\s+(?P<user>\d+)%user\s+\d+%nice\s+(?P<kernel>\d+)%sys\s+\d+%idle\s+(?P<iowait>\d+)%iow",
    ),
    (
        EventKind::Launch,
        "moto-csv",
        "MotoDisplayed",
        r"{TS}.*?MotoDisplayed (?P<component>[^,\s]+),(?P<process_type>\w+),(?P<activity_type>\w+),(?P<duration>\d+)",
    ),
    (
        EventKind::Launch,
        "moto-space",
        "MotoDisplayed",
        r"{TS}.*?MotoDisplayed (?P<component>[^,\s]+) (?P<process_type>\w+) (?P<activity_type>\w+) (?P<duration>\d+)",
    ),
    (
        EventKind::Pss,
        "am-pss",
        "am_pss",
        r"{TSS}.*?am_pss\s*: \[(?P<pid>\d+),(?P<uid>\d+),(?P<package>[^,]+),(?P<pss>\d+),",
    ),
    (
        EventKind::ProcessDied,
        "am-proc-died-user",
        "am_proc_died",
        r"{TS}.*?am_proc_died\s*: \[(?P<user>\d+),(?P<pid>\d+),(?P<name>[^,\]]+),(?P<adj>-?\d+),(?P<state>-?\d+)",
    ),
    (
        EventKind::ProcessDied,
        "am-proc-died",
        "am_proc_died",
        r"{TS}.*?am_proc_died\s*: \[(?P<pid>\d+),(?P<name>[^,\]]+),(?P<adj>-?\d+),(?P<state>-?\d+)\]",
    ),
    (
        EventKind::MeminfoCategory,
        "kb-suffix-k",
        "K:",
        r"^\s*(?P<kb>\d[\d,]*)K: (?P<name>.+)$",
    ),
    (
        EventKind::MeminfoCategory,
        "kb-suffix-kb",
        "kB:",
        r"^\s*(?P<kb>\d[\d,]*) kB: (?P<name>.+)$",
    ),
    (
        EventKind::RamStatus,
        "ram-line",
        " RAM:",
        r"^\s*(?P<label>Total RAM|Free RAM|Used RAM|Lost RAM):\s+(?P<kb>\d[\d,]*) ?K",
    ),
    (
        EventKind::RamStatus,
        "zram-line",
        "ZRAM:",
        r"^\s*(?P<label>ZRAM):\s+(?P<kb>\d[\d,]*) ?K physical used",
    ),
    (
        EventKind::PackageHeader,
        "pm-package",
        "Package [",
        r"^\s*Package \[(?P<package>[^\]]+)\]",
    ),
    (
        EventKind::PackageVersion,
        "pm-version",
        "versionName=",
        r"^\s*versionName=(?P<version>\S+)",
    ),
];

pub fn builtin_specs() -> Vec<PatternSpec> {
    BUILTIN
        .iter()
        .map(|(kind, version, trigger, body)| {
            let pattern = body
                .replace("{TSS}", TS_SECONDS)
                .replace("{TS}", TS)
                .replace("{NUM}", NUM);
            PatternSpec::new(*kind, *version, *trigger, pattern)
        })
        .collect()
}

/// Marker literals the scanner must let through besides the triggers.
pub fn block_markers() -> [&'static str; 2] {
    [MEMINFO_BLOCK_START, MEMINFO_BLOCK_END]
}
