//! Per-domain wide tables.
//!
//! Each builder collects its rows, sorts them by (key, file, line) so the
//! result does not depend on the order files were scanned in, pivots them,
//! and finally sorts the table by key.

use crate::model::{Located, ParsedEvent, ProcessLifecycleEvent, RowKey, Value, WideTable};
use crate::normalize::truncate_to_second;

use super::pivot::PivotBuilder;

pub const CPU_TOTAL: &str = "cpu_total";
pub const CPU_USER: &str = "cpu_user";
pub const CPU_KERNEL: &str = "cpu_kernel";
pub const CPU_IOWAIT: &str = "cpu_iowait";

struct PivotRow<'a> {
    key: RowKey,
    file: &'a str,
    line: u64,
    fields: Vec<(String, Value)>,
}

fn pivot(mut rows: Vec<PivotRow<'_>>) -> WideTable {
    rows.sort_by(|a, b| {
        a.key
            .cmp(&b.key)
            .then_with(|| a.file.cmp(b.file))
            .then_with(|| a.line.cmp(&b.line))
    });

    let mut builder = PivotBuilder::new();
    for row in rows {
        builder.push(row.key, row.fields);
    }
    let mut table = builder.finish();
    table.sort_by_key();
    table
}

fn build<'a, F>(events: &'a [Located<ParsedEvent>], mut select: F) -> WideTable
where
    F: FnMut(&'a ParsedEvent) -> Option<(RowKey, Vec<(String, Value)>)>,
{
    let rows = events
        .iter()
        .filter_map(|located| {
            select(&located.event).map(|(key, fields)| PivotRow {
                key,
                file: located.file.as_str(),
                line: located.line,
                fields,
            })
        })
        .collect();
    pivot(rows)
}

fn kb_fields(pairs: &[(String, u64)]) -> Vec<(String, Value)> {
    pairs
        .iter()
        .map(|(name, kb)| (name.clone(), Value::from(*kb)))
        .collect()
}

/// One row per meminfo file, one column per OOM-adjustment category (KB).
pub fn memory_table(events: &[Located<ParsedEvent>]) -> WideTable {
    build(events, |event| match event {
        ParsedEvent::Meminfo(sample) => Some((
            RowKey::Source(sample.source.clone()),
            kb_fields(&sample.categories),
        )),
        _ => None,
    })
}

/// One row per meminfo file, one column per RAM summary label (KB).
pub fn ram_status_table(events: &[Located<ParsedEvent>]) -> WideTable {
    build(events, |event| match event {
        ParsedEvent::RamStatus(sample) => Some((
            RowKey::Source(sample.source.clone()),
            kb_fields(&sample.fields),
        )),
        _ => None,
    })
}

/// One row per second. Summary columns are prefixed `cpu_`, per-process
/// columns use the process name.
pub fn cpu_table(events: &[Located<ParsedEvent>]) -> WideTable {
    build(events, |event| match event {
        ParsedEvent::Cpu(sample) => {
            let summary = [
                (CPU_TOTAL, sample.total),
                (CPU_USER, sample.user),
                (CPU_KERNEL, sample.kernel),
                (CPU_IOWAIT, sample.iowait),
            ];
            let fields = summary
                .into_iter()
                .filter_map(|(name, v)| v.map(|v| (name.to_string(), Value::from(v))))
                .chain(
                    sample
                        .per_process
                        .iter()
                        .map(|(name, pct)| (name.clone(), Value::from(*pct))),
                )
                .collect();
            Some((RowKey::Time(sample.timestamp), fields))
        }
        _ => None,
    })
}

/// One row per second, one column per package (PSS in KB).
pub fn pss_table(events: &[Located<ParsedEvent>]) -> WideTable {
    build(events, |event| match event {
        ParsedEvent::Pss(sample) => Some((
            RowKey::Time(sample.timestamp),
            vec![(sample.package.clone(), Value::from(sample.pss_kb))],
        )),
        _ => None,
    })
}

/// One row per second, one column per launched component (duration in ms).
pub fn launch_table(events: &[Located<ParsedEvent>]) -> WideTable {
    build(events, |event| match event {
        ParsedEvent::Launch(launch) => Some((
            RowKey::Time(truncate_to_second(launch.timestamp)),
            vec![(launch.component.clone(), Value::from(launch.duration_ms))],
        )),
        _ => None,
    })
}

/// Process deaths ordered by (timestamp, file, line).
pub fn lifecycle_events(events: &[Located<ParsedEvent>]) -> Vec<ProcessLifecycleEvent> {
    let mut died: Vec<&Located<ParsedEvent>> = events
        .iter()
        .filter(|e| matches!(e.event, ParsedEvent::Lifecycle(_)))
        .collect();
    died.sort_by(|a, b| {
        let ts = |e: &Located<ParsedEvent>| match &e.event {
            ParsedEvent::Lifecycle(l) => Some(l.timestamp),
            _ => None,
        };
        ts(*a)
            .cmp(&ts(*b))
            .then_with(|| a.file.cmp(&b.file))
            .then_with(|| a.line.cmp(&b.line))
    });
    died.into_iter()
        .filter_map(|e| match &e.event {
            ParsedEvent::Lifecycle(l) => Some(l.clone()),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CpuSample, LaunchEvent, MeminfoSample, PssSample};
    use crate::normalize::{parse_timestamp, ProcessState};

    fn at(ts: &str) -> chrono::NaiveDateTime {
        parse_timestamp(ts, 2000).unwrap()
    }

    fn meminfo(file: &str, categories: &[(&str, u64)]) -> Located<ParsedEvent> {
        let sample = MeminfoSample {
            source: file.to_string(),
            categories: categories.iter().map(|(n, v)| (n.to_string(), *v)).collect(),
        };
        Located::new(file, 0, ParsedEvent::Meminfo(sample))
    }

    fn cpu(file: &str, line: u64, ts: &str, total: Option<f64>, procs: &[(&str, f64)]) -> Located<ParsedEvent> {
        let sample = CpuSample {
            timestamp: at(ts),
            total,
            per_process: procs.iter().map(|(n, v)| (n.to_string(), *v)).collect(),
            ..Default::default()
        };
        Located::new(file, line, ParsedEvent::Cpu(sample))
    }

    #[test]
    fn test_memory_table_rows_per_file() {
        let events = vec![
            meminfo("b/meminfo", &[("Native", 10), ("System", 20)]),
            meminfo("a/meminfo", &[("Native", 11), ("Cached", 5)]),
        ];
        let table = memory_table(&events);
        assert_eq!(table.len(), 2);
        assert_eq!(table.keys()[0], RowKey::Source("a/meminfo".into()));
        assert_eq!(table.column_names().collect::<Vec<_>>(), vec!["Native", "Cached", "System"]);
        assert_eq!(table.get(1, "Cached"), None);
    }

    #[test]
    fn test_cpu_lines_of_one_second_merge() {
        let events = vec![
            cpu("s", 1, "08-11 23:48:36", None, &[("com.foo", 25.0)]),
            cpu("s", 2, "08-11 23:48:36", None, &[("system_server", 10.0)]),
            cpu("s", 3, "08-11 23:48:36", Some(45.0), &[]),
            cpu("s", 4, "08-11 23:48:37", None, &[("com.foo", 30.0)]),
        ];
        let table = cpu_table(&events);
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(0, CPU_TOTAL), Some(&Value::Float(45.0)));
        assert_eq!(table.get(0, "system_server"), Some(&Value::Float(10.0)));
        assert_eq!(table.get(1, "com.foo"), Some(&Value::Float(30.0)));
        assert_eq!(table.get(1, CPU_TOTAL), None);
    }

    #[test]
    fn test_input_order_does_not_matter() {
        let a = vec![
            cpu("a", 1, "08-11 10:00:00", None, &[("x", 1.0)]),
            cpu("b", 1, "08-11 10:00:00", None, &[("y", 2.0)]),
            cpu("a", 2, "08-11 09:00:00", None, &[("x", 3.0)]),
        ];
        let mut b = a.clone();
        b.reverse();
        assert_eq!(cpu_table(&a), cpu_table(&b));
    }

    #[test]
    fn test_pss_and_launch_tables() {
        let pss = Located::new(
            "e",
            1,
            ParsedEvent::Pss(PssSample {
                timestamp: at("08-11 10:00:00"),
                pid: 1,
                uid: 2,
                package: "com.foo".into(),
                pss_kb: 512,
            }),
        );
        let launch = Located::new(
            "s",
            1,
            ParsedEvent::Launch(LaunchEvent {
                timestamp: at("08-11 10:00:01.250"),
                date: at("08-11 10:00:01").date(),
                component: "com.foo/.Main".into(),
                process_launch_type: "cp".into(),
                activity_launch_type: "ca".into(),
                duration_ms: 812,
            }),
        );
        let events = vec![pss, launch];

        let pss = pss_table(&events);
        assert_eq!(pss.get(0, "com.foo"), Some(&Value::Int(512)));

        let launches = launch_table(&events);
        assert_eq!(launches.keys()[0], RowKey::Time(at("08-11 10:00:01")));
        assert_eq!(launches.get(0, "com.foo/.Main"), Some(&Value::Int(812)));
    }

    #[test]
    fn test_lifecycle_sorted_by_timestamp() {
        let died = |file: &str, line: u64, ts: &str, pid: u32| {
            Located::new(
                file,
                line,
                ParsedEvent::Lifecycle(ProcessLifecycleEvent {
                    timestamp: at(ts),
                    pid,
                    name: "p".into(),
                    adj: 900,
                    process_state_code: 19,
                    state: ProcessState::CachedEmpty,
                }),
            )
        };
        let events = vec![
            died("b", 1, "08-11 10:00:02", 3),
            died("a", 5, "08-11 10:00:01", 2),
            died("a", 1, "08-11 10:00:01", 1),
        ];
        let pids: Vec<_> = lifecycle_events(&events).iter().map(|e| e.pid).collect();
        assert_eq!(pids, vec![1, 2, 3]);
    }
}
