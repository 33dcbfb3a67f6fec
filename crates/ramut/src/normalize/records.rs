//! One builder per event kind. Each reads the named groups of a
//! [`PatternMatch`] and coerces them; any failure drops the whole record.

use crate::model::{
    CpuSample, KillEvent, KillSource, LaunchEvent, ProcessLifecycleEvent, PsiSample, PssSample,
    AM_KILL_ADJ,
};
use crate::registry::PatternMatch;

use super::state::ProcessState;
use super::time::{truncate_to_second, TimestampPolicy};
use super::{parse_float, parse_int, parse_kb, NormalizeError};

fn field<'l>(m: &PatternMatch<'_, 'l>, name: &'static str) -> Result<&'l str, NormalizeError> {
    m.get(name).ok_or(NormalizeError::MissingField(name))
}

fn optional_float(m: &PatternMatch<'_, '_>, name: &'static str) -> Result<Option<f64>, NormalizeError> {
    m.get(name).map(|v| parse_float(name, v)).transpose()
}

pub fn kill_event(m: &PatternMatch<'_, '_>, policy: TimestampPolicy) -> Result<KillEvent, NormalizeError> {
    let timestamp = policy.parse(field(m, "ts")?)?;

    let (killed_adj, source) = match m.get("adj") {
        Some(adj) => (parse_int("adj", adj)?, KillSource::Kill),
        None => (AM_KILL_ADJ, KillSource::AmKill),
    };

    let psi = match (
        m.get("psi_ms"),
        m.get("psi_mf"),
        m.get("psi_is"),
        m.get("psi_if"),
        m.get("psi_cpu"),
    ) {
        (Some(ms), Some(mf), Some(is), Some(iff), Some(cpu)) => Some(PsiSample {
            memory_some: parse_float("psi_ms", ms)?,
            memory_full: parse_float("psi_mf", mf)?,
            io_some: parse_float("psi_is", is)?,
            io_full: parse_float("psi_if", iff)?,
            cpu: parse_float("psi_cpu", cpu)?,
        }),
        _ => None,
    };

    Ok(KillEvent {
        timestamp,
        killed_adj,
        source,
        psi,
    })
}

/// A per-process CPU line, as a sample with a single process entry.
pub fn cpu_process(m: &PatternMatch<'_, '_>, policy: TimestampPolicy) -> Result<CpuSample, NormalizeError> {
    let timestamp = truncate_to_second(policy.parse(field(m, "ts")?)?);
    let name = field(m, "name")?.to_string();
    let pct = parse_float("pct", field(m, "pct")?)?;
    Ok(CpuSample {
        timestamp,
        per_process: vec![(name, pct)],
        ..Default::default()
    })
}

/// A CPU TOTAL line, as a sample with only the summary fields.
pub fn cpu_total(m: &PatternMatch<'_, '_>, policy: TimestampPolicy) -> Result<CpuSample, NormalizeError> {
    let timestamp = truncate_to_second(policy.parse(field(m, "ts")?)?);
    Ok(CpuSample {
        timestamp,
        total: Some(parse_float("total", field(m, "total")?)?),
        user: optional_float(m, "user")?,
        kernel: optional_float(m, "kernel")?,
        iowait: optional_float(m, "iowait")?,
        per_process: Vec::new(),
    })
}

pub fn launch_event(m: &PatternMatch<'_, '_>, policy: TimestampPolicy) -> Result<LaunchEvent, NormalizeError> {
    let timestamp = policy.parse(field(m, "ts")?)?;
    Ok(LaunchEvent {
        timestamp,
        date: timestamp.date(),
        component: field(m, "component")?.to_string(),
        process_launch_type: field(m, "process_type")?.to_string(),
        activity_launch_type: field(m, "activity_type")?.to_string(),
        duration_ms: parse_int("duration", field(m, "duration")?)?,
    })
}

/// `am_pss` reports bytes; the sample keeps KB.
pub fn pss_sample(m: &PatternMatch<'_, '_>, policy: TimestampPolicy) -> Result<PssSample, NormalizeError> {
    let timestamp = truncate_to_second(policy.parse(field(m, "ts")?)?);
    let pss_bytes: u64 = parse_int("pss", field(m, "pss")?)?;
    Ok(PssSample {
        timestamp,
        pid: parse_int("pid", field(m, "pid")?)?,
        uid: parse_int("uid", field(m, "uid")?)?,
        package: field(m, "package")?.trim().to_string(),
        pss_kb: pss_bytes / 1024,
    })
}

pub fn lifecycle_event(
    m: &PatternMatch<'_, '_>,
    policy: TimestampPolicy,
) -> Result<ProcessLifecycleEvent, NormalizeError> {
    let timestamp = policy.parse(field(m, "ts")?)?;
    let process_state_code = parse_int("state", field(m, "state")?)?;
    Ok(ProcessLifecycleEvent {
        timestamp,
        pid: parse_int("pid", field(m, "pid")?)?,
        name: field(m, "name")?.to_string(),
        adj: parse_int("adj", field(m, "adj")?)?,
        process_state_code,
        state: ProcessState::from_code(process_state_code),
    })
}

/// `(category, kb)` from a meminfo line. The category is the text before the
/// first `(`, with every whitespace character removed.
pub fn meminfo_category(m: &PatternMatch<'_, '_>) -> Result<(String, u64), NormalizeError> {
    let raw = field(m, "name")?;
    let head = raw.split('(').next().unwrap_or(raw);
    let name: String = head.chars().filter(|c| !c.is_whitespace()).collect();
    if name.is_empty() {
        return Err(NormalizeError::MissingField("name"));
    }
    Ok((name, parse_kb("kb", field(m, "kb")?)?))
}

pub fn ram_status(m: &PatternMatch<'_, '_>) -> Result<(String, u64), NormalizeError> {
    let label = field(m, "label")?.trim().to_string();
    Ok((label, parse_kb("kb", field(m, "kb")?)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EventKind;
    use crate::registry::PatternRegistry;

    const POLICY: TimestampPolicy = TimestampPolicy::ReferenceYear(2024);

    fn with_match<T>(kind: EventKind, line: &str, f: impl FnOnce(&PatternMatch<'_, '_>) -> T) -> T {
        let registry = PatternRegistry::builtin().unwrap();
        let m = registry.first_match(kind, line).expect("line should match");
        f(&m)
    }

    #[test]
    fn test_kill_with_psi() {
        let line = "08-11 23:48:36.163  1953  1953 I killinfo: [12345,10123,905,900,45000,2,120000,0,3.50,1.25,0.75,0.10,12.40]";
        let kill = with_match(EventKind::Kill, line, |m| kill_event(m, POLICY)).unwrap();
        assert_eq!(kill.killed_adj, 905);
        assert_eq!(kill.source, KillSource::Kill);
        let psi = kill.psi.unwrap();
        assert_eq!(psi.memory_some, 3.5);
        assert_eq!(psi.cpu, 12.4);
        assert_eq!(kill.timestamp.to_string(), "2024-08-11 23:48:36.163");
    }

    #[test]
    fn test_legacy_kill_has_no_psi() {
        let line = "08-11 23:48:36.163  1953  1953 I killinfo: [12345,10123,150,100,45000,2]";
        let kill = with_match(EventKind::Kill, line, |m| kill_event(m, POLICY)).unwrap();
        assert_eq!(kill.killed_adj, 150);
        assert!(kill.psi.is_none());
    }

    #[test]
    fn test_am_kill_uses_sentinel_adj() {
        let line = "08-11 23:48:36.163  1953  2750 I am_kill : [0,12345,com.foo,900,empty #17]";
        let kill = with_match(EventKind::Kill, line, |m| kill_event(m, POLICY)).unwrap();
        assert_eq!(kill.killed_adj, AM_KILL_ADJ);
        assert_eq!(kill.source, KillSource::AmKill);
    }

    #[test]
    fn test_cpu_process_key_is_truncated() {
        let line = "08-11 23:48:36.900  1953  2750 I ActivityManager:   25% 1234/com.foo: 20% user + 5% kernel";
        let sample = with_match(EventKind::CpuProcess, line, |m| cpu_process(m, POLICY)).unwrap();
        assert_eq!(sample.timestamp.to_string(), "2024-08-11 23:48:36");
        assert_eq!(sample.per_process, vec![("com.foo".to_string(), 25.0)]);
        assert!(sample.total.is_none());
    }

    #[test]
    fn test_cpu_total_fields() {
        let line = "08-11 23:48:36.100  1953  2750 I ActivityManager: 45% TOTAL: 20% user + 25% kernel";
        let sample = with_match(EventKind::CpuTotal, line, |m| cpu_total(m, POLICY)).unwrap();
        assert_eq!(sample.total, Some(45.0));
        assert_eq!(sample.kernel, Some(25.0));
        assert_eq!(sample.iowait, None);
    }

    #[test]
    fn test_launch_event() {
        let line = "08-11 23:48:36.100  1953  2750 I LaunchCheckinHandler: MotoDisplayed com.foo/.Main,wp,ca,2992";
        let launch = with_match(EventKind::Launch, line, |m| launch_event(m, POLICY)).unwrap();
        assert_eq!(launch.component, "com.foo/.Main");
        assert_eq!(launch.duration_ms, 2992);
        assert!(launch.is_warm_process());
        assert_eq!(launch.date.to_string(), "2024-08-11");
    }

    #[test]
    fn test_pss_bytes_become_kb() {
        let line = "08-11 23:48:36.100  1953  2750 I am_pss  : [1234,10100,com.foo,52429823,40000000,0]";
        let pss = with_match(EventKind::Pss, line, |m| pss_sample(m, POLICY)).unwrap();
        assert_eq!(pss.pss_kb, 51200);
        assert_eq!(pss.package, "com.foo");
    }

    #[test]
    fn test_lifecycle_state_mapping() {
        let line = "08-11 23:48:36.100  1953  2750 I am_proc_died: [0,1234,com.foo,900,19]";
        let died = with_match(EventKind::ProcessDied, line, |m| lifecycle_event(m, POLICY)).unwrap();
        assert_eq!(died.state, ProcessState::CachedEmpty);

        let line = "08-11 23:48:36.100  1953  2750 I am_proc_died: [1234,com.foo,900,42]";
        let died = with_match(EventKind::ProcessDied, line, |m| lifecycle_event(m, POLICY)).unwrap();
        assert_eq!(died.state, ProcessState::Unknown(42));
        assert_eq!(died.process_state_code, 42);
    }

    #[test]
    fn test_meminfo_category_name_cleanup() {
        let (name, kb) = with_match(EventKind::MeminfoCategory, "   52,100K: Perceptible Medium", |m| {
            meminfo_category(m)
        })
        .unwrap();
        assert_eq!(name, "PerceptibleMedium");
        assert_eq!(kb, 52_100);

        let (name, _) = with_match(EventKind::MeminfoCategory, "    12,345K: system_server (pid 123)", |m| {
            meminfo_category(m)
        })
        .unwrap();
        assert_eq!(name, "system_server");
    }

    #[test]
    fn test_invalid_timestamp_drops_record() {
        let line = "13-45 23:48:36.163  1953  1953 I killinfo: [12345,10123,150,100,45000,2]";
        let err = with_match(EventKind::Kill, line, |m| kill_event(m, POLICY)).unwrap_err();
        assert!(matches!(err, NormalizeError::InvalidTimestamp(_)));
    }

    #[test]
    fn test_ram_status() {
        let (label, kb) =
            with_match(EventKind::RamStatus, " Used RAM: 2,345,678K (1,000K used pss)", |m| ram_status(m)).unwrap();
        assert_eq!(label, "Used RAM");
        assert_eq!(kb, 2_345_678);
    }
}
