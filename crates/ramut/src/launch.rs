//! Per-day app launch summary.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::model::{LaunchEvent, Located, ParsedEvent};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LaunchSummaryRow {
    pub date: NaiveDate,
    pub total_launch_count: u64,
    pub warm_process_count: u64,
    /// `warm_process_count / total_launch_count`, 0.0 without launches
    pub warm_process_ratio: f64,
    pub mean_duration_ms: f64,
}

#[derive(Default)]
struct DayTotals {
    launches: u64,
    warm: u64,
    duration_ms: u64,
}

pub fn summarize<'a>(launches: impl IntoIterator<Item = &'a LaunchEvent>) -> Vec<LaunchSummaryRow> {
    let mut days: BTreeMap<NaiveDate, DayTotals> = BTreeMap::new();
    for launch in launches {
        let day = days.entry(launch.date).or_default();
        day.launches += 1;
        day.duration_ms += launch.duration_ms;
        if launch.is_warm_process() {
            day.warm += 1;
        }
    }

    days.into_iter()
        .map(|(date, t)| {
            let (ratio, mean) = if t.launches == 0 {
                (0.0, 0.0)
            } else {
                (
                    t.warm as f64 / t.launches as f64,
                    t.duration_ms as f64 / t.launches as f64,
                )
            };
            LaunchSummaryRow {
                date,
                total_launch_count: t.launches,
                warm_process_count: t.warm,
                warm_process_ratio: ratio,
                mean_duration_ms: mean,
            }
        })
        .collect()
}

/// [`summarize`] over the launch events of a reduced event list.
pub fn summarize_events(events: &[Located<ParsedEvent>]) -> Vec<LaunchSummaryRow> {
    summarize(events.iter().filter_map(|e| match &e.event {
        ParsedEvent::Launch(launch) => Some(launch),
        _ => None,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::parse_timestamp;

    fn launch(ts: &str, kind: &str, duration_ms: u64) -> LaunchEvent {
        let timestamp = parse_timestamp(ts, 2024).unwrap();
        LaunchEvent {
            timestamp,
            date: timestamp.date(),
            component: "com.foo/.Main".into(),
            process_launch_type: kind.into(),
            activity_launch_type: "ca".into(),
            duration_ms,
        }
    }

    #[test]
    fn test_per_day_ratio_and_mean() {
        let launches = vec![
            launch("08-11 10:00:00.000", "wp", 300),
            launch("08-11 11:00:00.000", "cp", 900),
            launch("08-11 12:00:00.000", "wp", 300),
            launch("08-12 09:00:00.000", "cp", 1000),
        ];
        let rows = summarize(&launches);
        assert_eq!(rows.len(), 2);

        assert_eq!(rows[0].total_launch_count, 3);
        assert_eq!(rows[0].warm_process_count, 2);
        assert!((rows[0].warm_process_ratio - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(rows[0].mean_duration_ms, 500.0);

        assert_eq!(rows[1].warm_process_ratio, 0.0);
        assert_eq!(rows[1].mean_duration_ms, 1000.0);
    }

    #[test]
    fn test_no_launches_no_rows() {
        let none: Vec<LaunchEvent> = Vec::new();
        assert!(summarize(&none).is_empty());
    }
}
