//! Abnormal memory growth detection.
//!
//! A column is flagged when its coefficient of variation exceeds `ref_cov`
//! and it grew by more than `ref_diff` between its first and last sample.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::diag::{Diagnostic, DiagnosticsSink, Stage};
use crate::model::WideTable;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum StatsError {
    #[error("Series is empty")]
    Empty,

    #[error("Series mean is zero")]
    ZeroMean,
}

/// Population standard deviation divided by the mean.
pub fn coefficient_of_variation(values: &[f64]) -> Result<f64, StatsError> {
    if values.is_empty() {
        return Err(StatsError::Empty);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    if mean == 0.0 {
        return Err(StatsError::ZeroMean);
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    Ok(variance.sqrt() / mean)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnomalyThresholds {
    pub ref_cov: f64,
    /// Same unit as the table cells (KB for the memory table)
    pub ref_diff: f64,
}

impl Default for AnomalyThresholds {
    fn default() -> Self {
        Self {
            ref_cov: 0.25,
            ref_diff: 80_000.0,
        }
    }
}

impl AnomalyThresholds {
    pub fn validate(&self) -> Result<(), String> {
        if !self.ref_cov.is_finite() || self.ref_cov < 0.0 {
            return Err(format!("ref_cov must be a finite value >= 0, got {}", self.ref_cov));
        }
        if !self.ref_diff.is_finite() || self.ref_diff < 0.0 {
            return Err(format!("ref_diff must be a finite value >= 0, got {}", self.ref_diff));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnomalyRecord {
    pub process: String,
    pub cov: f64,
    pub min: f64,
    pub max: f64,
    pub initial: f64,
    pub end: f64,
}

impl AnomalyRecord {
    /// Integer-divide the sample fields by `divisor` (1024 turns KB into MB).
    /// `cov` is a ratio and stays as is.
    pub fn rescaled(&self, divisor: i64) -> AnomalyRecord {
        let scale = |v: f64| (v as i64).div_euclid(divisor.max(1)) as f64;
        AnomalyRecord {
            process: self.process.clone(),
            cov: self.cov,
            min: scale(self.min),
            max: scale(self.max),
            initial: scale(self.initial),
            end: scale(self.end),
        }
    }
}

/// Check one series. `Ok(None)` means not anomalous.
pub fn evaluate_series(
    process: &str,
    values: &[f64],
    thresholds: &AnomalyThresholds,
) -> Result<Option<AnomalyRecord>, StatsError> {
    let cov = coefficient_of_variation(values)?;
    let (Some(&initial), Some(&end)) = (values.first(), values.last()) else {
        return Err(StatsError::Empty);
    };
    if cov <= thresholds.ref_cov || end - initial <= thresholds.ref_diff {
        return Ok(None);
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    Ok(Some(AnomalyRecord {
        process: process.to_string(),
        cov,
        min,
        max,
        initial,
        end,
    }))
}

/// Every flagged column of `table`, in column order. Rows must already be
/// sorted by key.
pub fn detect_anomalies(
    table: &WideTable,
    thresholds: &AnomalyThresholds,
    sink: &dyn DiagnosticsSink,
) -> Vec<AnomalyRecord> {
    let mut records = Vec::new();
    for column in table.columns() {
        let values = column.numeric();
        match evaluate_series(column.name(), &values, thresholds) {
            Ok(Some(record)) => records.push(record),
            Ok(None) | Err(StatsError::Empty) => {}
            Err(e @ StatsError::ZeroMean) => sink.emit(
                Diagnostic::warn(Stage::Anomaly, format!("column skipped: {}", e))
                    .with_subject(column.name()),
            ),
        }
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diag::{CollectingSink, Severity};
    use crate::model::{RowKey, Value};

    fn growth() -> Vec<f64> {
        vec![10_000.0, 100_000.0, 100_000.0, 100_000.0, 100_000.0, 100_000.0]
    }

    fn table(columns: &[(&str, &[Option<i64>])]) -> WideTable {
        let rows = columns.iter().map(|(_, v)| v.len()).max().unwrap_or(0);
        let mut table = WideTable::new();
        for r in 0..rows {
            let fields = columns
                .iter()
                .filter_map(|(name, v)| v[r].map(|x| (name.to_string(), Value::Int(x))));
            table.push_row(RowKey::Source(format!("{r:02}")), fields);
        }
        table
    }

    #[test]
    fn test_constant_series_has_zero_cov() {
        assert_eq!(coefficient_of_variation(&[100.0, 100.0, 100.0]).unwrap(), 0.0);
        let strict = AnomalyThresholds {
            ref_cov: 0.0,
            ref_diff: 0.0,
        };
        assert_eq!(evaluate_series("p", &[100.0, 100.0, 100.0], &strict).unwrap(), None);
    }

    #[test]
    fn test_degenerate_series() {
        assert_eq!(coefficient_of_variation(&[]), Err(StatsError::Empty));
        assert_eq!(coefficient_of_variation(&[0.0, 0.0]), Err(StatsError::ZeroMean));
        assert_eq!(coefficient_of_variation(&[-5.0, 5.0]), Err(StatsError::ZeroMean));
    }

    #[test]
    fn test_growth_is_flagged_by_diff_threshold() {
        let values = growth();
        let cov = coefficient_of_variation(&values).unwrap();
        assert!((cov - 0.3946).abs() < 1e-3, "cov = {cov}");

        let record = evaluate_series("com.leaky", &values, &AnomalyThresholds::default())
            .unwrap()
            .unwrap();
        assert_eq!(record.min, 10_000.0);
        assert_eq!(record.max, 100_000.0);
        assert_eq!(record.initial, 10_000.0);
        assert_eq!(record.end, 100_000.0);

        let lenient = AnomalyThresholds {
            ref_cov: 0.25,
            ref_diff: 100_000.0,
        };
        assert_eq!(evaluate_series("com.leaky", &values, &lenient).unwrap(), None);
    }

    #[test]
    fn test_raising_thresholds_only_shrinks_results() {
        let t = table(&[
            ("a", &[Some(10_000), Some(100_000), Some(100_000)]),
            ("b", &[Some(1_000), Some(50_000), Some(200_000)]),
        ]);
        let sink = CollectingSink::new();
        let loose = detect_anomalies(&t, &AnomalyThresholds::default(), &sink);
        for (ref_cov, ref_diff) in [(0.5, 80_000.0), (0.25, 150_000.0), (2.0, 1e9)] {
            let strict = AnomalyThresholds { ref_cov, ref_diff };
            let found = detect_anomalies(&t, &strict, &sink);
            assert!(found.iter().all(|r| loose.iter().any(|l| l.process == r.process)));
            assert!(found.len() <= loose.len());
        }
    }

    #[test]
    fn test_missing_cells_are_dropped_and_zero_mean_reported() {
        let t = table(&[
            ("gappy", &[Some(10_000), None, Some(100_000), Some(100_000), None, Some(100_000)]),
            ("idle", &[Some(0), Some(0), None, None, None, None]),
            ("absent", &[None, None, None, None, None, None]),
        ]);
        let sink = CollectingSink::new();
        let found = detect_anomalies(&t, &AnomalyThresholds::default(), &sink);

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].process, "gappy");
        assert_eq!(found[0].initial, 10_000.0);
        assert_eq!(sink.count(Severity::Warn), 1);
        assert!(sink.contains(Stage::Anomaly, "mean is zero"));
    }

    #[test]
    fn test_rescaled_uses_integer_division() {
        let record = AnomalyRecord {
            process: "p".into(),
            cov: 0.4,
            min: 10_000.0,
            max: 102_400.0,
            initial: 10_000.0,
            end: 103_423.0,
        };
        let mb = record.rescaled(1024);
        assert_eq!(mb.min, 9.0);
        assert_eq!(mb.max, 100.0);
        assert_eq!(mb.end, 100.0);
        assert_eq!(mb.cov, 0.4);
    }

    #[test]
    fn test_threshold_validation() {
        assert!(AnomalyThresholds::default().validate().is_ok());
        let negative = AnomalyThresholds {
            ref_cov: -0.1,
            ref_diff: 1.0,
        };
        assert!(negative.validate().is_err());
        let nan = AnomalyThresholds {
            ref_cov: 0.1,
            ref_diff: f64::NAN,
        };
        assert!(nan.validate().is_err());
    }
}
