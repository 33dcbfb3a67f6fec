//! Normalize — registry captures into typed events.

pub mod meminfo;
pub mod records;
pub mod state;
pub mod time;

use thiserror::Error;

pub use meminfo::MeminfoBlock;
pub use records::{
    cpu_process, cpu_total, kill_event, launch_event, lifecycle_event, meminfo_category,
    pss_sample, ram_status,
};
pub use state::ProcessState;
pub use time::{parse_timestamp, truncate_to_second, TimestampPolicy, PLACEHOLDER_YEAR};

#[derive(Debug, Error, PartialEq)]
pub enum NormalizeError {
    #[error("Invalid timestamp: {0:?}")]
    InvalidTimestamp(String),

    #[error("Invalid number in {field}: {value:?}")]
    InvalidNumber { field: &'static str, value: String },

    #[error("Missing capture group: {0}")]
    MissingField(&'static str),
}

/// Size in KB as printed by dumpsys (`12,345`).
pub fn parse_kb(field: &'static str, text: &str) -> Result<u64, NormalizeError> {
    let digits: String = text.chars().filter(|c| *c != ',').collect();
    digits.trim().parse().map_err(|_| NormalizeError::InvalidNumber {
        field,
        value: text.to_string(),
    })
}

pub fn parse_int<T: std::str::FromStr>(field: &'static str, text: &str) -> Result<T, NormalizeError> {
    text.trim().parse().map_err(|_| NormalizeError::InvalidNumber {
        field,
        value: text.to_string(),
    })
}

pub fn parse_float(field: &'static str, text: &str) -> Result<f64, NormalizeError> {
    match text.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(NormalizeError::InvalidNumber {
            field,
            value: text.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_kb_strips_thousands_separators() {
        assert_eq!(parse_kb("kb", "1,234,567").unwrap(), 1_234_567);
        assert_eq!(parse_kb("kb", "42").unwrap(), 42);
        assert!(parse_kb("kb", "12a").is_err());
    }

    #[test]
    fn test_parse_int_and_float() {
        assert_eq!(parse_int::<i32>("adj", "-17").unwrap(), -17);
        assert!(parse_int::<u32>("pid", "-1").is_err());
        assert_eq!(parse_float("pct", "12.5").unwrap(), 12.5);
        assert!(parse_float("pct", "NaN").is_err());
    }
}
