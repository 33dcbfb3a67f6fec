//! Year-less log timestamps (`MM-DD HH:MM:SS[.mmm]`).

use chrono::{NaiveDateTime, Timelike};

use super::NormalizeError;

/// Year used when calendar dates are not wanted. A leap year, so `02-29`
/// is still representable.
pub const PLACEHOLDER_YEAR: i32 = 2000;

/// How a year-less timestamp gets its year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampPolicy {
    /// Attach an externally provided year (real calendar dates)
    ReferenceYear(i32),
    /// Attach [`PLACEHOLDER_YEAR`] so runs from different captures line up
    Placeholder,
}

impl TimestampPolicy {
    /// Real dates need both `parse_date` and a `reference_year`; anything
    /// else is the placeholder policy.
    pub fn from_config(parse_date: bool, reference_year: Option<i32>) -> Self {
        match (parse_date, reference_year) {
            (true, Some(year)) => TimestampPolicy::ReferenceYear(year),
            _ => TimestampPolicy::Placeholder,
        }
    }

    pub fn year(&self) -> i32 {
        match self {
            TimestampPolicy::ReferenceYear(year) => *year,
            TimestampPolicy::Placeholder => PLACEHOLDER_YEAR,
        }
    }

    pub fn parse(&self, text: &str) -> Result<NaiveDateTime, NormalizeError> {
        parse_timestamp(text, self.year())
    }
}

/// Parse `MM-DD HH:MM:SS` with an optional fractional second.
pub fn parse_timestamp(text: &str, year: i32) -> Result<NaiveDateTime, NormalizeError> {
    NaiveDateTime::parse_from_str(&format!("{}-{}", year, text.trim()), "%Y-%m-%d %H:%M:%S%.f")
        .map_err(|_| NormalizeError::InvalidTimestamp(text.to_string()))
}

/// Drop sub-second precision.
pub fn truncate_to_second(ts: NaiveDateTime) -> NaiveDateTime {
    ts.with_nanosecond(0).unwrap_or(ts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn test_parse_with_millis() {
        let ts = parse_timestamp("08-11 23:48:36.163", 2024).unwrap();
        assert_eq!(ts.to_string(), "2024-08-11 23:48:36.163");
    }

    #[test]
    fn test_parse_without_fraction() {
        let ts = parse_timestamp("08-11 23:48:36", 2024).unwrap();
        assert_eq!(ts.to_string(), "2024-08-11 23:48:36");
    }

    #[test]
    fn test_short_fraction_is_scaled() {
        let ts = parse_timestamp("01-02 03:04:05.5", 2024).unwrap();
        assert_eq!(ts.nanosecond() / 1_000_000, 500);
    }

    #[test]
    fn test_invalid_inputs_are_errors() {
        for bad in [
            "",
            "08-11",
            "13-01 00:00:00",
            "02-30 00:00:00",
            "08-11 25:00:00",
            "08-11 1:2",
            "08-11 10:00:00.x",
            "08-11 10:00:00 trailing",
        ] {
            assert!(parse_timestamp(bad, 2024).is_err(), "{bad:?} should fail");
        }
    }

    #[test]
    fn test_placeholder_accepts_leap_day() {
        let ts = TimestampPolicy::Placeholder.parse("02-29 12:00:00.000").unwrap();
        assert_eq!(ts.year(), PLACEHOLDER_YEAR);
    }

    #[test]
    fn test_reference_year_policy() {
        let policy = TimestampPolicy::from_config(true, Some(2023));
        assert_eq!(policy, TimestampPolicy::ReferenceYear(2023));
        assert_eq!(policy.parse("08-11 23:48:36.000").unwrap().year(), 2023);
        assert_eq!(TimestampPolicy::from_config(false, Some(2023)), TimestampPolicy::Placeholder);
        assert_eq!(TimestampPolicy::from_config(true, None), TimestampPolicy::Placeholder);
    }

    #[test]
    fn test_truncate_to_second() {
        let ts = parse_timestamp("08-11 23:48:36.999", 2024).unwrap();
        assert_eq!(truncate_to_second(ts).to_string(), "2024-08-11 23:48:36");
    }
}
