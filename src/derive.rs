//! Numeric and categorical fields derived from raw text.
//!
//! Parsing never fails loudly: a value that cannot be read becomes `None`
//! and bumps a counter in [`ParseWarnings`]. Per-row details are not kept.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::category::AgeRange;

/// Exact marker the source uses for "age not stated".
pub const AGE_NOT_STATED: &str = "NO INDICA";

pub const MIN_AGE: f64 = 0.0;
pub const MAX_AGE: f64 = 120.0;

/// Lower bounds of the numeric buckets, ascending. Each bucket is `[bound, next)`,
/// and the last one is closed at [`MAX_AGE`].
const BUCKET_LOWER_BOUNDS: [(f64, AgeRange); 6] = [
    (0.0, AgeRange::Under18),
    (18.0, AgeRange::From18To29),
    (30.0, AgeRange::From30To44),
    (45.0, AgeRange::From45To59),
    (60.0, AgeRange::From60To74),
    (75.0, AgeRange::From75),
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AgeValue {
    Missing,
    NotStated,
    Unparseable,
    Value(f64),
}

impl AgeValue {
    pub fn as_f64(self) -> Option<f64> {
        match self {
            AgeValue::Value(age) => Some(age),
            _ => None,
        }
    }
}

pub fn parse_age(raw: Option<&str>) -> AgeValue {
    let Some(raw) = raw else {
        return AgeValue::Missing;
    };
    let raw = raw.trim();
    if raw == AGE_NOT_STATED {
        return AgeValue::NotStated;
    }
    match raw.parse::<f64>() {
        Ok(age) if age.is_finite() => AgeValue::Value(age),
        _ => AgeValue::Unparseable,
    }
}

/// Bucket for `age`; `None` for a missing age or one outside `[0, 120]`.
pub fn age_range(age: Option<f64>) -> Option<AgeRange> {
    let age = age?;
    if !(MIN_AGE..=MAX_AGE).contains(&age) {
        return None;
    }
    BUCKET_LOWER_BOUNDS
        .iter()
        .rev()
        .find(|(lower, _)| age >= *lower)
        .map(|(_, range)| *range)
}

/// Accepts `2021` as well as spreadsheet-style `2021.0`.
pub fn parse_year(raw: &str) -> Option<i32> {
    let trimmed = raw.trim();
    if let Ok(year) = trimmed.parse::<i32>() {
        return Some(year);
    }
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite() && value.fract() == 0.0)
        .filter(|value| (f64::from(i32::MIN)..=f64::from(i32::MAX)).contains(value))
        .map(|value| value as i32)
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d", "%d-%m-%Y"];
    let trimmed = raw.trim();
    // Spreadsheet exports may carry a midnight time component.
    let date_part = trimmed.split_whitespace().next().unwrap_or(trimmed);
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date_part, fmt).ok())
}

/// Year from the explicit column, falling back to the date.
pub fn resolve_year(year: Option<i32>, date: Option<NaiveDate>) -> Option<i32> {
    year.or_else(|| date.map(|d| d.year()))
}

/// Aggregate counts of values that could not be parsed or recognized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ParseWarnings {
    pub age_missing: usize,
    pub age_not_stated: usize,
    pub age_unparseable: usize,
    pub age_out_of_range: usize,
    pub year_unparseable: usize,
    pub date_unparseable: usize,
    pub severity_unrecognized: usize,
    pub sex_unrecognized: usize,
}

impl ParseWarnings {
    /// Rows whose age range ends up null, for any reason.
    pub fn null_age_ranges(&self) -> usize {
        self.age_missing + self.age_not_stated + self.age_unparseable + self.age_out_of_range
    }

    pub fn record_age(&mut self, value: AgeValue, range: Option<AgeRange>) {
        match value {
            AgeValue::Missing => self.age_missing += 1,
            AgeValue::NotStated => self.age_not_stated += 1,
            AgeValue::Unparseable => self.age_unparseable += 1,
            AgeValue::Value(_) if range.is_none() => self.age_out_of_range += 1,
            AgeValue::Value(_) => {}
        }
    }

    pub fn is_clean(&self) -> bool {
        *self == ParseWarnings::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_stated_sentinel_is_exact() {
        assert_eq!(parse_age(Some("NO INDICA")), AgeValue::NotStated);
        assert_eq!(parse_age(Some("no indica")), AgeValue::Unparseable);
        assert_eq!(parse_age(None), AgeValue::Missing);
        assert_eq!(parse_age(Some(" 34 ")), AgeValue::Value(34.0));
        assert_eq!(parse_age(Some("34.5")), AgeValue::Value(34.5));
        assert_eq!(parse_age(Some("inf")), AgeValue::Unparseable);
    }

    #[test]
    fn bucket_boundaries_are_left_closed() {
        let cases = [
            (0.0, Some(AgeRange::Under18)),
            (17.9, Some(AgeRange::Under18)),
            (18.0, Some(AgeRange::From18To29)),
            (29.99, Some(AgeRange::From18To29)),
            (30.0, Some(AgeRange::From30To44)),
            (45.0, Some(AgeRange::From45To59)),
            (60.0, Some(AgeRange::From60To74)),
            (74.5, Some(AgeRange::From60To74)),
            (75.0, Some(AgeRange::From75)),
            (120.0, Some(AgeRange::From75)),
            (120.01, None),
            (-0.5, None),
        ];
        for (age, expected) in cases {
            assert_eq!(age_range(Some(age)), expected, "age {age}");
        }
        assert_eq!(age_range(None), None);
    }

    #[test]
    fn years_accept_float_spelling() {
        assert_eq!(parse_year("2022"), Some(2022));
        assert_eq!(parse_year("2022.0"), Some(2022));
        assert_eq!(parse_year("2022.5"), None);
        assert_eq!(parse_year("dos mil"), None);
    }

    #[test]
    fn dates_accept_day_first_and_iso() {
        let expected = NaiveDate::from_ymd_opt(2023, 2, 14).unwrap();
        assert_eq!(parse_date("14/02/2023"), Some(expected));
        assert_eq!(parse_date("2023-02-14"), Some(expected));
        assert_eq!(parse_date("2023-02-14 00:00:00"), Some(expected));
        assert_eq!(parse_date("febrero"), None);
        assert_eq!(resolve_year(None, Some(expected)), Some(2023));
        assert_eq!(resolve_year(Some(2021), Some(expected)), Some(2021));
    }

    #[test]
    fn warnings_split_null_age_causes() {
        let mut warnings = ParseWarnings::default();
        warnings.record_age(AgeValue::Missing, None);
        warnings.record_age(AgeValue::NotStated, None);
        warnings.record_age(AgeValue::Value(130.0), None);
        warnings.record_age(AgeValue::Value(30.0), Some(AgeRange::From30To44));
        assert_eq!(warnings.null_age_ranges(), 3);
        assert_eq!(warnings.age_out_of_range, 1);
        assert!(!warnings.is_clean());
    }
}
