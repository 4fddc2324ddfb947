//! Fatality subset derivation and read-only views over cleaned records.
//!
//! [`derive_fatalities`] applies the null policy in a fixed order:
//!
//! 1. keep records whose severity is exactly `FALLECIDO`;
//! 2. replace a null age range with `EDAD DESCONOCIDA`;
//! 3. drop records without a vehicle type (counted, logged);
//! 4. leave every other nullable field null.

use std::collections::BTreeSet;

use log::{debug, warn};
use serde::Serialize;

use crate::{category::AgeRange, record::PersonRecord};

/// Render-time placeholder for nullable fields a view wants to show.
pub const NO_INFORMATION: &str = "SIN INFORMACIÓN";

pub fn or_no_information(value: Option<&str>) -> &str {
    value.unwrap_or(NO_INFORMATION)
}

/// Counts describing one fatality derivation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FatalityCounts {
    /// Records matching the fatality severity, before any drop.
    pub matched: usize,
    pub imputed_age_ranges: usize,
    pub dropped_missing_vehicle: usize,
    pub retained: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FatalitySubset {
    records: Vec<PersonRecord>,
    counts: FatalityCounts,
}

impl FatalitySubset {
    pub fn records(&self) -> &[PersonRecord] {
        &self.records
    }

    pub fn counts(&self) -> FatalityCounts {
        self.counts
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

pub fn derive_fatalities(records: &[PersonRecord]) -> FatalitySubset {
    let mut matched = records
        .iter()
        .filter(|record| record.is_fatality())
        .cloned()
        .collect::<Vec<_>>();
    let matched_count = matched.len();

    let mut imputed = 0usize;
    for record in &mut matched {
        if record.age_range.is_none() {
            record.age_range = Some(AgeRange::Unknown);
            imputed += 1;
        }
    }

    matched.retain(|record| record.vehicle.is_some());
    let dropped = matched_count - matched.len();
    if dropped > 0 {
        warn!(
            "Dropped {} fatality record(s) without a vehicle type ({:.2}% of {})",
            dropped,
            dropped as f64 / matched_count as f64 * 100.0,
            matched_count
        );
    }
    debug!(
        "Fatality subset: {} matched, {} age range(s) imputed, {} retained",
        matched_count,
        imputed,
        matched.len()
    );

    let counts = FatalityCounts {
        matched: matched_count,
        imputed_age_ranges: imputed,
        dropped_missing_vehicle: dropped,
        retained: matched.len(),
    };
    FatalitySubset {
        records: matched,
        counts,
    }
}

/// Year selection for dashboard views.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum YearFilter {
    #[default]
    All,
    /// Only these years; records without a year never match.
    Only(BTreeSet<i32>),
}

impl YearFilter {
    pub fn from_years(years: &[i32]) -> Self {
        if years.is_empty() {
            YearFilter::All
        } else {
            YearFilter::Only(years.iter().copied().collect())
        }
    }

    pub fn matches(&self, record: &PersonRecord) -> bool {
        match self {
            YearFilter::All => true,
            YearFilter::Only(years) => record.year.is_some_and(|year| years.contains(&year)),
        }
    }

    pub fn apply<'a>(&self, records: &'a [PersonRecord]) -> Vec<&'a PersonRecord> {
        records.iter().filter(|record| self.matches(record)).collect()
    }
}

/// Sorted distinct years present in `records`.
pub fn available_years(records: &[PersonRecord]) -> Vec<i32> {
    records
        .iter()
        .filter_map(|record| record.year)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
