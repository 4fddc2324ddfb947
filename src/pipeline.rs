//! Load → normalize → derive → filter.
//!
//! A [`Dataset`] is built once per source and never mutated afterwards; the
//! record slices it hands out are the only way to reach its contents.

use std::path::Path;

use log::{debug, error, info, warn};
use serde::Serialize;

use crate::{
    cache::Fingerprint,
    config::{Layout, SourceOptions},
    derive::ParseWarnings,
    error::DataLoadError,
    filter::{self, FatalityCounts, FatalitySubset},
    frequency,
    io_utils,
    normalize::{self, Normalizer, Table},
    record::PersonRecord,
    schema::ColumnMap,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PipelineReport {
    /// Rows in the normalized table, before any severity filtering.
    pub source_rows: usize,
    pub fatalities: FatalityCounts,
    pub warnings: ParseWarnings,
}

#[derive(Debug, Clone, Default)]
pub struct Dataset {
    fingerprint: Option<Fingerprint>,
    records: Vec<PersonRecord>,
    fatalities: FatalitySubset,
    report: PipelineReport,
}

impl Dataset {
    /// The "no data available" signal.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn load(path: &Path, options: &SourceOptions) -> Result<Self, DataLoadError> {
        let bytes = io_utils::read_source(path)?;
        let fingerprint = Fingerprint::of(&bytes, options);
        Self::from_bytes(&bytes, options, fingerprint)
    }

    /// Loads `path`, degrading any failure to [`Dataset::empty`] after logging it.
    pub fn load_or_empty(path: &Path, options: &SourceOptions) -> Self {
        match Self::load(path, options) {
            Ok(dataset) => dataset,
            Err(err) => {
                error!("Could not load '{}': {err}", path.display());
                Self::empty()
            }
        }
    }

    pub fn from_bytes(
        bytes: &[u8],
        options: &SourceOptions,
        fingerprint: Fingerprint,
    ) -> Result<Self, DataLoadError> {
        let raw = normalize::read_table(bytes, options)?;
        let normalizer = match options.layout {
            Layout::Legacy => Normalizer::legacy(options.encoding),
            Layout::Canonical => Normalizer::passthrough(),
        };
        let table = normalizer.normalize(&raw)?;
        let mut dataset = Self::from_table(&table, options.layout)?;
        dataset.fingerprint = Some(fingerprint);
        Ok(dataset)
    }

    /// Binds, derives and filters an already normalized table.
    pub fn from_table(table: &Table, layout: Layout) -> Result<Self, DataLoadError> {
        if table.is_empty() {
            warn!("Source table has no data rows; skipping derivation");
            return Ok(Self::empty());
        }
        let columns = ColumnMap::resolve(table.headers(), layout)?;

        let mut warnings = ParseWarnings::default();
        let records = table
            .rows()
            .iter()
            .map(|row| PersonRecord::bind(row, &columns, &mut warnings))
            .collect::<Vec<_>>();
        debug!("Bound {} record(s)", records.len());
        if !warnings.is_clean() {
            warn!(
                "Parse warnings: {} null age range(s) ({} not stated, {} unparseable, {} out of range), {} unrecognized severity, {} unrecognized sex, {} bad date(s), {} bad year(s)",
                warnings.null_age_ranges(),
                warnings.age_not_stated,
                warnings.age_unparseable,
                warnings.age_out_of_range,
                warnings.severity_unrecognized,
                warnings.sex_unrecognized,
                warnings.date_unparseable,
                warnings.year_unparseable
            );
        }

        let fatalities = filter::derive_fatalities(&records);
        let report = PipelineReport {
            source_rows: records.len(),
            fatalities: fatalities.counts(),
            warnings,
        };
        info!(
            "Loaded {} record(s); {} fatality record(s) retained of {} matched",
            report.source_rows, report.fatalities.retained, report.fatalities.matched
        );
        Ok(Self {
            fingerprint: None,
            records,
            fatalities,
            report,
        })
    }

    pub fn fingerprint(&self) -> Option<&Fingerprint> {
        self.fingerprint.as_ref()
    }

    /// Every normalized record, before severity filtering.
    pub fn records(&self) -> &[PersonRecord] {
        &self.records
    }

    pub fn fatalities(&self) -> &[PersonRecord] {
        self.fatalities.records()
    }

    pub fn report(&self) -> &PipelineReport {
        &self.report
    }

    /// False when either table is empty; dependent views must not be computed.
    pub fn is_available(&self) -> bool {
        !self.records.is_empty() && !self.fatalities.is_empty()
    }

    pub fn distinct_incidents(&self) -> usize {
        distinct_incidents(self.records.iter())
    }
}

/// Unique incident codes among `records`; records without a code count once together.
pub fn distinct_incidents<'a, I>(records: I) -> usize
where
    I: IntoIterator<Item = &'a PersonRecord>,
{
    frequency::distinct_count(records, |record: &'a PersonRecord| {
        record.incident_code.as_deref()
    })
}
