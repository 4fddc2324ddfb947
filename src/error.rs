//! Error types surfaced by the loading pipeline and the incident feed.
//!
//! None of these are fatal to the process. Loader failures degrade to an
//! empty [`Dataset`](crate::pipeline::Dataset) at the UI boundary, and the
//! command layer wraps them in `anyhow` context for reporting.

use std::path::PathBuf;

use thiserror::Error;

/// Failures while reading or normalizing a source table.
#[derive(Debug, Error)]
pub enum DataLoadError {
    #[error("source file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to read source {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse delimited text at record {record}: {source}")]
    Csv {
        record: usize,
        #[source]
        source: csv::Error,
    },

    #[error("could not decode record {record} as {encoding}")]
    Decode {
        record: usize,
        encoding: &'static str,
    },

    #[error("no header row found at offset {header_row}")]
    MissingHeader { header_row: usize },

    #[error("record {record} has {found} field(s) but the header declares {expected}")]
    RaggedRow {
        record: usize,
        expected: usize,
        found: usize,
    },

    #[error("column '{column}' appears more than once after normalization")]
    DuplicateColumn { column: String },

    #[error("required column '{column}' is missing")]
    MissingColumn { column: String },

    #[error("unknown encoding '{label}'")]
    UnknownEncoding { label: String },
}

/// Failures while reading the live incident feed.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("failed to read feed {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse feed record {record}: {source}")]
    Csv {
        record: usize,
        #[source]
        source: csv::Error,
    },

    #[error("feed is missing column '{column}'")]
    MissingColumn { column: String },

    #[error("feed record {record} has {found} field(s) but the header declares {expected}")]
    RaggedRow {
        record: usize,
        expected: usize,
        found: usize,
    },
}

/// Failures while loading a pipeline configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid value for '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}
