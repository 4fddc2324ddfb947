//! Pipeline configuration.
//!
//! Values resolve in three layers: built-in defaults for the ONSV legacy
//! export, an optional YAML file, then command-line flags.
//!
//! ```yaml
//! header_row: 3
//! delimiter: ","
//! encoding: latin1
//! layout: legacy
//! top: 10
//! ```

use std::path::Path;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::{
    error::ConfigError,
    io_utils::{self, SourceEncoding},
};

/// Metadata lines that precede the header in the ONSV export.
pub const DEFAULT_HEADER_ROW: usize = 3;

/// Shape of a persons source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    /// Legacy export: header offset, single-byte encoding, garbled names.
    #[default]
    Legacy,
    /// Store export: UTF-8, header on the first line, lowercase ASCII keys.
    Canonical,
}

/// Fully resolved options for reading one persons source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceOptions {
    pub header_row: usize,
    pub delimiter: u8,
    pub encoding: SourceEncoding,
    pub layout: Layout,
}

impl Default for SourceOptions {
    fn default() -> Self {
        Self::legacy()
    }
}

impl SourceOptions {
    pub fn legacy() -> Self {
        Self {
            header_row: DEFAULT_HEADER_ROW,
            delimiter: io_utils::DEFAULT_CSV_DELIMITER,
            encoding: SourceEncoding::Latin1,
            layout: Layout::Legacy,
        }
    }

    pub fn canonical() -> Self {
        Self {
            header_row: 0,
            delimiter: io_utils::DEFAULT_CSV_DELIMITER,
            encoding: SourceEncoding::Whatwg(encoding_rs::UTF_8),
            layout: Layout::Canonical,
        }
    }

    /// Stable text describing every option that changes the loaded result.
    pub fn signature(&self) -> String {
        format!(
            "header_row={};delimiter={};encoding={};layout={:?}",
            self.header_row,
            self.delimiter,
            self.encoding.name(),
            self.layout
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header_row: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delimiter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout: Option<Layout>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top: Option<usize>,
}

impl PipelineConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Layers `overrides` on top of `self`; set fields in `overrides` win.
    pub fn merge(self, overrides: PipelineConfig) -> Self {
        Self {
            header_row: overrides.header_row.or(self.header_row),
            delimiter: overrides.delimiter.or(self.delimiter),
            encoding: overrides.encoding.or(self.encoding),
            layout: overrides.layout.or(self.layout),
            top: overrides.top.or(self.top),
        }
    }

    /// Resolves the source options, starting from the defaults of the chosen layout.
    pub fn source_options(&self) -> Result<SourceOptions, ConfigError> {
        let mut options = match self.layout.unwrap_or_default() {
            Layout::Legacy => SourceOptions::legacy(),
            Layout::Canonical => SourceOptions::canonical(),
        };
        if let Some(header_row) = self.header_row {
            options.header_row = header_row;
        }
        if let Some(delimiter) = &self.delimiter {
            options.delimiter =
                io_utils::parse_delimiter(delimiter).map_err(|reason| ConfigError::Invalid {
                    field: "delimiter",
                    reason,
                })?;
        }
        if let Some(label) = &self.encoding {
            options.encoding =
                SourceEncoding::from_label(label).map_err(|err| ConfigError::Invalid {
                    field: "encoding",
                    reason: err.to_string(),
                })?;
        }
        Ok(options)
    }
}
