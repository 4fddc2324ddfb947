use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::{
    charts::ChartKind,
    config::{Layout, PipelineConfig, SourceOptions},
    frequency::{Direction, SortBy},
    io_utils::parse_delimiter,
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Clean and summarize ONSV road-fatality records", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print headline metrics and the cleaning report
    Summary(SummaryArgs),
    /// Produce one of the dashboard chart datasets
    Chart(ChartArgs),
    /// Count records grouped by one or more columns
    Group(GroupArgs),
    /// Write the cleaned records as UTF-8 CSV
    Export(ExportArgs),
    /// Clean a scraped traffic-incident feed into map points
    Feed(FeedArgs),
}

/// Where the persons table comes from and how to read it.
#[derive(Debug, Clone, Args)]
pub struct SourceArgs {
    /// Persons CSV file
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// YAML pipeline configuration
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,
    /// Number of lines preceding the header row
    #[arg(long = "header-row")]
    pub header_row: Option<usize>,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long)]
    pub delimiter: Option<String>,
    /// Character encoding of the input file (defaults to latin1)
    #[arg(long = "encoding")]
    pub encoding: Option<String>,
    /// Source layout
    #[arg(long, value_enum)]
    pub layout: Option<Layout>,
}

impl SourceArgs {
    /// Defaults, then the config file, then flags.
    pub fn resolve_config(&self, top: Option<usize>) -> Result<PipelineConfig> {
        let base = match &self.config {
            Some(path) => PipelineConfig::load(path)
                .with_context(|| format!("Loading config from {path:?}"))?,
            None => PipelineConfig::default(),
        };
        Ok(base.merge(PipelineConfig {
            header_row: self.header_row,
            delimiter: self.delimiter.clone(),
            encoding: self.encoding.clone(),
            layout: self.layout,
            top,
        }))
    }

    pub fn source_options(&self) -> Result<SourceOptions> {
        let config = self.resolve_config(None)?;
        Ok(config.source_options()?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
#[value(rename_all = "kebab-case")]
pub enum Subset {
    /// Every normalized record
    All,
    /// The cleaned fatality subset
    #[default]
    Fatalities,
}

#[derive(Debug, Args)]
pub struct SummaryArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    /// Restrict the "selection" metric to these years
    #[arg(long, value_delimiter = ',')]
    pub years: Vec<i32>,
    /// Emit JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct ChartArgs {
    /// Chart dataset to produce
    #[arg(value_enum)]
    pub kind: ChartKind,
    #[command(flatten)]
    pub source: SourceArgs,
    /// Restrict fatality charts to these years
    #[arg(long, value_delimiter = ',')]
    pub years: Vec<i32>,
    /// Number of departments for the departments chart
    #[arg(long)]
    pub top: Option<usize>,
    /// Emit JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct GroupArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    /// Columns to group by (canonical names or ASCII keys), comma separated
    #[arg(long = "by", value_delimiter = ',', required = true)]
    pub by: Vec<String>,
    /// Records to aggregate
    #[arg(long, value_enum, default_value_t = Subset::Fatalities)]
    pub subset: Subset,
    /// Restrict to these years
    #[arg(long, value_delimiter = ',')]
    pub years: Vec<i32>,
    /// Keep only the N largest groups (0 keeps all)
    #[arg(long)]
    pub top: Option<usize>,
    /// Sort key
    #[arg(long, value_enum, default_value_t = SortBy::Value)]
    pub sort: SortBy,
    /// Sort direction
    #[arg(long, value_enum, default_value_t = Direction::Desc)]
    pub order: Direction,
    /// Add a percentage-of-total column
    #[arg(long)]
    pub shares: bool,
    /// Emit JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    /// Output CSV file (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Records to export
    #[arg(long, value_enum, default_value_t = Subset::Fatalities)]
    pub subset: Subset,
    /// Restrict to these years
    #[arg(long, value_delimiter = ',')]
    pub years: Vec<i32>,
}

#[derive(Debug, Args)]
pub struct FeedArgs {
    /// Feed CSV file
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Output CSV file for the cleaned points (stdout table if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Input holds store rows (`cod_sin,lat,lon,fecha`) instead of the scraped table
    #[arg(long)]
    pub store: bool,
    /// CSV delimiter character
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Emit JSON instead of a table
    #[arg(long)]
    pub json: bool,
}
