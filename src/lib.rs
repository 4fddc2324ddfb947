pub mod cache;
pub mod category;
pub mod charts;
pub mod cli;
pub mod config;
pub mod derive;
pub mod error;
pub mod export;
pub mod feed;
pub mod filter;
pub mod frequency;
pub mod group;
pub mod io_utils;
pub mod normalize;
pub mod pipeline;
pub mod record;
pub mod schema;
pub mod summary;
pub mod table;

use std::{env, sync::Arc, sync::OnceLock};

use anyhow::{Result, bail};
use clap::Parser;
use log::{LevelFilter, error, info};

use crate::{
    cache::DatasetCache,
    cli::{Cli, Commands, SourceArgs},
    pipeline::Dataset,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("siniestros", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let mut cache = DatasetCache::new();
    match cli.command {
        Commands::Summary(args) => summary::execute(&args, &mut cache),
        Commands::Chart(args) => charts::execute(&args, &mut cache),
        Commands::Group(args) => group::execute(&args, &mut cache),
        Commands::Export(args) => export::execute(&args, &mut cache),
        Commands::Feed(args) => feed::execute(&args),
    }
}

/// Loads the persons table through `cache`, refusing to continue without data.
pub(crate) fn open_dataset(source: &SourceArgs, cache: &mut DatasetCache) -> Result<Arc<Dataset>> {
    let options = source.source_options()?;
    info!(
        "Loading '{}' (header row {}, delimiter '{}', {}, {:?} layout)",
        source.input.display(),
        options.header_row,
        io_utils::printable_delimiter(options.delimiter),
        options.encoding.name(),
        options.layout
    );
    let dataset = match cache.get_or_load(&source.input, &options) {
        Ok(dataset) => dataset,
        Err(err) => {
            error!("Could not load '{}': {err}", source.input.display());
            bail!("No data available from {:?}", source.input);
        }
    };
    if !dataset.is_available() {
        error!(
            "'{}' yielded {} record(s) and {} fatality record(s)",
            source.input.display(),
            dataset.records().len(),
            dataset.fatalities().len()
        );
        bail!("No data available from {:?}", source.input);
    }
    Ok(dataset)
}
