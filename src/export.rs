use anyhow::{Context, Result};
use log::info;

use crate::{
    cache::DatasetCache,
    cli::{ExportArgs, Subset},
    filter::YearFilter,
    io_utils,
    record::PersonRecord,
};

pub fn execute(args: &ExportArgs, cache: &mut DatasetCache) -> Result<()> {
    let dataset = crate::open_dataset(&args.source, cache)?;
    let base = match args.subset {
        Subset::All => dataset.records(),
        Subset::Fatalities => dataset.fatalities(),
    };
    let view = YearFilter::from_years(&args.years).apply(base);

    let mut writer =
        io_utils::open_csv_writer(args.output.as_deref(), io_utils::DEFAULT_CSV_DELIMITER)?;
    writer
        .write_record(PersonRecord::export_headers())
        .context("Writing output headers")?;
    for (idx, record) in view.iter().enumerate() {
        writer
            .write_record(record.export_row())
            .with_context(|| format!("Writing output row {}", idx + 2))?;
    }
    writer.flush().context("Flushing output writer")?;

    let destination = args
        .output
        .as_ref()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "stdout".to_string());
    info!("Exported {} record(s) -> {}", view.len(), destination);
    Ok(())
}
