use anyhow::Result;
use log::info;
use serde::Serialize;

use crate::{
    cache::DatasetCache,
    charts::{self, Metrics},
    cli::SummaryArgs,
    filter::{self, YearFilter},
    pipeline::PipelineReport,
    table,
};

#[derive(Debug, Serialize)]
struct Summary<'a> {
    fingerprint: Option<&'a str>,
    years: Vec<i32>,
    metrics: Metrics,
    report: &'a PipelineReport,
}

pub fn execute(args: &SummaryArgs, cache: &mut DatasetCache) -> Result<()> {
    let dataset = crate::open_dataset(&args.source, cache)?;
    let view = YearFilter::from_years(&args.years).apply(dataset.fatalities());
    let metrics = charts::metrics(&dataset, &view);
    let report = dataset.report();

    if args.json {
        let summary = Summary {
            fingerprint: dataset.fingerprint().map(|f| f.as_str()),
            years: filter::available_years(dataset.fatalities()),
            metrics,
            report,
        };
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    let years = filter::available_years(dataset.fatalities())
        .iter()
        .map(|y| y.to_string())
        .collect::<Vec<_>>()
        .join(",");
    let warnings = &report.warnings;
    table::print_key_values(&[
        ("distinct incidents", metrics.distinct_incidents.to_string()),
        ("records", metrics.total_records.to_string()),
        ("fatalities", metrics.fatalities.to_string()),
        ("fatalities in selection", metrics.selected_fatalities.to_string()),
        ("incidents in selection", metrics.selected_incidents.to_string()),
        ("years", years),
        ("fatality rows matched", report.fatalities.matched.to_string()),
        (
            "dropped without vehicle",
            report.fatalities.dropped_missing_vehicle.to_string(),
        ),
        (
            "age ranges imputed",
            report.fatalities.imputed_age_ranges.to_string(),
        ),
        ("null age ranges", warnings.null_age_ranges().to_string()),
        ("unparseable ages", warnings.age_unparseable.to_string()),
        (
            "unrecognized severities",
            warnings.severity_unrecognized.to_string(),
        ),
    ]);
    info!(
        "Summarized {} record(s) from {:?}",
        metrics.total_records, args.source.input
    );
    Ok(())
}
