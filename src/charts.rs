//! Chart datasets for the dashboard.
//!
//! Groups with a null key are left out of every chart, the same way a
//! grouped count over a missing category produces no bar.

use anyhow::Result;
use clap::ValueEnum;
use log::info;
use serde::Serialize;

use crate::{
    cache::DatasetCache,
    category::{AgeRange, Category, Severity, Sex},
    cli::ChartArgs,
    filter::YearFilter,
    frequency::{self, Direction, Group, SortBy},
    pipeline::{self, Dataset},
    record::PersonRecord,
    table,
};

pub const DEFAULT_TOP_DEPARTMENTS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "kebab-case")]
pub enum ChartKind {
    /// Persons per year and severity (all records)
    Trend,
    /// Departments with the most fatalities
    Departments,
    /// Fatalities per incident class
    IncidentClass,
    /// Fatalities per age range and sex
    AgeSex,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartRow {
    pub labels: Vec<String>,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chart {
    pub title: String,
    pub columns: Vec<String>,
    pub rows: Vec<ChartRow>,
}

impl Chart {
    fn new<K>(
        title: &str,
        columns: &[&str],
        groups: Vec<Group<K>>,
        labels: impl Fn(&K) -> Vec<String>,
    ) -> Self {
        Self {
            title: title.to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: groups
                .into_iter()
                .map(|group| ChartRow {
                    labels: labels(&group.key),
                    count: group.value,
                })
                .collect(),
        }
    }

    pub fn total(&self) -> usize {
        self.rows.iter().map(|row| row.count).sum()
    }

    pub fn table_rows(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| {
                row.labels
                    .iter()
                    .cloned()
                    .chain(std::iter::once(row.count.to_string()))
                    .collect()
            })
            .collect()
    }
}

/// Persons per (year, severity), ordered by year then severity.
pub fn severity_trend(records: &[PersonRecord]) -> Vec<Group<(i32, Severity)>> {
    let keys = records
        .iter()
        .filter_map(|record| Some((record.year?, record.severity?)))
        .collect::<Vec<_>>();
    let mut groups = frequency::count_by(keys.iter(), |key: &(i32, Severity)| *key);
    frequency::sort_groups(&mut groups, SortBy::Category, Direction::Asc);
    groups
}

/// The `n` departments with the most records, largest first; ties keep first-seen order.
pub fn top_departments(view: &[&PersonRecord], n: usize) -> Vec<Group<String>> {
    let keys = view
        .iter()
        .filter_map(|record| record.department.clone())
        .collect::<Vec<_>>();
    frequency::top_n(frequency::count_by(keys.iter(), |k: &String| k.clone()), n)
}

/// Records per incident class, largest first.
pub fn incident_classes(view: &[&PersonRecord]) -> Vec<Group<String>> {
    let keys = view
        .iter()
        .filter_map(|record| record.incident_class.clone())
        .collect::<Vec<_>>();
    let mut groups = frequency::count_by(keys.iter(), |k: &String| k.clone());
    frequency::sort_groups(&mut groups, SortBy::Value, Direction::Desc);
    groups
}

/// Records per (age range, sex) in age order (unknown last), then sex order.
pub fn age_sex(view: &[&PersonRecord]) -> Vec<Group<(AgeRange, Sex)>> {
    let keys = view
        .iter()
        .filter_map(|record| Some((record.age_range?, record.sex?)))
        .collect::<Vec<_>>();
    let mut groups = frequency::count_by(keys.iter(), |key: &(AgeRange, Sex)| *key);
    frequency::sort_groups(&mut groups, SortBy::Category, Direction::Asc);
    groups
}

/// Builds a chart. The trend uses every record; the rest use the fatality `view`.
pub fn build(kind: ChartKind, dataset: &Dataset, view: &[&PersonRecord], top: usize) -> Chart {
    match kind {
        ChartKind::Trend => Chart::new(
            "Personas involucradas por gravedad y año",
            &["año", "gravedad", "personas"],
            severity_trend(dataset.records()),
            |(year, severity)| vec![year.to_string(), severity.display().to_string()],
        ),
        ChartKind::Departments => Chart::new(
            &format!("Top {top} departamentos con más fallecidos"),
            &["departamento", "fallecidos"],
            top_departments(view, top),
            |department| vec![department.clone()],
        ),
        ChartKind::IncidentClass => Chart::new(
            "Fallecidos por clase de siniestro",
            &["clase de siniestro", "fallecidos"],
            incident_classes(view),
            |class| vec![class.clone()],
        ),
        ChartKind::AgeSex => Chart::new(
            "Fallecidos por rango de edad y sexo",
            &["rango de edad", "sexo", "fallecidos"],
            age_sex(view),
            |(range, sex)| vec![range.display().to_string(), sex.display().to_string()],
        ),
    }
}

/// Headline figures shown above the charts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Metrics {
    /// Distinct incident codes across every record.
    pub distinct_incidents: usize,
    pub total_records: usize,
    pub fatalities: usize,
    /// Fatalities within the current year selection.
    pub selected_fatalities: usize,
    pub selected_incidents: usize,
    pub dropped_missing_vehicle: usize,
}

pub fn metrics(dataset: &Dataset, view: &[&PersonRecord]) -> Metrics {
    Metrics {
        distinct_incidents: dataset.distinct_incidents(),
        total_records: dataset.records().len(),
        fatalities: dataset.fatalities().len(),
        selected_fatalities: view.len(),
        selected_incidents: pipeline::distinct_incidents(view.iter().copied()),
        dropped_missing_vehicle: dataset.report().fatalities.dropped_missing_vehicle,
    }
}

pub fn execute(args: &ChartArgs, cache: &mut DatasetCache) -> Result<()> {
    let config = args.source.resolve_config(args.top)?;
    let dataset = crate::open_dataset(&args.source, cache)?;
    let filter = YearFilter::from_years(&args.years);
    let view = filter.apply(dataset.fatalities());
    let top = config.top.unwrap_or(DEFAULT_TOP_DEPARTMENTS);
    let chart = build(args.kind, &dataset, &view, top);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&chart)?);
    } else {
        println!("{}", chart.title);
        table::print_table(&chart.columns, &chart.table_rows());
    }
    info!(
        "Chart '{}' has {} row(s) covering {} record(s)",
        chart.title,
        chart.rows.len(),
        chart.total()
    );
    Ok(())
}
