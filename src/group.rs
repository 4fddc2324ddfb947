//! Ad-hoc group-by counts over the cleaned records.

use anyhow::{Result, anyhow};
use log::info;
use serde::Serialize;

use crate::{
    cache::DatasetCache,
    cli::{GroupArgs, Subset},
    filter::{self, YearFilter},
    frequency::{self, Direction, Group, SortBy},
    record::PersonRecord,
    schema::Field,
    table,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupRow {
    pub key: Vec<Option<String>>,
    pub count: usize,
    /// Share of the whole selection, not of the rows kept by `top`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percent: Option<f64>,
}

/// How `summarize` trims and orders the groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupOptions {
    /// Largest groups to keep; 0 keeps all.
    pub top: usize,
    pub sort: SortBy,
    pub order: Direction,
    pub shares: bool,
}

pub fn resolve_fields(names: &[String]) -> Result<Vec<Field>> {
    names
        .iter()
        .map(|name| name.trim())
        .filter(|name| !name.is_empty())
        .map(|name| {
            let field = Field::parse(name).ok_or_else(|| anyhow!("Unknown column '{name}'"))?;
            if field.is_categorical() {
                Ok(field)
            } else {
                Err(anyhow!(
                    "Column '{}' is not categorical and cannot be grouped",
                    field.canonical_name()
                ))
            }
        })
        .collect()
}

/// Counts `records` by the tuple of `fields`; missing values form their own group.
pub fn group_records<'a, I>(records: I, fields: &[Field]) -> Vec<Group<Vec<Option<String>>>>
where
    I: IntoIterator<Item = &'a PersonRecord>,
{
    frequency::count_by(records, |record: &PersonRecord| {
        fields
            .iter()
            .map(|field| record.value(*field))
            .collect::<Vec<_>>()
    })
}

/// Groups `view`, keeps the `top` largest groups, sorts them, and adds
/// percentages of the full `view` when asked.
pub fn summarize(view: &[&PersonRecord], fields: &[Field], options: GroupOptions) -> Vec<GroupRow> {
    let mut groups = group_records(view.iter().copied(), fields);
    if options.top > 0 {
        groups = frequency::top_n(groups, options.top);
    }
    frequency::sort_groups(&mut groups, options.sort, options.order);

    let percents = if options.shares {
        frequency::shares_of(&groups, view.len())
            .into_iter()
            .map(|share| Some(share.percent))
            .collect::<Vec<_>>()
    } else {
        vec![None; groups.len()]
    };
    groups
        .into_iter()
        .zip(percents)
        .map(|(group, percent)| GroupRow {
            key: group.key,
            count: group.value,
            percent,
        })
        .collect()
}

pub fn execute(args: &GroupArgs, cache: &mut DatasetCache) -> Result<()> {
    let fields = resolve_fields(&args.by)?;
    if fields.is_empty() {
        return Err(anyhow!("--by requires at least one column"));
    }
    let config = args.source.resolve_config(args.top)?;
    let dataset = crate::open_dataset(&args.source, cache)?;
    let base = match args.subset {
        Subset::All => dataset.records(),
        Subset::Fatalities => dataset.fatalities(),
    };
    let view = YearFilter::from_years(&args.years).apply(base);

    let rows = summarize(
        &view,
        &fields,
        GroupOptions {
            top: config.top.unwrap_or(0),
            sort: args.sort,
            order: args.order,
            shares: args.shares,
        },
    );

    if args.json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        let mut headers = fields
            .iter()
            .map(|field| field.canonical_name().to_string())
            .collect::<Vec<_>>();
        headers.push("count".to_string());
        if args.shares {
            headers.push("percent".to_string());
        }
        let body = rows
            .iter()
            .map(|row| {
                let mut cells = row
                    .key
                    .iter()
                    .map(|value| filter::or_no_information(value.as_deref()).to_string())
                    .collect::<Vec<_>>();
                cells.push(row.count.to_string());
                if let Some(percent) = row.percent {
                    cells.push(format!("{percent:.2}%"));
                }
                cells
            })
            .collect::<Vec<_>>();
        table::print_table(&headers, &body);
    }
    info!(
        "Grouped {} record(s) into {} group(s)",
        view.len(),
        rows.len()
    );
    Ok(())
}
