//! Cleaning of the scraped live traffic-incident feed.
//!
//! The feed is consumed as an already fetched table, either the scraped
//! incident list or rows previously pushed to the remote store. Feed data
//! never enters the dataset cache.

use std::{path::Path, sync::LazyLock};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use log::{debug, info};
use regex::Regex;
use serde::Serialize;

use crate::{cli::FeedArgs, error::FeedError, io_utils, table};

pub const TRAFFIC_KEYWORDS: [&str; 4] = ["AUTOMOVIL", "CAMIONETA", "MOTO", "VEHICULAR"];

const REPORT_COLUMN: &str = "Nro Parte";
const TIMESTAMP_COLUMN: &str = "Fecha y hora";
const ADDRESS_COLUMN: &str = "Dirección / Distrito";
const TYPE_COLUMN: &str = "Tipo";
const STORE_COLUMNS: [&str; 4] = ["cod_sin", "lat", "lon", "fecha"];

/// One row of the scraped incident table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedRow {
    pub report_number: String,
    pub timestamp: Option<String>,
    pub address: Option<String>,
    pub incident_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IncidentPoint {
    pub report_number: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub date: Option<NaiveDate>,
}

impl IncidentPoint {
    pub fn has_location(&self) -> bool {
        self.latitude.is_some() && self.longitude.is_some()
    }

    fn store_row(&self) -> Vec<String> {
        vec![
            self.report_number.clone(),
            self.latitude.map(|v| v.to_string()).unwrap_or_default(),
            self.longitude.map(|v| v.to_string()).unwrap_or_default(),
            self.date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MapCenter {
    pub latitude: f64,
    pub longitude: f64,
}

fn read_bytes(path: &Path) -> Result<Vec<u8>, FeedError> {
    io_utils::read_bytes(path).map_err(|source| FeedError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn headed_records(
    bytes: &[u8],
    delimiter: u8,
    required: &[&str],
) -> Result<(Vec<usize>, Vec<csv::StringRecord>), FeedError> {
    let mut reader = io_utils::open_headed_csv_reader(bytes, delimiter);
    let headers = reader
        .headers()
        .map_err(|source| FeedError::Csv { record: 1, source })?
        .clone();
    let positions = required
        .iter()
        .map(|name| {
            headers
                .iter()
                .position(|header| header.trim() == *name)
                .ok_or_else(|| FeedError::MissingColumn {
                    column: name.to_string(),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;
    let mut records = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record_number = idx + 2;
        let record = record.map_err(|source| FeedError::Csv {
            record: record_number,
            source,
        })?;
        // An unquoted comma in an address would otherwise shift every later column.
        if record.len() != headers.len() {
            return Err(FeedError::RaggedRow {
                record: record_number,
                expected: headers.len(),
                found: record.len(),
            });
        }
        records.push(record);
    }
    Ok((positions, records))
}

fn cell(record: &csv::StringRecord, position: usize) -> Option<String> {
    record
        .get(position)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Parses the scraped incident table; extra columns are ignored.
pub fn read_feed(bytes: &[u8], delimiter: u8) -> Result<Vec<FeedRow>, FeedError> {
    let (positions, records) = headed_records(
        bytes,
        delimiter,
        &[REPORT_COLUMN, TIMESTAMP_COLUMN, ADDRESS_COLUMN, TYPE_COLUMN],
    )?;
    Ok(records
        .iter()
        .map(|record| FeedRow {
            report_number: cell(record, positions[0]).unwrap_or_default(),
            timestamp: cell(record, positions[1]),
            address: cell(record, positions[2]),
            incident_type: cell(record, positions[3]),
        })
        .collect())
}

/// Case-insensitive keyword match on the incident type; a missing type never matches.
pub fn is_traffic_incident(incident_type: Option<&str>) -> bool {
    incident_type.is_some_and(|value| {
        let upper = value.to_uppercase();
        TRAFFIC_KEYWORDS.iter().any(|keyword| upper.contains(keyword))
    })
}

/// `(lat,lon)` with mandatory decimal parts, as embedded in feed addresses.
static COORDINATES_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\((-?\d+\.\d+),(-?\d+\.\d+)\)").expect("Invalid coordinates regex")
});

/// First `(lat,lon)` pair embedded in an address.
pub fn extract_coordinates(address: &str) -> Option<(f64, f64)> {
    let captures = COORDINATES_REGEX.captures(address)?;
    let latitude = captures.get(1)?.as_str().parse().ok()?;
    let longitude = captures.get(2)?.as_str().parse().ok()?;
    Some((latitude, longitude))
}

/// `dd/mm/yyyy` taken from the first ten characters of the timestamp.
pub fn parse_feed_date(timestamp: &str) -> Option<NaiveDate> {
    let prefix = timestamp.trim().chars().take(10).collect::<String>();
    NaiveDate::parse_from_str(&prefix, "%d/%m/%Y").ok()
}

pub fn clean_feed(rows: &[FeedRow]) -> Vec<IncidentPoint> {
    let points = rows
        .iter()
        .filter(|row| is_traffic_incident(row.incident_type.as_deref()))
        .map(|row| {
            let coordinates = row.address.as_deref().and_then(extract_coordinates);
            IncidentPoint {
                report_number: row.report_number.clone(),
                latitude: coordinates.map(|(lat, _)| lat),
                longitude: coordinates.map(|(_, lon)| lon),
                date: row.timestamp.as_deref().and_then(parse_feed_date),
            }
        })
        .collect::<Vec<_>>();
    debug!(
        "Kept {} of {} feed row(s) as traffic incidents",
        points.len(),
        rows.len()
    );
    points
}

/// Rows previously written to the store: `cod_sin,lat,lon,fecha` with ISO dates.
pub fn read_store_rows(bytes: &[u8], delimiter: u8) -> Result<Vec<IncidentPoint>, FeedError> {
    let (positions, records) = headed_records(bytes, delimiter, &STORE_COLUMNS)?;
    Ok(records
        .iter()
        .map(|record| IncidentPoint {
            report_number: cell(record, positions[0]).unwrap_or_default(),
            latitude: cell(record, positions[1]).and_then(|v| v.parse().ok()),
            longitude: cell(record, positions[2]).and_then(|v| v.parse().ok()),
            date: cell(record, positions[3])
                .and_then(|v| NaiveDate::parse_from_str(&v, "%Y-%m-%d").ok()),
        })
        .collect())
}

/// Mean of the known coordinates, each axis averaged on its own.
pub fn map_center(points: &[IncidentPoint]) -> Option<MapCenter> {
    fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
        let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
        (count > 0).then(|| sum / count as f64)
    }
    Some(MapCenter {
        latitude: mean(points.iter().filter_map(|p| p.latitude))?,
        longitude: mean(points.iter().filter_map(|p| p.longitude))?,
    })
}

/// Points that can be placed on a map.
pub fn markers(points: &[IncidentPoint]) -> Vec<&IncidentPoint> {
    points.iter().filter(|point| point.has_location()).collect()
}

#[derive(Debug, Serialize)]
struct FeedView<'a> {
    center: Option<MapCenter>,
    markers: Vec<&'a IncidentPoint>,
    points: &'a [IncidentPoint],
}

pub fn execute(args: &FeedArgs) -> Result<()> {
    let delimiter = args.delimiter.unwrap_or(io_utils::DEFAULT_CSV_DELIMITER);
    let bytes = read_bytes(&args.input)?;
    let points = if args.store {
        read_store_rows(&bytes, delimiter)
    } else {
        read_feed(&bytes, delimiter).map(|rows| clean_feed(&rows))
    }
    .with_context(|| format!("Reading feed from {:?}", args.input))?;

    if let Some(output) = &args.output {
        let mut writer = io_utils::open_csv_writer(Some(output), io_utils::DEFAULT_CSV_DELIMITER)?;
        writer
            .write_record(STORE_COLUMNS)
            .context("Writing feed headers")?;
        for point in &points {
            writer
                .write_record(point.store_row())
                .with_context(|| format!("Writing feed point {}", point.report_number))?;
        }
        writer.flush().context("Flushing feed writer")?;
    }

    let view = FeedView {
        center: map_center(&points),
        markers: markers(&points),
        points: &points,
    };
    if args.json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else if args.output.is_none() {
        let headers = STORE_COLUMNS
            .iter()
            .map(|h| h.to_string())
            .collect::<Vec<_>>();
        let rows = points.iter().map(IncidentPoint::store_row).collect::<Vec<_>>();
        table::print_table(&headers, &rows);
        if let Some(center) = view.center {
            println!("center: {:.6}, {:.6}", center.latitude, center.longitude);
        }
    }
    info!(
        "Feed: {} point(s), {} with coordinates",
        points.len(),
        view.markers.len()
    );
    Ok(())
}
