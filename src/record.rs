use chrono::NaiveDate;
use serde::Serialize;

use crate::{
    category::{AgeRange, Category, Severity, Sex},
    derive::{self, ParseWarnings},
    schema::{ColumnMap, Field},
};

/// Header of the derived age bucket column.
pub const AGE_RANGE_COLUMN: &str = "RANGO DE EDAD";

/// One involved person in one incident.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PersonRecord {
    pub incident_code: Option<String>,
    pub person_code: Option<String>,
    pub vehicle_code: Option<String>,
    pub year: Option<i32>,
    pub month: Option<String>,
    pub date: Option<NaiveDate>,
    pub severity: Option<Severity>,
    pub person_type: Option<String>,
    pub sex: Option<Sex>,
    pub age: Option<f64>,
    pub age_range: Option<AgeRange>,
    pub vehicle: Option<String>,
    pub incident_class: Option<String>,
    pub cause: Option<String>,
    pub cause_detail: Option<String>,
    pub road_type: Option<String>,
    pub department: Option<String>,
    pub province: Option<String>,
    pub district: Option<String>,
    pub license_status: Option<String>,
    pub license_class: Option<String>,
    pub alcohol_test_result: Option<String>,
}

impl PersonRecord {
    /// Builds a typed record from one normalized row, deriving age and age range.
    pub fn bind(row: &[Option<String>], columns: &ColumnMap, warnings: &mut ParseWarnings) -> Self {
        let text = |field: Field| {
            columns
                .get(row, field)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        let age_value = derive::parse_age(columns.get(row, Field::Age));
        let age = age_value.as_f64();
        let age_range = derive::age_range(age);
        warnings.record_age(age_value, age_range);

        let severity = text(Field::Severity).and_then(|raw| {
            let parsed = Severity::from_storage(&raw);
            if parsed.is_none() {
                warnings.severity_unrecognized += 1;
            }
            parsed
        });
        let sex = text(Field::Sex).and_then(|raw| {
            let parsed = Sex::from_storage(&raw);
            if parsed.is_none() {
                warnings.sex_unrecognized += 1;
            }
            parsed
        });
        let date = text(Field::Date).and_then(|raw| {
            let parsed = derive::parse_date(&raw);
            if parsed.is_none() {
                warnings.date_unparseable += 1;
            }
            parsed
        });
        let year = text(Field::Year).and_then(|raw| {
            let parsed = derive::parse_year(&raw);
            if parsed.is_none() {
                warnings.year_unparseable += 1;
            }
            parsed
        });

        PersonRecord {
            incident_code: text(Field::IncidentCode),
            person_code: text(Field::PersonCode),
            vehicle_code: text(Field::VehicleCode),
            year: derive::resolve_year(year, date),
            month: text(Field::Month),
            date,
            severity,
            person_type: text(Field::PersonType),
            sex,
            age,
            age_range,
            vehicle: text(Field::Vehicle),
            incident_class: text(Field::IncidentClass),
            cause: text(Field::Cause),
            cause_detail: text(Field::CauseDetail),
            road_type: text(Field::RoadType),
            department: text(Field::Department),
            province: text(Field::Province),
            district: text(Field::District),
            license_status: text(Field::LicenseStatus),
            license_class: text(Field::LicenseClass),
            alcohol_test_result: text(Field::AlcoholTestResult),
        }
    }

    pub fn is_fatality(&self) -> bool {
        self.severity == Some(Severity::Fatal)
    }

    /// Storage-form text of `field`, as written to clean exports and used as a grouping key.
    pub fn value(&self, field: Field) -> Option<String> {
        match field {
            Field::IncidentCode => self.incident_code.clone(),
            Field::PersonCode => self.person_code.clone(),
            Field::VehicleCode => self.vehicle_code.clone(),
            Field::Year => self.year.map(|y| y.to_string()),
            Field::Month => self.month.clone(),
            Field::Date => self.date.map(|d| d.format("%Y-%m-%d").to_string()),
            Field::Severity => self.severity.map(|s| s.storage().to_string()),
            Field::PersonType => self.person_type.clone(),
            Field::Sex => self.sex.map(|s| s.storage().to_string()),
            Field::Age => self.age.map(format_age),
            Field::Vehicle => self.vehicle.clone(),
            Field::IncidentClass => self.incident_class.clone(),
            Field::Cause => self.cause.clone(),
            Field::CauseDetail => self.cause_detail.clone(),
            Field::RoadType => self.road_type.clone(),
            Field::Department => self.department.clone(),
            Field::Province => self.province.clone(),
            Field::District => self.district.clone(),
            Field::LicenseStatus => self.license_status.clone(),
            Field::LicenseClass => self.license_class.clone(),
            Field::AlcoholTestResult => self.alcohol_test_result.clone(),
        }
    }

    pub fn export_headers() -> Vec<String> {
        Field::ALL
            .iter()
            .map(|field| field.canonical_name().to_string())
            .chain(std::iter::once(AGE_RANGE_COLUMN.to_string()))
            .collect()
    }

    pub fn export_row(&self) -> Vec<String> {
        Field::ALL
            .iter()
            .map(|field| self.value(*field).unwrap_or_default())
            .chain(std::iter::once(
                self.age_range
                    .map(|range| range.storage().to_string())
                    .unwrap_or_default(),
            ))
            .collect()
    }
}

fn format_age(age: f64) -> String {
    if age.fract() == 0.0 {
        format!("{age:.0}")
    } else {
        age.to_string()
    }
}
