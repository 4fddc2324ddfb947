//! Typed schema for the persons table.
//!
//! Column names are resolved to positions exactly once per load through
//! [`ColumnMap::resolve`]; every later stage reads named struct fields.

use std::collections::HashMap;

use crate::{config::Layout, error::DataLoadError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    IncidentCode,
    PersonCode,
    VehicleCode,
    Year,
    Month,
    Date,
    Severity,
    PersonType,
    Sex,
    Age,
    Vehicle,
    IncidentClass,
    Cause,
    CauseDetail,
    RoadType,
    Department,
    Province,
    District,
    LicenseStatus,
    LicenseClass,
    AlcoholTestResult,
}

impl Field {
    pub const ALL: [Field; 21] = [
        Field::IncidentCode,
        Field::PersonCode,
        Field::VehicleCode,
        Field::Year,
        Field::Month,
        Field::Date,
        Field::Severity,
        Field::PersonType,
        Field::Sex,
        Field::Age,
        Field::Vehicle,
        Field::IncidentClass,
        Field::Cause,
        Field::CauseDetail,
        Field::RoadType,
        Field::Department,
        Field::Province,
        Field::District,
        Field::LicenseStatus,
        Field::LicenseClass,
        Field::AlcoholTestResult,
    ];

    /// Header in the normalized legacy export.
    pub const fn canonical_name(self) -> &'static str {
        match self {
            Field::IncidentCode => "CÓDIGO SINIESTRO",
            Field::PersonCode => "CÓDIGO PERSONA",
            Field::VehicleCode => "CÓDIGO VEHÍCULO",
            Field::Year => "AÑO",
            Field::Month => "MES",
            Field::Date => "FECHA SINIESTRO",
            Field::Severity => "GRAVEDAD",
            Field::PersonType => "TIPO PERSONA",
            Field::Sex => "SEXO",
            Field::Age => "EDAD",
            Field::Vehicle => "VEHÍCULO",
            Field::IncidentClass => "CLASE DE SINIESTRO",
            Field::Cause => "CAUSA",
            Field::CauseDetail => "CAUSA ESPECIFICA",
            Field::RoadType => "TIPO DE VÍA",
            Field::Department => "DEPARTAMENTO",
            Field::Province => "PROVINCIA",
            Field::District => "DISTRITO",
            Field::LicenseStatus => "ESTADO LICENCIA",
            Field::LicenseClass => "CLASE_LICENCIA",
            Field::AlcoholTestResult => "RESULTADO DOSAJE ETÍLICO CUALITATIVO",
        }
    }

    /// Lowercase ASCII key used by the store export.
    pub const fn key(self) -> &'static str {
        match self {
            Field::IncidentCode => "codigo_siniestro",
            Field::PersonCode => "codigo_persona",
            Field::VehicleCode => "codigo_vehiculo",
            Field::Year => "anio",
            Field::Month => "mes",
            Field::Date => "fecha_siniestro",
            Field::Severity => "gravedad",
            Field::PersonType => "tipo_persona",
            Field::Sex => "sexo",
            Field::Age => "edad",
            Field::Vehicle => "vehiculo",
            Field::IncidentClass => "clase_siniestro",
            Field::Cause => "causa",
            Field::CauseDetail => "causa_especifica",
            Field::RoadType => "tipo_via",
            Field::Department => "departamento",
            Field::Province => "provincia",
            Field::District => "distrito",
            Field::LicenseStatus => "estado_licencia",
            Field::LicenseClass => "clase_licencia",
            Field::AlcoholTestResult => "resultado_dosaje_etilico",
        }
    }

    pub const fn is_required(self) -> bool {
        matches!(self, Field::Severity | Field::Age | Field::Vehicle)
    }

    /// Whether the field holds free categorical text usable as a group-by key.
    pub const fn is_categorical(self) -> bool {
        !matches!(
            self,
            Field::IncidentCode | Field::PersonCode | Field::VehicleCode | Field::Age | Field::Date
        )
    }

    pub fn name_for(self, layout: Layout) -> &'static str {
        match layout {
            Layout::Legacy => self.canonical_name(),
            Layout::Canonical => self.key(),
        }
    }

    /// Accepts either the canonical header or the ASCII key (case-insensitive).
    pub fn parse(name: &str) -> Option<Field> {
        let trimmed = name.trim();
        Field::ALL.iter().copied().find(|field| {
            field.canonical_name() == trimmed || field.key().eq_ignore_ascii_case(trimmed)
        })
    }
}

/// Field → column position, resolved once per load.
#[derive(Debug, Clone, Default)]
pub struct ColumnMap {
    positions: HashMap<Field, usize>,
}

impl ColumnMap {
    pub fn resolve(headers: &[String], layout: Layout) -> Result<Self, DataLoadError> {
        let mut positions = HashMap::new();
        for field in Field::ALL {
            let name = field.name_for(layout);
            let position = headers.iter().position(|header| match layout {
                Layout::Legacy => header == name,
                Layout::Canonical => header.eq_ignore_ascii_case(name),
            });
            match position {
                Some(idx) => {
                    positions.insert(field, idx);
                }
                None if field.is_required() => {
                    return Err(DataLoadError::MissingColumn {
                        column: name.to_string(),
                    });
                }
                None => {}
            }
        }
        Ok(Self { positions })
    }

    pub fn position(&self, field: Field) -> Option<usize> {
        self.positions.get(&field).copied()
    }

    /// Borrowed cell text for `field`, or `None` when the column or the value is missing.
    pub fn get<'a>(&self, row: &'a [Option<String>], field: Field) -> Option<&'a str> {
        self.position(field)
            .and_then(|idx| row.get(idx))
            .and_then(|cell| cell.as_deref())
    }
}
