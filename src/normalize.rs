//! Encoding and schema normalization for the raw persons table.
//!
//! The legacy ONSV export is UTF-8 text that is read as a single-byte
//! encoding, so every accented character arrives as a two-character
//! sequence (`Í` becomes `Ã` + U+008D). Rather than carry hand-typed
//! garbled literals, both correction tables below are written with the
//! correct spelling and their garbled keys are produced by re-reading that
//! spelling's UTF-8 bytes through the source encoding.
//!
//! [`Normalizer::normalize`] is a fixed point: running it on its own output
//! changes nothing.

use std::collections::HashSet;

use log::debug;

use crate::{
    config::SourceOptions,
    error::DataLoadError,
    io_utils::{self, SourceEncoding},
};

/// Header spellings found in the legacy export and their canonical names.
const COLUMN_RENAMES: &[(&str, &str)] = &[
    ("CÓDIGO SINIESTRO", "CÓDIGO SINIESTRO"),
    ("CÓDIGO VEHÍCULO", "CÓDIGO VEHÍCULO"),
    ("CÓDIGO PERSONA", "CÓDIGO PERSONA"),
    ("LUGAR ATENCIÓN LESIONADO", "LUGAR ATENCIÓN LESIONADO"),
    ("LUGAR DE DEFUNCIÓN", "LUGAR DE DEFUNCIÓN"),
    ("SITUACIÓN DE PERSONA", "SITUACIÓN DE PERSONA"),
    ("PAÍS DE NACIONALIDAD", "PAÍS DE NACIONALIDAD"),
    ("OTRO PAÍS DE NACIONALIDAD", "OTRO PAÍS DE NACIONALIDAD"),
    ("AÑO", "AÑO"),
    ("VEHÍCULO", "VEHÍCULO"),
    ("TIPO DE VÍA", "TIPO DE VÍA"),
    ("CÓDIGO DE CARRETERA", "CÓDIGO DE CARRETERA"),
    (
        "¿SE SOMETIÓ A DOSAJE ETÍLICO CUALITATIVO?",
        "DOSAJE ETÍLICO CUALITATIVO",
    ),
    (
        "RESULTADO DEL DOSAJE ETÍLICO CUALITATIVO",
        "RESULTADO DOSAJE ETÍLICO CUALITATIVO",
    ),
    (
        "¿SE SOMETIÓ A DOSAJE ETÍLICO CUANTITATIVO?",
        "DOSAJE ETÍLICO CUANTITATIVO",
    ),
];

/// Replacement order: whole words before single characters.
const REPAIR_ORDER: &[&str] = &[
    "CAÍDA", "PEATÓN", "PERÚ", "CAMIÓN", "Ñ", "Ó", "Í", "Á", "Ú", "É", "í",
];

/// Categorical text columns whose cells are repaired. IDs, numbers and dates are left alone.
pub const REPAIRED_COLUMNS: &[&str] = &[
    "TIPO PERSONA",
    "GRAVEDAD",
    "MES",
    "CLASE DE SINIESTRO",
    "CAUSA",
    "CAUSA ESPECIFICA",
    "TIPO DE VÍA",
    "DEPARTAMENTO",
    "PROVINCIA",
    "DISTRITO",
    "SEXO",
    "VEHÍCULO",
    "ESTADO LICENCIA",
    "CLASE_LICENCIA",
];

const MISSING_MARKERS: &[&str] = &["NA", "N/A", "NULL", "NaN", "nan", "null", "#N/A"];

/// A decoded, row-oriented table. `None` cells are missing values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
}

impl Table {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Option<String>>>) -> Self {
        Self { headers, rows }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<Option<String>>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Reads `bytes` into a [`Table`], skipping `header_row` leading records.
pub fn read_table(bytes: &[u8], options: &SourceOptions) -> Result<Table, DataLoadError> {
    let bytes = io_utils::strip_utf8_bom(bytes);
    let mut reader = io_utils::open_csv_reader(bytes, options.delimiter);
    let mut records = reader.byte_records();

    for skipped in 0..options.header_row {
        match records.next() {
            Some(Ok(_)) => {}
            Some(Err(source)) => {
                return Err(DataLoadError::Csv {
                    record: skipped + 1,
                    source,
                });
            }
            None => {
                return Err(DataLoadError::MissingHeader {
                    header_row: options.header_row,
                });
            }
        }
    }

    let header_number = options.header_row + 1;
    let header_record = match records.next() {
        Some(record) => record.map_err(|source| DataLoadError::Csv {
            record: header_number,
            source,
        })?,
        None => {
            return Err(DataLoadError::MissingHeader {
                header_row: options.header_row,
            });
        }
    };
    let headers = io_utils::decode_record(&header_record, options.encoding, header_number)?;
    if headers.iter().all(|h| h.trim().is_empty()) {
        return Err(DataLoadError::MissingHeader {
            header_row: options.header_row,
        });
    }

    let mut rows = Vec::new();
    for (idx, record) in records.enumerate() {
        let record_number = header_number + idx + 1;
        let record = record.map_err(|source| DataLoadError::Csv {
            record: record_number,
            source,
        })?;
        if record.len() > headers.len() {
            return Err(DataLoadError::RaggedRow {
                record: record_number,
                expected: headers.len(),
                found: record.len(),
            });
        }
        let mut row = Vec::with_capacity(headers.len());
        for field in record.iter() {
            let text = io_utils::decode_field(field, options.encoding, record_number)?;
            row.push(cell_value(text));
        }
        row.resize(headers.len(), None);
        rows.push(row);
    }

    debug!(
        "Read {} row(s) x {} column(s) as {}",
        rows.len(),
        headers.len(),
        options.encoding.name()
    );
    Ok(Table::new(headers, rows))
}

fn cell_value(text: String) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() || MISSING_MARKERS.contains(&trimmed) {
        None
    } else {
        Some(text)
    }
}

/// Re-reads the UTF-8 bytes of `text` through `encoding`, reproducing the
/// mis-decoding the legacy export suffers from.
pub fn garble(text: &str, encoding: SourceEncoding) -> Option<String> {
    encoding
        .decode(text.as_bytes())
        .map(|decoded| decoded.into_owned())
        .filter(|decoded| decoded != text)
}

/// Ordered substring replacements that undo [`garble`].
#[derive(Debug, Clone, Default)]
pub struct TextRepair {
    replacements: Vec<(String, &'static str)>,
}

impl TextRepair {
    /// Builds the table for `encoding`. The windows-1252 rendering is always
    /// included because the export mixes both (`Ã‘` as well as `Ã` + U+0091).
    pub fn for_encoding(encoding: SourceEncoding) -> Self {
        let cp1252 = SourceEncoding::Whatwg(encoding_rs::WINDOWS_1252);
        let mut replacements: Vec<(String, &'static str)> = Vec::new();
        for &correct in REPAIR_ORDER {
            for source in [encoding, cp1252] {
                if let Some(garbled) = garble(correct, source)
                    && !replacements.iter().any(|(existing, _)| *existing == garbled)
                {
                    replacements.push((garbled, correct));
                }
            }
        }
        Self { replacements }
    }

    pub fn is_empty(&self) -> bool {
        self.replacements.is_empty()
    }

    /// Applies every replacement in order, then trims.
    pub fn repair(&self, text: &str) -> String {
        let mut repaired = text.to_string();
        for (garbled, correct) in &self.replacements {
            if repaired.contains(garbled.as_str()) {
                repaired = repaired.replace(garbled.as_str(), correct);
            }
        }
        repaired.trim().to_string()
    }
}

/// Column rename plus text repair for one source encoding.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    renames: Vec<(String, &'static str)>,
    repair: TextRepair,
}

impl Normalizer {
    /// Normalizer for the legacy export read with `encoding`.
    pub fn legacy(encoding: SourceEncoding) -> Self {
        let mut renames = Vec::new();
        for &(spelling, canonical) in COLUMN_RENAMES {
            if spelling != canonical {
                renames.push((spelling.to_string(), canonical));
            }
            if let Some(garbled) = garble(spelling, encoding) {
                renames.push((garbled, canonical));
            }
        }
        Self {
            renames,
            repair: TextRepair::for_encoding(encoding),
        }
    }

    /// Normalizer for sources already in canonical form: trims headers only.
    pub fn passthrough() -> Self {
        Self::default()
    }

    pub fn rename_column(&self, name: &str) -> String {
        let renamed = self
            .renames
            .iter()
            .find(|(from, _)| from == name)
            .map(|(_, to)| *to)
            .unwrap_or(name);
        renamed.trim().to_string()
    }

    pub fn repair_text(&self, text: &str) -> String {
        self.repair.repair(text)
    }

    /// Returns a new table with canonical headers and repaired categorical cells.
    pub fn normalize(&self, table: &Table) -> Result<Table, DataLoadError> {
        let headers = table
            .headers()
            .iter()
            .map(|name| self.rename_column(name))
            .collect::<Vec<_>>();

        let mut seen = HashSet::with_capacity(headers.len());
        for header in &headers {
            if !seen.insert(header.as_str()) {
                return Err(DataLoadError::DuplicateColumn {
                    column: header.clone(),
                });
            }
        }

        let repaired_columns = if self.repair.is_empty() {
            Vec::new()
        } else {
            headers
                .iter()
                .enumerate()
                .filter(|(_, name)| REPAIRED_COLUMNS.contains(&name.as_str()))
                .map(|(idx, _)| idx)
                .collect::<Vec<_>>()
        };

        let rows = table
            .rows()
            .iter()
            .map(|row| {
                let mut row = row.clone();
                for &idx in &repaired_columns {
                    if let Some(Some(cell)) = row.get_mut(idx) {
                        *cell = self.repair.repair(cell);
                    }
                }
                row
            })
            .collect::<Vec<_>>();

        debug!(
            "Normalized {} column(s); repaired {} categorical column(s)",
            headers.len(),
            repaired_columns.len()
        );
        Ok(Table::new(headers, rows))
    }
}
