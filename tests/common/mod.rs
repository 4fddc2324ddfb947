#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::{TempDir, tempdir};

/// Header of the legacy persons export as it is spelled in UTF-8. Written
/// to disk as UTF-8 and read back as latin1, it reproduces the garbled
/// headers and cells of the real file.
pub const LEGACY_HEADER: &str = "CÓDIGO SINIESTRO,AÑO,FECHA SINIESTRO,GRAVEDAD,SEXO,EDAD,VEHÍCULO,CLASE DE SINIESTRO,DEPARTAMENTO";

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh scratch directory for the current test case.
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    /// Returns the root path for all files owned by this workspace.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }
}

/// One person row of the legacy export. Empty strings are written as empty cells.
#[derive(Debug, Clone)]
pub struct PersonRow {
    pub incident: String,
    pub year: String,
    pub date: String,
    pub severity: &'static str,
    pub sex: &'static str,
    pub age: String,
    pub vehicle: &'static str,
    pub class: &'static str,
    pub department: &'static str,
}

impl PersonRow {
    pub fn fatal(incident: &str, age: &str, vehicle: &'static str) -> Self {
        Self {
            incident: incident.to_string(),
            year: "2022".to_string(),
            date: "2022-06-15".to_string(),
            severity: "FALLECIDO",
            sex: "MASCULINO",
            age: age.to_string(),
            vehicle,
            class: "CHOQUE",
            department: "LIMA",
        }
    }

    fn line(&self) -> String {
        [
            self.incident.as_str(),
            &self.year,
            &self.date,
            self.severity,
            self.sex,
            &self.age,
            self.vehicle,
            self.class,
            self.department,
        ]
        .join(",")
    }
}

/// Three metadata lines, the header, then `rows`.
pub fn legacy_csv(rows: &[PersonRow]) -> String {
    let mut text = String::from(
        "OBSERVATORIO NACIONAL DE SEGURIDAD VIAL\nPERSONAS INVOLUCRADAS EN SINIESTROS\nFUENTE: ONSV\n",
    );
    text.push_str(LEGACY_HEADER);
    text.push('\n');
    for row in rows {
        text.push_str(&row.line());
        text.push('\n');
    }
    text
}

/// The reference 100-row scenario:
/// - rows 0..60 are fatalities, 60..90 injured, 90..100 unharmed
/// - rows 0..3 have no vehicle (and a valid age)
/// - rows 3..8 have a missing, "NO INDICA" or unparseable age
pub fn scenario_rows() -> Vec<PersonRow> {
    const DEPARTMENTS: [&str; 4] = ["LIMA", "JUNÍN", "CUSCO", "PIURA"];
    const CLASSES: [&str; 3] = ["CHOQUE", "ATROPELLO", "CAÍDA DE PASAJERO"];
    const SEXES: [&str; 3] = ["MASCULINO", "FEMENINO", "NO INDICA"];
    const BAD_AGES: [&str; 5] = ["", "", "NO INDICA", "NO INDICA", "abc"];

    (0..100usize)
        .map(|i| {
            let year = 2021 + (i % 3) as i32;
            PersonRow {
                incident: format!("S{:03}", i / 2),
                year: year.to_string(),
                date: format!("{year}-{:02}-{:02}", i % 12 + 1, i % 28 + 1),
                severity: match i {
                    0..60 => "FALLECIDO",
                    60..90 => "LESIONADO",
                    _ => "ILESO",
                },
                sex: SEXES[i % 3],
                age: match i {
                    3..8 => BAD_AGES[i - 3].to_string(),
                    _ => ((i * 7) % 90).to_string(),
                },
                vehicle: if i < 3 { "" } else { "AUTOMÓVIL" },
                class: CLASSES[i % 3],
                department: DEPARTMENTS[i % 4],
            }
        })
        .collect()
}
