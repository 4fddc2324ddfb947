//! I/O utilities for reading legacy delimited sources and writing clean output.
//!
//! All file I/O in siniestros flows through this module. It provides:
//!
//! - **Source encodings**: true ISO-8859-1 (byte value = code point) for the
//!   legacy ONSV export, plus any WHATWG label through `encoding_rs`.
//! - **Reader construction**: headerless, flexible readers so callers can skip
//!   metadata lines that precede the real header.
//! - **Writer construction**: UTF-8 CSV output to a file or stdout (`-`).
//! - **Delimiter parsing** shared by the CLI and the YAML config.

use std::{
    borrow::Cow,
    fs::File,
    io::{self, BufWriter, Write},
    path::Path,
};

use anyhow::{Context, Result};
use csv::QuoteStyle;
use encoding_rs::Encoding;

use crate::error::DataLoadError;

pub const DEFAULT_CSV_DELIMITER: u8 = b',';
pub const DEFAULT_TSV_DELIMITER: u8 = b'\t';

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";
const LATIN1_LABELS: &[&str] = &["latin1", "latin-1", "iso-8859-1", "iso8859-1", "l1"];

/// Character encoding of a source file.
///
/// `encoding_rs` follows the WHATWG Encoding Standard, which folds
/// `latin1` into windows-1252. The legacy export must be read as genuine
/// ISO-8859-1 so every byte survives as its own code point, hence the
/// dedicated variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceEncoding {
    Latin1,
    Whatwg(&'static Encoding),
}

impl SourceEncoding {
    pub fn from_label(label: &str) -> Result<Self, DataLoadError> {
        let trimmed = label.trim();
        if LATIN1_LABELS
            .iter()
            .any(|candidate| trimmed.eq_ignore_ascii_case(candidate))
        {
            return Ok(SourceEncoding::Latin1);
        }
        Encoding::for_label(trimmed.as_bytes())
            .map(SourceEncoding::Whatwg)
            .ok_or_else(|| DataLoadError::UnknownEncoding {
                label: trimmed.to_string(),
            })
    }

    pub fn name(&self) -> &'static str {
        match self {
            SourceEncoding::Latin1 => "ISO-8859-1",
            SourceEncoding::Whatwg(encoding) => encoding.name(),
        }
    }

    pub fn is_utf8(&self) -> bool {
        matches!(self, SourceEncoding::Whatwg(encoding) if *encoding == encoding_rs::UTF_8)
    }

    /// Decodes `bytes`, returning `None` when the input is malformed for this encoding.
    pub fn decode<'a>(&self, bytes: &'a [u8]) -> Option<Cow<'a, str>> {
        match self {
            SourceEncoding::Latin1 => Some(encoding_rs::mem::decode_latin1(bytes)),
            SourceEncoding::Whatwg(encoding) => {
                let (text, had_errors) = encoding.decode_without_bom_handling(bytes);
                if had_errors { None } else { Some(text) }
            }
        }
    }
}

impl Default for SourceEncoding {
    fn default() -> Self {
        SourceEncoding::Latin1
    }
}

pub fn is_dash(path: &Path) -> bool {
    path == Path::new("-")
}

pub fn read_bytes(path: &Path) -> io::Result<Vec<u8>> {
    std::fs::read(path)
}

/// Reads a whole source file, mapping a missing path to [`DataLoadError::FileNotFound`].
pub fn read_source(path: &Path) -> Result<Vec<u8>, DataLoadError> {
    read_bytes(path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            DataLoadError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            DataLoadError::Read {
                path: path.to_path_buf(),
                source,
            }
        }
    })
}

pub fn strip_utf8_bom(bytes: &[u8]) -> &[u8] {
    bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes)
}

/// Headerless reader; the caller decides which record is the header.
pub fn open_csv_reader(bytes: &[u8], delimiter: u8) -> csv::Reader<&[u8]> {
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(false)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(true);
    builder.from_reader(bytes)
}

/// Reader whose first record is the header. Field counts may vary so the
/// caller can report a ragged row with its record number.
pub fn open_headed_csv_reader(bytes: &[u8], delimiter: u8) -> csv::Reader<&[u8]> {
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(true)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(true);
    builder.from_reader(strip_utf8_bom(bytes))
}

pub fn decode_field(
    field: &[u8],
    encoding: SourceEncoding,
    record: usize,
) -> Result<String, DataLoadError> {
    encoding
        .decode(field)
        .map(Cow::into_owned)
        .ok_or(DataLoadError::Decode {
            record,
            encoding: encoding.name(),
        })
}

pub fn decode_record(
    record: &csv::ByteRecord,
    encoding: SourceEncoding,
    record_number: usize,
) -> Result<Vec<String>, DataLoadError> {
    record
        .iter()
        .map(|field| decode_field(field, encoding, record_number))
        .collect()
}

pub fn open_csv_writer(path: Option<&Path>, delimiter: u8) -> Result<csv::Writer<Box<dyn Write>>> {
    let base: Box<dyn Write> = match path {
        Some(p) if !is_dash(p) => Box::new(BufWriter::new(
            File::create(p).with_context(|| format!("Creating output file {p:?}"))?,
        )),
        _ => Box::new(std::io::stdout()),
    };
    let mut builder = csv::WriterBuilder::new();
    builder
        .delimiter(delimiter)
        .quote_style(QuoteStyle::Necessary)
        .double_quote(true);
    Ok(builder.from_writer(base))
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(DEFAULT_TSV_DELIMITER),
        "comma" | "," => Ok(DEFAULT_CSV_DELIMITER),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}

pub fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => ",".to_string(),
        b'\t' => "\\t".to_string(),
        other => (other as char).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latin1_maps_each_byte_to_its_code_point() {
        let decoded = SourceEncoding::Latin1.decode(b"CA\xC3\x8DDA").expect("decode");
        assert_eq!(decoded, "CA\u{c3}\u{8d}DA");
    }

    #[test]
    fn latin1_labels_do_not_fall_back_to_windows_1252() {
        assert_eq!(
            SourceEncoding::from_label("latin1").unwrap(),
            SourceEncoding::Latin1
        );
        let cp1252 = SourceEncoding::from_label("windows-1252").unwrap();
        assert_eq!(cp1252.name(), "windows-1252");
    }

    #[test]
    fn unknown_label_is_rejected() {
        let err = SourceEncoding::from_label("klingon").unwrap_err();
        assert!(matches!(err, DataLoadError::UnknownEncoding { .. }));
    }

    #[test]
    fn utf8_decode_reports_malformed_bytes() {
        let utf8 = SourceEncoding::from_label("utf-8").unwrap();
        assert!(utf8.is_utf8());
        assert!(utf8.decode(b"\xff\xfe").is_none());
    }

    #[test]
    fn strip_bom_only_removes_leading_marker() {
        assert_eq!(strip_utf8_bom(b"\xEF\xBB\xBFa,b"), b"a,b");
        assert_eq!(strip_utf8_bom(b"a,b"), b"a,b");
    }

    #[test]
    fn missing_source_is_reported_as_not_found() {
        let err = read_source(Path::new("/definitely/not/here.csv")).unwrap_err();
        assert!(matches!(err, DataLoadError::FileNotFound { .. }));
    }

    #[test]
    fn headed_reader_keeps_quoted_delimiters_in_one_field() {
        let mut reader = open_headed_csv_reader(b"\xEF\xBB\xBFa,b\n\"x (1.0,2.0)\",y\n", b',');
        let headers = reader.headers().unwrap().iter().map(str::to_string).collect::<Vec<_>>();
        assert_eq!(headers, vec!["a", "b"]);
        let record = reader.records().next().unwrap().unwrap();
        assert_eq!(record.len(), 2);
        assert_eq!(&record[0], "x (1.0,2.0)");
    }

    #[test]
    fn parse_delimiter_accepts_named_forms() {
        assert_eq!(parse_delimiter("tab"), Ok(b'\t'));
        assert_eq!(parse_delimiter(";"), Ok(b';'));
        assert!(parse_delimiter("ab").is_err());
    }
}
