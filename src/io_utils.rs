//! Export file reading, encoding, and delimiter resolution.
//!
//! Every CSV export enters the crate through [`read_export_rows`]:
//!
//! - **Delimiter resolution**: `.tsv` → tab, anything else → comma, unless
//!   overridden.
//! - **Encoding**: input decoding via `encoding_rs`, defaulting to UTF-8.
//! - **Row shape**: the header row is dropped, fields are trimmed, and blank
//!   lines are skipped. Rows keep whatever field count they have; the builder
//!   decides whether that count is acceptable.
//! - **stdin**: the `-` path reads from standard input.

use std::{
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
};

use anyhow::{Context, Result, anyhow};
use encoding_rs::{Encoding, UTF_8};
use serde::Serialize;

use crate::ingest::RawRow;

pub const DEFAULT_CSV_DELIMITER: u8 = b',';
pub const DEFAULT_TSV_DELIMITER: u8 = b'\t';

pub fn is_dash(path: &Path) -> bool {
    path == Path::new("-")
}

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    if let Some(value) = label {
        Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'"))
    } else {
        Ok(UTF_8)
    }
}

pub fn resolve_input_delimiter(path: &Path, provided: Option<u8>) -> u8 {
    provided.unwrap_or_else(|| match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => DEFAULT_TSV_DELIMITER,
        _ => DEFAULT_CSV_DELIMITER,
    })
}

pub fn open_export_reader<R>(reader: R, delimiter: u8) -> csv::Reader<R>
where
    R: Read,
{
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(true)
        .delimiter(delimiter)
        .double_quote(true)
        .trim(csv::Trim::All)
        .flexible(true);
    builder.from_reader(reader)
}

pub fn open_export_reader_from_path(path: &Path, delimiter: u8) -> Result<csv::Reader<Box<dyn Read>>> {
    let reader: Box<dyn Read> = if is_dash(path) {
        Box::new(std::io::stdin().lock())
    } else {
        Box::new(BufReader::new(
            File::open(path).with_context(|| format!("Opening export file {path:?}"))?,
        ))
    };
    Ok(open_export_reader(reader, delimiter))
}

pub fn decode_bytes(bytes: &[u8], encoding: &'static Encoding) -> Result<String> {
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        Err(anyhow!(
            "Failed to decode text with encoding {}",
            encoding.name()
        ))
    } else {
        Ok(text.into_owned())
    }
}

pub fn decode_record(record: &csv::ByteRecord, encoding: &'static Encoding) -> Result<RawRow> {
    record
        .iter()
        .map(|field| decode_bytes(field, encoding).map(|text| text.trim().to_string()))
        .collect()
}

fn is_blank(record: &csv::ByteRecord) -> bool {
    record.iter().all(|field| field.iter().all(u8::is_ascii_whitespace))
}

/// Reads every data row of one export, header excluded.
pub fn read_rows<R>(reader: &mut csv::Reader<R>, encoding: &'static Encoding) -> Result<Vec<RawRow>>
where
    R: Read,
{
    let mut rows = Vec::new();
    for (row_idx, record) in reader.byte_records().enumerate() {
        let record = record.with_context(|| format!("Reading row {}", row_idx + 2))?;
        if is_blank(&record) {
            continue;
        }
        let decoded = decode_record(&record, encoding)
            .with_context(|| format!("Decoding row {}", row_idx + 2))?;
        rows.push(decoded);
    }
    Ok(rows)
}

pub fn read_export_rows(
    path: &Path,
    delimiter: u8,
    encoding: &'static Encoding,
) -> Result<Vec<RawRow>> {
    let mut reader = open_export_reader_from_path(path, delimiter)?;
    read_rows(&mut reader, encoding).with_context(|| format!("Reading export {path:?}"))
}

/// Opens `path` for writing, or stdout when `path` is `None` or `-`.
pub fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    match path {
        Some(p) if !is_dash(p) => Ok(Box::new(BufWriter::new(
            File::create(p).with_context(|| format!("Creating output file {p:?}"))?,
        ))),
        _ => Ok(Box::new(std::io::stdout())),
    }
}

pub fn write_json<T: Serialize>(path: Option<&Path>, value: &T) -> Result<()> {
    let mut writer = open_output(path)?;
    serde_json::to_writer_pretty(&mut writer, value).context("Serializing JSON output")?;
    writeln!(writer)?;
    writer.flush().context("Flushing JSON output")
}

pub fn write_text(path: Option<&Path>, text: &str) -> Result<()> {
    let mut writer = open_output(path)?;
    writer.write_all(text.as_bytes())?;
    writer.flush().context("Flushing output")
}
