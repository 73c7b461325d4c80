//! Text and JSON rendering of schema records, duplicate reports, and diffs.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    diff::{ColumnMismatch, TableDiff},
    duplicates::DuplicateColumns,
    model::{Attached, ColumnDescriptor, Labelled, TableSchema},
    session::TableDiffEntry,
    table::TextTable,
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffReport<'a> {
    pub generated_at: DateTime<Utc>,
    pub tables: Vec<DiffReportEntry<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffReportEntry<'a> {
    pub table: &'a str,
    pub in_destination: bool,
    #[serde(flatten)]
    pub diff: &'a TableDiff,
}

impl<'a> DiffReport<'a> {
    pub fn new(entries: &'a [TableDiffEntry<'a>]) -> Self {
        Self {
            generated_at: Utc::now(),
            tables: entries
                .iter()
                .map(|entry| DiffReportEntry {
                    table: &entry.table.name,
                    in_destination: entry.in_destination,
                    diff: &entry.diff,
                })
                .collect(),
        }
    }
}

fn column_table<'a>(columns: impl IntoIterator<Item = &'a ColumnDescriptor>) -> TextTable {
    let mut table = TextTable::new(["column", "type", "size", "default", "constraints"]);
    for column in columns {
        table.push_row([
            column.name.as_str(),
            column.data_type.as_str(),
            column.size.as_str(),
            column.default.as_str(),
            column.constraints.as_str(),
        ]);
    }
    table
}

fn attached_section<T: Labelled>(out: &mut String, title: &str, entries: &[Attached<T>]) {
    if entries.is_empty() {
        return;
    }
    let _ = writeln!(out, "\n{title}:");
    for entry in entries {
        let _ = writeln!(out, "  {}", entry.label());
    }
}

/// Renders entries as a grid once any of them carries detail. Bare names
/// fill the first column only.
fn detail_section<T, const N: usize>(
    out: &mut String,
    title: &str,
    entries: &[Attached<T>],
    headers: [&str; N],
    cells: impl Fn(&T) -> [String; N],
) where
    T: Labelled,
{
    if !entries.iter().any(|entry| entry.detail().is_some()) {
        attached_section(out, title, entries);
        return;
    }
    let mut table = TextTable::new(headers);
    for entry in entries {
        match entry {
            Attached::Detailed(detail) => table.push_row(cells(detail)),
            Attached::Name(name) => {
                let mut row: [String; N] = std::array::from_fn(|_| String::new());
                if let Some(first) = row.first_mut() {
                    first.clone_from(name);
                }
                table.push_row(row);
            }
        }
    }
    let _ = write!(out, "\n{title}:\n{table}");
}

pub fn render_table_details(table: &TableSchema) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Table: {}", table.name);
    if !table.schema.is_empty() {
        let _ = writeln!(out, "Schema: {}", table.schema);
    }
    let _ = writeln!(out, "Records: {}", table.record_count);
    let _ = writeln!(out);
    out.push_str(&column_table(&table.columns).to_string());

    let primary_key = if table.has_primary_key() {
        table.primary_key_columns().join(", ")
    } else {
        "(none)".to_string()
    };
    let _ = writeln!(out, "\nPrimary key: {primary_key}");

    detail_section(&mut out, "Indexes", &table.indexes, ["name", "columns"], |index| {
        [index.name.clone(), index.columns.join(", ")]
    });
    detail_section(
        &mut out,
        "Foreign keys",
        &table.foreign_keys,
        ["name", "column", "foreign table", "foreign column"],
        |fk| {
            [
                fk.name.clone().unwrap_or_default(),
                fk.column.clone(),
                fk.foreign_table.clone(),
                fk.foreign_column.clone(),
            ]
        },
    );
    detail_section(
        &mut out,
        "Constraints",
        &table.constraints,
        ["name", "column", "type"],
        |constraint| {
            [
                constraint.name.clone(),
                constraint.column.clone(),
                constraint.kind.clone(),
            ]
        },
    );
    detail_section(
        &mut out,
        "Triggers",
        &table.triggers,
        ["name", "schema", "event", "timing", "statement"],
        |trigger| {
            [
                trigger.name.clone(),
                trigger.schema.clone(),
                trigger.event.clone(),
                trigger.timing.clone(),
                trigger.statement.clone(),
            ]
        },
    );

    if let Some(performance) = &table.performance {
        let _ = writeln!(
            out,
            "\nFragmentation: {}  Table size: {}  Index size: {}",
            performance.fragmentation, performance.table_size, performance.index_size
        );
    }
    out
}

pub fn render_duplicates(duplicates: &DuplicateColumns) -> String {
    if duplicates.is_empty() {
        return "No duplicate columns found.\n".to_string();
    }
    let mut table = TextTable::new(["column", "tables"]);
    for (column, tables) in duplicates {
        table.push_row([column.clone(), tables.join(", ")]);
    }
    table.to_string()
}

fn describe_side(column: &ColumnDescriptor) -> String {
    format!(
        "{}, default: {}, constraints: {}",
        column.type_signature(),
        column.default,
        column.constraints
    )
}

fn mismatch_table(mismatches: &[ColumnMismatch]) -> TextTable {
    let mut table = TextTable::new(["column", "differs", "origin", "destination"]);
    for mismatch in mismatches {
        let differs = mismatch
            .attributes()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        table.push_row([
            mismatch.origin.name.clone(),
            differs,
            describe_side(&mismatch.origin),
            describe_side(&mismatch.destination),
        ]);
    }
    table
}

pub fn render_table_diff(table_name: &str, diff: &TableDiff) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Differences for {table_name}");

    if diff.missing_in_destination.is_empty() {
        let _ = writeln!(out, "\nNo columns missing in destination.");
    } else {
        let _ = write!(
            out,
            "\nMissing in destination:\n{}",
            column_table(&diff.missing_in_destination)
        );
    }

    if diff.extra_in_destination.is_empty() {
        let _ = writeln!(out, "\nNo extra columns in destination.");
    } else {
        let _ = write!(
            out,
            "\nExtra in destination:\n{}",
            column_table(&diff.extra_in_destination)
        );
    }

    if diff.mismatched.is_empty() {
        let _ = writeln!(out, "\nNo mismatched columns.");
    } else {
        let _ = write!(out, "\nMismatched:\n{}", mismatch_table(&diff.mismatched));
    }
    out
}
