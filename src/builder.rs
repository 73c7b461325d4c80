//! Schema assembly from raw export rows.
//!
//! [`build_schema`] turns the optional [`RawDatasets`] into a
//! [`SchemaCollection`]. When a `tables` export is supplied it defines the
//! table universe and its order; otherwise the tables are discovered from the
//! `columns` export in first-appearance order.
//!
//! Column constraints are accumulated in a fixed order: nullability, then
//! primary-key membership, then foreign-key membership. Rows that do not fit
//! their dataset's layout are skipped and reported as [`IngestIssue`]s; rows
//! naming tables outside the universe are ignored.

use std::collections::{HashMap, HashSet};

use itertools::Itertools;
use log::debug;

use crate::{
    ingest::{DatasetKind, IngestIssue, RawDatasets},
    model::{ColumnDescriptor, ConstraintKind, NULL_DEFAULT, SchemaCollection, TableSchema},
};

const NOT_NULLABLE_FLAG: &str = "0";

#[derive(Debug, Clone, Default)]
pub struct BuildOutcome {
    pub collection: SchemaCollection,
    pub issues: Vec<IngestIssue>,
}

impl BuildOutcome {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

type TableIndex<'a> = HashMap<&'a str, Vec<&'a [String]>>;

pub fn build_schema(datasets: &RawDatasets) -> BuildOutcome {
    let mut issues = Vec::new();

    let columns = group_by_first_field(datasets.valid_rows(DatasetKind::Columns, &mut issues));
    let primary_keys =
        group_by_first_field(datasets.valid_rows(DatasetKind::PrimaryKeys, &mut issues));
    let foreign_key_rows = datasets.valid_rows(DatasetKind::ForeignKeys, &mut issues);
    let indexes = group_by_first_field(datasets.valid_rows(DatasetKind::Indexes, &mut issues));
    let constraints =
        group_by_first_field(datasets.valid_rows(DatasetKind::Constraints, &mut issues));
    let triggers = group_by_first_field(datasets.valid_rows(DatasetKind::Triggers, &mut issues));
    let record_counts = datasets.valid_rows(DatasetKind::RecordCount, &mut issues);

    let pk_columns = column_sets(
        primary_keys
            .iter()
            .flat_map(|(table, rows)| rows.iter().map(move |row| (*table, row[1].as_str()))),
    );
    let fk_columns = column_sets(
        foreign_key_rows
            .iter()
            .map(|(_, row)| (row[1].as_str(), row[2].as_str())),
    );
    let fk_by_first_field = group_by_first_field(foreign_key_rows.clone());

    let mut collection = seed_tables(datasets, &mut issues);

    for table in collection.iter_mut() {
        let name = table.name.clone();

        if let Some((row_no, row)) = record_counts.iter().find(|(_, row)| row[0] == name) {
            match parse_record_count(&row[2]) {
                Some(count) => table.record_count = count,
                None => issues.push(IngestIssue::InvalidRecordCount {
                    table: name.clone(),
                    row: *row_no,
                    value: row[2].clone(),
                }),
            }
        }

        table.columns = rows_for(&columns, &name)
            .iter()
            .map(|row| column_from_row(row))
            .collect();

        annotate(&mut table.columns, pk_columns.get(name.as_str()), ConstraintKind::PrimaryKey);
        annotate(&mut table.columns, fk_columns.get(name.as_str()), ConstraintKind::ForeignKey);

        table.primary_key = field_of(&primary_keys, &name, 1)
            .into_iter()
            .map(Into::into)
            .collect();
        table.indexes = field_of(&indexes, &name, 1).into_iter().map(Into::into).collect();
        table.foreign_keys = field_of(&fk_by_first_field, &name, 2)
            .into_iter()
            .map(Into::into)
            .collect();
        table.constraints = field_of(&constraints, &name, 1)
            .into_iter()
            .map(Into::into)
            .collect();
        table.triggers = field_of(&triggers, &name, 1).into_iter().map(Into::into).collect();

        debug!(
            "Assembled table '{}' with {} column(s) and {} primary key column(s)",
            table.name,
            table.columns.len(),
            table.primary_key.len()
        );
    }

    BuildOutcome { collection, issues }
}

fn seed_tables(datasets: &RawDatasets, issues: &mut Vec<IngestIssue>) -> SchemaCollection {
    let mut collection = SchemaCollection::new();
    if datasets.contains(DatasetKind::Tables) {
        for (row_no, row) in datasets.valid_rows(DatasetKind::Tables, issues) {
            if !collection.insert(TableSchema::new(row[0].as_str(), row[1].as_str())) {
                issues.push(IngestIssue::DuplicateTable {
                    table: row[0].clone(),
                    row: row_no,
                });
            }
        }
    } else if let Some(rows) = datasets.get(DatasetKind::Columns) {
        // Malformed column rows were already reported; they do not seed tables.
        rows.iter()
            .filter(|row| DatasetKind::Columns.accepts(row.len()))
            .map(|row| row[0].as_str())
            .unique()
            .for_each(|name| {
                collection.insert(TableSchema::new(name, ""));
            });
    }
    collection
}

fn column_from_row(row: &[String]) -> ColumnDescriptor {
    let default = row
        .get(6)
        .filter(|value| !value.is_empty())
        .cloned()
        .unwrap_or_else(|| NULL_DEFAULT.to_string());
    let mut column = ColumnDescriptor {
        name: row[1].clone(),
        data_type: row[2].clone(),
        size: row[3].clone(),
        default,
        constraints: String::new(),
    };
    if row[4] == NOT_NULLABLE_FLAG {
        column.push_constraint(ConstraintKind::NotNull);
    }
    column
}

fn annotate(columns: &mut [ColumnDescriptor], members: Option<&HashSet<&str>>, kind: ConstraintKind) {
    let Some(members) = members else {
        return;
    };
    for column in columns.iter_mut() {
        if members.contains(column.name.as_str()) {
            column.push_constraint(kind);
        }
    }
}

/// Strict base-10 count. Anything that is not a plain unsigned integer is
/// rejected rather than coerced.
pub fn parse_record_count(raw: &str) -> Option<u64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    trimmed.parse::<u64>().ok()
}

fn group_by_first_field<'a>(rows: Vec<(usize, &'a [String])>) -> TableIndex<'a> {
    let mut index: TableIndex<'a> = HashMap::new();
    for (_, row) in rows {
        index.entry(row[0].as_str()).or_default().push(row);
    }
    index
}

fn column_sets<'a>(pairs: impl Iterator<Item = (&'a str, &'a str)>) -> HashMap<&'a str, HashSet<&'a str>> {
    let mut sets: HashMap<&str, HashSet<&str>> = HashMap::new();
    for (table, column) in pairs {
        sets.entry(table).or_default().insert(column);
    }
    sets
}

fn rows_for<'a>(index: &TableIndex<'a>, table: &str) -> Vec<&'a [String]> {
    index.get(table).cloned().unwrap_or_default()
}

fn field_of(index: &TableIndex<'_>, table: &str, field: usize) -> Vec<String> {
    rows_for(index, table)
        .into_iter()
        .map(|row| row[field].clone())
        .collect()
}
