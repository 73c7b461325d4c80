//! Raw export datasets and the diagnostics raised while reading them.

use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type RawRow = Vec<String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DatasetKind {
    Tables,
    Columns,
    PrimaryKeys,
    Indexes,
    ForeignKeys,
    Constraints,
    Triggers,
    RecordCount,
}

impl DatasetKind {
    pub const ALL: [DatasetKind; 8] = [
        DatasetKind::Tables,
        DatasetKind::Columns,
        DatasetKind::PrimaryKeys,
        DatasetKind::Indexes,
        DatasetKind::ForeignKeys,
        DatasetKind::Constraints,
        DatasetKind::Triggers,
        DatasetKind::RecordCount,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DatasetKind::Tables => "tables",
            DatasetKind::Columns => "columns",
            DatasetKind::PrimaryKeys => "primaryKeys",
            DatasetKind::Indexes => "indexes",
            DatasetKind::ForeignKeys => "foreignKeys",
            DatasetKind::Constraints => "constraints",
            DatasetKind::Triggers => "triggers",
            DatasetKind::RecordCount => "recordCount",
        }
    }

    /// Accepted field counts as `(min, max)`; `None` means open-ended.
    pub fn arity(self) -> (usize, Option<usize>) {
        match self {
            DatasetKind::Tables => (2, Some(2)),
            DatasetKind::Columns => (6, Some(7)),
            DatasetKind::PrimaryKeys => (2, Some(2)),
            DatasetKind::ForeignKeys => (5, Some(5)),
            DatasetKind::RecordCount => (3, Some(3)),
            DatasetKind::Indexes | DatasetKind::Constraints | DatasetKind::Triggers => (2, None),
        }
    }

    pub fn accepts(self, field_count: usize) -> bool {
        let (min, max) = self.arity();
        field_count >= min && max.is_none_or(|max| field_count <= max)
    }

    fn describe_arity(self) -> String {
        match self.arity() {
            (min, Some(max)) if min == max => min.to_string(),
            (min, Some(max)) => format!("{min}-{max}"),
            (min, None) => format!("at least {min}"),
        }
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatasetKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let wanted = value.trim().replace(['-', '_'], "").to_ascii_lowercase();
        DatasetKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().to_ascii_lowercase() == wanted)
            .ok_or_else(|| format!("Unknown dataset '{value}'"))
    }
}

/// Row-level problems found while building. None of them stop a build.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IngestIssue {
    #[error("{dataset} row {row}: expected {expected} field(s) but found {found}")]
    MalformedRow {
        dataset: DatasetKind,
        row: usize,
        expected: String,
        found: usize,
    },
    #[error("recordCount row {row}: '{value}' is not a valid count for table '{table}'")]
    InvalidRecordCount {
        table: String,
        row: usize,
        value: String,
    },
    #[error("tables row {row}: table '{table}' is already defined")]
    DuplicateTable { table: String, row: usize },
}

/// The optional datasets handed to the builder, each already stripped of its
/// header row and split into fields.
#[derive(Debug, Clone, Default)]
pub struct RawDatasets {
    datasets: BTreeMap<DatasetKind, Vec<RawRow>>,
}

impl RawDatasets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, kind: DatasetKind, rows: Vec<RawRow>) -> Self {
        self.insert(kind, rows);
        self
    }

    /// Replaces any previous rows for `kind`.
    pub fn insert(&mut self, kind: DatasetKind, rows: Vec<RawRow>) {
        self.datasets.insert(kind, rows);
    }

    pub fn get(&self, kind: DatasetKind) -> Option<&[RawRow]> {
        self.datasets.get(&kind).map(Vec::as_slice)
    }

    pub fn contains(&self, kind: DatasetKind) -> bool {
        self.datasets.contains_key(&kind)
    }

    pub fn kinds(&self) -> impl Iterator<Item = DatasetKind> + '_ {
        self.datasets.keys().copied()
    }

    /// Rows of `kind` with an acceptable field count, paired with their
    /// 1-based data row number. Rejected rows are appended to `issues`.
    pub fn valid_rows<'a>(
        &'a self,
        kind: DatasetKind,
        issues: &mut Vec<IngestIssue>,
    ) -> Vec<(usize, &'a [String])> {
        let Some(rows) = self.datasets.get(&kind) else {
            return Vec::new();
        };
        let mut accepted = Vec::with_capacity(rows.len());
        for (idx, row) in rows.iter().enumerate() {
            if kind.accepts(row.len()) {
                accepted.push((idx + 1, row.as_slice()));
            } else {
                issues.push(IngestIssue::MalformedRow {
                    dataset: kind,
                    row: idx + 1,
                    expected: kind.describe_arity(),
                    found: row.len(),
                });
            }
        }
        accepted
    }
}

/// Converts borrowed literal rows, mostly for tests and fixtures.
pub fn rows<const N: usize>(literal: &[[&str; N]]) -> Vec<RawRow> {
    literal
        .iter()
        .map(|row| row.iter().map(|field| field.to_string()).collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dataset_names_parse_in_several_spellings() {
        assert_eq!("primaryKeys".parse::<DatasetKind>(), Ok(DatasetKind::PrimaryKeys));
        assert_eq!("primary-keys".parse::<DatasetKind>(), Ok(DatasetKind::PrimaryKeys));
        assert_eq!("record_count".parse::<DatasetKind>(), Ok(DatasetKind::RecordCount));
        assert!("views".parse::<DatasetKind>().is_err());
    }

    #[test]
    fn column_rows_accept_missing_trailing_default() {
        assert!(DatasetKind::Columns.accepts(6));
        assert!(DatasetKind::Columns.accepts(7));
        assert!(!DatasetKind::Columns.accepts(5));
        assert!(!DatasetKind::Columns.accepts(8));
        assert!(DatasetKind::Indexes.accepts(9));
    }

    #[test]
    fn valid_rows_reports_rejected_rows_with_position() {
        let datasets = RawDatasets::new().with(
            DatasetKind::PrimaryKeys,
            vec![
                vec!["orders".to_string(), "id".to_string()],
                vec!["orders".to_string()],
            ],
        );
        let mut issues = Vec::new();
        let accepted = datasets.valid_rows(DatasetKind::PrimaryKeys, &mut issues);
        assert_eq!(accepted.len(), 1);
        assert_eq!(
            issues,
            vec![IngestIssue::MalformedRow {
                dataset: DatasetKind::PrimaryKeys,
                row: 2,
                expected: "2".to_string(),
                found: 1,
            }]
        );
        assert_eq!(
            issues[0].to_string(),
            "primaryKeys row 2: expected 2 field(s) but found 1"
        );
    }
}
