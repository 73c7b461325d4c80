//! Caller-owned comparison state.
//!
//! A [`CompareSession`] holds the current origin collection and destination
//! column map. Loading either side replaces it wholesale; nothing is patched
//! incrementally. All queries borrow the session and have no side effects.

use clap::ValueEnum;
use regex::Regex;

use crate::{
    diff::{DestinationColumnMap, TableDiff, diff_table},
    duplicates::{DuplicateColumns, find_duplicate_columns},
    model::{SchemaCollection, TableSchema},
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "kebab-case")]
pub enum TableFilter {
    #[default]
    All,
    NoPk,
    MissingInDestination,
    InDestination,
    MissingInDestinationNoPk,
    InDestinationNoPk,
}

impl TableFilter {
    pub fn needs_destination(self) -> bool {
        !matches!(self, TableFilter::All | TableFilter::NoPk)
    }

    pub fn matches(self, table: &TableSchema, destination: &DestinationColumnMap) -> bool {
        let present = destination.contains_table(&table.name);
        let no_pk = !table.has_primary_key();
        match self {
            TableFilter::All => true,
            TableFilter::NoPk => no_pk,
            TableFilter::MissingInDestination => !present,
            TableFilter::InDestination => present,
            TableFilter::MissingInDestinationNoPk => !present && no_pk,
            TableFilter::InDestinationNoPk => present && no_pk,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TableDiffEntry<'a> {
    pub table: &'a TableSchema,
    pub in_destination: bool,
    pub diff: TableDiff,
}

#[derive(Debug, Clone, Default)]
pub struct CompareSession {
    origin: SchemaCollection,
    destination: DestinationColumnMap,
}

impl CompareSession {
    pub fn new(origin: SchemaCollection, destination: DestinationColumnMap) -> Self {
        Self {
            origin,
            destination,
        }
    }

    pub fn load_origin(&mut self, origin: SchemaCollection) {
        self.origin = origin;
    }

    pub fn load_destination(&mut self, destination: DestinationColumnMap) {
        self.destination = destination;
    }

    pub fn origin(&self) -> &SchemaCollection {
        &self.origin
    }

    pub fn destination(&self) -> &DestinationColumnMap {
        &self.destination
    }

    pub fn has_destination(&self, table: &str) -> bool {
        self.destination.contains_table(table)
    }

    /// Origin tables accepted by `filter` and, when given, whose name matches
    /// `pattern`. Collection order is preserved.
    pub fn filter_tables(&self, filter: TableFilter, pattern: Option<&Regex>) -> Vec<&TableSchema> {
        self.origin
            .iter()
            .filter(|table| filter.matches(table, &self.destination))
            .filter(|table| pattern.is_none_or(|regex| regex.is_match(&table.name)))
            .collect()
    }

    pub fn diff(&self, table: &str) -> Option<TableDiff> {
        self.origin
            .get(table)
            .map(|table| diff_table(table, &self.destination))
    }

    pub fn diff_all(&self) -> Vec<TableDiffEntry<'_>> {
        self.origin
            .iter()
            .map(|table| TableDiffEntry {
                table,
                in_destination: self.destination.contains_table(&table.name),
                diff: diff_table(table, &self.destination),
            })
            .collect()
    }

    pub fn duplicates(&self) -> DuplicateColumns {
        find_duplicate_columns(&self.origin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Attached, ColumnDescriptor};

    fn session() -> CompareSession {
        let mut keyed = TableSchema::new("orders", "dbo");
        keyed.primary_key = vec![Attached::Name("id".to_string())];
        keyed.columns = vec![ColumnDescriptor::new("id", "int", "4")];
        let unkeyed = TableSchema::new("audit_log", "dbo");
        let staging = TableSchema::new("staging_orders", "etl");
        let origin: SchemaCollection = [keyed, unkeyed, staging].into_iter().collect();

        let mut destination = DestinationColumnMap::new();
        destination.insert("ORDERS", vec![ColumnDescriptor::new("ID", "int", "4")]);
        destination.insert("AUDIT_LOG", Vec::new());
        CompareSession::new(origin, destination)
    }

    fn names(tables: Vec<&TableSchema>) -> Vec<&str> {
        tables.into_iter().map(|table| table.name.as_str()).collect()
    }

    #[test]
    fn filters_combine_key_and_destination_presence() {
        let session = session();
        assert_eq!(
            names(session.filter_tables(TableFilter::All, None)),
            vec!["orders", "audit_log", "staging_orders"]
        );
        assert_eq!(
            names(session.filter_tables(TableFilter::NoPk, None)),
            vec!["audit_log", "staging_orders"]
        );
        assert_eq!(
            names(session.filter_tables(TableFilter::MissingInDestination, None)),
            vec!["staging_orders"]
        );
        assert_eq!(
            names(session.filter_tables(TableFilter::InDestinationNoPk, None)),
            vec!["audit_log"]
        );
        assert_eq!(
            names(session.filter_tables(TableFilter::MissingInDestinationNoPk, None)),
            vec!["staging_orders"]
        );
    }

    #[test]
    fn pattern_narrows_listing() {
        let session = session();
        let pattern = Regex::new("orders$").expect("regex");
        assert_eq!(
            names(session.filter_tables(TableFilter::All, Some(&pattern))),
            vec!["orders", "staging_orders"]
        );
    }

    #[test]
    fn loading_destination_replaces_previous_state() {
        let mut session = session();
        assert!(session.has_destination("orders"));
        session.load_destination(DestinationColumnMap::new());
        assert!(!session.has_destination("orders"));
        let diff = session.diff("orders").expect("origin table");
        assert_eq!(diff.missing_in_destination.len(), 1);
        assert!(session.diff("unknown").is_none());
    }
}
