//! Cross-table duplicate column detection.

use std::collections::BTreeMap;

use crate::model::SchemaCollection;

/// Uppercased column name → tables containing it, in collection order.
pub type DuplicateColumns = BTreeMap<String, Vec<String>>;

/// Column names (case-insensitive) that occur in two or more distinct tables.
/// A table that repeats a column name is listed once for it.
pub fn find_duplicate_columns(collection: &SchemaCollection) -> DuplicateColumns {
    let mut occurrences: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for table in collection {
        for column in &table.columns {
            let tables = occurrences.entry(column.key()).or_default();
            if !tables.iter().any(|name| name == &table.name) {
                tables.push(table.name.clone());
            }
        }
    }
    occurrences.retain(|_, tables| tables.len() > 1);
    occurrences
}
