//! Origin/destination column comparison.
//!
//! The destination side is a [`DestinationColumnMap`]: uppercased table name
//! to the columns captured in the second environment. [`diff_table`] sorts
//! every column of one origin table into missing, extra, or mismatched.
//!
//! A table absent from the destination is reported as all of its columns
//! missing; there is no separate table-level diagnostic.

use std::{
    collections::{BTreeMap, HashMap, HashSet},
    fmt,
    fs::File,
    io::BufReader,
    path::Path,
};

use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Deserializer, Serialize};

use crate::model::{ColumnDescriptor, SchemaCollection, TableSchema};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DestinationColumnMap {
    tables: BTreeMap<String, Vec<ColumnDescriptor>>,
}

impl<'de> Deserialize<'de> for DestinationColumnMap {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = BTreeMap::<String, Vec<ColumnDescriptor>>::deserialize(deserializer)?;
        Ok(raw.into())
    }
}

impl From<BTreeMap<String, Vec<ColumnDescriptor>>> for DestinationColumnMap {
    fn from(raw: BTreeMap<String, Vec<ColumnDescriptor>>) -> Self {
        let mut map = DestinationColumnMap::default();
        for (table, columns) in raw {
            map.insert(&table, columns);
        }
        map
    }
}

impl DestinationColumnMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `columns` under the uppercased table name. When two names
    /// collide after uppercasing, the first one stored is kept.
    pub fn insert(&mut self, table: &str, columns: Vec<ColumnDescriptor>) -> bool {
        let key = table.to_uppercase();
        if self.tables.contains_key(&key) {
            warn!("Destination table '{table}' collides with an existing entry for '{key}'; keeping the first");
            return false;
        }
        self.tables.insert(key, columns);
        true
    }

    pub fn from_collection(collection: &SchemaCollection) -> Self {
        let mut map = DestinationColumnMap::new();
        for table in collection {
            map.insert(&table.name, table.columns.clone());
        }
        map
    }

    pub fn get(&self, table: &str) -> Option<&[ColumnDescriptor]> {
        self.tables.get(&table.to_uppercase()).map(Vec::as_slice)
    }

    pub fn contains_table(&self, table: &str) -> bool {
        self.tables.contains_key(&table.to_uppercase())
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let file =
            File::create(path).with_context(|| format!("Creating column map {path:?}"))?;
        serde_json::to_writer_pretty(file, self).context("Writing column map JSON")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening column map {path:?}"))?;
        let reader = BufReader::new(file);
        let map = serde_json::from_reader(reader).context("Parsing column map JSON")?;
        Ok(map)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ColumnAttribute {
    Type,
    Size,
    Default,
    Constraints,
}

impl ColumnAttribute {
    pub const ALL: [ColumnAttribute; 4] = [
        ColumnAttribute::Type,
        ColumnAttribute::Size,
        ColumnAttribute::Default,
        ColumnAttribute::Constraints,
    ];

    pub fn value_of(self, column: &ColumnDescriptor) -> &str {
        match self {
            ColumnAttribute::Type => &column.data_type,
            ColumnAttribute::Size => &column.size,
            ColumnAttribute::Default => &column.default,
            ColumnAttribute::Constraints => &column.constraints,
        }
    }
}

impl fmt::Display for ColumnAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ColumnAttribute::Type => "type",
            ColumnAttribute::Size => "size",
            ColumnAttribute::Default => "default",
            ColumnAttribute::Constraints => "constraints",
        };
        f.write_str(label)
    }
}

/// Attributes whose values differ between the two columns, by exact string
/// comparison.
pub fn differing_attributes(
    origin: &ColumnDescriptor,
    destination: &ColumnDescriptor,
) -> Vec<ColumnAttribute> {
    ColumnAttribute::ALL
        .into_iter()
        .filter(|attribute| attribute.value_of(origin) != attribute.value_of(destination))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMismatch {
    pub origin: ColumnDescriptor,
    pub destination: ColumnDescriptor,
}

impl ColumnMismatch {
    pub fn attributes(&self) -> Vec<ColumnAttribute> {
        differing_attributes(&self.origin, &self.destination)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableDiff {
    pub missing_in_destination: Vec<ColumnDescriptor>,
    pub extra_in_destination: Vec<ColumnDescriptor>,
    pub mismatched: Vec<ColumnMismatch>,
}

impl TableDiff {
    pub fn is_empty(&self) -> bool {
        self.missing_in_destination.is_empty()
            && self.extra_in_destination.is_empty()
            && self.mismatched.is_empty()
    }

    pub fn change_count(&self) -> usize {
        self.missing_in_destination.len() + self.extra_in_destination.len() + self.mismatched.len()
    }
}

pub fn diff_table(table: &TableSchema, destination: &DestinationColumnMap) -> TableDiff {
    let origin_columns: Vec<ColumnDescriptor> =
        table.columns.iter().map(ColumnDescriptor::normalized).collect();

    let Some(destination_columns) = destination.get(&table.name) else {
        return TableDiff {
            missing_in_destination: origin_columns,
            ..TableDiff::default()
        };
    };
    let destination_columns: Vec<ColumnDescriptor> = destination_columns
        .iter()
        .map(ColumnDescriptor::normalized)
        .collect();

    // First occurrence wins, as a front-to-back scan would.
    let mut destination_by_name: HashMap<&str, &ColumnDescriptor> = HashMap::new();
    for column in &destination_columns {
        destination_by_name.entry(column.name.as_str()).or_insert(column);
    }

    let mut diff = TableDiff::default();
    for origin in &origin_columns {
        match destination_by_name.get(origin.name.as_str()) {
            None => diff.missing_in_destination.push(origin.clone()),
            Some(destination) => {
                if !differing_attributes(origin, destination).is_empty() {
                    diff.mismatched.push(ColumnMismatch {
                        origin: origin.clone(),
                        destination: (*destination).clone(),
                    });
                }
            }
        }
    }

    let origin_names: HashSet<&str> =
        origin_columns.iter().map(|column| column.name.as_str()).collect();
    diff.extra_in_destination = destination_columns
        .iter()
        .filter(|column| !origin_names.contains(column.name.as_str()))
        .cloned()
        .collect();

    diff
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(name: &str, data_type: &str, size: &str, constraints: &str) -> ColumnDescriptor {
        ColumnDescriptor {
            name: name.to_string(),
            data_type: data_type.to_string(),
            size: size.to_string(),
            default: "NULL".to_string(),
            constraints: constraints.to_string(),
        }
    }

    #[test]
    fn map_keys_are_uppercased_on_load() {
        let json = r#"{"orders": [{"name": "id", "type": "int", "size": "4", "default": "NULL", "constraints": ""}]}"#;
        let map: DestinationColumnMap = serde_json::from_str(json).expect("parse map");
        assert!(map.contains_table("ORDERS"));
        assert!(map.contains_table("Orders"));
        assert_eq!(map.table_names().collect::<Vec<_>>(), vec!["ORDERS"]);
        let round_trip = serde_json::to_value(&map).expect("serialize");
        assert!(round_trip.get("ORDERS").is_some());
    }

    #[test]
    fn first_destination_column_wins_on_repeated_names() {
        let mut table = TableSchema::new("t", "dbo");
        table.columns = vec![column("id", "int", "4", "")];
        let mut destination = DestinationColumnMap::new();
        destination.insert(
            "T",
            vec![column("ID", "int", "4", ""), column("id", "bigint", "8", "")],
        );
        let diff = diff_table(&table, &destination);
        assert!(diff.missing_in_destination.is_empty());
        assert!(diff.mismatched.is_empty());
        assert!(diff.extra_in_destination.is_empty());
    }

    #[test]
    fn differing_attributes_names_each_changed_field() {
        let origin = column("ID", "int", "4", "NOT NULL");
        let destination = column("ID", "bigint", "8", "NOT NULL");
        assert_eq!(
            differing_attributes(&origin, &destination),
            vec![ColumnAttribute::Type, ColumnAttribute::Size]
        );
    }

    #[test]
    fn default_marker_difference_is_a_mismatch() {
        let mut table = TableSchema::new("t", "dbo");
        table.columns = vec![column("flag", "bit", "1", "")];
        let mut changed = column("FLAG", "bit", "1", "");
        changed.default = "((0))".to_string();
        let mut destination = DestinationColumnMap::new();
        destination.insert("t", vec![changed]);
        let diff = diff_table(&table, &destination);
        assert_eq!(diff.mismatched.len(), 1);
        assert_eq!(diff.mismatched[0].attributes(), vec![ColumnAttribute::Default]);
    }
}
