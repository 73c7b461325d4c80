//! Schema model shared by the builder, the duplicate detector, and the differ.
//!
//! A [`SchemaCollection`] holds one [`TableSchema`] per table in load order.
//! Column identity is case-insensitive: every comparison goes through
//! [`ColumnDescriptor::key`], which yields the uppercased name.
//!
//! The string literals `NULL`, `NOT NULL`, `PRIMARY KEY` and `FOREIGN KEY`
//! are part of the JSON snapshot format and must not change.

use std::{fmt, fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};

pub const NULL_DEFAULT: &str = "NULL";
pub const CONSTRAINT_SEPARATOR: &str = ", ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ConstraintKind {
    NotNull,
    PrimaryKey,
    ForeignKey,
}

impl ConstraintKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ConstraintKind::NotNull => "NOT NULL",
            ConstraintKind::PrimaryKey => "PRIMARY KEY",
            ConstraintKind::ForeignKey => "FOREIGN KEY",
        }
    }
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    #[serde(rename = "type", default)]
    pub data_type: String,
    #[serde(default)]
    pub size: String,
    #[serde(default = "default_marker", deserialize_with = "null_as_marker")]
    pub default: String,
    #[serde(default)]
    pub constraints: String,
}

fn default_marker() -> String {
    NULL_DEFAULT.to_string()
}

/// A JSON `null` default reads as the `NULL` marker.
fn null_as_marker<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(default_marker))
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>, size: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            size: size.into(),
            default: default_marker(),
            constraints: String::new(),
        }
    }

    /// Canonical comparison form of the column name.
    pub fn key(&self) -> String {
        self.name.to_uppercase()
    }

    /// Appends a constraint token, inserting the separator only after an
    /// existing token. Tokens are never removed.
    pub fn push_constraint(&mut self, kind: ConstraintKind) {
        if !self.constraints.is_empty() {
            self.constraints.push_str(CONSTRAINT_SEPARATOR);
        }
        self.constraints.push_str(kind.as_str());
    }

    /// Copy of this column with the name in canonical form.
    pub fn normalized(&self) -> Self {
        Self {
            name: self.key(),
            ..self.clone()
        }
    }

    /// `int(4)` style rendering used by the text reports.
    pub fn type_signature(&self) -> String {
        if self.size.is_empty() {
            self.data_type.clone()
        } else {
            format!("{}({})", self.data_type, self.size)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimaryKeyDetail {
    pub column: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDetail {
    pub name: String,
    #[serde(default)]
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForeignKeyDetail {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub column: String,
    #[serde(default)]
    pub foreign_table: String,
    #[serde(default)]
    pub foreign_column: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintDetail {
    pub name: String,
    #[serde(default)]
    pub column: String,
    #[serde(rename = "type", default)]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerDetail {
    #[serde(default)]
    pub schema: String,
    pub name: String,
    #[serde(default)]
    pub event: String,
    #[serde(default)]
    pub timing: String,
    #[serde(default)]
    pub statement: String,
}

/// Anything attached to a table that can be listed by a single label.
pub trait Labelled {
    fn label(&self) -> &str;
}

impl Labelled for PrimaryKeyDetail {
    fn label(&self) -> &str {
        &self.column
    }
}

impl Labelled for IndexDetail {
    fn label(&self) -> &str {
        &self.name
    }
}

impl Labelled for ForeignKeyDetail {
    fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.column)
    }
}

impl Labelled for ConstraintDetail {
    fn label(&self) -> &str {
        &self.name
    }
}

impl Labelled for TriggerDetail {
    fn label(&self) -> &str {
        &self.name
    }
}

/// A table-level entry in either the minimal (bare name) or the rich
/// (structured object) snapshot shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Attached<T> {
    Name(String),
    Detailed(T),
}

impl<T: Labelled> Attached<T> {
    pub fn label(&self) -> &str {
        match self {
            Attached::Name(name) => name,
            Attached::Detailed(detail) => detail.label(),
        }
    }

    pub fn detail(&self) -> Option<&T> {
        match self {
            Attached::Name(_) => None,
            Attached::Detailed(detail) => Some(detail),
        }
    }
}

impl<T> From<String> for Attached<T> {
    fn from(value: String) -> Self {
        Attached::Name(value)
    }
}

/// Advisory sizing figures. Carried through snapshots, never compared.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Performance {
    #[serde(default)]
    pub fragmentation: String,
    #[serde(default)]
    pub table_size: String,
    #[serde(default)]
    pub index_size: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSchema {
    pub name: String,
    #[serde(default)]
    pub schema: String,
    #[serde(default)]
    pub columns: Vec<ColumnDescriptor>,
    #[serde(default)]
    pub primary_key: Vec<Attached<PrimaryKeyDetail>>,
    #[serde(default)]
    pub indexes: Vec<Attached<IndexDetail>>,
    #[serde(default)]
    pub foreign_keys: Vec<Attached<ForeignKeyDetail>>,
    #[serde(default)]
    pub constraints: Vec<Attached<ConstraintDetail>>,
    #[serde(default)]
    pub triggers: Vec<Attached<TriggerDetail>>,
    #[serde(default)]
    pub record_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performance: Option<Performance>,
}

impl TableSchema {
    pub fn new(name: impl Into<String>, schema: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema: schema.into(),
            ..Self::default()
        }
    }

    pub fn has_primary_key(&self) -> bool {
        !self.primary_key.is_empty()
    }

    /// Primary key column names in key order, whichever shape they were
    /// loaded in.
    pub fn primary_key_columns(&self) -> Vec<&str> {
        self.primary_key.iter().map(Attached::label).collect()
    }
}

/// Ordered table name → record mapping. Serialized as a JSON array.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaCollection {
    tables: Vec<TableSchema>,
}

impl SchemaCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a table unless one with the same exact name exists. Returns
    /// `false` when the table was rejected as a duplicate.
    pub fn insert(&mut self, table: TableSchema) -> bool {
        if self.contains(&table.name) {
            return false;
        }
        self.tables.push(table);
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<&TableSchema> {
        self.tables.iter().find(|table| table.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TableSchema> {
        self.tables.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut TableSchema> {
        self.tables.iter_mut()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tables.iter().map(|table| table.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn column_count(&self) -> usize {
        self.tables.iter().map(|table| table.columns.len()).sum()
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let file =
            File::create(path).with_context(|| format!("Creating schema snapshot {path:?}"))?;
        serde_json::to_writer_pretty(file, self).context("Writing schema snapshot JSON")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening schema snapshot {path:?}"))?;
        let reader = BufReader::new(file);
        let collection =
            serde_json::from_reader(reader).context("Parsing schema snapshot JSON")?;
        Ok(collection)
    }
}

impl FromIterator<TableSchema> for SchemaCollection {
    fn from_iter<I: IntoIterator<Item = TableSchema>>(iter: I) -> Self {
        let mut collection = SchemaCollection::new();
        for table in iter {
            collection.insert(table);
        }
        collection
    }
}

impl<'a> IntoIterator for &'a SchemaCollection {
    type Item = &'a TableSchema;
    type IntoIter = std::slice::Iter<'a, TableSchema>;

    fn into_iter(self) -> Self::IntoIter {
        self.tables.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_constraint_inserts_separator_only_after_existing_token() {
        let mut column = ColumnDescriptor::new("id", "int", "4");
        column.push_constraint(ConstraintKind::PrimaryKey);
        assert_eq!(column.constraints, "PRIMARY KEY");
        column.push_constraint(ConstraintKind::ForeignKey);
        assert_eq!(column.constraints, "PRIMARY KEY, FOREIGN KEY");
    }

    #[test]
    fn null_default_reads_as_null_marker() {
        let column: ColumnDescriptor =
            serde_json::from_str(r#"{"name": "notes", "type": "text", "default": null}"#)
                .expect("parse column");
        assert_eq!(column.default, NULL_DEFAULT);
        let missing: ColumnDescriptor =
            serde_json::from_str(r#"{"name": "notes"}"#).expect("parse column");
        assert_eq!(missing.default, NULL_DEFAULT);
    }

    #[test]
    fn primary_key_entries_load_as_names_or_objects() {
        let json = r#"[
            {"name": "orders", "primaryKey": [{"column": "id"}, {"column": "region"}]},
            {"name": "customers", "primaryKey": ["id"]},
            {"name": "audit_log"}
        ]"#;
        let collection: SchemaCollection = serde_json::from_str(json).expect("parse snapshot");
        let orders = collection.get("orders").expect("orders");
        assert_eq!(orders.primary_key_columns(), vec!["id", "region"]);
        assert_eq!(
            orders.primary_key[0].detail(),
            Some(&PrimaryKeyDetail { column: "id".to_string() })
        );
        assert!(orders.has_primary_key());
        let customers = collection.get("customers").expect("customers");
        assert_eq!(customers.primary_key_columns(), vec!["id"]);
        assert!(!collection.get("audit_log").expect("audit_log").has_primary_key());
    }

    #[test]
    fn column_json_uses_snapshot_field_names() {
        let column = ColumnDescriptor::new("id", "int", "4");
        let json = serde_json::to_value(&column).expect("serialize");
        assert_eq!(json["type"], "int");
        assert_eq!(json["default"], "NULL");
        assert_eq!(json["constraints"], "");
    }

    #[test]
    fn attached_entries_accept_both_shapes() {
        let json = r#"{
            "name": "orders",
            "indexes": ["IX_orders_date", {"name": "IX_orders_customer", "columns": ["customer_id"]}],
            "triggers": [{"schema": "dbo", "name": "TR_orders_audit", "event": "INSERT", "timing": "AFTER", "statement": "..."}]
        }"#;
        let table: TableSchema = serde_json::from_str(json).expect("parse table");
        assert_eq!(table.indexes[0].label(), "IX_orders_date");
        assert_eq!(table.indexes[1].label(), "IX_orders_customer");
        assert_eq!(
            table.indexes[1].detail().map(|index| index.columns.clone()),
            Some(vec!["customer_id".to_string()])
        );
        assert_eq!(table.triggers[0].label(), "TR_orders_audit");
        assert_eq!(table.record_count, 0);
        assert!(table.performance.is_none());
    }

    #[test]
    fn collection_rejects_duplicate_names_and_keeps_order() {
        let mut collection = SchemaCollection::new();
        assert!(collection.insert(TableSchema::new("b", "dbo")));
        assert!(collection.insert(TableSchema::new("a", "dbo")));
        assert!(!collection.insert(TableSchema::new("b", "sales")));
        assert_eq!(collection.names().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(collection.get("b").map(|t| t.schema.as_str()), Some("dbo"));
        assert!(collection.get("B").is_none());
    }
}
