mod common;

use schema_parity::{
    builder::build_schema,
    duplicates::find_duplicate_columns,
    ingest::{DatasetKind, RawDatasets, rows},
    model::{SchemaCollection, TableSchema},
};

use common::column;

fn table(name: &str, columns: &[&str]) -> TableSchema {
    let mut table = TableSchema::new(name, "dbo");
    table.columns = columns
        .iter()
        .map(|name| column(name, "varchar", "255", "NULL", ""))
        .collect();
    table
}

#[test]
fn email_in_two_tables_is_reported_uppercased() {
    let collection: SchemaCollection = [table("A", &["Email"]), table("B", &["email"])]
        .into_iter()
        .collect();
    let duplicates = find_duplicate_columns(&collection);
    assert_eq!(duplicates.len(), 1);
    assert_eq!(
        duplicates.get("EMAIL"),
        Some(&vec!["A".to_string(), "B".to_string()])
    );
}

#[test]
fn single_table_names_are_excluded() {
    let collection: SchemaCollection = [
        table("customers", &["id", "email"]),
        table("orders", &["id", "total"]),
        table("audit_log", &["message"]),
    ]
    .into_iter()
    .collect();
    let duplicates = find_duplicate_columns(&collection);
    assert_eq!(duplicates.keys().collect::<Vec<_>>(), vec!["ID"]);
    assert_eq!(
        duplicates["ID"],
        vec!["customers".to_string(), "orders".to_string()]
    );
}

#[test]
fn empty_collection_has_no_duplicates() {
    assert!(find_duplicate_columns(&SchemaCollection::new()).is_empty());
}

#[test]
fn duplicates_follow_collection_order_after_building() {
    let datasets = RawDatasets::new()
        .with(
            DatasetKind::Tables,
            rows(&[["zeta", "dbo"], ["alpha", "dbo"], ["mid", "dbo"]]),
        )
        .with(
            DatasetKind::Columns,
            rows(&[
                ["alpha", "created_at", "datetime", "8", "1", "0", ""],
                ["mid", "CREATED_AT", "datetime", "8", "1", "0", ""],
                ["zeta", "Created_At", "datetime2", "8", "0", "0", ""],
            ]),
        );
    let outcome = build_schema(&datasets);
    let duplicates = find_duplicate_columns(&outcome.collection);
    assert_eq!(
        duplicates["CREATED_AT"],
        vec!["zeta".to_string(), "alpha".to_string(), "mid".to_string()]
    );
}
