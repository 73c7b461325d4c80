//! `list`, `show`, and `duplicates` over an origin schema snapshot.

use anyhow::{Context, Result, anyhow};
use log::info;
use clap::ValueEnum;
use regex::Regex;

use crate::{
    cli::{DuplicatesArgs, ListArgs, ShowArgs},
    diff::DestinationColumnMap,
    io_utils,
    model::SchemaCollection,
    report,
    session::CompareSession,
    table::TextTable,
};

fn load_origin(path: &std::path::Path) -> Result<SchemaCollection> {
    SchemaCollection::load(path).with_context(|| format!("Loading schema snapshot from {path:?}"))
}

pub fn execute_list(args: &ListArgs) -> Result<()> {
    if args.filter.needs_destination() && args.destination.is_none() {
        let filter = args
            .filter
            .to_possible_value()
            .map(|value| value.get_name().to_string())
            .unwrap_or_default();
        return Err(anyhow!(
            "Filter '{filter}' needs a destination column map (--destination)"
        ));
    }
    let pattern = args
        .pattern
        .as_deref()
        .map(Regex::new)
        .transpose()
        .context("Compiling --pattern")?;

    let destination = match &args.destination {
        Some(path) => DestinationColumnMap::load(path)
            .with_context(|| format!("Loading destination column map from {path:?}"))?,
        None => DestinationColumnMap::new(),
    };
    let session = CompareSession::new(load_origin(&args.schema)?, destination);

    let tables = session.filter_tables(args.filter, pattern.as_ref());
    let mut listing = TextTable::new(["table", "schema", "columns", "primary key", "records"]);
    for table in &tables {
        listing.push_row([
            table.name.clone(),
            table.schema.clone(),
            table.columns.len().to_string(),
            table.primary_key_columns().join(", "),
            table.record_count.to_string(),
        ]);
    }
    io_utils::write_text(None, &listing.to_string())?;
    info!(
        "Listed {} of {} table(s)",
        tables.len(),
        session.origin().len()
    );
    Ok(())
}

pub fn execute_show(args: &ShowArgs) -> Result<()> {
    let origin = load_origin(&args.schema)?;
    let table = origin
        .get(&args.table)
        .ok_or_else(|| anyhow!("Table '{}' not found in {:?}", args.table, args.schema))?;
    io_utils::write_text(None, &report::render_table_details(table))
}

pub fn execute_duplicates(args: &DuplicatesArgs) -> Result<()> {
    let session = CompareSession::new(load_origin(&args.schema)?, DestinationColumnMap::new());
    let duplicates = session.duplicates();
    if args.json {
        io_utils::write_json(None, &duplicates)?;
    } else {
        io_utils::write_text(None, &report::render_duplicates(&duplicates))?;
    }
    info!(
        "Found {} column name(s) shared across tables",
        duplicates.len()
    );
    Ok(())
}
