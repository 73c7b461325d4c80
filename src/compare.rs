//! `diff`: origin snapshot against a destination column map.

use std::fmt::Write as _;

use anyhow::{Context, Result, anyhow};
use log::{debug, info};

use crate::{
    cli::DiffArgs,
    diff::DestinationColumnMap,
    io_utils,
    model::SchemaCollection,
    report::{self, DiffReport},
    session::CompareSession,
};

pub fn execute(args: &DiffArgs) -> Result<()> {
    let origin = SchemaCollection::load(&args.schema)
        .with_context(|| format!("Loading schema snapshot from {:?}", args.schema))?;
    let destination = DestinationColumnMap::load(&args.destination)
        .with_context(|| format!("Loading destination column map from {:?}", args.destination))?;
    debug!(
        "Comparing {} origin table(s) against {} destination table(s)",
        origin.len(),
        destination.len()
    );
    let session = CompareSession::new(origin, destination);

    if let Some(name) = &args.table {
        let diff = session
            .diff(name)
            .ok_or_else(|| anyhow!("Table '{name}' not found in {:?}", args.schema))?;
        if !session.has_destination(name) {
            info!("Table '{name}' is absent from the destination; all columns reported missing");
        }
        if args.json {
            io_utils::write_json(args.output.as_deref(), &diff)?;
        } else {
            io_utils::write_text(args.output.as_deref(), &report::render_table_diff(name, &diff))?;
        }
        info!("{} difference(s) for '{name}'", diff.change_count());
        return Ok(());
    }

    let mut entries = session.diff_all();
    let compared = entries.len();
    if args.only_changed {
        entries.retain(|entry| !entry.diff.is_empty());
    }

    if args.json {
        io_utils::write_json(args.output.as_deref(), &DiffReport::new(&entries))?;
    } else {
        let mut out = String::new();
        for (idx, entry) in entries.iter().enumerate() {
            if idx > 0 {
                let _ = writeln!(out);
            }
            out.push_str(&report::render_table_diff(&entry.table.name, &entry.diff));
        }
        io_utils::write_text(args.output.as_deref(), &out)?;
    }

    let changed = entries.iter().filter(|entry| !entry.diff.is_empty()).count();
    let absent = entries.iter().filter(|entry| !entry.in_destination).count();
    info!("Compared {compared} table(s): {changed} with differences, {absent} absent from destination");
    Ok(())
}
