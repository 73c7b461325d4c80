//! `build` and `column-map`: CSV exports to JSON snapshots.

use anyhow::{Result, anyhow, bail};
use log::{info, warn};

use crate::{
    builder::{BuildOutcome, build_schema},
    cli::{BuildArgs, ColumnMapArgs, ExportArgs},
    diff::DestinationColumnMap,
    ingest::DatasetKind,
    io_utils,
    manifest::ExportPlan,
};

pub fn execute_build(args: &BuildArgs) -> Result<()> {
    let outcome = assemble(&args.exports)?;
    io_utils::write_json(args.output.as_deref(), &outcome.collection)?;
    info!(
        "Assembled {} table(s) with {} column(s)",
        outcome.collection.len(),
        outcome.collection.column_count()
    );
    Ok(())
}

pub fn execute_column_map(args: &ColumnMapArgs) -> Result<()> {
    let outcome = assemble(&args.exports)?;
    let map = DestinationColumnMap::from_collection(&outcome.collection);
    io_utils::write_json(args.output.as_deref(), &map)?;
    info!("Column map for {} table(s) written", map.len());
    Ok(())
}

fn assemble(args: &ExportArgs) -> Result<BuildOutcome> {
    let plan = ExportPlan::from_args(args)?;
    if plan.is_empty() {
        return Err(anyhow!(
            "No export files given; pass --manifest or at least one dataset flag such as --columns"
        ));
    }
    let datasets = plan.read()?;
    if !datasets.contains(DatasetKind::Tables) {
        info!("No tables export supplied; discovering tables from the columns export");
    }
    let outcome = build_schema(&datasets);
    report_issues(&outcome, args.strict)?;
    Ok(outcome)
}

fn report_issues(outcome: &BuildOutcome, strict: bool) -> Result<()> {
    for issue in &outcome.issues {
        warn!("{issue}");
    }
    if strict && !outcome.is_clean() {
        bail!(
            "{} export row(s) were rejected (running with --strict)",
            outcome.issues.len()
        );
    }
    Ok(())
}
