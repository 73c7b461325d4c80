pub mod assemble;
pub mod builder;
pub mod cli;
pub mod compare;
pub mod diff;
pub mod duplicates;
pub mod ingest;
pub mod inspect;
pub mod io_utils;
pub mod manifest;
pub mod model;
pub mod report;
pub mod session;
pub mod table;

use std::{env, sync::OnceLock};

use anyhow::Result;
use clap::Parser;
use log::{LevelFilter, debug};

use crate::cli::{Cli, Commands};

pub use crate::{
    builder::{BuildOutcome, build_schema},
    diff::{DestinationColumnMap, TableDiff, diff_table},
    duplicates::find_duplicate_columns,
    ingest::{DatasetKind, IngestIssue, RawDatasets},
    model::{ColumnDescriptor, SchemaCollection, TableSchema},
    session::CompareSession,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("schema_parity", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    debug!("Parsed command line: {:?}", cli.command);
    match cli.command {
        Commands::Build(args) => assemble::execute_build(&args),
        Commands::ColumnMap(args) => assemble::execute_column_map(&args),
        Commands::List(args) => inspect::execute_list(&args),
        Commands::Show(args) => inspect::execute_show(&args),
        Commands::Duplicates(args) => inspect::execute_duplicates(&args),
        Commands::Diff(args) => compare::execute(&args),
    }
}
