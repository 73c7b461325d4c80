use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::{ingest::DatasetKind, session::TableFilter};

#[derive(Debug, Parser)]
#[command(author, version, about = "Assemble schema exports and compare environments", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Assemble CSV schema exports into an origin schema snapshot (.json)
    Build(BuildArgs),
    /// Assemble CSV column exports into a destination column map (.json)
    ColumnMap(ColumnMapArgs),
    /// List tables of a schema snapshot
    List(ListArgs),
    /// Show the structure of one table
    Show(ShowArgs),
    /// Report column names shared by two or more tables
    Duplicates(DuplicatesArgs),
    /// Compare origin tables against a destination column map
    Diff(DiffArgs),
}

/// Export file locations shared by the assembling commands.
#[derive(Debug, Args, Default)]
pub struct ExportArgs {
    /// YAML manifest listing the export files; explicit flags override it
    #[arg(long)]
    pub manifest: Option<PathBuf>,
    /// Tables export: TableName, SchemaName
    #[arg(long)]
    pub tables: Option<PathBuf>,
    /// Columns export: TableName, ColumnName, DataType, Size, IsNullable, IsIdentity, Default
    #[arg(long)]
    pub columns: Option<PathBuf>,
    /// Primary key export: TableName, ColumnName
    #[arg(long = "primary-keys")]
    pub primary_keys: Option<PathBuf>,
    /// Index export: TableName, IndexName, ...
    #[arg(long)]
    pub indexes: Option<PathBuf>,
    /// Foreign key export: FkName, ParentTable, ParentColumn, ReferencedTable, ReferencedColumn
    #[arg(long = "foreign-keys")]
    pub foreign_keys: Option<PathBuf>,
    /// Constraint export: TableName, ConstraintName, ...
    #[arg(long)]
    pub constraints: Option<PathBuf>,
    /// Trigger export: TableName, TriggerName, ...
    #[arg(long)]
    pub triggers: Option<PathBuf>,
    /// Record count export: TableName, SchemaName, RowCount
    #[arg(long = "record-count")]
    pub record_count: Option<PathBuf>,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the export files (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Fail when any export row is rejected or a record count is invalid
    #[arg(long)]
    pub strict: bool,
}

impl ExportArgs {
    pub fn explicit_paths(&self) -> Vec<(DatasetKind, &PathBuf)> {
        [
            (DatasetKind::Tables, &self.tables),
            (DatasetKind::Columns, &self.columns),
            (DatasetKind::PrimaryKeys, &self.primary_keys),
            (DatasetKind::Indexes, &self.indexes),
            (DatasetKind::ForeignKeys, &self.foreign_keys),
            (DatasetKind::Constraints, &self.constraints),
            (DatasetKind::Triggers, &self.triggers),
            (DatasetKind::RecordCount, &self.record_count),
        ]
        .into_iter()
        .filter_map(|(kind, path)| path.as_ref().map(|path| (kind, path)))
        .collect()
    }
}

#[derive(Debug, Args)]
pub struct BuildArgs {
    #[command(flatten)]
    pub exports: ExportArgs,
    /// Output schema snapshot (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ColumnMapArgs {
    #[command(flatten)]
    pub exports: ExportArgs,
    /// Output column map (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Origin schema snapshot produced by `build`
    #[arg(short = 's', long = "schema")]
    pub schema: PathBuf,
    /// Destination column map, required by destination-aware filters
    #[arg(short = 'd', long = "destination")]
    pub destination: Option<PathBuf>,
    /// Which tables to list
    #[arg(long, value_enum, default_value = "all")]
    pub filter: TableFilter,
    /// Only list tables whose name matches this regular expression
    #[arg(long)]
    pub pattern: Option<String>,
}

#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Origin schema snapshot produced by `build`
    #[arg(short = 's', long = "schema")]
    pub schema: PathBuf,
    /// Table to display (exact name)
    #[arg(short = 't', long = "table")]
    pub table: String,
}

#[derive(Debug, Args)]
pub struct DuplicatesArgs {
    /// Origin schema snapshot produced by `build`
    #[arg(short = 's', long = "schema")]
    pub schema: PathBuf,
    /// Emit the report as JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct DiffArgs {
    /// Origin schema snapshot produced by `build`
    #[arg(short = 's', long = "schema")]
    pub schema: PathBuf,
    /// Destination column map
    #[arg(short = 'd', long = "destination")]
    pub destination: PathBuf,
    /// Compare a single table (exact name); all tables when omitted
    #[arg(short = 't', long = "table")]
    pub table: Option<String>,
    /// Skip tables without differences
    #[arg(long = "only-changed")]
    pub only_changed: bool,
    /// Emit the result as JSON instead of tables
    #[arg(long)]
    pub json: bool,
    /// Write output to this file instead of stdout
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
