//! YAML manifest naming the export files of one environment.
//!
//! ```yaml
//! delimiter: ","
//! encoding: utf-8
//! datasets:
//!   tables: exports/tables.csv
//!   columns: exports/columns.csv
//!   primaryKeys: exports/pk.csv
//! ```
//!
//! Relative dataset paths resolve against the manifest's own directory.

use std::{
    collections::BTreeMap,
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, anyhow};
use encoding_rs::Encoding;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::{
    cli::{ExportArgs, parse_delimiter},
    ingest::{DatasetKind, RawDatasets},
    io_utils,
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportManifest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delimiter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
    #[serde(default)]
    pub datasets: BTreeMap<DatasetKind, PathBuf>,
}

impl ExportManifest {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening manifest {path:?}"))?;
        let reader = BufReader::new(file);
        let mut manifest: ExportManifest =
            serde_yaml::from_reader(reader).context("Parsing manifest YAML")?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        for dataset_path in manifest.datasets.values_mut() {
            if dataset_path.is_relative() && !io_utils::is_dash(dataset_path) {
                *dataset_path = base.join(&*dataset_path);
            }
        }
        Ok(manifest)
    }

    pub fn delimiter(&self) -> Result<Option<u8>> {
        self.delimiter
            .as_deref()
            .map(|value| parse_delimiter(value).map_err(|err| anyhow!("Manifest delimiter: {err}")))
            .transpose()
    }
}

/// Export paths and read options after merging CLI flags over an optional
/// manifest.
#[derive(Debug, Clone)]
pub struct ExportPlan {
    pub datasets: BTreeMap<DatasetKind, PathBuf>,
    pub delimiter: Option<u8>,
    pub encoding: &'static Encoding,
}

impl ExportPlan {
    pub fn from_args(args: &ExportArgs) -> Result<Self> {
        let manifest = match &args.manifest {
            Some(path) => ExportManifest::load(path)
                .with_context(|| format!("Loading manifest from {path:?}"))?,
            None => ExportManifest::default(),
        };

        let mut datasets = manifest.datasets.clone();
        for (kind, path) in args.explicit_paths() {
            datasets.insert(kind, path.clone());
        }

        let delimiter = match args.delimiter {
            Some(delimiter) => Some(delimiter),
            None => manifest.delimiter()?,
        };
        let encoding = io_utils::resolve_encoding(
            args.input_encoding
                .as_deref()
                .or(manifest.encoding.as_deref()),
        )?;

        Ok(Self {
            datasets,
            delimiter,
            encoding,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }

    pub fn read(&self) -> Result<RawDatasets> {
        let mut raw = RawDatasets::new();
        for (kind, path) in &self.datasets {
            let delimiter = io_utils::resolve_input_delimiter(path, self.delimiter);
            let rows = io_utils::read_export_rows(path, delimiter, self.encoding)
                .with_context(|| format!("Reading {kind} export"))?;
            debug!("Read {} row(s) of {} from {:?}", rows.len(), kind, path);
            raw.insert(*kind, rows);
        }
        info!(
            "Loaded {} dataset(s): {}",
            self.datasets.len(),
            raw.kinds().map(|kind| kind.as_str()).collect::<Vec<_>>().join(", ")
        );
        Ok(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn manifest_paths_resolve_relative_to_manifest() {
        let dir = tempdir().expect("temp dir");
        let manifest_path = dir.path().join("exports.yaml");
        let mut file = File::create(&manifest_path).expect("create manifest");
        writeln!(file, "delimiter: tab").unwrap();
        writeln!(file, "datasets:").unwrap();
        writeln!(file, "  columns: data/columns.tsv").unwrap();
        writeln!(file, "  primaryKeys: /abs/pk.tsv").unwrap();
        drop(file);

        let manifest = ExportManifest::load(&manifest_path).expect("load manifest");
        assert_eq!(manifest.delimiter().expect("delimiter"), Some(b'\t'));
        assert_eq!(
            manifest.datasets.get(&DatasetKind::Columns),
            Some(&dir.path().join("data/columns.tsv"))
        );
        assert_eq!(
            manifest.datasets.get(&DatasetKind::PrimaryKeys),
            Some(&PathBuf::from("/abs/pk.tsv"))
        );
    }

    #[test]
    fn unknown_dataset_keys_are_rejected() {
        let err = serde_yaml::from_str::<ExportManifest>("datasets:\n  views: v.csv\n")
            .expect_err("unknown dataset");
        assert!(err.to_string().contains("views"));
    }
}
