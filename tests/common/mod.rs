#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use schema_parity::model::ColumnDescriptor;
use tempfile::{TempDir, tempdir};

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent dirs");
        }
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }

    /// Writes the sample origin exports and returns the workspace.
    pub fn with_origin_exports() -> Self {
        let workspace = Self::new();
        workspace.write("tables.csv", TABLES_CSV);
        workspace.write("columns.csv", COLUMNS_CSV);
        workspace.write("pk.csv", PRIMARY_KEYS_CSV);
        workspace.write("fk.csv", FOREIGN_KEYS_CSV);
        workspace.write("counts.csv", RECORD_COUNT_CSV);
        workspace
    }
}

pub const TABLES_CSV: &str = "\
TableName,SchemaName
customers,sales
orders,sales
audit_log,dbo
";

pub const COLUMNS_CSV: &str = "\
TableName,ColumnName,DataType,Size,IsNullable,IsIdentity,DefaultConstraint
customers,id,int,4,0,1,
customers,email,varchar,255,1,0,
orders,id,int,4,0,1,
orders,customer_id,int,4,0,0,
orders,total,decimal,\"10,2\",1,0,((0))
audit_log,message,nvarchar,-1,1,0,
";

pub const PRIMARY_KEYS_CSV: &str = "\
TableName,ColumnName
customers,id
orders,id
";

pub const FOREIGN_KEYS_CSV: &str = "\
FkName,ParentTable,ParentColumn,ReferencedTable,ReferencedColumn
FK_orders_customers,orders,customer_id,customers,id
";

pub const RECORD_COUNT_CSV: &str = "\
TableName,SchemaName,RowCount
customers,sales,120
orders,sales,4500
";

pub fn column(name: &str, data_type: &str, size: &str, default: &str, constraints: &str) -> ColumnDescriptor {
    ColumnDescriptor {
        name: name.to_string(),
        data_type: data_type.to_string(),
        size: size.to_string(),
        default: default.to_string(),
        constraints: constraints.to_string(),
    }
}
