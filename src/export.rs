//! Boundary toward the workbook writer.
//!
//! The pipeline's side of the contract: the final artifact set carries
//! exactly [`FINAL_COLUMNS`] in order, and every shard stays within the
//! row budget, so a writer can map one shard onto one sheet. Pagination,
//! fonts and file naming belong to the writer, not to the pipeline. The
//! bundled [`DelimitedWriter`] keeps the tool usable standalone by emitting
//! the final tables as plain delimited text.

use std::path::PathBuf;

use crate::error::{PipelineError, Result};
use crate::store::render_table;
use crate::table::Table;

const STAGE: &str = "export";

/// Column layout the exporter is promised.
pub const FINAL_COLUMNS: [&str; 12] = [
    "Timestamp",
    "Hostname",
    "AppName",
    "routing",
    "srcIP",
    "srcIP_type",
    "dstIP",
    "dstIP_type",
    "protocol",
    "SeverityLevel",
    "Severity",
    "Message",
];

/// Accepts one ordered table and produces one workbook (or page set).
pub trait WorkbookWriter {
    fn write(&self, name: &str, table: &Table) -> Result<PathBuf>;
}

/// Fail if a final table deviates from the promised layout.
pub fn verify_final_schema(table: &Table) -> Result<()> {
    if table.schema.len() != FINAL_COLUMNS.len() {
        return Err(PipelineError::Schema {
            stage: STAGE,
            column: format!(
                "expected {} columns, found {}",
                FINAL_COLUMNS.len(),
                table.schema.len()
            ),
        });
    }
    for (found, expected) in table.schema.columns().iter().zip(FINAL_COLUMNS) {
        if found != expected {
            return Err(PipelineError::Schema {
                stage: STAGE,
                column: expected.to_string(),
            });
        }
    }
    Ok(())
}

/// Fallback writer: the final table as UTF-8 delimited text.
pub struct DelimitedWriter {
    dir: PathBuf,
}

impl DelimitedWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        DelimitedWriter { dir: dir.into() }
    }
}

impl WorkbookWriter for DelimitedWriter {
    fn write(&self, name: &str, table: &Table) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)
            .map_err(|e| PipelineError::io(format!("create {}", self.dir.display()), e))?;
        let path = self.dir.join(format!("{name}.csv"));
        std::fs::write(&path, render_table(table))
            .map_err(|e| PipelineError::io(format!("write {}", path.display()), e))?;
        Ok(path)
    }
}
