//! On-disk shard store.
//!
//! A shard is one delimited UTF-8 table with a header row. The store owns
//! the working directory and hands out one subdirectory per stage; stages
//! only ever see [`Shard`] handles and never build paths themselves.
//!
//! Stages replace rather than mutate: a stage reads its input shards,
//! writes fresh files into its own directory, and the orchestrator retires
//! the consumed set afterwards. A crash mid-stage leaves the previous
//! stage's output intact.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::error::{PipelineError, Result};
use crate::schema::ColumnSchema;
use crate::table::{Row, Table};

/// Handle to one table on disk.
#[derive(Debug, Clone)]
pub struct Shard {
    path: PathBuf,
    rows: usize,
}

impl Shard {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Data rows, excluding the header.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// File stem, reused as the output name by shard-preserving stages.
    pub fn name(&self) -> &str {
        self.path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("shard")
    }
}

#[derive(Debug)]
pub struct ShardStore {
    root: PathBuf,
}

impl ShardStore {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)
            .map_err(|e| PipelineError::io(format!("create {}", root.display()), e))?;
        Ok(ShardStore { root })
    }

    /// Drop every intermediate artifact from a previous run.
    pub fn reset(&self) -> Result<()> {
        if self.root.exists() {
            fs::remove_dir_all(&self.root)
                .map_err(|e| PipelineError::io(format!("clean {}", self.root.display()), e))?;
        }
        fs::create_dir_all(&self.root)
            .map_err(|e| PipelineError::io(format!("create {}", self.root.display()), e))?;
        Ok(())
    }

    /// Write a table into the named stage directory and return its handle.
    pub fn write(&self, stage_dir: &str, name: &str, table: &Table) -> Result<Shard> {
        let dir = self.root.join(stage_dir);
        fs::create_dir_all(&dir)
            .map_err(|e| PipelineError::io(format!("create {}", dir.display()), e))?;
        let path = dir.join(format!("{name}.csv"));
        fs::write(&path, render_table(table))
            .map_err(|e| PipelineError::io(format!("write {}", path.display()), e))?;
        Ok(Shard {
            path,
            rows: table.len(),
        })
    }

    /// Read a shard back into memory. `Encoding` if the file is not UTF-8,
    /// `MalformedTable` if any record disagrees with the header width.
    pub fn read(&self, shard: &Shard) -> Result<Table> {
        read_table(shard.path())
    }

    /// Like [`read`](Self::read), but an undecodable shard is logged and
    /// skipped instead of aborting the run: one corrupt hour of logs must
    /// not take the whole day down.
    pub fn try_read(&self, shard: &Shard) -> Result<Option<Table>> {
        match self.read(shard) {
            Ok(table) => Ok(Some(table)),
            Err(PipelineError::Encoding { path }) => {
                warn!(path = %path.display(), "skipping undecodable shard");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Adopt an externally produced table (an ingest input) as a shard.
    /// Returns `None` for undecodable or empty files, both logged.
    pub fn adopt(&self, path: &Path) -> Result<Option<Shard>> {
        let table = match read_table(path) {
            Ok(t) => t,
            Err(PipelineError::Encoding { path }) => {
                warn!(path = %path.display(), "skipping undecodable input");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        if table.schema.is_empty() {
            warn!(path = %path.display(), "skipping empty input");
            return Ok(None);
        }
        Ok(Some(Shard {
            path: path.to_path_buf(),
            rows: table.len(),
        }))
    }

    /// Delete a consumed artifact set. Already-missing files are tolerated.
    pub fn retire(&self, shards: &[Shard]) -> Result<()> {
        for shard in shards {
            match fs::remove_file(shard.path()) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    warn!(path = %shard.path().display(), "shard already gone");
                }
                Err(e) => {
                    return Err(PipelineError::io(
                        format!("retire {}", shard.path().display()),
                        e,
                    ))
                }
            }
        }
        Ok(())
    }
}

fn read_table(path: &Path) -> Result<Table> {
    let bytes =
        fs::read(path).map_err(|e| PipelineError::io(format!("read {}", path.display()), e))?;
    let text = String::from_utf8(bytes).map_err(|_| PipelineError::Encoding {
        path: path.to_path_buf(),
    })?;
    parse_table(&text, path)
}

/// Parse a delimited table: comma separator, `"`-quoting with doubled
/// quotes inside quoted cells, LF or CRLF record ends, header first.
pub fn parse_table(text: &str, path: &Path) -> Result<Table> {
    let mut records: Vec<Row> = Vec::new();
    let mut fields: Row = Vec::new();
    let mut cell = String::new();
    let mut in_quotes = false;
    let mut cell_started = false;

    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' => {
                    if chars.peek() == Some(&'"') {
                        chars.next();
                        cell.push('"');
                    } else {
                        in_quotes = false;
                    }
                }
                _ => cell.push(c),
            }
            continue;
        }
        match c {
            '"' => {
                in_quotes = true;
                cell_started = true;
            }
            ',' => {
                fields.push(std::mem::take(&mut cell));
                cell_started = true;
            }
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                end_record(&mut records, &mut fields, &mut cell, &mut cell_started);
            }
            '\n' => end_record(&mut records, &mut fields, &mut cell, &mut cell_started),
            _ => {
                cell.push(c);
                cell_started = true;
            }
        }
    }
    if cell_started || !fields.is_empty() {
        fields.push(cell);
        records.push(fields);
    }

    let mut iter = records.into_iter();
    let header = match iter.next() {
        Some(h) => h,
        None => return Ok(Table::new(ColumnSchema::new(Vec::<String>::new()))),
    };
    let expected = header.len();
    let mut rows = Vec::new();
    for (i, record) in iter.enumerate() {
        if record.len() != expected {
            return Err(PipelineError::MalformedTable {
                path: path.to_path_buf(),
                record: i + 2,
                found: record.len(),
                expected,
            });
        }
        rows.push(record);
    }
    Ok(Table::with_rows(ColumnSchema::new(header), rows))
}

fn end_record(records: &mut Vec<Row>, fields: &mut Row, cell: &mut String, started: &mut bool) {
    // A bare newline between records is not an empty record.
    if *started || !fields.is_empty() {
        fields.push(std::mem::take(cell));
        records.push(std::mem::take(fields));
    }
    *started = false;
}

pub fn render_table(table: &Table) -> String {
    let mut out = String::new();
    render_record(&mut out, table.schema.columns());
    for row in &table.rows {
        render_record(&mut out, row);
    }
    out
}

fn render_record(out: &mut String, cells: &[String]) {
    for (i, cell) in cells.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        if cell.contains(&['"', ',', '\n', '\r'][..]) {
            out.push('"');
            out.push_str(&cell.replace('"', "\"\""));
            out.push('"');
        } else {
            out.push_str(cell);
        }
    }
    out.push('\n');
}
