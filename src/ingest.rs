//! Ingest boundary: adopt the hourly tables delivered by the upstream
//! archive step as the initial artifact set.
//!
//! Decompression itself happens upstream; by the time this runs the source
//! directory holds one delimited table per archived hour. Files are taken
//! in lexicographic order, which is what fixes row order for the rest of
//! the pipeline.

use std::path::Path;

use tracing::info;

use crate::error::{PipelineError, Result};
use crate::store::{Shard, ShardStore};

const STAGE: &str = "ingest";

/// The fixed layout the appliance exports.
pub const SOURCE_COLUMNS: [&str; 7] = [
    "Timestamp",
    "Hostname",
    "AppName",
    "SeverityLevel",
    "Severity",
    "LogType",
    "Message",
];

/// Collect `*.csv` tables from `source_dir`, sorted by name. Undecodable
/// and empty files are skipped with a warning; a header that does not
/// carry the full source layout is fatal.
pub fn collect_tables(store: &ShardStore, source_dir: &Path) -> Result<Vec<Shard>> {
    let entries = std::fs::read_dir(source_dir)
        .map_err(|e| PipelineError::io(format!("read {}", source_dir.display()), e))?;

    let mut paths: Vec<_> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().map_or(false, |ext| ext == "csv"))
        .collect();
    paths.sort();

    let mut shards = Vec::new();
    for path in paths {
        let Some(shard) = store.adopt(&path)? else {
            continue;
        };
        verify_header(store, &shard)?;
        shards.push(shard);
    }
    info!(count = shards.len(), "adopted source tables");
    Ok(shards)
}

fn verify_header(store: &ShardStore, shard: &Shard) -> Result<()> {
    let table = store.read(shard)?;
    for required in SOURCE_COLUMNS {
        table.schema.require(STAGE, required)?;
    }
    Ok(())
}
