//! Final severity filter: keep only the highest-severity rows.

use crate::error::Result;
use crate::stages::map_shards;
use crate::store::{Shard, ShardStore};
use crate::table::{Row, Table};

const STAGE: &str = "filter_critical";
const OUT_DIR: &str = "critical_only";

/// Result of the final filter. Zero matching rows across every input is a
/// legitimate terminal state for a quiet day, not a failure.
#[derive(Debug)]
pub enum FilterOutcome {
    Matched(Vec<Shard>),
    NoMatches,
}

/// Keep rows whose `Severity` cell equals `target` exactly. With `merge`
/// set, all matches across all inputs collapse into one output shard in
/// input order; otherwise each input shard with matches produces its own
/// output shard.
pub fn filter_severity(
    store: &ShardStore,
    shards: &[Shard],
    target: &str,
    merge: bool,
) -> Result<FilterOutcome> {
    if merge {
        filter_merged(store, shards, target)
    } else {
        filter_per_shard(store, shards, target)
    }
}

fn filter_merged(store: &ShardStore, shards: &[Shard], target: &str) -> Result<FilterOutcome> {
    let mut schema = None;
    let mut rows: Vec<Row> = Vec::new();
    for shard in shards {
        let Some(table) = store.try_read(shard)? else {
            continue;
        };
        let col = table.schema.require(STAGE, "Severity")?;
        schema.get_or_insert(table.schema);
        rows.extend(table.rows.into_iter().filter(|row| row[col] == target));
    }
    let Some(schema) = schema else {
        return Ok(FilterOutcome::NoMatches);
    };
    if rows.is_empty() {
        return Ok(FilterOutcome::NoMatches);
    }
    let name = format!("{}_merged", target.to_lowercase());
    let merged = Table::with_rows(schema, rows);
    Ok(FilterOutcome::Matched(vec![store.write(OUT_DIR, &name, &merged)?]))
}

fn filter_per_shard(store: &ShardStore, shards: &[Shard], target: &str) -> Result<FilterOutcome> {
    let out = map_shards(shards, |shard| {
        let Some(table) = store.try_read(shard)? else {
            return Ok(None);
        };
        let col = table.schema.require(STAGE, "Severity")?;
        let rows: Vec<Row> = table
            .rows
            .into_iter()
            .filter(|row| row[col] == target)
            .collect();
        if rows.is_empty() {
            return Ok(None);
        }
        let filtered = Table::with_rows(table.schema, rows);
        store.write(OUT_DIR, shard.name(), &filtered).map(Some)
    })?;
    if out.is_empty() {
        Ok(FilterOutcome::NoMatches)
    } else {
        Ok(FilterOutcome::Matched(out))
    }
}
