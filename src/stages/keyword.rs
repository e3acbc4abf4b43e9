//! Row-level keyword filter on a single text column.

use crate::error::Result;
use crate::stages::map_shards;
use crate::store::{Shard, ShardStore};
use crate::table::Table;

const STAGE: &str = "filter_keyword";
const OUT_DIR: &str = "filtered_logs";

/// Keep only rows whose `field` contains `keyword` (case-sensitive
/// substring). A shard with zero matches produces no output file. Returns
/// the surviving shards and the total retained row count.
pub fn filter_keyword(
    store: &ShardStore,
    shards: &[Shard],
    field: &str,
    keyword: &str,
) -> Result<(Vec<Shard>, usize)> {
    let out = map_shards(shards, |shard| {
        let Some(table) = store.try_read(shard)? else {
            return Ok(None);
        };
        let col = table.schema.require(STAGE, field)?;
        let rows: Vec<_> = table
            .rows
            .into_iter()
            .filter(|row| row[col].contains(keyword))
            .collect();
        if rows.is_empty() {
            return Ok(None);
        }
        let filtered = Table::with_rows(table.schema, rows);
        store.write(OUT_DIR, shard.name(), &filtered).map(Some)
    })?;
    let total = out.iter().map(Shard::rows).sum();
    Ok((out, total))
}
