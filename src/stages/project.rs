//! Early column projection: drop everything downstream never reads.

use crate::error::Result;
use crate::stages::map_shards;
use crate::store::{Shard, ShardStore};
use crate::table::Table;

const STAGE: &str = "reduce_columns";
const OUT_DIR: &str = "reduced_logs";

/// Keep exactly the named columns, in `keep` order.
pub fn reduce_columns(store: &ShardStore, shards: &[Shard], keep: &[String]) -> Result<Vec<Shard>> {
    map_shards(shards, |shard| {
        let Some(table) = store.try_read(shard)? else {
            return Ok(None);
        };
        let (schema, indices) = table.schema.project(STAGE, keep)?;
        let rows = table
            .rows
            .into_iter()
            .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
            .collect();
        let reduced = Table::with_rows(schema, rows);
        store.write(OUT_DIR, shard.name(), &reduced).map(Some)
    })
}
