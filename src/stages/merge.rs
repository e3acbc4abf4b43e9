//! Row-budget sharder: concatenate everything, re-partition at R rows.
//!
//! This is the one stage that needs a global view of row order, so it
//! stays sequential. Everything downstream of it (and ultimately every
//! workbook page) inherits the row ceiling established here.

use itertools::Itertools;

use crate::error::Result;
use crate::store::{Shard, ShardStore};
use crate::table::{Row, Table};

const OUT_DIR: &str = "merged_logs";

/// Concatenate all input rows in shard order and re-partition into shards
/// of exactly `row_budget` rows, except a smaller final remainder. Empty
/// and undecodable inputs are skipped; an empty input set yields an empty
/// output set.
pub fn merge_shards(
    store: &ShardStore,
    shards: &[Shard],
    row_budget: usize,
) -> Result<Vec<Shard>> {
    let row_budget = row_budget.max(1);

    let mut schema = None;
    let mut rows: Vec<Row> = Vec::new();
    for shard in shards {
        let Some(table) = store.try_read(shard)? else {
            continue;
        };
        if table.is_empty() {
            continue;
        }
        schema.get_or_insert(table.schema);
        rows.extend(table.rows);
    }
    let Some(schema) = schema else {
        return Ok(Vec::new());
    };

    let mut out = Vec::new();
    let chunks = rows.into_iter().chunks(row_budget);
    for (index, chunk) in (&chunks).into_iter().enumerate() {
        let table = Table::with_rows(schema.clone(), chunk.collect());
        out.push(store.write(OUT_DIR, &format!("merged_{index:03}"), &table)?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ColumnSchema;

    fn store() -> (tempfile::TempDir, ShardStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = ShardStore::open(dir.path().join("work")).unwrap();
        (dir, store)
    }

    fn numbered(schema: &ColumnSchema, range: std::ops::Range<usize>) -> Table {
        Table::with_rows(
            schema.clone(),
            range.map(|i| vec![i.to_string()]).collect(),
        )
    }

    #[test]
    fn partitions_at_budget_with_remainder() {
        let (_dir, store) = store();
        let schema = ColumnSchema::new(["n"]);
        let input = vec![
            store.write("in", "a", &numbered(&schema, 0..4)).unwrap(),
            store.write("in", "b", &numbered(&schema, 4..7)).unwrap(),
        ];
        // 7 rows, budget 3 -> ceil(7/3) = 3 shards of 3/3/1
        let out = merge_shards(&store, &input, 3).unwrap();
        assert_eq!(out.len(), 3);
        assert_eq!(out.iter().map(Shard::rows).collect::<Vec<_>>(), [3, 3, 1]);
        assert_eq!(out[0].name(), "merged_000");
        assert_eq!(out[2].name(), "merged_002");
    }

    #[test]
    fn concatenation_preserves_row_order() {
        let (_dir, store) = store();
        let schema = ColumnSchema::new(["n"]);
        let input = vec![
            store.write("in", "a", &numbered(&schema, 0..5)).unwrap(),
            store.write("in", "b", &numbered(&schema, 5..9)).unwrap(),
        ];
        let out = merge_shards(&store, &input, 4).unwrap();
        let replayed: Vec<String> = out
            .iter()
            .flat_map(|s| store.read(s).unwrap().rows)
            .map(|r| r[0].clone())
            .collect();
        let expected: Vec<String> = (0..9).map(|i| i.to_string()).collect();
        assert_eq!(replayed, expected);
    }

    #[test]
    fn exact_multiple_has_no_short_shard() {
        let (_dir, store) = store();
        let schema = ColumnSchema::new(["n"]);
        let input = vec![store.write("in", "a", &numbered(&schema, 0..6)).unwrap()];
        let out = merge_shards(&store, &input, 3).unwrap();
        assert_eq!(out.iter().map(Shard::rows).collect::<Vec<_>>(), [3, 3]);
    }

    #[test]
    fn empty_inputs_are_skipped() {
        let (_dir, store) = store();
        let schema = ColumnSchema::new(["n"]);
        let input = vec![
            store.write("in", "a", &Table::new(schema.clone())).unwrap(),
            store.write("in", "b", &numbered(&schema, 0..2)).unwrap(),
        ];
        let out = merge_shards(&store, &input, 10).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].rows(), 2);
    }

    #[test]
    fn empty_input_set_is_empty_output_set() {
        let (_dir, store) = store();
        let out = merge_shards(&store, &[], 10).unwrap();
        assert!(out.is_empty());
    }
}
