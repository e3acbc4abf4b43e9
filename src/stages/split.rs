//! Split the composite routing pair into its two address columns.

use crate::error::Result;
use crate::schema::Anchor;
use crate::stages::map_shards;
use crate::store::{Shard, ShardStore};

const STAGE: &str = "split_ip";
const OUT_DIR: &str = "splitted_logs";

/// Split `routing` (`"A > B"` or empty) on the first `" > "` into `srcIP`
/// and `dstIP`, inserted right after `routing`. Anything that is not a
/// well-formed pair yields empty strings for both sides.
pub fn split_routing(store: &ShardStore, shards: &[Shard]) -> Result<Vec<Shard>> {
    map_shards(shards, |shard| {
        let Some(mut table) = store.try_read(shard)? else {
            return Ok(None);
        };
        table.schema.require(STAGE, "routing")?;
        let src_at = table.schema.insert(STAGE, Anchor::After("routing"), "srcIP")?;
        let dst_at = table.schema.insert(STAGE, Anchor::After("srcIP"), "dstIP")?;
        let routing_at = src_at - 1;
        for row in &mut table.rows {
            let (src, dst) = split_pair(&row[routing_at]);
            row.insert(src_at, src);
            row.insert(dst_at, dst);
        }
        store.write(OUT_DIR, shard.name(), &table).map(Some)
    })
}

fn split_pair(routing: &str) -> (String, String) {
    match routing.split_once(" > ") {
        Some((src, dst)) if !src.trim().is_empty() && !dst.trim().is_empty() => {
            (src.trim().to_string(), dst.trim().to_string())
        }
        _ => (String::new(), String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use crate::schema::ColumnSchema;
    use crate::table::Table;

    fn store() -> (tempfile::TempDir, ShardStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = ShardStore::open(dir.path().join("work")).unwrap();
        (dir, store)
    }

    #[test]
    fn splits_pair_into_adjacent_columns() {
        let (_dir, store) = store();
        let table = Table::with_rows(
            ColumnSchema::new(["Timestamp", "routing", "Message"]),
            vec![
                vec!["t".into(), "10.0.0.5 > 8.8.8.8".into(), "m".into()],
                vec!["t".into(), "".into(), "m".into()],
            ],
        );
        let input = vec![store.write("in", "merged_000", &table).unwrap()];
        let out = split_routing(&store, &input).unwrap();
        let result = store.read(&out[0]).unwrap();
        assert_eq!(
            result.schema.columns(),
            ["Timestamp", "routing", "srcIP", "dstIP", "Message"]
        );
        assert_eq!(result.rows[0][2], "10.0.0.5");
        assert_eq!(result.rows[0][3], "8.8.8.8");
        assert_eq!(result.rows[1][2], "");
        assert_eq!(result.rows[1][3], "");
    }

    #[test]
    fn degenerate_values_split_to_empty() {
        assert_eq!(split_pair(""), (String::new(), String::new()));
        assert_eq!(split_pair("no separator"), (String::new(), String::new()));
        assert_eq!(split_pair(" > "), (String::new(), String::new()));
    }

    #[test]
    fn first_separator_wins() {
        assert_eq!(
            split_pair("1.2.3.4 > 5.6.7.8 > 9.9.9.9"),
            ("1.2.3.4".to_string(), "5.6.7.8 > 9.9.9.9".to_string())
        );
    }

    #[test]
    fn missing_routing_column_is_schema_error() {
        let (_dir, store) = store();
        let table = Table::with_rows(ColumnSchema::new(["Message"]), vec![vec!["m".into()]]);
        let input = vec![store.write("in", "merged_000", &table).unwrap()];
        let err = split_routing(&store, &input).unwrap_err();
        assert!(matches!(err, PipelineError::Schema { stage: "split_ip", .. }));
    }
}
